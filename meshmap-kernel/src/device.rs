//! Device records: one per installed radio, rebuilt every cycle.

use crate::status::TestStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The three independent checks run against a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestDimension {
    Ping,
    Login,
    Radio,
}

impl TestDimension {
    pub const ALL: [TestDimension; 3] = [TestDimension::Ping, TestDimension::Login, TestDimension::Radio];
}

impl fmt::Display for TestDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestDimension::Ping => write!(f, "ping"),
            TestDimension::Login => write!(f, "login"),
            TestDimension::Radio => write!(f, "radio"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    /// hostname
    pub id: String,
    pub mount_point_id: Option<String>,
    pub link_id: Option<String>,
    /// out-of-band IPv6 admin address, from the roster
    pub admin_address: Option<String>,
    pub ping_status: TestStatus,
    pub login_status: TestStatus,
    pub radio_link_status: TestStatus,
}

impl DeviceRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mount_point_id: None,
            link_id: None,
            admin_address: None,
            ping_status: TestStatus::Unknown,
            login_status: TestStatus::Unknown,
            radio_link_status: TestStatus::Unknown,
        }
    }

    pub fn at_mount_point(id: impl Into<String>, mount_point_id: impl Into<String>) -> Self {
        Self { mount_point_id: Some(mount_point_id.into()), ..Self::new(id) }
    }

    pub fn status(&self, dimension: TestDimension) -> TestStatus {
        match dimension {
            TestDimension::Ping => self.ping_status,
            TestDimension::Login => self.login_status,
            TestDimension::Radio => self.radio_link_status,
        }
    }

    pub fn set_status(&mut self, dimension: TestDimension, status: TestStatus) {
        match dimension {
            TestDimension::Ping => self.ping_status = status,
            TestDimension::Login => self.login_status = status,
            TestDimension::Radio => self.radio_link_status = status,
        }
    }

    /// True once every check has reported for this cycle.
    pub fn is_settled(&self) -> bool {
        TestDimension::ALL.iter().all(|d| self.status(*d) != TestStatus::Unknown)
    }
}

/// Devices of one cycle, keyed by hostname.
pub type DeviceSet = BTreeMap<String, DeviceRecord>;
