/*!
Scripted probe for tests without a network

Answers from a per-device script instead of running a command, and keeps a
log of every device it was asked about.
*/

use futures::future::BoxFuture;
use futures::FutureExt;
use meshmap_kernel::{DeviceRecord, Probe, TestDimension, TestStatus};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct ScriptedProbe {
    dimension: TestDimension,
    script: Arc<Mutex<HashMap<String, TestStatus>>>,
    fallback: TestStatus,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProbe {
    /// Devices not in the script get `unknown`.
    pub fn new(dimension: TestDimension) -> Self {
        Self {
            dimension,
            script: Arc::new(Mutex::new(HashMap::new())),
            fallback: TestStatus::Unknown,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_fallback(mut self, status: TestStatus) -> Self {
        self.fallback = status;
        self
    }

    pub fn set(&self, hostname: &str, status: TestStatus) -> &Self {
        self.script.lock().insert(hostname.to_string(), status);
        self
    }

    /// Hostnames checked so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl Probe for ScriptedProbe {
    fn dimension(&self) -> TestDimension {
        self.dimension
    }

    fn check<'a>(&'a self, device: &'a DeviceRecord) -> BoxFuture<'a, TestStatus> {
        self.calls.lock().push(device.id.clone());
        let status = self.script.lock().get(&device.id).copied().unwrap_or(self.fallback);
        futures::future::ready(status).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_answers_and_call_log() {
        let probe = ScriptedProbe::new(TestDimension::Ping);
        probe.set("d1", TestStatus::Up).set("d2", TestStatus::Down);

        let d1 = DeviceRecord::new("d1");
        let d3 = DeviceRecord::new("d3");
        assert_eq!(probe.check(&d1).await, TestStatus::Up);
        assert_eq!(probe.check(&d3).await, TestStatus::Unknown);
        assert_eq!(probe.calls(), vec!["d1", "d3"]);

        let down_by_default = ScriptedProbe::new(TestDimension::Radio).with_fallback(TestStatus::Down);
        assert_eq!(down_by_default.check(&d3).await, TestStatus::Down);
    }

    #[test]
    fn test_clones_share_script() {
        let probe = ScriptedProbe::new(TestDimension::Login);
        let handle = probe.clone();
        handle.set("d1", TestStatus::Up);
        assert_eq!(probe.script.lock().get("d1"), Some(&TestStatus::Up));
    }
}
