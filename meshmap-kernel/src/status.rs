//! Status vocabularies: per-test outcomes on devices, rolled-up status on
//! features, and the map palette for the latter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one probe against one device.
///
/// Starts as `Unknown`; a probe moves it to `Up` or `Down` once per cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Up,
    Down,
    #[default]
    Unknown,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Up => "up",
            TestStatus::Down => "down",
            TestStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rolled-up health of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OverallStatus {
    #[serde(rename = "up")]
    Up,
    #[serde(rename = "down")]
    Down,
    #[serde(rename = "partial-up")]
    PartialUp,
    #[serde(rename = "unknown")]
    Unknown,
}

/// Display attributes of a status on the rendered map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusStyle {
    pub color: &'static str,
    pub color_value: &'static str,
    pub status_code: u8,
}

impl OverallStatus {
    pub const ALL: [OverallStatus; 4] = [
        OverallStatus::Down,
        OverallStatus::Up,
        OverallStatus::PartialUp,
        OverallStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Up => "up",
            OverallStatus::Down => "down",
            OverallStatus::PartialUp => "partial-up",
            OverallStatus::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    pub fn style(&self) -> StatusStyle {
        match self {
            OverallStatus::Down => StatusStyle { color: "red", color_value: "#ff2600", status_code: 0 },
            OverallStatus::Up => StatusStyle { color: "green", color_value: "#00f900", status_code: 1 },
            OverallStatus::PartialUp => StatusStyle { color: "yellow", color_value: "#fffb00", status_code: 2 },
            OverallStatus::Unknown => StatusStyle { color: "white", color_value: "#ffffff", status_code: 3 },
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(TestStatus::default().as_str(), "unknown");
        assert_eq!(OverallStatus::PartialUp.to_string(), "partial-up");
        assert_eq!(OverallStatus::parse("partial-up"), Some(OverallStatus::PartialUp));
        assert_eq!(OverallStatus::parse("testing"), None);
    }

    #[test]
    fn test_status_codes_are_distinct() {
        let mut codes: Vec<u8> = OverallStatus::ALL.iter().map(|s| s.style().status_code).collect();
        codes.sort();
        assert_eq!(codes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_overall_status_serde() {
        let json = serde_json::to_string(&OverallStatus::PartialUp).unwrap();
        assert_eq!(json, "\"partial-up\"");
    }
}
