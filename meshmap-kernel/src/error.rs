//! Error and problem types.
//!
//! Two families live here. `FeatureError`, `StoreError` and `ConfigError` are
//! real failures returned through `Result`. `Problem` is a data-integrity
//! finding: it never aborts a pass, it is collected next to the pass output
//! so the operator can see what was skipped and why.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Rejections at feature construction time.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("feature id must not be empty")]
    EmptyId,
    #[error("feature {id}: invalid subtype {value:?} (expected site, mountpoint, observation or link)")]
    InvalidSubtype { id: String, value: String },
    #[error("feature {id}: subtype not specified")]
    MissingSubtype { id: String },
    #[error("feature {id}: invalid geometry: {reason}")]
    InvalidGeometry { id: String, reason: String },
    #[error("duplicate feature id: {0}")]
    DuplicateId(String),
}

/// Failures reading or writing spatial data.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{path}: row {index} skipped: {reason}")]
    Row { path: PathBuf, index: usize, reason: String },
    #[error("{path}: {source}")]
    Feature {
        path: PathBuf,
        #[source]
        source: FeatureError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Which device map a name or assignment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MapKind {
    Node,
    Link,
}

impl fmt::Display for MapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKind::Node => write!(f, "node"),
            MapKind::Link => write!(f, "link"),
        }
    }
}

/// A non-fatal data-integrity finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    /// A roster description matches no feature `desc`.
    UnresolvedName { map: MapKind, description: String },
    /// A roster description matches several features.
    AmbiguousName {
        map: MapKind,
        description: String,
        candidates: Vec<String>,
    },
    /// A device listed under two nodes or two links. `kept` wins.
    AssignmentConflict {
        map: MapKind,
        device: String,
        kept: String,
        rejected: String,
    },
    /// A device that only appears in the link map.
    OrphanDevice { device: String, link: String },
    /// Ping results that fit none of the rollup rules.
    AggregationAmbiguity { feature: String },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::UnresolvedName { map, description } => {
                write!(f, "{map} description {description:?} matches no known feature")
            }
            Problem::AmbiguousName { map, description, candidates } => write!(
                f,
                "{map} description {description:?} matches several features: {}",
                candidates.join(", ")
            ),
            Problem::AssignmentConflict { map, device, kept, rejected } => write!(
                f,
                "device {device} is listed under {map}s {kept} and {rejected}; keeping {kept}"
            ),
            Problem::OrphanDevice { device, link } => write!(
                f,
                "device {device} is referenced by link {link} but its location is not known"
            ),
            Problem::AggregationAmbiguity { feature } => write!(
                f,
                "feature {feature}: ping results fit no rollup rule, reporting unknown"
            ),
        }
    }
}

impl Problem {
    /// Logs the problem and hands it back, so call sites can `push(p.report())`.
    pub fn report(self) -> Self {
        tracing::warn!(problem = ?self, "{}", self);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_display_names_offender() {
        let p = Problem::UnresolvedName { map: MapKind::Node, description: "Tower 7".into() };
        assert!(p.to_string().contains("\"Tower 7\""));

        let p = Problem::AssignmentConflict {
            map: MapKind::Link,
            device: "d1".into(),
            kept: "L1".into(),
            rejected: "L2".into(),
        };
        let text = p.to_string();
        assert!(text.contains("d1") && text.contains("L1") && text.contains("L2"));
    }

    #[test]
    fn test_problem_serializes_with_kind_tag() {
        let p = Problem::OrphanDevice { device: "d9".into(), link: "L3".into() };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["kind"], "orphan_device");
        assert_eq!(json["device"], "d9");
    }
}
