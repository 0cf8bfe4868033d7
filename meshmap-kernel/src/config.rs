use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "MESHMAP_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "meshmap.yaml";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct KernelConfig {
    pub spatial: SourceConf,
    pub roster: SourceConf,
    pub output: Option<SourceConf>,
    pub poll_interval_secs: u64,
    pub probes: ProbesConf,
    pub http: HttpConf,
    pub mqtt: Option<MqttConf>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SourceConf {
    pub path: PathBuf, // file, or folder for spatial data
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ProbesConf {
    pub ping: Option<ProbeConf>,
    pub login: Option<ProbeConf>,
    pub radio: Option<ProbeConf>,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProbeConf {
    pub command: String, // ex: "ping -6 -c 1 -W 2 {address}"
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConf {
    pub listen: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MqttConf {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_status_topic")]
    pub topic: String,
}

fn default_status_topic() -> String {
    "meshmap/status@v1".into()
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            spatial: SourceConf { path: "data/deployment.geojson".into() },
            roster: SourceConf { path: "data/roster.json".into() },
            output: Some(SourceConf { path: "data/status.geojson".into() }),
            poll_interval_secs: 10,
            probes: ProbesConf::default(),
            http: HttpConf::default(),
            mqtt: None,
        }
    }
}

impl Default for ProbesConf {
    fn default() -> Self {
        Self {
            ping: Some(ProbeConf { command: "ping -6 -c 1 -W 2 {address}".into() }),
            login: None,
            radio: None,
            timeout_secs: 5,
        }
    }
}

impl Default for HttpConf {
    fn default() -> Self {
        Self { listen: "0.0.0.0:8080".into() }
    }
}

/// `$MESHMAP_CONFIG`, or `meshmap.yaml` in the working directory.
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// A missing or empty file gives the defaults; a malformed one is an error,
/// running against the wrong deployment silently is worse than not starting.
pub fn load_config(path: &Path) -> Result<KernelConfig, ConfigError> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "no config file, using defaults");
        return Ok(KernelConfig::default());
    }
    let txt = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    if txt.trim().is_empty() {
        return Ok(KernelConfig::default());
    }
    serde_yaml::from_str(&txt).map_err(|source| ConfigError::Yaml { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = KernelConfig::default();
        assert_eq!(cfg.poll_interval_secs, 10);
        assert_eq!(cfg.http.listen, "0.0.0.0:8080");
        assert!(cfg.probes.ping.is_some());
        assert!(cfg.probes.login.is_none());
        assert!(cfg.mqtt.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meshmap.yaml");
        std::fs::write(
            &path,
            "spatial:\n  path: survey/\npoll_interval_secs: 30\nprobes:\n  login:\n    command: \"ssh-check {address}\"\nmqtt:\n  host: broker\n  port: 1883\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.spatial.path, PathBuf::from("survey/"));
        assert_eq!(cfg.roster.path, PathBuf::from("data/roster.json"));
        assert_eq!(cfg.poll_interval_secs, 30);
        assert_eq!(cfg.probes.timeout_secs, 5);
        assert!(cfg.probes.ping.is_some());
        assert_eq!(cfg.probes.login.unwrap().command, "ssh-check {address}");
        assert_eq!(cfg.mqtt.unwrap().topic, "meshmap/status@v1");
    }

    #[test]
    fn test_missing_and_empty_files_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(cfg.poll_interval_secs, 10);

        let empty = dir.path().join("empty.yaml");
        std::fs::write(&empty, "  \n").unwrap();
        assert_eq!(load_config(&empty).unwrap().poll_interval_secs, 10);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "poll_interval_secs: [not a number\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Yaml { .. })));
    }
}
