//! Install roster rows as exported by the field installers' tracking sheet.
//!
//! Only installed sector radios with an admin address take part in a cycle;
//! everything else in the sheet (planned installs, switches, spares) is
//! filtered out before correlation.
//!
//! Sheet exports are messy: empty cells come out as `null`, and a broken row
//! is skipped on its own without losing the rest of the file.

use crate::error::StoreError;
use crate::resolver::DeviceMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRow {
    #[serde(deserialize_with = "null_as_empty")]
    pub hostname: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location_description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub associated_link: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ipv6_admin_address: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub device_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub physical_install_status: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Rows read from a roster file, and the rows that had to be skipped.
#[derive(Debug, Default)]
pub struct RosterLoad {
    pub rows: Vec<RosterRow>,
    pub errors: Vec<StoreError>,
}

pub fn is_installed_sector(row: &RosterRow) -> bool {
    row.device_type.trim().eq_ignore_ascii_case("sector")
        && row.physical_install_status.trim().eq_ignore_ascii_case("installed")
        && !row.ipv6_admin_address.trim().is_empty()
}

pub fn installed_sectors(rows: &[RosterRow]) -> Vec<RosterRow> {
    rows.iter().filter(|r| is_installed_sector(r)).cloned().collect()
}

fn group_by<'a>(rows: &'a [RosterRow], key: impl Fn(&'a RosterRow) -> &'a str) -> DeviceMap {
    let mut map = DeviceMap::new();
    for row in rows {
        let k = key(row).trim();
        if k.is_empty() {
            continue;
        }
        map.entry(k.to_string()).or_default().push(row.hostname.clone());
    }
    map
}

/// Location description -> hostnames.
pub fn devices_by_location(rows: &[RosterRow]) -> DeviceMap {
    group_by(rows, |r| r.location_description.as_str())
}

/// Link description -> hostnames. Rows without a link are left out.
pub fn devices_by_link(rows: &[RosterRow]) -> DeviceMap {
    group_by(rows, |r| r.associated_link.as_str())
}

fn accept_row(path: &Path, index: usize, parsed: Result<RosterRow, String>, out: &mut RosterLoad) {
    let reason = match parsed {
        Ok(row) if !row.hostname.trim().is_empty() => {
            out.rows.push(row);
            return;
        }
        Ok(_) => "empty hostname".to_string(),
        Err(e) => e,
    };
    tracing::warn!(path = %path.display(), row = index, reason = %reason, "skipping roster row");
    out.errors.push(StoreError::Row { path: path.to_path_buf(), index, reason });
}

/// Reads a roster export: `.yaml`/`.yml` as YAML, anything else as JSON.
///
/// Only an unreadable file or a document that is not a list fails; a bad row
/// lands in `RosterLoad::errors`.
pub fn load_roster(path: &Path) -> Result<RosterLoad, StoreError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let mut out = RosterLoad::default();
    if is_yaml {
        let values: Vec<serde_yaml::Value> = serde_yaml::from_str(&text)
            .map_err(|source| StoreError::Yaml { path: path.to_path_buf(), source })?;
        for (index, value) in values.into_iter().enumerate() {
            let parsed = serde_yaml::from_value(value).map_err(|e| e.to_string());
            accept_row(path, index, parsed, &mut out);
        }
    } else {
        let values: Vec<serde_json::Value> = serde_json::from_str(&text)
            .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })?;
        for (index, value) in values.into_iter().enumerate() {
            let parsed = serde_json::from_value(value).map_err(|e| e.to_string());
            accept_row(path, index, parsed, &mut out);
        }
    }

    tracing::debug!(path = %path.display(), rows = out.rows.len(), skipped = out.errors.len(), "roster loaded");
    Ok(out)
}
