/**
 * STATUS AGGREGATOR - Per-feature rollup of device test results
 *
 * ROLE :
 * For each feature, collect the devices assigned to it (mount point for
 * sites/mountpoints, radio link for observations/links), write one summary
 * line per device for each test, and classify the feature from ping results.
 *
 * ROLLUP (first match wins) :
 * - no devices        -> unknown
 * - all pings down    -> down
 * - all pings up      -> up
 * - some pings up     -> partial-up
 * - anything else     -> unknown, reported as an aggregation ambiguity so a
 *                        previous cycle's status never lingers
 *
 * Device records are only read here.
 */

use crate::device::{DeviceRecord, DeviceSet, TestDimension};
use crate::error::Problem;
use crate::feature::{LOGIN_STATUS, OVERALL_STATUS, PING_STATUS, RADIO_STATUS};
use crate::registry::FeatureRegistry;
use crate::status::{OverallStatus, TestStatus};
use serde::Serialize;
use std::collections::BTreeMap;

pub const NO_DEVICES: &str = "No known devices installed";

/// Classifies a feature from its devices' ping results.
///
/// `None` means the combination fits no rule (e.g. every ping unknown).
pub fn rollup(pings: &[TestStatus]) -> Option<OverallStatus> {
    if pings.is_empty() {
        return Some(OverallStatus::Unknown);
    }
    if pings.iter().all(|s| *s == TestStatus::Down) {
        return Some(OverallStatus::Down);
    }
    if pings.iter().all(|s| *s == TestStatus::Up) {
        return Some(OverallStatus::Up);
    }
    if pings.iter().any(|s| *s == TestStatus::Up) {
        return Some(OverallStatus::PartialUp);
    }
    None
}

/// `hostname: status` per device, one per line, or the no-device literal.
pub fn summarize(devices: &[&DeviceRecord], dimension: TestDimension) -> String {
    if devices.is_empty() {
        return NO_DEVICES.to_string();
    }
    devices
        .iter()
        .map(|d| format!("{}: {}", d.id, d.status(dimension)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregationReport {
    pub counts: BTreeMap<OverallStatus, usize>,
    pub problems: Vec<Problem>,
}

/// Rewrites the status properties of every feature in the registry.
pub fn aggregate(registry: &mut FeatureRegistry, devices: &DeviceSet) -> AggregationReport {
    let mut by_mount_point: BTreeMap<&str, Vec<&DeviceRecord>> = BTreeMap::new();
    let mut by_link: BTreeMap<&str, Vec<&DeviceRecord>> = BTreeMap::new();
    for device in devices.values() {
        if let Some(mp) = device.mount_point_id.as_deref() {
            by_mount_point.entry(mp).or_default().push(device);
        }
        if let Some(link) = device.link_id.as_deref() {
            by_link.entry(link).or_default().push(device);
        }
    }

    let mut report = AggregationReport::default();
    for feature in registry.all_mut() {
        let index = if feature.subtype().is_edge() { &by_link } else { &by_mount_point };
        let assigned: &[&DeviceRecord] = index.get(feature.id()).map(Vec::as_slice).unwrap_or(&[]);

        feature.set_property(PING_STATUS, summarize(assigned, TestDimension::Ping));
        feature.set_property(LOGIN_STATUS, summarize(assigned, TestDimension::Login));
        feature.set_property(RADIO_STATUS, summarize(assigned, TestDimension::Radio));

        let pings: Vec<TestStatus> = assigned.iter().map(|d| d.ping_status).collect();
        let status = match rollup(&pings) {
            Some(status) => status,
            None => {
                report
                    .problems
                    .push(Problem::AggregationAmbiguity { feature: feature.id().to_string() }.report());
                OverallStatus::Unknown
            }
        };

        feature.set_property(OVERALL_STATUS, status.as_str());
        feature.apply_status_style(status);
        *report.counts.entry(status).or_default() += 1;
    }

    tracing::info!(
        features = registry.len(),
        up = report.counts.get(&OverallStatus::Up).copied().unwrap_or(0),
        down = report.counts.get(&OverallStatus::Down).copied().unwrap_or(0),
        partial = report.counts.get(&OverallStatus::PartialUp).copied().unwrap_or(0),
        unknown = report.counts.get(&OverallStatus::Unknown).copied().unwrap_or(0),
        "status aggregated"
    );
    report
}
