/**
 * CYCLE - One full correlation / probe / aggregation pass
 *
 * ROLE :
 * Sequences the three writers of a cycle so none of them overlap:
 *   1. correlate : roster + registry -> topology and fresh device records
 *   2. probe     : device test results (concurrent, joined before step 3)
 *   3. aggregate : device results -> feature status properties
 *
 * Every data problem found along the way ends up in the cycle report; a bad
 * roster row never stops the other rows from being processed.
 */

use crate::aggregate::aggregate;
use crate::device::DeviceSet;
use crate::error::{MapKind, Problem};
use crate::probe::{run_probes, Probe};
use crate::registry::FeatureRegistry;
use crate::resolver::{resolve_with, DeviceMap, NameIndex};
use crate::roster::{devices_by_link, devices_by_location, installed_sectors, RosterRow};
use crate::status::OverallStatus;
use crate::topology::{self, Topology};
use serde::Serialize;
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Output of the correlation phase.
#[derive(Debug, Clone, Default)]
pub struct Correlation {
    /// mount point id -> hostnames
    pub node_map: DeviceMap,
    /// link id -> hostnames
    pub edge_map: DeviceMap,
    pub topology: Topology,
    pub devices: DeviceSet,
    pub problems: Vec<Problem>,
}

/// Joins the roster to the registry and builds this cycle's device records.
///
/// `rows` is the raw roster; rows that are not installed sector radios with an
/// admin address are ignored.
pub fn correlate(registry: &FeatureRegistry, rows: &[RosterRow]) -> Correlation {
    let installed = installed_sectors(rows);
    let index = NameIndex::build(registry);

    let nodes = resolve_with(&index, &devices_by_location(&installed), MapKind::Node);
    let edges = resolve_with(&index, &devices_by_link(&installed), MapKind::Link);
    let mut built = topology::build(&nodes.map, &edges.map);

    // the address comes from the first row placing the device where it was kept
    for row in &installed {
        let Some(device) = built.devices.get_mut(&row.hostname) else { continue };
        if device.admin_address.is_none()
            && index.resolve(&row.location_description) == device.mount_point_id.as_deref()
        {
            device.admin_address = Some(row.ipv6_admin_address.trim().to_string());
        }
    }

    let mut problems = nodes.problems;
    problems.extend(edges.problems);
    problems.extend(built.problems);

    tracing::info!(
        rows = rows.len(),
        installed = installed.len(),
        devices = built.devices.len(),
        problems = problems.len(),
        "roster correlated"
    );

    Correlation {
        node_map: nodes.map,
        edge_map: edges.map,
        topology: built.topology,
        devices: built.devices,
        problems,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub completed_at: String,
    pub features: usize,
    pub devices: usize,
    pub counts: BTreeMap<OverallStatus, usize>,
    pub problems: Vec<Problem>,
}

#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub topology: Topology,
    pub devices: DeviceSet,
    pub report: CycleReport,
}

/// Runs a whole cycle against `registry`, rewriting its status properties.
pub async fn run_cycle(
    cycle: u64,
    registry: &mut FeatureRegistry,
    rows: &[RosterRow],
    probes: &[Box<dyn Probe>],
) -> CycleOutcome {
    let Correlation { topology, mut devices, mut problems, .. } = correlate(registry, rows);

    run_probes(&mut devices, probes).await;

    let aggregation = aggregate(registry, &devices);
    problems.extend(aggregation.problems);

    let report = CycleReport {
        cycle,
        completed_at: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        features: registry.len(),
        devices: devices.len(),
        counts: aggregation.counts,
        problems,
    };
    tracing::info!(cycle, features = report.features, devices = report.devices, problems = report.problems.len(), "cycle complete");

    CycleOutcome { topology, devices, report }
}
