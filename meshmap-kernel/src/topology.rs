/**
 * TOPOLOGY BUILDER - Mount point / link graph from shared devices
 *
 * ROLE :
 * Two id-keyed maps come in: mount point -> hostnames, link -> hostnames.
 * A link adjoins a mount point when they share at least one hostname.
 * The same pass creates the cycle's device records.
 *
 * RULES :
 * - a device sits on one mount point and at most one link; the first
 *   assignment seen (maps walk in id order, lists in roster order) is kept,
 *   later ones are reported as conflicts
 * - a device only known through a link is an orphan: reported, recorded with
 *   its link and no mount point, absent from the graph
 * - adjacency is a set per node, independent of map iteration order
 */

use crate::device::{DeviceRecord, DeviceSet};
use crate::error::{MapKind, Problem};
use crate::resolver::DeviceMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub type Adjacency = BTreeMap<String, BTreeSet<String>>;

/// Mount point id -> ids of the links sharing a device with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Topology {
    adjacency: Adjacency,
}

impl Topology {
    pub fn links_of(&self, node_id: &str) -> impl Iterator<Item = &str> {
        self.adjacency.get(node_id).into_iter().flatten().map(String::as_str)
    }

    pub fn is_adjacent(&self, node_id: &str, link_id: &str) -> bool {
        self.adjacency.get(node_id).is_some_and(|links| links.contains(link_id))
    }

    /// Mount points joined to this link.
    pub fn nodes_of<'a>(&'a self, link_id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.adjacency
            .iter()
            .filter(move |(_, links)| links.contains(link_id))
            .map(|(node, _)| node.as_str())
    }

    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TopologyBuild {
    pub topology: Topology,
    pub devices: DeviceSet,
    pub problems: Vec<Problem>,
}

pub fn build(node_map: &DeviceMap, edge_map: &DeviceMap) -> TopologyBuild {
    let mut out = TopologyBuild::default();
    let mut nodes_by_device: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for (node_id, hostnames) in node_map {
        for hostname in hostnames {
            nodes_by_device
                .entry(hostname.as_str())
                .or_default()
                .insert(node_id.as_str());

            match out.devices.get(hostname) {
                Some(existing) => {
                    let kept = existing.mount_point_id.as_deref().unwrap_or_default();
                    if kept != node_id.as_str() {
                        out.problems.push(
                            Problem::AssignmentConflict {
                                map: MapKind::Node,
                                device: hostname.clone(),
                                kept: kept.to_string(),
                                rejected: node_id.clone(),
                            }
                            .report(),
                        );
                    }
                }
                None => {
                    out.devices
                        .insert(hostname.clone(), DeviceRecord::at_mount_point(hostname, node_id));
                }
            }
        }
    }

    for (link_id, hostnames) in edge_map {
        for hostname in hostnames {
            if let Some(nodes) = nodes_by_device.get(hostname.as_str()) {
                for node_id in nodes {
                    out.topology
                        .adjacency
                        .entry(node_id.to_string())
                        .or_default()
                        .insert(link_id.clone());
                }
            }

            match out.devices.get_mut(hostname) {
                Some(device) => match device.link_id.as_deref() {
                    None => device.link_id = Some(link_id.clone()),
                    Some(kept) if kept == link_id.as_str() => {}
                    Some(kept) => out.problems.push(
                        Problem::AssignmentConflict {
                            map: MapKind::Link,
                            device: hostname.clone(),
                            kept: kept.to_string(),
                            rejected: link_id.clone(),
                        }
                        .report(),
                    ),
                },
                None => {
                    out.problems.push(
                        Problem::OrphanDevice { device: hostname.clone(), link: link_id.clone() }
                            .report(),
                    );
                    let mut device = DeviceRecord::new(hostname);
                    device.link_id = Some(link_id.clone());
                    out.devices.insert(hostname.clone(), device);
                }
            }
        }
    }

    tracing::info!(
        devices = out.devices.len(),
        nodes = out.topology.node_count(),
        edges = out.topology.edge_count(),
        problems = out.problems.len(),
        "topology built"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &[&str])]) -> DeviceMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_shared_device_makes_adjacency() {
        let nodes = map(&[("A", &["d1", "d2"])]);
        let edges = map(&[("L1", &["d2"])]);

        let out = build(&nodes, &edges);

        assert_eq!(out.topology.links_of("A").collect::<Vec<_>>(), vec!["L1"]);
        assert_eq!(out.devices["d2"].mount_point_id.as_deref(), Some("A"));
        assert_eq!(out.devices["d2"].link_id.as_deref(), Some("L1"));
        assert!(out.devices["d1"].link_id.is_none());
        assert!(out.problems.is_empty());
    }

    #[test]
    fn test_link_joins_both_ends() {
        let nodes = map(&[("A", &["a1"]), ("B", &["b1"]), ("C", &["c1"])]);
        let edges = map(&[("L1", &["a1", "b1"]), ("L2", &["b1", "c1"])]);

        let out = build(&nodes, &edges);

        assert!(out.topology.is_adjacent("A", "L1"));
        assert!(out.topology.is_adjacent("B", "L1"));
        assert!(out.topology.is_adjacent("C", "L2"));
        assert!(!out.topology.is_adjacent("A", "L2"));
        assert_eq!(out.topology.nodes_of("L1").collect::<Vec<_>>(), vec!["A", "B"]);
        // b1 is listed under both links; L1 sorts first and wins
        assert_eq!(out.devices["b1"].link_id.as_deref(), Some("L1"));
        assert!(out.topology.is_adjacent("B", "L2"));
        assert_eq!(out.problems.len(), 1);
    }

    #[test]
    fn test_adjacency_independent_of_list_order() {
        let a = build(
            &map(&[("A", &["d1", "d2", "d3"]), ("B", &["d4"])]),
            &map(&[("L1", &["d3", "d4"]), ("L2", &["d1"])]),
        );
        let b = build(
            &map(&[("B", &["d4"]), ("A", &["d3", "d1", "d2"])]),
            &map(&[("L2", &["d1"]), ("L1", &["d4", "d3"])]),
        );
        assert_eq!(a.topology, b.topology);
        assert_eq!(a.topology.links_of("A").collect::<Vec<_>>(), vec!["L1", "L2"]);
    }

    #[test]
    fn test_no_duplicate_pairs() {
        let out = build(&map(&[("A", &["d1", "d2"])]), &map(&[("L1", &["d1", "d2"])]));
        assert_eq!(out.topology.edge_count(), 1);
    }

    #[test]
    fn test_orphan_device_recorded_without_mount_point() {
        let out = build(&map(&[("A", &["d1"])]), &map(&[("L1", &["d1", "d9"])]));

        assert_eq!(
            out.problems,
            vec![Problem::OrphanDevice { device: "d9".into(), link: "L1".into() }]
        );
        let orphan = &out.devices["d9"];
        assert!(orphan.mount_point_id.is_none());
        assert_eq!(orphan.link_id.as_deref(), Some("L1"));
        assert_eq!(out.topology.links_of("A").collect::<Vec<_>>(), vec!["L1"]);
    }

    #[test]
    fn test_node_conflict_first_seen_wins() {
        let out = build(&map(&[("A", &["d1"]), ("B", &["d1", "d2"])]), &DeviceMap::new());

        assert_eq!(out.devices["d1"].mount_point_id.as_deref(), Some("A"));
        assert_eq!(out.devices["d2"].mount_point_id.as_deref(), Some("B"));
        assert_eq!(
            out.problems,
            vec![Problem::AssignmentConflict {
                map: MapKind::Node,
                device: "d1".into(),
                kept: "A".into(),
                rejected: "B".into(),
            }]
        );
    }

    #[test]
    fn test_conflicting_device_still_links_every_listed_node() {
        let out = build(&map(&[("A", &["d1"]), ("B", &["d1"])]), &map(&[("L1", &["d1"])]));
        assert!(out.topology.is_adjacent("A", "L1"));
        assert!(out.topology.is_adjacent("B", "L1"));
    }

    #[test]
    fn test_repeated_hostname_in_same_list_is_not_a_conflict() {
        let out = build(&map(&[("A", &["d1", "d1"])]), &map(&[("L1", &["d1", "d1"])]));
        assert!(out.problems.is_empty());
        assert_eq!(out.devices.len(), 1);
    }
}
