/*!
Test harness for meshmap cycles

Holds a survey registry, a roster and one scripted probe per test, runs
complete cycles in memory and offers assertions on what the map would show.
*/

use crate::fixtures::{registry_of, FeatureBuilder, RosterBuilder};
use crate::probe_stub::ScriptedProbe;
use meshmap_kernel::feature::{LOGIN_STATUS, PING_STATUS, RADIO_STATUS};
use meshmap_kernel::{
    run_cycle, CycleOutcome, FeatureRegistry, OverallStatus, Probe, Problem, RosterRow, TestDimension,
    TestStatus,
};
use serde_json::Value;

pub struct TestHarness {
    pub registry: FeatureRegistry,
    pub roster: Vec<RosterRow>,
    pub ping: ScriptedProbe,
    pub login: ScriptedProbe,
    pub radio: ScriptedProbe,
    cycles: u64,
    last: Option<CycleOutcome>,
}

impl TestHarness {
    pub fn new(features: impl IntoIterator<Item = FeatureBuilder>, roster: RosterBuilder) -> Self {
        init_tracing();
        Self {
            registry: registry_of(features),
            roster: roster.build(),
            ping: ScriptedProbe::new(TestDimension::Ping),
            login: ScriptedProbe::new(TestDimension::Login),
            radio: ScriptedProbe::new(TestDimension::Radio),
            cycles: 0,
            last: None,
        }
    }

    /// Scripts the ping result of a device.
    pub fn ping(&self, hostname: &str, status: TestStatus) -> &Self {
        self.ping.set(hostname, status);
        self
    }

    pub async fn run_cycle(&mut self) -> &CycleOutcome {
        self.cycles += 1;
        let probes: Vec<Box<dyn Probe>> = vec![
            Box::new(self.ping.clone()),
            Box::new(self.login.clone()),
            Box::new(self.radio.clone()),
        ];
        let outcome = run_cycle(self.cycles, &mut self.registry, &self.roster, &probes).await;
        tracing::debug!(cycle = self.cycles, problems = outcome.report.problems.len(), "harness cycle done");
        self.last.insert(outcome)
    }

    /// Last cycle's outcome; panics before the first cycle.
    pub fn outcome(&self) -> &CycleOutcome {
        match &self.last {
            Some(outcome) => outcome,
            None => panic!("no cycle has run yet"),
        }
    }

    pub fn property(&self, feature_id: &str, key: &str) -> Option<&Value> {
        self.registry.get(feature_id).and_then(|f| f.properties.get(key))
    }

    pub fn summary(&self, feature_id: &str, dimension: TestDimension) -> Option<&str> {
        let key = match dimension {
            TestDimension::Ping => PING_STATUS,
            TestDimension::Login => LOGIN_STATUS,
            TestDimension::Radio => RADIO_STATUS,
        };
        self.property(feature_id, key).and_then(Value::as_str)
    }

    pub fn assert_overall(&self, feature_id: &str, expected: OverallStatus) {
        let actual = self.registry.get(feature_id).and_then(|f| f.overall_status());
        assert_eq!(actual, Some(expected), "overall status of {feature_id}");
    }

    pub fn assert_summary(&self, feature_id: &str, dimension: TestDimension, expected: &str) {
        assert_eq!(self.summary(feature_id, dimension), Some(expected), "{dimension} summary of {feature_id}");
    }

    pub fn assert_adjacent(&self, node_id: &str, link_id: &str) {
        assert!(
            self.outcome().topology.is_adjacent(node_id, link_id),
            "expected {node_id} adjacent to {link_id}"
        );
    }

    pub fn assert_problem(&self, expected: &Problem) {
        let problems = &self.outcome().report.problems;
        assert!(problems.contains(expected), "expected {expected} in {problems:?}");
    }

    pub fn assert_no_problems(&self) {
        let problems = &self.outcome().report.problems;
        assert!(problems.is_empty(), "unexpected problems: {problems:?}");
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshmap_kernel::{MapKind, NO_DEVICES};

    fn survey() -> Vec<FeatureBuilder> {
        vec![
            FeatureBuilder::mountpoint("A").desc("Pole A"),
            FeatureBuilder::mountpoint("B").desc("Pole B"),
            FeatureBuilder::site("S").desc("Library"),
            FeatureBuilder::link("L1").desc("A to B"),
        ]
    }

    fn roster() -> RosterBuilder {
        RosterBuilder::new()
            .sector("d1", "Pole A", "")
            .sector("d2", "Pole A", "A to B")
    }

    #[tokio::test]
    async fn test_mixed_pings_give_partial_up() {
        let mut h = TestHarness::new(survey(), roster());
        h.ping("d1", TestStatus::Up).ping("d2", TestStatus::Down);
        h.run_cycle().await;

        h.assert_adjacent("A", "L1");
        h.assert_overall("A", OverallStatus::PartialUp);
        h.assert_summary("A", TestDimension::Ping, "d1: up\nd2: down");
        h.assert_overall("L1", OverallStatus::Down);
        h.assert_summary("L1", TestDimension::Ping, "d2: down");
        h.assert_no_problems();
    }

    #[tokio::test]
    async fn test_feature_without_devices_is_unknown() {
        let mut h = TestHarness::new(survey(), roster());
        h.ping("d1", TestStatus::Up).ping("d2", TestStatus::Up);
        h.run_cycle().await;

        h.assert_overall("A", OverallStatus::Up);
        h.assert_overall("B", OverallStatus::Unknown);
        h.assert_overall("S", OverallStatus::Unknown);
        for dimension in TestDimension::ALL {
            h.assert_summary("B", dimension, NO_DEVICES);
        }
        assert_eq!(h.property("B", "marker-color"), Some(&Value::from("#ffffff")));
    }

    #[tokio::test]
    async fn test_unknown_location_is_reported_not_fatal() {
        let roster = roster().sector("d3", "Tower 7", "");
        let mut h = TestHarness::new(survey(), roster);
        h.ping("d1", TestStatus::Up).ping("d2", TestStatus::Up).ping("d3", TestStatus::Up);
        h.run_cycle().await;

        h.assert_problem(&Problem::UnresolvedName { map: MapKind::Node, description: "Tower 7".into() });
        assert!(!h.outcome().devices.contains_key("d3"));
        assert!(!h.ping.calls().contains(&"d3".to_string()));
        h.assert_overall("A", OverallStatus::Up);
    }

    #[tokio::test]
    async fn test_status_follows_probes_across_cycles() {
        let mut h = TestHarness::new(survey(), roster());
        h.ping("d1", TestStatus::Down).ping("d2", TestStatus::Down);
        h.run_cycle().await;
        h.assert_overall("A", OverallStatus::Down);

        h.ping("d1", TestStatus::Up).ping("d2", TestStatus::Up);
        let outcome = h.run_cycle().await;
        assert_eq!(outcome.report.cycle, 2);
        h.assert_overall("A", OverallStatus::Up);
        assert_eq!(h.property("A", "marker-color"), Some(&Value::from("#00f900")));
    }

    #[tokio::test]
    async fn test_every_device_probed_once_per_dimension() {
        let mut h = TestHarness::new(survey(), roster().planned("d9", "Pole B"));
        h.run_cycle().await;

        let mut calls = h.ping.calls();
        calls.sort();
        assert_eq!(calls, vec!["d1", "d2"]);
        assert_eq!(h.login.calls().len(), 2);
        assert_eq!(h.radio.calls().len(), 2);

        // all unknown pings fit no rollup rule
        h.assert_problem(&Problem::AggregationAmbiguity { feature: "A".into() });
        h.assert_overall("A", OverallStatus::Unknown);
    }
}
