//! Periodic cycle driver.
//!
//! Spatial data is loaded once at startup; the roster is re-read on every
//! tick since installers keep editing it. Each cycle works on a private copy
//! of the registry and swaps the finished snapshot in at the end.

use crate::config::KernelConfig;
use crate::cycle::run_cycle;
use crate::health::HealthTracker;
use crate::mqtt::StatusPublisher;
use crate::probe::ProbeSet;
use crate::roster::load_roster;
use crate::state::{Shared, Snapshot};
use crate::store::write_collection;
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct Poller {
    pub config: KernelConfig,
    pub probes: ProbeSet,
    pub snapshot: Shared<Snapshot>,
    pub health: HealthTracker,
    pub publisher: Option<StatusPublisher>,
}

impl Poller {
    /// Runs one cycle and publishes its result. Returns false when the
    /// roster could not be read and the previous snapshot was kept.
    pub async fn tick(&self) -> bool {
        let rows = match load_roster(&self.config.roster.path) {
            Ok(load) => load.rows,
            Err(e) => {
                tracing::error!(error = %e, "roster unavailable, keeping previous status");
                self.health.record_skipped();
                return false;
            }
        };

        let mut registry = self.snapshot.lock().registry.clone();
        let cycle = self.health.cycles_completed() + 1;
        let outcome = run_cycle(cycle, &mut registry, &rows, &self.probes).await;

        if let Some(output) = &self.config.output {
            if let Err(e) = write_collection(&output.path, &registry) {
                tracing::error!(error = %e, "failed to write status collection");
            }
        }
        if let Some(publisher) = &self.publisher {
            publisher.publish(&outcome.report);
        }

        *self.snapshot.lock() = Snapshot {
            registry,
            topology: outcome.topology,
            devices: outcome.devices,
            report: Some(outcome.report),
        };
        self.health.record_cycle();
        true
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let secs = self.config.poll_interval_secs.max(1);
            tracing::info!(interval_secs = secs, "starting poll loop");
            let mut interval = tokio::time::interval(Duration::from_secs(secs));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.tick().await;
            }
        })
    }
}
