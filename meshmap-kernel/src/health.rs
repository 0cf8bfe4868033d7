use crate::state::Snapshot;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct KernelHealth {
    pub uptime_seconds: u64,
    pub cycles_completed: u64,
    pub cycles_skipped: u64,
    pub features_tracked: usize,
    pub devices_tracked: usize,
    pub last_cycle_at: Option<String>,
    pub last_problem_count: usize,
    pub mqtt_status: String,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    cycles_completed: Arc<AtomicU64>,
    cycles_skipped: Arc<AtomicU64>,
    mqtt_status: Arc<parking_lot::Mutex<String>>,
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            cycles_completed: Arc::new(AtomicU64::new(0)),
            cycles_skipped: Arc::new(AtomicU64::new(0)),
            mqtt_status: Arc::new(parking_lot::Mutex::new("disabled".to_string())),
        }
    }

    /// Returns the number of the cycle just completed (1-based).
    pub fn record_cycle(&self) -> u64 {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_skipped(&self) {
        self.cycles_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    pub fn set_mqtt_status(&self, status: &str) {
        *self.mqtt_status.lock() = status.to_string();
    }

    pub fn get_health(&self, snapshot: &Snapshot) -> KernelHealth {
        KernelHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            cycles_skipped: self.cycles_skipped.load(Ordering::Relaxed),
            features_tracked: snapshot.registry.len(),
            devices_tracked: snapshot.devices.len(),
            last_cycle_at: snapshot.report.as_ref().map(|r| r.completed_at.clone()),
            last_problem_count: snapshot.report.as_ref().map_or(0, |r| r.problems.len()),
            mqtt_status: self.mqtt_status.lock().clone(),
        }
    }
}
