use crate::cycle::CycleReport;
use crate::device::DeviceSet;
use crate::registry::FeatureRegistry;
use crate::topology::Topology;
use parking_lot::Mutex;
use std::sync::Arc;

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Last completed cycle, as served to readers. Replaced whole, never patched.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub registry: FeatureRegistry,
    pub topology: Topology,
    pub devices: DeviceSet,
    pub report: Option<CycleReport>,
}

impl Snapshot {
    /// Spatial data before any cycle has run.
    pub fn initial(registry: FeatureRegistry) -> Self {
        Self { registry, ..Self::default() }
    }
}
