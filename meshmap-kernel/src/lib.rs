/*!
# meshmap-kernel

Deployment health of a wireless mesh, from two independent inputs:
the surveyors' spatial inventory (mount points, links) and the installers'
roster (which radio hangs where, on which link).

Each cycle joins the two by description, builds the mount point / link
graph, probes every radio and rolls the results up into one status per
feature for the map.
*/

pub mod aggregate;
pub mod config;
pub mod cycle;
pub mod device;
pub mod error;
pub mod feature;
pub mod geo;
pub mod health;
pub mod http;
pub mod mqtt;
pub mod poller;
pub mod probe;
pub mod registry;
pub mod resolver;
pub mod roster;
pub mod state;
pub mod status;
pub mod store;
pub mod topology;

pub use aggregate::{aggregate, AggregationReport, NO_DEVICES};
pub use cycle::{correlate, run_cycle, Correlation, CycleOutcome, CycleReport};
pub use device::{DeviceRecord, DeviceSet, TestDimension};
pub use error::{FeatureError, MapKind, Problem, StoreError};
pub use feature::{Geometry, Properties, SpatialFeature, Subtype};
pub use probe::{Probe, ProbeSet};
pub use registry::FeatureRegistry;
pub use resolver::{resolve, DeviceMap, NameIndex};
pub use roster::RosterRow;
pub use status::{OverallStatus, TestStatus};
pub use topology::Topology;
