/*!
# meshmap DevKit - fixtures and harness for kernel tests

- Builders for spatial features and roster rows
- A scripted probe standing in for ping/login/radio checks
- A harness that runs complete cycles in memory and asserts on the result
*/

pub mod fixtures;
pub mod probe_stub;
pub mod test_utils;

pub use fixtures::{FeatureBuilder, RosterBuilder};
pub use probe_stub::ScriptedProbe;
pub use test_utils::TestHarness;
