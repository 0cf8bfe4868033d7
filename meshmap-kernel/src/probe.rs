/**
 * PROBES - Boundary with the per-device checks
 *
 * ROLE :
 * Fill ping/login/radio results onto the cycle's device records. The
 * aggregation pass only reads those results, so every probe of the cycle is
 * joined here before anything is aggregated.
 *
 * OPERATION :
 * - CommandProbe runs an external command per device (`ping -6 -c 1 ...`),
 *   exit 0 -> up, anything else (non-zero, spawn failure, timeout) -> down
 * - UnconfiguredProbe reports unknown, for checks not wired up yet
 * - devices without an admin address stay unknown
 */

use crate::config::{ProbeConf, ProbesConf};
use crate::device::{DeviceRecord, DeviceSet, TestDimension};
use crate::status::TestStatus;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub trait Probe: Send + Sync {
    fn dimension(&self) -> TestDimension;

    fn check<'a>(&'a self, device: &'a DeviceRecord) -> BoxFuture<'a, TestStatus>;
}

#[derive(Debug, Clone)]
pub struct CommandProbe {
    dimension: TestDimension,
    argv: Vec<String>,
    timeout: Duration,
}

impl CommandProbe {
    /// `template` is split shell-style; `{address}` and `{hostname}` are
    /// substituted per device.
    pub fn new(dimension: TestDimension, template: &str, timeout: Duration) -> anyhow::Result<Self> {
        let argv = shell_words::split(template)?;
        if argv.is_empty() {
            anyhow::bail!("empty {dimension} probe command");
        }
        Ok(Self { dimension, argv, timeout })
    }

    fn render(&self, device: &DeviceRecord, address: &str) -> Vec<String> {
        self.argv
            .iter()
            .map(|arg| arg.replace("{address}", address).replace("{hostname}", &device.id))
            .collect()
    }

    async fn run(&self, device: &DeviceRecord) -> TestStatus {
        let Some(address) = device.admin_address.as_deref() else {
            return TestStatus::Unknown;
        };
        let argv = self.render(device, address);

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.status()).await {
            Ok(Ok(status)) if status.success() => TestStatus::Up,
            Ok(Ok(status)) => {
                tracing::debug!(device = %device.id, probe = %self.dimension, code = ?status.code(), "probe failed");
                TestStatus::Down
            }
            Ok(Err(e)) => {
                tracing::warn!(device = %device.id, probe = %self.dimension, error = %e, "probe could not start");
                TestStatus::Down
            }
            Err(_) => {
                tracing::debug!(device = %device.id, probe = %self.dimension, "probe timed out");
                TestStatus::Down
            }
        }
    }
}

impl Probe for CommandProbe {
    fn dimension(&self) -> TestDimension {
        self.dimension
    }

    fn check<'a>(&'a self, device: &'a DeviceRecord) -> BoxFuture<'a, TestStatus> {
        self.run(device).boxed()
    }
}

/// A check with nothing behind it yet: always `unknown`.
#[derive(Debug, Clone, Copy)]
pub struct UnconfiguredProbe(pub TestDimension);

impl Probe for UnconfiguredProbe {
    fn dimension(&self) -> TestDimension {
        self.0
    }

    fn check<'a>(&'a self, _device: &'a DeviceRecord) -> BoxFuture<'a, TestStatus> {
        futures::future::ready(TestStatus::Unknown).boxed()
    }
}

pub type ProbeSet = Vec<Box<dyn Probe>>;

/// One probe per dimension, from the `probes` config section.
pub fn probes_from_config(conf: &ProbesConf) -> anyhow::Result<ProbeSet> {
    let timeout = Duration::from_secs(conf.timeout_secs);
    let entry = |dimension: TestDimension, probe: &Option<ProbeConf>| -> anyhow::Result<Box<dyn Probe>> {
        Ok(match probe {
            Some(p) => Box::new(CommandProbe::new(dimension, &p.command, timeout)?) as Box<dyn Probe>,
            None => Box::new(UnconfiguredProbe(dimension)) as Box<dyn Probe>,
        })
    };
    Ok(vec![
        entry(TestDimension::Ping, &conf.ping)?,
        entry(TestDimension::Login, &conf.login)?,
        entry(TestDimension::Radio, &conf.radio)?,
    ])
}

/// Runs every probe against every device concurrently and writes the results
/// back once all of them have finished.
pub async fn run_probes(devices: &mut DeviceSet, probes: &[Box<dyn Probe>]) {
    let jobs = devices.values().flat_map(move |device| {
        probes.iter().map(move |probe| async move {
            (device.id.clone(), probe.dimension(), probe.check(device).await)
        })
    });
    let results = join_all(jobs).await;

    for (id, dimension, status) in results {
        if let Some(device) = devices.get_mut(&id) {
            device.set_status(dimension, status);
        }
    }
    tracing::info!(devices = devices.len(), probes = probes.len(), "probes finished");
}
