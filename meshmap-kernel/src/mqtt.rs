//! Publishes a short status summary to MQTT after every cycle, for
//! dashboards that would rather subscribe than poll the HTTP API.

use crate::config::MqttConf;
use crate::cycle::CycleReport;
use crate::health::HealthTracker;
use crate::status::OverallStatus;
use rumqttc::{AsyncClient, MqttOptions, QoS};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task;

#[derive(Debug, Serialize, PartialEq)]
pub struct StatusSummary {
    pub cycle: u64,
    pub completed_at: String,
    pub features: usize,
    pub devices: usize,
    pub counts: BTreeMap<OverallStatus, usize>,
    pub problems: usize,
}

impl From<&CycleReport> for StatusSummary {
    fn from(r: &CycleReport) -> Self {
        Self {
            cycle: r.cycle,
            completed_at: r.completed_at.clone(),
            features: r.features,
            devices: r.devices,
            counts: r.counts.clone(),
            problems: r.problems.len(),
        }
    }
}

#[derive(Clone)]
pub struct StatusPublisher {
    tx: mpsc::Sender<String>,
}

impl StatusPublisher {
    /// Queues the summary; drops it if the broker is too far behind.
    pub fn publish(&self, report: &CycleReport) {
        match serde_json::to_string(&StatusSummary::from(report)) {
            Ok(payload) => {
                if self.tx.try_send(payload).is_err() {
                    tracing::warn!(cycle = report.cycle, "mqtt queue full, dropping status summary");
                }
            }
            Err(e) => tracing::error!(error = %e, "cannot encode status summary"),
        }
    }
}

/// Hands a payload to the client without waiting. The client queue only drains
/// while the event loop is connected, so a full queue drops the summary
/// instead of stalling the loop that would reconnect it.
fn forward(client: &AsyncClient, topic: &str, payload: String) -> bool {
    match client.try_publish(topic, QoS::AtLeastOnce, false, payload) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = ?e, topic = %topic, "mqtt client busy, dropping status summary");
            false
        }
    }
}

/// Starts the MQTT task and returns the handle used to feed it.
pub fn spawn_status_publisher(conf: MqttConf, health: HealthTracker) -> StatusPublisher {
    let (tx, mut rx) = mpsc::channel::<String>(16);

    task::spawn(async move {
        let mut opts = MqttOptions::new("meshmap-kernel-status", &conf.host, conf.port);
        opts.set_keep_alive(Duration::from_secs(15));
        let (client, mut eventloop) = AsyncClient::new(opts, 10);
        health.set_mqtt_status("connecting");

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(payload) = msg else { break };
                    forward(&client, &conf.topic, payload);
                }
                event = eventloop.poll() => {
                    match event {
                        Ok(rumqttc::Event::Incoming(rumqttc::Incoming::ConnAck(_))) => {
                            health.set_mqtt_status("connected");
                            tracing::info!(host = %conf.host, port = conf.port, "mqtt connected");
                        }
                        Ok(_) => {}
                        Err(e) => {
                            health.set_mqtt_status("reconnecting");
                            tracing::warn!(error = ?e, "mqtt error");
                            tokio::time::sleep(Duration::from_secs(2)).await;
                        }
                    }
                }
            }
        }
    });

    StatusPublisher { tx }
}
