/**
 * MESHMAP KERNEL - Service entry point
 *
 * ROLE : loads config and spatial data, starts the poll loop (roster ->
 * topology -> probes -> status rollup), the optional MQTT publisher and the
 * HTTP read API.
 */

use anyhow::Context;
use meshmap_kernel::config::{config_path, load_config};
use meshmap_kernel::health::HealthTracker;
use meshmap_kernel::http::{build_router, AppState};
use meshmap_kernel::mqtt::spawn_status_publisher;
use meshmap_kernel::poller::Poller;
use meshmap_kernel::probe::probes_from_config;
use meshmap_kernel::registry::FeatureRegistry;
use meshmap_kernel::state::{new_state, Snapshot};
use meshmap_kernel::store::load_path;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = config_path();
    let cfg = load_config(&path).with_context(|| format!("loading {}", path.display()))?;

    let mut registry = FeatureRegistry::new();
    let loaded = load_path(&cfg.spatial.path, &mut registry)
        .with_context(|| format!("loading spatial data from {}", cfg.spatial.path.display()))?;
    tracing::info!(
        features = loaded.loaded,
        skipped = loaded.errors.len(),
        mountpoints = registry.mountpoints().count(),
        links = registry.links().count() + registry.observations().count(),
        "spatial data loaded"
    );

    let probes = probes_from_config(&cfg.probes).context("invalid probe configuration")?;
    let health = HealthTracker::new();
    let snapshot = new_state(Snapshot::initial(registry));
    let publisher = cfg.mqtt.clone().map(|m| spawn_status_publisher(m, health.clone()));

    let listen = cfg.http.listen.clone();
    Poller {
        config: cfg,
        probes,
        snapshot: snapshot.clone(),
        health: health.clone(),
        publisher,
    }
    .spawn();

    let app = build_router(AppState { snapshot, health });
    let listener = TcpListener::bind(&listen)
        .await
        .with_context(|| format!("binding {listen}"))?;
    tracing::info!("listening on http://{listen}");
    axum::serve(listener, app).await?;
    Ok(())
}
