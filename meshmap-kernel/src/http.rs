/**
 * HTTP API - Read side of the kernel
 *
 * ROLE :
 * Exposes the last completed cycle to the map renderer and to operators.
 *
 * ROUTES :
 * - /health          uptime, cycle counters, last problem count
 * - /features        GeoJSON FeatureCollection with status properties
 * - /features/{id}   one feature
 * - /devices         device records with assignments and test results
 * - /topology        mount point -> adjacent links
 * - /problems        data problems found by the last cycle
 *
 * SECURITY :
 * When MESHMAP_API_KEY is set, every route except /health needs a matching
 * x-api-key header.
 */

use crate::device::DeviceRecord;
use crate::error::Problem;
use crate::health::{HealthTracker, KernelHealth};
use crate::state::{Shared, Snapshot};
use crate::store::to_collection;
use crate::topology::Adjacency;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

pub const API_KEY_ENV: &str = "MESHMAP_API_KEY";

#[derive(Clone)]
pub struct AppState {
    pub snapshot: Shared<Snapshot>,
    pub health: HealthTracker,
}

async fn require_api_key(req: Request, next: Next) -> Result<Response, StatusCode> {
    if req.uri().path().starts_with("/health") {
        return Ok(next.run(req).await);
    }

    let expected = std::env::var(API_KEY_ENV).unwrap_or_default();
    if expected.is_empty() {
        return Ok(next.run(req).await);
    }

    let ok = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !ok {
        tracing::warn!(path = %req.uri().path(), "rejected request without valid api key");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/features", get(get_features))
        .route("/features/{id}", get(get_feature))
        .route("/devices", get(get_devices))
        .route("/topology", get(get_topology))
        .route("/problems", get(get_problems))
        .with_state(app_state)
        .layer(middleware::from_fn(require_api_key))
}

async fn get_health(State(app): State<AppState>) -> Json<KernelHealth> {
    let health = app.health.get_health(&app.snapshot.lock());
    Json(health)
}

async fn get_features(State(app): State<AppState>) -> Json<Value> {
    let collection = to_collection(&app.snapshot.lock().registry);
    Json(collection)
}

async fn get_feature(State(app): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    let feature = app.snapshot.lock().registry.get(&id).map(|f| f.to_geojson());
    feature.map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn get_devices(State(app): State<AppState>) -> Json<Vec<DeviceRecord>> {
    let devices = app.snapshot.lock().devices.values().cloned().collect();
    Json(devices)
}

async fn get_topology(State(app): State<AppState>) -> Json<Adjacency> {
    let adjacency = app.snapshot.lock().topology.adjacency().clone();
    Json(adjacency)
}

async fn get_problems(State(app): State<AppState>) -> Json<Vec<Problem>> {
    let problems = app.snapshot.lock().report.as_ref().map(|r| r.problems.clone());
    Json(problems.unwrap_or_default())
}
