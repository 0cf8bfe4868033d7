/**
 * SPATIAL STORE - GeoJSON files in and out of the feature registry
 *
 * ROLE :
 * Surveys are kept as GeoJSON, either one FeatureCollection file or a folder
 * tree of single-feature files (`<subtype>-objects/<id>.json`).
 *
 * OPERATION :
 * - file-level failures (unreadable, not JSON) abort the load
 * - feature-level failures (bad subtype, bad geometry, duplicate id) skip that
 *   feature and are returned in `LoadOutcome::errors`
 * - features without an id get a fresh UUID
 */

use crate::error::{FeatureError, StoreError};
use crate::feature::{Geometry, Properties, SpatialFeature, SUBTYPE};
use crate::registry::FeatureRegistry;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub loaded: usize,
    pub errors: Vec<StoreError>,
}

impl LoadOutcome {
    fn merge(&mut self, other: LoadOutcome) {
        self.loaded += other.loaded;
        self.errors.extend(other.errors);
    }
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    id: Option<Value>,
    geometry: Value,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Deserialize)]
struct RawCollection {
    features: Vec<Value>,
}

fn id_string(id: Option<Value>) -> String {
    match id {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

/// Builds a feature from one GeoJSON `Feature` object.
pub fn feature_from_geojson(value: Value) -> Result<SpatialFeature, FeatureError> {
    let raw: RawFeature = serde_json::from_value(value).map_err(|e| FeatureError::InvalidGeometry {
        id: "<unparsed>".into(),
        reason: e.to_string(),
    })?;
    let id = id_string(raw.id);
    let properties = raw.properties.unwrap_or_default();

    let geometry: Geometry = serde_json::from_value(raw.geometry)
        .map_err(|e| FeatureError::InvalidGeometry { id: id.clone(), reason: e.to_string() })?;
    let subtype = properties
        .get(SUBTYPE)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| FeatureError::MissingSubtype { id: id.clone() })?;

    SpatialFeature::new(id, &subtype, geometry, properties)
}

fn read_json(path: &Path) -> Result<Value, StoreError> {
    let text = fs::read_to_string(path).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_str(&text).map_err(|source| StoreError::Json { path: path.to_path_buf(), source })
}

fn add_feature(registry: &mut FeatureRegistry, path: &Path, value: Value, outcome: &mut LoadOutcome) {
    let result = feature_from_geojson(value).and_then(|f| registry.insert(f));
    match result {
        Ok(()) => outcome.loaded += 1,
        Err(source) => {
            tracing::warn!(path = %path.display(), error = %source, "skipping feature");
            outcome.errors.push(StoreError::Feature { path: path.to_path_buf(), source });
        }
    }
}

/// Loads a GeoJSON FeatureCollection file.
pub fn load_collection(path: &Path, registry: &mut FeatureRegistry) -> Result<LoadOutcome, StoreError> {
    let collection: RawCollection = serde_json::from_value(read_json(path)?)
        .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })?;

    let mut outcome = LoadOutcome::default();
    for value in collection.features {
        add_feature(registry, path, value, &mut outcome);
    }
    tracing::info!(path = %path.display(), loaded = outcome.loaded, skipped = outcome.errors.len(), "collection loaded");
    Ok(outcome)
}

/// Loads every `.json`/`.geojson` single-feature file under `dir`.
pub fn load_folder(dir: &Path, registry: &mut FeatureRegistry) -> Result<LoadOutcome, StoreError> {
    let mut outcome = LoadOutcome::default();
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|source| StoreError::Io { path: dir.to_path_buf(), source })?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            outcome.merge(load_folder(&path, registry)?);
            continue;
        }
        let is_geojson = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("json") | Some("geojson")
        );
        if !is_geojson {
            continue;
        }
        match read_json(&path) {
            Ok(value) => add_feature(registry, &path, value, &mut outcome),
            Err(e) => {
                tracing::warn!(error = %e, "unable to load feature file");
                outcome.errors.push(e);
            }
        }
    }
    Ok(outcome)
}

/// Folder -> `load_folder`, file -> `load_collection`.
pub fn load_path(path: &Path, registry: &mut FeatureRegistry) -> Result<LoadOutcome, StoreError> {
    if path.is_dir() {
        load_folder(path, registry)
    } else {
        load_collection(path, registry)
    }
}

/// FeatureCollection of the whole registry, ordered by id.
pub fn to_collection(registry: &FeatureRegistry) -> Value {
    let features: Vec<Value> = registry.all().map(SpatialFeature::to_geojson).collect();
    json!({ "type": "FeatureCollection", "features": features })
}

fn write_pretty(path: &Path, value: &Value) -> Result<(), StoreError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })?;
    fs::write(path, text).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })
}

pub fn write_collection(path: &Path, registry: &FeatureRegistry) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
    }
    write_pretty(path, &to_collection(registry))
}

/// File name for a feature id: separators, `%` and a leading dot are
/// percent-escaped so every id stays inside its folder. The id itself is read
/// back from the file content, not the name.
fn file_name(id: &str) -> String {
    let mut name = String::with_capacity(id.len() + 5);
    for (i, c) in id.chars().enumerate() {
        match c {
            '/' => name.push_str("%2F"),
            '\\' => name.push_str("%5C"),
            '%' => name.push_str("%25"),
            '.' if i == 0 => name.push_str("%2E"),
            c => name.push(c),
        }
    }
    name.push_str(".json");
    name
}

/// One file per feature under `<dir>/<subtype>-objects/<id>.json`.
pub fn write_folder(dir: &Path, registry: &FeatureRegistry) -> Result<(), StoreError> {
    for feature in registry.all() {
        let sub = dir.join(format!("{}-objects", feature.subtype()));
        fs::create_dir_all(&sub).map_err(|source| StoreError::Io { path: sub.clone(), source })?;
        write_pretty(&sub.join(file_name(feature.id())), &feature.to_geojson())?;
    }
    Ok(())
}
