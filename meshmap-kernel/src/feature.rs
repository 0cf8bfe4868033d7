/**
 * SPATIAL FEATURES - Canonical entities of the deployment survey
 *
 * ROLE :
 * A feature is one surveyed thing with a stable id: a site (street lamp,
 * building), a mount point (a ~1 m cube on a site where radios are bolted),
 * or an observation/link between two mount points.
 *
 * OPERATION :
 * - Construction validates subtype and geometry, normalizes coordinates
 * - `properties` is an open JSON map; `desc` is the human name the install
 *   roster refers to, the status keys are rewritten on every aggregation pass
 * - Styling helpers write the keys the map renderer reads
 */

use crate::error::FeatureError;
use crate::geo::{distance, round_to};
use crate::status::OverallStatus;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

pub type Properties = Map<String, Value>;

pub const DESC: &str = "desc";
pub const SUBTYPE: &str = "subtype";
pub const PING_STATUS: &str = "Ping Status";
pub const LOGIN_STATUS: &str = "Login Status";
pub const RADIO_STATUS: &str = "Radio Status";
pub const OVERALL_STATUS: &str = "Overall Status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subtype {
    Site,
    Mountpoint,
    Observation,
    Link,
}

impl Subtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subtype::Site => "site",
            Subtype::Mountpoint => "mountpoint",
            Subtype::Observation => "observation",
            Subtype::Link => "link",
        }
    }

    /// Edge-like features connect two mount points; devices attach to them
    /// through their radio link rather than their mount point.
    pub fn is_edge(&self) -> bool {
        matches!(self, Subtype::Observation | Subtype::Link)
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subtype {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "site" => Ok(Subtype::Site),
            "mountpoint" => Ok(Subtype::Mountpoint),
            "observation" => Ok(Subtype::Observation),
            "link" => Ok(Subtype::Link),
            _ => Err(()),
        }
    }
}

/// GeoJSON geometry restricted to what the survey produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    /// `[lon, lat]` or `[lon, lat, alt]`
    Point(Vec<f64>),
    /// exactly two positions
    LineString(Vec<Vec<f64>>),
}

fn check_position(id: &str, position: &[f64]) -> Result<(), FeatureError> {
    if position.len() == 2 || position.len() == 3 {
        Ok(())
    } else {
        Err(FeatureError::InvalidGeometry {
            id: id.to_string(),
            reason: format!("position needs 2 or 3 coordinates, got {}", position.len()),
        })
    }
}

/// Survey precision is ~10 cm: 6 decimals of degree, 1 decimal of altitude.
fn normalize_position(position: &mut [f64]) {
    for (i, c) in position.iter_mut().enumerate() {
        *c = if i < 2 { round_to(*c, 6) } else { round_to(*c, 1) };
    }
}

impl Geometry {
    fn validate(&self, id: &str) -> Result<(), FeatureError> {
        match self {
            Geometry::Point(p) => check_position(id, p),
            Geometry::LineString(line) => {
                if line.len() != 2 {
                    return Err(FeatureError::InvalidGeometry {
                        id: id.to_string(),
                        reason: format!("line needs exactly 2 positions, got {}", line.len()),
                    });
                }
                line.iter().try_for_each(|p| check_position(id, p))
            }
        }
    }

    fn normalize(&mut self) {
        match self {
            Geometry::Point(p) => normalize_position(p),
            Geometry::LineString(line) => line.iter_mut().for_each(|p| normalize_position(p)),
        }
    }

    pub fn is_line(&self) -> bool {
        matches!(self, Geometry::LineString(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpatialFeature {
    id: String,
    subtype: Subtype,
    geometry: Geometry,
    pub properties: Properties,
}

impl SpatialFeature {
    /// Validates and builds a feature. `subtype` is the raw survey string.
    pub fn new(
        id: impl Into<String>,
        subtype: &str,
        geometry: Geometry,
        properties: Properties,
    ) -> Result<Self, FeatureError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(FeatureError::EmptyId);
        }
        let subtype = subtype.parse::<Subtype>().map_err(|_| FeatureError::InvalidSubtype {
            id: id.clone(),
            value: subtype.to_string(),
        })?;
        geometry.validate(&id)?;

        let mut feature = Self { id, subtype, geometry, properties };
        feature.geometry.normalize();
        feature
            .properties
            .insert(SUBTYPE.to_string(), Value::String(subtype.as_str().to_string()));
        Ok(feature)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subtype(&self) -> Subtype {
        self.subtype
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Replaces the geometry under the same validation as construction.
    pub fn set_geometry(&mut self, mut geometry: Geometry) -> Result<(), FeatureError> {
        geometry.validate(&self.id)?;
        geometry.normalize();
        self.geometry = geometry;
        Ok(())
    }

    /// Human name used by the install roster, if present and non-empty.
    pub fn desc(&self) -> Option<&str> {
        self.properties
            .get(DESC)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    pub fn overall_status(&self) -> Option<OverallStatus> {
        self.properties
            .get(OVERALL_STATUS)
            .and_then(Value::as_str)
            .and_then(OverallStatus::parse)
    }

    /// Length in metres of a line feature, 0 for points.
    pub fn length(&self) -> f64 {
        match &self.geometry {
            Geometry::LineString(line) => match line.as_slice() {
                [a, b] => distance(a, b).unwrap_or(0.0),
                _ => 0.0,
            },
            Geometry::Point(_) => 0.0,
        }
    }

    /// Overwrites existing keys with the given ones.
    pub fn update_properties(&mut self, properties: Properties) {
        self.properties.extend(properties);
    }

    pub fn set_property(&mut self, key: &str, value: impl Into<Value>) {
        self.properties.insert(key.to_string(), value.into());
    }

    /// Drops properties holding an empty string and returns their keys.
    pub fn remove_unused_properties(&mut self) -> Vec<String> {
        let unused: Vec<String> = self
            .properties
            .iter()
            .filter(|(_, v)| v.as_str() == Some(""))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &unused {
            tracing::debug!(feature = %self.id, property = %key, "removing unused property");
            self.properties.remove(key);
        }
        unused
    }

    /// Writes the renderer's styling keys for a rolled-up status.
    pub fn apply_status_style(&mut self, status: OverallStatus) {
        let style = status.style();
        match self.geometry {
            Geometry::Point(_) => {
                self.set_property("marker-color", style.color_value);
                self.set_property("marker-size", "small");
            }
            Geometry::LineString(_) => {
                self.set_property("stroke", style.color);
                self.set_property("stroke-width", 1);
                self.set_property("stroke-opacity", 1);
            }
        }
    }

    /// GeoJSON `Feature` object.
    pub fn to_geojson(&self) -> Value {
        json!({
            "type": "Feature",
            "id": self.id,
            "geometry": self.geometry,
            "properties": self.properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(desc: &str) -> Properties {
        let mut p = Properties::new();
        p.insert(DESC.into(), Value::String(desc.into()));
        p
    }

    #[test]
    fn test_rejects_invalid_subtype() {
        let err = SpatialFeature::new("f1", "device", Geometry::Point(vec![0.0, 0.0]), props("x"))
            .unwrap_err();
        assert!(matches!(err, FeatureError::InvalidSubtype { .. }));
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let line = Geometry::LineString(vec![vec![0.0, 0.0]]);
        assert!(SpatialFeature::new("l1", "link", line, Properties::new()).is_err());

        let point = Geometry::Point(vec![1.0]);
        assert!(SpatialFeature::new("p1", "site", point, Properties::new()).is_err());

        assert!(matches!(
            SpatialFeature::new(" ", "site", Geometry::Point(vec![0.0, 0.0]), Properties::new()),
            Err(FeatureError::EmptyId)
        ));
    }

    #[test]
    fn test_normalizes_precision_and_records_subtype() {
        let geometry = Geometry::Point(vec![-122.147101234, 37.4845119876, 12.36]);
        let f = SpatialFeature::new("mp1", "mountpoint", geometry, props("Pole 1")).unwrap();
        assert_eq!(f.geometry(), &Geometry::Point(vec![-122.147101, 37.484512, 12.4]));
        assert_eq!(f.properties[SUBTYPE], "mountpoint");
        assert_eq!(f.desc(), Some("Pole 1"));
    }

    #[test]
    fn test_length_of_line_and_point() {
        let line = Geometry::LineString(vec![vec![0.0, 0.0], vec![0.0, 1.0]]);
        let link = SpatialFeature::new("l1", "link", line, Properties::new()).unwrap();
        assert!((link.length() - 111_194.9).abs() < 1.0);

        let site = SpatialFeature::new("s1", "site", Geometry::Point(vec![0.0, 0.0]), Properties::new())
            .unwrap();
        assert_eq!(site.length(), 0.0);
    }

    #[test]
    fn test_remove_unused_properties() {
        let mut p = props("Pole 2");
        p.insert("notes".into(), Value::String(String::new()));
        p.insert("height".into(), json!(4));
        let mut f = SpatialFeature::new("mp2", "mountpoint", Geometry::Point(vec![0.0, 0.0]), p).unwrap();

        let removed = f.remove_unused_properties();
        assert_eq!(removed, vec!["notes".to_string()]);
        assert!(f.properties.contains_key("height"));
    }

    #[test]
    fn test_empty_desc_is_absent() {
        let f = SpatialFeature::new("mp3", "mountpoint", Geometry::Point(vec![0.0, 0.0]), props("  "))
            .unwrap();
        assert_eq!(f.desc(), None);
    }

    #[test]
    fn test_status_style_by_geometry() {
        let mut point = SpatialFeature::new("mp", "mountpoint", Geometry::Point(vec![0.0, 0.0]), props("a"))
            .unwrap();
        point.apply_status_style(OverallStatus::Down);
        assert_eq!(point.properties["marker-color"], "#ff2600");

        let line = Geometry::LineString(vec![vec![0.0, 0.0], vec![0.001, 0.0]]);
        let mut link = SpatialFeature::new("l", "link", line, props("b")).unwrap();
        link.apply_status_style(OverallStatus::PartialUp);
        assert_eq!(link.properties["stroke"], "yellow");
        assert_eq!(link.properties["stroke-width"], 1);
    }

    #[test]
    fn test_geojson_shape() {
        let f = SpatialFeature::new("mp1", "mountpoint", Geometry::Point(vec![1.0, 2.0]), props("Pole"))
            .unwrap();
        let v = f.to_geojson();
        assert_eq!(v["type"], "Feature");
        assert_eq!(v["geometry"]["type"], "Point");
        assert_eq!(v["geometry"]["coordinates"], json!([1.0, 2.0]));
        assert_eq!(v["properties"]["desc"], "Pole");
    }

    #[test]
    fn test_set_geometry_keeps_line_valid() {
        let line = Geometry::LineString(vec![vec![0.0, 0.0], vec![0.0, 1.0]]);
        let mut link = SpatialFeature::new("l1", "link", line, Properties::new()).unwrap();

        assert!(link.set_geometry(Geometry::LineString(vec![])).is_err());
        assert!(link.set_geometry(Geometry::LineString(vec![vec![0.0], vec![1.0, 1.0]])).is_err());
        assert!((link.length() - 111_194.9).abs() < 1.0);

        link.set_geometry(Geometry::LineString(vec![vec![0.0, 0.0], vec![0.0, 0.0000001]])).unwrap();
        assert_eq!(link.length(), 0.0);
    }

    #[test]
    fn test_update_properties_overwrites_and_keeps_others() {
        let mut f = SpatialFeature::new("mp4", "mountpoint", Geometry::Point(vec![0.0, 0.0]), props("Old"))
            .unwrap();
        let mut update = Properties::new();
        update.insert(DESC.into(), json!("New"));
        update.insert("height".into(), json!(6));

        f.update_properties(update);

        assert_eq!(f.desc(), Some("New"));
        assert_eq!(f.properties["height"], 6);
        assert_eq!(f.properties[SUBTYPE], "mountpoint");
    }
}
