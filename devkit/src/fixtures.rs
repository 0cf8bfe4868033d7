/*!
Builders for test data

Survey features and roster rows with sensible defaults, so a test only
spells out what it is about.
*/

use meshmap_kernel::feature::DESC;
use meshmap_kernel::{FeatureError, FeatureRegistry, Geometry, Properties, RosterRow, SpatialFeature};
use serde_json::Value;

pub struct FeatureBuilder {
    id: String,
    subtype: String,
    geometry: Geometry,
    properties: Properties,
}

impl FeatureBuilder {
    fn new(id: &str, subtype: &str, geometry: Geometry) -> Self {
        Self {
            id: id.to_string(),
            subtype: subtype.to_string(),
            geometry,
            properties: Properties::new(),
        }
    }

    pub fn site(id: &str) -> Self {
        Self::new(id, "site", Geometry::Point(vec![-122.1471, 37.484511]))
    }

    pub fn mountpoint(id: &str) -> Self {
        Self::new(id, "mountpoint", Geometry::Point(vec![-122.1471, 37.484511, 4.0]))
    }

    pub fn link(id: &str) -> Self {
        Self::new(
            id,
            "link",
            Geometry::LineString(vec![vec![-122.1471, 37.4845], vec![-122.1475, 37.4849]]),
        )
    }

    pub fn observation(id: &str) -> Self {
        Self { subtype: "observation".into(), ..Self::link(id) }
    }

    /// Any subtype string, valid or not.
    pub fn with_subtype(mut self, subtype: &str) -> Self {
        self.subtype = subtype.to_string();
        self
    }

    pub fn desc(self, desc: &str) -> Self {
        self.property(DESC, desc)
    }

    pub fn property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn try_build(self) -> Result<SpatialFeature, FeatureError> {
        SpatialFeature::new(self.id, &self.subtype, self.geometry, self.properties)
    }

    /// Panics on invalid input; fixtures are expected to be valid.
    pub fn build(self) -> SpatialFeature {
        match self.try_build() {
            Ok(f) => f,
            Err(e) => panic!("invalid fixture feature: {e}"),
        }
    }
}

/// Registry from fixture features; panics on duplicate ids.
pub fn registry_of(features: impl IntoIterator<Item = FeatureBuilder>) -> FeatureRegistry {
    let mut registry = FeatureRegistry::new();
    for f in features {
        if let Err(e) = registry.insert(f.build()) {
            panic!("invalid fixture registry: {e}");
        }
    }
    registry
}

/// Accumulates roster rows; every row defaults to an installed sector.
#[derive(Default)]
pub struct RosterBuilder {
    rows: Vec<RosterRow>,
    next_address: u32,
}

impl RosterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installed sector at `location`, on `link` (empty for none).
    pub fn sector(mut self, hostname: &str, location: &str, link: &str) -> Self {
        self.next_address += 1;
        self.rows.push(RosterRow {
            hostname: hostname.to_string(),
            location_description: location.to_string(),
            associated_link: link.to_string(),
            ipv6_admin_address: format!("2001:db8::{:x}", self.next_address),
            device_type: "sector".to_string(),
            physical_install_status: "installed".to_string(),
        });
        self
    }

    /// A row the pre-filter must drop.
    pub fn planned(mut self, hostname: &str, location: &str) -> Self {
        self.rows.push(RosterRow {
            hostname: hostname.to_string(),
            location_description: location.to_string(),
            associated_link: String::new(),
            ipv6_admin_address: String::new(),
            device_type: "sector".to_string(),
            physical_install_status: "planned".to_string(),
        });
        self
    }

    pub fn row(mut self, row: RosterRow) -> Self {
        self.rows.push(row);
        self
    }

    pub fn build(self) -> Vec<RosterRow> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshmap_kernel::Subtype;

    #[test]
    fn test_feature_builders() {
        let mp = FeatureBuilder::mountpoint("mp1").desc("Pole 1").build();
        assert_eq!(mp.subtype(), Subtype::Mountpoint);
        assert_eq!(mp.desc(), Some("Pole 1"));

        let obs = FeatureBuilder::observation("o1").build();
        assert!(obs.geometry().is_line());
        assert!(obs.length() > 0.0);

        assert!(FeatureBuilder::site("s").with_subtype("tower").try_build().is_err());
    }

    #[test]
    fn test_roster_builder_addresses_are_unique() {
        let rows = RosterBuilder::new()
            .sector("d1", "Pole 1", "")
            .sector("d2", "Pole 1", "Link")
            .planned("d3", "Pole 2")
            .build();
        assert_eq!(rows.len(), 3);
        assert_ne!(rows[0].ipv6_admin_address, rows[1].ipv6_admin_address);
        assert!(rows[2].ipv6_admin_address.is_empty());
    }

    #[test]
    fn test_registry_of() {
        let r = registry_of([FeatureBuilder::mountpoint("a"), FeatureBuilder::link("l")]);
        assert_eq!(r.len(), 2);
        assert_eq!(r.links().count(), 1);
    }
}
