//! Feature registry: every spatial feature of the deployment, keyed by id,
//! with a precomputed index per subtype.

use crate::error::FeatureError;
use crate::feature::{SpatialFeature, Subtype};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    features: BTreeMap<String, SpatialFeature>,
    by_subtype: BTreeMap<Subtype, BTreeSet<String>>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a feature; ids are unique for the lifetime of the registry.
    pub fn insert(&mut self, feature: SpatialFeature) -> Result<(), FeatureError> {
        if self.features.contains_key(feature.id()) {
            return Err(FeatureError::DuplicateId(feature.id().to_string()));
        }
        self.by_subtype
            .entry(feature.subtype())
            .or_default()
            .insert(feature.id().to_string());
        self.features.insert(feature.id().to_string(), feature);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&SpatialFeature> {
        self.features.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SpatialFeature> {
        self.features.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// All features, ordered by id.
    pub fn all(&self) -> impl Iterator<Item = &SpatialFeature> {
        self.features.values()
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut SpatialFeature> {
        self.features.values_mut()
    }

    pub fn of_subtype(&self, subtype: Subtype) -> impl Iterator<Item = &SpatialFeature> {
        self.by_subtype
            .get(&subtype)
            .into_iter()
            .flatten()
            .filter_map(|id| self.features.get(id))
    }

    pub fn sites(&self) -> impl Iterator<Item = &SpatialFeature> {
        self.of_subtype(Subtype::Site)
    }

    pub fn mountpoints(&self) -> impl Iterator<Item = &SpatialFeature> {
        self.of_subtype(Subtype::Mountpoint)
    }

    pub fn observations(&self) -> impl Iterator<Item = &SpatialFeature> {
        self.of_subtype(Subtype::Observation)
    }

    pub fn links(&self) -> impl Iterator<Item = &SpatialFeature> {
        self.of_subtype(Subtype::Link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Geometry, Properties};

    fn feature(id: &str, subtype: &str) -> SpatialFeature {
        let geometry = if subtype == "link" || subtype == "observation" {
            Geometry::LineString(vec![vec![0.0, 0.0], vec![0.0, 0.001]])
        } else {
            Geometry::Point(vec![0.0, 0.0])
        };
        SpatialFeature::new(id, subtype, geometry, Properties::new()).unwrap()
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = FeatureRegistry::new();
        registry.insert(feature("a", "site")).unwrap();
        let err = registry.insert(feature("a", "mountpoint")).unwrap_err();
        assert!(matches!(err, FeatureError::DuplicateId(id) if id == "a"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.mountpoints().count(), 0);
    }

    #[test]
    fn test_subtype_views() {
        let mut registry = FeatureRegistry::new();
        registry.insert(feature("s1", "site")).unwrap();
        registry.insert(feature("mp2", "mountpoint")).unwrap();
        registry.insert(feature("mp1", "mountpoint")).unwrap();
        registry.insert(feature("o1", "observation")).unwrap();
        registry.insert(feature("l1", "link")).unwrap();

        let mps: Vec<&str> = registry.mountpoints().map(|f| f.id()).collect();
        assert_eq!(mps, vec!["mp1", "mp2"]);
        assert_eq!(registry.sites().count(), 1);
        assert_eq!(registry.observations().count(), 1);
        assert_eq!(registry.links().count(), 1);
        assert_eq!(registry.all().count(), 5);
    }
}
