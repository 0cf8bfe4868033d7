/**
 * NAME RESOLVER - Joins roster descriptions to feature ids
 *
 * ROLE :
 * Installers write "Tower 7 north face" in the roster, surveyors gave that
 * mount point an id and put the same text in its `desc` property. This module
 * rekeys roster-derived maps from description to id.
 *
 * RULES :
 * - one description -> exactly one id, otherwise the entry is dropped and a
 *   problem is reported (missing or ambiguous, never a guess)
 * - the input map is left untouched, a new map is returned
 */

use crate::error::{MapKind, Problem};
use crate::registry::FeatureRegistry;
use std::collections::BTreeMap;

/// Key -> device hostnames, in roster order.
pub type DeviceMap = BTreeMap<String, Vec<String>>;

/// Bidirectional `desc` <-> id lookup over a registry snapshot.
#[derive(Debug, Default, Clone)]
pub struct NameIndex {
    by_desc: BTreeMap<String, Vec<String>>,
    by_id: BTreeMap<String, String>,
}

impl NameIndex {
    pub fn build(registry: &FeatureRegistry) -> Self {
        let mut index = Self::default();
        for feature in registry.all() {
            let Some(desc) = feature.desc() else { continue };
            index
                .by_desc
                .entry(desc.to_string())
                .or_default()
                .push(feature.id().to_string());
            index.by_id.insert(feature.id().to_string(), desc.to_string());
        }
        index
    }

    /// All ids carrying this description (empty when none).
    pub fn ids_for(&self, desc: &str) -> &[String] {
        self.by_desc.get(desc.trim()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The unique id for a description, if there is exactly one.
    pub fn resolve(&self, desc: &str) -> Option<&str> {
        match self.ids_for(desc) {
            [id] => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn desc_of(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }
}

#[derive(Debug, Default, Clone)]
pub struct Resolved {
    pub map: DeviceMap,
    pub problems: Vec<Problem>,
}

/// Rekeys a description-keyed map using an existing index.
pub fn resolve_with(index: &NameIndex, input: &DeviceMap, kind: MapKind) -> Resolved {
    let mut out = Resolved::default();

    for (description, devices) in input {
        match index.ids_for(description) {
            [id] => out.map.entry(id.clone()).or_default().extend(devices.iter().cloned()),
            [] => out.problems.push(
                Problem::UnresolvedName { map: kind, description: description.clone() }.report(),
            ),
            candidates => out.problems.push(
                Problem::AmbiguousName {
                    map: kind,
                    description: description.clone(),
                    candidates: candidates.to_vec(),
                }
                .report(),
            ),
        }
    }

    tracing::debug!(
        map = %kind,
        resolved = out.map.len(),
        rejected = out.problems.len(),
        "resolved roster descriptions"
    );
    out
}

/// Builds a fresh index over `registry` and rekeys `input`.
pub fn resolve(registry: &FeatureRegistry, input: &DeviceMap, kind: MapKind) -> Resolved {
    resolve_with(&NameIndex::build(registry), input, kind)
}
