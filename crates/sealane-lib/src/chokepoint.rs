//! Maritime chokepoint metadata and the registry persisted beside the graph.
//!
//! Chokepoints are narrow passages (Suez, Panama, Malacca, ...) whose graph
//! nodes can be excluded per request to model closures. They are tagged at
//! build time; at runtime the registry is read-only shared state.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// A maritime chokepoint with its densification parameters and graph nodes.
///
/// `node_ids` is empty until a build assigns it; replacement goes through
/// [`Chokepoint::with_node_ids`] rather than mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chokepoint {
    /// Stable identifier such as `"SUEZ"` or `"CAPE_GOOD_HOPE"`.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub region: String,
    /// Center latitude.
    pub lat: f64,
    /// Center longitude.
    pub lon: f64,
    /// Densification radius in degrees.
    #[serde(default)]
    pub radius_degrees: f64,
    /// Densification step size in degrees.
    #[serde(default)]
    pub step_degrees: f64,
    /// Graph node indices belonging to this chokepoint.
    #[serde(default)]
    pub node_ids: HashSet<u32>,
    /// Informational only; exclusion is decided per request.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Chokepoint {
    /// Create a bare definition without assigned graph nodes.
    pub fn definition(
        id: &str,
        name: &str,
        region: &str,
        lat: f64,
        lon: f64,
        radius_degrees: f64,
        step_degrees: f64,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            region: region.to_string(),
            lat,
            lon,
            radius_degrees,
            step_degrees,
            node_ids: HashSet::new(),
            enabled: true,
        }
    }

    /// Copy of this chokepoint with graph nodes assigned.
    pub fn with_node_ids(&self, node_ids: HashSet<u32>) -> Self {
        Self {
            node_ids,
            ..self.clone()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    chokepoints: Vec<Chokepoint>,
}

/// Keyed collection of chokepoints, loadable from and savable to JSON.
///
/// The on-disk schema is `{"chokepoints": [{id, name, region, lat, lon,
/// radiusDegrees, stepDegrees, nodeIds}, ...]}`; everything except `id`,
/// `name`, and the coordinates is optional on load.
#[derive(Debug, Clone, Default)]
pub struct ChokepointRegistry {
    // BTreeMap keeps save output stable across runs.
    chokepoints: BTreeMap<String, Chokepoint>,
}

impl ChokepointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry from a JSON metadata file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let file: RegistryFile = serde_json::from_reader(reader)?;

        let mut registry = Self::new();
        for chokepoint in file.chokepoints {
            registry.add(chokepoint);
        }
        debug!(path = %path.display(), count = registry.len(), "loaded chokepoint registry");
        Ok(registry)
    }

    /// Write the registry back in the same schema.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        let file = RegistryFile {
            chokepoints: self.chokepoints.values().cloned().collect(),
        };
        serde_json::to_writer_pretty(writer, &file)?;
        Ok(())
    }

    /// Add a chokepoint, replacing any previous entry with the same id.
    pub fn add(&mut self, chokepoint: Chokepoint) {
        self.chokepoints.insert(chokepoint.id.clone(), chokepoint);
    }

    pub fn get(&self, id: &str) -> Option<&Chokepoint> {
        self.chokepoints.get(id)
    }

    pub fn len(&self) -> usize {
        self.chokepoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chokepoints.is_empty()
    }

    /// Iterate chokepoints in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Chokepoint> {
        self.chokepoints.values()
    }

    /// Union of `node_ids` over the named chokepoints.
    ///
    /// Unknown ids are silently ignored; an empty input yields an empty set.
    pub fn excluded_node_ids<S: AsRef<str>>(&self, ids: &[S]) -> HashSet<u32> {
        let mut excluded = HashSet::new();
        for id in ids {
            if let Some(chokepoint) = self.chokepoints.get(id.as_ref()) {
                excluded.extend(chokepoint.node_ids.iter().copied());
            }
        }
        excluded
    }

    /// The subset of `ids` the registry knows about, in registry order.
    pub fn canonicalize<S: AsRef<str>>(&self, ids: &[S]) -> Vec<String> {
        let requested: HashSet<&str> = ids.iter().map(AsRef::as_ref).collect();
        self.chokepoints
            .keys()
            .filter(|id| requested.contains(id.as_str()))
            .cloned()
            .collect()
    }
}
