//! Nearest-node spatial index over the sea-lane graph.
//!
//! Lat/lon positions are embedded on the unit sphere and indexed with a 3-D
//! KD-tree. Chord distance between unit vectors is monotonic in great-circle
//! distance, so nearest-neighbour ordering is correct everywhere on the
//! globe, including across the antimeridian, without wrap-around special
//! cases at query time.

use std::path::Path;

use kiddo::float::kdtree::KdTree;
use kiddo::SquaredEuclidean;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geo::{chord_to_great_circle_km, unit_sphere};
use crate::graph::{NodeId, SeaLaneGraph};
use crate::storage;

const INDEX_MAGIC: &[u8; 4] = b"SLLI";
const INDEX_VERSION: u8 = 1;

/// KD-tree bucket size (kiddo default).
const BUCKET_SIZE: usize = 32;

/// One indexed graph node.
///
/// Coordinates are stored as f32 unit-sphere components to keep the
/// serialized index compact; the sub-meter error this introduces is far below
/// the snapping thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub node_id: NodeId,
    pub coords: [f32; 3],
}

/// Parameters for a filtered nearest-node query.
#[derive(Debug, Clone, Default)]
pub struct NodeQuery<'a> {
    /// Maximum number of results.
    pub k: usize,
    /// Optional maximum great-circle distance in kilometers.
    pub max_distance_km: Option<f64>,
    /// Node ids to skip, typically an excluded-chokepoint snapshot.
    pub excluded: Option<&'a std::collections::HashSet<NodeId>>,
}

impl<'a> NodeQuery<'a> {
    /// Simple k-nearest query without constraints.
    pub fn nearest(k: usize) -> Self {
        Self {
            k,
            max_distance_km: None,
            excluded: None,
        }
    }
}

/// KD-tree index of sea-graph nodes for nearest-node snapping.
pub struct SeaNodeIndex {
    tree: KdTree<f32, usize, 3, BUCKET_SIZE, u32>,
    entries: Vec<IndexEntry>,
}

impl SeaNodeIndex {
    /// Build an index over all nodes of a graph.
    pub fn build(graph: &SeaLaneGraph) -> Self {
        let entries: Vec<IndexEntry> = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(id, node)| {
                let coords = unit_sphere(node.lat, node.lon);
                IndexEntry {
                    node_id: id as NodeId,
                    coords: [coords[0] as f32, coords[1] as f32, coords[2] as f32],
                }
            })
            .collect();

        Self::from_entries(entries)
    }

    fn from_entries(entries: Vec<IndexEntry>) -> Self {
        let mut tree: KdTree<f32, usize, 3, BUCKET_SIZE, u32> = KdTree::new();
        for (index, entry) in entries.iter().enumerate() {
            tree.add(&entry.coords, index);
        }
        debug!(nodes = entries.len(), "built sea-node index");
        Self { tree, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find up to `query.k` nearest nodes to a lat/lon point.
    ///
    /// Returns `(node_id, great_circle_km)` pairs in ascending distance.
    /// Excluded nodes are skipped; the tree is over-fetched to compensate.
    pub fn nearest_filtered(&self, lat: f64, lon: f64, query: &NodeQuery<'_>) -> Vec<(NodeId, f64)> {
        if query.k == 0 || self.entries.is_empty() {
            return Vec::new();
        }

        let point = unit_sphere(lat, lon);
        let point = [point[0] as f32, point[1] as f32, point[2] as f32];

        let excluded_len = query.excluded.map(|set| set.len()).unwrap_or(0);
        let fetch_count = query
            .k
            .saturating_add(excluded_len)
            .min(self.entries.len());

        let candidates = self.tree.nearest_n::<SquaredEuclidean>(&point, fetch_count);

        let mut results = Vec::with_capacity(query.k);
        for neighbour in candidates {
            let entry = &self.entries[neighbour.item];

            if let Some(excluded) = query.excluded {
                if excluded.contains(&entry.node_id) {
                    continue;
                }
            }

            let distance_km = chord_to_great_circle_km((neighbour.distance as f64).sqrt());
            if let Some(max) = query.max_distance_km {
                if distance_km > max {
                    continue;
                }
            }

            results.push((entry.node_id, distance_km));
            if results.len() >= query.k {
                break;
            }
        }

        results
    }

    /// Nearest single node honoring the excluded set and the maximum
    /// snap distance, as used by Stage-2 graph snapping.
    pub fn snap(
        &self,
        lat: f64,
        lon: f64,
        max_distance_m: f64,
        excluded: Option<&std::collections::HashSet<NodeId>>,
    ) -> Result<(NodeId, f64)> {
        let query = NodeQuery {
            k: 1,
            max_distance_km: None,
            excluded,
        };
        let Some(&(node_id, distance_km)) = self.nearest_filtered(lat, lon, &query).first() else {
            return Err(Error::GraphSnapFailed {
                lat,
                lon,
                reason: "no valid snap point found".to_string(),
            });
        };

        let distance_m = distance_km * 1000.0;
        if distance_m > max_distance_m {
            return Err(Error::GraphSnapFailed {
                lat,
                lon,
                reason: format!(
                    "nearest sea-lane node is {distance_m:.0} m away, exceeds maximum {max_distance_m:.0} m"
                ),
            });
        }

        Ok((node_id, distance_m))
    }

    /// Persist the index under `output_dir` as `location_index.bin`.
    pub fn save(&self, output_dir: &Path) -> Result<()> {
        let path = output_dir.join(crate::graph::LOCATION_INDEX_FILE_NAME);
        storage::write_container(
            &path,
            INDEX_MAGIC,
            INDEX_VERSION,
            self.entries.len() as u32,
            &self.entries,
        )
    }

    /// Load a persisted index, rebuilding the KD-tree from its entries.
    pub fn load(output_dir: &Path) -> Result<Self> {
        let path = output_dir.join(crate::graph::LOCATION_INDEX_FILE_NAME);
        let (_, entries): (u32, Vec<IndexEntry>) =
            storage::read_container(&path, INDEX_MAGIC, INDEX_VERSION)?;
        Ok(Self::from_entries(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SeaNode;
    use std::collections::HashSet;

    fn graph_with(nodes: &[(f64, f64)]) -> SeaLaneGraph {
        SeaLaneGraph::with_nodes(
            nodes
                .iter()
                .map(|&(lat, lon)| SeaNode { lat, lon })
                .collect(),
        )
    }

    #[test]
    fn finds_nearest_node() {
        let graph = graph_with(&[(0.0, 0.0), (10.0, 10.0), (50.0, 50.0)]);
        let index = SeaNodeIndex::build(&graph);

        let results = index.nearest_filtered(9.0, 9.0, &NodeQuery::nearest(1));
        assert_eq!(results[0].0, 1);
    }

    #[test]
    fn nearest_is_antimeridian_aware() {
        // Node 1 at 179°W is much closer to a query at 179°E than node 0.
        let graph = graph_with(&[(0.0, 150.0), (0.0, -179.0)]);
        let index = SeaNodeIndex::build(&graph);

        let results = index.nearest_filtered(0.0, 179.0, &NodeQuery::nearest(1));
        assert_eq!(results[0].0, 1);
        assert!(results[0].1 < 300.0, "got {}", results[0].1);
    }

    #[test]
    fn excluded_nodes_are_skipped() {
        let graph = graph_with(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        let index = SeaNodeIndex::build(&graph);
        let excluded = HashSet::from([0]);

        let (node, _) = index.snap(0.0, 0.0, f64::MAX, Some(&excluded)).unwrap();
        assert_eq!(node, 1);
    }

    #[test]
    fn snap_respects_maximum_distance() {
        let graph = graph_with(&[(0.0, 0.0)]);
        let index = SeaNodeIndex::build(&graph);

        // ~1110 km away from the only node with a 300 km cap.
        let err = index.snap(10.0, 0.0, 300_000.0, None).unwrap_err();
        assert_eq!(err.code(), "GRAPH_SNAP_FAILED");

        assert!(index.snap(0.1, 0.1, 300_000.0, None).is_ok());
    }

    #[test]
    fn empty_index_fails_snap() {
        let index = SeaNodeIndex::build(&SeaLaneGraph::default());
        assert!(index.snap(0.0, 0.0, 300_000.0, None).is_err());
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let graph = graph_with(&[(0.0, 0.0), (10.0, 10.0)]);
        let index = SeaNodeIndex::build(&graph);
        index.save(dir.path()).unwrap();

        let loaded = SeaNodeIndex::load(dir.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        let results = loaded.nearest_filtered(9.0, 9.0, &NodeQuery::nearest(1));
        assert_eq!(results[0].0, 1);
    }
}
