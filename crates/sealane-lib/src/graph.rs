//! In-memory sea-lane graph and its persisted form.
//!
//! Nodes are dense indices `[0, N)` with lat/lon attached. Edges are
//! undirected, stored once in canonical `(min, max)` order, and weighted by
//! great-circle distance in meters. The graph is built offline, persisted,
//! and loaded read-only at runtime; nothing here mutates after load.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::storage;

/// Graph node identifier (dense, starting at 0).
pub type NodeId = u32;

const GRAPH_MAGIC: &[u8; 4] = b"SLGR";
const GRAPH_VERSION: u8 = 1;

/// File name of the node/edge storage inside an output directory.
pub const GRAPH_FILE_NAME: &str = "sea_graph.bin";
/// File name of the persisted spatial index.
pub const LOCATION_INDEX_FILE_NAME: &str = "location_index.bin";
/// File name of the chokepoint metadata sidecar.
pub const CHOKEPOINT_METADATA_FILE_NAME: &str = "chokepoint_metadata.json";
/// File name of the build summary sidecar.
pub const BUILD_SUMMARY_FILE_NAME: &str = "build_summary.json";

/// A graph node's position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeaNode {
    pub lat: f64,
    pub lon: f64,
}

/// A canonical undirected edge with its weight in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeaEdge {
    pub base: NodeId,
    pub adj: NodeId,
    pub distance_m: f64,
}

#[derive(Serialize, Deserialize)]
struct GraphPayload {
    nodes: Vec<SeaNode>,
    edges: Vec<SeaEdge>,
}

/// Connected-component labelling of a graph.
#[derive(Debug, Clone)]
pub struct Components {
    labels: Vec<usize>,
    pub count: usize,
    pub largest_size: usize,
}

impl Components {
    /// Component label of a node.
    pub fn label(&self, node: NodeId) -> usize {
        self.labels[node as usize]
    }

    /// Whether two nodes share a component.
    pub fn connected(&self, a: NodeId, b: NodeId) -> bool {
        self.labels[a as usize] == self.labels[b as usize]
    }
}

/// Undirected weighted sea-lane graph.
#[derive(Debug, Clone, Default)]
pub struct SeaLaneGraph {
    nodes: Vec<SeaNode>,
    edges: Vec<SeaEdge>,
    adjacency: Vec<Vec<(NodeId, f64)>>,
    edge_keys: HashSet<(NodeId, NodeId)>,
}

impl SeaLaneGraph {
    /// Create a graph over a fixed node set with no edges yet.
    pub fn with_nodes(nodes: Vec<SeaNode>) -> Self {
        let adjacency = vec![Vec::new(); nodes.len()];
        Self {
            nodes,
            edges: Vec::new(),
            adjacency,
            edge_keys: HashSet::new(),
        }
    }

    /// Insert an undirected edge, de-duplicated by canonical endpoint order.
    ///
    /// Returns false for self-loops, out-of-range endpoints, and duplicates.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, distance_m: f64) -> bool {
        if u == v {
            return false;
        }
        let (base, adj) = if u < v { (u, v) } else { (v, u) };
        if adj as usize >= self.nodes.len() {
            return false;
        }
        if !self.edge_keys.insert((base, adj)) {
            return false;
        }

        self.edges.push(SeaEdge {
            base,
            adj,
            distance_m,
        });
        self.adjacency[base as usize].push((adj, distance_m));
        self.adjacency[adj as usize].push((base, distance_m));
        true
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: NodeId) -> Option<SeaNode> {
        self.nodes.get(id as usize).copied()
    }

    pub fn nodes(&self) -> &[SeaNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[SeaEdge] {
        &self.edges
    }

    /// Neighbours of a node with edge weights in meters.
    pub fn neighbours(&self, node: NodeId) -> &[(NodeId, f64)] {
        self.adjacency
            .get(node as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Label connected components by breadth-first traversal.
    pub fn connected_components(&self) -> Components {
        let mut labels = vec![usize::MAX; self.nodes.len()];
        let mut count = 0;
        let mut largest_size = 0;

        for start in 0..self.nodes.len() {
            if labels[start] != usize::MAX {
                continue;
            }

            let mut size = 0;
            let mut queue = VecDeque::new();
            labels[start] = count;
            queue.push_back(start as NodeId);

            while let Some(node) = queue.pop_front() {
                size += 1;
                for &(neighbour, _) in self.neighbours(node) {
                    if labels[neighbour as usize] == usize::MAX {
                        labels[neighbour as usize] = count;
                        queue.push_back(neighbour);
                    }
                }
            }

            largest_size = largest_size.max(size);
            count += 1;
        }

        Components {
            labels,
            count,
            largest_size,
        }
    }

    /// Persist the node/edge storage under `output_dir`.
    pub fn save(&self, output_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(GRAPH_FILE_NAME);
        info!(
            path = %path.display(),
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "saving sea-lane graph"
        );

        let payload = GraphPayload {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        };
        storage::write_container(
            &path,
            GRAPH_MAGIC,
            GRAPH_VERSION,
            self.nodes.len() as u32,
            &payload,
        )
    }

    /// Load a persisted graph from `output_dir`, rebuilding adjacency.
    pub fn load(output_dir: &Path) -> Result<Self> {
        let path = output_dir.join(GRAPH_FILE_NAME);
        debug!(path = %path.display(), "loading sea-lane graph");

        let (_, payload): (u32, GraphPayload) =
            storage::read_container(&path, GRAPH_MAGIC, GRAPH_VERSION)?;

        let mut graph = Self::with_nodes(payload.nodes);
        for edge in payload.edges {
            graph.add_edge(edge.base, edge.adj, edge.distance_m);
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "sea-lane graph loaded"
        );
        Ok(graph)
    }

    /// Path of the chokepoint metadata sidecar for an output directory.
    pub fn chokepoint_metadata_path(output_dir: &Path) -> PathBuf {
        output_dir.join(CHOKEPOINT_METADATA_FILE_NAME)
    }

    /// Path of the build summary sidecar for an output directory.
    pub fn build_summary_path(output_dir: &Path) -> PathBuf {
        output_dir.join(BUILD_SUMMARY_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_graph(n: u32) -> SeaLaneGraph {
        let nodes = (0..n)
            .map(|i| SeaNode {
                lat: 0.0,
                lon: i as f64,
            })
            .collect();
        let mut graph = SeaLaneGraph::with_nodes(nodes);
        for i in 0..n.saturating_sub(1) {
            graph.add_edge(i, i + 1, 1000.0);
        }
        graph
    }

    #[test]
    fn add_edge_is_canonical_and_deduplicated() {
        let mut graph = line_graph(3);
        assert!(!graph.add_edge(1, 0, 999.0)); // duplicate, reversed order
        assert!(!graph.add_edge(2, 2, 1.0)); // self loop
        assert!(!graph.add_edge(0, 10, 1.0)); // out of range
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edges()[0].base, 0);
        assert_eq!(graph.edges()[0].adj, 1);
    }

    #[test]
    fn neighbours_are_symmetric() {
        let graph = line_graph(3);
        assert_eq!(graph.neighbours(1).len(), 2);
        assert!(graph.neighbours(0).contains(&(1, 1000.0)));
        assert!(graph.neighbours(1).contains(&(0, 1000.0)));
    }

    #[test]
    fn components_split_and_merge() {
        let mut graph = line_graph(5);
        // Line 0-1-2-3-4 is one component.
        let components = graph.connected_components();
        assert_eq!(components.count, 1);
        assert_eq!(components.largest_size, 5);
        assert!(components.connected(0, 4));

        // A detached pair of nodes forms a second component.
        let mut nodes = graph.nodes().to_vec();
        nodes.push(SeaNode { lat: 50.0, lon: 0.0 });
        nodes.push(SeaNode { lat: 50.0, lon: 1.0 });
        graph = SeaLaneGraph::with_nodes(nodes);
        for i in 0..4 {
            graph.add_edge(i, i + 1, 1000.0);
        }
        graph.add_edge(5, 6, 1000.0);

        let components = graph.connected_components();
        assert_eq!(components.count, 2);
        assert_eq!(components.largest_size, 5);
        assert!(!components.connected(0, 5));
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let graph = line_graph(4);
        graph.save(dir.path()).unwrap();

        let loaded = SeaLaneGraph::load(dir.path()).unwrap();
        assert_eq!(loaded.node_count(), 4);
        assert_eq!(loaded.edge_count(), 3);
        assert_eq!(loaded.node(2), graph.node(2));
        assert_eq!(loaded.neighbours(1), graph.neighbours(1));
    }
}
