//! Offline sea-lane graph builder.
//!
//! The build is a single-threaded pipeline: load the land mask, lay a global
//! waypoint grid, densify the chokepoints, drop waypoints on land, connect
//! the survivors via k-nearest neighbours with antimeridian-aware weights,
//! reject edges that cross land, validate connectivity, and persist the
//! graph with its chokepoint metadata and build summary.
//!
//! All land geometry checks happen here. Runtime routing never touches land
//! geometry.

pub mod waypoints;

use std::collections::{HashMap, HashSet};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::chokepoint::{Chokepoint, ChokepointRegistry};
use crate::error::{Error, Result};
use crate::filter::ChokepointFilter;
use crate::geo::antimeridian_aware_distance_km;
use crate::graph::{NodeId, SeaLaneGraph, SeaNode};
use crate::landmask::LandMask;
use crate::path::shortest_path;
use crate::spatial::{NodeQuery, SeaNodeIndex};

use self::waypoints::{filter_land_waypoints, generate_waypoints, Waypoint};

/// Default primary grid step in degrees.
pub const DEFAULT_GRID_STEP_DEGREES: f64 = 5.0;

/// Neighbours considered per waypoint during edge candidate construction.
const K_NEIGHBORS: usize = 6;

/// Reference coordinates that must reach each other in a valid global build.
const REFERENCE_COORDINATES: [(&str, f64, f64); 4] = [
    ("Tokyo", 35.68, 139.69),
    ("Los Angeles", 33.74, -118.27),
    ("Shanghai", 31.23, 121.47),
    ("Rotterdam", 51.92, 4.5),
];

/// The mandatory chokepoint catalog, in tagging-priority order.
pub fn mandatory_chokepoints() -> Vec<Chokepoint> {
    vec![
        Chokepoint::definition("SUEZ", "Suez Canal", "AFRICA", 30.812330, 32.317903, 2.0, 0.5),
        Chokepoint::definition("PANAMA", "Panama Canal", "AMERICAS", 9.083179, -79.677571, 2.0, 0.5),
        Chokepoint::definition("MALACCA", "Strait of Malacca", "ASIA", 2.5, 101.0, 3.0, 0.5),
        Chokepoint::definition("GIBRALTAR", "Strait of Gibraltar", "EUROPE", 35.942918, -5.614690, 2.0, 0.5),
        Chokepoint::definition("BOSPHORUS", "Bosphorus Strait", "EUROPE", 41.097591, 29.060623, 2.0, 0.5),
        Chokepoint::definition("CAPE_GOOD_HOPE", "Cape of Good Hope", "AFRICA", -34.353219, 18.228192, 3.0, 1.0),
        Chokepoint::definition("BAB_EL_MANDEB", "Bab-el-Mandeb", "AFRICA", 12.6, 43.3, 2.0, 0.5),
        Chokepoint::definition("HORMUZ", "Strait of Hormuz", "ASIA", 26.5, 56.3, 2.0, 0.5),
    ]
}

/// Builder configuration.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Primary grid step in degrees.
    pub grid_step_degrees: f64,
    /// Fail the build when reachability invariants are violated. With the
    /// flag off the builder only warns, useful for partial regional builds.
    pub strict_connectivity: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            grid_step_degrees: DEFAULT_GRID_STEP_DEGREES,
            strict_connectivity: true,
        }
    }
}

/// Statistics and metadata describing a completed build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    pub sea_graph_version: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub connected_component_count: usize,
    pub largest_component_size: usize,
    pub build_duration_ms: u64,
    pub waypoint_grid_step_degrees: f64,
    pub chokepoint_densification_step_degrees: f64,
    pub land_mask_source: String,
    /// RFC-3339 build time.
    pub build_timestamp: String,
}

impl BuildSummary {
    /// Load a previously written summary.
    pub fn load(path: &Path) -> Result<Self> {
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Offline builder for the global sea-lane graph.
#[derive(Debug)]
pub struct SeaLaneGraphBuilder {
    output_dir: PathBuf,
    land_mask_path: PathBuf,
    config: BuilderConfig,
    catalog: Vec<Chokepoint>,
}

impl SeaLaneGraphBuilder {
    pub fn new(output_dir: &Path, land_mask_path: &Path, config: BuilderConfig) -> Result<Self> {
        if config.grid_step_degrees <= 0.0 {
            return Err(Error::InvalidConfig {
                detail: format!(
                    "grid step must be positive, got {}",
                    config.grid_step_degrees
                ),
            });
        }
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            land_mask_path: land_mask_path.to_path_buf(),
            config,
            catalog: mandatory_chokepoints(),
        })
    }

    /// Replace the chokepoint catalog. Used by tests running tiny worlds.
    pub fn with_catalog(mut self, catalog: Vec<Chokepoint>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Run the full build pipeline and persist the result.
    pub fn build(&self) -> Result<BuildSummary> {
        let started = Instant::now();
        info!(
            output = %self.output_dir.display(),
            step = self.config.grid_step_degrees,
            "starting sea-lane graph build"
        );

        let mask = LandMask::from_geojson(&self.land_mask_path)?;

        let waypoints = generate_waypoints(self.config.grid_step_degrees, &self.catalog);
        info!(count = waypoints.len(), "generated waypoint grid");

        let before = waypoints.len();
        let ocean = filter_land_waypoints(waypoints, &mask);
        info!(
            removed = before - ocean.len(),
            remaining = ocean.len(),
            "filtered land waypoints"
        );

        let (graph, rejected_edges) = self.connect_waypoints(&ocean, &mask);
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            rejected = rejected_edges,
            "graph assembled"
        );

        let chokepoint_node_map = chokepoint_node_map(&ocean, &self.catalog);

        let components = graph.connected_components();
        if components.count > 1 {
            warn!(
                components = components.count,
                largest = components.largest_size,
                "graph is not fully connected"
            );
        }
        self.validate_reachability(&graph, &chokepoint_node_map)?;

        // One timestamp identifies the build: it is hashed into the version
        // and stamped verbatim into the summary.
        let build_time = chrono::Utc::now();
        let graph_version =
            compute_graph_version(graph.node_count(), graph.edge_count(), &build_time);

        graph.save(&self.output_dir)?;
        SeaNodeIndex::build(&graph).save(&self.output_dir)?;
        self.save_chokepoint_metadata(&chokepoint_node_map)?;

        let summary = BuildSummary {
            sea_graph_version: graph_version,
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            connected_component_count: components.count,
            largest_component_size: components.largest_size,
            build_duration_ms: started.elapsed().as_millis() as u64,
            waypoint_grid_step_degrees: self.config.grid_step_degrees,
            chokepoint_densification_step_degrees: self
                .catalog
                .first()
                .map(|cp| cp.step_degrees)
                .unwrap_or(0.0),
            land_mask_source: mask.source().to_string(),
            build_timestamp: build_time.to_rfc3339(),
        };

        let summary_path = SeaLaneGraph::build_summary_path(&self.output_dir);
        let writer = BufWriter::new(std::fs::File::create(&summary_path)?);
        serde_json::to_writer_pretty(writer, &summary)?;

        info!(
            duration_ms = summary.build_duration_ms,
            nodes = summary.node_count,
            edges = summary.edge_count,
            components = summary.connected_component_count,
            "sea-lane graph build completed"
        );

        Ok(summary)
    }

    /// Stages 5–7: k-NN candidates, land-crossing rejection, edge insertion.
    fn connect_waypoints(&self, ocean: &[Waypoint], mask: &LandMask) -> (SeaLaneGraph, usize) {
        let nodes: Vec<SeaNode> = ocean
            .iter()
            .map(|w| SeaNode {
                lat: w.lat,
                lon: w.lon,
            })
            .collect();
        let mut graph = SeaLaneGraph::with_nodes(nodes);

        let index = SeaNodeIndex::build(&graph);
        // +1 because the query point itself is always its own nearest hit.
        let query = NodeQuery::nearest(K_NEIGHBORS + 1);

        let mut rejected = 0usize;
        for waypoint in ocean {
            let candidates = index.nearest_filtered(waypoint.lat, waypoint.lon, &query);
            for (neighbour, _) in candidates {
                if neighbour == waypoint.index {
                    continue;
                }
                let other = &ocean[neighbour as usize];

                if mask.segment_crosses_land(waypoint.lat, waypoint.lon, other.lat, other.lon) {
                    rejected += 1;
                    continue;
                }

                let distance_km =
                    antimeridian_aware_distance_km(waypoint.lat, waypoint.lon, other.lat, other.lon);
                graph.add_edge(waypoint.index, neighbour, distance_km * 1000.0);
            }
        }

        (graph, rejected)
    }

    /// Stage 9: reachability validation.
    ///
    /// Every chokepoint center and reference coordinate must land in one
    /// shared component, and Shanghai–Rotterdam must survive a Suez closure.
    /// Violations fail the build in strict mode and warn otherwise.
    fn validate_reachability(
        &self,
        graph: &SeaLaneGraph,
        chokepoint_node_map: &HashMap<String, HashSet<NodeId>>,
    ) -> Result<()> {
        if graph.node_count() == 0 {
            return self.connectivity_violation("graph has no nodes".to_string());
        }

        let index = SeaNodeIndex::build(graph);
        let components = graph.connected_components();

        let mut anchors: Vec<(String, NodeId)> = Vec::new();
        for chokepoint in &self.catalog {
            let nearest = index.nearest_filtered(chokepoint.lat, chokepoint.lon, &NodeQuery::nearest(1));
            match nearest.first() {
                Some(&(node, _)) => anchors.push((chokepoint.id.clone(), node)),
                None => {
                    return self.connectivity_violation(format!(
                        "no graph node near chokepoint {}",
                        chokepoint.id
                    ))
                }
            }
        }
        for (name, lat, lon) in REFERENCE_COORDINATES {
            let nearest = index.nearest_filtered(lat, lon, &NodeQuery::nearest(1));
            if let Some(&(node, _)) = nearest.first() {
                anchors.push((name.to_string(), node));
            }
        }

        let (_, first_node) = anchors[0];
        for (name, node) in &anchors[1..] {
            if !components.connected(first_node, *node) {
                return self.connectivity_violation(format!(
                    "{} is disconnected from {}",
                    name, anchors[0].0
                ));
            }
        }

        // A Suez closure must not sever the Europe-Asia long way round.
        if let Some(suez_nodes) = chokepoint_node_map.get("SUEZ") {
            let shanghai = nearest_node(&index, 31.23, 121.47);
            let rotterdam = nearest_node(&index, 51.92, 4.5);
            if let (Some(shanghai), Some(rotterdam)) = (shanghai, rotterdam) {
                let no_suez = ChokepointFilter::from_node_ids(suez_nodes.clone());
                if shortest_path(graph, shanghai, rotterdam, &no_suez).is_none() {
                    return self.connectivity_violation(
                        "Shanghai-Rotterdam unreachable with SUEZ excluded".to_string(),
                    );
                }
            }
        }

        debug!(anchors = anchors.len(), "reachability validated");
        Ok(())
    }

    fn connectivity_violation(&self, detail: String) -> Result<()> {
        if self.config.strict_connectivity {
            Err(Error::ConnectivityInvariantViolated { detail })
        } else {
            warn!(detail = %detail, "connectivity invariant violated (non-strict build)");
            Ok(())
        }
    }

    /// Stage 10: chokepoint metadata sidecar.
    fn save_chokepoint_metadata(
        &self,
        chokepoint_node_map: &HashMap<String, HashSet<NodeId>>,
    ) -> Result<()> {
        let mut registry = ChokepointRegistry::new();
        for chokepoint in &self.catalog {
            let node_ids = chokepoint_node_map
                .get(&chokepoint.id)
                .cloned()
                .unwrap_or_default();
            registry.add(chokepoint.with_node_ids(node_ids));
        }
        registry.save_to(&SeaLaneGraph::chokepoint_metadata_path(&self.output_dir))
    }
}

/// Stage 8: collect node ids per chokepoint from waypoint tags.
///
/// Tags mark candidates; the persisted map keeps only nodes within the
/// chokepoint's own radius so the metadata never claims nodes a coarse-grid
/// tag picked up far from the passage.
fn chokepoint_node_map(
    ocean: &[Waypoint],
    catalog: &[Chokepoint],
) -> HashMap<String, HashSet<NodeId>> {
    let centers: HashMap<&str, (f64, f64, f64)> = catalog
        .iter()
        .map(|cp| (cp.id.as_str(), (cp.lat, cp.lon, cp.radius_degrees)))
        .collect();

    let mut map: HashMap<String, HashSet<NodeId>> = HashMap::new();
    for waypoint in ocean {
        let Some(id) = &waypoint.chokepoint_id else {
            continue;
        };
        let Some(&(lat, lon, radius)) = centers.get(id.as_str()) else {
            continue;
        };
        let dlat = waypoint.lat - lat;
        let dlon = waypoint.lon - lon;
        if (dlat * dlat + dlon * dlon).sqrt() <= radius {
            map.entry(id.clone()).or_default().insert(waypoint.index);
        }
    }
    map
}

fn nearest_node(index: &SeaNodeIndex, lat: f64, lon: f64) -> Option<NodeId> {
    index
        .nearest_filtered(lat, lon, &NodeQuery::nearest(1))
        .first()
        .map(|&(node, _)| node)
}

/// Short stable hash identifying a build, for cache invalidation.
///
/// SHA-256 over node count, edge count, and the build timestamp (the same
/// instant recorded in the summary), rendered as `sha256:` plus enough hex
/// to make 20 characters.
fn compute_graph_version(
    node_count: usize,
    edge_count: usize,
    build_time: &chrono::DateTime<chrono::Utc>,
) -> String {
    let mut digest = Sha256::new();
    digest.update(node_count.to_string().as_bytes());
    digest.update(edge_count.to_string().as_bytes());
    digest.update(build_time.timestamp_millis().to_string().as_bytes());

    let hex: String = digest
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect();
    format!("sha256:{}", &hex[..13])
}
