//! Matrix routing over road and sea engines.
//!
//! The matrix service owns the per-request dispatch: road requests pass
//! through to the road engine untouched, sea requests run the two-stage
//! snapping pipeline (coordinate → seaport → graph node) with a
//! chokepoint-exclusion filter before each cell is routed. All shared state
//! is immutable after construction, so one service instance can serve many
//! concurrent workers, each writing only its own output rows.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chokepoint::ChokepointRegistry;
use crate::error::{Error, Result};
use crate::filter::ChokepointFilter;
use crate::graph::{NodeId, SeaLaneGraph};
use crate::landmask::LandMask;
use crate::path::{shortest_path, RouteCost};
use crate::snap::{PortSnapResult, PortSnapper};
use crate::spatial::SeaNodeIndex;
use crate::ports::PortRole;

/// Matrix size bound: a request may not exceed `MAX_DIMENSION²` cells.
pub const MAX_DIMENSION: usize = 5_000;

/// Default maximum distance from a port to the sea-lane network, in meters.
pub const DEFAULT_MAX_GRAPH_SNAP_DISTANCE_M: f64 = 300_000.0;

/// Cell value marking an unreachable or failed pair.
pub const UNREACHABLE: i64 = -1;

/// Which graph serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    #[default]
    Road,
    Sea,
}

/// Matrix request payload, as recognized by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixRequest {
    /// Input coordinates as `[lat, lon]` pairs.
    pub points: Vec<[f64; 2]>,
    /// Indices into `points` acting as sources; empty means all points.
    #[serde(default)]
    pub sources: Vec<usize>,
    /// Indices into `points` acting as targets; empty means all points.
    #[serde(default)]
    pub targets: Vec<usize>,
    #[serde(default)]
    pub mode: RoutingMode,
    /// Chokepoint ids excluded for this request (sea mode only).
    #[serde(default)]
    pub excluded_chokepoints: Vec<String>,
    /// Reject coordinates on land before snapping (sea mode only).
    #[serde(default = "default_validate_coordinates")]
    pub validate_coordinates: bool,
}

fn default_validate_coordinates() -> bool {
    true
}

impl MatrixRequest {
    /// A sea request over the given points with all-to-all routing.
    pub fn sea(points: Vec<[f64; 2]>) -> Self {
        Self {
            points,
            sources: Vec::new(),
            targets: Vec::new(),
            mode: RoutingMode::Sea,
            excluded_chokepoints: Vec::new(),
            validate_coordinates: true,
        }
    }

    /// Source indices, defaulting to every point.
    pub fn resolved_sources(&self) -> Vec<usize> {
        if self.sources.is_empty() {
            (0..self.points.len()).collect()
        } else {
            self.sources.clone()
        }
    }

    /// Target indices, defaulting to every point.
    pub fn resolved_targets(&self) -> Vec<usize> {
        if self.targets.is_empty() {
            (0..self.points.len()).collect()
        } else {
            self.targets.clone()
        }
    }
}

/// Matrix response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distances: Option<Vec<Vec<i64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub times: Option<Vec<Vec<i64>>>,
    /// Point indices that could not be routed at all.
    #[serde(default)]
    pub failures: Vec<usize>,
    pub mode: RoutingMode,
    /// Canonicalized exclusions actually applied (sea mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_chokepoints: Option<Vec<String>>,
    /// One snap result per input point, in input order (sea mode only).
    /// Points that failed snapping carry no result and are listed in
    /// `failures`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_snaps: Option<Vec<Option<PortSnapResult>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl MatrixResponse {
    /// An error-shaped response carrying a stable code.
    pub fn failure(mode: RoutingMode, code: &str, message: impl Into<String>) -> Self {
        Self {
            distances: None,
            times: None,
            failures: Vec::new(),
            mode,
            excluded_chokepoints: None,
            port_snaps: None,
            error: Some(message.into()),
            error_code: Some(code.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some() || self.error_code.is_some()
    }
}

/// Capability set shared by the road and sea engines.
///
/// The road implementation lives outside the core; the sea implementation is
/// [`SeaRoutingEngine`]. Both resolve coordinates to their own node space and
/// route between nodes under an edge filter.
pub trait RoutingEngine: Send + Sync {
    /// Nearest routable node to a coordinate, honoring the filter.
    fn find_closest(&self, lat: f64, lon: f64, filter: &ChokepointFilter) -> Result<NodeId>;

    /// Route between two nodes, or `None` when unreachable.
    fn compute_path(
        &self,
        source: NodeId,
        target: NodeId,
        filter: &ChokepointFilter,
    ) -> Option<RouteCost>;
}

/// Sea-graph routing engine: spatial snapping plus filtered shortest paths.
pub struct SeaRoutingEngine {
    graph: SeaLaneGraph,
    index: SeaNodeIndex,
    max_snap_distance_m: f64,
}

impl SeaRoutingEngine {
    pub fn new(graph: SeaLaneGraph) -> Self {
        let index = SeaNodeIndex::build(&graph);
        Self {
            graph,
            index,
            max_snap_distance_m: DEFAULT_MAX_GRAPH_SNAP_DISTANCE_M,
        }
    }

    pub fn with_max_snap_distance(mut self, max_snap_distance_m: f64) -> Self {
        self.max_snap_distance_m = max_snap_distance_m;
        self
    }

    /// Load the persisted graph from a build output directory.
    pub fn load(output_dir: &std::path::Path) -> Result<Self> {
        Ok(Self::new(SeaLaneGraph::load(output_dir)?))
    }

    pub fn graph(&self) -> &SeaLaneGraph {
        &self.graph
    }
}

impl RoutingEngine for SeaRoutingEngine {
    fn find_closest(&self, lat: f64, lon: f64, filter: &ChokepointFilter) -> Result<NodeId> {
        let excluded = filter
            .has_exclusions()
            .then(|| filter.excluded_node_ids());
        let (node, _) = self.index.snap(lat, lon, self.max_snap_distance_m, excluded)?;
        Ok(node)
    }

    fn compute_path(
        &self,
        source: NodeId,
        target: NodeId,
        filter: &ChokepointFilter,
    ) -> Option<RouteCost> {
        shortest_path(&self.graph, source, target, filter)
    }
}

/// Process-wide matrix service: immutable registries plus the two engines.
pub struct MatrixService {
    road: Arc<dyn RoutingEngine>,
    sea: Option<Arc<SeaRoutingEngine>>,
    port_snapper: Arc<PortSnapper>,
    chokepoints: Arc<ChokepointRegistry>,
    land_mask: Option<Arc<LandMask>>,
}

impl MatrixService {
    pub fn new(
        road: Arc<dyn RoutingEngine>,
        sea: Option<Arc<SeaRoutingEngine>>,
        port_snapper: Arc<PortSnapper>,
        chokepoints: Arc<ChokepointRegistry>,
        land_mask: Option<Arc<LandMask>>,
    ) -> Self {
        Self {
            road,
            sea,
            port_snapper,
            chokepoints,
            land_mask,
        }
    }

    pub fn sea_routing_available(&self) -> bool {
        self.sea.is_some()
    }

    /// Compute a matrix, mapping failures onto an error-shaped response.
    pub fn compute_response(&self, request: &MatrixRequest) -> MatrixResponse {
        match self.compute(request) {
            Ok(response) => response,
            Err(err) => MatrixResponse::failure(request.mode, err.code(), err.to_string()),
        }
    }

    /// Compute a matrix for the request, dispatching on its mode.
    pub fn compute(&self, request: &MatrixRequest) -> Result<MatrixResponse> {
        let sources = request.resolved_sources();
        let targets = request.resolved_targets();
        validate_dimensions(&sources, &targets)?;

        match request.mode {
            RoutingMode::Road => self.compute_road(request, &sources, &targets),
            RoutingMode::Sea => self.compute_sea(request, &sources, &targets),
        }
    }

    /// Road requests bypass snapping and filtering entirely.
    fn compute_road(
        &self,
        request: &MatrixRequest,
        sources: &[usize],
        targets: &[usize],
    ) -> Result<MatrixResponse> {
        let filter = ChokepointFilter::accept_all();

        let mut nodes = Vec::with_capacity(request.points.len());
        let mut failures = Vec::new();
        for (idx, point) in request.points.iter().enumerate() {
            match self.road.find_closest(point[0], point[1], &filter) {
                Ok(node) => nodes.push(Some(node)),
                Err(_) => {
                    failures.push(idx);
                    nodes.push(None);
                }
            }
        }

        let (distances, times) =
            self.fill_matrix(self.road.as_ref(), &nodes, sources, targets, &filter);

        Ok(MatrixResponse {
            distances: Some(distances),
            times: Some(times),
            failures,
            mode: RoutingMode::Road,
            excluded_chokepoints: None,
            port_snaps: None,
            error: None,
            error_code: None,
        })
    }

    fn compute_sea(
        &self,
        request: &MatrixRequest,
        sources: &[usize],
        targets: &[usize],
    ) -> Result<MatrixResponse> {
        let sea = self.sea.as_ref().ok_or(Error::SeaRoutingUnavailable)?;

        if request.validate_coordinates {
            if let Some(mask) = &self.land_mask {
                for point in &request.points {
                    mask.validate_coordinate(point[0], point[1])?;
                }
            }
        }

        let filter =
            ChokepointFilter::from_chokepoints(&request.excluded_chokepoints, &self.chokepoints);

        // Two-stage snapping per point: coordinate to canonical seaport, then
        // seaport onto the sea graph honoring the filter. A point that fails
        // either stage is flagged instead of failing the whole matrix; its
        // rows and columns stay unreachable.
        let source_set: std::collections::HashSet<usize> = sources.iter().copied().collect();
        let mut port_snaps = Vec::with_capacity(request.points.len());
        let mut nodes = Vec::with_capacity(request.points.len());
        let mut failures = Vec::new();
        for (idx, point) in request.points.iter().enumerate() {
            let role = if source_set.contains(&idx) {
                PortRole::PortOfLoading
            } else {
                PortRole::PortOfDischarge
            };
            let snapped = self
                .port_snapper
                .snap(point[0], point[1], role)
                .and_then(|snap| {
                    let node = sea.find_closest(snap.lat, snap.lon, &filter)?;
                    Ok((snap, node))
                });
            match snapped {
                Ok((snap, node)) => {
                    port_snaps.push(Some(snap));
                    nodes.push(Some(node));
                }
                Err(err) => {
                    debug!(point = idx, error = %err, "point failed sea snapping");
                    port_snaps.push(None);
                    nodes.push(None);
                    failures.push(idx);
                }
            }
        }

        debug!(
            points = request.points.len(),
            sources = sources.len(),
            targets = targets.len(),
            failed = failures.len(),
            exclusions = filter.excluded_chokepoints().len(),
            "computing sea matrix"
        );

        let (distances, times) =
            self.fill_matrix(sea.as_ref(), &nodes, sources, targets, &filter);

        Ok(MatrixResponse {
            distances: Some(distances),
            times: Some(times),
            failures,
            mode: RoutingMode::Sea,
            excluded_chokepoints: Some(filter.excluded_chokepoints().to_vec()),
            port_snaps: Some(port_snaps),
            error: None,
            error_code: None,
        })
    }

    /// Fill one row per source; cells for unsnapped points stay unreachable.
    fn fill_matrix(
        &self,
        engine: &dyn RoutingEngine,
        nodes: &[Option<NodeId>],
        sources: &[usize],
        targets: &[usize],
        filter: &ChokepointFilter,
    ) -> (Vec<Vec<i64>>, Vec<Vec<i64>>) {
        let mut distances = vec![vec![UNREACHABLE; targets.len()]; sources.len()];
        let mut times = vec![vec![UNREACHABLE; targets.len()]; sources.len()];

        for (row, &source_idx) in sources.iter().enumerate() {
            let Some(source_node) = nodes[source_idx] else {
                continue;
            };
            for (col, &target_idx) in targets.iter().enumerate() {
                let Some(target_node) = nodes[target_idx] else {
                    continue;
                };
                if let Some(cost) = engine.compute_path(source_node, target_node, filter) {
                    distances[row][col] = cost.distance_m.round() as i64;
                    times[row][col] = cost.time_ms;
                }
            }
        }

        (distances, times)
    }
}

fn validate_dimensions(sources: &[usize], targets: &[usize]) -> Result<()> {
    let cell_count = sources.len() as u64 * targets.len() as u64;
    let max_cells = (MAX_DIMENSION as u64).pow(2);
    if cell_count > max_cells {
        return Err(Error::MatrixTooLarge {
            rows: sources.len(),
            cols: targets.len(),
            max_cells,
        });
    }
    Ok(())
}
