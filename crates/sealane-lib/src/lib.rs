//! Sea-lane routing library entry points.
//!
//! This crate augments a road-routing matrix service with global ocean
//! freight calculation. It exposes the offline sea-lane graph builder, the
//! UN/LOCODE seaport registry and snapper, chokepoint metadata with
//! query-time exclusion, and the road/sea matrix dispatch. Higher-level
//! consumers (the CLI, the HTTP surface) should depend on the functions
//! exported here instead of reimplementing behavior.
//!
//! # Quick Start
//!
//! The typical runtime workflow is:
//!
//! 1. **Load the persisted sea graph** with [`SeaRoutingEngine::load`]
//! 2. **Load ports** with [`load_seaports`] and wrap them in a [`PortSnapper`]
//! 3. **Load chokepoints** with [`ChokepointRegistry::load_from`]
//! 4. **Serve matrices** through a [`MatrixService`]
//!
//! The graph itself is produced offline by [`SeaLaneGraphBuilder`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use sealane_lib::{
//!     load_seaports, ChokepointRegistry, MatrixRequest, MatrixService,
//!     PortSnapper, SeaLaneGraph, SeaRoutingEngine,
//! };
//! # use sealane_lib::{ChokepointFilter, RouteCost, RoutingEngine, NodeId};
//! # struct Road;
//! # impl RoutingEngine for Road {
//! #     fn find_closest(&self, _: f64, _: f64, _: &ChokepointFilter) -> sealane_lib::Result<NodeId> { Ok(0) }
//! #     fn compute_path(&self, _: NodeId, _: NodeId, _: &ChokepointFilter) -> Option<RouteCost> { None }
//! # }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let graph_dir = Path::new("graph-cache/sea");
//! let sea = Arc::new(SeaRoutingEngine::load(graph_dir)?);
//! let ports = load_seaports(&["unlocode/part1.csv", "unlocode/part2.csv"]);
//! let chokepoints =
//!     ChokepointRegistry::load_from(&SeaLaneGraph::chokepoint_metadata_path(graph_dir))?;
//!
//! let service = MatrixService::new(
//!     Arc::new(Road),
//!     Some(sea),
//!     Arc::new(PortSnapper::new(ports)),
//!     Arc::new(chokepoints),
//!     None,
//! );
//!
//! let request = MatrixRequest::sea(vec![[51.92, 4.5], [31.23, 121.47]]);
//! let response = service.compute_response(&request);
//! println!("mode: {:?}", response.mode);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, Error>`](Result). Parsing and
//! loading are permissive (bad lines skipped and logged); snapping and
//! routing are strict (the request fails); build-time invariants are strict
//! (the build fails) because downstream correctness depends on them.

#![deny(warnings)]

pub mod builder;
pub mod chokepoint;
pub mod error;
pub mod filter;
pub mod geo;
pub mod graph;
pub mod landmask;
pub mod matrix;
pub mod path;
pub mod ports;
pub mod snap;
pub mod spatial;
mod storage;
pub mod unlocode;

pub use builder::{
    mandatory_chokepoints, BuildSummary, BuilderConfig, SeaLaneGraphBuilder,
    DEFAULT_GRID_STEP_DEGREES,
};
pub use chokepoint::{Chokepoint, ChokepointRegistry};
pub use error::{Error, Result};
pub use filter::ChokepointFilter;
pub use geo::{antimeridian_aware_distance_km, haversine_distance_km, EARTH_RADIUS_KM};
pub use graph::{NodeId, SeaEdge, SeaLaneGraph, SeaNode};
pub use landmask::LandMask;
pub use matrix::{
    MatrixRequest, MatrixResponse, MatrixService, RoutingEngine, RoutingMode, SeaRoutingEngine,
    DEFAULT_MAX_GRAPH_SNAP_DISTANCE_M, MAX_DIMENSION, UNREACHABLE,
};
pub use path::{shortest_path, RouteCost, SEA_SPEED_KMH};
pub use ports::{load_seaports, Port, PortRole, VALID_STATUSES};
pub use snap::{PortSnapResult, PortSnapper, DEFAULT_MAX_SNAP_DISTANCE_KM};
pub use spatial::{NodeQuery, SeaNodeIndex};
pub use unlocode::{encode_coordinates, parse_coordinates};
