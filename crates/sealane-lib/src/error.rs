use std::path::PathBuf;

use thiserror::Error;

use crate::ports::PortRole;

/// Convenient result alias for the sealane library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when the port snapper holds no ports at all.
    #[error("NO_SEAPORT_FOUND: no seaport found for {role} at ({lat:.4}, {lon:.4})")]
    NoSeaportFound { lat: f64, lon: f64, role: PortRole },

    /// Raised when the nearest seaport exceeds the maximum snap distance.
    #[error(
        "NO_SEAPORT_WITHIN_RANGE: nearest seaport {nearest_unlocode} is {distance_km:.1} km away \
         from {role} at ({lat:.4}, {lon:.4}), exceeds maximum {max_distance_km:.0} km"
    )]
    NoSeaportWithinRange {
        lat: f64,
        lon: f64,
        role: PortRole,
        nearest_unlocode: String,
        distance_km: f64,
        max_distance_km: f64,
    },

    /// Raised by the optional coordinate validator for points inside land geometry.
    #[error("COORDINATE_ON_LAND: coordinate ({lat:.4}, {lon:.4}) lies on land")]
    CoordinateOnLand { lat: f64, lon: f64 },

    /// Raised by the optional coordinate validator for latitudes outside ±80°.
    #[error("POLAR_REGION_UNSUPPORTED: latitude {lat:.4} is outside the supported ±80° band")]
    PolarRegionUnsupported { lat: f64, lon: f64 },

    /// Raised when a port coordinate cannot be snapped onto the sea-lane graph.
    #[error("GRAPH_SNAP_FAILED: {reason} at ({lat:.4}, {lon:.4})")]
    GraphSnapFailed { lat: f64, lon: f64, reason: String },

    /// Raised when the land-mask source is missing, unreadable, or empty.
    #[error("LAND_MASK_LOAD_FAILED: {reason} ({path})")]
    LandMaskLoadFailed { path: PathBuf, reason: String },

    /// Raised by the builder in strict mode when the graph fails reachability checks.
    #[error("CONNECTIVITY_INVARIANT_VIOLATED: {detail}")]
    ConnectivityInvariantViolated { detail: String },

    /// Raised for invalid builder configuration such as a non-positive grid step.
    #[error("INVALID_CONFIG: {detail}")]
    InvalidConfig { detail: String },

    /// Raised when a sea-mode request arrives but no sea engine is configured.
    #[error("sea routing is not configured; build and load the sea-lane graph first")]
    SeaRoutingUnavailable,

    /// Raised when a persisted graph file is corrupt or has an unsupported layout.
    #[error("failed to load sea-lane graph from {path}: {message}")]
    GraphLoad { path: PathBuf, message: String },

    /// Raised when the graph cannot be serialized for persistence.
    #[error("failed to serialize sea-lane graph: {message}")]
    GraphSerialize { message: String },

    /// Raised when a matrix request exceeds the configured cell-count cap.
    #[error("matrix of {rows}x{cols} cells exceeds the maximum of {max_cells}")]
    MatrixTooLarge {
        rows: usize,
        cols: usize,
        max_cells: u64,
    },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable machine-readable code for this error, used in matrix responses.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NoSeaportFound { .. } => "NO_SEAPORT_FOUND",
            Error::NoSeaportWithinRange { .. } => "NO_SEAPORT_WITHIN_RANGE",
            Error::CoordinateOnLand { .. } => "COORDINATE_ON_LAND",
            Error::PolarRegionUnsupported { .. } => "POLAR_REGION_UNSUPPORTED",
            Error::GraphSnapFailed { .. } => "GRAPH_SNAP_FAILED",
            Error::LandMaskLoadFailed { .. } => "LAND_MASK_LOAD_FAILED",
            Error::ConnectivityInvariantViolated { .. } => "CONNECTIVITY_INVARIANT_VIOLATED",
            Error::InvalidConfig { .. } => "INVALID_CONFIG",
            Error::SeaRoutingUnavailable => "SEA_ROUTING_UNAVAILABLE",
            Error::GraphLoad { .. } | Error::GraphSerialize { .. } => "IO_FAILED",
            Error::MatrixTooLarge { .. } => "MATRIX_TOO_LARGE",
            Error::Io(_) => "IO_FAILED",
            Error::Json(_) => "IO_FAILED",
        }
    }
}
