//! Stage-1 port snapping: free coordinates onto the nearest UN/LOCODE seaport.
//!
//! Stage 2 (port coordinate onto the sea-lane graph) lives in
//! [`crate::spatial`] and is driven by the matrix engine.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::haversine_distance_km;
use crate::ports::{Port, PortRole};

/// Maximum distance in kilometers to snap a coordinate to a seaport.
pub const DEFAULT_MAX_SNAP_DISTANCE_KM: f64 = 300.0;

/// Method tag recorded on every successful snap.
pub const SNAP_METHOD_NEAREST_SEAPORT: &str = "NEAREST_SEAPORT";

/// Result of snapping a user coordinate to a seaport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortSnapResult {
    pub unlocode: String,
    pub name: String,
    /// Snapped coordinates, the port's canonical location.
    pub lat: f64,
    pub lon: f64,
    /// The coordinates the caller asked about.
    pub original_lat: f64,
    pub original_lon: f64,
    pub snap_distance_km: f64,
    pub snap_method: String,
    pub role: PortRole,
}

/// Nearest-seaport resolver over an immutable port list.
///
/// The scan is linear: the port list is a few thousand entries and the
/// snapper is constructed once at startup, so no index is warranted. Ties are
/// broken by first occurrence in load order, which keeps results stable for a
/// fixed registry.
#[derive(Debug, Clone)]
pub struct PortSnapper {
    ports: Vec<Port>,
    max_snap_distance_km: f64,
}

impl PortSnapper {
    /// Create a snapper with the default 300 km guard rail.
    pub fn new(ports: Vec<Port>) -> Self {
        Self::with_max_distance(ports, DEFAULT_MAX_SNAP_DISTANCE_KM)
    }

    /// Create a snapper with an explicit maximum snap distance.
    pub fn with_max_distance(ports: Vec<Port>, max_snap_distance_km: f64) -> Self {
        Self {
            ports,
            max_snap_distance_km,
        }
    }

    /// Snap a coordinate to the nearest seaport.
    ///
    /// The same policy applies to both roles; `role` only shapes the error
    /// and the result metadata.
    pub fn snap(&self, lat: f64, lon: f64, role: PortRole) -> Result<PortSnapResult> {
        let Some((nearest, distance_km)) = self.nearest(lat, lon) else {
            return Err(Error::NoSeaportFound { lat, lon, role });
        };

        if distance_km > self.max_snap_distance_km {
            return Err(Error::NoSeaportWithinRange {
                lat,
                lon,
                role,
                nearest_unlocode: nearest.unlocode.clone(),
                distance_km,
                max_distance_km: self.max_snap_distance_km,
            });
        }

        Ok(PortSnapResult {
            unlocode: nearest.unlocode.clone(),
            name: nearest.name.clone(),
            lat: nearest.lat,
            lon: nearest.lon,
            original_lat: lat,
            original_lon: lon,
            snap_distance_km: distance_km,
            snap_method: SNAP_METHOD_NEAREST_SEAPORT.to_string(),
            role,
        })
    }

    fn nearest(&self, lat: f64, lon: f64) -> Option<(&Port, f64)> {
        let mut best: Option<(&Port, f64)> = None;
        for port in &self.ports {
            let distance = haversine_distance_km(lat, lon, port.lat, port.lon);
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((port, distance)),
            }
        }
        best
    }

    pub fn max_snap_distance_km(&self) -> f64 {
        self.max_snap_distance_km
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }
}
