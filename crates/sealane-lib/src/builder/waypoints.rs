//! Waypoint generation for the sea-lane graph build.
//!
//! The primary grid covers latitudes −80..80 inclusive and longitudes
//! −180..180 with the upper bound exclusive, so the dateline column exists
//! exactly once. Chokepoints then contribute dense local grids. Land
//! filtering re-indexes survivors densely while keeping their tags.

use crate::chokepoint::Chokepoint;
use crate::geo::normalize_longitude;
use crate::landmask::LandMask;

/// Latitude bounds of the waypoint grid.
pub const MIN_LAT: f64 = -80.0;
pub const MAX_LAT: f64 = 80.0;
const MIN_LON: f64 = -180.0;
const MAX_LON: f64 = 180.0;

const STEP_EPSILON: f64 = 1e-9;

/// A build-time waypoint, before or after land filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub index: u32,
    pub lat: f64,
    pub lon: f64,
    /// Chokepoint this waypoint belongs to, if any.
    pub chokepoint_id: Option<String>,
}

/// Generate the primary grid plus densified chokepoint neighborhoods.
///
/// Primary-grid waypoints within `2 × step` planar degrees of a chokepoint
/// center are tagged with that chokepoint, first catalog entry winning ties.
/// Dense waypoints continue the index space after the grid.
pub fn generate_waypoints(step: f64, catalog: &[Chokepoint]) -> Vec<Waypoint> {
    let mut waypoints = Vec::new();
    let tag_threshold = step * 2.0;

    let mut i = 0u32;
    loop {
        let lat = MIN_LAT + f64::from(i) * step;
        if lat > MAX_LAT + STEP_EPSILON {
            break;
        }
        let mut j = 0u32;
        loop {
            let lon = MIN_LON + f64::from(j) * step;
            if lon > MAX_LON - STEP_EPSILON {
                break;
            }
            waypoints.push(Waypoint {
                index: waypoints.len() as u32,
                lat,
                lon,
                chokepoint_id: nearby_chokepoint(lat, lon, catalog, tag_threshold),
            });
            j += 1;
        }
        i += 1;
    }

    for chokepoint in catalog {
        densify_chokepoint(chokepoint, &mut waypoints);
    }

    waypoints
}

/// Planar-degree proximity tag for primary-grid waypoints.
///
/// L2 in degrees is a fair approximation at chokepoint latitudes; all catalog
/// centers lie well inside ±45°.
fn nearby_chokepoint(
    lat: f64,
    lon: f64,
    catalog: &[Chokepoint],
    threshold_degrees: f64,
) -> Option<String> {
    catalog
        .iter()
        .find(|cp| {
            let dlat = lat - cp.lat;
            let dlon = lon - cp.lon;
            (dlat * dlat + dlon * dlon).sqrt() <= threshold_degrees
        })
        .map(|cp| cp.id.clone())
}

/// Append a dense local grid around one chokepoint.
///
/// Offsets run over the square `[-radius, radius]²` in `step`-sized
/// increments but only those inside the radius circle are kept. The
/// zero offset is skipped and the exact center appended afterwards, so the
/// center appears exactly once.
fn densify_chokepoint(chokepoint: &Chokepoint, waypoints: &mut Vec<Waypoint>) {
    let radius = chokepoint.radius_degrees;
    let step = chokepoint.step_degrees;
    if radius <= 0.0 || step <= 0.0 {
        return;
    }

    let steps_per_side = (2.0 * radius / step + STEP_EPSILON) as u32;
    for i in 0..=steps_per_side {
        let dlat = -radius + f64::from(i) * step;
        for j in 0..=steps_per_side {
            let dlon = -radius + f64::from(j) * step;
            let offset = (dlat * dlat + dlon * dlon).sqrt();
            if offset > radius || offset == 0.0 {
                continue;
            }

            let lat = chokepoint.lat + dlat;
            if !(MIN_LAT..=MAX_LAT).contains(&lat) {
                continue;
            }
            let lon = normalize_longitude(chokepoint.lon + dlon);

            waypoints.push(Waypoint {
                index: waypoints.len() as u32,
                lat,
                lon,
                chokepoint_id: Some(chokepoint.id.clone()),
            });
        }
    }

    waypoints.push(Waypoint {
        index: waypoints.len() as u32,
        lat: chokepoint.lat,
        lon: chokepoint.lon,
        chokepoint_id: Some(chokepoint.id.clone()),
    });
}

/// Drop waypoints inside land geometry, re-indexing survivors densely.
pub fn filter_land_waypoints(waypoints: Vec<Waypoint>, mask: &LandMask) -> Vec<Waypoint> {
    let mut ocean = Vec::with_capacity(waypoints.len());
    for waypoint in waypoints {
        if mask.contains(waypoint.lat, waypoint.lon) {
            continue;
        }
        ocean.push(Waypoint {
            index: ocean.len() as u32,
            ..waypoint
        });
    }
    ocean
}
