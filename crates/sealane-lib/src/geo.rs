//! Great-circle geometry helpers shared by the snapper and the graph builder.

/// Mean Earth radius in kilometers used for all Haversine computations.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine (great-circle) distance between two lat/lon points in kilometers.
pub fn haversine_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Haversine distance with dateline wrap-around, in kilometers.
///
/// Evaluates the direct distance and both ±360° longitude shifts of the first
/// point and returns the minimum. Naive longitude deltas across the
/// antimeridian would otherwise make trans-Pacific neighbors look half a
/// planet apart.
pub fn antimeridian_aware_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let direct = haversine_distance_km(lat1, lon1, lat2, lon2);
    let wrapped_east = haversine_distance_km(lat1, lon1 + 360.0, lat2, lon2);
    let wrapped_west = haversine_distance_km(lat1, lon1 - 360.0, lat2, lon2);
    direct.min(wrapped_east).min(wrapped_west)
}

/// Normalize a longitude into `[-180, 180)` by repeated ±360° shifts.
pub fn normalize_longitude(mut lon: f64) -> f64 {
    while lon >= 180.0 {
        lon -= 360.0;
    }
    while lon < -180.0 {
        lon += 360.0;
    }
    lon
}

/// Project a lat/lon pair onto the unit sphere as ECEF-style coordinates.
///
/// Chord distance between unit vectors is monotonic in great-circle distance,
/// so a Euclidean KD-tree over these points yields correct nearest-neighbour
/// ordering on the sphere, including across the antimeridian.
pub fn unit_sphere(lat: f64, lon: f64) -> [f64; 3] {
    let (lat_r, lon_r) = (lat.to_radians(), lon.to_radians());
    [
        lat_r.cos() * lon_r.cos(),
        lat_r.cos() * lon_r.sin(),
        lat_r.sin(),
    ]
}

/// Convert a chord length between unit-sphere points to great-circle km.
pub fn chord_to_great_circle_km(chord: f64) -> f64 {
    let half = (chord / 2.0).clamp(-1.0, 1.0);
    2.0 * half.asin() * EARTH_RADIUS_KM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_matches_known_distance() {
        // Rotterdam to Singapore, roughly 10,500 km great-circle.
        let d = haversine_distance_km(51.9167, 4.5, 1.2833, 103.85);
        assert!((d - 10_513.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn antimeridian_distance_never_exceeds_naive() {
        let cases = [
            (35.68, 139.69, 33.74, -118.27), // Tokyo - Los Angeles
            (-18.12, 178.45, -18.0, -179.5), // Fiji across the dateline
            (10.0, 170.0, 10.0, -170.0),
        ];
        for (lat1, lon1, lat2, lon2) in cases {
            let naive = haversine_distance_km(lat1, lon1, lat2, lon2);
            let aware = antimeridian_aware_distance_km(lat1, lon1, lat2, lon2);
            assert!(aware <= naive + 1e-9);
        }
    }

    #[test]
    fn dateline_neighbors_are_close() {
        // 179°E and 179°W are two degrees of longitude apart at the equator.
        let d = antimeridian_aware_distance_km(0.0, 179.0, 0.0, -179.0);
        assert!(d < 250.0, "got {d}");
    }

    #[test]
    fn normalize_longitude_wraps_into_range() {
        assert_eq!(normalize_longitude(180.0), -180.0);
        assert_eq!(normalize_longitude(-180.0), -180.0);
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(540.0), -180.0);
        assert_eq!(normalize_longitude(0.0), 0.0);
    }

    #[test]
    fn chord_round_trips_through_unit_sphere() {
        let a = unit_sphere(51.9167, 4.5);
        let b = unit_sphere(1.2833, 103.85);
        let chord = ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt();
        let via_chord = chord_to_great_circle_km(chord);
        let direct = haversine_distance_km(51.9167, 4.5, 1.2833, 103.85);
        assert!((via_chord - direct).abs() < 1.0);
    }
}
