//! Land-polygon mask used by the offline builder and the optional
//! coordinate validator.
//!
//! The mask is loaded once from a GeoJSON polygon dataset in EPSG:4326 and is
//! immutable afterwards, so it is safe to share across builder stages and
//! concurrent validators. All predicates work in lon/lat coordinate order.

use std::path::Path;

use geo::{Contains, Coord, Intersects, Line, MultiPolygon, Point, Polygon};
use geojson::GeoJson;
use tracing::info;

use crate::error::{Error, Result};

/// Latitude band supported by the sea-lane grid.
pub const MAX_SUPPORTED_LATITUDE: f64 = 80.0;

/// Union of land polygons with containment and intersection predicates.
#[derive(Debug, Clone)]
pub struct LandMask {
    geometry: MultiPolygon<f64>,
    source: String,
}

impl LandMask {
    /// Load land polygons from a GeoJSON file.
    ///
    /// Accepts a `FeatureCollection`, a bare `Geometry`, or a single
    /// `Feature`; every `Polygon`/`MultiPolygon` encountered contributes to
    /// the mask. Fails with `LAND_MASK_LOAD_FAILED` when the file is missing,
    /// unparseable, or contains no polygons.
    pub fn from_geojson(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| Error::LandMaskLoadFailed {
            path: path.to_path_buf(),
            reason: format!("cannot read file: {err}"),
        })?;

        let geojson: GeoJson = text.parse().map_err(|err| Error::LandMaskLoadFailed {
            path: path.to_path_buf(),
            reason: format!("invalid GeoJSON: {err}"),
        })?;

        let mut polygons: Vec<Polygon<f64>> = Vec::new();
        collect_polygons(&geojson, &mut polygons);

        if polygons.is_empty() {
            return Err(Error::LandMaskLoadFailed {
                path: path.to_path_buf(),
                reason: "no polygon geometries found".to_string(),
            });
        }

        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!(source = %source, polygons = polygons.len(), "loaded land mask");

        Ok(Self {
            geometry: MultiPolygon(polygons),
            source,
        })
    }

    /// Build a mask directly from polygons. Used by tests and callers that
    /// already hold geometry in memory.
    pub fn from_polygons(polygons: Vec<Polygon<f64>>, source: impl Into<String>) -> Self {
        Self {
            geometry: MultiPolygon(polygons),
            source: source.into(),
        }
    }

    /// File name the mask was loaded from, recorded in the build summary.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when the point lies strictly inside land geometry.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.geometry.contains(&Point::new(lon, lat))
    }

    /// True when the great-circle segment between the endpoints, treated as a
    /// straight line in lon/lat space, touches land.
    ///
    /// Segments whose longitudes differ by more than 180° cross the
    /// antimeridian and are split at ±180° with a midpoint-latitude
    /// heuristic, each half tested separately.
    pub fn segment_crosses_land(&self, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> bool {
        if (lon2 - lon1).abs() > 180.0 {
            let mid_lat = lat1 + (lat2 - lat1) / 2.0;
            let first_end = if lon1 > 0.0 { 180.0 } else { -180.0 };
            let second_start = if lon2 > 0.0 { 180.0 } else { -180.0 };
            return self.plain_segment_crosses_land(lat1, lon1, mid_lat, first_end)
                || self.plain_segment_crosses_land(mid_lat, second_start, lat2, lon2);
        }

        self.plain_segment_crosses_land(lat1, lon1, lat2, lon2)
    }

    fn plain_segment_crosses_land(&self, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> bool {
        let line = Line::new(
            Coord { x: lon1, y: lat1 },
            Coord { x: lon2, y: lat2 },
        );
        self.geometry.intersects(&line)
    }

    /// Pre-snap coordinate validation used when a request sets
    /// `validate_coordinates`.
    pub fn validate_coordinate(&self, lat: f64, lon: f64) -> Result<()> {
        if lat.abs() > MAX_SUPPORTED_LATITUDE {
            return Err(Error::PolarRegionUnsupported { lat, lon });
        }
        if self.contains(lat, lon) {
            return Err(Error::CoordinateOnLand { lat, lon });
        }
        Ok(())
    }
}

fn collect_polygons(geojson: &GeoJson, out: &mut Vec<Polygon<f64>>) {
    match geojson {
        GeoJson::FeatureCollection(collection) => {
            for feature in &collection.features {
                if let Some(geometry) = &feature.geometry {
                    collect_from_geometry(geometry, out);
                }
            }
        }
        GeoJson::Feature(feature) => {
            if let Some(geometry) = &feature.geometry {
                collect_from_geometry(geometry, out);
            }
        }
        GeoJson::Geometry(geometry) => collect_from_geometry(geometry, out),
    }
}

fn collect_from_geometry(geometry: &geojson::Geometry, out: &mut Vec<Polygon<f64>>) {
    match geo_types::Geometry::<f64>::try_from(geometry.value.clone()) {
        Ok(geo_types::Geometry::Polygon(polygon)) => out.push(polygon),
        Ok(geo_types::Geometry::MultiPolygon(multi)) => out.extend(multi.0),
        Ok(geo_types::Geometry::GeometryCollection(collection)) => {
            for inner in collection {
                match inner {
                    geo_types::Geometry::Polygon(polygon) => out.push(polygon),
                    geo_types::Geometry::MultiPolygon(multi) => out.extend(multi.0),
                    _ => {}
                }
            }
        }
        _ => {}
    }
}
