//! GeoJSON reader for population range polygons.
//!
//! Expects a `FeatureCollection` where each feature carries a `population`
//! string property and a `Polygon` or `MultiPolygon` geometry, already
//! reprojected into the working frame by the producer.

use std::path::Path;

use geo::MultiPolygon;
use geojson::{FeatureCollection, GeoJson};
use range_map_spatial::{RangePolygon, RangeSet};
use range_map_track_models::CoordinateFrame;

use crate::IngestError;

/// Reads a range set from a GeoJSON file.
///
/// The returned set is tagged with `frame`; GeoJSON's own CRS member is
/// long deprecated, so the caller states which frame the producer used.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read or parsed, is not a
/// `FeatureCollection`, or any feature lacks a `population` property or a
/// polygonal geometry.
pub fn read_ranges(path: &Path, frame: CoordinateFrame) -> Result<RangeSet, IngestError> {
    let raw = std::fs::read_to_string(path)?;
    let collection = parse_feature_collection(&raw)?;

    let mut ranges = Vec::with_capacity(collection.features.len());
    for (feature_index, feature) in collection.features.into_iter().enumerate() {
        let population = feature
            .property("population")
            .and_then(|value| value.as_str())
            .ok_or(IngestError::MissingPopulationProperty { feature_index })?
            .to_owned();

        let Some(geometry) = feature.geometry else {
            return Err(IngestError::UnsupportedGeometry { population });
        };
        let geometry = to_multipolygon(geometry, &population)?;

        ranges.push(RangePolygon {
            population,
            geometry,
        });
    }

    log::info!(
        "Read {} range polygons from {} ({frame})",
        ranges.len(),
        path.display()
    );

    Ok(RangeSet { frame, ranges })
}

/// Parses raw GeoJSON text into a `FeatureCollection`.
fn parse_feature_collection(raw: &str) -> Result<FeatureCollection, IngestError> {
    match raw.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(_) | GeoJson::Geometry(_) => Err(IngestError::NotAFeatureCollection),
    }
}

/// Converts a feature geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn to_multipolygon(
    geometry: geojson::Geometry,
    population: &str,
) -> Result<MultiPolygon<f64>, IngestError> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        geo::Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        _ => Err(IngestError::UnsupportedGeometry {
            population: population.to_owned(),
        }),
    }
}
