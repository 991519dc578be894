#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Input handling for the range-map pipeline.
//!
//! Reads GPS fixes from CSV, range polygons from GeoJSON, and the
//! population-name correction table from TOML, producing the typed
//! collections the classifier consumes. Corrections are applied once here,
//! yielding a new corrected dataset; nothing downstream ever rewrites
//! shared inputs.
//!
//! Coordinate reprojection is the data producer's job: both inputs must
//! already be expressed in the working projected frame (the reference
//! datasets use UTM zone 11N).

pub mod aliases;
pub mod locations;
pub mod ranges;

pub use aliases::PopulationAliases;
pub use locations::read_locations;
pub use ranges::read_ranges;

use std::collections::BTreeSet;

use range_map_spatial::RangeSet;
use range_map_track_models::TrackSet;

/// Errors that can occur while reading pipeline inputs.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// GeoJSON parsing failed.
    #[error("GeoJSON error: {0}")]
    Geojson(#[from] geojson::Error),

    /// The ranges file is not a GeoJSON `FeatureCollection`.
    #[error("expected a GeoJSON FeatureCollection of range polygons")]
    NotAFeatureCollection,

    /// A range feature lacks the `population` string property.
    #[error("range feature {feature_index} has no \"population\" property")]
    MissingPopulationProperty {
        /// Zero-based index of the offending feature.
        feature_index: usize,
    },

    /// A range feature has a geometry other than `Polygon`/`MultiPolygon`.
    #[error("range feature for population {population:?} has a non-polygon geometry")]
    UnsupportedGeometry {
        /// Population name of the offending feature.
        population: String,
    },

    /// A fix row's timestamp could not be parsed.
    #[error("invalid timestamp {value:?} for {animal_id} on line {line}")]
    InvalidTimestamp {
        /// CSV line number (1-based, header is line 1).
        line: u64,
        /// Animal the row belongs to.
        animal_id: String,
        /// The unparseable raw value.
        value: String,
    },

    /// A fix row's sex or age-class value is not in the known domain.
    #[error("invalid covariate value {value:?} for {animal_id} on line {line}")]
    InvalidCovariate {
        /// CSV line number (1-based, header is line 1).
        line: u64,
        /// Animal the row belongs to.
        animal_id: String,
        /// The unrecognized raw value.
        value: String,
    },

    /// The alias table failed to parse.
    #[error("alias table error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Home populations in the track set that have no polygon in the range set.
///
/// These individuals structurally cannot reach the home state; callers
/// use this to flag them for exclusion before analysis.
#[must_use]
pub fn unmatched_home_populations(tracks: &TrackSet, ranges: &RangeSet) -> BTreeSet<String> {
    let known: BTreeSet<&str> = ranges
        .ranges
        .iter()
        .map(|range| range.population.as_str())
        .collect();

    tracks
        .fixes
        .iter()
        .filter(|fix| !known.contains(fix.home_population.as_str()))
        .map(|fix| fix.home_population.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use geo::{LineString, MultiPolygon, Polygon};
    use range_map_spatial::RangePolygon;
    use range_map_track_models::{CoordinateFrame, LocationRecord};

    use super::*;

    #[test]
    fn unmatched_home_populations_flags_missing_ranges() {
        let tracks = TrackSet::new(
            CoordinateFrame::UTM_11N,
            ["Lone Mountain", "Ghost Range", "Lone Mountain"]
                .into_iter()
                .map(|home| LocationRecord {
                    animal_id: "s001".to_owned(),
                    home_population: home.to_owned(),
                    recorded_at: Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap(),
                    easting: 0.0,
                    northing: 0.0,
                    sex: None,
                    age_class: None,
                })
                .collect(),
        );
        let ranges = RangeSet {
            frame: CoordinateFrame::UTM_11N,
            ranges: vec![RangePolygon {
                population: "Lone Mountain".to_owned(),
                geometry: MultiPolygon(vec![Polygon::new(
                    LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
                    vec![],
                )]),
            }],
        };

        let unmatched = unmatched_home_populations(&tracks, &ranges);
        assert_eq!(unmatched, BTreeSet::from(["Ghost Range".to_owned()]));
    }
}
