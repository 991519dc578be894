#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index for range-residency classification.
//!
//! Builds an R-tree over the loaded population range polygons and provides
//! fast point-in-polygon lookups to assign each GPS fix one of the three
//! residency states (home, other, transit). The index is built once per run
//! and shared read-only by every consumer.
//!
//! Containment is inclusive: a fix exactly on a range boundary counts as
//! inside that range.

use std::collections::BTreeSet;

use geo::{Intersects, MultiPolygon};
use range_map_track_models::{
    ClassifiedLocation, CoordinateFrame, LocationRecord, StateLabel, TrackSet,
};
use rstar::{AABB, RTree, RTreeObject};

/// Errors that can occur while building or querying the range index.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// Fixes and range polygons are not expressed in the same coordinate
    /// reference frame. Classification over mismatched frames would produce
    /// silently wrong answers, so this is checked up front.
    #[error("coordinate frame mismatch: fixes in {found}, ranges in {expected}")]
    CoordinateFrameMismatch {
        /// Frame the range polygons are expressed in.
        expected: CoordinateFrame,
        /// Frame the fixes are expressed in.
        found: CoordinateFrame,
    },

    /// Two range polygons share the same population name. Population names
    /// are unique per polygon in the active set.
    #[error("duplicate population name in range set: {0}")]
    DuplicatePopulation(String),

    /// The range set contains no polygons.
    #[error("range set contains no polygons")]
    EmptyRangeSet,
}

/// A named population range polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct RangePolygon {
    /// Population this range belongs to.
    pub population: String,
    /// Range geometry in the owning [`RangeSet`]'s frame.
    pub geometry: MultiPolygon<f64>,
}

/// A collection of range polygons sharing one coordinate reference frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSet {
    /// Frame every polygon's coordinates are expressed in.
    pub frame: CoordinateFrame,
    /// The polygons. Ranges are assumed non-overlapping; population names
    /// must be unique.
    pub ranges: Vec<RangePolygon>,
}

/// A range polygon stored in the R-tree with its precomputed envelope.
struct RangeEntry {
    population: String,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for RangeEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Result of classifying a full track set.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedTracks {
    /// Every fix with its residency state, in input order.
    pub locations: Vec<ClassifiedLocation>,
    /// Home populations that match no polygon in the active range set.
    /// Individuals assigned to these populations can never reach the home
    /// state; surfaced so analysts can flag them for exclusion.
    pub unknown_populations: BTreeSet<String>,
}

/// Pre-built R-tree index over the population range polygons.
///
/// Constructed once per run from a [`RangeSet`] and shared across all
/// consumers. All lookups are pure.
pub struct RangeIndex {
    frame: CoordinateFrame,
    tree: RTree<RangeEntry>,
    populations: BTreeSet<String>,
}

impl RangeIndex {
    /// Builds the index from a loaded range set.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::EmptyRangeSet`] if the set has no polygons,
    /// or [`SpatialError::DuplicatePopulation`] if two polygons share a
    /// population name.
    pub fn new(set: RangeSet) -> Result<Self, SpatialError> {
        if set.ranges.is_empty() {
            return Err(SpatialError::EmptyRangeSet);
        }

        let mut populations = BTreeSet::new();
        let mut entries = Vec::with_capacity(set.ranges.len());

        for range in set.ranges {
            if !populations.insert(range.population.clone()) {
                return Err(SpatialError::DuplicatePopulation(range.population));
            }

            entries.push(RangeEntry {
                envelope: compute_envelope(&range.geometry),
                population: range.population,
                polygon: range.geometry,
            });
        }

        log::info!("Built range index over {} population ranges", entries.len());

        Ok(Self {
            frame: set.frame,
            tree: RTree::bulk_load(entries),
            populations,
        })
    }

    /// Frame the indexed polygons are expressed in.
    #[must_use]
    pub const fn frame(&self) -> CoordinateFrame {
        self.frame
    }

    /// Number of indexed range polygons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no polygons. Never true for an index built
    /// through [`RangeIndex::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Population names of all indexed ranges, sorted.
    #[must_use]
    pub const fn populations(&self) -> &BTreeSet<String> {
        &self.populations
    }

    /// Whether a population has a range polygon in the active set.
    #[must_use]
    pub fn contains_population(&self, population: &str) -> bool {
        self.populations.contains(population)
    }

    /// Finds the population whose range contains the point, if any.
    ///
    /// Ranges do not overlap in this model, so the first match wins.
    /// Boundary points count as contained.
    #[must_use]
    pub fn locate(&self, easting: f64, northing: f64) -> Option<&str> {
        let point = geo::Point::new(easting, northing);
        let query_env = AABB::from_point([easting, northing]);

        for entry in self.tree.locate_in_envelope_intersecting(&query_env) {
            if entry.polygon.intersects(&point) {
                return Some(&entry.population);
            }
        }
        None
    }

    /// Classifies a single fix against the indexed ranges.
    ///
    /// Returns `(Transit, None)` when no range contains the fix, `(Home,
    /// population)` when the containing range belongs to the fix's home
    /// population, and `(Other, population)` otherwise. Pure; safe to call
    /// concurrently.
    #[must_use]
    pub fn classify(&self, fix: &LocationRecord) -> (StateLabel, Option<&str>) {
        match self.locate(fix.easting, fix.northing) {
            None => (StateLabel::Transit, None),
            Some(population) if population == fix.home_population => {
                (StateLabel::Home, Some(population))
            }
            Some(population) => (StateLabel::Other, Some(population)),
        }
    }
}

/// Classifies every fix in a track set against the range index.
///
/// Home populations that match no indexed range are collected into
/// [`ClassifiedTracks::unknown_populations`] and logged as warnings; fixes
/// belonging to them still classify (as other or transit, never home).
///
/// # Errors
///
/// Returns [`SpatialError::CoordinateFrameMismatch`] if the track set and
/// the index are not in the same coordinate reference frame.
pub fn classify_all(
    tracks: &TrackSet,
    index: &RangeIndex,
) -> Result<ClassifiedTracks, SpatialError> {
    if tracks.frame != index.frame() {
        return Err(SpatialError::CoordinateFrameMismatch {
            expected: index.frame(),
            found: tracks.frame,
        });
    }

    let mut unknown_populations = BTreeSet::new();
    let mut locations = Vec::with_capacity(tracks.fixes.len());

    for fix in &tracks.fixes {
        if !index.contains_population(&fix.home_population)
            && unknown_populations.insert(fix.home_population.clone())
        {
            log::warn!(
                "Home population {:?} matches no range polygon; its individuals can never be classified home",
                fix.home_population
            );
        }

        let (state, population) = index.classify(fix);
        locations.push(ClassifiedLocation {
            fix: fix.clone(),
            state,
            population: population.map(str::to_owned),
        });
    }

    Ok(ClassifiedTracks {
        locations,
        unknown_populations,
    })
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    use geo::BoundingRect;

    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use geo::{LineString, Polygon};

    use super::*;

    fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Polygon::new(
            LineString::from(vec![
                (min_x, min_y),
                (max_x, min_y),
                (max_x, max_y),
                (min_x, max_y),
                (min_x, min_y),
            ]),
            vec![],
        )])
    }

    fn fix(animal_id: &str, home: &str, easting: f64, northing: f64) -> LocationRecord {
        LocationRecord {
            animal_id: animal_id.to_owned(),
            home_population: home.to_owned(),
            recorded_at: Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap(),
            easting,
            northing,
            sex: None,
            age_class: None,
        }
    }

    fn two_range_index() -> RangeIndex {
        RangeIndex::new(RangeSet {
            frame: CoordinateFrame::UTM_11N,
            ranges: vec![
                RangePolygon {
                    population: "Alpha".to_owned(),
                    geometry: square(0.0, 0.0, 10.0, 10.0),
                },
                RangePolygon {
                    population: "Beta".to_owned(),
                    geometry: square(20.0, 0.0, 30.0, 10.0),
                },
            ],
        })
        .unwrap()
    }

    #[test]
    fn classifies_home_other_transit() {
        let index = two_range_index();

        let (state, pop) = index.classify(&fix("a1", "Alpha", 5.0, 5.0));
        assert_eq!(state, StateLabel::Home);
        assert_eq!(pop, Some("Alpha"));

        let (state, pop) = index.classify(&fix("b1", "Beta", 5.0, 5.0));
        assert_eq!(state, StateLabel::Other);
        assert_eq!(pop, Some("Alpha"));

        let (state, pop) = index.classify(&fix("a1", "Alpha", 15.0, 5.0));
        assert_eq!(state, StateLabel::Transit);
        assert_eq!(pop, None);
    }

    #[test]
    fn boundary_fix_counts_as_contained() {
        let index = two_range_index();

        let (state, pop) = index.classify(&fix("a1", "Alpha", 10.0, 5.0));
        assert_eq!(state, StateLabel::Home);
        assert_eq!(pop, Some("Alpha"));

        // Corner vertex as well.
        let (state, _) = index.classify(&fix("a1", "Alpha", 0.0, 0.0));
        assert_eq!(state, StateLabel::Home);
    }

    #[test]
    fn unknown_home_population_never_home() {
        let index = two_range_index();

        let (state, pop) = index.classify(&fix("g1", "Gamma", 5.0, 5.0));
        assert_eq!(state, StateLabel::Other);
        assert_eq!(pop, Some("Alpha"));

        let (state, _) = index.classify(&fix("g1", "Gamma", 50.0, 50.0));
        assert_eq!(state, StateLabel::Transit);
    }

    #[test]
    fn classify_all_flags_unknown_populations() {
        let index = two_range_index();
        let tracks = TrackSet::new(
            CoordinateFrame::UTM_11N,
            vec![fix("g1", "Gamma", 5.0, 5.0), fix("a1", "Alpha", 5.0, 5.0)],
        );

        let classified = classify_all(&tracks, &index).unwrap();
        assert_eq!(classified.locations.len(), 2);
        assert_eq!(
            classified.unknown_populations,
            BTreeSet::from(["Gamma".to_owned()])
        );
    }

    #[test]
    fn classify_all_rejects_frame_mismatch() {
        let index = two_range_index();
        let tracks = TrackSet::new(
            CoordinateFrame::from_epsg(26_911),
            vec![fix("a1", "Alpha", 5.0, 5.0)],
        );

        let err = classify_all(&tracks, &index).unwrap_err();
        assert!(matches!(err, SpatialError::CoordinateFrameMismatch { .. }));
    }

    #[test]
    fn duplicate_population_rejected() {
        let result = RangeIndex::new(RangeSet {
            frame: CoordinateFrame::UTM_11N,
            ranges: vec![
                RangePolygon {
                    population: "Alpha".to_owned(),
                    geometry: square(0.0, 0.0, 10.0, 10.0),
                },
                RangePolygon {
                    population: "Alpha".to_owned(),
                    geometry: square(20.0, 0.0, 30.0, 10.0),
                },
            ],
        });

        assert!(matches!(
            result,
            Err(SpatialError::DuplicatePopulation(name)) if name == "Alpha"
        ));
    }

    #[test]
    fn empty_range_set_rejected() {
        let result = RangeIndex::new(RangeSet {
            frame: CoordinateFrame::UTM_11N,
            ranges: vec![],
        });
        assert!(matches!(result, Err(SpatialError::EmptyRangeSet)));
    }

    #[test]
    fn classification_is_idempotent() {
        let index = two_range_index();
        let tracks = TrackSet::new(
            CoordinateFrame::UTM_11N,
            vec![
                fix("a1", "Alpha", 5.0, 5.0),
                fix("a1", "Alpha", 15.0, 5.0),
                fix("b1", "Beta", 25.0, 5.0),
            ],
        );

        let first = classify_all(&tracks, &index).unwrap();
        let second = classify_all(&tracks, &index).unwrap();
        assert_eq!(first, second);
    }
}
