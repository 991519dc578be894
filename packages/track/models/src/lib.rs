#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical typed records for the range-map system.
//!
//! This crate defines the shared vocabulary used across the workspace: GPS
//! location records, range-residency state labels, movement transition
//! labels, and the per-individual movement summary. Every other package
//! consumes these types rather than passing loosely-shaped rows around.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Sex of a collared individual.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    /// Female
    Female,
    /// Male
    Male,
}

/// Age class of a collared individual at capture.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AgeClass {
    /// Less than one year old
    Juvenile,
    /// One to two years old
    Yearling,
    /// Two years or older
    Adult,
}

/// Range-residency state of a single GPS fix.
///
/// Exactly one state applies to every fix: the three cases are exhaustive
/// and mutually exclusive given the containment test's result.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StateLabel {
    /// Fix falls inside the range polygon of the individual's own population.
    Home,
    /// Fix falls inside some other population's range polygon.
    Other,
    /// Fix falls inside no known range polygon.
    Transit,
}

impl StateLabel {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Home, Self::Other, Self::Transit]
    }
}

/// Movement transition attached to a fix relative to the individual's
/// immediately preceding fix in time order.
///
/// The first fix of every individual carries [`TransitionLabel::Undefined`]
/// (it has no predecessor). Adjacent fixes in the same state produce
/// [`TransitionLabel::NoChange`]. A state change produces one of the six
/// directed switch variants.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionLabel {
    /// First fix of an individual's sequence; no predecessor exists.
    Undefined,
    /// Same state as the preceding fix.
    NoChange,
    /// Home range to another population's range.
    HomeToOther,
    /// Home range to unassigned ground.
    HomeToTransit,
    /// Another population's range back to the home range.
    OtherToHome,
    /// Another population's range to unassigned ground.
    OtherToTransit,
    /// Unassigned ground into the home range.
    TransitToHome,
    /// Unassigned ground into another population's range.
    TransitToOther,
}

impl TransitionLabel {
    /// Derives the transition between two temporally adjacent states.
    #[must_use]
    pub const fn between(previous: StateLabel, current: StateLabel) -> Self {
        match (previous, current) {
            (StateLabel::Home, StateLabel::Home)
            | (StateLabel::Other, StateLabel::Other)
            | (StateLabel::Transit, StateLabel::Transit) => Self::NoChange,
            (StateLabel::Home, StateLabel::Other) => Self::HomeToOther,
            (StateLabel::Home, StateLabel::Transit) => Self::HomeToTransit,
            (StateLabel::Other, StateLabel::Home) => Self::OtherToHome,
            (StateLabel::Other, StateLabel::Transit) => Self::OtherToTransit,
            (StateLabel::Transit, StateLabel::Home) => Self::TransitToHome,
            (StateLabel::Transit, StateLabel::Other) => Self::TransitToOther,
        }
    }

    /// Whether this label represents an actual state switch (not
    /// `Undefined` and not `NoChange`).
    #[must_use]
    pub const fn is_switch(self) -> bool {
        !matches!(self, Self::Undefined | Self::NoChange)
    }

    /// The ordered (previous, current) state pair for a switch variant,
    /// `None` for `Undefined` and `NoChange`.
    #[must_use]
    pub const fn endpoints(self) -> Option<(StateLabel, StateLabel)> {
        match self {
            Self::Undefined | Self::NoChange => None,
            Self::HomeToOther => Some((StateLabel::Home, StateLabel::Other)),
            Self::HomeToTransit => Some((StateLabel::Home, StateLabel::Transit)),
            Self::OtherToHome => Some((StateLabel::Other, StateLabel::Home)),
            Self::OtherToTransit => Some((StateLabel::Other, StateLabel::Transit)),
            Self::TransitToHome => Some((StateLabel::Transit, StateLabel::Home)),
            Self::TransitToOther => Some((StateLabel::Transit, StateLabel::Other)),
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Undefined,
            Self::NoChange,
            Self::HomeToOther,
            Self::HomeToTransit,
            Self::OtherToHome,
            Self::OtherToTransit,
            Self::TransitToHome,
            Self::TransitToOther,
        ]
    }

    /// Returns the six directed switch variants.
    #[must_use]
    pub const fn switches() -> &'static [Self] {
        &[
            Self::HomeToOther,
            Self::HomeToTransit,
            Self::OtherToHome,
            Self::OtherToTransit,
            Self::TransitToHome,
            Self::TransitToOther,
        ]
    }
}

/// EPSG-coded planar coordinate reference frame tag.
///
/// Points and polygons compared in one classification pass must share a
/// frame; the tag makes the precondition checkable instead of assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoordinateFrame {
    /// EPSG code of the projected frame (e.g., 32611 for UTM zone 11N).
    pub epsg: u32,
}

impl CoordinateFrame {
    /// UTM zone 11N (EPSG:32611), the frame the reference datasets use.
    pub const UTM_11N: Self = Self { epsg: 32_611 };

    /// Creates a frame tag from an EPSG code.
    #[must_use]
    pub const fn from_epsg(epsg: u32) -> Self {
        Self { epsg }
    }
}

impl std::fmt::Display for CoordinateFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// A single GPS fix for a collared individual.
///
/// Coordinates are planar easting/northing in the owning [`TrackSet`]'s
/// frame. Covariates are optional; individuals with unknown sex or age
/// class still classify normally and fall into an `UNKNOWN` group in
/// covariate breakdowns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    /// Collar/individual identifier.
    pub animal_id: String,
    /// Name of the population this individual was assigned to at capture.
    pub home_population: String,
    /// When the fix was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Projected easting in meters.
    pub easting: f64,
    /// Projected northing in meters.
    pub northing: f64,
    /// Sex, if recorded at capture.
    pub sex: Option<Sex>,
    /// Age class, if recorded at capture.
    pub age_class: Option<AgeClass>,
}

/// A collection of GPS fixes sharing one coordinate reference frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSet {
    /// Frame every fix's easting/northing is expressed in.
    pub frame: CoordinateFrame,
    /// The fixes. No ordering is guaranteed; consumers that need temporal
    /// order sort per individual themselves.
    pub fixes: Vec<LocationRecord>,
}

impl TrackSet {
    /// Creates a track set from a frame and fixes.
    #[must_use]
    pub const fn new(frame: CoordinateFrame, fixes: Vec<LocationRecord>) -> Self {
        Self { frame, fixes }
    }

    /// Number of fixes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    /// Whether the set contains no fixes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

/// A GPS fix with its range-residency state attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedLocation {
    /// The underlying fix.
    pub fix: LocationRecord,
    /// Residency state of the fix.
    pub state: StateLabel,
    /// Population whose range contains the fix; `None` when in transit.
    pub population: Option<String>,
}

/// A classified fix with its movement transition attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledLocation {
    /// The underlying fix.
    pub fix: LocationRecord,
    /// Residency state of the fix.
    pub state: StateLabel,
    /// Population whose range contains the fix; `None` when in transit.
    pub population: Option<String>,
    /// Transition relative to the individual's preceding fix.
    pub transition: TransitionLabel,
}

/// Per-individual movement summary derived from a labeled fix sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualSummary {
    /// Collar/individual identifier.
    pub animal_id: String,
    /// Population the individual was assigned to at capture.
    pub home_population: String,
    /// Distinct populations whose ranges the individual entered,
    /// semicolon-joined in sorted order.
    pub populations_visited: String,
    /// Count of distinct populations visited.
    pub total_populations: u64,
    /// Whether any fix fell outside all known ranges.
    pub in_transit: bool,
    /// Distinct "locations" counting transit as a pseudo-category:
    /// `total_populations` + 1 if `in_transit`.
    pub total_locations_with_transit: u64,
    /// Timestamp of the first fix.
    pub first_fix: DateTime<Utc>,
    /// Timestamp of the last fix.
    pub last_fix: DateTime<Utc>,
    /// Elapsed tracked duration in days.
    pub tracked_days: f64,
    /// Total count of state switches (everything except `NoChange` and the
    /// leading `Undefined`).
    pub total_state_switches: u64,
    /// Home range to another population's range.
    pub home_to_other: u64,
    /// Home range to unassigned ground.
    pub home_to_transit: u64,
    /// Another population's range back home.
    pub other_to_home: u64,
    /// Another population's range to unassigned ground.
    pub other_to_transit: u64,
    /// Unassigned ground into the home range.
    pub transit_to_home: u64,
    /// Unassigned ground into another population's range.
    pub transit_to_other: u64,
    /// State switches per year of tracking: total switches divided by
    /// (`tracked_days` / 365.25). Zero when no time elapsed.
    pub switches_per_year: f64,
}

impl IndividualSummary {
    /// Count for one of the six directed switch variants.
    ///
    /// Returns 0 for `Undefined` and `NoChange`, which are not switches.
    #[must_use]
    pub const fn switch_count(&self, transition: TransitionLabel) -> u64 {
        match transition {
            TransitionLabel::Undefined | TransitionLabel::NoChange => 0,
            TransitionLabel::HomeToOther => self.home_to_other,
            TransitionLabel::HomeToTransit => self.home_to_transit,
            TransitionLabel::OtherToHome => self.other_to_home,
            TransitionLabel::OtherToTransit => self.other_to_transit,
            TransitionLabel::TransitToHome => self.transit_to_home,
            TransitionLabel::TransitToOther => self.transit_to_other,
        }
    }
}
