#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Grouped state and transition breakdowns over classified movement data.
//!
//! Read-only reductions over the labeled dataset, grouped by a categorical
//! covariate (sex, age class, age-sex combination, or home population).
//! Percentages are always computed against the group's own totals, never
//! the global total. Undefined transition markers are counted but excluded
//! from the transition-percentage denominator (a first fix has no
//! transition to take a share of).

use std::collections::BTreeMap;

use range_map_track_models::{LabeledLocation, LocationRecord, StateLabel, TransitionLabel};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Group label used when a covariate was not recorded for an individual.
pub const UNKNOWN_GROUP: &str = "UNKNOWN";

/// Categorical covariate to group a breakdown by.
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
pub enum GroupBy {
    /// Group by sex.
    Sex,
    /// Group by age class.
    AgeClass,
    /// Group by the age-sex combination (e.g., `ADULT/FEMALE`).
    AgeSex,
    /// Group by the individual's home population.
    HomePopulation,
}

impl GroupBy {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Sex, Self::AgeClass, Self::AgeSex, Self::HomePopulation]
    }

    /// The group a fix falls into under this covariate.
    #[must_use]
    pub fn key(self, fix: &LocationRecord) -> String {
        match self {
            Self::Sex => fix
                .sex
                .map_or_else(|| UNKNOWN_GROUP.to_owned(), |sex| sex.to_string()),
            Self::AgeClass => fix
                .age_class
                .map_or_else(|| UNKNOWN_GROUP.to_owned(), |age| age.to_string()),
            Self::AgeSex => {
                let age = fix
                    .age_class
                    .map_or_else(|| UNKNOWN_GROUP.to_owned(), |age| age.to_string());
                let sex = fix
                    .sex
                    .map_or_else(|| UNKNOWN_GROUP.to_owned(), |sex| sex.to_string());
                format!("{age}/{sex}")
            }
            Self::HomePopulation => fix.home_population.clone(),
        }
    }
}

/// One row of a grouped per-state breakdown table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateBreakdownRow {
    /// Covariate group this row belongs to.
    pub group: String,
    /// Residency state being counted.
    pub state: StateLabel,
    /// Number of fixes in the group with this state.
    pub count: u64,
    /// Share of the group's fixes with this state, in percent.
    pub percent: f64,
}

/// One row of a grouped per-transition breakdown table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionBreakdownRow {
    /// Covariate group this row belongs to.
    pub group: String,
    /// Transition label being counted.
    pub transition: TransitionLabel,
    /// Number of fixes in the group with this transition label.
    pub count: u64,
    /// Share of the group's defined transitions, in percent. `None` for
    /// the `Undefined` marker, which is excluded from the denominator.
    pub percent: Option<f64>,
}

/// Per-state fix counts and percentages, grouped by a covariate.
///
/// Every group emits a row for each of the three states, zero counts
/// included, ordered by group then state.
#[must_use]
pub fn state_breakdown(labeled: &[LabeledLocation], by: GroupBy) -> Vec<StateBreakdownRow> {
    let mut counts: BTreeMap<String, BTreeMap<StateLabel, u64>> = BTreeMap::new();
    for location in labeled {
        *counts
            .entry(by.key(&location.fix))
            .or_default()
            .entry(location.state)
            .or_default() += 1;
    }

    let mut rows = Vec::new();
    for (group, states) in counts {
        let total: u64 = states.values().sum();
        for &state in StateLabel::all() {
            let count = states.get(&state).copied().unwrap_or(0);
            rows.push(StateBreakdownRow {
                group: group.clone(),
                state,
                count,
                percent: percent_of(count, total),
            });
        }
    }
    rows
}

/// Per-transition fix counts and percentages, grouped by a covariate.
///
/// Every group emits a row for each transition label, zero counts
/// included, ordered by group then label. `Undefined` rows report their
/// count but no percentage; all other percentages are shares of the
/// group's defined (non-`Undefined`) transitions.
#[must_use]
pub fn transition_breakdown(
    labeled: &[LabeledLocation],
    by: GroupBy,
) -> Vec<TransitionBreakdownRow> {
    let mut counts: BTreeMap<String, BTreeMap<TransitionLabel, u64>> = BTreeMap::new();
    for location in labeled {
        *counts
            .entry(by.key(&location.fix))
            .or_default()
            .entry(location.transition)
            .or_default() += 1;
    }

    let mut rows = Vec::new();
    for (group, transitions) in counts {
        let defined: u64 = transitions
            .iter()
            .filter(|(label, _)| **label != TransitionLabel::Undefined)
            .map(|(_, count)| count)
            .sum();
        for &transition in TransitionLabel::all() {
            let count = transitions.get(&transition).copied().unwrap_or(0);
            let percent = if transition == TransitionLabel::Undefined {
                None
            } else {
                Some(percent_of(count, defined))
            };
            rows.push(TransitionBreakdownRow {
                group: group.clone(),
                transition,
                count,
                percent,
            });
        }
    }
    rows
}

/// `count` as a percentage of `total`, 0.0 when the total is zero.
#[allow(clippy::cast_precision_loss)]
fn percent_of(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use range_map_track_models::{AgeClass, Sex};

    use super::*;

    fn labeled(
        animal_id: &str,
        sex: Option<Sex>,
        age_class: Option<AgeClass>,
        state: StateLabel,
        transition: TransitionLabel,
    ) -> LabeledLocation {
        LabeledLocation {
            fix: LocationRecord {
                animal_id: animal_id.to_owned(),
                home_population: "Alpha".to_owned(),
                recorded_at: Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap(),
                easting: 0.0,
                northing: 0.0,
                sex,
                age_class,
            },
            state,
            population: None,
            transition,
        }
    }

    #[test]
    fn state_percentages_use_group_totals() {
        let data = vec![
            labeled(
                "f1",
                Some(Sex::Female),
                None,
                StateLabel::Home,
                TransitionLabel::Undefined,
            ),
            labeled(
                "f1",
                Some(Sex::Female),
                None,
                StateLabel::Home,
                TransitionLabel::NoChange,
            ),
            labeled(
                "f1",
                Some(Sex::Female),
                None,
                StateLabel::Transit,
                TransitionLabel::HomeToTransit,
            ),
            labeled(
                "m1",
                Some(Sex::Male),
                None,
                StateLabel::Home,
                TransitionLabel::Undefined,
            ),
        ];

        let rows = state_breakdown(&data, GroupBy::Sex);
        assert_eq!(rows.len(), 6);

        let female_home = rows
            .iter()
            .find(|row| row.group == "FEMALE" && row.state == StateLabel::Home)
            .unwrap();
        assert_eq!(female_home.count, 2);
        // 2 of the 3 FEMALE fixes, not 2 of the 4 total.
        assert!((female_home.percent - 66.666_666_666_666_67).abs() < 1e-9);

        let male_home = rows
            .iter()
            .find(|row| row.group == "MALE" && row.state == StateLabel::Home)
            .unwrap();
        assert!((male_home.percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn state_percentages_sum_to_100_per_group() {
        let data = vec![
            labeled(
                "f1",
                Some(Sex::Female),
                None,
                StateLabel::Home,
                TransitionLabel::Undefined,
            ),
            labeled(
                "f1",
                Some(Sex::Female),
                None,
                StateLabel::Other,
                TransitionLabel::HomeToOther,
            ),
            labeled(
                "f1",
                Some(Sex::Female),
                None,
                StateLabel::Transit,
                TransitionLabel::OtherToTransit,
            ),
        ];

        let rows = state_breakdown(&data, GroupBy::Sex);
        let total: f64 = rows
            .iter()
            .filter(|row| row.group == "FEMALE")
            .map(|row| row.percent)
            .sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn undefined_counts_but_takes_no_share() {
        let data = vec![
            labeled(
                "f1",
                Some(Sex::Female),
                None,
                StateLabel::Home,
                TransitionLabel::Undefined,
            ),
            labeled(
                "f1",
                Some(Sex::Female),
                None,
                StateLabel::Home,
                TransitionLabel::NoChange,
            ),
            labeled(
                "f1",
                Some(Sex::Female),
                None,
                StateLabel::Transit,
                TransitionLabel::HomeToTransit,
            ),
        ];

        let rows = transition_breakdown(&data, GroupBy::Sex);

        let undefined = rows
            .iter()
            .find(|row| row.transition == TransitionLabel::Undefined)
            .unwrap();
        assert_eq!(undefined.count, 1);
        assert_eq!(undefined.percent, None);

        // Two defined transitions; each takes 50%.
        let no_change = rows
            .iter()
            .find(|row| row.transition == TransitionLabel::NoChange)
            .unwrap();
        assert_eq!(no_change.count, 1);
        assert!((no_change.percent.unwrap() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn age_sex_combines_both_covariates() {
        let fix = labeled(
            "f1",
            Some(Sex::Female),
            Some(AgeClass::Adult),
            StateLabel::Home,
            TransitionLabel::Undefined,
        );
        assert_eq!(GroupBy::AgeSex.key(&fix.fix), "ADULT/FEMALE");

        let unknown = labeled(
            "u1",
            None,
            None,
            StateLabel::Home,
            TransitionLabel::Undefined,
        );
        assert_eq!(GroupBy::AgeSex.key(&unknown.fix), "UNKNOWN/UNKNOWN");
        assert_eq!(GroupBy::Sex.key(&unknown.fix), UNKNOWN_GROUP);
    }

    #[test]
    fn home_population_groups_by_assignment() {
        let fix = labeled(
            "f1",
            None,
            None,
            StateLabel::Home,
            TransitionLabel::Undefined,
        );
        assert_eq!(GroupBy::HomePopulation.key(&fix.fix), "Alpha");
    }
}
