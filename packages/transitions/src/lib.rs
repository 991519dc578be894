#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-individual residency transition derivation and movement summaries.
//!
//! Given classified GPS fixes, this crate derives the step-by-step
//! transition label for each individual's time-ordered sequence and
//! aggregates the per-individual movement summary (populations visited,
//! switch counts by type, switch rate per year).
//!
//! The derivation is order-dependent by design: re-sorting an input
//! sequence changes the result, so sortedness is enforced with an explicit
//! check rather than assumed. Sequences for different individuals never
//! interact.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use range_map_track_models::{
    ClassifiedLocation, IndividualSummary, LabeledLocation, StateLabel, TransitionLabel,
};

/// Days per year used for the switch-rate denominator.
const DAYS_PER_YEAR: f64 = 365.25;

/// Errors that can occur during transition derivation and summarization.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    /// The input sequence is not sorted by timestamp ascending. Deriving
    /// transitions over an unsorted sequence would silently produce wrong
    /// labels, so it is rejected instead.
    #[error("sequence for {animal_id} is not time-ordered at index {index}")]
    UnsortedSequence {
        /// Individual whose sequence was rejected.
        animal_id: String,
        /// Index of the first fix that precedes its predecessor in time.
        index: usize,
    },

    /// A summary was requested over zero fixes.
    #[error("no fixes to summarize for {animal_id}")]
    EmptySequence {
        /// Individual with no fixes.
        animal_id: String,
    },

    /// A transition label disagrees with its adjacent state labels. This
    /// never happens when labels come from [`derive_transitions`]; it
    /// signals an integration bug in the caller, not a data problem.
    #[error("transition label at index {index} for {animal_id} does not match its adjacent states")]
    InconsistentTransition {
        /// Individual whose sequence failed validation.
        animal_id: String,
        /// Index of the disagreeing label.
        index: usize,
    },
}

/// Derives the transition label sequence for one individual.
///
/// The output has the same length as the input. The first element is always
/// [`TransitionLabel::Undefined`] (no predecessor exists); element `i >= 1`
/// is [`TransitionLabel::NoChange`] when `states[i]` equals `states[i - 1]`
/// and the matching directed switch variant otherwise. An empty input
/// produces an empty output.
///
/// # Errors
///
/// Returns [`TransitionError::UnsortedSequence`] if any timestamp precedes
/// its predecessor. Ties are allowed; input order decides them.
pub fn derive_transitions(
    animal_id: &str,
    states: &[(StateLabel, DateTime<Utc>)],
) -> Result<Vec<TransitionLabel>, TransitionError> {
    for (index, window) in states.windows(2).enumerate() {
        if window[1].1 < window[0].1 {
            return Err(TransitionError::UnsortedSequence {
                animal_id: animal_id.to_owned(),
                index: index + 1,
            });
        }
    }

    let mut labels = Vec::with_capacity(states.len());
    for (index, (state, _)) in states.iter().enumerate() {
        let label = if index == 0 {
            TransitionLabel::Undefined
        } else {
            TransitionLabel::between(states[index - 1].0, *state)
        };
        labels.push(label);
    }

    Ok(labels)
}

/// Labels one individual's classified fixes with transitions.
///
/// Fixes are sorted by timestamp (stable, so equal timestamps keep their
/// input order) before derivation.
///
/// # Errors
///
/// Returns [`TransitionError::UnsortedSequence`] only if the post-sort
/// sequence still violates ordering, which cannot happen; the derivation's
/// check is kept as the single enforcement point.
pub fn label_individual(
    animal_id: &str,
    mut fixes: Vec<ClassifiedLocation>,
) -> Result<Vec<LabeledLocation>, TransitionError> {
    fixes.sort_by_key(|location| location.fix.recorded_at);

    let states: Vec<(StateLabel, DateTime<Utc>)> = fixes
        .iter()
        .map(|location| (location.state, location.fix.recorded_at))
        .collect();
    let transitions = derive_transitions(animal_id, &states)?;

    Ok(fixes
        .into_iter()
        .zip(transitions)
        .map(|(location, transition)| LabeledLocation {
            fix: location.fix,
            state: location.state,
            population: location.population,
            transition,
        })
        .collect())
}

/// Labels every individual's fixes with transitions.
///
/// Fixes are grouped by animal id and each group is processed
/// independently. Output is ordered by animal id, then time.
///
/// # Errors
///
/// Propagates [`TransitionError`] from any individual's derivation.
pub fn label_all(
    classified: Vec<ClassifiedLocation>,
) -> Result<Vec<LabeledLocation>, TransitionError> {
    let mut by_animal: BTreeMap<String, Vec<ClassifiedLocation>> = BTreeMap::new();
    for location in classified {
        by_animal
            .entry(location.fix.animal_id.clone())
            .or_default()
            .push(location);
    }

    let individuals = by_animal.len();
    let mut labeled = Vec::new();
    for (animal_id, fixes) in by_animal {
        labeled.extend(label_individual(&animal_id, fixes)?);
    }

    log::info!(
        "Derived transitions for {} fixes across {individuals} individuals",
        labeled.len()
    );

    Ok(labeled)
}

/// Summarizes one individual's labeled, time-ordered fix sequence.
///
/// # Errors
///
/// Returns [`TransitionError::EmptySequence`] for zero fixes,
/// [`TransitionError::UnsortedSequence`] if the sequence is not
/// time-ordered, and [`TransitionError::InconsistentTransition`] if a
/// transition label disagrees with its adjacent states (an integration
/// bug in the caller).
pub fn summarize(
    animal_id: &str,
    sequence: &[LabeledLocation],
) -> Result<IndividualSummary, TransitionError> {
    let (first, last) = match (sequence.first(), sequence.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(TransitionError::EmptySequence {
                animal_id: animal_id.to_owned(),
            });
        }
    };

    validate_sequence(animal_id, sequence)?;

    let mut populations: BTreeSet<&str> = BTreeSet::new();
    let mut in_transit = false;
    let mut home_to_other: u64 = 0;
    let mut home_to_transit: u64 = 0;
    let mut other_to_home: u64 = 0;
    let mut other_to_transit: u64 = 0;
    let mut transit_to_home: u64 = 0;
    let mut transit_to_other: u64 = 0;

    for location in sequence {
        if let Some(population) = location.population.as_deref() {
            populations.insert(population);
        }
        if location.state == StateLabel::Transit {
            in_transit = true;
        }

        match location.transition {
            TransitionLabel::Undefined | TransitionLabel::NoChange => {}
            TransitionLabel::HomeToOther => home_to_other += 1,
            TransitionLabel::HomeToTransit => home_to_transit += 1,
            TransitionLabel::OtherToHome => other_to_home += 1,
            TransitionLabel::OtherToTransit => other_to_transit += 1,
            TransitionLabel::TransitToHome => transit_to_home += 1,
            TransitionLabel::TransitToOther => transit_to_other += 1,
        }
    }

    let total_state_switches = home_to_other
        + home_to_transit
        + other_to_home
        + other_to_transit
        + transit_to_home
        + transit_to_other;

    let first_fix = first.fix.recorded_at;
    let last_fix = last.fix.recorded_at;
    #[allow(clippy::cast_precision_loss)]
    let tracked_days = (last_fix - first_fix).num_seconds() as f64 / 86_400.0;
    #[allow(clippy::cast_precision_loss)]
    let switches_per_year = if tracked_days > 0.0 {
        total_state_switches as f64 / (tracked_days / DAYS_PER_YEAR)
    } else {
        0.0
    };

    let total_populations = populations.len() as u64;
    Ok(IndividualSummary {
        animal_id: animal_id.to_owned(),
        home_population: first.fix.home_population.clone(),
        populations_visited: populations.into_iter().collect::<Vec<_>>().join(";"),
        total_populations,
        in_transit,
        total_locations_with_transit: total_populations + u64::from(in_transit),
        first_fix,
        last_fix,
        tracked_days,
        total_state_switches,
        home_to_other,
        home_to_transit,
        other_to_home,
        other_to_transit,
        transit_to_home,
        transit_to_other,
        switches_per_year,
    })
}

/// Summarizes every individual in a labeled dataset.
///
/// Output is sorted by animal id.
///
/// # Errors
///
/// Propagates [`TransitionError`] from any individual's summary.
pub fn summarize_all(
    labeled: &[LabeledLocation],
) -> Result<Vec<IndividualSummary>, TransitionError> {
    let mut by_animal: BTreeMap<&str, Vec<&LabeledLocation>> = BTreeMap::new();
    for location in labeled {
        by_animal
            .entry(&location.fix.animal_id)
            .or_default()
            .push(location);
    }

    let mut summaries = Vec::with_capacity(by_animal.len());
    for (animal_id, group) in by_animal {
        let sequence: Vec<LabeledLocation> = group.into_iter().cloned().collect();
        summaries.push(summarize(animal_id, &sequence)?);
    }

    log::info!("Summarized {} individuals", summaries.len());

    Ok(summaries)
}

/// Checks time ordering and label/state agreement over a labeled sequence.
fn validate_sequence(
    animal_id: &str,
    sequence: &[LabeledLocation],
) -> Result<(), TransitionError> {
    for (index, location) in sequence.iter().enumerate() {
        let expected = if index == 0 {
            TransitionLabel::Undefined
        } else {
            let previous = &sequence[index - 1];
            if location.fix.recorded_at < previous.fix.recorded_at {
                return Err(TransitionError::UnsortedSequence {
                    animal_id: animal_id.to_owned(),
                    index,
                });
            }
            TransitionLabel::between(previous.state, location.state)
        };

        if location.transition != expected {
            return Err(TransitionError::InconsistentTransition {
                animal_id: animal_id.to_owned(),
                index,
            });
        }
    }
    Ok(())
}
