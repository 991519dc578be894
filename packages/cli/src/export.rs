//! CSV writers for the pipeline outputs.
//!
//! The core crates expose typed records only; this module flattens them
//! into the CSV shapes downstream plotting and tabulation consume.

use std::path::Path;

use range_map_analytics::GroupBy;
use range_map_track_models::{IndividualSummary, LabeledLocation};
use serde::Serialize;

/// One labeled fix, flattened for CSV export.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LabeledFixRow {
    animal_id: String,
    home_population: String,
    recorded_at: String,
    easting: f64,
    northing: f64,
    sex: Option<String>,
    age_class: Option<String>,
    state: String,
    population: Option<String>,
    transition: String,
}

impl From<&LabeledLocation> for LabeledFixRow {
    fn from(location: &LabeledLocation) -> Self {
        Self {
            animal_id: location.fix.animal_id.clone(),
            home_population: location.fix.home_population.clone(),
            recorded_at: location.fix.recorded_at.to_rfc3339(),
            easting: location.fix.easting,
            northing: location.fix.northing,
            sex: location.fix.sex.map(|sex| sex.to_string()),
            age_class: location.fix.age_class.map(|age| age.to_string()),
            state: location.state.to_string(),
            population: location.population.clone(),
            transition: location.transition.to_string(),
        }
    }
}

/// Writes the labeled dataset.
///
/// # Errors
///
/// Returns an error if the file cannot be created or a row fails to
/// serialize.
pub fn write_labeled(
    path: &Path,
    labeled: &[LabeledLocation],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    for location in labeled {
        writer.serialize(LabeledFixRow::from(location))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the per-individual movement summaries.
///
/// # Errors
///
/// Returns an error if the file cannot be created or a row fails to
/// serialize.
pub fn write_summaries(
    path: &Path,
    summaries: &[IndividualSummary],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    for summary in summaries {
        writer.serialize(summary)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the grouped state and transition breakdown tables for one
/// covariate into `output_dir`.
///
/// # Errors
///
/// Returns an error if a file cannot be created or a row fails to
/// serialize.
pub fn write_breakdowns(
    output_dir: &Path,
    labeled: &[LabeledLocation],
    by: GroupBy,
) -> Result<(), Box<dyn std::error::Error>> {
    let key = by.to_string().to_lowercase();

    let state_path = output_dir.join(format!("states_by_{key}.csv"));
    let mut writer = csv::Writer::from_path(&state_path)?;
    for row in range_map_analytics::state_breakdown(labeled, by) {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let transition_path = output_dir.join(format!("transitions_by_{key}.csv"));
    let mut writer = csv::Writer::from_path(&transition_path)?;
    for row in range_map_analytics::transition_breakdown(labeled, by) {
        writer.serialize(row)?;
    }
    writer.flush()?;

    log::info!(
        "Wrote breakdowns by {by} to {} and {}",
        state_path.display(),
        transition_path.display()
    );

    Ok(())
}
