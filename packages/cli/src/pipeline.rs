//! Shared ingest-and-label pipeline behind every subcommand.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use range_map_ingest::{PopulationAliases, read_locations, read_ranges, unmatched_home_populations};
use range_map_spatial::RangeIndex;
use range_map_track_models::{CoordinateFrame, LabeledLocation};

/// Input files shared by all subcommands.
#[derive(Args)]
pub struct InputArgs {
    /// CSV of GPS fixes (`animal_id`, `home_population`, `recorded_at`,
    /// `easting`, `northing`, optional `sex`, `age_class`)
    #[arg(long)]
    pub locations: PathBuf,

    /// GeoJSON `FeatureCollection` of population range polygons with a
    /// `population` property per feature
    #[arg(long)]
    pub ranges: PathBuf,

    /// TOML population-name alias table applied before classification
    #[arg(long)]
    pub aliases: Option<PathBuf>,

    /// EPSG code of the projected frame both inputs are expressed in
    #[arg(long, default_value = "32611")]
    pub epsg: u32,
}

/// Reads the inputs, applies name corrections, classifies every fix, and
/// derives per-individual transitions.
///
/// # Errors
///
/// Returns an error if any input fails to read/parse, the inputs disagree
/// on coordinate frame, the range set is invalid, or transition derivation
/// fails.
pub fn load_and_label(
    input: &InputArgs,
) -> Result<Vec<LabeledLocation>, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let frame = CoordinateFrame::from_epsg(input.epsg);

    let mut tracks = read_locations(&input.locations, frame)?;
    if let Some(alias_path) = &input.aliases {
        let aliases = PopulationAliases::load(alias_path)?;
        tracks = aliases.apply(&tracks);
    }

    let ranges = read_ranges(&input.ranges, frame)?;

    let unmatched = unmatched_home_populations(&tracks, &ranges);
    if !unmatched.is_empty() {
        log::warn!(
            "{} home population(s) match no range polygon and should be reviewed for exclusion: {}",
            unmatched.len(),
            unmatched.into_iter().collect::<Vec<_>>().join(", ")
        );
    }

    let index = RangeIndex::new(ranges)?;
    let classified = range_map_spatial::classify_all(&tracks, &index)?;
    let labeled = range_map_transitions::label_all(classified.locations)?;

    log::info!(
        "Classified and labeled {} fixes against {} ranges in {:?}",
        labeled.len(),
        index.len(),
        start.elapsed()
    );

    Ok(labeled)
}
