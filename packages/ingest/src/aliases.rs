//! Population name correction table.
//!
//! Collar exports and range shapefiles routinely disagree on population
//! naming ("Lone Mtn" vs "Lone Mountain"). The alias table maps the
//! collar-side spellings to the canonical range-side names and is applied
//! exactly once at ingest, producing a new corrected dataset. Unresolved
//! names are left as-is; [`crate::unmatched_home_populations`] surfaces
//! them afterwards so the affected individuals can be flagged for
//! exclusion.
//!
//! Table format (TOML):
//!
//! ```toml
//! [aliases]
//! "Lone Mtn" = "Lone Mountain"
//! "ClanAlpine" = "Clan Alpine"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use range_map_track_models::TrackSet;
use serde::Deserialize;

use crate::IngestError;

/// Static lookup table correcting population-name mismatches between the
/// fix export and the range polygons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PopulationAliases {
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

impl PopulationAliases {
    /// Parses an alias table from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Toml`] on malformed TOML.
    pub fn from_toml_str(raw: &str) -> Result<Self, IngestError> {
        Ok(toml::from_str(raw)?)
    }

    /// Loads an alias table from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, IngestError> {
        let table = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        log::info!(
            "Loaded {} population aliases from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Number of alias entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// The canonical name for `name`: its alias target if one exists,
    /// otherwise `name` unchanged.
    #[must_use]
    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map_or(name, String::as_str)
    }

    /// Applies the corrections to a track set, returning a new set.
    ///
    /// The input is not modified; every fix's `home_population` is mapped
    /// through [`PopulationAliases::canonical`].
    #[must_use]
    pub fn apply(&self, tracks: &TrackSet) -> TrackSet {
        let mut corrected = tracks.clone();
        let mut renamed: u64 = 0;
        for fix in &mut corrected.fixes {
            let canonical = self.canonical(&fix.home_population);
            if canonical != fix.home_population {
                fix.home_population = canonical.to_owned();
                renamed += 1;
            }
        }

        if renamed > 0 {
            log::info!("Corrected home population names on {renamed} fixes");
        }

        corrected
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use range_map_track_models::{CoordinateFrame, LocationRecord};

    use super::*;

    fn tracks_with_homes(homes: &[&str]) -> TrackSet {
        TrackSet::new(
            CoordinateFrame::UTM_11N,
            homes
                .iter()
                .map(|home| LocationRecord {
                    animal_id: "s001".to_owned(),
                    home_population: (*home).to_owned(),
                    recorded_at: Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap(),
                    easting: 0.0,
                    northing: 0.0,
                    sex: None,
                    age_class: None,
                })
                .collect(),
        )
    }

    #[test]
    fn parses_toml_table() {
        let table = PopulationAliases::from_toml_str(
            "[aliases]\n\"Lone Mtn\" = \"Lone Mountain\"\n\"ClanAlpine\" = \"Clan Alpine\"\n",
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.canonical("Lone Mtn"), "Lone Mountain");
        assert_eq!(table.canonical("Clan Alpine"), "Clan Alpine");
    }

    #[test]
    fn empty_input_parses_to_empty_table() {
        let table = PopulationAliases::from_toml_str("").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.canonical("Lone Mtn"), "Lone Mtn");
    }

    #[test]
    fn apply_is_pure_and_corrects_only_aliased_names() {
        let table =
            PopulationAliases::from_toml_str("[aliases]\n\"Lone Mtn\" = \"Lone Mountain\"\n")
                .unwrap();
        let original = tracks_with_homes(&["Lone Mtn", "Clan Alpine"]);

        let corrected = table.apply(&original);

        assert_eq!(corrected.fixes[0].home_population, "Lone Mountain");
        assert_eq!(corrected.fixes[1].home_population, "Clan Alpine");
        // The input set is untouched.
        assert_eq!(original.fixes[0].home_population, "Lone Mtn");
    }
}
