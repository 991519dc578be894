//! CSV reader for GPS fix exports.
//!
//! Expected columns: `animal_id`, `home_population`, `recorded_at`,
//! `easting`, `northing`, and optionally `sex` and `age_class`. Timestamps
//! are RFC 3339 or `YYYY-MM-DD HH:MM:SS` (taken as UTC). Covariate values
//! use the canonical labels (`FEMALE`, `ADULT`, ...), matched
//! case-insensitively; empty cells mean "not recorded".

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use range_map_track_models::{AgeClass, CoordinateFrame, LocationRecord, Sex, TrackSet};
use serde::Deserialize;

use crate::IngestError;

/// Raw CSV row before timestamp/covariate parsing.
#[derive(Debug, Deserialize)]
struct LocationRow {
    animal_id: String,
    home_population: String,
    recorded_at: String,
    easting: f64,
    northing: f64,
    #[serde(default)]
    sex: Option<String>,
    #[serde(default)]
    age_class: Option<String>,
}

/// Reads a track set from a CSV file of GPS fixes.
///
/// The returned set is tagged with `frame`; the file itself carries no
/// frame metadata, so the caller states which frame the producer used.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read, a row fails CSV
/// deserialization, or a timestamp/covariate value cannot be parsed. Parse
/// errors carry the CSV line number and animal id.
pub fn read_locations(path: &Path, frame: CoordinateFrame) -> Result<TrackSet, IngestError> {
    let mut reader = csv::Reader::from_path(path)?;

    let mut fixes = Vec::new();
    for (index, result) in reader.deserialize::<LocationRow>().enumerate() {
        let row = result?;
        // Header occupies line 1; the first record is line 2.
        let line = index as u64 + 2;

        let recorded_at = parse_timestamp(&row.recorded_at).ok_or_else(|| {
            IngestError::InvalidTimestamp {
                line,
                animal_id: row.animal_id.clone(),
                value: row.recorded_at.clone(),
            }
        })?;

        let sex = parse_covariate::<Sex>(row.sex.as_deref(), line, &row.animal_id)?;
        let age_class = parse_covariate::<AgeClass>(row.age_class.as_deref(), line, &row.animal_id)?;

        fixes.push(LocationRecord {
            animal_id: row.animal_id,
            home_population: row.home_population,
            recorded_at,
            easting: row.easting,
            northing: row.northing,
            sex,
            age_class,
        });
    }

    log::info!(
        "Read {} fixes from {} ({frame})",
        fixes.len(),
        path.display()
    );

    Ok(TrackSet::new(frame, fixes))
}

/// Parses an RFC 3339 or `YYYY-MM-DD HH:MM:SS` (UTC) timestamp.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parses an optional covariate cell against a canonical-label enum.
fn parse_covariate<T: std::str::FromStr>(
    raw: Option<&str>,
    line: u64,
    animal_id: &str,
) -> Result<Option<T>, IngestError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    T::from_str(&trimmed.to_uppercase())
        .map(Some)
        .map_err(|_| IngestError::InvalidCovariate {
            line,
            animal_id: animal_id.to_owned(),
            value: raw.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn write_temp_csv(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "range_map_locations_{name}_{}.csv",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_fixes_with_covariates() {
        let path = write_temp_csv(
            "covariates",
            "animal_id,home_population,recorded_at,easting,northing,sex,age_class\n\
             s001,Lone Mountain,2021-06-01T12:00:00Z,431200.5,4101388.0,female,adult\n\
             s002,Clan Alpine,2021-06-01 13:30:00,432000.0,4102000.0,,\n",
        );

        let tracks = read_locations(&path, CoordinateFrame::UTM_11N).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks.frame, CoordinateFrame::UTM_11N);

        let first = &tracks.fixes[0];
        assert_eq!(first.animal_id, "s001");
        assert_eq!(first.home_population, "Lone Mountain");
        assert_eq!(first.sex, Some(Sex::Female));
        assert_eq!(first.age_class, Some(AgeClass::Adult));

        let second = &tracks.fixes[1];
        assert_eq!(second.sex, None);
        assert_eq!(second.age_class, None);
        assert_eq!(
            second.recorded_at,
            parse_timestamp("2021-06-01T13:30:00Z").unwrap()
        );
    }

    #[test]
    fn bad_timestamp_reports_line_and_animal() {
        let path = write_temp_csv(
            "bad_timestamp",
            "animal_id,home_population,recorded_at,easting,northing\n\
             s001,Lone Mountain,2021-06-01T12:00:00Z,431200.5,4101388.0\n\
             s002,Clan Alpine,June 1st,432000.0,4102000.0\n",
        );

        let err = read_locations(&path, CoordinateFrame::UTM_11N).unwrap_err();
        std::fs::remove_file(&path).ok();

        match err {
            IngestError::InvalidTimestamp {
                line,
                animal_id,
                value,
            } => {
                assert_eq!(line, 3);
                assert_eq!(animal_id, "s002");
                assert_eq!(value, "June 1st");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_covariate_rejected() {
        let path = write_temp_csv(
            "bad_covariate",
            "animal_id,home_population,recorded_at,easting,northing,sex,age_class\n\
             s001,Lone Mountain,2021-06-01T12:00:00Z,431200.5,4101388.0,hembra,adult\n",
        );

        let err = read_locations(&path, CoordinateFrame::UTM_11N).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, IngestError::InvalidCovariate { line: 2, .. }));
    }
}
