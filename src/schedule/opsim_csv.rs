//! Reader for opsim-style schedule exports (CSV with the simulator's
//! column names). A missing file is the expected signal for a night with
//! no schedule data and maps to `Ok(None)`, not an error.

use camino::Utf8Path;
use serde::Deserialize;
use std::str::FromStr;

use crate::constants::Night;
use crate::photometry::Band;
use crate::refind_errors::RefindError;

use super::{Schedule, ScheduleVisit};

/// One row of an opsim schedule export.
#[derive(Debug, Deserialize)]
struct OpsimRow {
    night: i64,
    #[serde(rename = "observationStartMJD")]
    observation_start_mjd: f64,
    #[serde(rename = "fieldRA")]
    field_ra: f64,
    #[serde(rename = "fieldDec")]
    field_dec: f64,
    #[serde(rename = "rotSkyPos")]
    rot_sky_pos: f64,
    #[serde(rename = "filter")]
    filter: String,
    #[serde(rename = "fiveSigmaDepth")]
    five_sigma_depth: f64,
}

impl OpsimRow {
    fn into_visit(self) -> Result<ScheduleVisit, RefindError> {
        Ok(ScheduleVisit {
            night: self.night,
            start_mjd: self.observation_start_mjd,
            field_ra: self.field_ra,
            field_dec: self.field_dec,
            rot_sky_pos: self.rot_sky_pos,
            band: Band::from_str(&self.filter)?,
            five_sigma_depth: self.five_sigma_depth,
        })
    }
}

/// Read a schedule snapshot from an opsim-style CSV export.
///
/// Arguments
/// ---------
/// * `path`: path to the CSV file
///
/// Return
/// ------
/// * `Ok(None)` if the file does not exist (night not simulated / lost to
///   weather), `Ok(Some(schedule))` on success, or an error for malformed
///   rows and unknown filter bands.
pub fn read_opsim_csv(path: &Utf8Path) -> Result<Option<Schedule>, RefindError> {
    if !path.exists() {
        return Ok(None);
    }

    let mut reader = csv::Reader::from_path(path.as_std_path())?;
    let mut visits = Vec::new();
    for row in reader.deserialize::<OpsimRow>() {
        visits.push(row?.into_visit()?);
    }
    Ok(Some(Schedule::from_visits(visits)))
}

/// Read the schedule rooted at `dir/night{N}.csv` for callers that require
/// the night to exist.
///
/// The per-file sentinel of [`read_opsim_csv`] is turned into
/// [`RefindError::MissingNightData`] here: a nightly driver asking for a
/// specific night wants the failure, not an empty schedule.
pub fn read_night_schedule(dir: &Utf8Path, night: Night) -> Result<Schedule, RefindError> {
    let path = dir.join(format!("night{night}.csv"));
    read_opsim_csv(&path)?.ok_or(RefindError::MissingNightData(night))
}
