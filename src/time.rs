//! Time helpers: MJD ↔ [`Epoch`] conversions and the survey night index.

use hifitime::Epoch;

use crate::constants::{Night, MJD};

/// Convert a modified Julian date (UTC) into a [`hifitime::Epoch`].
pub fn mjd_to_epoch(mjd: MJD) -> Epoch {
    Epoch::from_mjd_utc(mjd)
}

/// Convert a [`hifitime::Epoch`] into a modified Julian date (UTC).
pub fn epoch_to_mjd(epoch: &Epoch) -> MJD {
    epoch.to_mjd_utc_days()
}

/// Night index of an MJD epoch, counted from the survey's night zero.
///
/// The survey convention shifts the day boundary by half a day so that a
/// whole night of observing (which straddles UTC midnight) maps onto a
/// single index: `night = floor(mjd - 0.5) - night_zero`.
///
/// Arguments
/// ---------
/// * `mjd`: the epoch in modified Julian date (UTC)
/// * `night_zero`: MJD day number of the survey's first night
///
/// Return
/// ------
/// * the night index relative to `night_zero`
pub fn night_of(mjd: MJD, night_zero: Night) -> Night {
    (mjd - 0.5).floor() as Night - night_zero
}
