//! # Survey schedule snapshots
//!
//! The engine consumes the survey's observing schedule as a read-only,
//! night-indexed snapshot: one [`ScheduleVisit`] per scheduled exposure,
//! with per-night accessors for the bookkeeping the pipeline needs (first
//! visit epoch and night length). Bad-weather or downtime nights simply
//! have no visits and a zero length; they are a data condition, never an
//! error.
//!
//! Snapshots are immutable after construction, which is what makes them
//! safe to share by reference across the orchestrator's worker pool.

pub mod opsim_csv;

use ahash::RandomState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;

use crate::constants::{Degree, Night, MJD};
use crate::photometry::Band;

/// One scheduled exposure of the survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleVisit {
    /// Night index the visit belongs to
    pub night: Night,
    /// Visit start epoch, MJD (UTC)
    pub start_mjd: MJD,
    /// Field centre right ascension, degrees
    pub field_ra: Degree,
    /// Field centre declination, degrees
    pub field_dec: Degree,
    /// Camera rotation angle on the sky, degrees
    pub rot_sky_pos: Degree,
    /// Filter band of the exposure
    pub band: Band,
    /// Limiting magnitude for a 5σ point-source detection
    pub five_sigma_depth: f64,
}

impl ScheduleVisit {
    /// Visit start as a [`hifitime::Epoch`].
    pub fn start_epoch(&self) -> hifitime::Epoch {
        crate::time::mjd_to_epoch(self.start_mjd)
    }
}

/// Immutable, night-indexed snapshot of scheduled visits.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    visits: Vec<ScheduleVisit>,
    by_night: HashMap<Night, Range<usize>, RandomState>,
}

impl Schedule {
    /// Build a snapshot from a set of visits. Visits are sorted by
    /// (night, start epoch) and indexed per night.
    pub fn from_visits(mut visits: Vec<ScheduleVisit>) -> Self {
        visits.sort_by(|a, b| {
            a.night
                .cmp(&b.night)
                .then(a.start_mjd.total_cmp(&b.start_mjd))
        });

        let mut by_night: HashMap<Night, Range<usize>, RandomState> = HashMap::default();
        let mut start = 0usize;
        for i in 1..=visits.len() {
            if i == visits.len() || visits[i].night != visits[start].night {
                by_night.insert(visits[start].night, start..i);
                start = i;
            }
        }

        Schedule { visits, by_night }
    }

    /// All visits, sorted by (night, start epoch).
    pub fn visits(&self) -> &[ScheduleVisit] {
        &self.visits
    }

    /// The visits of one night (empty slice when the night has none).
    pub fn night(&self, night: Night) -> &[ScheduleVisit] {
        self.by_night
            .get(&night)
            .map(|range| &self.visits[range.clone()])
            .unwrap_or(&[])
    }

    /// Epoch of the first visit of each night in `nights` that has visits,
    /// in ascending night order.
    pub fn first_visit_epochs(&self, nights: impl IntoIterator<Item = Night>) -> Vec<(Night, MJD)> {
        nights
            .into_iter()
            .filter_map(|night| {
                self.night(night)
                    .first()
                    .map(|visit| (night, visit.start_mjd))
            })
            .collect()
    }

    /// Length of a night in days: last visit start minus first visit start,
    /// zero for nights without visits.
    pub fn night_length_days(&self, night: Night) -> f64 {
        let visits = self.night(night);
        match (visits.first(), visits.last()) {
            (Some(first), Some(last)) => last.start_mjd - first.start_mjd,
            _ => 0.0,
        }
    }

    /// A new snapshot restricted to the nights of a detection window
    /// `[start, start + detection_window)`.
    pub fn windowed(&self, start: Night, detection_window: i64) -> Schedule {
        let kept = self
            .visits
            .iter()
            .filter(|visit| visit.night >= start && visit.night < start + detection_window)
            .cloned()
            .collect();
        Schedule::from_visits(kept)
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }
}

#[cfg(test)]
mod test_schedule {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn visit(night: Night, start_mjd: MJD) -> ScheduleVisit {
        ScheduleVisit {
            night,
            start_mjd,
            field_ra: 100.0,
            field_dec: -10.0,
            rot_sky_pos: 0.0,
            band: Band::R,
            five_sigma_depth: 24.0,
        }
    }

    #[test]
    fn night_indexing_and_lengths() {
        let schedule = Schedule::from_visits(vec![
            visit(1, 60801.7),
            visit(0, 60800.9),
            visit(0, 60800.6),
            visit(3, 60803.8),
        ]);

        assert_eq!(schedule.night(0).len(), 2);
        assert_abs_diff_eq!(schedule.night(0)[0].start_mjd, 60800.6, epsilon = 1e-12);
        assert_abs_diff_eq!(schedule.night_length_days(0), 0.3, epsilon = 1e-9);

        // missing night: empty slice, zero length
        assert!(schedule.night(2).is_empty());
        assert_eq!(schedule.night_length_days(2), 0.0);

        let firsts = schedule.first_visit_epochs(0..5);
        assert_eq!(
            firsts.iter().map(|(n, _)| *n).collect::<Vec<_>>(),
            vec![0, 1, 3]
        );

        let epoch = schedule.night(0)[0].start_epoch();
        assert_abs_diff_eq!(epoch.to_mjd_utc_days(), 60800.6, epsilon = 1e-9);
    }

    #[test]
    fn windowing_keeps_only_window_nights() {
        let schedule = Schedule::from_visits(vec![
            visit(0, 60800.6),
            visit(4, 60804.6),
            visit(5, 60805.6),
        ]);
        let windowed = schedule.windowed(0, 5);
        assert_eq!(windowed.len(), 2);
        assert!(windowed.night(5).is_empty());
    }
}
