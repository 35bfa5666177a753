//! # Detections, tracklets, and the per-night validity rule
//!
//! A *tracklet* is the ordered set of same-night detections attributed to
//! one moving object. This module defines the [`Detection`] record, the
//! [`TrackletParams`] validity rule applied to it, and the selection helpers
//! that reduce a night's full observation table to the flagged objects the
//! probability engine actually runs on.
//!
//! The validity rule is used twice with identical logic: once on the real
//! observed tracklets that seed a swarm, and once per (orbit, night) group
//! of *predicted* detections inside the windowing stage — a single predicted
//! point does not constitute a usable tracklet. The [`SkyTimed`] trait is
//! the seam that lets both record types share the rule.

use ahash::RandomState;
use nalgebra::Vector3;
use std::collections::HashMap;

use crate::constants::{
    ArcSec, Degree, Detections, Night, ObjectId, Radian, TrackletSet, ARCSEC_PER_DEG,
    MINUTES_PER_DAY, MJD,
};
use crate::photometry::Band;

/// One astrometric detection of a moving object.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Right ascension in degrees
    pub ra: Degree,
    /// Declination in degrees
    pub dec: Degree,
    /// Observation epoch, modified Julian date (UTC)
    pub time: MJD,
    /// Filter band of the exposure
    pub band: Band,
    /// Apparent magnitude in `band`
    pub mag: f64,
    /// Astrometric uncertainty in milliarcseconds
    pub astrometric_sigma_mas: f64,
    /// Photometric uncertainty in magnitudes
    pub photometric_sigma_mag: f64,
}

/// Anything with a sky position and an epoch. Implemented by observed
/// [`Detection`]s and by predicted detections from the matcher so the
/// tracklet rule stays byte-for-byte identical for both.
pub trait SkyTimed {
    fn ra_deg(&self) -> Degree;
    fn dec_deg(&self) -> Degree;
    fn epoch_mjd(&self) -> MJD;
}

impl SkyTimed for Detection {
    fn ra_deg(&self) -> Degree {
        self.ra
    }
    fn dec_deg(&self) -> Degree {
        self.dec
    }
    fn epoch_mjd(&self) -> MJD {
        self.time
    }
}

impl<T: SkyTimed> SkyTimed for &T {
    fn ra_deg(&self) -> Degree {
        (*self).ra_deg()
    }
    fn dec_deg(&self) -> Degree {
        (*self).dec_deg()
    }
    fn epoch_mjd(&self) -> MJD {
        (*self).epoch_mjd()
    }
}

/// Great-circle angular separation between two sky positions, in radians.
///
/// Uses the cross/dot unit-vector form, which stays numerically stable for
/// both tiny (sub-arcsecond) and large separations.
pub fn angular_separation_rad(
    ra1: Degree,
    dec1: Degree,
    ra2: Degree,
    dec2: Degree,
) -> Radian {
    let unit = |ra: Degree, dec: Degree| {
        let (ra, dec) = (ra.to_radians(), dec.to_radians());
        Vector3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin())
    };
    let a = unit(ra1, dec1);
    let b = unit(ra2, dec2);
    a.cross(&b).norm().atan2(a.dot(&b))
}

/// Great-circle angular separation in degrees.
pub fn angular_separation_deg(ra1: Degree, dec1: Degree, ra2: Degree, dec2: Degree) -> Degree {
    angular_separation_rad(ra1, dec1, ra2, dec2).to_degrees()
}

/// Great-circle angular separation in arcseconds.
pub fn angular_separation_arcsec(ra1: Degree, dec1: Degree, ra2: Degree, dec2: Degree) -> ArcSec {
    angular_separation_deg(ra1, dec1, ra2, dec2) * ARCSEC_PER_DEG
}

/// Parameters of the per-night tracklet validity rule.
///
/// A time-sorted group of detections is a valid tracklet iff it has at
/// least `min_obs` members, its first and last positions are more than
/// `min_arc` arcseconds apart, and its two closest-in-time members are
/// less than `max_time` minutes apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackletParams {
    /// Minimum number of detections
    pub min_obs: usize,
    /// Minimum angular arc between first and last detection, arcseconds
    pub min_arc: ArcSec,
    /// Maximum gap between the two closest-in-time detections, minutes
    pub max_time: f64,
}

impl Default for TrackletParams {
    fn default() -> Self {
        TrackletParams {
            min_obs: 2,
            min_arc: 1.0,
            max_time: 90.0,
        }
    }
}

/// Apply the tracklet validity rule to a time-sorted group of points.
///
/// Arguments
/// ---------
/// * `points`: the group, sorted by epoch (caller invariant)
/// * `params`: the rule thresholds
///
/// Return
/// ------
/// * `true` iff the group forms a valid tracklet. A group of fewer than two
///   points always fails: no arc can be computed from a single position.
pub fn is_valid_tracklet<P: SkyTimed>(points: &[P], params: &TrackletParams) -> bool {
    if points.len() < 2 {
        return false;
    }
    let first = &points[0];
    let last = &points[points.len() - 1];

    let arc = angular_separation_arcsec(
        first.ra_deg(),
        first.dec_deg(),
        last.ra_deg(),
        last.dec_deg(),
    );

    let min_gap_days = points
        .windows(2)
        .map(|pair| pair[1].epoch_mjd() - pair[0].epoch_mjd())
        .fold(f64::INFINITY, f64::min);

    points.len() >= params.min_obs
        && arc > params.min_arc
        && min_gap_days * MINUTES_PER_DAY < params.max_time
}

/// Plane-of-sky angular velocity of a tracklet in degrees per day, from its
/// first and last detections. Returns `f64::INFINITY` for a zero baseline,
/// which any finite velocity cut then rejects.
pub fn tracklet_ang_vel_deg_per_day(detections: &[Detection]) -> f64 {
    match (detections.first(), detections.last()) {
        (Some(first), Some(last)) if last.time > first.time => {
            angular_separation_deg(first.ra, first.dec, last.ra, last.dec)
                / (last.time - first.time)
        }
        _ => f64::INFINITY,
    }
}

/// Quality cuts selecting which of a night's tracklets get a probability
/// computation. Mirrors the upstream digest2-score selection: a minimum
/// quality score, a minimum detection count, and a cap on apparent angular
/// velocity (very fast movers are handled by a separate channel).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlaggedCuts {
    pub min_score: f64,
    pub min_obs: usize,
    pub max_ang_vel_deg_per_day: f64,
}

impl Default for FlaggedCuts {
    fn default() -> Self {
        FlaggedCuts {
            min_score: 65.0,
            min_obs: 3,
            max_ang_vel_deg_per_day: 1.5,
        }
    }
}

/// Extension trait gathering the [`TrackletSet`]-level operations.
pub trait TrackletSetExt {
    /// Build a tracklet set from `(object, detection)` pairs, sorting each
    /// object's detections by epoch.
    fn from_detections(pairs: impl IntoIterator<Item = (ObjectId, Detection)>) -> Self;

    /// Select the flagged subset of this set: objects whose quality score
    /// passes `cuts.min_score`, with at least `cuts.min_obs` detections, an
    /// angular velocity below the cap, and that are not already discovered
    /// (`already_found` returns true for objects found before tonight).
    ///
    /// Objects missing from `scores` are not flagged.
    fn flagged(
        &self,
        scores: &HashMap<ObjectId, f64, RandomState>,
        already_found: impl Fn(&ObjectId) -> bool,
        cuts: &FlaggedCuts,
    ) -> TrackletSet;
}

impl TrackletSetExt for TrackletSet {
    fn from_detections(pairs: impl IntoIterator<Item = (ObjectId, Detection)>) -> Self {
        let mut set = TrackletSet::default();
        for (id, det) in pairs {
            set.entry(id).or_insert_with(Detections::new).push(det);
        }
        for detections in set.values_mut() {
            detections.sort_by(|a, b| a.time.total_cmp(&b.time));
        }
        set
    }

    fn flagged(
        &self,
        scores: &HashMap<ObjectId, f64, RandomState>,
        already_found: impl Fn(&ObjectId) -> bool,
        cuts: &FlaggedCuts,
    ) -> TrackletSet {
        self.iter()
            .filter(|(id, detections)| {
                scores.get(id).is_some_and(|score| *score >= cuts.min_score)
                    && detections.len() >= cuts.min_obs
                    && tracklet_ang_vel_deg_per_day(detections) < cuts.max_ang_vel_deg_per_day
                    && !already_found(id)
            })
            .map(|(id, detections)| (id.clone(), detections.clone()))
            .collect()
    }
}

/// Read-only record of the nights on which each object was previously
/// detected, used to credit history from before the current window.
///
/// Absent keys default to an empty night list rather than an error, since
/// most newly flagged objects have no prior detections at all.
#[derive(Debug, Clone, Default)]
pub struct PriorDetections {
    nights: HashMap<ObjectId, Vec<Night>, RandomState>,
}

impl PriorDetections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one prior detection night for an object. Duplicate nights are
    /// tolerated; the windowing stage deduplicates.
    pub fn record(&mut self, id: ObjectId, night: Night) {
        self.nights.entry(id).or_default().push(night);
    }

    /// Nights on which `id` was previously detected (empty for unknown ids).
    pub fn nights_for(&self, id: &ObjectId) -> &[Night] {
        self.nights.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nights.is_empty()
    }
}

impl FromIterator<(ObjectId, Night)> for PriorDetections {
    fn from_iter<T: IntoIterator<Item = (ObjectId, Night)>>(iter: T) -> Self {
        let mut prior = PriorDetections::new();
        for (id, night) in iter {
            prior.record(id, night);
        }
        prior
    }
}
