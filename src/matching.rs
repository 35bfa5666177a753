//! # Visit matching
//!
//! The core of the detectability estimate: for every reachable visit,
//! decide which swarm members land on the camera footprint and are bright
//! enough in the visit's band to clear its limiting magnitude. Ephemeris
//! points are grouped by epoch so the footprint collaborator is called
//! exactly once per visit, whatever the swarm size.

use ahash::RandomState;
use ordered_float::OrderedFloat;
use std::collections::HashMap;
use tracing::trace;

use crate::constants::{Degree, Night, MJD};
use crate::ephemerides::EphemerisPoint;
use crate::footprint::CameraFootprint;
use crate::photometry::{Band, MagnitudeModel};
use crate::schedule::ScheduleVisit;
use crate::tracklets::SkyTimed;

/// One swarm member's predicted appearance in one visit.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictedDetection {
    /// Swarm member the prediction belongs to
    pub orbit_id: u32,
    /// Night index of the visit
    pub night: Night,
    /// Visit start epoch, MJD (UTC)
    pub mjd: MJD,
    /// Predicted right ascension, degrees
    pub ra: Degree,
    /// Predicted declination, degrees
    pub dec: Degree,
    /// Filter band of the visit
    pub band: Band,
    /// Predicted apparent magnitude in the visit's band
    pub mag_in_band: f64,
    /// Limiting magnitude of the visit
    pub five_sigma_depth: f64,
    /// True when the member is on the footprint and brighter than the limit
    pub observed: bool,
}

impl SkyTimed for PredictedDetection {
    fn ra_deg(&self) -> Degree {
        self.ra
    }

    fn dec_deg(&self) -> Degree {
        self.dec
    }

    fn epoch_mjd(&self) -> MJD {
        self.mjd
    }
}

/// Match propagated swarm positions against a set of visits.
///
/// Every ephemeris point whose epoch equals a visit's start epoch produces
/// one [`PredictedDetection`]; `observed` is set when the footprint test
/// and the brightness test both pass. Visits with no ephemeris points at
/// their epoch contribute nothing.
///
/// Arguments
/// ---------
/// * `ephemerides`: propagated samples, one per (member, visit epoch)
/// * `visits`: the reachable visits to match against
/// * `footprint`: instrument footprint collaborator
/// * `magnitudes`: photometric conversion from V to the visit's band
///
/// Return
/// ------
/// * All predictions, observed or not, in visit order.
pub fn match_predictions(
    ephemerides: &[EphemerisPoint],
    visits: &[ScheduleVisit],
    footprint: &dyn CameraFootprint,
    magnitudes: &dyn MagnitudeModel,
) -> Vec<PredictedDetection> {
    let mut by_epoch: HashMap<OrderedFloat<f64>, Vec<&EphemerisPoint>, RandomState> =
        HashMap::default();
    for point in ephemerides {
        by_epoch
            .entry(OrderedFloat(point.epoch))
            .or_default()
            .push(point);
    }

    let mut predictions = Vec::new();
    for visit in visits {
        let Some(points) = by_epoch.get(&OrderedFloat(visit.start_mjd)) else {
            continue;
        };

        let ra: Vec<Degree> = points.iter().map(|p| p.ra).collect();
        let dec: Vec<Degree> = points.iter().map(|p| p.dec).collect();
        let on_chip = footprint.contains(
            &ra,
            &dec,
            visit.field_ra,
            visit.field_dec,
            visit.rot_sky_pos,
        );
        trace!(
            night = visit.night,
            candidates = points.len(),
            on_chip = on_chip.len(),
            "footprint match"
        );

        let mut inside = vec![false; points.len()];
        for i in on_chip {
            inside[i] = true;
        }

        for (point, &in_footprint) in points.iter().zip(inside.iter()) {
            let mag_in_band = magnitudes.convert(point.vmag, Band::V, visit.band);
            predictions.push(PredictedDetection {
                orbit_id: point.orbit_id,
                night: visit.night,
                mjd: visit.start_mjd,
                ra: point.ra,
                dec: point.dec,
                band: visit.band,
                mag_in_band,
                five_sigma_depth: visit.five_sigma_depth,
                observed: in_footprint && mag_in_band < visit.five_sigma_depth,
            });
        }
    }
    predictions
}
