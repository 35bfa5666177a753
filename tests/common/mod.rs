use std::sync::Arc;

use smallvec::smallvec;

use refind::constants::{Detections, Night, ObjectId, TrackletSet, MJD};
use refind::ephemerides::{EphemerisPoint, EphemerisPropagator, LinearRates, PopulationFilter};
use refind::footprint::CircularFootprint;
use refind::params::FollowUpParams;
use refind::photometry::{AsteroidColorModel, AsteroidType, Band, SurveyConvention};
use refind::refind::Refind;
use refind::refind_errors::RefindError;
use refind::schedule::{Schedule, ScheduleVisit};
use refind::tracklets::Detection;
use refind::variant_orbits::Swarm;

pub const NIGHT_ZERO: Night = 60796;
pub const TRACKLET_EPOCH: MJD = 60800.0;

/// Tracklet geometry every fixture shares: 5 deg/day eastwards along the
/// equator, V ≈ 20 in r band.
pub fn detection(ra: f64, dec: f64, time: MJD) -> Detection {
    Detection {
        ra,
        dec,
        time,
        band: Band::R,
        mag: 19.828,
        astrometric_sigma_mas: 100.0,
        photometric_sigma_mag: 0.1,
    }
}

pub fn tracklet(ra0: f64) -> Detections {
    smallvec![
        detection(ra0, 0.0, TRACKLET_EPOCH),
        detection(ra0 + 0.1, 0.0, TRACKLET_EPOCH + 0.02),
    ]
}

pub fn visit(night: Night, start_mjd: MJD, field_ra: f64, depth: f64) -> ScheduleVisit {
    ScheduleVisit {
        night,
        start_mjd,
        field_ra,
        field_dec: 0.0,
        rot_sky_pos: 0.0,
        band: Band::R,
        five_sigma_depth: depth,
    }
}

/// Two visits per requested night, tracking the nominal (1 AU, 0 km/s)
/// prediction for a tracklet starting at `ra0`.
pub fn tracking_schedule(nights: &[Night], ra0: f64, depth: f64) -> Schedule {
    let mut visits = Vec::new();
    for &night in nights {
        let mjd = NIGHT_ZERO as f64 + night as f64 + 0.6;
        let ra = ra0 + 5.0 * (mjd - TRACKLET_EPOCH);
        visits.push(visit(night, mjd, ra, depth));
        visits.push(visit(night, mjd + 0.02, ra + 0.1, depth));
    }
    Schedule::from_visits(visits)
}

pub fn tracklet_set(entries: impl IntoIterator<Item = (u32, Detections)>) -> TrackletSet {
    entries
        .into_iter()
        .map(|(id, detections)| (ObjectId::Int(id), detections))
        .collect()
}

/// Engine wired with the shipped collaborators.
pub fn engine(params: FollowUpParams) -> Refind {
    Refind::new(params).unwrap()
}

/// Right ascension value that makes [`RejectingPropagator`] fail, standing
/// in for an object the external ephemeris service cannot handle.
pub const REJECTED_RA: f64 = 250.0;

/// Propagator that rejects one sentinel tracklet and otherwise behaves
/// like [`LinearRates`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectingPropagator;

impl EphemerisPropagator for RejectingPropagator {
    fn propagate(
        &self,
        swarm: &Swarm,
        epochs: &[MJD],
        population: PopulationFilter,
    ) -> Result<Vec<EphemerisPoint>, RefindError> {
        if swarm.geometry.ra_start == REJECTED_RA {
            return Err(RefindError::PropagationFailed(
                "ephemeris service rejected the request".into(),
            ));
        }
        LinearRates.propagate(swarm, epochs, population)
    }
}

/// Engine using [`RejectingPropagator`] instead of the shipped backend.
pub fn engine_with_rejections(params: FollowUpParams) -> Refind {
    let colors = AsteroidColorModel::new(SurveyConvention::Lsst, AsteroidType::C);
    Refind::with_collaborators(
        params,
        Arc::new(RejectingPropagator),
        Arc::new(CircularFootprint::default()),
        Arc::new(colors),
    )
    .unwrap()
}
