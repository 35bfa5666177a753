//! # Schedule reachability prefilter
//!
//! Propagating a thousand-member swarm against every pointing of a
//! multi-night schedule is prohibitively expensive, and almost all of those
//! pointings are nowhere near the object. This stage cuts the schedule down
//! first: one representative orbit per swarm gives an angular velocity at
//! each night's start, a linear extrapolation across the night's duration
//! spans a sky box, and the box is inflated by a generous fixed margin.
//! Only visits whose pointing falls inside a night's box survive.
//!
//! The box must stay conservative: pruning a pointing that full propagation
//! would reach breaks the probability estimate, so the margin is sized to
//! dominate the swarm's angular-velocity spread.

use tracing::debug;

use crate::constants::{Degree, Night};
use crate::ephemerides::{EphemerisPropagator, PopulationFilter};
use crate::refind_errors::RefindError;
use crate::schedule::{Schedule, ScheduleVisit};
use crate::variant_orbits::{Swarm, TrackletGeometry};

/// Tuning of the reachability prefilter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReachabilityParams {
    /// Nominal heliocentric distance of the representative orbit, AU
    pub representative_distance_au: f64,
    /// Nominal radial velocity of the representative orbit, km/s
    pub representative_rv_kms: f64,
    /// Box inflation on each side, degrees
    pub margin_deg: Degree,
}

impl Default for ReachabilityParams {
    fn default() -> Self {
        ReachabilityParams {
            representative_distance_au: 1.0,
            representative_rv_kms: 2.0,
            margin_deg: crate::constants::FOV_RADIUS_DEG * crate::constants::REACH_SAFETY_FACTOR,
        }
    }
}

/// Prune a window's schedule down to the visits any swarm member could
/// plausibly reach.
///
/// Arguments
/// ---------
/// * `geometry`: the tracklet geometry seeding the swarm
/// * `schedule`: the full schedule snapshot
/// * `night_start`: first night of the detection window
/// * `detection_window`: window length in nights
/// * `params`: prefilter tuning
/// * `propagator`: ephemeris collaborator (used with a one-member swarm)
///
/// Return
/// ------
/// * The reachable visits, sorted by start epoch. An empty result is a
///   normal outcome (the window's pointings are all elsewhere) and means
///   probability 0.0 upstream.
pub fn reachable_schedule(
    geometry: &TrackletGeometry,
    schedule: &Schedule,
    night_start: Night,
    detection_window: i64,
    params: &ReachabilityParams,
    propagator: &dyn EphemerisPropagator,
) -> Result<Vec<ScheduleVisit>, RefindError> {
    let window_nights = night_start..night_start + detection_window;
    let first_visits = schedule.first_visit_epochs(window_nights);
    if first_visits.is_empty() {
        return Ok(Vec::new());
    }

    let representative = Swarm::representative(
        geometry.clone(),
        params.representative_distance_au,
        params.representative_rv_kms,
    );
    let epochs: Vec<f64> = first_visits.iter().map(|(_, mjd)| *mjd).collect();
    let start_points = propagator.propagate(&representative, &epochs, PopulationFilter::All)?;

    // the one-member request yields one row per epoch, in request order,
    // so samples align positionally with the window nights
    let mut reachable: Vec<ScheduleVisit> = Vec::new();
    for (point, &(night, _)) in start_points.iter().zip(first_visits.iter()) {
        let length_days = schedule.night_length_days(night);

        let cosd = point.dec.to_radians().cos().max(1e-6);
        let delta_ra = point.vra_cosdec / cosd * length_days;
        let delta_dec = point.vdec * length_days;

        let (ra_lo, ra_hi) = ordered_span(point.ra, point.ra + delta_ra, params.margin_deg);
        let (dec_lo, dec_hi) = ordered_span(point.dec, point.dec + delta_dec, params.margin_deg);

        reachable.extend(
            schedule
                .night(night)
                .iter()
                .filter(|visit| {
                    visit.field_ra > ra_lo
                        && visit.field_ra < ra_hi
                        && visit.field_dec > dec_lo
                        && visit.field_dec < dec_hi
                })
                .cloned(),
        );
    }

    reachable.sort_by(|a, b| a.start_mjd.total_cmp(&b.start_mjd));
    debug!(
        nights = first_visits.len(),
        reachable = reachable.len(),
        "schedule reachability prefilter"
    );
    Ok(reachable)
}

/// Interval covering both endpoints, inflated by `margin` on each side.
fn ordered_span(a: Degree, b: Degree, margin: Degree) -> (Degree, Degree) {
    (a.min(b) - margin, a.max(b) + margin)
}

#[cfg(test)]
mod test_reachability {
    use super::*;
    use crate::ephemerides::LinearRates;
    use crate::photometry::Band;
    use crate::schedule::ScheduleVisit;

    fn geometry() -> TrackletGeometry {
        TrackletGeometry {
            ra_start: 100.0,
            dec_start: 0.0,
            ra_end: 100.1,
            dec_end: 0.0,
            epoch: 60800.0,
            baseline_days: 0.02,
            vmag: 20.0,
        }
    }

    fn visit(night: Night, start_mjd: f64, field_ra: f64, field_dec: f64) -> ScheduleVisit {
        ScheduleVisit {
            night,
            start_mjd,
            field_ra,
            field_dec,
            rot_sky_pos: 0.0,
            band: Band::R,
            five_sigma_depth: 24.0,
        }
    }

    #[test]
    fn keeps_nearby_visits_and_prunes_distant_ones() {
        // object moves 5 deg/day along RA from (100, 0) at 60800.0
        let schedule = Schedule::from_visits(vec![
            visit(4, 60804.0, 120.0, 0.0),  // predicted position
            visit(4, 60804.1, 121.0, 0.5),  // inside margin
            visit(4, 60804.2, 170.0, 0.0),  // far: pruned
            visit(4, 60804.3, 120.0, 40.0), // far in dec: pruned
        ]);

        let reachable = reachable_schedule(
            &geometry(),
            &schedule,
            4,
            1,
            &ReachabilityParams::default(),
            &LinearRates,
        )
        .unwrap();

        assert_eq!(reachable.len(), 2);
        assert!(reachable.iter().all(|v| v.field_ra < 125.0));
    }

    #[test]
    fn empty_window_is_empty_not_error() {
        let schedule = Schedule::from_visits(vec![visit(20, 60820.0, 100.0, 0.0)]);
        let reachable = reachable_schedule(
            &geometry(),
            &schedule,
            0,
            15,
            &ReachabilityParams::default(),
            &LinearRates,
        )
        .unwrap();
        assert!(reachable.is_empty());
    }

    #[test]
    fn coincident_first_visit_epochs_keep_both_nights() {
        // two window nights whose first visits carry bit-identical epochs;
        // each night must still get its own reachability box
        let schedule = Schedule::from_visits(vec![
            visit(4, 60804.0, 120.0, 0.0),
            visit(5, 60804.0, 120.5, 0.0),
        ]);
        let reachable = reachable_schedule(
            &geometry(),
            &schedule,
            4,
            2,
            &ReachabilityParams::default(),
            &LinearRates,
        )
        .unwrap();
        assert_eq!(reachable.len(), 2);
    }

    #[test]
    fn box_spans_the_whole_night_of_motion() {
        // two visits the same night: one at night start, one a full night
        // of motion later; both must be retained
        let schedule = Schedule::from_visits(vec![
            visit(4, 60804.0, 120.0, 0.0),
            visit(4, 60804.4, 122.0, 0.0),
        ]);
        let reachable = reachable_schedule(
            &geometry(),
            &schedule,
            4,
            1,
            &ReachabilityParams::default(),
            &LinearRates,
        )
        .unwrap();
        assert_eq!(reachable.len(), 2);
    }
}
