//! # Ephemeris propagation adapter
//!
//! Dynamical propagation is an external collaborator concern: the engine
//! only needs, for every (variant orbit, epoch) pair, a propagated sky
//! position, plane-of-sky rates, geocentric distance, and apparent V
//! magnitude. [`EphemerisPropagator`] is that seam.
//!
//! The crate ships one backend, [`LinearRates`], a deliberately coarse
//! plane-of-sky extrapolation: it makes the engine runnable and testable
//! end-to-end without an N-body service, and it pins down the adapter
//! contract (batched per swarm, orbit-id tagging, population filtering,
//! zero rows ⇒ unreachable epoch, never an error).

use crate::constants::{Degree, AU_KM, MJD, SECONDS_PER_DAY};
use crate::refind_errors::RefindError;
use crate::variant_orbits::{Swarm, VariantOrbit};

/// One propagated (orbit, epoch) sample. Produced only by a propagator and
/// never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EphemerisPoint {
    /// Swarm-unique orbit identifier this sample belongs to
    pub orbit_id: u32,
    /// Sample epoch, MJD (UTC)
    pub epoch: MJD,
    /// Propagated right ascension, degrees
    pub ra: Degree,
    /// Propagated declination, degrees
    pub dec: Degree,
    /// RA rate × cos(dec), degrees per day
    pub vra_cosdec: f64,
    /// Declination rate, degrees per day
    pub vdec: f64,
    /// Geocentric distance, AU
    pub delta_au: f64,
    /// Apparent V magnitude at this epoch
    pub vmag: f64,
}

/// Restriction of propagator output to a population class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopulationFilter {
    /// Keep every swarm member
    All,
    /// Keep only NEO-like members (the engine's default: distant main-belt
    /// and beyond hypotheses are excluded from the output rows, though they
    /// still count in the probability denominator)
    #[default]
    NeoLike,
}

/// Orbit propagation collaborator.
///
/// Implementations must be deterministic: identical inputs must yield
/// bit-identical outputs, since the engine promises idempotent probability
/// results. An epoch for which no member yields a valid row simply has no
/// rows in the output; downstream treats it as unreachable.
pub trait EphemerisPropagator: Send + Sync {
    /// Propagate every swarm member to every requested epoch.
    ///
    /// Arguments
    /// ---------
    /// * `swarm`: the variant orbit ensemble (shared tracklet geometry)
    /// * `epochs`: requested sample epochs, MJD (UTC)
    /// * `population`: output restriction to a population class
    ///
    /// Return
    /// ------
    /// * Propagated samples tagged by orbit id; at most
    ///   `swarm.len() × epochs.len()` rows, fewer when `population` or the
    ///   backend's own validity checks drop members.
    fn propagate(
        &self,
        swarm: &Swarm,
        epochs: &[MJD],
        population: PopulationFilter,
    ) -> Result<Vec<EphemerisPoint>, RefindError>;
}

/// Heliocentric distance above which a variant orbit stops being NEO-like
/// for the coarse backend's population filter.
const NEO_LIKE_MAX_DISTANCE_AU: f64 = 4.0;

/// Smallest geocentric distance the coarse backend will report, AU.
const MIN_DELTA_AU: f64 = 0.01;

/// Coarse plane-of-sky propagation backend.
///
/// The tracklet's observed angular rates are extrapolated along a straight
/// track. Member distance hypotheses enter through the geocentric distance
/// `delta ≈ |d − 1 AU|`: the radial velocity drifts `delta` over time,
/// which rescales the angular rate (closer ⇒ faster) and the apparent
/// magnitude (inverse-square dimming), so swarm members genuinely diverge.
/// No gravity, no curvature: a stand-in for a real dynamics service, not a
/// physical model.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearRates;

impl LinearRates {
    fn member_track(
        swarm: &Swarm,
        member: &VariantOrbit,
        epoch: MJD,
    ) -> EphemerisPoint {
        let geom = &swarm.geometry;
        let baseline = geom.baseline_days;
        let cosd = (geom.dec_start.to_radians().cos()).max(1e-6);

        // observed rates at the tracklet epoch, deg/day
        let rate_ra_cosdec = (geom.ra_end - geom.ra_start) * cosd / baseline;
        let rate_dec = (geom.dec_end - geom.dec_start) / baseline;

        let delta0 = (member.distance_au - 1.0).abs().max(5.0 * MIN_DELTA_AU);
        let rv_au_day = member.radial_velocity_kms * SECONDS_PER_DAY / AU_KM;

        let dt = epoch - geom.epoch;
        let delta = (delta0 + rv_au_day * dt).max(MIN_DELTA_AU);

        // along-track progression: integral of delta0/delta(t) dt
        let track = if rv_au_day.abs() < 1e-12 {
            dt
        } else {
            (delta0 / rv_au_day) * (delta / delta0).ln()
        };

        EphemerisPoint {
            orbit_id: member.orbit_id,
            epoch,
            ra: geom.ra_start + rate_ra_cosdec / cosd * track,
            dec: geom.dec_start + rate_dec * track,
            vra_cosdec: rate_ra_cosdec * delta0 / delta,
            vdec: rate_dec * delta0 / delta,
            delta_au: delta,
            vmag: geom.vmag + 5.0 * (delta / delta0).log10(),
        }
    }
}

impl EphemerisPropagator for LinearRates {
    fn propagate(
        &self,
        swarm: &Swarm,
        epochs: &[MJD],
        population: PopulationFilter,
    ) -> Result<Vec<EphemerisPoint>, RefindError> {
        if swarm.geometry.baseline_days <= 0.0 {
            return Err(RefindError::PropagationFailed(
                "tracklet time baseline must be positive".into(),
            ));
        }

        let mut points = Vec::with_capacity(swarm.len() * epochs.len());
        for member in swarm.members() {
            if population == PopulationFilter::NeoLike
                && member.distance_au > NEO_LIKE_MAX_DISTANCE_AU
            {
                continue;
            }
            for &epoch in epochs {
                points.push(Self::member_track(swarm, member, epoch));
            }
        }
        Ok(points)
    }
}
