//! # Variant orbit swarms
//!
//! A two-point tracklet constrains four of an orbit's six degrees of
//! freedom; heliocentric distance and radial velocity stay unobserved. This
//! module converts that ill-posed inverse problem into a forward ensemble:
//! a dense (distance × radial velocity) grid, one [`VariantOrbit`] per grid
//! node, all sharing the tracklet's observed start/end geometry exactly.
//! The aggregate behaviour of the swarm downstream approximates a
//! probability distribution over the true orbit.
//!
//! Swarm generation is a deterministic combinatorial expansion and never
//! fails on a validated grid.

use itertools::iproduct;

use crate::constants::{Degree, ObjectId, MJD};
use crate::photometry::{Band, MagnitudeModel};
use crate::refind_errors::RefindError;
use crate::tracklets::Detection;

/// The observed plane-of-sky geometry shared by every member of a swarm.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackletGeometry {
    /// Right ascension of the first detection, degrees
    pub ra_start: Degree,
    /// Declination of the first detection, degrees
    pub dec_start: Degree,
    /// Right ascension of the last detection, degrees
    pub ra_end: Degree,
    /// Declination of the last detection, degrees
    pub dec_end: Degree,
    /// Epoch of the first detection, MJD (UTC)
    pub epoch: MJD,
    /// Time baseline between first and last detection, days
    pub baseline_days: f64,
    /// Mean apparent V magnitude over the tracklet's detections
    pub vmag: f64,
}

impl TrackletGeometry {
    /// Extract the swarm geometry from a time-sorted tracklet.
    ///
    /// The per-detection magnitudes are converted into V with the colour
    /// model and averaged, matching how the survey pipeline assigns one
    /// apparent magnitude to the whole swarm.
    ///
    /// Arguments
    /// ---------
    /// * `id`: object identifier, for error reporting only
    /// * `detections`: the tracklet, sorted by epoch (caller invariant)
    /// * `magnitudes`: colour conversion collaborator
    ///
    /// Return
    /// ------
    /// * The shared geometry, or [`RefindError::EmptyTracklet`] for fewer
    ///   than two detections.
    pub fn from_detections(
        id: &ObjectId,
        detections: &[Detection],
        magnitudes: &dyn MagnitudeModel,
    ) -> Result<Self, RefindError> {
        let (Some(first), Some(last)) = (detections.first(), detections.last()) else {
            return Err(RefindError::EmptyTracklet(id.to_string()));
        };
        if detections.len() < 2 {
            return Err(RefindError::EmptyTracklet(id.to_string()));
        }

        let vmag = detections
            .iter()
            .map(|d| magnitudes.convert(d.mag, d.band, Band::V))
            .sum::<f64>()
            / detections.len() as f64;

        Ok(TrackletGeometry {
            ra_start: first.ra,
            dec_start: first.dec,
            ra_end: last.ra,
            dec_end: last.dec,
            epoch: first.time,
            baseline_days: last.time - first.time,
            vmag,
        })
    }
}

/// The two swept parameter axes of a swarm.
///
/// Values are validated once at construction so that generation itself can
/// never fail: distances must be finite and positive, velocities finite,
/// and both axes non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct SwarmGrid {
    distances_au: Vec<f64>,
    radial_velocities_kms: Vec<f64>,
}

impl SwarmGrid {
    /// Build a validated grid from explicit axis values.
    pub fn new(
        distances_au: Vec<f64>,
        radial_velocities_kms: Vec<f64>,
    ) -> Result<Self, RefindError> {
        if distances_au.is_empty() || radial_velocities_kms.is_empty() {
            return Err(RefindError::InvalidParameter(
                "swarm grid axes must be non-empty".into(),
            ));
        }
        if distances_au.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(RefindError::InvalidParameter(
                "swarm distances must be finite and positive".into(),
            ));
        }
        if radial_velocities_kms.iter().any(|v| !v.is_finite()) {
            return Err(RefindError::InvalidParameter(
                "swarm radial velocities must be finite".into(),
            ));
        }
        Ok(SwarmGrid {
            distances_au,
            radial_velocities_kms,
        })
    }

    /// The reference NEO configuration: 51 log-spaced distances from 0.1 to
    /// 10 AU crossed with 21 radial velocities from −50 to +10 km/s
    /// (strongly incoming through strongly outgoing), 1071 members total.
    pub fn reference() -> Self {
        SwarmGrid {
            distances_au: log_spaced(0.1, 10.0, 51),
            radial_velocities_kms: linear_spaced(-50.0, 10.0, 21),
        }
    }

    pub fn distances_au(&self) -> &[f64] {
        &self.distances_au
    }

    pub fn radial_velocities_kms(&self) -> &[f64] {
        &self.radial_velocities_kms
    }

    /// Swarm size this grid generates: |distances| × |radial velocities|.
    pub fn swarm_size(&self) -> usize {
        self.distances_au.len() * self.radial_velocities_kms.len()
    }
}

/// Log-spaced axis values, endpoints included.
pub fn log_spaced(min: f64, max: f64, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![min];
    }
    let (lmin, lmax) = (min.ln(), max.ln());
    (0..n)
        .map(|i| (lmin + (lmax - lmin) * i as f64 / (n - 1) as f64).exp())
        .collect()
}

/// Linearly spaced axis values, endpoints included.
pub fn linear_spaced(min: f64, max: f64, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![min];
    }
    (0..n)
        .map(|i| min + (max - min) * i as f64 / (n - 1) as f64)
        .collect()
}

/// One hypothesized orbit consistent with the tracklet: the shared geometry
/// plus a chosen (distance, radial velocity) pair. Immutable once generated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantOrbit {
    /// Swarm-unique identifier, dense in `0..swarm.len()`
    pub orbit_id: u32,
    /// Hypothesized heliocentric distance at the tracklet epoch, AU
    pub distance_au: f64,
    /// Hypothesized radial velocity, km/s (negative = incoming)
    pub radial_velocity_kms: f64,
}

/// The ensemble of variant orbits generated for one tracklet.
#[derive(Debug, Clone, PartialEq)]
pub struct Swarm {
    pub geometry: TrackletGeometry,
    members: Vec<VariantOrbit>,
}

impl Swarm {
    /// Expand a grid into a swarm. Member count is exactly
    /// `grid.swarm_size()`; ids enumerate the (distance, velocity) product
    /// in row-major order.
    pub fn generate(geometry: TrackletGeometry, grid: &SwarmGrid) -> Self {
        let members = iproduct!(grid.distances_au(), grid.radial_velocities_kms())
            .enumerate()
            .map(|(i, (distance, velocity))| VariantOrbit {
                orbit_id: i as u32,
                distance_au: *distance,
                radial_velocity_kms: *velocity,
            })
            .collect();
        Swarm { geometry, members }
    }

    /// A one-member swarm at a nominal (distance, velocity), used by the
    /// reachability prefilter as the representative orbit.
    pub fn representative(
        geometry: TrackletGeometry,
        distance_au: f64,
        radial_velocity_kms: f64,
    ) -> Self {
        Swarm {
            geometry,
            members: vec![VariantOrbit {
                orbit_id: 0,
                distance_au,
                radial_velocity_kms,
            }],
        }
    }

    pub fn members(&self) -> &[VariantOrbit] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
