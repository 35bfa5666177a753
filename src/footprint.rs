//! # Camera footprint matching
//!
//! The reachability prefilter works on bounding boxes; the final word on
//! whether a propagated position lands on silicon belongs to the true
//! instantaneous camera footprint at a visit's exact pointing and rotation.
//! That geometry is an external collaborator ([`CameraFootprint`]); the
//! engine only promises to batch its calls per visit.
//!
//! [`CircularFootprint`] is the shipped reference implementation: the
//! inscribed field-of-view circle, rotation-independent by construction.

use crate::constants::Degree;
use crate::tracklets::angular_separation_deg;

/// Instrument footprint collaborator.
pub trait CameraFootprint: Send + Sync {
    /// Which of the given sky positions fall inside the footprint for one
    /// visit's pointing and camera rotation.
    ///
    /// Arguments
    /// ---------
    /// * `ra`, `dec`: candidate positions, degrees (equal length)
    /// * `field_ra`, `field_dec`: field centre, degrees
    /// * `rot_sky_pos`: camera rotation angle, degrees
    ///
    /// Return
    /// ------
    /// * Indices into `ra`/`dec` of the positions inside the footprint.
    fn contains(
        &self,
        ra: &[Degree],
        dec: &[Degree],
        field_ra: Degree,
        field_dec: Degree,
        rot_sky_pos: Degree,
    ) -> Vec<usize>;
}

/// Circular footprint of a given angular radius, centred on the pointing.
/// Ignores camera rotation.
#[derive(Debug, Clone, Copy)]
pub struct CircularFootprint {
    pub radius_deg: Degree,
}

impl CircularFootprint {
    pub fn new(radius_deg: Degree) -> Self {
        Self { radius_deg }
    }
}

impl Default for CircularFootprint {
    fn default() -> Self {
        Self::new(crate::constants::FOV_RADIUS_DEG)
    }
}

impl CameraFootprint for CircularFootprint {
    fn contains(
        &self,
        ra: &[Degree],
        dec: &[Degree],
        field_ra: Degree,
        field_dec: Degree,
        _rot_sky_pos: Degree,
    ) -> Vec<usize> {
        ra.iter()
            .zip(dec.iter())
            .enumerate()
            .filter(|(_, (&ra, &dec))| {
                angular_separation_deg(ra, dec, field_ra, field_dec) <= self.radius_deg
            })
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod test_footprint {
    use super::*;

    #[test]
    fn circle_selects_inside_points() {
        let footprint = CircularFootprint::new(2.1);
        let ra = [100.0, 101.0, 110.0];
        let dec = [-10.0, -10.5, -10.0];
        let inside = footprint.contains(&ra, &dec, 100.0, -10.0, 33.0);
        assert_eq!(inside, vec![0, 1]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let footprint = CircularFootprint::default();
        assert!(footprint.contains(&[], &[], 0.0, 0.0, 0.0).is_empty());
    }
}
