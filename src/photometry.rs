//! # Filter bands and asteroid colour conversions
//!
//! A visit's five-sigma depth is quoted in the visit's own filter band while
//! swarm members carry an apparent **V** magnitude, so every footprint match
//! needs a colour conversion. The conversion itself is a collaborator
//! concern: this module defines the [`MagnitudeModel`] seam plus the
//! reference implementation used by the survey pipeline, a fixed colour
//! offset table per asteroid spectral type (Vereš & Chesley 2017).
//!
//! Unknown band letters or type selectors are configuration mistakes, not
//! data conditions, and fail loudly at parse time.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::refind_errors::RefindError;

/// Survey filter band. `V` is the internal reference band used for swarm
/// apparent magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    #[serde(rename = "u")]
    U,
    #[serde(rename = "g")]
    G,
    #[serde(rename = "r")]
    R,
    #[serde(rename = "i")]
    I,
    #[serde(rename = "z")]
    Z,
    #[serde(rename = "y")]
    Y,
    #[serde(rename = "V")]
    V,
}

impl Band {
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::U => "u",
            Band::G => "g",
            Band::R => "r",
            Band::I => "i",
            Band::Z => "z",
            Band::Y => "y",
            Band::V => "V",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Band {
    type Err = RefindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "u" => Ok(Band::U),
            "g" => Ok(Band::G),
            "r" => Ok(Band::R),
            "i" => Ok(Band::I),
            "z" => Ok(Band::Z),
            "y" => Ok(Band::Y),
            "V" | "v" => Ok(Band::V),
            other => Err(RefindError::UnknownBand(other.to_string())),
        }
    }
}

/// Asteroid spectral type selecting the colour offset table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AsteroidType {
    /// Carbonaceous (the conservative default for unknown objects)
    #[default]
    C,
    /// Silicaceous
    S,
}

impl FromStr for AsteroidType {
    type Err = RefindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" | "c" => Ok(AsteroidType::C),
            "S" | "s" => Ok(AsteroidType::S),
            other => Err(RefindError::UnknownAsteroidType(other.to_string())),
        }
    }
}

/// Survey photometric convention for the offset table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurveyConvention {
    #[default]
    Lsst,
}

/// Colour/magnitude conversion collaborator.
///
/// Implementations must be pure functions of their inputs: the pipeline's
/// bit-identical idempotence guarantee rests on it.
pub trait MagnitudeModel: Send + Sync {
    /// Convert an apparent magnitude from one band into another.
    fn convert(&self, mag: f64, from: Band, to: Band) -> f64;
}

/// Fixed colour offsets per asteroid spectral type, LSST convention.
///
/// The table stores `m_band − m_V` for each filter; a conversion subtracts
/// the source offset and adds the target offset, so any band pair is
/// reachable through V and the model is exactly invertible.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsteroidColorModel {
    pub convention: SurveyConvention,
    pub asteroid_type: AsteroidType,
}

impl AsteroidColorModel {
    pub fn new(convention: SurveyConvention, asteroid_type: AsteroidType) -> Self {
        Self {
            convention,
            asteroid_type,
        }
    }

    /// `m_band − m_V` for the configured spectral type.
    fn offset(&self, band: Band) -> f64 {
        match self.asteroid_type {
            AsteroidType::C => match band {
                Band::U => 1.614,
                Band::G => 0.302,
                Band::R => -0.172,
                Band::I => -0.291,
                Band::Z => -0.298,
                Band::Y => -0.303,
                Band::V => 0.0,
            },
            AsteroidType::S => match band {
                Band::U => 1.927,
                Band::G => 0.395,
                Band::R => -0.255,
                Band::I => -0.455,
                Band::Z => -0.401,
                Band::Y => -0.406,
                Band::V => 0.0,
            },
        }
    }
}

impl MagnitudeModel for AsteroidColorModel {
    fn convert(&self, mag: f64, from: Band, to: Band) -> f64 {
        mag - self.offset(from) + self.offset(to)
    }
}

#[cfg(test)]
mod test_photometry {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn unknown_band_fails_loudly() {
        let err = Band::from_str("w").unwrap_err();
        assert_eq!(err, RefindError::UnknownBand("w".into()));
    }

    #[test]
    fn conversion_round_trips_through_v() {
        let model = AsteroidColorModel::default();
        let mag_u = 21.3;
        let v = model.convert(mag_u, Band::U, Band::V);
        assert_abs_diff_eq!(v, 21.3 - 1.614, epsilon = 1e-12);
        let back = model.convert(v, Band::V, Band::U);
        assert_abs_diff_eq!(back, mag_u, epsilon = 1e-12);
    }

    #[test]
    fn s_type_is_redder_than_c_type_in_g() {
        let c = AsteroidColorModel::new(SurveyConvention::Lsst, AsteroidType::C);
        let s = AsteroidColorModel::new(SurveyConvention::Lsst, AsteroidType::S);
        let v = 20.0;
        assert!(s.convert(v, Band::V, Band::G) > c.convert(v, Band::V, Band::G));
    }
}
