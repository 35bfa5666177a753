//! # Constants and type definitions for refind
//!
//! This module centralizes the **unit conversions**, **survey geometry
//! constants**, and **common type definitions** used throughout the `refind`
//! library. It also defines the container types used to organize a night of
//! detections per object.
//!
//! ## Overview
//!
//! - Angular and temporal unit conversions
//! - Core type aliases used across the crate
//! - Identifiers for flagged moving objects
//! - Container types for storing detections and tracklets
//!
//! These definitions are used by all main modules, including swarm
//! generation, schedule reachability, and the windowing aggregator.

use crate::tracklets::Detection;
use ahash::RandomState;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// -------------------------------------------------------------------------------------------------
// Unit conversions and survey geometry
// -------------------------------------------------------------------------------------------------

/// Minutes in a day, used by the tracklet time-gap rule
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Arcseconds per degree
pub const ARCSEC_PER_DEG: f64 = 3600.0;

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU_KM: f64 = 149_597_870.7;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Radius of the camera field of view in degrees (LSST-like 9.6 deg² circle)
pub const FOV_RADIUS_DEG: f64 = 2.1;

/// Safety factor applied to the field-of-view radius when inflating the
/// per-night reachability box. Must stay generous relative to the swarm
/// angular-velocity spread or the prefilter stops being conservative.
pub const REACH_SAFETY_FACTOR: f64 = 5.0;

/// MJD of the survey's night zero (start of operations)
pub const DEFAULT_NIGHT_ZERO: Night = 60796;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in radians
pub type Radian = f64;
/// Modified Julian Date (days)
pub type MJD = f64;
/// Night index, counted from the survey's night zero
pub type Night = i64;

// -------------------------------------------------------------------------------------------------
// Identifiers and data containers
// -------------------------------------------------------------------------------------------------

/// Identifier of a flagged moving object.
///
/// This can be:
/// - A numeric catalogue index (e.g. `Int(1234)`)
/// - A designation string (e.g. the 7-digit hex ids used by synthetic
///   survey catalogues, `"00F2A1C"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectId {
    /// Integer-based catalogue index
    Int(u32),
    /// String-based designation (hex id, provisional designation, etc.)
    Designation(String),
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectId::Int(n) => write!(f, "{n}"),
            ObjectId::Designation(s) => write!(f, "{s}"),
        }
    }
}

impl From<u32> for ObjectId {
    fn from(n: u32) -> Self {
        ObjectId::Int(n)
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        ObjectId::Designation(s)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        ObjectId::Designation(s.to_string())
    }
}

impl std::str::FromStr for ObjectId {
    type Err = std::convert::Infallible;

    /// Parse an `ObjectId` from a string.
    /// - Pure digits → `Int(u32)`
    /// - Otherwise  → `Designation(String)`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<u32>() {
            Ok(n) => Ok(ObjectId::Int(n)),
            Err(_) => Ok(ObjectId::Designation(s.to_string())),
        }
    }
}

/// A small, inline-optimized container for the same-night detections of a
/// single object, sorted by time.
pub type Detections = SmallVec<[Detection; 6]>;

/// One night's flagged tracklets, keyed by object identifier.
pub type TrackletSet = HashMap<ObjectId, Detections, RandomState>;

#[cfg(test)]
mod test_object_id {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_numeric_and_hex_ids() {
        assert_eq!(ObjectId::from_str("1234").unwrap(), ObjectId::Int(1234));
        assert_eq!(
            ObjectId::from_str("00F2A1C").unwrap(),
            ObjectId::Designation("00F2A1C".into())
        );
        assert_eq!(format!("{}", ObjectId::from("00F2A1C")), "00F2A1C");
    }
}
