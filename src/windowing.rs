//! # Multi-night windowing and aggregation
//!
//! The last stage turns per-visit predictions into one number. For each
//! swarm member, the nights on which it would be re-tracklet-ed are
//! collected (a night only counts if the member's predicted points on that
//! night pass the tracklet rule on their own; a single point is not a
//! tracklet), merged with any nights the object was already detected on,
//! and tested against the confirmation rule: `min_nights` distinct nights
//! whose span fits inside `detection_window`. Detection history is a
//! supplement, never a substitute: a member without a single valid
//! predicted night is not findable no matter what the history says. The
//! aggregate probability is the findable fraction of the swarm.
//!
//! The denominator is always the full swarm size, even when population
//! filtering dropped members before matching: a dropped member is an
//! orbit hypothesis the survey would not recover, not a smaller sample.

use ahash::RandomState;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::trace;

use crate::constants::Night;
use crate::matching::PredictedDetection;
use crate::tracklets::{is_valid_tracklet, TrackletParams};

/// Confirmation rule parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRule {
    /// Distinct observation nights required for confirmation
    pub min_nights: usize,
    /// Maximum span (last night − first night) the nights may cover
    pub detection_window: i64,
}

impl Default for WindowRule {
    fn default() -> Self {
        WindowRule {
            min_nights: 3,
            detection_window: 15,
        }
    }
}

/// Per-object outcome of one windowing pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionWindowResult {
    /// Findability verdict per swarm member, indexed by orbit id
    pub findable: Vec<bool>,
    /// Findable fraction of the swarm
    pub probability: f64,
}

/// Does a set of observation nights contain `min_nights` distinct nights
/// spanning at most `detection_window`?
///
/// Nights are deduplicated and sorted; the rule holds iff some run of
/// `min_nights - 1` consecutive gaps sums to at most the window.
pub fn is_findable(nights: &[Night], rule: &WindowRule) -> bool {
    if rule.min_nights == 0 {
        return true;
    }

    let mut unique: SmallVec<[Night; 16]> = nights.iter().copied().collect();
    unique.sort_unstable();
    unique.dedup();
    if unique.len() < rule.min_nights {
        return false;
    }

    unique
        .windows(rule.min_nights)
        .any(|run| run[rule.min_nights - 1] - run[0] <= rule.detection_window)
}

/// Aggregate per-visit predictions into a per-object probability.
///
/// Arguments
/// ---------
/// * `predictions`: output of the matcher for every reachable visit
/// * `prior_nights`: nights the object was already detected on
/// * `swarm_size`: full swarm size (the probability denominator)
/// * `tracklet_params`: per-night re-tracklet validation rule
/// * `rule`: the confirmation window rule
///
/// Return
/// ------
/// * Findability per member and the aggregate probability. Members with no
///   valid predicted night are not findable, regardless of history.
pub fn aggregate(
    predictions: &[PredictedDetection],
    prior_nights: &[Night],
    swarm_size: usize,
    tracklet_params: &TrackletParams,
    rule: &WindowRule,
) -> DetectionWindowResult {
    // (orbit, night) -> that night's observed points for the member
    let mut per_member_night: HashMap<(u32, Night), Vec<&PredictedDetection>, RandomState> =
        HashMap::default();
    for prediction in predictions.iter().filter(|p| p.observed) {
        per_member_night
            .entry((prediction.orbit_id, prediction.night))
            .or_default()
            .push(prediction);
    }

    let mut member_nights: HashMap<u32, Vec<Night>, RandomState> = HashMap::default();
    for ((orbit_id, night), points) in &per_member_night {
        if is_valid_tracklet(points, tracklet_params) {
            member_nights.entry(*orbit_id).or_default().push(*night);
        }
    }

    let mut findable = vec![false; swarm_size];
    for (orbit_id, nights) in &mut member_nights {
        nights.extend_from_slice(prior_nights);
        if let Some(slot) = findable.get_mut(*orbit_id as usize) {
            *slot = is_findable(nights, rule);
        }
    }

    let found = findable.iter().filter(|&&f| f).count();
    trace!(found, swarm_size, "windowing aggregate");
    DetectionWindowResult {
        probability: found as f64 / swarm_size as f64,
        findable,
    }
}
