//! # Refind: detectability facade and per-object orchestrator
//!
//! This module defines the [`Refind`](crate::refind::Refind) struct, the central façade that wires
//! together:
//!
//! 1. **Pipeline configuration** ([`FollowUpParams`](crate::params::FollowUpParams)) — window rule,
//!    swarm grid, reachability tuning, pool size.
//! 2. **Ephemeris propagation** — any [`EphemerisPropagator`](crate::ephemerides::EphemerisPropagator)
//!    backend (the shipped [`LinearRates`](crate::ephemerides::LinearRates) by default).
//! 3. **Camera footprint** — any [`CameraFootprint`](crate::footprint::CameraFootprint)
//!    implementation (inscribed circle by default).
//! 4. **Photometry** — a [`MagnitudeModel`](crate::photometry::MagnitudeModel) for band
//!    conversions against per-visit depths.
//!
//! One call to [`compute_detection_probabilities`](Refind::compute_detection_probabilities) runs
//! the full pipeline for every flagged object of a night on a fixed-size
//! worker pool. All shared inputs (schedule snapshot, prior-detection map,
//! parameter grids) are immutable and passed by reference into the workers;
//! per-object failures are isolated as `Err` entries of the result map and
//! never abort the pool.
//!
//! ## Typical usage
//!
//! ```rust,no_run
//! use refind::refind::Refind;
//! use refind::params::FollowUpParams;
//! use refind::constants::TrackletSet;
//! use refind::schedule::Schedule;
//! use refind::tracklets::PriorDetections;
//!
//! let engine = Refind::new(FollowUpParams::default()).unwrap();
//!
//! # let tracklets: TrackletSet = unimplemented!();
//! # let schedule: Schedule = unimplemented!();
//! # let prior = PriorDetections::new();
//! let results = engine
//!     .compute_detection_probabilities(4, &tracklets, &schedule, &prior)
//!     .unwrap();
//! ```

use ahash::RandomState;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::constants::{Detections, Night, ObjectId, TrackletSet, MJD};
use crate::ephemerides::{EphemerisPropagator, LinearRates};
use crate::footprint::{CameraFootprint, CircularFootprint};
use crate::params::FollowUpParams;
use crate::photometry::{AsteroidColorModel, MagnitudeModel, SurveyConvention};
use crate::reachability::reachable_schedule;
use crate::refind_errors::RefindError;
use crate::schedule::Schedule;
use crate::time::night_of;
use crate::tracklets::{is_valid_tracklet, PriorDetections};
use crate::variant_orbits::{Swarm, TrackletGeometry};
use crate::windowing::{aggregate, DetectionWindowResult};

/// All detectability outcomes of one night, keyed by object.
///
/// Each entry is either the aggregate probability for that object or the
/// per-object error that stopped its pipeline. Objects whose tracklet
/// failed validation have no entry at all.
pub type NightProbabilities = HashMap<ObjectId, Result<f64, RefindError>, RandomState>;

/// Borrow the probability for a given key.
///
/// Arguments
/// ---------
/// * `all`: the map of all per-object outcomes.
/// * `key`: the object identifier.
///
/// Return
/// ------
/// * `Ok(Some(p))` – a probability was computed for the key.
/// * `Ok(None)` – key absent (tracklet rejected upstream).
/// * `Err(&RefindError)` – that object's pipeline failed.
pub fn probability_result_for<'a>(
    all: &'a NightProbabilities,
    key: &ObjectId,
) -> Result<Option<f64>, &'a RefindError> {
    match all.get(key) {
        None => Ok(None),
        Some(Err(e)) => Err(e),
        Some(Ok(p)) => Ok(Some(*p)),
    }
}

/// Detectability engine: configuration plus the three external
/// collaborators, shared read-only across the worker pool.
#[derive(Clone)]
pub struct Refind {
    params: FollowUpParams,
    propagator: Arc<dyn EphemerisPropagator>,
    footprint: Arc<dyn CameraFootprint>,
    magnitudes: Arc<dyn MagnitudeModel>,
}

impl Refind {
    /// Engine with the shipped collaborators: [`LinearRates`] propagation,
    /// inscribed-circle footprint, and the survey colour model for the
    /// configured asteroid class.
    pub fn new(params: FollowUpParams) -> Result<Self, RefindError> {
        let colors = AsteroidColorModel::new(SurveyConvention::Lsst, params.asteroid_type);
        Self::with_collaborators(
            params,
            Arc::new(LinearRates),
            Arc::new(CircularFootprint::default()),
            Arc::new(colors),
        )
    }

    /// Engine with caller-provided collaborators.
    pub fn with_collaborators(
        params: FollowUpParams,
        propagator: Arc<dyn EphemerisPropagator>,
        footprint: Arc<dyn CameraFootprint>,
        magnitudes: Arc<dyn MagnitudeModel>,
    ) -> Result<Self, RefindError> {
        if params.grid.swarm_size() == 0 {
            return Err(RefindError::InvalidParameter(
                "swarm grid must not be empty".into(),
            ));
        }
        Ok(Refind {
            params,
            propagator,
            footprint,
            magnitudes,
        })
    }

    pub fn params(&self) -> &FollowUpParams {
        &self.params
    }

    /// Run the full pipeline for one object.
    ///
    /// Arguments
    /// ---------
    /// * `id`: the object identifier (for geometry errors and logging)
    /// * `detections`: tonight's tracklet, at least two points
    /// * `schedule`: immutable schedule snapshot
    /// * `prior`: nights the object was detected on before tonight
    ///
    /// Return
    /// ------
    /// * Per-orbit findability and the aggregate probability. An empty
    ///   reachable schedule yields probability exactly 0.0 without running
    ///   the full-swarm propagation.
    pub fn probability_for(
        &self,
        id: &ObjectId,
        detections: &Detections,
        schedule: &Schedule,
        prior: &PriorDetections,
    ) -> Result<DetectionWindowResult, RefindError> {
        let geometry = TrackletGeometry::from_detections(id, detections, &*self.magnitudes)?;
        let night = night_of(geometry.epoch, self.params.night_zero);
        let swarm_size = self.params.grid.swarm_size();

        let reachable = reachable_schedule(
            &geometry,
            schedule,
            night,
            self.params.window.detection_window,
            &self.params.reachability,
            &*self.propagator,
        )?;
        if reachable.is_empty() {
            debug!(%id, night, "no reachable visit in the window");
            return Ok(DetectionWindowResult {
                findable: vec![false; swarm_size],
                probability: 0.0,
            });
        }

        let swarm = Swarm::generate(geometry, &self.params.grid);
        let epochs = unique_epochs(reachable.iter().map(|visit| visit.start_mjd));
        let ephemerides = self
            .propagator
            .propagate(&swarm, &epochs, self.params.population)?;
        let predictions = crate::matching::match_predictions(
            &ephemerides,
            &reachable,
            &*self.footprint,
            &*self.magnitudes,
        );

        // only history from before tonight counts; tonight contributes
        // through the predicted visits alone
        let history: Vec<Night> = prior
            .nights_for(id)
            .iter()
            .copied()
            .filter(|&n| n < night)
            .collect();

        let result = aggregate(
            &predictions,
            &history,
            swarm_size,
            &self.params.tracklet,
            &self.params.window,
        );
        debug!(
            %id,
            night,
            reachable = reachable.len(),
            probability = result.probability,
            "object pipeline complete"
        );
        Ok(result)
    }

    /// Run the pipeline for every flagged object of one night on a
    /// fixed-size worker pool.
    ///
    /// Tracklets failing the validation rule are dropped before any worker
    /// is spawned; each remaining object is processed independently, and a
    /// failure inside one worker becomes that object's `Err` entry.
    ///
    /// Arguments
    /// ---------
    /// * `night`: night index of the run (logging and bookkeeping)
    /// * `tracklets`: tonight's flagged tracklets keyed by object
    /// * `schedule`: immutable schedule snapshot, shared across workers
    /// * `prior`: prior-detection nights, shared across workers
    pub fn compute_detection_probabilities(
        &self,
        night: Night,
        tracklets: &TrackletSet,
        schedule: &Schedule,
        prior: &PriorDetections,
    ) -> Result<NightProbabilities, RefindError> {
        let valid: Vec<(&ObjectId, &Detections)> = tracklets
            .iter()
            .filter(|(_, detections)| is_valid_tracklet(detections, &self.params.tracklet))
            .collect();
        let dropped = tracklets.len() - valid.len();
        if dropped > 0 {
            warn!(night, dropped, "tracklets rejected by the validation rule");
        }
        if valid.is_empty() {
            return Ok(NightProbabilities::default());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.params.pool_size)
            .build()
            .map_err(|e| RefindError::WorkerPoolError(e.to_string()))?;

        let results: NightProbabilities = pool.install(|| {
            valid
                .par_iter()
                .map(|(id, detections)| {
                    let outcome = self
                        .probability_for(id, detections, schedule, prior)
                        .map(|result| result.probability);
                    ((*id).clone(), outcome)
                })
                .collect()
        });

        info!(
            night,
            objects = results.len(),
            failures = results.values().filter(|r| r.is_err()).count(),
            "night detectability run complete"
        );
        Ok(results)
    }
}

/// Sorted, deduplicated visit epochs.
fn unique_epochs(epochs: impl IntoIterator<Item = MJD>) -> Vec<MJD> {
    let mut unique: Vec<OrderedFloat<f64>> = epochs.into_iter().map(OrderedFloat).collect();
    unique.sort_unstable();
    unique.dedup();
    unique.into_iter().map(|e| e.0).collect()
}

#[cfg(test)]
mod test_refind {
    use super::*;
    use crate::photometry::Band;
    use crate::schedule::ScheduleVisit;
    use crate::tracklets::Detection;
    use crate::variant_orbits::SwarmGrid;
    use smallvec::smallvec;

    fn tracklet() -> Detections {
        smallvec![
            Detection {
                ra: 100.0,
                dec: 0.0,
                time: 60800.0,
                band: Band::R,
                mag: 20.0,
                astrometric_sigma_mas: 100.0,
                photometric_sigma_mag: 0.1,
            },
            Detection {
                ra: 100.1,
                dec: 0.0,
                time: 60800.02,
                band: Band::R,
                mag: 20.0,
                astrometric_sigma_mas: 100.0,
                photometric_sigma_mag: 0.1,
            },
        ]
    }

    fn small_params() -> FollowUpParams {
        FollowUpParams::builder()
            .grid(SwarmGrid::new(vec![0.5, 1.5], vec![-2.0, 0.0, 2.0]).unwrap())
            .min_nights(2)
            .detection_window(15)
            .pool_size(2)
            .build()
            .unwrap()
    }

    #[test]
    fn empty_reachable_schedule_is_probability_zero() {
        let engine = Refind::new(small_params()).unwrap();
        let schedule = Schedule::from_visits(vec![]);
        let result = engine
            .probability_for(
                &ObjectId::Int(1),
                &tracklet(),
                &schedule,
                &PriorDetections::new(),
            )
            .unwrap();
        assert_eq!(result.probability, 0.0);
        assert_eq!(result.findable.len(), 6);
    }

    #[test]
    fn invalid_tracklets_are_dropped_before_the_pool() {
        let engine = Refind::new(small_params()).unwrap();
        let mut tracklets = TrackletSet::default();
        tracklets.insert(ObjectId::Int(1), tracklet());
        // a singleton cannot be a tracklet
        let singleton: Detections = smallvec![tracklet()[0].clone()];
        tracklets.insert(ObjectId::Int(2), singleton);

        let schedule = Schedule::from_visits(vec![]);
        let results = engine
            .compute_detection_probabilities(4, &tracklets, &schedule, &PriorDetections::new())
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(
            probability_result_for(&results, &ObjectId::Int(1)),
            Ok(Some(0.0))
        );
        assert_eq!(
            probability_result_for(&results, &ObjectId::Int(2)),
            Ok(None)
        );
    }

    #[test]
    fn epochs_are_deduplicated_and_sorted() {
        let epochs = unique_epochs([60804.2, 60804.0, 60804.2, 60803.9]);
        assert_eq!(epochs, vec![60803.9, 60804.0, 60804.2]);
    }

    #[test]
    fn followed_up_object_reaches_certainty() {
        // visits tracking the zero-velocity prediction over three nights,
        // two per night, deep enough for every member
        let mut visits = Vec::new();
        for night in [5i64, 6, 7] {
            let mjd = 60796.0 + night as f64 + 0.6;
            let ra = 100.0 + 5.0 * (mjd - 60800.0);
            visits.push(visit(night, mjd, ra));
            visits.push(visit(night, mjd + 0.02, ra + 0.1));
        }
        let schedule = Schedule::from_visits(visits);

        // single-member swarm at the representative distance
        let params = FollowUpParams::builder()
            .grid(SwarmGrid::new(vec![1.0], vec![0.0]).unwrap())
            .min_nights(3)
            .detection_window(15)
            .build()
            .unwrap();
        let engine = Refind::new(params).unwrap();
        let result = engine
            .probability_for(
                &ObjectId::Int(1),
                &tracklet(),
                &schedule,
                &PriorDetections::new(),
            )
            .unwrap();
        assert_eq!(result.probability, 1.0);
    }

    fn visit(night: Night, start_mjd: MJD, field_ra: f64) -> ScheduleVisit {
        ScheduleVisit {
            night,
            start_mjd,
            field_ra,
            field_dec: 0.0,
            rot_sky_pos: 0.0,
            band: Band::R,
            five_sigma_depth: 26.0,
        }
    }
}
