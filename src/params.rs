//! # Pipeline configuration
//!
//! All tuning of the detectability pipeline lives in [`FollowUpParams`],
//! built through a fluent, validated builder. Defaults reproduce the
//! survey's reference configuration: 1071-member swarm, three nights inside
//! a fifteen-night window, NEO-like population filtering.

use crate::constants::Night;
use crate::ephemerides::PopulationFilter;
use crate::photometry::AsteroidType;
use crate::reachability::ReachabilityParams;
use crate::refind_errors::RefindError;
use crate::tracklets::TrackletParams;
use crate::variant_orbits::SwarmGrid;
use crate::windowing::WindowRule;

/// Configuration of one detectability run.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUpParams {
    /// Confirmation rule: nights required and window span
    pub window: WindowRule,
    /// Worker pool size for the per-object orchestrator
    pub pool_size: usize,
    /// Survey night-zero MJD day number
    pub night_zero: Night,
    /// Tracklet validation rule (shared by ingest and windowing)
    pub tracklet: TrackletParams,
    /// Variant orbit parameter grid
    pub grid: SwarmGrid,
    /// Reachability prefilter tuning
    pub reachability: ReachabilityParams,
    /// Population restriction for the full-swarm propagation pass
    pub population: PopulationFilter,
    /// Taxonomic class assumed for colour conversions
    pub asteroid_type: AsteroidType,
}

impl FollowUpParams {
    /// Reference configuration.
    ///
    /// Equivalent to [`FollowUpParams::default()`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`FollowUpParamsBuilder`] to override the defaults
    /// step by step.
    ///
    /// # Example
    ///
    /// ```rust
    /// use refind::params::FollowUpParams;
    ///
    /// let params = FollowUpParams::builder()
    ///     .min_nights(2)
    ///     .detection_window(10)
    ///     .pool_size(8)
    ///     .build().unwrap();
    /// assert_eq!(params.window.min_nights, 2);
    /// ```
    ///
    /// See also
    /// ------------
    /// * [`FollowUpParams`] – Holds all configuration of a run.
    pub fn builder() -> FollowUpParamsBuilder {
        FollowUpParamsBuilder::new()
    }
}

impl Default for FollowUpParams {
    fn default() -> Self {
        FollowUpParams {
            window: WindowRule::default(),
            pool_size: 4,
            night_zero: crate::constants::DEFAULT_NIGHT_ZERO,
            tracklet: TrackletParams::default(),
            grid: SwarmGrid::reference(),
            reachability: ReachabilityParams::default(),
            population: PopulationFilter::NeoLike,
            asteroid_type: AsteroidType::default(),
        }
    }
}

/// Builder for [`FollowUpParams`], with validation.
#[derive(Debug, Clone)]
pub struct FollowUpParamsBuilder {
    params: FollowUpParams,
}

impl Default for FollowUpParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowUpParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: FollowUpParams::default(),
        }
    }

    pub fn min_nights(mut self, v: usize) -> Self {
        self.params.window.min_nights = v;
        self
    }
    pub fn detection_window(mut self, v: i64) -> Self {
        self.params.window.detection_window = v;
        self
    }
    pub fn pool_size(mut self, v: usize) -> Self {
        self.params.pool_size = v;
        self
    }
    pub fn night_zero(mut self, v: Night) -> Self {
        self.params.night_zero = v;
        self
    }
    pub fn tracklet(mut self, v: TrackletParams) -> Self {
        self.params.tracklet = v;
        self
    }
    pub fn grid(mut self, v: SwarmGrid) -> Self {
        self.params.grid = v;
        self
    }
    pub fn reachability(mut self, v: ReachabilityParams) -> Self {
        self.params.reachability = v;
        self
    }
    pub fn population(mut self, v: PopulationFilter) -> Self {
        self.params.population = v;
        self
    }
    pub fn asteroid_type(mut self, v: AsteroidType) -> Self {
        self.params.asteroid_type = v;
        self
    }

    fn gt0(v: f64) -> bool {
        v.is_finite() && v > 0.0
    }

    /// Validate and produce the final [`FollowUpParams`].
    pub fn build(self) -> Result<FollowUpParams, RefindError> {
        let p = &self.params;

        if p.window.min_nights == 0 {
            return Err(RefindError::InvalidParameter(
                "min_nights must be at least 1".into(),
            ));
        }
        if p.window.detection_window < 1 {
            return Err(RefindError::InvalidParameter(
                "detection_window must be at least 1 night".into(),
            ));
        }
        if p.pool_size == 0 {
            return Err(RefindError::InvalidParameter(
                "pool_size must be at least 1".into(),
            ));
        }
        if p.tracklet.min_obs < 2 {
            return Err(RefindError::InvalidParameter(
                "min_obs must be at least 2".into(),
            ));
        }
        if !Self::gt0(p.tracklet.min_arc) || !Self::gt0(p.tracklet.max_time) {
            return Err(RefindError::InvalidParameter(
                "tracklet arc and time limits must be positive".into(),
            ));
        }
        if !Self::gt0(p.reachability.margin_deg) {
            return Err(RefindError::InvalidParameter(
                "reachability margin must be positive".into(),
            ));
        }
        if !Self::gt0(p.reachability.representative_distance_au) {
            return Err(RefindError::InvalidParameter(
                "representative distance must be positive".into(),
            ));
        }

        Ok(self.params)
    }
}
