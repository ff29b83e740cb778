//! Tunables for the weight adjustment cycle.

use std::time::Duration;

use carpool_core::WEIGHT_SUM_TOLERANCE;
use chrono::TimeDelta;

/// Configuration for [`WeightAdjuster`](crate::WeightAdjuster).
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentConfig {
    /// Completed trips that must be written since the last adjustment.
    pub min_routes_threshold: u64,
    /// Minimum time between two adjustments.
    pub adjustment_interval: TimeDelta,
    /// Largest change any axis may make in one cycle.
    pub max_weight_change: f64,
    /// Share of the clamped proposal blended into the previous weights.
    pub incremental_blend_factor: f64,
    /// Tolerance on the sum of a proposed vector.
    pub weight_sum_tolerance: f64,
    /// Hard limit on one advisor call.
    pub advisor_timeout: Duration,
    /// How far back trips are analysed.
    pub analysis_window: TimeDelta,
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        Self {
            min_routes_threshold: 50,
            adjustment_interval: TimeDelta::hours(24),
            max_weight_change: 0.15,
            incremental_blend_factor: 0.3,
            weight_sum_tolerance: WEIGHT_SUM_TOLERANCE,
            advisor_timeout: Duration::from_secs(30),
            analysis_window: TimeDelta::days(90),
        }
    }
}

impl AdjustmentConfig {
    /// Set the completed-trip gate.
    #[must_use]
    pub const fn with_min_routes_threshold(mut self, min_routes_threshold: u64) -> Self {
        self.min_routes_threshold = min_routes_threshold;
        self
    }

    /// Set the interval gate.
    #[must_use]
    pub const fn with_adjustment_interval(mut self, adjustment_interval: TimeDelta) -> Self {
        self.adjustment_interval = adjustment_interval;
        self
    }

    /// Set the per-cycle change cap.
    #[must_use]
    pub const fn with_max_weight_change(mut self, max_weight_change: f64) -> Self {
        self.max_weight_change = max_weight_change;
        self
    }

    /// Set the blend factor.
    #[must_use]
    pub const fn with_incremental_blend_factor(mut self, incremental_blend_factor: f64) -> Self {
        self.incremental_blend_factor = incremental_blend_factor;
        self
    }

    /// Set the advisor timeout.
    #[must_use]
    pub const fn with_advisor_timeout(mut self, advisor_timeout: Duration) -> Self {
        self.advisor_timeout = advisor_timeout;
        self
    }

    /// Set the analysis window.
    #[must_use]
    pub const fn with_analysis_window(mut self, analysis_window: TimeDelta) -> Self {
        self.analysis_window = analysis_window;
        self
    }
}
