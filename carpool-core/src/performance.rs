//! Planned-versus-actual outcome records and the adjustment audit trail.

use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{MetricWeights, RouteMetrics};

/// How far a trip strayed from its plan.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct DeviationFromPlan {
    /// Actual minus planned time. Positive means late.
    pub time_deviation_minutes: f64,
    /// Actual minus planned distance.
    pub distance_deviation_km: f64,
}

/// What actually happened on a trip.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ActualMetrics {
    /// Observed travel time.
    pub actual_time_minutes: f64,
    /// Observed distance.
    pub actual_distance_km: f64,
    /// Signed deviation from the plan.
    pub deviation_from_plan: DeviationFromPlan,
}

impl ActualMetrics {
    /// Derive actual metrics and their deviation from `planned`.
    ///
    /// # Examples
    /// ```
    /// use carpool_core::{ActualMetrics, RouteMetrics};
    ///
    /// let planned = RouteMetrics::new(30.0, 15.0, 0.8);
    /// let actual = ActualMetrics::against_plan(&planned, 34.0, 14.5);
    /// assert_eq!(actual.deviation_from_plan.time_deviation_minutes, 4.0);
    /// assert_eq!(actual.deviation_from_plan.distance_deviation_km, -0.5);
    /// ```
    #[must_use]
    pub fn against_plan(
        planned: &RouteMetrics,
        actual_time_minutes: f64,
        actual_distance_km: f64,
    ) -> Self {
        Self {
            actual_time_minutes,
            actual_distance_km,
            deviation_from_plan: DeviationFromPlan {
                time_deviation_minutes: actual_time_minutes - planned.time_minutes,
                distance_deviation_km: actual_distance_km - planned.distance_km,
            },
        }
    }
}

/// Durable outcome of one trip.
///
/// Records are written once when a trip completes or is abandoned and never
/// mutated afterwards. `timestamp` is when the trip happened; the store keeps
/// its own write time separately for retention.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct RoutePerformance {
    /// Record identifier. Leave empty to have the store assign one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: String,
    /// Identifier of the route that was driven.
    pub route_id: String,
    /// Metrics the route was planned with.
    pub planned_metrics: RouteMetrics,
    /// Observed outcome.
    pub actual_metrics: ActualMetrics,
    /// Weights in force when the route was planned.
    pub weights: MetricWeights,
    /// When the trip took place.
    pub timestamp: DateTime<Utc>,
    /// Whether the trip ran to completion.
    pub completed: bool,
}

/// Time-of-day bucket used by [`RouteCharacteristics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum TimeOfDay {
    /// Morning commute.
    Morning,
    /// Middle of the day.
    Midday,
    /// Evening commute.
    Evening,
    /// Overnight.
    Night,
}

/// Shape of a route, for similarity queries.
///
/// Accepted by [`PerformanceQuery`] but not yet applied as a filter.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct RouteCharacteristics {
    /// Rough distance in kilometres.
    pub approximate_distance: Option<f64>,
    /// Rough time in minutes.
    pub approximate_time: Option<f64>,
    /// Number of stops.
    pub number_of_waypoints: Option<u32>,
    /// Time-of-day bucket.
    pub time_of_day: Option<TimeOfDay>,
}

/// Filter for [`PerformanceStore::query_performance`](crate::PerformanceStore::query_performance).
///
/// All bounds are optional; an empty query matches every record.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PerformanceQuery {
    /// Inclusive lower bound on `timestamp`.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    pub end_date: Option<DateTime<Utc>>,
    /// When set and at least one, only completed records match.
    pub min_completed_routes: Option<u32>,
    /// Reserved similarity filter.
    pub route_characteristics: Option<RouteCharacteristics>,
}

impl PerformanceQuery {
    /// Match completed records only.
    #[must_use]
    pub const fn completed_only(mut self) -> Self {
        self.min_completed_routes = Some(1);
        self
    }

    /// Restrict to records at or after `start`.
    #[must_use]
    pub const fn since(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    /// Restrict to records at or before `end`.
    #[must_use]
    pub const fn until(mut self, end: DateTime<Utc>) -> Self {
        self.end_date = Some(end);
        self
    }

    /// Whether the query excludes incomplete trips.
    #[must_use]
    pub fn requires_completed(&self) -> bool {
        self.min_completed_routes.is_some_and(|min| min >= 1)
    }

    /// Evaluate the query against a single record.
    #[must_use]
    pub fn matches(&self, record: &RoutePerformance) -> bool {
        if self.start_date.is_some_and(|start| record.timestamp < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| record.timestamp > end) {
            return false;
        }
        !self.requires_completed() || record.completed
    }
}

/// Aggregate statistics over stored outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PerformanceStats {
    /// Number of stored records.
    pub total_routes: u64,
    /// Number of completed records.
    pub completed_routes: u64,
    /// Mean absolute time deviation over completed records.
    pub average_time_deviation: f64,
    /// Mean absolute distance deviation over completed records.
    pub average_distance_deviation: f64,
}

impl PerformanceStats {
    /// Compute statistics from in-memory records.
    ///
    /// Averages use completed records only and absolute deviations. An empty
    /// slice yields all-zero stats.
    #[must_use]
    pub fn from_records(records: &[RoutePerformance]) -> Self {
        let mut stats = Self {
            total_routes: records.len() as u64,
            ..Self::default()
        };
        let mut time_total = 0.0;
        let mut distance_total = 0.0;
        for record in records.iter().filter(|record| record.completed) {
            stats.completed_routes += 1;
            let deviation = record.actual_metrics.deviation_from_plan;
            time_total += deviation.time_deviation_minutes.abs();
            distance_total += deviation.distance_deviation_km.abs();
        }
        if stats.completed_routes > 0 {
            let completed = stats.completed_routes as f64;
            stats.average_time_deviation = time_total / completed;
            stats.average_distance_deviation = distance_total / completed;
        }
        stats
    }
}

/// One entry in the weight adjustment audit trail.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct WeightAdjustmentResult {
    /// Live weights before the adjustment.
    pub previous_weights: MetricWeights,
    /// Weights the advisor (or operator) proposed, before clamping.
    pub proposed_weights: MetricWeights,
    /// Weights actually swapped in.
    pub applied_weights: MetricWeights,
    /// Advisor justification, stored verbatim.
    pub justification: String,
    /// Advisor confidence in `[0, 1]`.
    pub confidence: f64,
    /// Number of outcome records the proposal was based on.
    pub routes_analyzed: u64,
    /// When the adjustment was applied.
    pub timestamp: DateTime<Utc>,
}

/// Pearson correlations between each weight axis and trip deviation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct WeightCorrelations {
    /// Time weight against relative deviation.
    pub time_weight_vs_deviation: f64,
    /// Distance weight against relative deviation.
    pub distance_weight_vs_deviation: f64,
    /// Reliability weight against relative deviation.
    pub reliability_weight_vs_deviation: f64,
}

/// Metrics whose deviation is shrinking or growing over time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PerformanceTrends {
    /// Metrics whose deviation fell.
    pub improving_metrics: Vec<String>,
    /// Metrics whose deviation rose.
    pub declining_metrics: Vec<String>,
}

/// Aggregated history handed to the analytical advisor.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PerformanceAnalysis {
    /// Number of records aggregated.
    pub routes_analyzed: u64,
    /// Deviation statistics over those records.
    pub stats: PerformanceStats,
    /// Weight/deviation correlations.
    pub correlations: WeightCorrelations,
    /// Deviation trends.
    pub trends: PerformanceTrends,
}
