//! Reliability estimation from measurement history and live traffic.

use carpool_core::{CongestionLevel, IncidentSeverity, Route, RouteMetrics, TrafficData};

/// Traffic information available for a single scoring call.
#[derive(Debug, Clone, Copy)]
pub enum TrafficContext<'a> {
    /// A snapshot was obtained, fresh or stale.
    Known(&'a TrafficData),
    /// The cache could not produce any snapshot.
    Unavailable,
    /// The caller did not ask for traffic adjustments.
    Ignored,
}

/// Tunables for [`ReliabilityModel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReliabilityConfig {
    /// When set, routes with fewer historical measurements fall back to
    /// `default_reliability`. Unset by default, so the supplied reliability
    /// is scored as given.
    pub min_measurements: Option<u32>,
    /// Reliability assumed when history is thin or traffic is unavailable.
    pub default_reliability: f64,
    /// Multiplier for lightly congested segments.
    pub low_congestion_factor: f64,
    /// Multiplier for moderately congested segments.
    pub medium_congestion_factor: f64,
    /// Multiplier for heavily congested segments.
    pub high_congestion_factor: f64,
    /// Multiplier for gridlocked segments.
    pub severe_congestion_factor: f64,
    /// Deduction per minor incident on the route.
    pub minor_incident_penalty: f64,
    /// Deduction per moderate incident on the route.
    pub moderate_incident_penalty: f64,
    /// Deduction per major incident on the route.
    pub major_incident_penalty: f64,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            min_measurements: None,
            default_reliability: 0.3,
            low_congestion_factor: 1.0,
            medium_congestion_factor: 0.85,
            high_congestion_factor: 0.6,
            severe_congestion_factor: 0.35,
            minor_incident_penalty: 0.05,
            moderate_incident_penalty: 0.1,
            major_incident_penalty: 0.2,
        }
    }
}

impl ReliabilityConfig {
    /// Require `min_measurements` trips of history before the planned
    /// reliability is trusted.
    #[must_use]
    pub const fn with_min_measurements(mut self, min_measurements: u32) -> Self {
        self.min_measurements = Some(min_measurements);
        self
    }

    /// Set the fallback reliability.
    #[must_use]
    pub const fn with_default_reliability(mut self, default_reliability: f64) -> Self {
        self.default_reliability = default_reliability;
        self
    }

    const fn congestion_factor(&self, level: CongestionLevel) -> f64 {
        match level {
            CongestionLevel::Low => self.low_congestion_factor,
            CongestionLevel::Medium => self.medium_congestion_factor,
            CongestionLevel::High => self.high_congestion_factor,
            CongestionLevel::Severe => self.severe_congestion_factor,
        }
    }

    const fn incident_penalty(&self, severity: IncidentSeverity) -> f64 {
        match severity {
            IncidentSeverity::Minor => self.minor_incident_penalty,
            IncidentSeverity::Moderate => self.moderate_incident_penalty,
            IncidentSeverity::Major => self.major_incident_penalty,
        }
    }
}

/// Estimates the reliability axis of a route before it is scored.
///
/// The estimate starts from the planned reliability. A model configured with
/// a minimum history size replaces it with the default for routes measured
/// fewer times than that. Known traffic scales the estimate
/// by the mean congestion factor of the segments the route traverses and
/// deducts incident penalties. Without traffic the estimate is capped at the
/// default.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReliabilityModel {
    config: ReliabilityConfig,
}

impl ReliabilityModel {
    /// Create a model with `config`.
    #[must_use]
    pub const fn new(config: ReliabilityConfig) -> Self {
        Self { config }
    }

    /// Configuration in force.
    #[must_use]
    pub const fn config(&self) -> &ReliabilityConfig {
        &self.config
    }

    /// Reliability in `[0, 1]` for `route` planned with `metrics`.
    #[expect(
        clippy::float_arithmetic,
        reason = "reliability combines congestion factors and penalties"
    )]
    #[must_use]
    pub fn estimate(&self, metrics: &RouteMetrics, route: &Route, traffic: TrafficContext<'_>) -> f64 {
        let thin_history = self
            .config
            .min_measurements
            .is_some_and(|min| metrics.raw_metrics.measurement_count < min);
        let base = clamp_unit(if thin_history {
            self.config.default_reliability
        } else {
            metrics.reliability
        });

        match traffic {
            TrafficContext::Ignored => base,
            TrafficContext::Unavailable => base.min(clamp_unit(self.config.default_reliability)),
            TrafficContext::Known(data) => {
                let impact = self.traffic_impact(route, data);
                clamp_unit(base * impact.mean_factor() - impact.penalty)
            }
        }
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "accumulates congestion factors and penalties"
    )]
    fn traffic_impact(&self, route: &Route, data: &TrafficData) -> TrafficImpact {
        let mut impact = TrafficImpact::default();
        for segment in route.road_segment_ids().filter_map(|id| data.segment(id)) {
            impact.factor_sum += self.config.congestion_factor(segment.congestion_level);
            impact.matched = impact.matched.saturating_add(1);
            impact.penalty += segment
                .incidents
                .iter()
                .map(|incident| self.config.incident_penalty(incident.severity))
                .sum::<f64>();
        }
        impact
    }
}

#[derive(Debug, Default)]
struct TrafficImpact {
    factor_sum: f64,
    matched: u32,
    penalty: f64,
}

impl TrafficImpact {
    #[expect(clippy::float_arithmetic, reason = "mean of congestion factors")]
    fn mean_factor(&self) -> f64 {
        if self.matched == 0 {
            1.0
        } else {
            self.factor_sum / f64::from(self.matched)
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{route_through, traffic_with};
    use carpool_core::{Incident, IncidentKind, RawMetrics};
    use rstest::{fixture, rstest};

    #[fixture]
    fn model() -> ReliabilityModel {
        ReliabilityModel::default()
    }

    fn measured(reliability: f64, count: u32) -> RouteMetrics {
        RouteMetrics::new(20.0, 10.0, reliability).with_raw_metrics(RawMetrics {
            measurement_count: count,
            ..RawMetrics::default()
        })
    }

    fn assert_close(actual: f64, expected: f64) {
        let delta = (actual - expected).abs();
        assert!(delta < 1e-9, "expected {expected}, got {actual}");
    }

    #[rstest]
    #[case(0.5)]
    #[case(0.9)]
    fn unmeasured_route_keeps_supplied_reliability(
        model: ReliabilityModel,
        #[case] reliability: f64,
    ) {
        let route = route_through("r", &[]);
        let metrics = RouteMetrics::new(20.0, 10.0, reliability);
        let estimate = model.estimate(&metrics, &route, TrafficContext::Ignored);
        assert_close(estimate, reliability);
    }

    #[rstest]
    #[case(9, 0.3)]
    #[case(10, 0.9)]
    fn thin_history_uses_default_when_minimum_configured(
        #[case] count: u32,
        #[case] expected: f64,
    ) {
        let model = ReliabilityModel::new(ReliabilityConfig::default().with_min_measurements(10));
        let route = route_through("r", &[]);
        let estimate = model.estimate(&measured(0.9, count), &route, TrafficContext::Ignored);
        assert_close(estimate, expected);
    }

    #[rstest]
    fn unavailable_traffic_caps_at_default(model: ReliabilityModel) {
        let route = route_through("r", &["seg-1"]);
        let estimate = model.estimate(&measured(0.9, 20), &route, TrafficContext::Unavailable);
        assert_close(estimate, 0.3);
    }

    #[rstest]
    fn congestion_scales_by_mean_factor(model: ReliabilityModel) {
        let traffic = traffic_with(&[
            ("a", CongestionLevel::Low, Vec::new()),
            ("b", CongestionLevel::High, Vec::new()),
        ]);
        let route = route_through("r", &["a", "b", "unmatched"]);
        let estimate = model.estimate(&measured(0.8, 20), &route, TrafficContext::Known(&traffic));
        assert_close(estimate, 0.8 * 0.8);
    }

    #[rstest]
    fn incidents_deduct_penalties_and_floor_at_zero(model: ReliabilityModel) {
        let major = || Incident {
            kind: IncidentKind::Accident,
            severity: IncidentSeverity::Major,
            description: "pile-up".into(),
        };
        let traffic = traffic_with(&[(
            "a",
            CongestionLevel::Severe,
            vec![major(), major(), major()],
        )]);
        let route = route_through("r", &["a"]);
        let estimate = model.estimate(&measured(0.9, 20), &route, TrafficContext::Known(&traffic));
        assert_close(estimate, 0.0);
    }

    #[rstest]
    fn unmatched_route_keeps_base(model: ReliabilityModel) {
        let traffic = traffic_with(&[("elsewhere", CongestionLevel::Severe, Vec::new())]);
        let route = route_through("r", &["a"]);
        let estimate = model.estimate(&measured(0.7, 20), &route, TrafficContext::Known(&traffic));
        assert_close(estimate, 0.7);
    }
}
