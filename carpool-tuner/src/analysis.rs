//! Aggregation of trip outcomes into the advisor's analysis input.
//!
//! Correlations pair each trip's weight on an axis with the relative size of
//! its deviation from plan. A positive coefficient means trips planned with
//! more weight on that axis tended to miss their plan by more.

use carpool_core::{
    PerformanceAnalysis, PerformanceStats, PerformanceTrends, RoutePerformance, WeightCorrelations,
};

/// Fewest records the trend comparison needs.
pub const MIN_TREND_RECORDS: usize = 4;

/// Relative change in deviation below which a metric counts as steady.
pub const TREND_BAND: f64 = 0.05;

/// Name reported for the travel time metric in trends.
pub const TIME_METRIC: &str = "time";

/// Name reported for the distance metric in trends.
pub const DISTANCE_METRIC: &str = "distance";

/// Summarise `records` for the advisor.
///
/// Record order does not matter; trends sort by trip timestamp.
#[must_use]
pub fn analyse(records: &[RoutePerformance]) -> PerformanceAnalysis {
    PerformanceAnalysis {
        routes_analyzed: u64::try_from(records.len()).unwrap_or(u64::MAX),
        stats: PerformanceStats::from_records(records),
        correlations: correlations(records),
        trends: trends(records),
    }
}

fn correlations(records: &[RoutePerformance]) -> WeightCorrelations {
    let deviations: Vec<f64> = records.iter().map(relative_deviation).collect();
    let axis = |weight: fn(&RoutePerformance) -> f64| {
        let weights: Vec<f64> = records.iter().map(weight).collect();
        pearson(&weights, &deviations)
    };
    WeightCorrelations {
        time_weight_vs_deviation: axis(|record| record.weights.time()),
        distance_weight_vs_deviation: axis(|record| record.weights.distance()),
        reliability_weight_vs_deviation: axis(|record| record.weights.reliability()),
    }
}

#[expect(clippy::float_arithmetic, reason = "relative deviation is a ratio")]
fn relative_deviation(record: &RoutePerformance) -> f64 {
    let deviation = record.actual_metrics.deviation_from_plan;
    let ratio = |delta: f64, planned: f64| {
        if planned > 0.0 {
            delta.abs() / planned
        } else {
            0.0
        }
    };
    ratio(
        deviation.time_deviation_minutes,
        record.planned_metrics.time_minutes,
    ) + ratio(
        deviation.distance_deviation_km,
        record.planned_metrics.distance_km,
    )
}

/// Pearson correlation of two equal-length series, or `0` when undefined.
#[expect(clippy::float_arithmetic, reason = "correlation coefficient")]
#[must_use]
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return 0.0;
    }
    let (Some(mean_x), Some(mean_y)) = (mean(xs.iter().copied()), mean(ys.iter().copied())) else {
        return 0.0;
    };
    let (covariance, var_x, var_y) = xs.iter().zip(ys).fold(
        (0.0, 0.0, 0.0),
        |(covariance, var_x, var_y), (x, y)| {
            let dx = x - mean_x;
            let dy = y - mean_y;
            (covariance + dx * dy, var_x + dx * dx, var_y + dy * dy)
        },
    );
    let denominator = (var_x * var_y).sqrt();
    if denominator <= f64::EPSILON || !denominator.is_finite() {
        return 0.0;
    }
    (covariance / denominator).clamp(-1.0, 1.0)
}

#[expect(clippy::float_arithmetic, reason = "arithmetic mean")]
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0.0), |(sum, count), value| (sum + value, count + 1.0));
    (count > 0.0).then(|| sum / count)
}

fn trends(records: &[RoutePerformance]) -> PerformanceTrends {
    let mut trends = PerformanceTrends::default();
    if records.len() < MIN_TREND_RECORDS {
        return trends;
    }
    let mut ordered: Vec<&RoutePerformance> = records.iter().collect();
    ordered.sort_by_key(|record| record.timestamp);
    let (older, newer) = ordered.split_at(records.len().checked_div(2).unwrap_or_default());

    let metrics: [(&str, fn(&RoutePerformance) -> f64); 2] = [
        (TIME_METRIC, |record| {
            record
                .actual_metrics
                .deviation_from_plan
                .time_deviation_minutes
                .abs()
        }),
        (DISTANCE_METRIC, |record| {
            record
                .actual_metrics
                .deviation_from_plan
                .distance_deviation_km
                .abs()
        }),
    ];
    for (name, deviation) in metrics {
        let older_mean = mean(older.iter().map(|record| deviation(record)));
        let newer_mean = mean(newer.iter().map(|record| deviation(record)));
        if let (Some(before), Some(after)) = (older_mean, newer_mean) {
            match classify(before, after) {
                Some(Direction::Improving) => trends.improving_metrics.push(name.to_owned()),
                Some(Direction::Declining) => trends.declining_metrics.push(name.to_owned()),
                None => {}
            }
        }
    }
    trends
}

enum Direction {
    Improving,
    Declining,
}

#[expect(clippy::float_arithmetic, reason = "relative change between halves")]
fn classify(before: f64, after: f64) -> Option<Direction> {
    if before <= f64::EPSILON {
        return (after > f64::EPSILON).then_some(Direction::Declining);
    }
    let change = (after - before) / before;
    if change < -TREND_BAND {
        Some(Direction::Improving)
    } else if change > TREND_BAND {
        Some(Direction::Declining)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carpool_core::MetricWeights;
    use carpool_core::test_support::performance_fixture;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use rstest::{fixture, rstest};

    #[fixture]
    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0)
            .single()
            .expect("valid start")
    }

    fn trip(start: DateTime<Utc>, day: i64, time_dev: f64, dist_dev: f64) -> RoutePerformance {
        performance_fixture(
            &format!("trip-{day}"),
            start + TimeDelta::days(day),
            time_dev,
            dist_dev,
            true,
        )
    }

    #[rstest]
    fn empty_history_is_all_zero() {
        let analysis = analyse(&[]);
        assert_eq!(analysis, PerformanceAnalysis::default());
    }

    #[rstest]
    #[case(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0], 1.0)]
    #[case(&[1.0, 2.0, 3.0], &[6.0, 4.0, 2.0], -1.0)]
    #[case(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], 0.0)]
    #[case(&[1.0], &[1.0], 0.0)]
    fn pearson_handles_perfect_and_degenerate_series(
        #[case] xs: &[f64],
        #[case] ys: &[f64],
        #[case] expected: f64,
    ) {
        assert!((pearson(xs, ys) - expected).abs() < 1e-9);
    }

    #[rstest]
    fn time_heavy_trips_that_run_late_correlate_positively(start: DateTime<Utc>) {
        let mut late = trip(start, 0, 12.0, 0.0);
        late.weights = MetricWeights::new(0.7, 0.15, 0.15).expect("weights");
        let on_time = trip(start, 1, 0.0, 0.0);
        let analysis = analyse(&[late, on_time]);
        assert!(analysis.correlations.time_weight_vs_deviation > 0.99);
        assert!(analysis.correlations.distance_weight_vs_deviation < -0.99);
    }

    #[rstest]
    fn shrinking_deviation_is_improving(start: DateTime<Utc>) {
        let records = [
            trip(start, 3, 2.0, 0.5),
            trip(start, 0, 10.0, 0.5),
            trip(start, 1, 8.0, 0.5),
            trip(start, 2, 3.0, 0.5),
        ];
        let analysis = analyse(&records);
        assert_eq!(analysis.trends.improving_metrics, vec![TIME_METRIC.to_owned()]);
        assert!(analysis.trends.declining_metrics.is_empty());
        assert_eq!(analysis.routes_analyzed, 4);
    }

    #[rstest]
    fn too_few_records_report_no_trends(start: DateTime<Utc>) {
        let records = [trip(start, 0, 10.0, 5.0), trip(start, 1, 1.0, 0.1)];
        assert_eq!(analyse(&records).trends, PerformanceTrends::default());
    }
}
