//! Behavioural tests for `ScoringEngine` using rstest-bdd.

use std::cell::RefCell;

use carpool_core::{
    CandidateRoute, LiveWeights, Location, MetricWeights, RawMetrics, Route, RouteMetadata,
    RouteMetrics, RouteSegment, ScoredRoute,
};
use carpool_scorer::ScoringEngine;
use chrono::{TimeZone, Utc};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

fn candidate(id: &str, time_minutes: f64, distance_km: f64, measurement_count: u32) -> CandidateRoute {
    let at = Utc
        .with_ymd_and_hms(2024, 6, 3, 7, 30, 0)
        .single()
        .expect("valid timestamp");
    CandidateRoute {
        route: Route {
            id: id.to_owned(),
            waypoints: Vec::new(),
            segments: vec![RouteSegment {
                start_location: Location::new(51.5, -0.12),
                end_location: Location::new(51.53, -0.08),
                road_segment_ids: vec![format!("{id}-seg")],
                distance_meters: distance_km * 1000.0,
                estimated_duration_seconds: time_minutes * 60.0,
            }],
            metadata: RouteMetadata {
                generated_at: at,
                traffic_data_timestamp: at,
                algorithm_version: "1.0.0".to_owned(),
            },
        },
        metrics: RouteMetrics::new(time_minutes, distance_km, 0.8).with_raw_metrics(RawMetrics {
            measurement_count,
            ..RawMetrics::default()
        }),
    }
}

/// Shared state for ranking scenarios.
#[derive(Debug, Default)]
struct RankingWorld {
    live: LiveWeights,
    candidates: RefCell<Vec<CandidateRoute>>,
    ranked: RefCell<Vec<ScoredRoute>>,
}

impl RankingWorld {
    fn rank(&self) {
        let engine = ScoringEngine::new(self.live.clone());
        let ranked = engine.rank(&self.candidates.borrow());
        self.ranked.replace(ranked);
    }

    fn first_id(&self) -> String {
        self.ranked
            .borrow()
            .first()
            .map(|route| route.route.id.clone())
            .expect("at least one ranked route")
    }
}

#[fixture]
fn world() -> RankingWorld {
    RankingWorld::default()
}

#[given("a fast route and a short route with equal reliability")]
fn given_fast_and_short(world: &RankingWorld) {
    world.candidates.replace(vec![
        candidate("short", 30.0, 10.0, 20),
        candidate("fast", 20.0, 15.0, 20),
    ]);
}

#[given("two routes that differ only in travel time")]
fn given_time_only(world: &RankingWorld) {
    world.candidates.replace(vec![
        candidate("slower", 35.0, 12.0, 20),
        candidate("quicker", 28.0, 12.0, 20),
    ]);
}

#[given("two otherwise equal routes with no recorded trips and reliability 0.5 and 0.9")]
fn given_unmeasured_routes(world: &RankingWorld) {
    let mut unreliable = candidate("unreliable", 25.0, 12.0, 0);
    unreliable.metrics = RouteMetrics::new(25.0, 12.0, 0.5);
    let mut reliable = candidate("reliable", 25.0, 12.0, 0);
    reliable.metrics = RouteMetrics::new(25.0, 12.0, 0.9);
    world.candidates.replace(vec![unreliable, reliable]);
}

#[when("the candidates are ranked with the default weights")]
fn when_rank_default(world: &RankingWorld) {
    world.live.replace(MetricWeights::default());
    world.rank();
}

#[when("the candidates are ranked with all weight on reliability")]
fn when_rank_reliability_only(world: &RankingWorld) {
    world
        .live
        .replace(MetricWeights::new(0.0, 0.0, 1.0).expect("weights"));
    world.rank();
}

#[when("the live weights move to favour distance")]
fn when_weights_favour_distance(world: &RankingWorld) {
    world
        .live
        .replace(MetricWeights::new(0.1, 0.8, 0.1).expect("weights"));
}

#[when("the candidates are ranked with the live weights")]
fn when_rank_live(world: &RankingWorld) {
    world.rank();
}

#[then("the fast route ranks first")]
fn then_fast_first(world: &RankingWorld) {
    assert_eq!(world.first_id(), "fast");
}

#[then("ranking again gives the same order and scores")]
fn then_deterministic(world: &RankingWorld) {
    let first = world.ranked.borrow().clone();
    world.rank();
    assert_eq!(*world.ranked.borrow(), first);
}

#[then("the quicker route ranks first")]
fn then_quicker_first(world: &RankingWorld) {
    assert_eq!(world.first_id(), "quicker");
}

#[then("the short route ranks first")]
fn then_short_first(world: &RankingWorld) {
    assert_eq!(world.first_id(), "short");
}

#[then("the reliable route ranks first")]
fn then_reliable_first(world: &RankingWorld) {
    assert_eq!(world.first_id(), "reliable");
}

#[then("each route keeps the reliability it was planned with")]
fn then_reliability_unchanged(world: &RankingWorld) {
    let ranked = world.ranked.borrow();
    for route in ranked.iter() {
        let planned = if route.route.id == "reliable" { 0.9 } else { 0.5 };
        assert!(
            (route.metrics.reliability - planned).abs() < 1e-9,
            "{} scored with reliability {}",
            route.route.id,
            route.metrics.reliability
        );
    }
}

#[scenario(path = "tests/features/scoring.feature", index = 0)]
fn default_weights_favour_fast(world: RankingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/scoring.feature", index = 1)]
fn ties_fall_back_to_time(world: RankingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/scoring.feature", index = 2)]
fn live_weights_apply_next_ranking(world: RankingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/scoring.feature", index = 3)]
fn unmeasured_routes_keep_reliability(world: RankingWorld) {
    let _ = world;
}
