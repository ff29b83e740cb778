//! Workspace and stub builders shared by the CLI tests.

use super::*;
use crate::adjust::AdvisorBuilder;
use crate::score::TrafficProviderBuilder;
use carpool_core::test_support::performance_fixture;
use carpool_core::{
    CandidateRoute, Location, PerformanceStore, RawMetrics, Route, RouteMetadata, RouteMetrics,
    RouteSegment, TrafficProvider, WeightAdvisor,
};
use carpool_data::advisor::HttpAdvisorConfig;
use carpool_data::test_support::{StubAdvisor, StubTrafficProvider};
use chrono::{TimeDelta, TimeZone, Utc};
use std::sync::Arc;
use tempfile::TempDir;

/// Temporary directory holding a database and any input documents.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.path("data/route_optimizer.db")
    }
}

pub(super) fn write_utf8(path: &Utf8Path, bytes: &[u8]) {
    std::fs::write(path.as_std_path(), bytes).expect("write test file");
}

pub(super) fn write_json_file<T: serde::Serialize>(path: &Utf8Path, value: &T) {
    let payload = serde_json::to_vec_pretty(value).expect("serialize fixture");
    write_utf8(path, &payload);
}

pub(super) fn candidate(id: &str, time_minutes: f64, distance_km: f64) -> CandidateRoute {
    let at = Utc
        .with_ymd_and_hms(2024, 4, 2, 8, 0, 0)
        .single()
        .expect("valid date");
    CandidateRoute {
        route: Route {
            id: id.to_owned(),
            waypoints: Vec::new(),
            segments: vec![RouteSegment {
                start_location: Location::new(51.5, -0.12),
                end_location: Location::new(51.52, -0.1),
                road_segment_ids: vec!["seg-1".to_owned()],
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
            measurement_count: 20,
            ..RawMetrics::default()
        }),
    }
}

/// A fast route and a shorter but slower one.
pub(super) fn fast_and_slow() -> Vec<CandidateRoute> {
    vec![candidate("slow", 40.0, 10.0), candidate("fast", 20.0, 12.0)]
}

/// Record `count` completed trips from an hour ago.
pub(super) fn record_trips(database: &Utf8Path, count: usize) {
    let store = open_store(database).expect("open store");
    let at = Utc::now() - TimeDelta::hours(1);
    for n in 0..count {
        store
            .record_performance(&performance_fixture(&format!("trip-{n}"), at, 3.0, 0.4, true))
            .expect("record trip");
    }
}

pub(super) struct StubTrafficBuilder {
    pub(super) provider: Arc<StubTrafficProvider>,
}

impl TrafficProviderBuilder for StubTrafficBuilder {
    fn build(&self, _base_url: &str) -> Result<Arc<dyn TrafficProvider>, CliError> {
        Ok(self.provider.clone())
    }
}

pub(super) struct StubAdvisorBuilder {
    pub(super) advisor: Arc<StubAdvisor>,
}

impl AdvisorBuilder for StubAdvisorBuilder {
    fn build(&self, _config: &HttpAdvisorConfig) -> Result<Arc<dyn WeightAdvisor>, CliError> {
        Ok(self.advisor.clone())
    }
}

pub(super) fn output_json(buffer: &[u8]) -> serde_json::Value {
    serde_json::from_slice(buffer).expect("command output should be JSON")
}
