//! Unit tests for the record, stats, cleanup and history commands.

use super::helpers::{Workspace, output_json, record_trips, write_json_file};
use super::*;
use crate::store::{
    CleanupArgs, HistoryArgs, RecordArgs, retention_window, run_cleanup, run_history,
    run_record, run_stats,
};
use carpool_core::test_support::{adjustment_fixture, performance_fixture};
use carpool_core::{MetricWeights, PerformanceStore};
use chrono::{TimeDelta, Utc};
use rstest::rstest;

fn record_args(path: &Utf8Path) -> RecordArgs {
    RecordArgs {
        performance: Some(path.to_path_buf()),
    }
}

#[rstest]
fn record_prints_the_stored_id_and_ignores_duplicates() {
    let workspace = Workspace::new();
    let database = workspace.database();
    let trip = workspace.path("trip.json");
    write_json_file(&trip, &performance_fixture("trip-1", Utc::now(), 4.0, 0.5, true));

    for _ in 0..2 {
        let mut buffer = Vec::new();
        run_record(&record_args(&trip), &database, &mut buffer).expect("record should succeed");
        assert_eq!(output_json(&buffer)["id"], "trip-1");
    }

    let stats = open_store(&database)
        .expect("open store")
        .performance_stats()
        .expect("stats");
    assert_eq!(stats.total_routes, 1);
}

#[rstest]
fn record_generates_an_id_when_none_is_given() {
    let workspace = Workspace::new();
    let trip = workspace.path("trip.json");
    write_json_file(&trip, &performance_fixture("", Utc::now(), 1.0, 0.1, false));

    let mut buffer = Vec::new();
    run_record(&record_args(&trip), &workspace.database(), &mut buffer)
        .expect("record should succeed");

    let id = output_json(&buffer)["id"]
        .as_str()
        .map(str::to_owned)
        .expect("id string");
    assert!(!id.is_empty());
}

#[rstest]
fn record_without_a_path_errors() {
    let workspace = Workspace::new();
    let err = run_record(
        &RecordArgs::default(),
        &workspace.database(),
        &mut Vec::new(),
    )
    .expect_err("path is required");
    match err {
        CliError::MissingArgument { field, .. } => assert_eq!(field, ARG_PERFORMANCE),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn stats_average_completed_trips_only() {
    let workspace = Workspace::new();
    let database = workspace.database();
    record_trips(&database, 3);
    open_store(&database)
        .expect("open store")
        .record_performance(&performance_fixture("abandoned", Utc::now(), 60.0, 20.0, false))
        .expect("record abandoned trip");

    let mut buffer = Vec::new();
    run_stats(&database, &mut buffer).expect("stats should succeed");

    let stats = output_json(&buffer);
    assert_eq!(stats["totalRoutes"], 4);
    assert_eq!(stats["completedRoutes"], 3);
    let time = stats["averageTimeDeviation"].as_f64().expect("number");
    assert!((time - 3.0).abs() < 1e-9);
}

#[rstest]
fn stats_on_a_fresh_database_are_zero() {
    let workspace = Workspace::new();
    let mut buffer = Vec::new();
    run_stats(&workspace.database(), &mut buffer).expect("stats should succeed");
    assert_eq!(output_json(&buffer)["totalRoutes"], 0);
}

#[rstest]
#[case(0)]
#[case(-3)]
fn cleanup_rejects_non_positive_retention(#[case] days: i64) {
    let workspace = Workspace::new();
    let args = CleanupArgs {
        retention_days: Some(days),
    };
    let err = run_cleanup(&args, &workspace.database(), &mut Vec::new())
        .expect_err("retention must be positive");
    match err {
        CliError::InvalidRetention { days: reported } => assert_eq!(reported, days),
        other => panic!("expected InvalidRetention, found {other:?}"),
    }
}

#[rstest]
fn cleanup_keeps_recent_writes_of_old_trips() {
    let workspace = Workspace::new();
    let database = workspace.database();
    let long_ago = Utc::now() - TimeDelta::days(400);
    open_store(&database)
        .expect("open store")
        .record_performance(&performance_fixture("backdated", long_ago, 1.0, 0.1, true))
        .expect("record trip");

    let mut buffer = Vec::new();
    run_cleanup(&CleanupArgs::default(), &database, &mut buffer).expect("cleanup");

    let report = output_json(&buffer);
    assert_eq!(report["deleted"], 0);
    assert_eq!(report["retentionDays"], 90);
}

#[rstest]
fn retention_window_converts_days() {
    assert_eq!(
        retention_window(7).expect("valid window"),
        TimeDelta::days(7)
    );
    assert!(retention_window(i64::MAX).is_err());
}

#[rstest]
fn history_is_newest_first_and_limited() {
    let workspace = Workspace::new();
    let database = workspace.database();
    let store = open_store(&database).expect("open store");
    let now = Utc::now();
    for (hours_ago, time) in [(3, 0.5), (2, 0.45), (1, 0.42)] {
        let weights = MetricWeights::new(time, 0.3, 0.7 - time).expect("valid weights");
        store
            .record_adjustment(&adjustment_fixture(weights, now - TimeDelta::hours(hours_ago)))
            .expect("record adjustment");
    }

    let mut buffer = Vec::new();
    run_history(&HistoryArgs { limit: Some(2) }, &database, &mut buffer).expect("history");

    let history = output_json(&buffer);
    let entries = history.as_array().expect("array");
    assert_eq!(entries.len(), 2);
    let newest = entries[0]["appliedWeights"]["time"].as_f64().expect("number");
    assert!((newest - 0.42).abs() < 1e-9);
}
