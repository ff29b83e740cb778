//! SQLite-backed [`PerformanceStore`].

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    ActualMetrics, Clock, DeviationFromPlan, MetricWeights, PerformanceQuery, PerformanceStats,
    RawMetrics, RouteMetrics, RoutePerformance, SystemClock, WeightAdjustmentResult,
};

use super::schema::{SchemaError, initialise_schema};
use super::{PersistenceError, PerformanceStore};

/// Outcome records younger than this are never removed by cleanup.
pub const DEFAULT_RETENTION_DAYS: i64 = 90;

const PERFORMANCE_COLUMNS: &str = "id, route_id,
    planned_time_minutes, planned_distance_km, planned_reliability,
    planned_time_variance, planned_distance_variance, planned_measurement_count,
    actual_time_minutes, actual_distance_km, time_deviation_minutes, distance_deviation_km,
    weight_time, weight_distance, weight_reliability,
    timestamp_ns, completed";

const ADJUSTMENT_COLUMNS: &str = "previous_time, previous_distance, previous_reliability,
    proposed_time, proposed_distance, proposed_reliability,
    applied_time, applied_distance, applied_reliability,
    justification, confidence, routes_analyzed, timestamp_ns";

/// Error raised when opening a [`SqlitePerformanceStore`].
#[derive(Debug, Error)]
pub enum SqlitePerformanceStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The schema could not be created or has an unexpected version.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Historical performance store persisted in a single SQLite database.
///
/// Trip timestamps and write times are stored as Unix nanoseconds, so a
/// stored record reads back exactly as it was written. The
/// connection is guarded by a mutex; every write runs in its own
/// transaction.
pub struct SqlitePerformanceStore {
    connection: Mutex<Connection>,
    retention: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for SqlitePerformanceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlitePerformanceStore")
            .field("retention_days", &self.retention.num_days())
            .finish_non_exhaustive()
    }
}

impl SqlitePerformanceStore {
    /// Open (or create) the database at `path` and initialise its schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqlitePerformanceStoreError> {
        let path = path.as_ref();
        let connection =
            Connection::open(path).map_err(|source| SqlitePerformanceStoreError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_connection(connection)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, SqlitePerformanceStoreError> {
        let connection = Connection::open_in_memory().map_err(|source| {
            SqlitePerformanceStoreError::OpenDatabase {
                path: PathBuf::from(":memory:"),
                source,
            }
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(mut connection: Connection) -> Result<Self, SqlitePerformanceStoreError> {
        initialise_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
            retention: TimeDelta::days(DEFAULT_RETENTION_DAYS),
            clock: Arc::new(SystemClock),
        })
    }

    /// Override the retention window used by cleanup.
    #[must_use]
    pub fn with_retention(mut self, retention: TimeDelta) -> Self {
        self.retention = retention;
        self
    }

    /// Use `clock` for write times and the retention cutoff.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Retention window in force.
    #[must_use]
    pub const fn retention(&self) -> TimeDelta {
        self.retention
    }

    // A panic while holding the guard leaves no partial write behind because
    // uncommitted transactions roll back on drop.
    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl PerformanceStore for SqlitePerformanceStore {
    fn record_performance(&self, record: &RoutePerformance) -> Result<String, PersistenceError> {
        const OPERATION: &str = "record route performance";
        let id = if record.id.trim().is_empty() {
            Uuid::new_v4().to_string()
        } else {
            record.id.clone()
        };
        let timestamp = storable_nanos(record.timestamp)
            .map_err(|source| PersistenceError::write(OPERATION, source))?;
        let created_at = bound_nanos(self.clock.now());
        let planned = &record.planned_metrics;
        let actual = &record.actual_metrics;
        let weights = &record.weights;

        let mut connection = self.connection();
        let transaction = connection
            .transaction()
            .map_err(|source| PersistenceError::write(OPERATION, source))?;
        let inserted = transaction
            .prepare_cached(
                "INSERT OR IGNORE INTO route_performances (
                    id, route_id,
                    planned_time_minutes, planned_distance_km, planned_reliability,
                    planned_time_variance, planned_distance_variance, planned_measurement_count,
                    actual_time_minutes, actual_distance_km,
                    time_deviation_minutes, distance_deviation_km,
                    weight_time, weight_distance, weight_reliability,
                    timestamp_ns, completed, created_at_ns
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            )
            .and_then(|mut statement| {
                statement.execute(params![
                    id,
                    record.route_id,
                    planned.time_minutes,
                    planned.distance_km,
                    planned.reliability,
                    planned.raw_metrics.time_variance,
                    planned.raw_metrics.distance_variance,
                    planned.raw_metrics.measurement_count,
                    actual.actual_time_minutes,
                    actual.actual_distance_km,
                    actual.deviation_from_plan.time_deviation_minutes,
                    actual.deviation_from_plan.distance_deviation_km,
                    weights.time(),
                    weights.distance(),
                    weights.reliability(),
                    timestamp,
                    record.completed,
                    created_at,
                ])
            })
            .map_err(|source| PersistenceError::write(OPERATION, source))?;
        transaction
            .commit()
            .map_err(|source| PersistenceError::write(OPERATION, source))?;

        if inserted == 0 {
            debug!("route performance {id} already recorded; keeping the stored copy");
        } else {
            debug!("recorded route performance {id} for route {}", record.route_id);
        }
        Ok(id)
    }

    fn query_performance(
        &self,
        query: &PerformanceQuery,
    ) -> Result<Vec<RoutePerformance>, PersistenceError> {
        const OPERATION: &str = "query route performances";
        let sql = format!(
            "SELECT {PERFORMANCE_COLUMNS} FROM route_performances
             WHERE (?1 IS NULL OR timestamp_ns >= ?1)
               AND (?2 IS NULL OR timestamp_ns <= ?2)
               AND (?3 = 0 OR completed = 1)
             ORDER BY timestamp_ns DESC, id ASC"
        );
        let connection = self.connection();
        let mut statement = connection
            .prepare_cached(&sql)
            .map_err(|source| PersistenceError::read(OPERATION, source))?;
        let rows = statement
            .query_map(
                params![
                    query.start_date.map(bound_nanos),
                    query.end_date.map(bound_nanos),
                    query.requires_completed(),
                ],
                performance_from_row,
            )
            .map_err(|source| PersistenceError::read(OPERATION, source))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|source| PersistenceError::read(OPERATION, source))
    }

    fn performance_stats(&self) -> Result<PerformanceStats, PersistenceError> {
        let connection = self.connection();
        connection
            .query_row(
                "SELECT
                    COUNT(*),
                    COALESCE(SUM(completed), 0),
                    COALESCE(AVG(CASE WHEN completed = 1 THEN ABS(time_deviation_minutes) END), 0.0),
                    COALESCE(AVG(CASE WHEN completed = 1 THEN ABS(distance_deviation_km) END), 0.0)
                 FROM route_performances",
                [],
                |row| {
                    Ok(PerformanceStats {
                        total_routes: row.get(0)?,
                        completed_routes: row.get(1)?,
                        average_time_deviation: row.get(2)?,
                        average_distance_deviation: row.get(3)?,
                    })
                },
            )
            .map_err(|source| PersistenceError::read("compute performance stats", source))
    }

    fn cleanup_old_data(&self) -> Result<usize, PersistenceError> {
        const OPERATION: &str = "delete expired route performances";
        let cutoff = self.clock.now() - self.retention;
        let mut connection = self.connection();
        let transaction = connection
            .transaction()
            .map_err(|source| PersistenceError::write(OPERATION, source))?;
        let deleted = transaction
            .execute(
                "DELETE FROM route_performances WHERE created_at_ns < ?1",
                [bound_nanos(cutoff)],
            )
            .map_err(|source| PersistenceError::write(OPERATION, source))?;
        transaction
            .commit()
            .map_err(|source| PersistenceError::write(OPERATION, source))?;
        if deleted > 0 {
            info!(
                "removed {deleted} route performance records written before {}",
                cutoff.to_rfc3339()
            );
        }
        Ok(deleted)
    }

    fn record_adjustment(
        &self,
        adjustment: &WeightAdjustmentResult,
    ) -> Result<(), PersistenceError> {
        const OPERATION: &str = "record weight adjustment";
        let previous = &adjustment.previous_weights;
        let proposed = &adjustment.proposed_weights;
        let applied = &adjustment.applied_weights;
        let timestamp = storable_nanos(adjustment.timestamp)
            .map_err(|source| PersistenceError::write(OPERATION, source))?;
        let mut connection = self.connection();
        let transaction = connection
            .transaction()
            .map_err(|source| PersistenceError::write(OPERATION, source))?;
        transaction
            .execute(
                &format!(
                    "INSERT INTO weight_adjustments ({ADJUSTMENT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                ),
                params![
                    previous.time(),
                    previous.distance(),
                    previous.reliability(),
                    proposed.time(),
                    proposed.distance(),
                    proposed.reliability(),
                    applied.time(),
                    applied.distance(),
                    applied.reliability(),
                    adjustment.justification,
                    adjustment.confidence,
                    adjustment.routes_analyzed,
                    timestamp,
                ],
            )
            .map_err(|source| PersistenceError::write(OPERATION, source))?;
        transaction
            .commit()
            .map_err(|source| PersistenceError::write(OPERATION, source))
    }

    fn latest_adjustment(&self) -> Result<Option<WeightAdjustmentResult>, PersistenceError> {
        let connection = self.connection();
        connection
            .query_row(
                &format!(
                    "SELECT {ADJUSTMENT_COLUMNS} FROM weight_adjustments
                     ORDER BY timestamp_ns DESC, seq DESC LIMIT 1"
                ),
                [],
                adjustment_from_row,
            )
            .optional()
            .map_err(|source| PersistenceError::read("read latest weight adjustment", source))
    }

    fn adjustment_history(
        &self,
        limit: usize,
    ) -> Result<Vec<WeightAdjustmentResult>, PersistenceError> {
        const OPERATION: &str = "read weight adjustment history";
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let connection = self.connection();
        let mut statement = connection
            .prepare_cached(&format!(
                "SELECT {ADJUSTMENT_COLUMNS} FROM weight_adjustments
                 ORDER BY timestamp_ns DESC, seq DESC LIMIT ?1"
            ))
            .map_err(|source| PersistenceError::read(OPERATION, source))?;
        let rows = statement
            .query_map([limit], adjustment_from_row)
            .map_err(|source| PersistenceError::read(OPERATION, source))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|source| PersistenceError::read(OPERATION, source))
    }

    fn count_completed_since(&self, since: DateTime<Utc>) -> Result<u64, PersistenceError> {
        let connection = self.connection();
        connection
            .query_row(
                "SELECT COUNT(*) FROM route_performances
                 WHERE completed = 1 AND created_at_ns > ?1",
                [bound_nanos(since)],
                |row| row.get(0),
            )
            .map_err(|source| PersistenceError::read("count completed route performances", source))
    }
}

fn performance_from_row(row: &Row<'_>) -> rusqlite::Result<RoutePerformance> {
    let planned_metrics = RouteMetrics::new(row.get(2)?, row.get(3)?, row.get(4)?)
        .with_raw_metrics(RawMetrics {
            time_variance: row.get(5)?,
            distance_variance: row.get(6)?,
            measurement_count: row.get(7)?,
        });
    Ok(RoutePerformance {
        id: row.get(0)?,
        route_id: row.get(1)?,
        planned_metrics,
        actual_metrics: ActualMetrics {
            actual_time_minutes: row.get(8)?,
            actual_distance_km: row.get(9)?,
            deviation_from_plan: DeviationFromPlan {
                time_deviation_minutes: row.get(10)?,
                distance_deviation_km: row.get(11)?,
            },
        },
        weights: weights_from_row(row, 12)?,
        timestamp: datetime_from_row(row, 15)?,
        completed: row.get(16)?,
    })
}

fn adjustment_from_row(row: &Row<'_>) -> rusqlite::Result<WeightAdjustmentResult> {
    Ok(WeightAdjustmentResult {
        previous_weights: weights_from_row(row, 0)?,
        proposed_weights: weights_from_row(row, 3)?,
        applied_weights: weights_from_row(row, 6)?,
        justification: row.get(9)?,
        confidence: row.get(10)?,
        routes_analyzed: row.get(11)?,
        timestamp: datetime_from_row(row, 12)?,
    })
}

fn weights_from_row(row: &Row<'_>, first: usize) -> rusqlite::Result<MetricWeights> {
    MetricWeights::new(row.get(first)?, row.get(first + 1)?, row.get(first + 2)?)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(first, Type::Real, Box::new(err)))
}

fn datetime_from_row(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let nanos: i64 = row.get(index)?;
    Ok(DateTime::from_timestamp_nanos(nanos))
}

/// Timestamp outside the years 1677 to 2262 that nanosecond storage covers.
#[derive(Debug, Error)]
#[error("timestamp {0} cannot be stored with nanosecond precision")]
struct UnstorableTimestamp(DateTime<Utc>);

fn storable_nanos(at: DateTime<Utc>) -> Result<i64, UnstorableTimestamp> {
    at.timestamp_nanos_opt().ok_or(UnstorableTimestamp(at))
}

// Bounds beyond the storable range saturate.
fn bound_nanos(at: DateTime<Utc>) -> i64 {
    at.timestamp_nanos_opt()
        .unwrap_or(if at.timestamp() < 0 { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedClock, adjustment_fixture, performance_fixture};
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 9, 30, 0)
            .single()
            .expect("valid date")
    }

    #[fixture]
    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(at(1)))
    }

    #[fixture]
    fn store(clock: Arc<FixedClock>) -> (SqlitePerformanceStore, Arc<FixedClock>) {
        let store = SqlitePerformanceStore::open_in_memory()
            .expect("open store")
            .with_clock(clock.clone());
        (store, clock)
    }

    #[rstest]
    fn recorded_performance_round_trips(store: (SqlitePerformanceStore, Arc<FixedClock>)) {
        let (store, _) = store;
        let mut record = performance_fixture("p-1", at(2), 3.5, -0.25, true);
        record.planned_metrics.raw_metrics = RawMetrics {
            time_variance: 1.5,
            distance_variance: 0.125,
            measurement_count: 12,
        };
        record.weights = MetricWeights::new(0.5, 0.2, 0.3).expect("valid weights");

        let id = store.record_performance(&record).expect("record");
        let found = store
            .query_performance(&PerformanceQuery::default())
            .expect("query");

        assert_eq!(id, "p-1");
        assert_eq!(found, vec![record]);
    }

    #[rstest]
    fn empty_id_is_replaced_with_a_uuid(store: (SqlitePerformanceStore, Arc<FixedClock>)) {
        let (store, _) = store;
        let id = store
            .record_performance(&performance_fixture("", at(2), 0.0, 0.0, true))
            .expect("record");
        assert!(Uuid::parse_str(&id).is_ok(), "generated id {id} is not a uuid");
    }

    #[rstest]
    fn same_id_twice_keeps_first_copy(store: (SqlitePerformanceStore, Arc<FixedClock>)) {
        let (store, _) = store;
        let first = performance_fixture("dup", at(2), 1.0, 0.1, true);
        let second = performance_fixture("dup", at(3), 9.0, 0.9, false);
        store.record_performance(&first).expect("first");
        store.record_performance(&second).expect("second");
        let found = store
            .query_performance(&PerformanceQuery::default())
            .expect("query");
        assert_eq!(found, vec![first]);
    }

    #[rstest]
    fn distinct_ids_for_one_route_are_both_kept(
        store: (SqlitePerformanceStore, Arc<FixedClock>),
    ) {
        let (store, _) = store;
        let mut first = performance_fixture("a", at(2), 1.0, 0.1, true);
        let mut second = performance_fixture("b", at(3), 2.0, 0.2, true);
        first.route_id = "route-7".into();
        second.route_id = "route-7".into();
        store.record_performance(&first).expect("first");
        store.record_performance(&second).expect("second");
        let ids: Vec<_> = store
            .query_performance(&PerformanceQuery::default())
            .expect("query")
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[rstest]
    fn date_range_is_inclusive_and_newest_first(
        store: (SqlitePerformanceStore, Arc<FixedClock>),
    ) {
        let (store, _) = store;
        for (id, day) in [("d1", 1), ("d5", 5), ("d10", 10), ("d15", 15)] {
            store
                .record_performance(&performance_fixture(id, at(day), 0.0, 0.0, true))
                .expect("record");
        }
        let query = PerformanceQuery::default().since(at(5)).until(at(10));
        let ids: Vec<_> = store
            .query_performance(&query)
            .expect("query")
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(ids, vec!["d10", "d5"]);
    }

    #[rstest]
    fn sub_millisecond_timestamps_survive_storage_and_filtering(
        store: (SqlitePerformanceStore, Arc<FixedClock>),
    ) {
        let (store, _) = store;
        let trip_at = at(2) + TimeDelta::microseconds(300) + TimeDelta::nanoseconds(7);
        let record = performance_fixture("fine", trip_at, 0.0, 0.0, true);
        store.record_performance(&record).expect("record");

        let all = store
            .query_performance(&PerformanceQuery::default())
            .expect("query");
        assert_eq!(all, vec![record.clone()]);

        let later = PerformanceQuery::default().since(at(2) + TimeDelta::microseconds(500));
        assert!(store.query_performance(&later).expect("query").is_empty());
        let earlier = PerformanceQuery::default().until(at(2) + TimeDelta::microseconds(100));
        assert!(store.query_performance(&earlier).expect("query").is_empty());
        let exact = PerformanceQuery::default().since(trip_at).until(trip_at);
        assert_eq!(store.query_performance(&exact).expect("query"), vec![record]);
    }

    #[rstest]
    fn timestamps_beyond_nanosecond_range_are_rejected(
        store: (SqlitePerformanceStore, Arc<FixedClock>),
    ) {
        let (store, _) = store;
        let far_future = Utc
            .with_ymd_and_hms(2300, 1, 1, 0, 0, 0)
            .single()
            .expect("valid date");
        let err = store
            .record_performance(&performance_fixture("late", far_future, 0.0, 0.0, true))
            .expect_err("out of range");
        assert!(matches!(err, PersistenceError::Write { .. }));

        let unbounded = PerformanceQuery::default().until(far_future);
        assert!(store.query_performance(&unbounded).expect("query").is_empty());
    }

    #[rstest]
    fn completed_filter_drops_abandoned_trips(store: (SqlitePerformanceStore, Arc<FixedClock>)) {
        let (store, _) = store;
        store
            .record_performance(&performance_fixture("done", at(2), 0.0, 0.0, true))
            .expect("record");
        store
            .record_performance(&performance_fixture("quit", at(3), 0.0, 0.0, false))
            .expect("record");
        let found = store
            .query_performance(&PerformanceQuery::default().completed_only())
            .expect("query");
        assert!(found.iter().all(|record| record.completed));
        assert_eq!(found.len(), 1);
    }

    #[rstest]
    fn stats_on_empty_store_are_zero(store: (SqlitePerformanceStore, Arc<FixedClock>)) {
        let (store, _) = store;
        assert_eq!(
            store.performance_stats().expect("stats"),
            PerformanceStats::default()
        );
    }

    #[rstest]
    fn stats_use_completed_absolute_deviations(store: (SqlitePerformanceStore, Arc<FixedClock>)) {
        let (store, _) = store;
        for record in [
            performance_fixture("a", at(2), 2.0, 0.2, true),
            performance_fixture("b", at(3), -4.0, -0.6, true),
            performance_fixture("c", at(4), 25.0, 7.0, false),
        ] {
            store.record_performance(&record).expect("record");
        }
        let stats = store.performance_stats().expect("stats");
        assert_eq!(stats.total_routes, 3);
        assert_eq!(stats.completed_routes, 2);
        assert!((stats.average_time_deviation - 3.0).abs() < 1e-9);
        assert!((stats.average_distance_deviation - 0.4).abs() < 1e-9);
    }

    #[rstest]
    fn cleanup_is_keyed_on_write_time(store: (SqlitePerformanceStore, Arc<FixedClock>)) {
        let (store, clock) = store;
        // Back-dated trip written today survives; a recent trip written long
        // ago does not.
        store
            .record_performance(&performance_fixture("old-write", at(1), 0.0, 0.0, true))
            .expect("record");
        clock.advance(TimeDelta::days(100));
        let backdated = performance_fixture("old-trip", at(1) - TimeDelta::days(365), 0.0, 0.0, true);
        store.record_performance(&backdated).expect("record");

        assert_eq!(store.cleanup_old_data().expect("cleanup"), 1);
        assert_eq!(store.cleanup_old_data().expect("cleanup"), 0);
        let ids: Vec<_> = store
            .query_performance(&PerformanceQuery::default())
            .expect("query")
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(ids, vec!["old-trip"]);
    }

    #[rstest]
    fn completed_count_uses_write_time(store: (SqlitePerformanceStore, Arc<FixedClock>)) {
        let (store, clock) = store;
        store
            .record_performance(&performance_fixture("before", at(20), 0.0, 0.0, true))
            .expect("record");
        let mark = clock.now();
        clock.advance(TimeDelta::minutes(1));
        store
            .record_performance(&performance_fixture("after", at(2), 0.0, 0.0, true))
            .expect("record");
        store
            .record_performance(&performance_fixture("abandoned", at(2), 0.0, 0.0, false))
            .expect("record");
        assert_eq!(store.count_completed_since(mark).expect("count"), 1);
    }

    #[rstest]
    fn adjustments_are_returned_newest_first(store: (SqlitePerformanceStore, Arc<FixedClock>)) {
        let (store, _) = store;
        assert!(store.latest_adjustment().expect("latest").is_none());
        let older = adjustment_fixture(MetricWeights::new(0.45, 0.3, 0.25).expect("w"), at(2));
        let newer = adjustment_fixture(MetricWeights::new(0.5, 0.25, 0.25).expect("w"), at(9));
        store.record_adjustment(&older).expect("older");
        store.record_adjustment(&newer).expect("newer");

        assert_eq!(store.latest_adjustment().expect("latest"), Some(newer.clone()));
        assert_eq!(store.adjustment_history(10).expect("history"), vec![newer.clone(), older]);
        assert_eq!(store.adjustment_history(1).expect("history"), vec![newer]);
    }

    #[rstest]
    fn reopening_a_file_keeps_records() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("route_optimizer.db");
        let record = performance_fixture("kept", at(2), 1.0, 0.5, true);
        {
            let store = SqlitePerformanceStore::open(&path).expect("open");
            store.record_performance(&record).expect("record");
        }
        let store = SqlitePerformanceStore::open(&path).expect("reopen");
        assert_eq!(
            store
                .query_performance(&PerformanceQuery::default())
                .expect("query"),
            vec![record]
        );
    }
}
