//! Deterministic doubles shared by unit and behaviour tests.

use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::{
    ActualMetrics, Clock, MetricWeights, PerformanceQuery, PerformanceStats, PerformanceStore,
    PersistenceError, RouteMetrics, RoutePerformance, WeightAdjustmentResult,
};

/// Manually driven [`Clock`].
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Start the clock at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Jump to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.guard() = now;
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.guard();
        *now += delta;
    }

    fn guard(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.guard()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    // Outcome records paired with their write time.
    performances: Vec<(RoutePerformance, DateTime<Utc>)>,
    adjustments: Vec<WeightAdjustmentResult>,
}

/// In-memory [`PerformanceStore`] with the same semantics as the SQLite
/// store.
///
/// The store performs linear scans and is intended only for small datasets.
/// Writes can be forced to fail with [`set_fail_writes`](Self::set_fail_writes).
pub struct MemoryPerformanceStore {
    state: Mutex<MemoryState>,
    clock: Arc<dyn Clock>,
    retention: TimeDelta,
    fail_writes: AtomicBool,
}

impl std::fmt::Debug for MemoryPerformanceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPerformanceStore")
            .field("retention_days", &self.retention.num_days())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryPerformanceStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(crate::SystemClock))
    }
}

impl MemoryPerformanceStore {
    /// Create an empty store driven by `clock`, with a 90 day retention.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            clock,
            retention: TimeDelta::days(90),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Override the retention window.
    #[must_use]
    pub const fn with_retention(mut self, retention: TimeDelta) -> Self {
        self.retention = retention;
        self
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self, operation: &'static str) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::write(operation, "injected write failure"));
        }
        Ok(())
    }
}

impl PerformanceStore for MemoryPerformanceStore {
    fn record_performance(&self, record: &RoutePerformance) -> Result<String, PersistenceError> {
        self.check_writable("record route performance")?;
        let mut stored = record.clone();
        if stored.id.trim().is_empty() {
            stored.id = Uuid::new_v4().to_string();
        }
        let id = stored.id.clone();
        let mut state = self.state();
        if !state.performances.iter().any(|(existing, _)| existing.id == id) {
            state.performances.push((stored, self.clock.now()));
        }
        Ok(id)
    }

    fn query_performance(
        &self,
        query: &PerformanceQuery,
    ) -> Result<Vec<RoutePerformance>, PersistenceError> {
        let mut matches: Vec<_> = self
            .state()
            .performances
            .iter()
            .map(|(record, _)| record)
            .filter(|record| query.matches(record))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(matches)
    }

    fn performance_stats(&self) -> Result<PerformanceStats, PersistenceError> {
        let records: Vec<_> = self
            .state()
            .performances
            .iter()
            .map(|(record, _)| record.clone())
            .collect();
        Ok(PerformanceStats::from_records(&records))
    }

    fn cleanup_old_data(&self) -> Result<usize, PersistenceError> {
        self.check_writable("delete expired route performances")?;
        let cutoff = self.clock.now() - self.retention;
        let mut state = self.state();
        let before = state.performances.len();
        state
            .performances
            .retain(|(_, created_at)| *created_at >= cutoff);
        Ok(before - state.performances.len())
    }

    fn record_adjustment(
        &self,
        adjustment: &WeightAdjustmentResult,
    ) -> Result<(), PersistenceError> {
        self.check_writable("record weight adjustment")?;
        self.state().adjustments.push(adjustment.clone());
        Ok(())
    }

    fn latest_adjustment(&self) -> Result<Option<WeightAdjustmentResult>, PersistenceError> {
        Ok(self.adjustment_history(1)?.into_iter().next())
    }

    fn adjustment_history(
        &self,
        limit: usize,
    ) -> Result<Vec<WeightAdjustmentResult>, PersistenceError> {
        let mut history = self.state().adjustments.clone();
        // Stable sort keeps insertion order for equal timestamps; reverse
        // afterwards so the latest insert wins ties.
        history.sort_by_key(|adjustment| adjustment.timestamp);
        history.reverse();
        history.truncate(limit);
        Ok(history)
    }

    fn count_completed_since(&self, since: DateTime<Utc>) -> Result<u64, PersistenceError> {
        let count = self
            .state()
            .performances
            .iter()
            .filter(|(record, created_at)| record.completed && *created_at > since)
            .count();
        Ok(count as u64)
    }
}

/// Build an outcome planned at 30 minutes / 15 km with the given deviations.
#[must_use]
pub fn performance_fixture(
    id: &str,
    timestamp: DateTime<Utc>,
    time_deviation_minutes: f64,
    distance_deviation_km: f64,
    completed: bool,
) -> RoutePerformance {
    let planned_metrics = RouteMetrics::new(30.0, 15.0, 0.8);
    RoutePerformance {
        id: id.to_owned(),
        route_id: format!("route-{id}"),
        planned_metrics,
        actual_metrics: ActualMetrics::against_plan(
            &planned_metrics,
            30.0 + time_deviation_minutes,
            15.0 + distance_deviation_km,
        ),
        weights: MetricWeights::default(),
        timestamp,
        completed,
    }
}

/// Build an audit record moving from the default weights to `applied`.
#[must_use]
pub fn adjustment_fixture(
    applied: MetricWeights,
    timestamp: DateTime<Utc>,
) -> WeightAdjustmentResult {
    WeightAdjustmentResult {
        previous_weights: MetricWeights::default(),
        proposed_weights: applied,
        applied_weights: applied,
        justification: "fixture adjustment".to_owned(),
        confidence: 0.8,
        routes_analyzed: 60,
        timestamp,
    }
}
