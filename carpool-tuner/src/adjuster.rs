//! The gated read-aggregate-propose-apply cycle.

use std::sync::Arc;

use carpool_core::{
    AdvisorError, AdvisorRequest, Clock, LiveWeights, MetricWeights, PerformanceQuery,
    PerformanceStore, PersistenceError, WeightAdjustmentResult, WeightAdvisor,
};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{AdjustmentConfig, ValidationError, analyse, plan_adjustment};

/// Why a cycle made no change.
#[derive(Debug, Error)]
pub enum SkipReason {
    /// Another cycle or override holds the adjustment lock.
    #[error("another adjustment is in flight")]
    CycleInFlight,
    /// The last adjustment is more recent than the configured interval.
    #[error("next adjustment is not due until {next_due}")]
    TooSoon {
        /// Earliest time the next cycle may apply.
        next_due: DateTime<Utc>,
    },
    /// Too few completed trips were written since the last adjustment.
    #[error("{completed} completed trips since the last adjustment; {required} required")]
    InsufficientData {
        /// Trips counted.
        completed: u64,
        /// Configured threshold.
        required: u64,
    },
    /// The advisor timed out, failed or returned garbage.
    #[error("advisor failed: {0}")]
    Advisor(#[source] AdvisorError),
    /// The proposal failed validation.
    #[error("proposal rejected: {0}")]
    Rejected(#[source] ValidationError),
    /// The store could not be read or the audit record not written.
    #[error("store unavailable: {0}")]
    Store(#[source] PersistenceError),
}

/// Result of one [`WeightAdjuster::run_cycle`].
#[derive(Debug)]
pub enum CycleOutcome {
    /// New weights are live; the audit record is included.
    Applied(WeightAdjustmentResult),
    /// Nothing changed.
    Skipped(SkipReason),
}

impl CycleOutcome {
    /// The audit record, when the cycle applied new weights.
    #[must_use]
    pub const fn applied(&self) -> Option<&WeightAdjustmentResult> {
        match self {
            Self::Applied(result) => Some(result),
            Self::Skipped(_) => None,
        }
    }
}

/// Learns new scoring weights from recorded trip outcomes.
///
/// At most one cycle or override runs at a time. Recording trips and
/// scoring routes never wait on it: the store serialises its own writes and
/// readers of [`LiveWeights`] only ever see a complete vector.
///
/// The audit record is appended before the live weights are swapped, both
/// under the adjustment lock. If the append fails the weights stay as they
/// were, so the newest audit record always matches the live value.
pub struct WeightAdjuster {
    store: Arc<dyn PerformanceStore>,
    advisor: Arc<dyn WeightAdvisor>,
    weights: LiveWeights,
    clock: Arc<dyn Clock>,
    config: AdjustmentConfig,
    cycle: Mutex<()>,
}

impl std::fmt::Debug for WeightAdjuster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightAdjuster")
            .field("weights", &self.weights)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WeightAdjuster {
    /// Assemble an adjuster around shared collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn PerformanceStore>,
        advisor: Arc<dyn WeightAdvisor>,
        weights: LiveWeights,
        clock: Arc<dyn Clock>,
        config: AdjustmentConfig,
    ) -> Self {
        Self {
            store,
            advisor,
            weights,
            clock,
            config,
            cycle: Mutex::new(()),
        }
    }

    /// Live weights this adjuster writes.
    #[must_use]
    pub const fn weights(&self) -> &LiveWeights {
        &self.weights
    }

    /// Configuration in force.
    #[must_use]
    pub const fn config(&self) -> &AdjustmentConfig {
        &self.config
    }

    /// Store the adjuster reads outcomes from.
    #[must_use]
    pub fn store(&self) -> &dyn PerformanceStore {
        self.store.as_ref()
    }

    /// Run one adjustment cycle.
    ///
    /// Returns immediately with [`SkipReason::CycleInFlight`] if another
    /// cycle holds the lock. Every failure is reported as a skip.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Ok(_guard) = self.cycle.try_lock() else {
            return skipped(SkipReason::CycleInFlight);
        };
        match self.adjust().await {
            Ok(result) => CycleOutcome::Applied(result),
            Err(reason) => skipped(reason),
        }
    }

    /// Replace the live weights by operator decision.
    ///
    /// Waits for any running cycle, then appends an audit record with full
    /// confidence before swapping.
    ///
    /// # Errors
    ///
    /// Returns the store error if the audit record cannot be written; the
    /// live weights are then left unchanged.
    pub async fn override_weights(
        &self,
        weights: MetricWeights,
        justification: impl Into<String>,
    ) -> Result<WeightAdjustmentResult, PersistenceError> {
        let _guard = self.cycle.lock().await;
        let result = WeightAdjustmentResult {
            previous_weights: self.weights.snapshot(),
            proposed_weights: weights,
            applied_weights: weights,
            justification: justification.into(),
            confidence: 1.0,
            routes_analyzed: 0,
            timestamp: self.clock.now(),
        };
        self.apply(&result)?;
        info!("operator set weights to {:?}", weights.as_vector());
        Ok(result)
    }

    async fn adjust(&self) -> Result<WeightAdjustmentResult, SkipReason> {
        let now = self.clock.now();
        let last = self.store.latest_adjustment().map_err(SkipReason::Store)?;
        if let Some(next_due) = last
            .as_ref()
            .and_then(|previous| previous.timestamp.checked_add_signed(self.config.adjustment_interval))
            && now < next_due
        {
            return Err(SkipReason::TooSoon { next_due });
        }

        let since = last.map_or(DateTime::<Utc>::MIN_UTC, |previous| previous.timestamp);
        let completed = self
            .store
            .count_completed_since(since)
            .map_err(SkipReason::Store)?;
        if completed < self.config.min_routes_threshold {
            return Err(SkipReason::InsufficientData {
                completed,
                required: self.config.min_routes_threshold,
            });
        }

        let window_start = now
            .checked_sub_signed(self.config.analysis_window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let records = self
            .store
            .query_performance(&PerformanceQuery::default().completed_only().since(window_start))
            .map_err(SkipReason::Store)?;
        let analysis = analyse(&records);
        let routes_analyzed = analysis.routes_analyzed;
        debug!("analysed {routes_analyzed} completed trips for the advisor");

        let previous = self.weights.snapshot();
        let request = AdvisorRequest {
            current_weights: previous,
            aggregated_history: analysis,
        };
        let proposal = tokio::time::timeout(self.config.advisor_timeout, self.advisor.propose(&request))
            .await
            .map_err(|_| {
                SkipReason::Advisor(AdvisorError::Timeout {
                    timeout: self.config.advisor_timeout,
                })
            })?
            .map_err(SkipReason::Advisor)?;

        let plan = plan_adjustment(
            &previous,
            proposal.proposed_weights,
            self.config.weight_sum_tolerance,
            self.config.max_weight_change,
            self.config.incremental_blend_factor,
        )
        .map_err(SkipReason::Rejected)?;

        let result = WeightAdjustmentResult {
            previous_weights: previous,
            proposed_weights: plan.proposed,
            applied_weights: plan.applied,
            justification: proposal.justification,
            confidence: proposal.confidence,
            routes_analyzed,
            timestamp: now,
        };
        self.apply(&result).map_err(SkipReason::Store)?;
        info!(
            "applied weights {:?} (was {:?}) from {routes_analyzed} trips, confidence {:.2}",
            plan.applied.as_vector(),
            previous.as_vector(),
            result.confidence
        );
        Ok(result)
    }

    fn apply(&self, result: &WeightAdjustmentResult) -> Result<(), PersistenceError> {
        self.store.record_adjustment(result)?;
        self.weights.replace(result.applied_weights);
        Ok(())
    }
}

fn skipped(reason: SkipReason) -> CycleOutcome {
    match &reason {
        SkipReason::Rejected(_) | SkipReason::Store(_) => warn!("weight adjustment skipped: {reason}"),
        _ => info!("weight adjustment skipped: {reason}"),
    }
    CycleOutcome::Skipped(reason)
}
