//! Durable storage for trip outcomes and the weight adjustment audit trail.
//!
//! The [`PerformanceStore`] trait is the contract the rest of the engine
//! relies on. Writes must never silently drop data: a failed write surfaces
//! as [`PersistenceError::Write`] to the caller.

use std::error::Error as StdError;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{PerformanceQuery, PerformanceStats, RoutePerformance, WeightAdjustmentResult};

#[cfg(feature = "store-sqlite")]
mod schema;
#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use schema::SchemaError;
#[cfg(feature = "store-sqlite")]
pub use sqlite::{DEFAULT_RETENTION_DAYS, SqlitePerformanceStore, SqlitePerformanceStoreError};

/// Boxed backend error carried by [`PersistenceError`].
pub type BackendError = Box<dyn StdError + Send + Sync + 'static>;

/// Storage fault raised by a [`PerformanceStore`].
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// A write did not complete; nothing was persisted.
    #[error("failed to {operation}: {source}")]
    Write {
        /// Operation that failed.
        operation: &'static str,
        /// Backend error.
        #[source]
        source: BackendError,
    },
    /// A read did not complete.
    #[error("failed to {operation}: {source}")]
    Read {
        /// Operation that failed.
        operation: &'static str,
        /// Backend error.
        #[source]
        source: BackendError,
    },
}

impl PersistenceError {
    /// Wrap `source` as a write failure.
    pub fn write(operation: &'static str, source: impl Into<BackendError>) -> Self {
        Self::Write {
            operation,
            source: source.into(),
        }
    }

    /// Wrap `source` as a read failure.
    pub fn read(operation: &'static str, source: impl Into<BackendError>) -> Self {
        Self::Read {
            operation,
            source: source.into(),
        }
    }
}

/// Durable record of planned versus actual route outcomes.
///
/// Implementations must be safe to share between threads; concurrent
/// recordings are independent of each other.
pub trait PerformanceStore: Send + Sync {
    /// Persist one outcome and return the identifier it was stored under.
    ///
    /// An empty `id` is replaced by a generated one. Recording an identifier
    /// that already exists leaves the stored record untouched.
    fn record_performance(&self, record: &RoutePerformance) -> Result<String, PersistenceError>;

    /// Return matching records ordered by descending `timestamp`.
    fn query_performance(
        &self,
        query: &PerformanceQuery,
    ) -> Result<Vec<RoutePerformance>, PersistenceError>;

    /// Aggregate statistics over every stored record.
    fn performance_stats(&self) -> Result<PerformanceStats, PersistenceError>;

    /// Delete outcome records written before the retention cutoff and return
    /// how many were removed.
    fn cleanup_old_data(&self) -> Result<usize, PersistenceError>;

    /// Append one entry to the adjustment audit trail.
    fn record_adjustment(&self, adjustment: &WeightAdjustmentResult)
    -> Result<(), PersistenceError>;

    /// Most recent adjustment, if any.
    fn latest_adjustment(&self) -> Result<Option<WeightAdjustmentResult>, PersistenceError>;

    /// Up to `limit` adjustments, newest first.
    fn adjustment_history(
        &self,
        limit: usize,
    ) -> Result<Vec<WeightAdjustmentResult>, PersistenceError>;

    /// Count completed records written strictly after `since`.
    fn count_completed_since(&self, since: DateTime<Utc>) -> Result<u64, PersistenceError>;
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn errors_name_the_operation_and_chain_the_source() {
        let err = PersistenceError::write(
            "record route performance",
            io::Error::other("disk full"),
        );
        assert_eq!(err.to_string(), "failed to record route performance: disk full");
        assert!(err.source().is_some());
    }
}
