//! Facade crate for the carpool route scoring engine.
//!
//! This crate re-exports the core domain types and exposes the scoring engine,
//! the traffic adapters and the weight adjustment cycle behind feature flags.

#![forbid(unsafe_code)]

pub use carpool_core::{
    ActualMetrics, AdvisorError, AdvisorProposal, AdvisorRequest, CandidateRoute, Clock,
    DeviationFromPlan, LiveWeights, MetricWeights, NormalizedMetrics, PerformanceQuery,
    PerformanceStats, PerformanceStore, PersistenceError, RawMetrics, Route, RouteMetrics,
    RoutePerformance, ScoredRoute, SystemClock, TrafficData, TrafficError, TrafficProvider,
    WeightAdjustmentResult, WeightAdvisor, WeightVector, WeightsError,
};

#[cfg(feature = "store-sqlite")]
pub use carpool_core::{SqlitePerformanceStore, SqlitePerformanceStoreError};

#[cfg(feature = "scorer")]
pub use carpool_data::advisor::{HttpAdvisorConfig, HttpWeightAdvisor};
#[cfg(feature = "scorer")]
pub use carpool_data::traffic::{HttpTrafficProvider, TrafficCache, TrafficCacheConfig};
#[cfg(feature = "scorer")]
pub use carpool_scorer::{RoutePlan, RoutePlanner, ScoringEngine, TrafficStatus};

#[cfg(feature = "tuner")]
pub use carpool_tuner::{AdjustmentConfig, AdjustmentScheduler, CycleOutcome, SkipReason, WeightAdjuster};
