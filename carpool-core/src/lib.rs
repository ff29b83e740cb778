//! Core domain model for the carpool route scoring engine.
//!
//! This crate holds the value types shared by every other crate: route
//! metrics and the weights that score them, candidate routes, traffic
//! snapshots, and trip outcome records. It also defines the seams to the
//! outside world ([`TrafficProvider`], [`WeightAdvisor`],
//! [`PerformanceStore`]) and, behind `store-sqlite`, the durable SQLite
//! performance store.

#![forbid(unsafe_code)]

mod advisor;
mod clock;
mod metrics;
mod performance;
mod route;
pub mod store;
pub mod traffic;
mod weights;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use advisor::{AdvisorError, AdvisorProposal, AdvisorRequest, WeightAdvisor};
pub use clock::{Clock, SystemClock};
pub use metrics::{
    MetricWeights, NormalizedMetrics, RawMetrics, RouteMetrics, WEIGHT_SUM_TOLERANCE,
    WeightVector, WeightsError, normalise, score,
};
pub use performance::{
    ActualMetrics, DeviationFromPlan, PerformanceAnalysis, PerformanceQuery, PerformanceStats,
    PerformanceTrends, RouteCharacteristics, RoutePerformance, TimeOfDay, WeightAdjustmentResult,
    WeightCorrelations,
};
pub use route::{
    CandidateRoute, Location, Route, RouteMetadata, RouteSegment, ScoredRoute, Waypoint,
    WaypointKind,
};
pub use store::{BackendError, PerformanceStore, PersistenceError};
#[cfg(feature = "store-sqlite")]
pub use store::{
    DEFAULT_RETENTION_DAYS, SchemaError, SqlitePerformanceStore, SqlitePerformanceStoreError,
};
pub use traffic::{
    CongestionLevel, Coordinate, Incident, IncidentKind, IncidentSeverity, RoadSegment,
    TrafficData, TrafficError, TrafficProvider,
};
pub use weights::LiveWeights;
