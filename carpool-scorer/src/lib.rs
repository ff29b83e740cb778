//! Request-time ranking of carpool candidate routes.
//!
//! [`ScoringEngine`] normalises a candidate set, estimates reliability with a
//! [`ReliabilityModel`], and orders the candidates by their weighted score.
//! The weights come from a [`LiveWeights`](carpool_core::LiveWeights) handle,
//! so a concurrent weight adjustment never blocks or splits a ranking.
//! [`RoutePlanner`] layers the traffic cache on top and degrades to default
//! reliability when no snapshot can be obtained.
//!
//! # Examples
//!
//! ```
//! use carpool_core::MetricWeights;
//! use carpool_scorer::{ReliabilityModel, TrafficContext, rank_routes};
//!
//! let ranked = rank_routes(
//!     &[],
//!     &MetricWeights::default(),
//!     &ReliabilityModel::default(),
//!     TrafficContext::Ignored,
//! );
//! assert!(ranked.is_empty());
//! ```

#![forbid(unsafe_code)]

mod engine;
mod planner;
mod reliability;
#[cfg(test)]
mod test_helpers;

pub use engine::{ScoringEngine, rank_routes};
pub use planner::{RoutePlan, RoutePlanner, TrafficStatus};
pub use reliability::{ReliabilityConfig, ReliabilityModel, TrafficContext};
