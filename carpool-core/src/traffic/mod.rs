//! Live traffic conditions for road segments.
//!
//! The [`TrafficProvider`] trait abstracts the upstream traffic feed. Callers
//! supply a geographic key and receive a [`TrafficData`] snapshot covering the
//! road segments in that area.
//!
//! Providers report a single attempt's failure as a [`TrafficError`]; retry
//! and caching policy live with the caller.

mod error;
mod provider;
mod types;

pub use error::TrafficError;
pub use provider::TrafficProvider;
pub use types::{CongestionLevel, Coordinate, Incident, IncidentKind, IncidentSeverity, RoadSegment, TrafficData};
