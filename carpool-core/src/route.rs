//! Candidate routes supplied by the external route generator.

use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{NormalizedMetrics, RouteMetrics};

/// A WGS84 position, optionally labelled with an address.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Human-readable address.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub address: Option<String>,
}

impl Location {
    /// Construct an unlabelled location.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            address: None,
        }
    }
}

/// Whether a waypoint picks a rider up or drops them off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum WaypointKind {
    /// A rider boards here.
    Pickup,
    /// A rider alights here.
    Dropoff,
}

/// One stop along a carpool route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Waypoint {
    /// Stop position.
    pub location: Location,
    /// Pickup or dropoff.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: WaypointKind,
    /// Zero-based order along the route.
    pub sequence_number: u32,
    /// Planned arrival time.
    pub estimated_arrival_time: DateTime<Utc>,
}

/// A leg between two consecutive locations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct RouteSegment {
    /// Where the leg starts.
    pub start_location: Location,
    /// Where the leg ends.
    pub end_location: Location,
    /// Road segments traversed, in order. These match
    /// [`RoadSegment::id`](crate::RoadSegment::id) in traffic data.
    #[cfg_attr(feature = "serde", serde(default))]
    pub road_segment_ids: Vec<String>,
    /// Leg length in metres.
    pub distance_meters: f64,
    /// Planned leg duration in seconds.
    pub estimated_duration_seconds: f64,
}

/// Provenance of a generated route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct RouteMetadata {
    /// When the route generator produced the route.
    pub generated_at: DateTime<Utc>,
    /// Timestamp of the traffic snapshot the generator used.
    pub traffic_data_timestamp: DateTime<Utc>,
    /// Generator algorithm version.
    pub algorithm_version: String,
}

/// A complete route as produced by the routing provider.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Route {
    /// Provider-assigned identifier.
    pub id: String,
    /// Ordered stops.
    #[cfg_attr(feature = "serde", serde(default))]
    pub waypoints: Vec<Waypoint>,
    /// Ordered legs.
    #[cfg_attr(feature = "serde", serde(default))]
    pub segments: Vec<RouteSegment>,
    /// Provenance.
    pub metadata: RouteMetadata,
}

impl Route {
    /// Iterate over every road segment id the route traverses.
    pub fn road_segment_ids(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .flat_map(|segment| segment.road_segment_ids.iter().map(String::as_str))
    }
}

/// One route offered for ranking together with its planned metrics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CandidateRoute {
    /// The route itself.
    pub route: Route,
    /// Planned metrics for the route.
    pub metrics: RouteMetrics,
}

/// A ranked candidate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ScoredRoute {
    /// The ranked route.
    pub route: Route,
    /// Metrics used for scoring, after reliability estimation.
    pub metrics: RouteMetrics,
    /// Metrics normalised against the rest of the candidate set.
    pub normalized_metrics: NormalizedMetrics,
    /// Weighted score in `[0, 1]`; higher is better.
    pub score: f64,
}
