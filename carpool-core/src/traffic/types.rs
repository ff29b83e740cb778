//! Traffic snapshot types.

use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair on a road segment polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Coarse congestion classification reported per segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum CongestionLevel {
    /// Free-flowing.
    Low,
    /// Slowed.
    Medium,
    /// Heavy.
    High,
    /// Standstill or close to it.
    Severe,
}

/// Category of a reported incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum IncidentKind {
    /// Collision.
    Accident,
    /// Road works.
    Construction,
    /// Road closed.
    Closure,
    /// Anything else.
    Other,
}

/// Impact of a reported incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum IncidentSeverity {
    /// Little effect on flow.
    Minor,
    /// Noticeable delay.
    Moderate,
    /// Severe delay or blockage.
    Major,
}

/// An incident affecting a road segment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Incident {
    /// Incident category.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: IncidentKind,
    /// Incident impact.
    pub severity: IncidentSeverity,
    /// Free-text description from the feed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
}

/// Live conditions on one road segment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct RoadSegment {
    /// Segment identifier shared with the route generator.
    pub id: String,
    /// Segment polyline.
    #[cfg_attr(feature = "serde", serde(default))]
    pub coordinates: Vec<Coordinate>,
    /// Observed speed.
    pub speed_kmh: f64,
    /// Congestion classification.
    pub congestion_level: CongestionLevel,
    /// Active incidents.
    #[cfg_attr(feature = "serde", serde(default))]
    pub incidents: Vec<Incident>,
}

/// A traffic snapshot for one area.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct TrafficData {
    /// Segments covered by the snapshot.
    pub road_segments: Vec<RoadSegment>,
    /// When the upstream feed produced the snapshot.
    pub timestamp: DateTime<Utc>,
    /// Feed identifier.
    pub source: String,
}

impl TrafficData {
    /// Find a segment by identifier.
    #[must_use]
    pub fn segment(&self, id: &str) -> Option<&RoadSegment> {
        self.road_segments.iter().find(|segment| segment.id == id)
    }
}
