//! Builders shared by the unit tests.

use carpool_core::{
    CandidateRoute, CongestionLevel, Incident, Location, RawMetrics, RoadSegment, Route,
    RouteMetadata, RouteMetrics, RouteSegment, TrafficData,
};
use chrono::{TimeZone, Utc};

pub(crate) fn route_through(id: &str, segment_ids: &[&str]) -> Route {
    let at = Utc
        .with_ymd_and_hms(2024, 4, 2, 8, 0, 0)
        .single()
        .unwrap_or_default();
    Route {
        id: id.to_owned(),
        waypoints: Vec::new(),
        segments: vec![RouteSegment {
            start_location: Location::new(51.5, -0.12),
            end_location: Location::new(51.52, -0.1),
            road_segment_ids: segment_ids.iter().map(|id| (*id).to_owned()).collect(),
            distance_meters: 2500.0,
            estimated_duration_seconds: 420.0,
        }],
        metadata: RouteMetadata {
            generated_at: at,
            traffic_data_timestamp: at,
            algorithm_version: "1.0.0".to_owned(),
        },
    }
}

pub(crate) fn candidate(
    id: &str,
    time_minutes: f64,
    distance_km: f64,
    reliability: f64,
    measurement_count: u32,
) -> CandidateRoute {
    CandidateRoute {
        route: route_through(id, &["seg-1"]),
        metrics: RouteMetrics::new(time_minutes, distance_km, reliability).with_raw_metrics(
            RawMetrics {
                measurement_count,
                ..RawMetrics::default()
            },
        ),
    }
}

pub(crate) fn traffic_with(segments: &[(&str, CongestionLevel, Vec<Incident>)]) -> TrafficData {
    TrafficData {
        road_segments: segments
            .iter()
            .map(|(id, congestion_level, incidents)| RoadSegment {
                id: (*id).to_owned(),
                coordinates: Vec::new(),
                speed_kmh: 30.0,
                congestion_level: *congestion_level,
                incidents: incidents.clone(),
            })
            .collect(),
        timestamp: Utc::now(),
        source: "test".to_owned(),
    }
}
