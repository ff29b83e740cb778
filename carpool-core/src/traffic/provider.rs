//! Traffic provider trait.

use async_trait::async_trait;

use super::{TrafficData, TrafficError};

/// Fetch a traffic snapshot for a geographic area.
///
/// Implementations perform exactly one attempt per call and must return
/// `Err(TrafficError::EmptyKey)` for an empty key. They must be thread-safe so
/// a single provider can back a shared cache.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use chrono::Utc;
/// use carpool_core::{TrafficData, TrafficError, TrafficProvider};
///
/// struct QuietRoads;
///
/// #[async_trait]
/// impl TrafficProvider for QuietRoads {
///     async fn fetch_traffic(&self, key: &str) -> Result<TrafficData, TrafficError> {
///         if key.is_empty() {
///             return Err(TrafficError::EmptyKey);
///         }
///         Ok(TrafficData {
///             road_segments: Vec::new(),
///             timestamp: Utc::now(),
///             source: "quiet".into(),
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait TrafficProvider: Send + Sync {
    /// Fetch the current snapshot for `key`.
    async fn fetch_traffic(&self, key: &str) -> Result<TrafficData, TrafficError>;
}
