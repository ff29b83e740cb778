//! Traffic Data Cache and the HTTP traffic source behind it.
//!
//! [`TrafficCache`] wraps any [`carpool_core::TrafficProvider`] with a
//! time-boxed cache. Within the TTL an entry is served without I/O; between
//! the TTL and the stale threshold it is served while a background refresh
//! runs; beyond that a foreground fetch goes through the retry schedule.
//! At most one upstream fetch is in flight per key.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use carpool_data::traffic::{HttpTrafficProvider, TrafficCache, TrafficCacheConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = HttpTrafficProvider::new("http://localhost:8080")?;
//! let cache = TrafficCache::new(Arc::new(provider), TrafficCacheConfig::default());
//! let traffic = cache.get("downtown").await?;
//! println!("{} segments, {:?}", traffic.data.road_segments.len(), traffic.freshness);
//! # Ok(())
//! # }
//! ```

mod cache;
mod config;
mod http;

pub use cache::{CachedTraffic, Freshness, TrafficCache, TrafficFetchError};
pub use config::{
    DEFAULT_CACHE_TTL, DEFAULT_EVICTION_AGE, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_RETRIES,
    DEFAULT_STALE_THRESHOLD, TrafficCacheConfig,
};
pub use http::{
    DEFAULT_USER_AGENT, HttpTrafficProvider, HttpTrafficProviderConfig, ProviderBuildError,
};
