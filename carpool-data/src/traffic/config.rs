//! Tunables for [`TrafficCache`](super::TrafficCache).

use std::time::Duration;

/// Default fresh-serve window.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
/// Default age beyond which cached data no longer satisfies a request on its own.
pub const DEFAULT_STALE_THRESHOLD: Duration = Duration::from_secs(15 * 60);
/// Default age beyond which an idle entry may be dropped from the cache.
pub const DEFAULT_EVICTION_AGE: Duration = Duration::from_secs(60 * 60);
/// Default per-attempt upstream timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
/// Default number of retries after the first failed attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 4;

/// Configuration for [`TrafficCache`](super::TrafficCache).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use carpool_data::traffic::TrafficCacheConfig;
///
/// let config = TrafficCacheConfig::default()
///     .with_cache_ttl(Duration::from_secs(60))
///     .with_max_retries(2);
/// assert_eq!(config.retry_delay(0), Duration::from_secs(1));
/// assert_eq!(config.retry_delay(9), Duration::from_secs(8));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficCacheConfig {
    /// Entries younger than this are served without any I/O.
    pub cache_ttl: Duration,
    /// Entries older than this trigger a foreground fetch.
    pub stale_threshold: Duration,
    /// Entries older than this, with no request or refresh in flight, are
    /// dropped when a new key is first requested. They no longer stand in
    /// when a fetch fails.
    pub eviction_age: Duration,
    /// Wait before each retry, in order. The last delay repeats if
    /// `max_retries` exceeds the schedule length.
    pub retry_delays: Vec<Duration>,
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Hard deadline for a single upstream attempt.
    pub fetch_timeout: Duration,
}

impl Default for TrafficCacheConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            stale_threshold: DEFAULT_STALE_THRESHOLD,
            eviction_age: DEFAULT_EVICTION_AGE,
            retry_delays: [1, 2, 4, 8].map(Duration::from_secs).to_vec(),
            max_retries: DEFAULT_MAX_RETRIES,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl TrafficCacheConfig {
    /// Set the fresh-serve window.
    #[must_use]
    pub const fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    /// Set the stale threshold.
    #[must_use]
    pub const fn with_stale_threshold(mut self, stale_threshold: Duration) -> Self {
        self.stale_threshold = stale_threshold;
        self
    }

    /// Set the idle eviction age.
    #[must_use]
    pub const fn with_eviction_age(mut self, eviction_age: Duration) -> Self {
        self.eviction_age = eviction_age;
        self
    }

    /// Replace the retry schedule.
    #[must_use]
    pub fn with_retry_delays(mut self, retry_delays: impl IntoIterator<Item = Duration>) -> Self {
        self.retry_delays = retry_delays.into_iter().collect();
        self
    }

    /// Set the retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the per-attempt timeout.
    #[must_use]
    pub const fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Delay before the retry with zero-based index `retry`.
    #[must_use]
    pub fn retry_delay(&self, retry: usize) -> Duration {
        self.retry_delays
            .get(retry)
            .or_else(|| self.retry_delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}
