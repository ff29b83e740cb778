//! Stale-while-revalidate cache over a [`TrafficProvider`].

use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use carpool_core::{TrafficData, TrafficError, TrafficProvider};
use log::{debug, warn};
use thiserror::Error;
use tokio::time::Instant;

use super::TrafficCacheConfig;

/// How current a [`CachedTraffic`] value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Younger than the cache TTL, or just fetched.
    Fresh,
    /// Past the TTL but inside the stale threshold; a background refresh has
    /// been scheduled.
    Refreshing,
    /// Past the stale threshold and the foreground fetch failed; served with
    /// a warning.
    Stale,
}

/// A traffic snapshot as served by the cache.
#[derive(Debug, Clone)]
pub struct CachedTraffic {
    /// The snapshot itself.
    pub data: Arc<TrafficData>,
    /// Whether the snapshot is within its freshness window.
    pub freshness: Freshness,
    /// Time since the snapshot was fetched.
    pub age: Duration,
}

/// Every attempt to fetch traffic for a key failed and no cached entry
/// could stand in.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("traffic fetch for '{key}' failed after {attempts} attempt(s): {last_error}")]
pub struct TrafficFetchError {
    /// Area key that was requested.
    pub key: String,
    /// Attempts made, including the first.
    pub attempts: u32,
    /// Failure from the final attempt.
    #[source]
    pub last_error: TrafficError,
}

#[derive(Debug, Clone)]
struct Entry {
    data: Arc<TrafficData>,
    fetched_at: Instant,
}

#[derive(Debug, Default)]
struct Slot {
    entry: Mutex<Option<Entry>>,
    // Held for the duration of any upstream fetch for this key.
    fetch_lock: tokio::sync::Mutex<()>,
    refreshing: AtomicBool,
}

impl Slot {
    fn entry(&self) -> Option<Entry> {
        self.guard().clone()
    }

    fn store(&self, data: TrafficData) -> Arc<TrafficData> {
        let data = Arc::new(data);
        *self.guard() = Some(Entry {
            data: Arc::clone(&data),
            fetched_at: Instant::now(),
        });
        data
    }

    fn guard(&self) -> MutexGuard<'_, Option<Entry>> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// Only the map holds an idle slot; callers and background refreshes keep
// their own clone.
fn evictable(slot: &Arc<Slot>, eviction_age: Duration) -> bool {
    Arc::strong_count(slot) == 1
        && slot
            .entry()
            .is_none_or(|entry| entry.fetched_at.elapsed() >= eviction_age)
}

struct Inner {
    provider: Arc<dyn TrafficProvider>,
    config: TrafficCacheConfig,
    slots: Mutex<HashMap<String, Arc<Slot>>>,
}

/// Time-boxed traffic cache with retry and staleness handling.
///
/// Cloning is cheap and clones share the same entries. Idle entries older
/// than [`TrafficCacheConfig::eviction_age`] are dropped when a new key is
/// first requested, so the cache holds at most the keys requested within
/// that window.
#[derive(Clone)]
pub struct TrafficCache {
    inner: Arc<Inner>,
}

impl fmt::Debug for TrafficCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrafficCache")
            .field("config", &self.inner.config)
            .field("keys", &self.inner.slots().len())
            .finish_non_exhaustive()
    }
}

impl TrafficCache {
    /// Wrap `provider` with a cache configured by `config`.
    #[must_use]
    pub fn new(provider: Arc<dyn TrafficProvider>, config: TrafficCacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                config,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Configuration in force.
    #[must_use]
    pub fn config(&self) -> &TrafficCacheConfig {
        &self.inner.config
    }

    /// Serve traffic for `key`.
    ///
    /// Must be called from within a Tokio runtime, since background refreshes
    /// are spawned onto it.
    ///
    /// # Errors
    ///
    /// Returns [`TrafficFetchError`] when a foreground fetch exhausts its
    /// retries and there is no earlier snapshot to fall back on.
    pub async fn get(&self, key: &str) -> Result<CachedTraffic, TrafficFetchError> {
        if key.is_empty() {
            return Err(TrafficFetchError {
                key: String::new(),
                attempts: 0,
                last_error: TrafficError::EmptyKey,
            });
        }

        let slot = self.inner.slot(key);
        if let Some(hit) = self.serve_cached(key, &slot) {
            return Ok(hit);
        }

        let _fetching = slot.fetch_lock.lock().await;
        // Another caller may have completed a fetch while we waited.
        let existing = slot.entry();
        if let Some(entry) = &existing
            && entry.fetched_at.elapsed() < self.inner.config.cache_ttl
        {
            return Ok(served(entry, Freshness::Fresh));
        }

        match self.inner.fetch_with_retry(key).await {
            Ok(data) => Ok(CachedTraffic {
                data: slot.store(data),
                freshness: Freshness::Fresh,
                age: Duration::ZERO,
            }),
            Err(err) => match existing {
                Some(entry) => {
                    let cached = served(&entry, Freshness::Stale);
                    warn!(
                        "serving stale traffic for '{key}' ({}s old): {err}",
                        cached.age.as_secs()
                    );
                    Ok(cached)
                }
                None => Err(err),
            },
        }
    }

    /// Drop any cached snapshot for `key`.
    pub fn invalidate(&self, key: &str) {
        self.inner.slots().remove(key);
    }

    fn serve_cached(&self, key: &str, slot: &Arc<Slot>) -> Option<CachedTraffic> {
        let entry = slot.entry()?;
        let age = entry.fetched_at.elapsed();
        let config = &self.inner.config;
        if age < config.cache_ttl {
            return Some(served(&entry, Freshness::Fresh));
        }
        if age < config.stale_threshold {
            self.schedule_refresh(key, slot);
            return Some(served(&entry, Freshness::Refreshing));
        }
        None
    }

    fn schedule_refresh(&self, key: &str, slot: &Arc<Slot>) {
        if slot.refreshing.swap(true, Ordering::AcqRel) {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let slot = Arc::clone(slot);
        let key = key.to_owned();
        tokio::spawn(async move {
            {
                let _fetching = slot.fetch_lock.lock().await;
                let still_due = slot
                    .entry()
                    .is_none_or(|entry| entry.fetched_at.elapsed() >= inner.config.cache_ttl);
                if still_due {
                    match inner.fetch_with_retry(&key).await {
                        Ok(data) => {
                            slot.store(data);
                            debug!("refreshed traffic for '{key}' in the background");
                        }
                        Err(err) => warn!("background traffic refresh failed: {err}"),
                    }
                }
            }
            slot.refreshing.store(false, Ordering::Release);
        });
    }
}

impl Inner {
    fn slots(&self) -> MutexGuard<'_, HashMap<String, Arc<Slot>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: &str) -> Arc<Slot> {
        let mut slots = self.slots();
        if let Some(slot) = slots.get(key) {
            return Arc::clone(slot);
        }
        let before = slots.len();
        slots.retain(|_, slot| !evictable(slot, self.config.eviction_age));
        let evicted = before.saturating_sub(slots.len());
        if evicted > 0 {
            debug!("evicted {evicted} idle traffic cache entries");
        }
        Arc::clone(slots.entry(key.to_owned()).or_default())
    }

    async fn fetch_once(&self, key: &str) -> Result<TrafficData, TrafficError> {
        let timeout = self.config.fetch_timeout;
        tokio::time::timeout(timeout, self.provider.fetch_traffic(key))
            .await
            .unwrap_or_else(|_| {
                Err(TrafficError::Timeout {
                    url: key.to_owned(),
                    timeout_secs: timeout.as_secs(),
                })
            })
    }

    async fn fetch_with_retry(&self, key: &str) -> Result<TrafficData, TrafficFetchError> {
        let mut attempts: u32 = 0;
        loop {
            let retries_used = attempts;
            attempts += 1;
            let last_error = match self.fetch_once(key).await {
                Ok(data) => return Ok(data),
                Err(TrafficError::EmptyKey) => TrafficError::EmptyKey,
                Err(err) if retries_used < self.config.max_retries => {
                    let delay = self
                        .config
                        .retry_delay(usize::try_from(retries_used).unwrap_or(usize::MAX));
                    debug!(
                        "traffic attempt {attempts} for '{key}' failed, retrying in {}ms: {err}",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(err) => err,
            };
            let err = TrafficFetchError {
                key: key.to_owned(),
                attempts,
                last_error,
            };
            warn!("{err}");
            return Err(err);
        }
    }
}

fn served(entry: &Entry, freshness: Freshness) -> CachedTraffic {
    CachedTraffic {
        data: Arc::clone(&entry.data),
        freshness,
        age: entry.fetched_at.elapsed(),
    }
}
