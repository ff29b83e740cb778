//! Process-wide handle on the live scoring weights.

use std::sync::Arc;

use arc_swap::ArcSwap;
use log::{info, warn};

use crate::{MetricWeights, PerformanceStore};

/// Shared, atomically swappable [`MetricWeights`].
///
/// Reads are wait-free. Cloning the handle shares the same underlying value,
/// so the scoring engine and the adjustment engine can each hold one.
///
/// # Examples
///
/// ```
/// use carpool_core::{LiveWeights, MetricWeights};
///
/// # fn main() -> Result<(), carpool_core::WeightsError> {
/// let live = LiveWeights::default();
/// let snapshot = live.snapshot();
/// live.replace(MetricWeights::new(0.5, 0.25, 0.25)?);
/// assert_eq!(snapshot, MetricWeights::default());
/// assert_eq!(live.snapshot().time(), 0.5);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LiveWeights {
    inner: Arc<ArcSwap<MetricWeights>>,
}

impl LiveWeights {
    /// Start with `initial` as the live value.
    #[must_use]
    pub fn new(initial: MetricWeights) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(initial)),
        }
    }

    /// Copy of the weights currently in force.
    #[must_use]
    pub fn snapshot(&self) -> MetricWeights {
        **self.inner.load()
    }

    /// Swap in `weights`, returning the value it replaced.
    pub fn replace(&self, weights: MetricWeights) -> MetricWeights {
        *self.inner.swap(Arc::new(weights))
    }

    /// Rebuild the live value from the most recent audit record.
    ///
    /// Falls back to `default` when the store holds no adjustments or cannot
    /// be read.
    pub fn restore(store: &dyn PerformanceStore, default: MetricWeights) -> Self {
        match store.latest_adjustment() {
            Ok(Some(latest)) => {
                info!(
                    "restored weights from adjustment at {}",
                    latest.timestamp.to_rfc3339()
                );
                Self::new(latest.applied_weights)
            }
            Ok(None) => Self::new(default),
            Err(err) => {
                warn!("could not read latest adjustment, using default weights: {err}");
                Self::new(default)
            }
        }
    }
}

impl Default for LiveWeights {
    fn default() -> Self {
        Self::new(MetricWeights::default())
    }
}
