//! Test utilities for traffic and advisor consumers.
//!
//! These doubles return scripted responses without making HTTP requests.

use std::{
    collections::VecDeque,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use carpool_core::{
    AdvisorError, AdvisorProposal, AdvisorRequest, CongestionLevel, Coordinate, RoadSegment,
    TrafficData, TrafficError, TrafficProvider, WeightAdvisor, WeightVector,
};
use chrono::Utc;

/// Stub `TrafficProvider` that replays a script.
///
/// Each call pops the next scripted response; once one remains it is
/// repeated forever.
///
/// # Example
///
/// ```
/// use carpool_core::TrafficProvider;
/// use carpool_data::test_support::{StubTrafficProvider, sample_traffic};
///
/// let provider = StubTrafficProvider::returning(sample_traffic("stub"));
/// let runtime = tokio::runtime::Builder::new_current_thread()
///     .enable_time()
///     .build()
///     .expect("runtime");
/// let data = runtime.block_on(provider.fetch_traffic("downtown")).expect("traffic");
/// assert_eq!(data.source, "stub");
/// assert_eq!(provider.calls(), 1);
/// ```
#[derive(Debug)]
pub struct StubTrafficProvider {
    script: Mutex<VecDeque<Result<TrafficData, TrafficError>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubTrafficProvider {
    /// Replay `responses` in order.
    ///
    /// An empty script behaves like a provider that always fails with a
    /// network error.
    #[must_use]
    pub fn scripted(responses: impl IntoIterator<Item = Result<TrafficData, TrafficError>>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always return `data`.
    #[must_use]
    pub fn returning(data: TrafficData) -> Self {
        Self::scripted([Ok(data)])
    }

    /// Always fail with `error`.
    #[must_use]
    pub fn failing(error: TrafficError) -> Self {
        Self::scripted([Err(error)])
    }

    /// Sleep for `delay` before answering each call.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn script(&self) -> MutexGuard<'_, VecDeque<Result<TrafficData, TrafficError>>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_response(&self) -> Result<TrafficData, TrafficError> {
        let mut script = self.script();
        if script.len() > 1
            && let Some(response) = script.pop_front()
        {
            return response;
        }
        script.front().cloned().unwrap_or_else(|| {
            Err(TrafficError::NetworkError {
                url: "stub://traffic".to_owned(),
                message: "no scripted response".to_owned(),
            })
        })
    }
}

#[async_trait]
impl TrafficProvider for StubTrafficProvider {
    async fn fetch_traffic(&self, key: &str) -> Result<TrafficData, TrafficError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if key.is_empty() {
            return Err(TrafficError::EmptyKey);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_response()
    }
}

/// Build a one-segment snapshot tagged with `source`.
///
/// The segment is `seg-1`, moderately congested and incident free.
#[must_use]
pub fn sample_traffic(source: &str) -> TrafficData {
    TrafficData {
        road_segments: vec![RoadSegment {
            id: "seg-1".to_owned(),
            coordinates: vec![Coordinate {
                lat: 51.5,
                lng: -0.12,
            }],
            speed_kmh: 35.0,
            congestion_level: CongestionLevel::Medium,
            incidents: Vec::new(),
        }],
        timestamp: Utc::now(),
        source: source.to_owned(),
    }
}

/// Stub `WeightAdvisor` returning a fixed answer.
#[derive(Debug)]
pub struct StubAdvisor {
    response: Result<AdvisorProposal, AdvisorError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_request: Mutex<Option<AdvisorRequest>>,
}

impl StubAdvisor {
    /// Propose `weights` with the given justification and confidence.
    #[must_use]
    pub fn proposing(weights: WeightVector, justification: &str, confidence: f64) -> Self {
        Self::answering(Ok(AdvisorProposal {
            proposed_weights: weights,
            justification: justification.to_owned(),
            confidence,
        }))
    }

    /// Fail every call with `error`.
    #[must_use]
    pub fn failing(error: AdvisorError) -> Self {
        Self::answering(Err(error))
    }

    fn answering(response: Result<AdvisorProposal, AdvisorError>) -> Self {
        Self {
            response,
            delay: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Sleep for `delay` before answering each call.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most recent request received.
    #[must_use]
    pub fn last_request(&self) -> Option<AdvisorRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl WeightAdvisor for StubAdvisor {
    async fn propose(&self, request: &AdvisorRequest) -> Result<AdvisorProposal, AdvisorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.clone()
    }
}
