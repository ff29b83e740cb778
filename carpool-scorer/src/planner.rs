//! Planning requests that combine cached traffic with ranking.

use carpool_core::{CandidateRoute, ScoredRoute};
use carpool_data::traffic::{Freshness, TrafficCache};
use log::warn;
use serde::Serialize;

use crate::{ScoringEngine, TrafficContext};

/// Where the traffic used for a plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficStatus {
    /// A fresh snapshot, or one inside the refresh window.
    Live,
    /// The last good snapshot, served because refreshing failed.
    Stale,
    /// No snapshot; reliability fell back to defaults.
    Unavailable,
}

impl From<Freshness> for TrafficStatus {
    fn from(freshness: Freshness) -> Self {
        match freshness {
            Freshness::Fresh | Freshness::Refreshing => Self::Live,
            Freshness::Stale => Self::Stale,
        }
    }
}

/// Ranked routes for one planning request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlan {
    /// Candidates, best first.
    pub routes: Vec<ScoredRoute>,
    /// Provenance of the traffic snapshot.
    pub traffic: TrafficStatus,
}

impl RoutePlan {
    /// Highest-ranked route, if any candidates were offered.
    #[must_use]
    pub fn best(&self) -> Option<&ScoredRoute> {
        self.routes.first()
    }
}

/// Ranks candidates against the traffic for an area.
///
/// Traffic failures never fail a plan: the ranking proceeds with degraded
/// reliability and the plan reports [`TrafficStatus::Unavailable`].
#[derive(Debug, Clone)]
pub struct RoutePlanner {
    engine: ScoringEngine,
    cache: TrafficCache,
}

impl RoutePlanner {
    /// Combine `engine` with `cache`.
    #[must_use]
    pub const fn new(engine: ScoringEngine, cache: TrafficCache) -> Self {
        Self { engine, cache }
    }

    /// Engine used for ranking.
    #[must_use]
    pub const fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Rank `candidates` using traffic cached under `area`.
    pub async fn plan(&self, area: &str, candidates: &[CandidateRoute]) -> RoutePlan {
        match self.cache.get(area).await {
            Ok(cached) => RoutePlan {
                routes: self
                    .engine
                    .rank_with_traffic(candidates, TrafficContext::Known(&cached.data)),
                traffic: cached.freshness.into(),
            },
            Err(err) => {
                warn!("ranking {area} without traffic: {err}");
                RoutePlan {
                    routes: self
                        .engine
                        .rank_with_traffic(candidates, TrafficContext::Unavailable),
                    traffic: TrafficStatus::Unavailable,
                }
            }
        }
    }
}
