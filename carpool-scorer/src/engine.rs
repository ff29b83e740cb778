//! Ranking of candidate routes.

use std::cmp::Ordering;

use carpool_core::{CandidateRoute, LiveWeights, MetricWeights, ScoredRoute, normalise, score};
use log::debug;

use crate::{ReliabilityModel, TrafficContext};

/// Ranks candidate routes against the live weights.
///
/// The weights are snapshotted once per call so every candidate in a ranking
/// is scored with the same vector. Ranking has no side effects.
///
/// # Examples
///
/// ```
/// use carpool_core::LiveWeights;
/// use carpool_scorer::ScoringEngine;
///
/// let engine = ScoringEngine::new(LiveWeights::default());
/// assert!(engine.rank(&[]).is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    weights: LiveWeights,
    reliability: ReliabilityModel,
}

impl ScoringEngine {
    /// Rank with `weights` and the default reliability model.
    #[must_use]
    pub fn new(weights: LiveWeights) -> Self {
        Self::with_reliability(weights, ReliabilityModel::default())
    }

    /// Rank with `weights` and a custom reliability model.
    #[must_use]
    pub const fn with_reliability(weights: LiveWeights, reliability: ReliabilityModel) -> Self {
        Self {
            weights,
            reliability,
        }
    }

    /// Handle on the live weights this engine reads.
    #[must_use]
    pub const fn weights(&self) -> &LiveWeights {
        &self.weights
    }

    /// Rank `candidates` without traffic adjustments.
    #[must_use]
    pub fn rank(&self, candidates: &[CandidateRoute]) -> Vec<ScoredRoute> {
        self.rank_with_traffic(candidates, TrafficContext::Ignored)
    }

    /// Rank `candidates`, estimating reliability from `traffic`.
    #[must_use]
    pub fn rank_with_traffic(
        &self,
        candidates: &[CandidateRoute],
        traffic: TrafficContext<'_>,
    ) -> Vec<ScoredRoute> {
        let weights = self.weights.snapshot();
        rank_routes(candidates, &weights, &self.reliability, traffic)
    }
}

/// Rank `candidates` with an explicit weight vector.
///
/// Routes are ordered by descending score, then ascending time, then
/// ascending distance. Remaining ties keep their input order.
#[must_use]
pub fn rank_routes(
    candidates: &[CandidateRoute],
    weights: &MetricWeights,
    reliability: &ReliabilityModel,
    traffic: TrafficContext<'_>,
) -> Vec<ScoredRoute> {
    let metrics: Vec<_> = candidates
        .iter()
        .map(|candidate| {
            let mut estimated = candidate.metrics;
            estimated.reliability = reliability.estimate(&estimated, &candidate.route, traffic);
            estimated
        })
        .collect();
    let normalised = normalise(&metrics);

    let mut ranked: Vec<_> = candidates
        .iter()
        .zip(metrics)
        .zip(normalised)
        .map(|((candidate, estimated), normalized_metrics)| ScoredRoute {
            route: candidate.route.clone(),
            metrics: estimated,
            score: score(&normalized_metrics, weights),
            normalized_metrics,
        })
        .collect();
    ranked.sort_by(compare_ranked);

    if let Some(best) = ranked.first() {
        debug!(
            "ranked {} candidates; best {} scored {:.3}",
            ranked.len(),
            best.route.id,
            best.score
        );
    }
    ranked
}

fn compare_ranked(a: &ScoredRoute, b: &ScoredRoute) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.metrics.time_minutes.total_cmp(&b.metrics.time_minutes))
        .then_with(|| a.metrics.distance_km.total_cmp(&b.metrics.distance_km))
}
