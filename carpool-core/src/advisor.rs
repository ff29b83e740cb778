//! Seam for the external analytical advisor.
//!
//! The advisor looks at aggregated history and proposes a re-weighting. Its
//! output is untrusted: callers validate the proposal before acting on it and
//! store the justification text verbatim.

use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{MetricWeights, PerformanceAnalysis, WeightVector};

/// Input handed to a [`WeightAdvisor`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct AdvisorRequest {
    /// Weights currently in force.
    pub current_weights: MetricWeights,
    /// Aggregated outcome history.
    pub aggregated_history: PerformanceAnalysis,
}

/// Raw proposal returned by a [`WeightAdvisor`].
///
/// `proposed_weights` is deliberately an unvalidated [`WeightVector`]; the
/// adjustment engine decides whether to accept it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct AdvisorProposal {
    /// Proposed weights.
    pub proposed_weights: WeightVector,
    /// Free-form explanation.
    pub justification: String,
    /// Self-reported confidence.
    pub confidence: f64,
}

/// Failures raised by a [`WeightAdvisor`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdvisorError {
    /// The advisor did not answer in time.
    #[error("advisor timed out after {timeout:?}")]
    Timeout {
        /// Deadline that elapsed.
        timeout: Duration,
    },
    /// The advisor could not be reached or returned a failure status.
    #[error("advisor unavailable: {message}")]
    Unavailable {
        /// Transport or status detail.
        message: String,
    },
    /// The advisor answered with something that is not a proposal.
    #[error("malformed advisor response: {message}")]
    MalformedResponse {
        /// Parse failure detail.
        message: String,
    },
}

/// Proposes new metric weights from aggregated history.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use carpool_core::{AdvisorError, AdvisorProposal, AdvisorRequest, WeightAdvisor};
///
/// struct Conservative;
///
/// #[async_trait]
/// impl WeightAdvisor for Conservative {
///     async fn propose(&self, request: &AdvisorRequest) -> Result<AdvisorProposal, AdvisorError> {
///         Ok(AdvisorProposal {
///             proposed_weights: request.current_weights.as_vector(),
///             justification: "keep current weights".into(),
///             confidence: 0.5,
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait WeightAdvisor: Send + Sync {
    /// Ask for a proposal. Implementations should return
    /// [`AdvisorError::Timeout`] rather than block indefinitely.
    async fn propose(&self, request: &AdvisorRequest) -> Result<AdvisorProposal, AdvisorError>;
}
