//! Validation, clamping and blending of proposed weights.
//!
//! A proposal passes through three stages before it can go live:
//!
//! 1. [`validate_proposal`] rejects anything that is not a valid weight
//!    vector within tolerance.
//! 2. [`clamp_axes`] limits each axis to `max_change` from the current value;
//!    the result is renormalised so it sums to one.
//! 3. [`blend`] moves the current weights part of the way towards the
//!    clamped proposal and renormalises once more.
//!
//! [`plan_adjustment`] runs all three.

use carpool_core::{MetricWeights, WeightVector, WeightsError};
use thiserror::Error;

/// A proposal or tuning parameter that cannot be applied.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ValidationError {
    /// The proposed vector is not a valid weight vector.
    #[error("proposed weights rejected: {source}")]
    Proposal {
        /// Broken invariant.
        #[source]
        source: WeightsError,
    },
    /// The per-cycle change cap is outside `[0, 1]`.
    #[error("max weight change must lie in [0, 1], got {value}")]
    MaxChange {
        /// Offending value.
        value: f64,
    },
    /// The blend factor is outside `[0, 1]`.
    #[error("blend factor must lie in [0, 1], got {value}")]
    BlendFactor {
        /// Offending value.
        value: f64,
    },
    /// Renormalising an intermediate vector failed.
    #[error("could not renormalise weights: {source}")]
    Renormalise {
        /// Underlying failure.
        #[source]
        source: WeightsError,
    },
}

/// The stages of one accepted proposal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightPlan {
    /// The proposal as received, validated but unclamped.
    pub proposed: MetricWeights,
    /// The proposal after clamping and renormalisation.
    pub clamped: MetricWeights,
    /// The weights to go live.
    pub applied: MetricWeights,
}

/// Accept `vector` only if it is a valid weight vector within `tolerance`.
///
/// # Errors
///
/// Returns [`ValidationError::Proposal`] for a negative, non-finite or
/// out-of-range component, or a sum outside `1 ± tolerance`.
pub fn validate_proposal(
    vector: WeightVector,
    tolerance: f64,
) -> Result<MetricWeights, ValidationError> {
    MetricWeights::validate(vector, tolerance).map_err(|source| ValidationError::Proposal { source })
}

/// Limit every axis of `proposed` to within `max_change` of `previous`.
///
/// The returned vector is not renormalised. A `max_change` outside
/// `[0, 1]` is treated as the nearest bound.
#[expect(clippy::float_arithmetic, reason = "bounds are offsets from previous")]
#[must_use]
pub fn clamp_axes(previous: &MetricWeights, proposed: &MetricWeights, max_change: f64) -> WeightVector {
    let limit = max_change.clamp(0.0, 1.0);
    let clamp = |from: f64, to: f64| {
        let low = (from - limit).max(0.0);
        let high = (from + limit).min(1.0);
        to.clamp(low, high)
    };
    WeightVector::new(
        clamp(previous.time(), proposed.time()),
        clamp(previous.distance(), proposed.distance()),
        clamp(previous.reliability(), proposed.reliability()),
    )
}

/// `previous * (1 - factor) + target * factor`, renormalised.
///
/// # Errors
///
/// Returns [`ValidationError::BlendFactor`] when `factor` is outside
/// `[0, 1]`.
#[expect(clippy::float_arithmetic, reason = "linear interpolation")]
pub fn blend(
    previous: &MetricWeights,
    target: &MetricWeights,
    factor: f64,
) -> Result<MetricWeights, ValidationError> {
    if !(0.0..=1.0).contains(&factor) {
        return Err(ValidationError::BlendFactor { value: factor });
    }
    let mix = |from: f64, to: f64| from * (1.0 - factor) + to * factor;
    renormalise(WeightVector::new(
        mix(previous.time(), target.time()),
        mix(previous.distance(), target.distance()),
        mix(previous.reliability(), target.reliability()),
    ))
}

/// Validate, clamp and blend `proposal` against `previous`.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the proposal is invalid or a tuning
/// parameter is out of range.
///
/// # Examples
///
/// ```
/// use carpool_core::{MetricWeights, WeightVector};
/// use carpool_tuner::plan_adjustment;
///
/// let plan = plan_adjustment(
///     &MetricWeights::default(),
///     WeightVector::new(0.9, 0.05, 0.05),
///     0.001,
///     0.15,
///     0.3,
/// )?;
/// assert!(plan.applied.time() > 0.4);
/// # Ok::<(), carpool_tuner::ValidationError>(())
/// ```
pub fn plan_adjustment(
    previous: &MetricWeights,
    proposal: WeightVector,
    tolerance: f64,
    max_change: f64,
    blend_factor: f64,
) -> Result<WeightPlan, ValidationError> {
    if !(0.0..=1.0).contains(&max_change) {
        return Err(ValidationError::MaxChange { value: max_change });
    }
    let proposed = validate_proposal(proposal, tolerance)?;
    let clamped = renormalise(clamp_axes(previous, &proposed, max_change))?;
    let applied = blend(previous, &clamped, blend_factor)?;
    Ok(WeightPlan {
        proposed,
        clamped,
        applied,
    })
}

fn renormalise(vector: WeightVector) -> Result<MetricWeights, ValidationError> {
    MetricWeights::normalised(vector).map_err(|source| ValidationError::Renormalise { source })
}
