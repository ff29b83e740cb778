//! Route metrics, scoring weights and the normalisation maths that relates
//! them.
//!
//! Everything here is pure: no I/O, no clocks, no shared state. The scoring
//! engine calls [`normalise`] once per candidate set and then [`score`] once
//! per candidate.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance applied when checking that weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

/// Planned characteristics of one candidate route.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct RouteMetrics {
    /// Expected travel time in minutes.
    pub time_minutes: f64,
    /// Expected distance in kilometres.
    pub distance_km: f64,
    /// Reliability in `[0, 1]`; higher is more dependable.
    pub reliability: f64,
    /// Raw measurements the reliability was derived from.
    pub raw_metrics: RawMetrics,
}

/// Variance and sample size behind a [`RouteMetrics`] estimate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct RawMetrics {
    /// Variance of observed travel times.
    pub time_variance: f64,
    /// Variance of observed distances.
    pub distance_variance: f64,
    /// Number of measurements contributing to the estimate.
    pub measurement_count: u32,
}

impl RouteMetrics {
    /// Construct metrics with zeroed raw measurements.
    ///
    /// # Examples
    /// ```
    /// use carpool_core::RouteMetrics;
    ///
    /// let metrics = RouteMetrics::new(30.0, 15.0, 0.8);
    /// assert_eq!(metrics.raw_metrics.measurement_count, 0);
    /// ```
    #[must_use]
    pub fn new(time_minutes: f64, distance_km: f64, reliability: f64) -> Self {
        Self {
            time_minutes,
            distance_km,
            reliability,
            raw_metrics: RawMetrics::default(),
        }
    }

    /// Attach raw measurements.
    #[must_use]
    pub fn with_raw_metrics(mut self, raw_metrics: RawMetrics) -> Self {
        self.raw_metrics = raw_metrics;
        self
    }
}

/// An unvalidated weight triple.
///
/// This is the shape weights take on the wire and inside intermediate
/// arithmetic (clamping, blending). Convert into [`MetricWeights`] to enforce
/// the sum-to-one invariant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightVector {
    /// Weight on travel time.
    pub time: f64,
    /// Weight on distance.
    pub distance: f64,
    /// Weight on reliability.
    pub reliability: f64,
}

impl WeightVector {
    /// Construct a vector from its components.
    #[must_use]
    pub const fn new(time: f64, distance: f64, reliability: f64) -> Self {
        Self {
            time,
            distance,
            reliability,
        }
    }

    /// Sum of all components.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.time + self.distance + self.reliability
    }

    fn components(&self) -> [f64; 3] {
        [self.time, self.distance, self.reliability]
    }
}

/// Errors returned when a weight vector breaks the [`MetricWeights`]
/// invariants.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WeightsError {
    /// A component was NaN or infinite.
    #[error("weights must be finite")]
    NonFinite,
    /// A component was below zero.
    #[error("weight {value} is negative")]
    Negative {
        /// Offending component.
        value: f64,
    },
    /// A component exceeded one.
    #[error("weight {value} exceeds 1.0")]
    AboveOne {
        /// Offending component.
        value: f64,
    },
    /// The components did not sum to one within [`WEIGHT_SUM_TOLERANCE`].
    #[error("weights sum to {sum}, expected 1.0")]
    BadSum {
        /// Observed sum.
        sum: f64,
    },
    /// Normalisation was requested for an all-zero vector.
    #[error("cannot normalise a zero weight vector")]
    ZeroSum,
}

/// Scoring weights for time, distance and reliability.
///
/// Each component lies in `[0, 1]` and the three sum to one within
/// [`WEIGHT_SUM_TOLERANCE`]. The invariant is enforced on construction, so a
/// `MetricWeights` value is always usable for scoring.
///
/// # Examples
/// ```
/// use carpool_core::MetricWeights;
///
/// let weights = MetricWeights::new(0.5, 0.25, 0.25)?;
/// assert_eq!(weights.time(), 0.5);
/// assert!(MetricWeights::new(0.5, 0.5, 0.5).is_err());
/// # Ok::<(), carpool_core::WeightsError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "WeightVector", into = "WeightVector")
)]
pub struct MetricWeights {
    time: f64,
    distance: f64,
    reliability: f64,
}

impl MetricWeights {
    /// Validate and construct weights.
    pub fn new(time: f64, distance: f64, reliability: f64) -> Result<Self, WeightsError> {
        Self::validate(WeightVector::new(time, distance, reliability), WEIGHT_SUM_TOLERANCE)
    }

    /// Validate `vector` against a caller-supplied sum tolerance.
    pub fn validate(vector: WeightVector, tolerance: f64) -> Result<Self, WeightsError> {
        for value in vector.components() {
            if !value.is_finite() {
                return Err(WeightsError::NonFinite);
            }
            if value < 0.0 {
                return Err(WeightsError::Negative { value });
            }
            if value > 1.0 {
                return Err(WeightsError::AboveOne { value });
            }
        }
        let sum = vector.sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(WeightsError::BadSum { sum });
        }
        Ok(Self {
            time: vector.time,
            distance: vector.distance,
            reliability: vector.reliability,
        })
    }

    /// Rescale a non-negative vector so it sums to exactly one.
    ///
    /// # Examples
    /// ```
    /// use carpool_core::{MetricWeights, WeightVector};
    ///
    /// let weights = MetricWeights::normalised(WeightVector::new(2.0, 1.0, 1.0))?;
    /// assert_eq!(weights.time(), 0.5);
    /// # Ok::<(), carpool_core::WeightsError>(())
    /// ```
    pub fn normalised(vector: WeightVector) -> Result<Self, WeightsError> {
        for value in vector.components() {
            if !value.is_finite() {
                return Err(WeightsError::NonFinite);
            }
            if value < 0.0 {
                return Err(WeightsError::Negative { value });
            }
        }
        let sum = vector.sum();
        if sum <= 0.0 {
            return Err(WeightsError::ZeroSum);
        }
        let time = vector.time / sum;
        let distance = vector.distance / sum;
        // Derive the last axis from the other two so the sum is exact.
        let reliability = (1.0 - time - distance).max(0.0);
        Ok(Self {
            time,
            distance,
            reliability,
        })
    }

    /// Weight on travel time.
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Weight on distance.
    #[must_use]
    pub const fn distance(&self) -> f64 {
        self.distance
    }

    /// Weight on reliability.
    #[must_use]
    pub const fn reliability(&self) -> f64 {
        self.reliability
    }

    /// Return the raw components.
    #[must_use]
    pub const fn as_vector(&self) -> WeightVector {
        WeightVector::new(self.time, self.distance, self.reliability)
    }
}

impl Default for MetricWeights {
    /// Time 0.4, distance 0.3, reliability 0.3.
    fn default() -> Self {
        Self {
            time: 0.4,
            distance: 0.3,
            reliability: 0.3,
        }
    }
}

impl TryFrom<WeightVector> for MetricWeights {
    type Error = WeightsError;

    fn try_from(vector: WeightVector) -> Result<Self, Self::Error> {
        Self::validate(vector, WEIGHT_SUM_TOLERANCE)
    }
}

impl From<MetricWeights> for WeightVector {
    fn from(weights: MetricWeights) -> Self {
        weights.as_vector()
    }
}

/// Metrics rescaled onto `[0, 1]` relative to the candidate set.
///
/// For every axis, `1.0` is the best value in the set.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NormalizedMetrics {
    /// Normalised travel time (shorter is higher).
    pub time: f64,
    /// Normalised distance (shorter is higher).
    pub distance: f64,
    /// Reliability, used as-is.
    pub reliability: f64,
}

/// Normalise a candidate set axis by axis.
///
/// Time and distance are inverted min-max scaled so the shortest route gets
/// `1.0`. Reliability already lives on `[0, 1]` with higher being better and
/// is passed through (clamped). When every candidate shares a value on an
/// axis, that axis normalises to `1.0` for all of them.
///
/// # Examples
/// ```
/// use carpool_core::{RouteMetrics, normalise};
///
/// let normalised = normalise(&[
///     RouteMetrics::new(20.0, 10.0, 0.9),
///     RouteMetrics::new(40.0, 10.0, 0.5),
/// ]);
/// assert_eq!(normalised[0].time, 1.0);
/// assert_eq!(normalised[1].time, 0.0);
/// assert_eq!(normalised[1].distance, 1.0);
/// ```
#[must_use]
pub fn normalise(metrics: &[RouteMetrics]) -> Vec<NormalizedMetrics> {
    let time = AxisRange::over(metrics.iter().map(|m| m.time_minutes));
    let distance = AxisRange::over(metrics.iter().map(|m| m.distance_km));
    metrics
        .iter()
        .map(|m| NormalizedMetrics {
            time: time.inverted(m.time_minutes),
            distance: distance.inverted(m.distance_km),
            reliability: m.reliability.clamp(0.0, 1.0),
        })
        .collect()
}

/// Weighted sum of normalised metrics.
///
/// # Examples
/// ```
/// use carpool_core::{MetricWeights, NormalizedMetrics, score};
///
/// let normalised = NormalizedMetrics { time: 1.0, distance: 0.5, reliability: 0.0 };
/// let weights = MetricWeights::new(0.5, 0.5, 0.0)?;
/// assert_eq!(score(&normalised, &weights), 0.75);
/// # Ok::<(), carpool_core::WeightsError>(())
/// ```
#[must_use]
pub fn score(normalised: &NormalizedMetrics, weights: &MetricWeights) -> f64 {
    normalised.time * weights.time()
        + normalised.distance * weights.distance()
        + normalised.reliability * weights.reliability()
}

#[derive(Debug, Clone, Copy)]
struct AxisRange {
    min: f64,
    max: f64,
}

impl AxisRange {
    fn over(values: impl Iterator<Item = f64>) -> Self {
        values.fold(
            Self {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            },
            |range, value| Self {
                min: range.min.min(value),
                max: range.max.max(value),
            },
        )
    }

    fn inverted(self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 || !span.is_finite() {
            return 1.0;
        }
        (1.0 - (value - self.min) / span).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[rstest]
    fn default_weights_are_valid() {
        let weights = MetricWeights::default();
        assert!(MetricWeights::new(weights.time(), weights.distance(), weights.reliability()).is_ok());
    }

    #[rstest]
    #[case(0.4, 0.3, 0.3)]
    #[case(1.0, 0.0, 0.0)]
    #[case(0.3333, 0.3333, 0.3334)]
    #[case(0.4, 0.3, 0.3005)]
    fn accepts_weights_summing_to_one(#[case] t: f64, #[case] d: f64, #[case] r: f64) {
        assert!(MetricWeights::new(t, d, r).is_ok());
    }

    #[rstest]
    #[case(0.5, 0.5, 0.5, WeightsError::BadSum { sum: 1.5 })]
    #[case(-0.1, 0.6, 0.5, WeightsError::Negative { value: -0.1 })]
    #[case(1.2, -0.1, -0.1, WeightsError::AboveOne { value: 1.2 })]
    fn rejects_invalid_weights(
        #[case] t: f64,
        #[case] d: f64,
        #[case] r: f64,
        #[case] expected: WeightsError,
    ) {
        assert_eq!(MetricWeights::new(t, d, r), Err(expected));
    }

    #[rstest]
    fn rejects_nan_weights() {
        assert_eq!(
            MetricWeights::new(f64::NAN, 0.5, 0.5),
            Err(WeightsError::NonFinite)
        );
    }

    #[rstest]
    fn normalised_sums_to_exactly_one() {
        let weights =
            MetricWeights::normalised(WeightVector::new(0.55, 0.15, 0.15)).expect("normalise");
        assert_close(weights.as_vector().sum(), 1.0);
        assert_close(weights.time(), 0.55 / 0.85);
    }

    #[rstest]
    fn normalised_rejects_zero_vector() {
        assert_eq!(
            MetricWeights::normalised(WeightVector::new(0.0, 0.0, 0.0)),
            Err(WeightsError::ZeroSum)
        );
    }

    #[rstest]
    fn normalise_inverts_time_and_distance() {
        let normalised = normalise(&[
            RouteMetrics::new(10.0, 5.0, 0.2),
            RouteMetrics::new(20.0, 15.0, 0.6),
            RouteMetrics::new(30.0, 10.0, 1.0),
        ]);
        assert_close(normalised[0].time, 1.0);
        assert_close(normalised[1].time, 0.5);
        assert_close(normalised[2].time, 0.0);
        assert_close(normalised[0].distance, 1.0);
        assert_close(normalised[1].distance, 0.0);
        assert_close(normalised[2].distance, 0.5);
        assert_close(normalised[1].reliability, 0.6);
    }

    #[rstest]
    fn equal_axis_normalises_to_one() {
        let normalised = normalise(&[
            RouteMetrics::new(25.0, 12.0, 0.5),
            RouteMetrics::new(25.0, 12.0, 0.7),
        ]);
        assert!(normalised.iter().all(|n| n.time == 1.0 && n.distance == 1.0));
    }

    #[rstest]
    fn single_candidate_normalises_to_one() {
        let normalised = normalise(&[RouteMetrics::new(42.0, 21.0, 0.4)]);
        assert_eq!(normalised.len(), 1);
        assert_close(normalised[0].time, 1.0);
        assert_close(normalised[0].distance, 1.0);
        assert_close(normalised[0].reliability, 0.4);
    }

    #[rstest]
    fn score_is_weighted_sum() {
        let weights = MetricWeights::default();
        let value = score(
            &NormalizedMetrics {
                time: 1.0,
                distance: 0.0,
                reliability: 0.5,
            },
            &weights,
        );
        assert_close(value, 0.4 + 0.15);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn weights_deserialise_through_validation() {
        let valid: MetricWeights =
            serde_json::from_str(r#"{"time":0.5,"distance":0.3,"reliability":0.2}"#)
                .expect("valid weights");
        assert_close(valid.time(), 0.5);
        let invalid = serde_json::from_str::<MetricWeights>(
            r#"{"time":0.9,"distance":0.3,"reliability":0.2}"#,
        );
        assert!(invalid.is_err());
    }
}
