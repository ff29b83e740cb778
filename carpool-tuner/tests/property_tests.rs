//! Property-based tests for proposal clamping and blending.
//!
//! # Invariants tested
//!
//! - **Unit sum:** every applied vector sums to one within tolerance.
//! - **Unit range:** every applied component lies in `[0, 1]`.
//! - **Bounded clamp:** before renormalising, no axis moves further than
//!   `max_change` from the previous weights.
//! - **Rejection:** vectors that do not sum to one are never accepted.

use carpool_core::{MetricWeights, WEIGHT_SUM_TOLERANCE, WeightVector};
use carpool_tuner::{clamp_axes, plan_adjustment};
use proptest::prelude::*;

fn weights_strategy() -> impl Strategy<Value = MetricWeights> {
    (0.0_f64..1.0, 0.0_f64..1.0, 0.01_f64..1.0).prop_map(|(time, distance, reliability)| {
        MetricWeights::normalised(WeightVector::new(time, distance, reliability))
            .expect("strategy yields a positive sum")
    })
}

fn assert_valid(weights: &MetricWeights) -> Result<(), TestCaseError> {
    let vector = weights.as_vector();
    prop_assert!((vector.sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
    for component in [vector.time, vector.distance, vector.reliability] {
        prop_assert!((0.0..=1.0).contains(&component), "component {component}");
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn applied_weights_are_valid(
        previous in weights_strategy(),
        proposed in weights_strategy(),
        max_change in 0.0_f64..=1.0,
        blend in 0.0_f64..=1.0,
    ) {
        let plan = plan_adjustment(
            &previous,
            proposed.as_vector(),
            WEIGHT_SUM_TOLERANCE,
            max_change,
            blend,
        )
        .expect("valid proposal");
        assert_valid(&plan.clamped)?;
        assert_valid(&plan.applied)?;
    }

    #[test]
    fn clamping_bounds_each_axis(
        previous in weights_strategy(),
        proposed in weights_strategy(),
        max_change in 0.0_f64..=0.5,
    ) {
        let clamped = clamp_axes(&previous, &proposed, max_change);
        let before = previous.as_vector();
        for (from, to) in [
            (before.time, clamped.time),
            (before.distance, clamped.distance),
            (before.reliability, clamped.reliability),
        ] {
            prop_assert!((to - from).abs() <= max_change + 1e-12);
        }
    }

    #[test]
    fn off_sum_proposals_are_rejected(
        previous in weights_strategy(),
        scale in prop_oneof![0.0_f64..0.9, 1.1_f64..3.0],
        proposed in weights_strategy(),
    ) {
        let vector = proposed.as_vector();
        let off = WeightVector::new(
            vector.time * scale,
            vector.distance * scale,
            vector.reliability * scale,
        );
        let result = plan_adjustment(&previous, off, WEIGHT_SUM_TOLERANCE, 0.15, 0.3);
        prop_assert!(result.is_err());
    }
}

#[test]
fn large_swing_is_clamped_and_renormalised() {
    let previous = MetricWeights::default();
    let proposed = WeightVector::new(0.9, 0.05, 0.05);

    let plan = plan_adjustment(&previous, proposed, WEIGHT_SUM_TOLERANCE, 0.15, 0.3)
        .expect("valid proposal");
    let clamped = clamp_axes(&previous, &plan.proposed, 0.15);

    assert!((clamped.time - previous.time()).abs() <= 0.15 + 1e-12);
    assert!((clamped.distance - previous.distance()).abs() <= 0.15 + 1e-12);
    assert!((clamped.reliability - previous.reliability()).abs() <= 0.15 + 1e-12);
    assert!((plan.applied.as_vector().sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
}
