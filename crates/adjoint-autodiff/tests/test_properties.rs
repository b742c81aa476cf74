//! Property tests comparing traced gradients with finite differences.

use adjoint_autodiff::prelude::*;
use adjoint_core::numerical::try_central_difference;
use proptest::prelude::*;

/// Checks `gradient(f, x)` against a central difference of `evaluate(f, .)`.
fn agrees_with_reference<F>(f: F, x: f64) -> std::result::Result<(), TestCaseError>
where
    F: Fn(&Tracked<f64>) -> Result<Tracked<f64>> + Copy,
{
    let config = FiniteDifferenceConfig {
        step: 1e-5,
        tolerance: 1e-5,
    };
    let analytic = gradient(f, x).map_err(|e| TestCaseError::fail(e.to_string()))?;
    let numerical = try_central_difference(|x| evaluate(f, x), x, &config)
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
    let error = relative_error(analytic, numerical);
    prop_assert!(
        error <= config.tolerance,
        "x = {}, analytic = {}, numerical = {}, error = {}",
        x,
        analytic,
        numerical,
        error
    );
    Ok(())
}

proptest! {
    #[test]
    fn prop_sin_cos(x in -10.0..10.0_f64) {
        agrees_with_reference(|x| x.sin(), x)?;
        agrees_with_reference(|x| x.cos(), x)?;
    }

    #[test]
    fn prop_exp(x in -5.0..5.0_f64) {
        agrees_with_reference(|x| x.exp(), x)?;
    }

    #[test]
    fn prop_log(x in 0.1..50.0_f64) {
        agrees_with_reference(|x| x.ln(), x)?;
    }

    #[test]
    fn prop_abs_away_from_zero(x in prop_oneof![-10.0..-0.01_f64, 0.01..10.0_f64]) {
        agrees_with_reference(|x| x.abs(), x)?;
    }

    #[test]
    fn prop_pow(x in 0.1..5.0_f64, n in -3.0..3.0_f64) {
        let f = move |t: &Tracked<f64>| t.powf(n);
        agrees_with_reference(f, x)?;
    }

    #[test]
    fn prop_div(x in prop_oneof![-5.0..-0.2_f64, 0.2..5.0_f64]) {
        agrees_with_reference(|x| x.sin()?.add_scalar(2.0)?.div(x), x)?;
    }

    #[test]
    fn prop_sub_neg(x in -5.0..5.0_f64) {
        agrees_with_reference(|x| x.neg()?.sub(&x.powi(2)?), x)?;
    }

    #[test]
    fn prop_sum_rule(x in -3.0..3.0_f64) {
        let g = |x: &Tracked<f64>| x.sin();
        let h = |x: &Tracked<f64>| x.powi(3);
        let sum = move |x: &Tracked<f64>| g(x)?.add(&h(x)?);

        let expected = gradient(g, x).unwrap() + gradient(h, x).unwrap();
        let actual = gradient(sum, x).unwrap();
        prop_assert!(relative_error(actual, expected) < 1e-12);
    }

    #[test]
    fn prop_batch_matches_elementwise(xs in prop::collection::vec(-4.0..4.0_f64, 0..64)) {
        let f = |x: &Tracked<f64>| x.exp()?.mul(&x.cos()?);
        let batch = batch_gradient(f, &xs).into_values().unwrap();
        let elementwise: Vec<f64> = xs.iter().map(|&x| gradient(f, x).unwrap()).collect();
        prop_assert_eq!(batch, elementwise);
    }
}
