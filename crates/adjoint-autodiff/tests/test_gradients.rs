//! Integration tests for gradients of composite functions.
//!
//! Compares traced gradients against closed-form derivatives for the
//! reference functions, and checks the sum, product and chain rules.

use adjoint_autodiff::prelude::*;
use approx::assert_relative_eq;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `x^2`
fn square(x: &Tracked<f64>) -> Result<Tracked<f64>> {
    x.powi(2)
}

/// `x^3`
fn cube(x: &Tracked<f64>) -> Result<Tracked<f64>> {
    x.powi(3)
}

/// `exp(-2x) + 3 sin(3x)`
fn decaying_wave(x: &Tracked<f64>) -> Result<Tracked<f64>> {
    let decay = x.mul_scalar(-2.0)?.exp()?;
    let wave = x.mul_scalar(3.0)?.sin()?.mul_scalar(3.0)?;
    decay.add(&wave)
}

/// `2x^2 - 3x + 1`
fn polynomial_simple(x: &Tracked<f64>) -> Result<Tracked<f64>> {
    x.powi(2)?.mul_scalar(2.0)?.sub(&x.mul_scalar(3.0)?)?.add_scalar(1.0)
}

fn polynomial_simple_value(x: f64) -> f64 {
    2.0 * x * x - 3.0 * x + 1.0
}

fn polynomial_simple_derivative(x: f64) -> f64 {
    4.0 * x - 3.0
}

const POINTS: [f64; 7] = [-2.0, -1.3, -0.5, 0.1, 0.75, 1.0, 2.5];

#[test]
fn test_square_matches_closed_form() {
    init_logger();
    for x in POINTS {
        assert_relative_eq!(gradient(square, x).unwrap(), 2.0 * x, max_relative = 1e-6);
    }
}

#[test]
fn test_cube_matches_closed_form() {
    for x in POINTS {
        assert_relative_eq!(gradient(cube, x).unwrap(), 3.0 * x * x, max_relative = 1e-6);
    }
}

#[test]
fn test_decaying_wave_matches_closed_form() {
    for x in POINTS {
        let expected = -2.0 * (-2.0 * x).exp() + 9.0 * (3.0 * x).cos();
        assert_relative_eq!(gradient(decaying_wave, x).unwrap(), expected, max_relative = 1e-6);
    }
}

#[test]
fn test_sum_rule() {
    let sum = |x: &Tracked<f64>| decaying_wave(x)?.add(&cube(x)?);
    for x in POINTS {
        let expected = gradient(decaying_wave, x).unwrap() + gradient(cube, x).unwrap();
        assert_relative_eq!(gradient(sum, x).unwrap(), expected, max_relative = 1e-12);
    }
}

#[test]
fn test_product_rule() {
    let product = |x: &Tracked<f64>| square(x)?.mul(&x.sin()?);
    for x in POINTS {
        let expected = 2.0 * x * x.sin() + x * x * x.cos();
        assert_relative_eq!(gradient(product, x).unwrap(), expected, max_relative = 1e-12);
    }
}

#[test]
fn test_chain_rule_triple_composition() {
    let composed = |x: &Tracked<f64>| polynomial_simple(&polynomial_simple(&polynomial_simple(x)?)?);

    for x in [-0.4, 0.2, 0.9, 1.6] {
        let y1 = polynomial_simple_value(x);
        let y2 = polynomial_simple_value(y1);
        let expected = polynomial_simple_derivative(x)
            * polynomial_simple_derivative(y1)
            * polynomial_simple_derivative(y2);

        let (value, grad) = value_and_gradient(composed, x).unwrap();
        assert_relative_eq!(value, polynomial_simple_value(y2), max_relative = 1e-12);
        assert_relative_eq!(grad, expected, max_relative = 1e-9);
    }
}

#[test]
fn test_quotient_and_log() {
    // ln(x) / x has derivative (1 - ln x) / x^2
    let f = |x: &Tracked<f64>| x.ln()?.div(x);
    for x in [0.2_f64, 1.0, 2.0, 7.5] {
        let expected = (1.0 - x.ln()) / (x * x);
        assert_relative_eq!(gradient(f, x).unwrap(), expected, max_relative = 1e-9);
    }
}

#[test]
fn test_reciprocal_at_zero_is_domain_error() {
    let f = |x: &Tracked<f64>| x.recip_scaled(1.0);
    let result = gradient(f, 0.0);
    assert!(matches!(result, Err(AutodiffError::Domain { .. })), "got {:?}", result);

    // Same through the primitive division of two tracked values
    let g = |x: &Tracked<f64>| x.constant(1.0)?.div(x);
    assert!(matches!(gradient(g, 0.0), Err(AutodiffError::Domain { .. })));
}

#[test]
fn test_reciprocal_near_zero_never_returns_non_finite_gradient() {
    // The forward value 1e170 is finite, the derivative -1e340 is not
    let f = |x: &Tracked<f64>| x.recip_scaled(1.0);
    let result = gradient(f, 1e-170);
    assert!(matches!(result, Err(AutodiffError::Domain { .. })), "got {:?}", result);

    // A zero upstream adjoint must not hide the overflow as NaN
    let g = |x: &Tracked<f64>| x.recip_scaled(1.0)?.mul_scalar(0.0);
    let result = gradient(g, 1e-170);
    assert!(matches!(result, Err(AutodiffError::Domain { .. })), "got {:?}", result);

    // Batched evaluation isolates the failing element
    let batch = batch_gradient(f, &[1e-170, 2.0]);
    assert!(matches!(batch.get(0), Some(Err(AutodiffError::Domain { .. }))));
    assert_eq!(batch.get(1), Some(&Ok(-0.25)));
}

#[test]
fn test_non_finite_input_is_domain_error() {
    for x in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert!(matches!(
            evaluate(|x: &Tracked<f64>| Ok(x.clone()), x),
            Err(AutodiffError::Domain { .. })
        ));
        assert!(matches!(
            gradient(|x: &Tracked<f64>| x.sin(), x),
            Err(AutodiffError::Domain { .. })
        ));
    }
}

#[test]
fn test_log_of_non_positive_is_domain_error() {
    for x in [0.0, -1.0] {
        assert!(matches!(
            gradient(|x: &Tracked<f64>| x.ln(), x),
            Err(AutodiffError::Domain { .. })
        ));
    }
}

#[test]
fn test_gradient_is_idempotent() {
    for x in POINTS {
        let first = gradient(decaying_wave, x).unwrap();
        let second = gradient(decaying_wave, x).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }
}

#[test]
fn test_evaluate_matches_traced_value() {
    for x in POINTS {
        let (value, _) = value_and_gradient(decaying_wave, x).unwrap();
        assert_eq!(evaluate(decaying_wave, x).unwrap().to_bits(), value.to_bits());
    }
}

#[test]
fn test_single_precision() {
    let f = |x: &Tracked<f32>| x.powi(2)?.add(&x.sin()?);
    let g = gradient(f, 0.5_f32).unwrap();
    assert_relative_eq!(g, 1.0 + 0.5_f32.cos(), max_relative = 1e-5);
}

#[test]
fn test_data_dependent_branch_records_taken_path() {
    // Branching on the concrete value only records the branch taken
    let relu = |x: &Tracked<f64>| {
        if x.value() > 0.0 {
            Ok(x.clone())
        } else {
            x.mul_scalar(0.0)
        }
    };
    assert_eq!(gradient(relu, 2.0).unwrap(), 1.0);
    assert_eq!(gradient(relu, -2.0).unwrap(), 0.0);
}
