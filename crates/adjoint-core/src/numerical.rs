//! Finite-difference reference derivatives.
//!
//! These are the "numerical" counterpart to automatic differentiation and
//! serve as the comparison baseline in tests, benchmarks and demos. They
//! are never used by the engine itself.

use crate::{error::Result, types::Scalar};

/// Configuration for finite-difference checks.
#[derive(Debug, Clone)]
pub struct FiniteDifferenceConfig<T> {
    /// Step size for central differences
    pub step: T,
    /// Relative tolerance for derivative comparisons
    pub tolerance: T,
}

impl<T: Scalar> Default for FiniteDifferenceConfig<T> {
    fn default() -> Self {
        Self {
            step: T::FD_STEP,
            tolerance: T::DEFAULT_TOLERANCE,
        }
    }
}

/// Result of comparing an analytic derivative against finite differences.
#[derive(Debug, Clone, Copy)]
pub struct DerivativeCheck<T> {
    /// Derivative under test
    pub analytic: T,
    /// Central-difference estimate
    pub numerical: T,
    /// Relative error between the two
    pub relative_error: T,
    /// Whether the relative error is within tolerance
    pub passed: bool,
}

/// Central-difference estimate of `f'(x)`.
///
/// Computes `(f(x + h) - f(x - h)) / 2h` with `h` from the configuration.
pub fn central_difference<T, F>(f: F, x: T, config: &FiniteDifferenceConfig<T>) -> T
where
    T: Scalar,
    F: Fn(T) -> T,
{
    let h = config.step;
    (f(x + h) - f(x - h)) / (T::of(2.0) * h)
}

/// Central-difference estimate for a fallible function.
pub fn try_central_difference<T, F>(f: F, x: T, config: &FiniteDifferenceConfig<T>) -> Result<T>
where
    T: Scalar,
    F: Fn(T) -> Result<T>,
{
    let h = config.step;
    let plus = f(x + h)?;
    let minus = f(x - h)?;
    Ok((plus - minus) / (T::of(2.0) * h))
}

/// Relative error `|a - b| / max(|a|, |b|, 1)`.
///
/// The floor of 1 makes the measure absolute near zero, where a relative
/// error would blow up.
pub fn relative_error<T: Scalar>(a: T, b: T) -> T {
    let denom = a.abs().max(b.abs()).max(T::one());
    (a - b).abs() / denom
}

/// Compare an analytic derivative of `f` at `x` against finite differences.
pub fn check_derivative<T, F>(
    f: F,
    x: T,
    analytic: T,
    config: &FiniteDifferenceConfig<T>,
) -> Result<DerivativeCheck<T>>
where
    T: Scalar,
    F: Fn(T) -> Result<T>,
{
    let numerical = try_central_difference(f, x, config)?;
    let relative_error = relative_error(analytic, numerical);
    Ok(DerivativeCheck {
        analytic,
        numerical,
        relative_error,
        passed: relative_error <= config.tolerance,
    })
}
