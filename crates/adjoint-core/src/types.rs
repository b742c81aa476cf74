//! Scalar trait and numerical constants.

use num_traits::Float;
use std::fmt::{Debug, Display};

/// Trait for scalar types the engine can trace (f32 or f64).
///
/// Combines the numeric traits needed by the primitive rules with the
/// thread-safety bounds required by batched evaluation.
pub trait Scalar: Float + Display + Debug + Default + Send + Sync + 'static {
    /// Step used for central finite differences.
    const FD_STEP: Self;

    /// Default relative tolerance when comparing derivatives.
    const DEFAULT_TOLERANCE: Self;

    /// Convert from an f64 literal.
    fn of(v: f64) -> Self;

    /// Convert to f64 for error reporting and logging.
    fn as_f64(self) -> f64;

    /// Whether the value is an exact integer.
    fn is_integer(self) -> bool {
        self.fract() == Self::zero()
    }
}

impl Scalar for f32 {
    const FD_STEP: Self = 1e-3;
    const DEFAULT_TOLERANCE: Self = 1e-3;

    fn of(v: f64) -> Self {
        v as f32
    }

    fn as_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Scalar for f64 {
    const FD_STEP: Self = 1e-6;
    const DEFAULT_TOLERANCE: Self = 1e-6;

    fn of(v: f64) -> Self {
        v
    }

    fn as_f64(self) -> f64 {
        self
    }
}
