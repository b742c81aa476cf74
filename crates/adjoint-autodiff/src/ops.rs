//! Primitive operations of the trace.
//!
//! The set of primitives is closed: every traced computation is built from
//! the variants of [`Primitive`]. Each variant knows how to evaluate itself
//! and how to produce its local derivative coefficients, one per input,
//! evaluated at the forward values.

use adjoint_core::{AbsAtZero, AutodiffError, EngineConfig, Result, Scalar};
use std::fmt;

/// Primitive operations that can be recorded on a trace.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Primitive {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
    /// `a^n` for a constant exponent `n`
    Pow {
        /// The constant exponent
        exponent: f64,
    },
    /// `e^a`
    Exp,
    /// `ln(a)`
    Log,
    /// `sin(a)`
    Sin,
    /// `cos(a)`
    Cos,
    /// `|a|`
    Abs,
    /// `-a`
    Neg,
}

impl Primitive {
    /// Names accepted by [`Primitive::from_name`].
    pub const NAMES: [&'static str; 10] = [
        "add", "sub", "mul", "div", "exp", "log", "sin", "cos", "abs", "neg",
    ];

    /// Look up a primitive by name.
    ///
    /// `pow` is not reachable by name since it carries a constant exponent;
    /// build it with `Primitive::Pow { exponent }` instead.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "add" => Ok(Self::Add),
            "sub" => Ok(Self::Sub),
            "mul" => Ok(Self::Mul),
            "div" => Ok(Self::Div),
            "exp" => Ok(Self::Exp),
            "log" => Ok(Self::Log),
            "sin" => Ok(Self::Sin),
            "cos" => Ok(Self::Cos),
            "abs" => Ok(Self::Abs),
            "neg" => Ok(Self::Neg),
            "pow" => Err(AutodiffError::unsupported(
                name,
                "requires a constant exponent, use `Primitive::Pow`",
            )),
            _ => Err(AutodiffError::unsupported(
                name,
                "not in the primitive registry",
            )),
        }
    }

    /// Returns the name of this operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Pow { .. } => "pow",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Abs => "abs",
            Self::Neg => "neg",
        }
    }

    /// Number of inputs this operation takes.
    pub fn arity(&self) -> usize {
        match self {
            Self::Add | Self::Sub | Self::Mul | Self::Div => 2,
            _ => 1,
        }
    }

    /// Fails unless exactly `arity()` inputs are given.
    pub fn check_arity(&self, got: usize) -> Result<()> {
        if got == self.arity() {
            Ok(())
        } else {
            Err(AutodiffError::unsupported(
                self.name(),
                format!("expected {} operand(s), got {}", self.arity(), got),
            ))
        }
    }

    /// Performs the forward computation.
    ///
    /// Points outside the domain, and results that overflow to a
    /// non-finite value, are reported as `Domain` errors instead of NaN.
    pub fn forward<T: Scalar>(&self, inputs: &[T]) -> Result<T> {
        self.check_arity(inputs.len())?;
        let a = inputs[0];
        let value = match *self {
            Self::Add => a + inputs[1],
            Self::Sub => a - inputs[1],
            Self::Mul => a * inputs[1],
            Self::Div => {
                let b = inputs[1];
                if b == T::zero() {
                    return Err(AutodiffError::domain(
                        self.name(),
                        format!("division of {} by zero", a),
                    ));
                }
                a / b
            }
            Self::Pow { exponent } => {
                let n = T::of(exponent);
                if a < T::zero() && !n.is_integer() {
                    return Err(AutodiffError::domain(
                        self.name(),
                        format!("negative base {} with non-integer exponent {}", a, exponent),
                    ));
                }
                if a == T::zero() && n < T::zero() {
                    return Err(AutodiffError::domain(
                        self.name(),
                        format!("zero base with negative exponent {}", exponent),
                    ));
                }
                a.powf(n)
            }
            Self::Exp => a.exp(),
            Self::Log => {
                if a <= T::zero() {
                    return Err(AutodiffError::domain(
                        self.name(),
                        format!("logarithm of non-positive value {}", a),
                    ));
                }
                a.ln()
            }
            Self::Sin => a.sin(),
            Self::Cos => a.cos(),
            Self::Abs => a.abs(),
            Self::Neg => -a,
        };

        if !value.is_finite() {
            return Err(AutodiffError::domain(
                self.name(),
                format!("non-finite result {} for inputs {:?}", value, inputs),
            ));
        }
        Ok(value)
    }

    /// Computes the partial derivative with respect to each input.
    ///
    /// # Arguments
    /// * `inputs` - The input values used in the forward pass
    /// * `output` - The output value from the forward pass
    /// * `config` - Conventions for points with an ambiguous derivative
    ///
    /// # Returns
    /// One coefficient per input, in input order
    pub fn local_gradients<T: Scalar>(
        &self,
        inputs: &[T],
        output: T,
        config: &EngineConfig,
    ) -> Result<Vec<T>> {
        self.check_arity(inputs.len())?;
        let a = inputs[0];
        let grads = match *self {
            Self::Add => vec![T::one(), T::one()],
            Self::Sub => vec![T::one(), -T::one()],
            Self::Mul => vec![inputs[1], a],
            Self::Div => {
                let b = inputs[1];
                vec![T::one() / b, -a / (b * b)]
            }
            Self::Pow { exponent } => {
                let n = T::of(exponent);
                if n == T::zero() {
                    vec![T::zero()]
                } else if a == T::zero() && n < T::one() {
                    // n * 0^(n-1) diverges for 0 < n < 1
                    return Err(AutodiffError::non_differentiable(self.name(), a.as_f64()));
                } else {
                    vec![n * a.powf(n - T::one())]
                }
            }
            // d/dx exp(x) = exp(x)
            Self::Exp => vec![output],
            Self::Log => vec![T::one() / a],
            Self::Sin => vec![a.cos()],
            Self::Cos => vec![-a.sin()],
            Self::Abs => {
                if a > T::zero() {
                    vec![T::one()]
                } else if a < T::zero() {
                    vec![-T::one()]
                } else {
                    match config.abs_at_zero {
                        AbsAtZero::Zero => vec![T::zero()],
                        AbsAtZero::Fail => {
                            return Err(AutodiffError::non_differentiable(
                                self.name(),
                                a.as_f64(),
                            ))
                        }
                    }
                }
            }
            Self::Neg => vec![-T::one()],
        };
        Ok(grads)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pow { exponent } => write!(f, "pow({})", exponent),
            other => f.write_str(other.name()),
        }
    }
}
