//! Error types for tracing and differentiating scalar functions.
//!
//! Every failure is deterministic for a given input, so none of these
//! errors is retried anywhere in the workspace. A failure aborts the single
//! computation it occurred in and is returned to the caller as a value.

use thiserror::Error;

/// Errors that can occur while tracing or differentiating a function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AutodiffError {
    /// The traced function used an operation the engine cannot record.
    ///
    /// Raised for names missing from the primitive registry, for operand
    /// counts that do not match a primitive's arity, and for operands that
    /// belong to a different trace.
    #[error("Unsupported operation `{op}`: {reason}")]
    UnsupportedOperation {
        /// Name of the offending operation
        op: String,
        /// Why the operation was rejected
        reason: String,
    },

    /// Forward evaluation hit a point outside the operation's domain.
    ///
    /// Division by zero, logarithm of a non-positive value and non-integer
    /// powers of negative numbers all land here instead of producing NaN.
    #[error("Domain error in `{op}`: {reason}")]
    Domain {
        /// Name of the operation
        op: String,
        /// Description of the invalid input
        reason: String,
    },

    /// The local derivative rule is undefined at the forward value.
    #[error("`{op}` is not differentiable at {at}")]
    NonDifferentiablePoint {
        /// Name of the operation
        op: String,
        /// Input value at which the derivative is undefined
        at: f64,
    },

    /// The requested input never reached the output.
    ///
    /// Only raised when the engine is configured to distinguish unused
    /// inputs from genuinely zero gradients.
    #[error("Input is disconnected from the output of the traced function")]
    DisconnectedInput,

    /// Invalid engine configuration.
    #[error("Invalid configuration for `{parameter}`: {reason}")]
    InvalidConfiguration {
        /// Name of the invalid parameter
        parameter: String,
        /// Description of the problem
        reason: String,
    },
}

impl AutodiffError {
    /// Create an UnsupportedOperation error.
    pub fn unsupported<S1, S2>(op: S1, reason: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self::UnsupportedOperation {
            op: op.into(),
            reason: reason.into(),
        }
    }

    /// Create a Domain error.
    pub fn domain<S1, S2>(op: S1, reason: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self::Domain {
            op: op.into(),
            reason: reason.into(),
        }
    }

    /// Create a NonDifferentiablePoint error.
    pub fn non_differentiable<S: Into<String>>(op: S, at: f64) -> Self {
        Self::NonDifferentiablePoint { op: op.into(), at }
    }

    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2>(parameter: S1, reason: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self::InvalidConfiguration {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for errors raised during forward evaluation.
    pub fn is_forward_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedOperation { .. } | Self::Domain { .. }
        )
    }
}

/// Result type for autodiff operations.
pub type Result<T> = std::result::Result<T, AutodiffError>;
