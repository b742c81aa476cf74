//! Core types for the adjoint automatic differentiation engine.
//!
//! This crate holds what the engine and its callers share: the error
//! taxonomy, the scalar trait, engine configuration and the
//! finite-difference reference used to validate derivatives.
//!
//! # Modules
//!
//! - [`config`]: Engine configuration and derivative conventions
//! - [`error`]: Error types for tracing and differentiation
//! - [`numerical`]: Central finite differences for comparison
//! - [`types`]: Scalar trait and constants

pub mod config;
pub mod error;
pub mod numerical;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::{default_config, AbsAtZero, Disconnected, EngineConfig, EngineConfigBuilder};
pub use error::{AutodiffError, Result};
pub use types::Scalar;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{
        default_config, AbsAtZero, Disconnected, EngineConfig, EngineConfigBuilder,
    };
    pub use crate::error::{AutodiffError, Result};
    pub use crate::numerical::{
        central_difference, check_derivative, relative_error, try_central_difference,
        DerivativeCheck, FiniteDifferenceConfig,
    };
    pub use crate::types::Scalar;
}
