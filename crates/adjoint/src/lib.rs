//! Minimal reverse-mode automatic differentiation for scalar functions.
//!
//! `adjoint` re-exports the workspace crates behind a single dependency:
//!
//! - [`adjoint_core`]: errors, the scalar trait, configuration and finite differences
//! - [`adjoint_autodiff`]: tracing, primitive rules, backward pass and batching
//!
//! # Example
//!
//! ```
//! use adjoint::prelude::*;
//!
//! let f = |x: &Tracked<f64>| x.powi(2);
//! let grads = batch_gradient(f, &[-2.0, -1.0, 0.5, 1.0, 2.0])
//!     .into_values()
//!     .unwrap();
//! assert_eq!(grads, vec![-4.0, -2.0, 1.0, 2.0, 4.0]);
//! ```

pub use adjoint_autodiff;
pub use adjoint_core;

pub use adjoint_autodiff::{
    batch_evaluate, batch_gradient, evaluate, gradient, value_and_gradient, BatchResult, Engine,
    Primitive, Trace, Tracked,
};
pub use adjoint_core::{AbsAtZero, AutodiffError, Disconnected, EngineConfig, Result, Scalar};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use adjoint_autodiff::prelude::*;
}
