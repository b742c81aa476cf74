//! Reverse-mode automatic differentiation of scalar functions.
//!
//! This crate provides a minimal autodiff engine: a function is executed
//! once on tracked values, every primitive it applies is recorded on a
//! trace, and a single backward sweep over that trace yields the
//! derivative. Batched evaluation runs independent traces per element on
//! worker threads.
//!
//! # Architecture
//!
//! The engine is built around four components:
//!
//! 1. **Trace**: Records primitive applications into an append-only arena
//! 2. **Operations**: The closed set of primitives with their derivative rules
//! 3. **Backward**: Propagates adjoints in reverse creation order
//! 4. **Batch**: Index-aligned, data-parallel map over many inputs
//!
//! # Example
//!
//! ```
//! use adjoint_autodiff::prelude::*;
//!
//! // f(x) = exp(-2x) + 3 sin(3x)
//! let f = |x: &Tracked<f64>| {
//!     let decay = x.mul_scalar(-2.0)?.exp()?;
//!     let wave = x.mul_scalar(3.0)?.sin()?.mul_scalar(3.0)?;
//!     decay.add(&wave)
//! };
//!
//! let g = gradient(f, 0.0).unwrap();
//! assert!((g - 7.0).abs() < 1e-12);
//! ```

pub mod backward;
pub mod batch;
pub mod engine;
pub mod ops;
pub mod trace;

// Re-export key types
pub use backward::{backward, AdjointMap};
pub use batch::BatchResult;
pub use engine::{
    batch_evaluate, batch_gradient, evaluate, gradient, value_and_gradient, Engine,
};
pub use ops::Primitive;
pub use trace::{Node, NodeId, NodeOp, Tape, Trace, Tracked};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::backward::{backward, AdjointMap};
    pub use crate::batch::BatchResult;
    pub use crate::engine::{
        batch_evaluate, batch_gradient, evaluate, gradient, value_and_gradient, Engine,
    };
    pub use crate::ops::Primitive;
    pub use crate::trace::{NodeId, Trace, Tracked};
    pub use adjoint_core::prelude::*;
}
