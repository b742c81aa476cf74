//! Entry points of the autodiff engine.
//!
//! An [`Engine`] pairs an [`EngineConfig`] with the operations exposed to
//! callers: pure evaluation, gradients, and their batched forms (see
//! [`crate::batch`]). The free functions in this module run on a shared
//! engine built from the process-wide default configuration.
//!
//! Functions to differentiate take a tracked input and return a tracked
//! output:
//!
//! ```
//! use adjoint_autodiff::engine;
//!
//! // f(x) = x^2 + 3x
//! let f = |x: &adjoint_autodiff::Tracked<f64>| x.powi(2)?.add(&x.mul_scalar(3.0)?);
//! assert_eq!(engine::gradient(f, 2.0).unwrap(), 7.0);
//! ```

use crate::backward::backward;
use crate::batch::BatchResult;
use crate::trace::{Trace, Tracked};
use adjoint_core::{default_config, AutodiffError, EngineConfig, Result, Scalar};
use once_cell::sync::Lazy;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

/// The autodiff engine.
///
/// Holds no state between calls apart from its configuration and an
/// optional worker pool: every evaluation builds and drops its own trace.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    pub(crate) pool: Option<Arc<ThreadPool>>,
}

impl Engine {
    /// Creates an engine, building a dedicated pool if `num_threads` is set.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let pool = match config.num_threads {
            Some(threads) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("adjoint-worker-{}", i))
                    .build()
                    .map_err(|e| AutodiffError::invalid_configuration("num_threads", e.to_string()))?;
                Some(Arc::new(pool))
            }
            None => None,
        };
        Ok(Self { config, pool })
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluates `f(x)` without recording a trace.
    pub fn evaluate<T, F>(&self, f: F, x: T) -> Result<T>
    where
        T: Scalar,
        F: Fn(&Tracked<T>) -> Result<Tracked<T>>,
    {
        let trace = Trace::no_grad();
        let input = trace.leaf(x)?;
        let output = f(&input)?;
        check_output(&trace, &output)?;
        Ok(output.value())
    }

    /// Computes `f(x)` and `f'(x)` with one forward and one backward pass.
    pub fn value_and_gradient<T, F>(&self, f: F, x: T) -> Result<(T, T)>
    where
        T: Scalar,
        F: Fn(&Tracked<T>) -> Result<Tracked<T>>,
    {
        let trace = Trace::new();
        let input = trace.leaf(x)?;
        let output = f(&input)?;
        check_output(&trace, &output)?;

        let tape = trace.finish();
        let adjoints = backward(&tape, output.id(), &self.config)?;
        let gradient = adjoints.gradient(input.id(), &self.config)?;
        Ok((output.value(), gradient))
    }

    /// Computes `f'(x)`.
    pub fn gradient<T, F>(&self, f: F, x: T) -> Result<T>
    where
        T: Scalar,
        F: Fn(&Tracked<T>) -> Result<Tracked<T>>,
    {
        self.value_and_gradient(f, x).map(|(_, gradient)| gradient)
    }

    /// Wraps `f` into its scalar gradient function `x -> f'(x)`.
    pub fn grad_fn<'a, T, F>(&'a self, f: F) -> impl Fn(T) -> Result<T> + Sync + 'a
    where
        T: Scalar,
        F: Fn(&Tracked<T>) -> Result<Tracked<T>> + Sync + 'a,
    {
        move |x| self.gradient(&f, x)
    }

    /// Gradient of `f` at every element of `xs`, index-aligned.
    pub fn batch_gradient<T, F>(&self, f: F, xs: &[T]) -> BatchResult<T>
    where
        T: Scalar,
        F: Fn(&Tracked<T>) -> Result<Tracked<T>> + Sync,
    {
        self.batch_map(self.grad_fn(f), xs)
    }

    /// Value of `f` at every element of `xs`, index-aligned.
    pub fn batch_evaluate<T, F>(&self, f: F, xs: &[T]) -> BatchResult<T>
    where
        T: Scalar,
        F: Fn(&Tracked<T>) -> Result<Tracked<T>> + Sync,
    {
        self.batch_map(|x| self.evaluate(&f, x), xs)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            config: default_config().clone(),
            pool: None,
        }
    }
}

fn check_output<T: Scalar>(trace: &Trace<T>, output: &Tracked<T>) -> Result<()> {
    if trace.owns(output) {
        Ok(())
    } else {
        Err(AutodiffError::unsupported(
            "output",
            "the function returned a value that was not derived from its input trace",
        ))
    }
}

static DEFAULT_ENGINE: Lazy<Engine> = Lazy::new(Engine::default);

/// Evaluates `f(x)` without recording a trace.
pub fn evaluate<T, F>(f: F, x: T) -> Result<T>
where
    T: Scalar,
    F: Fn(&Tracked<T>) -> Result<Tracked<T>>,
{
    DEFAULT_ENGINE.evaluate(f, x)
}

/// Computes `f'(x)`.
pub fn gradient<T, F>(f: F, x: T) -> Result<T>
where
    T: Scalar,
    F: Fn(&Tracked<T>) -> Result<Tracked<T>>,
{
    DEFAULT_ENGINE.gradient(f, x)
}

/// Computes `f(x)` and `f'(x)` together.
pub fn value_and_gradient<T, F>(f: F, x: T) -> Result<(T, T)>
where
    T: Scalar,
    F: Fn(&Tracked<T>) -> Result<Tracked<T>>,
{
    DEFAULT_ENGINE.value_and_gradient(f, x)
}

/// Gradient of `f` at every element of `xs`, index-aligned.
pub fn batch_gradient<T, F>(f: F, xs: &[T]) -> BatchResult<T>
where
    T: Scalar,
    F: Fn(&Tracked<T>) -> Result<Tracked<T>> + Sync,
{
    DEFAULT_ENGINE.batch_gradient(f, xs)
}

/// Value of `f` at every element of `xs`, index-aligned.
pub fn batch_evaluate<T, F>(f: F, xs: &[T]) -> BatchResult<T>
where
    T: Scalar,
    F: Fn(&Tracked<T>) -> Result<Tracked<T>> + Sync,
{
    DEFAULT_ENGINE.batch_evaluate(f, xs)
}
