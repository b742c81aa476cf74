//! Batched (vectorized) evaluation.
//!
//! Applies a scalar function to every element of a slice as a data-parallel
//! map. Each element gets its own trace and adjoints, so elements never
//! interact and one element's failure leaves the others untouched. The
//! output is index-aligned with the input.

use crate::engine::Engine;
use adjoint_core::{AutodiffError, Result, Scalar};
use log::debug;
use rayon::prelude::*;

/// Per-element results of a batched evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult<T> {
    results: Vec<Result<T>>,
}

impl<T: Scalar> BatchResult<T> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Checks if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result for the element at `index`.
    pub fn get(&self, index: usize) -> Option<&Result<T>> {
        self.results.get(index)
    }

    /// Iterates over the per-element results in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, Result<T>> {
        self.results.iter()
    }

    /// Successful elements with their input index.
    pub fn successes(&self) -> Vec<(usize, T)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().ok().map(|&v| (i, v)))
            .collect()
    }

    /// Failed elements with their input index.
    pub fn failures(&self) -> Vec<(usize, &AutodiffError)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().err().map(|e| (i, e)))
            .collect()
    }

    /// Checks if every element succeeded.
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(Result::is_ok)
    }

    /// Consumes the batch, returning the per-element results.
    pub fn into_results(self) -> Vec<Result<T>> {
        self.results
    }

    /// Consumes the batch, returning all values or the first error.
    pub fn into_values(self) -> Result<Vec<T>> {
        self.results.into_iter().collect()
    }
}

impl<T> IntoIterator for BatchResult<T> {
    type Item = Result<T>;
    type IntoIter = std::vec::IntoIter<Result<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl Engine {
    /// Maps a scalar function over `xs`.
    ///
    /// # Arguments
    /// * `g` - Function applied to each element, e.g. a gradient function
    ///   from [`Engine::grad_fn`]
    /// * `xs` - Input elements
    ///
    /// # Returns
    /// One result per input, in input order
    ///
    /// Batches shorter than the configured threshold run on the calling
    /// thread; longer ones run on the engine's pool, or on the global rayon
    /// pool if none was configured.
    pub fn batch_map<T, G>(&self, g: G, xs: &[T]) -> BatchResult<T>
    where
        T: Scalar,
        G: Fn(T) -> Result<T> + Sync,
    {
        let parallel = self.config().should_parallelize(xs.len());
        debug!(
            "Batch of {} element(s) dispatched {}",
            xs.len(),
            if parallel { "in parallel" } else { "sequentially" }
        );

        let results: Vec<Result<T>> = if parallel {
            let run = || -> Vec<Result<T>> { xs.par_iter().map(|&x| g(x)).collect() };
            match &self.pool {
                Some(pool) => pool.install(run),
                None => run(),
            }
        } else {
            xs.iter().map(|&x| g(x)).collect()
        };

        let batch = BatchResult { results };
        let failed = batch.results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            debug!("{} of {} batch element(s) failed", failed, batch.len());
        }
        batch
    }
}
