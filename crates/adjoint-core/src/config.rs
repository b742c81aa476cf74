//! Engine configuration.
//!
//! Holds the conventions for points where a derivative is ambiguous and
//! the knobs of batched evaluation. A process-wide default is available
//! through [`default_config`]; custom configurations are built with
//! [`EngineConfigBuilder`].

use crate::error::{AutodiffError, Result};
use once_cell::sync::Lazy;

/// Convention for the derivative of `abs` at exactly zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbsAtZero {
    /// Use the subgradient 0.
    #[default]
    Zero,
    /// Raise `NonDifferentiablePoint`.
    Fail,
}

/// How to report the gradient of an input that never reached the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Disconnected {
    /// The gradient is 0.
    #[default]
    Zero,
    /// Raise `DisconnectedInput`.
    Error,
}

/// Configuration shared by all engine entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Derivative convention for `abs` at zero.
    pub abs_at_zero: AbsAtZero,
    /// Policy for inputs that do not influence the output.
    pub disconnected: Disconnected,
    /// Minimum batch length before elements are dispatched to worker threads.
    pub min_parallel_batch: usize,
    /// Number of worker threads (None = use the global rayon pool).
    pub num_threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            abs_at_zero: AbsAtZero::default(),
            disconnected: Disconnected::default(),
            min_parallel_batch: 64,
            num_threads: None,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a builder from the default settings.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Check if a batch of the given length should run on worker threads.
    pub fn should_parallelize(&self, batch_len: usize) -> bool {
        batch_len >= self.min_parallel_batch && batch_len > 1
    }
}

/// Process-wide default configuration.
pub static DEFAULT_CONFIG: Lazy<EngineConfig> = Lazy::new(EngineConfig::default);

/// Get the process-wide default configuration.
pub fn default_config() -> &'static EngineConfig {
    &DEFAULT_CONFIG
}

/// Builder for creating a custom engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Set the derivative convention for `abs` at zero.
    pub fn abs_at_zero(mut self, policy: AbsAtZero) -> Self {
        self.config.abs_at_zero = policy;
        self
    }

    /// Set the policy for disconnected inputs.
    pub fn disconnected(mut self, policy: Disconnected) -> Self {
        self.config.disconnected = policy;
        self
    }

    /// Set the minimum batch length for parallel dispatch.
    pub fn min_parallel_batch(mut self, len: usize) -> Self {
        self.config.min_parallel_batch = len;
        self
    }

    /// Use a dedicated pool with the given number of worker threads.
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.num_threads = Some(threads);
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<EngineConfig> {
        if self.config.num_threads == Some(0) {
            return Err(AutodiffError::invalid_configuration(
                "num_threads",
                "must be at least 1",
            ));
        }
        Ok(self.config)
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
