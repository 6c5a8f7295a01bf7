//! Network configuration.

use crate::agenda::SelectionStrategy;
use crate::trace::TracerConfig;

/// Configuration for a [`ReteNetwork`](crate::ReteNetwork).
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// Policy used by `run` to pick the next match.
    pub selection: SelectionStrategy,
    /// Seed for the random policy.
    pub seed: u64,
    /// Budget used by `run_default`.
    pub run_budget: usize,
    /// Event tracing.
    pub tracer: TracerConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            selection: SelectionStrategy::Random,
            seed: 0,
            run_budget: 10,
            tracer: TracerConfig::default(),
        }
    }
}

impl NetworkConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration with tracing enabled.
    #[must_use]
    pub fn traced() -> Self {
        Self {
            tracer: TracerConfig::new().enabled(),
            ..Self::default()
        }
    }

    /// Builder method to set the selection policy.
    #[must_use]
    pub fn with_selection(mut self, selection: SelectionStrategy) -> Self {
        self.selection = selection;
        self
    }

    /// Builder method to set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the default run budget.
    #[must_use]
    pub fn with_run_budget(mut self, budget: usize) -> Self {
        self.run_budget = budget;
        self
    }

    /// Builder method to set the tracer configuration.
    #[must_use]
    pub fn with_tracer(mut self, tracer: TracerConfig) -> Self {
        self.tracer = tracer;
        self
    }
}
