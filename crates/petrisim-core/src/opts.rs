//! This module defines the [`MonteCarloOpts`] configuration which describes how to repeat and
//! aggregate simulation runs.

use crate::engine::{EngineOpts, DEFAULT_INSTANT_FIRING_LIMIT};

/// Where the random numbers of a Monte-Carlo batch come from. Without a seed, the stream is
/// seeded from system entropy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RngPolicy {
    /// One stream continues across all runs. Runs execute sequentially.
    Shared { seed: Option<u64> },
    /// Every run gets its own stream, derived from a seeder. Runs may execute in parallel.
    PerRun { seed: Option<u64> },
}

impl RngPolicy {
    pub fn seed(&self) -> Option<u64> {
        match *self {
            RngPolicy::Shared { seed } | RngPolicy::PerRun { seed } => seed,
        }
    }
}

impl Default for RngPolicy {
    fn default() -> Self {
        RngPolicy::PerRun { seed: None }
    }
}

/// Monte-Carlo options.
#[derive(Debug, Clone, typed_builder::TypedBuilder)]
pub struct MonteCarloOpts {
    /// Simulated time at which each run ends.
    pub horizon: f64,
    /// Number of independent runs.
    #[builder(default = 1)]
    pub runs: usize,
    /// Random stream policy.
    #[builder(default)]
    pub rng: RngPolicy,
    /// Spread per-run streams over the rayon thread pool.
    #[builder(default = true)]
    pub parallel: bool,
    /// Count stalled runs as samples instead of failing the batch.
    #[builder(default = true)]
    pub tolerate_stalls: bool,
    /// Firings allowed without the clock advancing.
    #[builder(default = DEFAULT_INSTANT_FIRING_LIMIT)]
    pub instant_firing_limit: usize,
}

impl MonteCarloOpts {
    pub(crate) fn engine_opts(&self) -> EngineOpts {
        EngineOpts::builder()
            .horizon(self.horizon)
            .instant_firing_limit(self.instant_firing_limit)
            .build()
    }
}
