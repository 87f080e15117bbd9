use rand::Rng;

use crate::delay::DelayError;
use crate::engine::{EngineError, EngineOpts, SimulationEngine};
use crate::model::{AliasError, CompositeModel};
use crate::net::StructureError;
use crate::stats::{RunResult, StatError};

/// Runs `model` once to `horizon` and returns its statistics.
///
/// A run that stalls before the horizon is not an error here; check
/// [`RunResult::outcome`] or call [`RunResult::require_horizon`].
pub fn run<R>(model: CompositeModel, horizon: f64, rng: &mut R) -> Result<RunResult, Error>
where
    R: Rng + ?Sized,
{
    let opts = EngineOpts::builder().horizon(horizon).build();
    Ok(SimulationEngine::new(model).run(&opts, rng)?)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid net structure")]
    InvalidNetStructure(#[from] StructureError),

    #[error("invalid time delay")]
    InvalidTimeDelay(#[from] DelayError),

    #[error("incompatible alias")]
    IncompatibleAlias(#[from] AliasError),

    #[error("simulation stalled at t={at} before reaching horizon {horizon}")]
    SimulationStalled { at: f64, horizon: f64 },

    #[error("simulation failed")]
    Engine(#[from] EngineError),

    #[error("failed to read statistic")]
    Stat(#[from] StatError),
}
