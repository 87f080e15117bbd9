#![warn(unreachable_pub, missing_debug_implementations)]

//! The core Petrisim library. This crate defines [stochastic timed Petri nets](net::Net), the
//! [composite model](model::CompositeModel) that joins several of them through shared places, the
//! [discrete-event engine](engine::SimulationEngine) that runs a model up to a time horizon, and
//! a [Monte-Carlo driver](montecarlo::monte_carlo) that repeats runs and averages statistics.

#[macro_use]
mod ident;

pub mod delay;
pub mod engine;
pub mod model;
pub mod montecarlo;
pub mod net;
pub mod opts;
mod run;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use delay::{Delay, DelayError, DelayKind};
pub use engine::{EngineError, EngineOpts, Outcome, SimulationEngine, Step};
pub use ident::{NetId, PlaceId, PlaceKey, TransitionId};
pub use model::{AliasError, CompositeModel};
pub use montecarlo::{monte_carlo, Estimate, Summary};
pub use net::{
    ArcIn, ArcOut, Marking, Net, NetBuilder, Place, Priority, StructureError, Transition, Weight,
};
pub use opts::{MonteCarloOpts, RngPolicy};
pub use run::{run, Error};
pub use stats::{Probe, RunResult, Stat, StatError};
