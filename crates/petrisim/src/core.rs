//! Core Petrisim data structures and routines. The most common entry points are [run()], which
//! simulates a [composite model](model::CompositeModel) once up to a horizon, and
//! [monte_carlo()], which repeats runs and averages [probes](stats::Probe).

pub use petrisim_core::*;
