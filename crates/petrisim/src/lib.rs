//! `Petrisim` simulates stochastic timed Petri nets. Places hold tokens, transitions consume
//! tokens from their input places when they fire and, after a random delay, deposit tokens into
//! their output places. Several nets can be joined into one model by declaring that places of
//! different nets are the same place, and a model can be run many times to estimate averaged
//! statistics such as throughput, queue lengths, and utilization.

#![warn(unreachable_pub, missing_docs)]

pub mod core;
