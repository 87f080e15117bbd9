//! The discrete-event loop. Firing is two-phase: input tokens leave immediately when a transition
//! is selected, and output tokens arrive when the sampled delay has elapsed.
//!
//! Each step either fires the best enabled transition without advancing the clock, or, when
//! nothing is enabled, advances the clock to the earliest pending completion and applies it.
//! Enabled transitions are ranked by priority (lower first), then by net order, then by
//! transition order.

use std::cmp::Reverse;
use std::collections::binary_heap::PeekMut;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use rand::prelude::*;

use crate::ident::{NetId, TransitionId};
use crate::model::CompositeModel;
use crate::net::Priority;
use crate::stats::RunResult;

/// The default number of firings allowed at a single instant before a run is declared livelocked.
pub const DEFAULT_INSTANT_FIRING_LIMIT: usize = 1_000_000;

/// Engine options.
#[derive(Debug, Clone, typed_builder::TypedBuilder)]
pub struct EngineOpts {
    /// Simulated time at which the run ends.
    pub horizon: f64,
    /// Firings allowed without the clock advancing.
    #[builder(default = DEFAULT_INSTANT_FIRING_LIMIT)]
    pub instant_firing_limit: usize,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub enum Outcome {
    /// The clock reached the horizon.
    ReachedHorizon,
    /// Nothing was enabled and nothing was in flight before the horizon.
    Stalled { at: f64 },
}

/// What a single [`SimulationEngine::step`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// A transition consumed its inputs and went in flight.
    Fired {
        net: NetId,
        transition: TransitionId,
        time: f64,
        completes_at: f64,
    },
    /// An in-flight firing deposited its outputs.
    Produced {
        net: NetId,
        transition: TransitionId,
        time: f64,
    },
    /// The run is over.
    Finished(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Running,
    Finished(Outcome),
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, derive_new::new)]
struct Pending {
    at: OrderedFloat<f64>,
    // Insertion order, breaks ties between completions at the same time
    seq: u64,
    net: NetId,
    transition: TransitionId,
}

/// Drives one [`CompositeModel`] through simulated time. An engine runs exactly once.
#[derive(Debug)]
pub struct SimulationEngine {
    model: CompositeModel,
    state: State,
    now: f64,
    horizon: f64,
    instant_firing_limit: usize,
    instant_firings: usize,
    queue: BinaryHeap<Reverse<Pending>>,
    next_seq: u64,
}

impl SimulationEngine {
    pub fn new(model: CompositeModel) -> Self {
        Self {
            model,
            state: State::Idle,
            now: 0.0,
            horizon: 0.0,
            instant_firing_limit: DEFAULT_INSTANT_FIRING_LIMIT,
            instant_firings: 0,
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Moves the engine from idle to running.
    pub fn start(&mut self, opts: &EngineOpts) -> Result<(), EngineError> {
        if self.state != State::Idle {
            return Err(EngineError::AlreadyStarted);
        }
        if !(opts.horizon >= 0.0 && opts.horizon.is_finite()) {
            return Err(EngineError::InvalidHorizon(opts.horizon));
        }
        self.horizon = opts.horizon;
        self.instant_firing_limit = opts.instant_firing_limit;
        self.state = State::Running;
        Ok(())
    }

    /// Performs one step of the event loop.
    pub fn step<R>(&mut self, rng: &mut R) -> Result<Step, EngineError>
    where
        R: Rng + ?Sized,
    {
        match self.state {
            State::Idle => return Err(EngineError::NotStarted),
            State::Finished(outcome) => return Ok(Step::Finished(outcome)),
            State::Running => {}
        }

        // Zero-wait firings take precedence over advancing the clock.
        if let Some((net, transition)) = self.select() {
            self.instant_firings += 1;
            if self.instant_firings > self.instant_firing_limit {
                return Err(EngineError::Livelock {
                    at: self.now,
                    limit: self.instant_firing_limit,
                });
            }
            return Ok(self.fire(net, transition, rng));
        }

        let due = match self.queue.peek_mut() {
            Some(next) if next.0.at.into_inner() <= self.horizon => Some(PeekMut::pop(next).0),
            _ => None,
        };
        if let Some(Pending {
            at,
            net,
            transition,
            ..
        }) = due
        {
            self.advance_to(at.into_inner());
            self.model.complete_firing(net, transition);
            log::trace!("t={}: {} completed", self.now, self.describe(net, transition));
            return Ok(Step::Produced {
                net,
                transition,
                time: self.now,
            });
        }

        // Nothing left to do before the horizon.
        let outcome = if self.queue.is_empty() && self.now < self.horizon {
            Outcome::Stalled { at: self.now }
        } else {
            Outcome::ReachedHorizon
        };
        self.advance_to(self.horizon);
        self.state = State::Finished(outcome);
        Ok(Step::Finished(outcome))
    }

    /// Runs the model to the horizon and reports its statistics.
    pub fn run<R>(mut self, opts: &EngineOpts, rng: &mut R) -> Result<RunResult, EngineError>
    where
        R: Rng + ?Sized,
    {
        self.start(opts)?;
        loop {
            if let Step::Finished(outcome) = self.step(rng)? {
                if let Outcome::Stalled { at } = outcome {
                    log::debug!("run stalled at t={at} before horizon {}", self.horizon);
                }
                return Ok(self.model.snapshot(self.horizon, outcome));
            }
        }
    }

    /// The current simulated time.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished(..))
    }

    pub fn model(&self) -> &CompositeModel {
        &self.model
    }

    /// How the run ended, or `None` while it is still idle or running.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            State::Finished(outcome) => Some(outcome),
            State::Idle | State::Running => None,
        }
    }

    /// Statistics as of now. Time-weighted means cover the time elapsed so far.
    ///
    /// Before the run finishes, the reported outcome is provisional and reads
    /// [`Outcome::ReachedHorizon`]; use [`SimulationEngine::outcome`] to tell the two apart.
    pub fn snapshot(&self) -> RunResult {
        let outcome = match self.state {
            State::Finished(outcome) => outcome,
            State::Idle | State::Running => Outcome::ReachedHorizon,
        };
        self.model.snapshot(self.now, outcome)
    }

    /// Finds the enabled transition that fires first.
    fn select(&self) -> Option<(NetId, TransitionId)> {
        self.model
            .nets()
            .flat_map(|(nid, net)| {
                net.transition_ids()
                    .filter(move |&tid| self.model.is_enabled(nid, tid))
                    .filter_map(move |tid| {
                        net.transition(tid).map(|t| (t.priority(), nid, tid))
                    })
            })
            .min_by_key(|&key: &(Priority, NetId, TransitionId)| key)
            .map(|(_, nid, tid)| (nid, tid))
    }

    fn fire<R>(&mut self, net: NetId, transition: TransitionId, rng: &mut R) -> Step
    where
        R: Rng + ?Sized,
    {
        self.model.begin_firing(net, transition);
        let delay = self
            .model
            .net(net)
            .and_then(|n| n.transition(transition))
            .map_or(0.0, |t| t.delay().sample(rng));
        let completes_at = self.now + delay;
        self.queue.push(Reverse(Pending::new(
            OrderedFloat(completes_at),
            self.next_seq,
            net,
            transition,
        )));
        self.next_seq += 1;
        log::trace!(
            "t={}: {} fired, completes at {completes_at}",
            self.now,
            self.describe(net, transition)
        );
        Step::Fired {
            net,
            transition,
            time: self.now,
            completes_at,
        }
    }

    fn advance_to(&mut self, time: f64) {
        if time > self.now {
            self.model.accumulate(time - self.now);
            self.now = time;
            self.instant_firings = 0;
        }
    }

    fn describe(&self, net: NetId, transition: TransitionId) -> String {
        let net = self.model.net(net);
        let name = |n: Option<&str>| n.unwrap_or("?").to_owned();
        format!(
            "{}/{}",
            name(net.map(|n| n.name())),
            name(net.and_then(|n| n.transition(transition)).map(|t| t.name.as_str()))
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("the engine has not been started")]
    NotStarted,

    #[error("the engine has already been started")]
    AlreadyStarted,

    #[error("invalid run horizon {0}")]
    InvalidHorizon(f64),

    #[error("more than {limit} firings at t={at} without the clock advancing")]
    Livelock { at: f64, limit: usize },
}
