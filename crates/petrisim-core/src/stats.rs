//! Runtime accumulators and the statistics a run reports.

use crate::engine::Outcome;
use crate::ident::{NetId, PlaceId, PlaceKey, TransitionId};
use crate::net::{Marking, Place};

/// The live state of a canonical place.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceState {
    name: String,
    marking: Marking,
    observed_max: Marking,
    observed_min: Marking,
    // Integral of the marking over simulated time
    area: f64,
}

impl PlaceState {
    pub(crate) fn new(place: &Place) -> Self {
        Self {
            name: place.name.clone(),
            marking: place.marking,
            observed_max: place.marking,
            observed_min: place.marking,
            area: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn marking(&self) -> Marking {
        self.marking
    }

    pub fn observed_max(&self) -> Marking {
        self.observed_max
    }

    pub fn observed_min(&self) -> Marking {
        self.observed_min
    }

    /// Overwrites the marking. Intended for adjusting a model before it runs.
    pub fn set_marking(&mut self, marking: Marking) {
        self.marking = marking;
        self.observe();
    }

    /// Time-weighted mean marking over `elapsed` units of simulated time.
    pub fn mean(&self, elapsed: f64) -> f64 {
        if elapsed > 0.0 {
            self.area / elapsed
        } else {
            self.marking as f64
        }
    }

    pub(crate) fn add(&mut self, tokens: Marking) {
        self.marking += tokens;
        self.observe();
    }

    pub(crate) fn remove(&mut self, tokens: Marking) {
        debug_assert!(self.marking >= tokens, "place {} went negative", self.name);
        self.marking = self.marking.saturating_sub(tokens);
        self.observe();
    }

    pub(crate) fn accumulate(&mut self, dt: f64) {
        self.area += self.marking as f64 * dt;
    }

    fn observe(&mut self) {
        self.observed_max = self.observed_max.max(self.marking);
        self.observed_min = self.observed_min.min(self.marking);
    }
}

/// The live state of one transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionState {
    pub(crate) buffer: u64,
    pub(crate) buffer_area: f64,
    pub(crate) started: u64,
    pub(crate) completed: u64,
    pub(crate) consumed: u64,
    pub(crate) produced: u64,
}

impl TransitionState {
    /// Firings that have consumed their inputs but not yet produced.
    pub fn buffer(&self) -> u64 {
        self.buffer
    }

    pub(crate) fn accumulate(&mut self, dt: f64) {
        self.buffer_area += self.buffer as f64 * dt;
    }
}

/// Per-place statistics at the end of a run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PlaceStats {
    pub name: String,
    /// The canonical place this slot resolved to.
    pub key: PlaceKey,
    pub marking: Marking,
    pub observed_max: Marking,
    pub observed_min: Marking,
    pub mean: f64,
}

/// Per-transition statistics at the end of a run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TransitionStats {
    pub name: String,
    pub buffer: u64,
    pub mean_buffer: f64,
    pub started: u64,
    pub completed: u64,
    pub tokens_consumed: u64,
    pub tokens_produced: u64,
}

/// The result of one simulation run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RunResult {
    pub outcome: Outcome,
    pub horizon: f64,
    // Indexed by net, then by local slot
    pub(crate) places: Vec<Vec<PlaceStats>>,
    pub(crate) transitions: Vec<Vec<TransitionStats>>,
}

impl RunResult {
    pub fn place(&self, net: NetId, place: PlaceId) -> Option<&PlaceStats> {
        self.places.get(net.index())?.get(place.index())
    }

    pub fn transition(&self, net: NetId, transition: TransitionId) -> Option<&TransitionStats> {
        self.transitions.get(net.index())?.get(transition.index())
    }

    /// Place statistics of one net, in slot order.
    pub fn places_of(&self, net: NetId) -> &[PlaceStats] {
        self.places.get(net.index()).map_or(&[], |v| v.as_slice())
    }

    /// Transition statistics of one net, in slot order.
    pub fn transitions_of(&self, net: NetId) -> &[TransitionStats] {
        self.transitions
            .get(net.index())
            .map_or(&[], |v| v.as_slice())
    }

    pub fn is_stalled(&self) -> bool {
        matches!(self.outcome, Outcome::Stalled { .. })
    }

    /// Returns the result if the run reached its horizon, and an error if it stalled first.
    pub fn require_horizon(self) -> Result<Self, crate::Error> {
        match self.outcome {
            Outcome::Stalled { at } => Err(crate::Error::SimulationStalled {
                at,
                horizon: self.horizon,
            }),
            Outcome::ReachedHorizon => Ok(self),
        }
    }
}

/// A statistic that can be read out of a [`RunResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Marking(NetId, PlaceId),
    ObservedMax(NetId, PlaceId),
    ObservedMin(NetId, PlaceId),
    /// Time-weighted mean marking.
    Mean(NetId, PlaceId),
    Buffer(NetId, TransitionId),
    /// Time-weighted mean buffer length.
    MeanBuffer(NetId, TransitionId),
    /// Firings started.
    Fired(NetId, TransitionId),
}

impl Stat {
    pub fn read(&self, result: &RunResult) -> Result<f64, StatError> {
        let place = |net, place| {
            result
                .place(net, place)
                .ok_or(StatError::UnknownPlace { net, place })
        };
        let transition = |net, transition| {
            result
                .transition(net, transition)
                .ok_or(StatError::UnknownTransition { net, transition })
        };
        Ok(match *self {
            Stat::Marking(n, p) => place(n, p)?.marking as f64,
            Stat::ObservedMax(n, p) => place(n, p)?.observed_max as f64,
            Stat::ObservedMin(n, p) => place(n, p)?.observed_min as f64,
            Stat::Mean(n, p) => place(n, p)?.mean,
            Stat::Buffer(n, t) => transition(n, t)?.buffer as f64,
            Stat::MeanBuffer(n, t) => transition(n, t)?.mean_buffer,
            Stat::Fired(n, t) => transition(n, t)?.started as f64,
        })
    }
}

type Extractor = Box<dyn Fn(&RunResult) -> Result<f64, StatError> + Send + Sync>;

/// A named statistic to average over Monte-Carlo runs.
pub struct Probe {
    name: String,
    extract: Extractor,
}

impl Probe {
    pub fn new(name: impl Into<String>, stat: Stat) -> Self {
        Self {
            name: name.into(),
            extract: Box::new(move |result| stat.read(result)),
        }
    }

    /// A probe computed by an arbitrary function of the run result.
    pub fn custom<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&RunResult) -> Result<f64, StatError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            extract: Box::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn observe(&self, result: &RunResult) -> Result<f64, StatError> {
        (self.extract)(result)
    }
}

impl std::fmt::Debug for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probe").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StatError {
    #[error("net {net} has no place {place}")]
    UnknownPlace { net: NetId, place: PlaceId },

    #[error("net {net} has no transition {transition}")]
    UnknownTransition {
        net: NetId,
        transition: TransitionId,
    },
}

/// Running mean and variance (Welford).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMean {
    n: usize,
    mean: f64,
    m2: f64,
}

impl RunningMean {
    pub fn push(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> usize {
        self.n
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation. Zero with fewer than two samples.
    pub fn std_dev(&self) -> f64 {
        if self.n < 2 {
            0.0
        } else {
            (self.m2 / (self.n - 1) as f64).sqrt()
        }
    }
}
