//! This module defines [`CompositeModel`]s: sets of independently built nets coupled by place
//! aliasing. The model owns one canonical table of places; every net slot resolves to a key in
//! that table, and aliased slots resolve to the same key.

use crate::engine::Outcome;
use crate::ident::{NetId, PlaceId, PlaceKey, TransitionId};
use crate::net::{Marking, Net};
use crate::stats::{PlaceState, PlaceStats, RunResult, TransitionState, TransitionStats};

#[derive(Debug, Clone)]
pub struct CompositeModel {
    nets: Vec<Net>,
    // For each net, the canonical key of each local place slot
    slots: Vec<Vec<PlaceKey>>,
    // Canonical places and the number of slots referencing each of them
    places: Vec<PlaceState>,
    refs: Vec<usize>,
    transitions: Vec<Vec<TransitionState>>,
}

impl CompositeModel {
    /// Creates a model in which every place slot is its own canonical place.
    pub fn new(nets: Vec<Net>) -> Self {
        let mut slots = Vec::with_capacity(nets.len());
        let mut places = Vec::new();
        for net in &nets {
            let keys = net
                .places()
                .map(|place| {
                    places.push(PlaceState::new(place));
                    PlaceKey::new(places.len() - 1)
                })
                .collect::<Vec<_>>();
            slots.push(keys);
        }
        let transitions = nets
            .iter()
            .map(|net| vec![TransitionState::default(); net.nr_transitions()])
            .collect();
        Self {
            refs: vec![1; places.len()],
            nets,
            slots,
            places,
            transitions,
        }
    }

    /// Unifies two place slots so they share one canonical place.
    ///
    /// If exactly one side already belongs to an alias group, that group's place survives.
    /// Otherwise the place of side `a` survives and side `b`'s place is discarded. Aliasing two
    /// slots that already share a place does nothing. Aliasing two slots that belong to distinct
    /// alias groups is an error.
    pub fn alias(
        &mut self,
        net_a: NetId,
        slot_a: PlaceId,
        net_b: NetId,
        slot_b: PlaceId,
    ) -> Result<(), AliasError> {
        let ka = self.resolve(net_a, slot_a)?;
        let kb = self.resolve(net_b, slot_b)?;
        if ka == kb {
            return Ok(());
        }
        let (a_grouped, b_grouped) = (self.refs[ka.index()] > 1, self.refs[kb.index()] > 1);
        let (winner, loser) = match (a_grouped, b_grouped) {
            (true, true) => {
                return Err(AliasError::Incompatible {
                    a: (net_a, slot_a),
                    b: (net_b, slot_b),
                })
            }
            (false, true) => (kb, ka),
            _ => (ka, kb),
        };
        log::debug!(
            "aliasing {}[{}] and {}[{}] onto place {:?}",
            self.nets[net_a.index()].name(),
            slot_a,
            self.nets[net_b.index()].name(),
            slot_b,
            self.places[winner.index()].name(),
        );
        // The loser is referenced by exactly one slot. Point it at the winner, then drop the
        // loser from the table and shift the keys above it.
        let retired = loser.index();
        self.refs[winner.index()] += 1;
        self.places.remove(retired);
        self.refs.remove(retired);
        for key in self.slots.iter_mut().flatten() {
            if *key == loser {
                *key = winner;
            }
            if key.index() > retired {
                *key = PlaceKey::new(key.index() - 1);
            }
        }
        Ok(())
    }

    /// Returns the canonical key of a place slot.
    pub fn resolve(&self, net: NetId, slot: PlaceId) -> Result<PlaceKey, AliasError> {
        self.slots
            .get(net.index())
            .and_then(|keys| keys.get(slot.index()))
            .copied()
            .ok_or(AliasError::UnknownSlot { net, slot })
    }

    /// Returns true if both slots resolve to the same canonical place.
    pub fn is_aliased(&self, a: (NetId, PlaceId), b: (NetId, PlaceId)) -> bool {
        matches!(
            (self.resolve(a.0, a.1), self.resolve(b.0, b.1)),
            (Ok(ka), Ok(kb)) if ka == kb
        )
    }

    pub fn place(&self, net: NetId, slot: PlaceId) -> Option<&PlaceState> {
        let key = self.resolve(net, slot).ok()?;
        self.places.get(key.index())
    }

    pub fn place_mut(&mut self, net: NetId, slot: PlaceId) -> Option<&mut PlaceState> {
        let key = self.resolve(net, slot).ok()?;
        self.places.get_mut(key.index())
    }

    pub fn marking(&self, net: NetId, slot: PlaceId) -> Option<Marking> {
        self.place(net, slot).map(PlaceState::marking)
    }

    pub fn transition_state(
        &self,
        net: NetId,
        transition: TransitionId,
    ) -> Option<&TransitionState> {
        self.transitions.get(net.index())?.get(transition.index())
    }

    pub fn net(&self, id: NetId) -> Option<&Net> {
        self.nets.get(id.index())
    }

    /// Returns the nets with their IDs, in declaration order.
    pub fn nets(&self) -> impl Iterator<Item = (NetId, &Net)> {
        self.nets
            .iter()
            .enumerate()
            .map(|(i, net)| (NetId::new(i), net))
    }

    /// The number of distinct canonical places.
    pub fn nr_places(&self) -> usize {
        self.places.len()
    }

    pub(crate) fn is_enabled(&self, net: NetId, transition: TransitionId) -> bool {
        let keys = &self.slots[net.index()];
        self.nets[net.index()].is_enabled_with(
            transition,
            |slot| keys[slot.index()],
            |key: PlaceKey| self.places[key.index()].marking(),
        )
    }

    /// Consumes the input tokens of `transition` and puts one firing in flight.
    pub(crate) fn begin_firing(&mut self, net: NetId, transition: TransitionId) {
        let Self {
            nets,
            slots,
            places,
            transitions,
            ..
        } = self;
        let keys = &slots[net.index()];
        let state = &mut transitions[net.index()][transition.index()];
        nets[net.index()].consume(transition, |slot, weight| {
            places[keys[slot.index()].index()].remove(weight);
            state.consumed += weight;
        });
        state.buffer += 1;
        state.started += 1;
    }

    /// Deposits the output tokens of one in-flight firing of `transition`.
    pub(crate) fn complete_firing(&mut self, net: NetId, transition: TransitionId) {
        let Self {
            nets,
            slots,
            places,
            transitions,
            ..
        } = self;
        let keys = &slots[net.index()];
        let state = &mut transitions[net.index()][transition.index()];
        nets[net.index()].produce(transition, |slot, weight| {
            places[keys[slot.index()].index()].add(weight);
            state.produced += weight;
        });
        state.buffer -= 1;
        state.completed += 1;
    }

    /// Integrates every accumulator over `dt` units of time at the current state.
    pub(crate) fn accumulate(&mut self, dt: f64) {
        for place in &mut self.places {
            place.accumulate(dt);
        }
        for state in self.transitions.iter_mut().flatten() {
            state.accumulate(dt);
        }
    }

    pub(crate) fn snapshot(&self, horizon: f64, outcome: Outcome) -> RunResult {
        let places = self
            .slots
            .iter()
            .map(|keys| {
                keys.iter()
                    .map(|&key| {
                        let p = &self.places[key.index()];
                        PlaceStats {
                            name: p.name().to_owned(),
                            key,
                            marking: p.marking(),
                            observed_max: p.observed_max(),
                            observed_min: p.observed_min(),
                            mean: p.mean(horizon),
                        }
                    })
                    .collect()
            })
            .collect();
        let transitions = self
            .nets
            .iter()
            .zip(&self.transitions)
            .map(|(net, states)| {
                net.transitions()
                    .zip(states)
                    .map(|(t, s)| TransitionStats {
                        name: t.name.clone(),
                        buffer: s.buffer,
                        mean_buffer: if horizon > 0.0 {
                            s.buffer_area / horizon
                        } else {
                            s.buffer as f64
                        },
                        started: s.started,
                        completed: s.completed,
                        tokens_consumed: s.consumed,
                        tokens_produced: s.produced,
                    })
                    .collect()
            })
            .collect();
        RunResult {
            outcome,
            horizon,
            places,
            transitions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AliasError {
    #[error("net {net} has no place slot {slot}")]
    UnknownSlot { net: NetId, slot: PlaceId },

    #[error("slots {a:?} and {b:?} are already aliased to different places")]
    Incompatible {
        a: (NetId, PlaceId),
        b: (NetId, PlaceId),
    },
}
