//! This module defines [`Net`]s: immutable collections of places, transitions, and arcs. A net
//! only knows its own place slots; markings live in the
//! [`CompositeModel`](crate::model::CompositeModel) that the net is simulated in.

mod builder;
pub mod types;

pub use builder::NetBuilder;
pub use types::*;

use crate::ident::{PlaceId, TransitionId};

#[derive(Debug, Clone)]
pub struct Net {
    name: String,
    places: Vec<Place>,
    transitions: Vec<Transition>,
    arcs_in: Vec<ArcIn>,
    arcs_out: Vec<ArcOut>,

    // Arc positions, indexed by transition
    inputs: Vec<Vec<usize>>,
    outputs: Vec<Vec<usize>>,
}

impl Net {
    /// Creates a net from its parts. This function returns an error if the arcs don't describe a
    /// valid structure.
    ///
    /// Correctness properties:
    ///
    /// - Every arc must reference a place and a transition of this net.
    /// - Every arc weight must be positive.
    pub fn new(
        name: impl Into<String>,
        places: Vec<Place>,
        transitions: Vec<Transition>,
        arcs_in: Vec<ArcIn>,
        arcs_out: Vec<ArcOut>,
    ) -> Result<Self, StructureError> {
        let name = name.into();
        let check = |place: PlaceId, transition: TransitionId, weight: Weight| {
            // CORRECTNESS: Every arc must reference a place and a transition of this net.
            if place.index() >= places.len() {
                return Err(StructureError::UnknownPlace(place));
            }
            if transition.index() >= transitions.len() {
                return Err(StructureError::UnknownTransition(transition));
            }
            // CORRECTNESS: Every arc weight must be positive.
            if weight == 0 {
                return Err(StructureError::NonPositiveWeight { place, transition });
            }
            Ok(())
        };
        let mut inputs = vec![Vec::new(); transitions.len()];
        let mut outputs = vec![Vec::new(); transitions.len()];
        for (i, arc) in arcs_in.iter().enumerate() {
            check(arc.place, arc.transition, arc.weight)?;
            inputs[arc.transition.index()].push(i);
        }
        for (i, arc) in arcs_out.iter().enumerate() {
            check(arc.place, arc.transition, arc.weight)?;
            outputs[arc.transition.index()].push(i);
        }
        log::debug!(
            "built net {name}: {} places, {} transitions, {} arcs",
            places.len(),
            transitions.len(),
            arcs_in.len() + arcs_out.len()
        );
        Ok(Self {
            name,
            places,
            transitions,
            arcs_in,
            arcs_out,
            inputs,
            outputs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn place(&self, id: PlaceId) -> Option<&Place> {
        self.places.get(id.index())
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transitions.get(id.index())
    }

    /// Returns the transitions of this net in declaration order.
    pub fn transition_ids(&self) -> impl Iterator<Item = TransitionId> {
        (0..self.transitions.len()).map(TransitionId::new)
    }

    /// Input arcs of `transition`, in declaration order.
    pub fn inputs(&self, transition: TransitionId) -> impl Iterator<Item = &ArcIn> + '_ {
        self.inputs
            .get(transition.index())
            .into_iter()
            .flatten()
            .map(|&i| &self.arcs_in[i])
    }

    /// Output arcs of `transition`, in declaration order.
    pub fn outputs(&self, transition: TransitionId) -> impl Iterator<Item = &ArcOut> + '_ {
        self.outputs
            .get(transition.index())
            .into_iter()
            .flatten()
            .map(|&i| &self.arcs_out[i])
    }

    /// Returns true if every input arc of `transition` is satisfied. `marking` reports the
    /// current marking of a place slot.
    pub fn is_enabled<F>(&self, transition: TransitionId, marking: F) -> bool
    where
        F: Fn(PlaceId) -> Marking,
    {
        self.is_enabled_with(transition, |slot| slot, marking)
    }

    /// Like [`Net::is_enabled`], but place slots are first mapped to keys by `resolve`.
    ///
    /// Consuming arcs whose slots resolve to the same key must be covered by that key's marking
    /// together. Unbounded-test arcs are checked on their own, since they take nothing.
    pub fn is_enabled_with<K, R, F>(
        &self,
        transition: TransitionId,
        resolve: R,
        marking: F,
    ) -> bool
    where
        K: PartialEq + Copy,
        R: Fn(PlaceId) -> K,
        F: Fn(K) -> Marking,
    {
        let mut demand: Vec<(K, Weight)> = Vec::new();
        for arc in self.inputs(transition) {
            let key = resolve(arc.place);
            if arc.unbounded {
                if marking(key) < arc.weight {
                    return false;
                }
                continue;
            }
            match demand.iter_mut().find(|(k, _)| *k == key) {
                Some((_, total)) => *total += arc.weight,
                None => demand.push((key, arc.weight)),
            }
        }
        demand.into_iter().all(|(key, total)| marking(key) >= total)
    }

    /// Removes the tokens `transition` consumes. `take` is called once per consuming arc.
    /// Unbounded-test arcs are skipped.
    pub fn consume<F>(&self, transition: TransitionId, mut take: F)
    where
        F: FnMut(PlaceId, Weight),
    {
        for arc in self.inputs(transition).filter(|arc| !arc.unbounded) {
            take(arc.place, arc.weight);
        }
    }

    /// Deposits the tokens a completed firing of `transition` produces.
    pub fn produce<F>(&self, transition: TransitionId, mut put: F)
    where
        F: FnMut(PlaceId, Weight),
    {
        for arc in self.outputs(transition) {
            put(arc.place, arc.weight);
        }
    }

    /// Tokens removed by one firing of `transition`.
    pub fn consumption(&self, transition: TransitionId) -> Weight {
        self.inputs(transition).map(ArcIn::consumption).sum()
    }

    /// Tokens deposited by one completed firing of `transition`.
    pub fn production(&self, transition: TransitionId) -> Weight {
        self.outputs(transition).map(|arc| arc.weight).sum()
    }

    delegate::delegate! {
        to self.places {
            #[call(iter)]
            pub fn places(&self) -> impl Iterator<Item = &Place>;

            #[call(len)]
            pub fn nr_places(&self) -> usize;
        }

        to self.transitions {
            #[call(iter)]
            pub fn transitions(&self) -> impl Iterator<Item = &Transition>;

            #[call(len)]
            pub fn nr_transitions(&self) -> usize;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    #[error("arc references place {0}, which is not in the net")]
    UnknownPlace(PlaceId),

    #[error("arc references transition {0}, which is not in the net")]
    UnknownTransition(TransitionId),

    #[error("arc between place {place} and transition {transition} has zero weight")]
    NonPositiveWeight {
        place: PlaceId,
        transition: TransitionId,
    },
}
