use crate::ident::{PlaceId, TransitionId};

use super::{ArcIn, ArcOut, Marking, Net, Place, StructureError, Transition, Weight};

/// Incrementally declares a [`Net`]. The builder is the only allocator of place and transition
/// IDs, so IDs from one builder are meaningless to another.
#[derive(Debug)]
pub struct NetBuilder {
    name: String,
    places: Vec<Place>,
    transitions: Vec<Transition>,
    arcs_in: Vec<ArcIn>,
    arcs_out: Vec<ArcOut>,
}

impl NetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            places: Vec::new(),
            transitions: Vec::new(),
            arcs_in: Vec::new(),
            arcs_out: Vec::new(),
        }
    }

    /// Declares a place and returns its slot.
    pub fn place(&mut self, name: impl Into<String>, marking: Marking) -> PlaceId {
        self.places.push(Place::new(name, marking));
        PlaceId::new(self.places.len() - 1)
    }

    /// Declares a transition and returns its slot.
    pub fn transition(&mut self, transition: Transition) -> TransitionId {
        self.transitions.push(transition);
        TransitionId::new(self.transitions.len() - 1)
    }

    /// Adds an arc that consumes `weight` tokens from `place`.
    pub fn arc_in(
        &mut self,
        place: PlaceId,
        transition: TransitionId,
        weight: Weight,
    ) -> &mut Self {
        self.arcs_in.push(ArcIn::new(place, transition, weight));
        self
    }

    /// Adds an arc that requires `weight` tokens in `place` without consuming them.
    pub fn test_arc(
        &mut self,
        place: PlaceId,
        transition: TransitionId,
        weight: Weight,
    ) -> &mut Self {
        self.arcs_in.push(ArcIn::unbounded(place, transition, weight));
        self
    }

    pub fn arc_out(
        &mut self,
        transition: TransitionId,
        place: PlaceId,
        weight: Weight,
    ) -> &mut Self {
        self.arcs_out.push(ArcOut::new(transition, place, weight));
        self
    }

    /// Validates the declarations and produces the net.
    pub fn build(self) -> Result<Net, StructureError> {
        Net::new(
            self.name,
            self.places,
            self.transitions,
            self.arcs_in,
            self.arcs_out,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_allocates_sequential_ids() {
        let mut b = NetBuilder::new("Ids");
        assert_eq!(b.place("a", 0), PlaceId::new(0));
        assert_eq!(b.place("b", 1), PlaceId::new(1));
        let t = b.transition(Transition::new("t", 1.0).unwrap());
        assert_eq!(t, TransitionId::new(0));
        // A fresh builder starts counting again.
        let mut other = NetBuilder::new("Other");
        assert_eq!(other.place("c", 0), PlaceId::ZERO);
    }

    #[test]
    fn foreign_ids_are_rejected() {
        let mut b = NetBuilder::new("Small");
        let p = b.place("p", 1);
        let t = b.transition(Transition::new("t", 1.0).unwrap());
        b.arc_in(p, t, 1).arc_out(t, PlaceId::new(7), 1);
        assert!(matches!(b.build(), Err(StructureError::UnknownPlace(..))));
    }
}
