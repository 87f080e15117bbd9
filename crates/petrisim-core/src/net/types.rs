use crate::delay::{Delay, DelayError, DelayKind};
use crate::ident::{PlaceId, TransitionId};

/// Token counts.
pub type Marking = u64;

/// Arc weights. A valid weight is strictly positive.
pub type Weight = u64;

/// Transition priorities. Lower values fire first.
pub type Priority = i32;

/// A place declaration: a name and the marking it starts with.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Place {
    pub name: String,
    pub marking: Marking,
}

impl Place {
    pub fn new(name: impl Into<String>, marking: Marking) -> Self {
        Self {
            name: name.into(),
            marking,
        }
    }
}

/// A timed transition.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transition {
    pub name: String,
    delay: Delay,
    priority: Priority,
}

impl Transition {
    /// Creates a transition with a deterministic delay and priority 0.
    pub fn new(name: impl Into<String>, mean: f64) -> Result<Self, DelayError> {
        Ok(Self {
            name: name.into(),
            delay: Delay::deterministic(mean)?,
            priority: 0,
        })
    }

    /// Replaces the delay distribution, keeping the current mean.
    pub fn set_distribution(&mut self, kind: DelayKind, spread: f64) -> Result<(), DelayError> {
        self.delay = Delay::new(kind, self.delay.mean(), spread)?;
        Ok(())
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    pub fn with_distribution(mut self, kind: DelayKind, spread: f64) -> Result<Self, DelayError> {
        self.set_distribution(kind, spread)?;
        Ok(self)
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.set_priority(priority);
        self
    }

    pub fn delay(&self) -> &Delay {
        &self.delay
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }
}

/// An input arc. Normal arcs consume `weight` tokens when the transition fires. Unbounded-test
/// arcs only require `weight` tokens to be present and never consume them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_new::new, serde::Serialize, serde::Deserialize)]
pub struct ArcIn {
    pub place: PlaceId,
    pub transition: TransitionId,
    pub weight: Weight,
    #[new(default)]
    pub unbounded: bool,
}

impl ArcIn {
    /// Creates an unbounded-test arc.
    pub fn unbounded(place: PlaceId, transition: TransitionId, weight: Weight) -> Self {
        Self {
            place,
            transition,
            weight,
            unbounded: true,
        }
    }

    /// The number of tokens this arc removes on firing.
    pub fn consumption(&self) -> Weight {
        if self.unbounded {
            0
        } else {
            self.weight
        }
    }
}

/// An output arc. Deposits `weight` tokens when a firing completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_new::new, serde::Serialize, serde::Deserialize)]
pub struct ArcOut {
    pub transition: TransitionId,
    pub place: PlaceId,
    pub weight: Weight,
}
