//! Static net elements: places, transitions, arcs and markings.
use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexSet;

use crate::net::core::FireError;
use crate::net::ids::{PlaceId, TransitionId};

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Place {
    id: PlaceId,
    name: String,
}

impl Place {
    pub(crate) fn new(id: PlaceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> PlaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Place").field(&self.name).finish()
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A transition and the places it consumes from and produces into.
///
/// Arcs are kept as sets in insertion order: adding the same arc twice has no
/// further effect on enablement or firing.
#[derive(Clone, PartialEq, Eq)]
pub struct Transition {
    id: TransitionId,
    name: String,
    incoming: IndexSet<PlaceId>,
    outgoing: IndexSet<PlaceId>,
}

impl Transition {
    pub(crate) fn new(id: TransitionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            incoming: IndexSet::new(),
            outgoing: IndexSet::new(),
        }
    }

    pub fn id(&self) -> TransitionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `false` if `place` was already an input.
    pub(crate) fn add_incoming(&mut self, place: PlaceId) -> bool {
        self.incoming.insert(place)
    }

    /// Returns `false` if `place` was already an output.
    pub(crate) fn add_outgoing(&mut self, place: PlaceId) -> bool {
        self.outgoing.insert(place)
    }

    pub fn incoming(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.incoming.iter().copied()
    }

    pub fn outgoing(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.outgoing.iter().copied()
    }

    pub fn has_incoming(&self) -> bool {
        !self.incoming.is_empty()
    }

    /// Source transitions have no inputs and are enabled under every marking.
    pub fn is_source(&self) -> bool {
        !self.has_incoming()
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    pub fn can_fire(&self, marking: &Marking) -> bool {
        self.incoming.iter().all(|place| marking.contains(*place))
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("name", &self.name)
            .field("incoming", &self.incoming)
            .field("outgoing", &self.outgoing)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArcDirection {
    PlaceToTransition,
    TransitionToPlace,
}

/// A directed edge between a place and a transition.
///
/// Built from `(PlaceId, TransitionId)` for an input arc and from
/// `(TransitionId, PlaceId)` for an output arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arc {
    pub place: PlaceId,
    pub transition: TransitionId,
    pub direction: ArcDirection,
}

impl Arc {
    pub fn new(place: PlaceId, transition: TransitionId, direction: ArcDirection) -> Self {
        Self {
            place,
            transition,
            direction,
        }
    }
}

impl From<(PlaceId, TransitionId)> for Arc {
    fn from((place, transition): (PlaceId, TransitionId)) -> Self {
        Self::new(place, transition, ArcDirection::PlaceToTransition)
    }
}

impl From<(TransitionId, PlaceId)> for Arc {
    fn from((transition, place): (TransitionId, PlaceId)) -> Self {
        Self::new(place, transition, ArcDirection::TransitionToPlace)
    }
}

/// The set of places currently holding a token.
///
/// A marking is a plain value: firing produces a new marking and leaves the
/// receiver untouched. It does not remember which net its places belong to.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Marking(BTreeSet<PlaceId>);

impl Marking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_places<I>(places: I) -> Self
    where
        I: IntoIterator<Item = PlaceId>,
    {
        Self(places.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, place: PlaceId) -> bool {
        self.0.contains(&place)
    }

    /// Returns a copy of this marking with a token added to `place`.
    pub fn with(&self, place: PlaceId) -> Self {
        let mut next = self.clone();
        next.0.insert(place);
        next
    }

    /// Fires `transition`, returning the successor marking.
    ///
    /// Inputs are removed before outputs are added, so a place that is both
    /// an input and an output of `transition` keeps its token.
    pub fn fire_transition(&self, transition: &Transition) -> Result<Marking, FireError> {
        if !transition.can_fire(self) {
            return Err(FireError::NotEnabled(transition.id()));
        }
        Ok(self.fire_enabled(transition))
    }

    /// Caller guarantees `transition.can_fire(self)`.
    pub(crate) fn fire_enabled(&self, transition: &Transition) -> Marking {
        let mut next = self.clone();
        for place in transition.incoming() {
            next.0.remove(&place);
        }
        for place in transition.outgoing() {
            next.0.insert(place);
        }
        next
    }
}

impl FromIterator<PlaceId> for Marking {
    fn from_iter<I: IntoIterator<Item = PlaceId>>(iter: I) -> Self {
        Self::from_places(iter)
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}
