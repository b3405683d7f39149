//! Runtime: enabled sets, firing semantics and the bounded execution loop.
use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use rand::seq::IndexedRandom;
use thiserror::Error;

use crate::net::exec::{Execution, Outcome};
use crate::net::ids::{NetId, PlaceId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::{Arc, ArcDirection, Marking, Place, Transition};

/// Step budget used by [`Net::execute`].
pub const DEFAULT_MAX_STEPS: usize = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetError {
    #[error("place {0:?} is not part of this net")]
    ForeignPlace(PlaceId),
    #[error("transition {0:?} is not part of this net")]
    ForeignTransition(TransitionId),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FireError {
    #[error("transition {0:?} is not part of this net")]
    ForeignTransition(TransitionId),
    #[error("transition {0:?} is not enabled under the supplied marking")]
    NotEnabled(TransitionId),
}

/// Connectivity report for a net.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticReport {
    /// Places that no arc touches.
    pub isolated_places: Vec<(PlaceId, String)>,
    /// Transitions with neither inputs nor outputs.
    pub isolated_transitions: Vec<(TransitionId, String)>,
    /// Transitions without inputs; they stay enabled forever.
    pub source_transitions: Vec<(TransitionId, String)>,
    pub total_places: usize,
    pub total_transitions: usize,
}

impl DiagnosticReport {
    pub fn has_issues(&self) -> bool {
        !self.isolated_places.is_empty()
            || !self.isolated_transitions.is_empty()
            || !self.source_transitions.is_empty()
    }
}

#[derive(Clone)]
pub struct Net {
    id: NetId,
    places: IndexVec<PlaceId, Place>,
    transitions: IndexVec<TransitionId, Transition>,
}

impl fmt::Debug for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Net")
            .field("id", &self.id)
            .field("places", &self.places)
            .field("transitions", &self.transitions)
            .finish()
    }
}

impl Net {
    pub fn empty() -> Self {
        Self {
            id: NetId::fresh(),
            places: IndexVec::new(),
            transitions: IndexVec::new(),
        }
    }

    pub fn id(&self) -> NetId {
        self.id
    }

    /// Adds a place named `p{n}`, where `n` is the number of places so far.
    pub fn place(&mut self) -> PlaceId {
        let name = format!("p{}", self.places.len());
        self.place_named(name)
    }

    pub fn place_named(&mut self, name: impl Into<String>) -> PlaceId {
        let id = PlaceId::new(self.id, next_raw(self.places.len()));
        self.places.push(Place::new(id, name));
        id
    }

    /// Adds a transition named `t{n}`, where `n` is the number of transitions so far.
    pub fn transition(&mut self) -> TransitionId {
        let name = format!("t{}", self.transitions.len());
        self.transition_named(name)
    }

    pub fn transition_named(&mut self, name: impl Into<String>) -> TransitionId {
        let id = TransitionId::new(self.id, next_raw(self.transitions.len()));
        self.transitions.push(Transition::new(id, name));
        id
    }

    pub fn contains_place(&self, place: PlaceId) -> bool {
        place.net() == self.id && place.index() < self.places.len()
    }

    pub fn contains_transition(&self, transition: TransitionId) -> bool {
        transition.net() == self.id && transition.index() < self.transitions.len()
    }

    pub fn get_place(&self, place: PlaceId) -> Option<&Place> {
        if place.net() != self.id {
            return None;
        }
        self.places.get(place)
    }

    pub fn get_transition(&self, transition: TransitionId) -> Option<&Transition> {
        if transition.net() != self.id {
            return None;
        }
        self.transitions.get(transition)
    }

    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.places.iter()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    pub fn places_len(&self) -> usize {
        self.places.len()
    }

    pub fn transitions_len(&self) -> usize {
        self.transitions.len()
    }

    /// First place registered under `name`.
    pub fn find_place(&self, name: &str) -> Option<PlaceId> {
        self.places.iter().find(|p| p.name() == name).map(Place::id)
    }

    /// First transition registered under `name`.
    pub fn find_transition(&self, name: &str) -> Option<TransitionId> {
        self.transitions
            .iter()
            .find(|t| t.name() == name)
            .map(Transition::id)
    }

    /// Connects a place and a transition in either direction.
    ///
    /// `net.arc(p, t)` makes `p` an input of `t`; `net.arc(t, p)` makes `p`
    /// an output of `t`.
    pub fn arc<S, D>(&mut self, source: S, target: D) -> Result<(), NetError>
    where
        (S, D): Into<Arc>,
    {
        self.add_arc((source, target).into())
    }

    pub fn add_arc(&mut self, arc: Arc) -> Result<(), NetError> {
        if !self.contains_place(arc.place) {
            return Err(NetError::ForeignPlace(arc.place));
        }
        if !self.contains_transition(arc.transition) {
            return Err(NetError::ForeignTransition(arc.transition));
        }

        let transition = &mut self.transitions[arc.transition];
        let added = match arc.direction {
            ArcDirection::PlaceToTransition => transition.add_incoming(arc.place),
            ArcDirection::TransitionToPlace => transition.add_outgoing(arc.place),
        };
        if !added {
            log::trace!("ignoring duplicate arc {:?}", arc);
        }
        Ok(())
    }

    /// Input arc: place -> transition.
    pub fn add_input_arc(
        &mut self,
        place: PlaceId,
        transition: TransitionId,
    ) -> Result<(), NetError> {
        self.add_arc(Arc::new(place, transition, ArcDirection::PlaceToTransition))
    }

    /// Output arc: transition -> place.
    pub fn add_output_arc(
        &mut self,
        transition: TransitionId,
        place: PlaceId,
    ) -> Result<(), NetError> {
        self.add_arc(Arc::new(place, transition, ArcDirection::TransitionToPlace))
    }

    /// Enabled transitions, in registration order.
    pub fn enabled_transitions(&self, marking: &Marking) -> Vec<TransitionId> {
        let enabled = self
            .transitions
            .iter()
            .filter(|t| t.can_fire(marking))
            .map(Transition::id)
            .collect::<Vec<_>>();
        log::trace!("enabled under {:?}: {:?}", marking, enabled);
        enabled
    }

    pub fn can_fire(&self, marking: &Marking) -> bool {
        self.transitions.iter().any(|t| t.can_fire(marking))
    }

    pub fn fire_transition(
        &self,
        marking: &Marking,
        transition: TransitionId,
    ) -> Result<Marking, FireError> {
        let transition = self
            .get_transition(transition)
            .ok_or(FireError::ForeignTransition(transition))?;
        marking.fire_transition(transition)
    }

    /// Performs one execution step and reports which transition fired.
    ///
    /// Returns `None` if nothing is enabled. With several enabled transitions
    /// the choice is uniform over `rng`; a single enabled transition fires
    /// without drawing from it.
    pub fn step<R>(&self, marking: &Marking, rng: &mut R) -> Option<(TransitionId, Marking)>
    where
        R: Rng + ?Sized,
    {
        let enabled = self.enabled_transitions(marking);
        let chosen = match enabled.as_slice() {
            [] => return None,
            [only] => *only,
            many => *many.choose(rng)?,
        };

        let transition = &self.transitions[chosen];
        log::debug!("firing {} ({} enabled)", transition.name(), enabled.len());
        Some((chosen, marking.fire_enabled(transition)))
    }

    /// Performs one execution step.
    ///
    /// A marking with nothing enabled is terminal and comes back unchanged.
    pub fn fire<R>(&self, marking: &Marking, rng: &mut R) -> Marking
    where
        R: Rng + ?Sized,
    {
        match self.step(marking, rng) {
            Some((_, next)) => next,
            None => marking.clone(),
        }
    }

    /// Fires until nothing is enabled or [`DEFAULT_MAX_STEPS`] steps were taken.
    pub fn execute<R>(&self, marking: &Marking, rng: &mut R) -> Execution
    where
        R: Rng + ?Sized,
    {
        self.execute_bounded(marking, DEFAULT_MAX_STEPS, rng)
    }

    /// Fires until nothing is enabled or `max_steps` steps were taken.
    ///
    /// Hitting the budget is not an error; it is reported through
    /// [`Execution::outcome`].
    pub fn execute_bounded<R>(&self, marking: &Marking, max_steps: usize, rng: &mut R) -> Execution
    where
        R: Rng + ?Sized,
    {
        self.execute_with(marking, max_steps, rng, |_, _, _| {})
    }

    /// Like [`Net::execute_bounded`], calling `on_step` after every firing
    /// with the step index, the fired transition and the resulting marking.
    pub fn execute_with<R, F>(
        &self,
        marking: &Marking,
        max_steps: usize,
        rng: &mut R,
        mut on_step: F,
    ) -> Execution
    where
        R: Rng + ?Sized,
        F: FnMut(usize, TransitionId, &Marking),
    {
        let mut current = marking.clone();
        let mut fired = Vec::new();

        while fired.len() < max_steps {
            let Some((transition, next)) = self.step(&current, rng) else {
                break;
            };
            on_step(fired.len(), transition, &next);
            fired.push(transition);
            current = next;
        }

        let outcome = if self.can_fire(&current) {
            Outcome::StepLimitReached
        } else {
            Outcome::Converged
        };
        log::debug!("execution stopped after {} steps: {:?}", fired.len(), outcome);
        Execution::new(current, fired, outcome)
    }

    pub fn diagnose_connectivity(&self) -> DiagnosticReport {
        let mut connected = HashSet::new();
        let mut isolated_transitions = Vec::new();
        let mut source_transitions = Vec::new();

        for transition in self.transitions.iter() {
            connected.extend(transition.incoming());
            connected.extend(transition.outgoing());

            if !transition.has_incoming() && !transition.has_outgoing() {
                isolated_transitions.push((transition.id(), transition.name().to_owned()));
            } else if transition.is_source() {
                source_transitions.push((transition.id(), transition.name().to_owned()));
            }
        }

        let isolated_places = self
            .places
            .iter()
            .filter(|place| !connected.contains(&place.id()))
            .map(|place| (place.id(), place.name().to_owned()))
            .collect();

        DiagnosticReport {
            isolated_places,
            isolated_transitions,
            source_transitions,
            total_places: self.places_len(),
            total_transitions: self.transitions_len(),
        }
    }

    pub fn log_diagnostics(&self) {
        let report = self.diagnose_connectivity();

        if !report.has_issues() {
            log::info!(
                "net has {} places and {} transitions, all connected",
                report.total_places,
                report.total_transitions
            );
            return;
        }

        for (_, name) in &report.isolated_places {
            log::warn!("place '{}' is not connected to any transition", name);
        }
        for (_, name) in &report.isolated_transitions {
            log::warn!("transition '{}' has no arcs and is always enabled", name);
        }
        for (_, name) in &report.source_transitions {
            log::warn!("transition '{}' has no inputs and is always enabled", name);
        }
    }
}

impl Default for Net {
    fn default() -> Self {
        Self::empty()
    }
}

/// Panics once the arena outgrows 32-bit handles.
fn next_raw(len: usize) -> u32 {
    u32::try_from(len).expect("net arena exceeds u32::MAX entries")
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn handle_index_follows_arena_length() {
        assert_eq!(next_raw(0), 0);
        assert_eq!(next_raw(u32::MAX as usize), u32::MAX);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    #[should_panic(expected = "net arena exceeds u32::MAX entries")]
    fn handle_index_overflow_panics() {
        next_raw(u32::MAX as usize + 1);
    }

    #[test]
    fn default_names_count_every_entry() {
        let mut net = Net::empty();
        let first = net.place();
        let named = net.place_named("start");
        let third = net.place();
        let t0 = net.transition_named("go");
        let t1 = net.transition();

        assert_eq!(net.get_place(first).unwrap().name(), "p0");
        assert_eq!(net.get_place(named).unwrap().name(), "start");
        assert_eq!(net.get_place(third).unwrap().name(), "p2");
        assert_eq!(net.get_transition(t0).unwrap().name(), "go");
        assert_eq!(net.get_transition(t1).unwrap().name(), "t1");
        assert_eq!(net.places_len(), 3);
        assert_eq!(net.transitions_len(), 2);
    }

    #[test]
    fn same_names_stay_distinct() {
        let mut net = Net::empty();
        let a = net.place_named("p");
        let b = net.place_named("p");
        assert_ne!(a, b);
        assert_eq!(net.find_place("p"), Some(a));
    }

    #[test]
    fn arcs_into_foreign_nets_are_rejected() {
        let mut net = Net::empty();
        let mut other = Net::empty();
        let p = net.place();
        let t = net.transition();
        let foreign_p = other.place();
        let foreign_t = other.transition();

        assert_eq!(
            net.arc(foreign_p, t),
            Err(NetError::ForeignPlace(foreign_p))
        );
        assert_eq!(
            net.arc(foreign_t, p),
            Err(NetError::ForeignTransition(foreign_t))
        );
        assert_eq!(
            net.add_input_arc(p, foreign_t),
            Err(NetError::ForeignTransition(foreign_t))
        );
        assert!(net.get_transition(t).unwrap().is_source());
    }

    #[test]
    fn arc_direction_follows_argument_order() {
        let mut net = Net::empty();
        let p0 = net.place();
        let p1 = net.place();
        let t = net.transition();
        net.arc(p0, t).unwrap();
        net.arc(t, p1).unwrap();

        let transition = net.get_transition(t).unwrap();
        assert_eq!(transition.incoming().collect::<Vec<_>>(), vec![p0]);
        assert_eq!(transition.outgoing().collect::<Vec<_>>(), vec![p1]);
    }

    #[test]
    fn enabled_transitions_keep_registration_order() {
        let mut net = Net::empty();
        let p = net.place();
        let t0 = net.transition();
        let t1 = net.transition();
        let t2 = net.transition();
        net.arc(p, t0).unwrap();
        net.arc(p, t2).unwrap();
        net.arc(p, t1).unwrap();

        let marking = Marking::from_places([p]);
        assert_eq!(net.enabled_transitions(&marking), vec![t0, t1, t2]);
        assert!(net.enabled_transitions(&Marking::new()).is_empty());
        assert!(!net.can_fire(&Marking::new()));
    }

    #[test]
    fn fire_on_terminal_marking_is_a_no_op() {
        let mut net = Net::empty();
        let p0 = net.place();
        let p1 = net.place();
        let t = net.transition();
        net.arc(p0, t).unwrap();
        net.arc(t, p1).unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        let marking = Marking::from_places([p1]);
        assert_eq!(net.fire(&marking, &mut rng), marking);
        assert!(net.step(&marking, &mut rng).is_none());
    }

    #[test]
    fn fire_transition_checks_ownership_and_enablement() {
        let mut net = Net::empty();
        let other = {
            let mut n = Net::empty();
            n.transition()
        };
        let p = net.place();
        let t = net.transition();
        net.arc(p, t).unwrap();

        assert_eq!(
            net.fire_transition(&Marking::new(), other),
            Err(FireError::ForeignTransition(other))
        );
        assert_eq!(
            net.fire_transition(&Marking::new(), t),
            Err(FireError::NotEnabled(t))
        );
        assert_eq!(
            net.fire_transition(&Marking::from_places([p]), t),
            Ok(Marking::new())
        );
    }

    #[test]
    fn random_choice_covers_every_enabled_transition() {
        let mut net = Net::empty();
        let src = net.place();
        let left = net.place();
        let right = net.place();
        let tl = net.transition();
        let tr = net.transition();
        net.arc(src, tl).unwrap();
        net.arc(tl, left).unwrap();
        net.arc(src, tr).unwrap();
        net.arc(tr, right).unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        let marking = Marking::from_places([src]);
        let mut seen = HashSet::new();
        for _ in 0..64 {
            let (fired, next) = net.step(&marking, &mut rng).unwrap();
            assert!(next.contains(left) ^ next.contains(right));
            seen.insert(fired);
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn step_cap_is_reported() {
        let mut net = Net::empty();
        let p = net.place();
        let t = net.transition();
        net.arc(p, t).unwrap();
        net.arc(t, p).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let execution = net.execute_bounded(&Marking::from_places([p]), 5, &mut rng);
        assert_eq!(execution.steps(), 5);
        assert_eq!(execution.outcome(), Outcome::StepLimitReached);
        assert!(execution.marking().contains(p));
    }

    #[test]
    fn zero_budget_on_terminal_marking_converges() {
        let mut net = Net::empty();
        let p = net.place();
        let t = net.transition();
        net.arc(p, t).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let execution = net.execute_bounded(&Marking::new(), 0, &mut rng);
        assert_eq!(execution.steps(), 0);
        assert!(execution.is_converged());
    }

    #[test]
    fn diagnostics_flag_isolated_and_source_nodes() {
        let mut net = Net::empty();
        let lonely = net.place_named("lonely");
        let out = net.place();
        let idle = net.transition_named("idle");
        let spawn = net.transition_named("spawn");
        net.arc(spawn, out).unwrap();

        let report = net.diagnose_connectivity();
        assert!(report.has_issues());
        assert_eq!(report.isolated_places, vec![(lonely, "lonely".to_owned())]);
        assert_eq!(report.isolated_transitions, vec![(idle, "idle".to_owned())]);
        assert_eq!(report.source_transitions, vec![(spawn, "spawn".to_owned())]);
        assert_eq!(report.total_places, 2);
        assert_eq!(report.total_transitions, 2);
    }
}
