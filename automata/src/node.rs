// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::collections::BTreeSet;
use std::fmt::{self, Debug, Display};
use std::sync::atomic::{AtomicU32, Ordering};

// Process-wide source of state identifiers.  Freshly generated ids are
// unique across every automaton built in one process, so states created
// by subset construction can be composed between automata without
// collisions.  This counter is the only module-level mutable datum in
// the crate.
static NEXT_STATE_ID: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(u32);

impl StateId {
    pub fn fresh() -> Self {
        StateId(NEXT_STATE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single automaton state: role flags, opaque diagnostic labels and a
/// list of labelled or ε transitions.  `None` as an input is ε.
#[derive(Debug, Clone)]
pub struct State<I> {
    id: StateId,
    is_start: bool,
    is_end: bool,
    labels: BTreeSet<String>,
    transitions: Vec<(Option<I>, StateId)>,
}

impl<I> State<I>
where
    I: Copy + Ord + Debug + Display,
{
    pub fn new() -> Self {
        Self::new_with_id(StateId::fresh())
    }

    /// Build a state under a caller-supplied id.  Used when ids must be
    /// known before the states exist (minimization block ids, reader
    /// name resolution); everything else takes a fresh id.
    pub fn new_with_id(id: StateId) -> Self {
        Self {
            id,
            is_start: false,
            is_end: false,
            labels: BTreeSet::new(),
            transitions: vec![],
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn is_start(&self) -> bool {
        self.is_start
    }

    pub fn is_end(&self) -> bool {
        self.is_end
    }

    pub fn set_start(&mut self, is_start: bool) {
        self.is_start = is_start;
    }

    pub fn set_end(&mut self, is_end: bool) {
        self.is_end = is_end;
    }

    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    pub fn add_label(&mut self, label: impl Into<String>) {
        self.labels.insert(label.into());
    }

    pub fn extend_labels<'a>(&mut self, labels: impl IntoIterator<Item = &'a String>) {
        for label in labels {
            self.labels.insert(label.clone());
        }
    }

    /// Add a transition unless an identical one is already present.
    /// Returns `false` on the duplicate.
    pub fn add_transition(&mut self, input: Option<I>, target: StateId) -> bool {
        if self.transitions.contains(&(input, target)) {
            return false;
        }
        self.transitions.push((input, target));
        true
    }

    pub fn transitions(&self) -> impl Iterator<Item = &(Option<I>, StateId)> {
        self.transitions.iter()
    }

    /// Targets reachable on exactly `input` (ε when `None`).
    pub fn targets_on(&self, input: Option<I>) -> impl Iterator<Item = StateId> + '_ {
        self.transitions
            .iter()
            .filter(move |(label, _)| *label == input)
            .map(|(_, target)| *target)
    }

    /// The set of non-ε inputs labelling outgoing transitions.
    pub fn input_signature(&self) -> BTreeSet<I> {
        self.transitions
            .iter()
            .filter_map(|(label, _)| *label)
            .collect()
    }

    /// A state is usable inside a DFA when it has no ε transitions and
    /// no two transitions share an input symbol.
    pub fn is_deterministic(&self) -> bool {
        let mut seen = BTreeSet::new();
        for (label, _) in self.deduplicated() {
            match label {
                None => return false,
                Some(input) => {
                    if !seen.insert(input) {
                        return false;
                    }
                }
            }
        }
        true
    }

    // Transitions with exact duplicates collapsed; duplicates are
    // semantically ignored everywhere.
    fn deduplicated(&self) -> BTreeSet<(Option<I>, StateId)> {
        self.transitions.iter().copied().collect()
    }
}

impl<I> Default for State<I>
where
    I: Copy + Ord + Debug + Display,
{
    fn default() -> Self {
        State::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_unique() {
        let a = State::<char>::new();
        let b = State::<char>::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn add_transition_is_idempotent() {
        let mut state = State::<char>::new();
        let target = StateId::fresh();
        assert!(state.add_transition(Some('a'), target));
        assert!(!state.add_transition(Some('a'), target));
        assert_eq!(state.transitions().count(), 1);
    }

    #[test]
    fn determinism_check() {
        let mut state = State::<char>::new();
        let t1 = StateId::fresh();
        let t2 = StateId::fresh();
        state.add_transition(Some('a'), t1);
        assert!(state.is_deterministic());
        state.add_transition(Some('a'), t2);
        assert!(!state.is_deterministic());

        let mut state = State::<char>::new();
        state.add_transition(None, t1);
        assert!(!state.is_deterministic());
    }
}
