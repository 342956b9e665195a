// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Debug, Display};

use log::{debug, trace};

use crate::cancel::CancelFlag;
use crate::dot::{DotGraph, NodeShape};
use crate::error::FaError;
use crate::node::{State, StateId};

// Backstop for the subset-construction worklist; the subset lattice is
// finite but exponential, and a runaway here indicates a construction
// bug rather than a legitimately huge automaton.
const SUBSET_CAP: usize = 1 << 20;

/// A finite automaton over the abstract alphabet `I`.
///
/// The same type serves as NFA and DFA; `is_deterministic` tells them
/// apart and operations that require a DFA fail with [`FaError::NotADfa`].
/// Simulation state (`current`, match counters) lives on the automaton
/// and is rebuilt by [`Automaton::reset`].
#[derive(Debug, Clone)]
pub struct Automaton<I> {
    states: BTreeMap<StateId, State<I>>,
    current: BTreeSet<StateId>,
    steps: usize,
    max_match: usize,
}

impl<I> Automaton<I>
where
    I: Copy + Ord + Debug + Display,
{
    /// Wrap a set of states into an automaton.  Every transition target
    /// must be one of the supplied states.
    pub fn from_states(states: BTreeMap<StateId, State<I>>) -> Result<Self, FaError> {
        for state in states.values() {
            for (_, target) in state.transitions() {
                if !states.contains_key(target) {
                    return Err(FaError::invalid_input(format!(
                        "transition from state {} targets unknown state {}",
                        state.id(),
                        target
                    )));
                }
            }
        }
        let mut automaton = Self {
            states,
            current: BTreeSet::new(),
            steps: 0,
            max_match: 0,
        };
        automaton.reset();
        Ok(automaton)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> impl Iterator<Item = &State<I>> {
        self.states.values()
    }

    pub fn state(&self, id: StateId) -> Option<&State<I>> {
        self.states.get(&id)
    }

    pub fn start_states(&self) -> BTreeSet<StateId> {
        self.states
            .values()
            .filter(|s| s.is_start())
            .map(|s| s.id())
            .collect()
    }

    pub fn accepting_states(&self) -> BTreeSet<StateId> {
        self.states
            .values()
            .filter(|s| s.is_end())
            .map(|s| s.id())
            .collect()
    }

    pub fn is_deterministic(&self) -> bool {
        self.states.values().all(|s| s.is_deterministic())
    }

    /// Least fixpoint under ε reachability: the set plus every state an
    /// ε path leads to.
    pub fn epsilon_closure(&self, set: &BTreeSet<StateId>) -> BTreeSet<StateId> {
        let mut closure = set.clone();
        let mut pending: Vec<StateId> = set.iter().copied().collect();
        while let Some(id) = pending.pop() {
            if let Some(state) = self.states.get(&id) {
                for target in state.targets_on(None) {
                    if closure.insert(target) {
                        pending.push(target);
                    }
                }
            }
        }
        closure
    }

    /// Reinstall the start configuration and zero the match counters.
    pub fn reset(&mut self) {
        self.current = self.epsilon_closure(&self.start_states());
        self.steps = 0;
        self.max_match = 0;
    }

    pub fn current_states(&self) -> &BTreeSet<StateId> {
        &self.current
    }

    /// Consume one input symbol.  Returns `false` and goes stuck (empty
    /// current set) when no state has a matching transition; a stuck
    /// automaton stays stuck but never panics.
    pub fn step(&mut self, input: I) -> bool {
        let mut targets = BTreeSet::new();
        for id in &self.current {
            if let Some(state) = self.states.get(id) {
                targets.extend(state.targets_on(Some(input)));
            }
        }
        if targets.is_empty() {
            self.current.clear();
            return false;
        }
        self.current = self.epsilon_closure(&targets);
        self.steps += 1;
        if self.is_accepting() {
            self.max_match = self.steps;
        }
        true
    }

    /// Whether some accepting state is currently active.
    pub fn is_accepting(&self) -> bool {
        self.current
            .iter()
            .any(|id| self.states.get(id).map(|s| s.is_end()).unwrap_or(false))
    }

    /// Length of the longest accepting prefix seen since the last reset.
    pub fn max_match(&self) -> usize {
        self.max_match
    }

    /// Reset, feed the whole sequence, accept iff an accepting state
    /// remains at the end.
    pub fn accepts(&mut self, sequence: impl IntoIterator<Item = I>) -> bool {
        self.reset();
        for input in sequence {
            if !self.step(input) {
                return false;
            }
        }
        self.is_accepting()
    }

    /// Subset construction.
    pub fn to_dfa(&self) -> Result<Automaton<I>, FaError> {
        self.to_dfa_with(&CancelFlag::never())
    }

    pub fn to_dfa_with(&self, cancel: &CancelFlag) -> Result<Automaton<I>, FaError> {
        let start_subset = self.epsilon_closure(&self.start_states());
        let mut subset_ids = BTreeMap::<BTreeSet<StateId>, StateId>::new();
        let mut new_states = BTreeMap::<StateId, State<I>>::new();
        let mut worklist = vec![start_subset.clone()];
        subset_ids.insert(
            start_subset.clone(),
            self.install_subset_state(&start_subset, true, &mut new_states),
        );

        let mut processed = 0_usize;
        while let Some(subset) = worklist.pop() {
            if cancel.is_canceled() {
                return Err(FaError::Interrupted {
                    phase: "subset construction",
                });
            }
            processed += 1;
            if processed > SUBSET_CAP {
                return Err(FaError::DidNotConverge {
                    phase: "subset construction",
                    iterations: processed,
                });
            }
            let subset_id = subset_ids[&subset];
            let mut inputs = BTreeSet::new();
            for id in &subset {
                inputs.extend(self.states[id].input_signature());
            }
            for input in inputs {
                let mut targets = BTreeSet::new();
                for id in &subset {
                    targets.extend(self.states[id].targets_on(Some(input)));
                }
                let successor = self.epsilon_closure(&targets);
                let successor_id = match subset_ids.get(&successor) {
                    Some(id) => *id,
                    None => {
                        let id = self.install_subset_state(&successor, false, &mut new_states);
                        subset_ids.insert(successor.clone(), id);
                        worklist.push(successor);
                        id
                    }
                };
                new_states
                    .get_mut(&subset_id)
                    .expect("subset state was installed")
                    .add_transition(Some(input), successor_id);
            }
        }
        debug!(
            "subset construction: {} NFA states -> {} DFA states",
            self.states.len(),
            new_states.len()
        );
        Automaton::from_states(new_states)
    }

    // One DFA state per discovered subset: accepting iff any member is,
    // labelled with the union of member labels.
    fn install_subset_state(
        &self,
        subset: &BTreeSet<StateId>,
        is_start: bool,
        new_states: &mut BTreeMap<StateId, State<I>>,
    ) -> StateId {
        let mut state = State::new();
        state.set_start(is_start);
        state.set_end(subset.iter().any(|id| self.states[id].is_end()));
        for id in subset {
            state.extend_labels(self.states[id].labels());
        }
        let id = state.id();
        new_states.insert(id, state);
        id
    }

    /// Partition-refinement minimization.  Requires a DFA.
    ///
    /// The initial partition separates accepting states by their label
    /// set, so states playing different accepting roles (e.g. distinct
    /// token kinds) are never merged.
    pub fn minimize(&self) -> Result<Automaton<I>, FaError> {
        self.minimize_with(&CancelFlag::never())
    }

    pub fn minimize_with(&self, cancel: &CancelFlag) -> Result<Automaton<I>, FaError> {
        if !self.is_deterministic() {
            return Err(FaError::NotADfa);
        }

        let mut blocks: Vec<BTreeSet<StateId>> = {
            let mut by_role = BTreeMap::<(bool, BTreeSet<String>), BTreeSet<StateId>>::new();
            for state in self.states.values() {
                let role = if state.is_end() {
                    (true, state.labels().clone())
                } else {
                    (false, BTreeSet::new())
                };
                by_role.entry(role).or_default().insert(state.id());
            }
            by_role.into_values().collect()
        };

        let cap = self.states.len() + 1;
        for pass in 0.. {
            if cancel.is_canceled() {
                return Err(FaError::Interrupted {
                    phase: "minimization",
                });
            }
            if pass > cap {
                return Err(FaError::DidNotConverge {
                    phase: "minimization",
                    iterations: pass,
                });
            }
            let block_of: BTreeMap<StateId, usize> = blocks
                .iter()
                .enumerate()
                .flat_map(|(index, block)| block.iter().map(move |id| (*id, index)))
                .collect();
            let mut next: Vec<BTreeSet<StateId>> = vec![];
            for block in &blocks {
                // Split on outgoing signature and on the block each
                // input leads to.
                let mut groups =
                    BTreeMap::<(BTreeSet<I>, BTreeMap<I, usize>), BTreeSet<StateId>>::new();
                for id in block {
                    let state = &self.states[id];
                    let signature = state.input_signature();
                    let targets: BTreeMap<I, usize> = signature
                        .iter()
                        .filter_map(|input| {
                            state
                                .targets_on(Some(*input))
                                .next()
                                .map(|target| (*input, block_of[&target]))
                        })
                        .collect();
                    groups.entry((signature, targets)).or_default().insert(*id);
                }
                next.extend(groups.into_values());
            }
            if next.len() == blocks.len() {
                break;
            }
            trace!("minimization pass {}: {} blocks", pass, next.len());
            blocks = next;
        }

        let block_of: BTreeMap<StateId, usize> = blocks
            .iter()
            .enumerate()
            .flat_map(|(index, block)| block.iter().map(move |id| (*id, index)))
            .collect();
        // Block ids are allocated before the merged states are built so
        // cross-block transitions can be installed in one pass.
        let block_states: Vec<StateId> = blocks.iter().map(|_| StateId::fresh()).collect();
        let mut new_states = BTreeMap::new();
        for (index, block) in blocks.iter().enumerate() {
            let mut merged = State::new_with_id(block_states[index]);
            merged.set_start(block.iter().any(|id| self.states[id].is_start()));
            merged.set_end(block.iter().any(|id| self.states[id].is_end()));
            for id in block {
                merged.extend_labels(self.states[id].labels());
            }
            let representative = block.iter().next().expect("blocks are never empty");
            for input in self.states[representative].input_signature() {
                if let Some(target) = self.states[representative].targets_on(Some(input)).next() {
                    merged.add_transition(Some(input), block_states[block_of[&target]]);
                }
            }
            new_states.insert(block_states[index], merged);
        }

        let trimmed = trim_states(new_states);
        debug!(
            "minimization: {} states -> {}",
            self.states.len(),
            trimmed.len()
        );
        Automaton::from_states(trimmed)
    }

    /// Directed-graph description of this automaton: start = diamond,
    /// accept = double octagon, both = triple octagon, plain = box;
    /// ε edges are dashed.
    pub fn to_dot(&self, name: &str) -> DotGraph {
        let mut graph = DotGraph::new(name);
        for state in self.states.values() {
            let mut label = state.id().to_string();
            for text in state.labels() {
                label.push('\n');
                label.push_str(text);
            }
            graph.add_node(
                state.id().to_string(),
                label,
                NodeShape::for_role(state.is_start(), state.is_end()),
            );
        }
        for state in self.states.values() {
            for (input, target) in state.transitions() {
                match input {
                    Some(input) => graph.add_edge(
                        state.id().to_string(),
                        target.to_string(),
                        input.to_string(),
                        false,
                    ),
                    None => graph.add_edge(
                        state.id().to_string(),
                        target.to_string(),
                        String::new(),
                        true,
                    ),
                }
            }
        }
        graph
    }
}

// Remove states unreachable from the start (forward pass) and states
// that cannot reach an accepting state (backward pass).  Start states
// are always retained so the automaton keeps a configuration to run
// from, even when its language is empty.
fn trim_states<I>(states: BTreeMap<StateId, State<I>>) -> BTreeMap<StateId, State<I>>
where
    I: Copy + Ord + Debug + Display,
{
    let mut forward = BTreeSet::new();
    let mut pending: Vec<StateId> = states
        .values()
        .filter(|s| s.is_start())
        .map(|s| s.id())
        .collect();
    forward.extend(pending.iter().copied());
    while let Some(id) = pending.pop() {
        for (_, target) in states[&id].transitions() {
            if forward.insert(*target) {
                pending.push(*target);
            }
        }
    }

    let mut reversed = BTreeMap::<StateId, BTreeSet<StateId>>::new();
    for state in states.values() {
        for (_, target) in state.transitions() {
            reversed.entry(*target).or_default().insert(state.id());
        }
    }
    let mut backward = BTreeSet::new();
    let mut pending: Vec<StateId> = states
        .values()
        .filter(|s| s.is_end())
        .map(|s| s.id())
        .collect();
    backward.extend(pending.iter().copied());
    while let Some(id) = pending.pop() {
        if let Some(sources) = reversed.get(&id) {
            for source in sources {
                if backward.insert(*source) {
                    pending.push(*source);
                }
            }
        }
    }

    let keep: BTreeSet<StateId> = states
        .keys()
        .copied()
        .filter(|id| {
            (forward.contains(id) && backward.contains(id)) || states[id].is_start()
        })
        .collect();
    states
        .into_iter()
        .filter(|(id, _)| keep.contains(id))
        .map(|(id, state)| (id, state.retaining_targets(&keep)))
        .collect()
}

impl<I> State<I>
where
    I: Copy + Ord + Debug + Display,
{
    fn retaining_targets(self, keep: &BTreeSet<StateId>) -> State<I> {
        let mut state = State::new_with_id(self.id());
        state.set_start(self.is_start());
        state.set_end(self.is_end());
        state.extend_labels(self.labels());
        for (input, target) in self.transitions() {
            if keep.contains(target) {
                state.add_transition(*input, *target);
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(word: &str) -> Automaton<char> {
        // start -w-> ... -d-> accept
        let mut states = BTreeMap::new();
        let mut previous = State::new();
        previous.set_start(true);
        for c in word.chars() {
            let next = State::new();
            previous.add_transition(Some(c), next.id());
            states.insert(previous.id(), previous);
            previous = next;
        }
        previous.set_end(true);
        states.insert(previous.id(), previous);
        Automaton::from_states(states).unwrap()
    }

    #[test]
    fn rejects_dangling_transition() {
        let mut state = State::<char>::new();
        state.set_start(true);
        state.add_transition(Some('x'), StateId::fresh());
        let mut states = BTreeMap::new();
        states.insert(state.id(), state);
        assert!(matches!(
            Automaton::from_states(states),
            Err(FaError::InvalidInput { .. })
        ));
    }

    #[test]
    fn simulation_tracks_longest_accepting_prefix() {
        let mut fa = chain("ab");
        fa.reset();
        assert!(fa.step('a'));
        assert!(fa.step('b'));
        assert!(fa.is_accepting());
        assert_eq!(fa.max_match(), 2);
        // stuck, but quietly
        assert!(!fa.step('c'));
        assert!(!fa.step('a'));
        assert_eq!(fa.max_match(), 2);
    }

    #[test]
    fn accepts_resets_between_runs() {
        let mut fa = chain("ab");
        assert!(fa.accepts("ab".chars()));
        assert!(!fa.accepts("a".chars()));
        assert!(!fa.accepts("abb".chars()));
        assert!(fa.accepts("ab".chars()));
    }

    #[test]
    fn epsilon_closure_is_transitive() {
        let mut a = State::<char>::new();
        let mut b = State::<char>::new();
        let c = State::<char>::new();
        a.set_start(true);
        a.add_transition(None, b.id());
        b.add_transition(None, c.id());
        let (aid, cid) = (a.id(), c.id());
        let mut states = BTreeMap::new();
        for state in [a, b, c] {
            states.insert(state.id(), state);
        }
        let fa = Automaton::from_states(states).unwrap();
        let closure = fa.epsilon_closure(&[aid].into_iter().collect());
        assert_eq!(closure.len(), 3);
        assert!(closure.contains(&cid));
    }

    #[test]
    fn subset_construction_preserves_language() {
        // (a|b)a over explicit NFA states with an ε split
        let mut start = State::<char>::new();
        let mut left = State::<char>::new();
        let mut right = State::<char>::new();
        let mut middle = State::<char>::new();
        let mut accept = State::<char>::new();
        start.set_start(true);
        accept.set_end(true);
        start.add_transition(None, left.id());
        start.add_transition(None, right.id());
        left.add_transition(Some('a'), middle.id());
        right.add_transition(Some('b'), middle.id());
        middle.add_transition(Some('a'), accept.id());
        let mut states = BTreeMap::new();
        for state in [start, left, right, middle, accept] {
            states.insert(state.id(), state);
        }
        let mut nfa = Automaton::from_states(states).unwrap();
        assert!(!nfa.is_deterministic());
        let mut dfa = nfa.to_dfa().unwrap();
        assert!(dfa.is_deterministic());
        for word in ["aa", "ba", "a", "b", "aaa", ""] {
            assert_eq!(
                nfa.accepts(word.chars()),
                dfa.accepts(word.chars()),
                "disagreement on {:?}",
                word
            );
        }
    }

    #[test]
    fn minimization_requires_dfa() {
        let mut start = State::<char>::new();
        let end = State::<char>::new();
        start.set_start(true);
        start.add_transition(None, end.id());
        let mut states = BTreeMap::new();
        for state in [start, end] {
            states.insert(state.id(), state);
        }
        let fa = Automaton::from_states(states).unwrap();
        assert_eq!(fa.minimize().unwrap_err(), FaError::NotADfa);
    }

    #[test]
    fn minimization_merges_equivalent_states() {
        // Two separate accepting tails for the same residual language.
        let mut start = State::<char>::new();
        let mut upper = State::<char>::new();
        let mut lower = State::<char>::new();
        let mut accept_a = State::<char>::new();
        let mut accept_b = State::<char>::new();
        start.set_start(true);
        accept_a.set_end(true);
        accept_b.set_end(true);
        start.add_transition(Some('a'), upper.id());
        start.add_transition(Some('b'), lower.id());
        upper.add_transition(Some('c'), accept_a.id());
        lower.add_transition(Some('c'), accept_b.id());
        let mut states = BTreeMap::new();
        for state in [start, upper, lower, accept_a, accept_b] {
            states.insert(state.id(), state);
        }
        let mut dfa = Automaton::from_states(states).unwrap();
        let mut minimal = dfa.minimize().unwrap();
        assert_eq!(minimal.state_count(), 3);
        for word in ["ac", "bc", "c", "a", "abc", ""] {
            assert_eq!(
                dfa.accepts(word.chars()),
                minimal.accepts(word.chars()),
                "disagreement on {:?}",
                word
            );
        }
    }

    #[test]
    fn minimization_keeps_distinct_accepting_roles_apart() {
        // Accepting states with identical outgoing behaviour but
        // different token labels must not merge; a label-blind
        // refinement would collapse them and lose the roles.
        let mut start = State::<char>::new();
        let mut id_state = State::<char>::new();
        let mut kw_state = State::<char>::new();
        start.set_start(true);
        id_state.set_end(true);
        id_state.add_label("id");
        kw_state.set_end(true);
        kw_state.add_label("keyword");
        start.add_transition(Some('i'), id_state.id());
        start.add_transition(Some('k'), kw_state.id());
        let mut states = BTreeMap::new();
        for state in [start, id_state, kw_state] {
            states.insert(state.id(), state);
        }
        let fa = Automaton::from_states(states).unwrap();
        let minimal = fa.minimize().unwrap();
        assert_eq!(minimal.state_count(), 3);
        let labels: BTreeSet<String> = minimal
            .states()
            .filter(|s| s.is_end())
            .flat_map(|s| s.labels().iter().cloned())
            .collect();
        assert!(labels.contains("id") && labels.contains("keyword"));
    }

    #[test]
    fn trap_states_are_trimmed() {
        let mut start = State::<char>::new();
        let mut accept = State::<char>::new();
        let trap = State::<char>::new();
        start.set_start(true);
        accept.set_end(true);
        start.add_transition(Some('a'), accept.id());
        start.add_transition(Some('b'), trap.id());
        let mut states = BTreeMap::new();
        for state in [start, accept, trap] {
            states.insert(state.id(), state);
        }
        let fa = Automaton::from_states(states).unwrap();
        let minimal = fa.minimize().unwrap();
        assert_eq!(minimal.state_count(), 2);
    }

    #[test]
    fn cancellation_interrupts_construction() {
        let fa = chain("abc");
        let flag = CancelFlag::new();
        flag.cancel();
        assert!(matches!(
            fa.to_dfa_with(&flag),
            Err(FaError::Interrupted { .. })
        ));
    }
}
