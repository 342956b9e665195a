// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Debug, Display};

use crate::fa::Automaton;
use crate::node::{State, StateId};

/// Regular-expression combinator tree over the abstract alphabet `I`.
///
/// Deliberately a closed sum: each variant has exactly one compilation
/// rule and case analysis is exhaustive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regex<I> {
    Char(I),
    CharClass(BTreeSet<I>),
    Concat(Box<Regex<I>>, Box<Regex<I>>),
    Alt(Box<Regex<I>>, Box<Regex<I>>),
    Star(Box<Regex<I>>),
}

impl<I> Regex<I>
where
    I: Copy + Ord + Debug + Display,
{
    pub fn class(items: impl IntoIterator<Item = I>) -> Self {
        Regex::CharClass(items.into_iter().collect())
    }

    pub fn concat(left: Regex<I>, right: Regex<I>) -> Self {
        Regex::Concat(Box::new(left), Box::new(right))
    }

    pub fn alt(left: Regex<I>, right: Regex<I>) -> Self {
        Regex::Alt(Box::new(left), Box::new(right))
    }

    pub fn star(inner: Regex<I>) -> Self {
        Regex::Star(Box::new(inner))
    }

    /// Matches exactly the empty string (`∅*`).
    pub fn empty_string() -> Self {
        Regex::star(Regex::CharClass(BTreeSet::new()))
    }

    /// Left-folded concatenation; the empty sequence matches ε.
    pub fn sequence(exprs: impl IntoIterator<Item = Regex<I>>) -> Self {
        let mut exprs = exprs.into_iter();
        match exprs.next() {
            None => Regex::empty_string(),
            Some(first) => exprs.fold(first, Regex::concat),
        }
    }

    /// Left-folded alternation; the empty choice matches nothing.
    pub fn choice(exprs: impl IntoIterator<Item = Regex<I>>) -> Self {
        let mut exprs = exprs.into_iter();
        match exprs.next() {
            None => Regex::CharClass(BTreeSet::new()),
            Some(first) => exprs.fold(first, Regex::alt),
        }
    }

    /// One or more repetitions.
    pub fn plus(inner: Regex<I>) -> Self {
        Regex::concat(inner.clone(), Regex::star(inner))
    }

    /// Zero or one occurrence.
    pub fn opt(inner: Regex<I>) -> Self {
        Regex::alt(inner, Regex::empty_string())
    }

    /// Thompson construction.  The result is an NFA; callers normally
    /// determinize and minimize it.
    pub fn compile(&self) -> Automaton<I> {
        let fragment = self.fragment();
        let mut states = fragment.states;
        states
            .get_mut(&fragment.start)
            .expect("fragment start exists")
            .set_start(true);
        states
            .get_mut(&fragment.accept)
            .expect("fragment accept exists")
            .set_end(true);
        Automaton::from_states(states).expect("fragments are internally consistent")
    }

    // Each fragment has exactly one entry and one exit state; parents
    // stitch fragments together with ε moves only.
    fn fragment(&self) -> Fragment<I> {
        match self {
            Regex::Char(input) => {
                let mut fragment = Fragment::bare();
                fragment.connect(fragment.start, Some(*input), fragment.accept);
                fragment
            }
            Regex::CharClass(inputs) => {
                let mut fragment = Fragment::bare();
                for input in inputs {
                    fragment.connect(fragment.start, Some(*input), fragment.accept);
                }
                fragment
            }
            Regex::Concat(left, right) => {
                let left = left.fragment();
                let right = right.fragment();
                let mut fragment = Fragment {
                    start: left.start,
                    accept: right.accept,
                    states: left.states,
                };
                fragment.states.extend(right.states);
                fragment.connect(left.accept, None, right.start);
                fragment
            }
            Regex::Alt(left, right) => {
                let left = left.fragment();
                let right = right.fragment();
                let mut fragment = Fragment::bare();
                fragment.states.extend(left.states);
                fragment.states.extend(right.states);
                fragment.connect(fragment.start, None, left.start);
                fragment.connect(fragment.start, None, right.start);
                fragment.connect(left.accept, None, fragment.accept);
                fragment.connect(right.accept, None, fragment.accept);
                fragment
            }
            Regex::Star(inner) => {
                let inner = inner.fragment();
                let mut fragment = Fragment::bare();
                fragment.states.extend(inner.states);
                fragment.connect(fragment.start, None, fragment.accept);
                fragment.connect(fragment.start, None, inner.start);
                fragment.connect(inner.accept, None, fragment.start);
                fragment
            }
        }
    }
}

struct Fragment<I> {
    start: StateId,
    accept: StateId,
    states: BTreeMap<StateId, State<I>>,
}

impl<I> Fragment<I>
where
    I: Copy + Ord + Debug + Display,
{
    // A fresh, unconnected (start, accept) pair.
    fn bare() -> Self {
        let start = State::new();
        let accept = State::new();
        let (start_id, accept_id) = (start.id(), accept.id());
        let mut states = BTreeMap::new();
        states.insert(start_id, start);
        states.insert(accept_id, accept);
        Fragment {
            start: start_id,
            accept: accept_id,
            states,
        }
    }

    fn connect(&mut self, from: StateId, input: Option<I>, to: StateId) {
        self.states
            .get_mut(&from)
            .expect("fragment states are present")
            .add_transition(input, to);
    }
}
