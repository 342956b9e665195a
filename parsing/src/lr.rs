// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

use automata::{CancelFlag, DotGraph, NodeShape};
use grammar::{Grammar, Production, Symbol};
use lexis::Token;
use log::{debug, warn};
use thiserror::Error;

use crate::tree::ParseTree;

// Backstop for the item-set worklist; canonical LR(1) state counts are
// finite but can explode, and a runaway indicates a bug rather than a
// legitimately huge grammar.
const STATE_CAP: usize = 1 << 16;

/// A dotted production without lookahead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ItemCore {
    production: Production,
    dot: usize,
}

impl ItemCore {
    fn start(production: Production) -> Self {
        Self { production, dot: 0 }
    }

    pub fn production(&self) -> &Production {
        &self.production
    }

    pub fn dot(&self) -> usize {
        self.dot
    }

    /// Complete when the dot has passed the whole right-hand side; an
    /// ε production is complete at dot 0.
    pub fn is_complete(&self) -> bool {
        self.dot >= self.production.len()
    }

    pub fn next_symbol(&self) -> Option<&Symbol> {
        self.production.right_hand_side().get(self.dot)
    }

    fn advanced(&self) -> Self {
        debug_assert!(!self.is_complete());
        Self {
            production: self.production.clone(),
            dot: self.dot + 1,
        }
    }

    // The symbols after the one the dot is at (the β of `A -> α · B β`).
    fn tail_after_next(&self) -> &[Symbol] {
        &self.production.right_hand_side()[(self.dot + 1).min(self.production.len())..]
    }
}

impl Display for ItemCore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ->", self.production.left_hand_side())?;
        for (index, symbol) in self.production.right_hand_side().iter().enumerate() {
            if index == self.dot {
                write!(f, " .")?;
            }
            write!(f, " {}", symbol)?;
        }
        if self.is_complete() {
            write!(f, " .")?;
        }
        Ok(())
    }
}

/// Lookahead constraint of an LR(1) item.  Only the augmented entry
/// item is unconstrained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookahead {
    Unconstrained,
    Tokens(BTreeSet<String>),
}

impl Lookahead {
    fn merge(&mut self, other: &Lookahead) -> bool {
        match (&mut *self, other) {
            (Lookahead::Unconstrained, _) => false,
            (current @ Lookahead::Tokens(_), Lookahead::Unconstrained) => {
                *current = Lookahead::Unconstrained;
                true
            }
            (Lookahead::Tokens(mine), Lookahead::Tokens(theirs)) => {
                let before = mine.len();
                mine.extend(theirs.iter().cloned());
                mine.len() > before
            }
        }
    }

    /// Whether a reduction under this constraint may fire on the given
    /// lookahead (`None` = end of input).
    fn matches(&self, lookahead: Option<&str>) -> bool {
        match self {
            Lookahead::Unconstrained => true,
            Lookahead::Tokens(tokens) => {
                lookahead.map(|t| tokens.contains(t)).unwrap_or(false)
            }
        }
    }

    fn contains(&self, terminal: &str) -> bool {
        match self {
            Lookahead::Unconstrained => true,
            Lookahead::Tokens(tokens) => tokens.contains(terminal),
        }
    }

    fn shared_terminals(&self, other: &Lookahead) -> BTreeSet<String> {
        match (self, other) {
            (Lookahead::Tokens(a), Lookahead::Tokens(b)) => a.intersection(b).cloned().collect(),
            (Lookahead::Unconstrained, Lookahead::Tokens(b)) => b.clone(),
            (Lookahead::Tokens(a), Lookahead::Unconstrained) => a.clone(),
            (Lookahead::Unconstrained, Lookahead::Unconstrained) => BTreeSet::new(),
        }
    }
}

impl Display for Lookahead {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Lookahead::Unconstrained => write!(f, "[*]"),
            Lookahead::Tokens(tokens) => {
                write!(f, "[")?;
                for (index, token) in tokens.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", token)?;
                }
                write!(f, "]")
            }
        }
    }
}

// An item set keyed by core with merged lookaheads.
type ItemSet = BTreeMap<ItemCore, Lookahead>;

/// One state of the item-set DFA.
#[derive(Debug, Clone)]
pub struct LrState {
    ident: u32,
    items: ItemSet,
    transitions: BTreeMap<Symbol, u32>,
}

impl LrState {
    pub fn ident(&self) -> u32 {
        self.ident
    }

    pub fn items(&self) -> impl Iterator<Item = (&ItemCore, &Lookahead)> {
        self.items.iter()
    }

    pub fn transition(&self, symbol: &Symbol) -> Option<u32> {
        self.transitions.get(symbol).copied()
    }

    fn describe(&self) -> String {
        let mut text = format!("state {}", self.ident);
        for (core, lookahead) in self.items.iter() {
            text += &format!("\n{} {}", core, lookahead);
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftReduceConflict {
    pub state: u32,
    pub lookahead: String,
    pub reduction: Production,
}

impl Display for ShiftReduceConflict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "state {} may shift \"{}\" or reduce by \"{}\"",
            self.state, self.lookahead, self.reduction
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceReduceConflict {
    pub state: u32,
    pub lookaheads: BTreeSet<String>,
    pub first: Production,
    pub second: Production,
}

impl Display for ReduceReduceConflict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let lookaheads: Vec<&str> = self.lookaheads.iter().map(|s| s.as_str()).collect();
        write!(
            f,
            "state {} may reduce by \"{}\" or \"{}\" on {{{}}}",
            self.state,
            self.first,
            self.second,
            lookaheads.join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LrBuildError {
    #[error("entry production does not match the pattern S' -> S $: {message}")]
    EntryPatternNotMatch { message: String },
    #[error("grammar is not LR(1): {0}")]
    ShiftReduceConflict(ShiftReduceConflict),
    #[error("grammar is not LR(1): {0}")]
    ReduceReduceConflict(ReduceReduceConflict),
    #[error("{phase} did not converge after {iterations} iterations")]
    DidNotConverge {
        phase: &'static str,
        iterations: usize,
    },
    #[error("{phase} was interrupted")]
    Interrupted { phase: &'static str },
}

/// The canonical LR(1) item-set DFA of an augmented grammar.
#[derive(Debug, Clone)]
pub struct LrAutomaton {
    grammar: Grammar,
    entry_production: Production,
    states: Vec<LrState>,
}

impl LrAutomaton {
    pub fn build(grammar: &Grammar) -> Result<Self, LrBuildError> {
        Self::build_with(grammar, &CancelFlag::never())
    }

    pub fn build_with(grammar: &Grammar, cancel: &CancelFlag) -> Result<Self, LrBuildError> {
        let entry_production = entry_production(grammar)?;
        let mut start_items = ItemSet::new();
        start_items.insert(
            ItemCore::start(entry_production.clone()),
            Lookahead::Unconstrained,
        );
        let start_items = closure(grammar, start_items, cancel)?;

        let mut automaton = Self {
            grammar: grammar.clone(),
            entry_production,
            states: vec![LrState {
                ident: 0,
                items: start_items,
                transitions: BTreeMap::new(),
            }],
        };

        let mut unprocessed = 0_usize;
        while unprocessed < automaton.states.len() {
            if cancel.is_canceled() {
                return Err(LrBuildError::Interrupted {
                    phase: "item-set construction",
                });
            }
            if automaton.states.len() > STATE_CAP {
                return Err(LrBuildError::DidNotConverge {
                    phase: "item-set construction",
                    iterations: automaton.states.len(),
                });
            }
            let mut outgoing = BTreeSet::new();
            for core in automaton.states[unprocessed].items.keys() {
                if let Some(symbol) = core.next_symbol() {
                    outgoing.insert(symbol.clone());
                }
            }
            for symbol in outgoing {
                let mut kernel = ItemSet::new();
                for (core, lookahead) in automaton.states[unprocessed].items.iter() {
                    if core.next_symbol() == Some(&symbol) {
                        kernel
                            .entry(core.advanced())
                            .or_insert_with(|| Lookahead::Tokens(BTreeSet::new()))
                            .merge(lookahead);
                    }
                }
                let successor_items = closure(&automaton.grammar, kernel, cancel)?;
                // canonical construction: states are equal only when
                // their whole item sets (lookaheads included) are
                let existing = automaton
                    .states
                    .iter()
                    .find(|state| state.items == successor_items)
                    .map(|state| state.ident);
                let successor = match existing {
                    Some(ident) => ident,
                    None => {
                        let ident = automaton.states.len() as u32;
                        automaton.states.push(LrState {
                            ident,
                            items: successor_items,
                            transitions: BTreeMap::new(),
                        });
                        ident
                    }
                };
                automaton.states[unprocessed].transitions.insert(symbol, successor);
            }
            unprocessed += 1;
        }
        debug!("item-set DFA has {} states", automaton.states.len());
        Ok(automaton)
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn entry_production(&self) -> &Production {
        &self.entry_production
    }

    pub fn states(&self) -> &[LrState] {
        &self.states
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Static scan for LR(1) conflicts.  The accept item (the complete
    /// entry production) takes no part: it fires only at end of input.
    pub fn conflicts(&self) -> (Vec<ShiftReduceConflict>, Vec<ReduceReduceConflict>) {
        let mut shift_reduce = vec![];
        let mut reduce_reduce = vec![];
        for state in &self.states {
            let reductions: Vec<(&ItemCore, &Lookahead)> = state
                .items
                .iter()
                .filter(|(core, _)| {
                    core.is_complete() && core.production() != &self.entry_production
                })
                .collect();
            for (index, &(first_core, first_lookahead)) in reductions.iter().enumerate() {
                for &(second_core, second_lookahead) in reductions[index + 1..].iter() {
                    let shared = first_lookahead.shared_terminals(second_lookahead);
                    if !shared.is_empty() {
                        reduce_reduce.push(ReduceReduceConflict {
                            state: state.ident,
                            lookaheads: shared,
                            first: first_core.production().clone(),
                            second: second_core.production().clone(),
                        });
                    }
                }
                for symbol in state.transitions.keys() {
                    if let Symbol::Terminal(terminal) = symbol {
                        if first_lookahead.contains(terminal) {
                            shift_reduce.push(ShiftReduceConflict {
                                state: state.ident,
                                lookahead: terminal.clone(),
                                reduction: first_core.production().clone(),
                            });
                        }
                    }
                }
            }
        }
        (shift_reduce, reduce_reduce)
    }

    /// Human-readable dump of every state, its items and transitions.
    pub fn describe(&self) -> String {
        let mut text = String::new();
        for state in &self.states {
            text += &state.describe();
            for (symbol, target) in state.transitions.iter() {
                text += &format!("\n  {} => state {}", symbol, target);
            }
            text.push('\n');
        }
        text
    }

    pub fn to_dot(&self, name: &str) -> DotGraph {
        let mut graph = DotGraph::new(name);
        for state in &self.states {
            let accepting = state
                .items
                .iter()
                .any(|(core, _)| core.is_complete() && core.production() == &self.entry_production);
            graph.add_node(
                state.ident.to_string(),
                state.describe(),
                NodeShape::for_role(state.ident == 0, accepting),
            );
        }
        for state in &self.states {
            for (symbol, target) in state.transitions.iter() {
                graph.add_edge(
                    state.ident.to_string(),
                    target.to_string(),
                    symbol.name(),
                    false,
                );
            }
        }
        graph
    }
}

// The augmented entry production `S' -> S $`; anything else is a
// malformed entry.
fn entry_production(grammar: &Grammar) -> Result<Production, LrBuildError> {
    let entry = match grammar.entry() {
        Some(symbol) if symbol.is_non_terminal() => symbol,
        _ => {
            return Err(LrBuildError::EntryPatternNotMatch {
                message: "grammar declares no non-terminal entry symbol".to_string(),
            })
        }
    };
    let alternatives = grammar.alternatives(entry.name());
    if alternatives.len() != 1 {
        return Err(LrBuildError::EntryPatternNotMatch {
            message: format!(
                "entry symbol \"{}\" must have exactly one production, found {}",
                entry,
                alternatives.len()
            ),
        });
    }
    let production = &alternatives[0];
    let rhs = production.right_hand_side();
    if rhs.len() != 2 || !rhs[1].is_end_marker() {
        return Err(LrBuildError::EntryPatternNotMatch {
            message: format!(
                "\"{}\" does not end in the end-of-input terminal",
                production
            ),
        });
    }
    Ok(production.clone())
}

// LR(1) closure: for `A -> α · B β, a` add every `B -> · γ` with
// lookahead FIRST(β a), iterating to a fixed point.
fn closure(
    grammar: &Grammar,
    mut items: ItemSet,
    cancel: &CancelFlag,
) -> Result<ItemSet, LrBuildError> {
    let terminal_count = grammar.terminals().count();
    let core_capacity: usize = grammar
        .productions()
        .iter()
        .map(|p| p.len() + 1)
        .sum::<usize>()
        + 1;
    let cap = core_capacity * (terminal_count + 2) + 2;

    let mut iterations = 0_usize;
    loop {
        if cancel.is_canceled() {
            return Err(LrBuildError::Interrupted {
                phase: "LR closure",
            });
        }
        iterations += 1;
        if iterations > cap {
            return Err(LrBuildError::DidNotConverge {
                phase: "LR closure",
                iterations,
            });
        }
        let mut changed = false;
        for (core, lookahead) in items.clone() {
            let non_terminal = match core.next_symbol() {
                Some(Symbol::NonTerminal(name)) => name.clone(),
                _ => continue,
            };
            let beta_first = grammar.first_of_sequence(core.tail_after_next());
            let new_lookahead = if beta_first.transparent {
                match &lookahead {
                    Lookahead::Unconstrained => Lookahead::Unconstrained,
                    Lookahead::Tokens(tokens) => {
                        let mut combined = beta_first.terminals.clone();
                        combined.extend(tokens.iter().cloned());
                        Lookahead::Tokens(combined)
                    }
                }
            } else {
                Lookahead::Tokens(beta_first.terminals.clone())
            };
            for production in grammar.alternatives(&non_terminal) {
                let new_core = ItemCore::start(production.clone());
                match items.get_mut(&new_core) {
                    Some(existing) => changed |= existing.merge(&new_lookahead),
                    None => {
                        items.insert(new_core, new_lookahead.clone());
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            return Ok(items);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LrParseErrorKind {
    #[error("no applicable action in state {state} at end of input")]
    NoAction { state: u32 },
    #[error("state {state} cannot shift \"{terminal}\"")]
    ShiftStateError { state: u32, terminal: String },
    #[error("stack top {found:?} does not match \"{production}\"")]
    InvalidReduction {
        production: Production,
        found: Vec<Symbol>,
    },
    #[error("no goto from state {state} on \"{non_terminal}\" after reduction")]
    ReductionStateError { state: u32, non_terminal: String },
    #[error("runtime shift/reduce conflict in state {state} on \"{lookahead}\"")]
    ShiftReduceConflict { state: u32, lookahead: String },
    #[error("runtime reduce/reduce conflict in state {state} on \"{lookahead}\"")]
    ReduceReduceConflict { state: u32, lookahead: String },
    #[error("parse did not converge after {iterations} steps")]
    DidNotConverge { iterations: usize },
}

/// A failed parse: the cause plus the partial tree built so far.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct LrParseError {
    pub kind: LrParseErrorKind,
    pub partial: ParseTree,
}

/// Canonical LR(1) shift/reduce parser.  Actions are decided directly
/// from the top state's items; no action table is materialized.
#[derive(Debug, Clone)]
pub struct LrParser {
    automaton: LrAutomaton,
    tolerant: bool,
}

impl LrParser {
    /// Build the automaton and reject conflicted grammars.
    pub fn new(grammar: &Grammar) -> Result<Self, LrBuildError> {
        let automaton = LrAutomaton::build(grammar)?;
        let (shift_reduce, reduce_reduce) = automaton.conflicts();
        if let Some(conflict) = shift_reduce.into_iter().next() {
            return Err(LrBuildError::ShiftReduceConflict(conflict));
        }
        if let Some(conflict) = reduce_reduce.into_iter().next() {
            return Err(LrBuildError::ReduceReduceConflict(conflict));
        }
        Ok(Self {
            automaton,
            tolerant: false,
        })
    }

    /// Keep a conflicted automaton for inspection; the driver warns on
    /// each conflicting decision and prefers reduction.
    pub fn new_tolerant(grammar: &Grammar) -> Result<Self, LrBuildError> {
        let automaton = LrAutomaton::build(grammar)?;
        let (shift_reduce, reduce_reduce) = automaton.conflicts();
        for conflict in &shift_reduce {
            warn!("LR automaton kept despite conflict: {}", conflict);
        }
        for conflict in &reduce_reduce {
            warn!("LR automaton kept despite conflict: {}", conflict);
        }
        Ok(Self {
            automaton,
            tolerant: true,
        })
    }

    pub fn automaton(&self) -> &LrAutomaton {
        &self.automaton
    }

    pub fn parse(&self, tokens: &[Token]) -> Result<ParseTree, LrParseError> {
        self.parse_traced(tokens).map(|(tree, _)| tree)
    }

    /// Like [`LrParser::parse`] but also returns the productions in
    /// reduction order, for diagnostics and tests.
    pub fn parse_traced(
        &self,
        tokens: &[Token],
    ) -> Result<(ParseTree, Vec<Production>), LrParseError> {
        let entry_symbol = self
            .automaton
            .entry_production
            .lhs_symbol();
        let mut tree = ParseTree::bottom_up(tokens);
        let mut reductions = vec![];
        let mut stack: Vec<(Symbol, u32)> = vec![];
        let mut position = 0_usize;
        let step_cap = (tokens.len() + 2)
            * (self.automaton.grammar.productions().len() + self.automaton.states.len() + 2)
            + 64;

        for steps in 0.. {
            if steps > step_cap {
                return Err(LrParseError {
                    kind: LrParseErrorKind::DidNotConverge { iterations: steps },
                    partial: tree,
                });
            }
            let state_id = stack.last().map(|(_, state)| *state).unwrap_or(0);
            let state = &self.automaton.states[state_id as usize];
            let lookahead = tokens.get(position).map(|t| t.kind());

            // reductions whose lookahead constraint admits the input;
            // cores are unique per production once complete
            let candidates: Vec<&ItemCore> = state
                .items
                .iter()
                .filter(|(core, la)| core.is_complete() && la.matches(lookahead))
                .map(|(core, _)| core)
                .collect();

            if candidates.len() > 1 {
                let kind = LrParseErrorKind::ReduceReduceConflict {
                    state: state_id,
                    lookahead: lookahead.unwrap_or("$").to_string(),
                };
                if self.tolerant {
                    warn!("{}; reducing by \"{}\"", kind, candidates[0].production());
                } else {
                    return Err(LrParseError {
                        kind,
                        partial: tree,
                    });
                }
            }

            if let Some(core) = candidates.first() {
                if let Some(terminal) = lookahead {
                    if state.transition(&Symbol::terminal(terminal)).is_some() {
                        let kind = LrParseErrorKind::ShiftReduceConflict {
                            state: state_id,
                            lookahead: terminal.to_string(),
                        };
                        if self.tolerant {
                            warn!("{}; reducing by \"{}\"", kind, core.production());
                        } else {
                            return Err(LrParseError {
                                kind,
                                partial: tree,
                            });
                        }
                    }
                }
                let production = core.production().clone();
                let count = production.len();
                if stack.len() < count {
                    return Err(LrParseError {
                        kind: LrParseErrorKind::InvalidReduction {
                            production,
                            found: stack.iter().map(|(symbol, _)| symbol.clone()).collect(),
                        },
                        partial: tree,
                    });
                }
                let popped = stack.split_off(stack.len() - count);
                let popped_symbols: Vec<Symbol> =
                    popped.iter().map(|(symbol, _)| symbol.clone()).collect();
                if popped_symbols.as_slice() != production.right_hand_side() {
                    return Err(LrParseError {
                        kind: LrParseErrorKind::InvalidReduction {
                            production,
                            found: popped_symbols,
                        },
                        partial: tree,
                    });
                }
                tree.reduce(stack.len(), count, &production);
                reductions.push(production.clone());

                let lhs = production.lhs_symbol();
                if lhs == entry_symbol && stack.is_empty() && position >= tokens.len() {
                    debug_assert!(tree.is_bottom_up_valid(&entry_symbol));
                    return Ok((tree, reductions));
                }
                let resume_state = stack.last().map(|(_, state)| *state).unwrap_or(0);
                match self.automaton.states[resume_state as usize].transition(&lhs) {
                    Some(next) => stack.push((lhs, next)),
                    None => {
                        return Err(LrParseError {
                            kind: LrParseErrorKind::ReductionStateError {
                                state: resume_state,
                                non_terminal: production.left_hand_side().to_string(),
                            },
                            partial: tree,
                        })
                    }
                }
                continue;
            }

            // no reduction applies: shift the next token
            match tokens.get(position) {
                None => {
                    return Err(LrParseError {
                        kind: LrParseErrorKind::NoAction { state: state_id },
                        partial: tree,
                    })
                }
                Some(token) => {
                    let symbol = Symbol::terminal(token.kind());
                    match state.transition(&symbol) {
                        Some(next) => {
                            // the token's leaf is already in the frontier;
                            // shifting adds no structure
                            stack.push((symbol, next));
                            position += 1;
                        }
                        None => {
                            return Err(LrParseError {
                                kind: LrParseErrorKind::ShiftStateError {
                                    state: state_id,
                                    terminal: token.kind().to_string(),
                                },
                                partial: tree,
                            })
                        }
                    }
                }
            }
        }
        unreachable!("the step loop always returns")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(name: &str) -> Symbol {
        Symbol::terminal(name)
    }

    fn nt(name: &str) -> Symbol {
        Symbol::non_terminal(name)
    }

    fn tokens(kinds: &[&str]) -> Vec<Token> {
        kinds
            .iter()
            .enumerate()
            .map(|(position, kind)| Token::new(*kind, *kind, position))
            .collect()
    }

    // S' -> S $ ; S -> C C ; C -> c C | d
    fn dragon_book() -> Grammar {
        Grammar::new(
            vec![
                Production::new("S'", vec![nt("S"), t("$")]),
                Production::new("S", vec![nt("C"), nt("C")]),
                Production::new("C", vec![t("c"), nt("C")]),
                Production::new("C", vec![t("d")]),
            ],
            Some(nt("S'")),
        )
        .unwrap()
    }

    #[test]
    fn entry_pattern_is_enforced() {
        let no_end = Grammar::new(
            vec![
                Production::new("S'", vec![nt("S")]),
                Production::new("S", vec![t("a")]),
            ],
            Some(nt("S'")),
        )
        .unwrap();
        assert!(matches!(
            LrAutomaton::build(&no_end).unwrap_err(),
            LrBuildError::EntryPatternNotMatch { .. }
        ));

        let no_entry = Grammar::new(vec![Production::new("S", vec![t("a")])], None).unwrap();
        assert!(matches!(
            LrAutomaton::build(&no_entry).unwrap_err(),
            LrBuildError::EntryPatternNotMatch { .. }
        ));
    }

    #[test]
    fn closure_pulls_in_first_of_tail_and_lookahead() {
        let grammar = dragon_book();
        let automaton = LrAutomaton::build(&grammar).unwrap();
        // state 0 = closure of the entry item
        let state = &automaton.states()[0];
        let items: BTreeMap<String, String> = state
            .items()
            .map(|(core, la)| (core.to_string(), la.to_string()))
            .collect();
        assert_eq!(items["S' -> . S $"], "[*]");
        assert_eq!(items["S -> . C C"], "[$]");
        // FIRST(C $) = { c, d }
        assert_eq!(items["C -> . c C"], "[c, d]");
        assert_eq!(items["C -> . d"], "[c, d]");
    }

    #[test]
    fn dragon_book_grammar_is_conflict_free() {
        let automaton = LrAutomaton::build(&dragon_book()).unwrap();
        let (shift_reduce, reduce_reduce) = automaton.conflicts();
        assert!(shift_reduce.is_empty());
        assert!(reduce_reduce.is_empty());
    }

    #[test]
    fn dragon_book_parse_reduces_in_the_expected_order() {
        let parser = LrParser::new(&dragon_book()).unwrap();
        let (tree, reductions) = parser.parse_traced(&tokens(&["c", "c", "d", "d", "$"])).unwrap();
        assert!(tree.is_bottom_up_valid(&nt("S'")));
        let rendered: Vec<String> = reductions.iter().map(|p| p.to_string()).collect();
        assert_eq!(
            rendered,
            [
                "C -> d",
                "C -> c C",
                "C -> d",
                "C -> c C",
                "S -> C C",
                "S' -> S $",
            ]
        );
    }

    #[test]
    fn rejected_input_reports_shift_failure() {
        let parser = LrParser::new(&dragon_book()).unwrap();
        let error = parser.parse(&tokens(&["c", "x", "$"])).unwrap_err();
        assert!(matches!(
            error.kind,
            LrParseErrorKind::ShiftStateError { .. }
        ));
    }

    #[test]
    fn truncated_input_reports_no_action() {
        let parser = LrParser::new(&dragon_book()).unwrap();
        let error = parser.parse(&tokens(&["c", "c"])).unwrap_err();
        assert!(matches!(error.kind, LrParseErrorKind::NoAction { .. }));
    }

    #[test]
    fn reduce_reduce_conflict_is_detected_statically() {
        // S' -> S $ ; S -> A | B ; A -> a ; B -> a
        let grammar = Grammar::new(
            vec![
                Production::new("S'", vec![nt("S"), t("$")]),
                Production::new("S", vec![nt("A")]),
                Production::new("S", vec![nt("B")]),
                Production::new("A", vec![t("a")]),
                Production::new("B", vec![t("a")]),
            ],
            Some(nt("S'")),
        )
        .unwrap();
        assert!(matches!(
            LrParser::new(&grammar).unwrap_err(),
            LrBuildError::ReduceReduceConflict(_)
        ));
        // tolerant construction keeps the automaton
        let parser = LrParser::new_tolerant(&grammar).unwrap();
        assert!(parser.automaton().state_count() > 0);
    }

    #[test]
    fn shift_reduce_conflict_is_detected_statically() {
        // dangling-else flavoured: E -> E + E | a
        let grammar = Grammar::new(
            vec![
                Production::new("S'", vec![nt("E"), t("$")]),
                Production::new("E", vec![nt("E"), t("+"), nt("E")]),
                Production::new("E", vec![t("a")]),
            ],
            Some(nt("S'")),
        )
        .unwrap();
        match LrParser::new(&grammar).unwrap_err() {
            LrBuildError::ShiftReduceConflict(conflict) => {
                assert_eq!(conflict.lookahead, "+");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn item_set_dfa_description_labels_states_with_items() {
        let automaton = LrAutomaton::build(&dragon_book()).unwrap();
        let text = automaton.to_dot("items").to_string();
        assert!(text.contains("S' -> . S $"));
        assert!(text.contains("shape=diamond"));
        assert!(text.contains("shape=doubleoctagon"));

        let described = automaton.describe();
        assert!(described.contains("state 0"));
        assert!(described.contains("S' -> . S $ [*]"));
        assert!(described.contains("=> state"));
    }

    #[test]
    fn epsilon_reductions_build_tree_nodes() {
        // S' -> S $ ; S -> a B ; B -> \e
        let grammar = Grammar::new(
            vec![
                Production::new("S'", vec![nt("S"), t("$")]),
                Production::new("S", vec![t("a"), nt("B")]),
                Production::new("B", vec![]),
            ],
            Some(nt("S'")),
        )
        .unwrap();
        let parser = LrParser::new(&grammar).unwrap();
        let (tree, reductions) = parser.parse_traced(&tokens(&["a", "$"])).unwrap();
        assert!(tree.is_bottom_up_valid(&nt("S'")));
        let rendered: Vec<String> = reductions.iter().map(|p| p.to_string()).collect();
        assert_eq!(rendered, ["B -> \\e", "S -> a B", "S' -> S $"]);
    }
}
