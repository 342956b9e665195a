// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

use automata::CancelFlag;
use log::debug;

use crate::error::GrammarError;
use crate::production::Production;
use crate::symbol::{Symbol, END_MARKER};

/// FIRST data for one symbol or sentential form: the terminals a
/// derivation can begin with, plus `transparent` when it can derive ε.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSet {
    pub terminals: BTreeSet<String>,
    pub transparent: bool,
}

impl FirstSet {
    pub fn new() -> Self {
        FirstSet::default()
    }

    fn merge(&mut self, other: &FirstSet) -> bool {
        let before = self.terminals.len();
        self.terminals
            .extend(other.terminals.iter().cloned());
        let grew = self.terminals.len() > before;
        let became_transparent = other.transparent && !self.transparent;
        self.transparent |= other.transparent;
        grew || became_transparent
    }
}

impl Display for FirstSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (index, terminal) in self.terminals.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", terminal)?;
        }
        if self.transparent {
            if !self.terminals.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "\\e")?;
        }
        write!(f, "}}")
    }
}

// FIRST of a sentential form, read off a (possibly still growing)
// FIRST map.
fn first_of_sequence_in(firsts: &BTreeMap<Symbol, FirstSet>, sequence: &[Symbol]) -> FirstSet {
    let mut result = FirstSet::new();
    for symbol in sequence {
        match firsts.get(symbol) {
            Some(first) => {
                result.terminals.extend(first.terminals.iter().cloned());
                if !first.transparent {
                    return result;
                }
            }
            None => return result,
        }
    }
    result.transparent = true;
    result
}

/// A context-free grammar: productions in caller order, an optional
/// entry symbol and the memoized analysis results (used symbols,
/// productions by source, FIRST, FOLLOW).
#[derive(Debug, Clone)]
pub struct Grammar {
    productions: Vec<Production>,
    entry: Option<Symbol>,
    used_symbols: BTreeSet<Symbol>,
    by_lhs: BTreeMap<String, Vec<Production>>,
    firsts: BTreeMap<Symbol, FirstSet>,
    follows: BTreeMap<String, BTreeSet<String>>,
}

impl Grammar {
    pub fn new(productions: Vec<Production>, entry: Option<Symbol>) -> Result<Self, GrammarError> {
        Self::new_with(productions, entry, &CancelFlag::never())
    }

    pub fn new_with(
        productions: Vec<Production>,
        entry: Option<Symbol>,
        cancel: &CancelFlag,
    ) -> Result<Self, GrammarError> {
        let mut used_symbols = BTreeSet::new();
        let mut by_lhs = BTreeMap::<String, Vec<Production>>::new();
        for production in productions.iter() {
            used_symbols.insert(production.lhs_symbol());
            for symbol in production.right_hand_side() {
                used_symbols.insert(symbol.clone());
            }
            by_lhs
                .entry(production.left_hand_side().to_string())
                .or_default()
                .push(production.clone());
        }

        if let Some(entry) = &entry {
            if !used_symbols.contains(entry) {
                return Err(GrammarError::invalid_input(format!(
                    "entry symbol \"{}\" does not occur in any production",
                    entry
                )));
            }
        }
        for symbol in used_symbols.iter() {
            if symbol.is_non_terminal() && !by_lhs.contains_key(symbol.name()) {
                return Err(GrammarError::NoValidDerivation {
                    non_terminal: symbol.name().to_string(),
                });
            }
        }

        let firsts = compute_firsts(&productions, &used_symbols, cancel)?;
        let follows = compute_follows(&productions, &firsts, &used_symbols, entry.as_ref(), cancel)?;
        Ok(Self {
            productions,
            entry,
            used_symbols,
            by_lhs,
            firsts,
            follows,
        })
    }

    /// The productions in their original order.
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn entry(&self) -> Option<&Symbol> {
        self.entry.as_ref()
    }

    pub fn used_symbols(&self) -> &BTreeSet<Symbol> {
        &self.used_symbols
    }

    pub fn non_terminals(&self) -> impl Iterator<Item = &Symbol> {
        self.used_symbols.iter().filter(|s| s.is_non_terminal())
    }

    pub fn terminals(&self) -> impl Iterator<Item = &Symbol> {
        self.used_symbols.iter().filter(|s| s.is_terminal())
    }

    /// All productions with the given source, empty when there are none.
    pub fn alternatives(&self, left_hand_side: &str) -> &[Production] {
        self.by_lhs
            .get(left_hand_side)
            .map(|productions| productions.as_slice())
            .unwrap_or(&[])
    }

    pub fn first_of(&self, symbol: &Symbol) -> Option<&FirstSet> {
        self.firsts.get(symbol)
    }

    /// FIRST of a sentential form; the empty form is transparent.
    pub fn first_of_sequence(&self, sequence: &[Symbol]) -> FirstSet {
        first_of_sequence_in(&self.firsts, sequence)
    }

    /// FOLLOW of a non-terminal; may contain the end marker `$`.
    pub fn follow(&self, non_terminal: &str) -> Option<&BTreeSet<String>> {
        self.follows.get(non_terminal)
    }

    /// Human-readable summary of the grammar and its analysis results.
    pub fn describe(&self) -> String {
        let mut text = String::from("Productions:\n");
        for production in self.productions.iter() {
            text += &format!("  {}\n", production);
        }
        text += "FIRST:\n";
        for symbol in self.non_terminals() {
            if let Some(first) = self.firsts.get(symbol) {
                text += &format!("  FIRST({}) = {}\n", symbol, first);
            }
        }
        text += "FOLLOW:\n";
        for (name, follow) in self.follows.iter() {
            let items: Vec<&str> = follow.iter().map(|s| s.as_str()).collect();
            text += &format!("  FOLLOW({}) = {{{}}}\n", name, items.join(", "));
        }
        text
    }
}

// Iterative least fixpoint of the FIRST equations.  Terminals seed
// their own singleton; every pass folds each production's RHS into its
// source until nothing grows.
fn compute_firsts(
    productions: &[Production],
    used_symbols: &BTreeSet<Symbol>,
    cancel: &CancelFlag,
) -> Result<BTreeMap<Symbol, FirstSet>, GrammarError> {
    let mut firsts = BTreeMap::new();
    let mut terminal_count = 0_usize;
    for symbol in used_symbols {
        match symbol {
            Symbol::Terminal(name) => {
                terminal_count += 1;
                let mut first = FirstSet::new();
                first.terminals.insert(name.clone());
                firsts.insert(symbol.clone(), first);
            }
            Symbol::NonTerminal(_) => {
                firsts.insert(symbol.clone(), FirstSet::new());
            }
        }
    }

    // Monotone: each productive pass adds at least one terminal or one
    // transparency, so rounds are bounded by the sets' total capacity.
    let non_terminal_count = used_symbols.len() - terminal_count;
    let cap = non_terminal_count * (terminal_count + 1) + 2;
    let mut rounds = 0_usize;
    loop {
        if cancel.is_canceled() {
            return Err(GrammarError::Interrupted {
                phase: "FIRST computation",
            });
        }
        rounds += 1;
        if rounds > cap {
            return Err(GrammarError::DidNotConverge {
                phase: "FIRST computation",
                iterations: rounds,
            });
        }
        let mut changed = false;
        for production in productions {
            let rhs_first = first_of_sequence_in(&firsts, production.right_hand_side());
            let entry = firsts
                .get_mut(&production.lhs_symbol())
                .expect("all used symbols are seeded");
            changed |= entry.merge(&rhs_first);
        }
        if !changed {
            break;
        }
    }
    debug!("FIRST sets converged after {} rounds", rounds);
    Ok(firsts)
}

// Iterative least fixpoint of the FOLLOW equations.  The entry
// non-terminal is seeded with the end marker.
fn compute_follows(
    productions: &[Production],
    firsts: &BTreeMap<Symbol, FirstSet>,
    used_symbols: &BTreeSet<Symbol>,
    entry: Option<&Symbol>,
    cancel: &CancelFlag,
) -> Result<BTreeMap<String, BTreeSet<String>>, GrammarError> {
    let mut follows = BTreeMap::<String, BTreeSet<String>>::new();
    let mut terminal_count = 0_usize;
    for symbol in used_symbols {
        match symbol {
            Symbol::Terminal(_) => terminal_count += 1,
            Symbol::NonTerminal(name) => {
                follows.insert(name.clone(), BTreeSet::new());
            }
        }
    }
    if let Some(Symbol::NonTerminal(name)) = entry {
        follows
            .get_mut(name)
            .expect("entry was validated against used symbols")
            .insert(END_MARKER.to_string());
    }

    let cap = follows.len() * (terminal_count + 2) + 2;
    let mut rounds = 0_usize;
    loop {
        if cancel.is_canceled() {
            return Err(GrammarError::Interrupted {
                phase: "FOLLOW computation",
            });
        }
        rounds += 1;
        if rounds > cap {
            return Err(GrammarError::DidNotConverge {
                phase: "FOLLOW computation",
                iterations: rounds,
            });
        }
        let mut changed = false;
        for production in productions {
            let rhs = production.right_hand_side();
            for (index, symbol) in rhs.iter().enumerate() {
                let name = match symbol {
                    Symbol::NonTerminal(name) => name,
                    Symbol::Terminal(_) => continue,
                };
                let rest_first = first_of_sequence_in(firsts, &rhs[index + 1..]);
                {
                    let follow = follows.get_mut(name).expect("non-terminals are seeded");
                    let before = follow.len();
                    follow.extend(rest_first.terminals.iter().cloned());
                    changed |= follow.len() > before;
                }
                if rest_first.transparent {
                    let source_follow = follows
                        .get(production.left_hand_side())
                        .cloned()
                        .unwrap_or_default();
                    let follow = follows.get_mut(name).expect("non-terminals are seeded");
                    let before = follow.len();
                    follow.extend(source_follow);
                    changed |= follow.len() > before;
                }
            }
        }
        if !changed {
            break;
        }
    }
    debug!("FOLLOW sets converged after {} rounds", rounds);
    Ok(follows)
}
