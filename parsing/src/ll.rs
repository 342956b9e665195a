// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

use grammar::{Grammar, Production, Symbol, END_MARKER};
use lexis::Token;
use log::warn;
use thiserror::Error;

use crate::tree::ParseTree;

/// `SELECT(A -> α) = (FIRST(α) \ ε) ∪ (FOLLOW(A) if ε ∈ FIRST(α))`.
pub fn select_set(grammar: &Grammar, production: &Production) -> BTreeSet<String> {
    let first = grammar.first_of_sequence(production.right_hand_side());
    let mut select = first.terminals.clone();
    if first.transparent {
        if let Some(follow) = grammar.follow(production.left_hand_side()) {
            select.extend(follow.iter().cloned());
        }
    }
    select
}

/// Two productions of one non-terminal competing for the same
/// lookahead terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectConflict {
    pub non_terminal: String,
    pub lookahead: String,
    pub kept: Production,
    pub rejected: Production,
}

impl Display for SelectConflict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "select sets of \"{}\" and \"{}\" both contain \"{}\"",
            self.kept, self.rejected, self.lookahead
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlBuildError {
    #[error("grammar declares no non-terminal entry symbol")]
    EntryUndefined,
    #[error("grammar is not LL(1): select-set conflict on \"{non_terminal}\"")]
    SelectSetConflict {
        non_terminal: String,
        conflicts: Vec<SelectConflict>,
    },
}

/// The LL(1) parse table `M[A, t] -> production`, kept as a map rather
/// than a two-dimensional array.
#[derive(Debug, Clone)]
pub struct LlTable {
    grammar: Grammar,
    cells: BTreeMap<(String, String), Production>,
    conflicts: Vec<SelectConflict>,
}

impl LlTable {
    /// Build the table, aborting on the first select-set conflict.
    pub fn build(grammar: &Grammar) -> Result<Self, LlBuildError> {
        let table = Self::assemble(grammar);
        match table.conflicts.first() {
            None => Ok(table),
            Some(first) => Err(LlBuildError::SelectSetConflict {
                non_terminal: first.non_terminal.clone(),
                conflicts: table.conflicts,
            }),
        }
    }

    /// Build the table keeping the first production per cell even when
    /// conflicts arise; every conflict is logged and retained for
    /// inspection.
    pub fn build_tolerant(grammar: &Grammar) -> Self {
        let table = Self::assemble(grammar);
        for conflict in &table.conflicts {
            warn!(
                "LL(1) table for \"{}\" kept despite conflict: {}",
                conflict.non_terminal, conflict
            );
        }
        table
    }

    fn assemble(grammar: &Grammar) -> Self {
        let mut cells = BTreeMap::new();
        let mut conflicts = vec![];
        for production in grammar.productions() {
            for lookahead in select_set(grammar, production) {
                let key = (production.left_hand_side().to_string(), lookahead.clone());
                match cells.get(&key) {
                    None => {
                        cells.insert(key, production.clone());
                    }
                    Some(kept) if kept == production => (),
                    Some(kept) => conflicts.push(SelectConflict {
                        non_terminal: production.left_hand_side().to_string(),
                        lookahead,
                        kept: kept.clone(),
                        rejected: production.clone(),
                    }),
                }
            }
        }
        Self {
            grammar: grammar.clone(),
            cells,
            conflicts,
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn conflicts(&self) -> &[SelectConflict] {
        &self.conflicts
    }

    pub fn is_ll1(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn production_for(&self, non_terminal: &str, lookahead: &str) -> Option<&Production> {
        self.cells
            .get(&(non_terminal.to_string(), lookahead.to_string()))
    }

    /// Human-readable dump of the table cells and any conflicts.
    pub fn describe(&self) -> String {
        let mut text = String::from("LL(1) table:\n");
        for ((non_terminal, lookahead), production) in self.cells.iter() {
            text += &format!("  M[{}, {}] = {}\n", non_terminal, lookahead, production);
        }
        if !self.conflicts.is_empty() {
            text += "Conflicts:\n";
            for conflict in &self.conflicts {
                text += &format!("  {}\n", conflict);
            }
        }
        text
    }
}

/// Convenience check used after transforms: does an LL(1) table exist
/// for this grammar?
pub fn is_ll1(grammar: &Grammar) -> bool {
    LlTable::assemble(grammar).is_ll1()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlParseErrorKind {
    #[error("no move for non-terminal \"{non_terminal}\" on lookahead \"{lookahead}\"")]
    NoMove {
        non_terminal: String,
        lookahead: String,
    },
    #[error("token {index}: expected \"{expected}\", got \"{got}\"")]
    TokenMismatch {
        index: usize,
        expected: String,
        got: String,
    },
    #[error("parse stopped after consuming {consumed} of {total} tokens")]
    Incomplete { consumed: usize, total: usize },
    #[error("derivation did not converge after {iterations} steps")]
    DidNotConverge { iterations: usize },
}

/// A failed parse: the cause plus the partial tree built so far.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct LlParseError {
    pub kind: LlParseErrorKind,
    pub partial: ParseTree,
}

/// Table-driven top-down parser producing a parse tree.
#[derive(Debug, Clone)]
pub struct LlParser {
    table: LlTable,
    entry: Symbol,
}

impl LlParser {
    pub fn new(grammar: &Grammar) -> Result<Self, LlBuildError> {
        let entry = Self::entry_of(grammar)?;
        Ok(Self {
            table: LlTable::build(grammar)?,
            entry,
        })
    }

    /// Parser over a conflicted table (first production per cell wins);
    /// parses are guarded by a step cap instead of the LL(1) property.
    pub fn new_tolerant(grammar: &Grammar) -> Result<Self, LlBuildError> {
        let entry = Self::entry_of(grammar)?;
        Ok(Self {
            table: LlTable::build_tolerant(grammar),
            entry,
        })
    }

    fn entry_of(grammar: &Grammar) -> Result<Symbol, LlBuildError> {
        match grammar.entry() {
            Some(symbol) if symbol.is_non_terminal() => Ok(symbol.clone()),
            _ => Err(LlBuildError::EntryUndefined),
        }
    }

    pub fn table(&self) -> &LlTable {
        &self.table
    }

    pub fn parse(&self, tokens: &[Token]) -> Result<ParseTree, LlParseError> {
        let mut tree = ParseTree::top_down(self.entry.clone());
        let mut cursor = 0_usize;
        let step_cap =
            (tokens.len() + 2) * (self.table.grammar.productions().len() + 2) * 4 + 64;
        let mut steps = 0_usize;

        loop {
            // match newly exposed terminal leaves one for one
            while cursor < tree.leaves().len() {
                let symbol = tree
                    .leaf(cursor)
                    .symbol()
                    .expect("frontier nodes always carry a symbol")
                    .clone();
                if symbol.is_non_terminal() {
                    break;
                }
                match tokens.get(cursor) {
                    Some(token) if token.kind() == symbol.name() => {
                        tree.bind(cursor, token.clone());
                        cursor += 1;
                    }
                    Some(token) => {
                        return Err(LlParseError {
                            kind: LlParseErrorKind::TokenMismatch {
                                index: cursor,
                                expected: symbol.name().to_string(),
                                got: token.kind().to_string(),
                            },
                            partial: tree,
                        })
                    }
                    None => {
                        return Err(LlParseError {
                            kind: LlParseErrorKind::TokenMismatch {
                                index: cursor,
                                expected: symbol.name().to_string(),
                                got: END_MARKER.to_string(),
                            },
                            partial: tree,
                        })
                    }
                }
            }

            if cursor >= tree.leaves().len() {
                // the frontier is exhausted; all input must be too
                if cursor == tokens.len() && tree.is_top_down_valid() {
                    return Ok(tree);
                }
                return Err(LlParseError {
                    kind: LlParseErrorKind::Incomplete {
                        consumed: cursor,
                        total: tokens.len(),
                    },
                    partial: tree,
                });
            }

            let non_terminal = tree
                .leaf(cursor)
                .symbol()
                .expect("frontier nodes always carry a symbol")
                .name()
                .to_string();
            let lookahead = tokens
                .get(cursor)
                .map(|t| t.kind().to_string())
                .unwrap_or_else(|| END_MARKER.to_string());
            let production = match self.table.production_for(&non_terminal, &lookahead) {
                Some(production) => production.clone(),
                None => {
                    return Err(LlParseError {
                        kind: LlParseErrorKind::NoMove {
                            non_terminal,
                            lookahead,
                        },
                        partial: tree,
                    })
                }
            };
            tree.derive(cursor, &production);

            steps += 1;
            if steps > step_cap {
                return Err(LlParseError {
                    kind: LlParseErrorKind::DidNotConverge { iterations: steps },
                    partial: tree,
                });
            }
        }
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

    fn token(kind: &str, position: usize) -> Token {
        Token::new(kind, kind, position)
    }

    fn tokens(kinds: &[&str]) -> Vec<Token> {
        kinds
            .iter()
            .enumerate()
            .map(|(position, kind)| token(kind, position))
            .collect()
    }

    // S -> E $ ; E -> T F ; F -> + E | \e ; T -> ( E ) | int U ;
    // U -> * T | \e
    fn arithmetic() -> Grammar {
        Grammar::new(
            vec![
                Production::new("S", vec![nt("E"), t("$")]),
                Production::new("E", vec![nt("T"), nt("F")]),
                Production::new("F", vec![t("+"), nt("E")]),
                Production::new("F", vec![]),
                Production::new("T", vec![t("("), nt("E"), t(")")]),
                Production::new("T", vec![t("int"), nt("U")]),
                Production::new("U", vec![t("*"), nt("T")]),
                Production::new("U", vec![]),
            ],
            Some(nt("S")),
        )
        .unwrap()
    }

    #[test]
    fn select_sets_combine_first_and_follow() {
        let grammar = arithmetic();
        let f_to_epsilon = Production::new("F", vec![]);
        let select: Vec<String> = select_set(&grammar, &f_to_epsilon).into_iter().collect();
        // FOLLOW(F) = FOLLOW(E) = { $, ) }
        assert_eq!(select, ["$", ")"]);
        let t_int = Production::new("T", vec![t("int"), nt("U")]);
        let select: Vec<String> = select_set(&grammar, &t_int).into_iter().collect();
        assert_eq!(select, ["int"]);
    }

    #[test]
    fn table_build_succeeds_for_ll1_grammar() {
        let grammar = arithmetic();
        let table = LlTable::build(&grammar).unwrap();
        assert!(table.is_ll1());
        let described = table.describe();
        assert!(described.contains("M[F, $] = F -> \\e"));
        assert!(!described.contains("Conflicts:"));
        assert_eq!(
            table.production_for("F", "$"),
            Some(&Production::new("F", vec![]))
        );
        assert_eq!(
            table.production_for("T", "("),
            Some(&Production::new(
                "T",
                vec![t("("), nt("E"), t(")")]
            ))
        );
        assert_eq!(table.production_for("T", "+"), None);
    }

    #[test]
    fn conflicting_grammar_is_rejected_with_context() {
        // left recursion makes both alternatives start with "b"
        let grammar = Grammar::new(
            vec![
                Production::new("S", vec![nt("S"), t("a")]),
                Production::new("S", vec![t("b")]),
            ],
            Some(nt("S")),
        )
        .unwrap();
        match LlTable::build(&grammar).unwrap_err() {
            LlBuildError::SelectSetConflict {
                non_terminal,
                conflicts,
            } => {
                assert_eq!(non_terminal, "S");
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].lookahead, "b");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!is_ll1(&grammar));
        // tolerant build keeps the first production per cell
        let table = LlTable::build_tolerant(&grammar);
        assert_eq!(table.conflicts().len(), 1);
        assert!(table.production_for("S", "b").is_some());
    }

    #[test]
    fn parser_accepts_and_builds_the_expected_tree() {
        let parser = LlParser::new(&arithmetic()).unwrap();
        let input = tokens(&["int", "+", "int", "+", "int", "$"]);
        let tree = parser.parse(&input).unwrap();
        assert!(tree.is_top_down_valid());
        let root = tree.node(tree.entries()[0]);
        assert_eq!(root.symbol(), Some(&nt("S")));
        let children: Vec<_> = root
            .children()
            .iter()
            .map(|id| tree.node(*id).symbol().cloned())
            .collect();
        assert_eq!(children, vec![Some(nt("E")), Some(t("$"))]);
    }

    #[test]
    fn token_mismatch_is_reported_with_positions() {
        let parser = LlParser::new(&arithmetic()).unwrap();
        let input = tokens(&["int", "+", ")", "$"]);
        let error = parser.parse(&input).unwrap_err();
        match error.kind {
            LlParseErrorKind::NoMove { lookahead, .. } => assert_eq!(lookahead, ")"),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn missing_end_of_input_is_reported() {
        let parser = LlParser::new(&arithmetic()).unwrap();
        let input = tokens(&["int"]);
        let error = parser.parse(&input).unwrap_err();
        match error.kind {
            LlParseErrorKind::TokenMismatch { expected, got, .. } => {
                assert_eq!(expected, "$");
                assert_eq!(got, "$");
            }
            LlParseErrorKind::NoMove { .. } => (),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn entry_is_required() {
        let grammar = Grammar::new(vec![Production::new("S", vec![t("a")])], None).unwrap();
        assert!(matches!(
            LlParser::new(&grammar).unwrap_err(),
            LlBuildError::EntryUndefined
        ));
    }
}
