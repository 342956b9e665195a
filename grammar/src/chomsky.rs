// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::fmt::{self, Display};

use crate::error::GrammarError;
use crate::symbol::Symbol;

/// A general rewrite rule whose left-hand side may be a symbol
/// sequence; only the Chomsky classifier works at this generality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    lhs: Vec<Symbol>,
    rhs: Vec<Symbol>,
}

impl RewriteRule {
    pub fn new(lhs: Vec<Symbol>, rhs: Vec<Symbol>) -> Result<Self, GrammarError> {
        if lhs.is_empty() {
            return Err(GrammarError::invalid_input(
                "a rewrite rule must have a non-empty left-hand side",
            ));
        }
        if !lhs.iter().any(|symbol| symbol.is_non_terminal()) {
            return Err(GrammarError::invalid_input(format!(
                "the left-hand side of \"{}\" contains no non-terminal",
                render(&lhs)
            )));
        }
        Ok(Self { lhs, rhs })
    }

    pub fn left_hand_side(&self) -> &[Symbol] {
        &self.lhs
    }

    pub fn right_hand_side(&self) -> &[Symbol] {
        &self.rhs
    }

    /// Which hierarchy level this single rule certifies.
    pub fn classify(&self) -> RuleClass {
        let single_terminal_rhs = self.rhs.len() == 1 && self.rhs[0].is_terminal();
        if self.rhs.is_empty() || single_terminal_rhs {
            return RuleClass::Neutral;
        }
        if self.lhs.len() > 1 {
            return if self.rhs.len() >= self.lhs.len() {
                RuleClass::ContextSensitive
            } else {
                RuleClass::Unrestricted
            };
        }
        if self.rhs.len() == 2 {
            match (&self.rhs[0], &self.rhs[1]) {
                (Symbol::Terminal(_), Symbol::NonTerminal(_)) => return RuleClass::RightRegular,
                (Symbol::NonTerminal(_), Symbol::Terminal(_)) => return RuleClass::LeftRegular,
                _ => (),
            }
        }
        RuleClass::ContextFree
    }
}

impl Display for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.rhs.is_empty() {
            write!(f, "{} -> \\e", render(&self.lhs))
        } else {
            write!(f, "{} -> {}", render(&self.lhs), render(&self.rhs))
        }
    }
}

fn render(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join("")
}

/// Hierarchy contribution of a single rule.  `Neutral` rules (ε or a
/// single terminal on the right) do not constrain the grammar's class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleClass {
    Neutral,
    Unrestricted,
    ContextSensitive,
    ContextFree,
    LeftRegular,
    RightRegular,
}

impl RuleClass {
    // Strictness rank on the Chomsky lattice; both regular flavours
    // share the top rank.
    fn rank(self) -> u8 {
        match self {
            RuleClass::Neutral => u8::MAX,
            RuleClass::Unrestricted => 0,
            RuleClass::ContextSensitive => 1,
            RuleClass::ContextFree => 2,
            RuleClass::LeftRegular | RuleClass::RightRegular => 3,
        }
    }
}

/// The class of a whole grammar: the strictest level every rule
/// satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarClass {
    Unrestricted,
    ContextSensitive,
    ContextFree,
    RegularLeft,
    RegularRight,
    Regular,
}

impl Display for GrammarClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GrammarClass::Unrestricted => write!(f, "Type-0 (unrestricted)"),
            GrammarClass::ContextSensitive => write!(f, "Type-1 (context-sensitive)"),
            GrammarClass::ContextFree => write!(f, "Type-2 (context-free)"),
            GrammarClass::RegularLeft => write!(f, "Type-3 (left regular)"),
            GrammarClass::RegularRight => write!(f, "Type-3 (right regular)"),
            GrammarClass::Regular => write!(f, "Type-3 (regular)"),
        }
    }
}

/// Classify a rule set.  Mixing left- and right-regular rules drops the
/// grammar to context-free; an all-neutral rule set is regular.
pub fn classify_rules(rules: &[RewriteRule]) -> GrammarClass {
    let mut aggregate: Option<RuleClass> = None;
    for rule in rules {
        let class = rule.classify();
        if class == RuleClass::Neutral {
            continue;
        }
        aggregate = Some(match aggregate {
            None => class,
            Some(previous) => combine(previous, class),
        });
    }
    match aggregate {
        None => GrammarClass::Regular,
        Some(RuleClass::Unrestricted) => GrammarClass::Unrestricted,
        Some(RuleClass::ContextSensitive) => GrammarClass::ContextSensitive,
        Some(RuleClass::ContextFree) => GrammarClass::ContextFree,
        Some(RuleClass::LeftRegular) => GrammarClass::RegularLeft,
        Some(RuleClass::RightRegular) => GrammarClass::RegularRight,
        Some(RuleClass::Neutral) => unreachable!("neutral rules are skipped"),
    }
}

fn combine(left: RuleClass, right: RuleClass) -> RuleClass {
    if left == right {
        return left;
    }
    let strictest = if left.rank() <= right.rank() { left } else { right };
    // two regular flavours in one grammar only guarantee context-free
    if strictest.rank() == 3 {
        RuleClass::ContextFree
    } else {
        strictest
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

    fn rule(lhs: Vec<Symbol>, rhs: Vec<Symbol>) -> RewriteRule {
        RewriteRule::new(lhs, rhs).unwrap()
    }

    #[test]
    fn validity_requires_a_non_terminal_source() {
        assert!(RewriteRule::new(vec![], vec![t("a")]).is_err());
        assert!(RewriteRule::new(vec![t("a"), t("b")], vec![t("a")]).is_err());
        assert!(RewriteRule::new(vec![t("a"), nt("B")], vec![t("a")]).is_ok());
    }

    #[test]
    fn right_regular_grammar() {
        // S -> a S | a
        let rules = [
            rule(vec![nt("S")], vec![t("a"), nt("S")]),
            rule(vec![nt("S")], vec![t("a")]),
        ];
        assert_eq!(classify_rules(&rules), GrammarClass::RegularRight);
    }

    #[test]
    fn left_regular_grammar() {
        // S -> S a | a
        let rules = [
            rule(vec![nt("S")], vec![nt("S"), t("a")]),
            rule(vec![nt("S")], vec![t("a")]),
        ];
        assert_eq!(classify_rules(&rules), GrammarClass::RegularLeft);
    }

    #[test]
    fn palindrome_grammar_is_context_free() {
        // S -> a S a | a
        let rules = [
            rule(vec![nt("S")], vec![t("a"), nt("S"), t("a")]),
            rule(vec![nt("S")], vec![t("a")]),
        ];
        assert_eq!(classify_rules(&rules), GrammarClass::ContextFree);
    }

    #[test]
    fn mixed_regular_sides_drop_to_context_free() {
        let rules = [
            rule(vec![nt("S")], vec![t("a"), nt("S")]),
            rule(vec![nt("A")], vec![nt("S"), t("a")]),
        ];
        assert_eq!(classify_rules(&rules), GrammarClass::ContextFree);
    }

    #[test]
    fn swap_grammar_is_context_sensitive() {
        // AB -> BA ; A -> a ; B -> b
        let rules = [
            rule(vec![nt("A"), nt("B")], vec![nt("B"), nt("A")]),
            rule(vec![nt("A")], vec![t("a")]),
            rule(vec![nt("B")], vec![t("b")]),
        ];
        assert_eq!(classify_rules(&rules), GrammarClass::ContextSensitive);
    }

    #[test]
    fn shrinking_rule_is_unrestricted() {
        let rules = [
            rule(vec![nt("A"), nt("B")], vec![nt("A")]),
            rule(vec![nt("A")], vec![t("a"), nt("B")]),
        ];
        assert_eq!(classify_rules(&rules), GrammarClass::Unrestricted);
    }

    #[test]
    fn all_neutral_rules_count_as_regular() {
        let rules = [
            rule(vec![nt("S")], vec![t("a")]),
            rule(vec![nt("S")], vec![]),
        ];
        assert_eq!(classify_rules(&rules), GrammarClass::Regular);
    }
}
