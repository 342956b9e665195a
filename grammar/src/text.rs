// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! Plain-text grammar input: one rule per line, `LHS -> RHS`.
//!
//! Uppercase ASCII letters are non-terminals, any other non-space
//! character is a terminal, commas count as whitespace, and ε is an
//! empty right-hand side or the literal `\e`.  Alternation (`|`) is
//! not part of this surface; write one line per alternative.

use lazy_static::lazy_static;

use crate::chomsky::RewriteRule;
use crate::error::GrammarError;
use crate::production::Production;
use crate::symbol::Symbol;

lazy_static! {
    static ref RULE_CRE: regex::Regex = regex::Regex::new(r"^(.*?)\s*->\s*(.*)$").unwrap();
}

/// Parse general rewrite rules (sequence left-hand sides allowed), as
/// consumed by the Chomsky classifier.
pub fn parse_rules(text: &str) -> Result<Vec<RewriteRule>, GrammarError> {
    let mut rules = vec![];
    for (line_number, lhs, rhs) in split_lines(text)? {
        RewriteRule::new(lhs, rhs)
            .map(|rule| rules.push(rule))
            .map_err(|error| at_line(line_number, error))?;
    }
    Ok(rules)
}

/// Parse context-free productions: every left-hand side must be a
/// single non-terminal.
pub fn parse_productions(text: &str) -> Result<Vec<Production>, GrammarError> {
    let mut productions = vec![];
    for (line_number, lhs, rhs) in split_lines(text)? {
        match lhs.as_slice() {
            [Symbol::NonTerminal(name)] => productions.push(Production::new(name.clone(), rhs)),
            _ => {
                return Err(GrammarError::invalid_input(format!(
                    "line {}: a context-free production needs a single \
                     non-terminal left-hand side",
                    line_number
                )))
            }
        }
    }
    Ok(productions)
}

type ParsedLine = (usize, Vec<Symbol>, Vec<Symbol>);

fn split_lines(text: &str) -> Result<Vec<ParsedLine>, GrammarError> {
    let mut lines = vec![];
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line_number = index + 1;
        let captures = RULE_CRE.captures(line).ok_or_else(|| {
            GrammarError::invalid_input(format!(
                "line {}: expected \"LHS -> RHS\", got \"{}\"",
                line_number, line
            ))
        })?;
        let lhs = parse_symbols(&captures[1], line_number)?;
        let rhs_text = captures[2].trim();
        let rhs = if rhs_text == r"\e" {
            vec![]
        } else {
            parse_symbols(rhs_text, line_number)?
        };
        lines.push((line_number, lhs, rhs));
    }
    Ok(lines)
}

fn parse_symbols(text: &str, line_number: usize) -> Result<Vec<Symbol>, GrammarError> {
    let mut symbols = vec![];
    for c in text.chars() {
        if c.is_whitespace() || c == ',' {
            continue;
        }
        if c == '\\' {
            return Err(GrammarError::invalid_input(format!(
                "line {}: \"\\e\" may only stand for a whole right-hand side",
                line_number
            )));
        }
        if c.is_ascii_uppercase() {
            symbols.push(Symbol::non_terminal(c.to_string()));
        } else {
            symbols.push(Symbol::terminal(c.to_string()));
        }
    }
    Ok(symbols)
}

fn at_line(line_number: usize, error: GrammarError) -> GrammarError {
    match error {
        GrammarError::InvalidInput { message } => {
            GrammarError::invalid_input(format!("line {}: {}", line_number, message))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chomsky::{classify_rules, GrammarClass};

    #[test]
    fn parses_case_tagged_symbols() {
        let rules = parse_rules("S -> aSb\n").unwrap();
        assert_eq!(rules.len(), 1);
        let rhs = rules[0].right_hand_side();
        assert!(rhs[0].is_terminal());
        assert!(rhs[1].is_non_terminal());
        assert!(rhs[2].is_terminal());
    }

    #[test]
    fn commas_are_whitespace_and_epsilon_spellings_work() {
        let rules = parse_rules("S -> a, S\nS -> \\e\nA ->\n A -> b\n").unwrap();
        assert_eq!(rules.len(), 4);
        assert_eq!(rules[0].right_hand_side().len(), 2);
        assert!(rules[1].right_hand_side().is_empty());
        assert!(rules[2].right_hand_side().is_empty());
    }

    #[test]
    fn sequence_lhs_reaches_the_classifier() {
        let rules = parse_rules("AB -> BA\nA -> a\nB -> b\n").unwrap();
        assert_eq!(rules[0].left_hand_side().len(), 2);
        assert_eq!(classify_rules(&rules), GrammarClass::ContextSensitive);
    }

    #[test]
    fn productions_need_single_non_terminal_sources() {
        assert!(parse_productions("S -> aS\nS -> a\n").is_ok());
        assert!(matches!(
            parse_productions("AB -> a\n").unwrap_err(),
            GrammarError::InvalidInput { .. }
        ));
        assert!(matches!(
            parse_productions("a -> b\n").unwrap_err(),
            GrammarError::InvalidInput { .. }
        ));
    }

    #[test]
    fn malformed_lines_are_reported_with_numbers() {
        let error = parse_rules("S -> a\nnonsense\n").unwrap_err();
        assert!(error.to_string().contains("line 2"));
    }

    #[test]
    fn empty_lhs_is_rejected() {
        assert!(matches!(
            parse_rules(" -> a\n").unwrap_err(),
            GrammarError::InvalidInput { .. }
        ));
    }
}
