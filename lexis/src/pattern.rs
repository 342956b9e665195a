// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! A small concrete syntax for building [`Regex<char>`] trees.
//!
//! Supported: literal characters, `\`-escapes (`\n`, `\t`, `\r`, and
//! any punctuation), character classes `[...]` with `a-z` ranges,
//! alternation `|`, grouping `(...)` and the postfix operators `*`,
//! `+`, `?`.  Anything else (anchors, `.`-wildcards, negated classes,
//! counted repetition) is out of scope for the toolkit's alphabet model
//! and is treated as a literal or rejected.

use std::collections::BTreeSet;
use std::iter::Peekable;
use std::str::Chars;

use automata::Regex;

use crate::error::PatternError;

pub fn parse(pattern: &str) -> Result<Regex<char>, PatternError> {
    let mut parser = PatternParser {
        chars: pattern.chars().peekable(),
        position: 0,
    };
    let regex = parser.alternation()?;
    match parser.peek() {
        None => Ok(regex),
        // only an unmatched ')' survives to here
        Some(_) => Err(PatternError::UnbalancedParenthesis {
            position: parser.position,
        }),
    }
}

struct PatternParser<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> PatternParser<'a> {
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn alternation(&mut self) -> Result<Regex<char>, PatternError> {
        let mut branches = vec![self.concatenation()?];
        while self.peek() == Some('|') {
            self.bump();
            branches.push(self.concatenation()?);
        }
        Ok(Regex::choice(branches))
    }

    fn concatenation(&mut self) -> Result<Regex<char>, PatternError> {
        let mut parts = vec![];
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            parts.push(self.repetition()?);
        }
        Ok(Regex::sequence(parts))
    }

    fn repetition(&mut self) -> Result<Regex<char>, PatternError> {
        let mut atom = self.atom()?;
        loop {
            match self.peek() {
                Some('*') => {
                    self.bump();
                    atom = Regex::star(atom);
                }
                Some('+') => {
                    self.bump();
                    atom = Regex::plus(atom);
                }
                Some('?') => {
                    self.bump();
                    atom = Regex::opt(atom);
                }
                _ => return Ok(atom),
            }
        }
    }

    fn atom(&mut self) -> Result<Regex<char>, PatternError> {
        let position = self.position;
        match self.bump() {
            None => Err(PatternError::UnbalancedParenthesis { position }),
            Some('(') => {
                let inner = self.alternation()?;
                match self.bump() {
                    Some(')') => Ok(inner),
                    _ => Err(PatternError::UnbalancedParenthesis { position }),
                }
            }
            Some('[') => self.class(position),
            Some('\\') => Ok(Regex::Char(self.escaped()?)),
            Some(operator) if matches!(operator, '*' | '+' | '?') => {
                Err(PatternError::DanglingOperator { operator, position })
            }
            Some(c) => Ok(Regex::Char(c)),
        }
    }

    fn class(&mut self, start: usize) -> Result<Regex<char>, PatternError> {
        let mut items = BTreeSet::new();
        loop {
            let from = match self.bump() {
                None => return Err(PatternError::UnterminatedClass { position: start }),
                Some(']') => return Ok(Regex::CharClass(items)),
                Some('\\') => self.escaped()?,
                Some(c) => c,
            };
            // a lone '-' before ']' is a literal dash
            if self.peek() == Some('-') {
                self.bump();
                let to = match self.bump() {
                    None => return Err(PatternError::UnterminatedClass { position: start }),
                    Some(']') => {
                        items.insert(from);
                        items.insert('-');
                        return Ok(Regex::CharClass(items));
                    }
                    Some('\\') => self.escaped()?,
                    Some(c) => c,
                };
                if to < from {
                    return Err(PatternError::BadRange {
                        from,
                        to,
                        position: self.position,
                    });
                }
                items.extend(from..=to);
            } else {
                items.insert(from);
            }
        }
    }

    fn escaped(&mut self) -> Result<char, PatternError> {
        match self.bump() {
            None => Err(PatternError::TrailingEscape),
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some(c) => Ok(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, word: &str) -> bool {
        parse(pattern).unwrap().compile().accepts(word.chars())
    }

    #[test]
    fn literals_and_concatenation() {
        assert!(matches("abc", "abc"));
        assert!(!matches("abc", "ab"));
        assert!(!matches("abc", "abcd"));
    }

    #[test]
    fn class_ranges_and_repetition() {
        assert!(matches("[0-9]+", "2024"));
        assert!(!matches("[0-9]+", ""));
        assert!(!matches("[0-9]+", "12a"));
        assert!(matches("[a-cx]*", "abcxa"));
        assert!(!matches("[a-cx]*", "d"));
    }

    #[test]
    fn alternation_grouping_optional() {
        assert!(matches("a(b|c)d", "abd"));
        assert!(matches("a(b|c)d", "acd"));
        assert!(!matches("a(b|c)d", "ad"));
        assert!(matches("ab?", "a"));
        assert!(matches("ab?", "ab"));
        assert!(matches("(ab)*", ""));
        assert!(matches("(ab)*", "abab"));
    }

    #[test]
    fn escapes() {
        assert!(matches(r"\*\+", "*+"));
        assert!(matches(r"[\t ]+", "\t \t"));
        assert!(matches(r"a\n", "a\n"));
    }

    #[test]
    fn dash_at_class_edge_is_literal() {
        assert!(matches("[a-]", "-"));
        assert!(matches("[a-]", "a"));
    }

    #[test]
    fn reports_errors_with_positions() {
        assert_eq!(
            parse("*a").unwrap_err(),
            PatternError::DanglingOperator {
                operator: '*',
                position: 0
            }
        );
        assert!(matches!(
            parse("(ab").unwrap_err(),
            PatternError::UnbalancedParenthesis { .. }
        ));
        assert!(matches!(
            parse("ab)").unwrap_err(),
            PatternError::UnbalancedParenthesis { .. }
        ));
        assert!(matches!(
            parse("[abc").unwrap_err(),
            PatternError::UnterminatedClass { .. }
        ));
        assert!(matches!(
            parse("[z-a]").unwrap_err(),
            PatternError::BadRange { .. }
        ));
        assert_eq!(parse(r"ab\").unwrap_err(), PatternError::TrailingEscape);
    }
}
