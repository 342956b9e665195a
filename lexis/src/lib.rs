// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

pub mod error;
pub mod pattern;

use std::fmt::{self, Display};

use log::debug;

use automata::{Automaton, CancelFlag, Regex};

pub use error::{LexError, PatternError};

/// One lexical token: the terminal name it carries, the matched text
/// and the char offset it was matched at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: String,
    lexeme: String,
    position: usize,
}

impl Token {
    pub fn new(kind: impl Into<String>, lexeme: impl Into<String>, position: usize) -> Self {
        Self {
            kind: kind.into(),
            lexeme: lexeme.into(),
            position,
        }
    }

    /// The terminal name this token carries.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.lexeme)
    }
}

/// A named token pattern.  Lower `priority` wins ties between matches
/// of equal length.
#[derive(Debug, Clone)]
pub struct TokenDefinition {
    name: String,
    regex: Regex<char>,
    priority: u32,
}

impl TokenDefinition {
    pub fn new(name: impl Into<String>, regex: Regex<char>) -> Self {
        Self::with_priority(name, regex, 0)
    }

    pub fn with_priority(name: impl Into<String>, regex: Regex<char>, priority: u32) -> Self {
        Self {
            name: name.into(),
            regex,
            priority,
        }
    }

    /// Convenience constructor going through the concrete pattern
    /// syntax of [`pattern::parse`].
    pub fn from_pattern(
        name: impl Into<String>,
        text: &str,
        priority: u32,
    ) -> Result<Self, PatternError> {
        Ok(Self::with_priority(name, pattern::parse(text)?, priority))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }
}

// A definition compiled down to its minimized DFA.
#[derive(Debug, Clone)]
struct CompiledDefinition {
    name: String,
    priority: u32,
    dfa: Automaton<char>,
}

/// Priority-ordered tokenizer: every definition is compiled to a
/// minimized DFA up front, and tokenization picks the longest match,
/// breaking ties by priority.
///
/// The analyzer does no filtering of its own; consumers drop tokens
/// (whitespace, comments) by kind.
#[derive(Debug, Clone)]
pub struct LexicalAnalyzer {
    definitions: Vec<CompiledDefinition>,
}

impl LexicalAnalyzer {
    pub fn new(definitions: Vec<TokenDefinition>) -> Result<Self, LexError> {
        let cancel = CancelFlag::never();
        let mut compiled: Vec<CompiledDefinition> = vec![];
        for definition in definitions {
            if compiled.iter().any(|c| c.name == definition.name) {
                return Err(LexError::DuplicateDefinition {
                    name: definition.name,
                });
            }
            let dfa = definition
                .regex
                .compile()
                .to_dfa_with(&cancel)
                .and_then(|dfa| dfa.minimize_with(&cancel))
                .map_err(|source| LexError::BadDefinition {
                    name: definition.name.clone(),
                    source,
                })?;
            debug!(
                "token definition \"{}\" compiled to {} DFA states",
                definition.name,
                dfa.state_count()
            );
            compiled.push(CompiledDefinition {
                name: definition.name,
                priority: definition.priority,
                dfa,
            });
        }
        // stable: equal priorities keep their declaration order
        compiled.sort_by_key(|c| c.priority);
        Ok(Self {
            definitions: compiled,
        })
    }

    pub fn definition_names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|c| c.name.as_str())
    }

    /// Longest-match tokenization over the whole input.  Tokens are
    /// returned in input order; the first position no definition
    /// matches at aborts with [`LexError::NoMatch`].
    pub fn tokenize(&mut self, text: &str) -> Result<Vec<Token>, LexError> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = vec![];
        let mut position = 0;
        while position < chars.len() {
            let rest = &chars[position..];
            let mut best: Option<(usize, usize)> = None; // (length, definition index)
            for (index, definition) in self.definitions.iter_mut().enumerate() {
                definition.dfa.reset();
                for &c in rest {
                    if !definition.dfa.step(c) {
                        break;
                    }
                }
                let matched = definition.dfa.max_match();
                // strict improvement only: priority order settles ties
                if matched > 0 && best.map(|(length, _)| matched > length).unwrap_or(true) {
                    best = Some((matched, index));
                }
            }
            match best {
                None => {
                    return Err(LexError::NoMatch {
                        position,
                        preview: rest.iter().take(16).collect(),
                    })
                }
                Some((length, index)) => {
                    tokens.push(Token::new(
                        self.definitions[index].name.clone(),
                        rest[..length].iter().collect::<String>(),
                        position,
                    ));
                    position += length;
                }
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer(defs: &[(&str, &str, u32)]) -> LexicalAnalyzer {
        let definitions = defs
            .iter()
            .map(|(name, pattern, priority)| {
                TokenDefinition::from_pattern(*name, pattern, *priority).unwrap()
            })
            .collect();
        LexicalAnalyzer::new(definitions).unwrap()
    }

    fn kinds(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.kind()).collect()
    }

    #[test]
    fn longest_match_wins() {
        let mut lexer = analyzer(&[("eq", "=", 0), ("arrow", "=>", 0)]);
        let tokens = lexer.tokenize("==>").unwrap();
        assert_eq!(kinds(&tokens), ["eq", "arrow"]);
    }

    #[test]
    fn priority_settles_equal_lengths() {
        let mut lexer = analyzer(&[("ident", "[a-z]+", 1), ("kw_if", "if", 0)]);
        let tokens = lexer.tokenize("if").unwrap();
        assert_eq!(kinds(&tokens), ["kw_if"]);
        // longest match still beats priority
        let tokens = lexer.tokenize("iffy").unwrap();
        assert_eq!(kinds(&tokens), ["ident"]);
    }

    #[test]
    fn positions_and_lexemes_are_recorded() {
        let mut lexer = analyzer(&[("int", "[0-9]+", 0), ("plus", "\\+", 0)]);
        let tokens = lexer.tokenize("10+7").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].lexeme(), "10");
        assert_eq!(tokens[0].position(), 0);
        assert_eq!(tokens[1].kind(), "plus");
        assert_eq!(tokens[1].position(), 2);
        assert_eq!(tokens[2].lexeme(), "7");
        assert_eq!(tokens[2].position(), 3);
    }

    #[test]
    fn lex_error_reports_first_failing_position() {
        let mut lexer = analyzer(&[("int", "[0-9]+", 0)]);
        match lexer.tokenize("12x3").unwrap_err() {
            LexError::NoMatch { position, preview } => {
                assert_eq!(position, 2);
                assert!(preview.starts_with('x'));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let defs = vec![
            TokenDefinition::from_pattern("x", "a", 0).unwrap(),
            TokenDefinition::from_pattern("x", "b", 0).unwrap(),
        ];
        assert!(matches!(
            LexicalAnalyzer::new(defs),
            Err(LexError::DuplicateDefinition { .. })
        ));
    }

    #[test]
    fn no_filtering_happens_in_the_lexer() {
        let mut lexer = analyzer(&[("int", "[0-9]+", 0), ("ws", "[ \\n]+", 0)]);
        let tokens = lexer.tokenize("1 2").unwrap();
        assert_eq!(kinds(&tokens), ["int", "ws", "int"]);
    }
}
