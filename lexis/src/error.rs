// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use automata::FaError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("no token definition matches at position {position}: \"{preview}\"")]
    NoMatch { position: usize, preview: String },
    #[error("token definition \"{name}\" defined twice")]
    DuplicateDefinition { name: String },
    #[error("failed to compile token definition \"{name}\": {source}")]
    BadDefinition { name: String, source: FaError },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("dangling operator '{operator}' at position {position}")]
    DanglingOperator { operator: char, position: usize },
    #[error("unbalanced parenthesis at position {position}")]
    UnbalancedParenthesis { position: usize },
    #[error("unterminated character class starting at position {position}")]
    UnterminatedClass { position: usize },
    #[error("bad character range {from:?}-{to:?} at position {position}")]
    BadRange {
        from: char,
        to: char,
        position: usize,
    },
    #[error("pattern ends inside an escape sequence")]
    TrailingEscape,
}
