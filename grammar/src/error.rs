// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("invalid grammar input: {message}")]
    InvalidInput { message: String },
    #[error("non-terminal \"{non_terminal}\" is used but has no production")]
    NoValidDerivation { non_terminal: String },
    #[error("{phase} did not converge after {iterations} iterations")]
    DidNotConverge {
        phase: &'static str,
        iterations: usize,
    },
    #[error("{phase} was interrupted")]
    Interrupted { phase: &'static str },
}

impl GrammarError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        GrammarError::InvalidInput {
            message: message.into(),
        }
    }
}
