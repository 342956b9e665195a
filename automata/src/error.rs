// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaError {
    #[error("invalid automaton input: {message}")]
    InvalidInput { message: String },
    #[error("operation requires a deterministic automaton")]
    NotADfa,
    #[error("{phase} did not converge after {iterations} iterations")]
    DidNotConverge {
        phase: &'static str,
        iterations: usize,
    },
    #[error("{phase} was interrupted")]
    Interrupted { phase: &'static str },
}

impl FaError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        FaError::InvalidInput {
            message: message.into(),
        }
    }
}
