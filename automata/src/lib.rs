// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

pub mod cancel;
pub mod dot;
pub mod error;
pub mod fa;
pub mod node;
pub mod reader;
pub mod regex;

pub use cancel::CancelFlag;
pub use dot::{DotGraph, NodeShape};
pub use error::FaError;
pub use fa::Automaton;
pub use node::{State, StateId};
pub use regex::Regex;
