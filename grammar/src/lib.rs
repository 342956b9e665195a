// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

pub mod chomsky;
pub mod error;
pub mod grammar;
pub mod production;
pub mod symbol;
pub mod text;
pub mod transform;

pub use chomsky::{classify_rules, GrammarClass, RewriteRule, RuleClass};
pub use error::GrammarError;
pub use grammar::{FirstSet, Grammar};
pub use production::Production;
pub use symbol::{Derivation, Symbol, END_MARKER};
pub use transform::{eliminate_left_recursion, left_factor, PrefixTree};
