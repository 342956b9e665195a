// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::fmt::{self, Display};

/// Name reserved for the end-of-input terminal.  It cannot occur in
/// normal input alphabets; FOLLOW sets, LL end-of-input lookahead and
/// the LR entry production all use it.
pub const END_MARKER: &str = "$";

/// A grammar symbol.  Equality, ordering and hashing are by
/// (tag, name); names are unique across both tags within one grammar.
/// ε is never a `Symbol`; it is the empty derivation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Terminal(String),
    NonTerminal(String),
}

impl Symbol {
    pub fn terminal(name: impl Into<String>) -> Self {
        Symbol::Terminal(name.into())
    }

    pub fn non_terminal(name: impl Into<String>) -> Self {
        Symbol::NonTerminal(name.into())
    }

    /// The distinguished end-of-input terminal `$`.
    pub fn end_marker() -> Self {
        Symbol::Terminal(END_MARKER.to_string())
    }

    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal(name) | Symbol::NonTerminal(name) => name,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn is_non_terminal(&self) -> bool {
        matches!(self, Symbol::NonTerminal(_))
    }

    pub fn is_end_marker(&self) -> bool {
        matches!(self, Symbol::Terminal(name) if name == END_MARKER)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An ordered sequence of symbols; the empty sequence is ε.
pub type Derivation = Vec<Symbol>;
