// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::rc::Rc;

use crate::symbol::Symbol;

#[derive(Debug)]
struct ProductionData {
    left_hand_side: String,
    right_hand_side: Vec<Symbol>,
}

/// A rewrite rule `A -> X1 … Xn` with a single non-terminal source.
///
/// Cloning is cheap (shared data); the grammar owns its productions and
/// LR items reference them through clones of these handles.  Equality
/// and ordering are by the (source, derivation) pair.
#[derive(Debug, Clone)]
pub struct Production(Rc<ProductionData>);

impl Production {
    pub fn new(left_hand_side: impl Into<String>, right_hand_side: Vec<Symbol>) -> Self {
        Self(Rc::new(ProductionData {
            left_hand_side: left_hand_side.into(),
            right_hand_side,
        }))
    }

    pub fn left_hand_side(&self) -> &str {
        &self.0.left_hand_side
    }

    pub fn lhs_symbol(&self) -> Symbol {
        Symbol::non_terminal(self.0.left_hand_side.clone())
    }

    pub fn right_hand_side(&self) -> &[Symbol] {
        &self.0.right_hand_side
    }

    pub fn len(&self) -> usize {
        self.0.right_hand_side.len()
    }

    /// An empty right-hand side derives ε.
    pub fn is_empty(&self) -> bool {
        self.0.right_hand_side.is_empty()
    }
}

impl PartialEq for Production {
    fn eq(&self, other: &Self) -> bool {
        self.0.left_hand_side == other.0.left_hand_side
            && self.0.right_hand_side == other.0.right_hand_side
    }
}

impl Eq for Production {}

impl PartialOrd for Production {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Production {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.0.left_hand_side, &self.0.right_hand_side)
            .cmp(&(&other.0.left_hand_side, &other.0.right_hand_side))
    }
}

impl Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ->", self.0.left_hand_side)?;
        if self.0.right_hand_side.is_empty() {
            write!(f, " \\e")
        } else {
            for symbol in self.0.right_hand_side.iter() {
                write!(f, " {}", symbol)?;
            }
            Ok(())
        }
    }
}
