// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

pub mod ll;
pub mod lr;
pub mod tree;

pub use ll::{
    is_ll1, select_set, LlBuildError, LlParseError, LlParseErrorKind, LlParser, LlTable,
    SelectConflict,
};
pub use lr::{
    ItemCore, Lookahead, LrAutomaton, LrBuildError, LrParseError, LrParseErrorKind, LrParser,
    LrState, ReduceReduceConflict, ShiftReduceConflict,
};
pub use tree::{NodeId, ParseTree, TreeNode};
