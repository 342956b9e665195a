// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::collections::BTreeSet;

use automata::{DotGraph, NodeShape};
use grammar::{Production, Symbol};
use lexis::Token;

/// Index of a node inside its [`ParseTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One parse-tree node.  `symbol` is `None` only for the ε marker
/// children attached by empty derivations and reductions.
#[derive(Debug, Clone)]
pub struct TreeNode {
    symbol: Option<Symbol>,
    token: Option<Token>,
    children: Vec<NodeId>,
    production: Option<Production>,
}

impl TreeNode {
    fn with_symbol(symbol: Symbol) -> Self {
        Self {
            symbol: Some(symbol),
            token: None,
            children: vec![],
            production: None,
        }
    }

    fn epsilon_marker() -> Self {
        Self {
            symbol: None,
            token: None,
            children: vec![],
            production: None,
        }
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        self.symbol.as_ref()
    }

    pub fn is_epsilon(&self) -> bool {
        self.symbol.is_none()
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The rule applied when this node was expanded (top-down) or
    /// created (bottom-up).
    pub fn production(&self) -> Option<&Production> {
        self.production.as_ref()
    }
}

/// Shared parse-tree structure for both drivers.
///
/// Nodes live in an arena; `entries` are the current roots and
/// `leaves` the exposed frontier in left-to-right order.  Top-down
/// parsing grows the frontier downwards from a single entry; bottom-up
/// parsing collapses a token frontier towards a single root, keeping
/// the two views identical throughout.
#[derive(Debug, Clone)]
pub struct ParseTree {
    nodes: Vec<TreeNode>,
    entries: Vec<NodeId>,
    leaves: Vec<NodeId>,
}

impl ParseTree {
    /// A tree ready for top-down parsing: the start symbol is both the
    /// only entry and the only frontier element.
    pub fn top_down(start: Symbol) -> Self {
        let mut tree = Self {
            nodes: vec![],
            entries: vec![],
            leaves: vec![],
        };
        let root = tree.push(TreeNode::with_symbol(start));
        tree.entries.push(root);
        tree.leaves.push(root);
        tree
    }

    /// A tree ready for bottom-up parsing: one terminal leaf per input
    /// token, already bound to it.
    pub fn bottom_up(tokens: &[Token]) -> Self {
        let mut tree = Self {
            nodes: vec![],
            entries: vec![],
            leaves: vec![],
        };
        for token in tokens {
            let mut node = TreeNode::with_symbol(Symbol::terminal(token.kind()));
            node.token = Some(token.clone());
            let id = tree.push(node);
            tree.entries.push(id);
            tree.leaves.push(id);
        }
        tree
    }

    fn push(&mut self, node: TreeNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn entries(&self) -> &[NodeId] {
        &self.entries
    }

    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    pub fn leaf(&self, frontier_index: usize) -> &TreeNode {
        self.node(self.leaves[frontier_index])
    }

    /// Expand the non-terminal leaf at `frontier_index` by
    /// `production`: one new leaf per right-hand-side symbol, or an ε
    /// marker child (removed from the frontier) for an empty one.
    pub fn derive(&mut self, frontier_index: usize, production: &Production) {
        debug_assert!(frontier_index < self.leaves.len());
        let target = self.leaves[frontier_index];
        debug_assert!(self.nodes[target.0].children.is_empty());
        debug_assert_eq!(
            self.nodes[target.0].symbol.as_ref().map(|s| s.name()),
            Some(production.left_hand_side())
        );

        self.nodes[target.0].production = Some(production.clone());
        if production.is_empty() {
            let marker = self.push(TreeNode::epsilon_marker());
            self.nodes[target.0].children.push(marker);
            self.leaves.remove(frontier_index);
            return;
        }
        let replacements: Vec<NodeId> = production
            .right_hand_side()
            .iter()
            .map(|symbol| self.push(TreeNode::with_symbol(symbol.clone())))
            .collect();
        self.nodes[target.0].children = replacements.clone();
        let mut leaves = self.leaves[..frontier_index].to_vec();
        leaves.extend(replacements);
        leaves.extend_from_slice(&self.leaves[frontier_index + 1..]);
        self.leaves = leaves;
    }

    /// Wrap `count` contiguous frontier nodes starting at
    /// `frontier_index` under a new node for `production`'s source
    /// (ε reductions insert a fresh node with a marker child).  Both
    /// views are rewritten; reductions only occur in bottom-up trees,
    /// where entries and leaves coincide.
    pub fn reduce(&mut self, frontier_index: usize, count: usize, production: &Production) {
        debug_assert!(frontier_index + count <= self.leaves.len());
        debug_assert_eq!(self.entries, self.leaves);

        let children: Vec<NodeId> = self.leaves[frontier_index..frontier_index + count].to_vec();
        let mut node = TreeNode::with_symbol(production.lhs_symbol());
        node.production = Some(production.clone());
        node.children = children;
        let id = if count == 0 {
            let mut with_marker = node;
            let marker = self.push(TreeNode::epsilon_marker());
            with_marker.children.push(marker);
            self.push(with_marker)
        } else {
            self.push(node)
        };
        let mut leaves = self.leaves[..frontier_index].to_vec();
        leaves.push(id);
        leaves.extend_from_slice(&self.leaves[frontier_index + count..]);
        self.leaves = leaves;
        self.entries = self.leaves.clone();
    }

    /// Bind the input token to the terminal leaf at `frontier_index`
    /// (top-down matching).
    pub fn bind(&mut self, frontier_index: usize, token: Token) {
        let target = self.leaves[frontier_index];
        debug_assert_eq!(
            self.nodes[target.0].symbol.as_ref().map(|s| s.name()),
            Some(token.kind())
        );
        self.nodes[target.0].token = Some(token);
    }

    /// One entry, and every frontier element a terminal bound to a
    /// token of its kind.
    pub fn is_top_down_valid(&self) -> bool {
        if self.entries.len() != 1 {
            return false;
        }
        self.leaves.iter().all(|id| {
            let node = &self.nodes[id.0];
            match (&node.symbol, &node.token) {
                (Some(symbol), Some(token)) => {
                    symbol.is_terminal() && symbol.name() == token.kind()
                }
                _ => false,
            }
        })
    }

    /// The frontier has collapsed to a single root carrying `start`.
    pub fn is_bottom_up_valid(&self, start: &Symbol) -> bool {
        match (self.entries.as_slice(), self.leaves.as_slice()) {
            ([entry], [leaf]) => {
                entry == leaf && self.nodes[leaf.0].symbol.as_ref() == Some(start)
            }
            _ => false,
        }
    }

    pub fn to_dot(&self, name: &str) -> DotGraph {
        let mut graph = DotGraph::new(name);
        let roots: BTreeSet<NodeId> = self.entries.iter().copied().collect();
        for (index, node) in self.nodes.iter().enumerate() {
            let id = NodeId(index);
            let label = match (&node.symbol, &node.token) {
                (Some(symbol), Some(token)) => format!("{}\n{}", symbol, token.lexeme()),
                (Some(symbol), None) => symbol.to_string(),
                (None, _) => "\\e".to_string(),
            };
            let shape = if roots.contains(&id) {
                NodeShape::Diamond
            } else if node.children.is_empty() {
                NodeShape::Circle
            } else {
                NodeShape::Box
            };
            graph.add_node(index.to_string(), label, shape);
        }
        for (index, node) in self.nodes.iter().enumerate() {
            for child in &node.children {
                graph.add_edge(index.to_string(), child.0.to_string(), "", false);
            }
        }
        graph
    }
}
