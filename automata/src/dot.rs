// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::fmt::{self, Display};

/// Node shapes used for the different state roles in emitted graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    Diamond,
    DoubleOctagon,
    TripleOctagon,
    Box,
    Circle,
}

impl NodeShape {
    /// Shape for an automaton state: start = diamond, accept = double
    /// octagon, both = triple octagon, anything else = box.
    pub fn for_role(is_start: bool, is_end: bool) -> Self {
        match (is_start, is_end) {
            (true, true) => NodeShape::TripleOctagon,
            (true, false) => NodeShape::Diamond,
            (false, true) => NodeShape::DoubleOctagon,
            (false, false) => NodeShape::Box,
        }
    }

    fn name(self) -> &'static str {
        match self {
            NodeShape::Diamond => "diamond",
            NodeShape::DoubleOctagon => "doubleoctagon",
            NodeShape::TripleOctagon => "tripleoctagon",
            NodeShape::Box => "box",
            NodeShape::Circle => "circle",
        }
    }
}

#[derive(Debug, Clone)]
struct DotNode {
    id: String,
    label: String,
    shape: NodeShape,
}

#[derive(Debug, Clone)]
struct DotEdge {
    from: String,
    to: String,
    label: String,
    dashed: bool,
}

/// A renderer-independent directed-graph description.  `Display`
/// produces `dot` source text; nothing in the core links against a
/// rendering library.
#[derive(Debug, Clone)]
pub struct DotGraph {
    name: String,
    nodes: Vec<DotNode>,
    edges: Vec<DotEdge>,
}

impl DotGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: vec![],
            edges: vec![],
        }
    }

    pub fn add_node(&mut self, id: impl Into<String>, label: impl Into<String>, shape: NodeShape) {
        self.nodes.push(DotNode {
            id: id.into(),
            label: label.into(),
            shape,
        });
    }

    /// ε edges are marked `dashed` so they stay distinguishable in the
    /// rendered graph.
    pub fn add_edge(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        label: impl Into<String>,
        dashed: bool,
    ) {
        self.edges.push(DotEdge {
            from: from.into(),
            to: to.into(),
            label: label.into(),
            dashed,
        });
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl Display for DotGraph {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "digraph \"{}\" {{", escape(&self.name))?;
        writeln!(f, "    rankdir=LR;")?;
        for node in &self.nodes {
            writeln!(
                f,
                "    \"{}\" [label=\"{}\", shape={}];",
                escape(&node.id),
                escape(&node.label),
                node.shape.name()
            )?;
        }
        for edge in &self.edges {
            let style = if edge.dashed { ", style=dashed" } else { "" };
            writeln!(
                f,
                "    \"{}\" -> \"{}\" [label=\"{}\"{}];",
                escape(&edge.from),
                escape(&edge.to),
                escape(&edge.label),
                style
            )?;
        }
        write!(f, "}}")
    }
}
