// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::collections::{BTreeMap, BTreeSet};

use automata::{DotGraph, NodeShape};
use log::{debug, warn};

use crate::error::GrammarError;
use crate::grammar::Grammar;
use crate::production::Production;
use crate::symbol::Symbol;

/// Paull's algorithm: substitute away indirect left recursion in
/// non-terminal order, then rewrite direct left recursion with fresh
/// primed helpers (`A'`, appending primes until unused).
pub fn eliminate_left_recursion(grammar: &Grammar) -> Result<Grammar, GrammarError> {
    let mut order: Vec<String> = vec![];
    let mut rules = BTreeMap::<String, Vec<Vec<Symbol>>>::new();
    for production in grammar.productions() {
        let lhs = production.left_hand_side().to_string();
        if !rules.contains_key(&lhs) {
            order.push(lhs.clone());
        }
        rules
            .entry(lhs)
            .or_default()
            .push(production.right_hand_side().to_vec());
    }
    let mut used_names: BTreeSet<String> = grammar
        .used_symbols()
        .iter()
        .map(|s| s.name().to_string())
        .collect();

    let original_count = order.len();
    for index in 0..original_count {
        let name = order[index].clone();
        substitute_earlier(&name, index, &order, &mut rules, original_count)?;
        remove_direct_recursion(&name, &mut rules, &mut order, &mut used_names);
    }

    let mut productions = vec![];
    for name in &order {
        for alternative in &rules[name] {
            productions.push(Production::new(name.clone(), alternative.clone()));
        }
    }
    Grammar::new(productions, grammar.entry().cloned())
}

// Replace every alternative `Ai -> Aj γ` with `j < i` by the expansion
// of Aj, iterating to a fixed point.  Earlier non-terminals no longer
// lead with their predecessors, so the leading index strictly
// decreases and the loop is bounded.
fn substitute_earlier(
    name: &str,
    index: usize,
    order: &[String],
    rules: &mut BTreeMap<String, Vec<Vec<Symbol>>>,
    original_count: usize,
) -> Result<(), GrammarError> {
    let earlier: BTreeSet<&String> = order[..index].iter().collect();
    let mut iterations = 0_usize;
    loop {
        iterations += 1;
        if iterations > original_count + 2 {
            return Err(GrammarError::DidNotConverge {
                phase: "left-recursion substitution",
                iterations,
            });
        }
        let mut changed = false;
        let mut next: Vec<Vec<Symbol>> = vec![];
        for alternative in rules[name].clone() {
            match alternative.first() {
                Some(Symbol::NonTerminal(leading)) if earlier.contains(leading) => {
                    for gamma in rules[leading].iter() {
                        let mut replaced = gamma.clone();
                        replaced.extend_from_slice(&alternative[1..]);
                        next.push(replaced);
                    }
                    changed = true;
                }
                _ => next.push(alternative),
            }
        }
        rules.insert(name.to_string(), dedup_alternatives(next));
        if !changed {
            return Ok(());
        }
    }
}

// `A -> A α1 | … | A αp | β1 | … | βq` becomes `A -> βj A'` and
// `A' -> αj A' | ε`.
fn remove_direct_recursion(
    name: &str,
    rules: &mut BTreeMap<String, Vec<Vec<Symbol>>>,
    order: &mut Vec<String>,
    used_names: &mut BTreeSet<String>,
) {
    let alternatives = rules[name].clone();
    let mut recursive_tails: Vec<Vec<Symbol>> = vec![];
    let mut base: Vec<Vec<Symbol>> = vec![];
    for alternative in alternatives {
        match alternative.first() {
            Some(Symbol::NonTerminal(leading)) if leading == name => {
                let tail = alternative[1..].to_vec();
                if tail.is_empty() {
                    warn!("dropping cyclic production {} -> {}", name, name);
                } else {
                    recursive_tails.push(tail);
                }
            }
            _ => base.push(alternative),
        }
    }
    if recursive_tails.is_empty() {
        return;
    }

    let mut primed = format!("{}'", name);
    while !used_names.insert(primed.clone()) {
        primed.push('\'');
    }
    debug!("rewriting left recursion on {} via {}", name, primed);

    let rewritten: Vec<Vec<Symbol>> = base
        .into_iter()
        .map(|mut beta| {
            beta.push(Symbol::non_terminal(primed.clone()));
            beta
        })
        .collect();
    rules.insert(name.to_string(), rewritten);

    let mut primed_alternatives: Vec<Vec<Symbol>> = recursive_tails
        .into_iter()
        .map(|mut alpha| {
            alpha.push(Symbol::non_terminal(primed.clone()));
            alpha
        })
        .collect();
    primed_alternatives.push(vec![]);
    rules.insert(primed.clone(), primed_alternatives);
    order.push(primed);
}

fn dedup_alternatives(alternatives: Vec<Vec<Symbol>>) -> Vec<Vec<Symbol>> {
    let mut seen = BTreeSet::new();
    alternatives
        .into_iter()
        .filter(|a| seen.insert(a.clone()))
        .collect()
}

/// Shared-prefix tree over all alternatives of one non-terminal.
///
/// Every alternative contributes a chain of symbol nodes terminated by
/// a sentinel end node, so an alternative that is a prefix of another
/// stays distinguishable.  Node 0 is the synthetic root.
#[derive(Debug)]
pub struct PrefixTree {
    lhs: String,
    nodes: Vec<PrefixNode>,
}

#[derive(Debug)]
struct PrefixNode {
    symbol: Option<Symbol>,
    children: Vec<usize>,
}

impl PrefixTree {
    pub fn build<'a>(lhs: &str, alternatives: impl IntoIterator<Item = &'a [Symbol]>) -> Self {
        let mut tree = Self {
            lhs: lhs.to_string(),
            nodes: vec![PrefixNode {
                symbol: None,
                children: vec![],
            }],
        };
        for alternative in alternatives {
            tree.add(alternative);
        }
        tree
    }

    pub fn lhs(&self) -> &str {
        &self.lhs
    }

    fn add(&mut self, alternative: &[Symbol]) {
        let mut current = 0;
        for symbol in alternative {
            current = self.child(current, Some(symbol.clone()));
        }
        self.child(current, None);
    }

    // Find or create the child of `parent` carrying `symbol`
    // (`None` = sentinel).
    fn child(&mut self, parent: usize, symbol: Option<Symbol>) -> usize {
        if let Some(existing) = self.nodes[parent]
            .children
            .iter()
            .find(|&&child| self.nodes[child].symbol == symbol)
        {
            return *existing;
        }
        let child = self.nodes.len();
        self.nodes.push(PrefixNode {
            symbol,
            children: vec![],
        });
        self.nodes[parent].children.push(child);
        child
    }

    pub fn to_dot(&self, name: &str) -> DotGraph {
        let mut graph = DotGraph::new(name);
        for (index, node) in self.nodes.iter().enumerate() {
            let (label, shape) = match (&node.symbol, index) {
                (_, 0) => (self.lhs.clone(), NodeShape::Diamond),
                (Some(symbol), _) => (symbol.to_string(), NodeShape::Box),
                (None, _) => ("end".to_string(), NodeShape::DoubleOctagon),
            };
            graph.add_node(index.to_string(), label, shape);
        }
        for (index, node) in self.nodes.iter().enumerate() {
            for child in &node.children {
                graph.add_edge(index.to_string(), child.to_string(), "", false);
            }
        }
        graph
    }
}

/// Left-factor every non-terminal through its shared-prefix tree:
/// single paths collapse into one alternative, branch points introduce
/// fresh numbered helpers (`A1`, `A2`, …).  Walked with an explicit
/// frame stack rather than recursion.
pub fn left_factor(grammar: &Grammar) -> Result<Grammar, GrammarError> {
    let mut order: Vec<String> = vec![];
    for production in grammar.productions() {
        let lhs = production.left_hand_side().to_string();
        if !order.contains(&lhs) {
            order.push(lhs);
        }
    }
    let mut used_names: BTreeSet<String> = grammar
        .used_symbols()
        .iter()
        .map(|s| s.name().to_string())
        .collect();

    let mut productions = vec![];
    for name in &order {
        let tree = PrefixTree::build(
            name,
            grammar
                .alternatives(name)
                .iter()
                .map(|p| p.right_hand_side()),
        );
        gather_factored(&tree, name, &mut used_names, &mut productions);
    }
    Grammar::new(productions, grammar.entry().cloned())
}

fn gather_factored(
    tree: &PrefixTree,
    base: &str,
    used_names: &mut BTreeSet<String>,
    productions: &mut Vec<Production>,
) {
    let mut frames: Vec<(String, Vec<usize>)> =
        vec![(tree.lhs.clone(), tree.nodes[0].children.clone())];
    while let Some((lhs, start_nodes)) = frames.pop() {
        for start in start_nodes {
            let mut prefix: Vec<Symbol> = vec![];
            let mut current = start;
            loop {
                match &tree.nodes[current].symbol {
                    None => {
                        // sentinel: the whole alternative is the factor
                        productions.push(Production::new(lhs.clone(), prefix));
                        break;
                    }
                    Some(symbol) => prefix.push(symbol.clone()),
                }
                let children = &tree.nodes[current].children;
                if children.len() == 1 {
                    current = children[0];
                } else {
                    let fresh = fresh_numbered(base, used_names);
                    prefix.push(Symbol::non_terminal(fresh.clone()));
                    productions.push(Production::new(lhs.clone(), prefix));
                    frames.push((fresh, children.clone()));
                    break;
                }
            }
        }
    }
}

fn fresh_numbered(base: &str, used_names: &mut BTreeSet<String>) -> String {
    for counter in 1_usize.. {
        let candidate = format!("{}{}", base, counter);
        if used_names.insert(candidate.clone()) {
            return candidate;
        }
    }
    unreachable!("the numbered name space is unbounded")
}
