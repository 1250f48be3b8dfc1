//! Interference graph construction.
//!
//! Vertices are hard registers and temps; an edge means the two must not
//! share a register. Built from the per-line records:
//!   1. distinct defs on one line interfere with each other;
//!   2. every def interferes with everything live out of its line;
//!   3. defs interfere with same-line uses, which keeps two-address
//!      lowering free to overwrite destination registers early. The
//!      dst/src pair of a move is exempt so the copy stays coalescible.

use std::collections::{HashMap, HashSet};

use crate::Node;
use crate::liveness::Line;

/// Undirected interference graph with symmetric, reflexive-free adjacency.
#[derive(Debug, Default)]
pub struct InterferenceGraph {
    adj: HashMap<Node, HashSet<Node>>,
}

impl InterferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node with no edges.
    pub fn ensure_node(&mut self, n: Node) {
        self.adj.entry(n).or_default();
    }

    /// Add an undirected edge. Self-edges are ignored.
    pub fn add_edge(&mut self, u: Node, v: Node) {
        if u == v {
            return;
        }
        self.adj.entry(u).or_default().insert(v);
        self.adj.entry(v).or_default().insert(u);
    }

    pub fn contains_edge(&self, u: Node, v: Node) -> bool {
        self.adj.get(&u).is_some_and(|s| s.contains(&v))
    }

    /// Number of neighbours of `n`.
    pub fn degree(&self, n: Node) -> usize {
        self.adj.get(&n).map_or(0, HashSet::len)
    }

    /// Every neighbour of `n`.
    pub fn neighbors(&self, n: Node) -> impl Iterator<Item = Node> + '_ {
        self.adj.get(&n).into_iter().flatten().copied()
    }

    /// Every vertex.
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.adj.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.adj.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }
}

/// Build the interference graph from liveness lines.
pub fn build<'a>(lines: impl IntoIterator<Item = &'a Line>) -> InterferenceGraph {
    let mut g = InterferenceGraph::new();
    for line in lines {
        // Seed every operand node, so single-use temps still get colored.
        for &n in line.uses.iter().chain(&line.defs) {
            g.ensure_node(n);
        }

        for (i, &d1) in line.defs.iter().enumerate() {
            for &d2 in &line.defs[i + 1..] {
                g.add_edge(d1, d2);
            }
        }

        for &d in &line.defs {
            for &out in &line.live_out {
                g.add_edge(d, out);
            }
        }

        if !line.is_move {
            for &d in &line.defs {
                for &u in &line.uses {
                    g.add_edge(d, u);
                }
            }
        }
    }
    g
}
