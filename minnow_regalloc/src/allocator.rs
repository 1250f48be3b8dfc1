//! Graph-coloring register allocation.
//!
//! Orders interference graph vertices by maximum cardinality search and
//! colors greedily along the resulting simplicial elimination ordering.
//! On chordal interference graphs (the common case for programs out of
//! SSA) this uses a minimal number of colors; elsewhere it stays sound
//! and may spill where an optimal allocator would not. Functions past the
//! configured size threshold skip graph construction entirely and spill
//! every temp to a distinct slot, which bounds compile time on
//! pathological inputs.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use minnow_ir::Temp;

use crate::igraph::{self, InterferenceGraph};
use crate::liveness;
use crate::{AllocInst, Node, PReg, RegFile};

/// Where a temp lives after allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// A hard register.
    Reg(PReg),
    /// A stack slot; indices start at the register file size.
    Spill(u32),
}

/// Allocator tunables.
#[derive(Debug, Clone)]
pub struct AllocConfig {
    /// Vertex count past which the allocator spills everything instead of
    /// building the interference graph.
    pub spill_threshold: usize,
}

impl Default for AllocConfig {
    fn default() -> Self {
        Self {
            spill_threshold: 2000,
        }
    }
}

/// Allocate every temp appearing in `insts` to a register or spill slot.
///
/// Pre-bound hard registers keep their identity and are omitted from the
/// returned map. The allocator never fails: when registers run out, the
/// overflow goes to spill slots.
pub fn allocate<I: AllocInst>(
    insts: &[I],
    file: &RegFile,
    config: &AllocConfig,
) -> HashMap<Temp, Assignment> {
    // Count vertices before committing to the main path; the fast path
    // must not pay for graph construction.
    let mut vertices: HashSet<Node> = HashSet::new();
    let mut ops = Vec::new();
    for inst in insts.iter().filter(|i| !i.is_meta()) {
        ops.clear();
        inst.uses(&mut ops);
        inst.defs(&mut ops);
        vertices.extend(ops.iter().filter_map(|o| o.node()));
    }

    if vertices.len() > config.spill_threshold {
        debug!(
            "{} vertices exceed the spill threshold ({}); spilling all temps",
            vertices.len(),
            config.spill_threshold
        );
        return spill_all(&vertices, file);
    }

    let live = liveness::analyze(insts);
    let graph = igraph::build(live.lines());
    color(&graph, file)
}

/// Fast path: a distinct spill slot per temp, in ascending temp order.
fn spill_all(vertices: &HashSet<Node>, file: &RegFile) -> HashMap<Temp, Assignment> {
    let mut temps: Vec<Temp> = vertices
        .iter()
        .filter_map(|n| match n {
            Node::Temp(t) => Some(*t),
            Node::Reg(_) => None,
        })
        .collect();
    temps.sort_unstable();

    temps
        .into_iter()
        .enumerate()
        .map(|(i, t)| (t, Assignment::Spill(file.num_regs as u32 + i as u32)))
        .collect()
}

/// Maximum cardinality search: repeatedly pick the unprocessed vertex
/// with the most already-processed neighbours. Ties break on vertex order
/// so the result is deterministic. On a chordal graph the result is a
/// simplicial elimination ordering.
pub fn mcs_order(graph: &InterferenceGraph) -> Vec<Node> {
    let mut remaining: Vec<Node> = graph.nodes().collect();
    remaining.sort_unstable();

    let mut weight: HashMap<Node, usize> = remaining.iter().map(|&n| (n, 0)).collect();
    let mut order = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        // `remaining` stays sorted, so the first maximum wins ties.
        let mut pos = 0;
        for i in 1..remaining.len() {
            if weight[&remaining[i]] > weight[&remaining[pos]] {
                pos = i;
            }
        }
        let best = remaining.remove(pos);
        weight.remove(&best);
        for nb in graph.neighbors(best) {
            // Processed neighbours are no longer in the weight map.
            if let Some(w) = weight.get_mut(&nb) {
                *w += 1;
            }
        }
        order.push(best);
    }
    order
}

/// Greedy coloring along a simplicial elimination ordering.
///
/// Hard registers are pre-colored by identity. Each temp takes the
/// smallest color not blocked by a neighbouring hard register, an already
/// colored neighbour, or a reserved register; colors past the register
/// file spill. Assignments are never revisited.
fn color(graph: &InterferenceGraph, file: &RegFile) -> HashMap<Temp, Assignment> {
    let seo = mcs_order(graph);
    trace!("coloring {} vertices", seo.len());

    let mut colors: HashMap<Node, u32> = HashMap::new();
    let mut out = HashMap::new();

    for &node in &seo {
        let temp = match node {
            Node::Reg(r) => {
                colors.insert(node, r.0 as u32);
                continue;
            }
            Node::Temp(t) => t,
        };

        let mut forbidden: HashSet<u32> =
            file.reserved.iter().map(|&i| i as u32).collect();
        for nb in graph.neighbors(node) {
            match nb {
                // Hard registers block their index whether or not the
                // ordering has reached them yet.
                Node::Reg(r) => {
                    forbidden.insert(r.0 as u32);
                }
                Node::Temp(_) => {
                    if let Some(&c) = colors.get(&nb) {
                        forbidden.insert(c);
                    }
                }
            }
        }

        let mut k = 0u32;
        while forbidden.contains(&k) {
            k += 1;
        }
        colors.insert(node, k);
        out.insert(
            temp,
            if k < file.num_regs as u32 {
                Assignment::Reg(PReg(k as u8))
            } else {
                Assignment::Spill(k)
            },
        );
    }
    out
}
