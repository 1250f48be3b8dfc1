//! Dominator analysis: immediate dominators, the dominator tree, and
//! dominance frontiers.
//!
//! Immediate dominators use the Cooper-Harvey-Kennedy iterative scheme over
//! reverse postorder; frontiers use the two-finger runner walk. Everything
//! is iterative, so deep CFGs cannot overflow the call stack.

use std::collections::{HashMap, HashSet};

use log::trace;
use minnow_ir::Label;

use crate::cfg::{EdgeMaps, postorder};
use crate::error::CfgError;

/// Dominance information for the blocks reachable from ENTRY.
#[derive(Debug)]
pub struct Dominators {
    /// Immediate dominator per reachable block; ENTRY maps to itself.
    /// Unreachable blocks have no entry.
    idom: HashMap<Label, Label>,
    /// Dominance frontier per block. Every block in the graph is keyed;
    /// unreachable blocks map to the empty set.
    frontiers: HashMap<Label, HashSet<Label>>,
}

impl Dominators {
    /// Compute dominance information over the given edge maps.
    pub fn compute(edges: &EdgeMaps) -> Dominators {
        // Blocks are grouped and numbered densely in reverse postorder;
        // the numbers double as depth keys for the intersect walks.
        let post = postorder(edges);
        let rpo: Vec<Label> = post.iter().rev().copied().collect();
        let mut frontiers: HashMap<Label, HashSet<Label>> = edges
            .pred
            .keys()
            .map(|&l| (l, HashSet::new()))
            .collect();

        if rpo.is_empty() {
            return Dominators {
                idom: HashMap::new(),
                frontiers,
            };
        }

        let number: HashMap<Label, usize> =
            rpo.iter().enumerate().map(|(i, &l)| (l, i)).collect();

        // Predecessors restricted to reachable blocks, as dense indices.
        let preds: Vec<Vec<usize>> = rpo
            .iter()
            .map(|l| {
                let mut ps: Vec<usize> = edges
                    .pred
                    .get(l)
                    .into_iter()
                    .flatten()
                    .filter_map(|p| number.get(p).copied())
                    .collect();
                ps.sort_unstable();
                ps
            })
            .collect();

        let mut idom: Vec<Option<usize>> = vec![None; rpo.len()];
        idom[0] = Some(0);

        let mut rounds = 0;
        let mut changed = true;
        while changed {
            changed = false;
            rounds += 1;
            for n in 1..rpo.len() {
                // Fold the meet over every already-processed predecessor,
                // seeded by the first one.
                let mut new_idom = None;
                for &p in &preds[n] {
                    if idom[p].is_none() {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => p,
                        Some(m) => intersect(p, m, &idom),
                    });
                }
                if let Some(d) = new_idom
                    && idom[n] != Some(d)
                {
                    idom[n] = Some(d);
                    changed = true;
                }
            }
        }
        trace!(
            "immediate dominators over {} blocks converged after {rounds} rounds",
            rpo.len()
        );

        // Dominance frontiers: the runner walk, join points only.
        for n in 0..rpo.len() {
            if preds[n].len() < 2 {
                continue;
            }
            let n_idom = idom[n].expect("reachable join point has an idom");
            for &p in &preds[n] {
                let mut runner = p;
                while runner != n_idom {
                    frontiers
                        .get_mut(&rpo[runner])
                        .expect("all blocks keyed")
                        .insert(rpo[n]);
                    runner = idom[runner].expect("runner stays on reachable blocks");
                }
            }
        }

        let idom_map = rpo
            .iter()
            .enumerate()
            .filter_map(|(i, &l)| idom[i].map(|d| (l, rpo[d])))
            .collect();

        Dominators {
            idom: idom_map,
            frontiers,
        }
    }

    /// Immediate dominator of `l`.
    ///
    /// Unreachable blocks carry no dominance information; asking for one
    /// is [`CfgError::Unreachable`].
    pub fn idom(&self, l: Label) -> Result<Label, CfgError> {
        self.idom.get(&l).copied().ok_or(CfgError::Unreachable(l))
    }

    /// True when `a` dominates `b` (reflexively).
    pub fn dominates(&self, a: Label, b: Label) -> bool {
        let mut cur = b;
        loop {
            if cur == a {
                return true;
            }
            match self.idom.get(&cur) {
                Some(&d) if d != cur => cur = d,
                _ => return false,
            }
        }
    }

    /// The dominator tree: children per block, sorted for determinism.
    /// ENTRY's self-edge is excluded; unreachable blocks never appear.
    pub fn tree(&self) -> HashMap<Label, Vec<Label>> {
        let mut tree: HashMap<Label, Vec<Label>> = HashMap::new();
        for (&n, &p) in &self.idom {
            if n != p {
                tree.entry(p).or_default().push(n);
            }
        }
        for children in tree.values_mut() {
            children.sort_unstable();
        }
        tree
    }

    /// Dominance frontier of every block.
    pub fn frontiers(&self) -> &HashMap<Label, HashSet<Label>> {
        &self.frontiers
    }

    /// Dominance frontier of `l`; empty for blocks with no frontier.
    pub fn frontier(&self, l: Label) -> Option<&HashSet<Label>> {
        self.frontiers.get(&l)
    }
}

/// Two-finger walk up the partially built dominator chain. Reverse
/// postorder numbers serve as depth keys: the deeper finger climbs first.
fn intersect(mut a: usize, mut b: usize, idom: &[Option<usize>]) -> usize {
    while a != b {
        while a > b {
            a = idom[a].expect("intersect only walks processed nodes");
        }
        while b > a {
            b = idom[b].expect("intersect only walks processed nodes");
        }
    }
    a
}
