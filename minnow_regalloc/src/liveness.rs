//! Per-line liveness analysis.
//!
//! Derives gen/kill sets from instruction operands and runs a backward-may
//! worklist solver to a fixed point. The result is the list of [`Line`]
//! records consumed by interference graph construction.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

use log::trace;
use minnow_ir::Label;

use crate::{AllocInst, Node};

/// Allocator view of one instruction: operand nodes plus the computed
/// live-out set.
#[derive(Debug, Clone)]
pub struct Line {
    pub uses: Vec<Node>,
    pub defs: Vec<Node>,
    pub live_out: HashSet<Node>,
    pub is_move: bool,
}

/// Liveness analysis result over a linear instruction sequence.
#[derive(Debug)]
pub struct Liveness {
    lines: Vec<Line>,
}

impl Liveness {
    /// Live-out set of line `idx`.
    pub fn live_out(&self, idx: usize) -> &HashSet<Node> {
        &self.lines[idx].live_out
    }

    /// All line records, in line order.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<Line> {
        self.lines
    }
}

/// Compute live-out sets for every line of `insts`.
///
/// Meta instructions occupy no line. Successor edges per line follow the
/// instruction's control flow: explicit target label lines, plus the next
/// line when the instruction falls through, nothing for returns.
pub fn analyze<I: AllocInst>(insts: &[I]) -> Liveness {
    let line_insts: Vec<&I> = insts.iter().filter(|i| !i.is_meta()).collect();
    let n = line_insts.len();

    let mut label_line: HashMap<Label, usize> = HashMap::new();
    for (ln, inst) in line_insts.iter().enumerate() {
        if let Some(l) = inst.as_label() {
            label_line.insert(l, ln);
        }
    }

    let mut succ: Vec<Vec<usize>> = Vec::with_capacity(n);
    let mut gens: Vec<HashSet<Node>> = Vec::with_capacity(n);
    let mut kills: Vec<HashSet<Node>> = Vec::with_capacity(n);
    let mut uses: Vec<Vec<Node>> = Vec::with_capacity(n);
    let mut defs: Vec<Vec<Node>> = Vec::with_capacity(n);

    let mut ops = Vec::new();
    let mut targets = Vec::new();
    for (ln, inst) in line_insts.iter().enumerate() {
        targets.clear();
        inst.successors(&mut targets);
        let mut s: Vec<usize> = targets
            .iter()
            .map(|t| {
                debug_assert!(label_line.contains_key(t), "dangling jump target {t}");
                label_line[t]
            })
            .collect();
        if inst.falls_through() && ln + 1 < n {
            s.push(ln + 1);
        }
        succ.push(s);

        ops.clear();
        inst.uses(&mut ops);
        let u: Vec<Node> = ops.iter().filter_map(|o| o.node()).collect();
        ops.clear();
        inst.defs(&mut ops);
        let d: Vec<Node> = ops.iter().filter_map(|o| o.node()).collect();

        // A variable both used and defined stays live across the line.
        let gen_set: HashSet<Node> = u.iter().copied().collect();
        let kill_set: HashSet<Node> = d
            .iter()
            .copied()
            .filter(|x| !gen_set.contains(x))
            .collect();
        gens.push(gen_set);
        kills.push(kill_set);
        uses.push(u);
        defs.push(d);
    }

    let mut pred: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (ln, ss) in succ.iter().enumerate() {
        for &s in ss {
            pred[s].push(ln);
        }
    }

    let (_, mut outs) = solve_backward_may(&gens, &kills, &succ, &pred);
    trace!("liveness fixed point over {n} lines");

    let lines = line_insts
        .iter()
        .enumerate()
        .map(|(ln, inst)| Line {
            uses: std::mem::take(&mut uses[ln]),
            defs: std::mem::take(&mut defs[ln]),
            live_out: std::mem::take(&mut outs[ln]),
            is_move: inst.is_move(),
        })
        .collect();
    Liveness { lines }
}

/// Generic backward-may dataflow solver.
///
/// `in = gen ∪ (out \ kill)` and `out = ∪ in[succ]`. The worklist starts
/// as a reverse sweep; predecessors of any line whose in-set grew are
/// re-enqueued. The transfer is monotone on a finite lattice, so the
/// iteration terminates.
pub fn solve_backward_may<T: Clone + Eq + Hash>(
    gens: &[HashSet<T>],
    kills: &[HashSet<T>],
    succ: &[Vec<usize>],
    pred: &[Vec<usize>],
) -> (Vec<HashSet<T>>, Vec<HashSet<T>>) {
    let n = gens.len();
    let mut ins: Vec<HashSet<T>> = vec![HashSet::new(); n];
    let mut outs: Vec<HashSet<T>> = vec![HashSet::new(); n];

    let mut worklist: VecDeque<usize> = (0..n).rev().collect();
    let mut queued = vec![true; n];

    while let Some(ln) = worklist.pop_front() {
        queued[ln] = false;

        let mut out = HashSet::new();
        for &s in &succ[ln] {
            out.extend(ins[s].iter().cloned());
        }

        let mut new_in = gens[ln].clone();
        for v in &out {
            if !kills[ln].contains(v) {
                new_in.insert(v.clone());
            }
        }
        outs[ln] = out;

        // In-sets only grow, so a size check detects change.
        if new_in.len() != ins[ln].len() {
            ins[ln] = new_in;
            for &p in &pred[ln] {
                if !queued[p] {
                    queued[p] = true;
                    worklist.push_back(p);
                }
            }
        }
    }
    (ins, outs)
}
