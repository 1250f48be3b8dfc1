//! Tests for liveness, interference graph construction and the allocator.

use std::collections::HashSet;

use minnow_ir::{Instr, Label, LabelFactory, Temp, TempFactory};

use crate::allocator::{AllocConfig, Assignment, allocate, mcs_order};
use crate::igraph::{self, InterferenceGraph};
use crate::liveness::{self, solve_backward_may};
use crate::{AllocInst, Node, Operand, PReg, RegFile};

/// Minimal instruction set for the allocator tests: straight-line defs and
/// uses plus fall-through conditional jumps.
#[derive(Debug, Clone)]
#[allow(dead_code)]
enum TInst {
    Label(Label),
    /// dst <- imm
    Set { dst: Temp, imm: i64 },
    /// dst <- src, a coalescible copy
    Mov { dst: Temp, src: Temp },
    /// dst <- -src, not a copy
    Neg { dst: Temp, src: Temp },
    /// dst <- dst + src
    Add { dst: Temp, src: Temp },
    /// read src
    Use { src: Temp },
    Jmp { target: Label },
    /// conditional on cond; falls through when not taken
    Jcc { cond: Temp, target: Label },
    Ret,
    Comment,
}

impl Instr for TInst {
    fn new_label(label: Label) -> Self {
        TInst::Label(label)
    }

    fn new_jump(target: Label) -> Self {
        TInst::Jmp { target }
    }

    fn new_ret() -> Self {
        TInst::Ret
    }

    fn is_label(&self) -> bool {
        matches!(self, TInst::Label(_))
    }

    fn is_jump(&self) -> bool {
        matches!(self, TInst::Jmp { .. })
    }

    fn is_cjump(&self) -> bool {
        matches!(self, TInst::Jcc { .. })
    }

    fn is_return(&self) -> bool {
        matches!(self, TInst::Ret)
    }

    fn is_assert(&self) -> bool {
        false
    }

    fn as_label(&self) -> Option<Label> {
        match self {
            TInst::Label(l) => Some(*l),
            _ => None,
        }
    }

    fn successors(&self, out: &mut Vec<Label>) {
        match self {
            TInst::Jmp { target } | TInst::Jcc { target, .. } => out.push(*target),
            _ => {}
        }
    }

    fn falls_through(&self) -> bool {
        !matches!(self, TInst::Jmp { .. } | TInst::Ret)
    }

    fn replace_target(&mut self, new_target: Label) {
        if let TInst::Jmp { target } = self {
            *target = new_target;
        }
    }

    fn replace_ctarget(&mut self, old: Label, new_target: Label) {
        if let TInst::Jcc { target, .. } = self
            && *target == old
        {
            *target = new_target;
        }
    }
}

impl AllocInst for TInst {
    fn uses(&self, out: &mut Vec<Operand>) {
        match self {
            TInst::Mov { src, .. } | TInst::Neg { src, .. } | TInst::Use { src } => {
                out.push(Operand::Temp(*src));
            }
            TInst::Add { dst, src } => {
                out.push(Operand::Temp(*dst));
                out.push(Operand::Temp(*src));
            }
            TInst::Jcc { cond, .. } => out.push(Operand::Temp(*cond)),
            _ => {}
        }
    }

    fn defs(&self, out: &mut Vec<Operand>) {
        match self {
            TInst::Set { dst, .. }
            | TInst::Mov { dst, .. }
            | TInst::Neg { dst, .. }
            | TInst::Add { dst, .. } => out.push(Operand::Temp(*dst)),
            _ => {}
        }
    }

    fn is_move(&self) -> bool {
        matches!(self, TInst::Mov { .. })
    }

    fn is_meta(&self) -> bool {
        matches!(self, TInst::Comment)
    }
}

fn temps(n: usize) -> Vec<Temp> {
    let mut f = TempFactory::new();
    (0..n).map(|_| f.fresh()).collect()
}

fn node(t: Temp) -> Node {
    Node::Temp(t)
}

fn file(num_regs: u8) -> RegFile {
    RegFile {
        num_regs,
        reserved: vec![],
    }
}

// --- Liveness tests ---

/// The branch scenario: `t1<-1; t2<-2; if t1 jump L; t3<-t2; L: ret t3`.
#[test]
fn liveness_across_branch() {
    let ts = temps(3);
    let (t1, t2, t3) = (ts[0], ts[1], ts[2]);
    let mut lf = LabelFactory::new();
    let l = lf.fresh();

    let insts = vec![
        TInst::Set { dst: t1, imm: 1 },
        TInst::Set { dst: t2, imm: 2 },
        TInst::Jcc { cond: t1, target: l },
        TInst::Mov { dst: t3, src: t2 },
        TInst::Label(l),
        TInst::Use { src: t3 },
        TInst::Ret,
    ];
    let live = liveness::analyze(&insts);

    // Both constants are live once materialized: t1 feeds the branch and
    // t2 the assignment on the fall-through path.
    assert!(live.live_out(0).contains(&node(t1)));
    assert!(live.live_out(1).contains(&node(t1)));
    assert!(live.live_out(1).contains(&node(t2)));
    assert!(live.live_out(3).contains(&node(t3)));
    // Nothing survives the return.
    assert!(live.live_out(6).is_empty());
}

#[test]
fn liveness_through_a_loop() {
    let ts = temps(2);
    let (t0, c) = (ts[0], ts[1]);
    let mut lf = LabelFactory::new();
    let l = lf.fresh();

    let insts = vec![
        TInst::Set { dst: t0, imm: 0 },
        TInst::Set { dst: c, imm: 1 },
        TInst::Label(l),
        TInst::Use { src: t0 },
        TInst::Jcc { cond: c, target: l },
        TInst::Ret,
    ];
    let live = liveness::analyze(&insts);

    // The back edge keeps both temps live around the loop.
    assert!(live.live_out(0).contains(&node(t0)));
    let at_branch = live.live_out(4);
    assert!(at_branch.contains(&node(t0)));
    assert!(at_branch.contains(&node(c)));
}

#[test]
fn meta_instructions_occupy_no_line() {
    let ts = temps(1);
    let t0 = ts[0];
    let insts = vec![
        TInst::Comment,
        TInst::Set { dst: t0, imm: 1 },
        TInst::Comment,
        TInst::Use { src: t0 },
        TInst::Ret,
    ];
    let live = liveness::analyze(&insts);

    assert_eq!(live.lines().len(), 3);
    assert!(live.live_out(0).contains(&node(t0)));
}

#[test]
fn def_and_use_on_one_line_stays_live() {
    let ts = temps(2);
    let (acc, x) = (ts[0], ts[1]);
    let insts = vec![
        TInst::Set { dst: acc, imm: 0 },
        TInst::Set { dst: x, imm: 3 },
        TInst::Add { dst: acc, src: x },
        TInst::Add { dst: acc, src: x },
        TInst::Use { src: acc },
        TInst::Ret,
    ];
    let live = liveness::analyze(&insts);

    // acc is used and redefined by line 2, so it is live into it.
    assert!(live.live_out(1).contains(&node(acc)));
    assert!(live.live_out(2).contains(&node(acc)));
    assert!(live.live_out(2).contains(&node(x)));
}

/// Adding a successor edge can only grow the solved out-sets.
#[test]
fn solver_is_monotone_in_the_successor_relation() {
    // Three lines: 0 defines, 2 uses. Line 1 kills on the base graph.
    let gens: Vec<HashSet<u32>> = vec![HashSet::new(), HashSet::new(), HashSet::from([7])];
    let kills: Vec<HashSet<u32>> = vec![HashSet::new(), HashSet::from([7]), HashSet::new()];
    let pred_of = |succ: &[Vec<usize>]| {
        let mut pred: Vec<Vec<usize>> = vec![Vec::new(); succ.len()];
        for (i, ss) in succ.iter().enumerate() {
            for &s in ss {
                pred[s].push(i);
            }
        }
        pred
    };

    let base: Vec<Vec<usize>> = vec![vec![1], vec![2], vec![]];
    let (_, out_base) = solve_backward_may(&gens, &kills, &base, &pred_of(&base));

    // Line 0 gains a bypass edge straight to line 2.
    let more: Vec<Vec<usize>> = vec![vec![1, 2], vec![2], vec![]];
    let (_, out_more) = solve_backward_may(&gens, &kills, &more, &pred_of(&more));

    for (b, m) in out_base.iter().zip(&out_more) {
        assert!(b.is_subset(m));
    }
    assert!(out_more[0].contains(&7));
    assert!(!out_base[0].contains(&7));
}

// --- Interference graph tests ---

#[test]
fn simultaneously_live_temps_interfere() {
    let ts = temps(3);
    let insts = vec![
        TInst::Set { dst: ts[0], imm: 1 },
        TInst::Set { dst: ts[1], imm: 2 },
        TInst::Set { dst: ts[2], imm: 3 },
        TInst::Use { src: ts[0] },
        TInst::Use { src: ts[1] },
        TInst::Use { src: ts[2] },
        TInst::Ret,
    ];
    let live = liveness::analyze(&insts);
    let g = igraph::build(live.lines());

    for i in 0..3 {
        for j in (i + 1)..3 {
            assert!(g.contains_edge(node(ts[i]), node(ts[j])));
            assert!(g.contains_edge(node(ts[j]), node(ts[i])), "adjacency is symmetric");
        }
        assert!(!g.contains_edge(node(ts[i]), node(ts[i])), "no self loops");
    }
}

/// Rule 3: a def interferes with same-line uses even when the use dies.
#[test]
fn def_interferes_with_same_line_use() {
    let ts = temps(2);
    let (t0, t1) = (ts[0], ts[1]);
    let insts = vec![
        TInst::Set { dst: t0, imm: 1 },
        TInst::Neg { dst: t1, src: t0 },
        TInst::Use { src: t1 },
        TInst::Ret,
    ];
    let live = liveness::analyze(&insts);
    let g = igraph::build(live.lines());

    assert!(g.contains_edge(node(t0), node(t1)));
}

/// The dst/src pair of a move stays edge-free, so it can coalesce.
#[test]
fn move_pair_does_not_interfere() {
    let ts = temps(2);
    let (t0, t1) = (ts[0], ts[1]);
    let insts = vec![
        TInst::Set { dst: t0, imm: 1 },
        TInst::Mov { dst: t1, src: t0 },
        TInst::Use { src: t1 },
        TInst::Ret,
    ];
    let live = liveness::analyze(&insts);
    let g = igraph::build(live.lines());

    assert!(!g.contains_edge(node(t0), node(t1)));
    assert_eq!(g.degree(node(t0)), 0);
}

// --- MCS tests ---

#[test]
fn mcs_prefers_saturated_vertices_and_breaks_ties_low() {
    let ts = temps(3);
    let mut g = InterferenceGraph::new();
    g.add_edge(node(ts[0]), node(ts[1]));
    g.add_edge(node(ts[1]), node(ts[2]));

    let order = mcs_order(&g);
    assert_eq!(order, vec![node(ts[0]), node(ts[1]), node(ts[2])]);
}

#[test]
fn mcs_covers_isolated_vertices() {
    let ts = temps(3);
    let mut g = InterferenceGraph::new();
    g.add_edge(node(ts[1]), node(ts[2]));
    g.ensure_node(node(ts[0]));

    let order = mcs_order(&g);
    assert_eq!(order.len(), 3);
    let as_set: HashSet<Node> = order.into_iter().collect();
    assert!(as_set.contains(&node(ts[0])));
}

// --- Allocator tests ---

fn clique4() -> (Vec<Temp>, Vec<TInst>) {
    let ts = temps(4);
    let mut insts: Vec<TInst> = ts
        .iter()
        .enumerate()
        .map(|(i, &t)| TInst::Set {
            dst: t,
            imm: i as i64,
        })
        .collect();
    insts.extend(ts.iter().map(|&t| TInst::Use { src: t }));
    insts.push(TInst::Ret);
    (ts, insts)
}

/// The 4-clique scenario: three machine registers in index order, then a
/// spill at the register file size.
#[test]
fn clique_of_four_with_three_registers() {
    let (ts, insts) = clique4();
    let assignments = allocate(&insts, &file(3), &AllocConfig::default());

    assert_eq!(assignments[&ts[0]], Assignment::Reg(PReg(0)));
    assert_eq!(assignments[&ts[1]], Assignment::Reg(PReg(1)));
    assert_eq!(assignments[&ts[2]], Assignment::Reg(PReg(2)));
    assert_eq!(assignments[&ts[3]], Assignment::Spill(3));
}

#[test]
fn coloring_is_valid_on_every_edge() {
    let (_, insts) = clique4();
    let live = liveness::analyze(&insts);
    let g = igraph::build(live.lines());
    let assignments = allocate(&insts, &file(3), &AllocConfig::default());

    for u in g.nodes() {
        for v in g.neighbors(u) {
            if let (Node::Temp(tu), Node::Temp(tv)) = (u, v) {
                assert_ne!(assignments[&tu], assignments[&tv]);
            }
        }
    }
}

#[test]
fn reserved_registers_are_never_assigned() {
    let ts = temps(2);
    let insts = vec![
        TInst::Set { dst: ts[0], imm: 1 },
        TInst::Set { dst: ts[1], imm: 2 },
        TInst::Use { src: ts[0] },
        TInst::Use { src: ts[1] },
        TInst::Ret,
    ];
    let rf = RegFile {
        num_regs: 3,
        reserved: vec![0],
    };
    let assignments = allocate(&insts, &rf, &AllocConfig::default());

    assert_eq!(assignments[&ts[0]], Assignment::Reg(PReg(1)));
    assert_eq!(assignments[&ts[1]], Assignment::Reg(PReg(2)));
}

/// A temp pre-bound to a hard register blocks that register for its
/// neighbours and stays out of the result map.
#[test]
fn precolored_temps_constrain_neighbours() {
    let ts = temps(1);
    let t0 = ts[0];
    let pinned = Temp::precolored(0);
    let insts = vec![
        TInst::Set { dst: pinned, imm: 1 },
        TInst::Set { dst: t0, imm: 2 },
        TInst::Use { src: pinned },
        TInst::Use { src: t0 },
        TInst::Ret,
    ];
    let assignments = allocate(&insts, &file(3), &AllocConfig::default());

    assert_eq!(assignments[&t0], Assignment::Reg(PReg(1)));
    assert!(!assignments.contains_key(&pinned));
}

/// The 2001-temp scenario: past the threshold every temp gets a distinct
/// spill slot starting at the register file size.
#[test]
fn fast_path_spills_everything() {
    let ts = temps(2001);
    let mut insts: Vec<TInst> = Vec::new();
    for &t in &ts {
        insts.push(TInst::Set { dst: t, imm: 0 });
        insts.push(TInst::Use { src: t });
    }
    insts.push(TInst::Ret);

    let rf = file(16);
    let assignments = allocate(&insts, &rf, &AllocConfig::default());

    assert_eq!(assignments.len(), 2001);
    for (i, &t) in ts.iter().enumerate() {
        assert_eq!(assignments[&t], Assignment::Spill(16 + i as u32));
    }
}

/// Below the threshold the main path never uses higher indices than the
/// fast path would for the same temps.
#[test]
fn main_path_is_no_worse_than_fast_path() {
    let ts = temps(3);
    let mut insts: Vec<TInst> = Vec::new();
    for &t in &ts {
        insts.push(TInst::Set { dst: t, imm: 0 });
        insts.push(TInst::Use { src: t });
    }
    insts.push(TInst::Ret);

    let rf = file(16);
    let assignments = allocate(&insts, &rf, &AllocConfig::default());

    // Disjoint live ranges share the first register; the fast path would
    // have paid three spill slots.
    for &t in &ts {
        assert_eq!(assignments[&t], Assignment::Reg(PReg(0)));
    }
}

#[test]
fn threshold_is_tunable() {
    let ts = temps(2);
    let insts = vec![
        TInst::Set { dst: ts[0], imm: 1 },
        TInst::Use { src: ts[0] },
        TInst::Set { dst: ts[1], imm: 2 },
        TInst::Use { src: ts[1] },
        TInst::Ret,
    ];
    let config = AllocConfig { spill_threshold: 1 };
    let assignments = allocate(&insts, &file(16), &config);

    assert_eq!(assignments[&ts[0]], Assignment::Spill(16));
    assert_eq!(assignments[&ts[1]], Assignment::Spill(17));
}

#[test]
fn empty_input_allocates_nothing() {
    let assignments = allocate::<TInst>(&[], &file(16), &AllocConfig::default());
    assert!(assignments.is_empty());
}
