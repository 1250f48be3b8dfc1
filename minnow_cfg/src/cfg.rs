//! Control-flow graph construction over an abstract instruction set.
//!
//! Partitions a linear instruction sequence into labelled basic blocks with
//! synthesised entry and exit blocks, derives the predecessor/successor
//! edge maps, and provides fall-through elimination, critical-edge
//! splitting and postorder traversal for the passes downstream.

use std::collections::{HashMap, HashSet};

use log::trace;
use minnow_ir::{Instr, Label, LabelFactory};

use crate::error::CfgError;

/// A basic block: a label instruction followed by straight-line code and a
/// single control-flow terminator.
#[derive(Debug, Clone)]
pub struct BasicBlock<I> {
    pub label: Label,
    pub instrs: Vec<I>,
}

impl<I: Instr> BasicBlock<I> {
    /// The block's terminating control instruction.
    pub fn terminator(&self) -> &I {
        self.instrs.last().expect("block has a terminator")
    }
}

/// Function-scoped block map with synthesised entry and exit blocks.
#[derive(Debug, Clone)]
pub struct BlockMap<I> {
    pub blocks: HashMap<Label, BasicBlock<I>>,
    /// Layout order: ENTRY, then source blocks in input order, then EXIT.
    /// Blocks minted by edge splitting are appended.
    pub order: Vec<Label>,
}

impl<I: Instr> BlockMap<I> {
    pub fn get(&self, label: Label) -> Option<&BasicBlock<I>> {
        self.blocks.get(&label)
    }

    /// Label of the first source block, or EXIT for an empty function.
    pub fn first_real(&self) -> Label {
        self.order.get(1).copied().unwrap_or(Label::EXIT)
    }

    fn insert(&mut self, block: BasicBlock<I>) -> Result<(), CfgError> {
        let label = block.label;
        if self.blocks.insert(label, block).is_some() {
            return Err(CfgError::Malformed(format!("duplicate label {label}")));
        }
        self.order.push(label);
        Ok(())
    }
}

/// Insert an explicit `jump` wherever straight-line code runs into a label.
///
/// Idempotent: an inserted jump is itself a control instruction, so a
/// second pass finds nothing to do.
pub fn eliminate_fall_through<I: Instr>(instrs: Vec<I>) -> Vec<I> {
    let mut out: Vec<I> = Vec::with_capacity(instrs.len());
    for inst in instrs {
        if let Some(l) = inst.as_label()
            && let Some(prev) = out.last()
            && !prev.is_control()
        {
            out.push(I::new_jump(l));
        }
        out.push(inst);
    }
    out
}

/// Partition a linear instruction sequence into basic blocks.
///
/// A block starts at each label instruction and ends at the first jump,
/// conditional jump or return after it. The map gains a synthesised
/// `ENTRY: jump first_block` and `EXIT: ret`; a program ending without a
/// terminator gets `jump exit` appended to its last block. Instructions
/// stranded between a terminator and the next label are preserved as a
/// dead block under a fresh label.
///
/// Expects fall-through-free input (see [`eliminate_fall_through`]); a
/// label reached while the current block is still open is reported as
/// [`CfgError::Malformed`].
pub fn build_bb<I: Instr>(
    instrs: Vec<I>,
    labels: &mut LabelFactory,
) -> Result<BlockMap<I>, CfgError> {
    let mut map = BlockMap {
        blocks: HashMap::new(),
        order: vec![Label::ENTRY],
    };
    let mut current: Option<BasicBlock<I>> = None;

    for inst in instrs {
        if let Some(l) = inst.as_label() {
            if l == Label::ENTRY || l == Label::EXIT {
                return Err(CfgError::Malformed(format!(
                    "reserved label {l} in input"
                )));
            }
            if let Some(open) = current.take() {
                return Err(CfgError::Malformed(format!(
                    "block {} falls through into {l}",
                    open.label
                )));
            }
            current = Some(BasicBlock {
                label: l,
                instrs: vec![inst],
            });
            continue;
        }

        // An instruction with no open block follows a terminator: recover
        // it into a dead block so later passes can prune it.
        let block = current.get_or_insert_with(|| {
            let l = labels.fresh();
            BasicBlock {
                label: l,
                instrs: vec![I::new_label(l)],
            }
        });

        let ends_block = inst.is_control();
        block.instrs.push(inst);
        if ends_block {
            let done = current.take().expect("current block is open");
            map.insert(done)?;
        }
    }

    // Trailing block without a terminator: route it to EXIT.
    if let Some(mut open) = current.take() {
        open.instrs.push(I::new_jump(Label::EXIT));
        map.insert(open)?;
    }

    let first = map.first_real();
    map.blocks.insert(
        Label::ENTRY,
        BasicBlock {
            label: Label::ENTRY,
            instrs: vec![I::new_label(Label::ENTRY), I::new_jump(first)],
        },
    );
    map.order.push(Label::EXIT);
    map.blocks.insert(
        Label::EXIT,
        BasicBlock {
            label: Label::EXIT,
            instrs: vec![I::new_label(Label::EXIT), I::new_ret()],
        },
    );

    trace!("built {} basic blocks", map.blocks.len());
    Ok(map)
}

/// Successor ("out") and predecessor ("in") edge maps over a block map.
///
/// Every label is present as a key in both maps, possibly with an empty
/// set. The maps are mutual inverses.
#[derive(Debug, Clone, Default)]
pub struct EdgeMaps {
    pub succ: HashMap<Label, HashSet<Label>>,
    pub pred: HashMap<Label, HashSet<Label>>,
}

impl EdgeMaps {
    /// Number of successors of `l`.
    pub fn out_degree(&self, l: Label) -> usize {
        self.succ.get(&l).map_or(0, HashSet::len)
    }

    /// Number of predecessors of `l`.
    pub fn in_degree(&self, l: Label) -> usize {
        self.pred.get(&l).map_or(0, HashSet::len)
    }

    /// Whether `(u, v)` is an edge.
    pub fn has_edge(&self, u: Label, v: Label) -> bool {
        self.succ.get(&u).is_some_and(|s| s.contains(&v))
    }
}

/// Derive the successor and predecessor maps from block terminators.
///
/// A terminator naming a label with no block is [`CfgError::Malformed`].
pub fn build_ino<I: Instr>(map: &BlockMap<I>) -> Result<EdgeMaps, CfgError> {
    let mut edges = EdgeMaps::default();
    for &l in &map.order {
        edges.succ.entry(l).or_default();
        edges.pred.entry(l).or_default();
    }

    let mut targets = Vec::new();
    for &l in &map.order {
        let block = &map.blocks[&l];
        let term = block
            .instrs
            .last()
            .filter(|i| i.is_control())
            .ok_or_else(|| CfgError::Malformed(format!("block {l} has no terminator")))?;

        targets.clear();
        term.successors(&mut targets);
        // A return leaves the function: route it to the exit block, which
        // keeps EXIT the unique outdegree-zero node.
        if term.is_return() && l != Label::EXIT {
            targets.push(Label::EXIT);
        }
        for &t in &targets {
            if !map.blocks.contains_key(&t) {
                return Err(CfgError::Malformed(format!(
                    "jump from {l} to undefined label {t}"
                )));
            }
            edges.succ.get_mut(&l).expect("all labels keyed").insert(t);
            edges.pred.get_mut(&t).expect("all labels keyed").insert(l);
        }
    }
    Ok(edges)
}

/// A critical edge joins a multi-successor block to a multi-predecessor
/// block; copies placed on it would execute on the wrong paths.
pub fn is_critical_edge(u: Label, v: Label, edges: &EdgeMaps) -> bool {
    edges.out_degree(u) >= 2 && edges.in_degree(v) >= 2
}

/// Split the edge `(u, v)` by inserting a fresh forwarding block.
///
/// Mints a label `m`, inserts the block `m: jump v`, retargets `u`'s
/// terminator from `v` to `m`, and rewires both edge maps. Returns the
/// fresh label. Fails with [`CfgError::NoSuchEdge`] when `(u, v)` is not
/// an edge.
pub fn split_edge<I: Instr>(
    u: Label,
    v: Label,
    map: &mut BlockMap<I>,
    edges: &mut EdgeMaps,
    labels: &mut LabelFactory,
) -> Result<Label, CfgError> {
    if !edges.has_edge(u, v) {
        return Err(CfgError::NoSuchEdge(u, v));
    }

    let mid = labels.fresh();

    let block = map.blocks.get_mut(&u).expect("edge source block exists");
    let term = block.instrs.last_mut().expect("block has a terminator");
    if term.is_jump() {
        term.replace_target(mid);
    } else {
        term.replace_ctarget(v, mid);
    }

    map.insert(BasicBlock {
        label: mid,
        instrs: vec![I::new_label(mid), I::new_jump(v)],
    })?;

    let us = edges.succ.get_mut(&u).expect("edge source keyed");
    us.remove(&v);
    us.insert(mid);
    let vp = edges.pred.get_mut(&v).expect("edge target keyed");
    vp.remove(&u);
    vp.insert(mid);
    edges.succ.insert(mid, HashSet::from([v]));
    edges.pred.insert(mid, HashSet::from([u]));

    debug_assert!(!is_critical_edge(u, mid, edges) && !is_critical_edge(mid, v, edges));
    Ok(mid)
}

/// Split every critical edge in the graph, in deterministic label order.
///
/// Idempotent as a policy: forwarding blocks have one predecessor and one
/// successor, so a second application finds no critical edges among them.
/// Returns the labels of the inserted blocks.
pub fn split_critical_edges<I: Instr>(
    map: &mut BlockMap<I>,
    edges: &mut EdgeMaps,
    labels: &mut LabelFactory,
) -> Result<Vec<Label>, CfgError> {
    let mut nodes: Vec<Label> = edges.succ.keys().copied().collect();
    nodes.sort_unstable();

    let mut critical = Vec::new();
    for &u in &nodes {
        let mut vs: Vec<Label> = edges.succ[&u].iter().copied().collect();
        vs.sort_unstable();
        for v in vs {
            if is_critical_edge(u, v, edges) {
                critical.push((u, v));
            }
        }
    }

    let mut inserted = Vec::with_capacity(critical.len());
    for (u, v) in critical {
        inserted.push(split_edge(u, v, map, edges, labels)?);
    }
    trace!("split {} critical edges", inserted.len());
    Ok(inserted)
}

/// Postorder over the labels reachable from ENTRY.
///
/// Successor ties are visited in ascending label order, so the result is
/// deterministic. Iterative with an explicit stack: block counts can
/// exceed the call stack.
pub fn postorder(edges: &EdgeMaps) -> Vec<Label> {
    let mut order = Vec::new();
    if !edges.succ.contains_key(&Label::ENTRY) {
        return order;
    }

    // Successors are pre-sorted descending so pops visit ascending order.
    let pending = |l: Label| -> Vec<Label> {
        let mut s: Vec<Label> = edges.succ.get(&l).into_iter().flatten().copied().collect();
        s.sort_unstable_by(|a, b| b.cmp(a));
        s
    };

    let mut visited = HashSet::from([Label::ENTRY]);
    let mut stack = vec![(Label::ENTRY, pending(Label::ENTRY))];

    while let Some((_, succs)) = stack.last_mut() {
        if let Some(next) = succs.pop() {
            if visited.insert(next) {
                stack.push((next, pending(next)));
            }
        } else {
            let (node, _) = stack.pop().expect("stack is non-empty");
            order.push(node);
        }
    }
    order
}

/// Linearise blocks in the given order. Labels absent from the map (for
/// example dead blocks dropped from a reachability order) are skipped.
pub fn to_instrs<I: Instr>(map: &BlockMap<I>, order: &[Label]) -> Vec<I> {
    let mut out = Vec::new();
    for l in order {
        if let Some(block) = map.blocks.get(l) {
            out.extend(block.instrs.iter().cloned());
        }
    }
    out
}
