//! minnow_cfg: control-flow graph construction and dominator analysis.
//!
//! Consumes a linear instruction sequence over any [`minnow_ir::Instr`]
//! type and produces labelled basic blocks, predecessor/successor edge
//! maps, and dominance information for the SSA and allocation passes
//! downstream.

pub mod cfg;
pub mod dom;
pub mod error;

pub use cfg::{
    BasicBlock, BlockMap, EdgeMaps, build_bb, build_ino, eliminate_fall_through,
    is_critical_edge, postorder, split_critical_edges, split_edge, to_instrs,
};
pub use dom::Dominators;
pub use error::CfgError;
