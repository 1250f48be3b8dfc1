//! Error type shared by the CFG and dominator passes.

use minnow_ir::Label;
use thiserror::Error;

/// Errors surfaced by CFG construction and dominance queries.
///
/// Each is fatal to the current function: callers treat a function as
/// atomic and never consume partial results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CfgError {
    /// Dangling jump target, duplicate label, or missing terminator.
    #[error("malformed control-flow graph: {0}")]
    Malformed(String),

    /// `split_edge` was asked to split an edge that does not exist.
    #[error("no edge from {0} to {1}")]
    NoSuchEdge(Label, Label),

    /// Immediate-dominator query for a block with no path from entry.
    #[error("block {0} is unreachable from entry")]
    Unreachable(Label),
}
