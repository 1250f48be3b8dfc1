//! The capability trait lowered instructions expose to the backend passes.

use crate::label::Label;

/// Interface between a lowered instruction set and the CFG builder.
///
/// Implementations exist per instruction flavour (three-address abstract
/// assembly, two-address pseudo assembly), so the passes monomorphise
/// instead of dispatching per instruction.
pub trait Instr: Clone {
    /// A label pseudo-instruction for `label`.
    fn new_label(label: Label) -> Self;

    /// An unconditional jump to `target`.
    fn new_jump(target: Label) -> Self;

    /// A bare return.
    fn new_ret() -> Self;

    fn is_label(&self) -> bool;
    fn is_jump(&self) -> bool;
    fn is_cjump(&self) -> bool;
    fn is_return(&self) -> bool;
    fn is_assert(&self) -> bool;

    /// The label carried by a label pseudo-instruction.
    fn as_label(&self) -> Option<Label>;

    /// Append the successor labels this instruction implies. Empty for
    /// non-control instructions and for returns.
    fn successors(&self, out: &mut Vec<Label>);

    /// Whether control may continue to the lexically next instruction.
    /// False for unconditional jumps and returns; true for conditional
    /// jumps that keep an implicit fall-through edge.
    fn falls_through(&self) -> bool;

    /// Rewrite the target of an unconditional jump.
    fn replace_target(&mut self, new_target: Label);

    /// Rewrite every occurrence of `old` among a conditional jump's targets.
    fn replace_ctarget(&mut self, old: Label, new_target: Label);

    /// True for jumps, conditional jumps and returns: the instructions that
    /// terminate a basic block.
    fn is_control(&self) -> bool {
        self.is_jump() || self.is_cjump() || self.is_return()
    }
}
