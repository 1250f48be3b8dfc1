//! [`AllocInst`] implementations for both instruction flavours.
//!
//! Fixed-register effects are expressed as ordinary operands: division
//! reads and writes RAX/RDX, calls use the ABI argument registers and
//! define every caller-saved register, returns read RAX. The allocator
//! then keeps temps out of clobbered registers without a separate
//! clobber channel.

use minnow_regalloc::{AllocInst, Operand};

use crate::inst::AbsInst;
use crate::pseudo::PInst;
use crate::reg::{ARG_REGS, CALLER_SAVED, Gpr};

fn reg(g: Gpr) -> Operand {
    Operand::Reg(g.preg())
}

impl AllocInst for AbsInst {
    fn uses(&self, out: &mut Vec<Operand>) {
        match self {
            AbsInst::Mov { src, .. } | AbsInst::Unop { src, .. } => out.push(*src),
            AbsInst::Binop { lhs, rhs, .. } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            AbsInst::Load { base, .. } => out.push(*base),
            AbsInst::Store { base, src, .. } => {
                out.push(*base);
                out.push(*src);
            }
            AbsInst::Call { args, .. } => out.extend(args.iter().copied()),
            AbsInst::Assert { cond } | AbsInst::CJump { cond, .. } => out.push(*cond),
            AbsInst::Ret { src: Some(s) } => out.push(*s),
            AbsInst::Label(_)
            | AbsInst::FrameAddr { .. }
            | AbsInst::Jump { .. }
            | AbsInst::Ret { src: None }
            | AbsInst::Directive(_)
            | AbsInst::Comment(_) => {}
        }
    }

    fn defs(&self, out: &mut Vec<Operand>) {
        match self {
            AbsInst::Mov { dst, .. }
            | AbsInst::Binop { dst, .. }
            | AbsInst::Unop { dst, .. }
            | AbsInst::Load { dst, .. }
            | AbsInst::FrameAddr { dst, .. } => out.push(*dst),
            AbsInst::Call { dst: Some(d), .. } => out.push(*d),
            _ => {}
        }
    }

    fn is_move(&self) -> bool {
        matches!(
            self,
            AbsInst::Mov { dst, src }
                if dst.node().is_some() && src.node().is_some()
        )
    }

    fn is_meta(&self) -> bool {
        matches!(self, AbsInst::Directive(_) | AbsInst::Comment(_))
    }
}

impl AllocInst for PInst {
    fn uses(&self, out: &mut Vec<Operand>) {
        match self {
            PInst::Mov { src, .. } => out.push(*src),
            // Two-address: the destination is read as well.
            PInst::Alu { dst, src, .. } => {
                out.push(*dst);
                out.push(*src);
            }
            PInst::Neg { dst } | PInst::Not { dst } => out.push(*dst),
            PInst::Cmp { lhs, rhs } | PInst::Test { lhs, rhs } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            PInst::Cdq => out.push(reg(Gpr::Rax)),
            PInst::Idiv { src } => {
                out.push(*src);
                out.push(reg(Gpr::Rax));
                out.push(reg(Gpr::Rdx));
            }
            PInst::Call { arity, .. } => {
                let n = (*arity as usize).min(ARG_REGS.len());
                out.extend(ARG_REGS[..n].iter().map(|&g| reg(g)));
            }
            PInst::Ret => out.push(reg(Gpr::Rax)),
            PInst::Label(_)
            | PInst::Setcc { .. }
            | PInst::Jmp { .. }
            | PInst::Jcc { .. }
            | PInst::Directive(_)
            | PInst::Comment(_) => {}
        }
    }

    fn defs(&self, out: &mut Vec<Operand>) {
        match self {
            PInst::Mov { dst, .. }
            | PInst::Alu { dst, .. }
            | PInst::Neg { dst }
            | PInst::Not { dst }
            | PInst::Setcc { dst, .. } => out.push(*dst),
            PInst::Cdq => out.push(reg(Gpr::Rdx)),
            PInst::Idiv { .. } => {
                out.push(reg(Gpr::Rax));
                out.push(reg(Gpr::Rdx));
            }
            // Calls clobber every caller-saved register; modelling the
            // clobbers as defs makes live-across values interfere with
            // them.
            PInst::Call { .. } => out.extend(CALLER_SAVED.iter().map(|&g| reg(g))),
            _ => {}
        }
    }

    fn is_move(&self) -> bool {
        matches!(
            self,
            PInst::Mov { dst, src }
                if dst.node().is_some() && src.node().is_some()
        )
    }

    fn is_meta(&self) -> bool {
        matches!(self, PInst::Directive(_) | PInst::Comment(_))
    }
}
