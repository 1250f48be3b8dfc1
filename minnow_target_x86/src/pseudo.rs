//! Pseudo x86: the two-address instruction flavour handed to liveness and
//! register allocation after two-address lowering.
//!
//! Operands are still temps at this stage; fixed-register operations
//! (division, calls, returns) mention hard registers directly so the
//! allocator sees their constraints.

use std::fmt;

use minnow_ir::Label;
use minnow_regalloc::Operand;

use crate::reg::Gpr;

/// Two-address ALU operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    Imul,
    And,
    Or,
    Xor,
    Sal,
    Sar,
}

impl AluOp {
    fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "add",
            AluOp::Sub => "sub",
            AluOp::Imul => "imul",
            AluOp::And => "and",
            AluOp::Or => "or",
            AluOp::Xor => "xor",
            AluOp::Sal => "sal",
            AluOp::Sar => "sar",
        }
    }
}

/// Condition codes for jcc/setcc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    E,
    Ne,
    L,
    Le,
    G,
    Ge,
}

impl Cond {
    fn suffix(self) -> &'static str {
        match self {
            Cond::E => "e",
            Cond::Ne => "ne",
            Cond::L => "l",
            Cond::Le => "le",
            Cond::G => "g",
            Cond::Ge => "ge",
        }
    }
}

/// A two-address pseudo x86 instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PInst {
    Label(Label),
    /// mov dst, src
    Mov { dst: Operand, src: Operand },
    /// op dst, src (dst is read and written)
    Alu {
        op: AluOp,
        dst: Operand,
        src: Operand,
    },
    /// neg dst
    Neg { dst: Operand },
    /// not dst
    Not { dst: Operand },
    /// cmp lhs, rhs (flags only)
    Cmp { lhs: Operand, rhs: Operand },
    /// test lhs, rhs (flags only)
    Test { lhs: Operand, rhs: Operand },
    /// setcc dst
    Setcc { cc: Cond, dst: Operand },
    /// Sign-extend RAX into RDX:RAX before idiv.
    Cdq,
    /// Signed divide of RDX:RAX; quotient in RAX, remainder in RDX.
    Idiv { src: Operand },
    /// Direct call; arguments travel in the ABI registers.
    Call { name: String, arity: u8 },
    Jmp { target: Label },
    /// Conditional jump; falls through when the condition fails.
    Jcc { cc: Cond, target: Label },
    /// Return; the value travels in RAX.
    Ret,
    /// Assembler directive; occupies no line in the analyses.
    Directive(String),
    Comment(String),
}

/// An operand with hard registers shown by name rather than index.
struct Pretty(Operand);

impl fmt::Display for Pretty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Operand::Reg(r) => write!(f, "%{}", Gpr::from_preg(r).name()),
            other => write!(f, "{other}"),
        }
    }
}

impl fmt::Display for PInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PInst::Label(l) => write!(f, "{l}:"),
            PInst::Mov { dst, src } => write!(f, "\tmov {}, {}", Pretty(*dst), Pretty(*src)),
            PInst::Alu { op, dst, src } => {
                write!(f, "\t{} {}, {}", op.mnemonic(), Pretty(*dst), Pretty(*src))
            }
            PInst::Neg { dst } => write!(f, "\tneg {}", Pretty(*dst)),
            PInst::Not { dst } => write!(f, "\tnot {}", Pretty(*dst)),
            PInst::Cmp { lhs, rhs } => write!(f, "\tcmp {}, {}", Pretty(*lhs), Pretty(*rhs)),
            PInst::Test { lhs, rhs } => write!(f, "\ttest {}, {}", Pretty(*lhs), Pretty(*rhs)),
            PInst::Setcc { cc, dst } => write!(f, "\tset{} {}", cc.suffix(), Pretty(*dst)),
            PInst::Cdq => write!(f, "\tcdq"),
            PInst::Idiv { src } => write!(f, "\tidiv {}", Pretty(*src)),
            PInst::Call { name, .. } => write!(f, "\tcall {name}"),
            PInst::Jmp { target } => write!(f, "\tjmp {target}"),
            PInst::Jcc { cc, target } => write!(f, "\tj{} {target}", cc.suffix()),
            PInst::Ret => write!(f, "\tret"),
            PInst::Directive(d) => write!(f, "\t{d}"),
            PInst::Comment(c) => write!(f, "\t# {c}"),
        }
    }
}
