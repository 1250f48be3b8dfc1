//! Abstract assembly: the three-address instruction flavour produced by
//! instruction selection.
//!
//! This is the form the CFG and SSA passes run on. Conditional jumps carry
//! both targets explicitly, so blocks never fall through; two-address
//! lowering turns this into [`crate::pseudo::PInst`] before allocation.

use std::fmt;

use minnow_ir::{Label, MemSlot};
use minnow_regalloc::Operand;

/// Binary operators, including comparisons producing a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div",
            BinOp::Mod => "mod",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
            BinOp::Shl => "shl",
            BinOp::Shr => "shr",
            BinOp::Eq => "cmpeq",
            BinOp::Ne => "cmpne",
            BinOp::Lt => "cmplt",
            BinOp::Le => "cmple",
            BinOp::Gt => "cmpgt",
            BinOp::Ge => "cmpge",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

/// A three-address abstract assembly instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsInst {
    Label(Label),
    /// dst <- src
    Mov { dst: Operand, src: Operand },
    /// dst <- lhs op rhs
    Binop {
        op: BinOp,
        dst: Operand,
        lhs: Operand,
        rhs: Operand,
    },
    /// dst <- op src
    Unop {
        op: UnOp,
        dst: Operand,
        src: Operand,
    },
    /// dst <- [base + offset]
    Load {
        dst: Operand,
        base: Operand,
        offset: i32,
    },
    /// [base + offset] <- src
    Store {
        base: Operand,
        offset: i32,
        src: Operand,
    },
    /// dst <- address of an aggregate stack slot
    FrameAddr { dst: Operand, slot: MemSlot },
    /// dst <- name(args...)
    Call {
        dst: Option<Operand>,
        name: String,
        args: Vec<Operand>,
    },
    /// Runtime abort when cond is false.
    Assert { cond: Operand },
    Jump { target: Label },
    /// Two-target conditional jump; no implicit fall-through.
    CJump {
        cond: Operand,
        if_true: Label,
        if_false: Label,
    },
    Ret { src: Option<Operand> },
    /// Assembler directive; occupies no line in the analyses.
    Directive(String),
    Comment(String),
}

impl fmt::Display for AbsInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbsInst::Label(l) => write!(f, "{l}:"),
            AbsInst::Mov { dst, src } => write!(f, "\t{dst} <- {src}"),
            AbsInst::Binop { op, dst, lhs, rhs } => {
                write!(f, "\t{dst} <- {} {lhs}, {rhs}", op.mnemonic())
            }
            AbsInst::Unop { op, dst, src } => {
                let m = match op {
                    UnOp::Neg => "neg",
                    UnOp::Not => "not",
                };
                write!(f, "\t{dst} <- {m} {src}")
            }
            AbsInst::Load { dst, base, offset } => {
                write!(f, "\t{dst} <- [{base} + {offset}]")
            }
            AbsInst::Store { base, offset, src } => {
                write!(f, "\t[{base} + {offset}] <- {src}")
            }
            AbsInst::FrameAddr { dst, slot } => write!(f, "\t{dst} <- addr {slot}"),
            AbsInst::Call { dst, name, args } => {
                write!(f, "\t")?;
                if let Some(d) = dst {
                    write!(f, "{d} <- ")?;
                }
                write!(f, "call {name}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
            AbsInst::Assert { cond } => write!(f, "\tassert {cond}"),
            AbsInst::Jump { target } => write!(f, "\tjump {target}"),
            AbsInst::CJump {
                cond,
                if_true,
                if_false,
            } => write!(f, "\tcjump {cond} ? {if_true} : {if_false}"),
            AbsInst::Ret { src: Some(s) } => write!(f, "\tret {s}"),
            AbsInst::Ret { src: None } => write!(f, "\tret"),
            AbsInst::Directive(d) => write!(f, "\t{d}"),
            AbsInst::Comment(c) => write!(f, "\t# {c}"),
        }
    }
}
