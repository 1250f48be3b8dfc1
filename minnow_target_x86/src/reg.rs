//! x86-64 register definitions and the allocation register file.

use minnow_regalloc::{PReg, RegFile};

/// x86-64 general-purpose registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Gpr {
    Rax = 0,
    Rcx = 1,
    Rdx = 2,
    Rbx = 3,
    Rsp = 4,
    Rbp = 5,
    Rsi = 6,
    Rdi = 7,
    R8 = 8,
    R9 = 9,
    R10 = 10,
    R11 = 11,
    R12 = 12,
    R13 = 13,
    R14 = 14,
    R15 = 15,
}

/// Number of general-purpose registers.
pub const NUM_REGS: u8 = 16;

/// System V argument registers, in argument order.
pub const ARG_REGS: [Gpr; 6] = [Gpr::Rdi, Gpr::Rsi, Gpr::Rdx, Gpr::Rcx, Gpr::R8, Gpr::R9];

/// Caller-saved registers, clobbered across calls.
pub const CALLER_SAVED: [Gpr; 9] = [
    Gpr::Rax,
    Gpr::Rcx,
    Gpr::Rdx,
    Gpr::Rsi,
    Gpr::Rdi,
    Gpr::R8,
    Gpr::R9,
    Gpr::R10,
    Gpr::R11,
];

/// Callee-saved registers available to the allocator.
pub const CALLEE_SAVED: [Gpr; 5] = [Gpr::Rbx, Gpr::R12, Gpr::R13, Gpr::R14, Gpr::R15];

impl Gpr {
    /// Allocator index. Inverse of [`Gpr::from_index`].
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Register for an allocator index.
    pub fn from_index(index: u8) -> Gpr {
        match index {
            0 => Gpr::Rax,
            1 => Gpr::Rcx,
            2 => Gpr::Rdx,
            3 => Gpr::Rbx,
            4 => Gpr::Rsp,
            5 => Gpr::Rbp,
            6 => Gpr::Rsi,
            7 => Gpr::Rdi,
            8 => Gpr::R8,
            9 => Gpr::R9,
            10 => Gpr::R10,
            11 => Gpr::R11,
            12 => Gpr::R12,
            13 => Gpr::R13,
            14 => Gpr::R14,
            15 => Gpr::R15,
            _ => unreachable!("invalid register index: {index}"),
        }
    }

    pub fn preg(self) -> PReg {
        PReg(self as u8)
    }

    pub fn from_preg(p: PReg) -> Gpr {
        Gpr::from_index(p.0)
    }

    /// Registers never handed out by the allocator: the stack and base
    /// pointers, and R11, which stays free for spill shuttling.
    pub fn special_use(self) -> bool {
        matches!(self, Gpr::Rsp | Gpr::Rbp | Gpr::R11)
    }

    /// 64-bit register name.
    pub fn name(self) -> &'static str {
        match self {
            Gpr::Rax => "rax",
            Gpr::Rcx => "rcx",
            Gpr::Rdx => "rdx",
            Gpr::Rbx => "rbx",
            Gpr::Rsp => "rsp",
            Gpr::Rbp => "rbp",
            Gpr::Rsi => "rsi",
            Gpr::Rdi => "rdi",
            Gpr::R8 => "r8",
            Gpr::R9 => "r9",
            Gpr::R10 => "r10",
            Gpr::R11 => "r11",
            Gpr::R12 => "r12",
            Gpr::R13 => "r13",
            Gpr::R14 => "r14",
            Gpr::R15 => "r15",
        }
    }
}

/// The x86-64 register file the allocator colors against.
pub fn reg_file() -> RegFile {
    RegFile {
        num_regs: NUM_REGS,
        reserved: (0..NUM_REGS)
            .filter(|&i| Gpr::from_index(i).special_use())
            .collect(),
    }
}
