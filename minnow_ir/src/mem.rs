//! Stack memory slots for aggregate locals.
//!
//! Structs and arrays that must be addressable get a [`MemSlot`] at
//! instruction selection time; the frame layout in the target crate turns
//! slots into base-pointer offsets after register allocation.

use std::fmt;

/// An abstract stack memory slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemSlot(u32);

impl MemSlot {
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MemSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mem{}", self.0)
    }
}

/// Monotonic source of fresh memory slots.
#[derive(Debug, Default)]
pub struct MemFactory {
    next: u32,
}

impl MemFactory {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Mint a fresh slot.
    pub fn fresh(&mut self) -> MemSlot {
        let m = MemSlot(self.next);
        self.next += 1;
        m
    }

    /// Restore the counter for the next compilation.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}
