//! Virtual registers ("temps") and the temp factory.

use std::fmt;

/// A virtual register.
///
/// Non-negative ids are ordinary temps minted by a [`TempFactory`].
/// Negative ids encode pre-bound hard registers, so instruction selection
/// can pin an operand to a machine register before allocation runs:
/// register index `i` maps to id `-1 - i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Temp(i32);

impl Temp {
    /// A temp pinned to the hard register with the given index.
    pub fn precolored(index: u8) -> Temp {
        Temp(-1 - index as i32)
    }

    /// The hard-register index of a pre-bound temp, `None` for ordinary temps.
    pub fn hard_reg(self) -> Option<u8> {
        if self.0 < 0 {
            Some((-1 - self.0) as u8)
        } else {
            None
        }
    }

    /// Raw id. Negative for pre-bound hard registers.
    pub fn id(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hard_reg() {
            Some(i) => write!(f, "%r{i}"),
            None => write!(f, "%t{}", self.0),
        }
    }
}

/// Monotonic source of fresh temps.
#[derive(Debug, Default)]
pub struct TempFactory {
    next: i32,
}

impl TempFactory {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Mint a fresh temp.
    pub fn fresh(&mut self) -> Temp {
        assert!(self.next >= 0, "temp counter overflow");
        let t = Temp(self.next);
        self.next += 1;
        t
    }

    /// Number of temps minted so far.
    pub fn count(&self) -> u32 {
        self.next as u32
    }

    /// Restore the counter for the next compilation.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}
