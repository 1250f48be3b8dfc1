//! Stack frame layout: spill slots and aggregate locals (post-regalloc).

use std::collections::HashMap;

use minnow_ir::{MemSlot, Temp};
use minnow_regalloc::allocator::Assignment;

use crate::reg::NUM_REGS;

/// Byte size of a general-purpose register slot.
pub const WORD_SIZE: i32 = 8;

/// Displacement below the base pointer for spill color `index`.
///
/// Spill colors start at the register file size, so the first spilled
/// temp lands one word below the saved base pointer.
pub fn spill_offset(index: u32) -> i32 {
    debug_assert!(index >= NUM_REGS as u32, "spill index below register file");
    (index - NUM_REGS as u32 + 1) as i32 * WORD_SIZE
}

/// Frame layout for one function: the spill area sits directly below the
/// saved base pointer, aggregate slots follow, and the total frame size
/// rounds up to 16 bytes.
#[derive(Debug)]
pub struct FrameLayout {
    slot_offsets: HashMap<MemSlot, i32>,
    frame_size: i32,
}

impl FrameLayout {
    /// Lay out the frame for the given allocation result and aggregate
    /// slots (`(slot, byte size)` pairs, placed in the order given).
    pub fn new(
        assignments: &HashMap<Temp, Assignment>,
        slots: &[(MemSlot, u32)],
    ) -> FrameLayout {
        let spill_area = assignments
            .values()
            .filter_map(|a| match a {
                Assignment::Spill(i) => Some(spill_offset(*i)),
                Assignment::Reg(_) => None,
            })
            .max()
            .unwrap_or(0);

        let mut off = spill_area;
        let mut slot_offsets = HashMap::new();
        for &(slot, size) in slots {
            off += (size as i32 + WORD_SIZE - 1) & !(WORD_SIZE - 1);
            slot_offsets.insert(slot, off);
        }

        FrameLayout {
            slot_offsets,
            frame_size: (off + 15) & !15,
        }
    }

    /// Displacement below the base pointer for an aggregate slot.
    pub fn slot_offset(&self, slot: MemSlot) -> Option<i32> {
        self.slot_offsets.get(&slot).copied()
    }

    /// Total frame size in bytes, 16-byte aligned.
    pub fn frame_size(&self) -> i32 {
        self.frame_size
    }
}
