//! minnow_target_x86: x86-64 glue for the minnow backend passes.
//!
//! Defines the register file, the two lowered instruction flavours
//! (three-address abstract assembly and two-address pseudo x86) and their
//! implementations of the pass interfaces, plus the stack frame layout.

pub mod frame;
pub mod inst;
pub mod pseudo;
pub mod reg;

mod cfg_impl;
mod regalloc_impl;
