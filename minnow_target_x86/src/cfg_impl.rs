//! [`Instr`] implementations for both instruction flavours.

use minnow_ir::{Instr, Label};

use crate::inst::AbsInst;
use crate::pseudo::PInst;

impl Instr for AbsInst {
    fn new_label(label: Label) -> Self {
        AbsInst::Label(label)
    }

    fn new_jump(target: Label) -> Self {
        AbsInst::Jump { target }
    }

    fn new_ret() -> Self {
        AbsInst::Ret { src: None }
    }

    fn is_label(&self) -> bool {
        matches!(self, AbsInst::Label(_))
    }

    fn is_jump(&self) -> bool {
        matches!(self, AbsInst::Jump { .. })
    }

    fn is_cjump(&self) -> bool {
        matches!(self, AbsInst::CJump { .. })
    }

    fn is_return(&self) -> bool {
        matches!(self, AbsInst::Ret { .. })
    }

    fn is_assert(&self) -> bool {
        matches!(self, AbsInst::Assert { .. })
    }

    fn as_label(&self) -> Option<Label> {
        match self {
            AbsInst::Label(l) => Some(*l),
            _ => None,
        }
    }

    fn successors(&self, out: &mut Vec<Label>) {
        match self {
            AbsInst::Jump { target } => out.push(*target),
            AbsInst::CJump {
                if_true, if_false, ..
            } => {
                out.push(*if_true);
                out.push(*if_false);
            }
            _ => {}
        }
    }

    fn falls_through(&self) -> bool {
        // Both branch targets are explicit in this flavour.
        !matches!(
            self,
            AbsInst::Jump { .. } | AbsInst::CJump { .. } | AbsInst::Ret { .. }
        )
    }

    fn replace_target(&mut self, new_target: Label) {
        if let AbsInst::Jump { target } = self {
            *target = new_target;
        }
    }

    fn replace_ctarget(&mut self, old: Label, new_target: Label) {
        if let AbsInst::CJump {
            if_true, if_false, ..
        } = self
        {
            if *if_true == old {
                *if_true = new_target;
            }
            if *if_false == old {
                *if_false = new_target;
            }
        }
    }
}

impl Instr for PInst {
    fn new_label(label: Label) -> Self {
        PInst::Label(label)
    }

    fn new_jump(target: Label) -> Self {
        PInst::Jmp { target }
    }

    fn new_ret() -> Self {
        PInst::Ret
    }

    fn is_label(&self) -> bool {
        matches!(self, PInst::Label(_))
    }

    fn is_jump(&self) -> bool {
        matches!(self, PInst::Jmp { .. })
    }

    fn is_cjump(&self) -> bool {
        matches!(self, PInst::Jcc { .. })
    }

    fn is_return(&self) -> bool {
        matches!(self, PInst::Ret)
    }

    fn is_assert(&self) -> bool {
        // Asserts are compare-and-branch sequences by this stage.
        false
    }

    fn as_label(&self) -> Option<Label> {
        match self {
            PInst::Label(l) => Some(*l),
            _ => None,
        }
    }

    fn successors(&self, out: &mut Vec<Label>) {
        match self {
            PInst::Jmp { target } | PInst::Jcc { target, .. } => out.push(*target),
            _ => {}
        }
    }

    fn falls_through(&self) -> bool {
        !matches!(self, PInst::Jmp { .. } | PInst::Ret)
    }

    fn replace_target(&mut self, new_target: Label) {
        if let PInst::Jmp { target } = self {
            *target = new_target;
        }
    }

    fn replace_ctarget(&mut self, old: Label, new_target: Label) {
        if let PInst::Jcc { target, .. } = self
            && *target == old
        {
            *target = new_target;
        }
    }
}
