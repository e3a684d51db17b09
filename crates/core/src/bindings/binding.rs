use serde::{Deserialize, Serialize};
use std::fmt;

use crate::controls::{Control, SchemeGroup};

/// Direction a control contributes to inside a 2D composite (WASD style).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompositePart {
    Up,
    Down,
    Left,
    Right,
}

impl CompositePart {
    pub fn name(&self) -> &'static str {
        match self {
            CompositePart::Up => "up",
            CompositePart::Down => "down",
            CompositePart::Left => "left",
            CompositePart::Right => "right",
        }
    }
}

/// One binding slot of an action: which control drives it and in which
/// scheme group the slot lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub control: Control,
    pub group: SchemeGroup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<CompositePart>,
}

impl Binding {
    /// Slot bound to `control`, in the control's own group.
    #[inline]
    pub fn new(control: Control) -> Self {
        Binding {
            control,
            group: control.group(),
            part: None,
        }
    }

    #[inline]
    pub fn composite(control: Control, part: CompositePart) -> Self {
        Binding {
            part: Some(part),
            ..Binding::new(control)
        }
    }

    /// True when this slot feeds a 2D value directly (stick, mouse motion)
    /// rather than as a composite direction or a button.
    #[inline]
    pub fn is_vector_slot(&self) -> bool {
        self.part.is_none() && self.control.is_vector()
    }

    /// Whether `control` may replace this slot's control. The control must
    /// be canonical and in the same group, and the shape must match: vector
    /// slots take vector controls, every other slot takes button-like ones.
    pub fn accepts(&self, control: &Control) -> bool {
        if !control.is_canonical() || control.group() != self.group {
            return false;
        }
        if self.is_vector_slot() {
            control.is_vector()
        } else {
            control.is_button_like()
        }
    }

    /// False only for slots whose one compatible control is mouse motion.
    pub fn accepts_anything_but_mouse_motion(&self) -> bool {
        Control::all().any(|c| c != Control::MouseDelta && self.accepts(&c))
    }

    /// Same slot, different control.
    #[inline]
    pub fn with_control(self, control: Control) -> Self {
        Binding { control, ..self }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.part {
            Some(part) => write!(f, "{}({})", self.control, part.name()),
            None => write!(f, "{}", self.control),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{Key, MouseButton, PadButton, Side};

    #[test]
    fn button_slot_takes_same_group_buttons() {
        let slot = Binding::new(Control::Mouse(MouseButton::Left));
        assert!(slot.accepts(&Control::Key(Key::Letter('q'))));
        assert!(!slot.accepts(&Control::MouseDelta));
        assert!(!slot.accepts(&Control::Pad(PadButton::South)));
    }

    #[test]
    fn vector_slot_takes_vectors_only() {
        let slot = Binding::new(Control::Stick(Side::Left));
        assert!(slot.is_vector_slot());
        assert!(slot.accepts(&Control::Stick(Side::Right)));
        assert!(!slot.accepts(&Control::Trigger(Side::Left)));
    }

    #[test]
    fn composite_parts_are_button_slots() {
        let slot = Binding::composite(Control::Key(Key::Letter('w')), CompositePart::Up);
        assert!(!slot.is_vector_slot());
        assert!(slot.accepts(&Control::Key(Key::Up)));
        assert_eq!(slot.to_string(), "kb_w(up)");
    }

    #[test]
    fn non_canonical_controls_are_refused() {
        let slot = Binding::new(Control::Key(Key::Space));
        assert!(slot.accepts(&Control::Key(Key::F(12))));
        assert!(!slot.accepts(&Control::Key(Key::F(13))));
        assert!(!slot.accepts(&Control::Key(Key::Letter('R'))));
        assert!(!slot.accepts(&Control::Mouse(MouseButton::X(0))));
    }

    #[test]
    fn only_the_mouse_motion_slot_needs_mouse_motion() {
        assert!(!Binding::new(Control::MouseDelta).accepts_anything_but_mouse_motion());
        assert!(Binding::new(Control::Stick(Side::Right)).accepts_anything_but_mouse_motion());
        assert!(Binding::new(Control::Key(Key::Space)).accepts_anything_but_mouse_motion());
    }
}
