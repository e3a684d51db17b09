//! Physical controls and their text tokens.
//!
//! Every control has one canonical token: a device prefix plus a name,
//! e.g. `kb_w`, `mo_left`, `gp_south`, `gp_lstick`. Parsing is liberal about
//! prefixes (`kb1_`, `mo1_`, `gp1_`) and a few mouse aliases; printing always
//! produces the canonical form, so tokens survive a save/load cycle unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Plain 2D value, as read from sticks, mouse motion and composites.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Scale down to unit length if longer than 1; shorter vectors are kept.
    pub fn clamp_length(self) -> Self {
        let len = self.length();
        if len > 1.0 {
            Vec2::new(self.x / len, self.y / len)
        } else {
            self
        }
    }

    /// Radial deadzone: anything shorter than `deadzone` reads as zero.
    pub fn with_deadzone(self, deadzone: f32) -> Self {
        if self.length() < deadzone {
            Vec2::ZERO
        } else {
            self
        }
    }
}

/// The two binding groups a control can belong to. A control scheme
/// (keyboard+mouse, or one of the gamepad families) only drives bindings
/// of its own group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SchemeGroup {
    KeyboardMouse,
    Gamepad,
}

impl SchemeGroup {
    pub fn name(&self) -> &'static str {
        match self {
            SchemeGroup::KeyboardMouse => "keyboard+mouse",
            SchemeGroup::Gamepad => "gamepad",
        }
    }
}

impl fmt::Display for SchemeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// `a`..=`z`, stored lowercase.
    Letter(char),
    /// `0`..=`9` on the main row.
    Digit(u8),
    /// `f1`..=`f12`.
    F(u8),
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    LShift,
    RShift,
    LCtrl,
    RCtrl,
    LAlt,
    RAlt,
    Up,
    Down,
    Left,
    Right,
}

const NAMED_KEYS: &[(Key, &str)] = &[
    (Key::Space, "space"),
    (Key::Enter, "enter"),
    (Key::Escape, "escape"),
    (Key::Tab, "tab"),
    (Key::Backspace, "backspace"),
    (Key::LShift, "lshift"),
    (Key::RShift, "rshift"),
    (Key::LCtrl, "lctrl"),
    (Key::RCtrl, "rctrl"),
    (Key::LAlt, "lalt"),
    (Key::RAlt, "ralt"),
    (Key::Up, "up"),
    (Key::Down, "down"),
    (Key::Left, "left"),
    (Key::Right, "right"),
];

impl Key {
    /// Parse a bare key name (no device prefix), case-insensitive.
    pub fn parse(s: &str) -> Option<Key> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "esc" => return Some(Key::Escape),
            "return" => return Some(Key::Enter),
            "lcontrol" => return Some(Key::LCtrl),
            "rcontrol" => return Some(Key::RCtrl),
            _ => {}
        }
        if let Some((key, _)) = NAMED_KEYS.iter().find(|(_, name)| *name == s) {
            return Some(*key);
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_lowercase() => return Some(Key::Letter(c)),
            (Some(c), None) if c.is_ascii_digit() => return Some(Key::Digit(c as u8 - b'0')),
            _ => {}
        }
        s.strip_prefix('f')
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (1..=12).contains(n))
            .map(Key::F)
    }

    /// Every key this crate knows about, in token order.
    pub fn all() -> impl Iterator<Item = Key> {
        let letters = ('a'..='z').map(Key::Letter);
        let digits = (0..=9).map(Key::Digit);
        let fkeys = (1..=12).map(Key::F);
        letters
            .chain(digits)
            .chain(fkeys)
            .chain(NAMED_KEYS.iter().map(|(k, _)| *k))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Letter(c) => write!(f, "{c}"),
            Key::Digit(d) => write!(f, "{d}"),
            Key::F(n) => write!(f, "f{n}"),
            named => {
                let name = NAMED_KEYS
                    .iter()
                    .find(|(k, _)| k == named)
                    .map(|(_, n)| *n)
                    .unwrap_or("?");
                f.write_str(name)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Extra buttons, `X(1)` is the first side button.
    X(u8),
}

impl MouseButton {
    fn parse(seg: &str) -> Option<MouseButton> {
        let s = seg.trim().to_ascii_lowercase();
        match s.as_str() {
            "left" | "lmb" | "mouse1" => return Some(MouseButton::Left),
            "right" | "rmb" | "mouse2" => return Some(MouseButton::Right),
            "middle" | "mmb" | "mouse3" => return Some(MouseButton::Middle),
            _ => {}
        }
        if let Some(n) = s.strip_prefix('x').and_then(|n| n.parse::<u8>().ok()) {
            return (n >= 1).then_some(MouseButton::X(n));
        }
        // "mouse<N>": 4 and up are side buttons
        s.strip_prefix("mouse")
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| *n >= 4)
            .map(|n| MouseButton::X(n - 3))
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseButton::Left => f.write_str("left"),
            MouseButton::Right => f.write_str("right"),
            MouseButton::Middle => f.write_str("middle"),
            MouseButton::X(n) => write!(f, "x{n}"),
        }
    }
}

/// Gamepad buttons by position, so one table covers every pad family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PadButton {
    South,
    East,
    West,
    North,
    LeftShoulder,
    RightShoulder,
    LeftStickPress,
    RightStickPress,
    Start,
    Select,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
}

const PAD_BUTTONS: &[(PadButton, &str)] = &[
    (PadButton::South, "south"),
    (PadButton::East, "east"),
    (PadButton::West, "west"),
    (PadButton::North, "north"),
    (PadButton::LeftShoulder, "lshoulder"),
    (PadButton::RightShoulder, "rshoulder"),
    (PadButton::LeftStickPress, "lstick_press"),
    (PadButton::RightStickPress, "rstick_press"),
    (PadButton::Start, "start"),
    (PadButton::Select, "select"),
    (PadButton::DpadUp, "dpad_up"),
    (PadButton::DpadDown, "dpad_down"),
    (PadButton::DpadLeft, "dpad_left"),
    (PadButton::DpadRight, "dpad_right"),
];

impl PadButton {
    fn parse(s: &str) -> Option<PadButton> {
        let s = s.trim().to_ascii_lowercase();
        PAD_BUTTONS.iter().find(|(_, n)| *n == s).map(|(b, _)| *b)
    }

    fn name(&self) -> &'static str {
        PAD_BUTTONS
            .iter()
            .find(|(b, _)| b == self)
            .map(|(_, n)| *n)
            .unwrap_or("?")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub(crate) fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    fn letter(self) -> char {
        match self {
            Side::Left => 'l',
            Side::Right => 'r',
        }
    }
}

/// One physical control a binding can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Control {
    Key(Key),
    Mouse(MouseButton),
    /// Mouse motion since the previous tick.
    MouseDelta,
    Pad(PadButton),
    /// Analog trigger, 0.0..=1.0.
    Trigger(Side),
    /// Analog stick, each axis -1.0..=1.0.
    Stick(Side),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlParseError {
    #[error("empty control token")]
    Empty,
    #[error("unknown device prefix in '{0}' (expected kb_, mo_ or gp_)")]
    UnknownDevice(String),
    #[error("unknown control '{0}'")]
    UnknownControl(String),
}

impl Control {
    pub fn group(&self) -> SchemeGroup {
        match self {
            Control::Key(_) | Control::Mouse(_) | Control::MouseDelta => {
                SchemeGroup::KeyboardMouse
            }
            Control::Pad(_) | Control::Trigger(_) | Control::Stick(_) => SchemeGroup::Gamepad,
        }
    }

    /// Controls that produce a 2D value rather than a single actuation.
    #[inline]
    pub fn is_vector(&self) -> bool {
        matches!(self, Control::MouseDelta | Control::Stick(_))
    }

    /// Controls that can drive a button-like action (digital or trigger).
    #[inline]
    pub fn is_button_like(&self) -> bool {
        !self.is_vector()
    }

    /// True when the printed token parses back to this exact control.
    /// Hand-built values like `Key::F(13)` or `Key::Letter('R')` do not, and
    /// must never reach a saved table.
    pub fn is_canonical(&self) -> bool {
        self.to_string().parse::<Control>().as_ref() == Ok(self)
    }

    /// Every control token this crate can produce, for listings.
    pub fn all() -> impl Iterator<Item = Control> {
        let keys = Key::all().map(Control::Key);
        let mouse = [
            MouseButton::Left,
            MouseButton::Right,
            MouseButton::Middle,
            MouseButton::X(1),
            MouseButton::X(2),
        ]
        .into_iter()
        .map(Control::Mouse);
        let pad = PAD_BUTTONS.iter().map(|(b, _)| Control::Pad(*b));
        let analog = [
            Control::MouseDelta,
            Control::Trigger(Side::Left),
            Control::Trigger(Side::Right),
            Control::Stick(Side::Left),
            Control::Stick(Side::Right),
        ];
        keys.chain(mouse).chain(pad).chain(analog)
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Control::Key(k) => write!(f, "kb_{k}"),
            Control::Mouse(b) => write!(f, "mo_{b}"),
            Control::MouseDelta => f.write_str("mo_delta"),
            Control::Pad(b) => write!(f, "gp_{}", b.name()),
            Control::Trigger(s) => write!(f, "gp_{}trigger", s.letter()),
            Control::Stick(s) => write!(f, "gp_{}stick", s.letter()),
        }
    }
}

// Only strip prefixes we actually expect: "kb_", "kb1_", "mo_", "gp2_", ...
fn split_device_prefix(s: &str) -> Option<(&str, &str)> {
    let (prefix, rest) = s.split_once('_')?;
    let device = prefix.trim_end_matches(|c: char| c.is_ascii_digit());
    match device {
        "kb" | "mo" | "gp" => Some((device, rest)),
        _ => None,
    }
}

impl FromStr for Control {
    type Err = ControlParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim().to_ascii_lowercase();
        if s.is_empty() {
            return Err(ControlParseError::Empty);
        }
        let unknown = || ControlParseError::UnknownControl(input.trim().to_string());

        let Some((device, name)) = split_device_prefix(&s) else {
            // A bare token is only accepted when it is a keyboard key.
            return match Key::parse(&s) {
                Some(k) => Ok(Control::Key(k)),
                None if s.contains('_') => Err(ControlParseError::UnknownDevice(s)),
                None => Err(unknown()),
            };
        };

        match device {
            "kb" => Key::parse(name).map(Control::Key).ok_or_else(unknown),
            "mo" => match name {
                "delta" | "move" | "axis" => Ok(Control::MouseDelta),
                other => MouseButton::parse(other).map(Control::Mouse).ok_or_else(unknown),
            },
            _ => match name {
                "ltrigger" => Ok(Control::Trigger(Side::Left)),
                "rtrigger" => Ok(Control::Trigger(Side::Right)),
                "lstick" => Ok(Control::Stick(Side::Left)),
                "rstick" => Ok(Control::Stick(Side::Right)),
                other => PadButton::parse(other).map(Control::Pad).ok_or_else(unknown),
            },
        }
    }
}

impl TryFrom<String> for Control {
    type Error = ControlParseError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Control> for String {
    fn from(c: Control) -> Self {
        c.to_string()
    }
}
