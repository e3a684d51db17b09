//! The fixed action catalog and its per-tick state.

pub mod action_set;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named logical input, decoupled from the controls that drive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    Move,
    Look,
    Jump,
    Crouch,
    Sprint,
    Fire,
    Aim,
    Interact,
    InteractAlt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Continuous 2D value (Move, Look).
    Vector,
    /// Press/release state.
    Button,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::Move,
        Action::Look,
        Action::Jump,
        Action::Crouch,
        Action::Sprint,
        Action::Fire,
        Action::Aim,
        Action::Interact,
        Action::InteractAlt,
    ];

    pub fn iter() -> impl Iterator<Item = Action> {
        Self::ALL.into_iter()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Move => "Move",
            Action::Look => "Look",
            Action::Jump => "Jump",
            Action::Crouch => "Crouch",
            Action::Sprint => "Sprint",
            Action::Fire => "Fire",
            Action::Aim => "Aim",
            Action::Interact => "Interact",
            Action::InteractAlt => "InteractAlt",
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Move | Action::Look => ActionKind::Vector,
            _ => ActionKind::Button,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', '-'], "");
        Action::iter()
            .find(|a| a.name().to_ascii_lowercase() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Action::iter().map(|a| a.name()).collect();
                format!("unknown action '{s}', expected one of: {}", names.join(", "))
            })
    }
}

/// Press state of a button-like action for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ButtonState {
    pub is_pressed: bool,
    /// Went down this tick.
    pub pressed_this_tick: bool,
    /// Went up this tick.
    pub released_this_tick: bool,
}

impl ButtonState {
    /// Next state given whether the action is down this tick.
    pub fn advance(self, down: bool) -> Self {
        ButtonState {
            is_pressed: down,
            pressed_this_tick: down && !self.is_pressed,
            released_this_tick: !down && self.is_pressed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_case_insensitively() {
        for a in Action::iter() {
            assert_eq!(a.name().parse::<Action>(), Ok(a));
        }
        assert_eq!("interact_alt".parse::<Action>(), Ok(Action::InteractAlt));
        assert_eq!("FIRE".parse::<Action>(), Ok(Action::Fire));
        assert!("Shoot".parse::<Action>().is_err());
    }

    #[test]
    fn button_edges() {
        let s = ButtonState::default().advance(true);
        assert!(s.is_pressed && s.pressed_this_tick && !s.released_this_tick);
        let s = s.advance(true);
        assert!(s.is_pressed && !s.pressed_this_tick);
        let s = s.advance(false);
        assert!(!s.is_pressed && s.released_this_tick);
        let s = s.advance(false);
        assert_eq!(s, ButtonState::default());
    }
}
