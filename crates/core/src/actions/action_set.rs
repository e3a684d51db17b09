use arc_swap::ArcSwap;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;

use crate::actions::{Action, ActionKind, ButtonState};
use crate::bindings::binding::{Binding, CompositePart};
use crate::bindings::overrides::{BindingOverrides, OverridesError};
use crate::config::InputConfig;
use crate::controls::{Control, Vec2};
use crate::platform::DeviceSample;

#[derive(Debug, Clone, Copy, Default)]
struct ActionState {
    value: Vec2,
    button: ButtonState,
    /// Set after enable/override swaps: the action stays released until
    /// every control driving it has been let go once.
    latched: bool,
    /// The button was down when it got parked; report the release next tick.
    release_pending: bool,
}

impl ActionState {
    /// Back to idle, remembering whether a release edge is owed.
    fn park(&mut self) {
        let owed = self.button.is_pressed || self.release_pending;
        *self = ActionState {
            release_pending: owed,
            ..ActionState::default()
        };
    }
}

/// The nine actions, their effective bindings and this tick's values.
///
/// The override table sits behind an `ArcSwap`: writers build a complete
/// table and swap it in, and `update` reads one snapshot per tick, so a
/// tick never sees half of an applied table.
pub struct ActionSet {
    overrides: ArcSwap<BindingOverrides>,
    enabled: bool,
    disabled: HashSet<Action>,
    states: IndexMap<Action, ActionState>,
    press_point: f32,
    stick_deadzone: f32,
}

impl ActionSet {
    /// Enabled, with default bindings.
    pub fn new(config: &InputConfig) -> Self {
        Self {
            overrides: ArcSwap::from_pointee(BindingOverrides::default()),
            enabled: true,
            disabled: HashSet::new(),
            states: Action::iter().map(|a| (a, ActionState::default())).collect(),
            press_point: config.press_point,
            stick_deadzone: config.stick_deadzone,
        }
    }

    /// Recompute every action from this tick's raw sample.
    pub fn update(&mut self, sample: &DeviceSample) {
        let table = self.overrides.load_full();
        for action in Action::iter() {
            let gated = !self.is_action_enabled(action);
            let bindings = table.resolve(action);
            let press_point = self.press_point;
            let deadzone = self.stick_deadzone;

            let state = self.states.entry(action).or_default();
            let owed_release = std::mem::take(&mut state.release_pending);
            if gated {
                state.value = Vec2::ZERO;
                state.button = ButtonState {
                    released_this_tick: owed_release,
                    ..ButtonState::default()
                };
                continue;
            }

            match action.kind() {
                ActionKind::Vector => state.value = vector_value(&bindings, sample, deadzone),
                ActionKind::Button => {
                    let down = button_actuation(&bindings, sample) >= press_point;
                    if state.latched && down {
                        state.button = ButtonState::default();
                    } else {
                        state.latched = false;
                        state.button = state.button.advance(down);
                    }
                    state.button.released_this_tick |= owed_release;
                }
            }
        }
    }

    /// 2D value of Move/Look. Button actions read zero.
    pub fn value_of(&self, action: Action) -> Vec2 {
        self.states.get(&action).map(|s| s.value).unwrap_or_default()
    }

    /// Press state of a button action. Vector actions read released.
    pub fn state_of(&self, action: Action) -> ButtonState {
        self.states.get(&action).map(|s| s.button).unwrap_or_default()
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn is_action_enabled(&self, action: Action) -> bool {
        self.enabled && !self.disabled.contains(&action)
    }

    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        for state in self.states.values_mut() {
            state.latched = true;
        }
    }

    /// Stop every action from responding to input. State resets to idle;
    /// a button that was down reports one release on the next tick.
    pub fn disable(&mut self) {
        self.enabled = false;
        for state in self.states.values_mut() {
            state.park();
        }
    }

    pub fn enable_action(&mut self, action: Action) {
        if self.disabled.remove(&action) {
            if let Some(state) = self.states.get_mut(&action) {
                state.latched = true;
            }
        }
    }

    pub fn disable_action(&mut self, action: Action) {
        self.disabled.insert(action);
        if let Some(state) = self.states.get_mut(&action) {
            state.park();
        }
    }

    /// Current override table snapshot.
    pub fn overrides(&self) -> Arc<BindingOverrides> {
        self.overrides.load_full()
    }

    /// Swap in a whole table. Held controls do not replay as presses.
    pub fn apply_overrides(&mut self, table: BindingOverrides) {
        self.overrides.store(Arc::new(table));
        self.relatch();
    }

    /// Copy the current table, change one slot, swap the copy in.
    pub fn set_override(
        &mut self,
        action: Action,
        slot: usize,
        control: Control,
    ) -> Result<(), OverridesError> {
        let mut next = BindingOverrides::clone(&self.overrides.load());
        next.set(action, slot, control)?;
        self.overrides.store(Arc::new(next));
        Ok(())
    }

    pub fn reset_overrides(&mut self) {
        self.apply_overrides(BindingOverrides::default());
    }

    /// Effective slots for `action`, overrides applied.
    pub fn bindings_of(&self, action: Action) -> Vec<Binding> {
        self.overrides.load().resolve(action)
    }

    fn relatch(&mut self) {
        for (action, state) in self.states.iter_mut() {
            if action.kind() == ActionKind::Button {
                state.park();
                state.latched = true;
            }
        }
    }
}

fn button_actuation(bindings: &[Binding], sample: &DeviceSample) -> f32 {
    bindings
        .iter()
        .filter(|b| b.control.is_button_like())
        .map(|b| sample.magnitude(&b.control))
        .fold(0.0, f32::max)
}

/// Largest-magnitude source wins: each direct vector slot on its own, and
/// all composite parts together as one `(right - left, up - down)` vector.
fn vector_value(bindings: &[Binding], sample: &DeviceSample, deadzone: f32) -> Vec2 {
    let mut best = Vec2::ZERO;
    let mut parts = [0.0f32; 4];
    let mut has_composite = false;

    for b in bindings {
        match b.part {
            Some(part) => {
                has_composite = true;
                let ix = match part {
                    CompositePart::Up => 0,
                    CompositePart::Down => 1,
                    CompositePart::Left => 2,
                    CompositePart::Right => 3,
                };
                parts[ix] = parts[ix].max(sample.magnitude(&b.control));
            }
            None => {
                let v = match b.control {
                    Control::Stick(_) => sample.vector(&b.control).with_deadzone(deadzone),
                    Control::MouseDelta => sample.vector(&b.control),
                    _ => Vec2::ZERO,
                };
                if v.length() > best.length() {
                    best = v;
                }
            }
        }
    }

    if has_composite {
        let [up, down, left, right] = parts;
        let v = Vec2::new(right - left, up - down).clamp_length();
        if v.length() > best.length() {
            best = v;
        }
    }
    best
}
