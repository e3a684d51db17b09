//! Interactive rebinding, one session at a time.
//!
//! ```text
//! Idle -> AwaitingInput -> Completed | Cancelled -> (session dropped, Idle)
//! ```
//!
//! While a session waits, the target action is disabled so the old binding
//! cannot fire while the new one is being captured. Every way out of
//! `AwaitingInput` (captured input, caller cancel, cancel control, timeout,
//! facade teardown) re-enables the action.

use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::actions::Action;
use crate::actions::action_set::ActionSet;
use crate::bindings::binding::Binding;
use crate::bindings::overrides::default_binding;
use crate::config::RebindConfig;
use crate::controls::Control;
use crate::core_log::CoreLog;
use crate::events::{EventQueue, InputEvent};
use crate::platform::DeviceSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebindState {
    #[default]
    Idle,
    AwaitingInput,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RebindError {
    #[error("{action} has no binding slot {slot}")]
    InvalidSlot { action: Action, slot: usize },
    #[error("a rebind of {action} slot {slot} is already in progress")]
    AlreadyActive { action: Action, slot: usize },
    #[error("no rebind in progress")]
    NoSession,
    #[error("{action} slot {slot} only takes mouse motion, which capture ignores")]
    NotCapturable { action: Action, slot: usize },
    #[error("{control} cannot be bound to {action} slot {slot}")]
    IncompatibleControl {
        action: Action,
        slot: usize,
        control: Control,
    },
}

/// Why a session was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Caller,
    CancelControl,
    Timeout,
    Teardown,
}

#[derive(Debug, Clone)]
pub struct RebindSession {
    pub id: Uuid,
    pub action: Action,
    pub slot: usize,
    pub state: RebindState,
    pub started_tick: u64,
    target: Binding,
    /// Controls held when the session started (or since), not capturable
    /// until released.
    ignored: HashSet<Control>,
}

pub struct RebindCoordinator {
    session: Option<RebindSession>,
    last_outcome: Option<(Action, RebindState)>,
    config: RebindConfig,
    press_point: f32,
    logger: Arc<dyn CoreLog>,
}

impl RebindCoordinator {
    pub fn new(config: RebindConfig, press_point: f32, logger: Arc<dyn CoreLog>) -> Self {
        Self {
            session: None,
            last_outcome: None,
            config,
            press_point,
            logger,
        }
    }

    /// `AwaitingInput` while a session is open, `Idle` otherwise.
    pub fn state(&self) -> RebindState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(RebindState::Idle)
    }

    pub fn session(&self) -> Option<&RebindSession> {
        self.session.as_ref()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// How the most recent session ended, if any has.
    pub fn last_outcome(&self) -> Option<(Action, RebindState)> {
        self.last_outcome
    }

    /// Open a session for `(action, slot)`. Rejected without side effects
    /// when the slot does not exist, another session is open, or nothing
    /// capture can see would fit the slot (the mouse-motion slot while
    /// `exclude_mouse_motion` is set).
    pub fn start(
        &mut self,
        action: Action,
        slot: usize,
        now: &DeviceSample,
        tick: u64,
        set: &mut ActionSet,
        out: &mut EventQueue,
    ) -> Result<Uuid, RebindError> {
        if let Some(s) = &self.session {
            return Err(RebindError::AlreadyActive {
                action: s.action,
                slot: s.slot,
            });
        }
        let target =
            default_binding(action, slot).ok_or(RebindError::InvalidSlot { action, slot })?;
        if self.config.exclude_mouse_motion && !target.accepts_anything_but_mouse_motion() {
            return Err(RebindError::NotCapturable { action, slot });
        }

        set.disable_action(action);
        let id = Uuid::new_v4();
        self.session = Some(RebindSession {
            id,
            action,
            slot,
            state: RebindState::AwaitingInput,
            started_tick: tick,
            target,
            ignored: now.active_controls(self.press_point).into_iter().collect(),
        });
        self.logger.info(&format!("[rebind] {id} started for {action} slot {slot}"));
        out.push(InputEvent::RebindStarted(action));
        Ok(id)
    }

    /// Look at this tick's sample: cancel control, timeout, then the first
    /// newly actuated control the slot accepts.
    pub fn poll(
        &mut self,
        sample: &DeviceSample,
        tick: u64,
        set: &mut ActionSet,
        out: &mut EventQueue,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let mut active = sample.active_controls(self.press_point);
        if self.config.exclude_mouse_motion {
            active.retain(|c| *c != Control::MouseDelta);
        }
        session.ignored.retain(|c| active.contains(c));
        let fresh: Vec<Control> = active
            .into_iter()
            .filter(|c| !session.ignored.contains(c))
            .collect();

        if fresh.contains(&self.config.cancel_control) {
            self.finish_cancel(CancelReason::CancelControl, set, out);
            return;
        }
        if let Some(limit) = self.config.timeout_ticks {
            if tick.saturating_sub(session.started_tick) >= limit {
                self.finish_cancel(CancelReason::Timeout, set, out);
                return;
            }
        }

        let target = session.target;
        let captured = fresh.iter().copied().find(|c| target.accepts(c));
        match captured {
            Some(control) => self.finish_complete(control, set, out),
            None => {
                // Anything else pressed now is not a candidate until released.
                session.ignored.extend(fresh);
            }
        }
    }

    /// Caller-initiated cancel.
    pub fn cancel(&mut self, set: &mut ActionSet, out: &mut EventQueue) -> Result<(), RebindError> {
        if self.session.is_none() {
            return Err(RebindError::NoSession);
        }
        self.finish_cancel(CancelReason::Caller, set, out);
        Ok(())
    }

    /// Cancel whatever is open; no-op when idle. Used on teardown.
    pub fn abort(&mut self, reason: CancelReason, set: &mut ActionSet, out: &mut EventQueue) {
        if self.session.is_some() {
            self.finish_cancel(reason, set, out);
        }
    }

    /// Complete with a control captured outside the coordinator. The
    /// session stays open if the control does not fit the slot.
    pub fn complete_with(
        &mut self,
        control: Control,
        set: &mut ActionSet,
        out: &mut EventQueue,
    ) -> Result<(), RebindError> {
        let session = self.session.as_ref().ok_or(RebindError::NoSession)?;
        if !session.target.accepts(&control) {
            return Err(RebindError::IncompatibleControl {
                action: session.action,
                slot: session.slot,
                control,
            });
        }
        self.finish_complete(control, set, out);
        Ok(())
    }

    fn finish_complete(&mut self, control: Control, set: &mut ActionSet, out: &mut EventQueue) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if let Err(e) = set.set_override(session.action, session.slot, control) {
            // Unreachable for accepted controls; never leave the action disabled.
            self.logger.error(&format!("[rebind] {} write failed: {e}", session.id));
            set.enable_action(session.action);
            session.state = RebindState::Cancelled;
            self.last_outcome = Some((session.action, session.state));
            out.push(InputEvent::RebindCancelled(session.action));
            return;
        }
        set.enable_action(session.action);
        session.state = RebindState::Completed;
        self.logger.info(&format!(
            "[rebind] {} {} slot {} -> {control}",
            session.id, session.action, session.slot
        ));
        self.last_outcome = Some((session.action, session.state));
        out.push(InputEvent::RebindCompleted(session.action));
    }

    fn finish_cancel(&mut self, reason: CancelReason, set: &mut ActionSet, out: &mut EventQueue) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        set.enable_action(session.action);
        session.state = RebindState::Cancelled;
        self.logger.info(&format!(
            "[rebind] {} cancelled ({reason:?}) for {} slot {}",
            session.id, session.action, session.slot
        ));
        self.last_outcome = Some((session.action, session.state));
        out.push(InputEvent::RebindCancelled(session.action));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputConfig;
    use crate::controls::{Key, MouseButton, PadButton, Side, Vec2};
    use crate::core_log::NoopLog;

    struct Rig {
        coord: RebindCoordinator,
        set: ActionSet,
        queue: EventQueue,
    }

    fn rig(timeout: Option<u64>) -> Rig {
        let mut cfg = InputConfig::default();
        cfg.rebind.timeout_ticks = timeout;
        Rig {
            coord: RebindCoordinator::new(cfg.rebind.clone(), cfg.press_point, Arc::new(NoopLog)),
            set: ActionSet::new(&cfg),
            queue: EventQueue::default(),
        }
    }

    impl Rig {
        fn start(&mut self, action: Action, slot: usize) -> Result<Uuid, RebindError> {
            self.coord.start(
                action,
                slot,
                &DeviceSample::new(),
                0,
                &mut self.set,
                &mut self.queue,
            )
        }

        fn poll(&mut self, sample: DeviceSample, tick: u64) {
            self.coord.poll(&sample, tick, &mut self.set, &mut self.queue);
        }
    }

    #[test]
    fn captures_first_compatible_press() {
        let mut r = rig(None);
        r.start(Action::Fire, 0).unwrap();
        assert_eq!(r.coord.state(), RebindState::AwaitingInput);
        assert!(!r.set.is_action_enabled(Action::Fire));

        // gamepad button and mouse motion do not fit a keyboard+mouse button slot
        r.poll(
            DeviceSample::new()
                .with(Control::Pad(PadButton::South))
                .with_vector(Control::MouseDelta, Vec2::new(5.0, 0.0)),
            1,
        );
        assert!(r.coord.is_active());

        r.poll(DeviceSample::new().with(Control::Key(Key::Letter('g'))), 2);
        assert_eq!(r.coord.state(), RebindState::Idle);
        assert_eq!(
            r.coord.last_outcome(),
            Some((Action::Fire, RebindState::Completed))
        );
        assert!(r.set.is_action_enabled(Action::Fire));
        assert_eq!(
            r.set.overrides().get(Action::Fire, 0),
            Some(Control::Key(Key::Letter('g')))
        );
        assert_eq!(
            r.queue.drain(),
            vec![
                InputEvent::RebindStarted(Action::Fire),
                InputEvent::RebindCompleted(Action::Fire)
            ]
        );
    }

    #[test]
    fn caller_cancel_writes_nothing_and_reenables() {
        let mut r = rig(None);
        r.start(Action::Fire, 0).unwrap();
        r.coord.cancel(&mut r.set, &mut r.queue).unwrap();

        assert!(r.set.overrides().is_empty());
        assert!(r.set.is_action_enabled(Action::Fire));
        assert_eq!(
            r.queue.drain(),
            vec![
                InputEvent::RebindStarted(Action::Fire),
                InputEvent::RebindCancelled(Action::Fire)
            ]
        );
        assert_eq!(r.coord.cancel(&mut r.set, &mut r.queue), Err(RebindError::NoSession));
        assert!(r.queue.is_empty());
    }

    #[test]
    fn cancel_control_and_timeout() {
        let mut r = rig(Some(3));
        r.start(Action::Jump, 0).unwrap();
        r.poll(DeviceSample::new().with(Control::Key(Key::Escape)), 1);
        assert_eq!(
            r.coord.last_outcome(),
            Some((Action::Jump, RebindState::Cancelled))
        );

        r.start(Action::Jump, 1).unwrap();
        r.poll(DeviceSample::new(), 2);
        assert!(r.coord.is_active());
        r.poll(DeviceSample::new(), 3);
        assert!(!r.coord.is_active());
        assert!(r.set.is_action_enabled(Action::Jump));
        assert!(r.set.overrides().is_empty());
    }

    #[test]
    fn invalid_slot_and_second_session_are_rejected() {
        let mut r = rig(None);
        assert_eq!(
            r.start(Action::Jump, 2),
            Err(RebindError::InvalidSlot {
                action: Action::Jump,
                slot: 2
            })
        );
        assert!(r.queue.is_empty());
        assert!(r.set.is_action_enabled(Action::Jump));

        r.start(Action::Look, 1).unwrap();
        r.queue.drain();
        assert_eq!(
            r.start(Action::Aim, 0),
            Err(RebindError::AlreadyActive {
                action: Action::Look,
                slot: 1
            })
        );
        assert!(r.queue.is_empty());
        assert!(r.set.is_action_enabled(Action::Aim));
        assert_eq!(r.coord.session().map(|s| s.action), Some(Action::Look));
    }

    #[test]
    fn held_controls_at_start_are_not_captured() {
        let mut r = rig(None);
        let click = Control::Mouse(MouseButton::Left);
        r.coord
            .start(
                Action::Aim,
                0,
                &DeviceSample::new().with(click),
                0,
                &mut r.set,
                &mut r.queue,
            )
            .unwrap();

        r.poll(DeviceSample::new().with(click), 1);
        assert!(r.coord.is_active());
        r.poll(DeviceSample::new(), 2);
        r.poll(DeviceSample::new().with(click), 3);
        assert!(!r.coord.is_active());
        assert_eq!(r.set.overrides().get(Action::Aim, 0), Some(click));
    }

    #[test]
    fn vector_slot_takes_a_stick() {
        let mut r = rig(None);
        r.start(Action::Move, 0).unwrap();
        r.poll(DeviceSample::new().with(Control::Trigger(Side::Left)), 1);
        assert!(r.coord.is_active());
        r.poll(
            DeviceSample::new().with_vector(Control::Stick(Side::Right), Vec2::new(0.0, 0.9)),
            2,
        );
        assert_eq!(
            r.set.overrides().get(Action::Move, 0),
            Some(Control::Stick(Side::Right))
        );
    }

    #[test]
    fn complete_with_validates_the_control() {
        let mut r = rig(None);
        r.start(Action::Interact, 1).unwrap();
        assert!(matches!(
            r.coord.complete_with(Control::Key(Key::Letter('r')), &mut r.set, &mut r.queue),
            Err(RebindError::IncompatibleControl { .. })
        ));
        assert!(r.coord.is_active());
        r.coord
            .complete_with(Control::Pad(PadButton::RightShoulder), &mut r.set, &mut r.queue)
            .unwrap();
        assert_eq!(
            r.set.overrides().get(Action::Interact, 1),
            Some(Control::Pad(PadButton::RightShoulder))
        );
    }

    #[test]
    fn mouse_motion_is_not_captured_unless_allowed() {
        let motion = DeviceSample::new().with_vector(Control::MouseDelta, Vec2::new(3.0, 1.0));

        let mut r = rig(None);
        assert_eq!(
            r.start(Action::Look, 0),
            Err(RebindError::NotCapturable {
                action: Action::Look,
                slot: 0
            })
        );
        assert!(!r.coord.is_active());
        assert!(r.queue.is_empty());
        assert!(r.set.is_action_enabled(Action::Look));

        // the pad stick slot is still capturable; mouse motion is skipped
        r.start(Action::Look, 1).unwrap();
        r.poll(motion.clone(), 1);
        assert!(r.coord.is_active());

        let mut cfg = InputConfig::default();
        cfg.rebind.exclude_mouse_motion = false;
        let mut r = Rig {
            coord: RebindCoordinator::new(cfg.rebind.clone(), cfg.press_point, Arc::new(NoopLog)),
            set: ActionSet::new(&cfg),
            queue: EventQueue::default(),
        };
        r.start(Action::Look, 0).unwrap();
        r.poll(motion, 1);
        assert!(!r.coord.is_active());
        assert_eq!(r.set.overrides().get(Action::Look, 0), Some(Control::MouseDelta));
    }
}
