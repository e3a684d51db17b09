//! The seam between the input core and whatever produces raw input.
//!
//! A platform source does two things: it hands out one [`DeviceSample`] per
//! tick, and it pushes [`PlatformSignal`]s (scheme changed, device lost,
//! device regained) to every subscriber through a channel. Subscribers drain
//! their channel at the start of a tick, so signals are always handled before
//! the tick's sample is read.

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::controls::{Control, Side, Vec2};

/// Raw state of every control for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSample {
    /// Digital controls currently held (keys, mouse buttons, pad buttons).
    buttons: HashSet<Control>,
    triggers: [f32; 2],
    sticks: [Vec2; 2],
    mouse_delta: Vec2,
}

impl DeviceSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fully actuate `control`: digital controls are held, triggers go to
    /// 1.0, sticks and mouse motion deflect along +x.
    pub fn actuate(&mut self, control: Control) -> &mut Self {
        match control {
            Control::Trigger(side) => self.triggers[side.index()] = 1.0,
            Control::Stick(side) => self.sticks[side.index()] = Vec2::new(1.0, 0.0),
            Control::MouseDelta => self.mouse_delta = Vec2::new(1.0, 0.0),
            digital => {
                self.buttons.insert(digital);
            }
        }
        self
    }

    pub fn release(&mut self, control: Control) -> &mut Self {
        match control {
            Control::Trigger(side) => self.triggers[side.index()] = 0.0,
            Control::Stick(side) => self.sticks[side.index()] = Vec2::ZERO,
            Control::MouseDelta => self.mouse_delta = Vec2::ZERO,
            digital => {
                self.buttons.remove(&digital);
            }
        }
        self
    }

    /// Set a 2D value. Non-vector controls are left untouched.
    pub fn set_vector(&mut self, control: Control, value: Vec2) -> &mut Self {
        match control {
            Control::Stick(side) => self.sticks[side.index()] = value,
            Control::MouseDelta => self.mouse_delta = value,
            _ => {}
        }
        self
    }

    pub fn set_trigger(&mut self, control: Control, value: f32) -> &mut Self {
        if let Control::Trigger(side) = control {
            self.triggers[side.index()] = value.clamp(0.0, 1.0);
        }
        self
    }

    /// Builder form of [`DeviceSample::actuate`].
    pub fn with(mut self, control: Control) -> Self {
        self.actuate(control);
        self
    }

    /// Builder form of [`DeviceSample::set_vector`].
    pub fn with_vector(mut self, control: Control, value: Vec2) -> Self {
        self.set_vector(control, value);
        self
    }

    /// Actuation of a single control: 0/1 for digital controls, the analog
    /// value for triggers, and the vector length for sticks and mouse motion.
    pub fn magnitude(&self, control: &Control) -> f32 {
        match control {
            Control::Trigger(side) => self.triggers[side.index()],
            Control::Stick(_) | Control::MouseDelta => self.vector(control).length(),
            digital => {
                if self.buttons.contains(digital) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// 2D value of a vector control; zero for everything else.
    pub fn vector(&self, control: &Control) -> Vec2 {
        match control {
            Control::Stick(side) => self.sticks[side.index()],
            Control::MouseDelta => self.mouse_delta,
            _ => Vec2::ZERO,
        }
    }

    /// Every control whose magnitude reaches `threshold`, sorted so callers
    /// see a stable order.
    pub fn active_controls(&self, threshold: f32) -> Vec<Control> {
        let mut out: Vec<Control> = self.buttons.iter().copied().collect();
        out.extend(
            [
                Control::Trigger(Side::Left),
                Control::Trigger(Side::Right),
                Control::Stick(Side::Left),
                Control::Stick(Side::Right),
                Control::MouseDelta,
            ]
            .into_iter()
            .filter(|c| self.magnitude(c) >= threshold),
        );
        out.sort_unstable();
        out
    }
}

/// Notifications from the platform layer about the active control scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformSignal {
    SchemeChanged(String),
    DeviceLost,
    DeviceRegained(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle returned by [`InputSource::subscribe`]. Signals queue on
/// `signals` until the owner drains them.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub signals: Receiver<PlatformSignal>,
}

impl Subscription {
    /// Everything queued so far, oldest first. Never blocks.
    pub fn drain(&self) -> Vec<PlatformSignal> {
        self.signals.try_iter().collect()
    }
}

/// A platform input backend.
pub trait InputSource {
    /// Raw state of every control for the current tick.
    fn sample(&mut self) -> DeviceSample;
    fn subscribe(&mut self) -> Subscription;
    /// Returns false when `id` was not subscribed.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

#[derive(Default)]
struct ManualInner {
    sample: DeviceSample,
    subscribers: Vec<(SubscriptionId, Sender<PlatformSignal>)>,
    next_id: u64,
}

/// Source driven by hand: tests, scripted replays, or a host that already
/// polls the OS itself and just forwards state. Clones share state, so the
/// driver keeps one clone and hands another to the facade.
#[derive(Clone, Default)]
pub struct ManualSource {
    inner: Arc<Mutex<ManualInner>>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_sample(&self, sample: DeviceSample) {
        self.inner.lock().sample = sample;
    }

    pub fn update(&self, f: impl FnOnce(&mut DeviceSample)) {
        f(&mut self.inner.lock().sample);
    }

    /// Push `signal` to every live subscriber. Returns how many got it.
    pub fn emit(&self, signal: PlatformSignal) -> usize {
        let inner = self.inner.lock();
        inner
            .subscribers
            .iter()
            .filter(|(_, tx)| tx.send(signal.clone()).is_ok())
            .count()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

impl InputSource for ManualSource {
    fn sample(&mut self) -> DeviceSample {
        self.inner.lock().sample.clone()
    }

    fn subscribe(&mut self) -> Subscription {
        let mut inner = self.inner.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        let (tx, rx) = unbounded();
        inner.subscribers.push((id, tx));
        Subscription { id, signals: rx }
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sid, _)| *sid != id);
        inner.subscribers.len() != before
    }
}
