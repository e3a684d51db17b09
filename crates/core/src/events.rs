//! Consumer-facing notifications.
//!
//! Components push [`InputEvent`]s into an [`EventQueue`]; the facade flushes
//! the queue into [`InputEvents`] at fixed points (end of tick, right after a
//! rebind starts or is cancelled). Listeners get the payload by reference
//! and no handle back to the facade, so a listener can never trigger a
//! nested dispatch.

use std::collections::VecDeque;

use crate::actions::Action;
use crate::device::DeviceType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    DeviceChanged(DeviceType),
    /// Carries the family that was active when the device went away.
    DeviceLost(Option<DeviceType>),
    DeviceRegained(DeviceType),
    RebindStarted(Action),
    RebindCompleted(Action),
    RebindCancelled(Action),
}

#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<InputEvent>,
}

impl EventQueue {
    #[inline]
    pub fn push(&mut self, ev: InputEvent) {
        self.pending.push_back(ev);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<InputEvent> {
        self.pending.pop_front()
    }

    pub fn drain(&mut self) -> Vec<InputEvent> {
        self.pending.drain(..).collect()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback<T> = Box<dyn FnMut(&T)>;

/// Ordered listener registry for one event payload type.
pub struct Listeners<T> {
    next_id: u64,
    entries: Vec<(ListenerId, Callback<T>)>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T> Listeners<T> {
    pub fn subscribe(&mut self, f: impl FnMut(&T) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(f)));
        id
    }

    /// Returns false when `id` was not registered here.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(lid, _)| *lid != id);
        self.entries.len() != before
    }

    /// Call every listener in registration order.
    pub fn emit(&mut self, payload: &T) {
        for (_, f) in self.entries.iter_mut() {
            f(payload);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One registry per event kind.
#[derive(Default)]
pub struct InputEvents {
    pub device_changed: Listeners<DeviceType>,
    pub device_lost: Listeners<Option<DeviceType>>,
    pub device_regained: Listeners<DeviceType>,
    pub rebind_started: Listeners<Action>,
    pub rebind_completed: Listeners<Action>,
    pub rebind_cancelled: Listeners<Action>,
}

impl InputEvents {
    pub fn dispatch(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::DeviceChanged(ty) => self.device_changed.emit(ty),
            InputEvent::DeviceLost(ty) => self.device_lost.emit(ty),
            InputEvent::DeviceRegained(ty) => self.device_regained.emit(ty),
            InputEvent::RebindStarted(a) => self.rebind_started.emit(a),
            InputEvent::RebindCompleted(a) => self.rebind_completed.emit(a),
            InputEvent::RebindCancelled(a) => self.rebind_cancelled.emit(a),
        }
    }

    /// Dispatch everything queued, oldest first.
    pub fn flush(&mut self, queue: &mut EventQueue) {
        while let Some(ev) = queue.pop() {
            self.dispatch(&ev);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.device_changed.len()
            + self.device_lost.len()
            + self.device_regained.len()
            + self.rebind_started.len()
            + self.rebind_completed.len()
            + self.rebind_cancelled.len()
    }
}
