//! The entry point consumers hold.
//!
//! [`InputFacade`] owns the action set, the device tracker, the rebind
//! coordinator and the binding store, and drives them once per [`tick`].
//! Applications own it explicitly; [`InputHost`] is the slot for hosts that
//! want a single well-known instance with first-writer-wins semantics.
//!
//! [`tick`]: InputFacade::tick

use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::actions::action_set::ActionSet;
use crate::actions::{Action, ButtonState};
use crate::bindings::binding::Binding;
use crate::bindings::overrides::BindingOverrides;
use crate::config::{ConfigError, InputConfig};
use crate::controls::{Control, Vec2};
use crate::core_log::{CoreLog, NoopLog};
use crate::device::{self, DeviceTracker, DeviceType};
use crate::events::{EventQueue, InputEvents, ListenerId};
use crate::platform::{InputSource, Subscription};
use crate::rebind::{CancelReason, RebindCoordinator, RebindError, RebindState};
use crate::store::{BindingStore, KeyValueStore, MemoryStore, StoreError};

#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("no input source configured")]
    MissingSource,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub struct FacadeBuilder {
    source: Option<Box<dyn InputSource>>,
    store: Option<Arc<dyn KeyValueStore>>,
    config: InputConfig,
    logger: Arc<dyn CoreLog>,
}

impl Default for FacadeBuilder {
    fn default() -> Self {
        Self {
            source: None,
            store: None,
            config: InputConfig::default(),
            logger: Arc::new(NoopLog),
        }
    }
}

impl FacadeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: impl InputSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Defaults to an in-memory store.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(mut self, config: InputConfig) -> Self {
        self.config = config;
        self
    }

    pub fn logger(mut self, logger: Arc<dyn CoreLog>) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> Result<InputFacade, FacadeError> {
        let mut source = self.source.ok_or(FacadeError::MissingSource)?;
        self.config.validate()?;
        let logger = self.logger;
        let backend = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>);

        let mut actions = ActionSet::new(&self.config);
        let store = BindingStore::new(backend, logger.clone());
        if self.config.auto_load {
            if let Some(table) = store.load(&self.config.storage_key) {
                actions.apply_overrides(table);
            }
        }

        let subscription = source.subscribe();
        logger.debug(&format!(
            "[facade] subscribed to platform signals ({:?})",
            subscription.id
        ));

        Ok(InputFacade {
            tracker: DeviceTracker::new(logger.clone()),
            rebind: RebindCoordinator::new(
                self.config.rebind.clone(),
                self.config.press_point,
                logger.clone(),
            ),
            store,
            events: InputEvents::default(),
            queue: EventQueue::default(),
            actions,
            source,
            subscription: Some(subscription),
            config: self.config,
            logger,
            tick: 0,
        })
    }
}

pub struct InputFacade {
    tracker: DeviceTracker,
    rebind: RebindCoordinator,
    store: BindingStore,
    events: InputEvents,
    queue: EventQueue,
    actions: ActionSet,
    source: Box<dyn InputSource>,
    subscription: Option<Subscription>,
    config: InputConfig,
    logger: Arc<dyn CoreLog>,
    tick: u64,
}

impl InputFacade {
    pub fn new(
        source: impl InputSource + 'static,
        store: Arc<dyn KeyValueStore>,
        config: InputConfig,
        logger: Arc<dyn CoreLog>,
    ) -> Result<Self, FacadeError> {
        Self::builder()
            .source(source)
            .store(store)
            .config(config)
            .logger(logger)
            .build()
    }

    pub fn builder() -> FacadeBuilder {
        FacadeBuilder::new()
    }

    /// One frame: platform signals, then the raw sample, then rebind
    /// capture, then listeners.
    pub fn tick(&mut self) {
        self.tick += 1;
        if let Some(sub) = &self.subscription {
            for signal in sub.drain() {
                self.tracker.handle(signal, &mut self.queue);
            }
        }
        let sample = self.source.sample();
        self.actions.update(&sample);
        self.rebind
            .poll(&sample, self.tick, &mut self.actions, &mut self.queue);
        self.events.flush(&mut self.queue);
    }

    /// Ticks run so far.
    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    // ───────────────────────────── polling ─────────────────────────────

    pub fn value_of(&self, action: Action) -> Vec2 {
        self.actions.value_of(action)
    }

    pub fn state_of(&self, action: Action) -> ButtonState {
        self.actions.state_of(action)
    }

    pub fn move_input(&self) -> Vec2 {
        self.value_of(Action::Move)
    }
    pub fn look_input(&self) -> Vec2 {
        self.value_of(Action::Look)
    }
    pub fn jump(&self) -> ButtonState {
        self.state_of(Action::Jump)
    }
    pub fn crouch(&self) -> ButtonState {
        self.state_of(Action::Crouch)
    }
    pub fn sprint(&self) -> ButtonState {
        self.state_of(Action::Sprint)
    }
    pub fn fire(&self) -> ButtonState {
        self.state_of(Action::Fire)
    }
    pub fn aim(&self) -> ButtonState {
        self.state_of(Action::Aim)
    }
    pub fn interact(&self) -> ButtonState {
        self.state_of(Action::Interact)
    }
    pub fn interact_alt(&self) -> ButtonState {
        self.state_of(Action::InteractAlt)
    }

    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    /// Gate the whole action set, e.g. while a menu is open.
    pub fn set_actions_enabled(&mut self, enabled: bool) {
        if enabled {
            self.actions.enable();
        } else {
            self.actions.disable();
        }
    }

    pub fn bindings_of(&self, action: Action) -> Vec<Binding> {
        self.actions.bindings_of(action)
    }

    // ───────────────────────────── devices ─────────────────────────────

    pub fn current_device_type(&self) -> DeviceType {
        self.tracker.current_device_type()
    }

    pub fn is_using_gamepad(&self) -> bool {
        self.tracker.is_using_gamepad()
    }

    pub fn current_scheme(&self) -> Option<&str> {
        self.tracker.current_scheme()
    }

    pub fn device_type_of(&self, scheme: &str) -> DeviceType {
        device::device_type_of(scheme)
    }

    // ───────────────────────────── rebinding ─────────────────────────────

    /// Starts capturing a new control for `(action, slot)`. `RebindStarted`
    /// reaches listeners before this returns. The mouse-motion slot is
    /// refused with `NotCapturable` while capture ignores mouse motion.
    pub fn start_rebind(&mut self, action: Action, slot: usize) -> Result<Uuid, RebindError> {
        let now = self.source.sample();
        let id = self.rebind.start(
            action,
            slot,
            &now,
            self.tick,
            &mut self.actions,
            &mut self.queue,
        )?;
        self.events.flush(&mut self.queue);
        Ok(id)
    }

    pub fn cancel_rebind(&mut self) -> Result<(), RebindError> {
        self.rebind.cancel(&mut self.actions, &mut self.queue)?;
        self.events.flush(&mut self.queue);
        Ok(())
    }

    /// Finish the open session with a control picked by the caller.
    pub fn complete_rebind_with(&mut self, control: Control) -> Result<(), RebindError> {
        self.rebind
            .complete_with(control, &mut self.actions, &mut self.queue)?;
        self.events.flush(&mut self.queue);
        Ok(())
    }

    pub fn rebind_state(&self) -> RebindState {
        self.rebind.state()
    }

    pub fn last_rebind_outcome(&self) -> Option<(Action, RebindState)> {
        self.rebind.last_outcome()
    }

    // ───────────────────────────── persistence ─────────────────────────────

    pub fn overrides(&self) -> Arc<BindingOverrides> {
        self.actions.overrides()
    }

    /// Save under the configured storage key.
    pub fn save_bindings(&self) -> Result<(), StoreError> {
        self.save_bindings_as(&self.config.storage_key)
    }

    pub fn save_bindings_as(&self, key: &str) -> Result<(), StoreError> {
        self.store.save(key, &self.actions.overrides())
    }

    /// Replace the override table with the one saved under `key`. Returns
    /// false (and keeps the current table) when nothing usable is saved.
    pub fn load_bindings(&mut self, key: &str) -> bool {
        match self.store.load(key) {
            Some(table) => {
                self.actions.apply_overrides(table);
                true
            }
            None => false,
        }
    }

    /// Back to default bindings (in memory only).
    pub fn reset_bindings(&mut self) {
        self.logger.info("[facade] bindings reset to defaults");
        self.actions.reset_overrides();
    }

    pub fn apply_overrides(&mut self, table: BindingOverrides) {
        self.actions.apply_overrides(table);
    }

    // ───────────────────────────── events ─────────────────────────────

    pub fn on_device_changed(&mut self, f: impl FnMut(&DeviceType) + 'static) -> ListenerId {
        self.events.device_changed.subscribe(f)
    }
    pub fn remove_device_changed(&mut self, id: ListenerId) -> bool {
        self.events.device_changed.unsubscribe(id)
    }

    pub fn on_device_lost(&mut self, f: impl FnMut(&Option<DeviceType>) + 'static) -> ListenerId {
        self.events.device_lost.subscribe(f)
    }
    pub fn remove_device_lost(&mut self, id: ListenerId) -> bool {
        self.events.device_lost.unsubscribe(id)
    }

    pub fn on_device_regained(&mut self, f: impl FnMut(&DeviceType) + 'static) -> ListenerId {
        self.events.device_regained.subscribe(f)
    }
    pub fn remove_device_regained(&mut self, id: ListenerId) -> bool {
        self.events.device_regained.unsubscribe(id)
    }

    pub fn on_rebind_started(&mut self, f: impl FnMut(&Action) + 'static) -> ListenerId {
        self.events.rebind_started.subscribe(f)
    }
    pub fn remove_rebind_started(&mut self, id: ListenerId) -> bool {
        self.events.rebind_started.unsubscribe(id)
    }

    pub fn on_rebind_completed(&mut self, f: impl FnMut(&Action) + 'static) -> ListenerId {
        self.events.rebind_completed.subscribe(f)
    }
    pub fn remove_rebind_completed(&mut self, id: ListenerId) -> bool {
        self.events.rebind_completed.unsubscribe(id)
    }

    pub fn on_rebind_cancelled(&mut self, f: impl FnMut(&Action) + 'static) -> ListenerId {
        self.events.rebind_cancelled.subscribe(f)
    }
    pub fn remove_rebind_cancelled(&mut self, id: ListenerId) -> bool {
        self.events.rebind_cancelled.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }
}

impl Drop for InputFacade {
    // Order matters: close any rebind (re-enabling its action), detach from
    // the platform, and only then let the action set go.
    fn drop(&mut self) {
        self.rebind
            .abort(CancelReason::Teardown, &mut self.actions, &mut self.queue);
        self.events.flush(&mut self.queue);
        if let Some(sub) = self.subscription.take() {
            self.source.unsubscribe(sub.id);
        }
        self.logger.debug("[facade] torn down");
    }
}

/// Owner slot for a single live facade.
#[derive(Default)]
pub struct InputHost {
    current: Option<InputFacade>,
}

impl InputHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `facade` unless one is already live. The first one wins: a
    /// second facade is dropped (detaching it from its source) and the live
    /// one is left exactly as it was.
    pub fn install(&mut self, facade: InputFacade) -> bool {
        if self.current.is_some() {
            facade.logger.warn("[facade] an instance is already live; discarding the new one");
            return false;
        }
        self.current = Some(facade);
        true
    }

    /// Like [`InputHost::install`], but only builds when the slot is empty.
    pub fn install_with(
        &mut self,
        build: impl FnOnce() -> Result<InputFacade, FacadeError>,
    ) -> Result<bool, FacadeError> {
        if self.current.is_some() {
            return Ok(false);
        }
        self.current = Some(build()?);
        Ok(true)
    }

    pub fn current(&self) -> Option<&InputFacade> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut InputFacade> {
        self.current.as_mut()
    }

    #[inline]
    pub fn is_installed(&self) -> bool {
        self.current.is_some()
    }

    /// Tear the live facade down. Returns false when the slot was empty.
    pub fn shutdown(&mut self) -> bool {
        self.current.take().is_some()
    }
}
