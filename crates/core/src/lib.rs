//! Input core for a first-person game: named actions, device tracking,
//! runtime rebinding and persisted binding overrides.
//!
//! This crate is engine-agnostic. It exposes:
//! - `facade`: [`InputFacade`](facade::InputFacade), the one object a game holds and ticks.
//! - `actions`: the nine actions and the per-tick action set.
//! - `bindings`: default bindings, the override table and its JSON blob.
//! - `device`, `rebind`, `store`: the facade's collaborators.
//! - `platform`: the [`InputSource`](platform::InputSource) seam plus a hand-driven source.
//! - `core_log::CoreLog`: thin logging trait the host (game/CLI) can implement.
//!
//! Import the `prelude` if you want the most common types in scope.

pub mod core_log;

pub mod actions;
pub mod bindings;
pub mod config;
pub mod controls;
pub mod device;
pub mod events;
pub mod facade;
pub mod platform;
pub mod rebind;
pub mod store;

/// Convenient re-exports for downstream users (game/CLI/tests).
pub use core_log::CoreLog;

pub mod prelude {
    pub use crate::core_log::{CoreLog, MemoryLog, NoopLog};

    // Actions and controls
    pub use crate::actions::action_set::ActionSet;
    pub use crate::actions::{Action, ActionKind, ButtonState};
    pub use crate::controls::{
        Control, ControlParseError, Key, MouseButton, PadButton, SchemeGroup, Side, Vec2,
    };

    // Bindings
    pub use crate::bindings::binding::{Binding, CompositePart};
    pub use crate::bindings::constants::{APP_ID, DEFAULT_BINDINGS, DEFAULT_STORAGE_KEY};
    pub use crate::bindings::overrides::{BindingOverrides, OverrideEntry, OverridesError};

    // Facade and collaborators
    pub use crate::config::{ConfigError, InputConfig, RebindConfig};
    pub use crate::device::{DeviceType, device_type_of};
    pub use crate::events::ListenerId;
    pub use crate::facade::{FacadeBuilder, FacadeError, InputFacade, InputHost};
    pub use crate::platform::{DeviceSample, InputSource, ManualSource, PlatformSignal};
    pub use crate::rebind::{RebindError, RebindState};
    pub use crate::store::{BindingStore, FileStore, KeyValueStore, MemoryStore, StoreError};
}
