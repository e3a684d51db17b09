//! Active device family tracking.
//!
//! The platform reports control schemes by display name. The tracker maps
//! each name to a [`DeviceType`] and turns scheme changes, device loss and
//! device regain into queued [`InputEvent`]s.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::bindings::constants::SCHEME_TABLE;
use crate::core_log::CoreLog;
use crate::events::{EventQueue, InputEvent};
use crate::platform::PlatformSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeviceType {
    #[default]
    KeyboardAndMouse,
    XBox,
    PlayStation,
    SwitchPro,
}

impl DeviceType {
    pub const ALL: [DeviceType; 4] = [
        DeviceType::KeyboardAndMouse,
        DeviceType::XBox,
        DeviceType::PlayStation,
        DeviceType::SwitchPro,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DeviceType::KeyboardAndMouse => "KeyboardAndMouse",
            DeviceType::XBox => "XBox",
            DeviceType::PlayStation => "PlayStation",
            DeviceType::SwitchPro => "SwitchPro",
        }
    }

    /// Scheme display name the platform uses for this family.
    pub fn scheme_name(&self) -> &'static str {
        SCHEME_TABLE
            .iter()
            .find(|(_, _, ty)| ty == self)
            .map(|(name, _, _)| *name)
            .unwrap_or("Keyboard and Mouse")
    }

    #[inline]
    pub fn is_gamepad(&self) -> bool {
        *self != DeviceType::KeyboardAndMouse
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a control scheme name. Exact, case-sensitive match against the
/// scheme display names or their stable ids; anything else is keyboard+mouse.
pub fn device_type_of(scheme: &str) -> DeviceType {
    SCHEME_TABLE
        .iter()
        .find(|(name, id, _)| *name == scheme || *id == scheme)
        .map(|(_, _, ty)| *ty)
        .unwrap_or_default()
}

pub struct DeviceTracker {
    current: DeviceType,
    scheme: Option<String>,
    lost: bool,
    logger: Arc<dyn CoreLog>,
}

impl DeviceTracker {
    pub fn new(logger: Arc<dyn CoreLog>) -> Self {
        Self {
            current: DeviceType::default(),
            scheme: None,
            lost: false,
            logger,
        }
    }

    #[inline]
    pub fn current_device_type(&self) -> DeviceType {
        self.current
    }

    #[inline]
    pub fn is_using_gamepad(&self) -> bool {
        self.current.is_gamepad()
    }

    /// Last scheme name the platform reported, if any.
    pub fn current_scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// True between a device-lost and the following regain.
    #[inline]
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    pub fn handle(&mut self, signal: PlatformSignal, out: &mut EventQueue) {
        match signal {
            PlatformSignal::SchemeChanged(name) => self.on_scheme_changed(name, out),
            PlatformSignal::DeviceLost => self.on_device_lost(out),
            PlatformSignal::DeviceRegained(name) => self.on_device_regained(name, out),
        }
    }

    /// Always reports the resolved type, even when it did not change.
    pub fn on_scheme_changed(&mut self, scheme: String, out: &mut EventQueue) {
        let ty = device_type_of(&scheme);
        self.logger.debug(&format!("[device] scheme '{scheme}' -> {ty}"));
        self.current = ty;
        self.scheme = Some(scheme);
        out.push(InputEvent::DeviceChanged(ty));
    }

    pub fn on_device_lost(&mut self, out: &mut EventQueue) {
        self.logger.info(&format!("[device] lost ({})", self.current));
        self.lost = true;
        out.push(InputEvent::DeviceLost(Some(self.current)));
    }

    /// Emits `DeviceChanged` first when the regained device resolves to a
    /// different family, then `DeviceRegained`.
    pub fn on_device_regained(&mut self, scheme: String, out: &mut EventQueue) {
        let ty = device_type_of(&scheme);
        self.logger.info(&format!("[device] regained '{scheme}' -> {ty}"));
        self.lost = false;
        if ty != self.current {
            self.current = ty;
            out.push(InputEvent::DeviceChanged(ty));
        }
        self.scheme = Some(scheme);
        out.push(InputEvent::DeviceRegained(ty));
    }
}
