//! User binding overrides and their text blob.
//!
//! The table maps `(action, slot)` to the control the user picked. The blob
//! is a small versioned JSON document:
//!
//! ```json
//! {"version":1,"overrides":[{"action":"Move","slot":1,"control":"kb_up"}]}
//! ```
//!
//! Decoding validates every entry against the default catalog, so a table
//! that made it through `from_json` can be applied as a whole.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::actions::Action;
use crate::bindings::binding::Binding;
use crate::bindings::constants::{DEFAULT_BINDINGS, OVERRIDES_VERSION};
use crate::controls::Control;

#[derive(Debug, Error)]
pub enum OverridesError {
    #[error("malformed overrides blob: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported overrides version {0}")]
    UnsupportedVersion(u32),
    #[error("{action} has no binding slot {slot}")]
    InvalidSlot { action: Action, slot: usize },
    #[error("{action} slot {slot} appears more than once")]
    DuplicateSlot { action: Action, slot: usize },
    #[error("{control} cannot be bound to {action} slot {slot}")]
    IncompatibleControl {
        action: Action,
        slot: usize,
        control: Control,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub action: Action,
    pub slot: usize,
    pub control: Control,
}

#[derive(Serialize, Deserialize)]
struct OverridesBlob {
    version: u32,
    #[serde(default)]
    overrides: Vec<OverrideEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindingOverrides {
    entries: BTreeMap<(Action, usize), Control>,
}

/// Default slot for `(action, slot)`, if the catalog has one.
pub fn default_binding(action: Action, slot: usize) -> Option<Binding> {
    DEFAULT_BINDINGS
        .get(&action)
        .and_then(|slots| slots.get(slot))
        .copied()
}

impl BindingOverrides {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, action: Action, slot: usize) -> Option<Control> {
        self.entries.get(&(action, slot)).copied()
    }

    /// Set one override after checking it against the catalog.
    /// Returns the control it replaced, if any.
    pub fn set(
        &mut self,
        action: Action,
        slot: usize,
        control: Control,
    ) -> Result<Option<Control>, OverridesError> {
        check_entry(action, slot, &control)?;
        Ok(self.entries.insert((action, slot), control))
    }

    pub fn remove(&mut self, action: Action, slot: usize) -> Option<Control> {
        self.entries.remove(&(action, slot))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All overrides in `(action, slot)` order.
    pub fn iter(&self) -> impl Iterator<Item = OverrideEntry> + '_ {
        self.entries
            .iter()
            .map(|(&(action, slot), &control)| OverrideEntry {
                action,
                slot,
                control,
            })
    }

    /// Effective slots for `action`: defaults with overrides swapped in.
    pub fn resolve(&self, action: Action) -> Vec<Binding> {
        DEFAULT_BINDINGS
            .get(&action)
            .map(|slots| {
                slots
                    .iter()
                    .enumerate()
                    .map(|(ix, b)| match self.get(action, ix) {
                        Some(c) => b.with_control(c),
                        None => *b,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn to_json(&self) -> Result<String, OverridesError> {
        let blob = OverridesBlob {
            version: OVERRIDES_VERSION,
            overrides: self.iter().collect(),
        };
        Ok(serde_json::to_string_pretty(&blob)?)
    }

    pub fn from_json(content: &str) -> Result<Self, OverridesError> {
        let blob: OverridesBlob = serde_json::from_str(content)?;
        if blob.version != OVERRIDES_VERSION {
            return Err(OverridesError::UnsupportedVersion(blob.version));
        }
        let mut out = BindingOverrides::new();
        for e in blob.overrides {
            if out.entries.contains_key(&(e.action, e.slot)) {
                return Err(OverridesError::DuplicateSlot {
                    action: e.action,
                    slot: e.slot,
                });
            }
            out.set(e.action, e.slot, e.control)?;
        }
        Ok(out)
    }
}

fn check_entry(action: Action, slot: usize, control: &Control) -> Result<(), OverridesError> {
    let binding =
        default_binding(action, slot).ok_or(OverridesError::InvalidSlot { action, slot })?;
    if !binding.accepts(control) {
        return Err(OverridesError::IncompatibleControl {
            action,
            slot,
            control: *control,
        });
    }
    Ok(())
}
