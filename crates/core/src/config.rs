use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;

use crate::bindings::constants::{DEFAULT_CANCEL_CONTROL, DEFAULT_STORAGE_KEY};
use crate::controls::Control;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for the input layer. Every field has a default, so `{}` is a
/// valid config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Actuation at which a button-like action counts as pressed.
    pub press_point: f32,
    /// Stick values shorter than this read as zero.
    pub stick_deadzone: f32,
    /// Store key used by `save_bindings` and the startup load.
    pub storage_key: String,
    /// Load saved overrides when the facade is built.
    pub auto_load: bool,
    pub rebind: RebindConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebindConfig {
    /// Pressing this while a rebind waits cancels it.
    pub cancel_control: Control,
    /// Cancel automatically after this many ticks without input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ticks: Option<u64>,
    /// Mouse motion never completes a capture.
    pub exclude_mouse_motion: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            press_point: 0.5,
            stick_deadzone: 0.125,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            auto_load: true,
            rebind: RebindConfig::default(),
        }
    }
}

impl Default for RebindConfig {
    fn default() -> Self {
        Self {
            cancel_control: DEFAULT_CANCEL_CONTROL,
            timeout_ticks: None,
            exclude_mouse_motion: true,
        }
    }
}

impl InputConfig {
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let cfg: InputConfig = serde_json::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.press_point > 0.0 && self.press_point <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "press_point must be in (0, 1], got {}",
                self.press_point
            )));
        }
        if !(0.0..1.0).contains(&self.stick_deadzone) {
            return Err(ConfigError::Invalid(format!(
                "stick_deadzone must be in [0, 1), got {}",
                self.stick_deadzone
            )));
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid("storage_key is empty".into()));
        }
        if self.rebind.timeout_ticks == Some(0) {
            return Err(ConfigError::Invalid("rebind.timeout_ticks must be > 0".into()));
        }
        Ok(())
    }
}
