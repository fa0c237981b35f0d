//! Session settings and configuration management.
//!
//! This module provides the configuration options of a simulated user
//! session, supporting multiple configuration sources with proper precedence.

use crate::input::keymap::{KeyDescriptor, KeyMap};
use crate::input::pointer::PointerEventsCheck;
use crate::input::timing::ActionDelay;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML configuration: {0}")]
    TomlParseError(#[from] toml::de::Error),

    /// Failed to serialize TOML configuration.
    #[error("Failed to serialize TOML configuration: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    /// Failed to parse JSON configuration.
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Unsupported file format.
    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

/// Settings of one simulated user.
///
/// # Configuration Precedence
///
/// Settings are applied in the following order (later sources override earlier):
/// 1. Default values
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
/// 4. CLI arguments
///
/// # Example
///
/// ```rust
/// use ki_user_event::config::SessionSettings;
/// use ki_user_event::input::pointer::PointerEventsCheck;
///
/// let settings = SessionSettings::default()
///     .with_delay(Some(25))
///     .with_pointer_events_check(PointerEventsCheck::EachTarget);
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Pause between two steps in milliseconds. `None` runs steps back to
    /// back, `0` yields to the runtime.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: Option<u64>,

    /// Random spread of the pause (0.0 - 1.0).
    #[serde(default)]
    pub delay_variance: f64,

    /// How often `pointer-events` is re-evaluated.
    #[serde(default)]
    pub pointer_events_check: PointerEventsCheck,

    /// Skip the pointer move onto the element in `click`.
    #[serde(default)]
    pub skip_hover: bool,

    /// Skip the click that focuses the element in `type_text`.
    #[serde(default)]
    pub skip_click: bool,

    /// Leave keys pressed with `{Key>}` held at the end of `type_text`.
    #[serde(default)]
    pub skip_auto_close: bool,

    /// Write copied and cut data to the session clipboard.
    #[serde(default = "default_write_to_clipboard")]
    pub write_to_clipboard: bool,

    /// Replacement for the built-in key map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_map: Option<Vec<KeyDescriptor>>,
}

// Default value functions for serde
fn default_delay_ms() -> Option<u64> {
    Some(0)
}

fn default_write_to_clipboard() -> bool {
    true
}

const MAX_DELAY_MS: u64 = 60_000;

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            delay_variance: 0.0,
            pointer_events_check: PointerEventsCheck::default(),
            skip_hover: false,
            skip_click: false,
            skip_auto_close: false,
            write_to_clipboard: default_write_to_clipboard(),
            key_map: None,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value.to_lowercase() == "true" || value == "1"
}

/// Parses a delay where `none` (or an empty string) disables waiting.
fn parse_delay(value: &str) -> Option<Option<u64>> {
    match value.trim().to_lowercase().as_str() {
        "" | "none" => Some(None),
        ms => ms.parse().ok().map(Some),
    }
}

impl SessionSettings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads settings from a configuration file.
    ///
    /// Supports both TOML and JSON formats, detected by file extension.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "toml" => Ok(toml::from_str(&content)?),
            "json" => Ok(serde_json::from_str(&content)?),
            ext => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    /// Saves settings to a configuration file.
    ///
    /// The format is determined by the file extension.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let content = match extension.as_str() {
            "toml" => toml::to_string_pretty(self)?,
            "json" => serde_json::to_string_pretty(self)?,
            ext => return Err(ConfigError::UnsupportedFormat(ext.to_string())),
        };

        fs::write(path, content)?;
        Ok(())
    }

    /// Loads settings from environment variables.
    ///
    /// Environment variables are prefixed with `KI_USER_EVENT_`:
    /// - `KI_USER_EVENT_DELAY_MS` (`none` disables waiting)
    /// - `KI_USER_EVENT_DELAY_VARIANCE`
    /// - `KI_USER_EVENT_POINTER_EVENTS_CHECK`
    /// - `KI_USER_EVENT_SKIP_HOVER`, `KI_USER_EVENT_SKIP_CLICK`,
    ///   `KI_USER_EVENT_SKIP_AUTO_CLOSE`
    /// - `KI_USER_EVENT_WRITE_TO_CLIPBOARD`
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_env_overrides();
        settings
    }

    /// Applies environment variable overrides to current settings.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("KI_USER_EVENT_DELAY_MS") {
            if let Some(delay) = parse_delay(&val) {
                self.delay_ms = delay;
            }
        }

        if let Ok(val) = env::var("KI_USER_EVENT_DELAY_VARIANCE") {
            if let Ok(variance) = val.parse() {
                self.delay_variance = variance;
            }
        }

        if let Ok(val) = env::var("KI_USER_EVENT_POINTER_EVENTS_CHECK") {
            if let Ok(level) = val.parse() {
                self.pointer_events_check = level;
            }
        }

        if let Ok(val) = env::var("KI_USER_EVENT_SKIP_HOVER") {
            self.skip_hover = parse_flag(&val);
        }

        if let Ok(val) = env::var("KI_USER_EVENT_SKIP_CLICK") {
            self.skip_click = parse_flag(&val);
        }

        if let Ok(val) = env::var("KI_USER_EVENT_SKIP_AUTO_CLOSE") {
            self.skip_auto_close = parse_flag(&val);
        }

        if let Ok(val) = env::var("KI_USER_EVENT_WRITE_TO_CLIPBOARD") {
            self.write_to_clipboard = parse_flag(&val);
        }
    }

    /// Merges current settings with environment variable overrides.
    pub fn merge_with_env(mut self) -> Self {
        self.apply_env_overrides();
        self
    }

    /// Merges settings with CLI arguments.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ki_user_event::config::{CliArgs, SessionSettings};
    ///
    /// let args = CliArgs {
    ///     delay: Some("none".to_string()),
    ///     skip_hover: Some(true),
    ///     ..Default::default()
    /// };
    ///
    /// let settings = SessionSettings::default().merge_with_args(&args);
    /// assert_eq!(settings.delay_ms, None);
    /// assert!(settings.skip_hover);
    /// ```
    pub fn merge_with_args(mut self, args: &CliArgs) -> Self {
        if let Some(delay) = args.delay.as_deref().and_then(parse_delay) {
            self.delay_ms = delay;
        }
        if let Some(variance) = args.delay_variance {
            self.delay_variance = variance;
        }
        if let Some(level) = args
            .pointer_events_check
            .as_deref()
            .and_then(|l| l.parse().ok())
        {
            self.pointer_events_check = level;
        }
        if let Some(skip) = args.skip_hover {
            self.skip_hover = skip;
        }
        if let Some(skip) = args.skip_click {
            self.skip_click = skip;
        }
        if let Some(skip) = args.skip_auto_close {
            self.skip_auto_close = skip;
        }
        if let Some(write) = args.write_to_clipboard {
            self.write_to_clipboard = write;
        }
        self
    }

    /// Validates all settings.
    ///
    /// # Errors
    ///
    /// Returns an error if any setting is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(delay) = self.delay_ms {
            if delay > MAX_DELAY_MS {
                return Err(ConfigError::ValidationError(format!(
                    "Delay cannot exceed {}ms",
                    MAX_DELAY_MS
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.delay_variance) {
            return Err(ConfigError::ValidationError(
                "Delay variance must be between 0.0 and 1.0".to_string(),
            ));
        }

        if let Some(ref keys) = self.key_map {
            if keys.is_empty() {
                return Err(ConfigError::ValidationError(
                    "Custom key map cannot be empty".to_string(),
                ));
            }
            if let Some(key) = keys.iter().find(|k| k.key.is_empty() || k.code.is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "Key map entry needs both key and code: {:?}",
                    key
                )));
            }
        }

        Ok(())
    }

    /// Pause between steps described by these settings.
    pub fn action_delay(&self) -> ActionDelay {
        match self.delay_ms {
            Some(ms) => ActionDelay::millis(ms).with_variance(self.delay_variance),
            None => ActionDelay::none(),
        }
    }

    /// Key map described by these settings.
    pub fn build_key_map(&self) -> KeyMap {
        match &self.key_map {
            Some(keys) => KeyMap::from_keys(keys.clone()),
            None => KeyMap::default(),
        }
    }

    // Builder-style methods for convenient configuration

    /// Sets the pause between steps.
    pub fn with_delay(mut self, delay_ms: Option<u64>) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Sets the random spread of the pause.
    pub fn with_delay_variance(mut self, variance: f64) -> Self {
        self.delay_variance = variance;
        self
    }

    /// Sets the pointer-events check level.
    pub fn with_pointer_events_check(mut self, level: PointerEventsCheck) -> Self {
        self.pointer_events_check = level;
        self
    }

    /// Skips hovering before clicks.
    pub fn with_skip_hover(mut self, skip: bool) -> Self {
        self.skip_hover = skip;
        self
    }

    /// Skips the focusing click before typing.
    pub fn with_skip_click(mut self, skip: bool) -> Self {
        self.skip_click = skip;
        self
    }

    /// Keeps keys held at the end of `type_text`.
    pub fn with_skip_auto_close(mut self, skip: bool) -> Self {
        self.skip_auto_close = skip;
        self
    }

    /// Enables or disables writing copied data to the clipboard.
    pub fn with_write_to_clipboard(mut self, write: bool) -> Self {
        self.write_to_clipboard = write;
        self
    }

    /// Replaces the built-in key map.
    pub fn with_key_map(mut self, keys: Vec<KeyDescriptor>) -> Self {
        self.key_map = Some(keys);
        self
    }
}

/// CLI argument structure for parsing command line options.
///
/// All fields are optional to allow partial overrides.
#[derive(Debug, Default, Clone)]
pub struct CliArgs {
    /// Pause between steps in milliseconds, or `none`.
    pub delay: Option<String>,
    /// Random spread of the pause.
    pub delay_variance: Option<f64>,
    /// Pointer-events check level.
    pub pointer_events_check: Option<String>,
    /// Skip hovering before clicks.
    pub skip_hover: Option<bool>,
    /// Skip the focusing click before typing.
    pub skip_click: Option<bool>,
    /// Keep held keys pressed at the end of `keyboard`.
    pub skip_auto_close: Option<bool>,
    /// Write copied data to the clipboard.
    pub write_to_clipboard: Option<bool>,
    /// Configuration file path.
    pub config_file: Option<PathBuf>,
}

impl CliArgs {
    /// Creates an empty CliArgs instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the final settings by applying the full configuration chain.
    ///
    /// This method handles the complete configuration precedence:
    /// 1. Default values
    /// 2. Configuration file (if specified)
    /// 3. Environment variables
    /// 4. CLI arguments (self)
    pub fn load_settings(&self) -> Result<SessionSettings, ConfigError> {
        // Start with defaults or file
        let mut settings = if let Some(ref config_file) = self.config_file {
            SessionSettings::from_file(config_file)?
        } else {
            SessionSettings::default()
        };

        // Apply environment overrides
        settings = settings.merge_with_env();

        // Apply CLI overrides
        settings = settings.merge_with_args(self);

        // Validate final settings
        settings.validate()?;

        Ok(settings)
    }
}
