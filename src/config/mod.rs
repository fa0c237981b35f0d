//! Configuration module for ki-user-event.
//!
//! This module provides configuration management for a simulated user,
//! including:
//! - Loading settings from files (TOML/JSON)
//! - Environment variable overrides
//! - CLI argument merging
//! - Validation and defaults
//!
//! # Example
//!
//! ```rust,no_run
//! use ki_user_event::config::SessionSettings;
//!
//! // Load from a specific file
//! let settings = SessionSettings::from_file("session.toml").unwrap();
//!
//! // Override with environment variables
//! let settings = settings.merge_with_env();
//! ```

mod settings;

pub use settings::{CliArgs, ConfigError, SessionSettings};
