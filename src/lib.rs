//! # KI User Event
//!
//! Browser-faithful simulation of keyboard, pointer and clipboard input
//! against an in-process document.
//!
//! Instead of firing one synthetic event per interaction, a [`Session`]
//! reproduces the full sequence a real browser produces: pointer and mouse
//! events interleaved per phase, click counts, modifier and lock state,
//! `beforeinput`/`input` around every edit, focus and `change` bookkeeping,
//! and the default actions that follow unprevented events.
//!
//! ## Features
//!
//! - **Keyboard Device**: pressed keys, modifiers, locks, AltGraph companions
//! - **Pointer Host**: mouse plus any number of touch and pen contacts
//! - **Dispatch Pipeline**: default actions that run only when not prevented
//! - **Edit Engine**: value and contenteditable edits with UI value tracking
//! - **Flexible Configuration**: TOML/JSON files, environment variables, CLI arguments
//!
//! ## Quick Start
//!
//! ```rust
//! use ki_user_event::{api, config::SessionSettings, dom::Document, Session};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut doc = Document::from_markup("<label>Name <input id='name'></label>")?;
//!     let input = doc.query("#name").expect("input in markup");
//!
//!     let mut session = Session::new(SessionSettings::default().with_delay(None));
//!     api::type_text(&mut session, &mut doc, input, "Ada").await?;
//!
//!     assert_eq!(doc.value(input), "Ada");
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`dom`]: In-process document, listeners, ranges and control values
//! - [`event`]: Event types, dispatch, focus and default actions
//! - [`input`]: Keyboard and pointer devices, key tables, clipboard, timing
//! - [`selection`]: Caret and selection resolution
//! - [`edit`]: Value and contenteditable edits
//! - [`api`]: Async convenience functions
//! - [`scenario`]: Scripted sessions replayed by the binary
//! - [`config`]: Configuration loading and management
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      api / scenario                      │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌──────────┐  ┌──────────┐            ┌──────────┐      │
//! │  │ Keyboard │  │ Pointer  │            │  Config  │      │
//! │  └────┬─────┘  └────┬─────┘            └──────────┘      │
//! │       └──────┬──────┘                                    │
//! │        ┌─────┴──────┐                                    │
//! │        │  Dispatch  │── default actions                  │
//! │        └─────┬──────┘                                    │
//! │       ┌──────┴──────┐                                    │
//! │  ┌────┴────┐  ┌─────┴─────┐                              │
//! │  │  Edit   │  │ Selection │                              │
//! │  └────┬────┘  └─────┬─────┘                              │
//! │       └──────┬──────┘                                    │
//! │           Document                                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//!
//! Configuration follows a precedence chain:
//! 1. Default values
//! 2. Configuration file (TOML/JSON)
//! 3. Environment variables (`KI_USER_EVENT_*`)
//! 4. CLI arguments
//!
//! See [`config::SessionSettings`] for all available options.

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Full version string with name
pub const FULL_VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Module Exports
// ============================================================================

/// In-process document model: nodes, listeners, ranges and control values.
pub mod dom;

/// Event types, dispatch pipeline, focus changes and default actions.
pub mod event;

/// Keyboard and pointer devices, key tables, clipboard and timing.
pub mod input;

/// Caret and selection resolution for controls and document ranges.
pub mod selection;

/// Edits of control values and contenteditable content.
pub mod edit;

/// The simulated user.
pub mod session;

/// Async convenience functions: click, type, tab, select options, clipboard.
pub mod api;

/// Scripted sessions stored as TOML or JSON.
pub mod scenario;

/// Configuration management for loading settings from files, env, and CLI.
pub mod config;

// ============================================================================
// Re-exports for Convenience
// ============================================================================

pub use session::Session;

// Document types
pub use dom::{BoundaryPoint, Document, DomError, NodeId, Range, WriteOrigin};

// Event types
pub use event::{DefaultAction, EditType, Event, EventInit, EventType};

// Input types
pub use input::{
    ActionDelay, Clipboard, DataTransfer, InputError, InputResult, KeyDescriptor, KeyMap,
    MemoryClipboard, Modifier, PointerAction, PointerPosition,
};

// Config types
pub use config::{CliArgs, ConfigError, SessionSettings};

// ============================================================================
// Prelude Module
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```rust
/// use ki_user_event::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api;
    pub use crate::config::{CliArgs, SessionSettings};
    pub use crate::dom::{Document, NodeId};
    pub use crate::event::{EditType, EventType};
    pub use crate::input::{InputError, InputResult, PointerAction, PointerPosition};
    pub use crate::session::Session;
    pub use crate::{FULL_VERSION, NAME, VERSION};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constants() {
        assert!(!VERSION.is_empty());
        assert!(!NAME.is_empty());
        assert!(FULL_VERSION.contains(VERSION));
        assert!(FULL_VERSION.contains(NAME));
    }

    #[test]
    fn test_prelude_imports() {
        // Verify prelude types are accessible
        use crate::prelude::*;
        let _ = Session::default();
        let _ = VERSION;
        let _ = NAME;
    }
}
