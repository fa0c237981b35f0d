//! Input devices for ki-user-event
//!
//! This module holds the device state machines that turn key and button
//! presses into browser-ordered event sequences, plus the tables and
//! helpers they rely on.
//!
//! # Submodules
//!
//! - [`keymap`] - Key and pointer button tables, descriptor parsing
//! - [`keyboard`] - Keyboard state machine with modifier and lock semantics
//! - [`pointer`] - Pointer device host (mouse, touch and pen contacts)
//! - [`clipboard`] - Clipboard abstraction and `DataTransfer`
//! - [`timing`] - Delays between simulated actions
//!
//! # Example
//!
//! ```rust
//! use ki_user_event::dom::Document;
//! use ki_user_event::Session;
//!
//! let mut doc = Document::from_markup("<input>").unwrap();
//! let input = doc.query("input").unwrap();
//! let mut session = Session::default();
//! session.focus_element(&mut doc, input).unwrap();
//! session.type_keys(&mut doc, "Hi").unwrap();
//! assert_eq!(doc.value(input), "Hi");
//! ```

pub mod clipboard;
pub mod keyboard;
pub mod keymap;
pub mod pointer;
pub mod timing;

// Re-export commonly used types for convenience
pub use clipboard::{Clipboard, DataTransfer, MemoryClipboard};
pub use keyboard::{KeyboardState, Modifier, ModifierState};
pub use keymap::{
    KeyAction, KeyDescriptor, KeyLocation, KeyMap, PointerButton, PointerKey, PointerKeyAction,
    PointerKind,
};
pub use pointer::{PointerAction, PointerHost, PointerPosition};
pub use timing::ActionDelay;

use crate::dom::DomError;
use thiserror::Error;

/// Result type for input operations
pub type InputResult<T> = Result<T, InputError>;

/// Errors that can occur during input simulation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// A pointer was moved or released before it was established
    #[error("Unknown pointer '{name}': press a button or touch on it first")]
    UnknownPointer { name: String },

    /// A selection offset lies outside the target's text
    #[error("Offset {offset} is out of bounds for {element} (text length {length})")]
    OffsetOutOfBounds {
        element: String,
        offset: usize,
        length: usize,
    },

    /// The element has no editing model for the requested operation
    #[error("{element} is not editable: {reason}")]
    NotEditable { element: String, reason: String },

    /// The target has or inherits `pointer-events: none`
    #[error("Unable to perform pointer interaction as {element} has `pointer-events: none`{}", .inherited_from.as_ref().map(|a| format!(" (inherited from {a})")).unwrap_or_default())]
    PointerEventsNone {
        element: String,
        inherited_from: Option<String>,
    },

    /// No option matches the requested value
    #[error("Value \"{value}\" not found in options of {select}")]
    OptionNotFound { select: String, value: String },

    /// Several values were requested for a single select
    #[error("Cannot select multiple options on a non-multiple {select}")]
    SelectCardinality { select: String },

    /// The option or its select is disabled
    #[error("{option} is disabled and cannot be selected")]
    OptionDisabled { option: String },

    /// A key or pointer descriptor could not be parsed
    #[error("Invalid descriptor \"{text}\": {message}")]
    InvalidDescriptor { text: String, message: String },

    /// A key is not known to the key map
    #[error("Unknown key: '{key}'")]
    UnknownKey { key: String },

    /// A node handle does not belong to the document
    #[error("Unknown node {0}")]
    UnknownNode(crate::dom::NodeId),

    /// Clipboard access failed
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// A document operation failed
    #[error(transparent)]
    Dom(#[from] DomError),
}
