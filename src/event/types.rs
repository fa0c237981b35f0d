//! Event types and event objects.

use crate::dom::NodeId;
use crate::input::clipboard::DataTransfer;
use crate::input::keyboard::{Modifier, ModifierState};
use crate::input::keymap::{KeyLocation, PointerKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interface family of an event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFamily {
    Pointer,
    Mouse,
    Keyboard,
    Input,
    Focus,
    Clipboard,
    Generic,
}

impl EventFamily {
    /// Families that carry modifier flags.
    pub fn carries_modifiers(self) -> bool {
        matches!(self, Self::Pointer | Self::Mouse | Self::Keyboard)
    }
}

/// Every event type the simulation dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    PointerOver,
    PointerEnter,
    PointerDown,
    PointerMove,
    PointerUp,
    PointerCancel,
    PointerOut,
    PointerLeave,
    MouseOver,
    MouseEnter,
    MouseDown,
    MouseMove,
    MouseUp,
    MouseOut,
    MouseLeave,
    Click,
    AuxClick,
    DblClick,
    ContextMenu,
    KeyDown,
    KeyPress,
    KeyUp,
    BeforeInput,
    Input,
    Focus,
    Blur,
    FocusIn,
    FocusOut,
    Copy,
    Cut,
    Paste,
    Change,
    Submit,
    Reset,
    Select,
    /// Signal emitted when a file input would open the file picker.
    #[serde(rename = "fileDialog")]
    FileDialog,
}

impl EventType {
    /// All event types, in declaration order.
    pub const ALL: [EventType; 36] = [
        Self::PointerOver,
        Self::PointerEnter,
        Self::PointerDown,
        Self::PointerMove,
        Self::PointerUp,
        Self::PointerCancel,
        Self::PointerOut,
        Self::PointerLeave,
        Self::MouseOver,
        Self::MouseEnter,
        Self::MouseDown,
        Self::MouseMove,
        Self::MouseUp,
        Self::MouseOut,
        Self::MouseLeave,
        Self::Click,
        Self::AuxClick,
        Self::DblClick,
        Self::ContextMenu,
        Self::KeyDown,
        Self::KeyPress,
        Self::KeyUp,
        Self::BeforeInput,
        Self::Input,
        Self::Focus,
        Self::Blur,
        Self::FocusIn,
        Self::FocusOut,
        Self::Copy,
        Self::Cut,
        Self::Paste,
        Self::Change,
        Self::Submit,
        Self::Reset,
        Self::Select,
        Self::FileDialog,
    ];

    /// DOM event name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PointerOver => "pointerover",
            Self::PointerEnter => "pointerenter",
            Self::PointerDown => "pointerdown",
            Self::PointerMove => "pointermove",
            Self::PointerUp => "pointerup",
            Self::PointerCancel => "pointercancel",
            Self::PointerOut => "pointerout",
            Self::PointerLeave => "pointerleave",
            Self::MouseOver => "mouseover",
            Self::MouseEnter => "mouseenter",
            Self::MouseDown => "mousedown",
            Self::MouseMove => "mousemove",
            Self::MouseUp => "mouseup",
            Self::MouseOut => "mouseout",
            Self::MouseLeave => "mouseleave",
            Self::Click => "click",
            Self::AuxClick => "auxclick",
            Self::DblClick => "dblclick",
            Self::ContextMenu => "contextmenu",
            Self::KeyDown => "keydown",
            Self::KeyPress => "keypress",
            Self::KeyUp => "keyup",
            Self::BeforeInput => "beforeinput",
            Self::Input => "input",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::FocusIn => "focusin",
            Self::FocusOut => "focusout",
            Self::Copy => "copy",
            Self::Cut => "cut",
            Self::Paste => "paste",
            Self::Change => "change",
            Self::Submit => "submit",
            Self::Reset => "reset",
            Self::Select => "select",
            Self::FileDialog => "fileDialog",
        }
    }

    /// Interface family.
    pub fn family(self) -> EventFamily {
        match self {
            Self::PointerOver
            | Self::PointerEnter
            | Self::PointerDown
            | Self::PointerMove
            | Self::PointerUp
            | Self::PointerCancel
            | Self::PointerOut
            | Self::PointerLeave => EventFamily::Pointer,
            Self::MouseOver
            | Self::MouseEnter
            | Self::MouseDown
            | Self::MouseMove
            | Self::MouseUp
            | Self::MouseOut
            | Self::MouseLeave
            | Self::Click
            | Self::AuxClick
            | Self::DblClick
            | Self::ContextMenu => EventFamily::Mouse,
            Self::KeyDown | Self::KeyPress | Self::KeyUp => EventFamily::Keyboard,
            Self::BeforeInput | Self::Input => EventFamily::Input,
            Self::Focus | Self::Blur | Self::FocusIn | Self::FocusOut => EventFamily::Focus,
            Self::Copy | Self::Cut | Self::Paste => EventFamily::Clipboard,
            Self::Change | Self::Submit | Self::Reset | Self::Select | Self::FileDialog => {
                EventFamily::Generic
            }
        }
    }

    /// Whether the event bubbles.
    pub fn bubbles(self) -> bool {
        !matches!(
            self,
            Self::PointerEnter
                | Self::PointerLeave
                | Self::MouseEnter
                | Self::MouseLeave
                | Self::Focus
                | Self::Blur
                | Self::FileDialog
        )
    }

    /// Whether listeners can cancel the default action.
    pub fn cancelable(self) -> bool {
        !matches!(
            self,
            Self::PointerEnter
                | Self::PointerLeave
                | Self::PointerCancel
                | Self::MouseEnter
                | Self::MouseLeave
                | Self::Input
                | Self::Focus
                | Self::Blur
                | Self::FocusIn
                | Self::FocusOut
                | Self::Change
                | Self::Select
                | Self::FileDialog
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown event type: {s}"))
    }
}

/// `inputType` of `beforeinput`/`input` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditType {
    InsertText,
    InsertLineBreak,
    InsertParagraph,
    InsertFromPaste,
    DeleteContentBackward,
    DeleteContentForward,
    DeleteByCut,
}

impl EditType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsertText => "insertText",
            Self::InsertLineBreak => "insertLineBreak",
            Self::InsertParagraph => "insertParagraph",
            Self::InsertFromPaste => "insertFromPaste",
            Self::DeleteContentBackward => "deleteContentBackward",
            Self::DeleteContentForward => "deleteContentForward",
            Self::DeleteByCut => "deleteByCut",
        }
    }

    /// Deletions that remove one unit next to a collapsed caret.
    pub fn direction(self) -> Option<DeleteDirection> {
        match self {
            Self::DeleteContentBackward => Some(DeleteDirection::Backward),
            Self::DeleteContentForward => Some(DeleteDirection::Forward),
            _ => None,
        }
    }
}

impl fmt::Display for EditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a collapsed delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDirection {
    Backward,
    Forward,
}

/// Fields used to initialise an event. Fields that do not belong to the
/// event's family are ignored by listeners.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventInit {
    pub key: Option<String>,
    pub code: Option<String>,
    pub location: Option<KeyLocation>,
    pub repeat: bool,
    pub char_code: u32,
    pub key_code: u32,
    pub modifiers: ModifierState,
    pub button: i16,
    pub buttons: u16,
    pub detail: u32,
    pub client_x: f64,
    pub client_y: f64,
    pub pointer_id: Option<u32>,
    pub pointer_type: Option<PointerKind>,
    pub is_primary: bool,
    pub width: f64,
    pub height: f64,
    pub pressure: f64,
    pub data: Option<String>,
    pub input_type: Option<EditType>,
    pub related_target: Option<NodeId>,
    pub clipboard_data: Option<DataTransfer>,
}

/// A dispatched event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event_type: EventType,
    pub target: NodeId,
    pub current_target: Option<NodeId>,
    pub bubbles: bool,
    pub cancelable: bool,
    pub default_prevented: bool,
    pub init: EventInit,
    #[serde(skip)]
    stop_propagation: bool,
    #[serde(skip)]
    stop_immediate: bool,
}

impl Event {
    /// Creates an event with the type's default flags.
    pub fn new(event_type: EventType, target: NodeId) -> Self {
        Self::with_init(event_type, target, EventInit::default())
    }

    /// Creates an event with the given init fields.
    pub fn with_init(event_type: EventType, target: NodeId, init: EventInit) -> Self {
        Self {
            event_type,
            target,
            current_target: None,
            bubbles: event_type.bubbles(),
            cancelable: event_type.cancelable(),
            default_prevented: false,
            init,
            stop_propagation: false,
            stop_immediate: false,
        }
    }

    /// Cancels the default action. Has no effect on non-cancelable events.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn stop_propagation(&mut self) {
        self.stop_propagation = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.stop_propagation = true;
        self.stop_immediate = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.stop_propagation
    }

    pub fn immediate_propagation_stopped(&self) -> bool {
        self.stop_immediate
    }

    /// `getModifierState(name)`.
    pub fn get_modifier_state(&self, name: &str) -> bool {
        Modifier::from_key(name)
            .map(|m| self.init.modifiers.get(m))
            .unwrap_or(false)
    }

    pub fn key(&self) -> Option<&str> {
        self.init.key.as_deref()
    }

    pub fn code(&self) -> Option<&str> {
        self.init.code.as_deref()
    }

    pub fn detail(&self) -> u32 {
        self.init.detail
    }

    pub fn button(&self) -> i16 {
        self.init.button
    }

    pub fn buttons(&self) -> u16 {
        self.init.buttons
    }

    pub fn shift_key(&self) -> bool {
        self.init.modifiers.get(Modifier::Shift)
    }

    pub fn ctrl_key(&self) -> bool {
        self.init.modifiers.get(Modifier::Control)
    }

    pub fn alt_key(&self) -> bool {
        self.init.modifiers.get(Modifier::Alt)
    }

    pub fn meta_key(&self) -> bool {
        self.init.modifiers.get(Modifier::Meta)
    }

    pub fn data(&self) -> Option<&str> {
        self.init.data.as_deref()
    }

    pub fn input_type(&self) -> Option<EditType> {
        self.init.input_type
    }
}
