//! Keyboard state machine
//!
//! Tracks pressed keys, modifier flags and modifier locks for one session
//! and turns presses and releases into `keydown`/`keypress`/`keyup`
//! sequences in browser order.
//!
//! # Example
//!
//! ```rust
//! use ki_user_event::dom::Document;
//! use ki_user_event::input::keyboard::Modifier;
//! use ki_user_event::Session;
//!
//! let mut doc = Document::new();
//! let mut session = Session::default();
//! let shift = session.key_map().resolve_key("Shift");
//! session.keyboard_press(&mut doc, &shift).unwrap();
//! assert!(session.keyboard().modifiers().get(Modifier::Shift));
//! session.keyboard_release(&mut doc, &shift).unwrap();
//! assert!(!session.keyboard().modifiers().get(Modifier::Shift));
//! ```

use super::keymap::{KeyAction, KeyDescriptor};
use super::InputResult;
use crate::dom::{Document, NodeId};
use crate::event::{EventInit, EventType};
use crate::session::Session;
use serde::{Serialize, Serializer};
use tracing::{debug, trace};

/// Modifier keys, including lock modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Alt,
    AltGraph,
    CapsLock,
    /// Control key (Ctrl)
    Control,
    Fn,
    FnLock,
    /// Meta key (Windows key / Command on Mac)
    Meta,
    NumLock,
    ScrollLock,
    Shift,
    Symbol,
    SymbolLock,
}

impl Modifier {
    /// All modifiers.
    pub const ALL: [Modifier; 12] = [
        Modifier::Alt,
        Modifier::AltGraph,
        Modifier::CapsLock,
        Modifier::Control,
        Modifier::Fn,
        Modifier::FnLock,
        Modifier::Meta,
        Modifier::NumLock,
        Modifier::ScrollLock,
        Modifier::Shift,
        Modifier::Symbol,
        Modifier::SymbolLock,
    ];

    /// Returns the `key` value of this modifier
    pub fn key_code(&self) -> &'static str {
        match self {
            Modifier::Alt => "Alt",
            Modifier::AltGraph => "AltGraph",
            Modifier::CapsLock => "CapsLock",
            Modifier::Control => "Control",
            Modifier::Fn => "Fn",
            Modifier::FnLock => "FnLock",
            Modifier::Meta => "Meta",
            Modifier::NumLock => "NumLock",
            Modifier::ScrollLock => "ScrollLock",
            Modifier::Shift => "Shift",
            Modifier::Symbol => "Symbol",
            Modifier::SymbolLock => "SymbolLock",
        }
    }

    /// Parses a `key` value into a modifier
    pub fn from_key(key: &str) -> Option<Modifier> {
        Self::ALL.iter().copied().find(|m| m.key_code() == key)
    }

    /// Whether the modifier latches until pressed again
    pub fn is_lock(&self) -> bool {
        matches!(
            self,
            Modifier::CapsLock
                | Modifier::FnLock
                | Modifier::NumLock
                | Modifier::ScrollLock
                | Modifier::SymbolLock
        )
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl std::fmt::Display for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key_code())
    }
}

/// Set of active modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierState(u16);

impl ModifierState {
    /// Returns whether the modifier is active
    pub fn get(&self, modifier: Modifier) -> bool {
        self.0 & modifier.bit() != 0
    }

    /// Activates or deactivates a modifier
    pub fn set(&mut self, modifier: Modifier, active: bool) {
        if active {
            self.0 |= modifier.bit();
        } else {
            self.0 &= !modifier.bit();
        }
    }

    /// Modifiers active in either set
    pub fn union(self, other: ModifierState) -> ModifierState {
        ModifierState(self.0 | other.0)
    }

    /// Iterates active modifiers
    pub fn active(&self) -> impl Iterator<Item = Modifier> + '_ {
        Modifier::ALL.into_iter().filter(|m| self.get(*m))
    }
}

impl Serialize for ModifierState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.active().map(|m| m.key_code()))
    }
}

#[derive(Debug, Clone)]
struct PressedKey {
    descriptor: KeyDescriptor,
    unprevented: bool,
}

/// Number fragment typed into a control whose value was replaced by an
/// external write in the middle of typing.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Carry {
    pub(crate) target: NodeId,
    pub(crate) text: String,
}

/// Per-session keyboard state
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    /// Held keys, at most one per physical code
    pressed: Vec<PressedKey>,
    modifiers: ModifierState,
    /// Locks switched on by a press whose release has not happened yet
    lock_phase: ModifierState,
    last_keydown_target: Option<NodeId>,
    pub(crate) carry: Option<Carry>,
}

impl KeyboardState {
    /// Active modifiers
    pub fn modifiers(&self) -> ModifierState {
        self.modifiers
    }

    /// Returns whether a key with the same code is held
    pub fn is_pressed(&self, key: &KeyDescriptor) -> bool {
        self.pressed.iter().any(|p| p.descriptor.code == key.code)
    }

    /// Currently held keys
    pub fn pressed_keys(&self) -> Vec<&KeyDescriptor> {
        self.pressed.iter().map(|p| &p.descriptor).collect()
    }

    fn set_keydown_target(&mut self, target: NodeId) {
        if self.last_keydown_target != Some(target) {
            self.carry = None;
        }
        self.last_keydown_target = Some(target);
    }

    fn has_keypress(&self, key: &str) -> bool {
        (key.chars().count() == 1 || key == "Enter")
            && !self.modifiers.get(Modifier::Control)
            && !self.modifiers.get(Modifier::Alt)
    }
}

fn key_init(key: &KeyDescriptor) -> EventInit {
    EventInit {
        key: Some(key.key.clone()),
        code: Some(key.code.clone()),
        location: Some(key.location),
        key_code: key.key_code,
        ..EventInit::default()
    }
}

impl Session {
    /// Keyboard state of this session
    pub fn keyboard(&self) -> &KeyboardState {
        &self.keyboard
    }

    fn control_companion(&self) -> KeyDescriptor {
        self.key_map
            .by_key("Control")
            .cloned()
            .unwrap_or_else(|| KeyDescriptor::new("Control", "Control", 17))
    }

    /// Presses a key on the focused element (or the body)
    ///
    /// Fires `keydown` and, when the key produces a character and was not
    /// prevented, `keypress`. AltGraph is preceded by a Control press.
    pub fn keyboard_press(&mut self, doc: &mut Document, key: &KeyDescriptor) -> InputResult<()> {
        if key.key == "AltGraph" {
            let control = self.control_companion();
            self.keydown(doc, &control)?;
        }
        self.keydown(doc, key)
    }

    /// Releases a held key. Releasing a key that is not held does nothing.
    pub fn keyboard_release(&mut self, doc: &mut Document, key: &KeyDescriptor) -> InputResult<()> {
        if !self.keyboard.is_pressed(key) {
            trace!(key = %key.key, "release of key that is not pressed");
            return Ok(());
        }
        self.keyup(doc, key)?;
        if key.key == "AltGraph" {
            let control = self.control_companion();
            self.keyup(doc, &control)?;
        }
        Ok(())
    }

    /// Runs one parsed descriptor step without waiting between repeats.
    pub fn keyboard_action(&mut self, doc: &mut Document, action: &KeyAction) -> InputResult<()> {
        if self.keyboard.is_pressed(&action.key) {
            self.keyboard_release(doc, &action.key)?;
        }
        if action.release_previous {
            return Ok(());
        }
        for _ in 0..action.repeat {
            self.keyboard_press(doc, &action.key)?;
        }
        if action.release_self {
            self.keyboard_release(doc, &action.key)?;
        }
        Ok(())
    }

    /// Types descriptor text synchronously, e.g. `"Hello{Enter}"`.
    pub fn type_keys(&mut self, doc: &mut Document, text: &str) -> InputResult<()> {
        for action in self.key_map.parse_actions(text)? {
            self.keyboard_action(doc, &action)?;
        }
        Ok(())
    }

    fn keydown(&mut self, doc: &mut Document, key: &KeyDescriptor) -> InputResult<()> {
        let target = doc.active_element_or_body();
        self.keyboard.set_keydown_target(target);

        let repeat = self.keyboard.is_pressed(key);
        if !repeat {
            self.keyboard.pressed.push(PressedKey {
                descriptor: key.clone(),
                unprevented: false,
            });
        }

        if let Some(modifier) = key.modifier() {
            if modifier.is_lock() {
                if !self.keyboard.modifiers.get(modifier) {
                    self.keyboard.modifiers.set(modifier, true);
                    self.keyboard.lock_phase.set(modifier, true);
                }
            } else {
                self.keyboard.modifiers.set(modifier, true);
            }
        }

        debug!(key = %key.key, code = %key.code, repeat, target = %doc.describe(target), "keydown");
        let init = EventInit {
            repeat,
            ..key_init(key)
        };
        let unprevented = self.dispatch(doc, target, EventType::KeyDown, init)?;

        if unprevented {
            if let Some(pressed) = self
                .keyboard
                .pressed
                .iter_mut()
                .find(|p| p.descriptor.code == key.code)
            {
                pressed.unprevented = true;
            }
        }

        if unprevented && self.keyboard.has_keypress(&key.key) {
            let char_code = if key.key == "Enter" {
                13
            } else {
                key.produced_char().map(|c| c as u32).unwrap_or(0)
            };
            let init = EventInit {
                char_code,
                key_code: char_code,
                ..key_init(key)
            };
            let target = doc.active_element_or_body();
            self.dispatch(doc, target, EventType::KeyPress, init)?;
        }
        Ok(())
    }

    fn keyup(&mut self, doc: &mut Document, key: &KeyDescriptor) -> InputResult<()> {
        let Some(index) = self
            .keyboard
            .pressed
            .iter()
            .position(|p| p.descriptor.code == key.code)
        else {
            return Ok(());
        };
        let unprevented = self.keyboard.pressed[index].unprevented;

        if let Some(modifier) = key.modifier() {
            if modifier.is_lock() {
                if self.keyboard.modifiers.get(modifier) {
                    if self.keyboard.lock_phase.get(modifier) {
                        self.keyboard.lock_phase.set(modifier, false);
                    } else {
                        self.keyboard.modifiers.set(modifier, false);
                    }
                }
            } else {
                // another held key with the same role keeps it active
                let still_held = self
                    .keyboard
                    .pressed
                    .iter()
                    .enumerate()
                    .any(|(i, p)| i != index && p.descriptor.key == key.key);
                if !still_held {
                    self.keyboard.modifiers.set(modifier, false);
                }
            }
        }

        let target = doc.active_element_or_body();
        debug!(key = %key.key, code = %key.code, target = %doc.describe(target), "keyup");
        let result = self.dispatch_with(doc, target, EventType::KeyUp, key_init(key), !unprevented);
        self.keyboard.pressed.retain(|p| p.descriptor.code != key.code);
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_key_code() {
        assert_eq!(Modifier::Shift.key_code(), "Shift");
        assert_eq!(Modifier::Control.key_code(), "Control");
        assert_eq!(Modifier::Alt.key_code(), "Alt");
        assert_eq!(Modifier::Meta.key_code(), "Meta");
    }

    #[test]
    fn test_parse_modifier() {
        assert_eq!(Modifier::from_key("Shift"), Some(Modifier::Shift));
        assert_eq!(Modifier::from_key("CapsLock"), Some(Modifier::CapsLock));
        assert_eq!(Modifier::from_key("shift"), None);
        assert_eq!(Modifier::from_key("a"), None);
        assert!(Modifier::NumLock.is_lock());
        assert!(!Modifier::AltGraph.is_lock());
    }

    #[test]
    fn test_modifier_state_bits() {
        let mut state = ModifierState::default();
        state.set(Modifier::Shift, true);
        state.set(Modifier::SymbolLock, true);
        assert!(state.get(Modifier::Shift));
        assert!(!state.get(Modifier::Symbol));
        state.set(Modifier::Shift, false);
        assert_eq!(state.active().collect::<Vec<_>>(), vec![Modifier::SymbolLock]);
    }

    #[test]
    fn test_keypress_requires_printable_key() {
        let mut state = KeyboardState::default();
        assert!(state.has_keypress("a"));
        assert!(state.has_keypress("Enter"));
        assert!(!state.has_keypress("Tab"));
        state.modifiers.set(Modifier::Control, true);
        assert!(!state.has_keypress("a"));
    }

    #[test]
    fn test_both_shift_keys_keep_modifier_until_last_release() {
        let mut doc = Document::new();
        let mut session = Session::default();
        let left = session.key_map().by_code("ShiftLeft").cloned().unwrap();
        let right = session.key_map().by_code("ShiftRight").cloned().unwrap();
        session.keyboard_press(&mut doc, &left).unwrap();
        session.keyboard_press(&mut doc, &right).unwrap();
        session.keyboard_release(&mut doc, &left).unwrap();
        assert!(session.keyboard().modifiers().get(Modifier::Shift));
        session.keyboard_release(&mut doc, &right).unwrap();
        assert!(!session.keyboard().modifiers().get(Modifier::Shift));
    }

    #[test]
    fn test_release_unpressed_key_is_noop() {
        let mut doc = Document::new();
        doc.enable_event_log();
        let mut session = Session::default();
        let a = session.key_map().resolve_key("a");
        session.keyboard_release(&mut doc, &a).unwrap();
        assert!(doc.event_log().is_empty());
    }

    #[test]
    fn test_repeat_flag_on_held_key() {
        let mut doc = Document::new();
        doc.enable_event_log();
        let mut session = Session::default();
        let action = KeyAction {
            key: session.key_map().resolve_key("a"),
            release_previous: false,
            release_self: true,
            repeat: 3,
        };
        session.keyboard_action(&mut doc, &action).unwrap();
        let repeats: Vec<bool> = doc
            .event_log()
            .iter()
            .filter(|e| e.event_type == EventType::KeyDown)
            .map(|e| e.init.repeat)
            .collect();
        assert_eq!(repeats, vec![false, true, true]);
        assert_eq!(
            doc.event_log()
                .iter()
                .filter(|e| e.event_type == EventType::KeyUp)
                .count(),
            1
        );
    }
}
