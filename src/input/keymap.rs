//! Key and pointer button tables.
//!
//! The default key map describes a US keyboard layout. Each entry maps a
//! `key` value to its physical `code`, location and legacy `keyCode`.
//! This module also parses the descriptor syntax used by the keyboard and
//! pointer APIs:
//!
//! - `abc` presses and releases `a`, `b`, `c`
//! - `{Shift>}` presses Shift and keeps it pressed, `{/Shift}` releases it
//! - `[KeyA]` refers to a key by its physical code
//! - `{a>3/}` presses `a` three times (repeat) and then releases it
//! - `{{` and `[[` type a literal bracket

use super::keyboard::Modifier;
use super::{InputError, InputResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `KeyboardEvent.location`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyLocation {
    #[default]
    Standard,
    Left,
    Right,
    Numpad,
}

impl KeyLocation {
    /// Numeric value as exposed by the DOM.
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Standard => 0,
            Self::Left => 1,
            Self::Right => 2,
            Self::Numpad => 3,
        }
    }
}

/// One physical key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDescriptor {
    /// `KeyboardEvent.key`
    pub key: String,
    /// `KeyboardEvent.code`
    pub code: String,
    #[serde(default)]
    pub location: KeyLocation,
    /// Legacy `keyCode`
    #[serde(default)]
    pub key_code: u32,
    /// Whether the layout produces this key with Shift held
    #[serde(default)]
    pub shift: bool,
}

impl KeyDescriptor {
    pub fn new(key: &str, code: &str, key_code: u32) -> Self {
        Self {
            key: key.to_string(),
            code: code.to_string(),
            location: KeyLocation::Standard,
            key_code,
            shift: false,
        }
    }

    fn at(mut self, location: KeyLocation) -> Self {
        self.location = location;
        self
    }

    fn shifted(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Modifier role of this key.
    pub fn modifier(&self) -> Option<Modifier> {
        Modifier::from_key(&self.key)
    }

    /// The character produced by this key, if it produces one.
    pub fn produced_char(&self) -> Option<char> {
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for KeyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.code)
    }
}

fn build_default_keys() -> Vec<KeyDescriptor> {
    let mut keys = Vec::new();

    // alphanumeric
    let shifted_digits = [')', '!', '@', '#', '$', '%', '^', '&', '*', '('];
    for (digit, shifted) in ('0'..='9').zip(shifted_digits) {
        let code = format!("Digit{digit}");
        let key_code = digit as u32;
        keys.push(KeyDescriptor::new(&digit.to_string(), &code, key_code));
        keys.push(KeyDescriptor::new(&shifted.to_string(), &code, key_code).shifted());
    }
    for letter in 'a'..='z' {
        let upper = letter.to_ascii_uppercase();
        let code = format!("Key{upper}");
        let key_code = upper as u32;
        keys.push(KeyDescriptor::new(&letter.to_string(), &code, key_code));
        keys.push(KeyDescriptor::new(&upper.to_string(), &code, key_code).shifted());
    }

    // punctuation
    let symbols = [
        ('`', '~', "Backquote", 192),
        ('-', '_', "Minus", 189),
        ('=', '+', "Equal", 187),
        ('[', '{', "BracketLeft", 219),
        (']', '}', "BracketRight", 221),
        ('\\', '|', "Backslash", 220),
        (';', ':', "Semicolon", 186),
        ('\'', '"', "Quote", 222),
        (',', '<', "Comma", 188),
        ('.', '>', "Period", 190),
        ('/', '?', "Slash", 191),
    ];
    for (plain, shifted, code, key_code) in symbols {
        keys.push(KeyDescriptor::new(&plain.to_string(), code, key_code));
        keys.push(KeyDescriptor::new(&shifted.to_string(), code, key_code).shifted());
    }
    keys.push(KeyDescriptor::new(" ", "Space", 32));

    // modifiers
    for (key, key_code) in [("Alt", 18), ("Control", 17), ("Meta", 93), ("Shift", 16)] {
        keys.push(KeyDescriptor::new(key, &format!("{key}Left"), key_code).at(KeyLocation::Left));
        keys.push(KeyDescriptor::new(key, &format!("{key}Right"), key_code).at(KeyLocation::Right));
    }
    keys.push(KeyDescriptor::new("AltGraph", "AltRight", 225).at(KeyLocation::Right));
    keys.push(KeyDescriptor::new("CapsLock", "CapsLock", 20));
    keys.push(KeyDescriptor::new("Fn", "Fn", 0));
    keys.push(KeyDescriptor::new("FnLock", "FnLock", 0));
    keys.push(KeyDescriptor::new("NumLock", "NumLock", 144));
    keys.push(KeyDescriptor::new("ScrollLock", "ScrollLock", 145));
    keys.push(KeyDescriptor::new("Symbol", "Symbol", 0));
    keys.push(KeyDescriptor::new("SymbolLock", "SymbolLock", 0));

    // whitespace, navigation and editing
    for (key, key_code) in [
        ("Enter", 13),
        ("Tab", 9),
        ("Backspace", 8),
        ("Delete", 46),
        ("Escape", 27),
        ("ArrowDown", 40),
        ("ArrowLeft", 37),
        ("ArrowRight", 39),
        ("ArrowUp", 38),
        ("End", 35),
        ("Home", 36),
        ("PageDown", 34),
        ("PageUp", 33),
        ("Insert", 45),
        ("ContextMenu", 93),
        ("Pause", 19),
        ("PrintScreen", 44),
    ] {
        keys.push(KeyDescriptor::new(key, key, key_code));
    }
    for n in 1..=12u32 {
        let name = format!("F{n}");
        keys.push(KeyDescriptor::new(&name, &name, 111 + n));
    }
    keys
}

static DEFAULT_KEYS: Lazy<Vec<KeyDescriptor>> = Lazy::new(build_default_keys);

/// A key lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMap {
    keys: Vec<KeyDescriptor>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            keys: DEFAULT_KEYS.clone(),
        }
    }
}

impl KeyMap {
    /// Creates a key map from custom entries.
    pub fn from_keys(keys: Vec<KeyDescriptor>) -> Self {
        Self { keys }
    }

    /// Entries of the map.
    pub fn keys(&self) -> &[KeyDescriptor] {
        &self.keys
    }

    /// First entry with the given `key` value.
    pub fn by_key(&self, key: &str) -> Option<&KeyDescriptor> {
        self.keys.iter().find(|k| k.key == key)
    }

    /// First entry with the given `code`.
    pub fn by_code(&self, code: &str) -> Option<&KeyDescriptor> {
        self.keys.iter().find(|k| k.code == code)
    }

    /// Descriptor for a `key` value. Keys missing from the map get the
    /// code `Unknown`.
    pub fn resolve_key(&self, key: &str) -> KeyDescriptor {
        self.by_key(key)
            .cloned()
            .unwrap_or_else(|| KeyDescriptor::new(key, "Unknown", 0))
    }

    /// Parses keyboard descriptor text into actions.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ki_user_event::input::keymap::KeyMap;
    ///
    /// let actions = KeyMap::default().parse_actions("{Shift>}A{/Shift}").unwrap();
    /// assert_eq!(actions.len(), 3);
    /// assert!(!actions[0].release_self);
    /// assert!(actions[2].release_previous);
    /// ```
    pub fn parse_actions(&self, text: &str) -> InputResult<Vec<KeyAction>> {
        read_descriptors(text, true)?
            .into_iter()
            .map(|d| {
                let key = match d.kind {
                    DescriptorKind::Char | DescriptorKind::Key => self.resolve_key(&d.name),
                    DescriptorKind::Code => {
                        self.by_code(&d.name)
                            .cloned()
                            .ok_or_else(|| InputError::UnknownKey {
                                key: format!("[{}]", d.name),
                            })?
                    }
                };
                Ok(KeyAction {
                    key,
                    release_previous: d.release_previous,
                    release_self: d.release_self,
                    repeat: d.repeat,
                })
            })
            .collect()
    }
}

/// One step parsed from keyboard descriptor text.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyAction {
    pub key: KeyDescriptor,
    /// Only release the key (`{/Key}`)
    pub release_previous: bool,
    /// Release the key after pressing it
    pub release_self: bool,
    /// Number of presses
    pub repeat: u32,
}

// ============================================================================
// Pointer keys
// ============================================================================

/// `PointerEvent.pointerType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Mouse,
    Pen,
    Touch,
}

impl PointerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mouse => "mouse",
            Self::Pen => "pen",
            Self::Touch => "touch",
        }
    }
}

impl fmt::Display for PointerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    Primary,
    Secondary,
    Auxiliary,
    Back,
    Forward,
}

impl PointerButton {
    /// Bit index in `MouseEvent.buttons`.
    pub fn id(self) -> u16 {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
            Self::Auxiliary => 2,
            Self::Back => 3,
            Self::Forward => 4,
        }
    }

    /// `MouseEvent.button`: auxiliary and secondary swap places.
    pub fn event_button(self) -> i16 {
        match self {
            Self::Primary => 0,
            Self::Auxiliary => 1,
            Self::Secondary => 2,
            Self::Back => 3,
            Self::Forward => 4,
        }
    }
}

/// A named pointer input, e.g. `MouseLeft` or `TouchA`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerKey {
    pub name: String,
    pub kind: PointerKind,
    pub button: PointerButton,
}

impl PointerKey {
    fn new(name: &str, kind: PointerKind, button: PointerButton) -> Self {
        Self {
            name: name.to_string(),
            kind,
            button,
        }
    }
}

static DEFAULT_POINTER_KEYS: Lazy<Vec<PointerKey>> = Lazy::new(|| {
    vec![
        PointerKey::new("MouseLeft", PointerKind::Mouse, PointerButton::Primary),
        PointerKey::new("MouseRight", PointerKind::Mouse, PointerButton::Secondary),
        PointerKey::new("MouseMiddle", PointerKind::Mouse, PointerButton::Auxiliary),
        PointerKey::new("TouchA", PointerKind::Touch, PointerButton::Primary),
        PointerKey::new("TouchB", PointerKind::Touch, PointerButton::Primary),
        PointerKey::new("TouchC", PointerKind::Touch, PointerButton::Primary),
        PointerKey::new("Pen", PointerKind::Pen, PointerButton::Primary),
    ]
});

/// Default pointer keys.
pub fn default_pointer_keys() -> &'static [PointerKey] {
    &DEFAULT_POINTER_KEYS
}

/// Pointer key by name.
pub fn pointer_key(name: &str) -> Option<&'static PointerKey> {
    DEFAULT_POINTER_KEYS.iter().find(|k| k.name == name)
}

/// One step parsed from pointer descriptor text such as `[MouseLeft>]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerKeyAction {
    pub key: PointerKey,
    pub release_previous: bool,
    pub release_self: bool,
}

/// Parses pointer key descriptors. Only the `[Name]` form is accepted.
pub fn parse_pointer_keys(text: &str) -> InputResult<Vec<PointerKeyAction>> {
    read_descriptors(text, false)?
        .into_iter()
        .map(|d| {
            let key = pointer_key(&d.name).cloned().ok_or_else(|| InputError::InvalidDescriptor {
                text: text.to_string(),
                message: format!("unknown pointer key \"{}\"", d.name),
            })?;
            Ok(PointerKeyAction {
                key,
                release_previous: d.release_previous,
                release_self: d.release_self,
            })
        })
        .collect()
}

// ============================================================================
// Descriptor reader
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DescriptorKind {
    Char,
    Key,
    Code,
}

#[derive(Debug, Clone, PartialEq)]
struct Descriptor {
    kind: DescriptorKind,
    name: String,
    release_previous: bool,
    release_self: bool,
    repeat: u32,
}

fn read_descriptors(text: &str, allow_plain: bool) -> InputResult<Vec<Descriptor>> {
    let invalid = |message: String| InputError::InvalidDescriptor {
        text: text.to_string(),
        message,
    };
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        let (kind, close) = match c {
            '{' if allow_plain => (DescriptorKind::Key, '}'),
            '[' => (DescriptorKind::Code, ']'),
            _ if allow_plain => {
                out.push(Descriptor {
                    kind: DescriptorKind::Char,
                    name: c.to_string(),
                    release_previous: false,
                    release_self: true,
                    repeat: 1,
                });
                pos += 1;
                continue;
            }
            _ => return Err(invalid(format!("expected '[' at position {pos}, found '{c}'"))),
        };

        // doubled bracket types the bracket itself
        if allow_plain && chars.get(pos + 1) == Some(&c) {
            out.push(Descriptor {
                kind: DescriptorKind::Char,
                name: c.to_string(),
                release_previous: false,
                release_self: true,
                repeat: 1,
            });
            pos += 2;
            continue;
        }
        pos += 1;

        let release_previous = chars.get(pos) == Some(&'/');
        if release_previous {
            pos += 1;
        }

        let name_start = pos;
        while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
            pos += 1;
        }
        if pos == name_start && kind == DescriptorKind::Key {
            // a single non-word character such as `{!}`
            if chars.get(pos).map(|c| !matches!(c, '}' | '>' | '/')).unwrap_or(false) {
                pos += 1;
            }
        }
        let name: String = chars[name_start..pos].iter().collect();
        if name.is_empty() {
            return Err(invalid(format!("expected key name at position {name_start}")));
        }

        let mut repeat = 1;
        let mut release_self = !release_previous;
        if !release_previous && chars.get(pos) == Some(&'>') {
            pos += 1;
            release_self = false;
            let digits_start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos > digits_start {
                let digits: String = chars[digits_start..pos].iter().collect();
                repeat = digits
                    .parse()
                    .map_err(|_| invalid(format!("invalid repeat count \"{digits}\"")))?;
            }
        }
        if chars.get(pos) == Some(&'/') {
            if release_previous {
                return Err(invalid(format!("unexpected '/' at position {pos}")));
            }
            pos += 1;
            release_self = true;
        }

        match chars.get(pos) {
            Some(found) if *found == close => pos += 1,
            Some(found) => {
                return Err(invalid(format!(
                    "expected '{close}' at position {pos}, found '{found}'"
                )))
            }
            None => return Err(invalid(format!("missing closing '{close}'"))),
        }

        out.push(Descriptor {
            kind,
            name,
            release_previous,
            release_self,
            repeat: if release_previous { 0 } else { repeat },
        });
    }
    Ok(out)
}
