//! Held buttons and click counting.

use crate::input::keymap::{PointerButton, PointerKey};
use std::collections::BTreeMap;

/// Buttons held by one or more pointer keys.
///
/// Several keys may hold the same button, e.g. two fingers both acting as
/// the primary button. A button is released when its last holder is.
#[derive(Debug, Clone, Default)]
pub struct ButtonState {
    pressed: BTreeMap<u16, Vec<String>>,
}

impl ButtonState {
    /// `MouseEvent.buttons` bitmask.
    pub fn bits(&self) -> u16 {
        self.pressed.keys().fold(0, |bits, id| bits | (1 << id))
    }

    pub fn is_pressed(&self, button: PointerButton) -> bool {
        self.pressed.contains_key(&button.id())
    }

    /// Registers `key` as holder. Returns the button if it was not held
    /// before.
    pub fn down(&mut self, key: &PointerKey) -> Option<PointerButton> {
        let holders = self.pressed.entry(key.button.id()).or_default();
        let first = holders.is_empty();
        holders.push(key.name.clone());
        first.then_some(key.button)
    }

    /// Removes `key` as holder. Returns the button if this released it.
    pub fn up(&mut self, key: &PointerKey) -> Option<PointerButton> {
        let id = key.button.id();
        let holders = self.pressed.get_mut(&id)?;
        holders.retain(|name| *name != key.name);
        if holders.is_empty() {
            self.pressed.remove(&id);
            Some(key.button)
        } else {
            None
        }
    }
}

/// Click counts per button.
///
/// `detail` of `mousedown` is the number of completed clicks plus one,
/// `mouseup` repeats the value of its `mousedown`, and a `click` commits it.
/// Pressing another button resets the count of every other button.
#[derive(Debug, Clone, Default)]
pub struct ClickCounter {
    down: BTreeMap<PointerButton, u32>,
    count: BTreeMap<PointerButton, u32>,
}

impl ClickCounter {
    pub fn on_down(&mut self, button: PointerButton) -> u32 {
        let completed = self.count.get(&button).copied().unwrap_or(0);
        self.count.retain(|b, _| *b == button);
        self.down.clear();
        self.down.insert(button, completed);
        completed + 1
    }

    pub fn on_up(&self, button: PointerButton) -> u32 {
        self.down.get(&button).map(|c| c + 1).unwrap_or(0)
    }

    /// Commits a click. `None` if the button was not pressed in this cycle.
    pub fn on_click(&mut self, button: PointerButton) -> Option<u32> {
        let current = self.down.get(&button)? + 1;
        self.count.clear();
        self.count.insert(button, current);
        Some(current)
    }

    pub fn reset(&mut self) {
        self.count.clear();
    }
}
