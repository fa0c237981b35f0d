//! Default actions
//!
//! A [`BehaviorTable`] maps event types to plugins. A plugin inspects the
//! event before it is dispatched and returns the [`DefaultAction`] the
//! browser would perform. Some actions change state before listeners run
//! (checkbox toggling) and carry a revert for the case that a listener
//! cancels the event.

mod click;
mod clipboard;
mod keyboard;

use super::{Event, EventType};
use crate::dom::Document;
use crate::input::InputResult;
use crate::session::Session;
use std::collections::HashMap;
use std::fmt;

/// Deferred mutation run after dispatch.
pub type ActionFn = Box<dyn FnOnce(&mut Session, &mut Document) -> InputResult<()>>;

/// Computes the default action of an event before it is dispatched.
pub type BehaviorPlugin =
    fn(&Event, &mut Session, &mut Document) -> InputResult<Option<DefaultAction>>;

/// What happens after an event unless a listener prevents it.
pub struct DefaultAction {
    pub(crate) run: ActionFn,
    pub(crate) revert: Option<ActionFn>,
}

impl DefaultAction {
    pub fn new<F>(run: F) -> Self
    where
        F: FnOnce(&mut Session, &mut Document) -> InputResult<()> + 'static,
    {
        Self {
            run: Box::new(run),
            revert: None,
        }
    }

    /// Undo applied when the event was cancelled.
    pub fn with_revert<F>(mut self, revert: F) -> Self
    where
        F: FnOnce(&mut Session, &mut Document) -> InputResult<()> + 'static,
    {
        self.revert = Some(Box::new(revert));
        self
    }
}

impl fmt::Debug for DefaultAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultAction")
            .field("revert", &self.revert.is_some())
            .finish()
    }
}

/// Plugins keyed by event type.
#[derive(Clone)]
pub struct BehaviorTable {
    plugins: HashMap<EventType, BehaviorPlugin>,
}

impl Default for BehaviorTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.register(EventType::Click, click::click);
        table.register(EventType::Submit, click::submit);
        table.register(EventType::Reset, click::reset);
        table.register(EventType::KeyDown, keyboard::keydown);
        table.register(EventType::KeyPress, keyboard::keypress);
        table.register(EventType::KeyUp, keyboard::keyup);
        table.register(EventType::Cut, clipboard::cut);
        table.register(EventType::Paste, clipboard::paste);
        table
    }
}

impl BehaviorTable {
    /// A table without any default actions.
    pub fn empty() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    /// Registers `plugin`, replacing a previous one for the same type.
    pub fn register(&mut self, event_type: EventType, plugin: BehaviorPlugin) {
        self.plugins.insert(event_type, plugin);
    }

    pub fn remove(&mut self, event_type: EventType) -> Option<BehaviorPlugin> {
        self.plugins.remove(&event_type)
    }

    pub fn get(&self, event_type: EventType) -> Option<BehaviorPlugin> {
        self.plugins.get(&event_type).copied()
    }
}

impl fmt::Debug for BehaviorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&str> = self.plugins.keys().map(|t| t.as_str()).collect();
        types.sort_unstable();
        f.debug_struct("BehaviorTable").field("types", &types).finish()
    }
}
