//! Event dispatch
//!
//! Every simulated event goes through [`Session::dispatch`]. The pipeline
//! merges the keyboard's modifier state into pointer, mouse and keyboard
//! events, asks the behavior table for a default action, propagates the
//! event through the document's listeners and finally runs the default
//! action unless a listener cancelled the event.
//!
//! # Submodules
//!
//! - [`types`] - Event types, init fields and event objects
//! - [`behavior`] - Default actions keyed by event type
//! - [`focus`] - Focus transfer with `blur`/`focus` sequences

pub mod behavior;
pub mod focus;
pub mod types;

pub use behavior::{BehaviorPlugin, BehaviorTable, DefaultAction};
pub use types::{DeleteDirection, EditType, Event, EventFamily, EventInit, EventType};

use crate::dom::{Document, NodeId};
use crate::input::InputResult;
use crate::session::Session;
use std::rc::Rc;
use tracing::trace;

/// Wraps every propagation, e.g. to flush a framework's pending updates
/// around listener execution. The wrapper must call the closure exactly
/// once.
pub type EventWrapper = Rc<dyn Fn(&mut dyn FnMut())>;

impl Session {
    /// Dispatches an event and runs its default action.
    ///
    /// Returns `true` when no listener prevented the default action.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ki_user_event::dom::Document;
    /// use ki_user_event::event::{EventInit, EventType};
    /// use ki_user_event::Session;
    ///
    /// let mut doc = Document::from_markup("<input type='checkbox'>").unwrap();
    /// let checkbox = doc.query("input").unwrap();
    /// let mut session = Session::default();
    /// session
    ///     .dispatch(&mut doc, checkbox, EventType::Click, EventInit::default())
    ///     .unwrap();
    /// assert!(doc.checked(checkbox));
    /// ```
    pub fn dispatch(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        event_type: EventType,
        init: EventInit,
    ) -> InputResult<bool> {
        self.dispatch_with(doc, target, event_type, init, false)
    }

    /// Like [`Session::dispatch`], optionally skipping the default action.
    pub fn dispatch_with(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        event_type: EventType,
        init: EventInit,
        suppress_default: bool,
    ) -> InputResult<bool> {
        self.dispatch_event(doc, target, event_type, init, suppress_default)
            .map(|event| !event.default_prevented)
    }

    /// Dispatches and returns the event as listeners left it.
    pub(crate) fn dispatch_event(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        event_type: EventType,
        mut init: EventInit,
        suppress_default: bool,
    ) -> InputResult<Event> {
        if event_type.family().carries_modifiers() {
            init.modifiers = init.modifiers.union(self.keyboard.modifiers());
        }
        let mut event = Event::with_init(event_type, target, init);

        let plugin = if suppress_default {
            None
        } else {
            self.behaviors.get(event_type)
        };
        let action = match plugin {
            Some(plugin) => plugin(&event, self, doc)?,
            None => None,
        };

        trace!(
            event = %event_type,
            element = %doc.describe(target),
            default_action = action.is_some(),
            "dispatch"
        );
        let unprevented = match self.event_wrapper.clone() {
            Some(wrapper) => {
                let mut unprevented = true;
                wrapper(&mut || unprevented = doc.propagate(&mut event));
                unprevented
            }
            None => doc.propagate(&mut event),
        };

        if let Some(action) = action {
            if unprevented {
                (action.run)(self, doc)?;
            } else if let Some(revert) = action.revert {
                trace!(event = %event_type, "default action reverted");
                revert(self, doc)?;
            }
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keyboard::Modifier;
    use std::cell::Cell;

    #[test]
    fn test_modifiers_are_merged_into_mouse_events() {
        let mut doc = Document::new();
        doc.enable_event_log();
        let body = doc.body();
        let mut session = Session::default();
        let shift = session.key_map().resolve_key("Shift");
        session.keyboard_press(&mut doc, &shift).unwrap();
        session
            .dispatch(&mut doc, body, EventType::Click, EventInit::default())
            .unwrap();
        session
            .dispatch(&mut doc, body, EventType::Change, EventInit::default())
            .unwrap();

        let log = doc.event_log();
        let click = log.iter().find(|e| e.event_type == EventType::Click).unwrap();
        assert!(click.shift_key());
        let change = log.iter().find(|e| e.event_type == EventType::Change).unwrap();
        assert!(!change.init.modifiers.get(Modifier::Shift));
    }

    #[test]
    fn test_prevented_event_skips_default_action() {
        let mut doc = Document::from_markup("<input type='checkbox'>").unwrap();
        let checkbox = doc.query("input").unwrap();
        doc.add_event_listener(checkbox, EventType::Click, |_, e| e.prevent_default());
        let mut session = Session::default();
        let unprevented = session
            .dispatch(&mut doc, checkbox, EventType::Click, EventInit::default())
            .unwrap();
        assert!(!unprevented);
        assert!(!doc.checked(checkbox));
    }

    #[test]
    fn test_suppressed_default_action() {
        let mut doc = Document::from_markup("<input type='checkbox'>").unwrap();
        let checkbox = doc.query("input").unwrap();
        let mut session = Session::default();
        session
            .dispatch_with(&mut doc, checkbox, EventType::Click, EventInit::default(), true)
            .unwrap();
        assert!(!doc.checked(checkbox));
    }

    #[test]
    fn test_event_wrapper_runs_once_per_event() {
        let mut doc = Document::new();
        let body = doc.body();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut session = Session::default().with_event_wrapper(Rc::new(move |run| {
            counter.set(counter.get() + 1);
            run();
        }));
        session
            .dispatch(&mut doc, body, EventType::Click, EventInit::default())
            .unwrap();
        session
            .dispatch(&mut doc, body, EventType::KeyDown, EventInit::default())
            .unwrap();
        assert_eq!(calls.get(), 2);
    }
}
