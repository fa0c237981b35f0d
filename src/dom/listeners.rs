//! Event listener registry and capture/bubble propagation.

use super::{Document, NodeId};
use crate::event::{Event, EventType};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Listener callback. Listeners may mutate the document and the event.
pub type Listener = Rc<dyn Fn(&mut Document, &mut Event)>;

/// Handle returned when registering a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Clone)]
pub(crate) struct ListenerEntry {
    id: ListenerId,
    event_type: EventType,
    capture: bool,
    callback: Listener,
}

impl fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .field("capture", &self.capture)
            .finish()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: HashMap<NodeId, Vec<ListenerEntry>>,
    next_id: u64,
}

impl Registry {
    fn add(&mut self, node: NodeId, event_type: EventType, capture: bool, callback: Listener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.entry(node).or_default().push(ListenerEntry {
            id,
            event_type,
            capture,
            callback,
        });
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        for list in self.entries.values_mut() {
            if let Some(pos) = list.iter().position(|e| e.id == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    fn matching(&self, node: NodeId, event_type: EventType, capture: bool) -> Vec<ListenerEntry> {
        self.entries
            .get(&node)
            .map(|list| {
                list.iter()
                    .filter(|e| e.event_type == event_type && e.capture == capture)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn has_any(&self, node: NodeId, event_type: EventType) -> bool {
        self.entries
            .get(&node)
            .map(|list| list.iter().any(|e| e.event_type == event_type))
            .unwrap_or(false)
    }
}

impl Document {
    /// Registers a bubble-phase listener on `node`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ki_user_event::dom::Document;
    /// use ki_user_event::event::EventType;
    ///
    /// let mut doc = Document::from_markup("<button>Go</button>").unwrap();
    /// let button = doc.query("button").unwrap();
    /// doc.add_event_listener(button, EventType::Click, |_doc, event| {
    ///     event.prevent_default();
    /// });
    /// ```
    pub fn add_event_listener<F>(&mut self, node: NodeId, event_type: EventType, callback: F) -> ListenerId
    where
        F: Fn(&mut Document, &mut Event) + 'static,
    {
        self.listeners.add(node, event_type, false, Rc::new(callback))
    }

    /// Registers a capture-phase listener on `node`.
    pub fn add_capture_listener<F>(&mut self, node: NodeId, event_type: EventType, callback: F) -> ListenerId
    where
        F: Fn(&mut Document, &mut Event) + 'static,
    {
        self.listeners.add(node, event_type, true, Rc::new(callback))
    }

    /// Removes a previously registered listener.
    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Returns whether any listener for `event_type` is registered on `node`.
    pub fn has_listener(&self, node: NodeId, event_type: EventType) -> bool {
        self.listeners.has_any(node, event_type)
    }

    /// Propagates `event` through capture, target and bubble phases.
    ///
    /// Returns `true` when the default action was not prevented.
    pub(crate) fn propagate(&mut self, event: &mut Event) -> bool {
        let log_index = self.log_event(event);

        let path = self.inclusive_ancestors(event.target);
        let target = event.target;

        // capture: root first, target excluded
        for node in path.iter().skip(1).rev() {
            if !self.invoke(*node, event, true) {
                break;
            }
        }

        if !event.propagation_stopped() {
            let keep_going = self.invoke(target, event, true);
            if keep_going {
                self.invoke(target, event, false);
            }
        }

        if event.bubbles {
            for node in path.iter().skip(1) {
                if event.propagation_stopped() || !self.invoke(*node, event, false) {
                    break;
                }
            }
        }

        event.current_target = None;
        if let Some(index) = log_index {
            self.update_logged_event(index, event);
        }
        !event.default_prevented
    }

    /// Runs listeners of one phase on one node. Returns `false` once
    /// propagation was stopped.
    fn invoke(&mut self, node: NodeId, event: &mut Event, capture: bool) -> bool {
        if event.propagation_stopped() {
            return false;
        }
        event.current_target = Some(node);
        for entry in self.listeners.matching(node, event.event_type, capture) {
            (entry.callback)(self, event);
            if event.immediate_propagation_stopped() {
                break;
            }
        }
        !event.propagation_stopped()
    }
}
