//! Pointer device host
//!
//! Manages the singleton mouse and any number of touch or pen contacts.
//! Pointer-family events are fired per contact; mouse-family events come
//! from the shared virtual mouse. Touch contacts only move the mouse when
//! they are lifted, through the compatibility events browsers emit.
//!
//! # Event order
//!
//! A move of the mouse interleaves both families per phase:
//!
//! ```text
//! pointerout, pointerleave*, mouseout, mouseleave*,
//! pointerover, pointerenter*, mouseover, mouseenter*,
//! pointermove, mousemove
//! ```

mod buttons;
mod check;
mod device;

pub use buttons::{ButtonState, ClickCounter};
pub use check::{PointerEventsCheck, PointerEventsGuard};
pub use device::{MouseState, PointerDevice};

use super::keymap::{parse_pointer_keys, PointerButton, PointerKey, PointerKeyAction, PointerKind};
use super::{InputError, InputResult};
use crate::dom::{Document, NodeId};
use crate::event::{EventInit, EventType};
use crate::selection;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Viewport coordinates of a pointer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub client_x: f64,
    pub client_y: f64,
}

/// Caret hint: where in the target's text the pointer points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaretPosition {
    pub node: Option<NodeId>,
    pub offset: Option<usize>,
}

/// Where a pointer is. Two positions that compare equal mean no movement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerPosition {
    pub target: Option<NodeId>,
    pub coords: Option<Coords>,
    pub caret: Option<CaretPosition>,
}

impl PointerPosition {
    /// Position over `target`.
    pub fn at(target: NodeId) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    /// Points at character `offset` of the target's text.
    pub fn with_offset(mut self, offset: usize) -> Self {
        let node = self.caret.and_then(|c| c.node);
        self.caret = Some(CaretPosition {
            node,
            offset: Some(offset),
        });
        self
    }

    /// Points at `offset` inside `node`.
    pub fn with_caret(mut self, node: NodeId, offset: usize) -> Self {
        self.caret = Some(CaretPosition {
            node: Some(node),
            offset: Some(offset),
        });
        self
    }

    pub fn with_coords(mut self, client_x: f64, client_y: f64) -> Self {
        self.coords = Some(Coords { client_x, client_y });
        self
    }

    /// Fills unset fields from `previous`.
    ///
    /// The caret hint belongs to the previous target and is only kept when
    /// this position names neither a target nor a caret.
    pub fn or_previous(self, previous: &PointerPosition) -> PointerPosition {
        let caret = match (self.target, self.caret) {
            (None, None) => previous.caret,
            (_, caret) => caret,
        };
        PointerPosition {
            target: self.target.or(previous.target),
            coords: self.coords.or(previous.coords),
            caret,
        }
    }
}

/// One entry of a pointer gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerAction {
    /// Press and/or release keys given as descriptors, e.g. `[MouseLeft]`
    /// or `[TouchA>]`. Unset position fields keep the pointer's previous
    /// position.
    Keys {
        keys: String,
        position: PointerPosition,
    },
    /// Move a pointer, the mouse unless named.
    Move {
        pointer: Option<String>,
        position: PointerPosition,
    },
}

impl PointerAction {
    /// Moves the mouse onto `target`.
    pub fn move_to(target: NodeId) -> Self {
        Self::Move {
            pointer: None,
            position: PointerPosition::at(target),
        }
    }

    /// Presses and releases `keys` on `target`.
    pub fn keys_on(keys: &str, target: NodeId) -> Self {
        Self::Keys {
            keys: keys.to_string(),
            position: PointerPosition::at(target),
        }
    }
}

/// A single step of a pointer gesture, between two of which the session
/// may wait.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerStep {
    Key {
        action: PointerKeyAction,
        position: PointerPosition,
    },
    Move {
        pointer: String,
        position: PointerPosition,
    },
}

impl PointerAction {
    /// Splits the action into steps.
    pub fn steps(&self) -> InputResult<Vec<PointerStep>> {
        match self {
            Self::Keys { keys, position } => Ok(parse_pointer_keys(keys)?
                .into_iter()
                .map(|action| PointerStep::Key {
                    action,
                    position: position.clone(),
                })
                .collect()),
            Self::Move { pointer, position } => Ok(vec![PointerStep::Move {
                pointer: pointer.clone().unwrap_or_else(|| MOUSE.to_string()),
                position: position.clone(),
            }]),
        }
    }
}

const MOUSE: &str = "mouse";

/// Name under which the device of `key` is registered.
pub fn pointer_name(key: &PointerKey) -> String {
    match key.kind {
        PointerKind::Mouse => MOUSE.to_string(),
        PointerKind::Pen => "pen".to_string(),
        PointerKind::Touch => key.name.clone(),
    }
}

/// All pointer devices of a session
#[derive(Debug, Clone)]
pub struct PointerHost {
    devices: HashMap<String, PointerDevice>,
    next_id: u32,
    /// Buttons as seen by pointer-family events
    buttons: ButtonState,
    /// Held keys per device kind
    pressed: HashMap<PointerKind, Vec<PointerKey>>,
    mouse: MouseState,
}

impl Default for PointerHost {
    fn default() -> Self {
        let mut devices = HashMap::new();
        devices.insert(MOUSE.to_string(), PointerDevice::new(1, PointerKind::Mouse, true));
        Self {
            devices,
            next_id: 2,
            buttons: ButtonState::default(),
            pressed: HashMap::new(),
            mouse: MouseState::default(),
        }
    }
}

impl PointerHost {
    /// Device registered under `name`.
    pub fn device(&self, name: &str) -> InputResult<&PointerDevice> {
        self.devices.get(name).ok_or_else(|| InputError::UnknownPointer {
            name: name.to_string(),
        })
    }

    fn device_mut(&mut self, name: &str) -> InputResult<&mut PointerDevice> {
        self.devices
            .get_mut(name)
            .ok_or_else(|| InputError::UnknownPointer {
                name: name.to_string(),
            })
    }

    pub fn mouse(&self) -> &MouseState {
        &self.mouse
    }

    /// Returns whether `key` is held.
    pub fn is_key_pressed(&self, key: &PointerKey) -> bool {
        self.pressed
            .get(&key.kind)
            .map(|keys| keys.iter().any(|k| k.name == key.name))
            .unwrap_or(false)
    }

    /// Last position of a pointer, if it exists.
    pub fn previous_position(&self, name: &str) -> Option<&PointerPosition> {
        self.devices.get(name).map(|d| &d.position)
    }

    /// Starts a new click cycle.
    pub fn reset_click_count(&mut self) {
        self.mouse.clicks.reset();
    }

    fn new_device(&mut self, name: &str, kind: PointerKind) {
        let active_same_kind = |d: &PointerDevice| d.kind == kind && !d.is_cancelled;
        let is_primary = kind != PointerKind::Touch || !self.devices.values().any(active_same_kind);
        if !is_primary {
            for device in self.devices.values_mut() {
                if active_same_kind(device) {
                    device.is_multitouch = true;
                }
            }
        }
        let device = PointerDevice::new(self.next_id, kind, is_primary);
        self.next_id += 1;
        self.devices.insert(name.to_string(), device);
    }

    fn add_pressed(&mut self, key: &PointerKey) {
        self.pressed.entry(key.kind).or_default().push(key.clone());
    }

    /// Removes `key` and returns how many keys of its kind remain held.
    fn remove_pressed(&mut self, key: &PointerKey) -> usize {
        let keys = self.pressed.entry(key.kind).or_default();
        keys.retain(|k| k.name != key.name);
        keys.len()
    }

    fn pointer_init(&self, name: &str, button: i16) -> InputResult<EventInit> {
        Ok(self.device(name)?.event_init(button, self.buttons.bits()))
    }
}

/// Elements left, elements entered (outermost first) and common ancestors
/// (innermost first) when moving from `from` to `to`.
fn tree_diff(
    doc: &Document,
    from: Option<NodeId>,
    to: Option<NodeId>,
) -> (Vec<NodeId>, Vec<NodeId>, Vec<NodeId>) {
    let chain = |node: Option<NodeId>| -> Vec<NodeId> {
        node.map(|n| {
            doc.inclusive_ancestors(n)
                .into_iter()
                .filter(|a| doc.is_element(*a))
                .collect()
        })
        .unwrap_or_default()
    };
    let a = chain(from);
    let b = chain(to);
    let shared = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let leave = a[..a.len() - shared].to_vec();
    let mut enter = b[..b.len() - shared].to_vec();
    enter.reverse();
    let common = b[b.len() - shared..].to_vec();
    (leave, enter, common)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Pointer,
    Mouse,
}

impl Family {
    fn types(self) -> [EventType; 5] {
        match self {
            Family::Pointer => [
                EventType::PointerOut,
                EventType::PointerLeave,
                EventType::PointerOver,
                EventType::PointerEnter,
                EventType::PointerMove,
            ],
            Family::Mouse => [
                EventType::MouseOut,
                EventType::MouseLeave,
                EventType::MouseOver,
                EventType::MouseEnter,
                EventType::MouseMove,
            ],
        }
    }
}

/// A pending move, split into its leave, enter and move phases.
#[derive(Debug, Clone)]
struct Transition {
    family: Family,
    from: NodeId,
    to: NodeId,
    leave: Vec<NodeId>,
    enter: Vec<NodeId>,
    init: EventInit,
}

impl Session {
    /// Pointer devices of this session
    pub fn pointer(&self) -> &PointerHost {
        &self.pointer
    }

    /// Runs one pointer step, filling the position from the pointer's last
    /// known position.
    pub fn pointer_step(&mut self, doc: &mut Document, step: &PointerStep) -> InputResult<()> {
        self.pointer_guard.next_trigger();
        match step {
            PointerStep::Key { action, position } => {
                let name = pointer_name(&action.key);
                let position = self.resolve_position(&name, position);
                if self.pointer.is_key_pressed(&action.key) || action.release_previous {
                    self.pointer_release(doc, &action.key, position.clone())?;
                }
                if !action.release_previous {
                    self.pointer_press(doc, &action.key, position.clone())?;
                    if action.release_self {
                        self.pointer_release(doc, &action.key, position)?;
                    }
                }
                Ok(())
            }
            PointerStep::Move { pointer, position } => {
                let position = self.resolve_position(pointer, position);
                self.pointer_move(doc, pointer, position)
            }
        }
    }

    fn resolve_position(&self, name: &str, position: &PointerPosition) -> PointerPosition {
        match self.pointer.previous_position(name) {
            Some(previous) => position.clone().or_previous(previous),
            None => position.clone().or_previous(&self.pointer.mouse.position),
        }
    }

    /// Presses a pointer key at `position`.
    pub fn pointer_press(
        &mut self,
        doc: &mut Document,
        key: &PointerKey,
        position: PointerPosition,
    ) -> InputResult<()> {
        let name = pointer_name(key);
        debug!(key = %key.name, pointer = %name, "pointer press");
        let fresh = match key.kind {
            PointerKind::Touch => true,
            PointerKind::Pen => self
                .pointer
                .devices
                .get(&name)
                .map(|d| d.is_cancelled)
                .unwrap_or(true),
            PointerKind::Mouse => false,
        };
        if fresh {
            self.pointer.new_device(&name, key.kind);
            self.pointer_enter_new(doc, &name, position.clone())?;
        }
        self.pointer.device_mut(&name)?.position = position.clone();
        if key.kind != PointerKind::Touch {
            self.pointer.mouse.position = position;
        }

        self.pointer.add_pressed(key);
        self.pointer.buttons.down(key);
        self.pointer_down(doc, &name, key.button)?;

        if key.kind != PointerKind::Touch && !self.pointer.device(&name)?.is_prevented {
            self.mouse_down(doc, key, &name)?;
        }
        Ok(())
    }

    /// Releases a pointer key at `position`. Releasing a key that is not
    /// held does nothing.
    pub fn pointer_release(
        &mut self,
        doc: &mut Document,
        key: &PointerKey,
        position: PointerPosition,
    ) -> InputResult<()> {
        if !self.pointer.is_key_pressed(key) {
            trace!(key = %key.name, "release of pointer key that is not pressed");
            return Ok(());
        }
        let name = pointer_name(key);
        debug!(key = %key.name, pointer = %name, "pointer release");
        self.pointer.device(&name)?;

        let remaining = self.pointer.remove_pressed(key);
        self.pointer.buttons.up(key);
        self.pointer.device_mut(&name)?.position = position.clone();
        if key.kind != PointerKind::Touch {
            self.pointer.mouse.position = position.clone();
        }

        let prevented = self.pointer.device(&name)?.is_prevented;
        if remaining == 0 {
            self.pointer_up(doc, &name, key.button)?;
        }
        if key.kind == PointerKind::Touch {
            self.pointer_lift(doc, &name)?;
        }

        let multitouch = self.pointer.device(&name)?.is_multitouch;
        if !prevented && !multitouch {
            if key.kind == PointerKind::Touch {
                self.move_mouse(doc, position.clone())?;
                self.mouse_down(doc, key, &name)?;
            }
            self.move_mouse(doc, position)?;
            self.mouse_up(doc, key, &name)?;
        }
        Ok(())
    }

    /// Moves the named pointer. Unless it is a touch contact the mouse
    /// follows.
    pub fn pointer_move(
        &mut self,
        doc: &mut Document,
        name: &str,
        position: PointerPosition,
    ) -> InputResult<()> {
        let device = self.pointer.device(name)?.clone();
        if device.is_cancelled {
            trace!(pointer = %name, "move of lifted contact ignored");
            return Ok(());
        }
        let pointer_move = self.plan_pointer_move(doc, name, position.clone())?;
        let mouse_move = if device.kind == PointerKind::Touch
            || (device.is_prevented && device.is_down)
        {
            None
        } else {
            self.plan_mouse_move(doc, position)
        };

        for transition in [&pointer_move, &mouse_move].into_iter().flatten() {
            self.run_leave(doc, transition)?;
        }
        for transition in [&pointer_move, &mouse_move].into_iter().flatten() {
            self.run_enter(doc, transition)?;
        }
        for transition in [&pointer_move, &mouse_move].into_iter().flatten() {
            self.run_move(doc, transition)?;
        }
        Ok(())
    }

    fn move_mouse(&mut self, doc: &mut Document, position: PointerPosition) -> InputResult<()> {
        if let Some(transition) = self.plan_mouse_move(doc, position) {
            self.run_leave(doc, &transition)?;
            self.run_enter(doc, &transition)?;
            self.run_move(doc, &transition)?;
        }
        Ok(())
    }

    fn plan_pointer_move(
        &mut self,
        doc: &Document,
        name: &str,
        position: PointerPosition,
    ) -> InputResult<Option<Transition>> {
        let device = self.pointer.device_mut(name)?;
        let from = device.target(doc);
        if device.position == position {
            return Ok(None);
        }
        device.position = position;
        let to = device.target(doc);
        let init = self.pointer.pointer_init(name, -1)?;
        let (leave, enter, _) = tree_diff(doc, Some(from), Some(to));
        Ok(Some(Transition {
            family: Family::Pointer,
            from,
            to,
            leave,
            enter,
            init,
        }))
    }

    fn plan_mouse_move(&mut self, doc: &Document, position: PointerPosition) -> Option<Transition> {
        let mouse = &mut self.pointer.mouse;
        let from = mouse.target(doc);
        if mouse.position == position {
            return None;
        }
        mouse.position = position;
        let to = mouse.target(doc);
        let init = mouse.event_init(None, 0, None);
        let (leave, enter, _) = tree_diff(doc, Some(from), Some(to));
        Some(Transition {
            family: Family::Mouse,
            from,
            to,
            leave,
            enter,
            init,
        })
    }

    fn run_leave(&mut self, doc: &mut Document, t: &Transition) -> InputResult<()> {
        if t.from == t.to {
            return Ok(());
        }
        if t.family == Family::Pointer && !self.has_pointer_events(doc, t.from) {
            return Ok(());
        }
        let [out, leave, ..] = t.family.types();
        self.dispatch(doc, t.from, out, t.init.clone())?;
        for node in &t.leave {
            self.dispatch(doc, *node, leave, t.init.clone())?;
        }
        Ok(())
    }

    fn run_enter(&mut self, doc: &mut Document, t: &Transition) -> InputResult<()> {
        if t.family == Family::Pointer {
            self.assert_pointer_events(doc, t.to)?;
        }
        if t.from == t.to {
            return Ok(());
        }
        let [_, _, over, enter, _] = t.family.types();
        self.dispatch(doc, t.to, over, t.init.clone())?;
        for node in &t.enter {
            self.dispatch(doc, *node, enter, t.init.clone())?;
        }
        Ok(())
    }

    fn run_move(&mut self, doc: &mut Document, t: &Transition) -> InputResult<()> {
        let [.., moved] = t.family.types();
        self.dispatch(doc, t.to, moved, t.init.clone())?;
        if t.family == Family::Mouse {
            if let Some(gesture) = self.pointer.mouse.selecting.clone() {
                let caret = self.pointer.mouse.position.caret.unwrap_or_default();
                let target = self.pointer.mouse.target(doc);
                selection::modify_selection_per_mouse(doc, &gesture, target, caret)?;
            }
        }
        Ok(())
    }

    /// `pointerover`/`pointerenter` for a contact that just appeared.
    fn pointer_enter_new(
        &mut self,
        doc: &mut Document,
        name: &str,
        position: PointerPosition,
    ) -> InputResult<()> {
        let device = self.pointer.device_mut(name)?;
        device.position = position;
        let target = device.target(doc);
        let init = self.pointer.pointer_init(name, -1)?;
        let (_, enter, _) = tree_diff(doc, None, Some(target));
        self.assert_pointer_events(doc, target)?;
        self.dispatch(doc, target, EventType::PointerOver, init.clone())?;
        for node in enter {
            self.dispatch(doc, node, EventType::PointerEnter, init.clone())?;
        }
        Ok(())
    }

    fn pointer_down(
        &mut self,
        doc: &mut Document,
        name: &str,
        button: PointerButton,
    ) -> InputResult<()> {
        let device = self.pointer.device(name)?;
        if device.is_down {
            return Ok(());
        }
        let target = device.target(doc);
        self.assert_pointer_events(doc, target)?;
        self.pointer.device_mut(name)?.is_down = true;
        let init = self.pointer.pointer_init(name, button.event_button())?;
        let unprevented = self.dispatch(doc, target, EventType::PointerDown, init)?;
        self.pointer.device_mut(name)?.is_prevented = !unprevented;
        Ok(())
    }

    fn pointer_up(
        &mut self,
        doc: &mut Document,
        name: &str,
        button: PointerButton,
    ) -> InputResult<()> {
        let device = self.pointer.device(name)?;
        if !device.is_down {
            return Ok(());
        }
        let target = device.target(doc);
        self.assert_pointer_events(doc, target)?;
        {
            let device = self.pointer.device_mut(name)?;
            device.is_prevented = false;
            device.is_down = false;
        }
        let init = self.pointer.pointer_init(name, button.event_button())?;
        self.dispatch(doc, target, EventType::PointerUp, init)?;
        Ok(())
    }

    /// A touch contact leaves the surface.
    fn pointer_lift(&mut self, doc: &mut Document, name: &str) -> InputResult<()> {
        let target = self.pointer.device(name)?.target(doc);
        let init = self.pointer.pointer_init(name, -1)?;
        let (leave, _, _) = tree_diff(doc, Some(target), None);
        if self.has_pointer_events(doc, target) {
            self.dispatch(doc, target, EventType::PointerOut, init.clone())?;
            for node in leave {
                self.dispatch(doc, node, EventType::PointerLeave, init.clone())?;
            }
        }
        self.pointer.device_mut(name)?.is_cancelled = true;
        Ok(())
    }

    fn mouse_down(&mut self, doc: &mut Document, key: &PointerKey, name: &str) -> InputResult<()> {
        let Some(button) = self.pointer.mouse.buttons.down(key) else {
            return Ok(());
        };
        let target = self.pointer.mouse.target(doc);
        self.pointer.mouse.button_down_target.insert(button, target);
        let disabled = doc.is_disabled(target);
        let detail = self.pointer.mouse.clicks.on_down(button);
        let init = self.pointer.mouse.event_init(Some(button), detail, None);

        if disabled || self.dispatch(doc, target, EventType::MouseDown, init)? {
            let caret = self.pointer.mouse.position.caret.unwrap_or_default();
            self.pointer.mouse.selecting =
                selection::set_selection_per_mouse_down(doc, target, caret, detail)?;
            self.focus_element(doc, target)?;
        }

        if !disabled && button.event_button() == 2 {
            let device = self.pointer.device(name)?.clone();
            let init = self.pointer.mouse.event_init(Some(button), 0, Some(&device));
            self.dispatch(doc, target, EventType::ContextMenu, init)?;
        }
        Ok(())
    }

    fn mouse_up(&mut self, doc: &mut Document, key: &PointerKey, name: &str) -> InputResult<()> {
        let Some(button) = self.pointer.mouse.buttons.up(key) else {
            return Ok(());
        };
        let target = self.pointer.mouse.target(doc);
        let down_target = self.pointer.mouse.button_down_target.remove(&button);
        if doc.is_disabled(target) {
            return Ok(());
        }

        let detail = self.pointer.mouse.clicks.on_up(button);
        let init = self.pointer.mouse.event_init(Some(button), detail, None);
        self.dispatch(doc, target, EventType::MouseUp, init)?;
        self.pointer.mouse.selecting = None;

        let Some(down_target) = down_target else {
            return Ok(());
        };
        let (_, _, common) = tree_diff(doc, Some(down_target), Some(target));
        let Some(click_target) = common.first().copied() else {
            return Ok(());
        };
        let Some(detail) = self.pointer.mouse.clicks.on_click(button) else {
            return Ok(());
        };
        let device = self.pointer.device(name)?.clone();
        let init = self.pointer.mouse.event_init(Some(button), detail, Some(&device));
        if button == PointerButton::Primary {
            self.dispatch(doc, click_target, EventType::Click, init.clone())?;
            if detail == 2 {
                self.dispatch(doc, click_target, EventType::DblClick, init)?;
            }
        } else {
            self.dispatch(doc, click_target, EventType::AuxClick, init)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keymap::pointer_key;

    fn names(doc: &Document) -> Vec<String> {
        doc.event_log()
            .iter()
            .map(|e| format!("{}@{}", e.event_type, doc.describe(e.target)))
            .collect()
    }

    #[test]
    fn test_caret_hint_stays_with_its_target() {
        let doc = Document::from_markup("<p id='a'>text</p><p id='b'>x</p>").unwrap();
        let a = doc.query("#a").unwrap();
        let b = doc.query("#b").unwrap();
        let previous = PointerPosition::at(a).with_offset(3);

        let unset = PointerPosition::default().or_previous(&previous);
        assert_eq!(unset, previous);

        let retargeted = PointerPosition::at(b).or_previous(&previous);
        assert_eq!(retargeted.target, Some(b));
        assert_eq!(retargeted.caret, None);

        let own = PointerPosition::at(b).with_offset(1).or_previous(&previous);
        assert_eq!(own.caret.and_then(|c| c.offset), Some(1));
    }

    #[test]
    fn test_tree_diff() {
        let doc = Document::from_markup(
            "<div id='a'><span id='b'></span></div><div id='c'><i id='d'></i></div>",
        )
        .unwrap();
        let b = doc.query("#b").unwrap();
        let d = doc.query("#d").unwrap();
        let (leave, enter, common) = tree_diff(&doc, Some(b), Some(d));
        assert_eq!(leave, vec![b, doc.query("#a").unwrap()]);
        assert_eq!(enter, vec![doc.query("#c").unwrap(), d]);
        assert_eq!(common, vec![doc.body(), doc.document_element()]);
    }

    #[test]
    fn test_move_interleaves_families() {
        let mut doc = Document::from_markup("<p id='a'>x</p><p id='b'>y</p>").unwrap();
        let a = doc.query("#a").unwrap();
        let b = doc.query("#b").unwrap();
        let mut session = Session::default();
        session.pointer_move(&mut doc, "mouse", PointerPosition::at(a)).unwrap();
        doc.enable_event_log();
        session.pointer_move(&mut doc, "mouse", PointerPosition::at(b)).unwrap();
        assert_eq!(
            names(&doc),
            vec![
                "pointerout@p#a",
                "pointerleave@p#a",
                "mouseout@p#a",
                "mouseleave@p#a",
                "pointerover@p#b",
                "pointerenter@p#b",
                "mouseover@p#b",
                "mouseenter@p#b",
                "pointermove@p#b",
                "mousemove@p#b",
            ]
        );
    }

    #[test]
    fn test_move_to_same_position_is_noop() {
        let mut doc = Document::from_markup("<p>x</p>").unwrap();
        let p = doc.query("p").unwrap();
        let mut session = Session::default();
        session.pointer_move(&mut doc, "mouse", PointerPosition::at(p)).unwrap();
        doc.enable_event_log();
        session.pointer_move(&mut doc, "mouse", PointerPosition::at(p)).unwrap();
        assert!(doc.event_log().is_empty());
    }

    #[test]
    fn test_unknown_pointer() {
        let mut doc = Document::new();
        let mut session = Session::default();
        let body = doc.body();
        let err = session
            .pointer_move(&mut doc, "TouchA", PointerPosition::at(body))
            .unwrap_err();
        assert_eq!(
            err,
            InputError::UnknownPointer {
                name: "TouchA".to_string()
            }
        );
    }

    #[test]
    fn test_second_touch_makes_first_multitouch() {
        let mut doc = Document::from_markup("<button>b</button>").unwrap();
        let button = doc.query("button").unwrap();
        let mut session = Session::default();
        let a = pointer_key("TouchA").unwrap();
        let b = pointer_key("TouchB").unwrap();
        session.pointer_press(&mut doc, a, PointerPosition::at(button)).unwrap();
        session.pointer_press(&mut doc, b, PointerPosition::at(button)).unwrap();
        let first = session.pointer().device("TouchA").unwrap();
        let second = session.pointer().device("TouchB").unwrap();
        assert!(first.is_primary && first.is_multitouch);
        assert!(!second.is_primary);
        assert_ne!(first.id, second.id);
        assert!(first.id >= 2 && second.id >= 2);
    }

    #[test]
    fn test_touch_tap_emits_compatibility_mouse_events() {
        let mut doc = Document::from_markup("<button>b</button>").unwrap();
        let button = doc.query("button").unwrap();
        let mut session = Session::default();
        doc.enable_event_log();
        let touch = pointer_key("TouchA").unwrap();
        session.pointer_press(&mut doc, touch, PointerPosition::at(button)).unwrap();
        session.pointer_release(&mut doc, touch, PointerPosition::at(button)).unwrap();
        let types: Vec<EventType> = doc.event_log().iter().map(|e| e.event_type).collect();
        let pointerup = types.iter().position(|t| *t == EventType::PointerUp).unwrap();
        let mousedown = types.iter().position(|t| *t == EventType::MouseDown).unwrap();
        let click = types.iter().position(|t| *t == EventType::Click).unwrap();
        assert!(pointerup < mousedown && mousedown < click);
        assert!(session.pointer().device("TouchA").unwrap().is_cancelled);
    }

    #[test]
    fn test_prevented_pointerdown_suppresses_mouse_events() {
        let mut doc = Document::from_markup("<button>b</button>").unwrap();
        let button = doc.query("button").unwrap();
        doc.add_event_listener(button, EventType::PointerDown, |_, e| e.prevent_default());
        doc.enable_event_log();
        let mut session = Session::default();
        let left = pointer_key("MouseLeft").unwrap();
        session.pointer_press(&mut doc, left, PointerPosition::at(button)).unwrap();
        session.pointer_release(&mut doc, left, PointerPosition::at(button)).unwrap();
        let types: Vec<EventType> = doc.event_log().iter().map(|e| e.event_type).collect();
        assert!(types.contains(&EventType::PointerUp));
        assert!(!types.contains(&EventType::MouseDown));
        assert!(!types.contains(&EventType::Click));
    }
}
