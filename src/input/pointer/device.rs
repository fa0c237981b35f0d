//! Pointer contacts and the shared virtual mouse.

use super::buttons::{ButtonState, ClickCounter};
use super::PointerPosition;
use crate::dom::{Document, NodeId};
use crate::event::EventInit;
use crate::input::keymap::{PointerButton, PointerKind};
use crate::selection::SelectionGesture;
use std::collections::BTreeMap;

/// One contact: the mouse, a pen or one finger.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerDevice {
    pub id: u32,
    pub kind: PointerKind,
    pub is_primary: bool,
    /// Another contact of the same kind joined while this one was active
    pub is_multitouch: bool,
    /// The contact was lifted and takes no further part
    pub is_cancelled: bool,
    pub is_down: bool,
    /// `pointerdown` was cancelled
    pub is_prevented: bool,
    pub position: PointerPosition,
}

impl PointerDevice {
    pub(super) fn new(id: u32, kind: PointerKind, is_primary: bool) -> Self {
        Self {
            id,
            kind,
            is_primary,
            is_multitouch: false,
            is_cancelled: false,
            is_down: false,
            is_prevented: false,
            position: PointerPosition::default(),
        }
    }

    pub fn target(&self, doc: &Document) -> NodeId {
        self.position.target.unwrap_or_else(|| doc.body())
    }

    pub(super) fn event_init(&self, button: i16, buttons: u16) -> EventInit {
        let coords = self.position.coords.unwrap_or_default();
        EventInit {
            client_x: coords.client_x,
            client_y: coords.client_y,
            pointer_id: Some(self.id),
            pointer_type: Some(self.kind),
            is_primary: self.is_primary,
            width: 1.0,
            height: 1.0,
            pressure: if self.is_down { 0.5 } else { 0.0 },
            button,
            buttons,
            ..EventInit::default()
        }
    }
}

/// State behind mouse-family events. Touch contacts drive it only through
/// the compatibility events fired on release.
#[derive(Debug, Clone, Default)]
pub struct MouseState {
    pub(super) position: PointerPosition,
    pub(super) buttons: ButtonState,
    pub(super) clicks: ClickCounter,
    pub(super) button_down_target: BTreeMap<PointerButton, NodeId>,
    pub(super) selecting: Option<SelectionGesture>,
}

impl MouseState {
    pub fn position(&self) -> &PointerPosition {
        &self.position
    }

    pub fn target(&self, doc: &Document) -> NodeId {
        self.position.target.unwrap_or_else(|| doc.body())
    }

    pub(super) fn event_init(
        &self,
        button: Option<PointerButton>,
        detail: u32,
        pointer: Option<&PointerDevice>,
    ) -> EventInit {
        let coords = self.position.coords.unwrap_or_default();
        let mut init = EventInit {
            client_x: coords.client_x,
            client_y: coords.client_y,
            button: button.map(PointerButton::event_button).unwrap_or(0),
            buttons: self.buttons.bits(),
            detail,
            ..EventInit::default()
        };
        if let Some(pointer) = pointer {
            init.pointer_id = Some(pointer.id);
            init.pointer_type = Some(pointer.kind);
            init.is_primary = pointer.is_primary;
        }
        init
    }
}
