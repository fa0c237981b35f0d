//! Focus transfer.
//!
//! Moving focus fires `change` on a control edited since it gained focus,
//! then `blur` and `focusout` on the element losing focus, then `focus`
//! and `focusin` on the element gaining it.

use super::{EventInit, EventType};
use crate::dom::{Document, NodeId};
use crate::input::InputResult;
use crate::selection;
use crate::session::Session;
use tracing::debug;

impl Session {
    /// Focuses the closest focusable inclusive ancestor of `node`, or
    /// blurs the active element when there is none.
    pub fn focus_element(&mut self, doc: &mut Document, node: NodeId) -> InputResult<()> {
        let target = doc.closest_focusable(node);
        let body = doc.body();
        if target.unwrap_or(body) == doc.active_element_or_body() {
            return Ok(());
        }
        let previous = doc.active_element();
        debug!(
            from = ?previous.map(|n| doc.describe(n)),
            to = ?target.map(|n| doc.describe(n)),
            "focus"
        );

        if let Some(previous) = previous {
            self.fire_blur(doc, previous, target)?;
        }
        doc.set_active_element(target);
        if let Some(target) = target {
            let init = EventInit {
                related_target: previous,
                ..EventInit::default()
            };
            self.dispatch(doc, target, EventType::Focus, init.clone())?;
            self.dispatch(doc, target, EventType::FocusIn, init)?;
        }
        selection::update_selection_on_focus(doc, target.unwrap_or(body))
    }

    /// Blurs `node` if it is focusable and currently focused.
    pub fn blur_element(&mut self, doc: &mut Document, node: NodeId) -> InputResult<()> {
        if !doc.is_focusable(node) || doc.active_element() != Some(node) {
            return Ok(());
        }
        debug!(element = %doc.describe(node), "blur");
        self.fire_blur(doc, node, None)?;
        doc.set_active_element(None);
        Ok(())
    }

    fn fire_blur(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        related: Option<NodeId>,
    ) -> InputResult<()> {
        self.commit_change(doc, node)?;
        let init = EventInit {
            related_target: related,
            ..EventInit::default()
        };
        self.dispatch(doc, node, EventType::Blur, init.clone())?;
        self.dispatch(doc, node, EventType::FocusOut, init)?;
        Ok(())
    }

    /// Fires `change` when the value differs from the one before the
    /// first simulated edit.
    pub(crate) fn commit_change(&mut self, doc: &mut Document, node: NodeId) -> InputResult<()> {
        let Some(initial) = doc.initial_value(node).map(str::to_string) else {
            return Ok(());
        };
        doc.clear_initial_value(node);
        if initial != doc.value(node) {
            self.dispatch(doc, node, EventType::Change, EventInit::default())?;
        }
        Ok(())
    }
}
