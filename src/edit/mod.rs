//! Editable value engine
//!
//! Applies one user edit (inserted text or a deletion) to the focused
//! editable target. Inputs and textareas are edited as a linear buffer in
//! their UI value; contenteditable hosts are edited through the document
//! selection.
//!
//! # Example
//!
//! ```rust
//! use ki_user_event::dom::Document;
//! use ki_user_event::event::EditType;
//! use ki_user_event::{selection, Session};
//!
//! let mut doc = Document::from_markup("<input value='abcd'>").unwrap();
//! let input = doc.query("input").unwrap();
//! let mut session = Session::default();
//! selection::select(&mut doc, input, 1, 3).unwrap();
//! session.input(&mut doc, input, "XYZ", EditType::InsertText).unwrap();
//! assert_eq!(doc.value(input), "aXYZd");
//! ```

mod intermediate;

use crate::dom::{
    char_len, is_valid_date, is_valid_time, splice_chars, Document, InputType, NodeId, Range,
    SelectionMode, WriteOrigin,
};
use crate::event::{DeleteDirection, EditType, EventInit, EventType};
use crate::input::keyboard::Carry;
use crate::input::{InputError, InputResult};
use crate::selection::{self, text, EditRange};
use crate::session::Session;
use intermediate::{build_time_value, is_plausible_number};
use tracing::{debug, trace};
use unicode_segmentation::UnicodeSegmentation;

impl Session {
    /// Applies an edit to `target`.
    ///
    /// Disabled and read-only controls and contenteditable hosts without a
    /// selection inside are left untouched. Elements without an editing
    /// model are rejected with [`InputError::NotEditable`].
    pub fn input(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        data: &str,
        edit: EditType,
    ) -> InputResult<()> {
        if !doc.has_own_selection(target) && !doc.is_content_editable(target) {
            return Err(InputError::NotEditable {
                element: doc.describe(target),
                reason: "no value and not contenteditable".to_string(),
            });
        }
        if doc.has_own_selection(target) && !doc.is_editable(target) {
            trace!(element = %doc.describe(target), "edit on disabled or read-only control");
            return Ok(());
        }
        let Some(range) = selection::input_range(doc, target) else {
            trace!(element = %doc.describe(target), "no selection inside editing host");
            return Ok(());
        };

        if !is_date_or_time(doc, target) {
            let init = EventInit {
                data: (!data.is_empty()).then(|| data.to_string()),
                input_type: Some(edit),
                ..EventInit::default()
            };
            if !self.dispatch(doc, target, EventType::BeforeInput, init)? {
                return Ok(());
            }
        }

        match range {
            EditRange::Dom(range) => self.edit_content_editable(doc, target, range, data, edit),
            EditRange::Control { start, end } => {
                self.edit_control(doc, target, start, end, data, edit)
            }
        }
    }

    fn edit_content_editable(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        range: Range,
        data: &str,
        edit: EditType,
    ) -> InputResult<()> {
        let host = doc.content_editable_host(target).unwrap_or(target);
        let mut changed = false;
        let mut point = range.start;

        if !range.is_collapsed() {
            point = doc.delete_contents(range);
            changed = true;
        } else if let Some(direction) = edit.direction() {
            if let Some(next) = neighbour_point(doc, host, range.start, direction) {
                let deletion = match direction {
                    DeleteDirection::Backward => Range {
                        start: next,
                        end: range.start,
                    },
                    DeleteDirection::Forward => Range {
                        start: range.start,
                        end: next,
                    },
                };
                point = doc.delete_contents(deletion);
                changed = true;
            }
        }
        if !data.is_empty() {
            point = doc.insert_text_at(point, data)?;
            changed = true;
        }
        doc.collapse_selection(point)?;

        if changed {
            debug!(element = %doc.describe(target), input_type = %edit, "contenteditable edit");
            let init = EventInit {
                data: (!data.is_empty()).then(|| data.to_string()),
                input_type: Some(edit),
                ..EventInit::default()
            };
            self.dispatch(doc, target, EventType::Input, init)?;
        }
        Ok(())
    }

    fn edit_control(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        start: usize,
        end: usize,
        data: &str,
        edit: EditType,
    ) -> InputResult<()> {
        let input_type = doc.input_type(target);
        let is_number = input_type == Some(InputType::Number);
        let mut value = doc.ui_value(target);
        let (mut start, mut end) = (start, end);

        if is_number && value.is_empty() {
            if let Some(carry) = self.keyboard.carry.as_ref().filter(|c| c.target == target) {
                trace!(carry = %carry.text, "restoring number fragment");
                value = carry.text.clone();
                start = char_len(&value);
                end = start;
            }
        }
        let len = char_len(&value);
        let (start, end) = (start.min(len), end.min(len));

        let mut insert = data.to_string();
        if let Some(max) = doc.max_length(target) {
            if !insert.is_empty() {
                let space = max.saturating_sub(len - (end - start));
                if space == 0 {
                    return Ok(());
                }
                insert = insert.chars().take(space).collect();
            }
        }

        let collapsed = start == end;
        let prolog_end = match edit.direction() {
            Some(DeleteDirection::Backward) if collapsed => start.saturating_sub(1),
            _ => start,
        };
        let epilog_start = match edit.direction() {
            Some(DeleteDirection::Forward) if collapsed => (start + 1).min(len),
            _ => end,
        };
        let mut new_value = splice_chars(&value, prolog_end, epilog_start, &insert);
        let mut new_offset = prolog_end + char_len(&insert);

        if input_type == Some(InputType::Time) {
            if let Some(built) = build_time_value(&new_value).filter(|v| is_valid_time(v)) {
                new_offset = char_len(&built);
                new_value = built;
            }
        }

        if new_value == value && new_offset == start && new_offset == end {
            trace!(element = %doc.describe(target), "edit changes nothing");
            return Ok(());
        }
        if is_number && !is_plausible_number(&new_value) {
            trace!(value = %new_value, "rejected number input");
            return Ok(());
        }

        debug!(element = %doc.describe(target), input_type = %edit, value = %new_value, "edit");
        doc.write_value(target, &new_value, WriteOrigin::Simulated);
        doc.set_ui_selection(target, None, new_offset, SelectionMode::Replace);
        if is_number {
            self.keyboard.carry = (doc.value(target) != new_value).then(|| Carry {
                target,
                text: new_value.clone(),
            });
        }

        if is_date_or_time(doc, target) {
            let complete = match input_type {
                Some(InputType::Date) => is_valid_date(&new_value),
                _ => is_valid_time(&new_value),
            };
            if complete {
                self.dispatch(doc, target, EventType::Input, EventInit::default())?;
                doc.commit_value_after_input(target, new_offset);
                self.dispatch(doc, target, EventType::Change, EventInit::default())?;
                doc.clear_initial_value(target);
            }
            return Ok(());
        }

        let init = EventInit {
            data: (!data.is_empty()).then(|| data.to_string()),
            input_type: Some(edit),
            ..EventInit::default()
        };
        self.dispatch(doc, target, EventType::Input, init)?;
        doc.commit_value_after_input(target, new_offset);
        Ok(())
    }
}

fn is_date_or_time(doc: &Document, node: NodeId) -> bool {
    matches!(
        doc.input_type(node),
        Some(InputType::Date | InputType::Time)
    )
}

/// Boundary point one grapheme away from `point` inside `host`.
fn neighbour_point(
    doc: &Document,
    host: NodeId,
    point: crate::dom::BoundaryPoint,
    direction: DeleteDirection,
) -> Option<crate::dom::BoundaryPoint> {
    let content = text::caret_text(doc, host);
    let offset = text::offset_of_point(doc, host, point);
    let next = neighbour_offset(&content, offset, direction)?;
    text::point_at_offset(doc, host, next).ok()
}

/// Character offset of the grapheme boundary next to `offset`.
fn neighbour_offset(content: &str, offset: usize, direction: DeleteDirection) -> Option<usize> {
    let mut boundaries = vec![0];
    let mut position = 0;
    for grapheme in content.graphemes(true) {
        position += grapheme.chars().count();
        boundaries.push(position);
    }
    match direction {
        DeleteDirection::Backward => boundaries.into_iter().rev().find(|b| *b < offset),
        DeleteDirection::Forward => boundaries.into_iter().find(|b| *b > offset),
    }
}
