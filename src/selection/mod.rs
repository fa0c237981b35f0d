//! Selection and caret resolution
//!
//! Controls with their own value (inputs, textareas) keep a linear UI
//! selection into their UI value. Everything else uses the document
//! selection, whose boundary points are resolved from linear offsets over
//! the target's text (see [`text`]).
//!
//! # Example
//!
//! ```rust
//! use ki_user_event::dom::Document;
//! use ki_user_event::selection;
//!
//! let mut doc = Document::from_markup("<p>Hello <b>world</b></p>").unwrap();
//! let p = doc.query("p").unwrap();
//! selection::select(&mut doc, p, 6, 11).unwrap();
//! assert_eq!(selection::selected_text(&doc, p), "world");
//! ```

pub(crate) mod text;

use crate::dom::{char_len, BoundaryPoint, Document, NodeId, Range, SelectionMode};
use crate::input::pointer::CaretPosition;
use crate::input::{InputError, InputResult};
use std::cmp::Ordering;
use tracing::trace;

/// Selection started by a mouse press, extended while the button is held.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionGesture {
    /// Inside a control's UI value.
    Control {
        node: NodeId,
        start: usize,
        end: usize,
    },
    /// In the document.
    Document { range: Range },
}

/// Resolves a caret position inside `target`.
///
/// For controls the offset indexes the UI value and the returned point
/// names the control itself. With an explicit `node` the offset is taken
/// as a DOM offset into it. Otherwise the offset is linear over the text
/// of `target`. A missing offset means the end.
pub fn resolve_caret_position(
    doc: &Document,
    target: NodeId,
    node: Option<NodeId>,
    offset: Option<usize>,
) -> InputResult<BoundaryPoint> {
    if doc.has_own_selection(target) {
        let length = char_len(&doc.ui_value(target));
        let offset = offset.unwrap_or(length);
        if offset > length {
            return Err(out_of_bounds(doc, target, offset, length));
        }
        return Ok(BoundaryPoint::new(target, offset));
    }
    if let Some(node) = node {
        let length = doc.node_length(node);
        let offset = offset.unwrap_or(length);
        if offset > length {
            return Err(out_of_bounds(doc, node, offset, length));
        }
        return Ok(BoundaryPoint::new(node, offset));
    }
    match offset {
        None => Ok(text::end_point(doc, target)),
        Some(offset) => text::point_at_offset(doc, target, offset)
            .map_err(|length| out_of_bounds(doc, target, offset, length)),
    }
}

fn out_of_bounds(doc: &Document, node: NodeId, offset: usize, length: usize) -> InputError {
    InputError::OffsetOutOfBounds {
        element: doc.describe(node),
        offset,
        length,
    }
}

/// Selects linear offsets `anchor..focus` of `target`.
pub fn select(doc: &mut Document, target: NodeId, anchor: usize, focus: usize) -> InputResult<()> {
    if doc.has_own_selection(target) {
        let length = char_len(&doc.ui_value(target));
        for offset in [anchor, focus] {
            if offset > length {
                return Err(out_of_bounds(doc, target, offset, length));
            }
        }
        doc.set_ui_selection(target, Some(anchor), focus, SelectionMode::Replace);
        return Ok(());
    }
    let anchor = resolve_caret_position(doc, target, None, Some(anchor))?;
    let focus = resolve_caret_position(doc, target, None, Some(focus))?;
    doc.set_selection(anchor, focus)?;
    Ok(())
}

/// Selection started by pressing a button `click_count` times at `caret`.
///
/// Returns `None` for targets with `user-select: none`.
pub fn set_selection_per_mouse_down(
    doc: &mut Document,
    target: NodeId,
    caret: CaretPosition,
    click_count: u32,
) -> InputResult<Option<SelectionGesture>> {
    if doc.is_user_select_none(target) {
        return Ok(None);
    }
    let own = doc.has_own_selection(target);
    let content = if own {
        doc.ui_value(target)
    } else {
        text::caret_text(doc, target)
    };
    let (start, end) = match caret.node {
        Some(_) => (caret.offset, caret.offset),
        None => text::text_range(&content, caret.offset, click_count),
    };
    trace!(element = %doc.describe(target), ?start, ?end, click_count, "selection per mouse down");

    if own {
        let length = char_len(&content);
        let start = start.unwrap_or(length);
        let end = end.unwrap_or(length);
        for offset in [start, end] {
            if offset > length {
                return Err(out_of_bounds(doc, target, offset, length));
            }
        }
        doc.set_ui_selection(target, Some(start), end, SelectionMode::Replace);
        return Ok(Some(SelectionGesture::Control {
            node: target,
            start,
            end,
        }));
    }

    let start = resolve_caret_position(doc, target, caret.node, start)?;
    let end = resolve_caret_position(doc, target, caret.node, end)?;
    doc.set_selection(start, end)?;
    Ok(Some(SelectionGesture::Document {
        range: Range { start, end },
    }))
}

/// Extends a mouse selection to the pointer at `caret` over `target`.
pub fn modify_selection_per_mouse(
    doc: &mut Document,
    gesture: &SelectionGesture,
    target: NodeId,
    caret: CaretPosition,
) -> InputResult<()> {
    let focus = resolve_caret_position(doc, target, caret.node, caret.offset)?;
    match gesture {
        SelectionGesture::Control { node, start, end } => {
            // dragging outside of the control keeps its selection
            if focus.node != *node {
                return Ok(());
            }
            let anchor = if focus.offset < *start { *end } else { *start };
            let focus = if focus.offset > *end || focus.offset < *start {
                focus.offset
            } else {
                *end
            };
            doc.set_ui_selection(*node, Some(anchor), focus, SelectionMode::Replace);
        }
        SelectionGesture::Document { range } => {
            let (anchor, focus) = if doc.compare_points(focus, range.start) == Ordering::Less {
                (range.end, focus)
            } else if doc.compare_points(focus, range.end) == Ordering::Greater {
                (range.start, focus)
            } else {
                (range.start, range.end)
            };
            doc.set_selection(anchor, focus)?;
        }
    }
    Ok(())
}

/// Element whose text the document selection is confined to.
fn selection_root(doc: &Document, target: NodeId) -> NodeId {
    doc.content_editable_host(target).unwrap_or_else(|| doc.body())
}

/// Selects the whole value of a control or the content of the editing
/// host (the body outside of contenteditable).
pub fn select_all(doc: &mut Document, target: NodeId) -> InputResult<()> {
    if doc.has_own_selection(target) {
        let length = char_len(&doc.ui_value(target));
        doc.set_ui_selection(target, Some(0), length, SelectionMode::Replace);
        return Ok(());
    }
    let root = selection_root(doc, target);
    let end = doc.children(root).len();
    doc.set_selection(BoundaryPoint::new(root, 0), BoundaryPoint::new(root, end))?;
    Ok(())
}

/// Returns whether everything [`select_all`] would select is selected.
pub fn is_all_selected(doc: &Document, target: NodeId) -> bool {
    if doc.has_own_selection(target) {
        let selection = doc.ui_selection(target);
        return selection.start() == 0 && selection.end() == char_len(&doc.ui_value(target));
    }
    let root = selection_root(doc, target);
    doc.selection()
        .map(|s| {
            s.anchor == BoundaryPoint::new(root, 0)
                && s.focus == BoundaryPoint::new(root, doc.children(root).len())
        })
        .unwrap_or(false)
}

/// Moves the caret by `delta` characters. A non-collapsed selection
/// collapses to its start or end instead.
pub fn move_selection(doc: &mut Document, target: NodeId, delta: isize) -> InputResult<()> {
    if doc.has_own_selection(target) {
        let selection = doc.ui_selection(target);
        let focus = if selection.is_collapsed() {
            selection.focus.saturating_add_signed(delta)
        } else if delta < 0 {
            selection.start()
        } else {
            selection.end()
        };
        doc.set_ui_selection(target, None, focus, SelectionMode::Replace);
        return Ok(());
    }
    let Some(current) = doc.selection() else {
        return Ok(());
    };
    if !current.is_collapsed() {
        let Some(range) = doc.selection_range_in_document() else {
            return Ok(());
        };
        let point = if delta < 0 { range.start } else { range.end };
        doc.collapse_selection(point)?;
        return Ok(());
    }
    if let Some(point) = shifted_point(doc, target, current.focus, delta) {
        doc.collapse_selection(point)?;
    }
    Ok(())
}

/// Moves only the focus by `delta` characters, keeping the anchor.
pub fn extend_selection(doc: &mut Document, target: NodeId, delta: isize) -> InputResult<()> {
    if doc.has_own_selection(target) {
        let selection = doc.ui_selection(target);
        doc.set_ui_selection(
            target,
            Some(selection.anchor),
            selection.focus.saturating_add_signed(delta),
            SelectionMode::Replace,
        );
        return Ok(());
    }
    let Some(current) = doc.selection() else {
        return Ok(());
    };
    if let Some(point) = shifted_point(doc, target, current.focus, delta) {
        doc.extend_selection(point)?;
    }
    Ok(())
}

fn shifted_point(
    doc: &Document,
    target: NodeId,
    point: BoundaryPoint,
    delta: isize,
) -> Option<BoundaryPoint> {
    let root = selection_root(doc, target);
    let offset = text::offset_of_point(doc, root, point);
    let next = offset.checked_add_signed(delta)?;
    text::point_at_offset(doc, root, next).ok()
}

/// Places the caret at the start or end of the editable content.
pub fn set_caret_to_edge(
    doc: &mut Document,
    target: NodeId,
    to_end: bool,
    extend: bool,
) -> InputResult<()> {
    if doc.has_own_selection(target) {
        let focus = if to_end {
            char_len(&doc.ui_value(target))
        } else {
            0
        };
        let mode = if extend {
            SelectionMode::Modify
        } else {
            SelectionMode::Replace
        };
        doc.set_ui_selection(target, None, focus, mode);
        return Ok(());
    }
    let root = selection_root(doc, target);
    let point = if to_end {
        text::end_point(doc, root)
    } else {
        text::point_at_offset(doc, root, 0).unwrap_or(BoundaryPoint::new(root, 0))
    };
    if extend {
        doc.extend_selection(point)?;
    } else {
        doc.collapse_selection(point)?;
    }
    Ok(())
}

/// Range an edit on `target` applies to: the UI selection of a control
/// or the document selection inside a contenteditable host.
pub fn input_range(doc: &Document, target: NodeId) -> Option<EditRange> {
    if doc.has_own_selection(target) {
        let selection = doc.ui_selection(target);
        return Some(EditRange::Control {
            start: selection.start(),
            end: selection.end(),
        });
    }
    let host = doc.content_editable_host(target)?;
    let range = doc.selection_range_in_document()?;
    let inside = doc.is_inclusive_ancestor(host, range.start.node)
        && doc.is_inclusive_ancestor(host, range.end.node);
    inside.then_some(EditRange::Dom(range))
}

/// Target range of an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditRange {
    /// Character offsets into a control's UI value.
    Control { start: usize, end: usize },
    /// A range in a contenteditable subtree.
    Dom(Range),
}

/// Selected text of a control, or of the document selection.
pub fn selected_text(doc: &Document, target: NodeId) -> String {
    if doc.has_own_selection(target) {
        let selection = doc.ui_selection(target);
        return doc
            .ui_value(target)
            .chars()
            .skip(selection.start())
            .take(selection.end() - selection.start())
            .collect();
    }
    doc.selection_range_in_document()
        .map(|range| doc.range_text(range))
        .unwrap_or_default()
}

/// Adjusts the document selection when focus moves to `element`.
///
/// Focusing a control moves the document selection into it. Inside a
/// contenteditable host a collapsed selection is kept and a range is
/// replaced by a caret at the start of the host.
pub fn update_selection_on_focus(doc: &mut Document, element: NodeId) -> InputResult<()> {
    let Some(current) = doc.selection() else {
        return Ok(());
    };
    if !doc.has_own_selection(element) {
        return Ok(());
    }
    match doc.content_editable_host(current.focus.node) {
        Some(host) => {
            if !current.is_collapsed() {
                let node = doc
                    .children(host)
                    .first()
                    .copied()
                    .filter(|n| doc.is_text(*n))
                    .unwrap_or(host);
                doc.collapse_selection(BoundaryPoint::new(node, 0))?;
            }
        }
        None => doc.collapse_selection(BoundaryPoint::new(element, 0))?,
    }
    Ok(())
}
