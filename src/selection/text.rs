//! Linear text view of a subtree.
//!
//! Offsets into arbitrary markup are counted over "units": the characters
//! of text nodes, one unit for each embedded element (`img`, form controls,
//! ...) and one unit for each `br`. A `br` reads as `\n`, so line-based
//! selection stops at it.

use crate::dom::{BoundaryPoint, Document, NodeId};
use std::cmp::Ordering;

const EMBEDDED: &[&str] = &[
    "img", "input", "textarea", "select", "button", "video", "audio", "iframe", "object",
    "embed", "canvas", "svg", "meter", "progress",
];

/// Stand-in character for embedded elements.
pub(crate) const OBJECT_REPLACEMENT: char = '\u{FFFC}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unit {
    Text { node: NodeId, len: usize },
    Atom { node: NodeId },
    Break { node: NodeId },
}

impl Unit {
    pub(crate) fn len(&self) -> usize {
        match self {
            Unit::Text { len, .. } => *len,
            Unit::Atom { .. } | Unit::Break { .. } => 1,
        }
    }

    /// Boundary point right before the unit.
    fn start(&self, doc: &Document) -> BoundaryPoint {
        match self {
            Unit::Text { node, .. } => BoundaryPoint::new(*node, 0),
            Unit::Atom { node } | Unit::Break { node } => before(doc, *node),
        }
    }
}

fn before(doc: &Document, node: NodeId) -> BoundaryPoint {
    match doc.parent(node) {
        Some(parent) => BoundaryPoint::new(parent, doc.index_in_parent(node)),
        None => BoundaryPoint::new(node, 0),
    }
}

fn after(doc: &Document, node: NodeId) -> BoundaryPoint {
    let point = before(doc, node);
    BoundaryPoint::new(point.node, point.offset + 1)
}

pub(crate) fn units(doc: &Document, root: NodeId) -> Vec<Unit> {
    let mut out = Vec::new();
    collect(doc, root, &mut out);
    out
}

fn collect(doc: &Document, node: NodeId, out: &mut Vec<Unit>) {
    for &child in doc.children(node) {
        if let Some(text) = doc.text(child) {
            let len = text.chars().count();
            if len > 0 {
                out.push(Unit::Text { node: child, len });
            }
        } else if doc.is_tag(child, "br") {
            out.push(Unit::Break { node: child });
        } else if doc
            .tag_name(child)
            .map(|tag| EMBEDDED.contains(&tag))
            .unwrap_or(false)
        {
            out.push(Unit::Atom { node: child });
        } else {
            collect(doc, child, out);
        }
    }
}

/// Text of `root` as seen by caret offsets.
pub(crate) fn caret_text(doc: &Document, root: NodeId) -> String {
    units(doc, root)
        .into_iter()
        .map(|unit| match unit {
            Unit::Text { node, .. } => doc.text(node).unwrap_or("").to_string(),
            Unit::Atom { .. } => OBJECT_REPLACEMENT.to_string(),
            Unit::Break { .. } => "\n".to_string(),
        })
        .collect()
}

/// Boundary point at linear `offset`, or `Err(total length)` when the
/// offset lies past the end.
pub(crate) fn point_at_offset(
    doc: &Document,
    root: NodeId,
    offset: usize,
) -> Result<BoundaryPoint, usize> {
    let units = units(doc, root);
    let mut remaining = offset;
    for unit in &units {
        match unit {
            Unit::Text { node, len } if remaining <= *len => {
                return Ok(BoundaryPoint::new(*node, remaining));
            }
            Unit::Atom { .. } | Unit::Break { .. } if remaining == 0 => {
                return Ok(unit.start(doc));
            }
            _ => remaining -= unit.len(),
        }
    }
    if remaining == 0 {
        Ok(end_point(doc, root))
    } else {
        Err(units.iter().map(Unit::len).sum())
    }
}

/// Last caret position inside `root`.
pub(crate) fn end_point(doc: &Document, root: NodeId) -> BoundaryPoint {
    match units(doc, root).last() {
        Some(Unit::Text { node, len }) => BoundaryPoint::new(*node, *len),
        Some(Unit::Atom { node }) | Some(Unit::Break { node }) => after(doc, *node),
        None => BoundaryPoint::new(root, doc.children(root).len()),
    }
}

/// Linear offset of `point` inside `root`.
pub(crate) fn offset_of_point(doc: &Document, root: NodeId, point: BoundaryPoint) -> usize {
    let mut offset = 0;
    for unit in units(doc, root) {
        if let Unit::Text { node, .. } = unit {
            if point.node == node {
                return offset + point.offset;
            }
        }
        if doc.compare_points(point, unit.start(doc)) != Ordering::Greater {
            return offset;
        }
        offset += unit.len();
    }
    offset
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Word,
    Space,
    Other,
}

fn class(c: char) -> CharClass {
    if c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else if c.is_whitespace() {
        CharClass::Space
    } else {
        CharClass::Other
    }
}

fn run_len(chars: impl Iterator<Item = char>) -> usize {
    let mut chars = chars.peekable();
    let Some(&first) = chars.peek() else {
        return 0;
    };
    match class(first) {
        CharClass::Other => 1,
        kind => chars.take_while(|c| class(*c) == kind).count(),
    }
}

/// Range selected by `click_count` clicks at `pos` in `text`: a caret for
/// single clicks, the word or whitespace run for double clicks and the
/// line for triple clicks. `None` stands for the end of the text.
pub(crate) fn text_range(
    text: &str,
    pos: Option<usize>,
    click_count: u32,
) -> (Option<usize>, Option<usize>) {
    let chars: Vec<char> = text.chars().collect();
    if click_count % 3 == 1 || chars.is_empty() {
        return (pos, pos);
    }
    let at = pos.unwrap_or(chars.len()).min(chars.len());
    let (head, tail) = chars.split_at(at);
    if click_count % 3 == 2 {
        let start = at - run_len(head.iter().rev().copied());
        (Some(start), pos.map(|p| p + run_len(tail.iter().copied())))
    } else {
        let is_line = |c: &&char| **c != '\n' && **c != '\r';
        let start = at - head.iter().rev().take_while(is_line).count();
        (
            Some(start),
            pos.map(|p| p + tail.iter().take_while(is_line).count()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_text_counts_embedded_and_breaks() {
        let doc = Document::from_markup("<div>ab<img>c<br><b>de</b></div>").unwrap();
        let div = doc.query("div").unwrap();
        assert_eq!(caret_text(&doc, div), "ab\u{FFFC}c\nde");
    }

    #[test]
    fn test_point_at_offset() {
        let doc = Document::from_markup("<div>ab<br><b>cd</b></div>").unwrap();
        let div = doc.query("div").unwrap();
        let b_text = doc.children(doc.query("b").unwrap())[0];
        let first = doc.children(div)[0];

        assert_eq!(point_at_offset(&doc, div, 2), Ok(BoundaryPoint::new(first, 2)));
        assert_eq!(point_at_offset(&doc, div, 3), Ok(BoundaryPoint::new(b_text, 0)));
        assert_eq!(point_at_offset(&doc, div, 5), Ok(BoundaryPoint::new(b_text, 2)));
        assert_eq!(point_at_offset(&doc, div, 6), Err(5));
    }

    #[test]
    fn test_offset_round_trip_through_points() {
        let doc = Document::from_markup("<p>one <i>two</i><br>three</p>").unwrap();
        let p = doc.query("p").unwrap();
        for offset in 0..=13 {
            let point = point_at_offset(&doc, p, offset).unwrap();
            assert_eq!(offset_of_point(&doc, p, point), offset, "offset {offset}");
        }
    }

    #[test]
    fn test_word_and_line_ranges() {
        let text = "foo bar-baz\nqux";
        assert_eq!(text_range(text, Some(5), 1), (Some(5), Some(5)));
        assert_eq!(text_range(text, Some(5), 2), (Some(4), Some(7)));
        assert_eq!(text_range(text, Some(3), 2), (Some(0), Some(4)));
        assert_eq!(text_range(text, Some(5), 3), (Some(0), Some(11)));
        assert_eq!(text_range(text, Some(13), 3), (Some(12), Some(15)));
        assert_eq!(text_range(text, None, 2), (Some(12), None));
    }
}
