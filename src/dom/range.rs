//! Boundary points, ranges and the document selection.

use super::{char_len, Document, DomError, DomResult, NodeId, NodeKind};
use std::cmp::Ordering;

/// A position in the tree: a node and an offset into it. Offsets count
/// characters in text nodes and children in other nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// An ordered pair of boundary points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl Range {
    /// A collapsed range at `point`.
    pub fn collapsed(point: BoundaryPoint) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// The document selection. The focus may lie before the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentSelection {
    pub anchor: BoundaryPoint,
    pub focus: BoundaryPoint,
}

impl DocumentSelection {
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

impl Document {
    /// Length of a node: characters for text, children otherwise.
    pub fn node_length(&self, node: NodeId) -> usize {
        match self.kind(node) {
            NodeKind::Text(data) => char_len(data),
            _ => self.children(node).len(),
        }
    }

    fn tree_path(&self, node: NodeId) -> Vec<usize> {
        let mut path: Vec<usize> = self
            .inclusive_ancestors(node)
            .into_iter()
            .filter(|n| self.parent(*n).is_some())
            .map(|n| self.index_in_parent(n))
            .collect();
        path.reverse();
        path
    }

    /// Compares two nodes in tree order. Ancestors precede descendants.
    pub fn compare_tree_order(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        self.tree_path(a).cmp(&self.tree_path(b))
    }

    /// Compares two boundary points.
    pub fn compare_points(&self, a: BoundaryPoint, b: BoundaryPoint) -> Ordering {
        if a.node == b.node {
            return a.offset.cmp(&b.offset);
        }
        if self.is_inclusive_ancestor(a.node, b.node) {
            let child = self
                .inclusive_ancestors(b.node)
                .into_iter()
                .find(|n| self.parent(*n) == Some(a.node));
            return match child {
                Some(child) if self.index_in_parent(child) < a.offset => Ordering::Greater,
                _ => Ordering::Less,
            };
        }
        if self.is_inclusive_ancestor(b.node, a.node) {
            return self.compare_points(b, a).reverse();
        }
        self.compare_tree_order(a.node, b.node)
    }

    /// Nearest common inclusive ancestor.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> NodeId {
        let ancestors = self.inclusive_ancestors(b);
        self.inclusive_ancestors(a)
            .into_iter()
            .find(|n| ancestors.contains(n))
            .unwrap_or(self.root())
    }

    fn check_point(&self, point: BoundaryPoint) -> DomResult<()> {
        let length = self.node_length(point.node);
        if point.offset > length {
            return Err(DomError::IndexSize {
                node: point.node,
                offset: point.offset,
                length,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Document selection
    // ------------------------------------------------------------------

    /// The current document selection.
    pub fn selection(&self) -> Option<DocumentSelection> {
        self.selection
    }

    /// The document selection as an ordered range.
    pub fn selection_range_in_document(&self) -> Option<Range> {
        let selection = self.selection?;
        Some(
            if self.compare_points(selection.anchor, selection.focus) == Ordering::Greater {
                Range {
                    start: selection.focus,
                    end: selection.anchor,
                }
            } else {
                Range {
                    start: selection.anchor,
                    end: selection.focus,
                }
            },
        )
    }

    /// Sets anchor and focus of the document selection.
    pub fn set_selection(&mut self, anchor: BoundaryPoint, focus: BoundaryPoint) -> DomResult<()> {
        self.check_point(anchor)?;
        self.check_point(focus)?;
        self.selection = Some(DocumentSelection { anchor, focus });
        Ok(())
    }

    /// Collapses the document selection to `point`.
    pub fn collapse_selection(&mut self, point: BoundaryPoint) -> DomResult<()> {
        self.set_selection(point, point)
    }

    /// Moves the focus of the document selection, keeping the anchor.
    pub fn extend_selection(&mut self, focus: BoundaryPoint) -> DomResult<()> {
        let anchor = self.selection.map(|s| s.anchor).unwrap_or(focus);
        self.set_selection(anchor, focus)
    }

    /// Removes the document selection.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Text covered by `range`.
    pub fn range_text(&self, range: Range) -> String {
        let common = self.common_ancestor(range.start.node, range.end.node);
        let mut nodes = vec![common];
        nodes.extend(self.descendants(common));

        let mut out = String::new();
        for node in nodes {
            let Some(data) = self.text(node) else {
                continue;
            };
            let len = char_len(data);
            let from = BoundaryPoint::new(node, 0);
            let to = BoundaryPoint::new(node, len);
            let start = if self.compare_points(range.start, from) == Ordering::Greater {
                range.start
            } else {
                from
            };
            let end = if self.compare_points(range.end, to) == Ordering::Less {
                range.end
            } else {
                to
            };
            if start.node == node && end.node == node && start.offset < end.offset {
                out.extend(data.chars().skip(start.offset).take(end.offset - start.offset));
            }
        }
        out
    }

    /// Removes the contents of `range` and returns the collapsed position.
    pub fn delete_contents(&mut self, range: Range) -> BoundaryPoint {
        let Range { start, end } = range;
        if start == end {
            return start;
        }

        if start.node == end.node {
            if let Some(data) = self.text_mut(start.node) {
                *data = splice_chars(data, start.offset, end.offset, "");
                return start;
            }
        }

        let common = self.common_ancestor(start.node, end.node);
        let mut contained: Vec<NodeId> = Vec::new();
        for node in self.descendants(common) {
            let Some(parent) = self.parent(node) else {
                continue;
            };
            if contained.contains(&parent) {
                continue;
            }
            let index = self.index_in_parent(node);
            let before = BoundaryPoint::new(parent, index);
            let after = BoundaryPoint::new(parent, index + 1);
            if self.compare_points(before, start) != Ordering::Less
                && self.compare_points(after, end) != Ordering::Greater
            {
                contained.push(node);
            }
        }

        if let Some(data) = self.text_mut(start.node) {
            let len = char_len(data);
            *data = splice_chars(data, start.offset, len, "");
        }
        if let Some(data) = self.text_mut(end.node) {
            *data = splice_chars(data, 0, end.offset, "");
        }
        for node in contained {
            self.remove(node);
        }

        // removing children of the start container can shift its offset
        let length = self.node_length(start.node);
        BoundaryPoint::new(start.node, start.offset.min(length))
    }

    /// Inserts text at `point`, extending an adjacent text node or creating
    /// a new one. Returns the position after the inserted text.
    pub fn insert_text_at(&mut self, point: BoundaryPoint, text: &str) -> DomResult<BoundaryPoint> {
        self.check_point(point)?;
        if let Some(data) = self.text_mut(point.node) {
            *data = splice_chars(data, point.offset, point.offset, text);
            return Ok(BoundaryPoint::new(point.node, point.offset + char_len(text)));
        }

        let children = self.children(point.node).to_vec();
        if let Some(previous) = point.offset.checked_sub(1).and_then(|i| children.get(i)) {
            if let Some(data) = self.text_mut(*previous) {
                data.push_str(text);
                let offset = char_len(data);
                return Ok(BoundaryPoint::new(*previous, offset));
            }
        }
        if let Some(next) = children.get(point.offset) {
            if let Some(data) = self.text_mut(*next) {
                data.insert_str(0, text);
                return Ok(BoundaryPoint::new(*next, char_len(text)));
            }
        }

        let node = self.create_text(text);
        self.insert_before(point.node, node, children.get(point.offset).copied())?;
        Ok(BoundaryPoint::new(node, char_len(text)))
    }
}

/// Replaces the characters `[from, to)` of `text` with `insert`.
pub(crate) fn splice_chars(text: &str, from: usize, to: usize, insert: &str) -> String {
    let mut out: String = text.chars().take(from).collect();
    out.push_str(insert);
    out.extend(text.chars().skip(to));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Document, NodeId, NodeId, NodeId) {
        let doc = Document::from_markup("<div id='d'>ab<b id='b'>cd</b>ef</div>").unwrap();
        let div = doc.query("#d").unwrap();
        let first = doc.children(div)[0];
        let last = doc.children(div)[2];
        (doc, div, first, last)
    }

    #[test]
    fn test_compare_points() {
        let (doc, div, first, last) = fixture();
        let a = BoundaryPoint::new(first, 1);
        let b = BoundaryPoint::new(last, 0);
        assert_eq!(doc.compare_points(a, b), Ordering::Less);
        assert_eq!(doc.compare_points(b, a), Ordering::Greater);
        assert_eq!(
            doc.compare_points(BoundaryPoint::new(div, 1), a),
            Ordering::Greater
        );
        assert_eq!(
            doc.compare_points(BoundaryPoint::new(div, 0), a),
            Ordering::Less
        );
    }

    #[test]
    fn test_range_text_and_delete_across_nodes() {
        let (mut doc, div, first, last) = fixture();
        let range = Range {
            start: BoundaryPoint::new(first, 1),
            end: BoundaryPoint::new(last, 1),
        };
        assert_eq!(doc.range_text(range), "bcde");
        let point = doc.delete_contents(range);
        assert_eq!(point, BoundaryPoint::new(first, 1));
        assert_eq!(doc.text_content(div), "af");
    }

    #[test]
    fn test_delete_within_text() {
        let (mut doc, div, first, _) = fixture();
        doc.delete_contents(Range {
            start: BoundaryPoint::new(first, 0),
            end: BoundaryPoint::new(first, 1),
        });
        assert_eq!(doc.text_content(div), "bcdef");
    }

    #[test]
    fn test_insert_text_in_element_extends_neighbour() {
        let (mut doc, div, first, _) = fixture();
        let point = doc.insert_text_at(BoundaryPoint::new(div, 1), "X").unwrap();
        assert_eq!(point, BoundaryPoint::new(first, 3));
        assert_eq!(doc.text_content(div), "abXcdef");
    }

    #[test]
    fn test_insert_text_creates_node() {
        let mut doc = Document::from_markup("<p></p>").unwrap();
        let p = doc.query("p").unwrap();
        let point = doc.insert_text_at(BoundaryPoint::new(p, 0), "hi").unwrap();
        assert_eq!(point.offset, 2);
        assert_eq!(doc.text_content(p), "hi");
    }

    #[test]
    fn test_selection_offset_is_checked() {
        let (mut doc, _, first, _) = fixture();
        assert!(doc.collapse_selection(BoundaryPoint::new(first, 2)).is_ok());
        assert!(matches!(
            doc.collapse_selection(BoundaryPoint::new(first, 3)),
            Err(DomError::IndexSize { .. })
        ));
    }

    #[test]
    fn test_splice_chars() {
        assert_eq!(splice_chars("abcd", 1, 3, "XYZ"), "aXYZd");
        assert_eq!(splice_chars("héllo", 1, 2, "e"), "hello");
    }
}
