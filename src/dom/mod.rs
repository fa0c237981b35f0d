//! In-process document tree that input simulation runs against.
//!
//! The document is an arena of nodes addressed by [`NodeId`]. It carries the
//! pieces of browser state the input pipeline reads and mutates: focus,
//! the document selection, per-control value state (including the UI value
//! shadow), inline style declarations and event listeners.
//!
//! # Example
//!
//! ```rust
//! use ki_user_event::dom::Document;
//!
//! let doc = Document::from_markup("<label for='name'>Name</label><input id='name' value='Ada'>").unwrap();
//! let input = doc.query("#name").unwrap();
//! assert_eq!(doc.value(input), "Ada");
//! ```

mod element;
mod listeners;
mod markup;
mod query;
mod range;
mod style;
mod value;

pub use element::InputType;
pub use listeners::{Listener, ListenerId};
pub use range::{BoundaryPoint, DocumentSelection, Range};
pub use style::PointerEventsDeclaration;
pub use value::{SelectionDirection, SelectionMode, UiSelection, WriteOrigin};

pub(crate) use range::splice_chars;
pub(crate) use value::{char_len, is_valid_date, is_valid_time};

use crate::event::Event;
use serde::Serialize;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors raised by document operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The node is not an element.
    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    /// The requested tree mutation would produce an invalid tree.
    #[error("Cannot insert {child} into {parent}: {reason}")]
    HierarchyRequest {
        parent: NodeId,
        child: NodeId,
        reason: &'static str,
    },

    /// An offset lies outside the node it refers to.
    #[error("Offset {offset} is out of bounds for {node} (length {length})")]
    IndexSize {
        node: NodeId,
        offset: usize,
        length: usize,
    },

    /// The operation is not supported for the element in its current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Markup could not be parsed.
    #[error("Markup error at byte {position}: {message}")]
    Markup { position: usize, message: String },

    /// A selector could not be parsed.
    #[error("Unsupported selector: {0}")]
    Selector(String),
}

/// Result alias for document operations.
pub type DomResult<T> = Result<T, DomError>;

/// Handle to a node owned by a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena index of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// The kind of a node together with its kind-specific data.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document root.
    Document,
    /// An element.
    Element(Element),
    /// A text node.
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Element data.
#[derive(Debug, Clone)]
pub struct Element {
    tag_name: String,
    attrs: BTreeMap<String, String>,
    pub(crate) control: Option<value::ValueState>,
    pub(crate) checked: bool,
    pub(crate) default_checked: bool,
    pub(crate) selected: bool,
}

impl Element {
    fn new(tag_name: &str) -> Self {
        let tag_name = tag_name.to_ascii_lowercase();
        let control = matches!(tag_name.as_str(), "input" | "textarea")
            .then(value::ValueState::default);
        Self {
            tag_name,
            attrs: BTreeMap::new(),
            control,
            checked: false,
            default_checked: false,
            selected: false,
        }
    }

    /// Lowercase tag name.
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// Returns an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Returns whether the attribute is present.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Iterates attributes in name order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// An arena-backed document.
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
    active_element: Option<NodeId>,
    selection: Option<DocumentSelection>,
    listeners: listeners::Registry,
    event_log: Option<Vec<Event>>,
    style_lookups: Cell<usize>,
    submissions: Vec<NodeId>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("active_element", &self.active_element)
            .field("selection", &self.selection)
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document with `html` and `body` elements.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
            body: NodeId(0),
            active_element: None,
            selection: None,
            listeners: listeners::Registry::default(),
            event_log: None,
            style_lookups: Cell::new(0),
            submissions: Vec::new(),
        };
        let html = doc.create_element("html");
        doc.attach(doc.root, html, None);
        let body = doc.create_element("body");
        doc.attach(html, body, None);
        doc.body = body;
        doc
    }

    /// Creates a document and loads `markup` into its body.
    pub fn from_markup(markup: &str) -> DomResult<Self> {
        let mut doc = Self::new();
        let body = doc.body;
        markup::parse_into(&mut doc, body, markup)?;
        Ok(doc)
    }

    /// Replaces the children of `parent` with nodes parsed from `markup`.
    pub fn set_inner_markup(&mut self, parent: NodeId, markup: &str) -> DomResult<()> {
        if self.element(parent).is_none() {
            return Err(DomError::NotAnElement(parent));
        }
        for child in self.nodes[parent.0].children.clone() {
            self.remove(child);
        }
        markup::parse_into(self, parent, markup)
    }

    /// The document root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `html` element.
    pub fn document_element(&self) -> NodeId {
        self.parent(self.body).unwrap_or(self.root)
    }

    /// The body element.
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Returns whether `node` was allocated by this document.
    pub fn contains_node(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    // ------------------------------------------------------------------
    // Node creation and tree mutation
    // ------------------------------------------------------------------

    /// Creates a detached element.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.push_node(NodeKind::Element(Element::new(tag_name)))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.push_node(NodeKind::Text(data.to_string()))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    /// Appends `child` to `parent`, detaching it from its previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` into `parent` before `reference` (or at the end).
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        if matches!(self.nodes[parent.0].kind, NodeKind::Text(_)) {
            return Err(DomError::HierarchyRequest {
                parent,
                child,
                reason: "text nodes cannot have children",
            });
        }
        if child == self.root || self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest {
                parent,
                child,
                reason: "the node is an ancestor of the new parent",
            });
        }
        if let Some(reference) = reference {
            if self.nodes[reference.0].parent != Some(parent) {
                return Err(DomError::HierarchyRequest {
                    parent,
                    child,
                    reason: "the reference node is not a child of the parent",
                });
            }
        }
        if self.nodes[child.0].parent.is_some() {
            self.remove(child);
        }
        let index = reference.map(|r| self.index_in_parent(r));
        self.attach(parent, child, index);
        Ok(())
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        match index {
            Some(index) => children.insert(index, child),
            None => children.push(child),
        }
    }

    /// Detaches `node` from its parent.
    ///
    /// Focus inside the removed subtree is dropped and selection boundaries
    /// inside it collapse to the removal point.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node.0].parent else {
            return;
        };
        let index = self.index_in_parent(node);

        if let Some(active) = self.active_element {
            if self.is_inclusive_ancestor(node, active) {
                self.active_element = None;
            }
        }
        if let Some(selection) = self.selection {
            let fix = |point: BoundaryPoint| {
                if self.is_inclusive_ancestor(node, point.node) {
                    BoundaryPoint::new(parent, index)
                } else if point.node == parent && point.offset > index {
                    BoundaryPoint::new(parent, point.offset - 1)
                } else {
                    point
                }
            };
            self.selection = Some(DocumentSelection {
                anchor: fix(selection.anchor),
                focus: fix(selection.focus),
            });
        }

        self.nodes[parent.0].children.remove(index);
        self.nodes[node.0].parent = None;
    }

    // ------------------------------------------------------------------
    // Tree navigation
    // ------------------------------------------------------------------

    /// Parent of `node`.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Children of `node`.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Index of `node` within its parent's children (0 for detached nodes).
    pub fn index_in_parent(&self, node: NodeId) -> usize {
        self.parent(node)
            .and_then(|p| self.nodes[p.0].children.iter().position(|c| *c == node))
            .unwrap_or(0)
    }

    /// Next sibling of `node`.
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        self.children(parent)
            .get(self.index_in_parent(node) + 1)
            .copied()
    }

    /// Previous sibling of `node`.
    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.index_in_parent(node);
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Ancestors of `node` including itself, nearest first.
    pub fn inclusive_ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = vec![node];
        let mut cursor = self.parent(node);
        while let Some(current) = cursor {
            out.push(current);
            cursor = self.parent(current);
        }
        out
    }

    /// Returns whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Returns whether `node` is attached to the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, node)
    }

    /// Descendants of `node` in tree order, excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Nearest inclusive ancestor matching `predicate`.
    pub fn closest(&self, node: NodeId, predicate: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if predicate(self, current) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    // ------------------------------------------------------------------
    // Node data
    // ------------------------------------------------------------------

    /// Node kind and data.
    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    /// Element data of `node`, if it is an element.
    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes[node.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Returns whether `node` is an element.
    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    /// Returns whether `node` is a text node.
    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.0].kind, NodeKind::Text(_))
    }

    /// Data of a text node.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Text(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn text_mut(&mut self, node: NodeId) -> Option<&mut String> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Text(data) => Some(data),
            _ => None,
        }
    }

    /// Tag name of an element.
    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(Element::tag_name)
    }

    /// Returns whether `node` is an element with the given tag.
    pub fn is_tag(&self, node: NodeId, tag: &str) -> bool {
        self.tag_name(node)
            .map(|t| t.eq_ignore_ascii_case(tag))
            .unwrap_or(false)
    }

    /// Attribute value of an element.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|e| e.attr(name))
    }

    /// Returns whether an element carries the attribute.
    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.element(node).map(|e| e.has_attr(name)).unwrap_or(false)
    }

    /// Sets an attribute, keeping reflected control state in sync.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        let element = self.element_mut(node).ok_or(DomError::NotAnElement(node))?;
        let name = name.to_ascii_lowercase();
        element.attrs.insert(name.clone(), value.to_string());
        self.attribute_changed(node, &name);
        Ok(())
    }

    /// Removes an attribute.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> DomResult<()> {
        let element = self.element_mut(node).ok_or(DomError::NotAnElement(node))?;
        let name = name.to_ascii_lowercase();
        if element.attrs.remove(&name).is_some() {
            self.attribute_changed(node, &name);
        }
        Ok(())
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        match &self.nodes[node.0].kind {
            NodeKind::Text(data) => data.clone(),
            _ => {
                let mut out = String::new();
                for child in self.children(node) {
                    out.push_str(&self.text_content(*child));
                }
                out
            }
        }
    }

    /// Replaces the children of `node` with a single text node.
    pub fn set_text_content(&mut self, node: NodeId, text: &str) {
        if let Some(data) = self.text_mut(node) {
            *data = text.to_string();
            return;
        }
        for child in self.children(node).to_vec() {
            self.remove(child);
        }
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.attach(node, text_node, None);
        }
    }

    /// Short human readable description, e.g. `input#name` or `#text`.
    pub fn describe(&self, node: NodeId) -> String {
        match &self.nodes[node.0].kind {
            NodeKind::Document => "#document".to_string(),
            NodeKind::Text(_) => "#text".to_string(),
            NodeKind::Element(element) => match element.attr("id") {
                Some(id) if !id.is_empty() => format!("{}#{}", element.tag_name, id),
                _ => element.tag_name.clone(),
            },
        }
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    /// The focused element, if any.
    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    /// The focused element, falling back to the body.
    pub fn active_element_or_body(&self) -> NodeId {
        self.active_element.unwrap_or(self.body)
    }

    pub(crate) fn set_active_element(&mut self, node: Option<NodeId>) {
        self.active_element = node;
    }

    // ------------------------------------------------------------------
    // Event log and form submissions
    // ------------------------------------------------------------------

    /// Starts recording every dispatched event.
    pub fn enable_event_log(&mut self) {
        if self.event_log.is_none() {
            self.event_log = Some(Vec::new());
        }
    }

    /// Recorded events since the log was enabled or last taken.
    pub fn event_log(&self) -> &[Event] {
        self.event_log.as_deref().unwrap_or(&[])
    }

    /// Takes the recorded events, leaving the log enabled and empty.
    pub fn take_event_log(&mut self) -> Vec<Event> {
        self.event_log.as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub(crate) fn log_event(&mut self, event: &Event) -> Option<usize> {
        let log = self.event_log.as_mut()?;
        log.push(event.clone());
        Some(log.len() - 1)
    }

    pub(crate) fn update_logged_event(&mut self, index: usize, event: &Event) {
        if let Some(entry) = self.event_log.as_mut().and_then(|log| log.get_mut(index)) {
            *entry = event.clone();
        }
    }

    /// Forms whose `submit` event was not cancelled, in order.
    pub fn submissions(&self) -> &[NodeId] {
        &self.submissions
    }

    pub(crate) fn record_submission(&mut self, form: NodeId) {
        self.submissions.push(form);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_has_body() {
        let doc = Document::new();
        assert!(doc.is_tag(doc.body(), "body"));
        assert!(doc.is_connected(doc.body()));
        assert_eq!(doc.active_element_or_body(), doc.body());
    }

    #[test]
    fn test_insert_and_remove() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        doc.append_child(doc.body(), div).unwrap();
        doc.append_child(div, b).unwrap();
        doc.insert_before(div, a, Some(b)).unwrap();
        assert_eq!(doc.text_content(div), "ab");
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.previous_sibling(b), Some(a));

        doc.remove(a);
        assert_eq!(doc.text_content(div), "b");
        assert!(!doc.is_connected(a));
    }

    #[test]
    fn test_cannot_insert_ancestor() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.append_child(doc.body(), div).unwrap();
        let body = doc.body();
        assert!(doc.append_child(div, body).is_err());
    }

    #[test]
    fn test_describe() {
        let doc = Document::from_markup("<input id='a'><span></span>").unwrap();
        let input = doc.query("#a").unwrap();
        let span = doc.query("span").unwrap();
        assert_eq!(doc.describe(input), "input#a");
        assert_eq!(doc.describe(span), "span");
    }

    #[test]
    fn test_removing_focused_subtree_drops_focus() {
        let mut doc = Document::from_markup("<div id='w'><input id='a'></div>").unwrap();
        let wrapper = doc.query("#w").unwrap();
        let input = doc.query("#a").unwrap();
        doc.set_active_element(Some(input));
        doc.remove(wrapper);
        assert_eq!(doc.active_element(), None);
    }
}
