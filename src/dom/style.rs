//! Inline style declarations and the computed properties input simulation
//! depends on.

use super::{Document, NodeId};

/// Resolved `pointer-events` of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerEventsDeclaration {
    /// The computed value, e.g. `auto` or `none`.
    pub value: String,
    /// Element carrying the declaration the value was inherited from.
    pub declared_on: Option<NodeId>,
}

impl PointerEventsDeclaration {
    pub fn is_none(&self) -> bool {
        self.value == "none"
    }
}

impl Document {
    /// Value of `property` in the inline `style` attribute.
    pub fn inline_style(&self, node: NodeId, property: &str) -> Option<String> {
        let style = self.attribute(node, "style")?;
        style
            .split(';')
            .filter_map(|decl| decl.split_once(':'))
            .filter(|(name, _)| name.trim().eq_ignore_ascii_case(property))
            .map(|(_, value)| value.trim().to_ascii_lowercase())
            .last()
    }

    fn inherited_style(&self, node: NodeId, property: &str) -> Option<(String, NodeId)> {
        self.inclusive_ancestors(node)
            .into_iter()
            .filter(|n| self.is_element(*n))
            .find_map(|n| {
                self.inline_style(n, property)
                    .filter(|v| v != "inherit")
                    .map(|v| (v, n))
            })
    }

    /// Computed `pointer-events`. Each call counts as one style lookup.
    pub fn pointer_events(&self, node: NodeId) -> PointerEventsDeclaration {
        self.style_lookups.set(self.style_lookups.get() + 1);
        match self.inherited_style(node, "pointer-events") {
            Some((value, declared_on)) => PointerEventsDeclaration {
                value,
                declared_on: Some(declared_on),
            },
            None => PointerEventsDeclaration {
                value: "auto".to_string(),
                declared_on: None,
            },
        }
    }

    /// Number of computed style lookups performed so far.
    pub fn style_lookups(&self) -> usize {
        self.style_lookups.get()
    }

    /// Returns whether text in `node` cannot be selected.
    pub fn is_user_select_none(&self, node: NodeId) -> bool {
        self.inherited_style(node, "user-select")
            .map(|(v, _)| v == "none")
            .unwrap_or(false)
    }

    /// Returns whether `node` is rendered and not hidden.
    pub fn is_visible(&self, node: NodeId) -> bool {
        let hidden = self.inclusive_ancestors(node).into_iter().any(|n| {
            self.has_attribute(n, "hidden")
                || self.inline_style(n, "display").as_deref() == Some("none")
        });
        !hidden
            && self
                .inherited_style(node, "visibility")
                .map(|(v, _)| v != "hidden" && v != "collapse")
                .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_events_inheritance() {
        let doc = Document::from_markup(
            "<div id='d' style='pointer-events: none'><button id='b'>x</button>\
             <span id='s' style='pointer-events:auto'>y</span></div>",
        )
        .unwrap();
        let div = doc.query("#d").unwrap();
        let button = doc.query("#b").unwrap();
        let span = doc.query("#s").unwrap();

        let resolved = doc.pointer_events(button);
        assert!(resolved.is_none());
        assert_eq!(resolved.declared_on, Some(div));
        assert!(!doc.pointer_events(span).is_none());
        assert_eq!(doc.style_lookups(), 2);
    }

    #[test]
    fn test_visibility() {
        let doc = Document::from_markup(
            "<div style='display:none'><input id='a'></div><input id='b' hidden>\
             <div style='visibility:hidden'><input id='c' style='visibility: visible'></div><input id='d'>",
        )
        .unwrap();
        assert!(!doc.is_visible(doc.query("#a").unwrap()));
        assert!(!doc.is_visible(doc.query("#b").unwrap()));
        assert!(doc.is_visible(doc.query("#c").unwrap()));
        assert!(doc.is_visible(doc.query("#d").unwrap()));
    }

    #[test]
    fn test_user_select() {
        let doc = Document::from_markup("<p style='user-select: none'><span>x</span></p>").unwrap();
        assert!(doc.is_user_select_none(doc.query("span").unwrap()));
    }
}
