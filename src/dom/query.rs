//! Simple selector matching used by tests and the scenario runner.
//!
//! Supported: type selectors, `#id`, `.class`, `[attr]`, `[attr=value]`,
//! compound forms such as `input.name[type=text]` and the descendant
//! combinator.

use super::{Document, DomError, DomResult, NodeId};

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

fn parse_compound(part: &str) -> DomResult<Compound> {
    let err = || DomError::Selector(part.to_string());
    let mut compound = Compound::default();
    let mut rest = part;

    let tag_end = rest
        .find(|c: char| matches!(c, '#' | '.' | '['))
        .unwrap_or(rest.len());
    if tag_end > 0 {
        let tag = &rest[..tag_end];
        if tag != "*" {
            compound.tag = Some(tag.to_ascii_lowercase());
        }
    }
    rest = &rest[tag_end..];

    while let Some(first) = rest.chars().next() {
        match first {
            '#' | '.' => {
                let end = rest[1..]
                    .find(|c: char| matches!(c, '#' | '.' | '['))
                    .map(|i| i + 1)
                    .unwrap_or(rest.len());
                let name = rest[1..end].to_string();
                if name.is_empty() {
                    return Err(err());
                }
                if first == '#' {
                    compound.id = Some(name);
                } else {
                    compound.classes.push(name);
                }
                rest = &rest[end..];
            }
            '[' => {
                let end = rest.find(']').ok_or_else(err)?;
                let inner = &rest[1..end];
                let (name, value) = match inner.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                        (name.trim(), Some(value.to_string()))
                    }
                    None => (inner.trim(), None),
                };
                if name.is_empty() {
                    return Err(err());
                }
                compound.attrs.push((name.to_ascii_lowercase(), value));
                rest = &rest[end + 1..];
            }
            _ => return Err(err()),
        }
    }
    Ok(compound)
}

impl Document {
    fn matches_compound(&self, node: NodeId, compound: &Compound) -> bool {
        let Some(element) = self.element(node) else {
            return false;
        };
        if let Some(tag) = &compound.tag {
            if element.tag_name() != tag {
                return false;
            }
        }
        if let Some(id) = &compound.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        let classes = element.attr("class").unwrap_or("");
        if !compound
            .classes
            .iter()
            .all(|c| classes.split_whitespace().any(|have| have == c))
        {
            return false;
        }
        compound.attrs.iter().all(|(name, value)| match value {
            Some(value) => element.attr(name) == Some(value.as_str()),
            None => element.has_attr(name),
        })
    }

    /// All elements matching `selector`, in tree order.
    pub fn select(&self, selector: &str) -> DomResult<Vec<NodeId>> {
        let parts = selector
            .split_whitespace()
            .map(parse_compound)
            .collect::<DomResult<Vec<_>>>()?;
        let Some((last, ancestors)) = parts.split_last() else {
            return Err(DomError::Selector(selector.to_string()));
        };

        Ok(self
            .descendants(self.root())
            .into_iter()
            .filter(|node| self.matches_compound(*node, last))
            .filter(|node| {
                // match the remaining compounds right to left against ancestors
                let mut cursor = self.parent(*node);
                for compound in ancestors.iter().rev() {
                    loop {
                        match cursor {
                            Some(current) if self.matches_compound(current, compound) => {
                                cursor = self.parent(current);
                                break;
                            }
                            Some(current) => cursor = self.parent(current),
                            None => return false,
                        }
                    }
                }
                true
            })
            .collect())
    }

    /// First element matching `selector`.
    pub fn query(&self, selector: &str) -> Option<NodeId> {
        self.select(selector).ok()?.into_iter().next()
    }

    /// Every element matching `selector`. Invalid selectors match nothing.
    pub fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.select(selector).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_selectors() {
        let doc = Document::from_markup(
            "<form id='f'><input class='a b' type='text' name='x'><input type='checkbox'></form>",
        )
        .unwrap();
        assert_eq!(doc.query_all("input").len(), 2);
        assert!(doc.query("input.a.b[type=text]").is_some());
        assert!(doc.query("input[name='x']").is_some());
        assert!(doc.query("input.c").is_none());
        assert!(doc.query("#f input[type=checkbox]").is_some());
        assert!(doc.query("p input").is_none());
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::new();
        assert!(matches!(doc.select("a[b"), Err(DomError::Selector(_))));
        assert!(doc.select("").is_err());
    }
}
