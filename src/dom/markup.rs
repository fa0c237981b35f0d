//! Minimal HTML-like markup loader.
//!
//! Supports elements, attributes (quoted, unquoted and boolean), void
//! elements, self-closing tags, comments, character references and raw
//! text inside `textarea`. Mismatched end tags close up to the nearest
//! open element with the same name and are ignored otherwise.

use super::{Document, DomError, DomResult, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub(super) fn parse_into(doc: &mut Document, parent: NodeId, markup: &str) -> DomResult<()> {
    let mut parser = Parser {
        src: markup,
        pos: 0,
        stack: vec![parent],
    };
    parser.run(doc)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    stack: Vec<NodeId>,
}

impl<'a> Parser<'a> {
    fn run(&mut self, doc: &mut Document) -> DomResult<()> {
        while self.pos < self.src.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                let end = rest[4..].find("-->").ok_or_else(|| self.error("unterminated comment"))?;
                self.pos += 4 + end + 3;
            } else if rest.starts_with("</") {
                self.end_tag(doc)?;
            } else if rest.starts_with('<')
                && rest[1..].chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false)
            {
                self.start_tag(doc)?;
            } else {
                let end = rest[1..].find('<').map(|i| i + 1).unwrap_or(rest.len());
                let text = decode_entities(&rest[..end]);
                self.pos += end;
                self.append_text(doc, &text)?;
            }
        }
        for node in self.stack.drain(1..).rev().collect::<Vec<_>>() {
            doc.finish_element(node);
        }
        Ok(())
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(NodeId(0))
    }

    fn append_text(&mut self, doc: &mut Document, text: &str) -> DomResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let parent = self.current();
        if let Some(last) = doc.children(parent).last().copied() {
            if let Some(data) = doc.text_mut(last) {
                data.push_str(text);
                return Ok(());
            }
        }
        let node = doc.create_text(text);
        doc.append_child(parent, node)
    }

    fn start_tag(&mut self, doc: &mut Document) -> DomResult<()> {
        self.pos += 1;
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '-').to_ascii_lowercase();
        let element = doc.create_element(&name);

        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error("unterminated start tag"));
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }
            let (attr, value) = self.attribute()?;
            doc.set_attribute(element, &attr, &value)?;
        }

        doc.append_child(self.current(), element)?;

        if name == "textarea" {
            let rest = self.rest();
            let end = find_ignore_case(rest, "</textarea").unwrap_or(rest.len());
            let text = decode_entities(rest[..end].strip_prefix('\n').unwrap_or(&rest[..end]));
            self.pos += end;
            if let Some(close) = self.rest().find('>') {
                self.pos += close + 1;
            }
            if !text.is_empty() {
                let node = doc.create_text(&text);
                doc.append_child(element, node)?;
            }
            doc.finish_element(element);
            return Ok(());
        }

        if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
            doc.finish_element(element);
        } else {
            self.stack.push(element);
        }
        Ok(())
    }

    fn end_tag(&mut self, doc: &mut Document) -> DomResult<()> {
        self.pos += 2;
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '-').to_ascii_lowercase();
        let close = self
            .rest()
            .find('>')
            .ok_or_else(|| self.error("unterminated end tag"))?;
        self.pos += close + 1;

        let Some(depth) = self
            .stack
            .iter()
            .skip(1)
            .rposition(|node| doc.is_tag(*node, &name))
        else {
            return Ok(());
        };
        while self.stack.len() > depth + 1 {
            if let Some(node) = self.stack.pop() {
                doc.finish_element(node);
            }
        }
        Ok(())
    }

    fn attribute(&mut self) -> DomResult<(String, String)> {
        let name = self
            .take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/')
            .to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.error("expected attribute name"));
        }
        self.skip_whitespace();
        if !self.rest().starts_with('=') {
            return Ok((name, String::new()));
        }
        self.pos += 1;
        self.skip_whitespace();
        let rest = self.rest();
        let value = match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let end = rest[1..]
                    .find(quote)
                    .ok_or_else(|| self.error("unterminated attribute value"))?;
                let raw = &rest[1..end + 1];
                self.pos += end + 2;
                raw.to_string()
            }
            _ => self
                .take_while(|c| !c.is_whitespace() && c != '>')
                .to_string(),
        };
        Ok((name, decode_entities(&value)))
    }

    fn rest(&self) -> &'a str {
        let src: &'a str = self.src;
        &src[self.pos..]
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest.find(|c: char| !predicate(c)).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn error(&self, message: &str) -> DomError {
        DomError::Markup {
            position: self.pos,
            message: message.to_string(),
        }
    }
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .char_indices()
        .map(|(i, _)| i)
        .find(|i| {
            haystack
                .get(*i..*i + needle.len())
                .map(|s| s.eq_ignore_ascii_case(needle))
                .unwrap_or(false)
        })
}

/// Decodes the common named and numeric character references.
pub(super) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        let Some(end) = rest.find(';').filter(|e| *e <= 10) else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_elements_and_text() {
        let doc = Document::from_markup("<div id='a'><span>Hello</span> world</div>").unwrap();
        let div = doc.query("#a").unwrap();
        assert_eq!(doc.children(div).len(), 2);
        assert_eq!(doc.text_content(div), "Hello world");
    }

    #[test]
    fn test_void_and_boolean_attributes() {
        let doc = Document::from_markup("<input disabled value=abc><br><p>x</p>").unwrap();
        let input = doc.query("input").unwrap();
        assert!(doc.has_attribute(input, "disabled"));
        assert_eq!(doc.attribute(input, "value"), Some("abc"));
        assert!(doc.children(input).is_empty());
        assert_eq!(doc.children(doc.body()).len(), 3);
    }

    #[test]
    fn test_textarea_raw_text() {
        let doc = Document::from_markup("<textarea>a <b>\nc</textarea>").unwrap();
        let textarea = doc.query("textarea").unwrap();
        assert_eq!(doc.value(textarea), "a <b>\nc");
    }

    #[test]
    fn test_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#65;&#x42;"), "a & b <c> AB");
        assert_eq!(decode_entities("fish & chips"), "fish & chips");
    }

    #[test]
    fn test_mismatched_end_tag_is_ignored() {
        let doc = Document::from_markup("<div>a</span>b</div>").unwrap();
        let div = doc.query("div").unwrap();
        assert_eq!(doc.text_content(div), "ab");
    }

    #[test]
    fn test_unterminated_tag_errors() {
        assert!(matches!(
            Document::from_markup("<div"),
            Err(DomError::Markup { .. })
        ));
    }
}
