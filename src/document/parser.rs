//! Markup parsing and serialization.
//!
//! Parses the HTML-like subset the synchronizer operates on: elements with
//! quoted attributes, text runs, comments, and self-closing tags. The parser
//! builds directly into the arena so parsed documents are immediately
//! mutable.

use thiserror::Error;

use super::types::{Document, NodeData, NodeId};

/// Errors produced while parsing markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input ended inside a tag, comment, or unclosed element.
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),
    /// A `<` was not followed by a valid tag name.
    #[error("malformed tag at byte {0}")]
    MalformedTag(usize),
    /// An attribute was missing a quoted value after `=`.
    #[error("malformed attribute at byte {0}")]
    MalformedAttribute(usize),
    /// A closing tag did not match the innermost open element.
    #[error("mismatched closing tag at byte {pos}: expected </{expected}>, found </{found}>")]
    MismatchedClosingTag {
        /// Byte offset of the closing tag.
        pos: usize,
        /// Tag that is currently open.
        expected: String,
        /// Tag named by the closing tag.
        found: String,
    },
    /// A closing tag appeared with no element open.
    #[error("unexpected closing tag </{found}> at byte {pos}")]
    UnexpectedClosingTag {
        /// Byte offset of the closing tag.
        pos: usize,
        /// Tag named by the closing tag.
        found: String,
    },
}

impl Document {
    /// Parse markup into a document.
    ///
    /// Top-level nodes become children of the synthetic `body` root.
    /// Whitespace-only text runs are dropped so fixture indentation does not
    /// produce text nodes.
    ///
    /// # Errors
    /// Returns a [`ParseError`] on truncated input, malformed tags or
    /// attributes, and mismatched closing tags.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let mut doc = Self::new();
        let root = doc.root();
        Parser {
            src: source,
            pos: 0,
        }
        .parse_into(&mut doc, root)?;
        Ok(doc)
    }

    /// Serialize the document back to markup.
    ///
    /// Elements without children are written self-closing. Output is compact
    /// (no indentation) and re-parses to an equal tree.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.root()) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                if self.children(id).is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn parse_into(mut self, doc: &mut Document, root: NodeId) -> Result<(), ParseError> {
        let mut stack = vec![root];
        while self.pos < self.src.len() {
            let rest = &self.src[self.pos..];
            if let Some(comment) = rest.strip_prefix("<!--") {
                let end = comment
                    .find("-->")
                    .ok_or(ParseError::UnexpectedEof(self.pos))?;
                self.pos += 4 + end + 3;
            } else if rest.starts_with("<!") {
                let end = rest.find('>').ok_or(ParseError::UnexpectedEof(self.pos))?;
                self.pos += end + 1;
            } else if rest.starts_with("</") {
                self.parse_closing_tag(doc, &mut stack)?;
            } else if rest.starts_with('<') {
                self.parse_open_tag(doc, &mut stack)?;
            } else {
                self.parse_text(doc, &mut stack);
            }
        }
        if stack.len() > 1 {
            return Err(ParseError::UnexpectedEof(self.pos));
        }
        Ok(())
    }

    fn parse_text(&mut self, doc: &mut Document, stack: &mut [NodeId]) {
        let rest = &self.src[self.pos..];
        let end = rest.find('<').unwrap_or(rest.len());
        let raw = &rest[..end];
        self.pos += end;
        if raw.trim().is_empty() {
            return;
        }
        let text = doc.create_text(&unescape(raw));
        let parent = stack[stack.len() - 1];
        doc.append_child(parent, text);
    }

    fn parse_closing_tag(
        &mut self,
        doc: &Document,
        stack: &mut Vec<NodeId>,
    ) -> Result<(), ParseError> {
        let tag_pos = self.pos;
        self.pos += 2;
        let name = self.take_name().ok_or(ParseError::MalformedTag(tag_pos))?;
        self.skip_whitespace();
        if self.src.as_bytes().get(self.pos) != Some(&b'>') {
            return Err(ParseError::MalformedTag(tag_pos));
        }
        self.pos += 1;
        if stack.len() == 1 {
            return Err(ParseError::UnexpectedClosingTag {
                pos: tag_pos,
                found: name,
            });
        }
        let open = stack[stack.len() - 1];
        let open_tag = doc.tag(open).unwrap_or_default();
        if open_tag != name {
            return Err(ParseError::MismatchedClosingTag {
                pos: tag_pos,
                expected: open_tag.to_string(),
                found: name,
            });
        }
        stack.pop();
        Ok(())
    }

    fn parse_open_tag(
        &mut self,
        doc: &mut Document,
        stack: &mut Vec<NodeId>,
    ) -> Result<(), ParseError> {
        let tag_pos = self.pos;
        self.pos += 1;
        let name = self.take_name().ok_or(ParseError::MalformedTag(tag_pos))?;
        let element = doc.create_element(&name);

        loop {
            self.skip_whitespace();
            match self.src.as_bytes().get(self.pos) {
                None => return Err(ParseError::UnexpectedEof(self.pos)),
                Some(b'>') => {
                    self.pos += 1;
                    let parent = stack[stack.len() - 1];
                    doc.append_child(parent, element);
                    stack.push(element);
                    return Ok(());
                }
                Some(b'/') => {
                    if self.src.as_bytes().get(self.pos + 1) != Some(&b'>') {
                        return Err(ParseError::MalformedTag(tag_pos));
                    }
                    self.pos += 2;
                    let parent = stack[stack.len() - 1];
                    doc.append_child(parent, element);
                    return Ok(());
                }
                Some(_) => {
                    let (attr, value) = self.parse_attribute()?;
                    doc.set_attribute(element, &attr, &value);
                }
            }
        }
    }

    fn parse_attribute(&mut self) -> Result<(String, String), ParseError> {
        let attr_pos = self.pos;
        let name = self
            .take_name()
            .ok_or(ParseError::MalformedAttribute(attr_pos))?;
        self.skip_whitespace();
        if self.src.as_bytes().get(self.pos) != Some(&b'=') {
            // Bare attribute, e.g. `contenteditable`.
            return Ok((name, String::new()));
        }
        self.pos += 1;
        self.skip_whitespace();
        let quote = match self.src.as_bytes().get(self.pos) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => return Err(ParseError::MalformedAttribute(attr_pos)),
        };
        self.pos += 1;
        let rest = &self.src[self.pos..];
        let end = rest
            .find(quote as char)
            .ok_or(ParseError::UnexpectedEof(self.pos))?;
        let value = unescape(&rest[..end]);
        self.pos += end + 1;
        Ok((name, value))
    }

    /// Consume a tag or attribute name. Returns `None` on an empty name.
    fn take_name(&mut self) -> Option<String> {
        let rest = &self.src[self.pos..];
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'))
            .unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        self.pos += end;
        Some(rest[..end].to_string())
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.src[self.pos..];
        let skip = rest
            .find(|c: char| !c.is_ascii_whitespace())
            .unwrap_or(rest.len());
        self.pos += skip;
    }
}

fn unescape(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
