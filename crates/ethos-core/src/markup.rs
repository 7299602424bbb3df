//! Markup reader and writer
//!
//! A small, lenient HTML-fragment reader: it understands elements,
//! attributes (quoted or bare), void tags, comments, doctype and the common
//! character references. Stray closing tags are dropped and unclosed
//! elements are closed at end of input. An open paragraph, list item or table
//! part closes when a sibling of its kind starts. Elements nested deeper
//! than [`MAX_NESTING`] are an error. It is not a sanitizer.
//!
//! The writer emits attributes in name order followed by `style`, so
//! writing a parsed document and reading it back yields the same tree.

use crate::node::tags;
use crate::{CoreError, Document, Element, FragmentNode, NodeKind, Result};

/// Deepest element nesting the reader accepts
pub const MAX_NESTING: usize = 512;

/// Parse a markup string into top-level fragment nodes
pub fn parse(source: &str) -> Result<Vec<FragmentNode>> {
    Reader::new(source).run()
}

/// Serialize the children of `id`
pub fn write_children(doc: &Document, id: crate::NodeId) -> String {
    let mut out = String::new();
    for child in doc.children(id) {
        write_node(doc, *child, &mut out);
    }
    out
}

/// Serialize a node and its subtree
pub fn write(doc: &Document, id: crate::NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &mut out);
    out
}

fn write_node(doc: &Document, id: crate::NodeId, out: &mut String) {
    let Some(node) = doc.get(id) else {
        return;
    };
    match &node.kind {
        NodeKind::Text(text) => escape_text(text, out),
        NodeKind::Element(el) => {
            write_open_tag(el, out);
            if tags::is_void(&el.tag) {
                return;
            }
            for child in &node.children {
                write_node(doc, *child, out);
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
    }
}

fn write_open_tag(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    if !el.style.is_empty() {
        out.push_str(" style=\"");
        escape_attr(&el.style.to_string(), out);
        out.push('"');
    }
    out.push('>');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(c),
        }
    }
}

/// Decode character references in text or attribute values
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_reference(&rest[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
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

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

/// An element being built while its children are read
struct Open {
    element: Element,
    children: Vec<FragmentNode>,
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
    stack: Vec<Open>,
    top: Vec<FragmentNode>,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            stack: Vec::new(),
            top: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<FragmentNode>> {
        while self.pos < self.src.len() {
            let rest = &self.src[self.pos..];
            if rest.starts_with("<!--") {
                self.skip_comment()?;
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_declaration()?;
            } else if rest.starts_with("</") {
                self.read_close_tag()?;
            } else if starts_tag(rest) {
                self.read_open_tag()?;
            } else {
                self.read_text();
            }
        }
        while let Some(open) = self.stack.pop() {
            self.emit(FragmentNode::Element {
                element: open.element,
                children: open.children,
            });
        }
        Ok(self.top)
    }

    fn emit(&mut self, node: FragmentNode) {
        match self.stack.last_mut() {
            Some(open) => open.children.push(node),
            None => self.top.push(node),
        }
    }

    fn error(&self, message: impl Into<String>) -> CoreError {
        CoreError::Markup {
            position: self.pos,
            message: message.into(),
        }
    }

    fn read_text(&mut self) {
        let rest = &self.src[self.pos..];
        // A '<' that does not start markup is literal text
        let mut end = rest.len();
        for (i, _) in rest.match_indices('<').filter(|(i, _)| *i > 0) {
            let tail = &rest[i..];
            if tail.starts_with("</") || tail.starts_with("<!") || tail.starts_with("<?") || starts_tag(tail) {
                end = i;
                break;
            }
        }
        let raw = &rest[..end];
        self.pos += end;
        let text = decode_entities(raw);

        // Merge with a preceding text sibling so "a < b" stays one run
        let siblings = match self.stack.last_mut() {
            Some(open) => &mut open.children,
            None => &mut self.top,
        };
        if let Some(FragmentNode::Text { text: prev }) = siblings.last_mut() {
            prev.push_str(&text);
        } else {
            siblings.push(FragmentNode::Text { text });
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        let rest = &self.src[self.pos..];
        match rest[4..].find("-->") {
            Some(end) => {
                self.pos += 4 + end + 3;
                Ok(())
            }
            None => Err(self.error("unterminated comment")),
        }
    }

    fn skip_declaration(&mut self) -> Result<()> {
        match self.src[self.pos..].find('>') {
            Some(end) => {
                self.pos += end + 1;
                Ok(())
            }
            None => Err(self.error("unterminated declaration")),
        }
    }

    fn read_close_tag(&mut self) -> Result<()> {
        let rest = &self.src[self.pos..];
        let end = rest.find('>').ok_or_else(|| self.error("unterminated closing tag"))?;
        let name = rest[2..end].trim().to_ascii_lowercase();
        self.pos += end + 1;

        if let Some(depth) = self.stack.iter().rposition(|open| open.element.tag == name) {
            self.close_to(depth);
        }
        Ok(())
    }

    /// Close every open element from `depth` up
    fn close_to(&mut self, depth: usize) {
        while self.stack.len() > depth {
            if let Some(open) = self.stack.pop() {
                self.emit(FragmentNode::Element {
                    element: open.element,
                    children: open.children,
                });
            }
        }
    }

    /// Close the elements an opening `tag` ends implicitly, so `<td>1<td>2`
    /// reads as two sibling cells
    fn close_implied(&mut self, tag: &str) {
        if tag == tags::P || tags::is_block(tag) {
            self.close_nearest(&[tags::P], &["table", "td", "th", "button"]);
        }
        let (closes, boundary): (&[&str], &[&str]) = match tag {
            "td" | "th" => (&["td", "th"], &["table", "tr"]),
            "tr" => (&["tr"], &["table"]),
            "thead" | "tbody" | "tfoot" => (&["thead", "tbody", "tfoot"], &["table"]),
            "li" => (&["li"], &["ul", "ol"]),
            "option" => (&["option"], &["select"]),
            _ => return,
        };
        self.close_nearest(closes, boundary);
    }

    /// Close the innermost open element tagged one of `closes`, unless a
    /// `boundary` element is open inside it
    fn close_nearest(&mut self, closes: &[&str], boundary: &[&str]) {
        let found = self.stack.iter().rposition(|open| {
            let tag = open.element.tag.as_str();
            closes.contains(&tag) || boundary.contains(&tag)
        });
        if let Some(depth) = found {
            if closes.contains(&self.stack[depth].element.tag.as_str()) {
                self.close_to(depth);
            }
        }
    }

    fn read_open_tag(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 1;
        let name = self.read_name();
        let mut element = Element::new(name);
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            let rest = &self.src[self.pos..];
            if rest.is_empty() {
                self.pos = start;
                return Err(self.error("unterminated tag"));
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

            let attr = self.read_name();
            if attr.is_empty() {
                // Unexpected character inside a tag; skip it
                self.pos += rest.chars().next().map(char::len_utf8).unwrap_or(1);
                continue;
            }
            self.skip_whitespace();
            let value = if self.src[self.pos..].starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.read_attr_value()?
            } else {
                String::new()
            };
            element.set_attr(attr, decode_entities(&value));
        }

        self.close_implied(&element.tag);
        if self_closing || tags::is_void(&element.tag) {
            self.emit(FragmentNode::Element {
                element,
                children: Vec::new(),
            });
        } else {
            if self.stack.len() >= MAX_NESTING {
                self.pos = start;
                return Err(self.error(format!("elements nested deeper than {}", MAX_NESTING)));
            }
            self.stack.push(Open {
                element,
                children: Vec::new(),
            });
        }
        Ok(())
    }

    fn read_name(&mut self) -> String {
        let rest = &self.src[self.pos..];
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'))
            .unwrap_or(rest.len());
        self.pos += end;
        rest[..end].to_ascii_lowercase()
    }

    fn read_attr_value(&mut self) -> Result<String> {
        let rest = &self.src[self.pos..];
        let quote = rest.chars().next();
        match quote {
            Some(q @ ('"' | '\'')) => {
                let end = rest[1..]
                    .find(q)
                    .ok_or_else(|| self.error("unterminated attribute value"))?;
                self.pos += 1 + end + 1;
                Ok(rest[1..1 + end].to_string())
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                self.pos += end;
                Ok(rest[..end].to_string())
            }
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.src[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }
}

fn starts_tag(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let nodes = parse("<p>Hi <b>there</b></p>").unwrap();
        assert_eq!(
            nodes,
            vec![FragmentNode::element("p")
                .with_child(FragmentNode::text("Hi "))
                .with_child(FragmentNode::element("b").with_child(FragmentNode::text("there")))]
        );
    }

    #[test]
    fn test_parse_void_and_attributes() {
        let nodes = parse(r#"<IMG SRC='a.png' style="width: 10px;height:auto" alt=x><br/>"#).unwrap();
        assert_eq!(nodes.len(), 2);
        let FragmentNode::Element { element, children } = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(element.tag, "img");
        assert_eq!(element.attr("src"), Some("a.png"));
        assert_eq!(element.attr("alt"), Some("x"));
        assert_eq!(element.style.get("height"), Some("auto"));
        assert!(children.is_empty());
        assert_eq!(nodes[1].tag(), Some("br"));
    }

    #[test]
    fn test_entities_and_literal_lt() {
        let nodes = parse("a &lt; b &amp;&nbsp;c < d &bogus; &#x131;").unwrap();
        assert_eq!(nodes, vec![FragmentNode::text("a < b &\u{a0}c < d &bogus; ı")]);
    }

    #[test]
    fn test_lenient_structure() {
        let nodes = parse("<!-- note --><div><p>open</div></span>tail").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].tag(), Some("div"));
        assert_eq!(nodes[1], FragmentNode::text("tail"));
    }

    #[test]
    fn test_unterminated_tag_is_error() {
        assert!(matches!(parse("<p class=\"x"), Err(CoreError::Markup { .. })));
        assert!(matches!(parse("ok <b"), Err(CoreError::Markup { .. })));
    }

    #[test]
    fn test_implied_end_tags() {
        let doc = Document::from_markup(
            "<table><tr><td>1<td>2<tr><td>3<td>4</table><p>one<p>two<ul><li>a<li>b</ul>",
        )
        .unwrap();
        assert_eq!(
            doc.to_markup(),
            "<table><tr><td>1</td><td>2</td></tr><tr><td>3</td><td>4</td></tr></table>\
             <p>one</p><p>two</p><ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_nested_structures_are_kept() {
        let source = "<table><tr><td><table><tr><td>x</td></tr></table></td><td>y</td></tr></table>\
                      <ul><li>a<ul><li>b</li></ul></li></ul><td>loose</td>";
        let doc = Document::from_markup(source).unwrap();
        assert_eq!(doc.to_markup(), source);
    }

    #[test]
    fn test_nesting_limit() {
        let deep = "<b>".repeat(20_000);
        assert!(matches!(parse(&deep), Err(CoreError::Markup { .. })));

        let ok = "<i>".repeat(MAX_NESTING);
        assert_eq!(Document::from_markup(&ok).unwrap().len(), MAX_NESTING + 1);
    }

    #[test]
    fn test_write_round_trip() {
        let source = r#"<table style="width: 100%"><tr><td class="c" style="border: 1px solid #cbd5e1">a &amp; &lt;b&gt;</td></tr></table><p>"q"</p><img src="data:x" style="height: auto">"#;
        let doc = Document::from_markup(source).unwrap();
        let written = doc.to_markup();
        assert_eq!(written, source);
        let again = Document::from_markup(&written).unwrap();
        assert_eq!(again.to_markup(), written);
    }
}
