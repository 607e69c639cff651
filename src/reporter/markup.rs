//! Minimal markup tree and serializer for the HTML report
//!
//! Builds the document as a tree of [`Node`]s and writes it with two-space
//! indentation. Elements holding any text are written on one line so
//! whitespace inside cells and log lines is preserved exactly.

use std::fmt::Write as _;

/// Elements serialized without a closing tag
const VOID_TAGS: [&str; 5] = ["br", "img", "meta", "link", "input"];

/// Character encoding the report is written in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportEncoding {
    #[default]
    Utf8,
    /// Non-ASCII characters become numeric character references
    Ascii,
}

impl ReportEncoding {
    pub fn charset(self) -> &'static str {
        match self {
            ReportEncoding::Utf8 => "utf-8",
            ReportEncoding::Ascii => "us-ascii",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Pre-escaped content such as embedded stylesheets and scripts
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Node>,
    inline: bool,
}

/// Start a new element
pub fn el(tag: &'static str) -> Element {
    Element {
        tag,
        attrs: Vec::new(),
        children: Vec::new(),
        inline: false,
    }
}

impl Element {
    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr("class", value)
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn raw(self, content: impl Into<String>) -> Self {
        self.child(Node::Raw(content.into()))
    }

    pub fn children<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    /// Always write this element on one line, even without direct text
    pub fn keep_inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child_nodes(&self) -> &[Node] {
        &self.children
    }

    /// Depth-first search for every descendant element with `tag`
    pub fn find_all<'a>(&'a self, tag: &str, out: &mut Vec<&'a Element>) {
        for node in &self.children {
            if let Node::Element(e) = node {
                if e.tag == tag {
                    out.push(e);
                }
                e.find_all(tag, out);
            }
        }
    }

    /// Concatenated text of all descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Element(e) => out.push_str(&e.text_content()),
                Node::Text(t) | Node::Raw(t) => out.push_str(t),
            }
        }
        out
    }

    fn is_void(&self) -> bool {
        VOID_TAGS.contains(&self.tag)
    }

    fn has_text(&self) -> bool {
        self.children.iter().any(|c| matches!(c, Node::Text(_)))
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

/// Serialize a full document: doctype, then `root` with indentation
pub fn to_document(root: &Element, encoding: ReportEncoding) -> String {
    let mut out = String::with_capacity(16_384);
    out.push_str("<!DOCTYPE html>\n");
    let mut writer = Writer {
        out: &mut out,
        encoding,
    };
    writer.element(root, 0, true);
    out
}

struct Writer<'a> {
    out: &'a mut String,
    encoding: ReportEncoding,
}

impl Writer<'_> {
    fn element(&mut self, e: &Element, depth: usize, block: bool) {
        if block {
            self.indent(depth);
        }
        self.open_tag(e);
        if e.is_void() {
            if block {
                self.out.push('\n');
            }
            return;
        }

        if e.children.is_empty() || e.inline || e.has_text() {
            for child in &e.children {
                self.inline(child);
            }
        } else {
            self.out.push('\n');
            for child in &e.children {
                match child {
                    Node::Element(c) => self.element(c, depth + 1, true),
                    Node::Raw(r) => {
                        self.escaped_raw(r);
                        self.out.push('\n');
                    }
                    Node::Text(_) => {}
                }
            }
            self.indent(depth);
        }

        let _ = write!(self.out, "</{}>", e.tag);
        if block {
            self.out.push('\n');
        }
    }

    fn inline(&mut self, node: &Node) {
        match node {
            Node::Element(e) => self.element(e, 0, false),
            Node::Text(t) => self.escaped(t, false),
            Node::Raw(r) => self.escaped_raw(r),
        }
    }

    fn open_tag(&mut self, e: &Element) {
        let _ = write!(self.out, "<{}", e.tag);
        for (name, value) in &e.attrs {
            let _ = write!(self.out, " {}=\"", name);
            self.escaped(value, true);
            self.out.push('"');
        }
        self.out.push('>');
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
    }

    fn escaped(&mut self, text: &str, in_attr: bool) {
        for c in text.chars() {
            match c {
                '&' => self.out.push_str("&amp;"),
                '<' => self.out.push_str("&lt;"),
                '>' => self.out.push_str("&gt;"),
                '"' if in_attr => self.out.push_str("&quot;"),
                c => self.non_ascii(c),
            }
        }
    }

    /// Raw content keeps markup characters but still honours the encoding
    fn escaped_raw(&mut self, text: &str) {
        for c in text.chars() {
            self.non_ascii(c);
        }
    }

    fn non_ascii(&mut self, c: char) {
        if self.encoding == ReportEncoding::Ascii && !c.is_ascii() {
            let _ = write!(self.out, "&#x{:x};", c as u32);
        } else {
            self.out.push(c);
        }
    }
}
