//! Render tree.
//!
//! Result views are built as plain `Node` trees by pure functions and only then
//! handed to a `RenderTarget`. The tree serializes to HTML with the same markup
//! the web front-end uses, so it can be written to disk, sent to a browser, or
//! inspected in tests.

mod page;
pub mod results;

pub use page::ResultsPage;
pub use results::{PieChart, ResultRenderer, Summary, CHART_PALETTE};

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            classes: Vec::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds one or more space-separated classes.
    pub fn class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(|c| c.to_string()));
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

const VOID_TAGS: &[&str] = &["br", "img", "input", "hr"];

impl Node {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&escape(text)),
            Node::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                if !element.classes.is_empty() {
                    out.push_str(" class=\"");
                    out.push_str(&escape(&element.classes.join(" ")));
                    out.push('"');
                }
                for (name, value) in &element.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_TAGS.contains(&element.tag.as_str()) {
                    return;
                }
                for child in &element.children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(text) => text.clone(),
            Node::Element(element) => element
                .children
                .iter()
                .map(Node::text_content)
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    /// All elements in document order carrying `class`.
    pub fn find_by_class(&self, class: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect(&mut |element| element.has_class(class), &mut found);
        found
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect(&mut |element| element.tag == tag, &mut found);
        found
    }

    fn collect<'a>(&'a self, pred: &mut dyn FnMut(&Element) -> bool, found: &mut Vec<&'a Element>) {
        if let Node::Element(element) = self {
            if pred(element) {
                found.push(element);
            }
            for child in &element.children {
                child.collect(pred, found);
            }
        }
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Where a rendered tree lands. Implemented by `HtmlContainer` here and by any
/// adapter that owns a real document.
pub trait RenderTarget {
    /// Replaces the whole content.
    fn replace(&mut self, node: Node);
    /// Appends after the current content.
    fn append(&mut self, node: Node);
    /// Inserts before the current content.
    fn prepend(&mut self, node: Node);
}

/// In-memory container holding a list of top-level nodes.
#[derive(Clone, Debug, Default)]
pub struct HtmlContainer {
    nodes: Vec<Node>,
}

impl HtmlContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn to_html(&self) -> String {
        self.nodes.iter().map(Node::to_html).collect()
    }

    pub fn text_content(&self) -> String {
        self.nodes.iter().map(Node::text_content).collect()
    }

    pub fn find_by_class(&self, class: &str) -> Vec<&Element> {
        self.nodes
            .iter()
            .flat_map(|node| node.find_by_class(class))
            .collect()
    }

    /// Wraps the content in a minimal standalone HTML page.
    pub fn to_document(&self, title: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>{}</body></html>\n",
            escape(title),
            self.to_html()
        )
    }
}

impl RenderTarget for HtmlContainer {
    fn replace(&mut self, node: Node) {
        self.nodes.clear();
        self.nodes.push(node);
    }

    fn append(&mut self, node: Node) {
        self.nodes.push(node);
    }

    fn prepend(&mut self, node: Node) {
        self.nodes.insert(0, node);
    }
}
