//! # Rendered Output
//!
//! The detached fragment the sanitizer produces and the render target it is
//! attached to. Only two shapes of markup exist here: live `span` elements
//! carrying allow-listed attributes, and whitespace-preserving literal text.

use serde::Serialize;

use super::dom::{escape_attribute_into, escape_text_into};

/// Inline style applied to every literal wrapper.
pub const PRE_WRAP_STYLE: &str = "white-space: pre-wrap;";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListenerEvent {
    Click,
    MouseEnter,
    MouseLeave,
}

/// Behavior a formatter attached to an entity span. The host UI dispatches
/// `action` when `event` fires on the element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listener {
    pub event: ListenerEvent,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

/// Whitespace-separated class tokens of an element, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassList(Vec<String>);

impl ClassList {
    pub fn parse(value: &str) -> Self {
        ClassList(value.split_ascii_whitespace().map(str::to_string).collect())
    }

    pub fn contains(&self, class: &str) -> bool {
        self.0.iter().any(|c| c == class)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputAttribute {
    pub name: String,
    pub value: String,
}

/// A live element in the output. Always a `span`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<OutputAttribute>,
    pub children: Vec<RenderNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub listeners: Vec<Listener>,
}

impl Element {
    pub fn span() -> Self {
        Element {
            tag: "span".to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// Sets `name` to `value`, replacing an existing attribute of that name.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.value = value.to_string(),
            None => self.attributes.push(OutputAttribute {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn class_list(&self) -> ClassList {
        ClassList::parse(self.attribute("class").unwrap_or_default())
    }

    /// An entity span is a span with at least one class.
    pub fn is_entity(&self) -> bool {
        !self.class_list().is_empty()
    }

    pub fn add_listener(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RenderNode {
    /// Text inside a live span.
    Text { text: String },
    /// Literal text in a whitespace-preserving wrapper.
    Literal { text: String },
    Element(Element),
}

impl RenderNode {
    pub fn text(text: impl Into<String>) -> Self {
        RenderNode::Text { text: text.into() }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        RenderNode::Literal { text: text.into() }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            RenderNode::Element(el) => Some(el),
            _ => None,
        }
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            RenderNode::Text { text } | RenderNode::Literal { text } => out.push_str(text),
            RenderNode::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            RenderNode::Text { text } => escape_text_into(out, text),
            RenderNode::Literal { text } => {
                out.push_str("<span style=\"");
                out.push_str(PRE_WRAP_STYLE);
                out.push_str("\">");
                escape_text_into(out, text);
                out.push_str("</span>");
            }
            RenderNode::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for attr in &el.attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    escape_attribute_into(out, &attr.value);
                    out.push('"');
                }
                out.push('>');
                for child in &el.children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}

/// A detached sequence of rendered nodes, ready to attach to a target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub nodes: Vec<RenderNode>,
}

impl Fragment {
    /// The whole of `text` as one literal run.
    pub fn literal(text: &str) -> Self {
        let mut fragment = Fragment::default();
        if !text.is_empty() {
            fragment.push(RenderNode::literal(text));
        }
        fragment
    }

    pub fn push(&mut self, node: RenderNode) {
        self.nodes.push(node);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visits every live element, parents before children.
    pub fn elements(&self) -> Vec<&Element> {
        let mut found = Vec::new();
        let mut stack: Vec<&RenderNode> = self.nodes.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if let RenderNode::Element(el) = node {
                found.push(el);
                stack.extend(el.children.iter().rev());
            }
        }
        found
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.collect_text(&mut out);
        }
        out
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_html(&mut out);
        }
        out
    }
}

/// The container a rendered message is attached to.
#[derive(Debug, Default)]
pub struct RenderTarget {
    children: Vec<RenderNode>,
}

impl RenderTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the previous content and attaches `fragment` in its place.
    pub fn replace_children(&mut self, fragment: Fragment) {
        self.children = fragment.nodes;
    }

    pub fn children(&self) -> &[RenderNode] {
        &self.children
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }
}
