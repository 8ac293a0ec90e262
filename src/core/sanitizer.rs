//! # Rich-Text Sanitizer
//!
//! Rebuilds untrusted message markup into a [`Fragment`] in which the only
//! live markup is entity spans (spans with a class) carrying allow-listed
//! attributes. Everything else is shown as literal text.
//!
//! ```text
//! raw html ─► parse (dom) ─► walk ─► Fragment ─► formatters ─► caller
//!                              │
//!                  text        → literal run
//!                  span.class  → live span (filtered attrs, nested spans kept)
//!                  span        → literal outer markup
//!                  other tag   → literal outer markup
//! ```
//!
//! Any failure along the way degrades to the raw input as one literal run.

use std::fmt;

use std::panic::{self, AssertUnwindSafe};

use log::{debug, error, warn};

use super::dom::{self, Attribute, Node};
use super::formatter::{FormatterError, TextFormatter};
use super::fragment::{ClassList, Element, Fragment, RenderNode, RenderTarget};

/// Attribute names that may survive on an entity span.
pub const DEFAULT_ALLOWED_ATTRIBUTES: &[&str] = &[
    "class",
    "style",
    "data-uid",
    "data-entity-type",
    "data-entity-id",
];

/// Deepest span nesting rendered as live markup.
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// Upper bound for a configured `max_depth`. The tree walks recurse once
/// per level, so this caps their stack use.
pub const MAX_DEPTH_CEILING: usize = 256;

const SCRIPT_MARKER: &str = "javascript:";

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum RenderFailure {
    /// The parser could not produce a tree.
    Parse(String),
    /// A subtree could not be serialized back to markup.
    Serialize(String),
    /// Input exceeds the configured size limit.
    InputTooLarge { len: usize, limit: usize },
    /// A formatter rejected an entity span.
    Formatter(FormatterError),
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderFailure::Parse(msg) => write!(f, "parse error: {msg}"),
            RenderFailure::Serialize(msg) => write!(f, "serialize error: {msg}"),
            RenderFailure::InputTooLarge { len, limit } => {
                write!(f, "input of {len} bytes exceeds limit of {limit} bytes")
            }
            RenderFailure::Formatter(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RenderFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderFailure::Formatter(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FormatterError> for RenderFailure {
    fn from(e: FormatterError) -> Self {
        RenderFailure::Formatter(e)
    }
}

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizerOptions {
    pub allowed_attributes: Vec<String>,
    pub max_depth: usize,
    /// Inputs longer than this (in bytes) are shown as literal text.
    pub max_input_bytes: Option<usize>,
}

impl Default for SanitizerOptions {
    fn default() -> Self {
        Self {
            allowed_attributes: DEFAULT_ALLOWED_ATTRIBUTES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_input_bytes: None,
        }
    }
}

// ============================================================================
// Sanitizer
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    options: SanitizerOptions,
}

impl Sanitizer {
    pub fn new(mut options: SanitizerOptions) -> Self {
        options.max_depth = clamp_depth(options.max_depth);
        Self { options }
    }

    pub fn options(&self) -> &SanitizerOptions {
        &self.options
    }

    /// Clears `target` and attaches the rebuilt form of `raw`.
    pub fn render_into(
        &self,
        target: &mut RenderTarget,
        raw: &str,
        formatters: &[Box<dyn TextFormatter>],
    ) {
        target.replace_children(self.rebuild(raw, formatters));
    }

    /// Rebuilds `raw`; on any failure the input is returned as literal text.
    pub fn rebuild(&self, raw: &str, formatters: &[Box<dyn TextFormatter>]) -> Fragment {
        match self.try_rebuild(raw, formatters) {
            Ok(fragment) => fragment,
            Err(e) => {
                error!("Rendering message as plain text: {e}");
                Fragment::literal(raw)
            }
        }
    }

    /// Like [`rebuild`](Self::rebuild) but reports why a rebuild failed.
    pub fn try_rebuild(
        &self,
        raw: &str,
        formatters: &[Box<dyn TextFormatter>],
    ) -> Result<Fragment, RenderFailure> {
        if let Some(limit) = self.options.max_input_bytes
            && raw.len() > limit
        {
            return Err(RenderFailure::InputTooLarge {
                len: raw.len(),
                limit,
            });
        }

        let nodes = dom::parse_fragment_nodes(raw, self.options.max_depth)?;

        let mut fragment = Fragment::default();
        for node in &nodes {
            if let Some(rendered) = self.render_top_level(node) {
                fragment.push(rendered);
            }
        }

        if !formatters.is_empty() {
            attach_formatters(&mut fragment.nodes, formatters)?;
        }

        debug!(
            "Rebuilt {} bytes into {} nodes ({} live spans)",
            raw.len(),
            fragment.nodes.len(),
            fragment.elements().len()
        );
        Ok(fragment)
    }

    fn render_top_level(&self, node: &Node) -> Option<RenderNode> {
        match node {
            Node::Text(text) => Some(RenderNode::literal(text.as_str())),
            Node::Element { .. } if self.is_entity_span(node) && self.options.max_depth > 0 => {
                Some(RenderNode::Element(self.build_span(node, 1)))
            }
            Node::Element { .. } | Node::Opaque(_) => Some(RenderNode::literal(node.outer_html())),
            Node::Comment(_) => None,
        }
    }

    /// Builds a live span from `node`, which sits at nesting `depth`.
    fn build_span(&self, node: &Node, depth: usize) -> Element {
        let mut span = Element::span();
        let Node::Element {
            attributes,
            children,
            ..
        } = node
        else {
            return span;
        };

        for attr in attributes.iter().filter(|a| self.is_allowed(a)) {
            span.set_attribute(&attr.name.to_ascii_lowercase(), &attr.value);
        }

        for child in children {
            match child {
                Node::Text(text) => span.children.push(RenderNode::text(text.as_str())),
                Node::Element { .. } if child.is_element("span") && depth < self.options.max_depth => {
                    span.children
                        .push(RenderNode::Element(self.build_span(child, depth + 1)));
                }
                Node::Element { .. } | Node::Opaque(_) => {
                    span.children.push(RenderNode::text(child.outer_html()))
                }
                Node::Comment(_) => {}
            }
        }
        span
    }

    fn is_entity_span(&self, node: &Node) -> bool {
        node.is_element("span")
            && node
                .attribute("class")
                .is_some_and(|class| !class.trim().is_empty())
    }

    fn is_allowed(&self, attr: &Attribute) -> bool {
        let name = attr.name.to_ascii_lowercase();
        if name.starts_with("on") {
            return false;
        }
        if !self
            .options
            .allowed_attributes
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&name))
        {
            return false;
        }
        // Browsers ignore embedded whitespace and control characters in URL schemes.
        let normalized: String = attr
            .value
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .flat_map(char::to_lowercase)
            .collect();
        !normalized.contains(SCRIPT_MARKER)
    }
}

/// Limits `depth` to [`MAX_DEPTH_CEILING`].
pub fn clamp_depth(depth: usize) -> usize {
    if depth > MAX_DEPTH_CEILING {
        warn!("max_depth {depth} exceeds {MAX_DEPTH_CEILING}, clamping");
        MAX_DEPTH_CEILING
    } else {
        depth
    }
}

/// Hands every entity span to every formatter, outer spans before inner ones.
///
/// A formatter that panics is treated like one that returned an error.
fn attach_formatters(
    nodes: &mut [RenderNode],
    formatters: &[Box<dyn TextFormatter>],
) -> Result<(), RenderFailure> {
    for node in nodes {
        if let RenderNode::Element(el) = node {
            if el.is_entity() {
                let classes = el.class_list();
                for formatter in formatters {
                    run_formatter(&**formatter, el, &classes)?;
                }
            }
            attach_formatters(&mut el.children, formatters)?;
        }
    }
    Ok(())
}

fn run_formatter(
    formatter: &dyn TextFormatter,
    element: &mut Element,
    classes: &ClassList,
) -> Result<(), FormatterError> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        formatter.register_event_listeners(element, classes)
    }))
    .unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(FormatterError {
            formatter: formatter.name().to_string(),
            message: format!("panicked: {message}"),
        })
    })
}
