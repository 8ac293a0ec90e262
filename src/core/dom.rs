//! # Input Tree
//!
//! The minimal tree the sanitizer walks: text, elements, comments, and
//! opaque pre-serialized subtrees. Parsing goes through `html5ever` with the
//! `markup5ever_rcdom` sink; nothing outside this module sees html5ever types.
//!
//! Conversion from the rcdom tree stops at a caller-supplied depth. Anything
//! deeper is serialized by html5ever (which walks iteratively) and stored as
//! [`Node::Opaque`], so pathological nesting never recurses past the limit
//! here or in the sanitizer.

use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, QualName, local_name, namespace_url, ns, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

use super::sanitizer::RenderFailure;

/// Tags whose text children are serialized without escaping.
const RAW_TEXT_TAGS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// Tags that never carry children or an end tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element {
        /// Local name as parsed: lowercase for HTML, camel case kept for
        /// SVG and MathML (`foreignObject`).
        tag: String,
        /// In the HTML namespace. Raw-text and void rules apply only here.
        html: bool,
        attributes: Vec<Attribute>,
        children: Vec<Node>,
    },
    Comment(String),
    /// Markup of a subtree beyond the conversion depth, already serialized.
    Opaque(String),
}

impl Node {
    pub fn element(tag: &str, attributes: Vec<Attribute>, children: Vec<Node>) -> Self {
        Node::Element {
            tag: tag.to_string(),
            html: true,
            attributes,
            children,
        }
    }

    pub fn text(text: &str) -> Self {
        Node::Text(text.to_string())
    }

    /// Returns the attribute value for `name` (case-insensitive), if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element { attributes, .. } => attributes
                .iter()
                .find(|a| a.name.eq_ignore_ascii_case(name))
                .map(|a| a.value.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self, tag: &str) -> bool {
        matches!(self, Node::Element { tag: t, .. } if t.eq_ignore_ascii_case(tag))
    }

    /// Serializes this node, tags included, the way a browser's `outerHTML` does.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        write_node(&mut out, self, false);
        out
    }
}

/// Parses `input` as a body-context HTML fragment.
///
/// Elements nested more than `max_depth` levels deep are kept as
/// [`Node::Opaque`] markup instead of being converted.
pub fn parse_fragment_nodes(input: &str, max_depth: usize) -> Result<Vec<Node>, RenderFailure> {
    let context = QualName::new(None, ns!(html), local_name!("body"));
    let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new()).one(input);

    let document_children = dom.document.children.borrow();
    // Fragment parsing wraps the result in a synthetic <html> root.
    let root = document_children
        .first()
        .ok_or_else(|| RenderFailure::Parse("fragment parser produced no root".to_string()))?;

    let mut nodes = Vec::new();
    for child in root.children.borrow().iter() {
        if let Some(node) = convert(child, 1, max_depth)? {
            nodes.push(node);
        }
    }
    Ok(nodes)
}

fn convert(handle: &Handle, depth: usize, max_depth: usize) -> Result<Option<Node>, RenderFailure> {
    match &handle.data {
        NodeData::Text { contents } => Ok(Some(Node::Text(contents.borrow().to_string()))),
        NodeData::Comment { contents } => Ok(Some(Node::Comment(contents.to_string()))),
        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            if depth > max_depth {
                return serialize_subtree(handle).map(|markup| Some(Node::Opaque(markup)));
            }

            let attributes = attrs
                .borrow()
                .iter()
                .map(|attr| Attribute {
                    name: match &attr.name.prefix {
                        Some(prefix) => format!("{}:{}", prefix, attr.name.local),
                        None => attr.name.local.to_string(),
                    },
                    value: attr.value.to_string(),
                })
                .collect();

            // <template> keeps its children in a separate document fragment.
            let source = template_contents
                .borrow()
                .clone()
                .unwrap_or_else(|| handle.clone());
            let mut children = Vec::new();
            for child in source.children.borrow().iter() {
                if let Some(node) = convert(child, depth + 1, max_depth)? {
                    children.push(node);
                }
            }

            Ok(Some(Node::Element {
                tag: name.local.to_string(),
                html: name.ns == ns!(html),
                attributes,
                children,
            }))
        }
        NodeData::Document | NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {
            Ok(None)
        }
    }
}

fn serialize_subtree(handle: &Handle) -> Result<String, RenderFailure> {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    serialize(&mut bytes, &SerializableHandle::from(handle.clone()), opts)
        .map_err(|e| RenderFailure::Serialize(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| RenderFailure::Serialize(e.to_string()))
}

// ── Serialization ───────────────────────────────────────────────────────────

fn write_node(out: &mut String, node: &Node, raw_text_parent: bool) {
    match node {
        Node::Text(text) => {
            if raw_text_parent {
                out.push_str(text);
            } else {
                escape_text_into(out, text);
            }
        }
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Node::Opaque(markup) => out.push_str(markup),
        Node::Element {
            tag,
            html,
            attributes,
            children,
        } => {
            out.push('<');
            out.push_str(tag);
            for attr in attributes {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                escape_attribute_into(out, &attr.value);
                out.push('"');
            }
            out.push('>');

            if *html && VOID_TAGS.contains(&tag.as_str()) {
                return;
            }

            let raw = *html && RAW_TEXT_TAGS.contains(&tag.as_str());
            for child in children {
                write_node(out, child, raw);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

/// Escapes text content: `&`, `<`, `>` and no-break spaces.
pub fn escape_text_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

/// Escapes a double-quoted attribute value: `&`, `"` and no-break spaces.
pub fn escape_attribute_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Vec<Node> {
        parse_fragment_nodes(input, 32).unwrap()
    }

    #[test]
    fn plain_text_is_a_single_text_node() {
        assert_eq!(parse("hello there"), vec![Node::text("hello there")]);
    }

    #[test]
    fn span_attributes_and_children_are_converted() {
        let nodes = parse(r#"<span class="mention" data-uid="u1">@Ann</span>"#);
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_element("span"));
        assert_eq!(nodes[0].attribute("class"), Some("mention"));
        assert_eq!(nodes[0].attribute("DATA-UID"), Some("u1"));
        match &nodes[0] {
            Node::Element { children, .. } => assert_eq!(children, &vec![Node::text("@Ann")]),
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn tag_names_are_lowercased() {
        let nodes = parse("<B>loud</B>");
        assert!(nodes[0].is_element("b"));
        assert_eq!(nodes[0].outer_html(), "<b>loud</b>");
    }

    #[test]
    fn foreign_tag_names_keep_their_case() {
        let nodes = parse("<svg><foreignObject>x</foreignObject></svg>");
        assert_eq!(
            nodes[0].outer_html(),
            "<svg><foreignObject>x</foreignObject></svg>"
        );
    }

    #[test]
    fn svg_style_text_is_escaped() {
        let nodes = parse("<svg><style>a &amp; b</style></svg>");
        assert_eq!(nodes[0].outer_html(), "<svg><style>a &amp; b</style></svg>");
        // HTML style stays raw text.
        let nodes = parse("<style>a &amp; b</style>");
        assert_eq!(nodes[0].outer_html(), "<style>a &amp; b</style>");
    }

    #[test]
    fn comments_survive_conversion() {
        let nodes = parse("a<!-- note -->b");
        assert_eq!(nodes[1], Node::Comment(" note ".to_string()));
    }

    #[test]
    fn outer_html_escapes_text_and_attributes() {
        let node = Node::element(
            "b",
            vec![Attribute {
                name: "title".to_string(),
                value: "say \"hi\" & <go>".to_string(),
            }],
            vec![Node::text("1 < 2 & 3")],
        );
        assert_eq!(
            node.outer_html(),
            r#"<b title="say &quot;hi&quot; &amp; <go>">1 &lt; 2 &amp; 3</b>"#
        );
    }

    #[test]
    fn outer_html_leaves_script_bodies_unescaped() {
        let nodes = parse("<script>if (a < b) alert(1)</script>");
        assert_eq!(nodes[0].outer_html(), "<script>if (a < b) alert(1)</script>");
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        let nodes = parse(r#"<img src="x" onerror="alert(1)">"#);
        assert_eq!(nodes[0].outer_html(), r#"<img src="x" onerror="alert(1)">"#);
    }

    #[test]
    fn nesting_beyond_the_limit_becomes_opaque_markup() {
        let input = "<span><span><span>deep</span></span></span>";
        let nodes = parse_fragment_nodes(input, 2).unwrap();
        let Node::Element { children, .. } = &nodes[0] else {
            panic!("expected element");
        };
        let Node::Element { children: inner, .. } = &children[0] else {
            panic!("expected element");
        };
        assert_eq!(inner[0], Node::Opaque("<span>deep</span>".to_string()));
        // Serialization still reproduces the full input.
        assert_eq!(nodes[0].outer_html(), input);
    }

    #[test]
    fn unclosed_tags_are_repaired_not_rejected() {
        let nodes = parse("<b>bold <i>both");
        assert_eq!(nodes[0].outer_html(), "<b>bold <i>both</i></b>");
    }
}
