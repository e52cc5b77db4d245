//! Visual tree – the element tree templates render into.
//!
//! Elements carry symbolic style tokens in their `class` attribute and
//! literal declarations in their `style` attribute, exactly like HTML, and
//! serialise to HTML for on-screen preview. We support a controlled subset:
//! - Structural: div, p, h1-h3, ul, li, img
//! - Inline: span

use std::collections::BTreeMap;
use std::fmt::Write as _;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// The tag name of a supported element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Div,
    P,
    H1,
    H2,
    H3,
    Ul,
    Li,
    Span,
    Img,
    Body,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Tag::Div => "div",
            Tag::P => "p",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::Ul => "ul",
            Tag::Li => "li",
            Tag::Span => "span",
            Tag::Img => "img",
            Tag::Body => "body",
        }
    }

    pub fn is_inline(self) -> bool {
        matches!(self, Tag::Span)
    }

    /// Paragraph-like blocks whose inline content flows as one text run.
    pub fn is_paragraph(self) -> bool {
        matches!(self, Tag::P | Tag::H1 | Tag::H2 | Tag::H3)
    }

    pub fn is_void(self) -> bool {
        matches!(self, Tag::Img)
    }
}

/// A node in the visual tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element node carrying tag, attributes, and children.
///
/// Attributes are kept ordered so that rendering the same input twice always
/// serialises identically.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    // -- builder helpers ---------------------------------------------------

    pub fn class(mut self, classes: &str) -> Self {
        let joined = match self.attributes.get("class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {classes}"),
            _ => classes.to_string(),
        };
        self.attributes.insert("class".into(), joined.trim().to_string());
        self
    }

    pub fn attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn style(mut self, prop: &str, value: &str) -> Self {
        self.set_style(prop, value);
        self
    }

    pub fn child(mut self, node: impl Into<DomNode>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<DomNode>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(DomNode::Text(text.into()))
    }

    // -- accessors ---------------------------------------------------------

    pub fn element_id(&self) -> Option<&str> {
        self.attributes.get("id").map(|s| s.as_str())
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().contains(&class)
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attributes.get("style").map(|s| s.as_str())
    }

    pub fn src(&self) -> Option<&str> {
        self.attributes.get("src").map(|s| s.as_str())
    }

    /// Parsed `(property, value)` pairs of the inline style, in order.
    pub fn style_declarations(&self) -> Vec<(String, String)> {
        self.inline_style()
            .map(parse_declarations)
            .unwrap_or_default()
    }

    /// True when the inline style already declares `prop`.
    pub fn has_style_property(&self, prop: &str) -> bool {
        self.style_declarations()
            .iter()
            .any(|(p, _)| p.eq_ignore_ascii_case(prop))
    }

    /// Append a declaration to the inline style without touching existing ones.
    pub fn push_style(&mut self, prop: &str, value: &str) {
        let decl = format!("{prop}: {value}");
        let updated = match self.inline_style().map(str::trim) {
            Some(existing) if !existing.is_empty() => {
                format!("{}; {decl}", existing.trim_end_matches(';'))
            }
            _ => decl,
        };
        self.attributes.insert("style".into(), updated);
    }

    /// Set a declaration, replacing any earlier value for the same property.
    pub fn set_style(&mut self, prop: &str, value: &str) {
        let mut decls: Vec<(String, String)> = self
            .style_declarations()
            .into_iter()
            .filter(|(p, _)| !p.eq_ignore_ascii_case(prop))
            .collect();
        decls.push((prop.to_string(), value.to_string()));
        let joined = decls
            .iter()
            .map(|(p, v)| format!("{p}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        self.attributes.insert("style".into(), joined);
    }

    /// Depth-first search for a descendant (or self) with the given id.
    pub fn find_by_id(&self, id: &str) -> Option<&ElementNode> {
        if self.element_id() == Some(id) {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.find_by_id(id))
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &ElementNode> {
        self.children.iter().filter_map(|c| match c {
            DomNode::Element(e) => Some(e),
            DomNode::Text(_) => None,
        })
    }

    /// Visit every descendant element (not `self`) exactly once, pre-order.
    pub fn for_each_descendant_mut(&mut self, f: &mut dyn FnMut(&mut ElementNode)) {
        for child in &mut self.children {
            if let DomNode::Element(e) = child {
                f(e);
                e.for_each_descendant_mut(f);
            }
        }
    }

    /// Concatenated text content of the subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Serialise the subtree as HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

impl From<ElementNode> for DomNode {
    fn from(e: ElementNode) -> Self {
        DomNode::Element(e)
    }
}

impl From<&str> for DomNode {
    fn from(s: &str) -> Self {
        DomNode::Text(s.to_string())
    }
}

impl From<String> for DomNode {
    fn from(s: String) -> Self {
        DomNode::Text(s)
    }
}

/// Shorthand constructor used throughout the templates.
pub fn el(tag: Tag) -> ElementNode {
    ElementNode::new(tag)
}

/// The live page: the body every rendered surface is attached to.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub body: ElementNode,
}

impl Document {
    pub fn new(children: Vec<DomNode>) -> Self {
        Self {
            body: ElementNode {
                tag: Tag::Body,
                attributes: BTreeMap::new(),
                children,
            },
        }
    }

    pub fn find_by_id(&self, id: &str) -> Option<&ElementNode> {
        self.body.find_by_id(id)
    }

    pub fn to_html(&self) -> String {
        self.body.to_html()
    }
}

// ---------------------------------------------------------------------------
// Serialisation helpers
// ---------------------------------------------------------------------------

/// Split a `prop: value; prop: value` string into trimmed pairs.
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, val) = decl.split_once(':')?;
            let prop = prop.trim();
            let val = val.trim();
            if prop.is_empty() {
                None
            } else {
                Some((prop.to_ascii_lowercase(), val.to_string()))
            }
        })
        .collect()
}

fn collect_text(e: &ElementNode, out: &mut String) {
    for child in &e.children {
        match child {
            DomNode::Text(t) => out.push_str(t),
            DomNode::Element(c) => collect_text(c, out),
        }
    }
}

fn write_element(e: &ElementNode, out: &mut String) {
    let _ = write!(out, "<{}", e.tag.name());
    for (k, v) in &e.attributes {
        let _ = write!(out, " {}=\"{}\"", k, escape(v));
    }
    out.push('>');
    if e.tag.is_void() {
        return;
    }
    for child in &e.children {
        match child {
            DomNode::Text(t) => out.push_str(&escape(t)),
            DomNode::Element(c) => write_element(c, out),
        }
    }
    let _ = write!(out, "</{}>", e.tag.name());
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
