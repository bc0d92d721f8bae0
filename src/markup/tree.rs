//! Template tree types

use crate::context::Instance;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A value with its source span
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Elements that never have children or a closing tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// A node of a template tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub key: String,
    pub value: String,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// What a listener does when its event fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    /// Write the event's value into a data field
    Model(String),
    /// Call a component method
    Method(String),
}

/// Event listener attached by the `model` and `on` directives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    pub event: String,
    pub modifiers: Vec<String>,
    pub handler: Handler,
}

/// An element with attributes, children, listeners and an optional mount
///
/// `mount` is set when the element hosts a sub-component instance; such an
/// element renders as the instance's output instead of its own children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<Attr>,
    pub children: Vec<Node>,
    pub listeners: Vec<Listener>,
    pub mount: Option<Instance>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push(Attr::new(key, value));
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    /// Replace the value of `key`, appending the attribute if absent
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|a| a.key == key) {
            Some(attr) => attr.value = value,
            None => self.attrs.push(Attr::new(key, value)),
        }
    }

    pub fn is_void(&self) -> bool {
        is_void(&self.tag)
    }
}

/// The first element among `nodes`, skipping text and comments
pub fn first_element(nodes: &[Node]) -> Option<&Element> {
    nodes.iter().find_map(Node::as_element)
}

/// Every element in the tree, in document order
pub fn elements(nodes: &[Node]) -> Vec<&Element> {
    let mut out = Vec::new();
    walk(nodes, &mut out);
    out
}

fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a Element>) {
    for node in nodes {
        if let Node::Element(element) = node {
            out.push(element);
            walk(&element.children, out);
        }
    }
}
