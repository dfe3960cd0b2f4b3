//! Parsed document model
//!
//! Wraps a `scraper` parse tree behind a small node handle so the extractors
//! only depend on three traversal primitives: ordered children, pre-order
//! descendants and derived text.

use std::fmt;

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node};

/// A parsed HTML document, owned by the request that parsed it.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a full HTML document. html5ever never fails; malformed markup
    /// is recovered the way browsers do it.
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// The document root. It has no tag name; `<html>` is its child.
    pub fn root(&self) -> DomNode<'_> {
        DomNode {
            node: self.html.tree.root(),
        }
    }

    /// Serialize a node back to markup. Element nodes serialize their outer
    /// HTML, the document root serializes the whole document.
    pub fn serialize(&self, node: DomNode<'_>) -> String {
        match ElementRef::wrap(node.node) {
            Some(element) => element.html(),
            None => self.html.html(),
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root())
            .finish()
    }
}

/// Handle to a single node in a [`Document`].
#[derive(Clone, Copy, PartialEq)]
pub struct DomNode<'a> {
    node: NodeRef<'a, Node>,
}

impl<'a> DomNode<'a> {
    /// Element name, `None` for text, comments and the document root.
    pub fn tag_name(&self) -> Option<&'a str> {
        self.node.value().as_element().map(|el| el.name())
    }

    pub fn is_element(&self) -> bool {
        self.node.value().is_element()
    }

    /// Raw attribute value.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.node.value().as_element().and_then(|el| el.attr(name))
    }

    /// Attribute value split into whitespace-separated tokens.
    pub fn attr_tokens(&self, name: &str) -> Vec<&'a str> {
        self.attr(name)
            .map(|value| value.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Direct children in document order, text nodes included.
    pub fn children(&self) -> impl Iterator<Item = DomNode<'a>> + 'a {
        self.node.children().map(|node| DomNode { node })
    }

    /// All descendants in pre-order, excluding this node.
    pub fn descendants(&self) -> impl Iterator<Item = DomNode<'a>> + 'a {
        self.node.descendants().skip(1).map(|node| DomNode { node })
    }

    /// Every descendant text node, each trimmed, joined with no separator.
    ///
    /// `<td>\n <span>Foo</span>\n <span>Bar</span>\n</td>` gives `FooBar`.
    pub fn text(&self) -> String {
        self.node
            .descendants()
            .filter_map(|node| node.value().as_text())
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .collect()
    }
}

impl fmt::Debug for DomNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node.value() {
            Node::Element(el) => write!(f, "<{}>", el.name()),
            Node::Text(text) => write!(f, "{:?}", &**text),
            Node::Document => f.write_str("#document"),
            other => write!(f, "{other:?}"),
        }
    }
}
