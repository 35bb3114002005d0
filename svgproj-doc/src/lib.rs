//! `svgproj-doc` provides the small owned SVG element tree that `svgproj` reads artwork from
//! and writes projected artwork into.
//!
//! The tree keeps element order and attribute order exactly as they appear in the source, so a
//! document that is loaded and saved again differs only in whitespace. Namespaced names are kept
//! in their prefixed form (`inkscape:label`), and namespace declarations are stored as ordinary
//! `xmlns:*` attributes on the element that declared them.
//!
//! # Example
//!
//! ```
//! use svgproj_doc::{Document, Element};
//!
//! let mut doc = Document::parse(r#"<svg xmlns="http://www.w3.org/2000/svg"><path id="a" d="M0,0 L1,1"/></svg>"#).unwrap();
//! assert_eq!(doc.root.elements().count(), 1);
//!
//! doc.root.append(Element::new("g").with_attr("id", "b"));
//! assert!(doc.to_svg_string().contains(r#"<g id="b"/>"#));
//! ```

mod parse;
mod write;

use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Attribute that marks a group as a layer.
pub const LAYER_MARKER: &str = "inkscape:groupmode";
/// Attribute carrying a layer's human-readable label.
pub const LAYER_LABEL: &str = "inkscape:label";
/// Namespace bound to the `inkscape` prefix.
pub const INKSCAPE_NAMESPACE: &str = "http://www.inkscape.org/namespaces/inkscape";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Could not read or write {path}: {error}")]
    Io { path: PathBuf, error: std::io::Error },
    #[error("{path} is not well-formed XML: {error}")]
    Xml { path: PathBuf, error: roxmltree::Error },
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

/// An SVG element with its ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder flavour of [`Element::set_attr`].
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder flavour of [`Element::append`].
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.append(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn append(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Concatenated text content of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Immediate element children, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Pre-order, depth-first walk over this element and all element descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// `true` for groups that carry the layer marker.
    pub fn is_layer(&self) -> bool {
        self.tag == "g" && self.has_attr(LAYER_MARKER)
    }

    /// The label of a layer group.
    pub fn label(&self) -> Option<&str> {
        self.attr(LAYER_LABEL)
    }

    /// A new, empty layer group carrying the marker and label attributes.
    pub fn layer(name: &str) -> Self {
        Element::new("g")
            .with_attr("style", "display:inline")
            .with_attr(LAYER_LABEL, name)
            .with_attr("id", name)
            .with_attr(LAYER_MARKER, "layer")
    }
}

/// Iterator returned by [`Element::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<&'a Element> {
        let e = self.stack.pop()?;
        let len = self.stack.len();
        self.stack.extend(e.elements());
        self.stack[len..].reverse();
        Some(e)
    }
}

/// A whole SVG document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Document { root }
    }

    pub fn parse(text: &str) -> Result<Self, roxmltree::Error> {
        parse::parse(text).map(Document::new)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|error| DocumentError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        Document::parse(&text).map_err(|error| DocumentError::Xml {
            path: path.to_path_buf(),
            error,
        })
    }

    pub fn to_svg_string(&self) -> String {
        write::to_string(&self.root)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        fs::write(path, self.to_svg_string()).map_err(|error| DocumentError::Io {
            path: path.to_path_buf(),
            error,
        })
    }

    /// First element anywhere in the document whose `id` equals `id`.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.root.descendants().find(|e| e.attr("id") == Some(id))
    }
}
