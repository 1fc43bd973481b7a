//! # XPath evaluation
//!
//! A thin layer over `sxd-xpath` that resolves the TEI namespace prefixes and
//! returns the result shapes the parsers work with: the first node, a forward
//! node iterator, or a string, boolean or number value.
//!
//! Prefix resolution follows one rule: `xml` maps to the XML namespace and every
//! other prefix, bound or not, maps to the TEI namespace.

use displaydoc::Display;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use sxd_document::dom::{Attribute, ChildOfElement, ChildOfRoot, Document, Element};
use sxd_document::Package;
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value, XPath};
use thiserror::Error;
use tracing::trace;

/// The TEI namespace URI
pub const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";
/// The XML namespace URI
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

static PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z_][A-Za-z0-9_.\-]*):([^:]|$)").unwrap());

/// Error when compiling or evaluating an expression
#[derive(Debug, Error, Display)]
pub enum XPathError {
    /// Could not compile `{expr}`: {reason}
    Compile { expr: String, reason: String },
    /// Could not evaluate `{expr}`: {reason}
    Execute { expr: String, reason: String },
}

/// Error when loading an XML document
#[derive(Debug, Error, Display)]
pub enum DocumentError {
    /// The document is not well-formed XML: {0}
    Malformed(String),
    /// The document has no root element
    MissingRoot,
}

fn resolve_prefix(prefix: &str) -> &'static str {
    match prefix {
        "xml" => XML_NS,
        _ => TEI_NS,
    }
}

/// A parsed XML document
pub struct TeiDocument {
    package: Package,
}

impl TeiDocument {
    /// Parse the XML text into a document
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let package = sxd_document::parser::parse(xml)
            .map_err(|err| DocumentError::Malformed(format!("{:?}", err)))?;
        Ok(Self { package })
    }

    pub fn document(&self) -> Document<'_> {
        self.package.as_document()
    }
}

/// The document element
pub fn root_element<'d>(document: &Document<'d>) -> Option<Element<'d>> {
    document
        .root()
        .children()
        .into_iter()
        .find_map(|child| match child {
            ChildOfRoot::Element(element) => Some(element),
            _ => None,
        })
}

/// The child elements of an element, in document order
pub fn child_elements<'d>(element: Element<'d>) -> Vec<Element<'d>> {
    element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Element(element) => Some(element),
            _ => None,
        })
        .collect()
}

/// The name of an attribute as written in the source, e.g. `xml:id`
pub fn qualified_name(attribute: &Attribute<'_>) -> String {
    let name = attribute.name();
    match (name.namespace_uri(), attribute.preferred_prefix()) {
        (Some(XML_NS), _) => format!("xml:{}", name.local_part()),
        (Some(_), Some(prefix)) => format!("{}:{}", prefix, name.local_part()),
        _ => name.local_part().to_owned(),
    }
}

fn as_element(node: Node<'_>) -> Option<Element<'_>> {
    match node {
        Node::Element(element) => Some(element),
        _ => None,
    }
}

/// A forward-only pass over the nodes an expression selected.
///
/// Iterating a second time requires evaluating the expression again.
pub struct NodeIter<'d> {
    inner: std::vec::IntoIter<Node<'d>>,
}

impl<'d> NodeIter<'d> {
    /// Only the element nodes of this iterator
    pub fn elements(self) -> impl Iterator<Item = Element<'d>> {
        self.inner.filter_map(as_element)
    }
}

impl<'d> Iterator for NodeIter<'d> {
    type Item = Node<'d>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Evaluates XPath expressions against nodes of one document.
///
/// Compiled expressions are cached, so repeated selectors from a schema are
/// only parsed once per pass.
pub struct XPathEvaluator<'d> {
    factory: Factory,
    context: RefCell<Context<'d>>,
    compiled: RefCell<HashMap<String, Rc<XPath>>>,
}

impl<'d> Default for XPathEvaluator<'d> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'d> XPathEvaluator<'d> {
    pub fn new() -> Self {
        let mut context = Context::new();
        context.set_namespace("tei", TEI_NS);
        context.set_namespace("xml", XML_NS);
        Self {
            factory: Factory::new(),
            context: RefCell::new(context),
            compiled: RefCell::new(HashMap::new()),
        }
    }

    fn compile(&self, expr: &str) -> Result<Rc<XPath>, XPathError> {
        if let Some(xpath) = self.compiled.borrow().get(expr) {
            return Ok(Rc::clone(xpath));
        }

        {
            let mut context = self.context.borrow_mut();
            for caps in PREFIX.captures_iter(expr) {
                let prefix = &caps[1];
                context.set_namespace(prefix, resolve_prefix(prefix));
            }
        }

        trace!("Compiling {:?}", expr);
        let xpath = self
            .factory
            .build(expr)
            .map_err(|err| XPathError::Compile {
                expr: expr.to_owned(),
                reason: err.to_string(),
            })?
            .ok_or_else(|| XPathError::Compile {
                expr: expr.to_owned(),
                reason: "empty expression".to_owned(),
            })?;
        let xpath = Rc::new(xpath);
        self.compiled
            .borrow_mut()
            .insert(expr.to_owned(), Rc::clone(&xpath));
        Ok(xpath)
    }

    /// Evaluate `expr` with `node` as the context node
    pub fn evaluate<N>(&self, node: N, expr: &str) -> Result<Value<'d>, XPathError>
    where
        N: Into<Node<'d>>,
    {
        let xpath = self.compile(expr)?;
        let context = self.context.borrow();
        xpath
            .evaluate(&*context, node)
            .map_err(|err| XPathError::Execute {
                expr: expr.to_owned(),
                reason: err.to_string(),
            })
    }

    /// The first selected node in document order
    pub fn first_node<N>(&self, node: N, expr: &str) -> Result<Option<Node<'d>>, XPathError>
    where
        N: Into<Node<'d>>,
    {
        match self.evaluate(node, expr)? {
            Value::Nodeset(nodes) => Ok(nodes.document_order().into_iter().next()),
            _ => Ok(None),
        }
    }

    /// The first selected node, if it is an element
    pub fn first_element<N>(&self, node: N, expr: &str) -> Result<Option<Element<'d>>, XPathError>
    where
        N: Into<Node<'d>>,
    {
        Ok(self.first_node(node, expr)?.and_then(as_element))
    }

    /// All selected nodes in document order
    pub fn node_iter<N>(&self, node: N, expr: &str) -> Result<NodeIter<'d>, XPathError>
    where
        N: Into<Node<'d>>,
    {
        match self.evaluate(node, expr)? {
            Value::Nodeset(nodes) => Ok(NodeIter {
                inner: nodes.document_order().into_iter(),
            }),
            other => Err(XPathError::Execute {
                expr: expr.to_owned(),
                reason: format!("expected a node-set, got {:?}", other),
            }),
        }
    }

    pub fn string<N>(&self, node: N, expr: &str) -> Result<String, XPathError>
    where
        N: Into<Node<'d>>,
    {
        Ok(self.evaluate(node, expr)?.string())
    }

    pub fn boolean<N>(&self, node: N, expr: &str) -> Result<bool, XPathError>
    where
        N: Into<Node<'d>>,
    {
        Ok(self.evaluate(node, expr)?.boolean())
    }

    pub fn number<N>(&self, node: N, expr: &str) -> Result<f64, XPathError>
    where
        N: Into<Node<'d>>,
    {
        Ok(self.evaluate(node, expr)?.number())
    }
}
