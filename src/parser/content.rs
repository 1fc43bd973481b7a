//! # Content schema parser
//!
//! Maps TEI elements to content nodes. The first schema entry (in declaration
//! order) with a parser whose selector matches `self::<selector>` decides the node
//! type; elements nothing matches are skipped.
use crate::model::{
    AttrValue, Attrs, ContentNode, ElementNode, Mark, NestedDocs, TextNode, TEXT,
};
use crate::schema::{AttrSchema, NodeKind, NodeSchema, ParserSpec, ValueKind};
use crate::xpath::{child_elements, XPathError, XPathEvaluator};
use std::collections::BTreeMap;
use sxd_document::dom::Element;
use tracing::{trace, warn};

pub struct ContentParser<'a, 'd> {
    xpath: &'a XPathEvaluator<'d>,
    schema: &'a [NodeSchema],
}

impl<'a, 'd> ContentParser<'a, 'd> {
    pub fn new(xpath: &'a XPathEvaluator<'d>, schema: &'a [NodeSchema]) -> Self {
        Self { xpath, schema }
    }

    fn resolve(&self, element: Element<'d>) -> Option<(&'a NodeSchema, &'a ParserSpec)> {
        for entry in self.schema.iter().filter(|entry| !entry.is_mark()) {
            for parser in entry.parsers.as_slice() {
                let expr = format!("self::{}", parser.selector);
                match self.xpath.first_node(element, &expr) {
                    Ok(Some(_)) => return Some((entry, parser)),
                    Ok(None) => {}
                    Err(err) => warn!(node = %entry.name, "{}", err),
                }
            }
        }
        None
    }

    /// Parse `element` and everything below it.
    ///
    /// Nested documents found in block content are moved into `nested` instead of
    /// the content of their parent.
    pub fn parse_node(&self, element: Element<'d>, nested: &mut NestedDocs) -> Option<ContentNode> {
        let (entry, parser) = match self.resolve(element) {
            Some(found) => found,
            None => {
                trace!("No schema entry for <{}>", element.name().local_part());
                return None;
            }
        };
        let attrs = entry
            .attrs
            .as_ref()
            .map(|attrs| self.parse_attrs(element, attrs));

        let node = if entry.is_inline() && entry.name == TEXT {
            self.parse_text_leaf(element, entry, parser, attrs, nested)
        } else if entry.is_inline() {
            let children = child_elements(element);
            let content = if children.is_empty() {
                let text = self.text(element, parser);
                if text.is_empty() {
                    None
                } else {
                    Some(vec![ContentNode::text(text, self.parse_marks(element))])
                }
            } else {
                Some(
                    children
                        .into_iter()
                        .filter_map(|child| self.parse_node(child, nested))
                        .collect(),
                )
            };
            ContentNode::Element(ElementNode {
                node_type: entry.name.clone(),
                attrs,
                content,
                nested_doc: false,
            })
        } else {
            ContentNode::Element(ElementNode {
                node_type: entry.name.clone(),
                attrs,
                content: Some(self.parse_children(element, nested)),
                nested_doc: entry.kind == NodeKind::Nested,
            })
        };
        Some(node)
    }

    /// Parse the child elements of a block, routing nested documents into `nested`
    pub fn parse_children(&self, element: Element<'d>, nested: &mut NestedDocs) -> Vec<ContentNode> {
        let mut content = Vec::new();
        for child in child_elements(element) {
            match self.parse_node(child, nested) {
                Some(node) if node.is_nested_doc() => register_nested(node, nested),
                Some(node) => content.push(node),
                None => {}
            }
        }
        content
    }

    // A text element wrapping exactly one element takes over that element's
    // text and marks, so `<seg><hi>..</hi></seg>` stays one text node.
    fn parse_text_leaf(
        &self,
        element: Element<'d>,
        entry: &NodeSchema,
        parser: &ParserSpec,
        attrs: Option<Attrs>,
        nested: &mut NestedDocs,
    ) -> ContentNode {
        let mut text = self.text(element, parser);
        let mut marks = self.parse_marks(element);
        if let [child] = child_elements(element).as_slice() {
            if let Some(ContentNode::Text(inner)) = self.parse_node(*child, nested) {
                if !inner.text.is_empty() {
                    text = inner.text;
                }
                marks.extend(inner.marks);
            }
        }
        ContentNode::Text(TextNode {
            node_type: entry.name.clone(),
            attrs,
            text,
            marks,
        })
    }

    fn text(&self, element: Element<'d>, parser: &ParserSpec) -> String {
        match parser.text.as_deref() {
            Some(selector) => self.xpath.string(element, selector).unwrap_or_else(|err| {
                warn!("{}", err);
                String::new()
            }),
            None => String::new(),
        }
    }

    fn attr_value(
        &self,
        element: Element<'d>,
        parser: &ParserSpec,
    ) -> Result<Option<AttrValue>, XPathError> {
        let selector = parser.selector.as_str();
        Ok(match parser.kind {
            ValueKind::Boolean => Some(AttrValue::Bool(self.xpath.boolean(element, selector)?)),
            ValueKind::Number => {
                let number = self.xpath.number(element, selector)?;
                if number.is_nan() {
                    None
                } else {
                    Some(AttrValue::Number(number))
                }
            }
            ValueKind::Static => {
                if self.xpath.boolean(element, selector)? {
                    parser.value.clone()
                } else {
                    None
                }
            }
            ValueKind::String => {
                let raw = self.xpath.string(element, selector)?;
                if raw.is_empty() {
                    None
                } else {
                    parser.decode(&raw)
                }
            }
        })
    }

    /// Extract the declared attributes of a node or mark.
    ///
    /// All parsers of an attribute are tried in order; each one that yields a value
    /// replaces the previous one.
    pub fn parse_attrs(&self, element: Element<'d>, attrs: &BTreeMap<String, AttrSchema>) -> Attrs {
        let mut result = Attrs::new();
        for (name, schema) in attrs {
            for parser in schema.parsers.as_slice() {
                match self.attr_value(element, parser) {
                    Ok(Some(value)) => {
                        result.insert(name.clone(), value);
                    }
                    Ok(None) => {}
                    Err(err) => warn!(attr = %name, "{}", err),
                }
            }
        }
        result
    }

    /// The marks of the schema whose selectors hold on `element`
    pub fn parse_marks(&self, element: Element<'d>) -> Vec<Mark> {
        self.schema
            .iter()
            .filter(|entry| entry.is_mark())
            .filter(|entry| {
                entry.parsers.as_slice().iter().any(|parser| {
                    self.xpath
                        .boolean(element, &parser.selector)
                        .unwrap_or_else(|err| {
                            warn!(mark = %entry.name, "{}", err);
                            false
                        })
                })
            })
            .map(|entry| {
                let attrs = entry
                    .attrs
                    .as_ref()
                    .map(|attrs| self.parse_attrs(element, attrs));
                Mark::new(entry.name.clone(), attrs)
            })
            .collect()
    }
}

/// Move a nested document into the side table.
///
/// Its content is wrapped into a `doc` node; a node without `id` cannot be
/// addressed and is dropped.
pub fn register_nested(node: ContentNode, nested: &mut NestedDocs) {
    let id = node.attr("id").map(ToString::to_string);
    match (node, id) {
        (ContentNode::Element(mut element), Some(id)) => {
            let content = element.content.take().unwrap_or_default();
            element.content = Some(vec![ContentNode::doc(content)]);
            nested
                .entry(element.node_type.clone())
                .or_default()
                .insert(id, ContentNode::Element(element));
        }
        (node, _) => warn!("Dropping nested {} without an id", node.node_type()),
    }
}
