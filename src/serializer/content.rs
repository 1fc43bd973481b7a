//! # Content schema serializer
//!
//! The inverse of the content parser. Attribute values go through the encode
//! tables of the schema, marks either become attributes and tags of the node
//! they sit on or, when they need different tags, nested elements.
use super::tree::AbstractElement;
use crate::model::{AttrValue, ContentNode, ElementNode, Mark, DOC};
use crate::schema::{serializable, NodeSchema, NodeSerializer, TEXT_TARGET};
use std::collections::BTreeSet;
use tracing::{trace, warn};

/// The nested documents referenced during one pass, by node type, in the order
/// they were first referenced
#[derive(Debug, Default)]
pub struct References {
    entries: Vec<(String, Vec<String>)>,
}

impl References {
    pub fn record(&mut self, node_type: &str, id: String) {
        match self.entries.iter_mut().find(|(ty, _)| ty == node_type) {
            Some((_, ids)) => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            None => self.entries.push((node_type.to_owned(), vec![id])),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(ty, ids)| ids.iter().map(move |id| (ty.as_str(), id.as_str())))
    }
}

pub struct ContentSerializer<'a> {
    schema: &'a [NodeSchema],
}

impl<'a> ContentSerializer<'a> {
    pub fn new(schema: &'a [NodeSchema]) -> Self {
        Self { schema }
    }

    /// Serialize `node` and its content.
    ///
    /// Returns `None` for nodes without a unique serializer and for elements that
    /// would be empty.
    pub fn serialize_node(
        &self,
        node: &ContentNode,
        references: &mut References,
    ) -> Option<AbstractElement> {
        let (entry, serializer) = match serializable(self.schema, node.node_type()) {
            Some(found) => found,
            None => {
                trace!("No serializer for {}", node.node_type());
                return None;
            }
        };
        let tag = match &serializer.tag {
            Some(tag) => tag,
            None => {
                warn!("The serializer for {} has no tag", entry.name);
                return None;
            }
        };

        let mut element = AbstractElement::new(tag.as_str());
        for (name, value) in &serializer.attrs {
            element.push_attr(name.as_str(), value.value());
        }
        for (name, value) in node.attrs().into_iter().flatten() {
            write_attr(&mut element, entry, name, value);
        }

        if entry.is_inline() {
            match node {
                ContentNode::Element(ElementNode {
                    content: Some(content),
                    ..
                }) => match content.as_slice() {
                    [] => {}
                    [child] if child.marks().is_empty() => {
                        let text = self
                            .serialize_node(child, references)
                            .and_then(|child| child.text);
                        write_text(&mut element, serializer, text);
                    }
                    children => element.children.extend(
                        children
                            .iter()
                            .filter_map(|child| self.serialize_node(child, references)),
                    ),
                },
                ContentNode::Text(text) => {
                    write_text(&mut element, serializer, Some(text.text.clone()))
                }
                ContentNode::Element(_) => {}
            }
            self.apply_marks(&mut element, node.marks());
        } else if let Some(content) = node.content() {
            for child in content {
                if child.node_type() == DOC {
                    for inner in child.content().unwrap_or_default() {
                        element.children.extend(self.serialize_node(inner, references));
                    }
                } else {
                    element.children.extend(self.serialize_node(child, references));
                }
            }
        }

        if let Some(reference) = &entry.reference {
            if let Some(id) = node.attr(&reference.attr) {
                references.record(&reference.node_type, id.to_string());
            }
        }

        if element.is_empty() {
            None
        } else {
            Some(element)
        }
    }

    fn mark_element(&self, mark: &Mark, default_tag: &str) -> Option<AbstractElement> {
        let (entry, serializer) = serializable(self.schema, &mark.mark_type)?;
        let mut element = AbstractElement::new(serializer.tag.as_deref().unwrap_or(default_tag));
        for (name, value) in &serializer.attrs {
            element.push_attr(name.as_str(), value.value());
        }
        for (name, value) in mark.attrs.iter().flatten() {
            if let Some(attr) = entry.attr_serializer(name) {
                if let Some(raw) = attr.encode(value) {
                    element.push_attr(attr.attr.as_str(), raw);
                }
            }
        }
        Some(element)
    }

    // Marks sharing one tag are folded into the element. Marks with different
    // tags nest, sorted by tag, with the text moving to the innermost element.
    fn apply_marks(&self, element: &mut AbstractElement, marks: &[Mark]) {
        let mut candidates: Vec<AbstractElement> = marks
            .iter()
            .filter_map(|mark| self.mark_element(mark, &element.tag))
            .collect();
        let tags: BTreeSet<&str> = candidates.iter().map(|c| c.tag.as_str()).collect();
        let nest = tags.len() > 1;

        if !nest {
            for candidate in candidates {
                element.tag = candidate.tag;
                element.extend_attrs(candidate.attrs);
            }
            return;
        }

        candidates.sort_by(|a, b| a.tag.cmp(&b.tag));
        let mut levels: Vec<AbstractElement> = Vec::new();
        for candidate in candidates {
            match levels.last_mut() {
                Some(level) if level.tag == candidate.tag => level.extend_attrs(candidate.attrs),
                _ => levels.push(candidate),
            }
        }

        let mut levels = levels.into_iter();
        if let Some(outer) = levels.next() {
            element.tag = outer.tag;
            element.extend_attrs(outer.attrs);
        }
        let mut text = element.text.take();
        let innermost = levels.rev().fold(None, |inner, mut level: AbstractElement| {
            match inner {
                Some(child) => level.children.push(child),
                None => level.text = text.take(),
            }
            Some(level)
        });
        element.children.extend(innermost);
    }
}

fn write_attr(element: &mut AbstractElement, entry: &NodeSchema, name: &str, value: &AttrValue) {
    let serializer = match entry.attr_serializer(name) {
        Some(serializer) => serializer,
        None => return,
    };
    if let Some(raw) = serializer.encode(value) {
        if serializer.attr == TEXT_TARGET {
            element.text = Some(raw);
        } else {
            element.push_attr(serializer.attr.as_str(), raw);
        }
    }
}

fn write_text(element: &mut AbstractElement, serializer: &NodeSerializer, text: Option<String>) {
    let text = match text.filter(|text| !text.is_empty()) {
        Some(text) => text,
        None => return,
    };
    match &serializer.text {
        Some(target) => element.push_attr(target.attr.as_str(), text),
        None => element.text = Some(text),
    }
}
