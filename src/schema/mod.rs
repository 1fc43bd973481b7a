//! # Section schemas
//!
//! The schema is pure data: an ordered list of node descriptors, each with one or
//! more XPath parsers that map TEI elements to content nodes and a serializer that
//! maps them back. Nothing in the core knows about particular TEI tags.
pub mod editor;
pub mod header;
pub mod section;

use crate::model::AttrValue;
use serde::Deserialize;
use std::collections::BTreeMap;

pub use header::{Deduplicate, HeaderSchema, MergeTarget};
pub use section::{Config, SectionConfig};

/// The kind of a schema entry
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A block node with inline content
    Block,
    /// A text leaf or an inline container
    Inline,
    /// A block node wrapping other blocks
    Wrapping,
    /// A mark on text
    Mark,
    /// A block node that is a document of its own
    Nested,
}

/// How a parser turns its selector into a value
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Boolean,
    Number,
    Static,
    String,
}

impl Default for ValueKind {
    fn default() -> Self {
        ValueKind::String
    }
}

/// One way of recognising a node, mark or attribute
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParserSpec {
    pub selector: String,
    #[serde(rename = "type", default)]
    pub kind: ValueKind,
    /// The fixed value of a `static` parser
    #[serde(default)]
    pub value: Option<AttrValue>,
    /// Decode table from raw tokens to values
    #[serde(default)]
    pub values: Option<BTreeMap<String, AttrValue>>,
    /// Where the text of an inline node comes from
    #[serde(default)]
    pub text: Option<String>,
}

impl ParserSpec {
    /// Decode a raw string with the `values` table, token by token if the whole
    /// string is not a key. The last mapped token wins.
    pub fn decode(&self, raw: &str) -> Option<AttrValue> {
        match &self.values {
            Some(values) => values.get(raw).cloned().or_else(|| {
                raw.split_whitespace()
                    .filter_map(|token| values.get(token))
                    .last()
                    .cloned()
            }),
            None => Some(AttrValue::from(raw)),
        }
    }
}

/// A single `parser` or a list of `parsers`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Parsers {
    #[serde(default)]
    parser: Option<ParserSpec>,
    #[serde(default)]
    parsers: Vec<ParserSpec>,
}

impl Parsers {
    /// The parsers in the order they are tried. A single `parser` takes precedence.
    pub fn as_slice(&self) -> &[ParserSpec] {
        match &self.parser {
            Some(parser) => std::slice::from_ref(parser),
            None => &self.parsers,
        }
    }
}

impl From<Vec<ParserSpec>> for Parsers {
    fn from(parsers: Vec<ParserSpec>) -> Self {
        Self {
            parser: None,
            parsers,
        }
    }
}

/// How an attribute is written back
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttrSerializer {
    /// The XML attribute to write, or `text()` for the element text
    pub attr: String,
    /// Template with a `{value}` placeholder
    #[serde(default)]
    pub value: Option<String>,
    /// Encode table from values to raw tokens
    #[serde(default)]
    pub values: Option<BTreeMap<String, String>>,
}

/// The target of `text()` attribute serializers
pub const TEXT_TARGET: &str = "text()";

impl AttrSerializer {
    /// The raw value for `value`, if it can be encoded
    pub fn encode(&self, value: &AttrValue) -> Option<String> {
        let value = value.to_string();
        if let Some(values) = &self.values {
            values.get(&value).cloned()
        } else if let Some(template) = &self.value {
            Some(template.replacen("{value}", &value, 1))
        } else {
            Some(value)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttrSchema {
    #[serde(flatten)]
    pub parsers: Parsers,
    /// The default shown by the editing surface
    #[serde(default)]
    pub default: Option<AttrValue>,
    #[serde(default)]
    pub serializer: Option<AttrSerializer>,
}

/// A static attribute value, either plain or as `{value = ...}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StaticAttr {
    Plain(String),
    Valued { value: String },
}

impl StaticAttr {
    pub fn value(&self) -> &str {
        match self {
            StaticAttr::Plain(value) => value,
            StaticAttr::Valued { value } => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextSerializer {
    pub attr: String,
}

/// How a node or mark is written back
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodeSerializer {
    /// The element to write; marks without a tag reuse the tag of their node
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub attrs: BTreeMap<String, StaticAttr>,
    /// Write the text into this attribute instead of the element
    #[serde(default)]
    pub text: Option<TextSerializer>,
}

/// A link from a node to a nested document
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reference {
    /// The nested node type
    #[serde(rename = "type")]
    pub node_type: String,
    /// The attribute holding the nested document's id
    pub attr: String,
}

/// A node or mark of a section schema
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Read the element's text and inline children like an inline node,
    /// whatever its kind
    #[serde(default)]
    pub inline: bool,
    /// The child type of wrapping nodes
    #[serde(default)]
    pub content: Option<String>,
    #[serde(flatten)]
    pub parsers: Parsers,
    #[serde(default)]
    pub attrs: Option<BTreeMap<String, AttrSchema>>,
    #[serde(default)]
    pub serializer: Option<NodeSerializer>,
    #[serde(default)]
    pub reference: Option<Reference>,
}

impl NodeSchema {
    /// Whether the node is parsed and serialized with inline content
    pub fn is_inline(&self) -> bool {
        self.inline || self.kind == NodeKind::Inline
    }

    pub fn is_mark(&self) -> bool {
        self.kind == NodeKind::Mark
    }

    /// The declared serializer for `attr`
    pub fn attr_serializer(&self, attr: &str) -> Option<&AttrSerializer> {
        self.attrs
            .as_ref()
            .and_then(|attrs| attrs.get(attr))
            .and_then(|schema| schema.serializer.as_ref())
    }
}

/// Find the one schema entry named `name` that can be serialized.
///
/// Returns `None` when there is no such entry or the name is ambiguous.
pub fn serializable<'s>(schema: &'s [NodeSchema], name: &str) -> Option<(&'s NodeSchema, &'s NodeSerializer)> {
    let mut found = schema
        .iter()
        .filter(|entry| entry.name == name)
        .filter_map(|entry| entry.serializer.as_ref().map(|ser| (entry, ser)));
    match (found.next(), found.next()) {
        (Some(entry), None) => Some(entry),
        _ => None,
    }
}
