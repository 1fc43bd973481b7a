//! # The document model
//!
//! This module follows the general JSON serialization of ProseMirror nodes, so
//! that a parsed tree can be handed to the editing surface as it is and an edited
//! tree can come back the same way.
//!
//! Text leaves carry `text` and `marks`, every other node carries `content`.
//! Which kind of node a `type` stands for is decided by the section schema.
pub mod header;

use crate::schema::section::SectionConfig;
use derive_new::new;
use serde::{de::Error as _, Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub use header::{HeaderData, HeaderItem, HeaderValue};

/// The node type of the implicit text leaf
pub const TEXT: &str = "text";
/// The node type of a document wrapper
pub const DOC: &str = "doc";

/// A scalar attribute value
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Number(n) if n.is_nan() => f.write_str("NaN"),
            AttrValue::Number(n) if n.is_infinite() && *n > 0.0 => f.write_str("Infinity"),
            AttrValue::Number(n) if n.is_infinite() => f.write_str("-Infinity"),
            AttrValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            AttrValue::Number(n) => write!(f, "{}", n),
            AttrValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::String(s)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

pub type Attrs = BTreeMap<String, AttrValue>;

/// A mark on a text leaf
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new)]
pub struct Mark {
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Attrs>,
}

/// A text leaf
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TextNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Attrs>,
    pub text: String,
    #[serde(default)]
    pub marks: Vec<Mark>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A block, wrapping, inline container or nested node
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ElementNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Attrs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentNode>>,
    #[serde(default, rename = "nestedDoc", skip_serializing_if = "is_false")]
    pub nested_doc: bool,
}

/// A node of a content tree
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ContentNode {
    Text(TextNode),
    Element(ElementNode),
}

impl ContentNode {
    /// A text leaf of type `text`
    pub fn text<S: Into<String>>(text: S, marks: Vec<Mark>) -> Self {
        ContentNode::Text(TextNode {
            node_type: TEXT.to_owned(),
            attrs: None,
            text: text.into(),
            marks,
        })
    }

    pub fn element<S: Into<String>>(
        node_type: S,
        attrs: Option<Attrs>,
        content: Option<Vec<ContentNode>>,
    ) -> Self {
        ContentNode::Element(ElementNode {
            node_type: node_type.into(),
            attrs,
            content,
            nested_doc: false,
        })
    }

    /// A document wrapper around `content`
    pub fn doc(content: Vec<ContentNode>) -> Self {
        Self::element(DOC, None, Some(content))
    }

    pub fn node_type(&self) -> &str {
        match self {
            ContentNode::Text(node) => &node.node_type,
            ContentNode::Element(node) => &node.node_type,
        }
    }

    pub fn attrs(&self) -> Option<&Attrs> {
        match self {
            ContentNode::Text(node) => node.attrs.as_ref(),
            ContentNode::Element(node) => node.attrs.as_ref(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs().and_then(|attrs| attrs.get(name))
    }

    /// The text of a leaf
    pub fn text_value(&self) -> Option<&str> {
        match self {
            ContentNode::Text(node) => Some(&node.text),
            ContentNode::Element(_) => None,
        }
    }

    pub fn marks(&self) -> &[Mark] {
        match self {
            ContentNode::Text(node) => &node.marks,
            ContentNode::Element(_) => &[],
        }
    }

    /// The children, `None` for leaves and childless containers
    pub fn content(&self) -> Option<&[ContentNode]> {
        match self {
            ContentNode::Element(node) => node.content.as_deref(),
            ContentNode::Text(_) => None,
        }
    }

    pub fn is_nested_doc(&self) -> bool {
        matches!(self, ContentNode::Element(node) if node.nested_doc)
    }
}

/// Nested documents by node type and `id`
pub type NestedDocs = BTreeMap<String, BTreeMap<String, ContentNode>>;

/// A parsed text section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TextDocument {
    pub doc: ContentNode,
    #[serde(default)]
    pub nested: NestedDocs,
}

impl TextDocument {
    pub fn empty() -> Self {
        Self {
            doc: ContentNode::doc(Vec::new()),
            nested: NestedDocs::new(),
        }
    }
}

/// One separately addressable document of a multi-text section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new)]
pub struct Fragment {
    pub id: Option<String>,
    pub text: ContentNode,
}

/// The parsed data of one section
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionData {
    Text(TextDocument),
    Metadata(HeaderData),
    MultiText(Vec<Fragment>),
}

impl SectionData {
    /// Read the data of `section` from its JSON form
    pub fn from_json(section: &SectionConfig, value: Value) -> serde_json::Result<Self> {
        Ok(match section {
            SectionConfig::Text(_) => SectionData::Text(serde_json::from_value(value)?),
            SectionConfig::Metadata(_) => SectionData::Metadata(serde_json::from_value(value)?),
            SectionConfig::MultiText(_) => SectionData::MultiText(serde_json::from_value(value)?),
        })
    }
}

/// The parsed data of all sections, by section name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DocumentData(pub BTreeMap<String, SectionData>);

impl DocumentData {
    pub fn get(&self, name: &str) -> Option<&SectionData> {
        self.0.get(name)
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, data: SectionData) {
        self.0.insert(name.into(), data);
    }

    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Read the data of every configured section present in `value`
    pub fn from_json<'a, I>(sections: I, value: Value) -> serde_json::Result<Self>
    where
        I: IntoIterator<Item = &'a SectionConfig>,
    {
        let mut map = match value {
            Value::Object(map) => map,
            _ => return Err(serde_json::Error::custom("expected an object of sections")),
        };
        let mut data = DocumentData::default();
        for section in sections {
            if let Some(section_value) = map.remove(section.name()) {
                data.insert(section.name(), SectionData::from_json(section, section_value)?);
            }
        }
        Ok(data)
    }
}
