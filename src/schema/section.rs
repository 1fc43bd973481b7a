//! # Section configuration
//!
//! A document is edited in sections: text sections, metadata sections and
//! multi-text sections. Each section brings its own schema.
use super::{HeaderSchema, NodeSchema, StaticAttr};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Where a metadata section is found if the configuration does not say
pub const DEFAULT_HEADER_TAG: &str = "/tei:TEI/tei:teiHeader";
/// Where a metadata section is written if the configuration does not say
pub const DEFAULT_HEADER_PATH: &str = "tei:teiHeader";

/// The full editor configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
}

impl Config {
    pub fn section(&self, name: &str) -> Option<&SectionConfig> {
        self.sections.iter().find(|section| section.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Selector {
    pub selector: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parts {
    pub parser: Selector,
}

/// Where a section is written in the document
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SectionSerializer {
    /// A `/`-separated element path below the root, e.g. `tei:text/tei:body`
    pub tag: String,
    /// Static attributes of the last element on the path
    #[serde(default)]
    pub attrs: BTreeMap<String, StaticAttr>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextSection {
    pub name: String,
    #[serde(default)]
    pub label: String,
    pub parser: Selector,
    pub serializer: SectionSerializer,
    pub schema: Vec<NodeSchema>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetadataSection {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub serializer: Option<SectionSerializer>,
    pub schema: Vec<HeaderSchema>,
}

impl MetadataSection {
    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or(DEFAULT_HEADER_TAG)
    }

    pub fn path(&self) -> &str {
        self.serializer
            .as_ref()
            .map_or(DEFAULT_HEADER_PATH, |ser| ser.tag.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MultiTextSection {
    pub name: String,
    #[serde(default)]
    pub label: String,
    pub parser: Selector,
    pub parts: Parts,
    #[serde(default)]
    pub serializer: Option<SectionSerializer>,
    pub schema: Vec<NodeSchema>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum SectionConfig {
    #[serde(rename = "TextEditor")]
    Text(TextSection),
    #[serde(rename = "MetadataEditor")]
    Metadata(MetadataSection),
    #[serde(rename = "MultiText")]
    MultiText(MultiTextSection),
}

impl SectionConfig {
    pub fn name(&self) -> &str {
        match self {
            SectionConfig::Text(section) => &section.name,
            SectionConfig::Metadata(section) => &section.name,
            SectionConfig::MultiText(section) => &section.name,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SectionConfig::Text(section) => &section.label,
            SectionConfig::Metadata(section) => &section.label,
            SectionConfig::MultiText(section) => &section.label,
        }
    }

    /// The content schema of text and multi-text sections
    pub fn node_schema(&self) -> Option<&[NodeSchema]> {
        match self {
            SectionConfig::Text(section) => Some(&section.schema),
            SectionConfig::MultiText(section) => Some(&section.schema),
            SectionConfig::Metadata(_) => None,
        }
    }
}
