//! # Parsing TEI documents
//!
//! A [`TeiParser`] reads the sections of one document. Text sections become
//! content trees with their nested documents, metadata sections become header
//! forests and multi-text sections become lists of fragments.
pub mod content;
pub mod fragments;
pub mod header;

use crate::model::{ContentNode, DocumentData, HeaderData, SectionData, TextDocument};
use crate::schema::section::{MetadataSection, TextSection};
use crate::schema::{Config, SectionConfig};
use crate::xpath::{root_element, DocumentError, TeiDocument, XPathEvaluator};
use content::ContentParser;
use header::HeaderParser;
use sxd_document::dom::{Document, Element};
use tracing::{debug, instrument, warn};

pub struct TeiParser<'d> {
    root: Element<'d>,
    xpath: XPathEvaluator<'d>,
}

impl<'d> TeiParser<'d> {
    pub fn new(document: &Document<'d>) -> Result<Self, DocumentError> {
        let root = root_element(document).ok_or(DocumentError::MissingRoot)?;
        Ok(Self {
            root,
            xpath: XPathEvaluator::new(),
        })
    }

    /// Parse one section
    pub fn section(&self, section: &SectionConfig) -> SectionData {
        debug!(section = section.name(), "Parsing section");
        match section {
            SectionConfig::Text(text) => SectionData::Text(self.text_section(text)),
            SectionConfig::Metadata(meta) => SectionData::Metadata(self.header_section(meta)),
            SectionConfig::MultiText(multi) => {
                SectionData::MultiText(fragments::parse_fragments(&self.xpath, self.root, multi))
            }
        }
    }

    /// Parse every configured section
    pub fn parse_all(&self, config: &Config) -> DocumentData {
        let mut data = DocumentData::default();
        for section in &config.sections {
            data.insert(section.name(), self.section(section));
        }
        data
    }

    pub fn text_section(&self, section: &TextSection) -> TextDocument {
        let root = match self.xpath.first_element(self.root, &section.parser.selector) {
            Ok(Some(root)) => root,
            Ok(None) => {
                debug!(section = %section.name, "No section root");
                return TextDocument::empty();
            }
            Err(err) => {
                warn!(section = %section.name, "{}", err);
                return TextDocument::empty();
            }
        };
        let parser = ContentParser::new(&self.xpath, &section.schema);
        let mut document = TextDocument::empty();
        let content = parser.parse_children(root, &mut document.nested);
        document.doc = ContentNode::doc(content);
        document
    }

    pub fn header_section(&self, section: &MetadataSection) -> HeaderData {
        match self.xpath.first_element(self.root, section.tag()) {
            Ok(Some(header)) => HeaderParser::new(&self.xpath).parse_section(header, &section.schema),
            Ok(None) => {
                debug!(section = %section.name, "No header");
                Default::default()
            }
            Err(err) => {
                warn!(section = %section.name, "{}", err);
                Default::default()
            }
        }
    }
}

/// Parse all sections of `xml`
#[instrument(skip(xml, config))]
pub fn parse(xml: &str, config: &Config) -> Result<DocumentData, DocumentError> {
    let tei = TeiDocument::parse(xml)?;
    let document = tei.document();
    let parser = TeiParser::new(&document)?;
    Ok(parser.parse_all(config))
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::schema::Config;
    use serde_json::json;

    fn config() -> Config {
        serde_json::from_value(json!({"sections": [
            {"type": "MetadataEditor", "name": "metadata",
             "schema": [{"tag": "tei:fileDesc", "children": [{"tag": "tei:titleStmt", "children": [
                {"tag": "tei:title"}
             ]}]}]},
            {"type": "TextEditor", "name": "body",
             "parser": {"selector": "/tei:TEI/tei:text/tei:body"},
             "serializer": {"tag": "tei:text/tei:body"},
             "schema": [
                {"name": "paragraph", "type": "inline", "parser": {"selector": "tei:p", "text": "text()"}},
                {"name": "note", "type": "nested", "parser": {"selector": "tei:note"},
                 "attrs": {"id": {"parser": {"selector": "@xml:id"}}}}
             ]},
            {"type": "TextEditor", "name": "front",
             "parser": {"selector": "/tei:TEI/tei:text/tei:front"},
             "serializer": {"tag": "tei:text/tei:front"},
             "schema": []}
        ]}))
        .unwrap()
    }

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tei:TEI xmlns:tei="http://www.tei-c.org/ns/1.0">
  <tei:teiHeader>
    <tei:fileDesc>
      <tei:titleStmt>
        <tei:title>Letters</tei:title>
      </tei:titleStmt>
    </tei:fileDesc>
  </tei:teiHeader>
  <tei:text>
    <tei:body>
      <tei:p>One</tei:p>
      <tei:note xml:id="n1"><tei:p>Note</tei:p></tei:note>
      <tei:p>Two</tei:p>
    </tei:body>
  </tei:text>
</tei:TEI>"#;

    #[test]
    fn test_parse_all() {
        let data = parse(XML, &config()).unwrap().to_json().unwrap();
        assert_eq!(
            data["metadata"]["fileDesc"]["titleStmt"]["title"]["_text"],
            json!("Letters")
        );
        assert_eq!(
            data["body"]["doc"],
            json!({"type": "doc", "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "One", "marks": []}]},
                {"type": "paragraph", "content": [{"type": "text", "text": "Two", "marks": []}]}
            ]})
        );
        assert_eq!(
            data["body"]["nested"]["note"]["n1"]["content"][0]["type"],
            json!("doc")
        );
        assert_eq!(
            data["front"],
            json!({"doc": {"type": "doc", "content": []}, "nested": {}})
        );
    }

    #[test]
    fn test_malformed() {
        assert!(parse("<tei:TEI", &config()).is_err());
    }
}
