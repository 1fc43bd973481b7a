//! # Serializing TEI documents
//!
//! Every section is serialized into a tree of its own below a `tei:TEI` root.
//! The trees are merged, metadata first, then text sections, then multi-text
//! sections, and rendered as one document.
pub mod content;
pub mod header;
pub mod tree;

use crate::model::{DocumentData, Fragment, HeaderData, SectionData, TextDocument};
use crate::schema::section::{MetadataSection, MultiTextSection, SectionSerializer, TextSection};
use crate::schema::{Config, SectionConfig};
use crate::xpath::TEI_NS;
use content::{ContentSerializer, References};
use tracing::{debug, instrument, warn};
use tree::AbstractElement;

/// The document element
pub const ROOT_TAG: &str = "tei:TEI";
/// The declaration every serialized document starts with
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

// Place `fill`'s result at the end of a `/`-separated path below the root
fn below_root<F>(path: &str, fill: F) -> AbstractElement
where
    F: FnOnce(&mut AbstractElement),
{
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let leaf = match segments.pop() {
        Some(tag) => {
            let mut leaf = AbstractElement::new(tag);
            fill(&mut leaf);
            leaf
        }
        None => {
            let mut root = AbstractElement::new(ROOT_TAG);
            fill(&mut root);
            return root;
        }
    };
    let tree = segments
        .into_iter()
        .rev()
        .fold(leaf, |child, tag| AbstractElement::new(tag).with_child(child));
    AbstractElement::new(ROOT_TAG).with_child(tree)
}

fn static_attrs(element: &mut AbstractElement, serializer: &SectionSerializer) {
    for (name, value) in &serializer.attrs {
        element.push_attr(name.as_str(), value.value());
    }
}

fn merge_order(section: &SectionConfig) -> u8 {
    match section {
        SectionConfig::Metadata(_) => 0,
        SectionConfig::Text(_) => 1,
        SectionConfig::MultiText(_) => 2,
    }
}

#[derive(Debug, Default)]
pub struct TeiSerializer;

impl TeiSerializer {
    pub fn metadata_section(&self, section: &MetadataSection, data: &HeaderData) -> AbstractElement {
        below_root(section.path(), |element| {
            if let Some(serializer) = &section.serializer {
                static_attrs(element, serializer);
            }
            element
                .children
                .extend(header::serialize_header(data, &section.schema));
        })
    }

    /// Serialize the main tree of a text section followed by the nested
    /// documents it references
    pub fn text_section(&self, section: &TextSection, data: &TextDocument) -> AbstractElement {
        let serializer = ContentSerializer::new(&section.schema);
        below_root(&section.serializer.tag, |element| {
            static_attrs(element, &section.serializer);
            let mut references = References::default();
            for node in data.doc.content().unwrap_or_default() {
                element
                    .children
                    .extend(serializer.serialize_node(node, &mut references));
            }
            for (node_type, id) in references.iter() {
                match data.nested.get(node_type).and_then(|docs| docs.get(id)) {
                    Some(doc) => element
                        .children
                        .extend(serializer.serialize_node(doc, &mut References::default())),
                    None => debug!(section = %section.name, "No nested {} {:?}", node_type, id),
                }
            }
        })
    }

    /// Serialize the fragments of a multi-text section, each with its id.
    ///
    /// A section without fragments is left out.
    pub fn multi_text_section(
        &self,
        section: &MultiTextSection,
        fragments: &[Fragment],
    ) -> Option<AbstractElement> {
        if fragments.is_empty() {
            return None;
        }
        let target = match &section.serializer {
            Some(target) => target,
            None => {
                warn!(section = %section.name, "Section has no serializer");
                return None;
            }
        };
        let serializer = ContentSerializer::new(&section.schema);
        Some(below_root(&target.tag, |element| {
            static_attrs(element, target);
            for fragment in fragments {
                let mut references = References::default();
                if let Some(mut part) = serializer.serialize_node(&fragment.text, &mut references) {
                    if let Some(id) = &fragment.id {
                        if !part.attrs.contains_key("xml:id") {
                            part.push_attr("xml:id", id.as_str());
                        }
                    }
                    element.children.push(part);
                }
            }
        }))
    }

    fn section(&self, section: &SectionConfig, data: &SectionData) -> Option<AbstractElement> {
        match (section, data) {
            (SectionConfig::Metadata(section), SectionData::Metadata(data)) => {
                Some(self.metadata_section(section, data))
            }
            (SectionConfig::Text(section), SectionData::Text(data)) => {
                Some(self.text_section(section, data))
            }
            (SectionConfig::MultiText(section), SectionData::MultiText(fragments)) => {
                self.multi_text_section(section, fragments)
            }
            (section, _) => {
                warn!(section = section.name(), "Data does not match the section type");
                None
            }
        }
    }

    /// Serialize all sections present in `data` into one document
    pub fn document(&self, data: &DocumentData, config: &Config) -> AbstractElement {
        let mut root = AbstractElement::new(ROOT_TAG).with_attr("xmlns:tei", TEI_NS);
        let mut sections: Vec<&SectionConfig> = config.sections.iter().collect();
        sections.sort_by_key(|section| merge_order(section));
        for section in sections {
            match data.get(section.name()) {
                Some(section_data) => {
                    if let Some(tree) = self.section(section, section_data) {
                        root.merge(tree);
                    }
                }
                None => debug!(section = section.name(), "No data"),
            }
        }
        root
    }
}

/// Serialize `data` into a TEI document
#[instrument(skip(data, config))]
pub fn serialize(data: &DocumentData, config: &Config) -> String {
    let root = TeiSerializer.document(data, config);
    format!("{}\n{}\n", XML_DECLARATION, root.render())
}

#[cfg(test)]
mod tests {
    use super::serialize;
    use crate::model::DocumentData;
    use crate::schema::Config;
    use serde_json::json;

    fn config() -> Config {
        serde_json::from_value(json!({"sections": [
            {"type": "TextEditor", "name": "body",
             "parser": {"selector": "/tei:TEI/tei:text/tei:body"},
             "serializer": {"tag": "tei:text/tei:body"},
             "schema": [
                {"name": "paragraph", "type": "inline", "parser": {"selector": "tei:p", "text": "text()"},
                 "serializer": {"tag": "tei:p"}},
                {"name": "text", "type": "inline", "parser": {"selector": "tei:seg", "text": "text()"},
                 "serializer": {"tag": "tei:seg"}},
                {"name": "ref", "type": "inline", "parser": {"selector": "tei:ref"},
                 "attrs": {"target": {"parser": {"selector": "@target"},
                    "serializer": {"attr": "target", "value": "#{value}"}}},
                 "reference": {"type": "note", "attr": "target"},
                 "serializer": {"tag": "tei:ref"}},
                {"name": "note", "type": "nested", "parser": {"selector": "tei:note"},
                 "attrs": {"id": {"parser": {"selector": "@xml:id"}, "serializer": {"attr": "xml:id"}}},
                 "serializer": {"tag": "tei:note"}}
             ]},
            {"type": "MultiText", "name": "annotations",
             "parser": {"selector": "/tei:TEI/tei:text/tei:back/tei:div"},
             "parts": {"parser": {"selector": "tei:div"}},
             "serializer": {"tag": "tei:text/tei:back/tei:div", "attrs": {"type": "annotations"}},
             "schema": [
                {"name": "annotation", "type": "block", "parser": {"selector": "tei:div"},
                 "serializer": {"tag": "tei:div", "attrs": {"type": "annotation"}}},
                {"name": "paragraph", "type": "inline", "parser": {"selector": "tei:p", "text": "text()"},
                 "serializer": {"tag": "tei:p"}},
                {"name": "text", "type": "inline", "parser": {"selector": "tei:seg", "text": "text()"},
                 "serializer": {"tag": "tei:seg"}}
             ]},
            {"type": "MetadataEditor", "name": "metadata",
             "schema": [{"tag": "tei:fileDesc", "children": [{"tag": "tei:titleStmt", "children": [
                {"tag": "tei:title"}
             ]}]}]}
        ]}))
        .unwrap()
    }

    #[test]
    fn test_document() {
        let config = config();
        let data = DocumentData::from_json(&config.sections, json!({
            "metadata": {"fileDesc": {"_attrs": {}, "_text": null, "titleStmt": {
                "_attrs": {}, "_text": null, "title": {"_attrs": {}, "_text": "Letters"}
            }}},
            "body": {
                "doc": {"type": "doc", "content": [
                    {"type": "paragraph", "content": [
                        {"type": "text", "text": "See", "marks": []},
                        {"type": "ref", "attrs": {"target": "n2"}},
                        {"type": "ref", "attrs": {"target": "n1"}},
                        {"type": "ref", "attrs": {"target": "n2"}}
                    ]}
                ]},
                "nested": {"note": {
                    "n1": {"type": "note", "nestedDoc": true, "attrs": {"id": "n1"}, "content": [
                        {"type": "doc", "content": [{"type": "paragraph", "content": [
                            {"type": "text", "text": "First", "marks": []}
                        ]}]}
                    ]},
                    "n2": {"type": "note", "nestedDoc": true, "attrs": {"id": "n2"}, "content": [
                        {"type": "doc", "content": [{"type": "paragraph", "content": [
                            {"type": "text", "text": "Second", "marks": []}
                        ]}]}
                    ]},
                    "n3": {"type": "note", "nestedDoc": true, "attrs": {"id": "n3"}, "content": []}
                }}
            },
            "annotations": [
                {"id": "a1", "text": {"type": "annotation", "content": [
                    {"type": "paragraph", "content": [{"type": "text", "text": "Gloss", "marks": []}]}
                ]}}
            ]
        }))
        .unwrap();

        let expected = r##"<?xml version="1.0" encoding="UTF-8"?>
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
      <tei:p>
        <tei:seg>See</tei:seg>
        <tei:ref target="#n2"/>
        <tei:ref target="#n1"/>
        <tei:ref target="#n2"/>
      </tei:p>
      <tei:note xml:id="n2">
        <tei:p>Second</tei:p>
      </tei:note>
      <tei:note xml:id="n1">
        <tei:p>First</tei:p>
      </tei:note>
    </tei:body>
    <tei:back>
      <tei:div type="annotations">
        <tei:div type="annotation" xml:id="a1">
          <tei:p>Gloss</tei:p>
        </tei:div>
      </tei:div>
    </tei:back>
  </tei:text>
</tei:TEI>
"##;
        assert_eq!(serialize(&data, &config), expected);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(
            serialize(&DocumentData::default(), &config()),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<tei:TEI xmlns:tei=\"http://www.tei-c.org/ns/1.0\"/>\n"
        );
    }
}
