use super::content::ContentParser;
use crate::model::{Fragment, NestedDocs};
use crate::schema::section::MultiTextSection;
use crate::xpath::XPathEvaluator;
use sxd_document::dom::Element;
use tracing::{debug, warn};

/// Parse the fragments of a multi-text section, in document order.
///
/// Returns an empty list if the section root is missing.
pub fn parse_fragments<'d>(
    xpath: &XPathEvaluator<'d>,
    document_element: Element<'d>,
    section: &MultiTextSection,
) -> Vec<Fragment> {
    let root = match xpath.first_element(document_element, &section.parser.selector) {
        Ok(Some(root)) => root,
        Ok(None) => {
            debug!(section = %section.name, "No fragment root");
            return Vec::new();
        }
        Err(err) => {
            warn!(section = %section.name, "{}", err);
            return Vec::new();
        }
    };
    let parts = match xpath.node_iter(root, &section.parts.parser.selector) {
        Ok(parts) => parts,
        Err(err) => {
            warn!(section = %section.name, "{}", err);
            return Vec::new();
        }
    };

    let parser = ContentParser::new(xpath, &section.schema);
    let mut nested = NestedDocs::new();
    let mut fragments = Vec::new();
    for part in parts.elements() {
        if let Some(text) = parser.parse_node(part, &mut nested) {
            let id = xpath.string(part, "@xml:id").unwrap_or_default();
            let id = if id.is_empty() { None } else { Some(id) };
            fragments.push(Fragment::new(id, text));
        }
    }
    if !nested.is_empty() {
        warn!(section = %section.name, "Nested documents in fragments are not kept");
    }
    fragments
}

#[cfg(test)]
mod tests {
    use super::parse_fragments;
    use crate::schema::section::MultiTextSection;
    use crate::xpath::{root_element, TeiDocument, XPathEvaluator};
    use serde_json::json;

    fn section(root: &str) -> MultiTextSection {
        serde_json::from_value(json!({
            "name": "annotations",
            "parser": {"selector": root},
            "parts": {"parser": {"selector": "tei:div[@type='annotation']"}},
            "schema": [
                {"name": "annotation", "type": "block", "parser": {"selector": "tei:div"}},
                {"name": "paragraph", "type": "inline", "parser": {"selector": "tei:p", "text": "text()"}}
            ]
        }))
        .unwrap()
    }

    const XML: &str = r#"<tei:TEI xmlns:tei="http://www.tei-c.org/ns/1.0">
  <tei:text>
    <tei:back>
      <tei:div type="annotations">
        <tei:div type="annotation" xml:id="a2"><tei:p>Second</tei:p></tei:div>
        <tei:div type="annotation" xml:id="a1"><tei:p>First</tei:p></tei:div>
        <tei:div type="annotation"><tei:p>Anonymous</tei:p></tei:div>
        <tei:div type="other"/>
      </tei:div>
    </tei:back>
  </tei:text>
</tei:TEI>"#;

    #[test]
    fn test_document_order() {
        let tei = TeiDocument::parse(XML).unwrap();
        let doc = tei.document();
        let root = root_element(&doc).unwrap();
        let xpath = XPathEvaluator::new();

        let fragments = parse_fragments(
            &xpath,
            root,
            &section("/tei:TEI/tei:text/tei:back/tei:div[@type='annotations']"),
        );
        let ids: Vec<Option<&str>> = fragments.iter().map(|f| f.id.as_deref()).collect();
        assert_eq!(ids, vec![Some("a2"), Some("a1"), None]);
        let text = &fragments[1].text;
        assert_eq!(text.node_type(), "annotation");
        assert_eq!(text.content().unwrap()[0].content().unwrap()[0].text_value(), Some("First"));
    }

    #[test]
    fn test_missing_root() {
        let tei = TeiDocument::parse(XML).unwrap();
        let doc = tei.document();
        let root = root_element(&doc).unwrap();
        let xpath = XPathEvaluator::new();

        assert!(parse_fragments(&xpath, root, &section("/tei:TEI/tei:text/tei:front")).is_empty());
    }
}
