//! # Header serializer
//!
//! Turns the `_attrs` / `_text` forest back into elements. Items split up by
//! deduplication are written one element each.
use super::tree::AbstractElement;
use crate::model::{HeaderData, HeaderItem, HeaderValue};
use crate::schema::HeaderSchema;

/// Serialize the top-level fields of a header
pub fn serialize_header(data: &HeaderData, schema: &[HeaderSchema]) -> Vec<AbstractElement> {
    schema
        .iter()
        .filter_map(|field| data.get(field.key()).map(|value| (field, value)))
        .flat_map(|(field, value)| serialize_value(value, field))
        .collect()
}

/// One element per item of `value`
pub fn serialize_value(value: &HeaderValue, schema: &HeaderSchema) -> Vec<AbstractElement> {
    value
        .items()
        .into_iter()
        .map(|item| serialize_item(item, schema))
        .collect()
}

fn serialize_item(item: &HeaderItem, schema: &HeaderSchema) -> AbstractElement {
    let mut element = AbstractElement::new(schema.tag.as_str());
    if let Some(text) = item.text.as_deref().filter(|text| !text.is_empty()) {
        element.text = Some(text.to_owned());
    }
    for (name, value) in &item.attrs {
        element.push_attr(name.as_str(), value.as_str());
    }
    for child in &schema.children {
        if let Some(value) = item.children.get(child.key()) {
            element.children.extend(serialize_value(value, child));
        }
    }
    element
}

#[cfg(test)]
mod tests {
    use super::serialize_header;
    use crate::model::HeaderData;
    use crate::schema::HeaderSchema;
    use serde_json::json;

    #[test]
    fn test_forest() {
        let schema: Vec<HeaderSchema> = serde_json::from_value(json!([
            {"tag": "tei:fileDesc", "children": [
                {"tag": "tei:titleStmt", "children": [
                    {"tag": "tei:title", "multiple": true},
                    {"tag": "tei:author", "multiple": true, "children": [
                        {"tag": "tei:persName"}, {"tag": "tei:date"}
                    ]},
                    {"tag": "tei:editor"}
                ]}
            ]}
        ]))
        .unwrap();
        let data: HeaderData = serde_json::from_value(json!({
            "fileDesc": {"_attrs": {}, "_text": null, "titleStmt": {
                "_attrs": {}, "_text": null,
                "title": [
                    {"_attrs": {"type": "main"}, "_text": "Letters"},
                    {"_attrs": {"type": "sub"}, "_text": "Volume 1"}
                ],
                "author": [
                    {"_attrs": {"ref": "#a"}, "_text": null,
                     "persName": {"_attrs": {}, "_text": "Ada"},
                     "date": {"_attrs": {"when": "1840"}, "_text": ""}},
                    {"_attrs": {"ref": "#a"}, "_text": null,
                     "persName": {"_attrs": {}, "_text": "Ada"},
                     "date": [{"_attrs": {"when": "1841"}, "_text": ""}]}
                ]
            }}
        }))
        .unwrap();

        let elements = serialize_header(&data, &schema);
        assert_eq!(elements.len(), 1);
        assert_eq!(
            elements[0].render(),
            [
                "<tei:fileDesc>",
                "  <tei:titleStmt>",
                "    <tei:title type=\"main\">Letters</tei:title>",
                "    <tei:title type=\"sub\">Volume 1</tei:title>",
                "    <tei:author ref=\"#a\">",
                "      <tei:persName>Ada</tei:persName>",
                "      <tei:date when=\"1840\"/>",
                "    </tei:author>",
                "    <tei:author ref=\"#a\">",
                "      <tei:persName>Ada</tei:persName>",
                "      <tei:date when=\"1841\"/>",
                "    </tei:author>",
                "  </tei:titleStmt>",
                "</tei:fileDesc>",
            ]
            .join("\n")
        );
    }
}
