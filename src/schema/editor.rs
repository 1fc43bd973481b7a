//! # Editing surface schema
//!
//! Describes the nodes and marks of a section in the shape of ProseMirror node and
//! mark specs, so the editing surface can build its own schema from the same data.
use super::{AttrSchema, NodeKind, NodeSchema};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

fn attr_specs(attrs: Option<&BTreeMap<String, AttrSchema>>) -> Value {
    let specs: Map<String, Value> = attrs
        .into_iter()
        .flatten()
        .map(|(name, attr)| (name.clone(), json!({ "default": attr.default })))
        .collect();
    Value::Object(specs)
}

/// The node and mark specs for `schema`
pub fn editor_schema(schema: &[NodeSchema]) -> Value {
    let mut nodes = Map::new();
    let mut marks = Map::new();
    nodes.insert("doc".to_owned(), json!({ "content": "block+" }));

    for entry in schema {
        let attrs = attr_specs(entry.attrs.as_ref());
        let spec = match entry.kind {
            NodeKind::Block | NodeKind::Nested => json!({
                "content": "inline*",
                "group": "block",
                "attrs": attrs,
            }),
            NodeKind::Wrapping => json!({
                "content": format!("{}+", entry.content.as_deref().unwrap_or("block")),
                "group": "block",
                "attrs": attrs,
            }),
            NodeKind::Inline if entry.name == crate::model::TEXT => json!({ "group": "inline" }),
            NodeKind::Inline => json!({
                "content": "inline*",
                "group": "inline",
                "inline": true,
                "attrs": attrs,
            }),
            NodeKind::Mark => {
                marks.insert(entry.name.clone(), json!({ "attrs": attrs }));
                continue;
            }
        };
        nodes.insert(entry.name.clone(), spec);
    }

    json!({ "nodes": nodes, "marks": marks })
}
