//! # Header parser
//!
//! Builds the `_attrs` / `_text` forest of a metadata section. Repeatable fields
//! become lists; fields listed under `deduplicate.merge` are read as lists and
//! then multiplied out, so every combination of their values gets an item of
//! its own.
use crate::model::{HeaderData, HeaderItem, HeaderValue};
use crate::schema::HeaderSchema;
use crate::xpath::{child_elements, qualified_name, XPathEvaluator};
use sxd_document::dom::Element;
use tracing::{debug, warn};

pub struct HeaderParser<'a, 'd> {
    xpath: &'a XPathEvaluator<'d>,
}

impl<'a, 'd> HeaderParser<'a, 'd> {
    pub fn new(xpath: &'a XPathEvaluator<'d>) -> Self {
        Self { xpath }
    }

    /// Parse every top-level field below `header`
    pub fn parse_section(&self, header: Element<'d>, schema: &[HeaderSchema]) -> HeaderData {
        schema
            .iter()
            .filter_map(|field| {
                self.parse_node(header, field, false)
                    .map(|value| (field.key().to_owned(), value))
            })
            .collect()
    }

    /// Parse the elements `schema.tag` selects below `context`.
    ///
    /// Returns `None` if nothing matched. A field that is not repeatable keeps
    /// only the first match, unless `force_multiple` is set.
    pub fn parse_node(
        &self,
        context: Element<'d>,
        schema: &HeaderSchema,
        force_multiple: bool,
    ) -> Option<HeaderValue> {
        let elements = match self.xpath.node_iter(context, &schema.tag) {
            Ok(elements) => elements,
            Err(err) => {
                warn!("{}", err);
                return None;
            }
        };
        let items: Vec<HeaderItem> = elements
            .elements()
            .map(|element| self.parse_item(element, schema))
            .collect();

        if items.is_empty() {
            None
        } else if schema.multiple || force_multiple {
            match schema.deduplicate {
                Some(_) => Some(HeaderValue::Many(deduplicate(items, &schema.merge_keys()))),
                None => Some(HeaderValue::Many(items)),
            }
        } else {
            if items.len() > 1 {
                debug!("Keeping the first of {} matches for {}", items.len(), schema.tag);
            }
            items.into_iter().next().map(HeaderValue::One)
        }
    }

    fn parse_item(&self, element: Element<'d>, schema: &HeaderSchema) -> HeaderItem {
        let mut item = HeaderItem::default();
        for attribute in element.attributes() {
            item.attrs
                .insert(qualified_name(&attribute), attribute.value().to_owned());
        }
        if child_elements(element).is_empty() {
            let text = self.xpath.string(element, "text()").unwrap_or_else(|err| {
                warn!("{}", err);
                String::new()
            });
            item.text = Some(text);
        }
        for child in &schema.children {
            if let Some(value) = self.parse_node(element, child, schema.merges(child)) {
                item.children.insert(child.key().to_owned(), value);
            }
        }
        item
    }
}

/// All combinations taking one value from each list.
///
/// The first list varies fastest: `[[a, b], [1, 2]]` gives
/// `[a, 1], [b, 1], [a, 2], [b, 2]`.
pub fn permutations<T: Clone>(lists: &[Vec<T>]) -> Vec<Vec<T>> {
    match lists.split_first() {
        None => Vec::new(),
        Some((head, [])) => head.iter().map(|value| vec![value.clone()]).collect(),
        Some((head, tail)) => {
            let mut result = Vec::new();
            for part in permutations(tail) {
                for value in head {
                    let mut permutation = Vec::with_capacity(part.len() + 1);
                    permutation.push(value.clone());
                    permutation.extend(part.iter().cloned());
                    result.push(permutation);
                }
            }
            result
        }
    }
}

/// Split every item with more than one value in a merged field into one item
/// per combination of merged values.
///
/// Items that stay whole have their single-item lists turned into single items.
pub fn deduplicate(items: Vec<HeaderItem>, keys: &[&str]) -> Vec<HeaderItem> {
    let mut result = Vec::with_capacity(items.len());
    for mut item in items {
        let needs_duplication = keys
            .iter()
            .any(|key| item.children.get(*key).map_or(false, |value| value.len() > 1));
        if !needs_duplication {
            collapse(&mut item);
            result.push(item);
            continue;
        }

        // a missing field takes part as a single empty slot
        let slots: Vec<Vec<Option<HeaderItem>>> = keys
            .iter()
            .map(|key| match item.children.get(*key) {
                Some(value) if !value.is_empty() => {
                    value.items().into_iter().cloned().map(Some).collect()
                }
                _ => vec![None],
            })
            .collect();
        for permutation in permutations(&slots) {
            let mut duplicate = item.clone();
            for (key, slot) in keys.iter().zip(permutation) {
                if let Some(value) = slot {
                    duplicate
                        .children
                        .insert((*key).to_owned(), HeaderValue::One(value));
                }
            }
            result.push(duplicate);
        }
    }
    result
}

fn collapse(item: &mut HeaderItem) {
    for value in item.children.values_mut() {
        if let HeaderValue::Many(items) = value {
            if items.len() == 1 {
                if let Some(single) = items.pop() {
                    *value = HeaderValue::One(single);
                }
            }
        }
    }
}
