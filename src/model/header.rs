//! # The metadata forest
//!
//! Every header element becomes a [`HeaderItem`] holding its attributes (`_attrs`),
//! its text if it has no child elements (`_text`), and one entry per configured child
//! keyed by the child tag's local name.
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The parsed header, keyed like the children of a [`HeaderItem`]
pub type HeaderData = BTreeMap<String, HeaderValue>;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, new)]
pub struct HeaderItem {
    #[serde(rename = "_attrs", default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(rename = "_text", default)]
    pub text: Option<String>,
    #[serde(flatten)]
    #[new(default)]
    pub children: BTreeMap<String, HeaderValue>,
}

/// A single item, or a list for repeatable fields
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Many(Vec<HeaderItem>),
    One(HeaderItem),
}

impl HeaderValue {
    /// The items held, in order
    pub fn items(&self) -> Vec<&HeaderItem> {
        match self {
            HeaderValue::Many(items) => items.iter().collect(),
            HeaderValue::One(item) => vec![item],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            HeaderValue::Many(items) => items.len(),
            HeaderValue::One(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
