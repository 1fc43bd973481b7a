use serde::Deserialize;

/// Describes one level of the TEI header
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeaderSchema {
    /// XPath selecting the elements relative to the parent element
    pub tag: String,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub children: Vec<HeaderSchema>,
    #[serde(default)]
    pub deduplicate: Option<Deduplicate>,
}

/// Children whose values are combined into one item per combination
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Deduplicate {
    pub merge: Vec<MergeTarget>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MergeTarget {
    pub tag: String,
}

/// The key of a tag in the parsed forest: the tag with its namespace prefix removed
pub fn field_key(tag: &str) -> &str {
    match tag.find(':') {
        Some(idx) => &tag[idx + 1..],
        None => tag,
    }
}

impl HeaderSchema {
    pub fn key(&self) -> &str {
        field_key(&self.tag)
    }

    /// Whether `child` is one of the fields merged by deduplication
    pub fn merges(&self, child: &HeaderSchema) -> bool {
        self.deduplicate
            .as_ref()
            .map_or(false, |dedup| dedup.merge.iter().any(|target| target.tag == child.tag))
    }

    /// The keys of the merged fields, in declaration order
    pub fn merge_keys(&self) -> Vec<&str> {
        self.deduplicate
            .as_ref()
            .map(|dedup| dedup.merge.iter().map(|target| field_key(&target.tag)).collect())
            .unwrap_or_default()
    }
}
