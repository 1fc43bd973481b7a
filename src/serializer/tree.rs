//! # Element trees
//!
//! The serializers build [`AbstractElement`] trees. Trees from different sections
//! are merged into one root and rendered as indented XML lines.
use std::collections::BTreeMap;

/// An element before rendering.
///
/// Attributes hold lists of values that are sorted and joined with a space when
/// rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbstractElement {
    pub tag: String,
    pub attrs: BTreeMap<String, Vec<String>>,
    pub children: Vec<AbstractElement>,
    pub text: Option<String>,
}

/// Escape text content
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape(value).replace('"', "&quot;")
}

impl AbstractElement {
    pub fn new<S: Into<String>>(tag: S) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attr<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.push_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: AbstractElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Add a value to an attribute, keeping the ones already there
    pub fn push_attr<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.attrs.entry(name.into()).or_default().push(value.into());
    }

    pub fn extend_attrs(&mut self, attrs: BTreeMap<String, Vec<String>>) {
        for (name, values) in attrs {
            self.attrs.entry(name).or_default().extend(values);
        }
    }

    fn has_text(&self) -> bool {
        self.text.as_deref().map_or(false, |text| !text.is_empty())
    }

    /// Whether there is nothing to render but the tag
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && !self.has_text() && self.attrs.is_empty()
    }

    fn same_node(&self, other: &AbstractElement) -> bool {
        self.tag == other.tag && self.attrs == other.attrs
    }

    /// Merge the children of `incoming` into this element.
    ///
    /// Each incoming child is merged into the first child with the same tag and
    /// attributes that no earlier incoming sibling was merged into, and appended
    /// otherwise. Merging the same tree twice has the effect of merging it once.
    pub fn merge(&mut self, incoming: AbstractElement) {
        let mut claimed = vec![false; self.children.len()];
        for child in incoming.children {
            let found = self
                .children
                .iter()
                .zip(&claimed)
                .position(|(existing, claimed)| !claimed && existing.same_node(&child));
            match found {
                Some(idx) => {
                    claimed[idx] = true;
                    self.children[idx].merge(child);
                }
                None => self.children.push(child),
            }
        }
    }

    /// Render as lines, each starting with `indent`
    pub fn to_lines(&self, indent: &str) -> Vec<String> {
        let mut open = format!("{}<{}", indent, self.tag);
        for (name, values) in &self.attrs {
            if values.is_empty() {
                continue;
            }
            let mut values: Vec<&str> = values.iter().map(String::as_str).collect();
            values.sort_unstable();
            open.push_str(&format!(r#" {}="{}""#, name, escape_attr(&values.join(" "))));
        }

        if !self.children.is_empty() {
            open.push('>');
            let mut lines = vec![open];
            let child_indent = format!("{}  ", indent);
            for child in &self.children {
                lines.extend(child.to_lines(&child_indent));
            }
            lines.push(format!("{}</{}>", indent, self.tag));
            lines
        } else {
            match self.text.as_deref().filter(|text| !text.is_empty()) {
                Some(text) => open.push_str(&format!(">{}</{}>", escape(text), self.tag)),
                None => open.push_str("/>"),
            }
            vec![open]
        }
    }

    pub fn render(&self) -> String {
        self.to_lines("").join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::{escape, AbstractElement};

    fn body(paragraphs: &[&str]) -> AbstractElement {
        let body = paragraphs.iter().fold(AbstractElement::new("tei:body"), |body, text| {
            body.with_child(AbstractElement::new("tei:p").with_text(*text))
        });
        AbstractElement::new("tei:TEI").with_child(AbstractElement::new("tei:text").with_child(body))
    }

    #[test]
    fn test_render() {
        let tree = AbstractElement::new("tei:div")
            .with_attr("type", "b")
            .with_attr("type", "a")
            .with_child(AbstractElement::new("tei:p").with_text("1 < 2 & 3"))
            .with_child(AbstractElement::new("tei:pb").with_attr("n", "\"4\""))
            .with_child(AbstractElement::new("tei:lb"));
        assert_eq!(
            tree.render(),
            [
                r#"<tei:div type="a b">"#,
                r#"  <tei:p>1 &lt; 2 &amp; 3</tei:p>"#,
                r#"  <tei:pb n="&quot;4&quot;"/>"#,
                r#"  <tei:lb/>"#,
                r#"</tei:div>"#,
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_children_win_over_text() {
        let tree = AbstractElement::new("tei:p")
            .with_text("ignored")
            .with_child(AbstractElement::new("tei:seg").with_text("kept"));
        assert_eq!(tree.render(), "<tei:p>\n  <tei:seg>kept</tei:seg>\n</tei:p>");
    }

    #[test]
    fn test_empty() {
        assert!(AbstractElement::new("tei:p").is_empty());
        assert!(AbstractElement::new("tei:p").with_text("").is_empty());
        assert!(!AbstractElement::new("tei:p").with_attr("n", "1").is_empty());
        assert_eq!(escape("a>b"), "a&gt;b");
    }

    #[test]
    fn test_merge_shared_parents() {
        let mut root = AbstractElement::new("tei:TEI").with_child(
            AbstractElement::new("tei:teiHeader").with_child(AbstractElement::new("tei:fileDesc")),
        );
        root.merge(body(&["One"]));
        root.merge(
            AbstractElement::new("tei:TEI").with_child(
                AbstractElement::new("tei:text")
                    .with_child(AbstractElement::new("tei:back").with_attr("type", "notes")),
            ),
        );

        assert_eq!(root.children.len(), 2);
        let text = &root.children[1];
        assert_eq!(text.tag, "tei:text");
        let tags: Vec<&str> = text.children.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["tei:body", "tei:back"]);
    }

    #[test]
    fn test_merge_keeps_equal_siblings() {
        let mut root = AbstractElement::new("tei:TEI");
        root.merge(body(&["One", "Two"]));
        let body = &root.children[0].children[0];
        assert_eq!(body.children.len(), 2);
    }

    #[test]
    fn test_merge_idempotent() {
        let other = AbstractElement::new("tei:TEI").with_child(
            AbstractElement::new("tei:text").with_child(
                AbstractElement::new("tei:body")
                    .with_child(AbstractElement::new("tei:p").with_text("Three"))
                    .with_child(
                        AbstractElement::new("tei:p")
                            .with_child(AbstractElement::new("tei:seg").with_text("Four")),
                    ),
            ),
        );
        let mut once = body(&["One"]);
        once.merge(other.clone());
        let mut twice = once.clone();
        twice.merge(other);
        assert_eq!(once, twice);
    }
}
