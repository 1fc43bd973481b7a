//! # TEI editor
//!
//! Schema-driven conversion between TEI XML documents and editor JSON.
//!
//! A [`Config`](schema::Config) lists the sections of a document. Each section
//! is parsed from the XML with XPath selectors into ProseMirror-like content
//! trees or a metadata forest, and serialized back by merging one element tree
//! per section under the `tei:TEI` root.
pub mod command;
pub mod config;
pub mod model;
pub mod parser;
pub mod schema;
pub mod serializer;
pub mod util;
pub mod xpath;

pub use parser::parse;
pub use serializer::serialize;
