//! # Editor commands

use crate::model::DocumentData;
use crate::schema::editor::editor_schema;
use crate::schema::Config;
use crate::{parser, serializer, util};
use color_eyre::eyre::WrapErr;
use color_eyre::Report;
use displaydoc::Display;
use serde_json::Value;
use std::path::{Path, PathBuf};
use structopt::StructOpt;
use thiserror::Error;
use tokio::fs::read_to_string;
use tracing::{info, instrument};

/// Error when running a command
#[derive(Debug, Error, Display)]
pub enum CommandError {
    /// The section `{0}` is not configured
    UnknownSection(String),
    /// The section `{0}` has no content schema
    NoContentSchema(String),
    /// There is no value at `{0}`
    NothingAt(String),
}

/// A command of the editor
#[derive(Debug, StructOpt)]
pub enum Command {
    /// Parse a TEI document and print its sections as JSON
    Parse {
        #[structopt(parse(from_os_str))]
        xml: PathBuf,
        /// Only print this section
        #[structopt(long, short)]
        section: Option<String>,
    },
    /// Serialize sections from JSON into a TEI document
    Serialize {
        #[structopt(parse(from_os_str))]
        json: PathBuf,
    },
    /// Print the value at a dotted path of the parsed document
    Get {
        #[structopt(parse(from_os_str))]
        xml: PathBuf,
        path: String,
    },
    /// Set the value at a dotted path and print the resulting document
    Set {
        #[structopt(parse(from_os_str))]
        xml: PathBuf,
        path: String,
        /// A JSON literal, or a plain string
        value: String,
    },
    /// Print the editor schema of a text or multi-text section
    Schema { section: String },
}

/// Read `value` as JSON, falling back to a plain string
pub fn parse_value(value: &str) -> Value {
    serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()))
}

fn to_json_text(value: &Value) -> Result<String, Report> {
    let mut text = serde_json::to_string_pretty(value).wrap_err("Could not write JSON")?;
    text.push('\n');
    Ok(text)
}

/// The parsed document as JSON, or the value at a dotted path such as `body.doc`
pub fn parse_document(xml: &str, section: Option<&str>, config: &Config) -> Result<Value, Report> {
    let data = parser::parse(xml, config)?;
    let mut json = data.to_json()?;
    match section {
        Some(name) => util::get_mut(&mut json, name)
            .map(Value::take)
            .ok_or_else(|| CommandError::UnknownSection(name.to_owned()).into()),
        None => Ok(json),
    }
}

/// Serialize sections given as JSON
pub fn serialize_json(json: Value, config: &Config) -> Result<String, Report> {
    let data = DocumentData::from_json(&config.sections, json).wrap_err("Invalid document data")?;
    Ok(serializer::serialize(&data, config))
}

/// Change one value of the parsed document and serialize it again
pub fn set_value(xml: &str, path: &str, value: Value, config: &Config) -> Result<String, Report> {
    let mut json = parse_document(xml, None, config)?;
    util::set(&mut json, path, value)?;
    serialize_json(json, config)
}

/// The editor schema of a section
pub fn section_schema(name: &str, config: &Config) -> Result<Value, Report> {
    let section = config
        .section(name)
        .ok_or_else(|| CommandError::UnknownSection(name.to_owned()))?;
    let schema = section
        .node_schema()
        .ok_or_else(|| CommandError::NoContentSchema(name.to_owned()))?;
    Ok(editor_schema(schema))
}

async fn read(path: &Path) -> Result<String, Report> {
    read_to_string(path)
        .await
        .wrap_err_with(|| format!("Could not read {}", path.display()))
}

impl Command {
    /// Run the command and return what it prints
    #[instrument(skip(config))]
    pub async fn run(&self, config: &Config) -> Result<String, Report> {
        match self {
            Command::Parse { xml, section } => {
                let json = parse_document(&read(xml).await?, section.as_deref(), config)?;
                to_json_text(&json)
            }
            Command::Serialize { json } => {
                let json: Value =
                    serde_json::from_str(&read(json).await?).wrap_err("Could not parse JSON")?;
                serialize_json(json, config)
            }
            Command::Get { xml, path } => {
                let json = parse_document(&read(xml).await?, None, config)?;
                let value =
                    util::get(&json, path).ok_or_else(|| CommandError::NothingAt(path.clone()))?;
                to_json_text(value)
            }
            Command::Set { xml, path, value } => {
                info!("Setting {}", path);
                set_value(&read(xml).await?, path, parse_value(value), config)
            }
            Command::Schema { section } => to_json_text(&section_schema(section, config)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_document, parse_value, section_schema, set_value};
    use crate::config::default_config;
    use serde_json::json;

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tei:TEI xmlns:tei="http://www.tei-c.org/ns/1.0">
  <tei:text>
    <tei:body>
      <tei:p style="text-center">Hello</tei:p>
    </tei:body>
  </tei:text>
</tei:TEI>
"#;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("\"right\""), json!("right"));
        assert_eq!(parse_value("right"), json!("right"));
        assert_eq!(parse_value("{\"a\": 1}"), json!({"a": 1}));
    }

    #[test]
    fn test_parse_section() {
        let config = default_config().unwrap();
        let body = parse_document(XML, Some("body"), &config).unwrap();
        assert_eq!(body["doc"]["content"][0]["attrs"]["text_align"], json!("center"));
        assert!(parse_document(XML, Some("missing"), &config).is_err());
        let content = parse_document(XML, Some("body.doc.content"), &config).unwrap();
        assert_eq!(content[0]["type"], json!("paragraph"));
    }

    #[test]
    fn test_set_value() {
        let config = default_config().unwrap();
        let xml = set_value(
            XML,
            "body.doc.content.0.attrs.text_align",
            parse_value("right"),
            &config,
        )
        .unwrap();
        assert!(xml.contains(r#"<tei:p style="text-right">Hello</tei:p>"#));
        assert!(set_value(XML, "body.doc.content.0.type.x", json!(1), &config).is_err());
    }

    #[test]
    fn test_section_schema() {
        let config = default_config().unwrap();
        let schema = section_schema("body", &config).unwrap();
        assert_eq!(schema["nodes"]["doc"], json!({"content": "block+"}));
        for name in &["paragraph", "heading"] {
            assert_eq!(schema["nodes"][name]["group"], json!("block"), "{}", name);
            assert_eq!(schema["nodes"][name]["content"], json!("inline*"), "{}", name);
        }
        assert_eq!(schema["nodes"]["paragraph"]["attrs"]["text_align"]["default"], json!("left"));
        assert!(schema["marks"]["bold"].is_object());
        assert!(section_schema("metadata", &config).is_err());
        assert!(section_schema("missing", &config).is_err());
    }
}
