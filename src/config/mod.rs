//! # Editor configuration
//!
//! The sections of the editor and their schemas come from a configuration file,
//! TOML or JSON, or from the built-in configuration.

use crate::command::Command;
use crate::schema::Config;
use color_eyre::eyre::WrapErr;
use color_eyre::Report;
use std::path::{Path, PathBuf};
use structopt::StructOpt;
use tokio::fs::read_to_string;
use tracing::instrument;

/// The built-in configuration
pub const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// The commandline flags for the editor
#[derive(Debug, StructOpt)]
#[structopt(name = "tei-editor", about = "Schema-driven TEI parser and serializer")]
pub struct Flags {
    /// Which config file to use (`.json` or TOML)
    #[structopt(long = "cfg", short = "c", parse(from_os_str))]
    pub cfg: Option<PathBuf>,
    /// What to do
    #[structopt(subcommand)]
    pub cmd: Command,
}

impl Flags {
    #[instrument]
    /// Load the configuration from a file
    pub async fn load_cfg(&self) -> Result<Config, Report> {
        if let Some(cfg) = &self.cfg {
            let cfg_string: String = read_to_string(cfg)
                .await
                .wrap_err("Could not read config file")?;
            parse_config(cfg, &cfg_string)
        } else {
            default_config()
        }
    }
}

/// The built-in configuration
pub fn default_config() -> Result<Config, Report> {
    toml::from_str(DEFAULT_CONFIG).wrap_err("Could not parse the built-in config")
}

/// Parse a configuration, as JSON if `path` ends in `.json` and as TOML otherwise
pub fn parse_config(path: &Path, text: &str) -> Result<Config, Report> {
    if path.extension().map_or(false, |ext| ext == "json") {
        serde_json::from_str(text).wrap_err("Could not parse config file")
    } else {
        toml::from_str(text).wrap_err("Could not parse config file")
    }
}
