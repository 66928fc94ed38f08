//! CLI support for mosaic-lang
//!
//! Provides programmatic access to the `mosaic` commands for embedding in
//! other tools.

mod check;
mod tables;

pub use check::{execute_check, CheckOptions, CheckResult};
pub use tables::{handler_table, language_table};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::{ConfigError, ConfigLoader, ParserConfig};
use crate::error::ParseError;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Pass a FILE, use --source, or pipe a script to stdin.")]
    NoInput,
}

/// Load the layered configuration, then apply a depth override.
pub fn load_config(config_paths: &[PathBuf], max_depth: Option<usize>) -> Result<ParserConfig, CliError> {
    let mut config = ConfigLoader::new().with_files(config_paths.iter().cloned()).load()?;
    if let Some(max_depth) = max_depth {
        config.max_depth = max_depth;
        config.validate()?;
    }
    Ok(config)
}
