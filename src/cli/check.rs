//! Parse Mosaic scripts and report the tree

use std::path::PathBuf;

use super::{load_config, CliError};
use crate::output;
use crate::parser::Parser;

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Script text to parse
    pub source: String,
    /// Configuration files, applied in order
    pub config_paths: Vec<PathBuf>,
    /// Overrides `maxDepth` from configuration
    pub max_depth: Option<usize>,
    /// Pretty-print the output
    pub pretty: bool,
    /// Only validate syntax, don't produce the tree
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// The parsed program as JSON
    Success(serde_json::Value),
}

/// Execute a mosaic check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let config = load_config(&options.config_paths, options.max_depth)?;
    let parser = Parser::with_config(config)?;
    let program = parser.parse(&options.source)?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }
    Ok(CheckResult::Success(output::to_value(&program)?))
}
