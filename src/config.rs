//! Parser configuration: defaults, layered loading and validation.
//!
//! Configuration files are JSON (`.json`) or TOML (`.toml`). Each file is a
//! partial document layered over the programmatic defaults in load order,
//! so the last file to set a field wins and anything left unset keeps its
//! default. Entries of `handlers` and `languages` are merged by `name`:
//!
//! ```json
//! { "maxDepth": 64, "handlers": [{ "name": "assignment", "priority": 99 }] }
//! ```
//!
//! only changes the recursion bound and the priority of the default
//! `assignment` handler.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use tracing::debug;

use crate::ast::{Token, TokenKind};
use crate::languages::{LanguageConfig, default_languages};
use crate::registry::ConstructKind;

const HANDLER_NAME_PATTERN: &str = r"^[a-z][a-z0-9]*([-_][a-z0-9]+)*$";
const LANGUAGE_NAME_PATTERN: &str = r"^[a-z][a-z0-9_]*$";
const MAX_PATTERN_OFFSET: usize = 8;
/// Upper bound accepted for `maxDepth`
pub const MAX_DEPTH_LIMIT: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML in {origin}: {source}")]
    Toml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("unsupported configuration format for {path} (expected .json or .toml)")]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid configuration at '{path}': {message}")]
    Validation { path: String, message: String },
}

impl ConfigError {
    fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Validation {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// `(kind, value, offset)`: matches when the pending token at `offset` has
/// `kind` and, if given, the literal text `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPattern {
    pub kind: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub offset: usize,
}

impl TokenPattern {
    pub fn new(kind: TokenKind, offset: usize) -> Self {
        TokenPattern {
            kind,
            value: None,
            offset,
        }
    }

    pub fn with_value(kind: TokenKind, value: &str, offset: usize) -> Self {
        TokenPattern {
            kind,
            value: Some(value.to_string()),
            offset,
        }
    }

    /// Whether `token` satisfies kind and value, ignoring the offset.
    pub fn matches(&self, token: &Token) -> bool {
        token.kind == self.kind && self.value.as_ref().is_none_or(|v| *v == token.literal)
    }
}

/// Static description of one construct handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructHandlerConfig {
    pub construct: ConstructKind,
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub fallback: bool,
    /// Defaults to the parser's `defaultFallbackPriority`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_priority: Option<i32>,
    #[serde(default)]
    pub patterns: Vec<TokenPattern>,
    /// Construct-specific parameters
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, JsonValue>,
}

fn default_true() -> bool {
    true
}

impl ConstructHandlerConfig {
    pub fn new(construct: ConstructKind, name: &str, priority: i32, order: i32) -> Self {
        ConstructHandlerConfig {
            construct,
            name: name.to_string(),
            priority,
            order,
            enabled: true,
            fallback: false,
            fallback_priority: None,
            patterns: Vec::new(),
            params: Map::new(),
        }
    }

    pub fn with_pattern(mut self, pattern: TokenPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn as_fallback(mut self, fallback_priority: i32) -> Self {
        self.fallback = true;
        self.fallback_priority = Some(fallback_priority);
        self
    }

    /// OR-match: any single pattern matching at its offset qualifies.
    pub fn matches_window(&self, window: &[Token]) -> bool {
        self.patterns
            .iter()
            .any(|p| window.get(p.offset).is_some_and(|t| p.matches(t)))
    }

    pub fn bool_param(&self, name: &str) -> Option<bool> {
        self.params.get(name).and_then(JsonValue::as_bool)
    }
}

/// The handler table used when no configuration overrides it.
pub fn default_handlers() -> Vec<ConstructHandlerConfig> {
    use ConstructKind as C;
    use TokenKind as T;

    let keyword = |construct, name, order, kind| {
        ConstructHandlerConfig::new(construct, name, 100, order).with_pattern(TokenPattern::new(kind, 0))
    };

    vec![
        keyword(C::If, "if", 0, T::If),
        keyword(C::Match, "match", 1, T::Match),
        keyword(C::ForIn, "for-in", 2, T::For),
        keyword(C::NumericFor, "numeric-for", 3, T::For),
        keyword(C::While, "while", 4, T::While),
        keyword(C::Break, "break", 5, T::Break),
        keyword(C::Continue, "continue", 6, T::Continue),
        keyword(C::Block, "block", 7, T::LBrace),
        ConstructHandlerConfig::new(C::CodeBlock, "code-block", 95, 0)
            .with_pattern(TokenPattern::new(T::Language, 0))
            .with_pattern(TokenPattern::new(T::Identifier, 0)),
        ConstructHandlerConfig::new(C::Assignment, "assignment", 90, 0)
            .with_pattern(TokenPattern::new(T::Identifier, 0))
            .with_pattern(TokenPattern::new(T::Language, 0)),
        ConstructHandlerConfig::new(C::LanguageCall, "language-call", 85, 0)
            .with_pattern(TokenPattern::new(T::Language, 0))
            .with_pattern(TokenPattern::new(T::Dot, 1)),
        ConstructHandlerConfig::new(C::FieldAccess, "field-access", 80, 0)
            .with_pattern(TokenPattern::new(T::Identifier, 0))
            .with_pattern(TokenPattern::new(T::Language, 0)),
        ConstructHandlerConfig::new(C::BuiltinCall, "builtin-call", 75, 0)
            .with_pattern(TokenPattern::new(T::Identifier, 0)),
        ConstructHandlerConfig::new(C::Expression, "expression", 0, 0).as_fallback(0),
    ]
}

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserConfig {
    /// Maximum nesting accepted by the recursion guard
    pub max_depth: usize,
    pub enable_recursion_guard: bool,
    /// Fallback priority for fallback handlers that do not set their own
    pub default_fallback_priority: i32,
    pub handlers: Vec<ConstructHandlerConfig>,
    pub languages: Vec<LanguageConfig>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_depth: 100,
            enable_recursion_guard: true,
            default_fallback_priority: 0,
            handlers: default_handlers(),
            languages: default_languages(),
        }
    }
}

impl ParserConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn handler(&self, name: &str) -> Option<&ConstructHandlerConfig> {
        self.handlers.iter().find(|h| h.name == name)
    }

    pub fn handler_mut(&mut self, name: &str) -> Option<&mut ConstructHandlerConfig> {
        self.handlers.iter_mut().find(|h| h.name == name)
    }

    /// Check the configuration, naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::validation("maxDepth", "must be greater than zero"));
        }
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::validation(
                "maxDepth",
                format!("must not exceed {MAX_DEPTH_LIMIT}"),
            ));
        }

        let handler_name = Regex::new(HANDLER_NAME_PATTERN)
            .map_err(|e| ConfigError::validation("handlers", e.to_string()))?;
        let mut seen = HashSet::new();

        for (i, handler) in self.handlers.iter().enumerate() {
            let path = format!("handlers[{i}]");
            if !handler_name.is_match(&handler.name) {
                return Err(ConfigError::validation(
                    format!("{path}.name"),
                    format!("'{}' is not a valid handler name", handler.name),
                ));
            }
            if !seen.insert(handler.name.as_str()) {
                return Err(ConfigError::validation(
                    format!("{path}.name"),
                    format!("duplicate handler name '{}'", handler.name),
                ));
            }
            if handler.enabled && !handler.fallback && handler.patterns.is_empty() {
                return Err(ConfigError::validation(
                    format!("{path}.patterns"),
                    "a primary handler needs at least one token pattern",
                ));
            }
            for (j, pattern) in handler.patterns.iter().enumerate() {
                if pattern.offset >= MAX_PATTERN_OFFSET {
                    return Err(ConfigError::validation(
                        format!("{path}.patterns[{j}].offset"),
                        format!("must be below {MAX_PATTERN_OFFSET}"),
                    ));
                }
            }
        }

        let language_name = Regex::new(LANGUAGE_NAME_PATTERN)
            .map_err(|e| ConfigError::validation("languages", e.to_string()))?;
        let mut names = HashSet::new();

        for (i, language) in self.languages.iter().enumerate() {
            let spellings = std::iter::once(&language.name).chain(language.aliases.iter());
            for (j, name) in spellings.enumerate() {
                let path = if j == 0 {
                    format!("languages[{i}].name")
                } else {
                    format!("languages[{i}].aliases[{}]", j - 1)
                };
                if !language_name.is_match(name) {
                    return Err(ConfigError::validation(path, format!("'{name}' is not a valid language name")));
                }
                if !names.insert(name.as_str()) {
                    return Err(ConfigError::validation(path, format!("'{name}' is already defined")));
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<ConfigFormat> {
        match path.extension()?.to_str()? {
            "json" => Some(ConfigFormat::Json),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Layer {
    File(PathBuf),
    Text {
        origin: String,
        format: ConfigFormat,
        text: String,
    },
}

/// Layers configuration documents over [`ParserConfig::default`].
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    layers: Vec<Layer>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.layers.push(Layer::File(path.into()));
        self
    }

    pub fn with_files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.layers
            .extend(paths.into_iter().map(|p| Layer::File(p.into())));
        self
    }

    /// Add an in-memory document as the next layer.
    pub fn with_str(mut self, format: ConfigFormat, text: impl Into<String>) -> Self {
        let origin = format!("inline document {}", self.layers.len() + 1);
        self.layers.push(Layer::Text {
            origin,
            format,
            text: text.into(),
        });
        self
    }

    /// Merge all layers and validate the result.
    pub fn load(&self) -> Result<ParserConfig, ConfigError> {
        let mut merged = serde_json::to_value(ParserConfig::default()).map_err(|source| ConfigError::Json {
            origin: "defaults".to_string(),
            source,
        })?;

        for layer in &self.layers {
            let (origin, document) = read_layer(layer)?;
            debug!(%origin, "applying configuration layer");
            merge(&mut merged, document);
        }

        let config: ParserConfig = serde_json::from_value(merged).map_err(|source| ConfigError::Json {
            origin: "merged configuration".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
}

fn read_layer(layer: &Layer) -> Result<(String, JsonValue), ConfigError> {
    match layer {
        Layer::File(path) => {
            let format = ConfigFormat::from_path(path)
                .ok_or_else(|| ConfigError::UnsupportedFormat { path: path.clone() })?;
            let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            let origin = path.display().to_string();
            let document = parse_document(&origin, format, &text)?;
            Ok((origin, document))
        }
        Layer::Text {
            origin,
            format,
            text,
        } => Ok((origin.clone(), parse_document(origin, *format, text)?)),
    }
}

fn parse_document(origin: &str, format: ConfigFormat, text: &str) -> Result<JsonValue, ConfigError> {
    let document = match format {
        ConfigFormat::Json => serde_json::from_str(text).map_err(|source| ConfigError::Json {
            origin: origin.to_string(),
            source,
        })?,
        ConfigFormat::Toml => {
            let table: toml::Value = toml::from_str(text).map_err(|source| ConfigError::Toml {
                origin: origin.to_string(),
                source,
            })?;
            serde_json::to_value(table).map_err(|source| ConfigError::Json {
                origin: origin.to_string(),
                source,
            })?
        }
    };
    if !document.is_object() {
        return Err(ConfigError::validation("", format!("{origin} must contain a table at the top level")));
    }
    Ok(document)
}

/// Deep-merge `overlay` into `base`. Objects merge per key; arrays of
/// objects carrying a `name` merge per name; anything else is replaced.
fn merge(base: &mut JsonValue, overlay: JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base), JsonValue::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (JsonValue::Array(base), JsonValue::Array(overlay)) if !overlay.is_empty() && overlay.iter().all(named) => {
            for item in overlay {
                let name = item.get("name").cloned();
                match base.iter_mut().find(|existing| existing.get("name") == name.as_ref()) {
                    Some(existing) => merge(existing, item),
                    None => base.push(item),
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn named(value: &JsonValue) -> bool {
    value.get("name").is_some_and(JsonValue::is_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ParserConfig::default().validate().is_ok());
    }

    #[test]
    fn merge_replaces_scalars_and_merges_named_entries() {
        let mut base = serde_json::json!({
            "maxDepth": 100,
            "handlers": [{"name": "if", "priority": 100}, {"name": "while", "priority": 100}]
        });
        merge(
            &mut base,
            serde_json::json!({"maxDepth": 10, "handlers": [{"name": "while", "priority": 5}]}),
        );
        assert_eq!(base["maxDepth"], 10);
        assert_eq!(base["handlers"][0]["priority"], 100);
        assert_eq!(base["handlers"][1]["priority"], 5);
    }
}
