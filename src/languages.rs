//! Guest-language registry: canonical names, aliases, and the construct each
//! language-led form maps to.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ast::{Position, TokenKind};
use crate::error::{ParseError, ParseResult};

/// One guest language as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageConfig {
    /// Canonical name recorded in the AST
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Whether `lang { ... }` code blocks are accepted
    #[serde(default = "default_true")]
    pub code_blocks: bool,
}

fn default_true() -> bool {
    true
}

impl LanguageConfig {
    pub fn new(name: &str, aliases: &[&str]) -> Self {
        LanguageConfig {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            code_blocks: true,
        }
    }
}

pub fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig::new("lua", &[]),
        LanguageConfig::new("python", &["py"]),
        LanguageConfig::new("go", &[]),
        LanguageConfig::new("node", &["js"]),
    ]
}

/// What a language tag introduces, keyed by the token that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageConstruct {
    /// `lang.name(...)`
    LanguageCall,
    /// `lang.path.name`
    QualifiedIdentifier,
    /// `lang { ... }` or `lang(captures) { ... }`
    CodeBlock,
}

#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
    /// Name or alias to canonical name
    names: HashMap<String, String>,
}

impl LanguageRegistry {
    pub fn new(languages: &[LanguageConfig]) -> Self {
        let mut registry = LanguageRegistry::default();
        for language in languages {
            registry.register(language.clone());
        }
        registry
    }

    pub fn with_defaults() -> Self {
        Self::new(&default_languages())
    }

    pub fn register(&mut self, language: LanguageConfig) {
        self.names
            .insert(language.name.clone(), language.name.clone());
        for alias in &language.aliases {
            self.names.insert(alias.clone(), language.name.clone());
        }
        self.languages.retain(|l| l.name != language.name);
        self.languages.push(language);
    }

    /// Canonical name for a language name or alias.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    pub fn resolve_at(&self, name: &str, position: Position) -> ParseResult<String> {
        self.resolve(name)
            .map(str::to_string)
            .ok_or_else(|| ParseError::UnknownLanguage {
                name: name.to_string(),
                position,
            })
    }

    pub fn is_language(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn languages(&self) -> &[LanguageConfig] {
        &self.languages
    }

    /// Construct introduced by `name` followed by a token of kind `next`.
    /// `ends_in_call` tells a member chain that reaches `(` from one that
    /// does not.
    pub fn construct_for(&self, name: &str, next: TokenKind, ends_in_call: bool) -> Option<LanguageConstruct> {
        let canonical = self.resolve(name)?;
        let language = self.languages.iter().find(|l| l.name == canonical)?;
        match next {
            TokenKind::Dot if ends_in_call => Some(LanguageConstruct::LanguageCall),
            TokenKind::Dot => Some(LanguageConstruct::QualifiedIdentifier),
            TokenKind::LBrace | TokenKind::LParen if language.code_blocks => {
                Some(LanguageConstruct::CodeBlock)
            }
            _ => None,
        }
    }
}
