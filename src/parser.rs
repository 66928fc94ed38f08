//! Recursive-descent parser for Mosaic.
//!
//! Statements are parsed by dispatching to the construct handlers held in a
//! [`HandlerRegistry`]; expressions, patterns and bitstrings are parsed by
//! methods on [`ParseContext`] that handlers call into. The submodules only
//! add `impl ParseContext` blocks, grouped by grammar area.

mod bitstring;
mod calls;
mod expressions;
pub mod handlers;
mod patterns;
mod statements;

use std::rc::Rc;

use tracing::debug;

use crate::ast::{Expr, Pattern, Program, TokenKind};
use crate::config::{ConfigError, ParserConfig};
use crate::context::{ParseContext, RecursionGuard};
use crate::error::{ParseError, ParseResult};
use crate::languages::LanguageRegistry;
use crate::registry::HandlerRegistry;

/// A configured parser. Building one validates the configuration and
/// builds both registries; parsing itself allocates a fresh context per
/// call.
#[derive(Debug)]
pub struct Parser {
    config: ParserConfig,
    handlers: Rc<HandlerRegistry>,
    languages: Rc<LanguageRegistry>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Parser with the default handler table and languages.
    pub fn new() -> Self {
        let config = ParserConfig::default();
        let handlers = Rc::new(HandlerRegistry::from_config(&config));
        let languages = Rc::new(LanguageRegistry::new(&config.languages));
        Parser {
            config,
            handlers,
            languages,
        }
    }

    pub fn with_config(config: ParserConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let handlers = HandlerRegistry::from_config(&config);
        Ok(Self::with_registry(config, handlers))
    }

    /// Parser dispatching through a caller-built registry. Only the depth,
    /// guard and language settings of `config` are used.
    pub fn with_registry(config: ParserConfig, handlers: HandlerRegistry) -> Self {
        debug!(
            handlers = handlers.len(),
            languages = config.languages.len(),
            max_depth = config.max_depth,
            "parser configured"
        );
        let languages = Rc::new(LanguageRegistry::new(&config.languages));
        Parser {
            config,
            handlers: Rc::new(handlers),
            languages,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn languages(&self) -> &LanguageRegistry {
        &self.languages
    }

    /// Fresh parse context over `source`.
    pub fn context(&self, source: &str) -> ParseContext {
        ParseContext::new(
            source,
            Rc::clone(&self.handlers),
            Rc::clone(&self.languages),
            RecursionGuard::new(self.config.max_depth, self.config.enable_recursion_guard),
        )
    }

    /// Parse a whole program.
    pub fn parse(&self, source: &str) -> ParseResult<Program> {
        let mut ctx = self.context(source);
        let result = ctx.parse_program();
        ctx.finish(result)
    }

    /// Parse a single expression spanning the whole input.
    pub fn parse_expression(&self, source: &str) -> ParseResult<Expr> {
        let mut ctx = self.context(source);
        let result = ctx.skip_then(|ctx| ctx.parse_expression());
        ctx.finish(result)
    }

    /// Parse a single `match` pattern spanning the whole input.
    pub fn parse_pattern(&self, source: &str) -> ParseResult<Pattern> {
        let mut ctx = self.context(source);
        let result = ctx.skip_then(|ctx| ctx.parse_pattern());
        ctx.finish(result)
    }
}

impl ParseContext {
    /// Run `f` between leading and trailing separators and require the end
    /// of input afterwards.
    fn skip_then<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.skip_separators();
        let value = f(self)?;
        self.skip_separators();
        if !self.check(TokenKind::Eof) {
            return Err(ParseError::syntax("end of input", &self.current()));
        }
        Ok(value)
    }
}

/// Parse `source` with the default configuration.
pub fn parse(source: &str) -> ParseResult<Program> {
    Parser::new().parse(source)
}
