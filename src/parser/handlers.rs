//! The builtin construct handlers.
//!
//! Every entry of the handler table becomes one [`BuiltinHandler`]; its
//! construct kind selects the parsing routine, and its patterns and
//! ordering come from configuration.

use crate::ast::TokenKind;
use crate::config::ConstructHandlerConfig;
use crate::context::ParseContext;
use crate::registry::{ConstructHandler, ConstructKind, HandlerOutcome, HandlerResult};

#[derive(Debug, Clone)]
pub struct BuiltinHandler {
    config: ConstructHandlerConfig,
}

impl BuiltinHandler {
    pub fn new(config: ConstructHandlerConfig) -> Self {
        BuiltinHandler { config }
    }

    /// Keyword that has to start the construct, if any.
    fn keyword(&self) -> Option<TokenKind> {
        let kind = match self.config.construct {
            ConstructKind::If => TokenKind::If,
            ConstructKind::Match => TokenKind::Match,
            ConstructKind::ForIn | ConstructKind::NumericFor => TokenKind::For,
            ConstructKind::While => TokenKind::While,
            ConstructKind::Break => TokenKind::Break,
            ConstructKind::Continue => TokenKind::Continue,
            ConstructKind::Block => TokenKind::LBrace,
            _ => return None,
        };
        Some(kind)
    }
}

impl ConstructHandler for BuiltinHandler {
    fn config(&self) -> &ConstructHandlerConfig {
        &self.config
    }

    fn handle(&self, ctx: &mut ParseContext) -> HandlerResult {
        if self.keyword().is_some_and(|keyword| !ctx.check(keyword)) {
            return Ok(HandlerOutcome::NotApplicable);
        }

        match self.config.construct {
            ConstructKind::If => ctx.parse_if().map(HandlerOutcome::Matched),
            ConstructKind::Match => ctx.parse_match().map(HandlerOutcome::Matched),
            ConstructKind::ForIn => ctx.parse_for_in(&self.config),
            ConstructKind::NumericFor => ctx.parse_numeric_for(),
            ConstructKind::While => ctx.parse_while().map(HandlerOutcome::Matched),
            ConstructKind::Break | ConstructKind::Continue => {
                ctx.parse_loop_control().map(HandlerOutcome::Matched)
            }
            ConstructKind::Block => ctx.parse_block_statement().map(HandlerOutcome::Matched),
            ConstructKind::CodeBlock => ctx.parse_code_block(),
            ConstructKind::Assignment => ctx.parse_assignment(),
            ConstructKind::LanguageCall => ctx.parse_language_call_statement(),
            ConstructKind::FieldAccess => ctx.parse_field_access_statement(),
            ConstructKind::BuiltinCall => ctx.parse_builtin_call_statement(),
            ConstructKind::Expression => ctx.parse_expression_statement().map(HandlerOutcome::Matched),
        }
    }
}
