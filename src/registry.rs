//! Construct handlers and the registry that orders them.
//!
//! A handler parses one construct. The registry indexes handlers by the
//! token kind their patterns expect first and by construct kind, and hands
//! out candidates for a window of pending tokens in a fixed order:
//! priority descending, then `order` ascending, then name ascending.
//! Fallback handlers are kept apart and only offered once every primary
//! candidate has declined.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{Statement, Token, TokenKind};
use crate::config::{ConstructHandlerConfig, ParserConfig};
use crate::context::ParseContext;
use crate::error::ParseResult;
use crate::parser::handlers::BuiltinHandler;

/// Syntactic category a handler parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructKind {
    If,
    Match,
    ForIn,
    NumericFor,
    While,
    Break,
    Continue,
    Block,
    CodeBlock,
    Assignment,
    LanguageCall,
    FieldAccess,
    BuiltinCall,
    Expression,
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstructKind::If => "if",
            ConstructKind::Match => "match",
            ConstructKind::ForIn => "for_in",
            ConstructKind::NumericFor => "numeric_for",
            ConstructKind::While => "while",
            ConstructKind::Break => "break",
            ConstructKind::Continue => "continue",
            ConstructKind::Block => "block",
            ConstructKind::CodeBlock => "code_block",
            ConstructKind::Assignment => "assignment",
            ConstructKind::LanguageCall => "language_call",
            ConstructKind::FieldAccess => "field_access",
            ConstructKind::BuiltinCall => "builtin_call",
            ConstructKind::Expression => "expression",
        };
        f.write_str(name)
    }
}

/// Result of asking a handler to parse at the current position.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    Matched(Statement),
    /// The handler cannot start here. The stream position is unspecified;
    /// the dispatcher restores it.
    NotApplicable,
}

pub type HandlerResult = ParseResult<HandlerOutcome>;

pub trait ConstructHandler {
    fn config(&self) -> &ConstructHandlerConfig;

    /// Leading-token filter applied to every candidate before its window
    /// patterns. By default a token passes when an offset-0 pattern matches
    /// it or when a later-offset pattern could still qualify the window.
    fn can_handle(&self, token: &Token) -> bool {
        self.config()
            .patterns
            .iter()
            .any(|p| p.offset > 0 || p.matches(token))
    }

    /// Parse the construct. Errors are final: they abort the whole parse.
    fn handle(&self, ctx: &mut ParseContext) -> HandlerResult;
}

/// Ordering shared by every query: priority descending, order ascending,
/// name ascending.
fn dispatch_order(a: &ConstructHandlerConfig, b: &ConstructHandlerConfig) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then(a.order.cmp(&b.order))
        .then_with(|| a.name.cmp(&b.name))
}

pub struct HandlerRegistry {
    handlers: Vec<Box<dyn ConstructHandler>>,
    /// Handler indices per construct kind, in dispatch order
    by_construct: HashMap<ConstructKind, Vec<usize>>,
    /// Handler indices per token kind expected at offset 0
    by_leading_kind: HashMap<TokenKind, Vec<usize>>,
    /// Handlers without an offset-0 pattern; candidates for every window
    unanchored: Vec<usize>,
    default_fallback_priority: i32,
    window_size: usize,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.iter().map(|h| &h.config().name).collect::<Vec<_>>())
            .field("window_size", &self.window_size)
            .finish()
    }
}

impl HandlerRegistry {
    pub fn new(default_fallback_priority: i32) -> Self {
        HandlerRegistry {
            handlers: Vec::new(),
            by_construct: HashMap::new(),
            by_leading_kind: HashMap::new(),
            unanchored: Vec::new(),
            default_fallback_priority,
            window_size: 1,
        }
    }

    /// Build the registry for a configuration, one builtin handler per
    /// handler entry.
    pub fn from_config(config: &ParserConfig) -> Self {
        let mut registry = HandlerRegistry::new(config.default_fallback_priority);
        for handler in &config.handlers {
            registry.register(Box::new(BuiltinHandler::new(handler.clone())));
        }
        registry
    }

    pub fn with_defaults() -> Self {
        Self::from_config(&ParserConfig::default())
    }

    pub fn register(&mut self, handler: Box<dyn ConstructHandler>) {
        let index = self.handlers.len();
        let config = handler.config();
        let construct = config.construct;

        let mut leading: Vec<TokenKind> = config
            .patterns
            .iter()
            .filter(|p| p.offset == 0)
            .map(|p| p.kind)
            .collect();
        leading.sort();
        leading.dedup();

        if let Some(max_offset) = config.patterns.iter().map(|p| p.offset).max() {
            self.window_size = self.window_size.max(max_offset + 1);
        }

        // A pattern at a later offset can match on its own, so such a
        // handler must be considered for any leading token.
        let anchored = !leading.is_empty() && config.patterns.iter().all(|p| p.offset == 0);

        self.handlers.push(handler);

        if anchored {
            for kind in leading {
                self.by_leading_kind.entry(kind).or_default().push(index);
            }
        } else {
            self.unanchored.push(index);
        }
        self.by_construct.entry(construct).or_default().push(index);

        let handlers = &self.handlers;
        if let Some(indices) = self.by_construct.get_mut(&construct) {
            indices.sort_by(|a, b| dispatch_order(handlers[*a].config(), handlers[*b].config()));
        }
    }

    /// Number of pending tokens a dispatcher should gather.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Every registered handler in dispatch order, fallbacks included.
    pub fn all(&self) -> Vec<&dyn ConstructHandler> {
        let mut all: Vec<&dyn ConstructHandler> = self.handlers.iter().map(|h| h.as_ref()).collect();
        all.sort_by(|a, b| dispatch_order(a.config(), b.config()));
        all
    }

    /// Highest-ranked primary handler for the window.
    pub fn resolve(&self, window: &[Token]) -> Option<&dyn ConstructHandler> {
        self.matching(window).into_iter().next()
    }

    /// All enabled primary handlers whose patterns match the window, in
    /// dispatch order.
    pub fn matching(&self, window: &[Token]) -> Vec<&dyn ConstructHandler> {
        let Some(first) = window.first() else {
            return Vec::new();
        };

        let mut candidates: Vec<&dyn ConstructHandler> = self
            .by_leading_kind
            .get(&first.kind)
            .into_iter()
            .flatten()
            .chain(self.unanchored.iter())
            .map(|&i| self.handlers[i].as_ref())
            .filter(|h| {
                let config = h.config();
                config.enabled && !config.fallback && h.can_handle(first) && config.matches_window(window)
            })
            .collect();

        candidates.sort_by(|a, b| dispatch_order(a.config(), b.config()));
        candidates
    }

    /// Enabled primary handlers of one construct kind, in dispatch order.
    pub fn for_construct(&self, construct: ConstructKind) -> Vec<&dyn ConstructHandler> {
        self.by_construct
            .get(&construct)
            .into_iter()
            .flatten()
            .map(|&i| self.handlers[i].as_ref())
            .filter(|h| h.config().enabled && !h.config().fallback)
            .collect()
    }

    fn fallback_priority(&self, config: &ConstructHandlerConfig) -> i32 {
        config
            .fallback_priority
            .unwrap_or(self.default_fallback_priority)
    }

    /// Enabled fallback handlers, highest fallback priority first.
    pub fn fallbacks(&self) -> Vec<&dyn ConstructHandler> {
        let mut fallbacks: Vec<&dyn ConstructHandler> = self
            .handlers
            .iter()
            .map(|h| h.as_ref())
            .filter(|h| h.config().enabled && h.config().fallback)
            .collect();
        fallbacks.sort_by(|a, b| {
            self.fallback_priority(b.config())
                .cmp(&self.fallback_priority(a.config()))
                .then_with(|| dispatch_order(a.config(), b.config()))
        });
        fallbacks
    }

    /// Enabled fallback handlers of one construct kind.
    pub fn fallbacks_for(&self, construct: ConstructKind) -> Vec<&dyn ConstructHandler> {
        self.fallbacks()
            .into_iter()
            .filter(|h| h.config().construct == construct)
            .collect()
    }
}
