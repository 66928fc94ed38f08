//! Shared state threaded through every handler: the token stream, the
//! recursion guard, loop depth and the registries built for this parser.

use std::rc::Rc;

use tracing::trace;

use crate::ast::{Position, Token, TokenKind};
use crate::error::{ParseError, ParseResult};
use crate::languages::LanguageRegistry;
use crate::lexer::Lexer;
use crate::registry::HandlerRegistry;
use crate::stream::TokenStream;

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_SEGMENT: usize = 1024 * 1024;

/// Bounds how deeply handlers may nest.
#[derive(Debug, Clone)]
pub struct RecursionGuard {
    depth: usize,
    max_depth: usize,
    enabled: bool,
}

impl RecursionGuard {
    pub fn new(max_depth: usize, enabled: bool) -> Self {
        RecursionGuard {
            depth: 0,
            max_depth,
            enabled,
        }
    }

    /// Enter one nesting level. Fails when `max_depth` levels are already
    /// active.
    pub fn enter(&mut self, at: Position) -> ParseResult<()> {
        if self.enabled && self.depth >= self.max_depth {
            return Err(ParseError::RecursionLimit {
                max_depth: self.max_depth,
                position: at,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

pub struct ParseContext {
    pub stream: TokenStream,
    source: Rc<str>,
    guard: RecursionGuard,
    loop_depth: usize,
    partial: bool,
    handlers: Rc<HandlerRegistry>,
    languages: Rc<LanguageRegistry>,
}

impl ParseContext {
    pub fn new(
        source: &str,
        handlers: Rc<HandlerRegistry>,
        languages: Rc<LanguageRegistry>,
        guard: RecursionGuard,
    ) -> Self {
        let source: Rc<str> = Rc::from(source);
        let lexer = Lexer::from_shared(Rc::clone(&source));
        ParseContext {
            stream: TokenStream::new(lexer),
            source,
            guard,
            loop_depth: 0,
            partial: false,
            handlers,
            languages,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn handlers(&self) -> Rc<HandlerRegistry> {
        Rc::clone(&self.handlers)
    }

    pub fn languages(&self) -> &LanguageRegistry {
        &self.languages
    }

    pub fn depth(&self) -> usize {
        self.guard.depth()
    }

    pub fn max_depth(&self) -> usize {
        self.guard.max_depth()
    }

    pub fn loop_depth(&self) -> usize {
        self.loop_depth
    }

    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Run `f` one nesting level deeper. The level is released whether or
    /// not `f` succeeds.
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let at = self.stream.current().position();
        self.guard.enter(at)?;
        // Continue on a heap segment when the native stack runs low.
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || f(self));
        self.guard.exit();
        result
    }

    /// Run `f` as a loop body, where `break` and `continue` are legal.
    pub fn in_loop<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.loop_depth += 1;
        let result = f(self);
        self.loop_depth -= 1;
        result
    }

    /// Run `f` as a sub-parse of a prefix: statement terminators are not
    /// enforced inside it.
    pub fn partially<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let previous = std::mem::replace(&mut self.partial, true);
        let result = f(self);
        self.partial = previous;
        result
    }

    /// Run `f` with terminators enforced again, as inside a block.
    pub fn strictly<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let previous = std::mem::replace(&mut self.partial, false);
        let result = f(self);
        self.partial = previous;
        result
    }

    /// Run `f` with the lexer in size-expression mode.
    pub fn in_size_expression<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        self.stream.set_in_size_expression(true);
        let result = f(self);
        self.stream.set_in_size_expression(false);
        result
    }

    /// Prefer a pending lexical error over whatever the parse produced when
    /// the bad token comes first.
    pub fn finish<T>(&self, result: ParseResult<T>) -> ParseResult<T> {
        let Some(lex_error) = self.stream.lex_error() else {
            return result;
        };
        match result {
            Err(err) if err.position().offset < lex_error.position().offset => Err(err),
            _ => Err(ParseError::Lex(lex_error)),
        }
    }

    // Token helpers

    pub fn current(&self) -> Token {
        self.stream.current()
    }

    pub fn peek_kind(&self, n: usize) -> TokenKind {
        self.stream.peek_kind(n)
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.stream.peek_kind(0) == kind
    }

    pub fn consume(&mut self) -> Token {
        self.stream.consume()
    }

    pub fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.consume())
        } else {
            Err(ParseError::syntax(kind.to_string(), &self.current()))
        }
    }

    /// Consume the closer matching `open`, or report the construct as
    /// unclosed.
    pub fn expect_closing(&mut self, open: &Token, closer: TokenKind) -> ParseResult<Token> {
        if self.check(closer) {
            return Ok(self.consume());
        }
        let found = self.current();
        Err(ParseError::Unclosed {
            delimiter: open.kind,
            opened_at: open.position(),
            found: found.to_string(),
            position: found.position(),
        })
    }

    /// Skip newline tokens, returning how many were skipped.
    pub fn skip_newlines(&mut self) -> usize {
        let mut skipped = 0;
        while self.check(TokenKind::Newline) {
            self.consume();
            skipped += 1;
        }
        skipped
    }

    /// Skip newlines and `;`.
    pub fn skip_separators(&mut self) {
        while matches!(self.peek_kind(0), TokenKind::Newline | TokenKind::Semicolon) {
            self.consume();
        }
    }

    /// Whether `kind` follows once newlines are skipped, without consuming
    /// anything.
    pub fn next_after_newlines_is(&self, kind: TokenKind) -> bool {
        let mut n = 0;
        while self.stream.peek_kind(n) == TokenKind::Newline {
            n += 1;
        }
        self.stream.peek_kind(n) == kind
    }

    /// Run `f` on a throwaway clone of the stream.
    pub fn lookahead<T>(&self, f: impl FnOnce(&mut TokenStream) -> T) -> T {
        let mut probe = self.stream.clone();
        let result = f(&mut probe);
        trace!(
            scanned = probe.position().saturating_sub(self.stream.position()),
            "look-ahead discarded"
        );
        result
    }

    /// Text of the source between two byte offsets.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        self.source.get(start..end).unwrap_or_default()
    }
}
