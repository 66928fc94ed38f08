//! Cursor over lexer output.
//!
//! Tokens are pulled from the [`Lexer`] on demand into a buffer shared by
//! every clone of a [`TokenStream`]. A clone is a position-only snapshot:
//! it reads the same buffer and differs from its origin only in where it
//! points, which makes speculative look-ahead cheap.
//!
//! A lexical error does not surface from the cursor methods. The failing
//! token is recorded in place of an `Eof` token, so any look-ahead simply
//! sees the end of input; [`TokenStream::lex_error`] reports it afterwards.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::ast::{Position, Token, TokenKind};
use crate::lexer::{LexError, Lexer};

#[derive(Debug)]
struct TokenBuffer {
    lexer: Lexer,
    tokens: Vec<Token>,
    finished: bool,
    /// Index of the token that failed to lex, with its error
    error: Option<(usize, LexError)>,
}

impl TokenBuffer {
    fn fill(&mut self, index: usize) {
        while self.tokens.len() <= index && !self.finished {
            match self.lexer.next_token() {
                Ok(token) => {
                    self.finished = token.is(TokenKind::Eof);
                    self.tokens.push(token);
                }
                Err(err) => {
                    let position = err.position();
                    let end = position.offset;
                    self.error = Some((self.tokens.len(), err));
                    self.tokens.push(Token::new(TokenKind::Eof, "", position, end));
                    self.finished = true;
                }
            }
        }
    }

    /// Drop every buffered token from `index` on and resume lexing at
    /// `resume`.
    fn truncate(&mut self, index: usize, resume: Position) {
        self.tokens.truncate(index);
        if self.error.as_ref().is_some_and(|(at, _)| *at >= index) {
            self.error = None;
        }
        self.lexer.reset_to(resume);
        self.finished = false;
    }
}

#[derive(Debug, Clone)]
pub struct TokenStream {
    buffer: Rc<RefCell<TokenBuffer>>,
    position: usize,
}

impl TokenStream {
    pub fn new(lexer: Lexer) -> Self {
        TokenStream {
            buffer: Rc::new(RefCell::new(TokenBuffer {
                lexer,
                tokens: Vec::new(),
                finished: false,
                error: None,
            })),
            position: 0,
        }
    }

    pub fn from_source(source: &str) -> Self {
        Self::new(Lexer::new(source))
    }

    /// Token `n` places after the current one, `peek(0)` being the current
    /// token. Past the end this keeps returning the final `Eof`.
    pub fn peek(&self, n: usize) -> Token {
        let index = self.position + n;
        let mut buffer = self.buffer.borrow_mut();
        buffer.fill(index);
        match buffer.tokens.get(index).or_else(|| buffer.tokens.last()) {
            Some(token) => token.clone(),
            None => Token::new(TokenKind::Eof, "", buffer.lexer.location(), buffer.lexer.location().offset),
        }
    }

    pub fn peek_kind(&self, n: usize) -> TokenKind {
        let index = self.position + n;
        let mut buffer = self.buffer.borrow_mut();
        buffer.fill(index);
        buffer
            .tokens
            .get(index)
            .or_else(|| buffer.tokens.last())
            .map_or(TokenKind::Eof, |token| token.kind)
    }

    pub fn current(&self) -> Token {
        self.peek(0)
    }

    /// Up to `size` pending tokens starting at the current one.
    pub fn window(&self, size: usize) -> Vec<Token> {
        let mut window = Vec::with_capacity(size);
        for n in 0..size {
            let token = self.peek(n);
            let done = token.is(TokenKind::Eof);
            window.push(token);
            if done {
                break;
            }
        }
        window
    }

    /// Return the current token and advance. The cursor never moves past
    /// `Eof`.
    pub fn consume(&mut self) -> Token {
        let token = self.current();
        if !token.is(TokenKind::Eof) {
            self.position += 1;
        }
        trace!(kind = %token.kind, line = token.line, column = token.column, "consumed token");
        token
    }

    pub fn has_more(&self) -> bool {
        self.peek_kind(0) != TokenKind::Eof
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        if position != self.position {
            trace!(from = self.position, to = position, "stream repositioned");
        }
        self.position = position;
    }

    /// Discard look-ahead and continue lexing at `resume`. Used after a
    /// construct whose body was taken verbatim from the source.
    pub fn resync_at(&mut self, resume: Position) {
        self.buffer.borrow_mut().truncate(self.position, resume);
    }

    /// Toggle the lexer's size-expression mode. Look-ahead lexed under the
    /// previous mode is discarded and re-lexed from the current token.
    pub fn set_in_size_expression(&mut self, enabled: bool) {
        let resume = {
            let buffer = self.buffer.borrow();
            if buffer.lexer.in_size_expression() == enabled {
                return;
            }
            match buffer.tokens.get(self.position) {
                Some(token) => token.position(),
                None => buffer.lexer.location(),
            }
        };
        let mut buffer = self.buffer.borrow_mut();
        buffer.truncate(self.position, resume);
        buffer.lexer.set_in_size_expression(enabled);
    }

    pub fn lex_error(&self) -> Option<LexError> {
        self.buffer.borrow().error.as_ref().map(|(_, err)| err.clone())
    }
}
