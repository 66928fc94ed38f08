//! `<<...>>` bitstring literals and patterns.
//!
//! ```text
//! <<segment (, segment)*>>
//! segment := value [':' size] ('/' specifiers)*
//! ```
//!
//! Sizes are read with the lexer in size-expression mode, so `(len-8)`
//! scans as a subtraction instead of one dashed identifier. A size is
//! static only when it is a bare number literal.

use crate::ast::{BitSegment, Expr, Position, TokenKind, UnaryOp};
use crate::context::ParseContext;
use crate::error::{ParseError, ParseResult};

impl ParseContext {
    /// Parse a bitstring. In pattern mode `_` is accepted as a segment
    /// value.
    pub(crate) fn parse_bitstring(&mut self, pattern: bool) -> ParseResult<(Vec<BitSegment>, Position)> {
        let open = self.expect(TokenKind::BitOpen)?;
        self.nested(|ctx| {
            let mut segments = Vec::new();
            ctx.skip_newlines();

            if !ctx.check(TokenKind::BitClose) {
                loop {
                    segments.push(ctx.parse_segment(pattern)?);
                    ctx.skip_newlines();
                    if !ctx.check(TokenKind::Comma) {
                        break;
                    }
                    ctx.consume();
                    ctx.skip_newlines();
                    if ctx.check(TokenKind::BitClose) {
                        return Err(ParseError::syntax("segment after ','", &ctx.current()));
                    }
                }
            }

            let found = ctx.current();
            if !matches!(found.kind, TokenKind::BitClose | TokenKind::Eof) {
                return Err(ParseError::syntax("',' or '>>'", &found));
            }
            ctx.expect_closing(&open, TokenKind::BitClose)?;
            Ok((segments, open.position()))
        })
    }

    fn parse_segment(&mut self, pattern: bool) -> ParseResult<BitSegment> {
        let value = self.parse_segment_value(pattern)?;
        let position = value.position();

        let (size, dynamic_size) = if self.check(TokenKind::Colon) {
            self.consume();
            let size = self.in_size_expression(|ctx| ctx.parse_segment_size())?;
            let dynamic = !matches!(size, Expr::Number { .. });
            (Some(size), dynamic)
        } else {
            (None, false)
        };

        let mut specifiers = Vec::new();
        while self.check(TokenKind::Slash) {
            self.consume();
            self.parse_specifiers(&mut specifiers)?;
        }

        Ok(BitSegment {
            value,
            size,
            dynamic_size,
            specifiers,
            position,
        })
    }

    fn parse_segment_value(&mut self, pattern: bool) -> ParseResult<Expr> {
        let token = self.current();
        match token.kind {
            TokenKind::Number | TokenKind::String => self.parse_literal(),
            TokenKind::Minus if self.peek_kind(1) == TokenKind::Number => {
                self.consume();
                let operand = self.parse_literal()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Negate,
                    operand: Box::new(operand),
                    position: token.position(),
                })
            }
            TokenKind::Identifier if pattern && self.peek_kind(1) != TokenKind::Dot => {
                self.consume();
                Ok(Expr::Identifier {
                    position: token.position(),
                    name: token.literal,
                })
            }
            TokenKind::Identifier | TokenKind::Language => self.parse_reference(),
            TokenKind::LParen => self.parse_grouped(),
            TokenKind::Underscore if pattern => {
                self.consume();
                Ok(Expr::Identifier {
                    name: "_".to_string(),
                    position: token.position(),
                })
            }
            _ => Err(ParseError::syntax("bitstring segment value", &token)),
        }
    }

    /// Number, variable, guest reference, or parenthesized expression.
    fn parse_segment_size(&mut self) -> ParseResult<Expr> {
        let token = self.current();
        match token.kind {
            TokenKind::Number => self.parse_literal(),
            TokenKind::Identifier | TokenKind::Language => self.parse_reference(),
            TokenKind::LParen => self.parse_grouped(),
            _ => Err(ParseError::syntax("segment size", &token)),
        }
    }

    /// One `/`-introduced specifier list: atoms joined by `-`, each
    /// optionally `name:value`.
    fn parse_specifiers(&mut self, specifiers: &mut Vec<String>) -> ParseResult<()> {
        loop {
            let atom = self.expect(TokenKind::Identifier)?;
            let mut parts: Vec<String> = atom.literal.split('-').map(str::to_string).collect();

            if self.check(TokenKind::Colon) {
                self.consume();
                let value = self.current();
                if !matches!(value.kind, TokenKind::Number | TokenKind::Identifier) {
                    return Err(ParseError::syntax("specifier value", &value));
                }
                self.consume();
                if let Some(last) = parts.last_mut() {
                    last.push(':');
                    last.push_str(&value.literal);
                }
            }
            specifiers.extend(parts);

            if !self.check(TokenKind::Minus) {
                return Ok(());
            }
            self.consume();
        }
    }
}
