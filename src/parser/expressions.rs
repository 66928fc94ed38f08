//! Operator-precedence expression parsing.
//!
//! Binary operators are composed by precedence climbing over the table in
//! [`BinOp::precedence`]. A finished operand chain may be followed by a
//! ternary (`c ? a : b`, right-associative) or an elvis (`c ? : d`) tail.

use std::str::FromStr;

use num_bigint::BigInt;

use crate::ast::{BinOp, Expr, Number, ObjectEntry, ObjectKey, Token, TokenKind, UnaryOp};
use crate::context::ParseContext;
use crate::error::{ParseError, ParseResult};

impl ParseContext {
    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.nested(|ctx| {
            let condition = ctx.parse_binary(1)?;
            ctx.parse_conditional(condition)
        })
    }

    fn parse_binary(&mut self, min_precedence: u8) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;

        while let Some(op) = BinOp::from_token(self.peek_kind(0)) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.consume();
            self.skip_newlines();
            let right = self.parse_binary(precedence + 1)?;
            let position = left.position();
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                position,
            };
        }

        Ok(left)
    }

    /// Ternary or elvis tail after a complete operand chain.
    fn parse_conditional(&mut self, condition: Expr) -> ParseResult<Expr> {
        if !self.check(TokenKind::Question) {
            return Ok(condition);
        }
        self.consume();
        let position = condition.position();

        if self.check(TokenKind::Colon) {
            self.consume();
            self.skip_newlines();
            let default = self.parse_expression()?;
            return Ok(Expr::Elvis {
                condition: Box::new(condition),
                default: Box::new(default),
                position,
            });
        }

        self.skip_newlines();
        let then_branch = self.parse_expression()?;
        self.skip_newlines();
        self.expect(TokenKind::Colon)?;
        self.skip_newlines();
        let else_branch = self.parse_expression()?;

        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
            position,
        })
    }

    pub(crate) fn parse_unary(&mut self) -> ParseResult<Expr> {
        if let Some(op) = UnaryOp::from_token(self.peek_kind(0)) {
            let token = self.consume();
            let operand = self.nested(|ctx| ctx.parse_unary())?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                position: token.position(),
            });
        }

        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    /// Operand without operators: a variable, field chain or index that
    /// can stand left of `=`.
    pub(crate) fn parse_assignment_target(&mut self) -> ParseResult<Expr> {
        self.parse_unary()
    }

    /// `[index]` and `.field` suffixes.
    fn parse_postfix(&mut self, mut expr: Expr) -> ParseResult<Expr> {
        loop {
            match self.peek_kind(0) {
                TokenKind::LBracket => {
                    let open = self.consume();
                    self.skip_newlines();
                    let index = self.parse_expression()?;
                    self.skip_newlines();
                    self.expect_closing(&open, TokenKind::RBracket)?;
                    let position = expr.position();
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        position,
                    };
                }
                TokenKind::Dot => {
                    self.consume();
                    let field = self.expect_member_name()?;
                    if self.check(TokenKind::LParen) {
                        return Err(ParseError::unsupported(
                            "method call",
                            "only guest-language functions can be called through '.'",
                            field.position(),
                        ));
                    }
                    let position = expr.position();
                    expr = Expr::FieldAccess {
                        object: Box::new(expr),
                        field: field.literal,
                        position,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Name after a `.`; guest-language tags are ordinary names here.
    pub(crate) fn expect_member_name(&mut self) -> ParseResult<Token> {
        match self.peek_kind(0) {
            TokenKind::Identifier | TokenKind::Language => Ok(self.consume()),
            _ => Err(ParseError::syntax("field name", &self.current())),
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.current();
        match token.kind {
            TokenKind::Number | TokenKind::String | TokenKind::True | TokenKind::False | TokenKind::Nil => {
                self.parse_literal()
            }
            TokenKind::Identifier | TokenKind::Language => self.parse_reference(),
            TokenKind::LParen => self.parse_grouped(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            TokenKind::BitOpen => {
                let (segments, position) = self.parse_bitstring(false)?;
                Ok(Expr::Bitstring { segments, position })
            }
            _ => Err(ParseError::syntax("expression", &token)),
        }
    }

    /// Number, string, boolean or nil literal at the current token.
    pub(crate) fn parse_literal(&mut self) -> ParseResult<Expr> {
        let token = self.current();
        let position = token.position();
        let expr = match token.kind {
            TokenKind::Number => Expr::Number {
                value: parse_number(&token)?,
                raw: token.literal.clone(),
                position,
            },
            TokenKind::String => Expr::String {
                raw: self.slice(token.offset, token.end).to_string(),
                value: token.literal.clone(),
                position,
            },
            TokenKind::True => Expr::Boolean {
                value: true,
                position,
            },
            TokenKind::False => Expr::Boolean {
                value: false,
                position,
            },
            TokenKind::Nil => Expr::Nil { position },
            _ => return Err(ParseError::syntax("literal", &token)),
        };
        self.consume();
        Ok(expr)
    }

    pub(crate) fn parse_grouped(&mut self) -> ParseResult<Expr> {
        let open = self.expect(TokenKind::LParen)?;
        self.skip_newlines();
        let inner = self.parse_expression()?;
        self.skip_newlines();
        self.expect_closing(&open, TokenKind::RParen)?;
        Ok(Expr::Grouped {
            inner: Box::new(inner),
            position: open.position(),
        })
    }

    fn parse_array_literal(&mut self) -> ParseResult<Expr> {
        let open = self.expect(TokenKind::LBracket)?;
        let mut elements = Vec::new();

        self.skip_newlines();
        while !self.check(TokenKind::RBracket) {
            elements.push(self.parse_expression()?);
            self.skip_newlines();
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.consume();
            self.skip_newlines();
        }
        self.expect_closing(&open, TokenKind::RBracket)?;

        Ok(Expr::Array {
            elements,
            position: open.position(),
        })
    }

    fn parse_object_literal(&mut self) -> ParseResult<Expr> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut entries = Vec::new();

        self.skip_newlines();
        while !self.check(TokenKind::RBrace) {
            let key_token = self.current();
            let key = match key_token.kind {
                TokenKind::Identifier | TokenKind::Language => ObjectKey::Identifier(key_token.literal),
                TokenKind::String => ObjectKey::String(key_token.literal),
                _ => return Err(ParseError::syntax("object key", &key_token)),
            };
            self.consume();
            self.expect(TokenKind::Colon)?;
            self.skip_newlines();
            let value = self.parse_expression()?;
            entries.push(ObjectEntry { key, value });

            self.skip_newlines();
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.consume();
            self.skip_newlines();
        }
        self.expect_closing(&open, TokenKind::RBrace)?;

        Ok(Expr::Object {
            entries,
            position: open.position(),
        })
    }
}

/// Decode a number token. Integers stay exact; anything with a fraction or
/// exponent becomes a float.
pub(crate) fn parse_number(token: &Token) -> ParseResult<Number> {
    let text = token.literal.replace('_', "");
    let invalid = || ParseError::syntax("number", token);

    let radix = match text.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0b" | "0B") => Some(2),
        Some("0o" | "0O") => Some(8),
        _ => None,
    };
    if let Some(radix) = radix {
        return BigInt::parse_bytes(text[2..].as_bytes(), radix)
            .map(Number::Integer)
            .ok_or_else(invalid);
    }

    if text.contains(['.', 'e', 'E']) {
        text.parse::<f64>().map(Number::Float).map_err(|_| invalid())
    } else {
        BigInt::from_str(&text).map(Number::Integer).map_err(|_| invalid())
    }
}
