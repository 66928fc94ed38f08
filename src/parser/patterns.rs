//! `match` statements and the patterns of their arms.

use std::collections::BTreeMap;

use crate::ast::{Expr, MatchArm, MatchStatement, Number, Pattern, Position, Statement, TokenKind};
use crate::context::ParseContext;
use crate::error::{ParseError, ParseResult};

impl ParseContext {
    /// `match expr { pattern -> body, ... }`. Arms are separated by commas
    /// or newlines; a trailing comma is allowed.
    pub(crate) fn parse_match(&mut self) -> ParseResult<Statement> {
        let keyword = self.expect(TokenKind::Match)?;
        let scrutinee = self.parse_expression()?;
        self.skip_newlines();
        let open = self.expect(TokenKind::LBrace)?;

        let mut arms = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::RBrace) && self.stream.has_more() {
            arms.push(self.parse_match_arm()?);

            let comma = self.check(TokenKind::Comma);
            if comma {
                self.consume();
            }
            let newlines = self.skip_newlines() > 0;
            if !comma && !newlines && !self.check(TokenKind::RBrace) {
                return Err(ParseError::syntax("',' or newline between match arms", &self.current()));
            }
        }
        self.expect_closing(&open, TokenKind::RBrace)?;

        Ok(Statement::Match(MatchStatement {
            scrutinee,
            arms,
            position: keyword.position(),
        }))
    }

    fn parse_match_arm(&mut self) -> ParseResult<MatchArm> {
        let pattern = self.parse_pattern()?;
        let position = pattern.position();
        self.skip_newlines();
        self.expect(TokenKind::Arrow)?;
        self.skip_newlines();

        let body = if self.check(TokenKind::LBrace) {
            Statement::Block(self.parse_block()?)
        } else {
            self.partially(|ctx| ctx.parse_statement())?
        };

        Ok(MatchArm {
            pattern,
            body,
            position,
        })
    }

    pub fn parse_pattern(&mut self) -> ParseResult<Pattern> {
        self.nested(|ctx| {
            let token = ctx.current();
            let position = token.position();
            match token.kind {
                TokenKind::Number | TokenKind::String | TokenKind::True | TokenKind::False | TokenKind::Nil => {
                    let value = normalize_literal(ctx.parse_literal()?);
                    Ok(Pattern::Literal { value, position })
                }
                TokenKind::Minus if ctx.peek_kind(1) == TokenKind::Number => {
                    ctx.consume();
                    let value = negate_literal(normalize_literal(ctx.parse_literal()?), position);
                    Ok(Pattern::Literal { value, position })
                }
                TokenKind::Underscore => {
                    ctx.consume();
                    Ok(Pattern::Wildcard { position })
                }
                TokenKind::Identifier => {
                    ctx.consume();
                    Ok(Pattern::Variable {
                        name: token.literal,
                        position,
                    })
                }
                TokenKind::LBracket => ctx.parse_array_pattern(),
                TokenKind::LBrace => ctx.parse_object_pattern(),
                TokenKind::BitOpen => {
                    let (segments, position) = ctx.parse_bitstring(true)?;
                    Ok(Pattern::Bitstring { segments, position })
                }
                _ => Err(ParseError::syntax("pattern", &token)),
            }
        })
    }

    /// `[p, p, ...rest]`
    fn parse_array_pattern(&mut self) -> ParseResult<Pattern> {
        let open = self.expect(TokenKind::LBracket)?;
        let mut elements = Vec::new();
        let mut rest = None;

        self.skip_newlines();
        while !self.check(TokenKind::RBracket) {
            if self.check(TokenKind::Ellipsis) {
                let ellipsis = self.consume();
                rest = Some(self.expect(TokenKind::Identifier)?.literal);
                self.skip_newlines();
                if self.check(TokenKind::Comma) {
                    self.consume();
                    self.skip_newlines();
                }
                if !self.check(TokenKind::RBracket) {
                    return Err(ParseError::unsupported(
                        "rest pattern",
                        "'...' may only bind the last element of an array pattern",
                        ellipsis.position(),
                    ));
                }
                break;
            }

            elements.push(self.parse_pattern()?);
            self.skip_newlines();
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.consume();
            self.skip_newlines();
        }
        self.expect_closing(&open, TokenKind::RBracket)?;

        Ok(Pattern::Array {
            elements,
            rest,
            position: open.position(),
        })
    }

    /// `{key: pattern, ...}`; keys are identifiers, strings or `_`.
    fn parse_object_pattern(&mut self) -> ParseResult<Pattern> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut fields = BTreeMap::new();

        self.skip_newlines();
        while !self.check(TokenKind::RBrace) {
            let key = self.current();
            if !matches!(
                key.kind,
                TokenKind::Identifier | TokenKind::String | TokenKind::Underscore | TokenKind::Language
            ) {
                return Err(ParseError::syntax("object pattern key", &key));
            }
            self.consume();
            self.expect(TokenKind::Colon)?;
            self.skip_newlines();
            let pattern = self.parse_pattern()?;

            if fields.insert(key.literal.clone(), pattern).is_some() {
                return Err(ParseError::unsupported(
                    "object pattern",
                    format!("key '{}' appears more than once", key.literal),
                    key.position(),
                ));
            }

            self.skip_newlines();
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.consume();
            self.skip_newlines();
        }
        self.expect_closing(&open, TokenKind::RBrace)?;

        Ok(Pattern::Object {
            fields,
            position: open.position(),
        })
    }
}

/// Integer literals in patterns carry their decimal spelling, so `0xFF`
/// and `255` produce the same pattern.
fn normalize_literal(expr: Expr) -> Expr {
    match expr {
        Expr::Number {
            value: Number::Integer(n),
            position,
            ..
        } => Expr::Number {
            raw: n.to_string(),
            value: Number::Integer(n),
            position,
        },
        other => other,
    }
}

fn negate_literal(expr: Expr, position: Position) -> Expr {
    match expr {
        Expr::Number {
            value: Number::Integer(n),
            ..
        } => Expr::Number {
            raw: (-&n).to_string(),
            value: Number::Integer(-n),
            position,
        },
        Expr::Number {
            value: Number::Float(f),
            raw,
            ..
        } => Expr::Number {
            raw: format!("-{raw}"),
            value: Number::Float(-f),
            position,
        },
        other => other,
    }
}
