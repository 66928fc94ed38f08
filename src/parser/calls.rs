//! Identifier references, dotted chains, calls and pipes.
//!
//! A chain headed by a language tag, or by an identifier naming a
//! configured language, is a guest reference: with a `(` right after the
//! last segment it is a [`LanguageCall`] whose segments fold into one
//! function name, otherwise a [`QualifiedIdentifier`]. A chain headed by
//! any other identifier is a plain field-access chain and cannot end in a
//! call.

use crate::ast::{Expr, LanguageCall, PipeExpr, QualifiedIdentifier, Token, TokenKind};
use crate::context::ParseContext;
use crate::error::{ParseError, ParseResult};

impl ParseContext {
    /// Number of `.name` segments after the current token, and whether a
    /// `(` directly follows the last one.
    pub(crate) fn scan_chain(&self) -> (usize, bool) {
        self.lookahead(|probe| {
            probe.consume();
            let mut segments = 0;
            while probe.peek_kind(0) == TokenKind::Dot
                && matches!(probe.peek_kind(1), TokenKind::Identifier | TokenKind::Language)
            {
                probe.consume();
                probe.consume();
                segments += 1;
            }
            (segments, probe.peek_kind(0) == TokenKind::LParen)
        })
    }

    /// Expression led by an identifier or language tag.
    pub(crate) fn parse_reference(&mut self) -> ParseResult<Expr> {
        let head = self.current();
        let guest = head.is(TokenKind::Language) || self.languages().is_language(&head.literal);

        match self.peek_kind(1) {
            TokenKind::Dot if guest => self.parse_guest_chain(),
            TokenKind::Dot => {
                let (_, ends_in_call) = self.scan_chain();
                if ends_in_call {
                    // obj.method() reads as a call into an unknown language
                    return Err(ParseError::UnknownLanguage {
                        position: head.position(),
                        name: head.literal,
                    });
                }
                self.consume();
                Ok(Expr::Identifier {
                    position: head.position(),
                    name: head.literal,
                })
            }
            TokenKind::LParen if head.is(TokenKind::Identifier) => self.parse_builtin_call(),
            _ if head.is(TokenKind::Language) => {
                self.consume();
                Err(ParseError::syntax(
                    format!("'.' after language tag '{}'", head.literal),
                    &self.current(),
                ))
            }
            _ => {
                self.consume();
                Ok(Expr::Identifier {
                    position: head.position(),
                    name: head.literal,
                })
            }
        }
    }

    /// `lang.a.b(...)` or `lang.a.b`.
    fn parse_guest_chain(&mut self) -> ParseResult<Expr> {
        let head = self.consume();
        let position = head.position();
        let language = self.languages().resolve_at(&head.literal, position)?;

        let mut segments = Vec::new();
        while self.check(TokenKind::Dot) {
            self.consume();
            segments.push(self.expect_member_name()?.literal);
        }

        if self.check(TokenKind::LParen) {
            let arguments = self.parse_call_arguments()?;
            return Ok(Expr::LanguageCall(LanguageCall {
                language,
                function: segments.join("."),
                arguments,
                position,
            }));
        }

        let Some(name) = segments.pop() else {
            return Err(ParseError::syntax("name after '.'", &self.current()));
        };
        Ok(Expr::Qualified(QualifiedIdentifier {
            language,
            path: segments,
            name,
            position,
        }))
    }

    fn parse_builtin_call(&mut self) -> ParseResult<Expr> {
        let name = self.consume();
        let arguments = self.parse_call_arguments()?;
        Ok(Expr::BuiltinCall {
            position: name.position(),
            name: name.literal,
            arguments,
        })
    }

    /// `( arg, ... )`, trailing comma allowed.
    pub(crate) fn parse_call_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let open = self.expect(TokenKind::LParen)?;
        let mut arguments = Vec::new();

        self.skip_newlines();
        while !self.check(TokenKind::RParen) {
            arguments.push(self.parse_argument()?);
            self.skip_newlines();
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.consume();
            self.skip_newlines();
        }
        self.expect_closing(&open, TokenKind::RParen)?;

        Ok(arguments)
    }

    /// Bare literals and identifiers are taken directly; anything followed
    /// by more than a separator goes through the expression parser.
    fn parse_argument(&mut self) -> ParseResult<Expr> {
        let simple = matches!(self.peek_kind(1), TokenKind::Comma | TokenKind::RParen | TokenKind::Newline);
        match self.peek_kind(0) {
            kind if simple && kind.is_literal() => self.parse_literal(),
            TokenKind::Identifier if simple => {
                let token = self.consume();
                Ok(simple_identifier(token))
            }
            _ => self.parse_expression(),
        }
    }

    /// `expr (|> expr)*`. A `|>` may start a continuation line.
    pub(crate) fn parse_pipe_expression(&mut self) -> ParseResult<Expr> {
        let first = self.parse_expression()?;
        let position = first.position();
        let mut stages = vec![first];
        let mut operators = Vec::new();

        while self.next_after_newlines_is(TokenKind::PipeOp) {
            self.skip_newlines();
            operators.push(self.consume());
            self.skip_newlines();
            stages.push(self.parse_expression()?);
        }

        if operators.is_empty() {
            return Ok(stages.remove(0));
        }
        Ok(Expr::Pipe(PipeExpr {
            stages,
            operators,
            position,
        }))
    }

    /// Consume a trailing `&`. It has to end the line; inside a match arm
    /// or single-statement body it may also precede `,` or `}`.
    pub(crate) fn parse_background_marker(&mut self) -> ParseResult<bool> {
        if !self.check(TokenKind::Ampersand) {
            return Ok(false);
        }
        self.consume();

        let next = self.current();
        let allowed = match next.kind {
            TokenKind::Newline | TokenKind::Eof => true,
            TokenKind::Comma | TokenKind::RBrace => self.is_partial(),
            _ => false,
        };
        if !allowed {
            return Err(ParseError::syntax("newline or end of input after '&'", &next));
        }
        Ok(true)
    }
}

fn simple_identifier(token: Token) -> Expr {
    Expr::Identifier {
        position: token.position(),
        name: token.literal,
    }
}
