//! Statement dispatch and the statement-level constructs.

use tracing::{debug, trace};

use crate::ast::{Block, Expr, Position, Program, Statement, TokenKind};
use crate::config::ConstructHandlerConfig;
use crate::context::ParseContext;
use crate::error::{ParseError, ParseResult};
use crate::languages::LanguageConstruct;
use crate::registry::{HandlerOutcome, HandlerResult};

impl ParseContext {
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut statements = Vec::new();
        self.skip_separators();
        while self.stream.has_more() {
            statements.push(self.parse_statement()?);
            self.skip_separators();
        }
        Ok(Program { statements })
    }

    /// Parse one statement by trying every matching handler in dispatch
    /// order, then the fallbacks.
    pub fn parse_statement(&mut self) -> ParseResult<Statement> {
        let registry = self.handlers();
        let start = self.stream.position();
        let window = self.stream.window(registry.window_size());
        let Some(first) = window.first().cloned() else {
            return Err(ParseError::syntax("statement", &self.current()));
        };

        let primaries = registry.matching(&window);
        let fallbacks = registry.fallbacks();
        let candidates = primaries
            .iter()
            .map(|h| (h, false))
            .chain(fallbacks.iter().map(|h| (h, true)));

        for (handler, fallback) in candidates {
            let config = handler.config();
            debug!(
                handler = %config.name,
                construct = %config.construct,
                fallback,
                line = first.line,
                column = first.column,
                "trying handler"
            );
            match self.nested(|ctx| handler.handle(ctx))? {
                HandlerOutcome::Matched(statement) => {
                    debug!(handler = %config.name, "handler matched");
                    if !self.is_partial() {
                        self.expect_terminator()?;
                    }
                    return Ok(statement);
                }
                HandlerOutcome::NotApplicable => {
                    trace!(handler = %config.name, "handler declined");
                    self.stream.set_position(start);
                }
            }
        }

        Err(ParseError::HandlerNotFound {
            token: first.to_string(),
            position: first.position(),
        })
    }

    fn expect_terminator(&self) -> ParseResult<()> {
        let token = self.current();
        if token.kind.is_terminator() {
            Ok(())
        } else {
            Err(ParseError::syntax("end of statement", &token))
        }
    }

    /// `{ statement* }`
    pub(crate) fn parse_block(&mut self) -> ParseResult<Block> {
        let open = self.expect(TokenKind::LBrace)?;
        self.strictly(|ctx| {
            let mut statements = Vec::new();
            ctx.skip_separators();
            while !ctx.check(TokenKind::RBrace) && ctx.stream.has_more() {
                statements.push(ctx.parse_statement()?);
                ctx.skip_separators();
            }
            ctx.expect_closing(&open, TokenKind::RBrace)?;
            Ok(Block {
                statements,
                position: open.position(),
            })
        })
    }

    pub(crate) fn parse_block_statement(&mut self) -> ParseResult<Statement> {
        self.parse_block().map(Statement::Block)
    }

    /// A block, or `:` followed by a single statement.
    pub(crate) fn parse_body(&mut self) -> ParseResult<Block> {
        if self.check(TokenKind::Colon) {
            let colon = self.consume();
            self.skip_newlines();
            let statement = self.partially(|ctx| ctx.parse_statement())?;
            return Ok(Block {
                statements: vec![statement],
                position: colon.position(),
            });
        }
        self.skip_newlines();
        self.parse_block()
    }

    pub(crate) fn parse_if(&mut self) -> ParseResult<Statement> {
        let keyword = self.expect(TokenKind::If)?;
        let condition = self.parse_expression()?;
        let then_block = self.parse_body()?;

        let else_block = if self.next_after_newlines_is(TokenKind::Else) {
            self.skip_newlines();
            let else_token = self.consume();
            if self.check(TokenKind::If) {
                let nested = self.nested(|ctx| ctx.parse_if())?;
                Some(Block {
                    statements: vec![nested],
                    position: else_token.position(),
                })
            } else {
                Some(self.parse_body()?)
            }
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_block,
            else_block,
            position: keyword.position(),
        })
    }

    pub(crate) fn parse_for_in(&mut self, config: &ConstructHandlerConfig) -> HandlerResult {
        // for name (, name)* in
        let shape = self.lookahead(|probe| {
            probe.consume();
            loop {
                if !matches!(probe.peek_kind(0), TokenKind::Identifier | TokenKind::Underscore) {
                    return false;
                }
                probe.consume();
                match probe.peek_kind(0) {
                    TokenKind::Comma => {
                        probe.consume();
                    }
                    TokenKind::In => return true,
                    _ => return false,
                }
            }
        });
        if !shape {
            return Ok(HandlerOutcome::NotApplicable);
        }

        let keyword = self.consume();
        let mut variables = Vec::new();
        loop {
            variables.push(self.consume().literal);
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.consume();
        }
        self.expect(TokenKind::In)?;

        if self.check(TokenKind::LBracket) && config.bool_param("allowArrayIterable") != Some(true) {
            return Err(ParseError::unsupported(
                "array literal",
                "a for-in loop cannot iterate an array literal; assign it to a variable first",
                self.current().position(),
            ));
        }
        let iterable = self.parse_expression()?;
        let body = self.in_loop(|ctx| ctx.parse_body())?;

        Ok(HandlerOutcome::Matched(Statement::ForIn {
            variables,
            iterable,
            body,
            position: keyword.position(),
        }))
    }

    pub(crate) fn parse_numeric_for(&mut self) -> HandlerResult {
        let shape = self.peek_kind(1) == TokenKind::Identifier && self.peek_kind(2) == TokenKind::Assign;
        if !shape {
            return Ok(HandlerOutcome::NotApplicable);
        }

        let keyword = self.consume();
        let variable = self.consume().literal;
        self.expect(TokenKind::Assign)?;
        let start = self.parse_expression()?;
        self.expect(TokenKind::Comma)?;
        let end = self.parse_expression()?;
        let step = if self.check(TokenKind::Comma) {
            self.consume();
            Some(self.parse_expression()?)
        } else {
            None
        };
        let body = self.in_loop(|ctx| ctx.parse_body())?;

        Ok(HandlerOutcome::Matched(Statement::NumericFor {
            variable,
            start,
            end,
            step,
            body,
            position: keyword.position(),
        }))
    }

    pub(crate) fn parse_while(&mut self) -> ParseResult<Statement> {
        let keyword = self.expect(TokenKind::While)?;
        let condition = self.parse_expression()?;
        let body = self.in_loop(|ctx| ctx.parse_body())?;
        Ok(Statement::While {
            condition,
            body,
            position: keyword.position(),
        })
    }

    /// `break` or `continue`, legal only inside a loop body.
    pub(crate) fn parse_loop_control(&mut self) -> ParseResult<Statement> {
        let token = self.current();
        if self.loop_depth() == 0 {
            return Err(ParseError::Context {
                position: token.position(),
                keyword: token.literal,
            });
        }
        let token = self.consume();
        match token.kind {
            TokenKind::Break => Ok(Statement::Break { token }),
            _ => Ok(Statement::Continue { token }),
        }
    }

    /// `lang { ... }` or `lang(a, b) { ... }`. The body is taken verbatim
    /// from the source and never tokenized.
    pub(crate) fn parse_code_block(&mut self) -> HandlerResult {
        let head = self.current();
        let next = self.peek_kind(1);
        let construct = self.languages().construct_for(&head.literal, next, false);
        match head.kind {
            TokenKind::Language if construct == Some(LanguageConstruct::CodeBlock) => {}
            TokenKind::Language if self.languages().is_language(&head.literal) => {
                return Ok(HandlerOutcome::NotApplicable);
            }
            TokenKind::Language if matches!(next, TokenKind::LBrace | TokenKind::LParen) => {
                // reserved tag missing from the configured languages
                self.languages().resolve_at(&head.literal, head.position())?;
            }
            TokenKind::Identifier
                if construct == Some(LanguageConstruct::CodeBlock) && self.captures_then_brace() => {}
            _ => return Ok(HandlerOutcome::NotApplicable),
        }

        let language = self.languages().resolve_at(&head.literal, head.position())?;
        self.consume();

        let mut captures = Vec::new();
        if self.check(TokenKind::LParen) {
            let open = self.consume();
            while self.check(TokenKind::Identifier) {
                captures.push(self.consume().literal);
                if !self.check(TokenKind::Comma) {
                    break;
                }
                self.consume();
            }
            self.expect_closing(&open, TokenKind::RParen)?;
        }

        let open = self.expect(TokenKind::LBrace)?;
        let (close, resume) = self.raw_block_end(open.end).ok_or_else(|| ParseError::Unclosed {
            delimiter: TokenKind::LBrace,
            opened_at: open.position(),
            found: TokenKind::Eof.to_string(),
            position: self.location_of(self.source().len()),
        })?;
        let code = self.slice(open.end, close).to_string();
        self.stream.resync_at(resume);
        trace!(language = %language, bytes = code.len(), "captured code block");

        Ok(HandlerOutcome::Matched(Statement::CodeBlock {
            language,
            captures,
            code,
            position: head.position(),
        }))
    }

    /// Whether an identifier head is followed by `{` or by `( names ) {`.
    fn captures_then_brace(&self) -> bool {
        self.lookahead(|probe| {
            probe.consume();
            if probe.peek_kind(0) == TokenKind::LParen {
                probe.consume();
                while matches!(probe.peek_kind(0), TokenKind::Identifier | TokenKind::Comma) {
                    probe.consume();
                }
                if probe.peek_kind(0) != TokenKind::RParen {
                    return false;
                }
                probe.consume();
            }
            probe.peek_kind(0) == TokenKind::LBrace
        })
    }

    /// Find the `}` closing a raw block whose body starts at byte `from`.
    /// Braces inside quoted strings do not count. Returns the byte offset of
    /// the closing brace and the position just after it.
    fn raw_block_end(&self, from: usize) -> Option<(usize, Position)> {
        let source = self.source();
        let mut depth = 1usize;
        let mut quote: Option<char> = None;
        let mut escaped = false;

        for (i, ch) in source.get(from..)?.char_indices() {
            let at = from + i;
            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == q || (ch == '\n' && q != '`') {
                    quote = None;
                }
                continue;
            }
            match ch {
                '"' | '\'' | '`' => quote = Some(ch),
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((at, self.location_of(at + 1)));
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Line and column of a byte offset.
    fn location_of(&self, offset: usize) -> Position {
        let before = self.slice(0, offset);
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Position::new(line, column, offset)
    }

    /// `target = value`, where the value may be a pipe expression.
    pub(crate) fn parse_assignment(&mut self) -> HandlerResult {
        if !self.assignment_ahead() {
            return Ok(HandlerOutcome::NotApplicable);
        }

        let target = self.parse_assignment_target()?;
        if !target.is_assignable() {
            return Err(ParseError::unsupported(
                "assignment target",
                "only variables, qualified variables, fields and indexes can be assigned",
                target.position(),
            ));
        }
        self.expect(TokenKind::Assign)?;
        self.skip_newlines();
        let value = self.parse_pipe_expression()?;

        let position = target.position();
        Ok(HandlerOutcome::Matched(Statement::Assignment {
            target,
            value,
            position,
        }))
    }

    /// Whether a top-level `=` appears before the statement ends.
    fn assignment_ahead(&self) -> bool {
        let partial = self.is_partial();
        self.lookahead(|probe| {
            let mut depth = 0usize;
            loop {
                match probe.peek_kind(0) {
                    TokenKind::Assign if depth == 0 => return true,
                    TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace | TokenKind::BitOpen => {
                        depth += 1;
                    }
                    TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace | TokenKind::BitClose => {
                        if depth == 0 {
                            return false;
                        }
                        depth -= 1;
                    }
                    TokenKind::Eof => return false,
                    TokenKind::Newline | TokenKind::Semicolon | TokenKind::Arrow if depth == 0 => {
                        return false;
                    }
                    TokenKind::Comma if depth == 0 && partial => return false,
                    _ => {}
                }
                probe.consume();
            }
        })
    }

    /// Statement led by a dotted chain that ends in a call, such as
    /// `py.load(path)`, optionally continued into a pipe and marked `&`.
    pub(crate) fn parse_language_call_statement(&mut self) -> HandlerResult {
        if !matches!(self.peek_kind(0), TokenKind::Language | TokenKind::Identifier)
            || self.peek_kind(1) != TokenKind::Dot
        {
            return Ok(HandlerOutcome::NotApplicable);
        }
        let (_, ends_in_call) = self.scan_chain();
        if !ends_in_call {
            return Ok(HandlerOutcome::NotApplicable);
        }

        let position = self.current().position();
        let call = self.parse_pipe_expression()?;
        let background = self.parse_background_marker()?;
        Ok(HandlerOutcome::Matched(Statement::LanguageCall {
            call,
            background,
            position,
        }))
    }

    /// `obj.field`, `py.state.counter` or `items[0]` read as a statement.
    pub(crate) fn parse_field_access_statement(&mut self) -> HandlerResult {
        if !matches!(self.peek_kind(0), TokenKind::Language | TokenKind::Identifier)
            || !matches!(self.peek_kind(1), TokenKind::Dot | TokenKind::LBracket)
        {
            return Ok(HandlerOutcome::NotApplicable);
        }

        let expr = self.parse_expression()?;
        let position = expr.position();
        Ok(HandlerOutcome::Matched(Statement::Expression { expr, position }))
    }

    /// `name(args)`, possibly feeding a pipe.
    pub(crate) fn parse_builtin_call_statement(&mut self) -> HandlerResult {
        if !self.check(TokenKind::Identifier) || self.peek_kind(1) != TokenKind::LParen {
            return Ok(HandlerOutcome::NotApplicable);
        }
        self.parse_expression_statement().map(HandlerOutcome::Matched)
    }

    /// Any expression as a statement. Pipes and language calls become
    /// language-call statements and may be marked `&`.
    pub(crate) fn parse_expression_statement(&mut self) -> ParseResult<Statement> {
        let expr = self.parse_pipe_expression()?;
        let position = expr.position();
        match expr {
            Expr::Pipe(_) | Expr::LanguageCall(_) => {
                let background = self.parse_background_marker()?;
                Ok(Statement::LanguageCall {
                    call: expr,
                    background,
                    position,
                })
            }
            expr => Ok(Statement::Expression { expr, position }),
        }
    }
}
