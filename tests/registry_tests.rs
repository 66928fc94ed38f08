// tests/registry_tests.rs

use mosaic_lang::ast::{Expr, Statement, Token, TokenKind};
use mosaic_lang::registry::HandlerResult;
use mosaic_lang::{
    ConstructHandler, ConstructHandlerConfig, ConstructKind, HandlerOutcome, HandlerRegistry, Lexer, ParseContext,
    ParseError, ParseErrorKind, Parser, ParserConfig, TokenPattern,
};

fn tokens(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize().unwrap()
}

fn names(handlers: Vec<&dyn ConstructHandler>) -> Vec<String> {
    handlers.into_iter().map(|h| h.config().name.clone()).collect()
}

/// Matches by configuration only; parsing always declines.
struct Named {
    config: ConstructHandlerConfig,
}

impl Named {
    fn boxed(name: &str, priority: i32, order: i32, kind: TokenKind) -> Box<dyn ConstructHandler> {
        let config = ConstructHandlerConfig::new(ConstructKind::Expression, name, priority, order)
            .with_pattern(TokenPattern::new(kind, 0));
        Box::new(Named { config })
    }
}

impl ConstructHandler for Named {
    fn config(&self) -> &ConstructHandlerConfig {
        &self.config
    }

    fn handle(&self, _ctx: &mut ParseContext) -> HandlerResult {
        Ok(HandlerOutcome::NotApplicable)
    }
}

/// `say <expr>` as a builtin call.
struct SayHandler {
    config: ConstructHandlerConfig,
}

impl ConstructHandler for SayHandler {
    fn config(&self) -> &ConstructHandlerConfig {
        &self.config
    }

    fn handle(&self, ctx: &mut ParseContext) -> HandlerResult {
        let keyword = ctx.consume();
        let message = ctx.parse_expression()?;
        Ok(HandlerOutcome::Matched(Statement::Expression {
            expr: Expr::BuiltinCall {
                name: keyword.literal.clone(),
                arguments: vec![message],
                position: keyword.position(),
            },
            position: keyword.position(),
        }))
    }
}

/// Consumes tokens, then declines.
struct Greedy {
    config: ConstructHandlerConfig,
}

impl ConstructHandler for Greedy {
    fn config(&self) -> &ConstructHandlerConfig {
        &self.config
    }

    fn handle(&self, ctx: &mut ParseContext) -> HandlerResult {
        ctx.consume();
        ctx.consume();
        Ok(HandlerOutcome::NotApplicable)
    }
}

/// Always fails after committing.
struct Failing {
    config: ConstructHandlerConfig,
}

impl ConstructHandler for Failing {
    fn config(&self) -> &ConstructHandlerConfig {
        &self.config
    }

    fn handle(&self, ctx: &mut ParseContext) -> HandlerResult {
        Err(ParseError::unsupported("test construct", "always fails", ctx.current().position()))
    }
}

/// Claims identifiers, except the word `skip`.
struct Picky {
    config: ConstructHandlerConfig,
}

impl ConstructHandler for Picky {
    fn config(&self) -> &ConstructHandlerConfig {
        &self.config
    }

    fn can_handle(&self, token: &Token) -> bool {
        token.literal != "skip"
    }

    fn handle(&self, ctx: &mut ParseContext) -> HandlerResult {
        Err(ParseError::unsupported("picky construct", "claimed the statement", ctx.current().position()))
    }
}

fn identifier_config(name: &str, priority: i32) -> ConstructHandlerConfig {
    ConstructHandlerConfig::new(ConstructKind::Expression, name, priority, 0)
        .with_pattern(TokenPattern::new(TokenKind::Identifier, 0))
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_lower_order_wins_at_equal_priority() {
    let mut first = HandlerRegistry::new(0);
    first.register(Named::boxed("late", 50, 1, TokenKind::Identifier));
    first.register(Named::boxed("early", 50, 0, TokenKind::Identifier));

    let mut second = HandlerRegistry::new(0);
    second.register(Named::boxed("early", 50, 0, TokenKind::Identifier));
    second.register(Named::boxed("late", 50, 1, TokenKind::Identifier));

    let window = tokens("x");
    assert_eq!(first.resolve(&window).unwrap().config().name, "early");
    assert_eq!(second.resolve(&window).unwrap().config().name, "early");
    assert_eq!(names(first.matching(&window)), vec!["early", "late"]);
}

#[test]
fn test_higher_priority_beats_order() {
    let mut registry = HandlerRegistry::new(0);
    registry.register(Named::boxed("first-in-order", 10, 0, TokenKind::Identifier));
    registry.register(Named::boxed("important", 20, 9, TokenKind::Identifier));
    assert_eq!(registry.resolve(&tokens("x")).unwrap().config().name, "important");
}

#[test]
fn test_name_breaks_remaining_ties() {
    let mut registry = HandlerRegistry::new(0);
    registry.register(Named::boxed("beta", 10, 0, TokenKind::Identifier));
    registry.register(Named::boxed("alpha", 10, 0, TokenKind::Identifier));
    assert_eq!(names(registry.matching(&tokens("x"))), vec!["alpha", "beta"]);
}

#[test]
fn test_default_dispatch_order_for_dotted_identifier() {
    let registry = HandlerRegistry::with_defaults();
    assert_eq!(
        names(registry.matching(&tokens("obj.field"))),
        vec!["code-block", "assignment", "language-call", "field-access", "builtin-call"]
    );
    assert_eq!(names(registry.matching(&tokens("for x in y"))), vec!["for-in", "numeric-for"]);
}

// ============================================================================
// Indexing and Patterns
// ============================================================================

#[test]
fn test_window_size_follows_largest_offset() {
    assert_eq!(HandlerRegistry::with_defaults().window_size(), 2);

    let mut registry = HandlerRegistry::with_defaults();
    let config = identifier_config("far", 1).with_pattern(TokenPattern::new(TokenKind::Arrow, 3));
    registry.register(Box::new(Named { config }));
    assert_eq!(registry.window_size(), 4);
}

#[test]
fn test_pattern_at_later_offset_matches_any_leading_token() {
    let mut registry = HandlerRegistry::new(0);
    let config = ConstructHandlerConfig::new(ConstructKind::FieldAccess, "dotted", 1, 0)
        .with_pattern(TokenPattern::new(TokenKind::Dot, 1));
    registry.register(Box::new(Named { config }));

    assert_eq!(names(registry.matching(&tokens("a.b"))), vec!["dotted"]);
    assert_eq!(names(registry.matching(&tokens("\"s\".b"))), vec!["dotted"]);
    assert!(registry.matching(&tokens("a b")).is_empty());
}

#[test]
fn test_pattern_values() {
    let pattern = TokenPattern::with_value(TokenKind::Identifier, "say", 0);
    let window = tokens("say hello");
    assert!(pattern.matches(&window[0]));
    assert!(!pattern.matches(&window[1]));

    let handler = Named {
        config: ConstructHandlerConfig::new(ConstructKind::Expression, "say", 1, 0).with_pattern(pattern),
    };
    assert!(handler.can_handle(&window[0]));
    assert!(!handler.can_handle(&window[1]));
}

#[test]
fn test_default_leading_filter_allows_later_offsets() {
    let handler = Named {
        config: ConstructHandlerConfig::new(ConstructKind::FieldAccess, "dotted", 1, 0)
            .with_pattern(TokenPattern::new(TokenKind::Dot, 1)),
    };
    let window = tokens("\"s\".b");
    assert!(handler.can_handle(&window[0]));
}

#[test]
fn test_leading_filter_vetoes_candidates() {
    let mut registry = HandlerRegistry::new(0);
    registry.register(Box::new(Picky {
        config: identifier_config("picky", 10),
    }));
    registry.register(Named::boxed("plain", 1, 0, TokenKind::Identifier));

    assert_eq!(names(registry.matching(&tokens("keep"))), vec!["picky", "plain"]);
    assert_eq!(names(registry.matching(&tokens("skip"))), vec!["plain"]);
}

#[test]
fn test_for_construct() {
    let registry = HandlerRegistry::with_defaults();
    assert_eq!(names(registry.for_construct(ConstructKind::ForIn)), vec!["for-in"]);
    // fallbacks are only reachable through the fallback queries
    assert!(registry.for_construct(ConstructKind::Expression).is_empty());
    assert_eq!(names(registry.fallbacks_for(ConstructKind::Expression)), vec!["expression"]);
}

#[test]
fn test_disabled_handlers_are_skipped() {
    let mut registry = HandlerRegistry::new(0);
    let mut config = identifier_config("off", 100);
    config.enabled = false;
    registry.register(Box::new(Named { config }));
    registry.register(Box::new(Named { config: identifier_config("on", 1) }));
    assert_eq!(names(registry.matching(&tokens("x"))), vec!["on"]);
    assert_eq!(registry.len(), 2);
}

// ============================================================================
// Fallbacks
// ============================================================================

#[test]
fn test_fallbacks_sorted_by_fallback_priority() {
    let mut registry = HandlerRegistry::new(10);

    let explicit = ConstructHandlerConfig::new(ConstructKind::Expression, "explicit", 0, 0).as_fallback(5);
    let mut inherited = ConstructHandlerConfig::new(ConstructKind::Expression, "inherited", 0, 0);
    inherited.fallback = true;

    registry.register(Box::new(Named { config: explicit }));
    registry.register(Box::new(Named { config: inherited }));

    assert_eq!(names(registry.fallbacks()), vec!["inherited", "explicit"]);
    assert!(registry.matching(&tokens("x")).is_empty());
}

#[test]
fn test_disabling_the_fallback_leaves_literals_unhandled() {
    let mut config = ParserConfig::default();
    config.handler_mut("expression").unwrap().enabled = false;
    let parser = Parser::with_config(config).unwrap();

    match parser.parse("42").unwrap_err() {
        ParseError::HandlerNotFound { token, position } => {
            assert_eq!(token, "number '42'");
            assert_eq!(position.column, 1);
        }
        other => panic!("Expected handler-not-found error, got {:?}", other),
    }
    // keyword-led statements still parse
    assert!(parser.parse("x = 1").is_ok());
}

// ============================================================================
// Dispatch Through a Parser
// ============================================================================

#[test]
fn test_custom_handler() {
    let config = ParserConfig::default();
    let mut registry = HandlerRegistry::from_config(&config);
    registry.register(Box::new(SayHandler {
        config: ConstructHandlerConfig::new(ConstructKind::BuiltinCall, "say", 200, 0)
            .with_pattern(TokenPattern::with_value(TokenKind::Identifier, "say", 0)),
    }));
    let parser = Parser::with_registry(config, registry);

    let program = parser.parse("say 1 + 2\nx = say").unwrap();
    assert_eq!(program.statements.len(), 2);
    match &program.statements[0] {
        Statement::Expression {
            expr: Expr::BuiltinCall { name, arguments, .. },
            ..
        } => {
            assert_eq!(name, "say");
            assert!(matches!(arguments[0], Expr::Binary { .. }));
        }
        other => panic!("Expected say call, got {:?}", other),
    }
    assert!(matches!(program.statements[1], Statement::Assignment { .. }));
}

#[test]
fn test_declining_handler_restores_position() {
    let config = ParserConfig::default();
    let mut registry = HandlerRegistry::from_config(&config);
    registry.register(Box::new(Greedy {
        config: identifier_config("greedy", 500),
    }));
    let parser = Parser::with_registry(config, registry);

    assert!(matches!(
        parser.parse("x = 1").unwrap().statements[0],
        Statement::Assignment { .. }
    ));
}

#[test]
fn test_errors_after_commit_abort_the_parse() {
    let config = ParserConfig::default();
    let mut registry = HandlerRegistry::from_config(&config);
    registry.register(Box::new(Failing {
        config: identifier_config("failing", 500),
    }));
    let parser = Parser::with_registry(config, registry);

    assert_eq!(parser.parse("x = 1").unwrap_err().kind(), ParseErrorKind::Unsupported);
    // other leading tokens never reach it
    assert!(parser.parse("if true { }").is_ok());
}

#[test]
fn test_vetoed_handler_is_never_dispatched() {
    let config = ParserConfig::default();
    let mut registry = HandlerRegistry::from_config(&config);
    registry.register(Box::new(Picky {
        config: identifier_config("picky", 500),
    }));
    let parser = Parser::with_registry(config, registry);

    assert!(parser.parse("skip = 1").is_ok());
    assert_eq!(parser.parse("keep = 1").unwrap_err().kind(), ParseErrorKind::Unsupported);
}

#[test]
fn test_disabling_language_call_handler() {
    let mut config = ParserConfig::default();
    config.handler_mut("language-call").unwrap().enabled = false;
    let parser = Parser::with_config(config).unwrap();

    match &parser.parse("py.run()").unwrap().statements[0] {
        Statement::Expression {
            expr: Expr::LanguageCall(call),
            ..
        } => assert_eq!(call.language, "python"),
        other => panic!("Expected expression statement, got {:?}", other),
    }
}
