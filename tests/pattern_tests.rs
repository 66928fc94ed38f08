// tests/pattern_tests.rs

use mosaic_lang::ast::{Expr, MatchStatement, Pattern, Statement};
use mosaic_lang::output::SourcePrinter;
use mosaic_lang::{parse, ParseError, ParseErrorKind, Parser};

fn pattern(source: &str) -> Pattern {
    Parser::new().parse_pattern(source).unwrap()
}

fn match_statement(source: &str) -> MatchStatement {
    let mut statements = parse(source).unwrap().statements;
    match statements.remove(0) {
        Statement::Match(m) => m,
        other => panic!("Expected match, got {:?}", other),
    }
}

// ============================================================================
// Match Statements
// ============================================================================

#[test]
fn test_match_with_every_pattern_kind() {
    let source = r#"match packet {
    0 -> print("zero"),
    "ping" -> py.pong(),
    [first, ...rest] -> handle(first, rest)
    {kind: "user", name: n} -> x = n,
    <<tag:8, len:16, body:len/binary>> -> decode(body),
    _ -> {
        log("unknown")
    },
}"#;
    let m = match_statement(source);
    assert!(matches!(m.scrutinee, Expr::Identifier { ref name, .. } if name == "packet"));
    assert_eq!(m.arms.len(), 6);

    assert!(matches!(m.arms[0].pattern, Pattern::Literal { .. }));
    assert!(matches!(m.arms[1].body, Statement::LanguageCall { .. }));
    assert!(matches!(m.arms[2].pattern, Pattern::Array { rest: Some(_), .. }));
    assert!(matches!(m.arms[3].pattern, Pattern::Object { .. }));
    assert!(matches!(m.arms[3].body, Statement::Assignment { .. }));
    assert!(matches!(m.arms[4].pattern, Pattern::Bitstring { .. }));
    assert!(matches!(m.arms[5].pattern, Pattern::Wildcard { .. }));
    assert!(matches!(m.arms[5].body, Statement::Block(_)));
}

#[test]
fn test_match_arm_positions() {
    let m = match_statement("match x {\n  1 -> a(),\n  y -> b(y)\n}");
    assert_eq!(m.position.line, 1);
    assert_eq!((m.arms[0].position.line, m.arms[0].position.column), (2, 3));
    assert_eq!(m.arms[1].position.line, 3);
}

#[test]
fn test_match_on_language_call() {
    let m = match_statement("match py.status() {\n  200 -> ok()\n  _ -> fail()\n}");
    assert!(matches!(m.scrutinee, Expr::LanguageCall(_)));
}

#[test]
fn test_match_arm_with_if_body() {
    let m = match_statement("match x {\n  1 -> if y { z = 1 } else { z = 2 },\n  _ -> z = 0\n}");
    assert!(matches!(m.arms[0].body, Statement::If { else_block: Some(_), .. }));
}

#[test]
fn test_nested_match() {
    let source = "match pair {\n  [a, b] -> match a {\n    1 -> print(b)\n    _ -> print(a)\n  }\n  _ -> skip()\n}";
    let m = match_statement(source);
    assert_eq!(m.arms.len(), 2);
    match &m.arms[0].body {
        Statement::Match(inner) => assert_eq!(inner.arms.len(), 2),
        other => panic!("Expected nested match, got {:?}", other),
    }
}

#[test]
fn test_background_call_in_arm() {
    let m = match_statement("match job {\n  \"a\" -> py.run() &,\n  _ -> js.stop() &\n}");
    assert!(matches!(m.arms[0].body, Statement::LanguageCall { background: true, .. }));
    assert!(matches!(m.arms[1].body, Statement::LanguageCall { background: true, .. }));
}

#[test]
fn test_arms_need_separators() {
    assert_eq!(
        parse("match x { 1 -> a() 2 -> b() }").unwrap_err().kind(),
        ParseErrorKind::Syntax
    );
}

#[test]
fn test_arm_needs_arrow() {
    assert_eq!(parse("match x {\n  1 a()\n}").unwrap_err().kind(), ParseErrorKind::Syntax);
}

#[test]
fn test_unclosed_match() {
    assert_eq!(parse("match x {\n  1 -> a()\n").unwrap_err().kind(), ParseErrorKind::Unclosed);
}

#[test]
fn test_empty_match() {
    assert!(match_statement("match x {}").arms.is_empty());
}

#[test]
fn test_loop_control_in_arms() {
    let source = "for x in xs {\n  match x {\n    0 -> break,\n    _ -> continue\n  }\n}";
    assert!(parse(source).is_ok());
    assert_eq!(
        parse("match x {\n  0 -> break\n}").unwrap_err().kind(),
        ParseErrorKind::Context
    );
}

// ============================================================================
// Literal, Variable and Wildcard Patterns
// ============================================================================

#[test]
fn test_hex_literal_normalizes_to_decimal() {
    match pattern("0xFF") {
        Pattern::Literal {
            value: Expr::Number { raw, .. },
            ..
        } => assert_eq!(raw, "255"),
        other => panic!("Expected number literal, got {:?}", other),
    }
}

#[test]
fn test_negative_literal() {
    match pattern("-42") {
        Pattern::Literal {
            value: Expr::Number { raw, .. },
            ..
        } => assert_eq!(raw, "-42"),
        other => panic!("Expected number literal, got {:?}", other),
    }
}

#[test]
fn test_other_literals() {
    for source in ["\"text\"", "true", "false", "nil", "2.5"] {
        assert!(matches!(pattern(source), Pattern::Literal { .. }), "Failed for: {}", source);
    }
}

#[test]
fn test_variable_and_wildcard() {
    assert!(matches!(pattern("name"), Pattern::Variable { ref name, .. } if name == "name"));
    assert!(matches!(pattern("_"), Pattern::Wildcard { .. }));
}

#[test]
fn test_invalid_pattern_start() {
    assert_eq!(
        Parser::new().parse_pattern("(x)").unwrap_err().kind(),
        ParseErrorKind::Syntax
    );
}

// ============================================================================
// Array Patterns
// ============================================================================

#[test]
fn test_array_rest_must_be_last() {
    assert!(matches!(pattern("[a, ...rest]"), Pattern::Array { ref elements, rest: Some(_), .. } if elements.len() == 1));
    assert!(matches!(pattern("[a, ...rest,]"), Pattern::Array { rest: Some(_), .. }));

    match Parser::new().parse_pattern("[...rest, a]").unwrap_err() {
        ParseError::Unsupported { construct, .. } => assert_eq!(construct, "rest pattern"),
        other => panic!("Expected unsupported error, got {:?}", other),
    }
}

#[test]
fn test_array_pattern_without_rest() {
    match pattern("[1, [x, _], \"s\"]") {
        Pattern::Array { elements, rest, .. } => {
            assert_eq!(elements.len(), 3);
            assert!(rest.is_none());
            assert!(matches!(elements[1], Pattern::Array { .. }));
        }
        other => panic!("Expected array pattern, got {:?}", other),
    }
}

#[test]
fn test_rest_only() {
    assert!(matches!(pattern("[...all]"), Pattern::Array { ref elements, rest: Some(_), .. } if elements.is_empty()));
}

// ============================================================================
// Object Patterns
// ============================================================================

#[test]
fn test_object_pattern_keys() {
    match pattern("{name: n, \"the-id\": 7, _: ignored}") {
        Pattern::Object { fields, .. } => {
            assert_eq!(fields.len(), 3);
            assert!(matches!(fields["name"], Pattern::Variable { .. }));
            assert!(matches!(fields["the-id"], Pattern::Literal { .. }));
            assert!(fields.contains_key("_"));
        }
        other => panic!("Expected object pattern, got {:?}", other),
    }
}

#[test]
fn test_duplicate_object_key() {
    assert_eq!(
        Parser::new().parse_pattern("{a: 1, a: 2}").unwrap_err().kind(),
        ParseErrorKind::Unsupported
    );
}

#[test]
fn test_multiline_object_pattern() {
    assert!(matches!(pattern("{\n  a: 1,\n  b: [x, ...xs],\n}"), Pattern::Object { .. }));
}

// ============================================================================
// Bound Names and Printing
// ============================================================================

#[test]
fn test_bound_names() {
    assert_eq!(
        pattern("[a, {k: b}, ...rest]").bound_names(),
        vec!["a".to_string(), "b".to_string(), "rest".to_string()]
    );
    assert_eq!(
        pattern("<<tag:8, _:8, body/binary>>").bound_names(),
        vec!["tag".to_string(), "body".to_string()]
    );
    assert!(pattern("_").bound_names().is_empty());
}

#[test]
fn test_pattern_printing() {
    let printer = SourcePrinter::new();
    assert_eq!(printer.pattern(&pattern("[first, ...rest]")), "[first, ...rest]");
    assert_eq!(printer.pattern(&pattern("{b: 2, a: x}")), "{a: x, b: 2}");
    assert_eq!(printer.pattern(&pattern("0x10")), "16");
}

#[test]
fn test_object_pattern_keys_print_quoted_when_needed() {
    let printer = SourcePrinter::new();
    assert_eq!(printer.pattern(&pattern("{\"a b\": _}")), "{\"a b\": _}");
    assert_eq!(printer.pattern(&pattern("{\"if\": 1, py: x}")), "{\"if\": 1, py: x}");
    assert_eq!(printer.pattern(&pattern("{\"\": 1, \"2x\": y}")), "{\"\": 1, \"2x\": y}");
}

#[test]
fn test_object_pattern_json_is_key_ordered() {
    let json = mosaic_lang::to_json(&pattern("{zeta: z, alpha: a, mid: 1}")).unwrap();
    let alpha = json.find("\"alpha\"").unwrap();
    let mid = json.find("\"mid\"").unwrap();
    let zeta = json.find("\"zeta\"").unwrap();
    assert!(alpha < mid && mid < zeta);
}
