// tests/bitstring_tests.rs

use mosaic_lang::ast::{BinOp, BitSegment, Expr, Pattern, UnaryOp};
use mosaic_lang::output::SourcePrinter;
use mosaic_lang::{ParseError, ParseErrorKind, Parser};

fn segments(source: &str) -> Vec<BitSegment> {
    match Parser::new().parse_expression(source).unwrap() {
        Expr::Bitstring { segments, .. } => segments,
        other => panic!("Expected bitstring, got {:?}", other),
    }
}

fn pattern_segments(source: &str) -> Vec<BitSegment> {
    match Parser::new().parse_pattern(source).unwrap() {
        Pattern::Bitstring { segments, .. } => segments,
        other => panic!("Expected bitstring pattern, got {:?}", other),
    }
}

fn error_kind(source: &str) -> ParseErrorKind {
    Parser::new().parse_expression(source).unwrap_err().kind()
}

// ============================================================================
// Sizes
// ============================================================================

#[test]
fn test_static_then_dynamic_size() {
    let segs = segments("<<x:8, y:(n+1)>>");
    assert_eq!(segs.len(), 2);
    assert!(!segs[0].dynamic_size);
    assert!(segs[1].dynamic_size);
    assert!(matches!(segs[1].size, Some(Expr::Grouped { .. })));
}

#[test]
fn test_identifier_size_is_dynamic() {
    let segs = segments("<<payload:len>>");
    assert!(segs[0].dynamic_size);
    assert!(matches!(segs[0].size, Some(Expr::Identifier { ref name, .. }) if name == "len"));
}

#[test]
fn test_guest_reference_size_is_dynamic() {
    let segs = segments("<<data:py.cfg.width>>");
    assert!(segs[0].dynamic_size);
    assert!(matches!(segs[0].size, Some(Expr::Qualified(ref q)) if q.language == "python"));
}

#[test]
fn test_dashes_in_size_are_subtraction() {
    let segs = segments("<<body:(len-m)/binary>>");
    match &segs[0].size {
        Some(Expr::Grouped { inner, .. }) => match inner.as_ref() {
            Expr::Binary {
                op: BinOp::Subtract,
                left,
                right,
                ..
            } => {
                assert!(matches!(left.as_ref(), Expr::Identifier { name, .. } if name == "len"));
                assert!(matches!(right.as_ref(), Expr::Identifier { name, .. } if name == "m"));
            }
            other => panic!("Expected subtraction, got {:?}", other),
        },
        other => panic!("Expected grouped size, got {:?}", other),
    }
    assert_eq!(segs[0].specifiers, vec!["binary".to_string()]);
}

#[test]
fn test_size_uses_regular_precedence() {
    let segs = segments("<<x:(a + b * 2)>>");
    let size = segs[0].size.as_ref().unwrap();
    assert_eq!(SourcePrinter::parenthesized().expr(size), "(a + (b * 2))");
}

#[test]
fn test_dashed_value_outside_size() {
    let segs = segments("<<len-m>>");
    assert!(matches!(segs[0].value, Expr::Identifier { ref name, .. } if name == "len-m"));
}

// ============================================================================
// Specifiers
// ============================================================================

#[test]
fn test_dashed_specifier_lists() {
    let segs = segments("<<x:16/big-signed-integer, y/little-unit:8>>");
    assert_eq!(segs[0].specifiers, vec!["big", "signed", "integer"]);
    assert_eq!(segs[1].specifiers, vec!["little", "unit:8"]);
    assert!(segs[1].size.is_none());
    assert!(segs[0].has_specifier("signed"));
    assert_eq!(segs[1].specifier_param("unit"), Some("8"));
}

#[test]
fn test_separately_slashed_specifiers() {
    let segs = segments("<<x/big/unsigned>>");
    assert_eq!(segs[0].specifiers, vec!["big", "unsigned"]);
}

#[test]
fn test_parameter_in_middle_of_list() {
    let segs = segments("<<x:8/integer-unit:4-little>>");
    assert_eq!(segs[0].specifiers, vec!["integer", "unit:4", "little"]);
}

#[test]
fn test_specifier_must_be_a_name() {
    assert_eq!(error_kind("<<x/8>>"), ParseErrorKind::Syntax);
}

// ============================================================================
// Values
// ============================================================================

#[test]
fn test_literal_values() {
    let segs = segments("<<1, \"abc\", -2>>");
    assert!(matches!(segs[0].value, Expr::Number { .. }));
    assert!(matches!(segs[1].value, Expr::String { .. }));
    assert!(matches!(
        segs[2].value,
        Expr::Unary {
            op: UnaryOp::Negate,
            ..
        }
    ));
}

#[test]
fn test_call_and_grouped_values() {
    let segs = segments("<<js.encode(msg):32, (a + 1):8>>");
    assert!(matches!(segs[0].value, Expr::LanguageCall(_)));
    assert!(matches!(segs[1].value, Expr::Grouped { .. }));
}

#[test]
fn test_wildcard_only_in_patterns() {
    assert_eq!(error_kind("<<_:8>>"), ParseErrorKind::Syntax);
    let segs = pattern_segments("<<_:8, rest/binary>>");
    assert!(matches!(segs[0].value, Expr::Identifier { ref name, .. } if name == "_"));
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn test_empty_bitstring() {
    assert!(segments("<<>>").is_empty());
}

#[test]
fn test_newlines_between_segments() {
    assert_eq!(segments("<<\n  a:8,\n  b:8\n>>").len(), 2);
}

#[test]
fn test_trailing_comma_rejected() {
    assert_eq!(error_kind("<<a, >>"), ParseErrorKind::Syntax);
}

#[test]
fn test_unclosed_bitstring() {
    assert_eq!(error_kind("<<a:8"), ParseErrorKind::Unclosed);
}

#[test]
fn test_missing_comma_between_segments() {
    match Parser::new().parse_expression("<<a b>>").unwrap_err() {
        ParseError::Syntax { expected, found, .. } => {
            assert_eq!(expected, "',' or '>>'");
            assert!(found.contains('b'));
        }
        other => panic!("Expected syntax error, got {:?}", other),
    }
    // an unparenthesized size stops at the first operator
    assert_eq!(error_kind("<<n:len-m>>"), ParseErrorKind::Syntax);
    assert_eq!(error_kind("<<a:8 b:8>>"), ParseErrorKind::Syntax);
    assert_eq!(error_kind("<<a:8,\n  b:8"), ParseErrorKind::Unclosed);
}

#[test]
fn test_bitstring_printing() {
    let expr = Parser::new()
        .parse_expression("<<x:16/big-signed, y:(n + 1), \"ok\">>")
        .unwrap();
    assert_eq!(SourcePrinter::new().expr(&expr), "<<x:16/big-signed, y:(n + 1), \"ok\">>");
}

#[test]
fn test_bitstring_in_assignment() {
    let program = mosaic_lang::parse("header = <<version:4, flags:4, size:16/little>>").unwrap();
    assert_eq!(program.statements.len(), 1);
}
