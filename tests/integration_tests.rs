use std::collections::HashMap;
use std::fs;

use mosaic_lang::cli::{execute_check, handler_table, language_table, CheckOptions, CheckResult, CliError};
use mosaic_lang::config::MAX_DEPTH_LIMIT;
use mosaic_lang::output::to_value;
use mosaic_lang::{
    match_pattern, parse, select_arm, ConfigError, ParseError, ParseErrorKind, Parser, ParserConfig, Statement, Value,
};
use num_bigint::BigInt;
use tempfile::TempDir;

fn try_match(pattern: &str, value: Value) -> Option<HashMap<String, Value>> {
    let pattern = Parser::new().parse_pattern(pattern).unwrap();
    match_pattern(&pattern, &value)
}

fn object(pairs: Vec<(&str, Value)>) -> Value {
    Value::Object(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

fn int(n: i64) -> Value {
    Value::from(n)
}

fn nested_parens(depth: usize) -> String {
    format!("x = {}1{}", "(".repeat(depth), ")".repeat(depth))
}

#[test]
fn test_literal_patterns() {
    assert!(try_match("1", Value::Float(1.0)).is_some());
    assert!(try_match("0xFF", int(255)).is_some());
    assert!(try_match("-3", int(-3)).is_some());
    assert!(try_match("\"ok\"", Value::from("ok")).is_some());
    assert!(try_match("nil", Value::Nil).is_some());
    assert!(try_match("1", Value::from("1")).is_none());
    assert!(try_match("true", Value::Boolean(false)).is_none());
}

#[test]
fn test_variable_binds_anything() {
    let bindings = try_match("v", Value::Array(vec![int(1)])).unwrap();
    assert_eq!(bindings["v"], Value::Array(vec![int(1)]));
    assert!(try_match("_", Value::Nil).unwrap().is_empty());
}

#[test]
fn test_array_rest_binding() {
    let bindings = try_match("[first, ...rest]", Value::Array(vec![int(1), int(2), int(3)])).unwrap();
    assert_eq!(bindings["first"], int(1));
    assert_eq!(bindings["rest"], Value::Array(vec![int(2), int(3)]));

    let bindings = try_match("[a, ...rest]", Value::Array(vec![int(1)])).unwrap();
    assert_eq!(bindings["rest"], Value::Array(vec![]));

    assert!(try_match("[a, b]", Value::Array(vec![int(1)])).is_none());
    assert!(try_match("[a, b]", Value::Array(vec![int(1), int(2), int(3)])).is_none());
}

#[test]
fn test_repeated_variable_must_agree() {
    assert!(try_match("[x, x]", Value::Array(vec![int(4), int(4)])).is_some());
    assert!(try_match("[x, x]", Value::Array(vec![int(4), int(5)])).is_none());
}

#[test]
fn test_object_pattern_ignores_extra_keys() {
    let user = object(vec![
        ("kind", Value::from("user")),
        ("name", Value::from("ada")),
        ("age", int(36)),
    ]);
    let bindings = try_match("{kind: \"user\", name: n}", user.clone()).unwrap();
    assert_eq!(bindings["n"], Value::from("ada"));
    assert!(try_match("{kind: \"admin\"}", user.clone()).is_none());
    assert!(try_match("{email: e}", user).is_none());
}

#[test]
fn test_bitstring_with_dynamic_length() {
    let packet = Value::Bytes(vec![1, 0, 3, b'a', b'b', b'c']);
    let bindings = try_match("<<tag:8, len:16, body:len/binary>>", packet).unwrap();
    assert_eq!(bindings["tag"], int(1));
    assert_eq!(bindings["len"], int(3));
    assert_eq!(bindings["body"], Value::Bytes(b"abc".to_vec()));
}

#[test]
fn test_bitstring_little_endian_signed() {
    let bindings = try_match("<<x:16/little-signed>>", Value::Bytes(vec![0xFE, 0xFF])).unwrap();
    assert_eq!(bindings["x"], Value::Integer(BigInt::from(-2)));

    let bindings = try_match("<<x:16/big>>", Value::Bytes(vec![0xFE, 0xFF])).unwrap();
    assert_eq!(bindings["x"], int(0xFEFF));
}

#[test]
fn test_bitstring_size_expression() {
    let bindings = try_match("<<n:8, head:(n-1)/binary, _:8>>", Value::Bytes(vec![3, 10, 20, 30])).unwrap();
    assert_eq!(bindings["head"], Value::Bytes(vec![10, 20]));
    assert!(!bindings.contains_key("_"));
}

#[test]
fn test_bitstring_sub_byte_fields() {
    let bindings = try_match("<<version:4, flags:4, rest/binary>>", Value::Bytes(vec![0x2A, 0xFF])).unwrap();
    assert_eq!(bindings["version"], int(2));
    assert_eq!(bindings["flags"], int(10));
    assert_eq!(bindings["rest"], Value::Bytes(vec![0xFF]));
}

#[test]
fn test_bitstring_must_consume_all_input() {
    assert!(try_match("<<a:8>>", Value::Bytes(vec![1, 2])).is_none());
    assert!(try_match("<<a:8, b:8, c:8>>", Value::Bytes(vec![1, 2])).is_none());
    assert!(try_match("<<1, rest/binary>>", Value::Bytes(vec![1, 9])).is_some());
    assert!(try_match("<<1, rest/binary>>", Value::Bytes(vec![2, 9])).is_none());
}

#[test]
fn test_bitstring_oversized_dynamic_length() {
    // n * 8 does not fit in a usize
    assert!(try_match("<<n:64, rest:n/binary>>", Value::Bytes(vec![0xFF; 9])).is_none());
    assert!(try_match("<<n:64, rest:n/bits-unit:1024>>", Value::Bytes(vec![0x7F; 9])).is_none());
    assert!(try_match("<<n:8, rest:n/binary>>", Value::Bytes(vec![200, 1])).is_none());
}

#[test]
fn test_select_first_matching_arm() {
    let program = parse("match v {\n  [] -> empty(),\n  [x] -> one(x),\n  [x, ...xs] -> many(x),\n  _ -> other()\n}").unwrap();
    let Statement::Match(statement) = &program.statements[0] else {
        panic!("Expected match statement");
    };

    let (index, _, bindings) = select_arm(statement, &Value::Array(vec![int(7)])).unwrap();
    assert_eq!(index, 1);
    assert_eq!(bindings["x"], int(7));

    let (index, _, bindings) = select_arm(statement, &Value::Array(vec![int(1), int(2)])).unwrap();
    assert_eq!(index, 2);
    assert_eq!(bindings["xs"], Value::Array(vec![int(2)]));

    let (index, arm, _) = select_arm(statement, &Value::from("text")).unwrap();
    assert_eq!(index, 3);
    assert!(matches!(arm.pattern, mosaic_lang::Pattern::Wildcard { .. }));
}

#[test]
fn test_values_from_json() {
    let value = Value::from(serde_json::json!({"ids": [1, 2.5, null], "ok": true}));
    match &value {
        Value::Object(map) => {
            assert_eq!(map["ids"], Value::Array(vec![int(1), Value::Float(2.5), Value::Nil]));
            assert_eq!(map["ok"], Value::Boolean(true));
        }
        other => panic!("Expected object, got {:?}", other),
    }
    let back: serde_json::Value = value.into();
    assert_eq!(back["ids"][0], 1);
    assert!(Value::Nil.type_name() == "nil" && !Value::Nil.is_truthy());
}

// ============================================================================
// JSON Output
// ============================================================================

#[test]
fn test_program_json_shape() {
    let json = to_value(&parse("py.x()").unwrap()).unwrap();
    let statement = &json["statements"][0];
    assert_eq!(statement["type"], "language_call");
    assert_eq!(statement["background"], false);
    assert_eq!(statement["call"]["type"], "language_call");
    assert_eq!(statement["call"]["language"], "python");
    assert_eq!(statement["call"]["function"], "x");
    assert_eq!(statement["position"]["line"], 1);
}

#[test]
fn test_integers_serialize_exactly() {
    let json = to_value(&parse("n = 123456789012345678901234567890").unwrap()).unwrap();
    let value = &json["statements"][0]["value"];
    assert_eq!(value["type"], "number");
    assert_eq!(value["value"]["integer"], "123456789012345678901234567890");
}

#[test]
fn test_pretty_and_compact_json() {
    let program = parse("x = 1").unwrap();
    let compact = mosaic_lang::to_json(&program).unwrap();
    let pretty = mosaic_lang::to_json_pretty(&program).unwrap();
    assert!(!compact.contains('\n'));
    assert!(pretty.contains('\n'));
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&compact).unwrap(),
        serde_json::from_str::<serde_json::Value>(&pretty).unwrap()
    );
}

// ============================================================================
// Recursion Guard
// ============================================================================

#[test]
fn test_deep_nesting_hits_limit() {
    match parse(&nested_parens(500)).unwrap_err() {
        ParseError::RecursionLimit { max_depth, .. } => assert_eq!(max_depth, 100),
        other => panic!("Expected recursion limit, got {:?}", other),
    }
}

#[test]
fn test_configured_limit() {
    let parser = Parser::with_config(ParserConfig::default().with_max_depth(10)).unwrap();
    assert_eq!(
        parser.parse(&nested_parens(20)).unwrap_err().kind(),
        ParseErrorKind::RecursionLimit
    );
    assert!(parser.parse(&nested_parens(2)).is_ok());
}

#[test]
fn test_guard_can_be_disabled() {
    let mut config = ParserConfig::default().with_max_depth(10);
    config.enable_recursion_guard = false;
    let parser = Parser::with_config(config).unwrap();
    assert!(parser.parse(&nested_parens(60)).is_ok());
    assert!(parser.parse(&nested_parens(1500)).is_ok());
}

#[test]
fn test_largest_configurable_limit() {
    let parser = Parser::with_config(ParserConfig::default().with_max_depth(MAX_DEPTH_LIMIT)).unwrap();

    assert!(parser.parse(&nested_parens(900)).is_ok());
    match parser.parse(&nested_parens(2000)).unwrap_err() {
        ParseError::RecursionLimit { max_depth, .. } => assert_eq!(max_depth, MAX_DEPTH_LIMIT),
        other => panic!("Expected recursion limit, got {:?}", other),
    }

    let blocks = format!("{}x = 1{}", "{\n".repeat(1500), "\n}".repeat(1500));
    assert_eq!(parser.parse(&blocks).unwrap_err().kind(), ParseErrorKind::RecursionLimit);
}

#[test]
fn test_nesting_within_limit() {
    assert!(parse(&nested_parens(30)).is_ok());
    let blocks = format!("{}x = 1{}", "{\n".repeat(20), "\n}".repeat(20));
    assert!(parse(&blocks).is_ok());
}

// ============================================================================
// CLI
// ============================================================================

#[test]
fn test_check_produces_tree() {
    let options = CheckOptions {
        source: "rows = py.db.fetch()\nfor row in rows { print(row) }".to_string(),
        ..Default::default()
    };
    match execute_check(&options).unwrap() {
        CheckResult::Success(json) => {
            assert_eq!(json["statements"][0]["type"], "assignment");
            assert_eq!(json["statements"][1]["type"], "for_in");
        }
        other => panic!("Expected parse tree, got {:?}", other),
    }
}

#[test]
fn test_check_syntax_only() {
    let options = CheckOptions {
        source: "x = 1".to_string(),
        syntax_only: true,
        ..Default::default()
    };
    assert!(matches!(execute_check(&options).unwrap(), CheckResult::SyntaxValid));
}

#[test]
fn test_check_reports_parse_errors() {
    let options = CheckOptions {
        source: "x = (1".to_string(),
        ..Default::default()
    };
    match execute_check(&options).unwrap_err() {
        CliError::Parse(e) => assert_eq!(e.kind(), ParseErrorKind::Unclosed),
        other => panic!("Expected parse error, got {:?}", other),
    }
}

#[test]
fn test_check_with_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mosaic.toml");
    fs::write(&path, "[[languages]]\nname = \"ruby\"\naliases = [\"rb\"]\n").unwrap();

    let options = CheckOptions {
        source: "rb.puts(\"hi\")".to_string(),
        config_paths: vec![path],
        ..Default::default()
    };
    assert!(matches!(execute_check(&options).unwrap(), CheckResult::Success(_)));
}

#[test]
fn test_check_depth_override() {
    let options = CheckOptions {
        source: nested_parens(10),
        max_depth: Some(4),
        ..Default::default()
    };
    assert!(matches!(execute_check(&options).unwrap_err(), CliError::Parse(_)));

    let options = CheckOptions {
        source: "x = 1".to_string(),
        max_depth: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        execute_check(&options).unwrap_err(),
        CliError::Config(ConfigError::Validation { .. })
    ));
}

#[test]
fn test_handler_table() {
    let table = handler_table(&ParserConfig::default());
    let lines: Vec<&str> = table.lines().collect();
    assert!(lines[0].starts_with("NAME"));
    assert!(lines[1].starts_with("if "));
    assert!(table.contains("language_call"));
    assert!(table.contains("'.'@1"));
    assert!(lines.last().unwrap().starts_with("expression"));
    assert!(lines.last().unwrap().contains("fallback (priority 0)"));
}

#[test]
fn test_language_table() {
    assert_eq!(
        language_table(&ParserConfig::default()),
        "lua\npython (aliases: py)\ngo\nnode (aliases: js)\n"
    );
}
