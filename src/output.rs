//! Rendering parsed trees.
//!
//! - **JSON** via [`to_json()`] and [`to_json_pretty()`]: the serde form of
//!   any AST node, as printed by `mosaic check`.
//! - **Source** via [`SourcePrinter`]: expressions and patterns printed back
//!   as Mosaic text. In parenthesized mode every operator node is wrapped in
//!   parentheses, which makes the parsed grouping visible.
//!
//! # Examples
//!
//! ```
//! use mosaic_lang::Parser;
//! use mosaic_lang::output::SourcePrinter;
//!
//! let expr = Parser::new().parse_expression("1 + 2 * 3").unwrap();
//! assert_eq!(SourcePrinter::parenthesized().expr(&expr), "(1 + (2 * 3))");
//! ```

use serde::Serialize;

use crate::ast::{BitSegment, Expr, ObjectKey, Pattern, TokenKind};

pub fn to_json<T: Serialize + ?Sized>(node: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(node)
}

pub fn to_json_pretty<T: Serialize + ?Sized>(node: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(node)
}

pub fn to_value<T: Serialize + ?Sized>(node: &T) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(node)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SourcePrinter {
    parenthesize: bool,
}

impl SourcePrinter {
    pub fn new() -> Self {
        SourcePrinter::default()
    }

    /// Printer that wraps every binary, ternary and elvis node.
    pub fn parenthesized() -> Self {
        SourcePrinter { parenthesize: true }
    }

    fn wrap(&self, text: String) -> String {
        if self.parenthesize {
            format!("({text})")
        } else {
            text
        }
    }

    fn list(&self, items: &[Expr]) -> String {
        items
            .iter()
            .map(|e| self.expr(e))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Identifier { name, .. } => name.clone(),
            Expr::Qualified(q) => format!("{}.{}", q.language, q.dotted_name()),
            Expr::Number { raw, .. } => raw.clone(),
            Expr::String { raw, .. } => raw.clone(),
            Expr::Boolean { value, .. } => value.to_string(),
            Expr::Nil { .. } => "nil".to_string(),
            Expr::Array { elements, .. } => format!("[{}]", self.list(elements)),
            Expr::Object { entries, .. } => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|entry| format!("{}: {}", key(&entry.key), self.expr(&entry.value)))
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
            Expr::Bitstring { segments, .. } => self.segments(segments),
            Expr::Binary { left, op, right, .. } => {
                self.wrap(format!("{} {} {}", self.expr(left), op, self.expr(right)))
            }
            Expr::Unary { op, operand, .. } => format!("{}{}", op, self.expr(operand)),
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => self.wrap(format!(
                "{} ? {} : {}",
                self.expr(condition),
                self.expr(then_branch),
                self.expr(else_branch)
            )),
            Expr::Elvis { condition, default, .. } => {
                self.wrap(format!("{} ? : {}", self.expr(condition), self.expr(default)))
            }
            Expr::Grouped { inner, .. } => match inner.as_ref() {
                Expr::Binary { .. } | Expr::Ternary { .. } | Expr::Elvis { .. } if self.parenthesize => {
                    self.expr(inner)
                }
                _ => format!("({})", self.expr(inner)),
            },
            Expr::LanguageCall(call) => {
                format!("{}.{}({})", call.language, call.function, self.list(&call.arguments))
            }
            Expr::BuiltinCall { name, arguments, .. } => format!("{}({})", name, self.list(arguments)),
            Expr::Index { object, index, .. } => format!("{}[{}]", self.expr(object), self.expr(index)),
            Expr::FieldAccess { object, field, .. } => format!("{}.{}", self.expr(object), field),
            Expr::Pipe(pipe) => pipe
                .stages
                .iter()
                .map(|stage| self.expr(stage))
                .collect::<Vec<_>>()
                .join(" |> "),
        }
    }

    fn segments(&self, segments: &[BitSegment]) -> String {
        let segments: Vec<String> = segments
            .iter()
            .map(|segment| {
                let mut text = self.expr(&segment.value);
                if let Some(size) = &segment.size {
                    text.push(':');
                    text.push_str(&self.expr(size));
                }
                if !segment.specifiers.is_empty() {
                    text.push('/');
                    text.push_str(&segment.specifiers.join("-"));
                }
                text
            })
            .collect();
        format!("<<{}>>", segments.join(", "))
    }

    pub fn pattern(&self, pattern: &Pattern) -> String {
        match pattern {
            Pattern::Literal { value, .. } => self.expr(value),
            Pattern::Variable { name, .. } => name.clone(),
            Pattern::Wildcard { .. } => "_".to_string(),
            Pattern::Array { elements, rest, .. } => {
                let mut parts: Vec<String> = elements.iter().map(|p| self.pattern(p)).collect();
                if let Some(rest) = rest {
                    parts.push(format!("...{rest}"));
                }
                format!("[{}]", parts.join(", "))
            }
            Pattern::Object { fields, .. } => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(k, p)| format!("{}: {}", pattern_key(k), self.pattern(p)))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Pattern::Bitstring { segments, .. } => self.segments(segments),
        }
    }
}

/// Pattern keys print bare only when they would lex back as the same key.
fn pattern_key(key: &str) -> String {
    let mut chars = key.chars();
    let word = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_');
    let bare = word
        && matches!(
            TokenKind::keyword(key),
            None | Some(TokenKind::Language) | Some(TokenKind::Underscore)
        );
    if bare {
        key.to_string()
    } else {
        quoted(key)
    }
}

fn quoted(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("{s:?}"))
}

fn key(key: &ObjectKey) -> String {
    match key {
        ObjectKey::Identifier(name) => name.clone(),
        ObjectKey::String(s) => quoted(s),
    }
}
