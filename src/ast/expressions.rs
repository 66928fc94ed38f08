use num_bigint::BigInt;
use serde::{Serialize, Serializer};

use crate::ast::{BinOp, Position, Token, UnaryOp};

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Every variant carries the [`Position`] of its first token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    // References
    /// Plain identifier
    ///
    /// # Example
    /// ```text
    /// count
    /// ```
    Identifier { name: String, position: Position },

    /// Guest-language qualified identifier
    ///
    /// # Examples
    /// ```text
    /// py.config
    /// lua.state.counter
    /// ```
    Qualified(QualifiedIdentifier),

    // Literals
    /// Number literal. Hex, binary, octal and exponent forms all normalize
    /// into the same [`Number`]; `raw` keeps the source spelling.
    Number {
        value: Number,
        raw: String,
        position: Position,
    },

    /// String literal with escapes resolved; `raw` keeps the quoted source.
    String {
        value: String,
        raw: String,
        position: Position,
    },

    Boolean { value: bool, position: Position },

    Nil { position: Position },

    // Composites
    /// Array literal
    ///
    /// # Example
    /// ```text
    /// [1, "two", py.three()]
    /// ```
    Array {
        elements: Vec<Expr>,
        position: Position,
    },

    /// Object literal; entries keep their source order
    ///
    /// # Example
    /// ```text
    /// {name: "ada", "year": 1815}
    /// ```
    Object {
        entries: Vec<ObjectEntry>,
        position: Position,
    },

    /// Bitstring literal
    ///
    /// # Example
    /// ```text
    /// <<version:4, flags:4, length:16/big, payload/binary>>
    /// ```
    Bitstring {
        segments: Vec<BitSegment>,
        position: Position,
    },

    // Operations
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        position: Position,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        position: Position,
    },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
        position: Position,
    },

    /// `condition ? : default`
    Elvis {
        condition: Box<Expr>,
        default: Box<Expr>,
        position: Position,
    },

    /// Parenthesized sub-expression, kept so grouping survives printing
    Grouped { inner: Box<Expr>, position: Position },

    // Calls and access
    /// Call into a guest runtime
    ///
    /// # Example
    /// ```text
    /// py.math.sqrt(16)
    /// ```
    LanguageCall(LanguageCall),

    /// Call of an unqualified function
    ///
    /// # Example
    /// ```text
    /// print("done")
    /// ```
    BuiltinCall {
        name: String,
        arguments: Vec<Expr>,
        position: Position,
    },

    /// `object[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        position: Position,
    },

    /// `object.field`, chainable
    FieldAccess {
        object: Box<Expr>,
        field: String,
        position: Position,
    },

    /// `stage |> stage |> ...`
    Pipe(PipeExpr),
}

impl Expr {
    pub fn position(&self) -> Position {
        match self {
            Expr::Identifier { position, .. }
            | Expr::Number { position, .. }
            | Expr::String { position, .. }
            | Expr::Boolean { position, .. }
            | Expr::Nil { position }
            | Expr::Array { position, .. }
            | Expr::Object { position, .. }
            | Expr::Bitstring { position, .. }
            | Expr::Binary { position, .. }
            | Expr::Unary { position, .. }
            | Expr::Ternary { position, .. }
            | Expr::Elvis { position, .. }
            | Expr::Grouped { position, .. }
            | Expr::BuiltinCall { position, .. }
            | Expr::Index { position, .. }
            | Expr::FieldAccess { position, .. } => *position,
            Expr::Qualified(q) => q.position,
            Expr::LanguageCall(call) => call.position,
            Expr::Pipe(pipe) => pipe.position,
        }
    }

    /// Whether the expression is a literal number, string, boolean or nil.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Expr::Number { .. } | Expr::String { .. } | Expr::Boolean { .. } | Expr::Nil { .. }
        )
    }

    /// Whether the expression may be the target of an assignment.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Expr::Identifier { .. } | Expr::Qualified(_) | Expr::FieldAccess { .. } | Expr::Index { .. }
        )
    }
}

/// Numeric literal value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Number {
    /// Exact integer of any size
    Integer(#[serde(serialize_with = "serialize_bigint")] BigInt),
    Float(f64),
}

fn serialize_bigint<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

/// `language.path.name`, with `language` already alias-resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualifiedIdentifier {
    /// Canonical language name (`py` becomes `python`)
    pub language: String,
    /// Intermediate segments between the language tag and `name`
    pub path: Vec<String>,
    pub name: String,
    pub position: Position,
}

impl QualifiedIdentifier {
    /// Dotted form without the language, e.g. `state.counter`.
    pub fn dotted_name(&self) -> String {
        let mut parts = self.path.clone();
        parts.push(self.name.clone());
        parts.join(".")
    }
}

/// Call into a guest runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageCall {
    /// Canonical language name
    pub language: String,
    /// Dotted function name after the language tag (`math.sqrt`)
    pub function: String,
    pub arguments: Vec<Expr>,
    pub position: Position,
}

/// Key of an object literal entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKey {
    Identifier(String),
    String(String),
}

impl ObjectKey {
    pub fn name(&self) -> &str {
        match self {
            ObjectKey::Identifier(s) | ObjectKey::String(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectEntry {
    pub key: ObjectKey,
    pub value: Expr,
}

/// Chain of stages joined by `|>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipeExpr {
    pub stages: Vec<Expr>,
    /// One `|>` token per stage boundary
    pub operators: Vec<Token>,
    pub position: Position,
}

/// One `value[:size][/specifiers]` unit of a bitstring literal or pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BitSegment {
    pub value: Expr,
    pub size: Option<Expr>,
    /// True when `size` can only be known at evaluation time: anything but
    /// a bare number literal.
    pub dynamic_size: bool,
    /// Specifier atoms in source order (`integer`, `little`, `unit:8`)
    pub specifiers: Vec<String>,
    pub position: Position,
}

impl BitSegment {
    pub fn has_specifier(&self, name: &str) -> bool {
        self.specifiers.iter().any(|s| s == name)
    }

    /// Value of a parameterized specifier such as `unit:8`.
    pub fn specifier_param(&self, name: &str) -> Option<&str> {
        self.specifiers.iter().find_map(|s| {
            s.split_once(':')
                .and_then(|(key, value)| (key == name).then_some(value))
        })
    }
}
