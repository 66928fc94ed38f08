use std::collections::HashMap;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};

use crate::ast::{Expr, Number, UnaryOp};

/// A runtime value that `match` patterns are tested against.
///
/// Integers are arbitrary precision, like the integer literals of the
/// language. `Bytes` is the input of bitstring patterns.
///
/// # Examples
///
/// ```
/// use mosaic_lang::Value;
/// use std::collections::HashMap;
///
/// let answer = Value::from(42);
/// let packet = Value::Bytes(vec![0x01, 0x02]);
///
/// let mut obj = HashMap::new();
/// obj.insert("name".to_string(), Value::String("ada".to_string()));
/// let object = Value::Object(obj);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,

    Boolean(bool),

    /// Exact integer
    Integer(BigInt),

    Float(f64),

    /// UTF-8 string
    String(String),

    /// Raw bytes
    Bytes(Vec<u8>),

    Array(Vec<Value>),

    /// Object with string keys
    Object(HashMap<String, Value>),
}

impl Value {
    /// Nil and false are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => n.to_f64(),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Value::Integer(n) => Some(n),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Equality used by literal patterns: integers and floats compare by
    /// numeric value, everything else structurally.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                b.fract() == 0.0 && BigInt::from_f64(*b).is_some_and(|b| b == *a)
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.loose_eq(w)))
            }
            _ => self == other,
        }
    }

    /// Value of a literal expression, including negated number literals.
    pub fn from_literal(expr: &Expr) -> Option<Value> {
        match expr {
            Expr::Number { value, .. } => Some(value.into()),
            Expr::String { value, .. } => Some(Value::String(value.clone())),
            Expr::Boolean { value, .. } => Some(Value::Boolean(*value)),
            Expr::Nil { .. } => Some(Value::Nil),
            Expr::Unary {
                op: UnaryOp::Negate,
                operand,
                ..
            } => match Value::from_literal(operand)? {
                Value::Integer(n) => Some(Value::Integer(-n)),
                Value::Float(n) => Some(Value::Float(-n)),
                _ => None,
            },
            Expr::Grouped { inner, .. } => Value::from_literal(inner),
            _ => None,
        }
    }
}

impl From<&Number> for Value {
    fn from(number: &Number) -> Self {
        match number {
            Number::Integer(n) => Value::Integer(n.clone()),
            Number::Float(n) => Value::Float(*n),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(BigInt::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::from(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Integer(BigInt::from(u))
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Nil => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(b),
            Value::Integer(n) => match n.to_i64() {
                Some(i) => serde_json::Value::Number(i.into()),
                None => serde_json::Value::String(n.to_string()),
            },
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Bytes(bytes) => serde_json::Value::Array(
                bytes.into_iter().map(|b| serde_json::Value::Number(b.into())).collect(),
            ),
            Value::Array(arr) => serde_json::Value::Array(arr.into_iter().map(Into::into).collect()),
            Value::Object(obj) => {
                serde_json::Value::Object(obj.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
