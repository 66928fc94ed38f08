//! Pattern evaluation for `match` statements.
//!
//! [`match_pattern`] tests one [`Pattern`] against a [`Value`] and returns
//! the variables it binds; [`select_arm`] picks the first matching arm of a
//! [`MatchStatement`].
//!
//! Bitstring patterns read their input bit by bit, most significant bit
//! first. Each segment has a type (`integer`, `float`, `binary`/`bytes`,
//! `bits`), an endianness (`big`, `little`), a signedness (`unsigned`,
//! `signed`) and a unit (`unit:N`). Its size in bits is `size * unit`; a
//! dynamic size may name any variable bound by an earlier segment.

use std::collections::HashMap;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{ToPrimitive, Zero};
use tracing::trace;

use crate::ast::{BinOp, BitSegment, Expr, MatchArm, MatchStatement, Pattern, UnaryOp};
use crate::value::Value;

pub type Bindings = HashMap<String, Value>;

/// Bindings produced by `pattern` for `value`, or `None` if it does not
/// match.
pub fn match_pattern(pattern: &Pattern, value: &Value) -> Option<Bindings> {
    let mut bindings = Bindings::new();
    bind(pattern, value, &mut bindings).then_some(bindings)
}

/// First arm whose pattern matches `value`, with its index and bindings.
pub fn select_arm<'a>(statement: &'a MatchStatement, value: &Value) -> Option<(usize, &'a MatchArm, Bindings)> {
    statement.arms.iter().enumerate().find_map(|(i, arm)| {
        let bindings = match_pattern(&arm.pattern, value)?;
        trace!(arm = i, bound = bindings.len(), "match arm selected");
        Some((i, arm, bindings))
    })
}

fn bind(pattern: &Pattern, value: &Value, bindings: &mut Bindings) -> bool {
    match pattern {
        Pattern::Wildcard { .. } => true,
        Pattern::Variable { name, .. } => bind_name(name, value.clone(), bindings),
        Pattern::Literal { value: literal, .. } => {
            Value::from_literal(literal).is_some_and(|expected| expected.loose_eq(value))
        }
        Pattern::Array { elements, rest, .. } => {
            let Value::Array(items) = value else {
                return false;
            };
            let fits = match rest {
                Some(_) => items.len() >= elements.len(),
                None => items.len() == elements.len(),
            };
            if !fits || !elements.iter().zip(items).all(|(p, v)| bind(p, v, bindings)) {
                return false;
            }
            match rest {
                Some(name) => bind_name(name, Value::Array(items[elements.len()..].to_vec()), bindings),
                None => true,
            }
        }
        Pattern::Object { fields, .. } => {
            let Value::Object(entries) = value else {
                return false;
            };
            fields
                .iter()
                .all(|(key, p)| entries.get(key).is_some_and(|v| bind(p, v, bindings)))
        }
        Pattern::Bitstring { segments, .. } => {
            let data = match value {
                Value::Bytes(bytes) => bytes.as_slice(),
                Value::String(s) => s.as_bytes(),
                _ => return false,
            };
            match_bits(segments, data, bindings)
        }
    }
}

/// Bind `name`, or check it against an earlier binding of the same name.
fn bind_name(name: &str, value: Value, bindings: &mut Bindings) -> bool {
    match bindings.get(name) {
        Some(existing) => existing.loose_eq(&value),
        None => {
            bindings.insert(name.to_string(), value);
            true
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentType {
    Integer,
    Float,
    Binary,
    Bits,
}

struct SegmentSpec {
    kind: SegmentType,
    little: bool,
    signed: bool,
    unit: usize,
}

impl SegmentSpec {
    fn of(segment: &BitSegment) -> Option<SegmentSpec> {
        let mut kind = SegmentType::Integer;
        let mut little = false;
        let mut signed = false;
        let mut unit = None;

        for specifier in &segment.specifiers {
            match specifier.split_once(':') {
                Some(("unit", n)) => unit = Some(n.parse().ok()?),
                Some(_) => return None,
                None => match specifier.as_str() {
                    "integer" => kind = SegmentType::Integer,
                    "float" => kind = SegmentType::Float,
                    "binary" | "bytes" => kind = SegmentType::Binary,
                    "bits" | "bitstring" => kind = SegmentType::Bits,
                    "big" => little = false,
                    "little" => little = true,
                    "signed" => signed = true,
                    "unsigned" => signed = false,
                    _ => return None,
                },
            }
        }

        let unit = unit.unwrap_or(match kind {
            SegmentType::Binary => 8,
            _ => 1,
        });
        Some(SegmentSpec {
            kind,
            little,
            signed,
            unit,
        })
    }

    fn default_size(&self) -> Option<usize> {
        match self.kind {
            SegmentType::Integer => Some(8),
            SegmentType::Float => Some(64),
            SegmentType::Binary | SegmentType::Bits => None,
        }
    }
}

struct BitReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BitReader<'a> {
    fn remaining(&self) -> usize {
        self.data.len() * 8 - self.offset
    }

    fn read_bit(&mut self) -> u8 {
        let byte = self.data[self.offset / 8];
        let bit = (byte >> (7 - self.offset % 8)) & 1;
        self.offset += 1;
        bit
    }

    /// Next `bits` bits, most significant first, left-padded into bytes.
    fn read(&mut self, bits: usize) -> Option<Vec<u8>> {
        if bits > self.remaining() {
            return None;
        }
        let mut out = vec![0u8; bits.div_ceil(8)];
        let pad = out.len() * 8 - bits;
        for i in 0..bits {
            let bit = self.read_bit();
            let at = pad + i;
            out[at / 8] |= bit << (7 - at % 8);
        }
        Some(out)
    }
}

fn match_bits(segments: &[BitSegment], data: &[u8], bindings: &mut Bindings) -> bool {
    let mut reader = BitReader { data, offset: 0 };

    for (i, segment) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();

        // A string literal without a size matches its own bytes.
        if let (Expr::String { value, .. }, None) = (&segment.value, &segment.size) {
            match reader.read(value.len() * 8) {
                Some(bytes) if bytes == value.as_bytes() => continue,
                _ => return false,
            }
        }

        let Some(spec) = SegmentSpec::of(segment) else {
            return false;
        };
        let bits = match &segment.size {
            Some(size) => eval_size(size, bindings).and_then(|n| n.checked_mul(spec.unit)),
            None => match spec.default_size() {
                Some(n) => n.checked_mul(spec.unit),
                None if last => Some(reader.remaining()),
                None => None,
            },
        };
        let Some(bits) = bits else {
            return false;
        };
        if spec.kind == SegmentType::Binary && (bits % 8 != 0 || reader.offset % 8 != 0) {
            return false;
        }

        let Some(raw) = reader.read(bits) else {
            return false;
        };
        let Some(value) = decode(&spec, bits, raw) else {
            return false;
        };

        let matched = match &segment.value {
            Expr::Identifier { name, .. } if name == "_" => true,
            Expr::Identifier { name, .. } => bind_name(name, value, bindings),
            literal => Value::from_literal(literal).is_some_and(|expected| expected.loose_eq(&value)),
        };
        if !matched {
            return false;
        }
    }

    reader.remaining() == 0
}

fn decode(spec: &SegmentSpec, bits: usize, mut raw: Vec<u8>) -> Option<Value> {
    match spec.kind {
        SegmentType::Binary | SegmentType::Bits => Some(Value::Bytes(raw)),
        SegmentType::Integer => {
            if spec.little {
                if bits % 8 != 0 {
                    return None;
                }
                raw.reverse();
            }
            let magnitude = BigInt::from_biguint(Sign::Plus, BigUint::from_bytes_be(&raw));
            let value = if spec.signed && bits > 0 && magnitude.bit(bits as u64 - 1) {
                magnitude - (BigInt::from(1) << bits)
            } else {
                magnitude
            };
            Some(Value::Integer(value))
        }
        SegmentType::Float => {
            if spec.little {
                raw.reverse();
            }
            match bits {
                32 => Some(Value::Float(f32::from_be_bytes(raw.try_into().ok()?) as f64)),
                64 => Some(Value::Float(f64::from_be_bytes(raw.try_into().ok()?))),
                _ => None,
            }
        }
    }
}

/// Evaluate a segment size against the bindings so far.
fn eval_size(expr: &Expr, bindings: &Bindings) -> Option<usize> {
    eval_integer(expr, bindings)?.to_usize()
}

fn eval_integer(expr: &Expr, bindings: &Bindings) -> Option<BigInt> {
    match expr {
        Expr::Identifier { name, .. } => bindings.get(name)?.as_integer().cloned(),
        Expr::Grouped { inner, .. } => eval_integer(inner, bindings),
        Expr::Unary {
            op: UnaryOp::Negate,
            operand,
            ..
        } => eval_integer(operand, bindings).map(|n| -n),
        Expr::Binary { left, op, right, .. } => {
            let left = eval_integer(left, bindings)?;
            let right = eval_integer(right, bindings)?;
            apply_binop(*op, left, right)
        }
        literal => match Value::from_literal(literal)? {
            Value::Integer(n) => Some(n),
            _ => None,
        },
    }
}

fn apply_binop(op: BinOp, left: BigInt, right: BigInt) -> Option<BigInt> {
    match op {
        BinOp::Add => Some(left + right),
        BinOp::Subtract => Some(left - right),
        BinOp::Multiply => Some(left * right),
        BinOp::Divide if !right.is_zero() => Some(left / right),
        BinOp::Modulo if !right.is_zero() => Some(left % right),
        _ => None,
    }
}
