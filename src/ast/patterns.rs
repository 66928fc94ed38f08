use std::collections::BTreeMap;

use serde::Serialize;

use crate::ast::{BitSegment, Expr, Position};

/// Pattern of a `match` arm.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Pattern {
    /// Number, string, boolean or nil literal
    Literal { value: Expr, position: Position },

    /// Binds the matched value to `name`
    Variable { name: String, position: Position },

    /// `_`, matches anything without binding
    Wildcard { position: Position },

    /// `[first, second, ...rest]`; `rest` can only be the last element
    Array {
        elements: Vec<Pattern>,
        rest: Option<String>,
        position: Position,
    },

    /// `{key: pattern, ...}`. Every key must be present in the input;
    /// extra input keys are ignored. Fields are kept in key order.
    Object {
        fields: BTreeMap<String, Pattern>,
        position: Position,
    },

    /// `<<tag:8, len:16, body:len/binary>>`
    Bitstring {
        segments: Vec<BitSegment>,
        position: Position,
    },
}

impl Pattern {
    pub fn position(&self) -> Position {
        match self {
            Pattern::Literal { position, .. }
            | Pattern::Variable { position, .. }
            | Pattern::Wildcard { position }
            | Pattern::Array { position, .. }
            | Pattern::Object { position, .. }
            | Pattern::Bitstring { position, .. } => *position,
        }
    }

    /// Names bound when this pattern matches, in source order for ordered
    /// patterns.
    pub fn bound_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut Vec<String>) {
        match self {
            Pattern::Variable { name, .. } => names.push(name.clone()),
            Pattern::Array { elements, rest, .. } => {
                for element in elements {
                    element.collect_names(names);
                }
                if let Some(rest) = rest {
                    names.push(rest.clone());
                }
            }
            Pattern::Object { fields, .. } => {
                for field in fields.values() {
                    field.collect_names(names);
                }
            }
            Pattern::Bitstring { segments, .. } => {
                for segment in segments {
                    if let Expr::Identifier { name, .. } = &segment.value {
                        if name != "_" {
                            names.push(name.clone());
                        }
                    }
                }
            }
            Pattern::Literal { .. } | Pattern::Wildcard { .. } => {}
        }
    }
}
