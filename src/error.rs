use thiserror::Error;

use crate::ast::{Position, Token, TokenKind};
use crate::lexer::LexError;

pub type ParseResult<T> = Result<T, ParseError>;

/// Errors that abort a parse. A parse produces at most one of these and no
/// partial tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A token other than the one the grammar requires
    #[error("{position}: expected {expected}, found {found}")]
    Syntax {
        expected: String,
        found: String,
        position: Position,
    },

    /// Missing `)`, `]`, `}` or `>>` for an opener that was already consumed
    #[error("{position}: {delimiter} opened at {opened_at} is not closed, found {found}")]
    Unclosed {
        delimiter: TokenKind,
        opened_at: Position,
        found: String,
        position: Position,
    },

    /// A construct that is valid grammar in general but not where it appears
    #[error("{position}: {construct} is not supported here: {reason}")]
    Unsupported {
        construct: String,
        reason: String,
        position: Position,
    },

    /// `break` or `continue` outside a loop body
    #[error("{position}: '{keyword}' can only be used inside a loop")]
    Context { keyword: String, position: Position },

    #[error("{position}: nesting exceeds the maximum depth of {max_depth}")]
    RecursionLimit { max_depth: usize, position: Position },

    #[error("{position}: unknown language '{name}'")]
    UnknownLanguage { name: String, position: Position },

    /// No registered handler accepted the statement starting at `token`
    #[error("{position}: no handler accepts a statement starting with {token}")]
    HandlerNotFound { token: String, position: Position },

    #[error(transparent)]
    Lex(#[from] LexError),
}

/// Discriminator for [`ParseError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    Syntax,
    Unclosed,
    Unsupported,
    Context,
    RecursionLimit,
    UnknownLanguage,
    HandlerNotFound,
    Lex,
}

impl ParseError {
    pub fn syntax(expected: impl Into<String>, found: &Token) -> Self {
        ParseError::Syntax {
            expected: expected.into(),
            found: found.to_string(),
            position: found.position(),
        }
    }

    pub fn unsupported(construct: impl Into<String>, reason: impl Into<String>, position: Position) -> Self {
        ParseError::Unsupported {
            construct: construct.into(),
            reason: reason.into(),
            position,
        }
    }

    pub fn kind(&self) -> ParseErrorKind {
        match self {
            ParseError::Syntax { .. } => ParseErrorKind::Syntax,
            ParseError::Unclosed { .. } => ParseErrorKind::Unclosed,
            ParseError::Unsupported { .. } => ParseErrorKind::Unsupported,
            ParseError::Context { .. } => ParseErrorKind::Context,
            ParseError::RecursionLimit { .. } => ParseErrorKind::RecursionLimit,
            ParseError::UnknownLanguage { .. } => ParseErrorKind::UnknownLanguage,
            ParseError::HandlerNotFound { .. } => ParseErrorKind::HandlerNotFound,
            ParseError::Lex(_) => ParseErrorKind::Lex,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            ParseError::Syntax { position, .. }
            | ParseError::Unclosed { position, .. }
            | ParseError::Unsupported { position, .. }
            | ParseError::Context { position, .. }
            | ParseError::RecursionLimit { position, .. }
            | ParseError::UnknownLanguage { position, .. }
            | ParseError::HandlerNotFound { position, .. } => *position,
            ParseError::Lex(e) => e.position(),
        }
    }
}
