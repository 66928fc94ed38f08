//! # Mosaic - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for Mosaic, a small
//! scripting language whose statements mix native control flow with calls
//! into guest runtimes (`lua`, `python`/`py`, `go`, `node`/`js`).
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens and source positions
//! - **[expressions]** - Expression nodes (literals, operators, calls, access)
//! - **[operators]** - Binary and unary operators with their precedence
//! - **[statements]** - Statements, blocks, `match` and the program root
//! - **[patterns]** - Patterns accepted by `match` arms
//!
//! ## Quick Start
//!
//! ```text
//! rows = py.db.fetch("users")
//! for row in rows {
//!     match row {
//!         {name: n, admin: true} -> print("admin " .. n),
//!         _ -> continue
//!     }
//! }
//! js.metrics.flush() &
//! ```
//!
//! ## Core Concepts
//!
//! ### Positions
//!
//! Every node records the [`Position`] (line, column, byte offset) of its
//! first token. Statements that exist mainly for diagnostics, like `break`,
//! keep the whole [`Token`].
//!
//! ### Canonical Languages
//!
//! Language tags are resolved while parsing: `py.load()` produces a
//! [`LanguageCall`] whose `language` is `"python"`.
//!
//! ### Ownership
//!
//! The tree has no back-references. Each node owns its children, and tokens
//! stored in nodes are copies.
pub mod tokens;
pub mod expressions;
pub mod operators;
pub mod patterns;
pub mod statements;

pub use tokens::{Position, Token, TokenKind};
pub use expressions::{
    BitSegment, Expr, LanguageCall, Number, ObjectEntry, ObjectKey, PipeExpr, QualifiedIdentifier,
};
pub use operators::{BinOp, UnaryOp};
pub use patterns::Pattern;
pub use statements::{Block, MatchArm, MatchStatement, Program, Statement};
