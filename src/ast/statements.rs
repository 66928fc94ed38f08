use serde::Serialize;

use crate::ast::{Expr, Pattern, Position, Token};

/// A statement of a Mosaic program.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Statement {
    /// Assignment to a variable, qualified variable, field or index
    ///
    /// # Examples
    /// ```text
    /// total = total + 1
    /// py.config.debug = true
    /// ```
    Assignment {
        target: Expr,
        value: Expr,
        position: Position,
    },

    /// An expression evaluated for its value or effect: variable reads,
    /// field access chains, builtin calls
    Expression { expr: Expr, position: Position },

    /// `if cond { ... } else { ... }`. An `else if` is a nested `If` as the
    /// only statement of the else block.
    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Block>,
        position: Position,
    },

    /// `for item in items { ... }` or `for key, value in table { ... }`
    ForIn {
        variables: Vec<String>,
        iterable: Expr,
        body: Block,
        position: Position,
    },

    /// `for i = start, end[, step] { ... }`
    NumericFor {
        variable: String,
        start: Expr,
        end: Expr,
        step: Option<Expr>,
        body: Block,
        position: Position,
    },

    While {
        condition: Expr,
        body: Block,
        position: Position,
    },

    Break { token: Token },

    Continue { token: Token },

    Block(Block),

    /// Verbatim guest code
    ///
    /// # Example
    /// ```text
    /// python(rows, limit) {
    ///     print(rows[:limit])
    /// }
    /// ```
    CodeBlock {
        language: String,
        captures: Vec<String>,
        code: String,
        position: Position,
    },

    /// A language call or pipe expression used as a statement. `background`
    /// is set by a trailing `&`.
    LanguageCall {
        call: Expr,
        background: bool,
        position: Position,
    },

    Match(MatchStatement),
}

impl Statement {
    pub fn position(&self) -> Position {
        match self {
            Statement::Assignment { position, .. }
            | Statement::Expression { position, .. }
            | Statement::If { position, .. }
            | Statement::ForIn { position, .. }
            | Statement::NumericFor { position, .. }
            | Statement::While { position, .. }
            | Statement::CodeBlock { position, .. }
            | Statement::LanguageCall { position, .. } => *position,
            Statement::Break { token } | Statement::Continue { token } => token.position(),
            Statement::Block(block) => block.position,
            Statement::Match(m) => m.position,
        }
    }
}

/// Ordered statement list in braces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub position: Position,
}

/// `match scrutinee { pattern -> body, ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStatement {
    pub scrutinee: Expr,
    pub arms: Vec<MatchArm>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Statement,
    pub position: Position,
}

/// Root of a parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}
