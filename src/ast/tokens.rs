use std::fmt;

use serde::{Deserialize, Serialize};

/// Location of a token or node in the source text.
///
/// Lines and columns are 1-based; `offset` is the 0-based byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Position {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Kind of a lexical token.
///
/// The serialized names (`identifier`, `l_paren`, ...) are the names used by
/// token patterns in handler configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    // Literals
    /// Integer or floating-point number in any supported radix
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 0xFF
    /// 1.5e3
    /// ```
    Number,

    /// String literal, escapes already resolved in the token text
    String,

    /// Plain identifier, possibly dash-continued (`big-signed`)
    Identifier,

    /// Reserved guest-language tag (`lua`, `python`, `py`, `go`, `node`, `js`)
    Language,

    /// The lone `_`
    Underscore,

    True,
    False,
    Nil,

    // Keywords
    If,
    Else,
    For,
    In,
    While,
    Break,
    Continue,
    Match,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// String concatenation (`..`)
    Concat,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    // Logical
    AndAnd,
    OrOr,

    // Prefix operators
    Bang,
    Tilde,
    At,

    /// `?`, starts a ternary or elvis operator
    Question,
    Colon,
    Assign,
    /// Match arm separator (`->`)
    Arrow,
    /// Rest element in array patterns (`...`)
    Ellipsis,

    /// Bitstring opener (`<<`)
    BitOpen,
    /// Bitstring closer (`>>`)
    BitClose,

    /// Pipe operator (`|>`)
    PipeOp,

    /// Background marker (`&`)
    Ampersand,

    // Delimiters
    Dot,
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    Newline,
    Eof,
}

impl TokenKind {
    /// Keyword lookup for an already-scanned word.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "match" => TokenKind::Match,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "nil" => TokenKind::Nil,
            "lua" | "python" | "py" | "go" | "node" | "js" => TokenKind::Language,
            "_" => TokenKind::Underscore,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether a token of this kind ends a statement.
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof | TokenKind::RBrace
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Number
                | TokenKind::String
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Nil
        )
    }

    fn describe(self) -> &'static str {
        match self {
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Identifier => "identifier",
            TokenKind::Language => "language tag",
            TokenKind::Underscore => "'_'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Nil => "'nil'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::For => "'for'",
            TokenKind::In => "'in'",
            TokenKind::While => "'while'",
            TokenKind::Break => "'break'",
            TokenKind::Continue => "'continue'",
            TokenKind::Match => "'match'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Concat => "'..'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::LtEq => "'<='",
            TokenKind::GtEq => "'>='",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::Bang => "'!'",
            TokenKind::Tilde => "'~'",
            TokenKind::At => "'@'",
            TokenKind::Question => "'?'",
            TokenKind::Colon => "':'",
            TokenKind::Assign => "'='",
            TokenKind::Arrow => "'->'",
            TokenKind::Ellipsis => "'...'",
            TokenKind::BitOpen => "'<<'",
            TokenKind::BitClose => "'>>'",
            TokenKind::PipeOp => "'|>'",
            TokenKind::Ampersand => "'&'",
            TokenKind::Dot => "'.'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Newline => "newline",
            TokenKind::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A lexed token. Immutable once produced by the lexer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Token text. For strings this is the unescaped value; for everything
    /// else it is the source text.
    pub literal: String,
    /// Byte offset of the first character
    pub offset: usize,
    /// Byte offset one past the last character
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, position: Position, end: usize) -> Self {
        Token {
            kind,
            literal: literal.into(),
            offset: position.offset,
            end,
            line: position.line,
            column: position.column,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Number | TokenKind::Identifier | TokenKind::Language => {
                write!(f, "{} '{}'", self.kind, self.literal)
            }
            TokenKind::String => write!(f, "string {:?}", self.literal),
            _ => write!(f, "{}", self.kind),
        }
    }
}
