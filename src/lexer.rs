use std::rc::Rc;

use thiserror::Error;

use crate::ast::{Position, Token, TokenKind};

/// Errors produced while scanning source text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at {position}")]
    UnexpectedCharacter { ch: char, position: Position },

    #[error("unterminated string starting at {position}")]
    UnterminatedString { position: Position },

    #[error("invalid escape sequence '\\{sequence}' at {position}")]
    InvalidEscape { sequence: String, position: Position },

    #[error("malformed number '{text}' at {position}")]
    InvalidNumber { text: String, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnexpectedCharacter { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::InvalidEscape { position, .. }
            | LexError::InvalidNumber { position, .. } => *position,
        }
    }
}

/// On-demand scanner producing one [`Token`] per call to
/// [`next_token`](Lexer::next_token).
///
/// Runs of newlines, blank lines and comment-only lines collapse into a
/// single `Newline` token.
#[derive(Debug, Clone)]
pub struct Lexer {
    source: Rc<str>,
    position: usize,
    line: usize,
    column: usize,
    in_size_expression: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self::from_shared(Rc::from(input))
    }

    pub fn from_shared(source: Rc<str>) -> Self {
        Lexer {
            source,
            position: 0,
            line: 1,
            column: 1,
            in_size_expression: false,
        }
    }

    pub fn source(&self) -> &Rc<str> {
        &self.source
    }

    /// Position of the next unread character.
    pub fn location(&self) -> Position {
        Position::new(self.line, self.column, self.position)
    }

    /// Resume scanning at `position`, which must lie on a character
    /// boundary.
    pub fn reset_to(&mut self, position: Position) {
        self.position = position.offset;
        self.line = position.line;
        self.column = position.column;
    }

    /// While set, `-` never continues an identifier, so `n-1` and `len-m`
    /// scan as arithmetic inside bitstring sizes.
    pub fn set_in_size_expression(&mut self, enabled: bool) {
        self.in_size_expression = enabled;
    }

    pub fn in_size_expression(&self) -> bool {
        self.in_size_expression
    }

    /// Scan the remaining input into a vector ending with `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.is(TokenKind::Eof);
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Look at the next token without consuming it.
    pub fn peek_token(&mut self) -> Result<Token, LexError> {
        let saved = self.location();
        let token = self.next_token();
        self.reset_to(saved);
        token
    }

    fn current_char(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.source[self.position..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn at_comment(&self) -> bool {
        match self.current_char() {
            Some('#') => true,
            Some('/') => self.peek_char(1) == Some('/'),
            _ => false,
        }
    }

    /// Skip spaces and comments; newlines are left in place.
    fn skip_inline_whitespace(&mut self) {
        loop {
            match self.current_char() {
                Some(ch) if ch != '\n' && ch.is_whitespace() => self.advance(),
                Some(_) if self.at_comment() => self.skip_comment(),
                _ => break,
            }
        }
    }

    fn skip_blank_lines(&mut self) {
        loop {
            match self.current_char() {
                Some(ch) if ch.is_whitespace() => self.advance(),
                Some(_) if self.at_comment() => self.skip_comment(),
                _ => break,
            }
        }
    }

    fn is_identifier_start(ch: char) -> bool {
        ch.is_alphabetic() || ch == '_'
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else if ch == '-'
                && !self.in_size_expression
                && self.peek_char(1).is_some_and(|c| c.is_alphabetic())
            {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char, start: Position) -> Result<String, LexError> {
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\n' => break,
                '\\' => {
                    let escape_at = self.location();
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('0') => result.push('\0'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some('u') => {
                            self.advance();
                            result.push(self.read_unicode_escape(escape_at)?);
                            continue;
                        }
                        Some(other) => {
                            return Err(LexError::InvalidEscape {
                                sequence: other.to_string(),
                                position: escape_at,
                            });
                        }
                        None => break,
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }

    /// Reads `{hex}` after `\u`.
    fn read_unicode_escape(&mut self, escape_at: Position) -> Result<char, LexError> {
        let invalid = |digits: &str| LexError::InvalidEscape {
            sequence: format!("u{digits}"),
            position: escape_at,
        };

        if self.current_char() != Some('{') {
            return Err(invalid(""));
        }
        self.advance();

        let mut digits = String::new();
        while let Some(ch) = self.current_char() {
            if ch == '}' {
                break;
            }
            digits.push(ch);
            self.advance();
        }
        if self.current_char() != Some('}') {
            return Err(invalid(&digits));
        }
        self.advance();

        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| invalid(&digits))
    }

    fn read_number(&mut self, start: Position) -> Result<String, LexError> {
        let mut number = String::new();

        let radix = match (self.current_char(), self.peek_char(1)) {
            (Some('0'), Some('x' | 'X')) => Some(16),
            (Some('0'), Some('b' | 'B')) => Some(2),
            (Some('0'), Some('o' | 'O')) => Some(8),
            _ => None,
        };

        if let Some(radix) = radix {
            for _ in 0..2 {
                if let Some(ch) = self.current_char() {
                    number.push(ch);
                }
                self.advance();
            }
            let mut digits = 0;
            while let Some(ch) = self.current_char() {
                if ch.is_digit(radix) {
                    digits += 1;
                } else if ch != '_' {
                    break;
                }
                number.push(ch);
                self.advance();
            }
            if digits == 0 || self.current_char().is_some_and(|c| c.is_alphanumeric()) {
                return Err(LexError::InvalidNumber {
                    text: number,
                    position: start,
                });
            }
            return Ok(number);
        }

        let mut is_float = false;
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() || ch == '_' {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            let sign = matches!(self.peek_char(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_char(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    if let Some(ch) = self.current_char() {
                        number.push(ch);
                    }
                    self.advance();
                }
                while let Some(ch) = self.current_char() {
                    if !ch.is_ascii_digit() {
                        break;
                    }
                    number.push(ch);
                    self.advance();
                }
            }
        }

        if self.current_char().is_some_and(Self::is_identifier_start) {
            return Err(LexError::InvalidNumber {
                text: number,
                position: start,
            });
        }
        Ok(number)
    }

    fn symbol(&mut self, kind: TokenKind, len: usize, start: Position) -> Token {
        self.advance_by(len);
        let text = &self.source[start.offset..self.position];
        Token::new(kind, text, start, self.position)
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_inline_whitespace();
        let start = self.location();

        let Some(ch) = self.current_char() else {
            return Ok(Token::new(TokenKind::Eof, "", start, self.position));
        };
        let next = self.peek_char(1);

        let token = match ch {
            '\n' => {
                self.skip_blank_lines();
                Token::new(TokenKind::Newline, "\n", start, start.offset + 1)
            }
            '"' | '\'' => {
                let value = self.read_string(ch, start)?;
                Token::new(TokenKind::String, value, start, self.position)
            }
            c if c.is_ascii_digit() => {
                let text = self.read_number(start)?;
                Token::new(TokenKind::Number, text, start, self.position)
            }
            c if Self::is_identifier_start(c) => {
                let ident = self.read_identifier();
                let kind = TokenKind::keyword(&ident).unwrap_or(TokenKind::Identifier);
                Token::new(kind, ident, start, self.position)
            }
            '.' => match (next, self.peek_char(2)) {
                (Some('.'), Some('.')) => self.symbol(TokenKind::Ellipsis, 3, start),
                (Some('.'), _) => self.symbol(TokenKind::Concat, 2, start),
                _ => self.symbol(TokenKind::Dot, 1, start),
            },
            '<' => match next {
                Some('<') => self.symbol(TokenKind::BitOpen, 2, start),
                Some('=') => self.symbol(TokenKind::LtEq, 2, start),
                _ => self.symbol(TokenKind::Lt, 1, start),
            },
            '>' => match next {
                Some('>') => self.symbol(TokenKind::BitClose, 2, start),
                Some('=') => self.symbol(TokenKind::GtEq, 2, start),
                _ => self.symbol(TokenKind::Gt, 1, start),
            },
            '-' => match next {
                Some('>') => self.symbol(TokenKind::Arrow, 2, start),
                _ => self.symbol(TokenKind::Minus, 1, start),
            },
            '=' => match next {
                Some('=') => self.symbol(TokenKind::EqEq, 2, start),
                _ => self.symbol(TokenKind::Assign, 1, start),
            },
            '!' => match next {
                Some('=') => self.symbol(TokenKind::NotEq, 2, start),
                _ => self.symbol(TokenKind::Bang, 1, start),
            },
            '&' => match next {
                Some('&') => self.symbol(TokenKind::AndAnd, 2, start),
                _ => self.symbol(TokenKind::Ampersand, 1, start),
            },
            '|' => match next {
                Some('|') => self.symbol(TokenKind::OrOr, 2, start),
                Some('>') => self.symbol(TokenKind::PipeOp, 2, start),
                _ => {
                    return Err(LexError::UnexpectedCharacter {
                        ch,
                        position: start,
                    });
                }
            },
            '+' => self.symbol(TokenKind::Plus, 1, start),
            '*' => self.symbol(TokenKind::Star, 1, start),
            '/' => self.symbol(TokenKind::Slash, 1, start),
            '%' => self.symbol(TokenKind::Percent, 1, start),
            '~' => self.symbol(TokenKind::Tilde, 1, start),
            '@' => self.symbol(TokenKind::At, 1, start),
            '?' => self.symbol(TokenKind::Question, 1, start),
            ':' => self.symbol(TokenKind::Colon, 1, start),
            ',' => self.symbol(TokenKind::Comma, 1, start),
            ';' => self.symbol(TokenKind::Semicolon, 1, start),
            '(' => self.symbol(TokenKind::LParen, 1, start),
            ')' => self.symbol(TokenKind::RParen, 1, start),
            '[' => self.symbol(TokenKind::LBracket, 1, start),
            ']' => self.symbol(TokenKind::RBracket, 1, start),
            '{' => self.symbol(TokenKind::LBrace, 1, start),
            '}' => self.symbol(TokenKind::RBrace, 1, start),
            _ => {
                return Err(LexError::UnexpectedCharacter {
                    ch,
                    position: start,
                });
            }
        };

        Ok(token)
    }
}

#[cfg(test)]
fn kinds(input: &str) -> Vec<TokenKind> {
    Lexer::new(input)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn test_keywords() {
    assert_eq!(
        kinds("if else match true false nil"),
        vec![
            TokenKind::If,
            TokenKind::Else,
            TokenKind::Match,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Nil,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_language_tags() {
    let tokens = Lexer::new("py.load()").tokenize().unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Language);
    assert_eq!(tokens[0].literal, "py");
    assert_eq!(tokens[1].kind, TokenKind::Dot);
}

#[test]
fn test_size_expression_mode_splits_dashes() {
    let mut lexer = Lexer::new("len-m");
    lexer.set_in_size_expression(true);
    assert_eq!(lexer.next_token().unwrap().literal, "len");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Minus);
    assert_eq!(lexer.next_token().unwrap().literal, "m");
}
