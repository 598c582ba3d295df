//! Path expression tokenizer.
//!
//! Converts a path string into a sequence of [`Token`]s for the parser.
//! Two pieces of context sensitivity keep the token stream unambiguous:
//!
//! - A maximal run of identifier characters and `*` is lexed as a single
//!   token, so `Get*User` is one wildcard pattern rather than three tokens.
//! - `and`, `or`, and `not` are keywords only inside predicate brackets
//!   (the lexer tracks bracket depth); outside brackets they lex as plain
//!   names, so a node kind that happens to spell a keyword stays
//!   addressable in a step.

use crate::path::errors::LexError;
use std::fmt;

/// The kind of a lexed token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `/` step separator.
    Slash,
    /// `//` descendant-or-self step separator.
    DoubleSlash,
    /// `[` predicate open.
    LBracket,
    /// `]` predicate close.
    RBracket,
    /// `(` grouping / argument list open.
    LParen,
    /// `)` grouping / argument list close.
    RParen,
    /// `@` attribute marker.
    At,
    /// `::` axis separator.
    ColonColon,
    /// `.` self node-test / nested-path anchor.
    Dot,
    /// `,` argument separator.
    Comma,
    /// `-` in `last()-N`.
    Minus,
    /// `=` comparator.
    Eq,
    /// `!=` comparator.
    NotEq,
    /// `~=` token-set-contains comparator.
    TokenEq,
    /// `and` keyword (inside predicates only).
    And,
    /// `or` keyword (inside predicates only).
    Or,
    /// `not` keyword (inside predicates only).
    Not,
    /// An identifier with no wildcard (kind name, attribute key, axis name,
    /// function name, or bare name predicate).
    Name(String),
    /// An identifier run containing at least one `*` wildcard; `*` alone
    /// lexes as `Pattern("*")`.
    Pattern(String),
    /// A numeric literal.
    Number(f64),
    /// A quoted string literal (quotes stripped).
    Literal(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slash => f.write_str("/"),
            Self::DoubleSlash => f.write_str("//"),
            Self::LBracket => f.write_str("["),
            Self::RBracket => f.write_str("]"),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
            Self::At => f.write_str("@"),
            Self::ColonColon => f.write_str("::"),
            Self::Dot => f.write_str("."),
            Self::Comma => f.write_str(","),
            Self::Minus => f.write_str("-"),
            Self::Eq => f.write_str("="),
            Self::NotEq => f.write_str("!="),
            Self::TokenEq => f.write_str("~="),
            Self::And => f.write_str("and"),
            Self::Or => f.write_str("or"),
            Self::Not => f.write_str("not"),
            Self::Name(s) | Self::Pattern(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Literal(s) => write!(f, "'{s}'"),
        }
    }
}

/// A token with its byte offset in the source path string.
///
/// Offsets feed error reporting and let the parser slice the raw text of
/// nested-path predicates straight out of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Path string tokenizer.
pub struct Lexer<'a> {
    /// Input as bytes for cheap indexing; offsets are byte offsets.
    input: &'a [u8],
    pos: usize,
    /// Current predicate-bracket nesting depth; governs keyword mode.
    bracket_depth: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            bracket_depth: 0,
        }
    }

    /// Tokenizes the entire input.
    ///
    /// Total: either every byte of input is consumed into tokens or a
    /// [`LexError`] pinpoints the offending offset. Nothing is dropped.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            if self.pos >= self.input.len() {
                break;
            }
            let offset = self.pos;
            let kind = self.next_token()?;
            tokens.push(Token { kind, offset });
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.input.get(self.pos + ahead).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.advance();
        }
    }

    fn next_token(&mut self) -> Result<TokenKind, LexError> {
        let ch = self.peek().expect("next_token called at end of input");
        match ch {
            b'/' => {
                self.advance();
                if self.peek() == Some(b'/') {
                    self.advance();
                    Ok(TokenKind::DoubleSlash)
                } else {
                    Ok(TokenKind::Slash)
                }
            }
            b'[' => {
                self.advance();
                self.bracket_depth += 1;
                Ok(TokenKind::LBracket)
            }
            b']' => {
                self.advance();
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                Ok(TokenKind::RBracket)
            }
            b'(' => {
                self.advance();
                Ok(TokenKind::LParen)
            }
            b')' => {
                self.advance();
                Ok(TokenKind::RParen)
            }
            b'@' => {
                self.advance();
                Ok(TokenKind::At)
            }
            b'.' => {
                self.advance();
                Ok(TokenKind::Dot)
            }
            b',' => {
                self.advance();
                Ok(TokenKind::Comma)
            }
            b'-' => {
                self.advance();
                Ok(TokenKind::Minus)
            }
            b'=' => {
                self.advance();
                Ok(TokenKind::Eq)
            }
            b'!' => {
                let position = self.pos;
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    Ok(TokenKind::NotEq)
                } else {
                    Err(LexError::IllegalCharacter {
                        found: '!',
                        position,
                    })
                }
            }
            b'~' => {
                let position = self.pos;
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    Ok(TokenKind::TokenEq)
                } else {
                    Err(LexError::IllegalCharacter {
                        found: '~',
                        position,
                    })
                }
            }
            b':' => {
                let position = self.pos;
                self.advance();
                if self.peek() == Some(b':') {
                    self.advance();
                    Ok(TokenKind::ColonColon)
                } else {
                    Err(LexError::IllegalCharacter {
                        found: ':',
                        position,
                    })
                }
            }
            b'\'' | b'"' => self.read_string_literal(),
            b'0'..=b'9' => Ok(self.read_number()),
            b'*' => Ok(self.read_name_or_pattern()),
            _ if is_name_start(ch) => Ok(self.read_name_or_pattern()),
            other => {
                let position = self.pos;
                Err(LexError::IllegalCharacter {
                    found: decode_char_at(self.input, position).unwrap_or(char::from(other)),
                    position,
                })
            }
        }
    }

    fn read_string_literal(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        let quote = self.peek().unwrap();
        self.advance();
        let content_start = self.pos;
        while let Some(b) = self.peek() {
            if b == quote {
                let text = std::str::from_utf8(&self.input[content_start..self.pos])
                    .expect("literal content is valid UTF-8: input was a &str")
                    .to_string();
                self.advance();
                return Ok(TokenKind::Literal(text));
            }
            self.advance();
        }
        Err(LexError::UnterminatedLiteral { position: start })
    }

    fn read_number(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.advance();
        }
        // Fraction only when the dot is followed by a digit, so `kind[1]/.`
        // style input is not swallowed.
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b) if b.is_ascii_digit()) {
            self.advance();
            while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
                self.advance();
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).unwrap();
        // Digit runs always parse as f64.
        TokenKind::Number(text.parse().unwrap())
    }

    /// Reads a maximal run of identifier characters and `*`, producing a
    /// `Pattern` when a wildcard is present and a `Name` (or keyword, in
    /// predicate context) otherwise.
    fn read_name_or_pattern(&mut self) -> TokenKind {
        let start = self.pos;
        let mut has_wildcard = false;
        while let Some(b) = self.peek() {
            if b == b'*' {
                has_wildcard = true;
                self.advance();
            } else if is_name_char(b) {
                self.advance();
            } else if b == b'-' && matches!(self.peek_at(1), Some(n) if is_name_char(n)) {
                // Hyphenated kind names (`if-statement`); a trailing `-` is
                // left for `last()-N`.
                self.advance();
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos])
            .expect("name characters are ASCII")
            .to_string();

        if has_wildcard {
            return TokenKind::Pattern(text);
        }
        if self.bracket_depth > 0 {
            match text.as_str() {
                "and" => return TokenKind::And,
                "or" => return TokenKind::Or,
                "not" => return TokenKind::Not,
                _ => {}
            }
        }
        TokenKind::Name(text)
    }
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Decodes the UTF-8 character at `pos` so multi-byte input is reported as
/// the character the user typed, not its lead byte.
fn decode_char_at(input: &[u8], pos: usize) -> Option<char> {
    std::str::from_utf8(&input[pos..])
        .ok()
        .and_then(|s| s.chars().next())
}
