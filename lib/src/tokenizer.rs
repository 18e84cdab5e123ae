//! Splits formula and equation text into tokens.
//!
//! The tokenizer knows nothing about chemistry. It groups letters into
//! symbol-like runs (an uppercase letter starts a new run), digits into
//! number runs, and emits every other character on its own.

use std::fmt::{Display, Formatter};
use std::iter::once;

use tracing::trace;

use crate::error::{ChemError, Result};

/// Marks the end of input while scanning; not allowed to appear in the input itself
pub const END_OF_INPUT: char = '\0';

/// Kind of a token, derived from its content
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum TokenKind {
    /// Run of letters, e.g. `He`, `Helium`, `aq`
    Letters,
    /// Run of ASCII digits, e.g. `12`
    Digits,
    /// `(`
    Open,
    /// `)`
    Close,
    /// Any other single character, e.g. `+`, `=`, `/`, `.`, `,`
    Punct,
}

/// A fragment of the input along with its position (character offset in the original string)
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: usize,
}
impl Token {
    pub fn is_letters(&self) -> bool {
        self.kind == TokenKind::Letters
    }

    pub fn is_digits(&self) -> bool {
        self.kind == TokenKind::Digits
    }

    /// Returns true if the token is the given punctuation character
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct && self.text.starts_with(c)
    }
}
impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Joins token texts back into a single string
pub fn concat(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

struct Buffer {
    text: String,
    kind: Option<TokenKind>,
    pos: usize,
}
impl Buffer {
    fn flush(&mut self, tokens: &mut Vec<Token>) {
        if let Some(kind) = self.kind.take() {
            tokens.push(Token {
                kind,
                text: std::mem::take(&mut self.text),
                pos: self.pos,
            });
        }
    }

    fn push(&mut self, c: char, kind: TokenKind, pos: usize) {
        if self.kind.is_none() {
            self.kind = Some(kind);
            self.pos = pos;
        }
        self.text.push(c);
    }
}

/// Splits input into tokens
/// Whitespace is ignored (it never produces tokens), but positions still count it
/// # Arguments
/// * `input` - formula or equation string
/// # Returns
/// * `Ok` - tokens in input order
/// * `Err` - `InvalidCharacter` if the input contains the end-of-input sentinel
/// # Example
/// ```
/// use chemeq::tokenizer::{concat, tokenize};
///
/// let tokens = tokenize("2NH + Ofc3/2").unwrap();
/// let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
///
/// assert_eq!(texts, ["2", "N", "H", "+", "Ofc", "3", "/", "2"]);
/// assert_eq!(concat(&tokens), "2NH+Ofc3/2");
/// ```
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut buffer = Buffer {
        text: String::new(),
        kind: None,
        pos: 0,
    };

    let end = input.chars().count();
    for (pos, c) in input.chars().enumerate().chain(once((end, END_OF_INPUT))) {
        if c == END_OF_INPUT {
            if pos != end {
                return Err(ChemError::InvalidCharacter { ch: c, pos });
            }
            buffer.flush(&mut tokens);
            break;
        }
        if c.is_whitespace() {
            continue;
        }

        match c {
            '(' | ')' => {
                buffer.flush(&mut tokens);
                let kind = if c == '(' { TokenKind::Open } else { TokenKind::Close };
                tokens.push(Token { kind, text: c.to_string(), pos });
            }
            c if c.is_alphabetic() => {
                if buffer.kind != Some(TokenKind::Letters) || c.is_uppercase() {
                    buffer.flush(&mut tokens);
                }
                buffer.push(c, TokenKind::Letters, pos);
            }
            c if c.is_ascii_digit() => {
                if buffer.kind != Some(TokenKind::Digits) {
                    buffer.flush(&mut tokens);
                }
                buffer.push(c, TokenKind::Digits, pos);
            }
            _ => {
                buffer.flush(&mut tokens);
                tokens.push(Token {
                    kind: TokenKind::Punct,
                    text: c.to_string(),
                    pos,
                });
            }
        }
    }

    trace!(count = tokens.len(), "tokenized input");
    Ok(tokens)
}
