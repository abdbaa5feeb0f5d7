//! Lexical scanning of FMS source text.
//!
//! The decoder is scannerless: it asks the [`Cursor`] for the lexeme it expects at the current
//! position. The functions here recognise trivia, words, numbers, strings and raw macro
//! arguments.

pub mod cursor;

use num::rational::Ratio;
use thiserror::Error;

pub use self::cursor::{Cursor, CursorCheckpoint};
use super::value::{Number, is_word_char};

/// An error occurred when scanning a lexeme.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LexError {
    /// A `"` string reached the end of the text.
    #[error("unterminated string")]
    UnterminatedString,
    /// A `/*` comment reached the end of the text.
    #[error("unterminated block comment")]
    UnterminatedComment,
    /// An unknown `\` escape inside a string.
    #[error("unknown escape `\\{0}`")]
    UnknownEscape(char),
    /// A malformed number literal.
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    /// A rational with a zero denominator.
    #[error("zero denominator in `{0}`")]
    ZeroDenominator(String),
}

/// Whether `c` may start a bare word.
#[must_use]
pub const fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

impl<'a> Cursor<'a> {
    /// Skips whitespace and comments.
    ///
    /// # Errors
    ///
    /// [`LexError::UnterminatedComment`] if a block comment never ends. The rest of the text is
    /// consumed.
    pub fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            self.eat_while(char::is_whitespace);
            let rest = self.rest();
            if rest.starts_with("//") {
                self.eat_while(|c| c != '\n');
            } else if rest.starts_with("/*") {
                self.bump();
                self.bump();
                loop {
                    if self.rest().starts_with("*/") {
                        self.bump();
                        self.bump();
                        break;
                    }
                    if self.bump().is_none() {
                        return Err(LexError::UnterminatedComment);
                    }
                }
            } else {
                return Ok(());
            }
        }
    }

    /// Whether the next characters are a word start.
    #[must_use]
    pub fn at_word(&self) -> bool {
        self.peek().is_some_and(is_word_start)
    }

    /// Scans a bare word, `None` if no word starts here.
    pub fn scan_word(&mut self) -> Option<&'a str> {
        if !self.at_word() {
            return None;
        }
        Some(self.eat_while(is_word_char))
    }

    /// Whether a number literal starts here.
    #[must_use]
    pub fn at_number(&self) -> bool {
        let digit_or_dot = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit() || c == '.');
        match self.peek() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()),
            Some('-' | '+') => digit_or_dot(self.peek_nth(1)),
            _ => false,
        }
    }

    /// Scans a number literal: an integer, `numer/denom` or a float with optional exponent.
    ///
    /// # Errors
    ///
    /// [`LexError::InvalidNumber`] if the literal is malformed or out of range,
    /// [`LexError::ZeroDenominator`] for `n/0`.
    pub fn scan_number(&mut self) -> Result<Option<Number>, LexError> {
        if !self.at_number() {
            return Ok(None);
        }
        let start = self.index();
        let rest = self.rest();
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        self.eat_while(|c| c.is_ascii_digit());

        let mut is_float = false;
        let mut denom = None;
        if self.peek() == Some('/') {
            self.bump();
            denom = Some(self.eat_while(|c| c.is_ascii_digit()));
        } else {
            if self.eat('.') {
                is_float = true;
                self.eat_while(|c| c.is_ascii_digit());
            }
            if matches!(self.peek(), Some('e' | 'E'))
                && (self.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
                    || (matches!(self.peek_nth(1), Some('-' | '+'))
                        && self.peek_nth(2).is_some_and(|c| c.is_ascii_digit())))
            {
                is_float = true;
                self.bump();
                if matches!(self.peek(), Some('-' | '+')) {
                    self.bump();
                }
                self.eat_while(|c| c.is_ascii_digit());
            }
        }
        // A number glued to a word is neither.
        self.eat_while(is_word_char);
        let text = &rest[..self.index() - start];
        let invalid = || LexError::InvalidNumber(text.to_string());

        if let Some(denom) = denom {
            let numer_text = &text[..text.len() - denom.len() - 1];
            if denom.is_empty() || !denom.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            let numer: i64 = numer_text.parse().map_err(|_| invalid())?;
            let denom: i64 = denom.parse().map_err(|_| invalid())?;
            if denom == 0 {
                return Err(LexError::ZeroDenominator(text.to_string()));
            }
            return Ok(Some(Number::Rational(Ratio::new(numer, denom))));
        }
        if is_float {
            let value: f64 = text.parse().map_err(|_| invalid())?;
            if !value.is_finite() {
                return Err(invalid());
            }
            return Ok(Some(Number::Float(value)));
        }
        text.parse().map(|i| Some(Number::Int(i))).map_err(|_| invalid())
    }

    /// Scans a `"` string with escapes, `None` if no string starts here.
    ///
    /// # Errors
    ///
    /// [`LexError::UnterminatedString`] or [`LexError::UnknownEscape`].
    pub fn scan_string(&mut self) -> Result<Option<String>, LexError> {
        if !self.eat('"') {
            return Ok(None);
        }
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(LexError::UnterminatedString),
                Some('"') => return Ok(Some(out)),
                Some('\\') => match self.bump() {
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => return Err(LexError::UnknownEscape(c)),
                    None => return Err(LexError::UnterminatedString),
                },
                Some(c) => out.push(c),
            }
        }
    }

    /// Scans a string or a bare word, `None` if neither starts here.
    ///
    /// # Errors
    ///
    /// See [`Cursor::scan_string`].
    pub fn scan_text(&mut self) -> Result<Option<String>, LexError> {
        if let Some(word) = self.scan_word() {
            return Ok(Some(word.to_string()));
        }
        self.scan_string()
    }

    /// Scans one raw macro argument, up to a `,` or `)` outside of parentheses and strings. The
    /// delimiter is not consumed. Returns the argument trimmed.
    ///
    /// # Errors
    ///
    /// [`LexError::UnterminatedString`] if a string inside the argument never ends.
    pub fn scan_raw_argument(&mut self) -> Result<&'a str, LexError> {
        let start = self.index();
        let rest = self.rest();
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '"' => {
                    self.bump();
                    loop {
                        match self.bump() {
                            None => return Err(LexError::UnterminatedString),
                            Some('\\') => {
                                self.bump();
                            }
                            Some('"') => break,
                            Some(_) => {}
                        }
                    }
                    continue;
                }
                '(' => depth += 1,
                ')' if depth == 0 => break,
                ')' => depth -= 1,
                ',' if depth == 0 => break,
                _ => {}
            }
            self.bump();
        }
        Ok(rest[..self.index() - start].trim())
    }
}
