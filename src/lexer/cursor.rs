// Modelled on `rustc_lexer`'s cursor.
// See https://doc.rust-lang.org/beta/nightly-rustc/src/rustc_lexer/cursor.rs.html

use std::str::Chars;

pub(crate) const EOF_CHAR: char = '\0';

/// Peekable iterator over the chars of a single source line.
pub struct Cursor<'a> {
    src: &'a str,
    chars: Chars<'a>,
    /// Byte offset of the line within the whole program
    base: usize,
    /// Byte offset within the line where the current token started
    token_start: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(line: &'a str, base: usize) -> Cursor<'a> {
        Cursor {
            src: line,
            chars: line.chars(),
            base,
            token_start: 0,
        }
    }

    /// Line is finished
    pub fn is_eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    /// Peek the next char without consuming it
    pub fn first(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF_CHAR)
    }

    /// Advance by one character
    pub fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    pub fn take_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while predicate(self.first()) && !self.is_eof() {
            self.bump();
        }
    }

    /// Byte offset within the line
    pub fn pos(&self) -> usize {
        self.src.len() - self.chars.as_str().len()
    }

    /// Text of the token consumed since the last reset
    pub fn token_text(&self) -> &'a str {
        &self.src[self.token_start..self.pos()]
    }

    /// Absolute offset of the current token's start
    pub fn token_offs(&self) -> usize {
        self.base + self.token_start
    }

    pub fn reset_pos(&mut self) {
        self.token_start = self.pos();
    }
}
