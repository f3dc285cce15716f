use crate::lexer::cursor::Cursor;
use crate::span::Span;

pub mod cursor;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    /// Label, mnemonic, or operand
    Word,
    Comma,
    /// Runs to the end of the line
    Comment,
    Whitespace,
    Eof,
}

/// Split one line into tokens. Spans are offset by `base` so they point into the whole program.
pub fn tokenize(line: &str, base: usize) -> impl Iterator<Item = Token<'_>> + '_ {
    let mut cursor = Cursor::new(line, base);
    std::iter::from_fn(move || {
        let token = cursor.advance_token();
        if token.kind != TokenKind::Eof {
            Some(token)
        } else {
            None
        }
    })
}

pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Anything a word may contain. `;` ends a word even without whitespace before it.
pub(crate) fn is_word(c: char) -> bool {
    !is_whitespace(c) && c != ',' && c != ';'
}

impl<'a> Cursor<'a> {
    pub fn advance_token(&mut self) -> Token<'a> {
        let Some(first_char) = self.bump() else {
            return Token {
                kind: TokenKind::Eof,
                text: "",
                span: Span::new(self.token_offs(), 0),
            };
        };
        let kind = match first_char {
            ';' => {
                self.take_while(|c| c != '\n');
                TokenKind::Comment
            }
            ',' => TokenKind::Comma,
            c if is_whitespace(c) => {
                self.take_while(is_whitespace);
                TokenKind::Whitespace
            }
            _ => {
                self.take_while(is_word);
                TokenKind::Word
            }
        };
        let text = self.token_text();
        let token = Token {
            kind,
            text,
            span: Span::new(self.token_offs(), text.len()),
        };
        self.reset_pos();
        token
    }
}
