//! Token definitions for the reader's lexical scanner.

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LeftParen,
    RightParen,
    /// `#(` - opens a vector literal.
    VecOpen,
    /// `'` - shorthand for `(quote ...)`.
    Quote,
    /// A double-quoted string literal, including its quotes.
    String,
    /// A `#\x` character literal.
    Character,
    /// Anything else that isn't whitespace or a delimiter: numbers,
    /// booleans, identifiers, and the lone `.` of a dotted pair -
    /// classified later by the parser, the way the teacher's lexer stays
    /// naive about atom contents.
    Atom,
    EOF,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn fragment<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.as_range()]
    }
}
