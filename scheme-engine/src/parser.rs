//! Recursive-descent reader: turns a token stream into [`Value`] trees.
//! Out of scope for grounding purposes, but it's what feeds the compiler
//! real programs instead of hand-built `Value`s.

use num_bigint::BigInt;
use num_rational::BigRational;

use crate::env::Env;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use crate::utils::{vec_to_improper, vec_to_list};
use crate::value::Value;

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current, source })
    }

    fn bump(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.current.kind == kind {
            self.bump()
        } else {
            Err(Error::Parse(format!("expected {what}")))
        }
    }

    fn parse_datum(&mut self, env: &mut Env) -> Result<Value> {
        match self.current.kind {
            TokenKind::LeftParen => self.parse_list(env),
            TokenKind::VecOpen => self.parse_vector(env),
            TokenKind::Quote => self.parse_sugar(env, "quote"),
            TokenKind::String => self.parse_string(),
            TokenKind::Character => self.parse_character(),
            TokenKind::Atom => self.parse_atom(env),
            TokenKind::RightParen => Err(Error::Parse("unexpected `)`".to_string())),
            TokenKind::EOF => Err(Error::Parse("unexpected end of input".to_string())),
        }
    }

    fn parse_sugar(&mut self, env: &mut Env, name: &str) -> Result<Value> {
        self.bump()?;
        let inner = self.parse_datum(env)?;
        let sym = env.intern(name);
        Ok(vec_to_list(vec![Value::Symbol(sym), inner]))
    }

    fn parse_list(&mut self, env: &mut Env) -> Result<Value> {
        self.bump()?; // '('
        let mut items = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::RightParen => {
                    self.bump()?;
                    return Ok(vec_to_list(items));
                }
                TokenKind::EOF => {
                    return Err(Error::Parse("unterminated list".to_string()));
                }
                TokenKind::Atom if self.current.fragment(self.source) == "." => {
                    self.bump()?;
                    let tail = self.parse_datum(env)?;
                    self.expect(TokenKind::RightParen, "`)` to close dotted list")?;
                    return Ok(vec_to_improper(items, tail));
                }
                _ => items.push(self.parse_datum(env)?),
            }
        }
    }

    fn parse_vector(&mut self, env: &mut Env) -> Result<Value> {
        self.bump()?; // '#('
        let mut items = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::RightParen => {
                    self.bump()?;
                    return Ok(Value::Vector(Handle::new(items)));
                }
                TokenKind::EOF => return Err(Error::Parse("unterminated vector".to_string())),
                _ => items.push(self.parse_datum(env)?),
            }
        }
    }

    fn parse_string(&mut self) -> Result<Value> {
        let token = self.bump()?;
        let fragment = token.fragment(self.source);
        let body = &fragment[1..fragment.len() - 1];

        let mut out = String::with_capacity(body.len());
        let mut chars = body.chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some(other) => out.push(other),
                    None => {}
                }
            } else {
                out.push(ch);
            }
        }
        Ok(Value::string(out))
    }

    fn parse_character(&mut self) -> Result<Value> {
        let token = self.bump()?;
        let fragment = token.fragment(self.source);
        let name = &fragment[2..]; // strip "#\"
        let ch = match name {
            "space" => ' ',
            "newline" => '\n',
            "tab" => '\t',
            "return" => '\r',
            "null" | "nul" => '\0',
            single if single.chars().count() == 1 => single.chars().next().unwrap(),
            _ => return Err(Error::Parse(format!("unrecognized character literal: #\\{name}"))),
        };
        Ok(Value::Character(ch))
    }

    fn parse_atom(&mut self, env: &mut Env) -> Result<Value> {
        let token = self.bump()?;
        let fragment = token.fragment(self.source);
        match fragment {
            "#t" => Ok(Value::Boolean(true)),
            "#f" => Ok(Value::Boolean(false)),
            _ => {
                if let Ok(rational) = fragment.parse::<BigRational>() {
                    if fragment.contains('/') {
                        return Ok(Value::Rational(rational));
                    }
                }
                if let Ok(int) = fragment.parse::<BigInt>() {
                    return Ok(Value::Integer(int));
                }
                Ok(Value::Symbol(env.intern(fragment)))
            }
        }
    }
}

/// Read every top-level form out of `source`.
pub fn parse_all(source: &str, env: &mut Env) -> Result<Vec<Value>> {
    let mut parser = Parser::new(source)?;
    let mut forms = Vec::new();
    while parser.current.kind != TokenKind::EOF {
        forms.push(parser.parse_datum(env)?);
    }
    Ok(forms)
}

/// Read a single top-level form, returning `None` if `source` has none
/// (only whitespace/comments).
pub fn parse_one(source: &str, env: &mut Env) -> Result<Option<Value>> {
    let mut parser = Parser::new(source)?;
    if parser.current.kind == TokenKind::EOF {
        return Ok(None);
    }
    Ok(Some(parser.parse_datum(env)?))
}

/// Whether `source` has balanced parentheses outside of strings and
/// comments - used by the REPL driver to decide whether to keep reading
/// more lines before attempting to parse (spec.md §6).
pub fn is_balanced(source: &str) -> bool {
    let mut depth: i64 = 0;
    let mut chars = source.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            ';' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '"' => {
                for c in chars.by_ref() {
                    if c == '\\' {
                        chars.next();
                    } else if c == '"' {
                        break;
                    }
                }
            }
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }
    depth <= 0
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::symbol::SymbolId;
    use crate::utils::list_to_vec;

    #[test]
    fn test_parses_numbers_and_lists() {
        let mut env = Env::new();
        let forms = parse_all("(1 2 (3 4))", &mut env).unwrap();
        assert_eq!(forms.len(), 1);
        let outer = list_to_vec(&forms[0]).unwrap();
        assert!(matches!(outer[0], Value::Integer(ref n) if *n == BigInt::from(1)));
        let inner = list_to_vec(&outer[2]).unwrap();
        assert_eq!(inner.len(), 2);
    }

    #[test]
    fn test_parses_rational() {
        let mut env = Env::new();
        let forms = parse_all("1/2", &mut env).unwrap();
        assert!(matches!(forms[0], Value::Rational(_)));
    }

    #[test]
    fn test_parses_quote_sugar() {
        let mut env = Env::new();
        let forms = parse_all("'(a b)", &mut env).unwrap();
        let items = list_to_vec(&forms[0]).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_symbol(), Some(SymbolId::QUOTE));
    }

    #[test]
    fn test_parses_dotted_pair() {
        let mut env = Env::new();
        let forms = parse_all("(1 . 2)", &mut env).unwrap();
        let pair = forms[0].as_pair().unwrap().borrow();
        assert!(matches!(pair.car, Value::Integer(ref n) if *n == BigInt::from(1)));
        assert!(matches!(pair.cdr, Value::Integer(ref n) if *n == BigInt::from(2)));
    }

    #[test]
    fn test_parses_string_escapes_and_char() {
        let mut env = Env::new();
        let forms = parse_all(r#" "a\nb" #\newline "#, &mut env).unwrap();
        match &forms[0] {
            Value::String(s) => assert_eq!(*s.borrow(), "a\nb"),
            _ => panic!("expected string"),
        }
        assert!(matches!(forms[1], Value::Character('\n')));
    }

    #[test]
    fn test_balance_ignores_parens_in_strings_and_comments() {
        assert!(!is_balanced("(a b"));
        assert!(is_balanced("(a \"(\" b)"));
        assert!(is_balanced("(a ; ( comment\n b)"));
    }
}
