//! External representation of values (spec.md §3, §6: `display` vs `write`).
//!
//! `Repr` wraps a [`Value`] together with a symbol table (needed to print
//! [`SymbolId`]s by name) and a `write` flag selecting between the two
//! printed forms: `write` quotes strings and characters so the output can
//! be read back; `display` prints their raw contents.

use crate::symbol::SymbolTable;
use crate::value::{Pair, Value};

pub struct Repr<'a> {
    value: &'a Value,
    symbols: &'a SymbolTable,
    write: bool,
}

impl<'a> Repr<'a> {
    pub fn display(value: &'a Value, symbols: &'a SymbolTable) -> Self {
        Repr { value, symbols, write: false }
    }

    pub fn write(value: &'a Value, symbols: &'a SymbolTable) -> Self {
        Repr { value, symbols, write: true }
    }
}

impl std::fmt::Display for Repr<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_value(self.value, self.symbols, self.write, f)
    }
}

fn fmt_value(
    value: &Value,
    symbols: &SymbolTable,
    write: bool,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    match value {
        Value::Boolean(true) => write!(f, "#t"),
        Value::Boolean(false) => write!(f, "#f"),
        Value::Integer(n) => write!(f, "{n}"),
        Value::Rational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
        Value::Character(ch) => {
            if write {
                write!(f, "#\\{}", char_name(*ch))
            } else {
                write!(f, "{ch}")
            }
        }
        Value::String(s) => {
            if write {
                write!(f, "\"{}\"", escape_string(&s.borrow()))
            } else {
                write!(f, "{}", s.borrow())
            }
        }
        Value::Vector(v) => {
            write!(f, "#(")?;
            let v = v.borrow();
            for (i, item) in v.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                fmt_value(item, symbols, write, f)?;
            }
            write!(f, ")")
        }
        Value::Symbol(id) | Value::Scoped(id, _) => write!(f, "{}", symbols.name(*id)),
        Value::Pair(pair) => fmt_pair(&pair.borrow(), symbols, write, f),
        Value::Empty => write!(f, "()"),
        Value::Procedure(proc) => {
            let proc = proc.borrow();
            match proc.name {
                Some(name) => write!(f, "#<procedure {}>", symbols.name(name)),
                None => write!(f, "#<procedure>"),
            }
        }
        Value::Port(port) => write!(f, "{:?}", port.borrow()),
        Value::Scope(_) => write!(f, "#<environment>"),
    }
}

fn fmt_pair(
    pair: &Pair,
    symbols: &SymbolTable,
    write: bool,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    write!(f, "(")?;
    fmt_value(&pair.car, symbols, write, f)?;

    let mut cur = pair.cdr.clone();
    loop {
        match cur {
            Value::Empty => break,
            Value::Pair(next) => {
                let next = next.borrow();
                write!(f, " ")?;
                fmt_value(&next.car, symbols, write, f)?;
                cur = next.cdr.clone();
            }
            other => {
                write!(f, " . ")?;
                fmt_value(&other, symbols, write, f)?;
                break;
            }
        }
    }
    write!(f, ")")
}

fn char_name(ch: char) -> String {
    match ch {
        ' ' => "space".to_string(),
        '\n' => "newline".to_string(),
        '\t' => "tab".to_string(),
        '\r' => "return".to_string(),
        '\0' => "null".to_string(),
        other => other.to_string(),
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::env::Env;
    use num_bigint::BigInt;

    #[test]
    fn test_integer_and_boolean() {
        let env = Env::new();
        let repr = Repr::display(&Value::Integer(BigInt::from(42)), &env.symbols);
        assert_eq!(repr.to_string(), "42");

        let repr = Repr::display(&Value::Boolean(false), &env.symbols);
        assert_eq!(repr.to_string(), "#f");
    }

    #[test]
    fn test_string_write_quotes_display_does_not() {
        let env = Env::new();
        let value = Value::string("hi\nthere");
        assert_eq!(Repr::write(&value, &env.symbols).to_string(), "\"hi\\nthere\"");
        assert_eq!(Repr::display(&value, &env.symbols).to_string(), "hi\nthere");
    }

    #[test]
    fn test_proper_and_dotted_list() {
        let env = Env::new();
        let proper = crate::utils::vec_to_list(vec![
            Value::Integer(BigInt::from(1)),
            Value::Integer(BigInt::from(2)),
        ]);
        assert_eq!(Repr::display(&proper, &env.symbols).to_string(), "(1 2)");

        let dotted = Value::cons(Value::Integer(BigInt::from(1)), Value::Integer(BigInt::from(2)));
        assert_eq!(Repr::display(&dotted, &env.symbols).to_string(), "(1 . 2)");
    }

    #[test]
    fn test_character_names() {
        let env = Env::new();
        assert_eq!(Repr::write(&Value::Character(' '), &env.symbols).to_string(), "#\\space");
        assert_eq!(Repr::write(&Value::Character('a'), &env.symbols).to_string(), "#\\a");
    }
}
