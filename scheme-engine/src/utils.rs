//! List <-> vector conversions (spec.md §3, "Lists are the conventional
//! null-terminated pair chains").

use crate::error::{Error, Result};
use crate::value::Value;

pub fn cons(car: Value, cdr: Value) -> Value {
    Value::cons(car, cdr)
}

pub fn nil() -> Value {
    Value::Empty
}

/// Convert a proper list to an ordered sequence of values. Fails on
/// improper lists (spec.md §3 invariant: "proper list consumption never
/// returns silently on improper input").
pub fn list_to_vec(list: &Value) -> Result<Vec<Value>> {
    let mut out = Vec::new();
    let mut cur = list.clone();
    loop {
        match cur {
            Value::Empty => return Ok(out),
            Value::Pair(pair) => {
                let pair = pair.borrow();
                out.push(pair.car.clone());
                cur = pair.cdr.clone();
            }
            _ => return Err(Error::Type("expected a proper list".to_string())),
        }
    }
}

/// The inverse of [`list_to_vec`]: build a proper list from a sequence.
pub fn vec_to_list(values: Vec<Value>) -> Value {
    let mut list = Value::Empty;
    for value in values.into_iter().rev() {
        list = Value::cons(value, list);
    }
    list
}

/// Like [`vec_to_list`], but the chain ends in `tail` instead of `Empty` -
/// used by the macro engine when splicing an ellipsis-matched prefix back
/// in front of whatever the rest of the pattern bound.
pub fn vec_to_improper(values: Vec<Value>, tail: Value) -> Value {
    let mut list = tail;
    for value in values.into_iter().rev() {
        list = Value::cons(value, list);
    }
    list
}

#[cfg(test)]
mod test {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn test_roundtrip() {
        let xs = vec![
            Value::Integer(BigInt::from(1)),
            Value::Integer(BigInt::from(2)),
            Value::Integer(BigInt::from(3)),
        ];
        let list = vec_to_list(xs.clone());
        let back = list_to_vec(&list).unwrap();
        assert_eq!(back.len(), xs.len());
    }

    #[test]
    fn test_improper_list_errors() {
        let improper = Value::cons(Value::Integer(BigInt::from(1)), Value::Boolean(false));
        assert!(list_to_vec(&improper).is_err());
    }
}
