//! Shared numeric-tower helpers (spec.md §3: Integer and Rational, nothing
//! further). Builtins in [`super::arithmetic`] and [`super::predicates`]
//! both need to compare and combine the two representations uniformly.

use std::cmp::Ordering;

use num_rational::BigRational;
use num_traits::{Signed, Zero};

use crate::error::{Error, Result};
use crate::value::Value;

pub fn as_rational(value: &Value) -> Option<BigRational> {
    match value {
        Value::Integer(n) => Some(BigRational::from_integer(n.clone())),
        Value::Rational(r) => Some(r.clone()),
        _ => None,
    }
}

/// Collapse a rational with denominator 1 back down to an integer, the way
/// the reference interpreter's arithmetic always does after combining two
/// numbers.
pub fn normalize(r: BigRational) -> Value {
    if r.is_integer() {
        Value::Integer(r.to_integer())
    } else {
        Value::Rational(r)
    }
}

pub fn expect_number(value: &Value) -> Result<BigRational> {
    as_rational(value).ok_or_else(|| Error::wrong_type("number", "a non-numeric value"))
}

pub fn add(a: &Value, b: &Value) -> Result<Value> {
    Ok(normalize(expect_number(a)? + expect_number(b)?))
}

pub fn sub(a: &Value, b: &Value) -> Result<Value> {
    Ok(normalize(expect_number(a)? - expect_number(b)?))
}

pub fn mul(a: &Value, b: &Value) -> Result<Value> {
    Ok(normalize(expect_number(a)? * expect_number(b)?))
}

pub fn div(a: &Value, b: &Value) -> Result<Value> {
    let denom = expect_number(b)?;
    if denom.is_zero() {
        return Err(Error::Type("division by zero".to_string()));
    }
    Ok(normalize(expect_number(a)? / denom))
}

pub fn compare(a: &Value, b: &Value) -> Result<Ordering> {
    Ok(expect_number(a)?.cmp(&expect_number(b)?))
}

pub fn is_negative(value: &Value) -> Result<bool> {
    Ok(expect_number(value)?.is_negative())
}

pub fn is_zero(value: &Value) -> Result<bool> {
    Ok(expect_number(value)?.is_zero())
}
