//! Numeric builtins (spec.md §3, §4.6). Grounded in the reference
//! interpreter's `FnAdd`/`FnSub`/... family (`misc_builtins.go`,
//! `list_builtins.go`), generalized to the Integer/Rational tower.

use num_bigint::BigInt;
use num_integer::Integer as _;
use num_traits::Zero;

use crate::env::Env;
use crate::error::{Error, Result};
use crate::value::Value;
use crate::vm::Vm;

use super::numeric::{add, compare, div, expect_number, mul, normalize, sub};
use super::{def, pop_n};

fn expect_integer(value: &Value) -> Result<BigInt> {
    match value {
        Value::Integer(n) => Ok(n.clone()),
        _ => Err(Error::wrong_type("integer", "a non-integer value")),
    }
}

pub fn install(env: &mut Env) {
    def(env, "+", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        let mut total = Value::Integer(BigInt::zero());
        for arg in &args {
            total = add(&total, arg)?;
        }
        vm.stack.push(total);
        Ok(())
    });

    def(env, "*", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        let mut total = Value::Integer(BigInt::from(1));
        for arg in &args {
            total = mul(&total, arg)?;
        }
        vm.stack.push(total);
        Ok(())
    });

    def(env, "-", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.is_empty() {
            return Err(Error::arity("at least 1", 0));
        }
        if args.len() == 1 {
            vm.stack.push(sub(&Value::Integer(BigInt::zero()), &args[0])?);
            return Ok(());
        }
        let mut total = args[0].clone();
        for arg in &args[1..] {
            total = sub(&total, arg)?;
        }
        vm.stack.push(total);
        Ok(())
    });

    def(env, "/", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.is_empty() {
            return Err(Error::arity("at least 1", 0));
        }
        if args.len() == 1 {
            vm.stack.push(div(&Value::Integer(BigInt::from(1)), &args[0])?);
            return Ok(());
        }
        let mut total = args[0].clone();
        for arg in &args[1..] {
            total = div(&total, arg)?;
        }
        vm.stack.push(total);
        Ok(())
    });

    def(env, "quotient", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 2 {
            return Err(Error::arity(2, args.len()));
        }
        let (a, b) = (expect_integer(&args[0])?, expect_integer(&args[1])?);
        if b.is_zero() {
            return Err(Error::Type("division by zero".to_string()));
        }
        vm.stack.push(Value::Integer(a / b));
        Ok(())
    });

    def(env, "remainder", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 2 {
            return Err(Error::arity(2, args.len()));
        }
        let (a, b) = (expect_integer(&args[0])?, expect_integer(&args[1])?);
        if b.is_zero() {
            return Err(Error::Type("division by zero".to_string()));
        }
        vm.stack.push(Value::Integer(a % b));
        Ok(())
    });

    def(env, "modulo", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 2 {
            return Err(Error::arity(2, args.len()));
        }
        let (a, b) = (expect_integer(&args[0])?, expect_integer(&args[1])?);
        if b.is_zero() {
            return Err(Error::Type("division by zero".to_string()));
        }
        vm.stack.push(Value::Integer(a.mod_floor(&b)));
        Ok(())
    });

    def(env, "abs", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let n = expect_number(&args[0])?;
        vm.stack.push(normalize(if n.is_negative() { -n } else { n }));
        Ok(())
    });

    def(env, "gcd", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        let mut result = BigInt::zero();
        for arg in &args {
            result = result.gcd(&expect_integer(arg)?);
        }
        vm.stack.push(Value::Integer(result));
        Ok(())
    });

    def(env, "lcm", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        let mut result = BigInt::from(1);
        for arg in &args {
            result = result.lcm(&expect_integer(arg)?);
        }
        vm.stack.push(Value::Integer(result));
        Ok(())
    });

    def(env, "=", |vm, nargs| chained_compare(vm, nargs, |o| o == std::cmp::Ordering::Equal));
    def(env, "<", |vm, nargs| chained_compare(vm, nargs, |o| o == std::cmp::Ordering::Less));
    def(env, ">", |vm, nargs| chained_compare(vm, nargs, |o| o == std::cmp::Ordering::Greater));
    def(env, "<=", |vm, nargs| chained_compare(vm, nargs, |o| o != std::cmp::Ordering::Greater));
    def(env, ">=", |vm, nargs| chained_compare(vm, nargs, |o| o != std::cmp::Ordering::Less));

    def(env, "min", |vm, nargs| pick_extreme(vm, nargs, std::cmp::Ordering::Less));
    def(env, "max", |vm, nargs| pick_extreme(vm, nargs, std::cmp::Ordering::Greater));
}

fn pick_extreme(vm: &mut Vm, nargs: usize, want: std::cmp::Ordering) -> Result<()> {
    let args = pop_n(vm, nargs)?;
    if args.is_empty() {
        return Err(Error::arity("at least 1", 0));
    }
    let mut best = args[0].clone();
    for arg in &args[1..] {
        if compare(arg, &best)? == want {
            best = arg.clone();
        }
    }
    vm.stack.push(best);
    Ok(())
}

/// `=`, `<`, `>`, `<=`, `>=`: chained comparisons, true iff every adjacent
/// pair satisfies `accept`.
fn chained_compare(vm: &mut Vm, nargs: usize, accept: impl Fn(std::cmp::Ordering) -> bool) -> Result<()> {
    let args = pop_n(vm, nargs)?;
    let mut ok = true;
    for pair in args.windows(2) {
        if !accept(compare(&pair[0], &pair[1])?) {
            ok = false;
            break;
        }
    }
    vm.stack.push(Value::Boolean(ok));
    Ok(())
}
