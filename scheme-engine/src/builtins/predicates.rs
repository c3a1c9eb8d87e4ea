//! Type predicates and the three equivalence predicates (spec.md §3).

use crate::env::Env;
use crate::error::{Error, Result};
use crate::value::Value;

use super::numeric::{as_rational, is_negative, is_zero};
use super::{def, pop_n};

fn one(args: &[Value]) -> Result<&Value> {
    args.first().ok_or_else(|| Error::arity(1, 0))
}

pub fn install(env: &mut Env) {
    def(env, "eq?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 2 {
            return Err(Error::arity(2, args.len()));
        }
        vm.stack.push(Value::Boolean(args[0].is_eq(&args[1])));
        Ok(())
    });

    def(env, "eqv?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 2 {
            return Err(Error::arity(2, args.len()));
        }
        vm.stack.push(Value::Boolean(args[0].is_eqv(&args[1])));
        Ok(())
    });

    def(env, "equal?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 2 {
            return Err(Error::arity(2, args.len()));
        }
        vm.stack.push(Value::Boolean(args[0].is_equal(&args[1])));
        Ok(())
    });

    def(env, "not", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(!one(&args)?.is_true()));
        Ok(())
    });

    def(env, "number?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(as_rational(one(&args)?).is_some()));
        Ok(())
    });

    def(env, "integer?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(matches!(one(&args)?, Value::Integer(_))));
        Ok(())
    });

    def(env, "rational?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(as_rational(one(&args)?).is_some()));
        Ok(())
    });

    def(env, "zero?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(is_zero(one(&args)?)?));
        Ok(())
    });

    def(env, "positive?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        let v = one(&args)?;
        vm.stack.push(Value::Boolean(!is_negative(v)? && !is_zero(v)?));
        Ok(())
    });

    def(env, "negative?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(is_negative(one(&args)?)?));
        Ok(())
    });

    def(env, "odd?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        match one(&args)? {
            Value::Integer(n) => vm.stack.push(Value::Boolean(n % 2 != num_bigint::BigInt::from(0))),
            _ => return Err(Error::wrong_type("integer", "a non-integer value")),
        }
        Ok(())
    });

    def(env, "even?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        match one(&args)? {
            Value::Integer(n) => vm.stack.push(Value::Boolean(n % 2 == num_bigint::BigInt::from(0))),
            _ => return Err(Error::wrong_type("integer", "a non-integer value")),
        }
        Ok(())
    });

    def(env, "boolean?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(matches!(one(&args)?, Value::Boolean(_))));
        Ok(())
    });

    def(env, "symbol?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(one(&args)?.as_symbol().is_some()));
        Ok(())
    });

    def(env, "string?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(matches!(one(&args)?, Value::String(_))));
        Ok(())
    });

    def(env, "char?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(matches!(one(&args)?, Value::Character(_))));
        Ok(())
    });

    def(env, "vector?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(matches!(one(&args)?, Value::Vector(_))));
        Ok(())
    });

    def(env, "procedure?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(one(&args)?.is_procedure()));
        Ok(())
    });
}
