//! Pair and list builtins (spec.md §3), grounded in the reference
//! interpreter's `FnCons`/`FnCar`/`FnCdr`/`FnSetCar`/`FnSetCdr`
//! (`list_builtins.go`). `car`/`cdr` of `Empty` pass `Empty` through
//! unchanged rather than erroring, matching that behavior (spec.md §9).

use crate::env::Env;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::utils::{list_to_vec, vec_to_list};
use crate::value::{Pair, Value};
use crate::vm::Vm;

use super::{def, pop_n};

fn expect_pair(value: &Value) -> Result<Handle<Pair>> {
    value.as_pair().cloned().ok_or_else(|| Error::wrong_type("pair", "a non-pair value"))
}

pub fn install(env: &mut Env) {
    def(env, "cons", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 2 {
            return Err(Error::arity(2, args.len()));
        }
        vm.stack.push(Value::cons(args[0].clone(), args[1].clone()));
        Ok(())
    });

    def(env, "car", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        if args[0].is_empty() {
            vm.stack.push(Value::Empty);
            return Ok(());
        }
        let pair = expect_pair(&args[0])?;
        let car = pair.borrow().car.clone();
        vm.stack.push(car);
        Ok(())
    });

    def(env, "cdr", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        if args[0].is_empty() {
            vm.stack.push(Value::Empty);
            return Ok(());
        }
        let pair = expect_pair(&args[0])?;
        let cdr = pair.borrow().cdr.clone();
        vm.stack.push(cdr);
        Ok(())
    });

    def(env, "set-car!", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 2 {
            return Err(Error::arity(2, args.len()));
        }
        let pair = expect_pair(&args[0])?;
        pair.borrow_mut().car = args[1].clone();
        vm.stack.push(Value::Empty);
        Ok(())
    });

    def(env, "set-cdr!", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 2 {
            return Err(Error::arity(2, args.len()));
        }
        let pair = expect_pair(&args[0])?;
        pair.borrow_mut().cdr = args[1].clone();
        vm.stack.push(Value::Empty);
        Ok(())
    });

    def(env, "pair?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(args.first().map(Value::is_pair).unwrap_or(false)));
        Ok(())
    });

    def(env, "null?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(args.first().map(Value::is_empty).unwrap_or(false)));
        Ok(())
    });

    def(env, "list", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(vec_to_list(args));
        Ok(())
    });

    def(env, "list?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        vm.stack.push(Value::Boolean(list_to_vec(&args[0]).is_ok()));
        Ok(())
    });

    def(env, "length", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let items = list_to_vec(&args[0])?;
        vm.stack.push(Value::integer(items.len() as i64));
        Ok(())
    });

    def(env, "append", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.is_empty() {
            vm.stack.push(Value::Empty);
            return Ok(());
        }
        let mut all = Vec::new();
        for arg in &args[..args.len() - 1] {
            all.extend(list_to_vec(arg)?);
        }
        let tail = args.last().unwrap().clone();
        vm.stack.push(crate::utils::vec_to_improper(all, tail));
        Ok(())
    });

    def(env, "reverse", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let mut items = list_to_vec(&args[0])?;
        items.reverse();
        vm.stack.push(vec_to_list(items));
        Ok(())
    });

    def(env, "list-tail", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 2 {
            return Err(Error::arity(2, args.len()));
        }
        let k = expect_index(&args[1])?;
        let mut cur = args[0].clone();
        for _ in 0..k {
            let pair = expect_pair(&cur)?;
            let next = pair.borrow().cdr.clone();
            cur = next;
        }
        vm.stack.push(cur);
        Ok(())
    });

    def(env, "list-ref", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 2 {
            return Err(Error::arity(2, args.len()));
        }
        let k = expect_index(&args[1])?;
        let items = list_to_vec(&args[0])?;
        let item = items.get(k).cloned().ok_or_else(|| Error::Type("index out of range".to_string()))?;
        vm.stack.push(item);
        Ok(())
    });

    def(env, "assoc", |vm, nargs| assoc_with(vm, nargs, Value::is_equal));
    def(env, "assq", |vm, nargs| assoc_with(vm, nargs, Value::is_eq));
    def(env, "assv", |vm, nargs| assoc_with(vm, nargs, Value::is_eqv));

    def(env, "member", |vm, nargs| member_with(vm, nargs, Value::is_equal));
    def(env, "memq", |vm, nargs| member_with(vm, nargs, Value::is_eq));
    def(env, "memv", |vm, nargs| member_with(vm, nargs, Value::is_eqv));
}

fn expect_index(value: &Value) -> Result<usize> {
    match value {
        Value::Integer(n) => n.to_string().parse::<usize>().map_err(|_| Error::Type("negative index".to_string())),
        _ => Err(Error::wrong_type("integer", "a non-integer index")),
    }
}

fn assoc_with(vm: &mut Vm, nargs: usize, eq: fn(&Value, &Value) -> bool) -> Result<()> {
    let args = pop_n(vm, nargs)?;
    if args.len() != 2 {
        return Err(Error::arity(2, args.len()));
    }
    let items = list_to_vec(&args[1])?;
    for item in items {
        let pair = expect_pair(&item)?;
        if eq(&pair.borrow().car, &args[0]) {
            vm.stack.push(item);
            return Ok(());
        }
    }
    vm.stack.push(Value::Boolean(false));
    Ok(())
}

fn member_with(vm: &mut Vm, nargs: usize, eq: fn(&Value, &Value) -> bool) -> Result<()> {
    let args = pop_n(vm, nargs)?;
    if args.len() != 2 {
        return Err(Error::arity(2, args.len()));
    }
    let mut cur = args[1].clone();
    loop {
        match &cur {
            Value::Empty => {
                vm.stack.push(Value::Boolean(false));
                return Ok(());
            }
            Value::Pair(pair) => {
                let (car, cdr) = {
                    let pair = pair.borrow();
                    (pair.car.clone(), pair.cdr.clone())
                };
                if eq(&car, &args[0]) {
                    vm.stack.push(cur.clone());
                    return Ok(());
                }
                cur = cdr;
            }
            _ => return Err(Error::wrong_type("list", "an improper list")),
        }
    }
}
