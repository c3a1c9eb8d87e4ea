//! Control-flow builtins (spec.md §3, §4.6, §9): `call/cc`, `apply`,
//! `eval`, `map`/`for-each`, `dynamic-wind`, multiple values, and the
//! environment-reification procedures, grounded in the reference
//! interpreter's `FnCallCC`/`FnApply`/`FnDynamicWind`/`FnValues`/
//! `FnCallWithValues`/`FnNullEnvironment`/`FnSchemeReportEnvironment`
//! (`misc_builtins.go`).

use crate::compiler;
use crate::env::{Env, Scope};
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::repr::Repr;
use crate::utils::{list_to_vec, vec_to_list};
use crate::value::{ExecKind, Formals, Proc, Value};
use crate::vm::Vm;

use super::{def, pop_n};

fn expect_proc(value: &Value) -> Result<Handle<Proc>> {
    value
        .as_procedure()
        .cloned()
        .ok_or_else(|| Error::wrong_type("procedure", "a non-procedure value"))
}

pub fn install(env: &mut Env) {
    def(env, "call/cc", |vm, nargs| call_with_current_continuation(vm, nargs));
    def(env, "call-with-current-continuation", |vm, nargs| call_with_current_continuation(vm, nargs));

    def(env, "apply", |vm, nargs| {
        let mut args = pop_n(vm, nargs)?;
        if args.len() < 2 {
            return Err(Error::arity("at least 2", args.len()));
        }
        let proc = expect_proc(&args[0])?;
        let tail = args.pop().unwrap();
        let mut call_args = args.split_off(1);
        call_args.extend(list_to_vec(&tail)?);
        let result = vm.apply(&proc, call_args)?;
        vm.stack.push(result);
        Ok(())
    });

    def(env, "eval", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.is_empty() || args.len() > 2 {
            return Err(Error::arity("1 or 2", args.len()));
        }
        let scope = match args.get(1) {
            Some(Value::Scope(scope)) => scope.clone(),
            Some(_) => return Err(Error::wrong_type("environment", "a non-environment value")),
            None => vm.env.top.clone(),
        };
        let proc = compiler::compile(&mut vm.env, &args[0])?;
        let rebound = Proc {
            formals: Formals::Fixed(vec![]),
            code: proc.code.clone(),
            macros: proc.macros.clone(),
            kind: ExecKind::Interpreted { captured_scope: scope },
            name: None,
        };
        let result = vm.apply(&Handle::new(rebound), vec![])?;
        vm.stack.push(result);
        Ok(())
    });

    def(env, "map", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() < 2 {
            return Err(Error::arity("at least 2", args.len()));
        }
        let proc = expect_proc(&args[0])?;
        let lists: Vec<Vec<Value>> = args[1..].iter().map(list_to_vec).collect::<Result<_>>()?;
        let len = lists.iter().map(Vec::len).min().unwrap_or(0);
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            let call_args: Vec<Value> = lists.iter().map(|l| l[i].clone()).collect();
            out.push(vm.apply(&proc, call_args)?);
        }
        vm.stack.push(vec_to_list(out));
        Ok(())
    });

    def(env, "for-each", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() < 2 {
            return Err(Error::arity("at least 2", args.len()));
        }
        let proc = expect_proc(&args[0])?;
        let lists: Vec<Vec<Value>> = args[1..].iter().map(list_to_vec).collect::<Result<_>>()?;
        let len = lists.iter().map(Vec::len).min().unwrap_or(0);
        for i in 0..len {
            let call_args: Vec<Value> = lists.iter().map(|l| l[i].clone()).collect();
            vm.apply(&proc, call_args)?;
        }
        vm.stack.push(Value::Empty);
        Ok(())
    });

    def(env, "dynamic-wind", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 3 {
            return Err(Error::arity(3, args.len()));
        }
        let (before, thunk, after) = (expect_proc(&args[0])?, expect_proc(&args[1])?, expect_proc(&args[2])?);
        vm.apply(&before, vec![])?;
        // A continuation invoked inside `thunk` unwinds past this point via
        // `Error::Escape`, which the `?` below propagates straight out
        // without running `after` (thunks are not re-invoked on resume,
        // and there is no resume here to begin with).
        let result = vm.apply(&thunk, vec![])?;
        vm.apply(&after, vec![])?;
        vm.stack.push(result);
        Ok(())
    });

    def(env, "values", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() == 1 {
            vm.stack.push(args.into_iter().next().unwrap());
        } else {
            vm.stack.push(vec_to_list(args));
        }
        Ok(())
    });

    def(env, "call-with-values", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 2 {
            return Err(Error::arity(2, args.len()));
        }
        let (producer, consumer) = (expect_proc(&args[0])?, expect_proc(&args[1])?);
        let produced = vm.apply(&producer, vec![])?;
        let consumer_args = match &produced {
            Value::Pair(_) | Value::Empty => list_to_vec(&produced).unwrap_or_else(|_| vec![produced.clone()]),
            other => vec![other.clone()],
        };
        let result = vm.apply(&consumer, consumer_args)?;
        vm.stack.push(result);
        Ok(())
    });

    def(env, "null-environment", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        vm.stack.push(Value::Scope(Scope::root()));
        Ok(())
    });

    def(env, "scheme-report-environment", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        vm.stack.push(Value::Scope(vm.env.base.clone()));
        Ok(())
    });

    def(env, "exit", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.exit_code = Some(match args.first() {
            Some(Value::Integer(n)) => n.to_string().parse().unwrap_or(0),
            Some(Value::Boolean(false)) => 1,
            _ => 0,
        });
        vm.stack.push(Value::Empty);
        Ok(())
    });

    def(env, "error", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        let mut message = String::new();
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                message.push(' ');
            }
            message.push_str(&Repr::display(arg, &vm.env.symbols).to_string());
        }
        Err(Error::Reason(message))
    });

    def(env, "get-environment-variables", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if !args.is_empty() {
            return Err(Error::arity(0, args.len()));
        }
        let pairs = std::env::vars()
            .map(|(k, v)| Value::cons(Value::string(k), Value::string(v)))
            .collect();
        vm.stack.push(vec_to_list(pairs));
        Ok(())
    });
}

/// Capture the current continuation as a first-class procedure and invoke
/// `proc` with it. Escape-only: calling the continuation outside the
/// dynamic extent of this call raises [`Error::Fatal`] at the top level
/// (spec.md §9).
fn call_with_current_continuation(vm: &mut Vm, nargs: usize) -> Result<()> {
    let args = pop_n(vm, nargs)?;
    if args.len() != 1 {
        return Err(Error::arity(1, args.len()));
    }
    let proc = expect_proc(&args[0])?;
    let (id, stack) = vm.capture_continuation();
    let cont_sym = vm.env.intern("continuation");
    let cont = Handle::new(Proc {
        formals: Formals::Variadic(cont_sym),
        code: std::rc::Rc::from([]),
        macros: Handle::new(crate::macros::MacroTable::new()),
        kind: ExecKind::Continuation { id, stack },
        name: None,
    });
    match vm.apply(&proc, vec![Value::Procedure(cont)]) {
        Ok(value) => {
            vm.stack.push(value);
            Ok(())
        }
        Err(Error::Escape { id: escaped_id, stack, payload }) if escaped_id == id => {
            vm.stack = stack;
            vm.stack.push(*payload);
            Ok(())
        }
        Err(other) => Err(other),
    }
}
