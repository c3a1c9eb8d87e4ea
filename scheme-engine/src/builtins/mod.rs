//! Native procedures bridged into the VM (spec.md §4.6). One file per
//! concern, the way `lisp-llm-sandbox::builtins` is laid out; each
//! submodule owns an `install(&mut Env)` that defines its procedures
//! directly into the top scope.

mod arithmetic;
mod control;
mod io;
mod numeric;
mod pairs;
mod predicates;
mod strings;

use crate::env::{Env, Scope};
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::value::{Formals, NativeFn, Proc, Value};
use crate::vm::Vm;

pub fn install(env: &mut Env) {
    arithmetic::install(env);
    pairs::install(env);
    predicates::install(env);
    strings::install(env);
    io::install(env);
    control::install(env);
}

/// Bind a native procedure into the top scope. Builtins enforce their own
/// arity against `nargs` (spec.md §4.6); the `Formals` recorded here is
/// purely informational (`repr`, introspection), so every builtin is
/// tagged variadic on its own name as a placeholder.
fn def(env: &mut Env, name: &str, func: NativeFn) {
    let sym = env.intern(name);
    let value = Value::Procedure(Handle::new(Proc::builtin(sym, Formals::Variadic(sym), func)));
    Scope::define(&env.top, sym, value);
}

/// Pop `n` operands off the stack in argument order (arg0 first), per the
/// calling convention documented on [`crate::compiler::compile_application`].
fn pop_n(vm: &mut Vm, n: usize) -> Result<Vec<Value>> {
    let mut args = Vec::with_capacity(n);
    for _ in 0..n {
        args.push(
            vm.stack
                .pop()
                .ok_or_else(|| Error::Fatal("operand stack underflow in builtin call".to_string()))?,
        );
    }
    Ok(args)
}
