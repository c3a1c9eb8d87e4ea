//! The library layer evaluated once at startup, on top of the native
//! special forms and [`crate::builtins`] (spec.md §3, SPEC_FULL.md's
//! `[PRELUDE]` module). Defines `let`/`let*`/`letrec`, `and`/`or`/`cond`/
//! `when`/`unless`, `case-lambda`, and the handful of list procedures not
//! already native (`filter`, `fold-left`, `fold-right`).

use crate::compiler;
use crate::error::Result;
use crate::parser;
use crate::vm::Vm;

const SOURCE: &str = include_str!("prelude.scm");

/// Compile and run the embedded prelude source against `vm`'s environment.
/// Called once by [`crate::new_env`] before `env.refresh_base()`, so that
/// `scheme-report-environment` also sees these definitions.
pub fn load(vm: &mut Vm) -> Result<()> {
    let forms = parser::parse_all(SOURCE, &mut vm.env)?;
    let program = compiler::compile_program(&mut vm.env, &forms)?;
    vm.eval(program)?;
    Ok(())
}
