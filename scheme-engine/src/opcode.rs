//! The instruction set (spec.md §4.2).
//!
//! Eight opcodes, each carrying whatever immediate data it needs. The
//! reference interpreter models an instruction as a flat `{op, imm, nargs}`
//! struct; an enum of variants says the same thing and makes illegal
//! combinations (an `If` with a `Set`'s immediate, say) unrepresentable.

use std::rc::Rc;

use crate::symbol::SymbolId;
use crate::value::{Proc, Value};

#[derive(Debug, Clone)]
pub enum Ins {
    /// Push a value.
    Imm(Value),
    /// Resolve a Symbol or Scoped value in the current scope chain and
    /// push the bound value. Errors if unbound.
    GetVar(Value),
    /// Pop the callee and invoke it. `-1` means: pop a count `Integer`
    /// first and use that as the actual arity (multiple-values plumbing).
    Call(i32),
    /// Materialize a fresh procedure from this template, capturing the
    /// current scope as its enclosing environment, and push it.
    Lambda(Rc<Proc>),
    /// Mutate `sym`'s existing binding to the top-of-stack value (without
    /// popping); if unbound, creates it in the current scope.
    Set(SymbolId),
    /// Bind `sym` in the current scope to the top-of-stack value (without
    /// popping). Warns on rebind.
    Define(SymbolId),
    /// Pop a condition, pop the THEN procedure, and (if `arity == 3`) pop
    /// the ELSE procedure too. Runs THEN unless the condition is exactly
    /// `#f`.
    If(u8),
    /// Push the current procedure's scope as a first-class value.
    SaveScope,
}
