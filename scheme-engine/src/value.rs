//! The runtime value universe.
//!
//! `Value` is a closed sum: every variant the interpreter can push onto the
//! operand stack, bind in a scope, or embed in an instruction's immediate
//! lives here. New kinds of data are never added by extending some open
//! trait object - they're added as a variant, with exhaustive dispatch
//! everywhere that matters (the compiler, the VM, `repr`, the builtins).

use std::rc::Rc;

use num_bigint::BigInt;
use num_rational::BigRational;

use crate::env::Scope;
use crate::handle::Handle;
use crate::macros::MacroTable;
use crate::opcode::Ins;
use crate::port::Port;
use crate::symbol::SymbolId;

#[derive(Debug, Clone)]
pub enum Value {
    Boolean(bool),
    Integer(BigInt),
    Rational(BigRational),
    Character(char),
    String(Handle<String>),
    Vector(Handle<Vec<Value>>),
    Symbol(SymbolId),
    /// A symbol annotated with the scope it was introduced in. Produced by
    /// the macro engine to preserve hygiene across expansion.
    Scoped(SymbolId, Handle<Scope>),
    Pair(Handle<Pair>),
    Empty,
    Procedure(Handle<Proc>),
    Port(Handle<Port>),
    /// A bare scope reference, pushed by the `SaveScope` instruction and
    /// bound to a name so later macro expansions can recover the
    /// definition-time environment. Not surface syntax; no reader form
    /// produces one directly.
    Scope(Handle<Scope>),
}

impl Value {
    pub fn boolean(value: bool) -> Value {
        Value::Boolean(value)
    }

    pub fn integer(value: impl Into<BigInt>) -> Value {
        Value::Integer(value.into())
    }

    pub fn string(value: impl Into<String>) -> Value {
        Value::String(Handle::new(value.into()))
    }

    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Pair(Handle::new(Pair { car, cdr }))
    }

    pub fn is_true(&self) -> bool {
        !matches!(self, Value::Boolean(false))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Value::Pair(_))
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, Value::Procedure(_))
    }

    pub fn as_pair(&self) -> Option<&Handle<Pair>> {
        match self {
            Value::Pair(pair) => Some(pair),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<SymbolId> {
        match self {
            Value::Symbol(id) => Some(*id),
            Value::Scoped(id, _) => Some(*id),
            _ => None,
        }
    }

    pub fn as_procedure(&self) -> Option<&Handle<Proc>> {
        match self {
            Value::Procedure(proc) => Some(proc),
            _ => None,
        }
    }

    /// Identity comparison, the `eq?` builtin's notion of equality.
    pub fn is_eq(&self, other: &Value) -> bool {
        use Value::*;

        match (self, other) {
            (Boolean(a), Boolean(b)) => a == b,
            (Symbol(a), Symbol(b)) => a == b,
            (Scoped(a, _), Scoped(b, _)) => a == b,
            (Character(a), Character(b)) => a == b,
            (Empty, Empty) => true,
            (Integer(a), Integer(b)) => a == b,
            (String(a), String(b)) => a.ptr_eq(b),
            (Vector(a), Vector(b)) => a.ptr_eq(b),
            (Pair(a), Pair(b)) => a.ptr_eq(b),
            (Procedure(a), Procedure(b)) => a.ptr_eq(b),
            (Port(a), Port(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// `eqv?`: like `eq?`, but numbers compare by value regardless of how
    /// they're boxed.
    pub fn is_eqv(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Rational(a), Value::Rational(b)) => a == b,
            _ => self.is_eq(other),
        }
    }

    /// Structural equality, `equal?`: recurse into pairs, strings and
    /// vectors by content rather than identity.
    pub fn is_equal(&self, other: &Value) -> bool {
        use Value::*;

        match (self, other) {
            (String(a), String(b)) => *a.borrow() == *b.borrow(),
            (Vector(a), Vector(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.is_equal(y))
            }
            (Pair(a), Pair(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.car.is_equal(&b.car) && a.cdr.is_equal(&b.cdr)
            }
            _ => self.is_eqv(other),
        }
    }

    /// Structural equality used by the macro matcher to compare literal
    /// constants embedded in a pattern against the input form.
    pub fn literal_eq(&self, other: &Value) -> bool {
        self.is_equal(other)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Empty
    }
}

/// A mutable cons cell. `car` and `cdr` are independently assignable.
#[derive(Debug, Clone)]
pub struct Pair {
    pub car: Value,
    pub cdr: Value,
}

impl Pair {
    pub fn new(car: Value, cdr: Value) -> Self {
        Self { car, cdr }
    }

    pub fn split_first(&self) -> (&Value, &Value) {
        (&self.car, &self.cdr)
    }
}

/// A procedure's formal parameter specification (spec.md §3).
#[derive(Debug, Clone)]
pub enum Formals {
    /// Zero or more fixed parameters, no rest.
    Fixed(Vec<SymbolId>),
    /// Fixed parameters followed by a rest parameter (an improper list).
    Rest(Vec<SymbolId>, SymbolId),
    /// A bare symbol: all arguments collected into one list.
    Variadic(SymbolId),
}

impl Formals {
    pub fn min_arity(&self) -> usize {
        match self {
            Formals::Fixed(params) => params.len(),
            Formals::Rest(params, _) => params.len(),
            Formals::Variadic(_) => 0,
        }
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self, Formals::Rest(..) | Formals::Variadic(_))
    }
}

/// How a procedure value is ultimately invoked (spec.md §3).
#[derive(Clone)]
pub enum ExecKind {
    /// Executes its own instruction list against a freshly-created call
    /// scope whose parent is the scope captured when the `Lambda`
    /// instruction that produced it ran.
    Interpreted { captured_scope: Handle<Scope> },
    /// Calls into the host. Consumes `nargs` values from the operand stack
    /// and pushes exactly one result (spec.md §4.6).
    Builtin(NativeFn),
    /// Restores a snapshot of the operand stack and resumes. `id` is unique
    /// per `call/cc` invocation and lets the VM recognize which live host
    /// frame, if any, is waiting to catch the escape (escape-only
    /// continuations, see spec.md §9's host-limitation allowance).
    Continuation { id: u64, stack: Vec<Value> },
}

impl std::fmt::Debug for ExecKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecKind::Interpreted { .. } => write!(f, "Interpreted"),
            ExecKind::Builtin(_) => write!(f, "Builtin"),
            ExecKind::Continuation { id, stack } => {
                write!(f, "Continuation(id={id}, depth={})", stack.len())
            }
        }
    }
}

pub type NativeFn = fn(vm: &mut crate::vm::Vm, nargs: usize) -> crate::error::Result<()>;

/// A callable value: a compiled closure, a host builtin, or a captured
/// continuation.
#[derive(Debug, Clone)]
pub struct Proc {
    pub formals: Formals,
    pub code: Rc<[Ins]>,
    pub macros: Handle<MacroTable>,
    pub kind: ExecKind,
    /// Name bound to this procedure when defined, kept only for error
    /// messages and `repr`.
    pub name: Option<SymbolId>,
}

impl Proc {
    pub fn builtin(name: SymbolId, formals: Formals, func: NativeFn) -> Self {
        Proc {
            formals,
            code: Rc::from([]),
            macros: Handle::new(MacroTable::new()),
            kind: ExecKind::Builtin(func),
            name: Some(name),
        }
    }

    pub fn is_continuation(&self) -> bool {
        matches!(self.kind, ExecKind::Continuation { .. })
    }
}
