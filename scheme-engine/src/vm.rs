//! Virtual machine (spec.md §4.2, §4.5).
//!
//! One `Frame` is active at a time; the call stack proper only grows for
//! non-tail calls, via a genuine recursive call into [`Vm::run`]. A tail
//! call instead replaces the active frame's code/pc/scope in place, so an
//! arbitrarily long chain of tail calls costs O(1) host stack frames
//! (spec.md §8 property 4). `if` doesn't need its own frame at all: its
//! chosen branch's instructions are spliced into the current frame with
//! the scope left untouched, so a tail call inside an `if` arm is still a
//! real tail call from the enclosing procedure's point of view.

use std::rc::Rc;

use crate::env::{resolve_start, Env, Scope};
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::opcode::Ins;
use crate::port::Port;
use crate::value::{ExecKind, Formals, Proc, Value};
use crate::utils::vec_to_list;

struct Frame {
    code: Rc<[Ins]>,
    pc: usize,
    scope: Handle<Scope>,
}

/// Everything a running program needs beyond its own instructions: the
/// operand stack, the interpreter context, and the current input/output
/// port stacks (spec.md §4.6 - `with-input-from-string` and friends push
/// and pop these rather than rebinding a global).
pub struct Vm {
    pub env: Env,
    pub stack: Vec<Value>,
    input_ports: Vec<Handle<Port>>,
    output_ports: Vec<Handle<Port>>,
    pub exit_code: Option<i32>,
    next_cont_id: u64,
}

impl Vm {
    pub fn new(env: Env) -> Vm {
        Vm {
            env,
            stack: Vec::new(),
            input_ports: vec![Handle::new(Port::Input(crate::port::InputPort::Stdin))],
            output_ports: vec![Handle::new(Port::Output(crate::port::OutputPort::Stdout))],
            exit_code: None,
            next_cont_id: 0,
        }
    }

    pub fn current_input(&self) -> Handle<Port> {
        self.input_ports.last().expect("input port stack is never empty").clone()
    }

    pub fn current_output(&self) -> Handle<Port> {
        self.output_ports.last().expect("output port stack is never empty").clone()
    }

    pub fn push_input(&mut self, port: Handle<Port>) {
        self.input_ports.push(port);
    }

    pub fn pop_input(&mut self) {
        if self.input_ports.len() > 1 {
            self.input_ports.pop();
        }
    }

    pub fn push_output(&mut self, port: Handle<Port>) {
        self.output_ports.push(port);
    }

    pub fn pop_output(&mut self) {
        if self.output_ports.len() > 1 {
            self.output_ports.pop();
        }
    }

    /// Run a top-level compiled program. `proc` must be
    /// [`ExecKind::Interpreted`] - the only kind `compile` ever produces at
    /// the top level.
    pub fn eval(&mut self, proc: Rc<Proc>) -> Result<Value> {
        let scope = match &proc.kind {
            ExecKind::Interpreted { captured_scope } => captured_scope.clone(),
            _ => return Err(Error::Fatal("top-level program must be interpreted".to_string())),
        };
        let mut frame = Frame {
            code: proc.code.clone(),
            pc: 0,
            scope,
        };
        match self.run(&mut frame) {
            Ok(value) => Ok(value),
            Err(Error::Escape { .. }) => Err(Error::Fatal(
                "a continuation was invoked outside the dynamic extent of its call/cc \
                 (this interpreter only supports escape-only continuations)"
                    .to_string(),
            )),
            Err(other) => Err(other),
        }
    }

    /// Apply `proc` to `args` directly, bypassing the compiled-instruction
    /// path. Used by builtins like `apply`, `map`, and `for-each` that need
    /// to invoke a first-class procedure value with a Rust-side argument
    /// list rather than operand-stack arguments already in place.
    pub fn apply(&mut self, proc_handle: &Handle<Proc>, args: Vec<Value>) -> Result<Value> {
        let proc = proc_handle.borrow().clone();
        let nargs = args.len();
        match proc.kind {
            ExecKind::Continuation { id, stack } => {
                let payload = args.into_iter().next().unwrap_or(Value::Empty);
                Err(Error::Escape {
                    id,
                    stack,
                    payload: Box::new(payload),
                })
            }
            ExecKind::Builtin(func) => {
                for value in args.into_iter().rev() {
                    self.stack.push(value);
                }
                func(self, nargs)?;
                Ok(self.stack.pop().unwrap_or(Value::Empty))
            }
            ExecKind::Interpreted { captured_scope } => {
                for value in args.into_iter().rev() {
                    self.stack.push(value);
                }
                let scope = Scope::child_of(&captured_scope);
                self.bind_formals(&proc.formals, &scope, nargs)?;
                let mut frame = Frame {
                    code: proc.code.clone(),
                    pc: 0,
                    scope,
                };
                self.run(&mut frame)
            }
        }
    }

    fn run(&mut self, frame: &mut Frame) -> Result<Value> {
        loop {
            if frame.pc >= frame.code.len() {
                return Ok(self.stack.pop().unwrap_or(Value::Empty));
            }
            let ins = frame.code[frame.pc].clone();
            frame.pc += 1;

            match ins {
                Ins::Imm(value) => self.stack.push(value),

                Ins::GetVar(value) => {
                    let (start, sym) = resolve_start(&frame.scope, &value)?;
                    let bound = Scope::get(&start, sym)
                        .ok_or_else(|| Error::unbound(self.env.symbols.name(sym)))?;
                    self.stack.push(bound);
                }

                Ins::Set(sym) => {
                    let value = self
                        .stack
                        .last()
                        .cloned()
                        .ok_or_else(|| Error::Fatal("operand stack underflow on set!".to_string()))?;
                    Scope::set(&frame.scope, sym, value);
                }

                Ins::Define(sym) => {
                    let value = self
                        .stack
                        .last()
                        .cloned()
                        .ok_or_else(|| Error::Fatal("operand stack underflow on define".to_string()))?;
                    if Scope::define(&frame.scope, sym, value) {
                        log::warn!("redefinition of `{}`", self.env.symbols.name(sym));
                    }
                }

                Ins::Lambda(template) => {
                    let closure = Proc {
                        formals: template.formals.clone(),
                        code: template.code.clone(),
                        macros: template.macros.clone(),
                        kind: ExecKind::Interpreted {
                            captured_scope: frame.scope.clone(),
                        },
                        name: template.name,
                    };
                    self.stack.push(Value::Procedure(Handle::new(closure)));
                }

                Ins::SaveScope => {
                    self.stack.push(Value::Scope(frame.scope.clone()));
                }

                Ins::If(arity) => {
                    let cond = self
                        .stack
                        .pop()
                        .ok_or_else(|| Error::Fatal("operand stack underflow on if".to_string()))?;
                    let then_branch = self
                        .stack
                        .pop()
                        .ok_or_else(|| Error::Fatal("operand stack underflow on if".to_string()))?;
                    let else_branch = if arity == 3 {
                        Some(self.stack.pop().ok_or_else(|| {
                            Error::Fatal("operand stack underflow on if".to_string())
                        })?)
                    } else {
                        None
                    };

                    let chosen = if cond.is_true() { Some(then_branch) } else { else_branch };
                    match chosen {
                        Some(branch) => {
                            let branch_proc = branch
                                .as_procedure()
                                .ok_or_else(|| Error::wrong_type("procedure", "if branch"))?
                                .borrow()
                                .clone();
                            match branch_proc.kind {
                                ExecKind::Interpreted { .. } => {
                                    frame.code = branch_proc.code;
                                    frame.pc = 0;
                                    // Scope is left untouched: branches run in the
                                    // enclosing procedure's own scope, not a fresh
                                    // child - they are not closures.
                                }
                                _ => {
                                    return Err(Error::Fatal(
                                        "if branch must be an interpreted thunk".to_string(),
                                    ))
                                }
                            }
                        }
                        None => self.stack.push(Value::Empty),
                    }
                }

                Ins::Call(n) => self.dispatch_call(frame, n)?,
            }
        }
    }

    fn dispatch_call(&mut self, frame: &mut Frame, n: i32) -> Result<()> {
        let callee = self
            .stack
            .pop()
            .ok_or_else(|| Error::Fatal("operand stack underflow on call".to_string()))?;
        let nargs = if n < 0 {
            match self.stack.pop() {
                Some(Value::Integer(count)) => count
                    .to_string()
                    .parse::<usize>()
                    .map_err(|_| Error::Type("negative argument count".to_string()))?,
                _ => return Err(Error::Type("expected an integer argument count".to_string())),
            }
        } else {
            n as usize
        };

        let proc_handle = callee
            .as_procedure()
            .cloned()
            .ok_or_else(|| Error::wrong_type("procedure", "call target"))?;
        let proc = proc_handle.borrow().clone();
        let is_tail = frame.pc >= frame.code.len();

        match proc.kind {
            ExecKind::Continuation { id, stack } => {
                let mut values = Vec::with_capacity(nargs);
                for _ in 0..nargs {
                    values.push(self.stack.pop().ok_or_else(|| {
                        Error::Fatal("operand stack underflow on call".to_string())
                    })?);
                }
                let payload = values.into_iter().next().unwrap_or(Value::Empty);
                Err(Error::Escape {
                    id,
                    stack,
                    payload: Box::new(payload),
                })
            }
            ExecKind::Builtin(func) => func(self, nargs),
            ExecKind::Interpreted { captured_scope } => {
                let scope = Scope::child_of(&captured_scope);
                self.bind_formals(&proc.formals, &scope, nargs)?;
                let code = proc.code.clone();
                if is_tail {
                    frame.code = code;
                    frame.pc = 0;
                    frame.scope = scope;
                    Ok(())
                } else {
                    let depth = self.stack.len();
                    let mut sub_frame = Frame { code, pc: 0, scope };
                    let result = self.run(&mut sub_frame)?;
                    self.stack.truncate(depth);
                    self.stack.push(result);
                    Ok(())
                }
            }
        }
    }

    fn bind_formals(&mut self, formals: &Formals, scope: &Handle<Scope>, nargs: usize) -> Result<()> {
        let underflow = || Error::Fatal("operand stack underflow binding arguments".to_string());
        match formals {
            Formals::Fixed(params) => {
                if params.len() != nargs {
                    return Err(Error::arity(params.len(), nargs));
                }
                for param in params {
                    let value = self.stack.pop().ok_or_else(underflow)?;
                    Scope::define(scope, *param, value);
                }
                Ok(())
            }
            Formals::Rest(params, rest) => {
                if nargs < params.len() {
                    return Err(Error::arity(format!("at least {}", params.len()), nargs));
                }
                for param in params {
                    let value = self.stack.pop().ok_or_else(underflow)?;
                    Scope::define(scope, *param, value);
                }
                let mut extra = Vec::with_capacity(nargs - params.len());
                for _ in params.len()..nargs {
                    extra.push(self.stack.pop().ok_or_else(underflow)?);
                }
                Scope::define(scope, *rest, vec_to_list(extra));
                Ok(())
            }
            Formals::Variadic(rest) => {
                let mut values = Vec::with_capacity(nargs);
                for _ in 0..nargs {
                    values.push(self.stack.pop().ok_or_else(underflow)?);
                }
                Scope::define(scope, *rest, vec_to_list(values));
                Ok(())
            }
        }
    }

    /// Used by `call/cc`: mint a fresh continuation id and snapshot the
    /// current operand stack.
    pub fn capture_continuation(&mut self) -> (u64, Vec<Value>) {
        let id = self.next_cont_id;
        self.next_cont_id += 1;
        (id, self.stack.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use num_bigint::BigInt;

    fn program(env: &Env, ins: Vec<Ins>) -> Rc<Proc> {
        Rc::new(Proc {
            formals: Formals::Fixed(vec![]),
            code: Rc::from(ins),
            macros: Handle::new(crate::macros::MacroTable::new()),
            kind: ExecKind::Interpreted {
                captured_scope: env.top.clone(),
            },
            name: None,
        })
    }

    #[test]
    fn test_imm_and_call_arithmetic_builtin() {
        let mut env = Env::new();
        let plus = env.intern("+");
        env.define_top(
            "+",
            Value::Procedure(Handle::new(Proc::builtin(plus, Formals::Variadic(plus), |vm, nargs| {
                let mut total = num_bigint::BigInt::from(0);
                for _ in 0..nargs {
                    if let Value::Integer(n) = vm.stack.pop().unwrap() {
                        total += n;
                    }
                }
                vm.stack.push(Value::Integer(total));
                Ok(())
            }))),
        );

        let code = vec![
            Ins::Imm(Value::Integer(BigInt::from(2))),
            Ins::Imm(Value::Integer(BigInt::from(3))),
            Ins::GetVar(Value::Symbol(plus)),
            Ins::Call(2),
        ];
        let mut vm = Vm::new(env);
        let result = vm.eval(program(&vm.env, code)).unwrap();
        assert!(matches!(result, Value::Integer(n) if n == BigInt::from(5)));
    }

    #[test]
    fn test_if_picks_then_branch_without_pushing_new_scope() {
        let env = Env::new();
        let then_proc = Rc::new(Proc {
            formals: Formals::Fixed(vec![]),
            code: Rc::from(vec![Ins::Imm(Value::Integer(BigInt::from(1)))]),
            macros: Handle::new(crate::macros::MacroTable::new()),
            kind: ExecKind::Interpreted {
                captured_scope: env.top.clone(),
            },
            name: None,
        });
        let else_proc = Rc::new(Proc {
            formals: Formals::Fixed(vec![]),
            code: Rc::from(vec![Ins::Imm(Value::Integer(BigInt::from(2)))]),
            macros: Handle::new(crate::macros::MacroTable::new()),
            kind: ExecKind::Interpreted {
                captured_scope: env.top.clone(),
            },
            name: None,
        });

        let code = vec![
            Ins::Imm(Value::Boolean(false)),
            Ins::Imm(Value::Procedure(Handle::new((*then_proc).clone()))),
            Ins::Imm(Value::Procedure(Handle::new((*else_proc).clone()))),
            Ins::If(3),
        ];
        let mut vm = Vm::new(env);
        let result = vm.eval(program(&vm.env, code)).unwrap();
        assert!(matches!(result, Value::Integer(n) if n == BigInt::from(2)));
    }

    #[test]
    fn test_define_then_getvar() {
        let mut env = Env::new();
        let sym = env.intern("x");
        let code = vec![
            Ins::Imm(Value::Integer(BigInt::from(42))),
            Ins::Define(sym),
            Ins::GetVar(Value::Symbol(sym)),
        ];
        let mut vm = Vm::new(env);
        let result = vm.eval(program(&vm.env, code)).unwrap();
        assert!(matches!(result, Value::Integer(n) if n == BigInt::from(42)));
    }

    #[test]
    fn test_set_on_unbound_creates_in_current_scope() {
        // (set! count 0) (set! count (+ count 1)) count - no prior `define`,
        // per spec.md §4.2/§8 property 6 and the `make-ctr` counter scenario.
        let mut env = Env::new();
        let count = env.intern("count");
        let code = vec![
            Ins::Imm(Value::Integer(BigInt::from(0))),
            Ins::Set(count),
            Ins::GetVar(Value::Symbol(count)),
        ];
        let mut vm = Vm::new(env);
        let result = vm.eval(program(&vm.env, code)).unwrap();
        assert!(matches!(result, Value::Integer(n) if n == BigInt::from(0)));
    }

    #[test]
    fn test_lambda_closes_over_defining_scope_counter() {
        // (define (make-ctr) (define n 0) (lambda () (set! n (+ n 1)) n))
        let mut env = Env::new();
        let n = env.intern("n");
        let plus = env.intern("+");
        env.define_top(
            "+",
            Value::Procedure(Handle::new(Proc::builtin(plus, Formals::Variadic(plus), |vm, nargs| {
                let mut total = num_bigint::BigInt::from(0);
                for _ in 0..nargs {
                    if let Value::Integer(v) = vm.stack.pop().unwrap() {
                        total += v;
                    }
                }
                vm.stack.push(Value::Integer(total));
                Ok(())
            }))),
        );

        let ctr_body = vec![
            Ins::GetVar(Value::Symbol(n)),
            Ins::Imm(Value::Integer(BigInt::from(1))),
            Ins::GetVar(Value::Symbol(plus)),
            Ins::Call(2),
            Ins::Set(n),
            Ins::GetVar(Value::Symbol(n)),
        ];
        let ctr_template = Rc::new(Proc {
            formals: Formals::Fixed(vec![]),
            code: Rc::from(ctr_body),
            macros: Handle::new(crate::macros::MacroTable::new()),
            kind: ExecKind::Interpreted {
                captured_scope: env.top.clone(),
            },
            name: None,
        });

        let make_ctr_body = vec![
            Ins::Imm(Value::Integer(BigInt::from(0))),
            Ins::Define(n),
            Ins::Lambda(ctr_template),
        ];
        let code = vec![Ins::Lambda(Rc::new(Proc {
            formals: Formals::Fixed(vec![]),
            code: Rc::from(make_ctr_body),
            macros: Handle::new(crate::macros::MacroTable::new()),
            kind: ExecKind::Interpreted {
                captured_scope: env.top.clone(),
            },
            name: None,
        }))];

        let mut vm = Vm::new(env);
        let make_ctr = vm.eval(program(&vm.env, code)).unwrap();
        let make_ctr_handle = make_ctr.as_procedure().unwrap().clone();
        let ctr = vm.apply(&make_ctr_handle, vec![]).unwrap();
        let ctr_handle = ctr.as_procedure().unwrap().clone();

        let first = vm.apply(&ctr_handle, vec![]).unwrap();
        let second = vm.apply(&ctr_handle, vec![]).unwrap();
        assert!(matches!(first, Value::Integer(v) if v == BigInt::from(1)));
        assert!(matches!(second, Value::Integer(v) if v == BigInt::from(2)));
    }
}
