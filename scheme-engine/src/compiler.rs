//! Compiler (spec.md §4.1): lowers one s-expression at a time into the
//! flat [`Ins`] sequence the VM runs. Special forms are recognized by
//! comparing the head symbol's id against the fixed reserved constants in
//! [`crate::symbol::SymbolId`] - an identity check, never a string
//! compare. Anything else whose head names a registered macro is expanded
//! and recompiled; everything left over is an ordinary application.

use std::rc::Rc;

use crate::env::Env;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::macros::{self, MacroTable};
use crate::opcode::Ins;
use crate::symbol::SymbolId;
use crate::utils::list_to_vec;
use crate::value::{ExecKind, Formals, Proc, Value};

/// Compile a single top-level form into a zero-argument program.
pub fn compile(env: &mut Env, expr: &Value) -> Result<Rc<Proc>> {
    compile_program(env, std::slice::from_ref(expr))
}

/// Compile a whole sequence of top-level forms (a file, or everything read
/// so far in a REPL session) into one program. Only the last form's value
/// survives to the caller; the rest run purely for effect (spec.md §4.1
/// "sequence semantics").
pub fn compile_program(env: &mut Env, forms: &[Value]) -> Result<Rc<Proc>> {
    let macros = env.top_macros.clone();
    let code = compile_body(env, &macros, forms)?;
    Ok(Rc::new(Proc {
        formals: Formals::Fixed(vec![]),
        code: Rc::from(code),
        macros,
        kind: ExecKind::Interpreted {
            captured_scope: env.top.clone(),
        },
        name: None,
    }))
}

fn compile_body(env: &mut Env, macros: &Handle<MacroTable>, body: &[Value]) -> Result<Vec<Ins>> {
    let mut code = Vec::new();
    if body.is_empty() {
        code.push(Ins::Imm(Value::Empty));
        return Ok(code);
    }
    for expr in body {
        compile_expr(env, macros, expr, &mut code)?;
    }
    Ok(code)
}

fn compile_expr(env: &mut Env, macros: &Handle<MacroTable>, expr: &Value, code: &mut Vec<Ins>) -> Result<()> {
    match expr {
        Value::Symbol(_) | Value::Scoped(_, _) => {
            code.push(Ins::GetVar(expr.clone()));
            Ok(())
        }
        Value::Pair(_) => compile_form(env, macros, expr, code),
        self_evaluating => {
            code.push(Ins::Imm(self_evaluating.clone()));
            Ok(())
        }
    }
}

fn compile_form(env: &mut Env, macros: &Handle<MacroTable>, expr: &Value, code: &mut Vec<Ins>) -> Result<()> {
    let pair = expr.as_pair().expect("compile_form only called on a pair");
    let (head, rest) = {
        let p = pair.borrow();
        (p.car.clone(), p.cdr.clone())
    };

    if let Some(sym) = head.as_symbol() {
        match sym {
            SymbolId::QUOTE => return compile_quote(&rest, code),
            SymbolId::IF => return compile_if(env, macros, &rest, code),
            SymbolId::LAMBDA => return compile_lambda_form(env, macros, &rest, code),
            SymbolId::SET => return compile_set(env, macros, &rest, code),
            SymbolId::DEFINE => return compile_define(env, macros, &rest, code),
            SymbolId::DEFINE_SYNTAX => {
                let name = compile_define_syntax(env, macros, &rest)?;
                code.push(Ins::SaveScope);
                code.push(Ins::Set(name));
                return Ok(());
            }
            SymbolId::SAVE_SCOPE => {
                code.push(Ins::SaveScope);
                return Ok(());
            }
            _ => {}
        }

        // Not a reserved form. Registered macros expand purely at compile
        // time, against the definition's own top-level scope (spec.md §9 -
        // `top_macros` is the single table every procedure inherits by
        // reference, so all macros are effectively defined at the top
        // level and `env.top` is always the right hygiene anchor).
        let expansion = {
            let table = macros.borrow();
            if table.get(sym).is_some() {
                Some(macros::expand(&table, sym, expr, &env.top.clone())?)
            } else {
                None
            }
        };
        if let Some(expanded) = expansion {
            return compile_expr(env, macros, &expanded, code);
        }
    }

    compile_application(env, macros, &head, &rest, code)
}

fn compile_quote(rest: &Value, code: &mut Vec<Ins>) -> Result<()> {
    let items = list_to_vec(rest)?;
    if items.len() != 1 {
        return Err(Error::Compile("quote takes exactly one datum".to_string()));
    }
    code.push(Ins::Imm(items.into_iter().next().unwrap()));
    Ok(())
}

/// Compiles `cond`'s branches as nested zero-argument thunks, pushed
/// before the condition so that by the time `Ins::If` runs, the condition
/// is on top of the stack with the chosen branch(es) underneath
/// (spec.md §4.2).
fn compile_if(env: &mut Env, macros: &Handle<MacroTable>, rest: &Value, code: &mut Vec<Ins>) -> Result<()> {
    let items = list_to_vec(rest)?;
    if items.len() != 2 && items.len() != 3 {
        return Err(Error::Compile(
            "if takes a condition and one or two branches".to_string(),
        ));
    }

    let then_proc = compile_thunk(env, macros, &items[1])?;
    code.push(Ins::Lambda(then_proc));

    if items.len() == 3 {
        let else_proc = compile_thunk(env, macros, &items[2])?;
        code.push(Ins::Lambda(else_proc));
    }

    compile_expr(env, macros, &items[0], code)?;
    code.push(Ins::If(if items.len() == 3 { 3 } else { 2 }));
    Ok(())
}

/// A nested, argument-less procedure whose body is a single expression -
/// used for `if` branches. Its `captured_scope` placeholder is never
/// consulted: the VM's `If` handler splices the branch's code into the
/// *current* frame without touching the scope, since branches aren't
/// closures, just alternate instruction blocks of the enclosing procedure.
fn compile_thunk(env: &mut Env, macros: &Handle<MacroTable>, expr: &Value) -> Result<Rc<Proc>> {
    let code = compile_body(env, macros, std::slice::from_ref(expr))?;
    Ok(Rc::new(Proc {
        formals: Formals::Fixed(vec![]),
        code: Rc::from(code),
        macros: macros.clone(),
        kind: ExecKind::Interpreted {
            captured_scope: env.top.clone(),
        },
        name: None,
    }))
}

fn compile_lambda_form(env: &mut Env, macros: &Handle<MacroTable>, rest: &Value, code: &mut Vec<Ins>) -> Result<()> {
    let items = list_to_vec(rest)?;
    let (formals_form, body) = items
        .split_first()
        .ok_or_else(|| Error::Compile("lambda requires a formals list".to_string()))?;
    let proc = compile_lambda(env, macros, formals_form, body, None)?;
    code.push(Ins::Lambda(proc));
    Ok(())
}

/// Shared by `lambda` and the procedure-definition shorthand of `define`.
/// `captured_scope` in the returned template is a placeholder: the `Lambda`
/// instruction that later runs this template always replaces it with
/// whatever scope is live at that moment (spec.md §4.2).
fn compile_lambda(
    env: &mut Env,
    macros: &Handle<MacroTable>,
    formals_form: &Value,
    body: &[Value],
    name: Option<SymbolId>,
) -> Result<Rc<Proc>> {
    let formals = parse_formals(formals_form)?;
    let code = compile_body(env, macros, body)?;
    Ok(Rc::new(Proc {
        formals,
        code: Rc::from(code),
        macros: macros.clone(),
        kind: ExecKind::Interpreted {
            captured_scope: env.top.clone(),
        },
        name,
    }))
}

/// Parses a formals specification: `(a b)` fixed, `(a b . rest)` fixed
/// plus rest, `rest` fully variadic, `()` no parameters (spec.md §3).
fn parse_formals(form: &Value) -> Result<Formals> {
    match form {
        Value::Symbol(sym) => Ok(Formals::Variadic(*sym)),
        Value::Empty => Ok(Formals::Fixed(Vec::new())),
        Value::Pair(_) => {
            let mut fixed = Vec::new();
            let mut cur = form.clone();
            loop {
                match cur {
                    Value::Pair(pair) => {
                        let (car, cdr) = {
                            let p = pair.borrow();
                            (p.car.clone(), p.cdr.clone())
                        };
                        let sym = car
                            .as_symbol()
                            .ok_or_else(|| Error::Compile("formal parameter must be a symbol".to_string()))?;
                        fixed.push(sym);
                        cur = cdr;
                    }
                    Value::Empty => return Ok(Formals::Fixed(fixed)),
                    Value::Symbol(rest) => return Ok(Formals::Rest(fixed, rest)),
                    _ => return Err(Error::Compile("improper formals list".to_string())),
                }
            }
        }
        _ => Err(Error::Compile("invalid formals specification".to_string())),
    }
}

fn compile_set(env: &mut Env, macros: &Handle<MacroTable>, rest: &Value, code: &mut Vec<Ins>) -> Result<()> {
    let items = list_to_vec(rest)?;
    if items.len() != 2 {
        return Err(Error::Compile("set! takes a name and a value".to_string()));
    }
    let sym = items[0]
        .as_symbol()
        .ok_or_else(|| Error::Compile("set! target must be a symbol".to_string()))?;
    compile_expr(env, macros, &items[1], code)?;
    code.push(Ins::Set(sym));
    Ok(())
}

/// Both `(define name expr)` and `(define (name . formals) body...)`
/// (spec.md §3 Procedure, §4.1).
fn compile_define(env: &mut Env, macros: &Handle<MacroTable>, rest: &Value, code: &mut Vec<Ins>) -> Result<()> {
    let items = list_to_vec(rest)?;
    let (head, body) = items
        .split_first()
        .ok_or_else(|| Error::Compile("define requires at least a name".to_string()))?;

    match head {
        Value::Pair(header) => {
            let (name_val, formals_form) = {
                let p = header.borrow();
                (p.car.clone(), p.cdr.clone())
            };
            let name = name_val
                .as_symbol()
                .ok_or_else(|| Error::Compile("procedure name must be a symbol".to_string()))?;
            if body.is_empty() {
                return Err(Error::Compile("define requires a procedure body".to_string()));
            }
            let proc = compile_lambda(env, macros, &formals_form, body, Some(name))?;
            code.push(Ins::Lambda(proc));
            code.push(Ins::Define(name));
            Ok(())
        }
        Value::Symbol(name) => {
            if body.len() != 1 {
                return Err(Error::Compile("define requires exactly one value expression".to_string()));
            }
            compile_expr(env, macros, &body[0], code)?;
            code.push(Ins::Define(*name));
            Ok(())
        }
        _ => Err(Error::Compile(
            "define target must be a symbol or a procedure header".to_string(),
        )),
    }
}

/// `(define-syntax name (syntax-rules (lits...) (pattern template)...))`.
/// Parses and registers the transformer for compile-time expansion, and
/// returns `name` so the caller can bind it to the definition-site scope
/// (spec.md §4.1).
fn compile_define_syntax(env: &mut Env, macros: &Handle<MacroTable>, rest: &Value) -> Result<SymbolId> {
    let items = list_to_vec(rest)?;
    if items.len() != 2 {
        return Err(Error::Compile(
            "define-syntax takes a name and a syntax-rules form".to_string(),
        ));
    }
    let name = items[0]
        .as_symbol()
        .ok_or_else(|| Error::Compile("define-syntax target must be a symbol".to_string()))?;

    let syntax_rules_sym = env.intern("syntax-rules");
    let rules_pair = items[1]
        .as_pair()
        .ok_or_else(|| Error::Compile("expected a syntax-rules form".to_string()))?;
    let (keyword, rules_rest) = {
        let p = rules_pair.borrow();
        (p.car.clone(), p.cdr.clone())
    };
    if keyword.as_symbol() != Some(syntax_rules_sym) {
        return Err(Error::Compile(
            "define-syntax expects a syntax-rules transformer".to_string(),
        ));
    }

    let rules = macros::parse_syntax_rules(&rules_rest)?;
    if macros.borrow_mut().define(name, rules) {
        log::warn!("redefinition of macro `{}`", env.symbols.name(name));
    }
    Ok(name)
}

/// Arguments compile in reverse order (last argument first), then the
/// callee, so that by the time `Ins::Call` runs, argument 0 is the
/// topmost operand below the callee (spec.md §4.2, §4.5).
fn compile_application(
    env: &mut Env,
    macros: &Handle<MacroTable>,
    head: &Value,
    rest: &Value,
    code: &mut Vec<Ins>,
) -> Result<()> {
    let args = list_to_vec(rest)?;
    for arg in args.iter().rev() {
        compile_expr(env, macros, arg, code)?;
    }
    compile_expr(env, macros, head, code)?;
    let nargs = i32::try_from(args.len()).map_err(|_| Error::Compile("too many arguments".to_string()))?;
    code.push(Ins::Call(nargs));
    Ok(())
}
