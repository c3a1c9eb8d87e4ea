//! Control-flow builtins and prelude macros exercised end to end: `call/cc`,
//! `dynamic-wind`, multiple values, `apply`/`map`/`for-each`, and the
//! library forms layered on top of them (spec.md §8).

use num_bigint::BigInt;
use scheme_engine::{Repr, Value, Vm};

fn eval(vm: &mut Vm, source: &str) -> Value {
    let forms = scheme_engine::parse_all(source, &mut vm.env).expect("parse");
    let program = scheme_engine::compile_program(&mut vm.env, &forms).expect("compile");
    vm.eval(program).expect("eval")
}

fn as_int(value: &Value) -> BigInt {
    match value {
        Value::Integer(n) => n.clone(),
        other => panic!("expected an integer, got {other:?}"),
    }
}

#[test]
fn test_call_cc_escape() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);

    // An escape from deep inside a computation short-circuits the rest.
    let value = eval(
        &mut vm,
        "(+ 1 (call/cc (lambda (k) (+ 2 (k 10) 100))))",
    );
    assert_eq!(as_int(&value), BigInt::from(11));
}

#[test]
fn test_call_cc_returns_normally_without_invoking_continuation() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);

    let value = eval(&mut vm, "(+ 1 (call/cc (lambda (k) 41)))");
    assert_eq!(as_int(&value), BigInt::from(42));
}

#[test]
fn test_dynamic_wind_skips_after_on_escape() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);

    // A continuation invoked inside `thunk` unwinds past `dynamic-wind`
    // without resuming it, so `after` is never reached (spec.md §4.5).
    let value = eval(
        &mut vm,
        "(let ((trace '()))
           (call/cc (lambda (k)
             (dynamic-wind
               (lambda () (set! trace (cons 'before trace)))
               (lambda () (k 'escaped))
               (lambda () (set! trace (cons 'after trace))))))
           (reverse trace))",
    );
    assert_eq!(
        Repr::display(&value, &vm.env.symbols).to_string(),
        "(before)"
    );
}

#[test]
fn test_values_and_call_with_values() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);

    let value = eval(
        &mut vm,
        "(call-with-values (lambda () (values 1 2 3)) (lambda (a b c) (+ a b c)))",
    );
    assert_eq!(as_int(&value), BigInt::from(6));
}

#[test]
fn test_apply_and_map() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);

    assert_eq!(as_int(&eval(&mut vm, "(apply + 1 2 '(3 4))")), BigInt::from(10));

    let value = eval(&mut vm, "(map (lambda (x) (* x x)) '(1 2 3))");
    assert_eq!(Repr::display(&value, &vm.env.symbols).to_string(), "(1 4 9)");

    let value = eval(&mut vm, "(map + '(1 2 3) '(10 20 30))");
    assert_eq!(Repr::display(&value, &vm.env.symbols).to_string(), "(11 22 33)");
}

#[test]
fn test_eval_with_null_environment() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);

    // A quoted `+` application evaluated against a null environment has no
    // binding for `+` and so fails, unlike the default top-level scope.
    let err = scheme_engine::parse_all("(eval '(+ 1 2) (null-environment 5))", &mut vm.env)
        .and_then(|forms| scheme_engine::compile_program(&mut vm.env, &forms))
        .and_then(|program| vm.eval(program));
    assert!(err.is_err());

    let value = eval(&mut vm, "(eval '(+ 1 2) (scheme-report-environment 5))");
    assert_eq!(as_int(&value), BigInt::from(3));
}

#[test]
fn test_prelude_let_forms_and_case_lambda() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);

    assert_eq!(as_int(&eval(&mut vm, "(let ((a 1) (b 2)) (+ a b))")), BigInt::from(3));
    assert_eq!(
        as_int(&eval(&mut vm, "(let* ((a 1) (b (+ a 1))) (+ a b))")),
        BigInt::from(3)
    );
    assert_eq!(
        as_int(&eval(&mut vm, "(letrec ((even? (lambda (n) (if (= n 0) #t (odd? (- n 1)))))
                                        (odd? (lambda (n) (if (= n 0) #f (even? (- n 1))))))
                                 (if (even? 10) 1 0))")),
        BigInt::from(1)
    );

    let value = eval(
        &mut vm,
        "(define f (case-lambda
                      ((x) (list 'one x))
                      ((x y) (list 'two x y))
                      (rest rest)))
         (list (f 1) (f 1 2) (f 1 2 3))",
    );
    assert_eq!(
        Repr::display(&value, &vm.env.symbols).to_string(),
        "((one 1) (two 1 2) (1 2 3))"
    );
}

#[test]
fn test_filter_and_folds() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);

    let value = eval(&mut vm, "(filter odd? '(1 2 3 4 5))");
    assert_eq!(Repr::display(&value, &vm.env.symbols).to_string(), "(1 3 5)");

    assert_eq!(as_int(&eval(&mut vm, "(fold-left + 0 '(1 2 3 4))")), BigInt::from(10));
    assert_eq!(as_int(&eval(&mut vm, "(fold-right - 0 '(1 2 3 4))")), BigInt::from(-2));
}
