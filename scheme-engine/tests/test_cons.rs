//! Tests for pairs (`cons`/`car`/`cdr`/`list`).

use scheme_engine::{Repr, Value, Vm};

fn eval(vm: &mut Vm, source: &str) -> Value {
    let forms = scheme_engine::parse_all(source, &mut vm.env).expect("parse");
    let program = scheme_engine::compile_program(&mut vm.env, &forms).expect("compile");
    vm.eval(program).expect("eval")
}

fn display(vm: &Vm, value: &Value) -> String {
    Repr::display(value, &vm.env.symbols).to_string()
}

#[test]
fn test_cons_pair() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);

    let value = eval(&mut vm, "(cons 1 2)");
    assert_eq!(display(&vm, &value), "(1 . 2)");

    assert!(matches!(eval(&mut vm, "(pair? (cons 1 2))"), Value::Boolean(true)));
    assert!(matches!(eval(&mut vm, "(car (cons 1 2))"), Value::Integer(n) if n == 1.into()));
    assert!(matches!(eval(&mut vm, "(cdr (cons 1 2))"), Value::Integer(n) if n == 2.into()));
}

#[test]
fn test_make_list() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);

    let value = eval(&mut vm, "(cons 1 (cons 2 '()))");
    assert_eq!(display(&vm, &value), "(1 2)");

    let value = eval(&mut vm, "(list 1 2)");
    assert_eq!(display(&vm, &value), "(1 2)");

    let value = eval(&mut vm, "(cons 1 (cons 2 3))");
    assert_eq!(display(&vm, &value), "(1 2 . 3)");
}

#[test]
fn test_make_list_from_vec() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);

    assert_eq!(display(&vm, &eval(&mut vm, "(list 1 2)")), "(1 2)");
    assert_eq!(display(&vm, &eval(&mut vm, "(list 1 2 3)")), "(1 2 3)");
    assert!(matches!(eval(&mut vm, "(null? (list))"), Value::Boolean(true)));
    assert!(matches!(eval(&mut vm, "(list? (list 1 2 3))"), Value::Boolean(true)));
    assert!(matches!(eval(&mut vm, "(= (length (list 1 2 3)) 3)"), Value::Boolean(true)));
}
