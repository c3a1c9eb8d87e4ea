//! Tests for the numeric tower (exact integers and rationals).

use num_bigint::BigInt;
use scheme_engine::{Value, Vm};

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
fn test_add() {
    let env = scheme_engine::new_env().expect("init core");
    let mut vm = Vm::new(env);
    assert_eq!(as_int(&eval(&mut vm, "(+ 1 2 3)")), BigInt::from(6));
}

#[test]
fn test_rational_promotion_and_normalization() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);

    // A rational that reduces to an integer normalizes back down.
    assert_eq!(as_int(&eval(&mut vm, "(+ (/ 1 2) (/ 1 2))")), BigInt::from(1));
    assert!(matches!(eval(&mut vm, "(/ 1 2)"), Value::Rational(_)));
}

#[test]
fn test_comparisons_chain() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);
    assert!(matches!(eval(&mut vm, "(< 1 2 3)"), Value::Boolean(true)));
    assert!(matches!(eval(&mut vm, "(< 1 3 2)"), Value::Boolean(false)));
    assert!(matches!(eval(&mut vm, "(= 2 2 2)"), Value::Boolean(true)));
}

#[test]
fn test_quotient_remainder_modulo() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);
    assert_eq!(as_int(&eval(&mut vm, "(quotient 7 2)")), BigInt::from(3));
    assert_eq!(as_int(&eval(&mut vm, "(remainder 7 2)")), BigInt::from(1));
    assert_eq!(as_int(&eval(&mut vm, "(modulo -7 2)")), BigInt::from(1));
}

#[test]
fn test_predicates() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);
    assert!(matches!(eval(&mut vm, "(zero? 0)"), Value::Boolean(true)));
    assert!(matches!(eval(&mut vm, "(negative? -1)"), Value::Boolean(true)));
    assert!(matches!(eval(&mut vm, "(odd? 3)"), Value::Boolean(true)));
    assert!(matches!(eval(&mut vm, "(even? 4)"), Value::Boolean(true)));
}
