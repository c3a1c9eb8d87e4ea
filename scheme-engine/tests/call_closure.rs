//! A procedure value returned from evaluation can be applied directly
//! through [`Vm::apply`], bypassing compiled call-site instructions - the
//! path `map`/`for-each`/`apply` all use internally.

use num_bigint::BigInt;
use scheme_engine::{Value, Vm};

#[test]
fn test_call_closure() {
    let source = include_str!("closure.scm");
    let mut env = scheme_engine::new_env().unwrap();
    let forms = scheme_engine::parse_all(source, &mut env).unwrap();
    let program = scheme_engine::compile_program(&mut env, &forms).unwrap();

    let mut vm = Vm::new(env);
    let fib = vm
        .eval(program)
        .expect("evaluating top-level fibonacci program")
        .as_procedure()
        .expect("fib did not evaluate to a procedure")
        .clone();

    let value = vm.apply(&fib, vec![Value::Integer(BigInt::from(8))]).unwrap();
    match value {
        Value::Integer(n) => assert_eq!(n, BigInt::from(21)),
        other => panic!("expected an integer, got {other:?}"),
    }
}
