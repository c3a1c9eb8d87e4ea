//! A lambda call works as expected, and its locals don't leak into the
//! top-level scope.

use num_bigint::BigInt;
use scheme_engine::error::Error;
use scheme_engine::{Value, Vm};

fn run(vm: &mut Vm, source: &str) -> Result<Value, Error> {
    let forms = scheme_engine::parse_all(source, &mut vm.env)?;
    let program = scheme_engine::compile_program(&mut vm.env, &forms)?;
    vm.eval(program)
}

#[test]
fn test_lambda_call() {
    let env = scheme_engine::new_env().expect("create core environment");
    let mut vm = Vm::new(env);

    let value = run(
        &mut vm,
        "(define add-self (lambda (x) (+ x x))) (add-self 7)",
    )
    .expect("evaluation");
    match value {
        Value::Integer(n) => assert_eq!(n, BigInt::from(14)),
        other => panic!("expected an integer, got {other:?}"),
    }

    match run(&mut vm, "x") {
        Err(Error::Unbound(_)) => {}
        other => panic!("lambda local leaked to top-level scope: {other:?}"),
    }
}
