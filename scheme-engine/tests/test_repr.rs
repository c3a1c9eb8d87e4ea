//! Tests for the external display representation of values (`display` vs
//! `write`: strings/characters are quoted under `write`, raw under
//! `display`).

use scheme_engine::{Repr, Vm};

fn eval(vm: &mut Vm, source: &str) -> scheme_engine::Value {
    let forms = scheme_engine::parse_all(source, &mut vm.env).expect("parse");
    let program = scheme_engine::compile_program(&mut vm.env, &forms).expect("compile");
    vm.eval(program).expect("eval")
}

#[test]
fn test_list_repr() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);

    let cases = [
        ("(list 1 2)", "(1 2)"),
        ("(list 1 2 3)", "(1 2 3)"),
        ("(cons 1 (cons 2 '()))", "(1 2)"),
        ("(cons 1 (cons 2 3))", "(1 2 . 3)"),
        ("#t", "#t"),
        ("#f", "#f"),
        ("'()", "()"),
        ("(/ 1 2)", "1/2"),
    ];

    for (source, expected) in cases {
        let value = eval(&mut vm, source);
        assert_eq!(Repr::display(&value, &vm.env.symbols).to_string(), expected);
    }
}

#[test]
fn test_write_quotes_strings_and_characters() {
    let env = scheme_engine::new_env().unwrap();
    let mut vm = Vm::new(env);

    let value = eval(&mut vm, r#""hello""#);
    assert_eq!(Repr::display(&value, &vm.env.symbols).to_string(), "hello");
    assert_eq!(Repr::write(&value, &vm.env.symbols).to_string(), "\"hello\"");
}
