use criterion::{black_box, criterion_group, criterion_main, Criterion};
use num_bigint::BigInt;
use scheme_engine::{Value, Vm};

fn fibonacci_benchmark(c: &mut Criterion) {
    let source = include_str!("fibonacci.scm");
    let mut env = scheme_engine::new_env().unwrap();
    let forms = scheme_engine::parse_all(source, &mut env).unwrap();
    let program = scheme_engine::compile_program(&mut env, &forms).unwrap();

    let mut vm = Vm::new(env);
    let fibonacci = vm.eval(program).unwrap().as_procedure().unwrap().clone();

    c.bench_function("fib 20", |b| {
        b.iter(|| {
            vm.apply(black_box(&fibonacci), black_box(vec![Value::Integer(BigInt::from(20))]))
        })
    });
}

criterion_group!(benches, fibonacci_benchmark);
criterion_main!(benches);
