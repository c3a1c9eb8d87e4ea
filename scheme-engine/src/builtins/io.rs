//! Port and I/O builtins (spec.md §3, §4.6), routed through the current
//! input/output port stacks (`crate::port`) rather than stdio directly.

use crate::env::Env;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::port::Port;
use crate::repr::Repr;
use crate::value::Value;
use crate::vm::Vm;

use super::{def, pop_n};

fn expect_string(value: &Value) -> Result<Handle<String>> {
    match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(Error::wrong_type("string", "a non-string value")),
    }
}

fn expect_port(value: &Value) -> Result<Handle<Port>> {
    match value {
        Value::Port(p) => Ok(p.clone()),
        _ => Err(Error::wrong_type("port", "a non-port value")),
    }
}

fn output_target(vm: &Vm, args: &[Value], at: usize) -> Result<Handle<Port>> {
    match args.get(at) {
        Some(value) => expect_port(value),
        None => Ok(vm.current_output()),
    }
}

fn input_target(vm: &Vm, args: &[Value], at: usize) -> Result<Handle<Port>> {
    match args.get(at) {
        Some(value) => expect_port(value),
        None => Ok(vm.current_input()),
    }
}

pub fn install(env: &mut Env) {
    def(env, "display", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.is_empty() || args.len() > 2 {
            return Err(Error::arity("1 or 2", args.len()));
        }
        let text = Repr::display(&args[0], &vm.env.symbols).to_string();
        let port = output_target(vm, &args, 1)?;
        port.borrow_mut().write_str(&text)?;
        vm.stack.push(Value::Empty);
        Ok(())
    });

    def(env, "write", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.is_empty() || args.len() > 2 {
            return Err(Error::arity("1 or 2", args.len()));
        }
        let text = Repr::write(&args[0], &vm.env.symbols).to_string();
        let port = output_target(vm, &args, 1)?;
        port.borrow_mut().write_str(&text)?;
        vm.stack.push(Value::Empty);
        Ok(())
    });

    def(env, "newline", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() > 1 {
            return Err(Error::arity("0 or 1", args.len()));
        }
        let port = output_target(vm, &args, 0)?;
        port.borrow_mut().write_str("\n")?;
        vm.stack.push(Value::Empty);
        Ok(())
    });

    def(env, "read-line", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() > 1 {
            return Err(Error::arity("0 or 1", args.len()));
        }
        let port = input_target(vm, &args, 0)?;
        let line = port.borrow_mut().read_line()?;
        vm.stack.push(match line {
            Some(line) => Value::string(line),
            None => Value::Boolean(false),
        });
        Ok(())
    });

    def(env, "read-char", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() > 1 {
            return Err(Error::arity("0 or 1", args.len()));
        }
        let port = input_target(vm, &args, 0)?;
        let ch = port.borrow_mut().read_char()?;
        vm.stack.push(match ch {
            Some(ch) => Value::Character(ch),
            None => Value::Boolean(false),
        });
        Ok(())
    });

    def(env, "open-input-file", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let path = expect_string(&args[0])?;
        let path = path.borrow().clone();
        vm.stack.push(Value::Port(Handle::new(Port::open_input_file(&path)?)));
        Ok(())
    });

    def(env, "open-output-file", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let path = expect_string(&args[0])?;
        let path = path.borrow().clone();
        vm.stack.push(Value::Port(Handle::new(Port::open_output_file(&path)?)));
        Ok(())
    });

    def(env, "open-input-string", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let s = expect_string(&args[0])?;
        let contents = s.borrow().clone();
        vm.stack.push(Value::Port(Handle::new(Port::input_string(contents))));
        Ok(())
    });

    def(env, "open-output-string", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if !args.is_empty() {
            return Err(Error::arity(0, args.len()));
        }
        vm.stack.push(Value::Port(Handle::new(Port::output_string())));
        Ok(())
    });

    def(env, "get-output-string", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let port = expect_port(&args[0])?;
        let text = port.borrow().take_output_string()?;
        vm.stack.push(Value::string(text));
        Ok(())
    });

    def(env, "close-port", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        expect_port(&args[0])?.borrow_mut().close();
        vm.stack.push(Value::Empty);
        Ok(())
    });

    def(env, "close-input-port", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        expect_port(&args[0])?.borrow_mut().close();
        vm.stack.push(Value::Empty);
        Ok(())
    });

    def(env, "close-output-port", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        expect_port(&args[0])?.borrow_mut().close();
        vm.stack.push(Value::Empty);
        Ok(())
    });

    def(env, "input-port?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let is_input = matches!(&args[0], Value::Port(p) if p.borrow().is_input());
        vm.stack.push(Value::Boolean(is_input));
        Ok(())
    });

    def(env, "output-port?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let is_output = matches!(&args[0], Value::Port(p) if p.borrow().is_output());
        vm.stack.push(Value::Boolean(is_output));
        Ok(())
    });
}
