//! String, character and vector builtins (spec.md §3), grounded in the
//! reference interpreter's `misc_builtins.go` string/char procedures.

use crate::env::Env;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::symbol::SymbolId;
use crate::value::Value;
use crate::vm::Vm;

use super::{def, pop_n};

fn expect_string(value: &Value) -> Result<Handle<String>> {
    match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(Error::wrong_type("string", "a non-string value")),
    }
}

fn expect_char(value: &Value) -> Result<char> {
    match value {
        Value::Character(c) => Ok(*c),
        _ => Err(Error::wrong_type("character", "a non-character value")),
    }
}

fn expect_vector(value: &Value) -> Result<Handle<Vec<Value>>> {
    match value {
        Value::Vector(v) => Ok(v.clone()),
        _ => Err(Error::wrong_type("vector", "a non-vector value")),
    }
}

fn expect_index(value: &Value) -> Result<usize> {
    match value {
        Value::Integer(n) => n.to_string().parse::<usize>().map_err(|_| Error::Type("negative index".to_string())),
        _ => Err(Error::wrong_type("integer", "a non-integer index")),
    }
}

fn expect_symbol(value: &Value) -> Result<SymbolId> {
    value.as_symbol().ok_or_else(|| Error::wrong_type("symbol", "a non-symbol value"))
}

pub fn install(env: &mut Env) {
    def(env, "string-length", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let s = expect_string(&args[0])?;
        vm.stack.push(Value::integer(s.borrow().chars().count() as i64));
        Ok(())
    });

    def(env, "string-ref", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 2 {
            return Err(Error::arity(2, args.len()));
        }
        let s = expect_string(&args[0])?;
        let k = expect_index(&args[1])?;
        let ch = s
            .borrow()
            .chars()
            .nth(k)
            .ok_or_else(|| Error::Type("index out of range".to_string()))?;
        vm.stack.push(Value::Character(ch));
        Ok(())
    });

    def(env, "string-append", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        let mut out = String::new();
        for arg in &args {
            out.push_str(&expect_string(arg)?.borrow());
        }
        vm.stack.push(Value::string(out));
        Ok(())
    });

    def(env, "substring", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 3 {
            return Err(Error::arity(3, args.len()));
        }
        let s = expect_string(&args[0])?;
        let (start, end) = (expect_index(&args[1])?, expect_index(&args[2])?);
        let chars: Vec<char> = s.borrow().chars().collect();
        if start > end || end > chars.len() {
            return Err(Error::Type("index out of range".to_string()));
        }
        vm.stack.push(Value::string(chars[start..end].iter().collect::<String>()));
        Ok(())
    });

    def(env, "string->list", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let s = expect_string(&args[0])?;
        let items = s.borrow().chars().map(Value::Character).collect();
        vm.stack.push(crate::utils::vec_to_list(items));
        Ok(())
    });

    def(env, "list->string", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let items = crate::utils::list_to_vec(&args[0])?;
        let mut out = String::new();
        for item in items {
            out.push(expect_char(&item)?);
        }
        vm.stack.push(Value::string(out));
        Ok(())
    });

    def(env, "make-string", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.is_empty() || args.len() > 2 {
            return Err(Error::arity("1 or 2", args.len()));
        }
        let k = expect_index(&args[0])?;
        let fill = if args.len() == 2 { expect_char(&args[1])? } else { ' ' };
        vm.stack.push(Value::string(std::iter::repeat(fill).take(k).collect::<String>()));
        Ok(())
    });

    def(env, "string-set!", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 3 {
            return Err(Error::arity(3, args.len()));
        }
        let handle = expect_string(&args[0])?;
        let k = expect_index(&args[1])?;
        let ch = expect_char(&args[2])?;
        let mut chars: Vec<char> = handle.borrow().chars().collect();
        if k >= chars.len() {
            return Err(Error::Type("index out of range".to_string()));
        }
        chars[k] = ch;
        *handle.borrow_mut() = chars.into_iter().collect();
        vm.stack.push(Value::Empty);
        Ok(())
    });

    def(env, "string->symbol", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let s = expect_string(&args[0])?;
        let text = s.borrow().clone();
        vm.stack.push(Value::Symbol(vm.env.intern(&text)));
        Ok(())
    });

    def(env, "symbol->string", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let sym = expect_symbol(&args[0])?;
        let name = vm.env.symbols.name(sym).to_string();
        vm.stack.push(Value::string(name));
        Ok(())
    });

    def(env, "string=?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(string_chain(&args, |a, b| a == b)?));
        Ok(())
    });

    def(env, "string<?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(string_chain(&args, |a, b| a < b)?));
        Ok(())
    });

    def(env, "string>?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(string_chain(&args, |a, b| a > b)?));
        Ok(())
    });

    def(env, "char->integer", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        vm.stack.push(Value::integer(expect_char(&args[0])? as i64));
        Ok(())
    });

    def(env, "integer->char", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let n = expect_index(&args[0])? as u32;
        let ch = char::from_u32(n).ok_or_else(|| Error::Type("not a valid character code".to_string()))?;
        vm.stack.push(Value::Character(ch));
        Ok(())
    });

    def(env, "char=?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(char_chain(&args, |a, b| a == b)?));
        Ok(())
    });

    def(env, "char<?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(char_chain(&args, |a, b| a < b)?));
        Ok(())
    });

    def(env, "char>?", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Boolean(char_chain(&args, |a, b| a > b)?));
        Ok(())
    });

    def(env, "char-upcase", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        vm.stack.push(Value::Character(expect_char(&args[0])?.to_ascii_uppercase()));
        Ok(())
    });

    def(env, "char-downcase", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        vm.stack.push(Value::Character(expect_char(&args[0])?.to_ascii_lowercase()));
        Ok(())
    });

    def(env, "make-vector", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.is_empty() || args.len() > 2 {
            return Err(Error::arity("1 or 2", args.len()));
        }
        let k = expect_index(&args[0])?;
        let fill = args.get(1).cloned().unwrap_or(Value::Boolean(false));
        vm.stack.push(Value::Vector(Handle::new(vec![fill; k])));
        Ok(())
    });

    def(env, "vector", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        vm.stack.push(Value::Vector(Handle::new(args)));
        Ok(())
    });

    def(env, "vector-ref", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 2 {
            return Err(Error::arity(2, args.len()));
        }
        let v = expect_vector(&args[0])?;
        let k = expect_index(&args[1])?;
        let item = v.borrow().get(k).cloned().ok_or_else(|| Error::Type("index out of range".to_string()))?;
        vm.stack.push(item);
        Ok(())
    });

    def(env, "vector-set!", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 3 {
            return Err(Error::arity(3, args.len()));
        }
        let v = expect_vector(&args[0])?;
        let k = expect_index(&args[1])?;
        let mut v = v.borrow_mut();
        if k >= v.len() {
            return Err(Error::Type("index out of range".to_string()));
        }
        v[k] = args[2].clone();
        vm.stack.push(Value::Empty);
        Ok(())
    });

    def(env, "vector-length", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let v = expect_vector(&args[0])?;
        let len = v.borrow().len();
        vm.stack.push(Value::integer(len as i64));
        Ok(())
    });

    def(env, "vector->list", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let v = expect_vector(&args[0])?;
        let items = v.borrow().clone();
        vm.stack.push(crate::utils::vec_to_list(items));
        Ok(())
    });

    def(env, "list->vector", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 1 {
            return Err(Error::arity(1, args.len()));
        }
        let items = crate::utils::list_to_vec(&args[0])?;
        vm.stack.push(Value::Vector(Handle::new(items)));
        Ok(())
    });

    def(env, "vector-fill!", |vm, nargs| {
        let args = pop_n(vm, nargs)?;
        if args.len() != 2 {
            return Err(Error::arity(2, args.len()));
        }
        let v = expect_vector(&args[0])?;
        let mut v = v.borrow_mut();
        for slot in v.iter_mut() {
            *slot = args[1].clone();
        }
        vm.stack.push(Value::Empty);
        Ok(())
    });
}

fn string_chain(args: &[Value], accept: impl Fn(&str, &str) -> bool) -> Result<bool> {
    let mut ok = true;
    for pair in args.windows(2) {
        let a = expect_string(&pair[0])?;
        let b = expect_string(&pair[1])?;
        if !accept(&a.borrow(), &b.borrow()) {
            ok = false;
            break;
        }
    }
    Ok(ok)
}

fn char_chain(args: &[Value], accept: impl Fn(char, char) -> bool) -> Result<bool> {
    let mut ok = true;
    for pair in args.windows(2) {
        let a = expect_char(&pair[0])?;
        let b = expect_char(&pair[1])?;
        if !accept(a, b) {
            ok = false;
            break;
        }
    }
    Ok(ok)
}
