mod config;

use std::process::ExitCode;

use clap::Parser;
use config::CliArgs;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use scheme_engine::{Repr, Vm};

const HISTORY_FILE: &str = ".scheme_history";

fn main() -> ExitCode {
    env_logger::init();
    let args = CliArgs::parse();

    match args.script {
        Some(path) => run_file(&path),
        None => {
            run_repl();
            ExitCode::SUCCESS
        }
    }
}

/// Read the whole file, evaluate its top-level forms in order, quietly.
/// Any error terminates the process with a non-zero exit code (spec.md §6).
fn run_file(path: &std::path::Path) -> ExitCode {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            log::error!("cannot read {}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut env = match scheme_engine::new_env() {
        Ok(env) => env,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let forms = match scheme_engine::parse_all(&contents, &mut env) {
        Ok(forms) => forms,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let program = match scheme_engine::compile_program(&mut env, &forms) {
        Ok(program) => program,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let mut vm = Vm::new(env);
    match vm.eval(program) {
        Ok(_) => match vm.exit_code {
            Some(0) | None => ExitCode::SUCCESS,
            Some(code) => ExitCode::from(code as u8),
        },
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Interactive loop. Prints `N > `, accumulates lines while
/// [`scheme_engine::is_balanced`] reports incomplete input (reprinting
/// `>> `), then compiles and evaluates the completed form. Unlike file
/// mode, an eval error is caught at this boundary and the REPL resumes
/// rather than aborting the process (spec.md §9, the one deliberate
/// divergence from the reference behavior).
fn run_repl() {
    let env = scheme_engine::new_env().expect("failed building the base environment");
    let mut vm = Vm::new(env);

    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), rustyline::history::DefaultHistory> =
        Editor::with_config(config).expect("failed to initialize line editor");
    let _ = rl.load_history(HISTORY_FILE);

    println!("{}", config::WELCOME_MESSAGE);
    println!("{}", config::WELCOME_SUBTITLE);

    let mut count = 0u64;
    'repl: loop {
        count += 1;
        let mut buf = String::new();
        let mut prompt = format!("\n{count} > ");

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    if !buf.is_empty() {
                        buf.push('\n');
                    }
                    buf.push_str(&line);
                    if scheme_engine::is_balanced(&buf) {
                        break;
                    }
                    prompt = ">> ".to_string();
                }
                Err(ReadlineError::Interrupted) => continue 'repl,
                Err(ReadlineError::Eof) => break 'repl,
                Err(err) => {
                    log::error!("{err}");
                    break 'repl;
                }
            }
        }

        if buf.trim().is_empty() {
            continue;
        }

        match eval_one(&mut vm, &buf) {
            Ok(value) => println!("{}", Repr::display(&value, &vm.env.symbols)),
            Err(err) => eprintln!("error: {err}"),
        }

        if vm.exit_code.is_some() {
            break;
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
}

fn eval_one(vm: &mut Vm, source: &str) -> scheme_engine::error::Result<scheme_engine::Value> {
    let forms = scheme_engine::parse_all(source, &mut vm.env)?;
    let program = scheme_engine::compile_program(&mut vm.env, &forms)?;
    vm.eval(program)
}
