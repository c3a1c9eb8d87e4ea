//! Error taxonomy (spec.md §7).
//!
//! Kinds, not type names: callers match on the variant to decide whether
//! an error is recoverable (REPL mode resumes on all of these) rather than
//! on a formatted message.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed token stream.
    #[error("parse error: {0}")]
    Parse(String),

    /// Malformed special form, wrong fixed arity for `set!`/`if`/`quote`/
    /// `define`, non-symbol in binding position, empty application, a
    /// macro with no matching pattern.
    #[error("compile error: {0}")]
    Compile(String),

    /// `car`/`cdr` of non-pair, call of non-procedure, arithmetic on
    /// non-numeric, and similar.
    #[error("type error: {0}")]
    Type(String),

    /// `GetVar` or `Set` on a symbol with no binding in the chain.
    #[error("unbound variable: {0}")]
    Unbound(String),

    /// Wrong number of actual arguments for a fixed-arity procedure or
    /// builtin.
    #[error("arity error: {0}")]
    Arity(String),

    /// Failed file I/O, stream closure.
    #[error("fatal error: {0}")]
    Fatal(String),

    /// Catch-all used internally by the macro engine and compiler for
    /// conditions that don't map cleanly onto the taxonomy above.
    #[error("{0}")]
    Reason(String),

    /// Internal control-flow signal: a captured continuation was invoked.
    /// Propagates via `?` up to the `call/cc` host frame whose `id`
    /// matches; any other frame just re-raises it unchanged. Never meant
    /// to reach a caller of the public `eval` entry point - `Vm::eval`
    /// turns a surviving one into `Fatal` (escape-only continuations, see
    /// spec.md §9).
    #[error("escape via continuation")]
    Escape {
        id: u64,
        stack: Vec<crate::value::Value>,
        payload: Box<crate::value::Value>,
    },
}

impl Error {
    pub fn unbound(name: impl std::fmt::Display) -> Error {
        Error::Unbound(name.to_string())
    }

    pub fn arity(expected: impl std::fmt::Display, got: usize) -> Error {
        Error::Arity(format!("expected {expected} argument(s), got {got}"))
    }

    pub fn wrong_type(expected: &str, value_repr: impl std::fmt::Display) -> Error {
        Error::Type(format!("expected {expected}, got {value_repr}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Fatal(err.to_string())
    }
}
