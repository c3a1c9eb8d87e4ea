mod builtins;
mod compiler;
mod cursor;
mod env;
pub mod error;
mod handle;
mod lexer;
mod macros;
mod opcode;
mod parser;
mod port;
pub mod prelude;
mod repr;
mod span;
mod symbol;
mod token;
mod utils;
mod value;
mod vm;

pub use self::compiler::{compile, compile_program};
pub use self::env::Env;
pub use self::handle::Handle;
pub use self::parser::{is_balanced, parse_all, parse_one};
pub use self::repr::Repr;
pub use self::value::Value;
pub use self::vm::Vm;

/// Build a fresh environment with the native builtins and the library
/// prelude already loaded, ready to compile and run user programs against.
/// `scheme-report-environment` sees the prelude's definitions because
/// `refresh_base` runs after it, not just after the native builtins.
pub fn new_env() -> error::Result<Env> {
    let mut env = Env::new();
    builtins::install(&mut env);
    let mut vm = Vm::new(env);
    prelude::load(&mut vm)?;
    vm.env.refresh_base();
    Ok(vm.env)
}

/// Convenience macro for declaring type safe identifiers.
///
/// ```
/// # use scheme_engine::declare_id;
/// declare_id!(struct ConstantId(u16));
/// let func_id = ConstantId::new(42);
/// assert_eq!(func_id.as_inner(), 42);
/// ```
///
/// Supports a visibility modifier.
///
/// ```
/// # use scheme_engine::declare_id;
/// declare_id!(pub(crate) struct LocalId(u8));
/// declare_id!(pub struct TypeId(u64));
/// # let id = LocalId::new(42);
/// # (id.as_inner(), 42);
/// # let id = TypeId::new(42);
/// # (id.as_inner(), 42);
/// ```
#[macro_export]
#[doc(hidden)]
macro_rules! declare_id {
    (
        $(#[$outer:meta])*
        $vis:vis struct $name:ident($ty:ty)
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
        #[repr(transparent)]
        $vis struct $name($ty);

        impl $name {
            #[inline]
            $vis const fn new(value: $ty) -> Self {
                Self(value)
            }

            #[inline]
            $vis const fn as_inner(self) -> $ty {
                self.0
            }

            #[inline]
            $vis const fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl From<$name> for usize {
            fn from(id: $name) -> usize {
                id.as_usize()
            }
        }
    };
}
