//! Sable compiler — AST to executable program.
//!
//! The pipeline registers every class, pre-declares all method and
//! accessor signatures (so one body can reference another before
//! bodies exist), then emits bodies: directly for synchronous
//! methods, through the async lowering for `async` ones. An async
//! body becomes ordinary code with numbered await sites plus a state
//! machine object that drives it (`machine`); the invoker returns the
//! machine's task.
//!
//! # Entry points
//!
//! ```
//! use sable_ast::build::*;
//! use sable_core::Value;
//!
//! let module = module(vec![func(
//!     "double",
//!     vec![param("x")],
//!     vec![ret(bin(sable_ast::BinaryOp::Mul, ident("x"), num(2.0)))],
//! )]);
//! let program = sable_compiler::compile(&module).unwrap();
//! let result = program.invoke("double", vec![Value::Number(21.0)]).unwrap();
//! assert_eq!(result, Value::Number(42.0));
//! ```

pub mod analysis;
pub mod builtins;
pub mod code;
pub mod error;
pub mod exec;
pub mod lower;
pub mod machine;
pub mod prelude;
pub mod program;

pub use analysis::{analyze_awaits, AwaitAnalysis, AwaitSite};
pub use error::{CompileError, CompileResult};
pub use machine::{AsyncMachine, TaskBuilder, STATE_FINISHED, STATE_RUNNING};
pub use program::{compile, FunctionBody, FunctionEntry, Program};
