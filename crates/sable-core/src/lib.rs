//! Sable runtime core.
//!
//! Everything the compiled program needs at run time and nothing it
//! only needs at compile time:
//! - the tagged [`Value`] model with reference-shared payloads
//! - dynamic property storage and class instances
//! - the [`ClassRegistry`] (vtables, accessors, statics, overrides)
//! - the cooperative task runtime (tasks, awaiters, `when_all`)
//! - thrown-value plumbing shared by both back ends
//!
//! The runtime is single-threaded cooperative: all user code runs on
//! one logical thread and suspends only at explicit await points, so
//! payload sharing is `Rc` + `RefCell` and nothing here locks.

pub mod error;
pub mod object;
pub mod registry;
pub mod task;
pub mod value;

pub use error::{
    error_object, has_message, message_of, normalize_thrown, type_error, DefineError, Thrown,
    VmError, VmResult,
};
pub use object::{Instance, PropMap};
pub use registry::{
    ClassDescriptor, ClassId, ClassRegistry, FuncId, GenericParamInfo, MethodKind, MethodSig,
};
pub use task::{when_all, Awaiter, Completer, TaskHandle, TaskId};
pub use value::{BuiltinMethod, Closure, Value};
