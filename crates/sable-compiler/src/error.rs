//! Compilation errors.

use sable_core::DefineError;
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Error)]
pub enum CompileError {
    /// Class registry rejected a definition (duplicate class, bad
    /// override, unknown superclass, …).
    #[error(transparent)]
    Define(#[from] DefineError),

    #[error("duplicate function '{name}'")]
    DuplicateFunction { name: String },

    #[error("undefined variable: {name}")]
    UndefinedVariable { name: String },

    #[error("unknown class: {name}")]
    UnknownClass { name: String },

    #[error("class '{name}' cannot be used as a value")]
    ClassUsedAsValue { name: String },

    #[error("'this' outside of an instance method")]
    ThisOutsideMethod,

    #[error("'super' call outside of a constructor")]
    SuperOutsideConstructor,

    #[error("'super' used in class '{class}' which has no superclass")]
    SuperWithoutSuperclass { class: String },

    #[error("'await' outside of an async function")]
    AwaitOutsideAsync,

    #[error("invalid assignment target")]
    InvalidAssignmentTarget,

    #[error("only class and function declarations are allowed at the top level")]
    UnsupportedTopLevel,

    #[error("too many local variables (max 65535)")]
    TooManyLocals,

    #[error("internal compiler error: {message}")]
    InternalError { message: String },
}

impl CompileError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        CompileError::InternalError {
            message: message.into(),
        }
    }
}
