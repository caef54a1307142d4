//! Errors and thrown-value plumbing.
//!
//! The language treats exceptions as values: a throw carries a
//! [`Value`], a rejected task stores one, and `try/catch` binds one.
//! Host-level failures (uncaught exceptions escaping an entry point,
//! malformed class definitions) surface as Rust error enums.

use std::rc::Rc;

use thiserror::Error;

use crate::object::PropMap;
use crate::value::Value;

/// A value thrown by user code, in flight between a `throw` (or a
/// failed runtime operation) and the handler that catches it.
#[derive(Debug, Clone)]
pub struct Thrown(pub Value);

impl Thrown {
    pub fn new(value: Value) -> Self {
        Thrown(value)
    }

    /// The user-visible message of the thrown value.
    pub fn message(&self) -> String {
        message_of(&self.0)
    }

    /// Unwrap the carried value.
    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Build an error-shaped object: `{ name, message }`.
pub fn error_object(name: &str, message: &str) -> Value {
    let mut props = PropMap::new();
    props.insert("name".to_string(), Value::Str(Rc::from(name)));
    props.insert("message".to_string(), Value::Str(Rc::from(message)));
    Value::object(props)
}

/// A thrown `TypeError`.
pub fn type_error(message: impl AsRef<str>) -> Thrown {
    Thrown(error_object("TypeError", message.as_ref()))
}

/// Check whether a value exposes a `message` property.
pub fn has_message(value: &Value) -> bool {
    match value {
        Value::Object(props) => props.borrow().contains_key("message"),
        Value::Instance(inst) => inst.has_field("message"),
        _ => false,
    }
}

/// Normalize a value at the point it is thrown or used to reject a
/// task: values that already carry a `message` pass through, anything
/// else is wrapped into an error-shaped object so `catch (e)` can
/// always read `e.message`.
pub fn normalize_thrown(value: Value) -> Value {
    if has_message(&value) {
        value
    } else {
        error_object("Error", &value.to_display_string())
    }
}

/// Extract the user-visible message from an error value: the
/// `message` property when present, the displayed value otherwise.
/// This is the only part of an exception that crosses into user data
/// structures (e.g. the `reason` of a settled record).
pub fn message_of(value: &Value) -> String {
    let message = match value {
        Value::Object(props) => props.borrow().get("message").cloned(),
        Value::Instance(inst) => inst.get_field("message"),
        _ => None,
    };
    match message {
        Some(m) => m.to_display_string(),
        None => value.to_display_string(),
    }
}

/// Class definition errors, raised at program load.
#[derive(Debug, Error, PartialEq)]
pub enum DefineError {
    #[error("duplicate class '{name}'")]
    DuplicateClass { name: String },

    #[error("class '{class}' extends unknown class '{superclass}'")]
    UnknownSuperclass { class: String, superclass: String },

    #[error("inheritance cycle through class '{class}'")]
    InheritanceCycle { class: String },

    #[error("duplicate method '{method}' on class '{class}'")]
    DuplicateMethod { class: String, method: String },

    #[error("method '{method}' on class '{class}' is marked override but the class has no superclass")]
    OverrideWithoutSuperclass { class: String, method: String },

    #[error("static method '{method}' on class '{class}' cannot be marked override")]
    OverrideOnStatic { class: String, method: String },

    #[error("method '{method}' on class '{class}' is marked override but no superclass declares it")]
    OverrideMismatch { class: String, method: String },
}

/// Execution errors surfaced to the embedder.
#[derive(Debug, Error)]
pub enum VmError {
    /// An exception escaped the entry point uncaught.
    #[error("uncaught exception: {message}")]
    Uncaught { message: String },

    /// The requested entry function does not exist.
    #[error("unknown entry function '{name}'")]
    UnknownFunction { name: String },

    /// Internal invariant violation; indicates a compiler bug, not a
    /// user error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

pub type VmResult<T> = Result<T, VmError>;
