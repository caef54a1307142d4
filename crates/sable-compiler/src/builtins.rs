//! Host builtins exposed through the `Promise` namespace.
//!
//! `Promise.allSettled` is not here: it is compiled from the prelude
//! through the async lowering itself (see `prelude`).

use sable_core::{when_all, BuiltinMethod, TaskHandle, Thrown, Value};

/// Identifies a builtin in lowered code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinId {
    PromiseResolve,
    PromiseReject,
    PromiseAll,
}

impl BuiltinId {
    /// Resolve a `Promise.<name>` member to a builtin.
    pub fn from_promise_member(name: &str) -> Option<Self> {
        match name {
            "resolve" => Some(BuiltinId::PromiseResolve),
            "reject" => Some(BuiltinId::PromiseReject),
            "all" => Some(BuiltinId::PromiseAll),
            _ => None,
        }
    }
}

static PROMISE_RESOLVE: BuiltinMethod = BuiltinMethod {
    name: "Promise.resolve",
    arity: 1,
    min_args: 0,
    body: promise_resolve,
};

static PROMISE_REJECT: BuiltinMethod = BuiltinMethod {
    name: "Promise.reject",
    arity: 1,
    min_args: 0,
    body: promise_reject,
};

static PROMISE_ALL: BuiltinMethod = BuiltinMethod {
    name: "Promise.all",
    arity: 1,
    min_args: 1,
    body: promise_all,
};

/// Get the method descriptor for a builtin.
pub fn builtin(id: BuiltinId) -> &'static BuiltinMethod {
    match id {
        BuiltinId::PromiseResolve => &PROMISE_RESOLVE,
        BuiltinId::PromiseReject => &PROMISE_REJECT,
        BuiltinId::PromiseAll => &PROMISE_ALL,
    }
}

fn promise_resolve(args: &[Value]) -> Result<Value, Thrown> {
    let value = args.first().cloned().unwrap_or(Value::Undefined);
    let task = match value {
        // Resolving a task adopts it rather than nesting.
        Value::Task(task) => task,
        other => TaskHandle::fulfilled(other),
    };
    Ok(Value::Task(task))
}

fn promise_reject(args: &[Value]) -> Result<Value, Thrown> {
    let error = args.first().cloned().unwrap_or(Value::Undefined);
    Ok(Value::Task(TaskHandle::rejected(error)))
}

fn promise_all(args: &[Value]) -> Result<Value, Thrown> {
    let Some(Value::Array(elements)) = args.first() else {
        return Err(sable_core::type_error("Promise.all expects an array"));
    };
    let tasks: Vec<TaskHandle> = elements
        .borrow()
        .iter()
        .map(|element| match element {
            Value::Task(task) => task.clone(),
            other => TaskHandle::fulfilled(other.clone()),
        })
        .collect();
    Ok(Value::Task(when_all(&tasks)))
}
