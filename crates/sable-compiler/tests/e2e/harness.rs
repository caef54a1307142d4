//! Test harness for end-to-end compilation and execution.

use sable_ast::Module;
use sable_compiler::{compile, Program};
use sable_core::{message_of, TaskHandle, Value};

/// Compile a module, panicking with the error on failure.
pub fn compile_program(module: Module) -> Program {
    match compile(&module) {
        Ok(program) => program,
        Err(e) => panic!("compilation failed: {}", e),
    }
}

/// Compile and invoke a synchronous entry point.
pub fn invoke(program: &Program, name: &str, args: Vec<Value>) -> Value {
    match program.invoke(name, args) {
        Ok(value) => value,
        Err(e) => panic!("invoke({}) failed: {}", name, e),
    }
}

/// Compile and run an entry point through `run_async`.
pub fn run_entry(program: &Program, name: &str, args: Vec<Value>) -> TaskHandle {
    match program.run_async(name, args) {
        Ok(task) => task,
        Err(e) => panic!("run_async({}) failed: {}", name, e),
    }
}

/// The fulfilled value of a task; panics if pending or rejected.
pub fn fulfilled_value(task: &TaskHandle) -> Value {
    match task.outcome() {
        Some(Ok(value)) => value,
        Some(Err(error)) => panic!("task rejected: {}", message_of(&error)),
        None => panic!("task is still pending"),
    }
}

/// The rejection message of a task; panics if pending or fulfilled.
pub fn rejection_message(task: &TaskHandle) -> String {
    match task.outcome() {
        Some(Err(error)) => message_of(&error),
        Some(Ok(value)) => panic!("task fulfilled with {:?}, expected rejection", value),
        None => panic!("task is still pending"),
    }
}

pub fn expect_number(value: &Value, expected: f64) {
    match value.as_number() {
        Some(actual) => assert!(
            (actual - expected).abs() < 1e-10,
            "expected {}, got {}",
            expected,
            actual
        ),
        None => panic!("expected number {}, got {:?}", expected, value),
    }
}

pub fn expect_string(value: &Value, expected: &str) {
    match value.as_str() {
        Some(actual) => assert_eq!(actual, expected),
        None => panic!("expected string {:?}, got {:?}", expected, value),
    }
}

/// Read a property of an object-like value.
pub fn prop(value: &Value, name: &str) -> Value {
    match value {
        Value::Object(props) => props
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("no property '{}' in {:?}", name, value)),
        Value::Instance(instance) => instance
            .get_field(name)
            .unwrap_or_else(|| panic!("no field '{}' in {:?}", name, value)),
        other => panic!("expected object, got {:?}", other),
    }
}

/// Read an array element.
pub fn element(value: &Value, index: usize) -> Value {
    match value {
        Value::Array(elements) => elements
            .borrow()
            .get(index)
            .cloned()
            .unwrap_or_else(|| panic!("no element {} in {:?}", index, value)),
        other => panic!("expected array, got {:?}", other),
    }
}

/// Length of an array value.
pub fn array_len(value: &Value) -> usize {
    match value {
        Value::Array(elements) => elements.borrow().len(),
        other => panic!("expected array, got {:?}", other),
    }
}
