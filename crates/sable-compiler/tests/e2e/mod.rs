//! End-to-end tests for the Sable compiler.
//!
//! These tests build program ASTs, compile them, and execute them
//! through the public entry points, verifying the results.

mod harness;

mod async_await;
mod classes;
mod exceptions;
mod functions;
