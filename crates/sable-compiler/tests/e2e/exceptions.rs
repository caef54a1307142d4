//! Exception propagation: try/catch, thrown values, task rejection.

use sable_ast::build::*;
use sable_ast::BinaryOp::*;
use sable_core::{TaskHandle, Value};

use super::harness::*;

// ============================================================================
// Synchronous try/catch
// ============================================================================

#[test]
fn test_try_catch_no_throw() {
    let program = compile_program(module(vec![func(
        "f",
        vec![],
        vec![
            let_("result", num(0.0)),
            try_catch(
                vec![expr_stmt(assign(ident("result"), num(42.0)))],
                "e",
                vec![expr_stmt(assign(ident("result"), num(0.0)))],
            ),
            ret(ident("result")),
        ],
    )]));
    expect_number(&invoke(&program, "f", vec![]), 42.0);
}

#[test]
fn test_throw_string_catch_reads_message() {
    // Thrown primitives are wrapped so `e.message` always reads.
    let program = compile_program(module(vec![func(
        "f",
        vec![],
        vec![try_catch(
            vec![throw(str_lit("boom"))],
            "e",
            vec![ret(member(ident("e"), "message"))],
        )],
    )]));
    expect_string(&invoke(&program, "f", vec![]), "boom");
}

#[test]
fn test_throw_error_instance_preserves_identity() {
    // An Error instance passes through the handler untouched.
    let program = compile_program(module(vec![func(
        "f",
        vec![],
        vec![try_catch(
            vec![throw(new_("Error", vec![str_lit("bad")]))],
            "e",
            vec![ret(member(ident("e"), "message"))],
        )],
    )]));
    expect_string(&invoke(&program, "f", vec![]), "bad");
}

#[test]
fn test_nested_try_rethrow_reaches_outer() {
    let program = compile_program(module(vec![func(
        "f",
        vec![],
        vec![try_catch(
            vec![try_catch(
                vec![throw(str_lit("inner"))],
                "e",
                vec![throw(bin(Add, member(ident("e"), "message"), str_lit("!")))],
            )],
            "e2",
            vec![ret(member(ident("e2"), "message"))],
        )],
    )]));
    expect_string(&invoke(&program, "f", vec![]), "inner!");
}

#[test]
fn test_uncaught_throw_surfaces_to_embedder() {
    let program = compile_program(module(vec![func(
        "f",
        vec![],
        vec![throw(new_("Error", vec![str_lit("escaped")]))],
    )]));
    let err = program.invoke("f", vec![]).unwrap_err();
    assert!(err.to_string().contains("escaped"), "got: {}", err);
}

// ============================================================================
// Runtime value errors
// ============================================================================

#[test]
fn test_property_access_on_null_is_type_error() {
    let program = compile_program(module(vec![func(
        "f",
        vec![],
        vec![try_catch(
            vec![ret(member(null(), "x"))],
            "e",
            vec![ret(member(ident("e"), "name"))],
        )],
    )]));
    expect_string(&invoke(&program, "f", vec![]), "TypeError");
}

#[test]
fn test_calling_non_callable_is_type_error() {
    let program = compile_program(module(vec![func(
        "f",
        vec![],
        vec![
            let_("n", num(3.0)),
            try_catch(
                vec![ret(call("n", vec![]))],
                "e",
                vec![ret(member(ident("e"), "name"))],
            ),
        ],
    )]));
    expect_string(&invoke(&program, "f", vec![]), "TypeError");
}

#[test]
fn test_division_by_zero_is_not_an_error() {
    let program = compile_program(module(vec![func(
        "f",
        vec![param("a"), param("b")],
        vec![ret(bin(Div, ident("a"), ident("b")))],
    )]));
    let inf = invoke(&program, "f", vec![Value::Number(1.0), Value::Number(0.0)]);
    assert_eq!(inf, Value::Number(f64::INFINITY));

    let nan = invoke(&program, "f", vec![Value::Number(0.0), Value::Number(0.0)]);
    let Value::Number(n) = nan else {
        panic!("expected number");
    };
    assert!(n.is_nan());
}

// ============================================================================
// Exceptions across suspension points
// ============================================================================

#[test]
fn test_await_rejected_task_reraises_into_catch() {
    // S5: try { await reject("e"); return "X"; } catch (e) { … }
    let program = compile_program(module(vec![async_func(
        "f",
        vec![],
        vec![try_catch(
            vec![
                expr_stmt(await_(call_expr(
                    member(ident("Promise"), "reject"),
                    vec![str_lit("e")],
                ))),
                ret(str_lit("X")),
            ],
            "e",
            vec![ret(bin(Add, str_lit("got "), member(ident("e"), "message")))],
        )],
    )]));
    let task = run_entry(&program, "f", vec![]);
    expect_string(&fulfilled_value(&task), "got e");
}

#[test]
fn test_async_throw_rejects_task_with_same_message() {
    let program = compile_program(module(vec![async_func(
        "f",
        vec![],
        vec![throw(new_("Error", vec![str_lit("kaput")]))],
    )]));
    let task = run_entry(&program, "f", vec![]);
    assert_eq!(rejection_message(&task), "kaput");
}

#[test]
fn test_exception_round_trip_through_await() {
    // g rejects; f awaits g and the same message re-raises in f.
    let program = compile_program(module(vec![
        async_func(
            "g",
            vec![],
            vec![throw(new_("Error", vec![str_lit("deep")]))],
        ),
        async_func(
            "f",
            vec![],
            vec![try_catch(
                vec![ret(await_(call("g", vec![])))],
                "e",
                vec![ret(member(ident("e"), "message"))],
            )],
        ),
    ]));
    let task = run_entry(&program, "f", vec![]);
    expect_string(&fulfilled_value(&task), "deep");
}

#[test]
fn test_rejection_after_suspension_lands_in_enclosing_catch() {
    // The machine parks inside the protected region; the rejection
    // arrives later and must resume into the same region's handler.
    let program = compile_program(module(vec![async_func(
        "f",
        vec![param("t")],
        vec![try_catch(
            vec![
                expr_stmt(await_(ident("t"))),
                ret(str_lit("no-throw")),
            ],
            "e",
            vec![ret(bin(Add, str_lit("caught "), member(ident("e"), "message")))],
        )],
    )]));

    let (input, completer) = TaskHandle::create();
    let task = run_entry(&program, "f", vec![Value::Task(input)]);
    assert!(!task.is_terminal());

    completer.set_error(Value::str("late"));
    expect_string(&fulfilled_value(&task), "caught late");
}

#[test]
fn test_catch_body_may_await() {
    // The catch clause itself suspends and resumes.
    let program = compile_program(module(vec![async_func(
        "f",
        vec![param("fallback")],
        vec![try_catch(
            vec![throw(str_lit("first"))],
            "e",
            vec![ret(bin(
                Add,
                member(ident("e"), "message"),
                await_(ident("fallback")),
            ))],
        )],
    )]));

    let (input, completer) = TaskHandle::create();
    let task = run_entry(&program, "f", vec![Value::Task(input)]);
    assert!(!task.is_terminal());

    completer.set_value(Value::str("+second"));
    expect_string(&fulfilled_value(&task), "first+second");
}

#[test]
fn test_uncaught_rejection_after_resume_rejects_the_task() {
    // No handler installed: the late rejection propagates out of
    // MoveNext and rejects the produced task.
    let program = compile_program(module(vec![async_func(
        "f",
        vec![param("t")],
        vec![ret(await_(ident("t")))],
    )]));

    let (input, completer) = TaskHandle::create();
    let task = run_entry(&program, "f", vec![Value::Task(input)]);
    assert!(!task.is_terminal());

    completer.set_error(Value::str("doom"));
    assert_eq!(rejection_message(&task), "doom");
}
