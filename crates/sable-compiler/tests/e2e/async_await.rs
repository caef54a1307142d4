//! Async methods, await, the state machine, and task plumbing.

use sable_ast::build::*;
use sable_ast::BinaryOp::*;
use sable_core::{TaskHandle, Value};

use super::harness::*;

// ============================================================================
// Synchronous fast path
// ============================================================================

#[test]
fn test_async_function_simple() {
    let program = compile_program(module(vec![async_func(
        "getValue",
        vec![],
        vec![ret(num(42.0))],
    )]));
    // No awaits at all: the task is terminal when the invoker returns.
    let task = run_entry(&program, "getValue", vec![]);
    expect_number(&fulfilled_value(&task), 42.0);
}

#[test]
fn test_await_of_direct_value_continues_immediately() {
    // await of a non-task continues with the value itself.
    let program = compile_program(module(vec![async_func(
        "f",
        vec![param("x")],
        vec![ret(bin(Add, await_(ident("x")), num(1.0)))],
    )]));
    let task = run_entry(&program, "f", vec![Value::Number(41.0)]);
    expect_number(&fulfilled_value(&task), 42.0);
}

#[test]
fn test_await_of_terminal_task_is_synchronous() {
    // Every awaited task is already terminal, so the returned task is
    // terminal when run_async returns.
    let program = compile_program(module(vec![async_func(
        "f",
        vec![param("t")],
        vec![ret(bin(Add, await_(ident("t")), num(2.0)))],
    )]));
    let task = run_entry(
        &program,
        "f",
        vec![Value::Task(TaskHandle::fulfilled(Value::Number(40.0)))],
    );
    assert!(task.is_terminal(), "fast path must complete synchronously");
    expect_number(&fulfilled_value(&task), 42.0);
}

#[test]
fn test_chained_async_calls_complete_synchronously() {
    // step1 → step2 → step3, all awaits resolve synchronously.
    let program = compile_program(module(vec![
        async_func("step1", vec![], vec![ret(num(10.0))]),
        async_func(
            "step2",
            vec![param("x")],
            vec![ret(bin(Add, ident("x"), num(20.0)))],
        ),
        async_func(
            "pipeline",
            vec![],
            vec![
                let_("a", await_(call("step1", vec![]))),
                let_("b", await_(call("step2", vec![ident("a")]))),
                ret(bin(Add, ident("b"), num(12.0))),
            ],
        ),
    ]));
    let task = run_entry(&program, "pipeline", vec![]);
    assert!(task.is_terminal());
    expect_number(&fulfilled_value(&task), 42.0);
}

// ============================================================================
// Real suspension and resumption
// ============================================================================

#[test]
fn test_pending_task_parks_then_resumes() {
    let program = compile_program(module(vec![async_func(
        "f",
        vec![param("t")],
        vec![ret(bin(Add, await_(ident("t")), num(1.0)))],
    )]));

    let (input, completer) = TaskHandle::create();
    let task = run_entry(&program, "f", vec![Value::Task(input)]);

    // Parked on the awaiter; nothing terminal yet.
    assert!(!task.is_terminal());

    completer.set_value(Value::Number(41.0));
    expect_number(&fulfilled_value(&task), 42.0);
}

#[test]
fn test_two_sequential_suspensions() {
    let program = compile_program(module(vec![async_func(
        "f",
        vec![param("a"), param("b")],
        vec![
            let_("x", await_(ident("a"))),
            let_("y", await_(ident("b"))),
            ret(bin(Add, ident("x"), ident("y"))),
        ],
    )]));

    let (ta, ca) = TaskHandle::create();
    let (tb, cb) = TaskHandle::create();
    let task = run_entry(&program, "f", vec![Value::Task(ta), Value::Task(tb)]);

    assert!(!task.is_terminal());
    ca.set_value(Value::Number(40.0));
    // Still parked on the second await.
    assert!(!task.is_terminal());
    cb.set_value(Value::Number(2.0));
    expect_number(&fulfilled_value(&task), 42.0);
}

#[test]
fn test_await_in_loop_resumes_into_loop_body() {
    // Locals carried across each suspension: the accumulator and the
    // loop counter survive on the machine.
    let program = compile_program(module(vec![async_func(
        "f",
        vec![param("tasks")],
        vec![
            let_("total", num(0.0)),
            for_(
                Some(let_("i", num(0.0))),
                Some(bin(Lt, ident("i"), member(ident("tasks"), "length"))),
                Some(assign(ident("i"), bin(Add, ident("i"), num(1.0)))),
                vec![expr_stmt(assign(
                    ident("total"),
                    bin(Add, ident("total"), await_(index(ident("tasks"), ident("i")))),
                ))],
            ),
            ret(ident("total")),
        ],
    )]));

    let (t0, c0) = TaskHandle::create();
    let (t1, c1) = TaskHandle::create();
    let input = Value::array(vec![Value::Task(t0), Value::Task(t1)]);
    let task = run_entry(&program, "f", vec![input]);

    assert!(!task.is_terminal());
    c0.set_value(Value::Number(10.0));
    assert!(!task.is_terminal());
    c1.set_value(Value::Number(32.0));
    expect_number(&fulfilled_value(&task), 42.0);
}

#[test]
fn test_no_task_stays_pending_once_inputs_terminal() {
    // Both layers resolve after the external input does.
    let program = compile_program(module(vec![
        async_func(
            "inner",
            vec![param("t")],
            vec![ret(await_(ident("t")))],
        ),
        async_func(
            "outer",
            vec![param("t")],
            vec![ret(await_(call("inner", vec![ident("t")])))],
        ),
    ]));
    let (input, completer) = TaskHandle::create();
    let task = run_entry(&program, "outer", vec![Value::Task(input)]);
    assert!(!task.is_terminal());

    completer.set_value(Value::Number(7.0));
    expect_number(&fulfilled_value(&task), 7.0);
}

// ============================================================================
// Async methods and arrows
// ============================================================================

#[test]
fn test_async_method() {
    let program = compile_program(module(vec![
        class_stmt(class("Service").async_method(
            "fetch",
            vec![param("id")],
            vec![ret(bin(Mul, ident("id"), num(2.0)))],
        )),
        async_func(
            "f",
            vec![],
            vec![ret(await_(call_method(
                new_("Service", vec![]),
                "fetch",
                vec![num(21.0)],
            )))],
        ),
    ]));
    let task = run_entry(&program, "f", vec![]);
    expect_number(&fulfilled_value(&task), 42.0);
}

#[test]
fn test_async_method_using_this() {
    let program = compile_program(module(vec![
        class_stmt(
            class("Counter")
                .field("value", Some(num(10.0)))
                .async_method(
                    "incrementAsync",
                    vec![],
                    vec![
                        expr_stmt(assign(
                            member(this(), "value"),
                            bin(Add, member(this(), "value"), num(1.0)),
                        )),
                        ret(member(this(), "value")),
                    ],
                ),
        ),
        async_func(
            "f",
            vec![],
            vec![ret(await_(call_method(
                new_("Counter", vec![]),
                "incrementAsync",
                vec![],
            )))],
        ),
    ]));
    let task = run_entry(&program, "f", vec![]);
    expect_number(&fulfilled_value(&task), 11.0);
}

#[test]
fn test_async_arrow() {
    let program = compile_program(module(vec![async_func(
        "f",
        vec![],
        vec![
            let_(
                "double",
                async_arrow(
                    vec![param("x")],
                    vec![ret(bin(Mul, ident("x"), num(2.0)))],
                ),
            ),
            ret(await_(call("double", vec![num(21.0)]))),
        ],
    )]));
    let task = run_entry(&program, "f", vec![]);
    expect_number(&fulfilled_value(&task), 42.0);
}

#[test]
fn test_calling_async_function_returns_task_value() {
    // Without await, the call expression evaluates to the task.
    let program = compile_program(module(vec![
        async_func("g", vec![], vec![ret(num(5.0))]),
        func("f", vec![], vec![ret(call("g", vec![]))]),
    ]));
    let result = invoke(&program, "f", vec![]);
    let Value::Task(task) = result else {
        panic!("expected task, got {:?}", result);
    };
    expect_number(&fulfilled_value(&task), 5.0);
}

// ============================================================================
// Await analysis surfaced on the program
// ============================================================================

#[test]
fn test_await_analysis_counts_sites_and_live_locals() {
    let program = compile_program(module(vec![async_func(
        "f",
        vec![param("t")],
        vec![
            let_("a", num(1.0)),
            let_("b", await_(ident("t"))),
            ret(bin(Add, ident("a"), ident("b"))),
        ],
    )]));
    let analysis = program.await_analysis("f").expect("async entry has analysis");
    assert_eq!(analysis.state_count(), 1);
    assert!(analysis.sites[0].live_locals.contains("a"));
}

#[test]
fn test_sync_function_has_no_analysis() {
    let program = compile_program(module(vec![func("f", vec![], vec![ret(num(1.0))])]));
    assert!(program.await_analysis("f").is_none());
}
