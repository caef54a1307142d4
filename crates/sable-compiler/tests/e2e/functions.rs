//! Functions, parameters, operators, closures.

use sable_ast::build::*;
use sable_ast::BinaryOp::*;
use sable_core::Value;

use super::harness::*;

// ============================================================================
// Parameter binding
// ============================================================================

#[test]
fn test_positional_binding() {
    let program = compile_program(module(vec![func(
        "sub",
        vec![param("a"), param("b")],
        vec![ret(bin(Sub, ident("a"), ident("b")))],
    )]));
    let result = invoke(
        &program,
        "sub",
        vec![Value::Number(50.0), Value::Number(8.0)],
    );
    expect_number(&result, 42.0);
}

#[test]
fn test_missing_argument_reads_undefined() {
    let program = compile_program(module(vec![func(
        "first",
        vec![param("a"), param("b")],
        vec![ret(bin(StrictEq, ident("b"), undefined()))],
    )]));
    let result = invoke(&program, "first", vec![Value::Number(1.0)]);
    assert_eq!(result, Value::Bool(true));
}

#[test]
fn test_default_parameter_fills_undefined() {
    // f(x, y = x + 1) — defaults are checked in declaration order.
    let program = compile_program(module(vec![func(
        "f",
        vec![
            param("x"),
            param_default("y", bin(Add, ident("x"), num(1.0))),
        ],
        vec![ret(bin(Add, ident("x"), ident("y")))],
    )]));

    // Caller-supplied value wins.
    let supplied = invoke(&program, "f", vec![Value::Number(1.0), Value::Number(10.0)]);
    expect_number(&supplied, 11.0);

    // Explicit undefined triggers the default.
    let defaulted = invoke(&program, "f", vec![Value::Number(1.0), Value::Undefined]);
    expect_number(&defaulted, 3.0);

    // Missing arguments do too.
    let missing = invoke(&program, "f", vec![Value::Number(1.0)]);
    expect_number(&missing, 3.0);
}

#[test]
fn test_end_of_body_returns_undefined() {
    let program = compile_program(module(vec![func(
        "noop",
        vec![],
        vec![expr_stmt(num(1.0))],
    )]));
    let result = invoke(&program, "noop", vec![]);
    assert_eq!(result, Value::Undefined);
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_string_concatenation() {
    let program = compile_program(module(vec![func(
        "greet",
        vec![param("name")],
        vec![ret(bin(Add, str_lit("hello "), ident("name")))],
    )]));
    let result = invoke(&program, "greet", vec![Value::str("sable")]);
    expect_string(&result, "hello sable");
}

#[test]
fn test_number_to_string_concat() {
    let program = compile_program(module(vec![func(
        "fmt",
        vec![param("n")],
        vec![ret(bin(Add, str_lit("n="), ident("n")))],
    )]));
    let result = invoke(&program, "fmt", vec![Value::Number(3.0)]);
    expect_string(&result, "n=3");
}

#[test]
fn test_template_literal() {
    let program = compile_program(module(vec![func(
        "fmt",
        vec![param("n")],
        vec![ret(template(vec![
            tpl_text("total: "),
            tpl_expr(ident("n")),
            tpl_text("!"),
        ]))],
    )]));
    let result = invoke(&program, "fmt", vec![Value::Number(7.0)]);
    expect_string(&result, "total: 7!");
}

#[test]
fn test_short_circuit_and_keeps_deciding_value() {
    let program = compile_program(module(vec![func(
        "f",
        vec![param("a"), param("b")],
        vec![ret(bin(And, ident("a"), ident("b")))],
    )]));
    // Falsy left is the result; the right operand is not consulted.
    let result = invoke(&program, "f", vec![Value::Number(0.0), Value::Number(5.0)]);
    expect_number(&result, 0.0);

    let result = invoke(&program, "f", vec![Value::Number(1.0), Value::Number(5.0)]);
    expect_number(&result, 5.0);
}

#[test]
fn test_short_circuit_or() {
    let program = compile_program(module(vec![func(
        "f",
        vec![param("a"), param("b")],
        vec![ret(bin(Or, ident("a"), ident("b")))],
    )]));
    let result = invoke(&program, "f", vec![Value::str("x"), Value::str("y")]);
    expect_string(&result, "x");

    let result = invoke(&program, "f", vec![Value::str(""), Value::str("y")]);
    expect_string(&result, "y");
}

#[test]
fn test_ternary() {
    let program = compile_program(module(vec![func(
        "abs",
        vec![param("n")],
        vec![ret(cond(
            bin(Lt, ident("n"), num(0.0)),
            un(sable_ast::UnaryOp::Neg, ident("n")),
            ident("n"),
        ))],
    )]));
    expect_number(&invoke(&program, "abs", vec![Value::Number(-4.0)]), 4.0);
    expect_number(&invoke(&program, "abs", vec![Value::Number(4.0)]), 4.0);
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_while_loop_sum() {
    // let sum = 0; let i = 1; while (i <= n) { sum += i; i += 1; }
    let program = compile_program(module(vec![func(
        "sum",
        vec![param("n")],
        vec![
            let_("total", num(0.0)),
            let_("i", num(1.0)),
            while_(
                bin(Le, ident("i"), ident("n")),
                vec![
                    expr_stmt(assign(ident("total"), bin(Add, ident("total"), ident("i")))),
                    expr_stmt(assign(ident("i"), bin(Add, ident("i"), num(1.0)))),
                ],
            ),
            ret(ident("total")),
        ],
    )]));
    expect_number(&invoke(&program, "sum", vec![Value::Number(10.0)]), 55.0);
}

#[test]
fn test_for_loop_over_array() {
    // Collect doubled elements by index assignment.
    let program = compile_program(module(vec![func(
        "doubleAll",
        vec![param("items")],
        vec![
            let_("out", array(vec![])),
            for_(
                Some(let_("i", num(0.0))),
                Some(bin(Lt, ident("i"), member(ident("items"), "length"))),
                Some(assign(ident("i"), bin(Add, ident("i"), num(1.0)))),
                vec![expr_stmt(assign(
                    index(ident("out"), ident("i")),
                    bin(Mul, index(ident("items"), ident("i")), num(2.0)),
                ))],
            ),
            ret(ident("out")),
        ],
    )]));
    let input = Value::array(vec![
        Value::Number(1.0),
        Value::Number(2.0),
        Value::Number(3.0),
    ]);
    let result = invoke(&program, "doubleAll", vec![input]);
    assert_eq!(array_len(&result), 3);
    expect_number(&element(&result, 0), 2.0);
    expect_number(&element(&result, 2), 6.0);
}

// ============================================================================
// Closures
// ============================================================================

#[test]
fn test_arrow_captures_enclosing_local() {
    // let base = 10; let add = (x) => x + base; return add(32);
    let program = compile_program(module(vec![func(
        "f",
        vec![],
        vec![
            let_("base", num(10.0)),
            let_(
                "add",
                arrow(vec![param("x")], bin(Add, ident("x"), ident("base"))),
            ),
            ret(call("add", vec![num(32.0)])),
        ],
    )]));
    expect_number(&invoke(&program, "f", vec![]), 42.0);
}

#[test]
fn test_global_function_as_value() {
    // let g = double; return g(21);
    let program = compile_program(module(vec![
        func(
            "double",
            vec![param("x")],
            vec![ret(bin(Mul, ident("x"), num(2.0)))],
        ),
        func(
            "f",
            vec![],
            vec![let_("g", ident("double")), ret(call("g", vec![num(21.0)]))],
        ),
    ]));
    expect_number(&invoke(&program, "f", vec![]), 42.0);
}

#[test]
fn test_object_literal_preserves_insertion_order() {
    let program = compile_program(module(vec![func(
        "mk",
        vec![],
        vec![ret(object(vec![
            ("b", num(1.0)),
            ("a", num(2.0)),
            ("c", num(3.0)),
        ]))],
    )]));
    let result = invoke(&program, "mk", vec![]);
    let Value::Object(props) = &result else {
        panic!("expected object");
    };
    let keys: Vec<String> = props.borrow().keys().cloned().collect();
    assert_eq!(keys, vec!["b", "a", "c"]);
}

#[test]
fn test_array_store_past_end_grows() {
    let program = compile_program(module(vec![func(
        "f",
        vec![],
        vec![
            let_("a", array(vec![])),
            expr_stmt(assign(index(ident("a"), num(2.0)), num(9.0))),
            ret(ident("a")),
        ],
    )]));
    let result = invoke(&program, "f", vec![]);
    assert_eq!(array_len(&result), 3);
    assert_eq!(element(&result, 0), Value::Undefined);
    expect_number(&element(&result, 2), 9.0);
}
