//! Classes: constructors, inheritance, overrides, accessors, statics.

use sable_ast::build::*;
use sable_ast::BinaryOp::*;
use sable_core::Value;

use super::harness::*;

// ============================================================================
// Construction and field initialization
// ============================================================================

#[test]
fn test_constructor_field_init_order() {
    // class K { x = 1; constructor(v) { this.y = v + this.x; } }
    // Field initializers run before the user body.
    let program = compile_program(module(vec![
        class_stmt(class("K").field("x", Some(num(1.0))).constructor(
            vec![param("v")],
            vec![expr_stmt(assign(
                member(this(), "y"),
                bin(Add, ident("v"), member(this(), "x")),
            ))],
        )),
        func(
            "f",
            vec![],
            vec![ret(member(new_("K", vec![num(10.0)]), "y"))],
        ),
    ]));
    expect_number(&invoke(&program, "f", vec![]), 11.0);
}

#[test]
fn test_field_without_initializer_is_undefined() {
    let program = compile_program(module(vec![
        class_stmt(class("K").field("x", None)),
        func("f", vec![], vec![ret(member(new_("K", vec![]), "x"))]),
    ]));
    assert_eq!(invoke(&program, "f", vec![]), Value::Undefined);
}

#[test]
fn test_each_ancestor_constructor_runs_exactly_once() {
    // A counts its constructor runs in a static field; B inherits the
    // synthesized constructor, C chains explicitly.
    let program = compile_program(module(vec![
        class_stmt(
            class("A")
                .static_field("count", Some(num(0.0)))
                .constructor(
                    vec![],
                    vec![expr_stmt(assign(
                        member(ident("A"), "count"),
                        bin(Add, member(ident("A"), "count"), num(1.0)),
                    ))],
                ),
        ),
        class_stmt(class("B").extends("A")),
        class_stmt(
            class("C")
                .extends("B")
                .constructor(vec![], vec![expr_stmt(super_call(vec![]))]),
        ),
        func(
            "f",
            vec![],
            vec![
                expr_stmt(new_("C", vec![])),
                ret(member(ident("A"), "count")),
            ],
        ),
    ]));
    expect_number(&invoke(&program, "f", vec![]), 1.0);
}

#[test]
fn test_superclass_constructor_observes_subclass_field_map() {
    // The field map is allocated before the superclass constructor
    // runs; writes made there are visible on the finished instance.
    let program = compile_program(module(vec![
        class_stmt(class("Base").constructor(
            vec![],
            vec![expr_stmt(assign(member(this(), "tag"), str_lit("base")))],
        )),
        class_stmt(class("Derived").extends("Base")),
        func(
            "f",
            vec![],
            vec![ret(member(new_("Derived", vec![]), "tag"))],
        ),
    ]));
    expect_string(&invoke(&program, "f", vec![]), "base");
}

#[test]
fn test_explicit_super_with_arguments() {
    let program = compile_program(module(vec![
        class_stmt(class("Point").constructor(
            vec![param("x")],
            vec![expr_stmt(assign(member(this(), "x"), ident("x")))],
        )),
        class_stmt(
            class("Labeled").extends("Point").constructor(
                vec![param("x"), param("label")],
                vec![
                    expr_stmt(super_call(vec![ident("x")])),
                    expr_stmt(assign(member(this(), "label"), ident("label"))),
                ],
            ),
        ),
        func(
            "f",
            vec![],
            vec![
                let_("p", new_("Labeled", vec![num(4.0), str_lit("origin")])),
                ret(bin(Add, member(ident("p"), "label"), member(ident("p"), "x"))),
            ],
        ),
    ]));
    expect_string(&invoke(&program, "f", vec![]), "origin4");
}

// ============================================================================
// Virtual dispatch and overrides
// ============================================================================

#[test]
fn test_override_multilevel() {
    // A.getValue → 1, B overrides → 2, C overrides → 3.
    let program = compile_program(module(vec![
        class_stmt(class("A").method("getValue", vec![], vec![ret(num(1.0))])),
        class_stmt(
            class("B")
                .extends("A")
                .override_method("getValue", vec![], vec![ret(num(2.0))]),
        ),
        class_stmt(
            class("C")
                .extends("B")
                .override_method("getValue", vec![], vec![ret(num(3.0))]),
        ),
        func(
            "f",
            vec![],
            vec![ret(call_method(new_("C", vec![]), "getValue", vec![]))],
        ),
    ]));
    expect_number(&invoke(&program, "f", vec![]), 3.0);
}

#[test]
fn test_skip_level_override() {
    // B does not declare m; C's override still matches A's.
    let program = compile_program(module(vec![
        class_stmt(class("A").method("m", vec![], vec![ret(num(1.0))])),
        class_stmt(class("B").extends("A")),
        class_stmt(
            class("C")
                .extends("B")
                .override_method("m", vec![], vec![ret(num(3.0))]),
        ),
        func(
            "viaC",
            vec![],
            vec![ret(call_method(new_("C", vec![]), "m", vec![]))],
        ),
        func(
            "viaB",
            vec![],
            vec![ret(call_method(new_("B", vec![]), "m", vec![]))],
        ),
    ]));
    expect_number(&invoke(&program, "viaC", vec![]), 3.0);
    expect_number(&invoke(&program, "viaB", vec![]), 1.0);
}

#[test]
fn test_inherited_method_sees_dynamic_dispatch() {
    // A.describe calls this.name(); C overrides name().
    let program = compile_program(module(vec![
        class_stmt(
            class("A")
                .method("name", vec![], vec![ret(str_lit("a"))])
                .method(
                    "describe",
                    vec![],
                    vec![ret(call_method(this(), "name", vec![]))],
                ),
        ),
        class_stmt(
            class("C")
                .extends("A")
                .override_method("name", vec![], vec![ret(str_lit("c"))]),
        ),
        func(
            "f",
            vec![],
            vec![ret(call_method(new_("C", vec![]), "describe", vec![]))],
        ),
    ]));
    expect_string(&invoke(&program, "f", vec![]), "c");
}

#[test]
fn test_super_method_call() {
    let program = compile_program(module(vec![
        class_stmt(class("A").method("m", vec![], vec![ret(num(10.0))])),
        class_stmt(class("B").extends("A").override_method(
            "m",
            vec![],
            vec![ret(bin(Add, super_method("m", vec![]), num(1.0)))],
        )),
        func(
            "f",
            vec![],
            vec![ret(call_method(new_("B", vec![]), "m", vec![]))],
        ),
    ]));
    expect_number(&invoke(&program, "f", vec![]), 11.0);
}

// ============================================================================
// Abstract classes
// ============================================================================

#[test]
fn test_abstract_method_override() {
    // abstract class Shape { abstract area(); }
    // class Circle extends Shape { r; constructor(r); area() = r*r*3 }
    let program = compile_program(module(vec![
        class_stmt(class("Shape").abstract_().abstract_method("area", vec![])),
        class_stmt(
            class("Circle")
                .extends("Shape")
                .constructor(
                    vec![param("r")],
                    vec![expr_stmt(assign(member(this(), "r"), ident("r")))],
                )
                .override_method(
                    "area",
                    vec![],
                    vec![ret(bin(
                        Mul,
                        bin(Mul, member(this(), "r"), member(this(), "r")),
                        num(3.0),
                    ))],
                ),
        ),
        func(
            "f",
            vec![],
            vec![ret(call_method(new_("Circle", vec![num(10.0)]), "area", vec![]))],
        ),
    ]));
    expect_number(&invoke(&program, "f", vec![]), 300.0);
}

#[test]
fn test_abstract_method_dispatch_fails() {
    // A subclass that does not override the abstract method hits the
    // trap at dispatch time.
    let program = compile_program(module(vec![
        class_stmt(class("Shape").abstract_().abstract_method("area", vec![])),
        class_stmt(class("Hole").extends("Shape")),
        func(
            "f",
            vec![],
            vec![ret(call_method(new_("Hole", vec![]), "area", vec![]))],
        ),
    ]));
    let err = program.invoke("f", vec![]).unwrap_err();
    assert!(
        err.to_string().contains("abstract method invoked"),
        "got: {}",
        err
    );
}

#[test]
fn test_abstract_class_cannot_be_instantiated() {
    let program = compile_program(module(vec![
        class_stmt(class("Shape").abstract_().abstract_method("area", vec![])),
        func("f", vec![], vec![ret(new_("Shape", vec![]))]),
    ]));
    let err = program.invoke("f", vec![]).unwrap_err();
    assert!(err.to_string().contains("abstract"), "got: {}", err);
}

// ============================================================================
// Accessors
// ============================================================================

#[test]
fn test_getter_and_setter() {
    // Accessors route property access through get_/set_ methods.
    let program = compile_program(module(vec![
        class_stmt(
            class("Box")
                .field("stored", Some(num(0.0)))
                .getter("value", vec![ret(member(this(), "stored"))])
                .setter(
                    "value",
                    "v",
                    vec![expr_stmt(assign(
                        member(this(), "stored"),
                        bin(Mul, ident("v"), num(2.0)),
                    ))],
                ),
        ),
        func(
            "f",
            vec![],
            vec![
                let_("b", new_("Box", vec![])),
                expr_stmt(assign(member(ident("b"), "value"), num(21.0))),
                ret(member(ident("b"), "value")),
            ],
        ),
    ]));
    expect_number(&invoke(&program, "f", vec![]), 42.0);
}

#[test]
fn test_getter_inherited_through_chain() {
    let program = compile_program(module(vec![
        class_stmt(class("A").getter("kind", vec![ret(str_lit("a"))])),
        class_stmt(class("B").extends("A")),
        func(
            "f",
            vec![],
            vec![ret(member(new_("B", vec![]), "kind"))],
        ),
    ]));
    expect_string(&invoke(&program, "f", vec![]), "a");
}

// ============================================================================
// Statics
// ============================================================================

#[test]
fn test_static_method_and_field() {
    let program = compile_program(module(vec![
        class_stmt(
            class("Counter")
                .static_field("start", Some(num(40.0)))
                .static_method(
                    "next",
                    vec![param("n")],
                    vec![ret(bin(Add, member(ident("Counter"), "start"), ident("n")))],
                ),
        ),
        func(
            "f",
            vec![],
            vec![ret(call_expr(
                member(ident("Counter"), "next"),
                vec![num(2.0)],
            ))],
        ),
    ]));
    expect_number(&invoke(&program, "f", vec![]), 42.0);
}

#[test]
fn test_static_initializer_runs_before_first_instance() {
    // The constructor reads the static field; the synthetic static
    // constructor must have run by then.
    let program = compile_program(module(vec![
        class_stmt(
            class("Tagged")
                .static_field("prefix", Some(str_lit("t-")))
                .constructor(
                    vec![param("name")],
                    vec![expr_stmt(assign(
                        member(this(), "id"),
                        bin(Add, member(ident("Tagged"), "prefix"), ident("name")),
                    ))],
                ),
        ),
        func(
            "f",
            vec![],
            vec![ret(member(new_("Tagged", vec![str_lit("x")]), "id"))],
        ),
    ]));
    expect_string(&invoke(&program, "f", vec![]), "t-x");
}

// ============================================================================
// Definition-time rejection
// ============================================================================

#[test]
fn test_override_without_superclass_rejected_at_load() {
    let result = sable_compiler::compile(&module(vec![class_stmt(
        class("A").override_method("m", vec![], vec![ret(num(1.0))]),
    )]));
    let err = result.unwrap_err();
    assert!(err.to_string().contains("no superclass"), "got: {}", err);
}

#[test]
fn test_override_with_no_parent_match_rejected_at_load() {
    let result = sable_compiler::compile(&module(vec![
        class_stmt(class("A")),
        class_stmt(
            class("B")
                .extends("A")
                .override_method("nothing", vec![], vec![ret(num(1.0))]),
        ),
    ]));
    let err = result.unwrap_err();
    assert!(err.to_string().contains("override"), "got: {}", err);
}

#[test]
fn test_duplicate_class_rejected_at_load() {
    let result = sable_compiler::compile(&module(vec![
        class_stmt(class("A")),
        class_stmt(class("A")),
    ]));
    let err = result.unwrap_err();
    assert!(err.to_string().contains("duplicate class"), "got: {}", err);
}
