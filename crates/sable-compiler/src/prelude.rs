//! The compiled prelude.
//!
//! Declarations every program gets, expressed as AST and compiled
//! through the normal pipeline — the `Promise.allSettled` pair runs
//! through the same async lowering as user code:
//!
//! - `Error`: `constructor(message)` stores `this.message`.
//! - `__settleElement(elem)`: await the element (a non-task element
//!   is taken directly), produce `{status:"fulfilled", value}`; the
//!   catch converts any failure to `{status:"rejected",
//!   reason: e.message}`. This function never rejects.
//! - `__promiseAllSettled(items)`: empty input short-circuits to
//!   `[]`; otherwise settle every element in input order and await
//!   the bulk `Promise.all` — which always resolves, since no
//!   element task rejects. Element i's record lands at index i
//!   regardless of completion order.

use sable_ast::build::*;
use sable_ast::BinaryOp::*;
use sable_ast::Statement;

/// Internal name of the per-element settling function.
pub const SETTLE_ELEMENT: &str = "__settleElement";

/// Internal name of the aggregate; `Promise.allSettled(…)` lowers to
/// a call of this function.
pub const ALL_SETTLED: &str = "__promiseAllSettled";

/// Build the prelude declarations.
pub fn prelude_statements() -> Vec<Statement> {
    vec![error_class(), settle_element(), promise_all_settled()]
}

/// The name a prelude statement declares (used to let user
/// declarations shadow the prelude).
pub fn declared_name(stmt: &Statement) -> Option<&str> {
    match stmt {
        Statement::Class(decl) => Some(&decl.name),
        Statement::Function(decl) => Some(&decl.name),
        _ => None,
    }
}

fn error_class() -> Statement {
    class_stmt(
        class("Error")
            .field("message", None)
            .constructor(
                vec![param("message")],
                vec![expr_stmt(assign(
                    member(this(), "message"),
                    ident("message"),
                ))],
            ),
    )
}

fn settle_element() -> Statement {
    async_func(
        SETTLE_ELEMENT,
        vec![param("elem")],
        vec![try_catch(
            vec![
                let_("value", await_(ident("elem"))),
                ret(object(vec![
                    ("status", str_lit("fulfilled")),
                    ("value", ident("value")),
                ])),
            ],
            "e",
            vec![ret(object(vec![
                ("status", str_lit("rejected")),
                ("reason", member(ident("e"), "message")),
            ]))],
        )],
    )
}

fn promise_all_settled() -> Statement {
    async_func(
        ALL_SETTLED,
        vec![param("items")],
        vec![
            if_(
                bin(StrictEq, member(ident("items"), "length"), num(0.0)),
                vec![ret(array(vec![]))],
            ),
            let_("tasks", array(vec![])),
            for_(
                Some(let_("i", num(0.0))),
                Some(bin(Lt, ident("i"), member(ident("items"), "length"))),
                Some(assign(ident("i"), bin(Add, ident("i"), num(1.0)))),
                vec![expr_stmt(assign(
                    index(ident("tasks"), ident("i")),
                    call(SETTLE_ELEMENT, vec![index(ident("items"), ident("i"))]),
                ))],
            ),
            let_(
                "results",
                await_(call_expr(
                    member(ident("Promise"), "all"),
                    vec![ident("tasks")],
                )),
            ),
            ret(ident("results")),
        ],
    )
}
