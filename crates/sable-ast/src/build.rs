//! Programmatic AST construction.
//!
//! Embedders that do not run the textual front end (and the test
//! suites) assemble programs with these helpers. Each function maps
//! one-to-one onto an AST node; nothing here performs checking.

use crate::*;

// ===== Module & declarations =====

/// Build a module from top-level statements.
pub fn module(statements: Vec<Statement>) -> Module {
    Module::new(statements)
}

/// Declare a synchronous free function.
pub fn func(name: &str, params: Vec<Param>, body: Vec<Statement>) -> Statement {
    Statement::Function(FunctionDecl {
        name: name.to_string(),
        params,
        body,
        is_async: false,
    })
}

/// Declare an async free function.
pub fn async_func(name: &str, params: Vec<Param>, body: Vec<Statement>) -> Statement {
    Statement::Function(FunctionDecl {
        name: name.to_string(),
        params,
        body,
        is_async: true,
    })
}

/// Simple parameter.
pub fn param(name: &str) -> Param {
    Param::new(name)
}

/// Parameter with a default expression.
pub fn param_default(name: &str, default: Expression) -> Param {
    Param::with_default(name, default)
}

/// Declare a class; mutate the returned `ClassDecl` through the
/// builder methods below before wrapping it with [`class_stmt`].
pub fn class(name: &str) -> ClassDecl {
    ClassDecl::new(name)
}

/// Wrap a finished class declaration as a statement.
pub fn class_stmt(decl: ClassDecl) -> Statement {
    Statement::Class(decl)
}

impl ClassDecl {
    /// Set the superclass name.
    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    /// Mark the class abstract.
    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Add a generic parameter.
    pub fn generic(mut self, name: &str, constraint: Option<&str>) -> Self {
        self.generic_params.push(GenericParam {
            name: name.to_string(),
            constraint: constraint.map(str::to_string),
        });
        self
    }

    /// Add an instance field.
    pub fn field(mut self, name: &str, init: Option<Expression>) -> Self {
        self.fields.push(FieldDecl {
            name: name.to_string(),
            init,
            is_static: false,
        });
        self
    }

    /// Add a static field.
    pub fn static_field(mut self, name: &str, init: Option<Expression>) -> Self {
        self.fields.push(FieldDecl {
            name: name.to_string(),
            init,
            is_static: true,
        });
        self
    }

    /// Add an instance method.
    pub fn method(mut self, name: &str, params: Vec<Param>, body: Vec<Statement>) -> Self {
        self.methods.push(MethodDecl {
            name: name.to_string(),
            params,
            body: Some(body),
            is_static: false,
            is_async: false,
            is_abstract: false,
            is_override: false,
        });
        self
    }

    /// Add an instance method marked `override`.
    pub fn override_method(mut self, name: &str, params: Vec<Param>, body: Vec<Statement>) -> Self {
        self.methods.push(MethodDecl {
            name: name.to_string(),
            params,
            body: Some(body),
            is_static: false,
            is_async: false,
            is_abstract: false,
            is_override: true,
        });
        self
    }

    /// Add an async instance method.
    pub fn async_method(mut self, name: &str, params: Vec<Param>, body: Vec<Statement>) -> Self {
        self.methods.push(MethodDecl {
            name: name.to_string(),
            params,
            body: Some(body),
            is_static: false,
            is_async: true,
            is_abstract: false,
            is_override: false,
        });
        self
    }

    /// Add an abstract (bodiless) instance method.
    pub fn abstract_method(mut self, name: &str, params: Vec<Param>) -> Self {
        self.methods.push(MethodDecl {
            name: name.to_string(),
            params,
            body: None,
            is_static: false,
            is_async: false,
            is_abstract: true,
            is_override: false,
        });
        self
    }

    /// Add a static method.
    pub fn static_method(mut self, name: &str, params: Vec<Param>, body: Vec<Statement>) -> Self {
        self.methods.push(MethodDecl {
            name: name.to_string(),
            params,
            body: Some(body),
            is_static: true,
            is_async: false,
            is_abstract: false,
            is_override: false,
        });
        self
    }

    /// Add a raw method declaration (full control over flags).
    pub fn raw_method(mut self, decl: MethodDecl) -> Self {
        self.methods.push(decl);
        self
    }

    /// Add a getter accessor.
    pub fn getter(mut self, name: &str, body: Vec<Statement>) -> Self {
        self.accessors.push(AccessorDecl {
            kind: AccessorKind::Get,
            name: name.to_string(),
            param: None,
            body: Some(body),
            is_abstract: false,
        });
        self
    }

    /// Add a setter accessor.
    pub fn setter(mut self, name: &str, param: &str, body: Vec<Statement>) -> Self {
        self.accessors.push(AccessorDecl {
            kind: AccessorKind::Set,
            name: name.to_string(),
            param: Some(param.to_string()),
            body: Some(body),
            is_abstract: false,
        });
        self
    }

    /// Set the explicit constructor.
    pub fn constructor(mut self, params: Vec<Param>, body: Vec<Statement>) -> Self {
        self.constructor = Some(ConstructorDecl { params, body });
        self
    }
}

// ===== Statements =====

/// `return expr;`
pub fn ret(expr: Expression) -> Statement {
    Statement::Return(Some(expr))
}

/// `return;`
pub fn ret_void() -> Statement {
    Statement::Return(None)
}

/// `let name = init;`
pub fn let_(name: &str, init: Expression) -> Statement {
    Statement::VarDecl(VarDecl {
        name: name.to_string(),
        init: Some(init),
    })
}

/// `let name;`
pub fn let_uninit(name: &str) -> Statement {
    Statement::VarDecl(VarDecl {
        name: name.to_string(),
        init: None,
    })
}

/// Expression statement.
pub fn expr_stmt(expr: Expression) -> Statement {
    Statement::Expression(expr)
}

/// `if (cond) { then }`
pub fn if_(condition: Expression, then_branch: Vec<Statement>) -> Statement {
    Statement::If(IfStmt {
        condition,
        then_branch,
        else_branch: None,
    })
}

/// `if (cond) { then } else { else }`
pub fn if_else(
    condition: Expression,
    then_branch: Vec<Statement>,
    else_branch: Vec<Statement>,
) -> Statement {
    Statement::If(IfStmt {
        condition,
        then_branch,
        else_branch: Some(else_branch),
    })
}

/// `while (cond) { body }`
pub fn while_(condition: Expression, body: Vec<Statement>) -> Statement {
    Statement::While(WhileStmt { condition, body })
}

/// `for (init; cond; update) { body }`
pub fn for_(
    init: Option<Statement>,
    condition: Option<Expression>,
    update: Option<Expression>,
    body: Vec<Statement>,
) -> Statement {
    Statement::For(ForStmt {
        init: init.map(Box::new),
        condition,
        update,
        body,
    })
}

/// `try { body } catch (param) { catch_body }`
pub fn try_catch(body: Vec<Statement>, param: &str, catch_body: Vec<Statement>) -> Statement {
    Statement::Try(TryStmt {
        body,
        catch_param: param.to_string(),
        catch_body,
    })
}

/// `throw expr;`
pub fn throw(expr: Expression) -> Statement {
    Statement::Throw(expr)
}

// ===== Expressions =====

/// Number literal.
pub fn num(n: f64) -> Expression {
    Expression::number(n)
}

/// String literal.
pub fn str_lit(s: &str) -> Expression {
    Expression::string(s)
}

/// Boolean literal.
pub fn bool_lit(b: bool) -> Expression {
    Expression::Literal(Literal::Bool(b))
}

/// `null`
pub fn null() -> Expression {
    Expression::Literal(Literal::Null)
}

/// `undefined`
pub fn undefined() -> Expression {
    Expression::Literal(Literal::Undefined)
}

/// Identifier reference.
pub fn ident(name: &str) -> Expression {
    Expression::Identifier(name.to_string())
}

/// `this`
pub fn this() -> Expression {
    Expression::This
}

/// Binary expression.
pub fn bin(op: BinaryOp, left: Expression, right: Expression) -> Expression {
    Expression::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Unary expression.
pub fn un(op: UnaryOp, operand: Expression) -> Expression {
    Expression::Unary {
        op,
        operand: Box::new(operand),
    }
}

/// Assignment expression.
pub fn assign(target: Expression, value: Expression) -> Expression {
    Expression::Assign {
        target: Box::new(target),
        value: Box::new(value),
    }
}

/// Ternary conditional.
pub fn cond(condition: Expression, then_expr: Expression, else_expr: Expression) -> Expression {
    Expression::Conditional {
        condition: Box::new(condition),
        then_expr: Box::new(then_expr),
        else_expr: Box::new(else_expr),
    }
}

/// Call an arbitrary callee expression.
pub fn call_expr(callee: Expression, args: Vec<Expression>) -> Expression {
    Expression::Call {
        callee: Box::new(callee),
        args,
    }
}

/// Call a named function: `name(args…)`.
pub fn call(name: &str, args: Vec<Expression>) -> Expression {
    call_expr(ident(name), args)
}

/// Call a method: `object.name(args…)`.
pub fn call_method(object: Expression, name: &str, args: Vec<Expression>) -> Expression {
    call_expr(member(object, name), args)
}

/// `object.property`
pub fn member(object: Expression, property: &str) -> Expression {
    Expression::Member {
        object: Box::new(object),
        property: property.to_string(),
    }
}

/// `object[index]`
pub fn index(object: Expression, idx: Expression) -> Expression {
    Expression::Index {
        object: Box::new(object),
        index: Box::new(idx),
    }
}

/// `await expr`
pub fn await_(expr: Expression) -> Expression {
    Expression::Await(Box::new(expr))
}

/// `new Class(args…)`
pub fn new_(class: &str, args: Vec<Expression>) -> Expression {
    Expression::New {
        class: class.to_string(),
        args,
    }
}

/// `super(args…)` — constructor chain call.
pub fn super_call(args: Vec<Expression>) -> Expression {
    call_expr(Expression::Super, args)
}

/// `super.name(args…)`
pub fn super_method(name: &str, args: Vec<Expression>) -> Expression {
    call_expr(member(Expression::Super, name), args)
}

/// Array literal.
pub fn array(elements: Vec<Expression>) -> Expression {
    Expression::ArrayLit(elements)
}

/// Object literal.
pub fn object(props: Vec<(&str, Expression)>) -> Expression {
    Expression::ObjectLit(
        props
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

/// Synchronous arrow function with an expression body.
pub fn arrow(params: Vec<Param>, body: Expression) -> Expression {
    Expression::Arrow {
        params,
        body: ArrowBody::Expr(Box::new(body)),
        is_async: false,
    }
}

/// Synchronous arrow function with a block body.
pub fn arrow_block(params: Vec<Param>, body: Vec<Statement>) -> Expression {
    Expression::Arrow {
        params,
        body: ArrowBody::Block(body),
        is_async: false,
    }
}

/// Async arrow function with a block body.
pub fn async_arrow(params: Vec<Param>, body: Vec<Statement>) -> Expression {
    Expression::Arrow {
        params,
        body: ArrowBody::Block(body),
        is_async: true,
    }
}

/// Template literal.
pub fn template(parts: Vec<TemplatePart>) -> Expression {
    Expression::Template(parts)
}

/// Template text segment.
pub fn tpl_text(s: &str) -> TemplatePart {
    TemplatePart::Text(s.to_string())
}

/// Template interpolation segment.
pub fn tpl_expr(e: Expression) -> TemplatePart {
    TemplatePart::Expr(e)
}
