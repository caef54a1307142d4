//! Statement AST nodes.

use crate::{Expression, GenericParam, Param};

/// Statement (does not produce a value).
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Class declaration (top level only).
    Class(ClassDecl),

    /// Function declaration (top level only).
    Function(FunctionDecl),

    /// `return;` or `return expr;`
    Return(Option<Expression>),

    /// `if (cond) { … } else { … }`
    If(IfStmt),

    /// `while (cond) { … }`
    While(WhileStmt),

    /// `for (init; cond; update) { … }`
    For(ForStmt),

    /// `try { … } catch (e) { … }`
    Try(TryStmt),

    /// `throw expr;`
    Throw(Expression),

    /// Expression evaluated for its side effect.
    Expression(Expression),

    /// `let name = expr;`
    VarDecl(VarDecl),
}

/// Variable declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    /// Missing initializer leaves the binding `undefined`.
    pub init: Option<Expression>,
}

/// Conditional statement.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expression,
    pub then_branch: Vec<Statement>,
    pub else_branch: Option<Vec<Statement>>,
}

/// While loop.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expression,
    pub body: Vec<Statement>,
}

/// C-style for loop. All three headers are optional.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Option<Box<Statement>>,
    pub condition: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Vec<Statement>,
}

/// Try/catch statement. The catch clause is mandatory in the core
/// grammar; `finally` is front-end sugar and never reaches the
/// compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub body: Vec<Statement>,
    /// Name the thrown value is bound to inside the catch body.
    pub catch_param: String,
    pub catch_body: Vec<Statement>,
}

/// Free function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Statement>,
    pub is_async: bool,
}

/// Class declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub superclass: Option<String>,
    pub generic_params: Vec<GenericParam>,
    pub is_abstract: bool,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub accessors: Vec<AccessorDecl>,
    /// Explicit constructor; absent means the compiler synthesizes one.
    pub constructor: Option<ConstructorDecl>,
}

/// Instance or static field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub init: Option<Expression>,
    pub is_static: bool,
}

/// Method declaration. Abstract methods carry no body.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Option<Vec<Statement>>,
    pub is_static: bool,
    pub is_async: bool,
    pub is_abstract: bool,
    pub is_override: bool,
}

/// Constructor declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDecl {
    pub params: Vec<Param>,
    pub body: Vec<Statement>,
}

/// Accessor kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Get,
    Set,
}

/// Getter or setter declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorDecl {
    pub kind: AccessorKind,
    pub name: String,
    /// Parameter name for setters; `None` for getters.
    pub param: Option<String>,
    pub body: Option<Vec<Statement>>,
    pub is_abstract: bool,
}

impl ClassDecl {
    /// Create an empty class declaration with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            generic_params: Vec::new(),
            is_abstract: false,
            fields: Vec::new(),
            methods: Vec::new(),
            accessors: Vec::new(),
            constructor: None,
        }
    }
}
