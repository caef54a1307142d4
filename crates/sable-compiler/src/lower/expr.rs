//! Expression lowering.

use sable_ast::{ArrowBody, BinaryOp, Expression, Literal, Param, Statement, TemplatePart, UnaryOp};

use crate::analysis::free_variables;
use crate::builtins::BuiltinId;
use crate::code::{BinOp, Instr, UnOp};
use crate::error::{CompileError, CompileResult};
use crate::lower::{Epilogue, FnCfg, FnLowerer};

impl FnLowerer<'_, '_> {
    pub(crate) fn lower_expr(&mut self, expr: &Expression) -> CompileResult<()> {
        match expr {
            Expression::Literal(literal) => self.lower_literal(literal),
            Expression::Template(parts) => self.lower_template(parts),
            Expression::Identifier(name) => self.lower_identifier(name),
            Expression::This => match self.this_slot() {
                Some(slot) => {
                    self.emit(Instr::LoadLocal(slot));
                    Ok(())
                }
                None => Err(CompileError::ThisOutsideMethod),
            },
            Expression::Super => Err(CompileError::internal(
                "'super' is only valid as a call target",
            )),
            Expression::ArrayLit(elements) => {
                for element in elements {
                    self.lower_expr(element)?;
                }
                self.emit(Instr::MakeArray(elements.len() as u16));
                Ok(())
            }
            Expression::ObjectLit(props) => {
                for (key, value) in props {
                    let key_id = self.str_id(key);
                    self.emit(Instr::ConstStr(key_id));
                    self.lower_expr(value)?;
                }
                self.emit(Instr::MakeObject(props.len() as u16));
                Ok(())
            }
            Expression::Binary { op, left, right } => self.lower_binary(*op, left, right),
            Expression::Unary { op, operand } => {
                self.lower_expr(operand)?;
                self.emit(Instr::Unary(match op {
                    UnaryOp::Neg => UnOp::Neg,
                    UnaryOp::Not => UnOp::Not,
                }));
                Ok(())
            }
            Expression::Assign { target, value } => self.lower_assign(target, value),
            Expression::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.lower_expr(condition)?;
                let to_else = self.emit(Instr::JumpIfFalse(0));
                self.lower_expr(then_expr)?;
                let to_end = self.emit(Instr::Jump(0));
                self.patch_to_here(to_else);
                self.lower_expr(else_expr)?;
                self.patch_to_here(to_end);
                Ok(())
            }
            Expression::Call { callee, args } => self.lower_call(callee, args),
            Expression::Member { object, property } => self.lower_member(object, property),
            Expression::Index { object, index } => {
                self.lower_expr(object)?;
                self.lower_expr(index)?;
                self.emit(Instr::GetIndex);
                Ok(())
            }
            Expression::Await(inner) => {
                self.lower_expr(inner)?;
                let site = self.alloc_await_site()?;
                self.emit(Instr::Await { site });
                Ok(())
            }
            Expression::New { class, args } => {
                let class_id =
                    self.ctx
                        .registry
                        .lookup(class)
                        .ok_or_else(|| CompileError::UnknownClass {
                            name: class.clone(),
                        })?;
                let argc = check_argc(args.len())?;
                for arg in args {
                    self.lower_expr(arg)?;
                }
                self.emit(Instr::New {
                    class: class_id,
                    argc,
                });
                Ok(())
            }
            Expression::Arrow {
                params,
                body,
                is_async,
            } => self.lower_arrow(params, body, *is_async),
            // Front-end assertions evaluate their operand and nothing
            // else at run time.
            Expression::Assert(inner) | Expression::NonNull(inner) => self.lower_expr(inner),
            Expression::Cast { expr, .. } => self.lower_expr(expr),
        }
    }

    fn lower_literal(&mut self, literal: &Literal) -> CompileResult<()> {
        match literal {
            Literal::Number(n) => {
                self.emit(Instr::ConstNumber(*n));
            }
            Literal::String(s) => {
                let id = self.str_id(s);
                self.emit(Instr::ConstStr(id));
            }
            Literal::Bool(true) => {
                self.emit(Instr::ConstTrue);
            }
            Literal::Bool(false) => {
                self.emit(Instr::ConstFalse);
            }
            Literal::Null => {
                self.emit(Instr::ConstNull);
            }
            Literal::Undefined => {
                self.emit(Instr::ConstUndefined);
            }
        }
        Ok(())
    }

    /// Template literals build their result by string concatenation,
    /// starting from the empty string so every part is coerced.
    fn lower_template(&mut self, parts: &[TemplatePart]) -> CompileResult<()> {
        let empty = self.str_id("");
        self.emit(Instr::ConstStr(empty));
        for part in parts {
            match part {
                TemplatePart::Text(text) => {
                    let id = self.str_id(text);
                    self.emit(Instr::ConstStr(id));
                }
                TemplatePart::Expr(expr) => self.lower_expr(expr)?,
            }
            self.emit(Instr::Binary(BinOp::Add));
        }
        Ok(())
    }

    fn lower_identifier(&mut self, name: &str) -> CompileResult<()> {
        if let Some(slot) = self.resolve(name) {
            self.emit(Instr::LoadLocal(slot));
            return Ok(());
        }
        if let Some(&func) = self.ctx.globals.get(name) {
            // A bare reference to a global function is a closure with
            // no captures.
            self.emit(Instr::MakeClosure { func, captures: 0 });
            return Ok(());
        }
        if self.ctx.registry.lookup(name).is_some() {
            return Err(CompileError::ClassUsedAsValue {
                name: name.to_string(),
            });
        }
        Err(CompileError::UndefinedVariable {
            name: name.to_string(),
        })
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
    ) -> CompileResult<()> {
        match op {
            // Short-circuit forms keep the deciding value as the
            // result without evaluating the other operand.
            BinaryOp::And => {
                self.lower_expr(left)?;
                self.emit(Instr::Dup);
                let end = self.emit(Instr::JumpIfFalse(0));
                self.emit(Instr::Pop);
                self.lower_expr(right)?;
                self.patch_to_here(end);
                Ok(())
            }
            BinaryOp::Or => {
                self.lower_expr(left)?;
                self.emit(Instr::Dup);
                let end = self.emit(Instr::JumpIfTrue(0));
                self.emit(Instr::Pop);
                self.lower_expr(right)?;
                self.patch_to_here(end);
                Ok(())
            }
            _ => {
                self.lower_expr(left)?;
                self.lower_expr(right)?;
                self.emit(Instr::Binary(match op {
                    BinaryOp::Add => BinOp::Add,
                    BinaryOp::Sub => BinOp::Sub,
                    BinaryOp::Mul => BinOp::Mul,
                    BinaryOp::Div => BinOp::Div,
                    BinaryOp::Mod => BinOp::Mod,
                    BinaryOp::Eq => BinOp::Eq,
                    BinaryOp::Ne => BinOp::Ne,
                    BinaryOp::StrictEq => BinOp::StrictEq,
                    BinaryOp::StrictNe => BinOp::StrictNe,
                    BinaryOp::Lt => BinOp::Lt,
                    BinaryOp::Le => BinOp::Le,
                    BinaryOp::Gt => BinOp::Gt,
                    BinaryOp::Ge => BinOp::Ge,
                    BinaryOp::And | BinaryOp::Or => unreachable!(),
                }));
                Ok(())
            }
        }
    }

    /// Assignment leaves the assigned value on the stack (it is an
    /// expression).
    fn lower_assign(&mut self, target: &Expression, value: &Expression) -> CompileResult<()> {
        match target {
            Expression::Identifier(name) => {
                let Some(slot) = self.resolve(name) else {
                    return Err(CompileError::UndefinedVariable {
                        name: name.clone(),
                    });
                };
                self.lower_expr(value)?;
                self.emit(Instr::Dup);
                self.emit(Instr::StoreLocal(slot));
                Ok(())
            }
            Expression::Member { object, property } => {
                // Static field write when the object is a class name
                // not shadowed by a local.
                if let Expression::Identifier(object_name) = &**object {
                    if self.resolve(object_name).is_none() {
                        if let Some(class) = self.ctx.registry.lookup(object_name) {
                            self.lower_expr(value)?;
                            let name = self.str_id(property);
                            self.emit(Instr::SetStatic { class, name });
                            return Ok(());
                        }
                    }
                }
                self.lower_expr(object)?;
                self.lower_expr(value)?;
                let name = self.str_id(property);
                self.emit(Instr::SetProp(name));
                Ok(())
            }
            Expression::Index { object, index } => {
                self.lower_expr(object)?;
                self.lower_expr(index)?;
                self.lower_expr(value)?;
                self.emit(Instr::SetIndex);
                Ok(())
            }
            _ => Err(CompileError::InvalidAssignmentTarget),
        }
    }

    fn lower_call(&mut self, callee: &Expression, args: &[Expression]) -> CompileResult<()> {
        let argc = check_argc(args.len())?;
        match callee {
            // super(…): constructor chain call.
            Expression::Super => {
                if !self.in_ctor() {
                    return Err(CompileError::SuperOutsideConstructor);
                }
                let owner = self
                    .owner()
                    .ok_or(CompileError::SuperOutsideConstructor)?;
                if self.ctx.registry.class(owner).superclass.is_none() {
                    return Err(CompileError::SuperWithoutSuperclass {
                        class: self.ctx.registry.class(owner).name.clone(),
                    });
                }
                for arg in args {
                    self.lower_expr(arg)?;
                }
                self.emit(Instr::CallSuper { argc });
                Ok(())
            }
            Expression::Member { object, property } => {
                // super.m(…)
                if matches!(&**object, Expression::Super) {
                    if self.this_slot().is_none() || self.owner().is_none() {
                        return Err(CompileError::ThisOutsideMethod);
                    }
                    for arg in args {
                        self.lower_expr(arg)?;
                    }
                    let name = self.str_id(property);
                    self.emit(Instr::CallSuperMethod { name, argc });
                    return Ok(());
                }
                if let Expression::Identifier(object_name) = &**object {
                    if self.resolve(object_name).is_none() {
                        // ClassName.staticMethod(…)
                        if let Some(class) = self.ctx.registry.lookup(object_name) {
                            for arg in args {
                                self.lower_expr(arg)?;
                            }
                            let name = self.str_id(property);
                            self.emit(Instr::CallStatic { class, name, argc });
                            return Ok(());
                        }
                        // Promise.resolve / reject / all / allSettled
                        if object_name == "Promise" {
                            return self.lower_promise_call(property, args, argc);
                        }
                    }
                }
                // Virtual dispatch on the receiver.
                self.lower_expr(object)?;
                for arg in args {
                    self.lower_expr(arg)?;
                }
                let name = self.str_id(property);
                self.emit(Instr::CallMethod { name, argc });
                Ok(())
            }
            Expression::Identifier(name) => {
                if let Some(slot) = self.resolve(name) {
                    self.emit(Instr::LoadLocal(slot));
                    for arg in args {
                        self.lower_expr(arg)?;
                    }
                    self.emit(Instr::CallValue { argc });
                    return Ok(());
                }
                if let Some(&func) = self.ctx.globals.get(name) {
                    for arg in args {
                        self.lower_expr(arg)?;
                    }
                    self.emit(Instr::CallFunc { func, argc });
                    return Ok(());
                }
                if self.ctx.registry.lookup(name).is_some() {
                    return Err(CompileError::ClassUsedAsValue {
                        name: name.clone(),
                    });
                }
                Err(CompileError::UndefinedVariable { name: name.clone() })
            }
            other => {
                self.lower_expr(other)?;
                for arg in args {
                    self.lower_expr(arg)?;
                }
                self.emit(Instr::CallValue { argc });
                Ok(())
            }
        }
    }

    fn lower_promise_call(
        &mut self,
        property: &str,
        args: &[Expression],
        argc: u8,
    ) -> CompileResult<()> {
        if property == "allSettled" {
            // allSettled is compiled from the prelude through the
            // async pipeline; dispatch to it like any function.
            let func = *self
                .ctx
                .globals
                .get(crate::prelude::ALL_SETTLED)
                .ok_or_else(|| CompileError::internal("prelude missing allSettled"))?;
            for arg in args {
                self.lower_expr(arg)?;
            }
            self.emit(Instr::CallFunc { func, argc });
            return Ok(());
        }
        let builtin = BuiltinId::from_promise_member(property).ok_or_else(|| {
            CompileError::UndefinedVariable {
                name: format!("Promise.{}", property),
            }
        })?;
        for arg in args {
            self.lower_expr(arg)?;
        }
        self.emit(Instr::CallBuiltin { builtin, argc });
        Ok(())
    }

    fn lower_member(&mut self, object: &Expression, property: &str) -> CompileResult<()> {
        if matches!(object, Expression::Super) {
            return Err(CompileError::internal(
                "'super' member access is only valid as a call",
            ));
        }
        if let Expression::Identifier(object_name) = object {
            if self.resolve(object_name).is_none() {
                // Static field read.
                if let Some(class) = self.ctx.registry.lookup(object_name) {
                    let name = self.str_id(property);
                    self.emit(Instr::GetStatic { class, name });
                    return Ok(());
                }
                // `Promise.resolve` as a first-class value.
                if object_name == "Promise" {
                    if property == "allSettled" {
                        let func = *self
                            .ctx
                            .globals
                            .get(crate::prelude::ALL_SETTLED)
                            .ok_or_else(|| CompileError::internal("prelude missing allSettled"))?;
                        self.emit(Instr::MakeClosure { func, captures: 0 });
                        return Ok(());
                    }
                    let builtin = BuiltinId::from_promise_member(property).ok_or_else(|| {
                        CompileError::UndefinedVariable {
                            name: format!("Promise.{}", property),
                        }
                    })?;
                    self.emit(Instr::ConstBuiltin(builtin));
                    return Ok(());
                }
            }
        }
        self.lower_expr(object)?;
        let name = self.str_id(property);
        self.emit(Instr::GetProp(name));
        Ok(())
    }

    /// Arrow functions compile to separate bodies; the enclosing
    /// function pushes each captured binding (and `this` when the
    /// body uses it) before `MakeClosure` snapshots them.
    fn lower_arrow(
        &mut self,
        params: &[Param],
        body: &ArrowBody,
        is_async: bool,
    ) -> CompileResult<()> {
        let body_stmts: Vec<Statement> = match body {
            ArrowBody::Expr(expr) => vec![Statement::Return(Some((**expr).clone()))],
            ArrowBody::Block(stmts) => stmts.clone(),
        };

        let (free, uses_this) = free_variables(params, &body_stmts);
        let capture_names: Vec<String> = free
            .into_iter()
            .filter(|name| self.resolve(name).is_some())
            .collect();
        if uses_this && self.this_slot().is_none() {
            return Err(CompileError::ThisOutsideMethod);
        }
        let capture_this = uses_this;

        // Push captured values in capture-slot order.
        for name in &capture_names {
            let slot = self.resolve(name).ok_or_else(|| {
                CompileError::internal(format!("capture '{}' lost its slot", name))
            })?;
            self.emit(Instr::LoadLocal(slot));
        }
        if capture_this {
            let slot = self
                .this_slot()
                .ok_or(CompileError::ThisOutsideMethod)?;
            self.emit(Instr::LoadLocal(slot));
        }

        let name = format!("{}.<arrow>", self.fn_name());
        let owner = self.owner();
        let code = {
            let mut child = FnLowerer::new(
                self.ctx,
                FnCfg {
                    name,
                    has_this: false,
                    owner,
                    in_ctor: false,
                    is_async,
                },
            );
            child.bind_params(params)?;
            child.bind_captures(&capture_names, capture_this)?;
            child.emit_default_checks(params)?;
            for stmt in &body_stmts {
                child.lower_stmt(stmt)?;
            }
            child.finish(Epilogue::Undefined)?
        };

        let func = self.ctx.add_function(code, params, &body_stmts)?;
        let captures = (capture_names.len() + capture_this as usize) as u16;
        self.emit(Instr::MakeClosure { func, captures });
        Ok(())
    }
}

fn check_argc(len: usize) -> CompileResult<u8> {
    u8::try_from(len).map_err(|_| CompileError::internal("more than 255 arguments"))
}
