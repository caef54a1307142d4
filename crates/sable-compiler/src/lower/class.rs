//! Class body emission: constructors, methods, accessors, statics.

use sable_ast::{AccessorDecl, AccessorKind, ClassDecl, Expression, MethodDecl, Statement};
use sable_core::ClassId;

use crate::code::{Code, Instr};
use crate::error::{CompileError, CompileResult};
use crate::lower::{Epilogue, FnCfg, FnLowerer, Lowerer};

impl Lowerer<'_> {
    /// Lower an instance or static method body.
    pub fn lower_method_body(
        &mut self,
        class_id: ClassId,
        class_name: &str,
        method: &MethodDecl,
    ) -> CompileResult<Code> {
        let body = method.body.as_ref().ok_or_else(|| {
            CompileError::internal(format!(
                "method {}.{} has no body to lower",
                class_name, method.name
            ))
        })?;
        self.lower_function(
            &format!("{}.{}", class_name, method.name),
            &method.params,
            body,
            method.is_async,
            Some(class_id),
            !method.is_static,
        )
    }

    /// Lower a constructor in the fixed emission order:
    ///
    /// 1. The field map was allocated by `new` before this body runs.
    /// 2. Superclass call — explicit `super(…)` at its position in
    ///    the body, or a synthesized zero-argument call; the root of
    ///    a hierarchy needs no call at all.
    /// 3. Instance field initializers, in declaration order.
    /// 4. The remainder of the user-written body.
    pub fn lower_constructor(&mut self, class_id: ClassId, decl: &ClassDecl) -> CompileResult<Code> {
        let has_superclass = self.registry.class(class_id).superclass.is_some();
        let (params, body): (&[sable_ast::Param], &[Statement]) = match &decl.constructor {
            Some(ctor) => (&ctor.params, &ctor.body),
            None => (&[], &[]),
        };

        let mut fl = FnLowerer::new(
            self,
            FnCfg {
                name: format!("{}.constructor", decl.name),
                has_this: true,
                owner: Some(class_id),
                in_ctor: true,
                is_async: false,
            },
        );
        fl.bind_params(params)?;
        fl.emit_default_checks(params)?;

        let explicit_super = body.iter().position(is_super_call);
        match explicit_super {
            Some(position) => {
                for stmt in &body[..=position] {
                    fl.lower_stmt(stmt)?;
                }
                emit_field_initializers(&mut fl, decl)?;
                for stmt in &body[position + 1..] {
                    fl.lower_stmt(stmt)?;
                }
            }
            None => {
                if has_superclass {
                    fl.emit(Instr::CallSuper { argc: 0 });
                    fl.emit(Instr::Pop);
                }
                emit_field_initializers(&mut fl, decl)?;
                for stmt in body {
                    fl.lower_stmt(stmt)?;
                }
            }
        }
        fl.finish(Epilogue::Undefined)
    }

    /// Lower a getter or setter body. Accessors compile to ordinary
    /// methods (`get_<prop>` / `set_<prop>`); a setter's end-of-body
    /// return is its argument so the dispatch protocol is uniform.
    pub fn lower_accessor(
        &mut self,
        class_id: ClassId,
        class_name: &str,
        accessor: &AccessorDecl,
    ) -> CompileResult<Code> {
        let body = accessor.body.as_ref().ok_or_else(|| {
            CompileError::internal(format!(
                "accessor {}.{} has no body to lower",
                class_name, accessor.name
            ))
        })?;
        match accessor.kind {
            AccessorKind::Get => self.lower_function(
                &format!("{}.get_{}", class_name, accessor.name),
                &[],
                body,
                false,
                Some(class_id),
                true,
            ),
            AccessorKind::Set => {
                let param_name = accessor.param.clone().unwrap_or_else(|| "value".to_string());
                let params = [sable_ast::Param::new(param_name)];
                let mut fl = FnLowerer::new(
                    self,
                    FnCfg {
                        name: format!("{}.set_{}", class_name, accessor.name),
                        has_this: true,
                        owner: Some(class_id),
                        in_ctor: false,
                        is_async: false,
                    },
                );
                fl.bind_params(&params)?;
                for stmt in body {
                    fl.lower_stmt(stmt)?;
                }
                // Receiver is slot 0; the setter argument is slot 1.
                fl.finish(Epilogue::SetterParam(1))
            }
        }
    }

    /// Lower the synthetic static constructor: every static field
    /// initializer in declaration order.
    pub fn lower_static_initializer(
        &mut self,
        class_id: ClassId,
        decl: &ClassDecl,
    ) -> CompileResult<Code> {
        let mut fl = FnLowerer::new(
            self,
            FnCfg {
                name: format!("{}.<static>", decl.name),
                has_this: false,
                owner: Some(class_id),
                in_ctor: false,
                is_async: false,
            },
        );
        for field in decl.fields.iter().filter(|f| f.is_static) {
            match &field.init {
                Some(init) => fl.lower_expr(init)?,
                None => {
                    fl.emit(Instr::ConstUndefined);
                }
            }
            let name = fl.str_id(&field.name);
            fl.emit(Instr::SetStatic {
                class: class_id,
                name,
            });
            fl.emit(Instr::Pop);
        }
        fl.finish(Epilogue::Undefined)
    }
}

/// Instance field initializers: `this.<field> = <init>` in
/// declaration order; a field without an initializer is defined as
/// `undefined`.
fn emit_field_initializers(fl: &mut FnLowerer<'_, '_>, decl: &ClassDecl) -> CompileResult<()> {
    for field in decl.fields.iter().filter(|f| !f.is_static) {
        fl.emit(Instr::LoadLocal(0));
        match &field.init {
            Some(init) => fl.lower_expr(init)?,
            None => {
                fl.emit(Instr::ConstUndefined);
            }
        }
        let name = fl.str_id(&field.name);
        fl.emit(Instr::SetProp(name));
        fl.emit(Instr::Pop);
    }
    Ok(())
}

/// An explicit `super(…)` expression statement.
fn is_super_call(stmt: &Statement) -> bool {
    matches!(
        stmt,
        Statement::Expression(Expression::Call { callee, .. })
            if matches!(&**callee, Expression::Super)
    )
}
