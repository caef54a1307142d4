//! Statement lowering.

use sable_ast::Statement;

use crate::code::Instr;
use crate::error::{CompileError, CompileResult};
use crate::lower::FnLowerer;

impl FnLowerer<'_, '_> {
    pub(crate) fn lower_stmt(&mut self, stmt: &Statement) -> CompileResult<()> {
        match stmt {
            Statement::VarDecl(decl) => {
                match &decl.init {
                    Some(init) => self.lower_expr(init)?,
                    None => {
                        self.emit(Instr::ConstUndefined);
                    }
                }
                // The slot is declared after the initializer so an
                // initializer referring to the same name sees the
                // outer binding.
                let slot = self.declare_local(&decl.name)?;
                self.emit(Instr::StoreLocal(slot));
                Ok(())
            }
            Statement::Return(expr) => {
                match expr {
                    Some(expr) => self.lower_expr(expr)?,
                    None => {
                        self.emit(Instr::ConstUndefined);
                    }
                }
                self.emit(Instr::Return);
                Ok(())
            }
            Statement::Expression(expr) => {
                self.lower_expr(expr)?;
                self.emit(Instr::Pop);
                Ok(())
            }
            Statement::If(if_stmt) => {
                self.lower_expr(&if_stmt.condition)?;
                let to_else = self.emit(Instr::JumpIfFalse(0));
                self.lower_block(&if_stmt.then_branch)?;
                match &if_stmt.else_branch {
                    Some(else_branch) => {
                        let to_end = self.emit(Instr::Jump(0));
                        self.patch_to_here(to_else);
                        self.lower_block(else_branch)?;
                        self.patch_to_here(to_end);
                    }
                    None => self.patch_to_here(to_else),
                }
                Ok(())
            }
            Statement::While(while_stmt) => {
                let condition_at = self.here();
                self.lower_expr(&while_stmt.condition)?;
                let to_end = self.emit(Instr::JumpIfFalse(0));
                self.lower_block(&while_stmt.body)?;
                self.emit(Instr::Jump(condition_at));
                self.patch_to_here(to_end);
                Ok(())
            }
            Statement::For(for_stmt) => {
                self.push_scope();
                if let Some(init) = &for_stmt.init {
                    self.lower_stmt(init)?;
                }
                let condition_at = self.here();
                let to_end = match &for_stmt.condition {
                    Some(condition) => {
                        self.lower_expr(condition)?;
                        Some(self.emit(Instr::JumpIfFalse(0)))
                    }
                    None => None,
                };
                self.lower_block(&for_stmt.body)?;
                if let Some(update) = &for_stmt.update {
                    self.lower_expr(update)?;
                    self.emit(Instr::Pop);
                }
                self.emit(Instr::Jump(condition_at));
                if let Some(to_end) = to_end {
                    self.patch_to_here(to_end);
                }
                self.pop_scope();
                Ok(())
            }
            Statement::Try(try_stmt) => {
                // The handler records the operand-stack depth at
                // installation; a throw unwinds to it and jumps to
                // the catch with the thrown value pushed. An await
                // inside the region suspends with the handler still
                // installed, so the resume point is protected too.
                let handler_at = self.emit(Instr::PushHandler { catch_ip: 0 });
                self.lower_block(&try_stmt.body)?;
                self.emit(Instr::PopHandler);
                let to_end = self.emit(Instr::Jump(0));

                self.patch_to_here(handler_at);
                self.push_scope();
                let slot = self.declare_local(&try_stmt.catch_param)?;
                self.emit(Instr::StoreLocal(slot));
                for stmt in &try_stmt.catch_body {
                    self.lower_stmt(stmt)?;
                }
                self.pop_scope();
                self.patch_to_here(to_end);
                Ok(())
            }
            Statement::Throw(expr) => {
                self.lower_expr(expr)?;
                self.emit(Instr::Throw);
                Ok(())
            }
            Statement::Class(_) | Statement::Function(_) => Err(CompileError::internal(
                "nested class/function declarations are not supported",
            )),
        }
    }

    /// Lower statements in their own lexical scope.
    pub(crate) fn lower_block(&mut self, stmts: &[Statement]) -> CompileResult<()> {
        self.push_scope();
        for stmt in stmts {
            self.lower_stmt(stmt)?;
        }
        self.pop_scope();
        Ok(())
    }
}
