//! AST to code lowering.
//!
//! `Lowerer` is the module-level context: it sees the class registry,
//! the global function table, and the function entries being filled
//! in. `FnLowerer` emits one body at a time — scope tracking, slot
//! allocation, jump patching, string interning, and await-site
//! numbering all live there. Per-syntax-class emission is split
//! across `expr`, `stmt`, and `class`.

mod class;
mod expr;
mod stmt;

use std::rc::Rc;

use rustc_hash::FxHashMap;
use sable_ast::Param;
use sable_core::{ClassId, ClassRegistry, FuncId};

use crate::analysis::analyze_awaits;
use crate::code::{BinOp, Code, Instr};
use crate::error::{CompileError, CompileResult};
use crate::program::{FunctionBody, FunctionEntry};

/// Module-level lowering context.
pub struct Lowerer<'a> {
    pub registry: &'a ClassRegistry,
    pub globals: &'a FxHashMap<String, FuncId>,
    pub functions: &'a mut Vec<FunctionEntry>,
}

/// Configuration for one body emission.
#[derive(Debug, Clone)]
pub(crate) struct FnCfg {
    pub name: String,
    pub has_this: bool,
    pub owner: Option<ClassId>,
    pub in_ctor: bool,
    pub is_async: bool,
}

/// What a body returns when control reaches its end without an
/// explicit `return`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Epilogue {
    /// Plain methods and functions return `undefined`.
    Undefined,
    /// Setters return their argument (slot given) to unify the
    /// dispatch protocol.
    SetterParam(u16),
}

impl<'a> Lowerer<'a> {
    /// Lower a free function, method, or static method body.
    pub fn lower_function(
        &mut self,
        name: &str,
        params: &[Param],
        body: &[sable_ast::Statement],
        is_async: bool,
        owner: Option<ClassId>,
        has_this: bool,
    ) -> CompileResult<Code> {
        let mut fl = FnLowerer::new(
            self,
            FnCfg {
                name: name.to_string(),
                has_this,
                owner,
                in_ctor: false,
                is_async,
            },
        );
        fl.bind_params(params)?;
        fl.emit_default_checks(params)?;
        for stmt in body {
            fl.lower_stmt(stmt)?;
        }
        fl.finish(Epilogue::Undefined)
    }

    /// Append a compiled body to the function table and return its
    /// handle. Async entries carry their await analysis.
    pub(crate) fn add_function(
        &mut self,
        code: Code,
        params: &[Param],
        body: &[sable_ast::Statement],
    ) -> CompileResult<FuncId> {
        let id = FuncId(self.functions.len() as u32);
        let awaits = if code.is_async {
            let analysis = analyze_awaits(params, body);
            if analysis.state_count() != code.await_sites {
                return Err(CompileError::internal(format!(
                    "await analysis found {} site(s) but lowering emitted {} in '{}'",
                    analysis.state_count(),
                    code.await_sites,
                    code.name
                )));
            }
            Some(analysis)
        } else {
            None
        };
        self.functions.push(FunctionEntry {
            name: code.name.clone(),
            arity: code.param_count,
            is_async: code.is_async,
            body: FunctionBody::Code(Rc::new(code)),
            awaits,
        });
        Ok(id)
    }
}

/// Emits one body.
pub(crate) struct FnLowerer<'l, 'a> {
    pub ctx: &'l mut Lowerer<'a>,
    cfg: FnCfg,
    instrs: Vec<Instr>,
    strings: Vec<Rc<str>>,
    string_ids: FxHashMap<String, u16>,
    /// Lexical scopes mapping names to frame slots.
    scopes: Vec<FxHashMap<String, u16>>,
    next_slot: u16,
    param_count: usize,
    capture_count: usize,
    /// Slot holding `this`: 0 for instance bodies, a capture slot for
    /// arrows that close over it.
    this_slot: Option<u16>,
    next_await_site: u16,
}

impl<'l, 'a> FnLowerer<'l, 'a> {
    pub(crate) fn new(ctx: &'l mut Lowerer<'a>, cfg: FnCfg) -> FnLowerer<'l, 'a> {
        let mut fl = FnLowerer {
            ctx,
            cfg,
            instrs: Vec::new(),
            strings: Vec::new(),
            string_ids: FxHashMap::default(),
            scopes: vec![FxHashMap::default()],
            next_slot: 0,
            param_count: 0,
            capture_count: 0,
            this_slot: None,
            next_await_site: 0,
        };
        if fl.cfg.has_this {
            // Receiver occupies slot 0; the first declared parameter
            // lands in slot 1.
            fl.next_slot = 1;
            fl.this_slot = Some(0);
        }
        fl
    }

    pub(crate) fn is_async(&self) -> bool {
        self.cfg.is_async
    }

    pub(crate) fn in_ctor(&self) -> bool {
        self.cfg.in_ctor
    }

    pub(crate) fn owner(&self) -> Option<ClassId> {
        self.cfg.owner
    }

    pub(crate) fn this_slot(&self) -> Option<u16> {
        self.this_slot
    }

    pub(crate) fn fn_name(&self) -> &str {
        &self.cfg.name
    }

    // ===== Slots and scopes =====

    pub(crate) fn bind_params(&mut self, params: &[Param]) -> CompileResult<()> {
        self.param_count = params.len();
        for param in params {
            self.declare_local(&param.name)?;
        }
        Ok(())
    }

    /// Bind capture slots directly after the parameters. The closure
    /// call path copies captured values into these slots.
    pub(crate) fn bind_captures(
        &mut self,
        names: &[String],
        capture_this: bool,
    ) -> CompileResult<()> {
        for name in names {
            self.declare_local(name)?;
        }
        if capture_this {
            let slot = self.alloc_slot()?;
            self.this_slot = Some(slot);
        }
        self.capture_count = names.len() + capture_this as usize;
        Ok(())
    }

    fn alloc_slot(&mut self) -> CompileResult<u16> {
        if self.next_slot == u16::MAX {
            return Err(CompileError::TooManyLocals);
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        Ok(slot)
    }

    /// Declare a name in the innermost scope.
    pub(crate) fn declare_local(&mut self, name: &str) -> CompileResult<u16> {
        let slot = self.alloc_slot()?;
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), slot);
        }
        Ok(slot)
    }

    /// Resolve a name through the scope chain.
    pub(crate) fn resolve(&self, name: &str) -> Option<u16> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    // ===== Emission =====

    pub(crate) fn emit(&mut self, instr: Instr) -> usize {
        self.instrs.push(instr);
        self.instrs.len() - 1
    }

    pub(crate) fn here(&self) -> u32 {
        self.instrs.len() as u32
    }

    /// Patch a previously-emitted jump (or handler install) to the
    /// current position.
    pub(crate) fn patch_to_here(&mut self, at: usize) {
        let target = self.here();
        match &mut self.instrs[at] {
            Instr::Jump(t) | Instr::JumpIfFalse(t) | Instr::JumpIfTrue(t) => *t = target,
            Instr::PushHandler { catch_ip } => *catch_ip = target,
            other => unreachable!("patching non-jump instruction {:?}", other),
        }
    }

    /// Intern a string into the code's string table.
    pub(crate) fn str_id(&mut self, s: &str) -> u16 {
        if let Some(&id) = self.string_ids.get(s) {
            return id;
        }
        let id = self.strings.len() as u16;
        self.strings.push(Rc::from(s));
        self.string_ids.insert(s.to_string(), id);
        id
    }

    /// Allocate the next await site (one resume state per site).
    pub(crate) fn alloc_await_site(&mut self) -> CompileResult<u16> {
        if !self.cfg.is_async {
            return Err(CompileError::AwaitOutsideAsync);
        }
        let site = self.next_await_site;
        self.next_await_site += 1;
        Ok(site)
    }

    /// Default-parameter checks, emitted in declaration order before
    /// the user body: a parameter whose caller-supplied value is
    /// `undefined` evaluates its default into the slot.
    pub(crate) fn emit_default_checks(&mut self, params: &[Param]) -> CompileResult<()> {
        for param in params {
            let Some(default) = &param.default else {
                continue;
            };
            let slot = self.resolve(&param.name).ok_or_else(|| {
                CompileError::internal(format!("parameter '{}' lost its slot", param.name))
            })?;
            self.emit(Instr::LoadLocal(slot));
            self.emit(Instr::ConstUndefined);
            self.emit(Instr::Binary(BinOp::StrictEq));
            let skip = self.emit(Instr::JumpIfFalse(0));
            self.lower_expr(default)?;
            self.emit(Instr::StoreLocal(slot));
            self.patch_to_here(skip);
        }
        Ok(())
    }

    /// Seal the body: emit the end-of-body return convention and
    /// package the code.
    pub(crate) fn finish(mut self, epilogue: Epilogue) -> CompileResult<Code> {
        match epilogue {
            Epilogue::Undefined => {
                self.emit(Instr::ConstUndefined);
            }
            Epilogue::SetterParam(slot) => {
                self.emit(Instr::LoadLocal(slot));
            }
        }
        self.emit(Instr::Return);
        Ok(Code {
            name: self.cfg.name,
            param_count: self.param_count,
            capture_count: self.capture_count,
            local_count: self.next_slot as usize,
            has_this: self.cfg.has_this,
            owner: self.cfg.owner,
            is_async: self.cfg.is_async,
            await_sites: self.next_await_site,
            instrs: self.instrs,
            strings: self.strings,
        })
    }
}
