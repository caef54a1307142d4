//! Compiled programs and the embedder entry points.
//!
//! Compilation is three passes over the prelude plus the user
//! module:
//!
//! 1. **Declare names** — every class and global function gets its
//!    identity; nothing is resolved yet.
//! 2. **Declare signatures** — the hierarchy is linked, then every
//!    constructor, method, and accessor reserves a handle in
//!    inheritance order (override validation needs ancestors first).
//!    After this pass any body may reference any method, including
//!    mutually recursive ones.
//! 3. **Define bodies** — the lowering attaches code to every
//!    reserved handle.

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use sable_ast::{AccessorKind, ClassDecl, Module, Statement};
use sable_core::{
    ClassRegistry, FuncId, GenericParamInfo, MethodKind, MethodSig, TaskHandle, Value, VmError,
    VmResult,
};

use crate::analysis::{analyze_awaits, AwaitAnalysis};
use crate::code::Code;
use crate::error::{CompileError, CompileResult};
use crate::exec;
use crate::lower::Lowerer;
use crate::prelude;

/// The executable form attached to a function handle.
#[derive(Debug)]
pub enum FunctionBody {
    /// Declared but not yet defined (only during compilation).
    Open,
    /// Lowered code.
    Code(Rc<Code>),
    /// Abstract method trap: fails when dispatched.
    AbstractTrap { class: String, method: String },
}

/// One entry in the program's function table.
#[derive(Debug)]
pub struct FunctionEntry {
    pub name: String,
    pub arity: usize,
    pub is_async: bool,
    pub body: FunctionBody,
    /// Await analysis for async bodies.
    pub awaits: Option<AwaitAnalysis>,
}

#[derive(Debug)]
struct ProgramInner {
    registry: ClassRegistry,
    functions: Vec<FunctionEntry>,
    globals: FxHashMap<String, FuncId>,
}

/// A compiled program. Cloning shares the compiled artifact; the
/// registry and function table are immutable after load (static
/// field storage aside).
#[derive(Debug, Clone)]
pub struct Program {
    inner: Rc<ProgramInner>,
}

impl Program {
    /// The class registry.
    pub fn registry(&self) -> &ClassRegistry {
        &self.inner.registry
    }

    /// A function-table entry.
    pub fn function(&self, id: FuncId) -> &FunctionEntry {
        &self.inner.functions[id.as_usize()]
    }

    /// Look up a global function by name.
    pub fn lookup_global(&self, name: &str) -> Option<FuncId> {
        self.inner.globals.get(name).copied()
    }

    /// Await analysis of a global async function, if any.
    pub fn await_analysis(&self, name: &str) -> Option<&AwaitAnalysis> {
        let id = self.lookup_global(name)?;
        self.function(id).awaits.as_ref()
    }

    /// Run a global function synchronously. Calling an async function
    /// returns its task as a value.
    pub fn invoke(&self, name: &str, args: Vec<Value>) -> VmResult<Value> {
        let func = self.lookup_global(name).ok_or_else(|| VmError::UnknownFunction {
            name: name.to_string(),
        })?;
        exec::call_function(self, func, None, args, Vec::new()).map_err(|thrown| {
            VmError::Uncaught {
                message: thrown.message(),
            }
        })
    }

    /// Run an entry point and hand back a task: the returned task of
    /// an async entry, or the wrapped outcome of a synchronous one.
    pub fn run_async(&self, name: &str, args: Vec<Value>) -> VmResult<TaskHandle> {
        let func = self.lookup_global(name).ok_or_else(|| VmError::UnknownFunction {
            name: name.to_string(),
        })?;
        match exec::call_function(self, func, None, args, Vec::new()) {
            Ok(Value::Task(task)) => Ok(task),
            Ok(value) => Ok(TaskHandle::fulfilled(value)),
            Err(thrown) => Ok(TaskHandle::rejected(thrown.into_value())),
        }
    }
}

/// Compile a program AST.
pub fn compile(module: &Module) -> CompileResult<Program> {
    let user_names: FxHashSet<&str> = module
        .statements
        .iter()
        .filter_map(prelude::declared_name)
        .collect();
    let prelude_stmts: Vec<Statement> = prelude::prelude_statements()
        .into_iter()
        .filter(|stmt| {
            prelude::declared_name(stmt).map_or(true, |name| !user_names.contains(name))
        })
        .collect();
    let all: Vec<&Statement> = prelude_stmts
        .iter()
        .chain(module.statements.iter())
        .collect();

    let mut registry = ClassRegistry::new();
    let mut functions: Vec<FunctionEntry> = Vec::new();
    let mut globals: FxHashMap<String, FuncId> = FxHashMap::default();

    // ===== Pass 1: declare names =====
    for stmt in &all {
        match stmt {
            Statement::Class(decl) => {
                registry.declare_class(
                    &decl.name,
                    decl.superclass.as_deref(),
                    decl.is_abstract,
                    decl.generic_params
                        .iter()
                        .map(|p| GenericParamInfo {
                            name: p.name.clone(),
                            constraint: p.constraint.clone(),
                        })
                        .collect(),
                )?;
            }
            Statement::Function(decl) => {
                if globals.contains_key(&decl.name) {
                    return Err(CompileError::DuplicateFunction {
                        name: decl.name.clone(),
                    });
                }
                let id = alloc_entry(
                    &mut functions,
                    decl.name.clone(),
                    decl.params.len(),
                    decl.is_async,
                );
                globals.insert(decl.name.clone(), id);
            }
            _ => return Err(CompileError::UnsupportedTopLevel),
        }
    }
    registry.link_hierarchy()?;

    // ===== Pass 2: declare signatures, ancestors first =====
    let class_decls: FxHashMap<&str, &ClassDecl> = all
        .iter()
        .filter_map(|stmt| match stmt {
            Statement::Class(decl) => Some((decl.name.as_str(), decl)),
            _ => None,
        })
        .collect();

    for class_id in registry.inheritance_order() {
        let class_name = registry.class(class_id).name.clone();
        let decl = *class_decls
            .get(class_name.as_str())
            .ok_or_else(|| CompileError::internal(format!("class '{}' has no AST", class_name)))?;

        let ctor_arity = decl.constructor.as_ref().map_or(0, |c| c.params.len());
        let ctor_id = alloc_entry(
            &mut functions,
            format!("{}.constructor", class_name),
            ctor_arity,
            false,
        );
        registry.set_constructor(class_id, ctor_id);

        for method in &decl.methods {
            let id = alloc_entry(
                &mut functions,
                format!("{}.{}", class_name, method.name),
                method.params.len(),
                method.is_async,
            );
            let kind = if method.is_static {
                MethodKind::Static
            } else {
                MethodKind::Instance
            };
            registry.declare_method(
                class_id,
                &method.name,
                kind,
                MethodSig {
                    handle: id,
                    arity: method.params.len(),
                    is_async: method.is_async,
                    is_abstract: method.is_abstract,
                },
                method.is_override,
            )?;
            if method.is_abstract {
                functions[id.as_usize()].body = FunctionBody::AbstractTrap {
                    class: class_name.clone(),
                    method: method.name.clone(),
                };
            }
        }

        for accessor in &decl.accessors {
            let (kind, prefix, arity) = match accessor.kind {
                AccessorKind::Get => (MethodKind::Getter, "get", 0),
                AccessorKind::Set => (MethodKind::Setter, "set", 1),
            };
            let id = alloc_entry(
                &mut functions,
                format!("{}.{}_{}", class_name, prefix, accessor.name),
                arity,
                false,
            );
            registry.declare_method(
                class_id,
                &accessor.name,
                kind,
                MethodSig {
                    handle: id,
                    arity,
                    is_async: false,
                    is_abstract: accessor.is_abstract,
                },
                false,
            )?;
            if accessor.is_abstract {
                functions[id.as_usize()].body = FunctionBody::AbstractTrap {
                    class: class_name.clone(),
                    method: format!("{}_{}", prefix, accessor.name),
                };
            }
        }

        if decl.fields.iter().any(|f| f.is_static) {
            let id = alloc_entry(
                &mut functions,
                format!("{}.<static>", class_name),
                0,
                false,
            );
            registry.set_static_constructor(class_id, id);
        }
    }

    // ===== Pass 3: define bodies =====
    let mut lowerer = Lowerer {
        registry: &registry,
        globals: &globals,
        functions: &mut functions,
    };

    for stmt in &all {
        match stmt {
            Statement::Function(decl) => {
                let id = lowerer.globals[&decl.name];
                let code = lowerer.lower_function(
                    &decl.name,
                    &decl.params,
                    &decl.body,
                    decl.is_async,
                    None,
                    false,
                )?;
                if decl.is_async {
                    let analysis = analyze_awaits(&decl.params, &decl.body);
                    if analysis.state_count() != code.await_sites {
                        return Err(CompileError::internal(format!(
                            "await analysis found {} site(s) but lowering emitted {} in '{}'",
                            analysis.state_count(),
                            code.await_sites,
                            decl.name
                        )));
                    }
                    lowerer.functions[id.as_usize()].awaits = Some(analysis);
                }
                lowerer.functions[id.as_usize()].body = FunctionBody::Code(Rc::new(code));
            }
            Statement::Class(decl) => {
                define_class_bodies(&mut lowerer, decl)?;
            }
            _ => unreachable!("rejected in pass 1"),
        }
    }

    drop(lowerer);
    Ok(Program {
        inner: Rc::new(ProgramInner {
            registry,
            functions,
            globals,
        }),
    })
}

fn define_class_bodies(lowerer: &mut Lowerer<'_>, decl: &ClassDecl) -> CompileResult<()> {
    let class_id = lowerer
        .registry
        .lookup(&decl.name)
        .ok_or_else(|| CompileError::internal(format!("class '{}' not declared", decl.name)))?;

    let ctor_id = lowerer
        .registry
        .class(class_id)
        .constructor
        .ok_or_else(|| CompileError::internal("constructor handle missing"))?;
    let ctor_code = lowerer.lower_constructor(class_id, decl)?;
    lowerer.functions[ctor_id.as_usize()].body = FunctionBody::Code(Rc::new(ctor_code));

    for method in decl.methods.iter().filter(|m| !m.is_abstract) {
        let descriptor = lowerer.registry.class(class_id);
        let table = if method.is_static {
            &descriptor.static_methods
        } else {
            &descriptor.vtable
        };
        let handle = table
            .get(&method.name)
            .ok_or_else(|| CompileError::internal("method handle missing"))?
            .handle;
        let code = lowerer.lower_method_body(class_id, &decl.name, method)?;
        if method.is_async {
            let body = method.body.as_deref().unwrap_or(&[]);
            lowerer.functions[handle.as_usize()].awaits =
                Some(analyze_awaits(&method.params, body));
        }
        lowerer.functions[handle.as_usize()].body = FunctionBody::Code(Rc::new(code));
    }

    for accessor in decl.accessors.iter().filter(|a| !a.is_abstract) {
        let descriptor = lowerer.registry.class(class_id);
        let table = match accessor.kind {
            AccessorKind::Get => &descriptor.getters,
            AccessorKind::Set => &descriptor.setters,
        };
        let handle = table
            .get(&accessor.name)
            .ok_or_else(|| CompileError::internal("accessor handle missing"))?
            .handle;
        let code = lowerer.lower_accessor(class_id, &decl.name, accessor)?;
        lowerer.functions[handle.as_usize()].body = FunctionBody::Code(Rc::new(code));
    }

    if let Some(static_ctor) = lowerer.registry.class(class_id).static_ctor {
        let code = lowerer.lower_static_initializer(class_id, decl)?;
        lowerer.functions[static_ctor.as_usize()].body = FunctionBody::Code(Rc::new(code));
    }

    Ok(())
}

fn alloc_entry(
    functions: &mut Vec<FunctionEntry>,
    name: String,
    arity: usize,
    is_async: bool,
) -> FuncId {
    let id = FuncId(functions.len() as u32);
    functions.push(FunctionEntry {
        name,
        arity,
        is_async,
        body: FunctionBody::Open,
        awaits: None,
    });
    id
}
