//! Class registry: per-class metadata and virtual dispatch.
//!
//! The registry is populated at program load and immutable afterwards
//! (static field storage aside). Method handles are indices into the
//! compiled program's function table; the registry reserves and
//! validates them, the compiler attaches bodies. Declaration is split
//! from definition so method bodies can reference peers and ancestors
//! that have not been emitted yet.

use std::cell::{Cell, RefCell};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::error::DefineError;
use crate::object::PropMap;

/// Class identifier (index into the registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

impl ClassId {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Function/method handle (index into the program's function table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncId(pub u32);

impl FuncId {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Generic parameter descriptor recorded on a class.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericParamInfo {
    pub name: String,
    pub constraint: Option<String>,
}

/// Which dispatch table a method lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Instance,
    Static,
    Getter,
    Setter,
}

/// A declared method signature.
#[derive(Debug, Clone)]
pub struct MethodSig {
    /// Dispatch target. For abstract methods this is a trap that
    /// fails when invoked.
    pub handle: FuncId,
    /// Declared parameter count (receiver excluded).
    pub arity: usize,
    pub is_async: bool,
    pub is_abstract: bool,
}

/// Per-class metadata.
#[derive(Debug)]
pub struct ClassDescriptor {
    pub name: String,
    /// Superclass name as declared; resolved by [`ClassRegistry::link_hierarchy`].
    pub superclass_name: Option<String>,
    /// Resolved superclass id (valid after linking).
    pub superclass: Option<ClassId>,
    pub is_abstract: bool,
    pub generic_params: Vec<GenericParamInfo>,
    /// Virtual method table, in declaration order.
    pub vtable: IndexMap<String, MethodSig>,
    pub getters: IndexMap<String, MethodSig>,
    pub setters: IndexMap<String, MethodSig>,
    pub static_methods: IndexMap<String, MethodSig>,
    /// Static field storage; written by the synthetic static
    /// constructor and by user code.
    pub static_fields: RefCell<PropMap>,
    /// Constructor handle (every class gets one, synthesized if the
    /// source declares none).
    pub constructor: Option<FuncId>,
    /// Synthetic static constructor, if the class has static
    /// initializers.
    pub static_ctor: Option<FuncId>,
    /// Guard ensuring the static constructor runs exactly once,
    /// before the first static use or instantiation.
    pub static_initialized: Cell<bool>,
}

impl ClassDescriptor {
    fn new(
        name: String,
        superclass_name: Option<String>,
        is_abstract: bool,
        generic_params: Vec<GenericParamInfo>,
    ) -> Self {
        Self {
            name,
            superclass_name,
            superclass: None,
            is_abstract,
            generic_params,
            vtable: IndexMap::new(),
            getters: IndexMap::new(),
            setters: IndexMap::new(),
            static_methods: IndexMap::new(),
            static_fields: RefCell::new(PropMap::new()),
            constructor: None,
            static_ctor: None,
            static_initialized: Cell::new(false),
        }
    }
}

/// The program-wide class registry.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: Vec<ClassDescriptor>,
    by_name: FxHashMap<String, ClassId>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a class. The superclass is recorded by name and
    /// resolved later so declaration order does not matter.
    pub fn declare_class(
        &mut self,
        name: &str,
        superclass: Option<&str>,
        is_abstract: bool,
        generic_params: Vec<GenericParamInfo>,
    ) -> Result<ClassId, DefineError> {
        if self.by_name.contains_key(name) {
            return Err(DefineError::DuplicateClass {
                name: name.to_string(),
            });
        }
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(ClassDescriptor::new(
            name.to_string(),
            superclass.map(str::to_string),
            is_abstract,
            generic_params,
        ));
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Resolve every declared superclass name to a class id and
    /// reject unknown names and inheritance cycles.
    pub fn link_hierarchy(&mut self) -> Result<(), DefineError> {
        for i in 0..self.classes.len() {
            if let Some(super_name) = self.classes[i].superclass_name.clone() {
                let super_id = self.lookup(&super_name).ok_or(DefineError::UnknownSuperclass {
                    class: self.classes[i].name.clone(),
                    superclass: super_name.clone(),
                })?;
                self.classes[i].superclass = Some(super_id);
            }
        }
        // Cycle check: walk each chain; a chain longer than the class
        // count must revisit a class.
        for start in 0..self.classes.len() {
            let mut current = Some(ClassId(start as u32));
            let mut steps = 0;
            while let Some(id) = current {
                steps += 1;
                if steps > self.classes.len() {
                    return Err(DefineError::InheritanceCycle {
                        class: self.classes[start].name.clone(),
                    });
                }
                current = self.classes[id.as_usize()].superclass;
            }
        }
        Ok(())
    }

    /// Reserve a method signature on a class.
    ///
    /// Override validation happens here, at definition time: a method
    /// marked `override` must have a same-named entry reachable
    /// through the superclass chain, the class must have a
    /// superclass, and `override` is rejected on static methods.
    /// Requires ancestors' methods to be declared first; the compiler
    /// declares classes in inheritance order.
    pub fn declare_method(
        &mut self,
        class: ClassId,
        name: &str,
        kind: MethodKind,
        sig: MethodSig,
        is_override: bool,
    ) -> Result<(), DefineError> {
        let class_name = self.classes[class.as_usize()].name.clone();
        if is_override {
            if kind == MethodKind::Static {
                return Err(DefineError::OverrideOnStatic {
                    class: class_name,
                    method: name.to_string(),
                });
            }
            let superclass = self.classes[class.as_usize()].superclass;
            let Some(superclass) = superclass else {
                return Err(DefineError::OverrideWithoutSuperclass {
                    class: class_name,
                    method: name.to_string(),
                });
            };
            let parent_entry = match kind {
                MethodKind::Instance => self.resolve_virtual(superclass, name),
                MethodKind::Getter => self.resolve_getter(superclass, name),
                MethodKind::Setter => self.resolve_setter(superclass, name),
                MethodKind::Static => unreachable!(),
            };
            if parent_entry.is_none() {
                return Err(DefineError::OverrideMismatch {
                    class: class_name,
                    method: name.to_string(),
                });
            }
        }

        let table = match kind {
            MethodKind::Instance => &mut self.classes[class.as_usize()].vtable,
            MethodKind::Static => &mut self.classes[class.as_usize()].static_methods,
            MethodKind::Getter => &mut self.classes[class.as_usize()].getters,
            MethodKind::Setter => &mut self.classes[class.as_usize()].setters,
        };
        if table.contains_key(name) {
            return Err(DefineError::DuplicateMethod {
                class: class_name,
                method: name.to_string(),
            });
        }
        table.insert(name.to_string(), sig);
        Ok(())
    }

    /// Record the class's constructor handle.
    pub fn set_constructor(&mut self, class: ClassId, handle: FuncId) {
        self.classes[class.as_usize()].constructor = Some(handle);
    }

    /// Record the class's synthetic static constructor handle.
    pub fn set_static_constructor(&mut self, class: ClassId, handle: FuncId) {
        self.classes[class.as_usize()].static_ctor = Some(handle);
    }

    /// Look up a class by name.
    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// Get a class descriptor.
    pub fn class(&self, id: ClassId) -> &ClassDescriptor {
        &self.classes[id.as_usize()]
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Walk the superclass chain and return the first instance method
    /// matching `name`. Callers treat the result as the dispatch
    /// target (late binding).
    pub fn resolve_virtual(&self, class: ClassId, name: &str) -> Option<&MethodSig> {
        self.resolve_in(class, name, |c| &c.vtable)
    }

    /// Resolve a getter through the superclass chain.
    pub fn resolve_getter(&self, class: ClassId, name: &str) -> Option<&MethodSig> {
        self.resolve_in(class, name, |c| &c.getters)
    }

    /// Resolve a setter through the superclass chain.
    pub fn resolve_setter(&self, class: ClassId, name: &str) -> Option<&MethodSig> {
        self.resolve_in(class, name, |c| &c.setters)
    }

    /// Resolve a static method through the superclass chain.
    pub fn resolve_static(&self, class: ClassId, name: &str) -> Option<&MethodSig> {
        self.resolve_in(class, name, |c| &c.static_methods)
    }

    fn resolve_in(
        &self,
        class: ClassId,
        name: &str,
        table: impl Fn(&ClassDescriptor) -> &IndexMap<String, MethodSig>,
    ) -> Option<&MethodSig> {
        let mut current = Some(class);
        while let Some(id) = current {
            let descriptor = &self.classes[id.as_usize()];
            if let Some(sig) = table(descriptor).get(name) {
                return Some(sig);
            }
            current = descriptor.superclass;
        }
        None
    }

    /// Iterate over class ids in inheritance order: every class is
    /// visited after its superclass.
    pub fn inheritance_order(&self) -> Vec<ClassId> {
        let mut order = Vec::with_capacity(self.classes.len());
        let mut visited = vec![false; self.classes.len()];
        for i in 0..self.classes.len() {
            self.visit_ancestors_first(ClassId(i as u32), &mut visited, &mut order);
        }
        order
    }

    fn visit_ancestors_first(&self, id: ClassId, visited: &mut [bool], order: &mut Vec<ClassId>) {
        if visited[id.as_usize()] {
            return;
        }
        visited[id.as_usize()] = true;
        if let Some(parent) = self.classes[id.as_usize()].superclass {
            self.visit_ancestors_first(parent, visited, order);
        }
        order.push(id);
    }
}
