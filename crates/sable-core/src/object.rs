//! Object model: dynamic property storage and class instances.
//!
//! Instances do not use fixed field layouts. Each instance owns one
//! key→value map; instance fields live only in that map, and the
//! class descriptor never stores per-instance data. The map is
//! allocated before the superclass constructor runs, so a superclass
//! constructor observes every field write through its own body.

use std::cell::RefCell;

use indexmap::IndexMap;

use crate::registry::ClassId;
use crate::value::Value;

/// Property storage: string keys to values, insertion order preserved.
pub type PropMap = IndexMap<String, Value>;

/// A class instance.
#[derive(Debug)]
pub struct Instance {
    /// The instance's class (index into the class registry).
    pub class: ClassId,
    /// Dynamic field storage.
    pub fields: RefCell<PropMap>,
}

impl Instance {
    /// Allocate an instance of `class` with an empty field map.
    pub fn new(class: ClassId) -> Self {
        Self {
            class,
            fields: RefCell::new(PropMap::new()),
        }
    }

    /// Read a field; absent fields read as `None`.
    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    /// Write a field, creating it on first write.
    pub fn set_field(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }

    /// Check whether a field exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.borrow().contains_key(name)
    }

    /// Number of fields currently stored.
    pub fn field_count(&self) -> usize {
        self.fields.borrow().len()
    }
}
