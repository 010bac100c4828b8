//! Object Instantiation (C4).
//!
//! Each class level in an inheritance chain gets its own, independently
//! constructed `Object`, linked through `super_obj` — spec §3 invariant 3
//! ("a field shadowed in a subclass does not overwrite the inherited one").
//! Object graphs may be cyclic through fields; per spec §9 / SPEC_FULL §G
//! this crate leaks such cycles rather than reclaiming them, the accepted
//! trade-off of a reference-counted heap with no cycle collector.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::class::ClassDef;
use crate::class::ClassRegistry;
use crate::error::InterpResult;
use crate::value::Field;

pub type ObjectRef = Rc<RefCell<Object>>;

/// A single level of an instantiated object: the fields and method table
/// belonging to one class in the chain, plus a link to the instantiated
/// superclass (if any).
#[derive(Debug)]
pub struct Object {
    pub class_name: String,
    pub def: Rc<ClassDef>,
    pub fields: IndexMap<String, Field>,
    pub super_obj: Option<ObjectRef>,
}

impl Object {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.get_mut(name)
    }
}

/// Instantiates a (possibly generic) class by name, specializing it first
/// if needed, then recursively instantiating its superclass chain.
pub fn instantiate(registry: &ClassRegistry, class_name: &str) -> InterpResult<ObjectRef> {
    let def = registry.resolve(class_name)?;
    build_level(registry, &def)
}

fn build_level(registry: &ClassRegistry, def: &Rc<ClassDef>) -> InterpResult<ObjectRef> {
    let super_obj = match &def.superclass {
        Some(super_name) => Some(instantiate(registry, super_name)?),
        None => None,
    };
    let fields = def
        .fields
        .iter()
        .map(|fd| (fd.name.clone(), Field::new(fd.name.clone(), fd.ty.clone(), fd.initial_value())))
        .collect();
    Ok(Rc::new(RefCell::new(Object { class_name: def.name.clone(), def: Rc::clone(def), fields, super_obj })))
}
