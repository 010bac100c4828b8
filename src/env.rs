//! Environment / Scope Stack (C5).
//!
//! A method activation carries a stack of `let`/parameter frames plus two
//! fixed object-level references: `me` (the most-derived receiver, for
//! virtual dispatch) and `field_level` (the object level owned by the class
//! that lexically defines the method currently running, which is where
//! implicit field references resolve — see SPEC_FULL.md §F.2 for why this
//! is narrower than a full superclass walk).

use indexmap::IndexMap;

use crate::class::{assignment_compatible, ClassRegistry};
use crate::error::{InterpError, InterpResult};
use crate::object::ObjectRef;
use crate::value::{Field, TypeDesc, Value};

/// One `let`/parameter-binding scope. The innermost (most recently pushed)
/// frame is searched first.
#[derive(Debug, Default)]
pub struct Frame(pub IndexMap<String, Field>);

/// Everything needed to evaluate statements/expressions for one method
/// activation (spec §4.3/§4.5).
pub struct CallContext<'r> {
    pub registry: &'r ClassRegistry,
    frames: Vec<Frame>,
    pub me: ObjectRef,
    pub field_level: ObjectRef,
    pub depth: usize,
    pub max_depth: usize,
    /// Whether dispatch should trace each call through `HostIo::output`
    /// (SPEC_FULL.md §C), carried down from the top-level `Runner`.
    pub trace: bool,
}

impl<'r> CallContext<'r> {
    #[must_use]
    pub fn new(registry: &'r ClassRegistry, me: ObjectRef, field_level: ObjectRef, depth: usize, max_depth: usize, trace: bool) -> Self {
        Self { registry, frames: vec![Frame::default()], me, field_level, depth, max_depth, trace }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub fn declare_local(&mut self, field: Field) {
        self.frames
            .last_mut()
            .expect("at least one frame is always present")
            .0
            .insert(field.name.clone(), field);
    }

    /// `super` resolution (spec §4.3.4): the immediate superclass object of
    /// the class that defined the currently executing method, statically.
    pub fn super_obj(&self) -> InterpResult<ObjectRef> {
        self.field_level
            .borrow()
            .super_obj
            .clone()
            .ok_or_else(|| InterpError::ty("'super' used in a class with no superclass"))
    }

    /// Reads a variable by lookup order: innermost-out through frames, then
    /// the defining class's own field map (spec §4.3 points 1-2, narrowed
    /// per the Open Question resolution in SPEC_FULL.md §F.2).
    pub fn read(&self, name: &str) -> InterpResult<Value> {
        for frame in self.frames.iter().rev() {
            if let Some(field) = frame.0.get(name) {
                return Ok(field.value.clone());
            }
        }
        if let Some(field) = self.field_level.borrow().field(name) {
            return Ok(field.value.clone());
        }
        Err(InterpError::name(format!("undeclared identifier '{name}'")))
    }

    /// Writes a variable by the same lookup order, type-checking the new
    /// value against the resolved field's declared type (spec §4.3 "Writes").
    pub fn write(&mut self, name: &str, value: Value) -> InterpResult<()> {
        for frame in self.frames.iter_mut().rev() {
            if let Some(field) = frame.0.get_mut(name) {
                check_assignable(self.registry, &field.ty, &value, name)?;
                field.value = value;
                return Ok(());
            }
        }
        let mut level = self.field_level.borrow_mut();
        if let Some(field) = level.field_mut(name) {
            check_assignable(self.registry, &field.ty, &value, name)?;
            field.value = value;
            return Ok(());
        }
        Err(InterpError::name(format!("undeclared identifier '{name}'")))
    }
}

fn check_assignable(registry: &ClassRegistry, ty: &TypeDesc, value: &Value, name: &str) -> InterpResult<()> {
    if assignment_compatible(registry, ty, value) {
        Ok(())
    } else {
        Err(InterpError::ty(format!("cannot assign a value of tag '{}' to '{name}' of type '{ty}'", value.tag())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::instantiate;
    use crate::token::Node;

    fn leaf(s: &str) -> Node {
        Node::leaf(s)
    }

    fn registry_with_int_field() -> ClassRegistry {
        let program = vec![Node::list(vec![
            leaf("class"),
            leaf("a"),
            Node::list(vec![leaf("field"), leaf("int"), leaf("count"), leaf("0")]),
        ])];
        ClassRegistry::load(&program).unwrap()
    }

    #[test]
    fn a_local_shadows_a_field_of_the_same_name() {
        let registry = registry_with_int_field();
        let obj = instantiate(&registry, "a").unwrap();
        let mut ctx = CallContext::new(&registry, obj.clone(), obj, 0, 1000, false);
        ctx.declare_local(Field::new("count", TypeDesc::Int, Value::Int(99)));
        assert!(matches!(ctx.read("count"), Ok(Value::Int(99))));
    }

    #[test]
    fn writes_fall_through_to_the_field_map_when_no_local_shadows() {
        let registry = registry_with_int_field();
        let obj = instantiate(&registry, "a").unwrap();
        let mut ctx = CallContext::new(&registry, obj.clone(), obj.clone(), 0, 1000, false);
        ctx.write("count", Value::Int(7)).unwrap();
        assert!(matches!(obj.borrow().field("count").map(|f| f.value.clone()), Some(Value::Int(7))));
    }

    #[test]
    fn reading_an_undeclared_name_is_a_name_error() {
        let registry = registry_with_int_field();
        let obj = instantiate(&registry, "a").unwrap();
        let ctx = CallContext::new(&registry, obj.clone(), obj, 0, 1000, false);
        let err = ctx.read("ghost").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Name);
    }

    #[test]
    fn pop_frame_discards_locals_declared_in_it() {
        let registry = registry_with_int_field();
        let obj = instantiate(&registry, "a").unwrap();
        let mut ctx = CallContext::new(&registry, obj.clone(), obj, 0, 1000, false);
        ctx.push_frame();
        ctx.declare_local(Field::new("temp", TypeDesc::Int, Value::Int(1)));
        ctx.pop_frame();
        assert!(ctx.read("temp").is_err());
    }
}
