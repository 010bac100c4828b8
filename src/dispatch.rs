//! Method Dispatch (C8): polymorphic lookup up the superclass chain and
//! overload resolution by argument types.

use crate::class::{assignment_compatible, resolve_overload, ClassRegistry};
use crate::env::CallContext;
use crate::error::{ErrorKind, Flow, InterpError, InterpResult};
use crate::host::HostIo;
use crate::object::ObjectRef;
use crate::statement;
use crate::value::{Field, Value};

const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

#[must_use]
pub fn default_max_call_depth() -> usize {
    DEFAULT_MAX_CALL_DEPTH
}

/// Resolves and invokes `method_name` starting the overload search at
/// `search_start`, with `args` already evaluated (spec §4.5). `depth`/
/// `max_depth` guard against native stack overflow on deeply recursive
/// programs.
///
/// `search_start` and `me` coincide for an ordinary call (the resolved
/// receiver is already the most-derived object). They diverge for
/// `(call super NAME ...)`: `search_start` is the super-level sub-object the
/// search must begin one level above, but `me` stays the original
/// most-derived receiver, so a `(call me OTHER)` inside the superclass
/// method still reaches an override below the level it was invoked through
/// (spec §8 invariant 3).
#[allow(clippy::too_many_arguments)]
pub fn call_method(
    registry: &ClassRegistry,
    search_start: &ObjectRef,
    me: &ObjectRef,
    method_name: &str,
    args: Vec<Value>,
    host: &mut dyn HostIo,
    depth: usize,
    max_depth: usize,
    trace: bool,
) -> InterpResult<Flow<Value>> {
    if depth >= max_depth {
        return Err(InterpError::fault("maximum call depth exceeded"));
    }

    let (found_level, method) = find_overload(registry, search_start, method_name, &args)?;

    if trace {
        host.output(&format!("trace: {}.{method_name}", found_level.borrow().class_name));
    }

    let mut ctx = CallContext::new(registry, me.clone(), found_level, depth + 1, max_depth, trace);
    for (param, arg) in method.params.iter().zip(args.iter()) {
        if !assignment_compatible(registry, &param.ty, arg) {
            return Err(InterpError::ty(format!(
                "argument for parameter '{}' of '{method_name}' has incompatible type",
                param.name
            )));
        }
        ctx.declare_local(Field::new(param.name.clone(), param.ty.clone(), arg.clone()));
    }

    let outcome = statement::eval_stmt(&mut ctx, &method.body, host)?;
    let returned = match outcome {
        Flow::Thrown(e) => return Ok(Flow::Thrown(e)),
        Flow::Value(statement::StmtSignal::Normal) => None,
        Flow::Value(statement::StmtSignal::Return(v)) => v,
    };

    // A `void` method must not return a value (spec §4.5.5); every other
    // method substitutes its return type's default on an empty `return`.
    if method.ret == crate::value::TypeDesc::Void {
        if returned.is_some() {
            return Err(InterpError::ty(format!("method '{method_name}' declared void must not return a value")));
        }
        return Ok(Flow::Value(Value::Null));
    }
    let result_value = returned.unwrap_or_else(|| method.ret.default_value());
    if !assignment_compatible(registry, &method.ret, &result_value) {
        return Err(InterpError::new(
            ErrorKind::Type,
            format!("return value of '{method_name}' incompatible with declared type '{}'", method.ret),
        ));
    }
    Ok(Flow::Value(result_value))
}

fn find_overload(
    registry: &ClassRegistry,
    search_start: &ObjectRef,
    method_name: &str,
    args: &[Value],
) -> InterpResult<(ObjectRef, crate::class::MethodDecl)> {
    let mut level = search_start.clone();
    loop {
        let found = {
            let obj = level.borrow();
            obj.def
                .methods
                .get(method_name)
                .and_then(|overloads| resolve_overload(registry, overloads, args))
                .cloned()
        };
        if let Some(method) = found {
            return Ok((level, method));
        }
        let next = level.borrow().super_obj.clone();
        match next {
            Some(next_level) => level = next_level,
            None => return Err(crate::class::no_matching_overload(method_name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CapturingIo;
    use crate::object::instantiate;
    use crate::token::Node;

    fn leaf(s: &str) -> Node {
        Node::leaf(s)
    }

    fn method(ret: &str, name: &str, body: Node) -> Node {
        Node::list(vec![Node::leaf("method"), Node::leaf(ret), Node::leaf(name), Node::list(vec![]), body])
    }

    fn class(name: &str, superclass: Option<&str>, members: Vec<Node>) -> Node {
        let mut items = vec![leaf("class"), leaf(name)];
        if let Some(sup) = superclass {
            items.push(leaf("inherits"));
            items.push(leaf(sup));
        }
        items.extend(members);
        Node::list(items)
    }

    #[test]
    fn dispatch_walks_up_to_an_inherited_method_when_the_subclass_has_none() {
        let program = vec![
            class("base", None, vec![method("int", "value", Node::list(vec![leaf("return"), leaf("7")]))]),
            class("derived", Some("base"), vec![]),
        ];
        let registry = ClassRegistry::load(&program).unwrap();
        let obj = instantiate(&registry, "derived").unwrap();
        let mut host = CapturingIo::default();
        let result = call_method(&registry, &obj, &obj, "value", vec![], &mut host, 0, 1000, false).unwrap();
        assert!(matches!(result, Flow::Value(Value::Int(7))));
    }

    #[test]
    fn a_void_method_that_returns_a_value_is_rejected() {
        let program = vec![class("a", None, vec![method("void", "bad", Node::list(vec![leaf("return"), leaf("1")]))])];
        let registry = ClassRegistry::load(&program).unwrap();
        let obj = instantiate(&registry, "a").unwrap();
        let mut host = CapturingIo::default();
        let err = call_method(&registry, &obj, &obj, "bad", vec![], &mut host, 0, 1000, false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn calling_an_undefined_method_is_a_name_error() {
        let program = vec![class("a", None, vec![])];
        let registry = ClassRegistry::load(&program).unwrap();
        let obj = instantiate(&registry, "a").unwrap();
        let mut host = CapturingIo::default();
        let err = call_method(&registry, &obj, &obj, "ghost", vec![], &mut host, 0, 1000, false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Name);
    }

    #[test]
    fn exceeding_the_call_depth_limit_is_a_fault() {
        let program = vec![class("a", None, vec![method("void", "noop", Node::list(vec![leaf("begin")]))])];
        let registry = ClassRegistry::load(&program).unwrap();
        let obj = instantiate(&registry, "a").unwrap();
        let mut host = CapturingIo::default();
        let err = call_method(&registry, &obj, &obj, "noop", vec![], &mut host, 5, 5, false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Fault);
    }
}
