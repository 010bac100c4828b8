//! Expression Evaluator (C7): literals, variable references, operators,
//! `new`, and `call` (spec §4.7).

use crate::class::equality_compatible;
use crate::dispatch::call_method;
use crate::env::CallContext;
use crate::error::{ExprResult, Flow, InterpError};
use crate::host::HostIo;
use crate::literal::parse_literal_token;
use crate::object::instantiate;
use crate::token::Node;
use crate::value::Value;

pub fn eval_expr(ctx: &mut CallContext, node: &Node, host: &mut dyn HostIo) -> ExprResult<Value> {
    match node {
        Node::Leaf(tok) => eval_leaf(ctx, &tok.text),
        Node::List(items) => {
            let line = node.line();
            let head = items.first().and_then(Node::text).ok_or_else(|| InterpError::syntax("expression must start with an operator").at_line(line))?;
            match head {
                "+" | "-" | "*" | "/" | "%" => eval_arith(ctx, head, items, host, line),
                "<" | ">" | "<=" | ">=" => eval_compare(ctx, head, items, host, line),
                "==" | "!=" => eval_equality(ctx, head, items, host, line),
                "&" | "|" => eval_logical(ctx, head, items, host, line),
                "!" => eval_not(ctx, items, host, line),
                "new" => eval_new(ctx, items, line),
                "call" => eval_call(ctx, items, host, line),
                other => Err(InterpError::syntax(format!("unknown expression form '{other}'")).at_line(line)),
            }
        }
    }
}

fn eval_leaf(ctx: &mut CallContext, text: &str) -> ExprResult<Value> {
    if let Some(value) = parse_literal_token(text) {
        return Ok(Flow::Value(value));
    }
    match text {
        "me" => Ok(Flow::Value(Value::Object(ctx.me.clone()))),
        "super" => Ok(Flow::Value(Value::Object(ctx.super_obj()?))),
        name => Ok(Flow::Value(ctx.read(name)?)),
    }
}

/// Evaluates a sub-expression, unwrapping its normal value or short-circuiting
/// this call's own result the moment it throws (the expression-level analogue
/// of `statement::eval_operand`).
fn operand(ctx: &mut CallContext, node: &Node, host: &mut dyn HostIo) -> Result<Value, ExprResult<Value>> {
    match eval_expr(ctx, node, host) {
        Ok(Flow::Value(v)) => Ok(v),
        Ok(Flow::Thrown(e)) => Err(Ok(Flow::Thrown(e))),
        Err(err) => Err(Err(err)),
    }
}

fn eval_arith(ctx: &mut CallContext, op: &str, items: &[Node], host: &mut dyn HostIo, line: Option<u32>) -> ExprResult<Value> {
    let lhs_node = items.get(1).ok_or_else(|| InterpError::syntax(format!("'{op}' requires a left operand")).at_line(line))?;
    let rhs_node = items.get(2).ok_or_else(|| InterpError::syntax(format!("'{op}' requires a right operand")).at_line(line))?;
    let lhs = match operand(ctx, lhs_node, host) {
        Ok(v) => v,
        Err(result) => return result,
    };
    let rhs = match operand(ctx, rhs_node, host) {
        Ok(v) => v,
        Err(result) => return result,
    };

    let value = match (op, &lhs, &rhs) {
        ("+", Value::Int(a), Value::Int(b)) => Value::Int(a + b),
        ("+", Value::Str(a), Value::Str(b)) => Value::Str(format!("{a}{b}")),
        ("-", Value::Int(a), Value::Int(b)) => Value::Int(a - b),
        ("*", Value::Int(a), Value::Int(b)) => Value::Int(a * b),
        ("/", Value::Int(_), Value::Int(0)) => return Err(InterpError::fault("division by zero").at_line(line)),
        ("/", Value::Int(a), Value::Int(b)) => Value::Int(a / b),
        ("%", Value::Int(_), Value::Int(0)) => return Err(InterpError::fault("division by zero").at_line(line)),
        ("%", Value::Int(a), Value::Int(b)) => Value::Int(a % b),
        _ => {
            return Err(InterpError::ty(format!("'{op}' is not defined for '{}' and '{}'", lhs.tag(), rhs.tag())).at_line(line));
        }
    };
    Ok(Flow::Value(value))
}

fn eval_compare(ctx: &mut CallContext, op: &str, items: &[Node], host: &mut dyn HostIo, line: Option<u32>) -> ExprResult<Value> {
    let lhs_node = items.get(1).ok_or_else(|| InterpError::syntax(format!("'{op}' requires a left operand")).at_line(line))?;
    let rhs_node = items.get(2).ok_or_else(|| InterpError::syntax(format!("'{op}' requires a right operand")).at_line(line))?;
    let lhs = match operand(ctx, lhs_node, host) {
        Ok(v) => v,
        Err(result) => return result,
    };
    let rhs = match operand(ctx, rhs_node, host) {
        Ok(v) => v,
        Err(result) => return result,
    };
    let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) else {
        return Err(InterpError::ty(format!("'{op}' requires int operands, got '{}' and '{}'", lhs.tag(), rhs.tag())).at_line(line));
    };
    let result = match op {
        "<" => a < b,
        ">" => a > b,
        "<=" => a <= b,
        ">=" => a >= b,
        _ => unreachable!("matched in eval_expr"),
    };
    Ok(Flow::Value(Value::Bool(result)))
}

fn eval_equality(ctx: &mut CallContext, op: &str, items: &[Node], host: &mut dyn HostIo, line: Option<u32>) -> ExprResult<Value> {
    let lhs_node = items.get(1).ok_or_else(|| InterpError::syntax(format!("'{op}' requires a left operand")).at_line(line))?;
    let rhs_node = items.get(2).ok_or_else(|| InterpError::syntax(format!("'{op}' requires a right operand")).at_line(line))?;
    let lhs = match operand(ctx, lhs_node, host) {
        Ok(v) => v,
        Err(result) => return result,
    };
    let rhs = match operand(ctx, rhs_node, host) {
        Ok(v) => v,
        Err(result) => return result,
    };
    if !equality_compatible(ctx.registry, &lhs, &rhs) {
        return Err(InterpError::ty(format!("'{op}' is not defined for '{}' and '{}'", lhs.tag(), rhs.tag())).at_line(line));
    }
    let eq = values_equal(&lhs, &rhs);
    Ok(Flow::Value(Value::Bool(if op == "==" { eq } else { !eq })))
}

/// Structural equality (spec §4.7) once `equality_compatible` has already
/// ruled the pair admissible: `null` compares equal only to `null`, and two
/// objects are equal only by reference identity.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Null, Value::Null) => true,
        (Value::Object(x), Value::Object(y)) => std::rc::Rc::ptr_eq(x, y),
        _ => false,
    }
}

fn eval_logical(ctx: &mut CallContext, op: &str, items: &[Node], host: &mut dyn HostIo, line: Option<u32>) -> ExprResult<Value> {
    let lhs_node = items.get(1).ok_or_else(|| InterpError::syntax(format!("'{op}' requires a left operand")).at_line(line))?;
    let rhs_node = items.get(2).ok_or_else(|| InterpError::syntax(format!("'{op}' requires a right operand")).at_line(line))?;
    let lhs = match operand(ctx, lhs_node, host) {
        Ok(v) => v,
        Err(result) => return result,
    };
    let rhs = match operand(ctx, rhs_node, host) {
        Ok(v) => v,
        Err(result) => return result,
    };
    let (Value::Bool(a), Value::Bool(b)) = (&lhs, &rhs) else {
        return Err(InterpError::ty(format!("'{op}' requires bool operands, got '{}' and '{}'", lhs.tag(), rhs.tag())).at_line(line));
    };
    let result = match op {
        "&" => *a && *b,
        "|" => *a || *b,
        _ => unreachable!("matched in eval_expr"),
    };
    Ok(Flow::Value(Value::Bool(result)))
}

fn eval_not(ctx: &mut CallContext, items: &[Node], host: &mut dyn HostIo, line: Option<u32>) -> ExprResult<Value> {
    let operand_node = items.get(1).ok_or_else(|| InterpError::syntax("'!' requires an operand").at_line(line))?;
    let value = match operand(ctx, operand_node, host) {
        Ok(v) => v,
        Err(result) => return result,
    };
    let Value::Bool(b) = value else {
        return Err(InterpError::ty(format!("'!' requires a bool operand, got '{}'", value.tag())).at_line(line));
    };
    Ok(Flow::Value(Value::Bool(!b)))
}

fn eval_new(ctx: &mut CallContext, items: &[Node], line: Option<u32>) -> ExprResult<Value> {
    let class_name = items.get(1).and_then(Node::text).ok_or_else(|| InterpError::syntax("new requires a class name").at_line(line))?;
    let obj = instantiate(ctx.registry, class_name)?;
    Ok(Flow::Value(Value::Object(obj)))
}

fn eval_call(ctx: &mut CallContext, items: &[Node], host: &mut dyn HostIo, line: Option<u32>) -> ExprResult<Value> {
    let target_node = items.get(1).ok_or_else(|| InterpError::syntax("call requires a target").at_line(line))?;
    let method_name = items.get(2).and_then(Node::text).ok_or_else(|| InterpError::syntax("call requires a method name").at_line(line))?;
    let is_super_call = target_node.text() == Some("super");

    let target = match operand(ctx, target_node, host) {
        Ok(v) => v,
        Err(result) => return result,
    };
    let search_start = match target {
        Value::Object(obj) => obj,
        Value::Null => return Err(InterpError::fault("call on a null reference").at_line(line)),
        other => return Err(InterpError::ty(format!("call target must be an object, got '{}'", other.tag())).at_line(line)),
    };
    // `(call super NAME ...)` starts the overload search one level up from
    // `me`, but `me` itself must stay the original most-derived receiver so
    // dispatch from inside the superclass method still reaches overrides
    // below it (spec §8 invariant 3).
    let me = if is_super_call { ctx.me.clone() } else { search_start.clone() };

    let mut args = Vec::with_capacity(items.len().saturating_sub(3));
    for arg_node in &items[3..] {
        match operand(ctx, arg_node, host) {
            Ok(v) => args.push(v),
            Err(result) => return result,
        }
    }

    call_method(ctx.registry, &search_start, &me, method_name, args, host, ctx.depth, ctx.max_depth, ctx.trace)
}
