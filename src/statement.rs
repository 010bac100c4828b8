//! Statement Evaluator (C6): dispatches every statement form, threading the
//! exception/return signal described in spec §4.6.

use crate::class::assignment_compatible;
use crate::env::CallContext;
use crate::error::{Flow, InterpError, InterpResult};
use crate::expression::eval_expr;
use crate::host::HostIo;
use crate::literal::parse_literal_token;
use crate::token::Node;
use crate::value::{Field, Value};

/// What a statement produced, besides a possible fatal error or thrown
/// exception (both folded into the surrounding `Flow`/`InterpResult`).
#[derive(Debug)]
pub enum StmtSignal {
    Normal,
    /// `None` for a bare `return` (or falling off the end of a body);
    /// `Some` for `return EXPR`. Distinguishing the two lets the caller
    /// (C8) reject a value returned from a `void` method (spec §4.5.5)
    /// while still defaulting a bare `return` to the declared type.
    Return(Option<Value>),
}

pub type StmtResult = InterpResult<Flow<StmtSignal>>;

pub fn eval_stmt(ctx: &mut CallContext, node: &Node, host: &mut dyn HostIo) -> StmtResult {
    let items = node.items().ok_or_else(|| InterpError::syntax("statement must be a list").at_line(node.line()))?;
    let line = node.line();
    match items.first().and_then(Node::text) {
        Some("begin") => eval_begin(ctx, &items[1..], host),
        Some("set") => eval_set(ctx, items, host, line),
        Some("if") => eval_if(ctx, items, host, line),
        Some("while") => eval_while(ctx, items, host, line),
        Some("return") => eval_return(ctx, items, host),
        Some("print") => eval_print(ctx, &items[1..], host),
        Some("inputi") => eval_input(ctx, items, host, line, true),
        Some("inputs") => eval_input(ctx, items, host, line, false),
        Some("let") => eval_let(ctx, items, host, line),
        Some("try") => eval_try(ctx, items, host, line),
        Some("throw") => eval_throw(ctx, items, host, line),
        // `call`/`new` (and anything else) are expression forms evaluated
        // for effect; their value is discarded, their exception propagates.
        _ => match eval_expr(ctx, node, host)? {
            Flow::Value(_) => Ok(Flow::Value(StmtSignal::Normal)),
            Flow::Thrown(e) => Ok(Flow::Thrown(e)),
        },
    }
}

fn eval_begin(ctx: &mut CallContext, stmts: &[Node], host: &mut dyn HostIo) -> StmtResult {
    for stmt in stmts {
        match eval_stmt(ctx, stmt, host)? {
            Flow::Value(StmtSignal::Normal) => continue,
            other => return Ok(other),
        }
    }
    Ok(Flow::Value(StmtSignal::Normal))
}

/// Evaluates an expression, returning early (as this statement's own
/// result) the moment it throws — the shared propagation helper every
/// statement form with sub-expressions uses (spec §4.6 exception rule).
fn eval_operand(ctx: &mut CallContext, node: &Node, host: &mut dyn HostIo) -> Result<Value, StmtResult> {
    match eval_expr(ctx, node, host) {
        Ok(Flow::Value(v)) => Ok(v),
        Ok(Flow::Thrown(e)) => Err(Ok(Flow::Thrown(e))),
        Err(err) => Err(Err(err)),
    }
}

fn eval_set(ctx: &mut CallContext, items: &[Node], host: &mut dyn HostIo, line: Option<u32>) -> StmtResult {
    let lval = items.get(1).and_then(Node::text).ok_or_else(|| InterpError::syntax("set requires an lvalue").at_line(line))?;
    let rhs = items.get(2).ok_or_else(|| InterpError::syntax("set requires a value").at_line(line))?;
    let value = match eval_operand(ctx, rhs, host) {
        Ok(v) => v,
        Err(result) => return result,
    };
    ctx.write(lval, value)?;
    Ok(Flow::Value(StmtSignal::Normal))
}

fn eval_if(ctx: &mut CallContext, items: &[Node], host: &mut dyn HostIo, line: Option<u32>) -> StmtResult {
    let pred = items.get(1).ok_or_else(|| InterpError::syntax("if requires a predicate").at_line(line))?;
    let then_branch = items.get(2).ok_or_else(|| InterpError::syntax("if requires a then-branch").at_line(line))?;
    let cond = match eval_operand(ctx, pred, host) {
        Ok(v) => v,
        Err(result) => return result,
    };
    let Value::Bool(b) = cond else {
        return Err(InterpError::ty("if predicate must be bool").at_line(line));
    };
    if b {
        eval_stmt(ctx, then_branch, host)
    } else if let Some(else_branch) = items.get(3) {
        eval_stmt(ctx, else_branch, host)
    } else {
        Ok(Flow::Value(StmtSignal::Normal))
    }
}

fn eval_while(ctx: &mut CallContext, items: &[Node], host: &mut dyn HostIo, line: Option<u32>) -> StmtResult {
    let pred = items.get(1).ok_or_else(|| InterpError::syntax("while requires a predicate").at_line(line))?;
    let body = items.get(2).ok_or_else(|| InterpError::syntax("while requires a body").at_line(line))?;
    loop {
        let cond = match eval_operand(ctx, pred, host) {
            Ok(v) => v,
            Err(result) => return result,
        };
        let Value::Bool(b) = cond else {
            return Err(InterpError::ty("while predicate must be bool").at_line(line));
        };
        if !b {
            return Ok(Flow::Value(StmtSignal::Normal));
        }
        match eval_stmt(ctx, body, host)? {
            Flow::Value(StmtSignal::Normal) => continue,
            other => return Ok(other),
        }
    }
}

fn eval_return(ctx: &mut CallContext, items: &[Node], host: &mut dyn HostIo) -> StmtResult {
    match items.get(1) {
        None => Ok(Flow::Value(StmtSignal::Return(None))),
        Some(expr) => match eval_operand(ctx, expr, host) {
            Ok(v) => Ok(Flow::Value(StmtSignal::Return(Some(v)))),
            Err(result) => result,
        },
    }
}

fn eval_print(ctx: &mut CallContext, operands: &[Node], host: &mut dyn HostIo) -> StmtResult {
    let mut line = String::new();
    for operand in operands {
        let value = match eval_operand(ctx, operand, host) {
            Ok(v) => v,
            Err(result) => return result,
        };
        line.push_str(&value.display_string());
    }
    host.output(&line);
    Ok(Flow::Value(StmtSignal::Normal))
}

fn eval_input(ctx: &mut CallContext, items: &[Node], host: &mut dyn HostIo, line: Option<u32>, is_int: bool) -> StmtResult {
    let var = items.get(1).and_then(Node::text).ok_or_else(|| InterpError::syntax("input requires a variable").at_line(line))?;
    let text = host.read_line();
    let value = if is_int {
        text.trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| InterpError::fault(format!("'{text}' is not a valid integer")).at_line(line))?
    } else {
        Value::Str(text)
    };
    ctx.write(var, value)?;
    Ok(Flow::Value(StmtSignal::Normal))
}

fn eval_let(ctx: &mut CallContext, items: &[Node], host: &mut dyn HostIo, line: Option<u32>) -> StmtResult {
    let decls = items.get(1).and_then(Node::items).ok_or_else(|| InterpError::syntax("let requires a binding list").at_line(line))?;

    ctx.push_frame();
    let result = (|| -> StmtResult {
        let mut declared = std::collections::HashSet::new();
        for decl in decls {
            let parts = decl.items().ok_or_else(|| InterpError::syntax("let binding must be (TYPE NAME [INIT])").at_line(line))?;
            let ty_text = parts.first().and_then(Node::text).ok_or_else(|| InterpError::syntax("missing binding type").at_line(line))?;
            let name = parts.get(1).and_then(Node::text).ok_or_else(|| InterpError::syntax("missing binding name").at_line(line))?;
            if !declared.insert(name.to_owned()) {
                return Err(InterpError::name(format!("duplicate local '{name}' in let")).at_line(line));
            }
            let ty = ctx
                .registry
                .parse_type(ty_text, &[])
                .ok_or_else(|| InterpError::ty(format!("undeclared class '{ty_text}'")).at_line(line))?;

            let field = match parts.get(2) {
                None => Field::default_for(name, ty),
                Some(init) => {
                    let text = init.text().ok_or_else(|| InterpError::syntax("let initializer must be a literal").at_line(line))?;
                    let value = parse_literal_token(text).ok_or_else(|| InterpError::ty(format!("invalid literal '{text}'")).at_line(line))?;
                    if !assignment_compatible(ctx.registry, &ty, &value) {
                        return Err(InterpError::ty(format!("incompatible initializer for '{name}'")).at_line(line));
                    }
                    Field::new(name, ty, value)
                }
            };
            ctx.declare_local(field);
        }

        let mut outcome = Ok(Flow::Value(StmtSignal::Normal));
        for stmt in &items[2..] {
            outcome = eval_stmt(ctx, stmt, host);
            match &outcome {
                Ok(Flow::Value(StmtSignal::Normal)) => continue,
                _ => break,
            }
        }
        outcome
    })();
    ctx.pop_frame();
    result
}

fn eval_try(ctx: &mut CallContext, items: &[Node], host: &mut dyn HostIo, line: Option<u32>) -> StmtResult {
    let try_stmt = items.get(1).ok_or_else(|| InterpError::syntax("try requires a body").at_line(line))?;
    match eval_stmt(ctx, try_stmt, host)? {
        Flow::Thrown(exception) => match items.get(2) {
            None => Ok(Flow::Thrown(exception)),
            Some(catch_stmt) => {
                ctx.push_frame();
                ctx.declare_local(Field::new("exception", crate::value::TypeDesc::String, Value::Str(exception.0)));
                let result = eval_stmt(ctx, catch_stmt, host);
                ctx.pop_frame();
                result
            }
        },
        other => Ok(other),
    }
}

fn eval_throw(ctx: &mut CallContext, items: &[Node], host: &mut dyn HostIo, line: Option<u32>) -> StmtResult {
    let expr = items.get(1).ok_or_else(|| InterpError::syntax("throw requires a value").at_line(line))?;
    let value = match eval_operand(ctx, expr, host) {
        Ok(v) => v,
        Err(result) => return result,
    };
    let Value::Str(message) = value else {
        return Err(InterpError::ty("throw requires a string value").at_line(line));
    };
    Ok(Flow::Thrown(crate::error::LangException(message)))
}
