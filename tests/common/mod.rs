//! Small AST-construction helpers shared across the integration tests.
//!
//! There is no parser in this crate (see SPEC_FULL.md §A), so every test
//! program is built directly as a `Node` tree. These helpers spell out the
//! surface grammar (spec §4) without forcing every test to hand-nest
//! `Node::list`/`Node::leaf` calls.

#![allow(dead_code)]

use thicket::Node;

pub fn leaf(text: &str) -> Node {
    Node::leaf(text)
}

pub fn n(children: Vec<Node>) -> Node {
    Node::list(children)
}

pub fn class_decl(name: &str, superclass: Option<&str>, body: Vec<Node>) -> Node {
    let mut items = vec![leaf("class"), leaf(name)];
    if let Some(sup) = superclass {
        items.push(leaf("inherits"));
        items.push(leaf(sup));
    }
    items.extend(body);
    n(items)
}

pub fn tclass_decl(name: &str, params: Vec<&str>, body: Vec<Node>) -> Node {
    let mut items = vec![leaf("tclass"), leaf(name), n(params.into_iter().map(leaf).collect())];
    items.extend(body);
    n(items)
}

pub fn field_decl(ty: &str, name: &str, init: Option<&str>) -> Node {
    let mut items = vec![leaf("field"), leaf(ty), leaf(name)];
    if let Some(v) = init {
        items.push(leaf(v));
    }
    n(items)
}

pub fn method_decl(ret: &str, name: &str, params: Vec<(&str, &str)>, body: Node) -> Node {
    let param_nodes = params.into_iter().map(|(ty, nm)| n(vec![leaf(ty), leaf(nm)])).collect();
    n(vec![leaf("method"), leaf(ret), leaf(name), n(param_nodes), body])
}

pub fn begin(stmts: Vec<Node>) -> Node {
    let mut items = vec![leaf("begin")];
    items.extend(stmts);
    n(items)
}

pub fn call_expr(target: Node, method: &str, args: Vec<Node>) -> Node {
    let mut items = vec![leaf("call"), target, leaf(method)];
    items.extend(args);
    n(items)
}

pub fn print_stmt(args: Vec<Node>) -> Node {
    let mut items = vec![leaf("print")];
    items.extend(args);
    n(items)
}

pub fn set_stmt(var: &str, val: Node) -> Node {
    n(vec![leaf("set"), leaf(var), val])
}

pub fn if_stmt(cond: Node, then: Node, els: Option<Node>) -> Node {
    let mut items = vec![leaf("if"), cond, then];
    if let Some(e) = els {
        items.push(e);
    }
    n(items)
}

pub fn while_stmt(cond: Node, body: Node) -> Node {
    n(vec![leaf("while"), cond, body])
}

pub fn return_stmt(val: Option<Node>) -> Node {
    let mut items = vec![leaf("return")];
    if let Some(v) = val {
        items.push(v);
    }
    n(items)
}

pub fn new_expr(class_name: &str) -> Node {
    n(vec![leaf("new"), leaf(class_name)])
}

pub fn bin(op: &str, l: Node, r: Node) -> Node {
    n(vec![leaf(op), l, r])
}

pub fn var_decl(ty: &str, name: &str, init: Option<&str>) -> Node {
    let mut items = vec![leaf(ty), leaf(name)];
    if let Some(v) = init {
        items.push(leaf(v));
    }
    n(items)
}

pub fn let_stmt(decls: Vec<Node>, stmts: Vec<Node>) -> Node {
    let mut items = vec![leaf("let"), n(decls)];
    items.extend(stmts);
    n(items)
}

pub fn try_stmt(try_body: Node, catch_body: Option<Node>) -> Node {
    let mut items = vec![leaf("try"), try_body];
    if let Some(c) = catch_body {
        items.push(c);
    }
    n(items)
}

pub fn throw_stmt(message: Node) -> Node {
    n(vec![leaf("throw"), message])
}
