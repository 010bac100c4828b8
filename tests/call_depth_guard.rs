//! Tests for the method-call recursion depth guard.
//!
//! Without a bound, a method that calls itself unconditionally would
//! overflow the native Rust call stack before the interpreter gets a chance
//! to report anything. The guard turns that into an ordinary FAULT.

mod common;

use common::*;
use thicket::{CapturingIo, ErrorKind, Limits, Runner};

fn infinite_recursion_program() -> Vec<thicket::Node> {
    vec![class_decl(
        "main",
        None,
        vec![
            method_decl("void", "loop", vec![], call_expr(leaf("me"), "loop", vec![])),
            method_decl("void", "main", vec![], call_expr(leaf("me"), "loop", vec![])),
        ],
    )]
}

#[test]
fn unbounded_recursion_is_reported_as_a_fault_not_a_crash() {
    let mut host = CapturingIo::default();
    let err = Runner::new(Limits::default()).run(&infinite_recursion_program(), &mut host).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Fault);
}

#[test]
fn a_lower_max_call_depth_trips_sooner() {
    let program = vec![class_decl(
        "main",
        None,
        vec![
            method_decl(
                "void",
                "countdown",
                vec![("int", "n")],
                if_stmt(bin(">", leaf("n"), leaf("0")), call_expr(leaf("me"), "countdown", vec![bin("-", leaf("n"), leaf("1"))]), None),
            ),
            method_decl("void", "main", vec![], call_expr(leaf("me"), "countdown", vec![leaf("3")])),
        ],
    )];

    let mut host = CapturingIo::default();
    let err = Runner::new(Limits::default().max_call_depth(2)).run(&program, &mut host).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Fault);
}
