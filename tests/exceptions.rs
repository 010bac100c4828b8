//! `throw`/`try` exception propagation (spec §4.6), and what happens when a
//! `throw` escapes uncaught all the way out of `main`.

mod common;

use common::*;
use thicket::{CapturingIo, ErrorKind, Limits, Runner};

#[test]
fn catches_a_thrown_exception_and_binds_its_message() {
    let program = vec![class_decl(
        "main",
        None,
        vec![method_decl(
            "void",
            "main",
            vec![],
            try_stmt(throw_stmt(leaf("\"boom\"")), Some(print_stmt(vec![leaf("exception")]))),
        )],
    )];

    let mut host = CapturingIo::default();
    Runner::new(Limits::default()).run(&program, &mut host).unwrap();
    assert_eq!(host.joined_output(), "boom");
}

/// A `try` with no matching `catch` body propagates the exception further up
/// (here: straight out of `main`, which makes it a fatal FAULT at the top
/// level rather than a recoverable language value).
#[test]
fn uncaught_exception_is_reported_as_a_fault() {
    let program = vec![class_decl("main", None, vec![method_decl("void", "main", vec![], throw_stmt(leaf("\"boom\"")))])];

    let mut host = CapturingIo::default();
    let err = Runner::new(Limits::default()).run(&program, &mut host).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Fault);
    assert!(host.last_error.is_some());
}

/// An exception thrown inside a nested method call unwinds through every
/// intervening call frame until a `try` catches it.
#[test]
fn exception_unwinds_through_nested_calls() {
    let program = vec![class_decl(
        "main",
        None,
        vec![
            method_decl("void", "detonate", vec![], throw_stmt(leaf("\"nested\""))),
            method_decl(
                "void",
                "main",
                vec![],
                try_stmt(call_expr(leaf("me"), "detonate", vec![]), Some(print_stmt(vec![leaf("exception")]))),
            ),
        ],
    )];

    let mut host = CapturingIo::default();
    Runner::new(Limits::default()).run(&program, &mut host).unwrap();
    assert_eq!(host.joined_output(), "nested");
}
