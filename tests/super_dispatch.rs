//! `super`-call dispatch (spec §4.3.4/§8): resolving an explicit
//! `super`-qualified method, and `me` staying bound to the original
//! most-derived receiver even when the currently executing method was
//! itself reached through `super`.

mod common;

use common::*;
use thicket::{CapturingIo, Limits, Runner};

#[test]
fn super_call_invokes_the_superclass_method_body() {
    let program = vec![
        class_decl("base", None, vec![method_decl("string", "greet", vec![], return_stmt(Some(leaf("\"base\""))))]),
        class_decl(
            "derived",
            Some("base"),
            vec![
                method_decl("string", "greet", vec![], return_stmt(Some(leaf("\"derived\"")))),
                method_decl("string", "greetViaSuper", vec![], return_stmt(Some(call_expr(leaf("super"), "greet", vec![])))),
            ],
        ),
        class_decl(
            "main",
            None,
            vec![method_decl(
                "void",
                "main",
                vec![],
                let_stmt(
                    vec![var_decl("derived", "d", None)],
                    vec![
                        set_stmt("d", new_expr("derived")),
                        print_stmt(vec![call_expr(leaf("d"), "greet", vec![])]),
                        print_stmt(vec![call_expr(leaf("d"), "greetViaSuper", vec![])]),
                    ],
                ),
            )],
        ),
    ];

    let mut host = CapturingIo::default();
    Runner::new(Limits::default()).run(&program, &mut host).unwrap();
    assert_eq!(host.joined_output(), "derived\nbase");
}

/// A superclass method reached through `super` still dispatches `me`
/// against the original most-derived receiver, not the super-level object
/// it was looked up on.
#[test]
fn me_inside_a_super_reached_method_still_dispatches_to_the_most_derived_override() {
    let program = vec![
        class_decl(
            "base",
            None,
            vec![
                method_decl("string", "hook", vec![], return_stmt(Some(leaf("\"base-hook\"")))),
                method_decl("string", "runner", vec![], return_stmt(Some(call_expr(leaf("me"), "hook", vec![])))),
            ],
        ),
        class_decl(
            "derived",
            Some("base"),
            vec![
                method_decl("string", "hook", vec![], return_stmt(Some(leaf("\"derived-hook\"")))),
                method_decl("string", "invoke", vec![], return_stmt(Some(call_expr(leaf("super"), "runner", vec![])))),
            ],
        ),
        class_decl(
            "main",
            None,
            vec![method_decl(
                "void",
                "main",
                vec![],
                let_stmt(
                    vec![var_decl("derived", "d", None)],
                    vec![set_stmt("d", new_expr("derived")), print_stmt(vec![call_expr(leaf("d"), "invoke", vec![])])],
                ),
            )],
        ),
    ];

    let mut host = CapturingIo::default();
    Runner::new(Limits::default()).run(&program, &mut host).unwrap();
    assert_eq!(host.joined_output(), "derived-hook");
}
