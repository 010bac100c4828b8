//! Top-level program runner: loads classes, instantiates `main`, and invokes
//! its `main` method (spec §4.1 "Program structure" / §4.5 entry point).

use crate::class::ClassRegistry;
use crate::dispatch::{call_method, default_max_call_depth};
use crate::error::{Flow, InterpError, InterpResult};
use crate::host::HostIo;
use crate::object::instantiate;
use crate::token::Node;
use crate::value::Value;

/// Tunable execution bounds, separate from language semantics (spec §9 /
/// SPEC_FULL.md §D).
#[derive(Debug, Clone)]
pub struct Limits {
    max_call_depth: usize,
    trace_output: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_call_depth: default_max_call_depth(), trace_output: false }
    }
}

impl Limits {
    #[must_use]
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// When set, every method dispatch writes a one-line trace through
    /// `HostIo::output` before running (SPEC_FULL.md §C), grounded in the
    /// original source's `trace_output` constructor flag.
    #[must_use]
    pub fn trace_output(mut self, enabled: bool) -> Self {
        self.trace_output = enabled;
        self
    }
}

/// Loads and executes a parsed program against a chosen set of `limits`.
pub struct Runner {
    limits: Limits,
}

impl Runner {
    #[must_use]
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Runs `program` to completion. Any exception that escapes `main`'s
    /// body unwinds as a FAULT (spec §4.6: an uncaught `throw` is a fatal
    /// error at the top level), and any fatal error is reported through
    /// `host` exactly once before being returned to the caller.
    pub fn run(&self, program: &[Node], host: &mut dyn HostIo) -> InterpResult<Value> {
        let outcome = self.run_inner(program, host);
        if let Err(err) = &outcome {
            host.report_error(err);
        }
        outcome
    }

    fn run_inner(&self, program: &[Node], host: &mut dyn HostIo) -> InterpResult<Value> {
        let registry = ClassRegistry::load(program)?;
        if !registry.has_main() {
            return Err(InterpError::name("program has no 'main' class"));
        }
        let main_obj = instantiate(&registry, "main")?;
        match call_method(
            &registry,
            &main_obj,
            &main_obj,
            "main",
            Vec::new(),
            host,
            0,
            self.limits.max_call_depth,
            self.limits.trace_output,
        )? {
            Flow::Value(v) => Ok(v),
            Flow::Thrown(e) => Err(InterpError::fault(format!("uncaught exception: {}", e.0))),
        }
    }
}
