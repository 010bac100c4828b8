//! Fatal, host-reported errors (§7) and the `Flow` control-transfer type
//! threaded through statement/expression evaluation.
//!
//! Resource/runtime failures (`InterpError`) and ordinary control flow are
//! kept separate: fatal errors abort execution and are reported through
//! [`crate::host::HostIo`]; `throw`/`try` are in-language signals that
//! unwind through [`Flow`] instead, and never reach the host adapter unless
//! they escape `main`.

use std::fmt;

/// The four fatal error categories from spec §7. All are host-reported and
/// terminate execution; none are catchable by the language's own `try`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed AST shape: wrong arity for a form, unknown statement head.
    Syntax,
    /// Undeclared identifier, duplicate class/field/method/parameter.
    Name,
    /// Type mismatch: assignment, parameter, return, operator, predicate,
    /// generic arity, duplicate class name, unknown class as type.
    Type,
    /// Null dereference at a call site, or non-integer text for `inputi`.
    Fault,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Syntax => "SYNTAX",
            Self::Name => "NAME",
            Self::Type => "TYPE",
            Self::Fault => "FAULT",
        };
        f.write_str(s)
    }
}

/// A fatal interpreter error, ready to hand to [`crate::host::HostIo::report_error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpError {
    pub kind: ErrorKind,
    pub message: String,
    pub line: Option<u32>,
}

impl InterpError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), line: None }
    }

    #[must_use]
    pub fn at_line(mut self, line: Option<u32>) -> Self {
        self.line = line;
        self
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Name, message)
    }

    pub fn ty(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn fault(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Fault, message)
    }
}

impl fmt::Display for InterpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(line) = self.line {
            write!(f, " (line {line})")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for InterpError {}

/// Result of evaluating something that can fail fatally: `Ok` carries
/// whatever the evaluation produces when it doesn't fatally fail.
pub type InterpResult<T> = Result<T, InterpError>;

/// A language-level `throw` payload (always a string, per §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangException(pub String);

impl fmt::Display for LangException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-fatal control transfer produced by evaluating a statement or
/// expression: either a normal value, or an unwinding exception.
///
/// This is the Rust-level encoding of spec §4.6's
/// `(return_initiated, value_or_exception)` pair, split so exceptions and
/// ordinary values don't share a single tagged slot the way the source
/// material's `exception` pseudo-type does.
#[derive(Debug, Clone)]
pub enum Flow<T> {
    Value(T),
    Thrown(LangException),
}

impl<T> Flow<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Flow<U> {
        match self {
            Self::Value(v) => Flow::Value(f(v)),
            Self::Thrown(e) => Flow::Thrown(e),
        }
    }

    /// Unwraps a normal value, or re-packages a thrown exception as a
    /// differently-typed `Flow` for the caller to return early with.
    ///
    /// Typical use at an operand-evaluation site:
    /// ```ignore
    /// let lhs = match eval_expr(ctx, operand, host)?.into_value() {
    ///     Ok(v) => v,
    ///     Err(thrown) => return Ok(thrown),
    /// };
    /// ```
    pub fn into_value<U>(self) -> Result<T, Flow<U>> {
        match self {
            Self::Value(v) => Ok(v),
            Self::Thrown(e) => Err(Flow::Thrown(e)),
        }
    }
}

/// Evaluating an expression either fatally errors, unwinds an exception, or
/// produces a value.
pub type ExprResult<T> = InterpResult<Flow<T>>;
