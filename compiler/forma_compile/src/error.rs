//! Compile errors.
//!
//! A compile error always means the template text is malformed. Templates are
//! produced by the engine itself, so callers treat these as defects rather than
//! user input problems.

use forma_ir::Span;
use thiserror::Error;

/// What went wrong while compiling a template.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CompileErrorKind {
    #[error("unexpected character `{0}`")]
    UnexpectedChar(String),
    #[error("integer literal `{0}` out of range")]
    IntegerOverflow(String),
    #[error("invalid escape `\\{0}` in string literal")]
    InvalidEscape(char),
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    #[error("expected exactly one function definition, found {0}")]
    FunctionCount(usize),
    #[error("invalid assignment target; only attributes can be assigned")]
    InvalidAssignTarget,
    #[error("unknown builtin `{0}`")]
    UnknownBuiltin(String),
    #[error("builtin `{name}` takes {expected} argument(s), got {found}")]
    BuiltinArity {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("`nameof` expects a bare identifier")]
    NameofTarget,
    #[error("name `{0}` is not bound")]
    UnboundName(String),
    #[error("duplicate parameter `{0}`")]
    DuplicateParam(String),
    #[error("`yield` outside a generator function")]
    YieldOutsideGenerator,
    #[error("too many entries in the {0} table")]
    TableOverflow(&'static str),
}

/// A compile error with its location in the template source.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} at {span}")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub span: Span,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, span: Span) -> Self {
        CompileError { kind, span }
    }
}
