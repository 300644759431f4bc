//! Forma Compile - turns template source text into immutable bytecode.
//!
//! Pipeline: `lexer` (logos) -> `parser` (recursive descent, one function per
//! source) -> `codegen` (stack bytecode with `names`/`varnames` tables).
//!
//! The resulting `CodeObject` refers to attribute names and labels only through
//! indices into its `names` table and to parameters only through slots, which is
//! what lets the synthesis engine rebind names without compiling again.

mod ast;
mod code;
mod codegen;
mod error;
mod lexer;
mod parser;

pub use code::{Builtin, CodeFlags, CodeObject, CompareOp, Const, Op, ReplaceNamesError};
pub use error::{CompileError, CompileErrorKind};

/// Compile template source containing exactly one function definition.
#[tracing::instrument(level = "trace", skip_all, fields(len = source.len()))]
pub fn compile(source: &str) -> Result<CodeObject, CompileError> {
    let tokens = lexer::lex(source)?;
    let function = parser::parse(&tokens)?;
    let code = codegen::generate(&function)?;
    tracing::trace!(function = %code.name(), ops = code.ops().len(), "compiled template");
    Ok(code)
}
