//! This is the compiler as a library.  See `src/bin` directory for the
//! executable program using this library.

pub mod back;
pub mod common;
pub mod front;
pub mod middle;

use std::fmt;

/// Top-level error produced by [`compile`].
#[derive(Debug)]
pub enum CompileError {
    Parse(front::parse::ParseError),
    Emit(middle::emit::EmitError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Parse(e) => write!(f, "{e}"),
            CompileError::Emit(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<front::parse::ParseError> for CompileError {
    fn from(e: front::parse::ParseError) -> Self {
        CompileError::Parse(e)
    }
}

impl From<middle::emit::EmitError> for CompileError {
    fn from(e: middle::emit::EmitError) -> Self {
        CompileError::Emit(e)
    }
}

/// Parse and emit a complete program, returning the textual LLVM IR.
///
/// Lexical warnings (illegal characters, integer overflow) are pushed onto
/// `warnings` as they are encountered and do not halt compilation. A
/// syntactic or semantic error halts before any IR is produced.
pub fn compile(
    source: &str,
    warnings: &mut Vec<front::lex::LexWarning>,
) -> Result<String, CompileError> {
    let program = front::parse::parse(source, warnings)?;
    let module = middle::emit::emit(&program)?;
    Ok(module.render())
}
