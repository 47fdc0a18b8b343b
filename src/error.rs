//! Errors produced while compiling a chunk.
//!
//! Every error that leaves the parser is fatal to the compilation unit: the
//! recursive descent never attempts local recovery, and no partial
//! `Prototype` escapes a failed `compile`. This plays the role of the
//! source's `luaK_error` (which `longjmp`s out); here the same discipline is
//! expressed as ordinary `Result` propagation through `?`.

use std::fmt;

/// A compile-time error together with the source line it was raised at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub message: String,
    pub line: u32,
}

impl CompileError {
    pub fn new(message: impl Into<String>, line: u32) -> Self {
        CompileError {
            message: message.into(),
            line,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.line, self.message)
    }
}

impl std::error::Error for CompileError {}

pub type Result<T> = std::result::Result<T, CompileError>;
