//! The compiler's single shared diagnostic type.
//!
//! spec.md §7 distinguishes internal errors (violated compiler invariants)
//! from external errors (ill-formed user programs) but reports both the
//! same way: a source line plus a message, first failure wins. Grounded on
//! `typhon-analyzer::error::SemanticError`'s shape (one `thiserror`-derived
//! enum, every variant carrying a line), narrowed to these two kinds.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A violated compiler invariant: missing tree shape, empty expression
    /// list, a node visited outside its defined semantics.
    #[error("line {line}: internal error: {detail}")]
    Internal { line: u32, detail: String },

    /// An ill-formed DJ program: unresolved type, duplicate name,
    /// inheritance cycle, operand type mismatch, and so on.
    #[error("line {line}: {detail}")]
    External { line: u32, detail: String },
}

impl CompileError {
    #[must_use]
    pub fn internal(line: u32, detail: impl Into<String>) -> Self {
        Self::Internal { line, detail: detail.into() }
    }

    #[must_use]
    pub fn external(line: u32, detail: impl Into<String>) -> Self {
        Self::External { line, detail: detail.into() }
    }

    #[must_use]
    pub const fn line(&self) -> u32 {
        match self {
            Self::Internal { line, .. } | Self::External { line, .. } => *line,
        }
    }
}
