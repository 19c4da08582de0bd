//! The driver's top-level error, folding every phase's error type into one.
//!
//! Grounded on `typhon-compiler::driver::DriverError` (one variant per
//! phase, a `From` impl per variant) minus its LLVM setup/verification
//! variants, which have no counterpart once codegen emits text directly.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("parse error: {0}")]
    Parse(#[from] dj_parser::ParseError),

    #[error("{0}")]
    Compile(#[from] dj_sema::CompileError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
