//! The DJ syntax tree and the integer type-code encoding shared by every
//! later compiler phase.

pub mod ast;
pub mod types;

pub use ast::*;
pub use types::*;
