//! Source file representation and position tracking.
//!
//! Mirrors the line/column bookkeeping used throughout the compiler for
//! diagnostics. The syntax tree itself only keeps a bare line number per
//! node; this crate is what turns a byte offset into something worth
//! printing in an error message.

pub mod span;

pub use span::{Position, SourceFile};
