//! NASM code generation, spec.md §4.3.
//!
//! Grounded on the module split of
//! `typhon-compiler::backend::codegen::{generator, functions}` (a context
//! struct threaded through per-function emission, a monotonic counter for
//! fresh labels) but emitting NASM text directly into a `String` buffer
//! instead of building LLVM IR, matching the text-emission shape of
//! `other_examples`'s `navicore-cem3::codegen::state::CodeGen`.

mod context;
mod expressions;
mod functions;
mod layout;

pub use context::CodeGenerator;
