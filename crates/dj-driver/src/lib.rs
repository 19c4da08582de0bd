//! Wires the compiler's phases together: lex + parse, build the symbol
//! table, type-check, and generate NASM. Grounded on
//! `typhon-compiler::driver::Driver::{compile_file, compile_string,
//! run_pipeline}`, minus the optimize/verify steps a text-emitting backend
//! has no use for.

mod error;

use std::fs;
use std::path::Path;

use dj_sema::TypeChecker;
use dj_symtab::SymbolTableBuilder;

pub use error::DriverError;

/// Runs every phase over `source` and returns the generated NASM text, or
/// the first error encountered (parse, or compile — spec.md §7's
/// first-error-wins rule applies across phases too).
pub fn compile_string(source: &str) -> Result<String, DriverError> {
    log::debug!("compiling {} byte(s) of source", source.len());
    let mut program = dj_parser::parse(source)?;
    let table = SymbolTableBuilder::new().build(&program);
    TypeChecker::new().check(&mut program, &table)?;
    Ok(dj_codegen::CodeGenerator::new(&program, &table).generate())
}

/// Reads `path` and compiles its contents.
pub fn compile_file(path: &Path) -> Result<String, DriverError> {
    let source = fs::read_to_string(path)?;
    compile_string(&source)
}
