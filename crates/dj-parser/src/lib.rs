//! Turns DJ source text into a `dj_ast::Program`.

mod error;
mod lexer;
mod parser;

pub use error::ParseError;
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::Parser;

use dj_ast::Program;

/// Lexes and parses `source`, returning the program or the first parse
/// error encountered.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse_program()
}
