//! Token definitions and the entry point that turns source text into a flat
//! token stream. Keyword/punctuation recognition is delegated to `logos`;
//! line numbers are recovered afterwards from byte offsets via
//! `dj_source::SourceFile`, matching the approach `typhon-parser` takes for
//! its richer, indentation-sensitive grammar.

use dj_source::SourceFile;
use logos::Logos;

use crate::error::ParseError;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    #[token("class")]
    Class,
    #[token("extends")]
    Extends,
    #[token("final")]
    Final,
    #[token("main")]
    Main,
    #[token("nat")]
    Nat,
    #[token("new")]
    New,
    #[token("this")]
    This,
    #[token("null")]
    Null,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("assert")]
    Assert,
    #[token("printNat")]
    PrintNat,
    #[token("readNat")]
    ReadNat,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token("=")]
    Equals,
    #[token("==")]
    EqEq,
    #[token("<")]
    Lt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("!")]
    Bang,
    #[token("||")]
    PipePipe,

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    NatLiteral(u64),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

impl TokenKind {
    /// A short, human-readable name for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Class => "'class'".into(),
            Self::Extends => "'extends'".into(),
            Self::Final => "'final'".into(),
            Self::Main => "'main'".into(),
            Self::Nat => "'nat'".into(),
            Self::New => "'new'".into(),
            Self::This => "'this'".into(),
            Self::Null => "'null'".into(),
            Self::If => "'if'".into(),
            Self::Else => "'else'".into(),
            Self::While => "'while'".into(),
            Self::Assert => "'assert'".into(),
            Self::PrintNat => "'printNat'".into(),
            Self::ReadNat => "'readNat'".into(),
            Self::LBrace => "'{'".into(),
            Self::RBrace => "'}'".into(),
            Self::LParen => "'('".into(),
            Self::RParen => "')'".into(),
            Self::Semicolon => "';'".into(),
            Self::Dot => "'.'".into(),
            Self::Equals => "'='".into(),
            Self::EqEq => "'=='".into(),
            Self::Lt => "'<'".into(),
            Self::Plus => "'+'".into(),
            Self::Minus => "'-'".into(),
            Self::Star => "'*'".into(),
            Self::Bang => "'!'".into(),
            Self::PipePipe => "'||'".into(),
            Self::NatLiteral(n) => format!("number '{n}'"),
            Self::Ident(name) => format!("identifier '{name}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

/// Lexes the whole source string into a flat token list, reporting the
/// first unrecognized character as a [`ParseError`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let file = SourceFile::new("<input>".to_string(), source.to_string());
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let line = file.position_at(u32::try_from(span.start).unwrap_or(u32::MAX)).line;
        match result {
            Ok(kind) => tokens.push(Token { kind, line }),
            Err(()) => {
                let ch = source[span.clone()].chars().next().unwrap_or('\u{0}');
                return Err(ParseError::UnexpectedChar { line, ch });
            }
        }
    }

    Ok(tokens)
}
