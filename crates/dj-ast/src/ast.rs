//! Syntax tree node types.
//!
//! Each grammar production gets its own struct or enum variant instead of a
//! single generic node with an untyped child vector; the parser builds this
//! tree directly and the type checker mutates `Expr::static_class_num` /
//! `Expr::static_member_num` in place as it resolves call sites.

use crate::types::UNRESOLVED;

/// The whole program: class declarations, then the main block.
#[derive(Debug, Clone)]
pub struct Program {
    pub classes: Vec<ClassDecl>,
    pub main_locals: Vec<VarDecl>,
    pub main_body: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: Ident,
    pub superclass: Ident,
    pub is_final: bool,
    pub fields: Vec<VarDecl>,
    pub methods: Vec<MethodDecl>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub is_final: bool,
    pub return_type: TypeRef,
    pub name: Ident,
    pub param_type: TypeRef,
    pub param_name: Ident,
    pub locals: Vec<VarDecl>,
    pub body: Vec<Expr>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub ty: TypeRef,
    pub name: Ident,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct TypeRef {
    pub kind: TypeRefKind,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRefKind {
    Nat,
    Named(String),
}

#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub line: u32,
}

/// An expression node. `static_class_num` / `static_member_num` start at
/// `-1` (unresolved) and are written by the type checker; everything else
/// is set once by the parser and never mutated again.
///
/// `result_type` is not one of the two fields spec.md §4.2.4 names — it is
/// the judged type of this node, recorded so the code generator can look up
/// field offsets (spec.md §4.3.6) without re-running the type judgment.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
    pub static_class_num: i32,
    pub static_member_num: i32,
    pub result_type: i32,
}

impl Expr {
    #[must_use]
    pub const fn new(kind: ExprKind, line: u32) -> Self {
        Self { kind, line, static_class_num: -1, static_member_num: -1, result_type: UNRESOLVED }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    NatLiteral(u64),
    Null,
    IdExpr(String),
    This,
    New(String),
    DotId(Box<Expr>, String),
    Assign(String, Box<Expr>),
    DotAssign(Box<Expr>, String, Box<Expr>),
    MethodCall(String, Box<Expr>),
    DotMethodCall(Box<Expr>, String, Box<Expr>),
    Plus(Box<Expr>, Box<Expr>),
    Minus(Box<Expr>, Box<Expr>),
    Times(Box<Expr>, Box<Expr>),
    Equality(Box<Expr>, Box<Expr>),
    LessThan(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Assert(Box<Expr>),
    IfThenElse(Box<Expr>, Vec<Expr>, Vec<Expr>),
    While(Box<Expr>, Vec<Expr>),
    Print(Box<Expr>),
    Read,
}
