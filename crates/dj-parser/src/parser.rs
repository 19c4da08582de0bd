//! A hand-written recursive-descent parser over the flat token stream.
//!
//! Grammar (lowest to highest precedence for expressions):
//! ```text
//! program    := class_decl* "main" "{" var_decl* expr_stmt+ "}"
//! class_decl := "final"? "class" ID "extends" ID "{" member* "}"
//! member     := var_decl | method_decl
//! var_decl   := type ID ";"
//! method_decl:= "final"? type ID "(" type ID ")" "{" var_decl* expr_stmt+ "}"
//! type       := "nat" | ID
//! expr_stmt  := expr ";"
//! expr       := assign
//! assign     := postfix "=" assign | or
//! or         := equality ("||" equality)*
//! equality   := relational ("==" relational)*
//! relational := additive ("<" additive)*
//! additive   := multiplicative (("+" | "-") multiplicative)*
//! multiplicative := unary ("*" unary)*
//! unary      := "!" unary | postfix
//! postfix    := primary ("." ID ["(" expr ")"])*
//! primary    := NAT | "null" | "this" | "new" ID "(" ")"
//!             | "if" "(" expr ")" "{" expr_stmt+ "}" "else" "{" expr_stmt+ "}"
//!             | "while" "(" expr ")" "{" expr_stmt+ "}"
//!             | "printNat" "(" expr ")" | "readNat" "(" ")" | "assert" "(" expr ")"
//!             | ID ["(" expr ")"] | "(" expr ")"
//! ```

use dj_ast::{ClassDecl, Expr, ExprKind, Ident, MethodDecl, Program, TypeRef, TypeRefKind, VarDecl};

use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    #[must_use]
    pub const fn new(tokens: Vec<Token>) -> Self { Self { tokens, pos: 0 } }

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut classes = Vec::new();
        while !matches!(self.peek(), Some(TokenKind::Main)) {
            classes.push(self.parse_class_decl()?);
        }
        self.expect_exact(&TokenKind::Main, "'main'")?;
        self.expect_exact(&TokenKind::LBrace, "'{'")?;
        let main_locals = self.parse_var_decls()?;
        let main_body = self.parse_expr_stmts_until_rbrace()?;
        self.expect_exact(&TokenKind::RBrace, "'}'")?;
        if self.peek().is_some() {
            return Err(ParseError::UnexpectedToken {
                line: self.current_line(),
                expected: "end of input".into(),
                found: self.describe_current(),
            });
        }
        Ok(Program { classes, main_locals, main_body })
    }

    fn parse_class_decl(&mut self) -> Result<ClassDecl, ParseError> {
        let line = self.current_line();
        let is_final = self.eat_exact(&TokenKind::Final);
        self.expect_exact(&TokenKind::Class, "'class'")?;
        let name = self.expect_ident()?;
        self.expect_exact(&TokenKind::Extends, "'extends'")?;
        let superclass = self.expect_ident()?;
        self.expect_exact(&TokenKind::LBrace, "'{'")?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        while !matches!(self.peek(), Some(TokenKind::RBrace) | None) {
            let member_is_final = self.eat_exact(&TokenKind::Final);
            let ty = self.parse_type_ref()?;
            let member_name = self.expect_ident()?;
            if matches!(self.peek(), Some(TokenKind::LParen)) {
                methods.push(self.parse_method_rest(member_is_final, ty, member_name)?);
            } else {
                if member_is_final {
                    return Err(ParseError::UnexpectedToken {
                        line: self.current_line(),
                        expected: "field declarations cannot be 'final'".into(),
                        found: self.describe_current(),
                    });
                }
                self.expect_exact(&TokenKind::Semicolon, "';'")?;
                let decl_line = ty.line;
                fields.push(VarDecl { ty, name: member_name, line: decl_line });
            }
        }
        self.expect_exact(&TokenKind::RBrace, "'}'")?;
        Ok(ClassDecl { name, superclass, is_final, fields, methods, line })
    }

    fn parse_method_rest(
        &mut self,
        is_final: bool,
        return_type: TypeRef,
        name: Ident,
    ) -> Result<MethodDecl, ParseError> {
        let line = return_type.line;
        self.expect_exact(&TokenKind::LParen, "'('")?;
        let param_type = self.parse_type_ref()?;
        let param_name = self.expect_ident()?;
        self.expect_exact(&TokenKind::RParen, "')'")?;
        self.expect_exact(&TokenKind::LBrace, "'{'")?;
        let locals = self.parse_var_decls()?;
        let body = self.parse_expr_stmts_until_rbrace()?;
        self.expect_exact(&TokenKind::RBrace, "'}'")?;
        Ok(MethodDecl { is_final, return_type, name, param_type, param_name, locals, body, line })
    }

    /// Consumes leading `type ID ";"` declarations for as long as the
    /// lookahead after the identifier is `;` rather than `(`.
    fn parse_var_decls(&mut self) -> Result<Vec<VarDecl>, ParseError> {
        let mut decls = Vec::new();
        loop {
            let is_decl = match (self.peek(), self.peek_at(1)) {
                (Some(TokenKind::Nat), Some(TokenKind::Ident(_))) => true,
                (Some(TokenKind::Ident(_)), Some(TokenKind::Ident(_))) => true,
                _ => false,
            };
            if !is_decl {
                break;
            }
            let ty = self.parse_type_ref()?;
            let name = self.expect_ident()?;
            self.expect_exact(&TokenKind::Semicolon, "';'")?;
            let line = ty.line;
            decls.push(VarDecl { ty, name, line });
        }
        Ok(decls)
    }

    fn parse_type_ref(&mut self) -> Result<TypeRef, ParseError> {
        let line = self.current_line();
        match self.peek() {
            Some(TokenKind::Nat) => {
                self.advance();
                Ok(TypeRef { kind: TypeRefKind::Nat, line })
            }
            Some(TokenKind::Ident(_)) => {
                let ident = self.expect_ident()?;
                Ok(TypeRef { kind: TypeRefKind::Named(ident.name), line })
            }
            _ => Err(ParseError::UnexpectedToken {
                line,
                expected: "a type".into(),
                found: self.describe_current(),
            }),
        }
    }

    fn parse_expr_stmts_until_rbrace(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = Vec::new();
        loop {
            exprs.push(self.parse_expr()?);
            self.expect_exact(&TokenKind::Semicolon, "';'")?;
            if matches!(self.peek(), Some(TokenKind::RBrace) | None) {
                break;
            }
        }
        if exprs.is_empty() {
            return Err(ParseError::UnexpectedToken {
                line: self.current_line(),
                expected: "a non-empty expression list".into(),
                found: self.describe_current(),
            });
        }
        Ok(exprs)
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> { self.parse_assign() }

    fn parse_assign(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_or()?;
        if self.eat_exact(&TokenKind::Equals) {
            let line = lhs.line;
            let rhs = self.parse_assign()?;
            return match lhs.kind {
                ExprKind::IdExpr(name) => Ok(Expr::new(ExprKind::Assign(name, Box::new(rhs)), line)),
                ExprKind::DotId(obj, name) => {
                    Ok(Expr::new(ExprKind::DotAssign(obj, name, Box::new(rhs)), line))
                }
                _ => Err(ParseError::UnexpectedToken {
                    line,
                    expected: "an assignable expression to the left of '='".into(),
                    found: "a non-assignable expression".into(),
                }),
            };
        }
        Ok(lhs)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_equality()?;
        while self.eat_exact(&TokenKind::PipePipe) {
            let line = lhs.line;
            let rhs = self.parse_equality()?;
            lhs = Expr::new(ExprKind::Or(Box::new(lhs), Box::new(rhs)), line);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_relational()?;
        while self.eat_exact(&TokenKind::EqEq) {
            let line = lhs.line;
            let rhs = self.parse_relational()?;
            lhs = Expr::new(ExprKind::Equality(Box::new(lhs), Box::new(rhs)), line);
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_additive()?;
        while self.eat_exact(&TokenKind::Lt) {
            let line = lhs.line;
            let rhs = self.parse_additive()?;
            lhs = Expr::new(ExprKind::LessThan(Box::new(lhs), Box::new(rhs)), line);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let line = lhs.line;
            if self.eat_exact(&TokenKind::Plus) {
                let rhs = self.parse_multiplicative()?;
                lhs = Expr::new(ExprKind::Plus(Box::new(lhs), Box::new(rhs)), line);
            } else if self.eat_exact(&TokenKind::Minus) {
                let rhs = self.parse_multiplicative()?;
                lhs = Expr::new(ExprKind::Minus(Box::new(lhs), Box::new(rhs)), line);
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        while self.eat_exact(&TokenKind::Star) {
            let line = lhs.line;
            let rhs = self.parse_unary()?;
            lhs = Expr::new(ExprKind::Times(Box::new(lhs), Box::new(rhs)), line);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek(), Some(TokenKind::Bang)) {
            let line = self.current_line();
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::new(ExprKind::Not(Box::new(operand)), line));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if !self.eat_exact(&TokenKind::Dot) {
                break;
            }
            let line = expr.line;
            let name = self.expect_ident()?;
            if self.eat_exact(&TokenKind::LParen) {
                let arg = self.parse_expr()?;
                self.expect_exact(&TokenKind::RParen, "')'")?;
                expr = Expr::new(
                    ExprKind::DotMethodCall(Box::new(expr), name.name, Box::new(arg)),
                    line,
                );
            } else {
                expr = Expr::new(ExprKind::DotId(Box::new(expr), name.name), line);
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line();
        match self.peek().cloned() {
            Some(TokenKind::NatLiteral(n)) => {
                self.advance();
                Ok(Expr::new(ExprKind::NatLiteral(n), line))
            }
            Some(TokenKind::Null) => {
                self.advance();
                Ok(Expr::new(ExprKind::Null, line))
            }
            Some(TokenKind::This) => {
                self.advance();
                Ok(Expr::new(ExprKind::This, line))
            }
            Some(TokenKind::New) => {
                self.advance();
                let class_name = self.expect_ident()?;
                self.expect_exact(&TokenKind::LParen, "'('")?;
                self.expect_exact(&TokenKind::RParen, "')'")?;
                Ok(Expr::new(ExprKind::New(class_name.name), line))
            }
            Some(TokenKind::ReadNat) => {
                self.advance();
                self.expect_exact(&TokenKind::LParen, "'('")?;
                self.expect_exact(&TokenKind::RParen, "')'")?;
                Ok(Expr::new(ExprKind::Read, line))
            }
            Some(TokenKind::PrintNat) => {
                self.advance();
                self.expect_exact(&TokenKind::LParen, "'('")?;
                let arg = self.parse_expr()?;
                self.expect_exact(&TokenKind::RParen, "')'")?;
                Ok(Expr::new(ExprKind::Print(Box::new(arg)), line))
            }
            Some(TokenKind::Assert) => {
                self.advance();
                self.expect_exact(&TokenKind::LParen, "'('")?;
                let arg = self.parse_expr()?;
                self.expect_exact(&TokenKind::RParen, "')'")?;
                Ok(Expr::new(ExprKind::Assert(Box::new(arg)), line))
            }
            Some(TokenKind::If) => {
                self.advance();
                self.expect_exact(&TokenKind::LParen, "'('")?;
                let cond = self.parse_expr()?;
                self.expect_exact(&TokenKind::RParen, "')'")?;
                self.expect_exact(&TokenKind::LBrace, "'{'")?;
                let then_body = self.parse_expr_stmts_until_rbrace()?;
                self.expect_exact(&TokenKind::RBrace, "'}'")?;
                self.expect_exact(&TokenKind::Else, "'else'")?;
                self.expect_exact(&TokenKind::LBrace, "'{'")?;
                let else_body = self.parse_expr_stmts_until_rbrace()?;
                self.expect_exact(&TokenKind::RBrace, "'}'")?;
                Ok(Expr::new(ExprKind::IfThenElse(Box::new(cond), then_body, else_body), line))
            }
            Some(TokenKind::While) => {
                self.advance();
                self.expect_exact(&TokenKind::LParen, "'('")?;
                let cond = self.parse_expr()?;
                self.expect_exact(&TokenKind::RParen, "')'")?;
                self.expect_exact(&TokenKind::LBrace, "'{'")?;
                let body = self.parse_expr_stmts_until_rbrace()?;
                self.expect_exact(&TokenKind::RBrace, "'}'")?;
                Ok(Expr::new(ExprKind::While(Box::new(cond), body), line))
            }
            Some(TokenKind::LParen) => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect_exact(&TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            Some(TokenKind::Ident(name)) => {
                self.advance();
                if self.eat_exact(&TokenKind::LParen) {
                    let arg = self.parse_expr()?;
                    self.expect_exact(&TokenKind::RParen, "')'")?;
                    Ok(Expr::new(ExprKind::MethodCall(name, Box::new(arg)), line))
                } else {
                    Ok(Expr::new(ExprKind::IdExpr(name), line))
                }
            }
            _ => Err(ParseError::UnexpectedToken {
                line,
                expected: "an expression".into(),
                found: self.describe_current(),
            }),
        }
    }

    // --- cursor helpers -------------------------------------------------

    fn peek(&self) -> Option<&TokenKind> { self.tokens.get(self.pos).map(|t| &t.kind) }

    fn peek_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn current_line(&self) -> u32 {
        self.tokens.get(self.pos).map_or_else(|| self.tokens.last().map_or(1, |t| t.line), |t| t.line)
    }

    fn describe_current(&self) -> String {
        self.tokens.get(self.pos).map_or_else(|| "end of input".to_string(), |t| t.kind.describe())
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Consumes the current token if its discriminant matches `expected`,
    /// ignoring any carried payload (payload-bearing variants are never
    /// passed here).
    fn eat_exact(&mut self, expected: &TokenKind) -> bool {
        if self.peek().is_some_and(|k| std::mem::discriminant(k) == std::mem::discriminant(expected))
        {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_exact(&mut self, expected: &TokenKind, desc: &str) -> Result<(), ParseError> {
        if self.eat_exact(expected) {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                line: self.current_line(),
                expected: desc.into(),
                found: self.describe_current(),
            })
        }
    }

    fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        let line = self.current_line();
        match self.peek().cloned() {
            Some(TokenKind::Ident(name)) => {
                self.advance();
                Ok(Ident { name, line })
            }
            _ => Err(ParseError::UnexpectedToken {
                line,
                expected: "an identifier".into(),
                found: self.describe_current(),
            }),
        }
    }
}
