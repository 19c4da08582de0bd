//! Pre-checks, field/method rules, and the expression type judgment
//! (spec.md §4.2 in full). Grounded on the shape of
//! `typhon-analyzer::visitors::TypeCheckerVisitor` (a struct holding the
//! tree and the symbol table, walking once and annotating as it goes), but
//! stops at the first failure instead of accumulating a `Vec` of
//! diagnostics, per spec.md §7's "no error recovery" requirement.

use dj_ast::{ANY_OBJECT, Expr, ExprKind, NAT, NO_TYPE, OBJECT, Program, TypeCode, is_class};
use dj_symtab::{FieldEntry, MethodEntry, SymbolTable};

use crate::error::CompileError;
use crate::types::{is_subtype, join};

type Result<T> = std::result::Result<T, CompileError>;

#[derive(Default)]
pub struct TypeChecker;

/// Where an expression is being checked: the main block, or the body of a
/// method with a known enclosing class/method index, a parameter, and
/// locals.
enum Scope<'a> {
    Main { locals: &'a [FieldEntry] },
    Method {
        class_idx: TypeCode,
        method_idx: i32,
        param_name: &'a str,
        param_type: TypeCode,
        locals: &'a [FieldEntry],
    },
}

impl Scope<'_> {
    const fn static_class_num(&self) -> i32 {
        match self {
            Self::Main { .. } => -1,
            Self::Method { class_idx, .. } => *class_idx,
        }
    }

    const fn static_member_num(&self) -> i32 {
        match self {
            Self::Main { .. } => -1,
            Self::Method { method_idx, .. } => *method_idx,
        }
    }
}

impl TypeChecker {
    #[must_use]
    pub fn new() -> Self { Self }

    pub fn check(&self, program: &mut Program, table: &SymbolTable) -> Result<()> {
        self.check_hierarchy(table)?;
        for class_idx in 1..=table.user_class_count() as TypeCode {
            self.check_field_rules(class_idx, table)?;
            self.check_method_rules(class_idx, table)?;
        }
        for (i, method) in table_methods(table) {
            self.check_method_body(i, method, table, program)?;
        }
        let main_scope = Scope::Main { locals: &table.main.locals };
        self.check_expr_list(&mut program.main_body, &main_scope, table)?;
        Ok(())
    }

    // ---- 4.2.1 pre-checks ----------------------------------------------

    fn check_hierarchy(&self, table: &SymbolTable) -> Result<()> {
        let user_count = table.user_class_count();
        for class_idx in 1..=user_count as TypeCode {
            let entry = table.class(class_idx).expect("sized in builder");

            if entry.class_name == "Object" {
                return Err(CompileError::external(
                    entry.class_name_line,
                    "a user class may not be named 'Object'",
                ));
            }
            for other in 1..=user_count as TypeCode {
                if other != class_idx
                    && table.class(other).expect("sized in builder").class_name == entry.class_name
                {
                    return Err(CompileError::external(
                        entry.class_name_line,
                        format!("duplicate class name '{}'", entry.class_name),
                    ));
                }
            }

            match entry.superclass {
                dj_ast::UNRESOLVED => {
                    return Err(CompileError::external(
                        entry.superclass_line,
                        "unresolved superclass name",
                    ));
                }
                NAT | ANY_OBJECT => {
                    return Err(CompileError::external(
                        entry.superclass_line,
                        "a class cannot extend 'nat' or a non-class type",
                    ));
                }
                _ => {}
            }
            let super_entry = table.class(entry.superclass).expect("resolved above");
            if super_entry.is_final {
                return Err(CompileError::external(
                    entry.superclass_line,
                    format!("cannot derive from final class '{}'", super_entry.class_name),
                ));
            }

            // Acyclic: walking more steps than there are classes means we
            // looped back without reaching the Object sentinel.
            let mut current = class_idx;
            let mut steps = 0usize;
            loop {
                let Some(c) = table.class(current) else { break };
                current = c.superclass;
                steps += 1;
                if current == NO_TYPE {
                    break;
                }
                if steps > user_count {
                    return Err(CompileError::external(
                        entry.superclass_line,
                        "circular base type dependency",
                    ));
                }
            }
        }
        Ok(())
    }

    // ---- 4.2.2 field rules ----------------------------------------------

    fn check_field_rules(&self, class_idx: TypeCode, table: &SymbolTable) -> Result<()> {
        let entry = table.class(class_idx).expect("sized in builder");
        for (i, field) in entry.fields.iter().enumerate() {
            if field.ty < NAT {
                return Err(CompileError::external(
                    field.type_line,
                    format!("field '{}' has an unresolved or invalid type", field.var_name),
                ));
            }
            if entry.fields[..i].iter().any(|f| f.var_name == field.var_name) {
                return Err(CompileError::external(
                    field.var_name_line,
                    format!("duplicate field name '{}'", field.var_name),
                ));
            }
            let mut ancestor = entry.superclass;
            while is_class(ancestor) && ancestor != OBJECT {
                let anc = table.class(ancestor).expect("resolved");
                if anc.find_field(&field.var_name).is_some() {
                    return Err(CompileError::external(
                        field.var_name_line,
                        format!(
                            "field '{}' shadows a field already declared in an ancestor",
                            field.var_name
                        ),
                    ));
                }
                ancestor = anc.superclass;
            }
        }
        Ok(())
    }

    // ---- 4.2.3 method rules (structural part; bodies checked separately) --

    fn check_method_rules(&self, class_idx: TypeCode, table: &SymbolTable) -> Result<()> {
        let entry = table.class(class_idx).expect("sized in builder");
        for (i, method) in entry.methods.iter().enumerate() {
            if entry.methods[..i].iter().any(|m| m.method_name == method.method_name) {
                return Err(CompileError::external(
                    method.method_name_line,
                    format!("duplicate method name '{}'", method.method_name),
                ));
            }
            if method.return_type < NAT {
                return Err(CompileError::external(
                    method.return_type_line,
                    "method return type is unresolved or invalid",
                ));
            }
            if method.param_type < NAT {
                return Err(CompileError::external(
                    method.param_type_line,
                    "method parameter type is unresolved or invalid",
                ));
            }

            let mut ancestor = entry.superclass;
            while is_class(ancestor) && ancestor != OBJECT {
                let anc = table.class(ancestor).expect("resolved");
                if let Some((_, overridden)) = anc.find_method(&method.method_name) {
                    if overridden.is_final {
                        return Err(CompileError::external(
                            method.method_name_line,
                            format!(
                                "method '{}' overrides a final method",
                                method.method_name
                            ),
                        ));
                    }
                    if overridden.return_type != method.return_type
                        || overridden.param_type != method.param_type
                    {
                        return Err(CompileError::external(
                            method.method_name_line,
                            format!(
                                "method '{}' does not match the signature it overrides",
                                method.method_name
                            ),
                        ));
                    }
                    break;
                }
                ancestor = anc.superclass;
            }

            if method.locals.iter().any(|l| l.var_name == method.param_name) {
                return Err(CompileError::external(
                    method.param_name_line,
                    format!("local '{}' collides with the parameter name", method.param_name),
                ));
            }
            for (i, local) in method.locals.iter().enumerate() {
                if method.locals[..i].iter().any(|l| l.var_name == local.var_name) {
                    return Err(CompileError::external(
                        local.var_name_line,
                        format!("duplicate local name '{}'", local.var_name),
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_method_body(
        &self,
        class_idx: TypeCode,
        method: &MethodEntry,
        table: &SymbolTable,
        program: &mut Program,
    ) -> Result<()> {
        let class_decl_idx = usize::try_from(class_idx - 1).expect("user class index >= 1");
        let method_idx = method_index(table, class_idx, &method.method_name);
        let body = &mut program
            .classes
            .get_mut(class_decl_idx)
            .ok_or_else(|| CompileError::internal(0, "class declaration missing"))?
            .methods
            .iter_mut()
            .find(|m| m.name.name == method.method_name)
            .ok_or_else(|| CompileError::internal(0, "method declaration missing"))?
            .body;

        let scope = Scope::Method {
            class_idx,
            method_idx,
            param_name: &method.param_name,
            param_type: method.param_type,
            locals: &method.locals,
        };
        let result_ty = self.check_expr_list(body, &scope, table)?;
        if !is_subtype(result_ty, method.return_type, table) {
            return Err(CompileError::external(
                method.method_name_line,
                format!(
                    "method '{}' body does not return a subtype of its declared return type",
                    method.method_name
                ),
            ));
        }
        Ok(())
    }

    // ---- 4.2.4 expression type judgment ---------------------------------

    fn check_expr_list(&self, list: &mut [Expr], scope: &Scope<'_>, table: &SymbolTable) -> Result<TypeCode> {
        let Some((last, rest)) = list.split_last_mut() else {
            return Err(CompileError::internal(0, "empty expression list"));
        };
        for expr in rest {
            self.check_expr(expr, scope, table)?;
        }
        self.check_expr(last, scope, table)
    }

    #[allow(clippy::too_many_lines)]
    fn check_expr(&self, expr: &mut Expr, scope: &Scope<'_>, table: &SymbolTable) -> Result<TypeCode> {
        expr.static_class_num = scope.static_class_num();
        expr.static_member_num = scope.static_member_num();
        let line = expr.line;

        let ty = match &mut expr.kind {
            ExprKind::NatLiteral(_) => NAT,
            ExprKind::Null => ANY_OBJECT,
            ExprKind::Read => NAT,
            ExprKind::This => match scope {
                Scope::Main { .. } => {
                    return Err(CompileError::external(line, "'this' used in the main block"));
                }
                Scope::Method { class_idx, .. } => *class_idx,
            },
            ExprKind::New(name) => resolve_new_target(name, line, table)?,
            ExprKind::Not(e) | ExprKind::Print(e) | ExprKind::Assert(e) => {
                let t = self.check_expr(e, scope, table)?;
                if t != NAT {
                    return Err(CompileError::external(line, "operand must be 'nat'"));
                }
                NAT
            }
            ExprKind::Plus(l, r) | ExprKind::Minus(l, r) | ExprKind::Times(l, r) => {
                let lt = self.check_expr(l, scope, table)?;
                let rt = self.check_expr(r, scope, table)?;
                if lt != NAT || rt != NAT {
                    return Err(CompileError::external(line, "arithmetic operands must be 'nat'"));
                }
                NAT
            }
            ExprKind::Equality(l, r) | ExprKind::LessThan(l, r) | ExprKind::Or(l, r) => {
                let lt = self.check_expr(l, scope, table)?;
                let rt = self.check_expr(r, scope, table)?;
                if !is_subtype(lt, rt, table) && !is_subtype(rt, lt, table) {
                    return Err(CompileError::external(
                        line,
                        "operands are not comparable: neither is a subtype of the other",
                    ));
                }
                NAT
            }
            ExprKind::IfThenElse(cond, then_list, else_list) => {
                let ct = self.check_expr(cond, scope, table)?;
                if ct != NAT {
                    return Err(CompileError::external(line, "'if' condition must be 'nat'"));
                }
                let then_ty = self.check_expr_list(then_list, scope, table)?;
                let else_ty = self.check_expr_list(else_list, scope, table)?;
                match (then_ty == NAT, else_ty == NAT) {
                    (true, true) => NAT,
                    (false, false) => join(then_ty, else_ty, table),
                    _ => {
                        return Err(CompileError::external(
                            line,
                            "'if' branches must both be 'nat' or both be object-ish",
                        ));
                    }
                }
            }
            ExprKind::While(cond, body) => {
                let ct = self.check_expr(cond, scope, table)?;
                if ct != NAT {
                    return Err(CompileError::external(line, "'while' condition must be 'nat'"));
                }
                self.check_expr_list(body, scope, table)?;
                NAT
            }
            ExprKind::IdExpr(name) => lookup_variable(name, scope, table)
                .ok_or_else(|| CompileError::external(line, format!("unknown identifier '{name}'")))?,
            ExprKind::Assign(name, value) => {
                let var_ty = lookup_variable(name, scope, table).ok_or_else(|| {
                    CompileError::external(line, format!("unknown identifier '{name}'"))
                })?;
                let value_ty = self.check_expr(value, scope, table)?;
                if !is_subtype(value_ty, var_ty, table) {
                    return Err(CompileError::external(
                        line,
                        format!("value is not a subtype of '{name}'s declared type"),
                    ));
                }
                var_ty
            }
            ExprKind::DotId(obj, name) => {
                let obj_ty = self.check_expr(obj, scope, table)?;
                find_field_in_chain(obj_ty, name, table)
                    .ok_or_else(|| field_access_error(line, obj_ty, name))?
            }
            ExprKind::DotAssign(obj, name, value) => {
                let obj_ty = self.check_expr(obj, scope, table)?;
                let field_ty = find_field_in_chain(obj_ty, name, table)
                    .ok_or_else(|| field_access_error(line, obj_ty, name))?;
                let value_ty = self.check_expr(value, scope, table)?;
                if !is_subtype(value_ty, field_ty, table) {
                    return Err(CompileError::external(
                        line,
                        format!("value is not a subtype of field '{name}'s declared type"),
                    ));
                }
                field_ty
            }
            ExprKind::MethodCall(name, arg) => {
                let Scope::Method { class_idx, .. } = scope else {
                    return Err(CompileError::external(
                        line,
                        "method call without a receiver is not allowed in the main block",
                    ));
                };
                let (found_class, method_idx, found) =
                    find_method_in_chain(*class_idx, name, table)
                        .ok_or_else(|| CompileError::external(line, format!("no method named '{name}' in scope")))?;
                let arg_ty = self.check_expr(arg, scope, table)?;
                if !is_subtype(arg_ty, found.param_type, table) {
                    return Err(CompileError::external(
                        line,
                        format!("argument is not a subtype of '{name}'s parameter type"),
                    ));
                }
                expr.static_class_num = found_class;
                expr.static_member_num = method_idx;
                found.return_type
            }
            ExprKind::DotMethodCall(obj, name, arg) => {
                let obj_ty = self.check_expr(obj, scope, table)?;
                if obj_ty < 1 {
                    return Err(CompileError::external(
                        line,
                        "method call receiver must be a user object",
                    ));
                }
                let (found_class, method_idx, found) = find_method_in_chain(obj_ty, name, table)
                    .ok_or_else(|| CompileError::external(line, format!("no method named '{name}' in scope")))?;
                let arg_ty = self.check_expr(arg, scope, table)?;
                if !is_subtype(arg_ty, found.param_type, table) {
                    return Err(CompileError::external(
                        line,
                        format!("argument is not a subtype of '{name}'s parameter type"),
                    ));
                }
                expr.static_class_num = found_class;
                expr.static_member_num = method_idx;
                found.return_type
            }
        };
        expr.result_type = ty;
        Ok(ty)
    }
}

fn resolve_new_target(name: &str, line: u32, table: &SymbolTable) -> Result<TypeCode> {
    if name == "Object" {
        return Ok(OBJECT);
    }
    table
        .find_class_by_name(name)
        .ok_or_else(|| CompileError::external(line, format!("unknown class '{name}'")))
}

fn field_access_error(line: u32, obj_ty: TypeCode, name: &str) -> CompileError {
    if obj_ty < 1 {
        CompileError::external(line, "field access receiver must be a user object")
    } else {
        CompileError::external(line, format!("no field named '{name}' in scope"))
    }
}

fn lookup_variable(name: &str, scope: &Scope<'_>, table: &SymbolTable) -> Option<TypeCode> {
    match scope {
        Scope::Main { locals } => locals.iter().find(|l| l.var_name == name).map(|l| l.ty),
        Scope::Method { class_idx, param_name, param_type, locals, .. } => {
            if *param_name == name {
                return Some(*param_type);
            }
            if let Some(local) = locals.iter().find(|l| l.var_name == name) {
                return Some(local.ty);
            }
            let mut current = *class_idx;
            while is_class(current) && current != OBJECT {
                let entry = table.class(current)?;
                if let Some(field) = entry.find_field(name) {
                    return Some(field.ty);
                }
                current = entry.superclass;
            }
            None
        }
    }
}

/// Walks `start`'s ancestor chain (not including `Object`) looking for a
/// field named `name`.
fn find_field_in_chain(start: TypeCode, name: &str, table: &SymbolTable) -> Option<TypeCode> {
    if start < 1 {
        return None;
    }
    let mut current = start;
    while is_class(current) && current != OBJECT {
        let entry = table.class(current)?;
        if let Some(field) = entry.find_field(name) {
            return Some(field.ty);
        }
        current = entry.superclass;
    }
    None
}

/// Walks `start`'s ancestor chain including `Object` (which never matches,
/// since it has no methods) looking for a method named `name`.
fn find_method_in_chain<'a>(
    start: TypeCode,
    name: &str,
    table: &'a SymbolTable,
) -> Option<(TypeCode, i32, &'a MethodEntry)> {
    let mut current = start;
    while is_class(current) {
        let entry = table.class(current)?;
        if let Some((idx, method)) = entry.find_method(name) {
            return Some((current, i32::try_from(idx).unwrap_or(i32::MAX), method));
        }
        current = entry.superclass;
    }
    None
}

fn method_index(table: &SymbolTable, class_idx: TypeCode, name: &str) -> i32 {
    table
        .class(class_idx)
        .and_then(|c| c.find_method(name))
        .map_or(-1, |(i, _)| i32::try_from(i).unwrap_or(-1))
}

fn table_methods(table: &SymbolTable) -> Vec<(TypeCode, &MethodEntry)> {
    let mut out = Vec::new();
    for class_idx in 1..=table.user_class_count() as TypeCode {
        if let Some(entry) = table.class(class_idx) {
            for method in &entry.methods {
                out.push((class_idx, method));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use dj_symtab::SymbolTableBuilder;

    use super::*;

    fn check(src: &str) -> Result<()> {
        let mut program = dj_parser::parse(src).expect("fixture should parse");
        let table = SymbolTableBuilder::new().build(&program);
        TypeChecker::new().check(&mut program, &table)
    }

    #[test]
    fn s1_arithmetic_precedence_type_checks() {
        check("main { printNat(1+2*3); }").unwrap();
    }

    #[test]
    fn s2_while_loop_type_checks() {
        check("main { nat x; x = 5; while(0<x) { printNat(x); x = x-1; }; }").unwrap();
    }

    #[test]
    fn s3_field_and_method_type_check() {
        let src = "class A extends Object { nat v; nat get(nat u) { this.v; } } \
                   main { A a; a = new A(); a.v = 42; printNat(a.get(0)); }";
        check(src).unwrap();
    }

    #[test]
    fn s4_override_resolves_statically_to_declared_signature() {
        let src = "class A extends Object { nat f(nat x) { 1; } } \
                   class B extends A { nat f(nat x) { 2; } } \
                   main { A a; a = new B(); printNat(a.f(0)); }";
        check(src).unwrap();
    }

    #[test]
    fn s6_duplicate_class_name_is_rejected() {
        let src = "class A extends Object {} class A extends Object {} main { 0; }";
        let err = check(src).unwrap_err();
        assert!(matches!(err, CompileError::External { .. }));
        assert!(err.to_string().contains("duplicate class name"));
    }

    #[test]
    fn s7_extending_a_final_class_is_rejected() {
        let src = "final class A extends Object {} class B extends A {} main { 0; }";
        let err = check(src).unwrap_err();
        assert!(err.to_string().contains("final"));
    }

    #[test]
    fn this_in_main_block_is_rejected() {
        let err = check("main { this; }").unwrap_err();
        assert!(err.to_string().contains("'this'"));
    }

    #[test]
    fn method_call_without_receiver_is_rejected_in_main() {
        let err = check("main { foo(0); }").unwrap_err();
        assert!(err.to_string().contains("main block"));
    }

    #[test]
    fn mismatched_override_signature_is_rejected() {
        let src = "class A extends Object { nat f(nat x) { 1; } } \
                   class B extends A { A f(nat x) { this; } } \
                   main { 0; }";
        let err = check(src).unwrap_err();
        assert!(err.to_string().contains("does not match the signature"));
    }

    #[test]
    fn field_shadowing_ancestor_is_rejected() {
        let src = "class A extends Object { nat v; } \
                   class B extends A { nat v; } \
                   main { 0; }";
        let err = check(src).unwrap_err();
        assert!(err.to_string().contains("shadows"));
    }

    #[test]
    fn assert_type_checks_as_nat_and_may_be_final_expression() {
        check("main { assert(1); }").unwrap();
    }

    #[test]
    fn if_else_joins_object_branches() {
        let src = "class A extends Object {} class B extends A {} \
                   main { nat c; c = 1; A x; x = if (c) { new B(); } else { new A(); }; }";
        check(src).unwrap();
    }

    #[test]
    fn if_else_rejects_mixed_nat_and_object_branches() {
        let src = "main { nat c; c = 1; if (c) { 1; } else { new Object(); }; }";
        let err = check(src).unwrap_err();
        assert!(err.to_string().contains("both"));
    }
}
