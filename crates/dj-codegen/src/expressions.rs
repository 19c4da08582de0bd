//! Expression lowering, spec.md §4.3.5. Every arm leaves exactly one word
//! on top of the stack, per the section's opening rule.

use dj_ast::{ExprKind, TypeCode};

use crate::context::{CodeGenerator, Frame};

impl CodeGenerator<'_> {
    pub(crate) fn emit_expr(&mut self, expr: &dj_ast::Expr, frame: &Frame<'_>) {
        match &expr.kind {
            ExprKind::NatLiteral(n) => self.emit(&format!("    push qword {n}")),
            ExprKind::Null => self.emit("    push qword 0"),
            ExprKind::This => self.emit("    push qword [rbp+32]"),
            ExprKind::Read => {
                self.emit("    call _read_int");
                self.emit("    push rax");
            }
            ExprKind::New(name) => self.emit_new(name, expr),
            ExprKind::IdExpr(name) => self.emit_load_ident(name, frame),
            ExprKind::Assign(name, value) => {
                self.emit_expr(value, frame);
                self.emit("    mov rax, [rsp]");
                self.store_ident(name, frame);
            }
            ExprKind::DotId(obj, name) => {
                self.emit_expr(obj, frame);
                self.emit("    pop rax");
                self.emit_null_check();
                let offset = self.field_offset(obj.result_type, name);
                self.emit(&format!("    push qword [rax+{}]", 8 * (offset + 1)));
            }
            ExprKind::DotAssign(obj, name, value) => {
                self.emit_expr(obj, frame);
                self.emit_expr(value, frame);
                self.emit("    pop rbx"); // value
                self.emit("    pop rax"); // object pointer
                self.emit_null_check();
                let offset = self.field_offset(obj.result_type, name);
                self.emit(&format!("    mov [rax+{}], rbx", 8 * (offset + 1)));
                self.emit("    push rbx");
            }
            ExprKind::Plus(l, r) => self.emit_binop(l, r, frame, "add rax, rbx"),
            ExprKind::Minus(l, r) => self.emit_binop(l, r, frame, "sub rax, rbx"),
            ExprKind::Times(l, r) => self.emit_binop(l, r, frame, "imul rax, rbx"),
            ExprKind::Equality(l, r) => self.emit_compare(l, r, frame, "sete al"),
            ExprKind::LessThan(l, r) => self.emit_compare(l, r, frame, "setl al"),
            ExprKind::Or(l, r) => {
                self.emit_expr(l, frame);
                self.emit("    pop rax");
                self.emit("    cmp rax, 0");
                let short_circuit = self.fresh_label("or_true");
                let end = self.fresh_label("or_end");
                self.emit(&format!("    jne {short_circuit}"));
                self.emit_expr(r, frame);
                self.emit("    pop rax");
                self.emit("    cmp rax, 0");
                self.emit("    setne al");
                self.emit("    movzx rax, al");
                self.emit(&format!("    jmp {end}"));
                self.label(&short_circuit);
                self.emit("    mov rax, 1");
                self.label(&end);
                self.emit("    push rax");
            }
            ExprKind::Not(e) => {
                self.emit_expr(e, frame);
                self.emit("    pop rax");
                self.emit("    cmp rax, 0");
                self.emit("    sete al");
                self.emit("    movzx rax, al");
                self.emit("    push rax");
            }
            ExprKind::Assert(e) => {
                self.emit_expr(e, frame);
                self.emit("    pop rax");
                self.emit("    cmp rax, 0");
                let ok = self.fresh_label("assert_ok");
                self.emit(&format!("    jne {ok}"));
                self.emit("    mov rdi, 1");
                self.emit("    call _exit_program");
                self.label(&ok);
                self.emit("    push qword 0");
            }
            ExprKind::Print(e) => {
                self.emit_expr(e, frame);
                self.emit("    pop rdi");
                self.emit("    call _print_int");
                self.emit("    push qword 0");
            }
            ExprKind::IfThenElse(cond, then_list, else_list) => {
                self.emit_expr(cond, frame);
                self.emit("    pop rax");
                self.emit("    cmp rax, 0");
                let else_label = self.fresh_label("if_else");
                let end_label = self.fresh_label("if_end");
                self.emit(&format!("    je {else_label}"));
                self.emit_kept_list(then_list, frame);
                self.emit(&format!("    jmp {end_label}"));
                self.label(&else_label);
                self.emit_kept_list(else_list, frame);
                self.label(&end_label);
            }
            ExprKind::While(cond, body) => {
                let start = self.fresh_label("while_start");
                let end = self.fresh_label("while_end");
                self.label(&start);
                self.emit_expr(cond, frame);
                self.emit("    pop rax");
                self.emit("    cmp rax, 0");
                self.emit(&format!("    je {end}"));
                self.emit_discarded_list(body, frame);
                self.emit(&format!("    jmp {start}"));
                self.label(&end);
                self.emit("    push qword 0");
            }
            ExprKind::MethodCall(name, arg) => self.emit_call(None, name, arg, expr, frame),
            ExprKind::DotMethodCall(obj, name, arg) => {
                self.emit_call(Some(obj.as_ref()), name, arg, expr, frame)
            }
        }
    }

    /// Evaluates every expression in `list`, discarding all but the last
    /// one's result word (used for method/if bodies, whose overall value is
    /// their last expression's value).
    fn emit_kept_list(&mut self, list: &[dj_ast::Expr], frame: &Frame<'_>) {
        let Some((last, rest)) = list.split_last() else { return };
        for e in rest {
            self.emit_expr(e, frame);
            self.emit("    pop rax");
        }
        self.emit_expr(last, frame);
    }

    /// Evaluates every expression in `list`, discarding every result (used
    /// for `while` bodies, run purely for effect).
    fn emit_discarded_list(&mut self, list: &[dj_ast::Expr], frame: &Frame<'_>) {
        for e in list {
            self.emit_expr(e, frame);
            self.emit("    pop rax");
        }
    }

    fn emit_binop(&mut self, l: &dj_ast::Expr, r: &dj_ast::Expr, frame: &Frame<'_>, op: &str) {
        self.emit_expr(l, frame);
        self.emit_expr(r, frame);
        self.emit("    pop rbx");
        self.emit("    pop rax");
        self.emit(&format!("    {op}"));
        self.emit("    push rax");
    }

    fn emit_compare(&mut self, l: &dj_ast::Expr, r: &dj_ast::Expr, frame: &Frame<'_>, set: &str) {
        self.emit_expr(l, frame);
        self.emit_expr(r, frame);
        self.emit("    pop rbx");
        self.emit("    pop rax");
        self.emit("    cmp rax, rbx");
        self.emit(&format!("    {set}"));
        self.emit("    movzx rax, al");
        self.emit("    push rax");
    }

    /// Faults with exit status 1 if the object pointer in `rax` is null.
    /// spec.md §4.3.5: field access dereferences through this check; method
    /// dispatch does not (a null receiver there is a type-correctness
    /// violation, not a reachable runtime state).
    fn emit_null_check(&mut self) {
        self.emit("    cmp rax, 0");
        let ok = self.fresh_label("nullcheck_ok");
        self.emit(&format!("    jne {ok}"));
        self.emit("    mov rdi, 1");
        self.emit("    call _exit_program");
        self.label(&ok);
    }

    fn emit_new(&mut self, _name: &str, expr: &dj_ast::Expr) {
        // The type checker already resolved the class name to a type code
        // and recorded it as this node's result type.
        let class_idx = expr.result_type;
        let field_count = self.field_count(class_idx);
        self.emit("    mov rax, r15");
        self.emit(&format!("    mov qword [r15], {class_idx}"));
        for i in 1..=field_count {
            self.emit(&format!("    mov qword [r15+{}], 0", 8 * i));
        }
        self.emit(&format!("    add r15, {}", 8 * (field_count + 1)));
        self.emit("    push rax");
    }

    fn emit_load_ident(&mut self, name: &str, frame: &Frame<'_>) {
        if let Some(operand) = frame.scalar_operand(name) {
            self.emit(&format!("    push qword {operand}"));
            return;
        }
        // Not a parameter or local: must be an inherited field of `this`.
        self.emit("    mov rax, [rbp+32]");
        let offset = self.field_offset(frame.class_idx, name);
        self.emit(&format!("    push qword [rax+{}]", 8 * (offset + 1)));
    }

    /// Stores the value currently at `[rsp]` (left there by the caller)
    /// into `name`'s storage, without popping it — `Assign`'s own result is
    /// that same value.
    fn store_ident(&mut self, name: &str, frame: &Frame<'_>) {
        if let Some(operand) = frame.scalar_operand(name) {
            self.emit(&format!("    mov {operand}, rax"));
            return;
        }
        self.emit("    push rax");
        self.emit("    mov rax, [rbp+32]");
        let offset = self.field_offset(frame.class_idx, name);
        self.emit("    pop rbx");
        self.emit(&format!("    mov [rax+{}], rbx", 8 * (offset + 1)));
    }

    /// Builds the 5-word call frame (spec.md §4.3.3) and dispatches through
    /// `_VTable_Dispatch`. `receiver` is `None` for an implicit-`this` call.
    ///
    /// Pushed deepest-first so that, once the callee's prologue runs
    /// `push rbp; mov rbp, rsp`, the frame reads `[rbp+8]` argument,
    /// `[rbp+16]` static method index, `[rbp+24]` static class index,
    /// `[rbp+32]` receiver, `[rbp+40]` return address.
    fn emit_call(
        &mut self,
        receiver: Option<&dj_ast::Expr>,
        _name: &str,
        arg: &dj_ast::Expr,
        call_expr: &dj_ast::Expr,
        frame: &Frame<'_>,
    ) {
        let static_class: TypeCode = call_expr.static_class_num;
        let static_method: TypeCode = call_expr.static_member_num;

        let return_label = self.fresh_label("ret");
        self.emit(&format!("    lea rax, [{return_label}]"));
        self.emit("    push rax");
        match receiver {
            Some(obj) => self.emit_expr(obj, frame),
            None => self.emit("    push qword [rbp+32]"),
        }
        self.emit(&format!("    push qword {static_class}"));
        self.emit(&format!("    push qword {static_method}"));
        self.emit_expr(arg, frame);
        self.emit("    jmp _VTable_Dispatch");
        self.label(&return_label);
        // The callee unwinds the whole 5-word frame itself and leaves a
        // single result word behind; nothing further to clean up here.
    }
}
