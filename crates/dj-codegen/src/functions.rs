//! Per-method emission and the virtual dispatch table, spec.md §4.3.3 and
//! §4.3.4. Grounded on the per-function loop in
//! `typhon-compiler::backend::codegen::functions`, replacing its LLVM
//! function-value plumbing with NASM labels.

use dj_ast::TypeCode;

use crate::context::{CodeGenerator, Frame};

/// The label of `classI`'s `methodJ`, used both as a definition site and as
/// a dispatch-table jump target.
pub(crate) fn method_label(class_idx: TypeCode, method_idx: usize) -> String {
    format!("_class{class_idx}method{method_idx}")
}

impl CodeGenerator<'_> {
    /// Emits one method's prologue, body, and epilogue. Call frame layout
    /// (spec.md §4.3.3): `[rbp+8]` argument, `[rbp+16]` static method index,
    /// `[rbp+24]` static class index, `[rbp+32]` receiver (`this`),
    /// `[rbp+40]` return address pushed by `call`.
    pub(crate) fn emit_method(&mut self, class_idx: TypeCode, method_idx: usize) {
        let entry = self.table.class(class_idx).expect("sized");
        let method = &entry.methods[method_idx];
        let local_count = method.locals.len();

        log::trace!(
            "emitting {}::{} ({local_count} local(s))",
            entry.class_name,
            method.method_name
        );
        self.label(&method_label(class_idx, method_idx));
        self.emit("    push rbp");
        self.emit("    mov rbp, rsp");
        for _ in 0..local_count {
            self.emit("    push qword 0");
        }

        let decl = &self.program.classes[usize::try_from(class_idx - 1).expect("user class")]
            .methods[method_idx];
        let frame =
            Frame { class_idx, param_name: &method.param_name, locals: &method.locals };
        let body = decl.body.clone();
        for (i, expr) in body.iter().enumerate() {
            self.emit_expr(expr, &frame);
            if i + 1 < body.len() {
                self.emit("    pop rax");
            }
        }
        // The last expression's result is the return value. Dispatch got
        // here by `jmp`, not `call`, so the return address sits below the
        // whole 5-word frame (spec.md §4.3.3) rather than on top of it;
        // unwind the frame by hand and jump back instead of using `ret`.
        self.emit("    pop rax");
        self.emit(&format!("    add rsp, {}", 8 * local_count));
        self.emit("    pop rbp");
        self.emit("    add rsp, 32"); // arg, static method, static class, receiver
        self.emit("    pop rcx"); // return address
        self.emit("    push rax");
        self.emit("    jmp rcx");
    }

    /// One row per `(static class S, method of S, dynamic class D)` triple
    /// with `D <: S`, spec.md §4.3.4. For each candidate `D` we walk its own
    /// ancestor chain; every class `S` visited contributes its own declared
    /// methods as dispatch keys, and the actual target is whichever class
    /// between `D` and `S` (inclusive, nearest to `D` first) overrides that
    /// method name.
    pub(crate) fn emit_dispatch_table(&mut self) {
        self.label("_VTable_Dispatch");
        self.emit("    mov rax, [rsp+24]"); // receiver
        self.emit("    mov rax, [rax]"); // dynamic type code

        let class_count = self.table.user_class_count() as TypeCode;
        for dynamic in 1..=class_count {
            let chain = ancestor_chain_inclusive(dynamic, self.table);
            for (pos, &static_class) in chain.iter().enumerate() {
                let static_entry = self.table.class(static_class).expect("resolved");
                for (static_method_idx, method) in static_entry.methods.iter().enumerate() {
                    let target_class = chain[..=pos]
                        .iter()
                        .find(|&&candidate| {
                            self.table
                                .class(candidate)
                                .expect("resolved")
                                .find_method(&method.method_name)
                                .is_some()
                        })
                        .copied()
                        .expect("static_class itself declares this method");
                    let target_idx = self
                        .table
                        .class(target_class)
                        .expect("resolved")
                        .find_method(&method.method_name)
                        .expect("found above")
                        .0;

                    self.emit(&format!("    cmp rax, {dynamic}"));
                    let skip = self.fresh_label("vtbl_skip");
                    self.emit(&format!("    jne {skip}"));
                    self.emit(&format!("    cmp qword [rsp+16], {static_class}"));
                    self.emit(&format!("    jne {skip}"));
                    self.emit(&format!("    cmp qword [rsp+8], {static_method_idx}"));
                    self.emit(&format!("    jne {skip}"));
                    self.emit(&format!("    jmp {}", method_label(target_class, target_idx)));
                    self.label(&skip);
                }
            }
        }
        self.emit("    mov rdi, 44");
        self.emit("    call _exit_program");
    }
}

/// `[dynamic, super(dynamic), ..., Object]`.
fn ancestor_chain_inclusive(dynamic: TypeCode, table: &dj_symtab::SymbolTable) -> Vec<TypeCode> {
    let mut chain = vec![dynamic];
    let mut current = dynamic;
    while let Some(entry) = table.class(current) {
        current = entry.superclass;
        if !dj_ast::is_class(current) {
            break;
        }
        chain.push(current);
        if current == dj_ast::OBJECT {
            break;
        }
    }
    chain
}
