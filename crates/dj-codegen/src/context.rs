//! The code generator: an output buffer, a label counter, and the program
//! being lowered. Grounded on `typhon-compiler::backend::codegen::generator`
//! (one struct threaded through every emission function) minus its
//! `inkwell` builder state, which has no counterpart here.

use dj_ast::{Program, TypeCode};
use dj_symtab::SymbolTable;

use crate::layout;

/// Where a variable reference resolves inside a body currently being
/// lowered.
pub(crate) struct Frame<'a> {
    /// `-1` for the main block, the enclosing class's type code otherwise.
    pub class_idx: TypeCode,
    pub param_name: &'a str,
    pub locals: &'a [dj_symtab::FieldEntry],
}

impl Frame<'_> {
    pub(crate) fn is_main(&self) -> bool { self.class_idx < 0 }

    /// Zero-based index of a local, searching only this frame's own locals
    /// (method locals and the main block's locals are never shared).
    fn local_index(&self, name: &str) -> Option<usize> {
        self.locals.iter().position(|l| l.var_name == name)
    }

    /// An operand string for a plain identifier that is a parameter or
    /// local, or `None` if `name` must be a field of `this` instead.
    pub(crate) fn scalar_operand(&self, name: &str) -> Option<String> {
        if !self.is_main() && self.param_name == name {
            return Some("[rbp+8]".to_owned());
        }
        self.local_index(name).map(|i| format!("[rbp-{}]", 8 * (i + 1)))
    }
}

pub struct CodeGenerator<'a> {
    pub(crate) program: &'a Program,
    pub(crate) table: &'a SymbolTable,
    pub(crate) out: String,
    pub(crate) label_counter: u32,
}

impl<'a> CodeGenerator<'a> {
    #[must_use]
    pub fn new(program: &'a Program, table: &'a SymbolTable) -> Self {
        Self { program, table, out: String::new(), label_counter: 0 }
    }

    /// Lowers the whole program and returns the assembled NASM source.
    pub fn generate(mut self) -> String {
        log::debug!("generating NASM for {} user class(es)", self.table.user_class_count());
        self.emit_preamble();
        self.emit_helpers();
        self.emit_start();
        let class_count = self.table.user_class_count();
        for class_idx in 1..=class_count as TypeCode {
            let method_count = self.table.class(class_idx).expect("sized").methods.len();
            for method_idx in 0..method_count {
                self.emit_method(class_idx, method_idx);
            }
        }
        self.emit_dispatch_table();
        log::debug!("emitted {} bytes of NASM", self.out.len());
        self.out
    }

    pub(crate) fn fresh_label(&mut self, prefix: &str) -> String {
        let n = self.label_counter;
        self.label_counter += 1;
        format!(".L{prefix}{n}")
    }

    pub(crate) fn emit(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }

    pub(crate) fn label(&mut self, name: &str) {
        self.out.push_str(name);
        self.out.push_str(":\n");
    }

    pub(crate) fn field_offset(&self, class_idx: TypeCode, name: &str) -> usize {
        layout::field_offset(class_idx, name, self.table)
            .unwrap_or_else(|| unreachable!("type checker guarantees '{name}' resolves"))
    }

    pub(crate) fn field_count(&self, class_idx: TypeCode) -> usize {
        layout::field_count(class_idx, self.table)
    }

    fn emit_preamble(&mut self) {
        self.emit("; generated by dj-codegen, do not edit by hand");
        self.emit("section .bss");
        self.emit("heap_memory: resq 65536");
        self.emit("input_buffer: resb 21");
        self.emit("section .text");
        self.emit("global _start");
    }

    /// `_exit_program`, `_print_int`, `_read_int`: the three fixed runtime
    /// helpers every emitted program links against, spec.md §4.3.2.
    fn emit_helpers(&mut self) {
        self.label("_exit_program");
        self.emit("    mov rax, 60");
        self.emit("    syscall");

        self.label("_print_int");
        self.emit("    mov rax, rdi");
        self.emit("    lea rsi, [input_buffer+20]");
        self.emit("    mov byte [rsi], 10");
        self.emit("    mov rcx, 10");
        self.label(".print_digit");
        self.emit("    dec rsi");
        self.emit("    xor rdx, rdx");
        self.emit("    div rcx");
        self.emit("    add dl, '0'");
        self.emit("    mov [rsi], dl");
        self.emit("    test rax, rax");
        self.emit("    jnz .print_digit");
        self.emit("    lea rdx, [input_buffer+21]");
        self.emit("    sub rdx, rsi");
        self.emit("    mov rax, 1");
        self.emit("    mov rdi, 1");
        self.emit("    syscall");
        self.emit("    ret");

        self.label("_read_int");
        self.emit("    xor rax, rax");
        self.emit("    mov rdi, 0");
        self.emit("    lea rsi, [input_buffer]");
        self.emit("    mov rdx, 20");
        self.emit("    syscall");
        self.emit("    xor rax, rax");
        self.emit("    xor rcx, rcx");
        self.label(".read_digit");
        self.emit("    movzx rdx, byte [input_buffer+rcx]");
        self.emit("    cmp rdx, '0'");
        self.emit("    jl .read_done");
        self.emit("    cmp rdx, '9'");
        self.emit("    jg .read_done");
        self.emit("    imul rax, rax, 10");
        self.emit("    sub rdx, '0'");
        self.emit("    add rax, rdx");
        self.emit("    inc rcx");
        self.emit("    jmp .read_digit");
        self.label(".read_done");
        self.emit("    ret");
    }

    fn emit_start(&mut self) {
        self.label("_start");
        self.emit("    mov rbp, rsp");
        self.emit("    lea r15, [rel heap_memory]");
        for _ in &self.program.main_locals {
            self.emit("    push qword 0");
        }
        let frame = Frame { class_idx: -1, param_name: "", locals: &self.table.main.locals };
        let body: Vec<_> = self.program.main_body.clone();
        for expr in &body {
            self.emit_expr(expr, &frame);
            self.emit("    pop rax");
        }
        self.emit("    mov rdi, 0");
        self.emit("    call _exit_program");
    }
}

#[cfg(test)]
mod tests {
    use dj_sema::TypeChecker;
    use dj_symtab::SymbolTableBuilder;

    use super::*;

    fn generate(src: &str) -> String {
        let mut program = dj_parser::parse(src).expect("fixture should parse");
        let table = SymbolTableBuilder::new().build(&program);
        TypeChecker::new().check(&mut program, &table).expect("fixture should type-check");
        CodeGenerator::new(&program, &table).generate()
    }

    #[test]
    fn emits_the_fixed_runtime_helpers_and_entry_point() {
        let asm = generate("main { printNat(1+2*3); }");
        for label in ["_exit_program:", "_print_int:", "_read_int:", "_start:", "_VTable_Dispatch:"] {
            assert!(asm.contains(label), "missing {label}");
        }
    }

    #[test]
    fn one_method_label_per_declared_method() {
        let src = "class A extends Object { nat f(nat x) { x; } } \
                   class B extends A { nat g(nat x) { x; } } \
                   main { 0; }";
        let asm = generate(src);
        assert!(asm.contains("_class1method0:"));
        assert!(asm.contains("_class2method0:"));
    }

    #[test]
    fn override_dispatch_falls_through_to_the_sentinel_exit() {
        let src = "class A extends Object { nat f(nat x) { 1; } } \
                   class B extends A { nat f(nat x) { 2; } } \
                   main { A a; a = new B(); printNat(a.f(0)); }";
        let asm = generate(src);
        assert!(asm.contains("mov rdi, 44"));
        // B overrides A.f, so a call statically bound to (A, f) dispatched
        // on a dynamic B must land on B's own implementation.
        let b_label = "_class2method0";
        assert!(asm.contains(&format!("jmp {b_label}")));
    }

    #[test]
    fn new_expression_advances_the_bump_pointer_by_field_count_plus_one() {
        let src = "class A extends Object { nat v; nat w; } main { A a; a = new A(); 0; }";
        let asm = generate(src);
        assert!(asm.contains("add r15, 24"));
    }

    #[test]
    fn assert_success_path_pushes_nat_zero() {
        let asm = generate("main { assert(1); }");
        assert!(asm.contains("mov rdi, 1"));
        assert!(asm.contains("push qword 0"));
    }

    #[test]
    fn field_access_emits_a_null_check() {
        let src = "class A extends Object { nat v; } main { A a; printNat(a.v); }";
        let asm = generate(src);
        assert!(asm.contains("nullcheck_ok"));
    }

    #[test]
    fn or_emits_a_short_circuit_branch() {
        let asm = generate("main { nat x; x = 1; (x==1) || (x==2); }");
        assert!(asm.contains("or_true"));
    }
}
