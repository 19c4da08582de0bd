use dj_ast::{ExprKind, TypeRefKind};

#[test]
fn parses_minimal_main() {
    let program = dj_parser::parse("main { printNat(1+2*3); }").expect("should parse");
    assert!(program.classes.is_empty());
    assert_eq!(program.main_body.len(), 1);
    assert!(matches!(program.main_body[0].kind, ExprKind::Print(_)));
}

#[test]
fn parses_class_with_field_and_method() {
    let src = "class A extends Object { nat v; nat get(nat u) { this.v; } } main { 0; }";
    let program = dj_parser::parse(src).expect("should parse");
    assert_eq!(program.classes.len(), 1);
    let class = &program.classes[0];
    assert_eq!(class.name.name, "A");
    assert_eq!(class.superclass.name, "Object");
    assert_eq!(class.fields.len(), 1);
    assert_eq!(class.fields[0].name.name, "v");
    assert_eq!(class.methods.len(), 1);
    assert_eq!(class.methods[0].name.name, "get");
    assert_eq!(class.methods[0].param_name.name, "u");
    assert!(matches!(class.methods[0].param_type.kind, TypeRefKind::Nat));
}

#[test]
fn parses_final_class_and_while_loop() {
    let src = "final class A extends Object {} \
               main { nat x; x = 5; while(0<x) { printNat(x); x = x-1; }; }";
    let program = dj_parser::parse(src).expect("should parse");
    assert!(program.classes[0].is_final);
    assert_eq!(program.main_locals.len(), 1);
    assert_eq!(program.main_body.len(), 2);
    assert!(matches!(program.main_body[1].kind, ExprKind::While(..)));
}

#[test]
fn assignment_requires_lvalue() {
    let err = dj_parser::parse("main { 1 = 2; }").unwrap_err();
    assert!(err.to_string().contains("assignable"));
}

#[test]
fn rejects_empty_body() {
    let err = dj_parser::parse("main { }").unwrap_err();
    assert!(err.to_string().contains("non-empty"));
}

#[test]
fn dot_chains_and_method_calls() {
    let src = "main { nat a; a = 0; a.b.c(0); }";
    let err = dj_parser::parse(src);
    // `a` is typed nat in the grammar but the parser doesn't check types —
    // this should parse fine; type errors are the type checker's job.
    assert!(err.is_ok());
}
