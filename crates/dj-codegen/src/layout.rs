//! Flattened field layout, spec.md §3.4 and §4.3.6.
//!
//! A field's offset is its position in the flattening of a *static* class:
//! own fields first, then the direct superclass's own fields, recursing up
//! to (but not including) `Object`. The same flattening is used both to
//! size a freshly allocated object (walking from its exact, leaf class) and
//! to compute a field's address at an access site (walking from the
//! expression's static class) — spec.md prescribes both from the same
//! recursive rule, so one function serves both callers.

use dj_ast::{OBJECT, TypeCode, is_class};
use dj_symtab::SymbolTable;

/// Own-then-ancestor field names of `class_idx`, outermost-last.
#[must_use]
pub fn flatten_fields(class_idx: TypeCode, table: &SymbolTable) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = class_idx;
    while is_class(current) && current != OBJECT {
        let Some(entry) = table.class(current) else { break };
        out.extend(entry.fields.iter().map(|f| f.var_name.clone()));
        current = entry.superclass;
    }
    out
}

/// `name`'s flattened offset within `class_idx`'s layout, or `None` if no
/// field by that name is reachable from `class_idx`. Field `0` in memory is
/// the dynamic type-code word, so the word offset of field index `i` is
/// `i + 1`.
#[must_use]
pub fn field_offset(class_idx: TypeCode, name: &str, table: &SymbolTable) -> Option<usize> {
    flatten_fields(class_idx, table).iter().position(|f| f == name)
}

/// Total field count reachable from `class_idx`, used to size a fresh
/// object at `new`.
#[must_use]
pub fn field_count(class_idx: TypeCode, table: &SymbolTable) -> usize {
    flatten_fields(class_idx, table).len()
}

#[cfg(test)]
mod tests {
    use dj_ast::NO_TYPE;
    use dj_symtab::{ClassEntry, FieldEntry, MainBlock, SymbolTable};

    use super::*;

    fn field(name: &str) -> FieldEntry {
        FieldEntry { var_name: name.into(), var_name_line: 0, ty: dj_ast::NAT, type_line: 0 }
    }

    fn table() -> SymbolTable {
        let object =
            ClassEntry {
                class_name: "Object".into(),
                class_name_line: 0,
                superclass: NO_TYPE,
                superclass_line: 0,
                is_final: false,
                fields: Vec::new(),
                methods: Vec::new(),
            };
        let a = ClassEntry {
            class_name: "A".into(),
            class_name_line: 0,
            superclass: OBJECT,
            superclass_line: 0,
            is_final: false,
            fields: vec![field("v")],
            methods: Vec::new(),
        };
        let b = ClassEntry {
            class_name: "B".into(),
            class_name_line: 0,
            superclass: 1,
            superclass_line: 0,
            is_final: false,
            fields: vec![field("w"), field("x")],
            methods: Vec::new(),
        };
        SymbolTable { classes: vec![object, a, b], main: MainBlock::default() }
    }

    #[test]
    fn own_fields_precede_inherited_fields() {
        let table = table();
        assert_eq!(flatten_fields(2, &table), vec!["w", "x", "v"]);
    }

    #[test]
    fn offset_is_position_in_the_flattening() {
        let table = table();
        assert_eq!(field_offset(2, "w", &table), Some(0));
        assert_eq!(field_offset(2, "x", &table), Some(1));
        assert_eq!(field_offset(2, "v", &table), Some(2));
        assert_eq!(field_offset(1, "v", &table), Some(0));
        assert_eq!(field_offset(1, "w", &table), None);
    }

    #[test]
    fn field_count_matches_flattening_length() {
        let table = table();
        assert_eq!(field_count(2, &table), 3);
        assert_eq!(field_count(0, &table), 0);
    }
}
