//! Subtype relation and join (least common ancestor), spec.md §4.2.5.

use dj_ast::{ANY_OBJECT, TypeCode, is_class};
use dj_symtab::SymbolTable;

/// `sub <: sup`: equal, `null` against any class, or reachable by walking
/// `sub`'s superclass chain.
#[must_use]
pub fn is_subtype(sub: TypeCode, sup: TypeCode, table: &SymbolTable) -> bool {
    if sub == sup {
        return true;
    }
    if sub == ANY_OBJECT && is_class(sup) {
        return true;
    }
    if !is_class(sub) {
        return false;
    }
    let mut current = sub;
    while let Some(entry) = table.class(current) {
        current = entry.superclass;
        if current == sup {
            return true;
        }
        if current == dj_ast::NO_TYPE {
            break;
        }
    }
    false
}

/// Least common ancestor of two object-ish types. Only meaningful when both
/// `t1` and `t2` are `ANY_OBJECT` or a resolved class; callers must check
/// that precondition (spec.md §4.2.5: "join is only invoked on pairs that
/// are both object-ish").
#[must_use]
pub fn join(t1: TypeCode, t2: TypeCode, table: &SymbolTable) -> TypeCode {
    if is_subtype(t1, t2, table) {
        return t2;
    }
    if is_subtype(t2, t1, table) {
        return t1;
    }
    let parent = table.class(t1).map_or(dj_ast::NO_TYPE, |c| c.superclass);
    join(parent, t2, table)
}

#[cfg(test)]
mod tests {
    use dj_ast::{ANY_OBJECT, NO_TYPE, OBJECT};
    use dj_symtab::{ClassEntry, MainBlock, SymbolTable};

    use super::*;

    fn table_with(superclasses: &[i32]) -> SymbolTable {
        let mut classes = vec![ClassEntry {
            class_name: "Object".into(),
            class_name_line: 0,
            superclass: NO_TYPE,
            superclass_line: 0,
            is_final: false,
            fields: Vec::new(),
            methods: Vec::new(),
        }];
        for (i, sup) in superclasses.iter().enumerate() {
            classes.push(ClassEntry {
                class_name: format!("C{}", i + 1),
                class_name_line: 0,
                superclass: *sup,
                superclass_line: 0,
                is_final: false,
                fields: Vec::new(),
                methods: Vec::new(),
            });
        }
        SymbolTable { classes, main: MainBlock::default() }
    }

    #[test]
    fn reflexive_for_every_type() {
        let table = table_with(&[OBJECT]);
        for t in [ANY_OBJECT, dj_ast::NAT, OBJECT, 1] {
            assert!(is_subtype(t, t, &table));
        }
    }

    #[test]
    fn transitive_across_three_levels() {
        // C1 <: Object, C2 <: C1, C3 <: C2
        let table = table_with(&[OBJECT, 1, 2]);
        assert!(is_subtype(3, 1, &table));
        assert!(is_subtype(3, OBJECT, &table));
        assert!(!is_subtype(1, 3, &table));
    }

    #[test]
    fn null_is_subtype_of_every_class_not_of_nat() {
        let table = table_with(&[OBJECT]);
        assert!(is_subtype(ANY_OBJECT, OBJECT, &table));
        assert!(is_subtype(ANY_OBJECT, 1, &table));
        assert!(!is_subtype(ANY_OBJECT, dj_ast::NAT, &table));
    }

    #[test]
    fn join_is_commutative_and_idempotent() {
        // C1, C2 both <: Object, no relation to each other.
        let table = table_with(&[OBJECT, OBJECT]);
        assert_eq!(join(1, 2, &table), join(2, 1, &table));
        assert_eq!(join(1, 1, &table), 1);
        assert_eq!(join(1, 2, &table), OBJECT);
    }

    #[test]
    fn join_with_null_returns_the_class() {
        let table = table_with(&[OBJECT]);
        assert_eq!(join(ANY_OBJECT, 1, &table), 1);
        assert_eq!(join(1, ANY_OBJECT, &table), 1);
    }
}
