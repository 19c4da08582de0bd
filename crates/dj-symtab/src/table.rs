//! The symbol table data model.

use dj_ast::TypeCode;

/// A single declared field (or a method's local / parameter, which share
/// the same shape).
#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub var_name: String,
    pub var_name_line: u32,
    pub ty: TypeCode,
    pub type_line: u32,
}

/// One declared method of a class.
#[derive(Debug, Clone)]
pub struct MethodEntry {
    pub method_name: String,
    pub method_name_line: u32,
    pub return_type: TypeCode,
    pub return_type_line: u32,
    pub param_name: String,
    pub param_name_line: u32,
    pub param_type: TypeCode,
    pub param_type_line: u32,
    pub is_final: bool,
    pub locals: Vec<FieldEntry>,
}

/// One declared class. Entry `0` in [`SymbolTable::classes`] is always the
/// predeclared `Object`, with superclass [`dj_ast::NO_TYPE`] and no members.
#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub class_name: String,
    pub class_name_line: u32,
    pub superclass: TypeCode,
    pub superclass_line: u32,
    pub is_final: bool,
    pub fields: Vec<FieldEntry>,
    pub methods: Vec<MethodEntry>,
}

impl ClassEntry {
    #[must_use]
    pub fn find_field(&self, name: &str) -> Option<&FieldEntry> {
        self.fields.iter().find(|f| f.var_name == name)
    }

    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<(usize, &MethodEntry)> {
        self.methods.iter().enumerate().find(|(_, m)| m.method_name == name)
    }
}

/// The main block's locals (the expression list itself lives on
/// `Program::main_body` and is not duplicated here).
#[derive(Debug, Clone, Default)]
pub struct MainBlock {
    pub locals: Vec<FieldEntry>,
}

/// The whole program's symbol table: classes indexed by type code (`0` is
/// `Object`) plus the main block's locals.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    pub classes: Vec<ClassEntry>,
    pub main: MainBlock,
}

impl SymbolTable {
    /// Number of user-declared classes (excludes `Object`).
    #[must_use]
    pub fn user_class_count(&self) -> usize { self.classes.len() - 1 }

    #[must_use]
    pub fn class(&self, code: TypeCode) -> Option<&ClassEntry> {
        usize::try_from(code).ok().and_then(|i| self.classes.get(i))
    }

    /// Index of the user class named `name`, if any (never matches
    /// `"Object"`, which callers should check for separately).
    #[must_use]
    pub fn find_class_by_name(&self, name: &str) -> Option<TypeCode> {
        self.classes
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, c)| c.class_name == name)
            .map(|(i, _)| i as TypeCode)
    }
}
