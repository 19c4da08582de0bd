//! The type-code encoding. DJ has no runtime type values; a type is just an
//! `i32` with a fixed meaning, compared and ordered as plain integers.

/// A DJ type, encoded as an integer: `>= 0` is a user class (or `Object` at
/// `0`), and the negative codes below carry fixed meanings.
pub type TypeCode = i32;

/// Sentinel superclass of `Object` — "no type above this one".
pub const NO_TYPE: TypeCode = -4;

/// A type name that failed to resolve to a known class.
pub const UNRESOLVED: TypeCode = -3;

/// The type of the `null` literal; a subtype of every class.
pub const ANY_OBJECT: TypeCode = -2;

/// The primitive numeric type.
pub const NAT: TypeCode = -1;

/// The predeclared root class, index `0`.
pub const OBJECT: TypeCode = 0;

/// Whether `code` denotes a resolved class (including `Object`).
#[must_use]
pub const fn is_class(code: TypeCode) -> bool { code >= OBJECT }
