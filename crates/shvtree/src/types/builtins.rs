//! Builtin types.
//!
//! The registry is built once and never modified. Positions in it are the
//! indices behind the `TypeRef` constants below.

use lazy_static::lazy_static;

use crate::model::NamedSet;
use crate::types::{IntType, ListType, MapType, IMapType, ShvType, TypeKind, TypeRef, Types};

impl TypeRef {
    pub const ANY: TypeRef = TypeRef::Builtin(0);
    pub const NULL: TypeRef = TypeRef::Builtin(1);
    pub const BOOL: TypeRef = TypeRef::Builtin(2);
    pub const INT: TypeRef = TypeRef::Builtin(3);
    pub const INT8: TypeRef = TypeRef::Builtin(4);
    pub const INT16: TypeRef = TypeRef::Builtin(5);
    pub const INT32: TypeRef = TypeRef::Builtin(6);
    pub const INT64: TypeRef = TypeRef::Builtin(7);
    pub const UINT: TypeRef = TypeRef::Builtin(8);
    pub const UINT8: TypeRef = TypeRef::Builtin(9);
    pub const UINT16: TypeRef = TypeRef::Builtin(10);
    pub const UINT32: TypeRef = TypeRef::Builtin(11);
    pub const UINT64: TypeRef = TypeRef::Builtin(12);
    pub const DOUBLE: TypeRef = TypeRef::Builtin(13);
    pub const DECIMAL: TypeRef = TypeRef::Builtin(14);
    pub const STRING: TypeRef = TypeRef::Builtin(15);
    pub const BLOB: TypeRef = TypeRef::Builtin(16);
    pub const DATETIME: TypeRef = TypeRef::Builtin(17);
    pub const LIST: TypeRef = TypeRef::Builtin(18);
    pub const MAP: TypeRef = TypeRef::Builtin(19);
    pub const IMAP: TypeRef = TypeRef::Builtin(20);
    /// Null or String.
    pub const OPTIONAL_STRING: TypeRef = TypeRef::Builtin(21);
    /// Parameter of property getters.
    pub const GET_PARAM: TypeRef = TypeRef::Builtin(22);
}

fn signed(bits: u32) -> TypeKind {
    let limit = 1i128 << (bits - 1);
    TypeKind::Int(IntType::unchecked(Some(-limit), Some(limit - 1), false))
}

fn unsigned(bits: u32) -> TypeKind {
    TypeKind::Int(IntType::unchecked(Some(0), Some((1i128 << bits) - 1), true))
}

fn registry() -> NamedSet<ShvType> {
    let any_map = MapType {
        rest: Some(TypeRef::ANY),
        ..MapType::default()
    };
    let any_imap = IMapType {
        rest: Some(TypeRef::ANY),
        ..IMapType::default()
    };
    NamedSet::from_unique(vec![
        ShvType::unchecked("Any", TypeKind::Any),
        ShvType::unchecked("Null", TypeKind::Null),
        ShvType::unchecked("Bool", TypeKind::Bool),
        ShvType::unchecked("Int", TypeKind::Int(IntType::default())),
        ShvType::unchecked("Int8", signed(8)),
        ShvType::unchecked("Int16", signed(16)),
        ShvType::unchecked("Int32", signed(32)),
        ShvType::unchecked("Int64", signed(64)),
        ShvType::unchecked("UInt", TypeKind::Int(IntType::unchecked(Some(0), None, true))),
        ShvType::unchecked("UInt8", unsigned(8)),
        ShvType::unchecked("UInt16", unsigned(16)),
        ShvType::unchecked("UInt32", unsigned(32)),
        ShvType::unchecked("UInt64", unsigned(64)),
        ShvType::unchecked("Double", TypeKind::Double(Default::default())),
        ShvType::unchecked("Decimal", TypeKind::Decimal(Default::default())),
        ShvType::unchecked("String", TypeKind::String(Default::default())),
        ShvType::unchecked("Blob", TypeKind::Blob(Default::default())),
        ShvType::unchecked("DateTime", TypeKind::DateTime),
        ShvType::unchecked("List", TypeKind::List(ListType::new(TypeRef::ANY))),
        ShvType::unchecked("Map", TypeKind::Map(any_map)),
        ShvType::unchecked("IMap", TypeKind::IMap(any_imap)),
        ShvType::unchecked(
            "OptionalString",
            TypeKind::OneOf(vec![TypeRef::NULL, TypeRef::STRING]),
        ),
        ShvType::unchecked("_getParam", TypeKind::Alias(TypeRef::OPTIONAL_STRING)),
    ])
}

lazy_static! {
    pub(crate) static ref BUILTINS: NamedSet<ShvType> = registry();
    /// Empty collection for viewing builtins on their own.
    pub(crate) static ref NO_CUSTOM_TYPES: Types = Types::new();
}
