//! Type algebra of SHV trees.
//!
//! Types live in an arena: builtins in a process-wide registry, custom types
//! in a [`Types`] collection owned by the tree. Types refer to each other by
//! [`TypeRef`], which makes forward and mutual references between named types
//! cheap and keeps the ownership acyclic.
//!
//! Every type can validate a [`Value`] and estimate the maximum number of
//! bytes a value of the type takes in chainpack.

mod bitfield;
mod builtins;
mod compound;
mod enums;
mod eq;
mod scalar;
mod size;
mod validate;

use std::fmt;

pub use bitfield::{BitField, BitKey, BitfieldType};
pub use compound::{IMapType, ListType, MapType, TupleType};
pub use enums::EnumType;
pub use scalar::{BlobType, DecimalType, DoubleType, IntType, LengthRange, Pattern, StringType};

use crate::error::TypeError;
use crate::limits::MAX_TYPE_DEPTH;
use crate::model::{Named, NamedSet, Value};

use builtins::BUILTINS;

/// Reference to a type, either builtin or custom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
    Builtin(usize),
    Custom(usize),
}

impl TypeRef {
    pub fn is_builtin(&self) -> bool {
        matches!(self, TypeRef::Builtin(_))
    }
}

/// Type variants and their constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Any,
    Null,
    Bool,
    Int(IntType),
    Double(DoubleType),
    Decimal(DecimalType),
    String(StringType),
    Blob(BlobType),
    DateTime,
    Enum(EnumType),
    Bitfield(BitfieldType),
    List(ListType),
    Tuple(TupleType),
    Map(MapType),
    IMap(IMapType),
    Alias(TypeRef),
    OneOf(Vec<TypeRef>),
    Constant(Value),
}

impl TypeKind {
    /// Name of the variant as used in tree documents.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeKind::Any => "Any",
            TypeKind::Null => "Null",
            TypeKind::Bool => "Bool",
            TypeKind::Int(_) => "Int",
            TypeKind::Double(_) => "Double",
            TypeKind::Decimal(_) => "Decimal",
            TypeKind::String(_) => "String",
            TypeKind::Blob(_) => "Blob",
            TypeKind::DateTime => "DateTime",
            TypeKind::Enum(_) => "Enum",
            TypeKind::Bitfield(_) => "Bitfield",
            TypeKind::List(_) => "List",
            TypeKind::Tuple(_) => "Tuple",
            TypeKind::Map(_) => "Map",
            TypeKind::IMap(_) => "IMap",
            TypeKind::Alias(_) => "Alias",
            TypeKind::OneOf(_) => "OneOf",
            TypeKind::Constant(_) => "Constant",
        }
    }

    /// Builtin that is indistinguishable from this kind.
    pub(crate) fn builtin_equivalent(&self) -> Option<&'static str> {
        match self {
            TypeKind::Any => Some("Any"),
            TypeKind::Null => Some("Null"),
            TypeKind::Bool => Some("Bool"),
            TypeKind::DateTime => Some("DateTime"),
            TypeKind::Int(t) => t.builtin_equivalent(),
            TypeKind::Double(t) if t.is_unconstrained() => Some("Double"),
            TypeKind::Decimal(t) if t.is_unconstrained() => Some("Decimal"),
            TypeKind::String(t) if t.is_unconstrained() => Some("String"),
            TypeKind::Blob(t) if t.is_unconstrained() => Some("Blob"),
            TypeKind::List(l) if *l == ListType::new(TypeRef::ANY) => Some("List"),
            _ => None,
        }
    }

    fn check(&self) -> Result<(), TypeError> {
        if let Some(builtin) = self.builtin_equivalent() {
            return Err(TypeError::UseBuiltin { builtin });
        }
        match self {
            TypeKind::OneOf(types) if types.is_empty() => Err(TypeError::EmptyOneOf),
            _ => Ok(()),
        }
    }

    /// Types this kind is defined directly in terms of, without any container
    /// in between.
    pub(crate) fn direct_refs(&self) -> &[TypeRef] {
        match self {
            TypeKind::Alias(t) => std::slice::from_ref(t),
            TypeKind::OneOf(types) => types,
            _ => &[],
        }
    }
}

/// A named type.
#[derive(Debug, Clone, PartialEq)]
pub struct ShvType {
    name: String,
    kind: TypeKind,
}

impl ShvType {
    /// Creates a custom type.
    ///
    /// Kinds that match a builtin exactly are rejected so that every such
    /// type has a single instance.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Result<Self, TypeError> {
        kind.check()?;
        Ok(Self {
            name: name.into(),
            kind,
        })
    }

    pub fn alias(name: impl Into<String>, target: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Alias(target),
        }
    }

    pub fn one_of(
        name: impl Into<String>,
        types: impl IntoIterator<Item = TypeRef>,
    ) -> Result<Self, TypeError> {
        Self::new(name, TypeKind::OneOf(types.into_iter().collect()))
    }

    /// Type without construction checks; used for builtins and loader stubs.
    pub(crate) fn unchecked(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }
}

impl Named for ShvType {
    fn name(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// COLLECTION
// =============================================================================

/// Custom types of a tree.
///
/// Builtins are always visible through lookups but never stored here.
/// Items are never removed so every handed out [`TypeRef`] stays valid.
#[derive(Debug, Clone, Default)]
pub struct Types {
    custom: NamedSet<ShvType>,
}

impl Types {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of builtin types in their fixed order.
    pub fn builtins() -> &'static NamedSet<ShvType> {
        &BUILTINS
    }

    /// View of a builtin type, independent of any collection.
    pub fn builtin(name: &str) -> Option<TypeView<'static>> {
        let pos = BUILTINS.position(name)?;
        builtins::NO_CUSTOM_TYPES.view(TypeRef::Builtin(pos))
    }

    pub fn custom(&self) -> &NamedSet<ShvType> {
        &self.custom
    }

    pub fn len(&self) -> usize {
        self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.custom.is_empty()
    }

    /// Adds a custom type. Builtin names can't be reused.
    pub fn add(&mut self, ty: ShvType) -> Result<TypeRef, TypeError> {
        if BUILTINS.contains(ty.name()) {
            return Err(TypeError::RedefinesBuiltin {
                name: ty.name().to_string(),
            });
        }
        Ok(TypeRef::Custom(self.custom.add(ty)?))
    }

    /// Replaces the kind of a custom type, checking it like [`ShvType::new`].
    pub(crate) fn define(&mut self, r: TypeRef, kind: TypeKind) -> Result<(), TypeError> {
        kind.check()?;
        match r {
            TypeRef::Custom(pos) => {
                let ty = self
                    .custom
                    .get_index_mut(pos)
                    .ok_or(TypeError::DanglingReference)?;
                ty.kind = kind;
                Ok(())
            }
            TypeRef::Builtin(pos) => Err(TypeError::RedefinesBuiltin {
                name: BUILTINS
                    .get_index(pos)
                    .map_or_else(String::new, |t| t.name().to_string()),
            }),
        }
    }

    /// Resolves a name, builtins first.
    pub fn lookup(&self, name: &str) -> Option<TypeRef> {
        BUILTINS
            .position(name)
            .map(TypeRef::Builtin)
            .or_else(|| self.custom.position(name).map(TypeRef::Custom))
    }

    pub fn get(&self, r: TypeRef) -> Option<&ShvType> {
        match r {
            TypeRef::Builtin(pos) => BUILTINS.get_index(pos),
            TypeRef::Custom(pos) => self.custom.get_index(pos),
        }
    }

    pub fn view(&self, r: TypeRef) -> Option<TypeView<'_>> {
        let ty = self.get(r)?;
        Some(TypeView {
            types: self,
            id: r,
            ty,
        })
    }

    /// Type with the given name, builtins first.
    pub fn get_type(&self, name: &str) -> Option<TypeView<'_>> {
        self.view(self.lookup(name)?)
    }

    pub fn name_of(&self, r: TypeRef) -> Option<&str> {
        self.get(r).map(ShvType::name)
    }

    /// Views of custom types in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = TypeView<'_>> + '_ {
        (0..self.custom.len()).filter_map(|pos| self.view(TypeRef::Custom(pos)))
    }

    /// Follows aliases to the first type that is not an alias.
    pub fn resolve_ref(&self, r: TypeRef) -> TypeRef {
        let mut current = r;
        for _ in 0..MAX_TYPE_DEPTH {
            match self.get(current).map(ShvType::kind) {
                Some(TypeKind::Alias(target)) => current = *target,
                _ => break,
            }
        }
        current
    }

    pub fn resolve(&self, r: TypeRef) -> Option<&ShvType> {
        self.get(self.resolve_ref(r))
    }

    pub(crate) fn is_bool(&self, r: TypeRef) -> bool {
        matches!(self.resolve(r).map(ShvType::kind), Some(TypeKind::Bool))
    }

    pub(crate) fn is_null(&self, r: TypeRef) -> bool {
        matches!(self.resolve(r).map(ShvType::kind), Some(TypeKind::Null))
    }

    /// Bits the type occupies as a bitfield component.
    pub fn bit_span(&self, r: TypeRef) -> Option<u32> {
        match self.resolve(r)?.kind() {
            TypeKind::Null | TypeKind::Bool => Some(1),
            TypeKind::Int(t) => t.bit_span(),
            TypeKind::Enum(e) => e.bit_span(),
            _ => None,
        }
    }

    /// Custom type defined only in terms of itself through aliases and
    /// OneOf members.
    pub fn find_self_reference(&self) -> Option<TypeRef> {
        fn visit(types: &Types, r: TypeRef, stack: &mut Vec<TypeRef>) -> bool {
            if stack.contains(&r) {
                return true;
            }
            let Some(ty) = types.get(r) else {
                return false;
            };
            stack.push(r);
            let found = ty.kind().direct_refs().iter().any(|t| visit(types, *t, stack));
            stack.pop();
            found
        }
        (0..self.custom.len())
            .map(TypeRef::Custom)
            .find(|r| visit(self, *r, &mut Vec::new()))
    }
}

/// Equal when both hold structurally equal types under the same names.
impl PartialEq for Types {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|view| {
                other
                    .get_type(view.name())
                    .is_some_and(|o| !o.is_builtin() && view == o)
            })
    }
}

// =============================================================================
// VIEW
// =============================================================================

/// A type together with the collection its references resolve in.
#[derive(Clone, Copy)]
pub struct TypeView<'a> {
    types: &'a Types,
    id: TypeRef,
    ty: &'a ShvType,
}

impl<'a> TypeView<'a> {
    pub fn id(&self) -> TypeRef {
        self.id
    }

    pub fn types(&self) -> &'a Types {
        self.types
    }

    pub fn ty(&self) -> &'a ShvType {
        self.ty
    }

    pub fn name(&self) -> &'a str {
        &self.ty.name
    }

    pub fn kind(&self) -> &'a TypeKind {
        &self.ty.kind
    }

    pub fn is_builtin(&self) -> bool {
        self.id.is_builtin()
    }

    /// View of another type of the same collection.
    pub fn view(&self, r: TypeRef) -> Option<TypeView<'a>> {
        self.types.view(r)
    }

    /// The first non-alias type this one refers to.
    pub fn resolved(&self) -> TypeView<'a> {
        self.types.view(self.types.resolve_ref(self.id)).unwrap_or(*self)
    }

    pub fn validate(&self, value: &Value) -> bool {
        self.types.validate(self.id, value)
    }

    pub fn encoded_size(&self) -> Option<usize> {
        self.types.encoded_size(self.id)
    }
}

impl PartialEq for TypeView<'_> {
    fn eq(&self, other: &Self) -> bool {
        eq::structural_eq(self.types, self.id, other.types, other.id)
    }
}

impl fmt::Debug for TypeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeView")
            .field("name", &self.name())
            .field("kind", &self.kind().kind_name())
            .finish()
    }
}

impl fmt::Display for TypeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_builtin_instead() {
        for (kind, builtin) in [
            (TypeKind::Int(IntType::default()), "Int"),
            (
                TypeKind::Int(IntType::new(Some(0), None, None, None).unwrap()),
                "UInt",
            ),
            (TypeKind::Double(DoubleType::default()), "Double"),
            (TypeKind::Decimal(DecimalType::default()), "Decimal"),
            (TypeKind::String(StringType::default()), "String"),
            (TypeKind::Blob(BlobType::default()), "Blob"),
            (TypeKind::List(ListType::new(TypeRef::ANY)), "List"),
            (TypeKind::DateTime, "DateTime"),
        ] {
            assert_eq!(
                ShvType::new("foo", kind),
                Err(TypeError::UseBuiltin { builtin })
            );
        }
        assert!(ShvType::new("foo", TypeKind::Int(IntType::range(0, 5).unwrap())).is_ok());
        assert!(
            ShvType::new(
                "foo",
                TypeKind::Int(IntType::new(Some(0), None, None, Some(false)).unwrap())
            )
            .is_ok()
        );
    }

    #[test]
    fn test_empty_one_of_rejected() {
        assert_eq!(
            ShvType::one_of("foo", []),
            Err(TypeError::EmptyOneOf)
        );
    }

    #[test]
    fn test_add_and_lookup() {
        let mut types = Types::new();
        let r = types
            .add(ShvType::one_of("flag", [TypeRef::NULL, TypeRef::BOOL]).unwrap())
            .unwrap();
        assert_eq!(r, TypeRef::Custom(0));
        assert_eq!(types.lookup("flag"), Some(r));
        assert_eq!(types.lookup("Int"), Some(TypeRef::INT));
        assert_eq!(types.lookup("none"), None);
        assert_eq!(types.get_type("flag").unwrap().name(), "flag");

        assert_eq!(
            types.add(ShvType::alias("Int", TypeRef::UINT)),
            Err(TypeError::RedefinesBuiltin {
                name: "Int".to_string()
            })
        );
        assert!(matches!(
            types.add(ShvType::alias("flag", TypeRef::BOOL)),
            Err(TypeError::Name(_))
        ));
    }

    #[test]
    fn test_resolve_alias_chain() {
        let mut types = Types::new();
        let a = types.add(ShvType::alias("a", TypeRef::Custom(1))).unwrap();
        types.add(ShvType::alias("b", TypeRef::UINT8)).unwrap();
        assert_eq!(types.resolve_ref(a), TypeRef::UINT8);
        assert_eq!(types.bit_span(a), Some(8));
        assert_eq!(types.view(a).unwrap().resolved().name(), "UInt8");
    }

    #[test]
    fn test_self_reference() {
        let mut types = Types::new();
        types.add(ShvType::alias("a", TypeRef::Custom(1))).unwrap();
        types
            .add(ShvType::one_of("b", [TypeRef::NULL, TypeRef::Custom(0)]).unwrap())
            .unwrap();
        assert_eq!(types.find_self_reference(), Some(TypeRef::Custom(0)));

        let mut types = Types::new();
        let list = types
            .add(ShvType::unchecked("list", TypeKind::Null))
            .unwrap();
        types
            .define(list, TypeKind::List(ListType::new(list)))
            .unwrap();
        assert_eq!(types.find_self_reference(), None);
    }

    #[test]
    fn test_define_checks_kind() {
        let mut types = Types::new();
        let r = types
            .add(ShvType::unchecked("stub", TypeKind::OneOf(Vec::new())))
            .unwrap();
        assert_eq!(
            types.define(r, TypeKind::OneOf(Vec::new())),
            Err(TypeError::EmptyOneOf)
        );
        assert!(types.define(TypeRef::INT, TypeKind::Null).is_err());
        types.define(r, TypeKind::OneOf(vec![TypeRef::INT])).unwrap();
        assert_eq!(types.get(r).unwrap().kind(), &TypeKind::OneOf(vec![TypeRef::INT]));
    }
}
