//! Maximum chainpack size of values of a type.

use crate::codec::chainpack::encoded_len;
use crate::limits::{DATETIME_SIZE, DOUBLE_SIZE};
use crate::types::{TypeKind, TypeRef, Types};

impl Types {
    /// Upper bound of the chainpack size of any valid value of the type.
    ///
    /// `None` means unbounded: containers other than tuples, unbounded
    /// scalars and types reachable from themselves.
    pub fn encoded_size(&self, r: TypeRef) -> Option<usize> {
        self.size_of(r, &mut Vec::new())
    }

    fn size_of(&self, r: TypeRef, visiting: &mut Vec<TypeRef>) -> Option<usize> {
        if visiting.contains(&r) {
            return None;
        }
        let ty = self.get(r)?;
        visiting.push(r);
        let size = match ty.kind() {
            TypeKind::Any => None,
            TypeKind::Null | TypeKind::Bool => Some(1),
            TypeKind::Int(t) => t.encoded_size(),
            TypeKind::Double(_) => Some(DOUBLE_SIZE),
            TypeKind::Decimal(t) => t.encoded_size(),
            TypeKind::String(t) => t.encoded_size(),
            TypeKind::Blob(t) => t.encoded_size(),
            TypeKind::DateTime => Some(DATETIME_SIZE),
            TypeKind::Enum(e) => e.encoded_size(),
            TypeKind::Bitfield(b) => b.encoded_size(),
            TypeKind::List(_) | TypeKind::Map(_) | TypeKind::IMap(_) => None,
            // Tag and terminator around the items.
            TypeKind::Tuple(t) => t
                .items
                .iter()
                .try_fold(2usize, |acc, item| Some(acc + self.size_of(*item, visiting)?)),
            TypeKind::Alias(target) => self.size_of(*target, visiting),
            TypeKind::OneOf(types) => types.iter().try_fold(None, |acc: Option<usize>, item| {
                let size = self.size_of(*item, visiting)?;
                Some(Some(acc.map_or(size, |a| a.max(size))))
            })?,
            TypeKind::Constant(literal) => Some(encoded_len(literal)),
        };
        visiting.pop();
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use crate::types::{EnumType, IntType, ListType, ShvType, TupleType};

    #[test]
    fn test_tuple_size() {
        let mut types = Types::new();
        let tpl = types
            .add(
                ShvType::new(
                    "tpl",
                    TypeKind::Tuple(TupleType::new([TypeRef::BOOL, TypeRef::UINT8, TypeRef::NULL])),
                )
                .unwrap(),
            )
            .unwrap();
        assert_eq!(types.encoded_size(tpl), Some(2 + 1 + 2 + 1));

        let open = types
            .add(
                ShvType::new(
                    "open",
                    TypeKind::Tuple(TupleType::new([TypeRef::BOOL, TypeRef::INT])),
                )
                .unwrap(),
            )
            .unwrap();
        assert_eq!(types.encoded_size(open), None);
    }

    #[test]
    fn test_one_of_size() {
        let mut types = Types::new();
        let a = types
            .add(ShvType::one_of("a", [TypeRef::BOOL, TypeRef::UINT16]).unwrap())
            .unwrap();
        assert_eq!(types.encoded_size(a), Some(4));
        let b = types
            .add(ShvType::one_of("b", [TypeRef::BOOL, TypeRef::STRING]).unwrap())
            .unwrap();
        assert_eq!(types.encoded_size(b), None);
    }

    #[test]
    fn test_constant_and_enum_size() {
        let mut types = Types::new();
        let last = types
            .add(ShvType::new("last", TypeKind::Constant(Value::from("last"))).unwrap())
            .unwrap();
        assert_eq!(types.encoded_size(last), Some(6));
        let status = types
            .add(
                ShvType::new(
                    "status",
                    TypeKind::Enum(EnumType::from_names(["ok", "warning", "error"])),
                )
                .unwrap(),
            )
            .unwrap();
        assert_eq!(types.encoded_size(status), Some(1));
        let alias = types.add(ShvType::alias("st", status)).unwrap();
        assert_eq!(types.encoded_size(alias), Some(1));
    }

    #[test]
    fn test_recursive_is_unbounded() {
        let mut types = Types::new();
        let node = types
            .add(ShvType::unchecked("node", TypeKind::Null))
            .unwrap();
        let list = types
            .add(ShvType::new("nodes", TypeKind::List(ListType::new(node))).unwrap())
            .unwrap();
        types
            .define(node, TypeKind::Tuple(TupleType::new([TypeRef::BOOL, list])))
            .unwrap();
        assert_eq!(types.encoded_size(node), None);

        let looped = types
            .add(ShvType::unchecked("looped", TypeKind::Null))
            .unwrap();
        types
            .define(looped, TypeKind::Tuple(TupleType::new([looped])))
            .unwrap();
        assert_eq!(types.encoded_size(looped), None);
    }

    #[test]
    fn test_shared_member_is_not_recursion() {
        let mut types = Types::new();
        let small = types
            .add(ShvType::new("small", TypeKind::Int(IntType::range(0, 3).unwrap())).unwrap())
            .unwrap();
        let pair = types
            .add(ShvType::new("pair", TypeKind::Tuple(TupleType::new([small, small]))).unwrap())
            .unwrap();
        assert_eq!(types.encoded_size(pair), Some(4));
    }
}
