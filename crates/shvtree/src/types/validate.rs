//! Value validation.

use crate::limits::MAX_TYPE_DEPTH;
use crate::model::Value;
use crate::types::{IMapType, TypeKind, TypeRef, Types};

/// Integers compare by value regardless of their signedness.
fn same_literal(a: &Value, b: &Value) -> bool {
    match (a.as_integer(), b.as_integer()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

impl Types {
    /// Checks whether the value conforms to the type.
    ///
    /// Unknown references and values nested deeper than
    /// [`MAX_TYPE_DEPTH`] are invalid.
    pub fn validate(&self, r: TypeRef, value: &Value) -> bool {
        self.validate_at(r, value, 0)
    }

    fn validate_at(&self, r: TypeRef, value: &Value, depth: usize) -> bool {
        if depth > MAX_TYPE_DEPTH {
            return false;
        }
        let Some(ty) = self.get(r) else {
            return false;
        };
        let depth = depth + 1;
        match ty.kind() {
            TypeKind::Any => true,
            TypeKind::Null => matches!(value, Value::Null),
            TypeKind::Bool => matches!(value, Value::Bool(_)),
            TypeKind::Int(t) => t.validate(value),
            TypeKind::Double(t) => t.validate(value),
            TypeKind::Decimal(t) => t.validate(value),
            TypeKind::String(t) => t.validate(value),
            TypeKind::Blob(t) => t.validate(value),
            TypeKind::DateTime => matches!(value, Value::DateTime(_)),
            TypeKind::Enum(e) => e.validate(value),
            TypeKind::Bitfield(b) => b.validate(value, self),
            TypeKind::List(l) => match value {
                Value::List(items) => {
                    l.len_ok(items.len())
                        && items.iter().all(|i| self.validate_at(l.allowed, i, depth))
                }
                _ => false,
            },
            TypeKind::Tuple(t) => match value {
                Value::List(items) => {
                    items.len() <= t.items.len()
                        && items
                            .iter()
                            .zip(&t.items)
                            .all(|(item, tp)| self.validate_at(*tp, item, depth))
                }
                _ => false,
            },
            TypeKind::Map(m) => match value {
                Value::Map(map) => map.iter().all(|(key, item)| {
                    m.field(key)
                        .is_some_and(|tp| self.validate_at(tp, item, depth))
                }),
                _ => false,
            },
            TypeKind::IMap(m) => self.validate_imap(m, value, depth),
            TypeKind::Alias(target) => self.validate_at(*target, value, depth),
            TypeKind::OneOf(types) => types.iter().any(|tp| self.validate_at(*tp, value, depth)),
            TypeKind::Constant(literal) => same_literal(literal, value),
        }
    }

    /// IMap values use integer keys; string keys are accepted when the
    /// IMap has an enum translating them.
    fn validate_imap(&self, m: &IMapType, value: &Value, depth: usize) -> bool {
        let check = |key: i64, item: &Value| {
            m.field(key)
                .is_some_and(|tp| self.validate_at(tp, item, depth))
        };
        match value {
            Value::IMap(map) => map.iter().all(|(key, item)| check(*key, item)),
            Value::Map(map) => {
                let Some(TypeKind::Enum(e)) = m
                    .enum_type
                    .and_then(|r| self.resolve(r))
                    .map(|t| t.kind())
                else {
                    return false;
                };
                map.iter().all(|(key, item)| {
                    e.get(key)
                        .and_then(|k| i64::try_from(k).ok())
                        .is_some_and(|k| check(k, item))
                })
            }
            _ => false,
        }
    }
}
