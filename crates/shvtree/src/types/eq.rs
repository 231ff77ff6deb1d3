//! Structural equality of types, possibly from different collections.
//!
//! Names are ignored and an alias equals the type it refers to. Pairs of
//! types already under comparison are assumed equal, which makes mutually
//! recursive types comparable.

use crate::types::{TypeKind, TypeRef, Types};

struct Comparison<'a> {
    left: &'a Types,
    right: &'a Types,
    assumed: Vec<(TypeRef, TypeRef)>,
}

pub(crate) fn structural_eq(left: &Types, a: TypeRef, right: &Types, b: TypeRef) -> bool {
    Comparison {
        left,
        right,
        assumed: Vec::new(),
    }
    .eq(a, b)
}

impl Comparison<'_> {
    fn eq_opt(&mut self, a: Option<TypeRef>, b: Option<TypeRef>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self.eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    fn eq_all(&mut self, a: &[TypeRef], b: &[TypeRef]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.eq(*x, *y))
    }

    fn eq(&mut self, a: TypeRef, b: TypeRef) -> bool {
        let (left, right) = (self.left, self.right);
        let a = left.resolve_ref(a);
        let b = right.resolve_ref(b);
        if self.assumed.contains(&(a, b)) {
            return true;
        }
        let (Some(ta), Some(tb)) = (left.get(a), right.get(b)) else {
            return false;
        };
        let mark = self.assumed.len();
        self.assumed.push((a, b));
        let equal = self.eq_kinds(ta.kind(), tb.kind());
        if !equal {
            // Drop the assumption and everything concluded under it.
            self.assumed.truncate(mark);
        }
        equal
    }

    fn eq_kinds(&mut self, ka: &TypeKind, kb: &TypeKind) -> bool {
        match (ka, kb) {
            (TypeKind::Any, TypeKind::Any)
            | (TypeKind::Null, TypeKind::Null)
            | (TypeKind::Bool, TypeKind::Bool)
            | (TypeKind::DateTime, TypeKind::DateTime) => true,
            (TypeKind::Int(x), TypeKind::Int(y)) => x == y,
            (TypeKind::Double(x), TypeKind::Double(y)) => x == y,
            (TypeKind::Decimal(x), TypeKind::Decimal(y)) => x == y,
            (TypeKind::String(x), TypeKind::String(y)) => x == y,
            (TypeKind::Blob(x), TypeKind::Blob(y)) => x == y,
            (TypeKind::Enum(x), TypeKind::Enum(y)) => x == y,
            (TypeKind::Constant(x), TypeKind::Constant(y)) => x == y,
            (TypeKind::Bitfield(x), TypeKind::Bitfield(y)) => {
                x.bitsize() == y.bitsize()
                    && x.strict == y.strict
                    && x.fields().len() == y.fields().len()
                    && x.fields().iter().zip(y.fields()).all(|(fx, fy)| {
                        fx.offset == fy.offset && fx.span == fy.span && self.eq(fx.ty, fy.ty)
                    })
                    && self.eq_opt(x.enum_type, y.enum_type)
            }
            (TypeKind::List(x), TypeKind::List(y)) => {
                x.min_len == y.min_len && x.max_len == y.max_len && self.eq(x.allowed, y.allowed)
            }
            (TypeKind::Tuple(x), TypeKind::Tuple(y)) => {
                self.eq_all(&x.items, &y.items) && self.eq_opt(x.enum_type, y.enum_type)
            }
            (TypeKind::Map(x), TypeKind::Map(y)) => {
                x.fields.len() == y.fields.len()
                    && x.fields.iter().all(|(key, tx)| {
                        y.fields.get(key).is_some_and(|ty| self.eq(*tx, *ty))
                    })
                    && self.eq_opt(x.rest, y.rest)
            }
            (TypeKind::IMap(x), TypeKind::IMap(y)) => {
                x.fields.len() == y.fields.len()
                    && x.fields.iter().all(|(key, tx)| {
                        y.fields.get(key).is_some_and(|ty| self.eq(*tx, *ty))
                    })
                    && self.eq_opt(x.enum_type, y.enum_type)
                    && self.eq_opt(x.rest, y.rest)
            }
            // Member order does not matter.
            (TypeKind::OneOf(xs), TypeKind::OneOf(ys)) => {
                xs.iter().all(|x| ys.iter().any(|y| self.eq(*x, *y)))
                    && ys.iter().all(|y| xs.iter().any(|x| self.eq(*x, *y)))
            }
            _ => false,
        }
    }
}
