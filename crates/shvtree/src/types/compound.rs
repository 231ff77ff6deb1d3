//! Container types. Their members are references into a [`Types`](super::Types) arena.

use indexmap::IndexMap;

use crate::types::TypeRef;

/// List of items of a single type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListType {
    pub allowed: TypeRef,
    pub min_len: usize,
    pub max_len: Option<usize>,
}

impl ListType {
    pub fn new(allowed: TypeRef) -> Self {
        Self {
            allowed,
            min_len: 0,
            max_len: None,
        }
    }

    pub fn with_len(allowed: TypeRef, min_len: usize, max_len: Option<usize>) -> Self {
        Self {
            allowed,
            min_len,
            max_len,
        }
    }

    pub fn len_ok(&self, len: usize) -> bool {
        self.min_len <= len && self.max_len.is_none_or(|max| len <= max)
    }
}

/// List with a specific type for every position.
///
/// Values may be shorter than the tuple; missing trailing items are
/// treated as not provided.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TupleType {
    pub items: Vec<TypeRef>,
    /// Enum assigning names to positions.
    pub enum_type: Option<TypeRef>,
}

impl TupleType {
    pub fn new(items: impl IntoIterator<Item = TypeRef>) -> Self {
        Self {
            items: items.into_iter().collect(),
            enum_type: None,
        }
    }
}

/// Map with string keys and a type per key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MapType {
    pub fields: IndexMap<String, TypeRef>,
    /// Type of keys not listed in `fields`; such keys are invalid when unset.
    pub rest: Option<TypeRef>,
}

impl MapType {
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = (S, TypeRef)>) -> Self {
        Self {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            rest: None,
        }
    }

    pub fn field(&self, key: &str) -> Option<TypeRef> {
        self.fields.get(key).copied().or(self.rest)
    }
}

/// Map with integer keys and a type per key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IMapType {
    pub fields: IndexMap<i64, TypeRef>,
    /// Enum providing string aliases for the keys.
    pub enum_type: Option<TypeRef>,
    pub rest: Option<TypeRef>,
}

impl IMapType {
    pub fn new(fields: impl IntoIterator<Item = (i64, TypeRef)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
            enum_type: None,
            rest: None,
        }
    }

    pub fn field(&self, key: i64) -> Option<TypeRef> {
        self.fields.get(&key).copied().or(self.rest)
    }
}
