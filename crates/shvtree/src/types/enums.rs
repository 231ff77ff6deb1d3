//! Enumeration of named integer values.

use indexmap::IndexMap;

use crate::model::Value;
use crate::types::IntType;

/// Mapping of names to integers. Several names may share a value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumType {
    values: IndexMap<String, u64>,
}

impl EnumType {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names numbered from zero in the given order.
    pub fn from_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            values: names
                .into_iter()
                .zip(0u64..)
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    /// Adds or replaces a named value.
    pub fn with(mut self, name: impl Into<String>, value: u64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: u64) -> Option<u64> {
        self.values.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<u64> {
        self.values.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.values.get(name).copied()
    }

    /// First name declared for the value.
    pub fn name_of(&self, value: u64) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, v)| **v == value)
            .map(|(name, _)| name.as_str())
    }

    pub fn contains_value(&self, value: u64) -> bool {
        self.values.values().any(|v| *v == value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Highest declared value.
    pub fn max_value(&self) -> Option<u64> {
        self.values.values().copied().max()
    }

    /// Unsigned integer able to represent every declared value.
    pub fn integer(&self) -> Option<IntType> {
        let max = self.max_value()?;
        Some(IntType::unchecked(Some(0), Some(i128::from(max)), true))
    }

    pub fn validate(&self, value: &Value) -> bool {
        match value {
            Value::String(name) => self.values.contains_key(name.as_str()),
            other => other
                .as_unsigned()
                .is_some_and(|v| self.contains_value(v)),
        }
    }

    pub fn encoded_size(&self) -> Option<usize> {
        self.integer()?.encoded_size()
    }

    pub fn bit_span(&self) -> Option<u32> {
        self.integer()?.bit_span()
    }
}
