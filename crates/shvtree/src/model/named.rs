//! Ordered collection of uniquely named items.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::NameError;

/// Anything with a read-only name.
pub trait Named {
    fn name(&self) -> &str;
}

/// Ordered set of items that are unique by their name.
///
/// Iteration follows insertion order. Lookups by name go through a hash
/// index kept in sync with the item vector.
#[derive(Clone)]
pub struct NamedSet<T> {
    items: Vec<T>,
    index: FxHashMap<String, usize>,
}

impl<T> Default for NamedSet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<T: Named> NamedSet<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set from items, failing on the first duplicate name.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Result<Self, NameError> {
        let mut set = Self::new();
        for item in items {
            set.add(item)?;
        }
        Ok(set)
    }

    /// Creates a set from items known to have distinct names.
    pub(crate) fn from_unique(items: Vec<T>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(pos, item)| (item.name().to_string(), pos))
            .collect();
        Self { items, index }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends an item. Fails if an item with the same name is present.
    pub fn add(&mut self, item: T) -> Result<usize, NameError> {
        if self.index.contains_key(item.name()) {
            return Err(NameError::Duplicate(item.name().to_string()));
        }
        let pos = self.items.len();
        self.index.insert(item.name().to_string(), pos);
        self.items.push(item);
        Ok(pos)
    }

    /// Returns the item with the given name.
    pub fn get(&self, name: &str) -> Result<&T, NameError> {
        self.find(name)
            .ok_or_else(|| NameError::NotFound(name.to_string()))
    }

    /// Returns the item with the given name, if present.
    pub fn find(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&pos| &self.items[pos])
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut T> {
        let pos = *self.index.get(name)?;
        self.items.get_mut(pos)
    }

    /// Position of the named item in insertion order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get_index(&self, pos: usize) -> Option<&T> {
        self.items.get(pos)
    }

    pub(crate) fn get_index_mut(&mut self, pos: usize) -> Option<&mut T> {
        self.items.get_mut(pos)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Checks whether an item equal to `item` is in the set.
    pub fn contains_item(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.find(item.name()).is_some_and(|own| own == item)
    }

    /// Removes and returns the named item.
    pub fn remove(&mut self, name: &str) -> Result<T, NameError> {
        let pos = self
            .index
            .remove(name)
            .ok_or_else(|| NameError::NotFound(name.to_string()))?;
        let item = self.items.remove(pos);
        for idx in self.index.values_mut() {
            if *idx > pos {
                *idx -= 1;
            }
        }
        Ok(item)
    }

    /// Adds every item of `other`.
    ///
    /// Names are checked up front so a duplicate leaves `self` untouched.
    pub fn update(&mut self, other: NamedSet<T>) -> Result<(), NameError> {
        if let Some(dup) = other.names().find(|name| self.contains(name)) {
            return Err(NameError::Duplicate(dup.to_string()));
        }
        for item in other.items {
            self.add(item)?;
        }
        Ok(())
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.iter().map(Named::name)
    }

    /// Items in insertion order.
    pub fn values(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// `(name, item)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> + '_ {
        self.items.iter().map(|item| (item.name(), item))
    }
}

/// Two sets are equal when they hold equal items under the same names,
/// regardless of the insertion order.
impl<T: Named + PartialEq> PartialEq for NamedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .values()
                .all(|item| other.find(item.name()).is_some_and(|o| o == item))
    }
}

impl<T: Named + fmt::Debug> fmt::Debug for NamedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, T: Named> IntoIterator for &'a NamedSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
