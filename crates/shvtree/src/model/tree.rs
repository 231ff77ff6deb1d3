//! Tree root and its shared snapshot.

use std::sync::{Arc, PoisonError, RwLock};

use crate::model::Node;
use crate::types::{TypeView, Types};

/// SHV tree: the root node together with the custom types it refers to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tree {
    pub root: Node,
    pub types: Types,
}

impl Tree {
    pub fn new(types: Types) -> Self {
        Self {
            root: Node::new(""),
            types,
        }
    }

    /// Node at a `/` separated path; the empty path is the root.
    pub fn get_node(&self, path: &str) -> Option<&Node> {
        self.root.get_node(path)
    }

    /// Builtin or custom type with the given name.
    pub fn get_type(&self, name: &str) -> Option<TypeView<'_>> {
        self.types.get_type(name)
    }

    /// All nodes of the tree, depth first, with their paths.
    pub fn iter(&self) -> impl Iterator<Item = (String, &Node)> + '_ {
        self.root.descendants()
    }
}

/// Tree shared between readers and a reloader.
///
/// Readers work on an immutable snapshot. A reload builds a new tree and
/// swaps it in; snapshots taken before keep the previous tree alive.
#[derive(Debug, Default)]
pub struct SharedTree {
    current: RwLock<Arc<Tree>>,
}

impl SharedTree {
    pub fn new(tree: Tree) -> Self {
        Self {
            current: RwLock::new(Arc::new(tree)),
        }
    }

    pub fn snapshot(&self) -> Arc<Tree> {
        // The lock only guards a pointer swap, a poisoned lock still holds
        // a complete tree.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Installs a new tree and returns the previous one.
    pub fn replace(&self, tree: Tree) -> Arc<Tree> {
        let tree = Arc::new(tree);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, tree)
    }
}
