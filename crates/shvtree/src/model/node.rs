//! Nodes of the SHV tree.

use crate::error::{NameError, PropertyError};
use crate::model::{Method, Named, NamedSet};
use crate::types::TypeRef;

/// Change signal of a property node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// No change signal.
    Off,
    /// The standard `chng` signal.
    Change,
    /// Signal with a custom name.
    Named(String),
}

impl Signal {
    fn method_name(&self) -> Option<&str> {
        match self {
            Signal::Off => None,
            Signal::Change => Some("chng"),
            Signal::Named(name) => Some(name),
        }
    }
}

impl From<bool> for Signal {
    fn from(enabled: bool) -> Self {
        if enabled { Signal::Change } else { Signal::Off }
    }
}

/// Node of the SHV tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    name: String,
    pub nodes: NamedSet<Node>,
    pub methods: NamedSet<Method>,
    pub description: String,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: NamedSet::new(),
            methods: NamedSet::new(),
            description: String::new(),
        }
    }

    /// Creates a node with property methods for the given type.
    pub fn property(
        name: impl Into<String>,
        ty: TypeRef,
        readonly: bool,
        signal: Option<Signal>,
    ) -> Result<Self, PropertyError> {
        let mut node = Self::new(name);
        node.methods = property_methods(ty, readonly, signal)?;
        Ok(node)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds getter, setter and change signal for a property of type `ty`.
    ///
    /// The setter is skipped for read-only properties. Without an explicit
    /// `signal` only writable properties signal changes. Nothing is added
    /// if any of the methods already exists or the signal name is taken by
    /// an accessor or reserved.
    pub fn make_property(
        &mut self,
        ty: TypeRef,
        readonly: bool,
        signal: Option<Signal>,
    ) -> Result<(), PropertyError> {
        let methods = property_methods(ty, readonly, signal)?;
        if let Some(existing) = methods.names().find(|name| self.methods.contains(name)) {
            return Err(PropertyError::MethodExists(existing.to_string()));
        }
        self.methods
            .update(methods)
            .map_err(|(NameError::Duplicate(name) | NameError::NotFound(name))| {
                PropertyError::MethodExists(name)
            })
    }

    /// Whether the node has a value, i.e. a `get` method.
    ///
    /// `readonly` and `signal` additionally require absence (or presence)
    /// of the `set` and `chng` methods.
    pub fn is_property(&self, readonly: Option<bool>, signal: Option<bool>) -> bool {
        self.methods.contains("get")
            && readonly.is_none_or(|ro| !self.methods.contains("set") == ro)
            && signal.is_none_or(|sig| self.methods.contains("chng") == sig)
    }

    /// Descendant at a `/` separated path. The empty path is the node itself.
    pub fn get_node(&self, path: &str) -> Option<&Node> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('/')
            .try_fold(self, |node, segment| node.nodes.find(segment))
    }

    pub fn get_node_mut(&mut self, path: &str) -> Option<&mut Node> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('/')
            .try_fold(self, |node, segment| node.nodes.find_mut(segment))
    }

    /// Depth-first iteration over all descendants with paths relative to
    /// this node.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![(None, self.nodes.values())],
        }
    }
}

impl Named for Node {
    fn name(&self) -> &str {
        &self.name
    }
}

fn property_methods(
    ty: TypeRef,
    readonly: bool,
    signal: Option<Signal>,
) -> Result<NamedSet<Method>, PropertyError> {
    let signal = signal.unwrap_or(Signal::from(!readonly));
    let mut methods = vec![Method::getter(ty)];
    if !readonly {
        methods.push(Method::setter(ty));
    }
    match signal.method_name() {
        None => {}
        Some(name @ ("get" | "set")) => return Err(PropertyError::SignalName(name.to_string())),
        Some("chng") => methods.push(Method::change(ty)),
        Some(name) => methods.push(Method::signal(name, ty)?),
    }
    Ok(NamedSet::from_unique(methods))
}

/// Iterator returned by [`Node::descendants`].
pub struct Descendants<'a> {
    stack: Vec<(Option<String>, std::slice::Iter<'a, Node>)>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (String, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (prefix, siblings) = self.stack.last_mut()?;
            let Some(node) = siblings.next() else {
                self.stack.pop();
                continue;
            };
            let path = match prefix {
                Some(prefix) => format!("{prefix}/{}", node.name),
                None => node.name.clone(),
            };
            self.stack.push((Some(path.clone()), node.nodes.values()));
            return Some((path, node));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MethodError;
    use crate::model::RESERVED_METHODS;

    fn method_names(node: &Node) -> Vec<&str> {
        node.methods.names().collect()
    }

    #[test]
    fn test_property_variants() {
        let node = Node::property("x", TypeRef::INT, false, None).unwrap();
        assert_eq!(method_names(&node), ["get", "set", "chng"]);
        assert!(node.is_property(Some(false), Some(true)));

        let node = Node::property("x", TypeRef::INT, true, None).unwrap();
        assert_eq!(method_names(&node), ["get"]);
        assert!(node.is_property(Some(true), Some(false)));

        let node = Node::property("x", TypeRef::INT, true, Some(Signal::Change)).unwrap();
        assert_eq!(method_names(&node), ["get", "chng"]);
        assert!(node.is_property(Some(true), Some(true)));

        let node = Node::property("x", TypeRef::INT, false, Some(Signal::Off)).unwrap();
        assert_eq!(method_names(&node), ["get", "set"]);

        let node =
            Node::property("x", TypeRef::INT, false, Some(Signal::Named("fchng".into()))).unwrap();
        assert_eq!(method_names(&node), ["get", "set", "fchng"]);
        let fchng = node.methods.get("fchng").unwrap();
        assert!(fchng.is_signal());
        assert_eq!(fchng.param, TypeRef::NULL);
        assert_eq!(fchng.result, TypeRef::INT);
        assert!(node.is_property(None, Some(false)));

        let chng = Node::property("x", TypeRef::INT, false, None).unwrap();
        let chng = chng.methods.get("chng").unwrap();
        assert_eq!(chng.param, TypeRef::NULL);
        assert_eq!(chng.result, TypeRef::INT);
    }

    #[test]
    fn test_invalid_signal_names() {
        for name in ["get", "set"] {
            let mut node = Node::new("x");
            assert_eq!(
                node.make_property(TypeRef::INT, false, Some(Signal::Named(name.into()))),
                Err(PropertyError::SignalName(name.to_string()))
            );
            assert!(node.methods.is_empty());
        }
        for name in RESERVED_METHODS {
            let mut node = Node::new("x");
            assert_eq!(
                node.make_property(TypeRef::INT, true, Some(Signal::Named(name.into()))),
                Err(PropertyError::Method(MethodError::ReservedName(name.to_string())))
            );
            assert!(node.methods.is_empty());
        }
        assert!(Node::property("x", TypeRef::INT, true, Some(Signal::Named("ls".into()))).is_err());
    }

    #[test]
    fn test_make_property_twice() {
        let mut node = Node::new("x");
        node.make_property(TypeRef::BOOL, true, None).unwrap();
        assert_eq!(
            node.make_property(TypeRef::BOOL, false, None),
            Err(PropertyError::MethodExists("get".to_string()))
        );
        assert_eq!(method_names(&node), ["get"]);

        let mut node = Node::new("y");
        node.methods.add(Method::new("set").unwrap()).unwrap();
        assert_eq!(
            node.make_property(TypeRef::BOOL, false, None),
            Err(PropertyError::MethodExists("set".to_string()))
        );
        assert_eq!(method_names(&node), ["set"]);
        assert!(!node.is_property(None, None));
    }

    fn sample() -> Node {
        let mut root = Node::new("");
        let mut a = Node::new("a");
        let mut b = Node::new("b");
        b.nodes.add(Node::new("c")).unwrap();
        a.nodes.add(b).unwrap();
        a.nodes.add(Node::new("d")).unwrap();
        root.nodes.add(a).unwrap();
        root.nodes.add(Node::new("e")).unwrap();
        root
    }

    #[test]
    fn test_get_node() {
        let root = sample();
        assert_eq!(root.get_node("").unwrap().name(), "");
        assert_eq!(root.get_node("a/b/c").unwrap().name(), "c");
        assert_eq!(root.get_node("e").unwrap().name(), "e");
        assert!(root.get_node("a/x").is_none());
        assert!(root.get_node("a/b/c/d").is_none());
        assert!(root.get_node("a//b").is_none());
    }

    #[test]
    fn test_descendants_depth_first() {
        let root = sample();
        let paths: Vec<String> = root.descendants().map(|(path, _)| path).collect();
        assert_eq!(paths, ["a", "a/b", "a/b/c", "a/d", "e"]);

        let a = root.get_node("a").unwrap();
        let paths: Vec<String> = a.descendants().map(|(path, _)| path).collect();
        assert_eq!(paths, ["b", "b/c", "d"]);
        assert_eq!(Node::new("leaf").descendants().count(), 0);
    }
}
