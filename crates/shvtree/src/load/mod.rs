//! Loading of trees from documents.
//!
//! A tree document is a mapping with optional `types` and `nodes` keys.
//! The loader works on generic document data ([`serde_json::Value`]); the
//! JSON and YAML front-ends only parse text into it.
//!
//! Types are loaded in passes so that declarations can refer to each other
//! regardless of their order:
//!
//! 1. Every declared name gets a slot. Scalar types are built right away.
//! 2. Every other declaration is built, resolving references by name.
//! 3. Bitfields are laid out once the spans of their components are known.
//!
//! Any problem aborts the load with a [`LoadError`] pointing to the
//! offending place of the document.

mod nodes;
mod types;

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::error::{LoadError, ReadError};
use crate::model::Tree;

pub use nodes::load_nodes;
pub use types::load_types;

/// Builds a tree from generic document data.
pub fn load_raw(data: &Json) -> Result<Tree, LoadError> {
    let root = Location::root();
    let mut attrs = Attrs::new(&root, data)?;
    let types = match attrs.take("types") {
        Some(types) => load_types(types)?,
        None => Default::default(),
    };
    let nodes = match attrs.take("nodes") {
        Some(nodes) => load_nodes(nodes, &types)?,
        None => Default::default(),
    };
    attrs.finish("Unsupported keys")?;

    let mut tree = Tree::new(types);
    tree.root.nodes = nodes;
    tracing::debug!(
        types = tree.types.len(),
        nodes = tree.iter().count(),
        "loaded tree"
    );
    Ok(tree)
}

/// Builds a tree from a JSON document.
pub fn load_json(text: &str) -> Result<Tree, ReadError> {
    let data: Json = serde_json::from_str(text)?;
    Ok(load_raw(&data)?)
}

/// Builds a tree from a YAML document.
pub fn load_yaml(text: &str) -> Result<Tree, ReadError> {
    let data: Json = serde_yaml::from_str(text)?;
    Ok(load_raw(&data)?)
}

/// Reads a tree from a `.json`, `.yaml` or `.yml` file.
pub fn load(path: impl AsRef<Path>) -> Result<Tree, ReadError> {
    let path = path.as_ref();
    let suffix = path.extension().and_then(|s| s.to_str());
    let parse: fn(&str) -> Result<Tree, ReadError> = match suffix {
        Some("json") => load_json,
        Some("yaml" | "yml") => load_yaml,
        _ => return Err(ReadError::UnsupportedFormat(path.to_path_buf())),
    };
    tracing::debug!(path = %path.display(), "reading tree");
    parse(&fs::read_to_string(path)?)
}

// =============================================================================
// DOCUMENT HELPERS
// =============================================================================

/// Place in the document as a sequence of keys.
#[derive(Debug, Clone, Default)]
pub(crate) struct Location(Vec<String>);

impl Location {
    pub(crate) fn root() -> Self {
        Self::default()
    }

    pub(crate) fn join(&self, key: impl Into<String>) -> Self {
        let mut keys = self.0.clone();
        keys.push(key.into());
        Self(keys)
    }

    /// Keys joined with dots.
    pub(crate) fn path(&self) -> String {
        self.0.join(".")
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> LoadError {
        LoadError::new(self.0.iter().cloned(), message)
    }
}

/// Keys of a document mapping that are consumed one by one. Whatever is
/// left at the end is reported.
pub(crate) struct Attrs<'d> {
    location: Location,
    entries: IndexMap<&'d str, &'d Json>,
}

impl<'d> Attrs<'d> {
    /// Fails with "Invalid format" unless `data` is a mapping.
    pub(crate) fn new(location: &Location, data: &'d Json) -> Result<Self, LoadError> {
        let map = data
            .as_object()
            .ok_or_else(|| location.error("Invalid format"))?;
        Ok(Self::from_map(location, map))
    }

    pub(crate) fn from_map(location: &Location, map: &'d serde_json::Map<String, Json>) -> Self {
        Self {
            location: location.clone(),
            entries: map.iter().map(|(k, v)| (k.as_str(), v)).collect(),
        }
    }

    /// Removes the key. A `null` value counts as a missing key.
    pub(crate) fn take(&mut self, key: &str) -> Option<&'d Json> {
        self.entries.shift_remove(key).filter(|v| !v.is_null())
    }

    pub(crate) fn take_u64(&mut self, key: &str) -> Result<Option<u64>, LoadError> {
        self.take(key)
            .map(|v| {
                v.as_u64()
                    .ok_or_else(|| self.location.join(key).error("Expected integer"))
            })
            .transpose()
    }

    pub(crate) fn take_usize(&mut self, key: &str) -> Result<Option<usize>, LoadError> {
        self.take_u64(key)?
            .map(|v| {
                usize::try_from(v).map_err(|_| self.location.join(key).error("Expected integer"))
            })
            .transpose()
    }

    pub(crate) fn take_i128(&mut self, key: &str) -> Result<Option<i128>, LoadError> {
        self.take(key)
            .map(|v| match v {
                Json::Number(n) if n.is_i64() || n.is_u64() => n
                    .as_i64()
                    .map(i128::from)
                    .or_else(|| n.as_u64().map(i128::from))
                    .ok_or_else(|| self.location.join(key).error("Expected integer")),
                _ => Err(self.location.join(key).error("Expected integer")),
            })
            .transpose()
    }

    pub(crate) fn take_f64(&mut self, key: &str) -> Result<Option<f64>, LoadError> {
        self.take(key)
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| self.location.join(key).error("Expected number"))
            })
            .transpose()
    }

    pub(crate) fn take_bool(&mut self, key: &str) -> Result<Option<bool>, LoadError> {
        self.take(key)
            .map(|v| {
                v.as_bool()
                    .ok_or_else(|| self.location.join(key).error("Expected bool"))
            })
            .transpose()
    }

    pub(crate) fn take_str(&mut self, key: &str) -> Result<Option<&'d str>, LoadError> {
        self.take(key)
            .map(|v| {
                v.as_str()
                    .ok_or_else(|| self.location.join(key).error("Expected string"))
            })
            .transpose()
    }

    /// Fails with `message` listing the keys nobody consumed.
    pub(crate) fn finish(self, message: &str) -> Result<(), LoadError> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let keys: Vec<&str> = self.entries.keys().copied().collect();
        Err(self
            .location
            .error(format!("{message}: {}", keys.join(", "))))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::{TypeKind, TypeRef};

    fn load_err(data: Json) -> String {
        load_raw(&data).unwrap_err().to_string()
    }

    #[test]
    fn test_empty_documents() {
        assert_eq!(load_raw(&json!({})).unwrap(), Tree::default());
        assert_eq!(
            load_raw(&json!({"types": null, "nodes": null})).unwrap(),
            Tree::default()
        );
    }

    #[test]
    fn test_single_node() {
        let tree = load_json(r#"{"nodes": {"one":{}}}"#).unwrap();
        let paths: Vec<String> = tree.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, ["one"]);
        assert!(tree.get_node("one").unwrap().methods.is_empty());
        assert!(tree.types.is_empty());
    }

    #[test]
    fn test_flag_property() {
        let tree = load_raw(&json!({
            "types": {"Flag": ["Null", "Bool"]},
            "nodes": {"x": {"property": "Flag"}},
        }))
        .unwrap();
        let flag = tree.types.lookup("Flag").unwrap();
        assert_eq!(
            tree.types.get(flag).unwrap().kind(),
            &TypeKind::OneOf(vec![TypeRef::NULL, TypeRef::BOOL])
        );
        let node = tree.get_node("x").unwrap();
        assert_eq!(node.methods.names().collect::<Vec<_>>(), ["get", "set", "chng"]);
        for method in &node.methods {
            assert!(method.param == flag || method.result == flag);
        }
    }

    #[test]
    fn test_top_level_errors() {
        assert_eq!(load_err(json!([])), "Invalid format");
        assert_eq!(load_err(json!({"types": true})), "types: Invalid format");
        assert_eq!(load_err(json!({"nodes": false})), "nodes: Invalid format");
        assert_eq!(load_err(json!({"invalid": null})), "Unsupported keys: invalid");
    }

    #[test]
    fn test_yaml_front_end() {
        let tree = load_yaml(
            "types:\n  Flag: [Null, Bool]\nnodes:\n  x:\n    property: Flag\n    readonly: true\n",
        )
        .unwrap();
        let node = tree.get_node("x").unwrap();
        assert!(node.is_property(Some(true), Some(false)));
        assert!(matches!(load_yaml("types: [1"), Err(ReadError::Yaml(_))));
        assert!(matches!(load_json("{"), Err(ReadError::Json(_))));
        assert!(matches!(
            load_json(r#"{"nodes": 1}"#),
            Err(ReadError::Load(_))
        ));
    }

    #[test]
    fn test_unsupported_suffix() {
        assert!(matches!(
            load("foo.txt"),
            Err(ReadError::UnsupportedFormat(path)) if path == Path::new("foo.txt")
        ));
        assert!(matches!(load("missing.yaml"), Err(ReadError::Io(_))));
    }

    #[test]
    fn test_idempotent() {
        let doc = json!({
            "types": {
                "a": "b",
                "b": {"type": "Int", "minimum": 0, "maximum": 10},
                "lst": {"type": "List", "allowed": ["a", "String"]},
            },
            "nodes": {"dev": {"nodes": {"val": {"property": "lst"}}}},
        });
        assert_eq!(load_raw(&doc).unwrap(), load_raw(&doc).unwrap());
    }
}
