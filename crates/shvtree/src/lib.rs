//! SHV tree: typed description of Silicon Heaven RPC trees.
//!
//! This crate loads tree descriptions (nodes exposing methods, plus the
//! custom types their parameters and results use), validates values
//! against those types and estimates the maximum size of a value in the
//! chainpack wire format.
//!
//! # Overview
//!
//! A tree description is a document with two sections:
//! - **types**: named custom types built from a closed set of kinds (Int,
//!   Enum, Bitfield, List, Map, OneOf, ...) layered over builtin types
//! - **nodes**: a hierarchy of nodes, each with methods and optionally a
//!   property (generated `get`, `set` and `chng` methods)
//!
//! Types can refer to each other regardless of declaration order, including
//! mutual and recursive references through containers.
//!
//! # Quick Start
//!
//! ```rust
//! use shvtree::{load_yaml, Value};
//!
//! let tree = load_yaml(
//!     r#"
//! types:
//!   Mode: {type: Enum, values: [off, on]}
//! nodes:
//!   dev:
//!     nodes:
//!       mode: {property: Mode}
//! "#,
//! )
//! .unwrap();
//!
//! let mode = tree.get_type("Mode").unwrap();
//! assert!(mode.validate(&Value::String("on".to_string())));
//! assert!(!mode.validate(&Value::Int(2)));
//! assert_eq!(mode.encoded_size(), Some(1));
//!
//! let node = tree.get_node("dev/mode").unwrap();
//! assert!(node.is_property(Some(false), Some(true)));
//! ```
//!
//! # Modules
//!
//! - [`types`]: Type algebra, validation and size estimation
//! - [`model`]: Values, nodes, methods and the tree root
//! - [`load`]: Loader of JSON and YAML documents
//! - [`codec`]: Chainpack writer used for exact literal sizes
//! - [`error`]: Error types
//! - [`limits`]: Bitfield width and recursion limits
//!
//! # Errors
//!
//! Loading fails on the first structural problem with a [`LoadError`] that
//! points to the offending place in the document. Checking a value against
//! a type is not an error condition and returns `bool`.

pub mod codec;
pub mod error;
pub mod limits;
pub mod load;
pub mod model;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{LoadError, MethodError, NameError, PropertyError, ReadError, TypeError};
pub use load::{load, load_json, load_raw, load_yaml};
pub use model::{Access, Method, MethodFlags, Node, SharedTree, Signal, Tree, Value};
pub use types::{ShvType, TypeKind, TypeRef, TypeView, Types};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
