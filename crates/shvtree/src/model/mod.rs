//! Data model of SHV trees.
//!
//! - Named collections ([`NamedSet`])
//! - Runtime values ([`Value`])
//! - Nodes and their methods ([`Node`], [`Method`])
//! - The tree root ([`Tree`]) and its shared snapshot ([`SharedTree`])

pub mod method;
pub mod named;
pub mod node;
pub mod tree;
pub mod value;

pub use method::{Access, Method, MethodFlags, RESERVED_METHODS};
pub use named::{Named, NamedSet};
pub use node::{Descendants, Node, Signal};
pub use tree::{SharedTree, Tree};
pub use value::{DateTime, Decimal, DecimalParseError, Value};
