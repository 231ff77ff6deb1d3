//! Size report of custom types.

use serde_json::{Map, Value as Json};
use shvtree::Tree;

/// Maximal chainpack size of every custom type, `None` when unbounded.
pub fn sizes(tree: &Tree) -> Vec<(String, Option<usize>)> {
    tree.types
        .iter()
        .map(|ty| (ty.name().to_string(), ty.encoded_size()))
        .collect()
}

/// One line per type with names aligned to the right.
pub fn to_lines(sizes: &[(String, Option<usize>)]) -> Vec<String> {
    let width = sizes.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    sizes
        .iter()
        .map(|(name, size)| match size {
            Some(size) => format!("{name:>width$}: {size}"),
            None => format!("{name:>width$}: Unterminated"),
        })
        .collect()
}

pub fn to_json(sizes: &[(String, Option<usize>)]) -> Json {
    let map: Map<String, Json> = sizes
        .iter()
        .map(|(name, size)| (name.clone(), size.map_or(Json::Null, Json::from)))
        .collect();
    Json::Object(map)
}
