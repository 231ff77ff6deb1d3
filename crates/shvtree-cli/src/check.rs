//! Style checks of loaded trees.
//!
//! These look for constructs that load fine but are better expressed
//! differently.

use clap::ValueEnum;
use shvtree::{Tree, TypeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Check {
    /// OneOf with a single member should be an Alias
    AliasInsteadOneof,
    /// Structurally equal types should be aliases of one of them
    DuplicateType,
}

impl Check {
    pub const ALL: [Check; 2] = [Check::AliasInsteadOneof, Check::DuplicateType];

    pub fn name(&self) -> &'static str {
        match self {
            Check::AliasInsteadOneof => "alias-instead-oneof",
            Check::DuplicateType => "duplicate-type",
        }
    }
}

/// Runs the enabled checks and returns a message for every finding.
pub fn check(tree: &Tree, enabled: &[Check]) -> Vec<String> {
    let mut issues = Vec::new();
    if enabled.contains(&Check::AliasInsteadOneof) {
        for ty in tree.types.iter() {
            if let TypeKind::OneOf(members) = ty.kind() {
                if members.len() == 1 {
                    issues.push(format!(
                        "SHV type OneOf '{}' has only one field. Use SHV type Alias instead.",
                        ty.name()
                    ));
                }
            }
        }
    }
    if enabled.contains(&Check::DuplicateType) {
        let candidates: Vec<_> = tree
            .types
            .iter()
            .filter(|ty| !matches!(ty.kind(), TypeKind::Alias(_)))
            .collect();
        for (i, first) in candidates.iter().enumerate() {
            for second in &candidates[i + 1..] {
                if first == second {
                    issues.push(format!(
                        "Type '{}' is same as '{}'. It is highly suggested to use Alias type instead.",
                        first.name(),
                        second.name()
                    ));
                }
            }
        }
    }
    tracing::debug!(issues = issues.len(), "checked tree");
    issues
}
