//! Error types for tree loading and type construction.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Structural error in a tree document.
///
/// Carries the location in the document (sequence of keys from the root)
/// where the problem was detected. Loading is aborted on the first error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub location: Vec<String>,
    pub message: String,
}

impl LoadError {
    /// Creates an error at the given location.
    pub fn new<L, S>(location: L, message: impl Into<String>) -> Self
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            location: location.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    /// Creates an error for the document root.
    pub fn at_root(message: impl Into<String>) -> Self {
        Self {
            location: Vec::new(),
            message: message.into(),
        }
    }

    /// Dotted location path, empty for the document root.
    pub fn path(&self) -> String {
        self.location.join(".")
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path(), self.message)
        }
    }
}

impl std::error::Error for LoadError {}

/// Lookup and insertion errors of [`NamedSet`](crate::model::NamedSet).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("Item with name '{0}' already exists")]
    Duplicate(String),

    #[error("No item with name '{0}'")]
    NotFound(String),
}

/// Contract violation while constructing a type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("Redefining builtin types is not allowed: {name}")]
    RedefinesBuiltin { name: String },

    #[error("Please use the builtin {builtin} instead")]
    UseBuiltin { builtin: &'static str },

    #[error("Unsigned type can't have negative {bound}")]
    NegativeUnsignedBound { bound: &'static str },

    #[error("multipleOf can't be zero")]
    ZeroMultipleOf,

    #[error("minimum is greater than maximum")]
    InvertedRange,

    #[error("{what} can't be NaN")]
    NotANumber { what: &'static str },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("OneOf must list at least one type")]
    EmptyOneOf,

    #[error("Type {name} can't be included in bitfield")]
    UnsupportedBitfieldType { name: String },

    #[error("Bits {offset}..{end} overlap with already assigned bits")]
    BitfieldOverlap { offset: u32, end: u32 },

    #[error("Bitfield can have at most {max} bits, {bits} requested")]
    BitfieldTooWide { bits: u32, max: u32 },

    #[error("Bit {bit} is not assigned to any type")]
    UnassignedBit { bit: u32 },

    #[error("Bit {bit} is inside of field starting at bit {start}")]
    InsideBitfieldSpan { bit: u32, start: u32 },

    #[error("Bitfield has no bit alias '{alias}'")]
    UnknownBitAlias { alias: String },

    #[error("Type {name} is not an Enum")]
    NotEnum { name: String },

    #[error("Type reference is not part of this collection")]
    DanglingReference,

    #[error(transparent)]
    Name(#[from] NameError),
}

/// Invalid method declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MethodError {
    #[error("Method name '{0}' is reserved")]
    ReservedName(String),
}

/// Property methods can't be generated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("Node already has the following method: {0}")]
    MethodExists(String),

    #[error("Signal can't be named '{0}'")]
    SignalName(String),

    #[error(transparent)]
    Method(#[from] MethodError),
}

/// Error reading a tree from a file or string.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read tree: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported tree file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Load(#[from] LoadError),
}
