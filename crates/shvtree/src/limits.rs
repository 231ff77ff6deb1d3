//! Limits applied while building types and checking values.

/// Maximum number of bits in a bitfield (the value is transmitted as UInt).
pub const MAX_BITFIELD_BITS: u32 = 64;

/// Maximum payload bytes of an Int for which a size is reported.
pub const MAX_INT_PAYLOAD_BYTES: usize = 17;

/// Maximum nesting of types followed while validating a single value.
///
/// Recursive types (a List of itself for example) are legal; this bounds
/// the work spent on adversarially deep values.
pub const MAX_TYPE_DEPTH: usize = 256;

/// Byte length of the chainpack encoding of a Double (tag and IEEE 754 body).
pub const DOUBLE_PACKED_LEN: usize = 9;

/// Size reported for a Double type: its width in bits plus the tag byte.
pub const DOUBLE_SIZE: usize = 65;

/// Size reported for a DateTime type.
pub const DATETIME_SIZE: usize = 9;
