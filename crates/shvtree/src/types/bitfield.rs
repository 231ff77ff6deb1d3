//! Bitfield: several small values packed into one unsigned integer.
//!
//! Components occupy contiguous bit spans. Bits not covered by any
//! component are holes (Null). The layout is kept as a sparse list of
//! `(offset, span, type)` entries ordered by offset.

use crate::error::TypeError;
use crate::limits::MAX_BITFIELD_BITS;
use crate::model::Value;
use crate::types::{EnumType, IntType, TypeKind, TypeRef, Types};

/// One component of a bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub offset: u32,
    pub span: u32,
    pub ty: TypeRef,
}

impl BitField {
    fn end(&self) -> u32 {
        self.offset + self.span
    }

    fn mask(&self) -> u64 {
        if self.span >= 64 {
            u64::MAX
        } else {
            (1u64 << self.span) - 1
        }
    }
}

/// Position of a component: a bit number or an alias from the bitfield enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitKey<'a> {
    Bit(u32),
    Alias(&'a str),
}

impl From<u32> for BitKey<'_> {
    fn from(bit: u32) -> Self {
        BitKey::Bit(bit)
    }
}

impl<'a> From<&'a str> for BitKey<'a> {
    fn from(alias: &'a str) -> Self {
        BitKey::Alias(alias)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitfieldType {
    fields: Vec<BitField>,
    bits: u32,
    /// Enum assigning names to bit positions.
    pub enum_type: Option<TypeRef>,
    /// Reject values with bits outside of all components.
    pub strict: bool,
}

impl Default for BitfieldType {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            bits: 0,
            enum_type: None,
            strict: true,
        }
    }
}

impl BitfieldType {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places components one after another starting at bit zero.
    pub fn from_types(
        components: impl IntoIterator<Item = TypeRef>,
        types: &Types,
    ) -> Result<Self, TypeError> {
        let mut res = Self::new();
        for ty in components {
            res.push(ty, types)?;
        }
        Ok(res)
    }

    /// Bool component at every distinct value of the enum.
    pub fn from_enum(enum_ref: TypeRef, enum_type: &EnumType) -> Result<Self, TypeError> {
        let mut res = Self::new();
        let mut values: Vec<u64> = enum_type.iter().map(|(_, v)| v).collect();
        values.sort_unstable();
        values.dedup();
        for value in values {
            let offset = u32::try_from(value)
                .ok()
                .filter(|&o| o < MAX_BITFIELD_BITS)
                .ok_or(TypeError::BitfieldTooWide {
                    bits: u32::try_from(value.saturating_add(1)).unwrap_or(u32::MAX),
                    max: MAX_BITFIELD_BITS,
                })?;
            res.place(offset, 1, TypeRef::BOOL)?;
        }
        res.enum_type = Some(enum_ref);
        Ok(res)
    }

    /// Total number of bits including holes.
    pub fn bitsize(&self) -> u32 {
        self.bits
    }

    /// Non-hole components ordered by offset.
    pub fn fields(&self) -> &[BitField] {
        &self.fields
    }

    fn place(&mut self, offset: u32, span: u32, ty: TypeRef) -> Result<(), TypeError> {
        let end = offset + span;
        if end > MAX_BITFIELD_BITS {
            return Err(TypeError::BitfieldTooWide {
                bits: end,
                max: MAX_BITFIELD_BITS,
            });
        }
        if ty != TypeRef::NULL {
            if self
                .fields
                .iter()
                .any(|f| f.offset < end && offset < f.end())
            {
                return Err(TypeError::BitfieldOverlap { offset, end });
            }
            let pos = self.fields.partition_point(|f| f.offset < offset);
            self.fields.insert(pos, BitField { offset, span, ty });
        }
        self.bits = self.bits.max(end);
        Ok(())
    }

    /// Places a component at an explicit bit.
    ///
    /// Bits skipped before `offset` become holes. Null only extends the
    /// bitfield by a single hole bit.
    pub fn set(&mut self, offset: u32, ty: TypeRef, types: &Types) -> Result<(), TypeError> {
        let span = types.bit_span(ty).ok_or_else(|| TypeError::UnsupportedBitfieldType {
            name: types.name_of(ty).unwrap_or("?").to_string(),
        })?;
        let ty = if types.is_null(ty) { TypeRef::NULL } else { ty };
        self.place(offset, span, ty)
    }

    /// Appends a component after the last used bit.
    pub fn push(&mut self, ty: TypeRef, types: &Types) -> Result<(), TypeError> {
        self.set(self.bits, ty, types)
    }

    /// Type at the given bit. Holes are Null.
    pub fn get(&self, bit: u32) -> Result<TypeRef, TypeError> {
        if bit >= self.bits {
            return Err(TypeError::UnassignedBit { bit });
        }
        match self.fields.iter().find(|f| f.offset <= bit && bit < f.end()) {
            Some(f) if f.offset == bit => Ok(f.ty),
            Some(f) => Err(TypeError::InsideBitfieldSpan {
                bit,
                start: f.offset,
            }),
            None => Ok(TypeRef::NULL),
        }
    }

    /// Bit number for the key, resolving aliases through the bitfield enum.
    pub fn bit_of(&self, key: BitKey<'_>, types: &Types) -> Result<u32, TypeError> {
        match key {
            BitKey::Bit(bit) => Ok(bit),
            BitKey::Alias(alias) => {
                let unknown = || TypeError::UnknownBitAlias {
                    alias: alias.to_string(),
                };
                let enum_type = self.enum_type.ok_or_else(unknown)?;
                let Some(TypeKind::Enum(e)) = types.resolve(enum_type).map(|t| t.kind()) else {
                    return Err(unknown());
                };
                let value = e.get(alias).ok_or_else(unknown)?;
                u32::try_from(value).map_err(|_| unknown())
            }
        }
    }

    /// Type at the bit identified by number or alias.
    pub fn get_key(&self, key: BitKey<'_>, types: &Types) -> Result<TypeRef, TypeError> {
        self.get(self.bit_of(key, types)?)
    }

    /// Unsigned integer covering every bit.
    pub fn integer(&self) -> IntType {
        let max = if self.bits >= 64 {
            u64::MAX
        } else {
            (1u64 << self.bits) - 1
        };
        IntType::unchecked(Some(0), Some(i128::from(max)), true)
    }

    pub fn encoded_size(&self) -> Option<usize> {
        self.integer().encoded_size()
    }

    /// Splits `value` into component values in bit order.
    ///
    /// Returns `None` when a component value is invalid for its type or, in
    /// strict mode, when bits outside of all components are set.
    pub fn interpret(&self, value: u64, types: &Types) -> Option<Vec<Value>> {
        let mut rest = value;
        let mut res = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let raw = (value >> field.offset) & field.mask();
            rest &= !(field.mask() << field.offset);
            let sub = if types.is_bool(field.ty) {
                Value::Bool(raw != 0)
            } else {
                Value::UInt(raw)
            };
            if !types.validate(field.ty, &sub) {
                return None;
            }
            res.push(sub);
        }
        if self.strict && rest != 0 {
            return None;
        }
        Some(res)
    }

    /// Inverse of [`interpret`](Self::interpret).
    ///
    /// Enum components also accept the value name.
    pub fn pack(&self, values: &[Value], types: &Types) -> Option<u64> {
        if values.len() != self.fields.len() {
            return None;
        }
        let mut res = 0u64;
        for (field, value) in self.fields.iter().zip(values) {
            let raw = match value {
                Value::Bool(b) => u64::from(*b),
                Value::String(name) => match types.resolve(field.ty).map(|t| t.kind()) {
                    Some(TypeKind::Enum(e)) => e.get(name)?,
                    _ => return None,
                },
                other => other.as_unsigned()?,
            };
            if raw & !field.mask() != 0 || !types.validate(field.ty, value) {
                return None;
            }
            res |= raw << field.offset;
        }
        Some(res)
    }

    pub fn validate(&self, value: &Value, types: &Types) -> bool {
        value
            .as_unsigned()
            .is_some_and(|v| self.interpret(v, types).is_some())
    }
}
