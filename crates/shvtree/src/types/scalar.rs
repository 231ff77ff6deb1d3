//! Scalar type constraints: integers, doubles, decimals, strings and blobs.

use regex::Regex;

use crate::error::TypeError;
use crate::limits::MAX_INT_PAYLOAD_BYTES;
use crate::model::{Decimal, Value};

/// Bit length of an unsigned magnitude, zero for zero.
pub(crate) fn bit_length(n: u128) -> u32 {
    128 - n.leading_zeros()
}

// =============================================================================
// INT
// =============================================================================

/// Integer constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntType {
    minimum: Option<i128>,
    maximum: Option<i128>,
    multiple_of: Option<i128>,
    unsigned: bool,
}

impl IntType {
    /// Creates integer constraints.
    ///
    /// `unsigned` defaults to whether `minimum` is known and non-negative.
    pub fn new(
        minimum: Option<i128>,
        maximum: Option<i128>,
        multiple_of: Option<i128>,
        unsigned: Option<bool>,
    ) -> Result<Self, TypeError> {
        let unsigned = unsigned.unwrap_or(minimum.is_some_and(|m| m >= 0));
        if unsigned {
            if minimum.is_some_and(|m| m < 0) {
                return Err(TypeError::NegativeUnsignedBound { bound: "minimum" });
            }
            if maximum.is_some_and(|m| m < 0) {
                return Err(TypeError::NegativeUnsignedBound { bound: "maximum" });
            }
        }
        if multiple_of == Some(0) {
            return Err(TypeError::ZeroMultipleOf);
        }
        if let (Some(min), Some(max)) = (minimum, maximum) {
            if min > max {
                return Err(TypeError::InvertedRange);
            }
        }
        Ok(Self {
            minimum,
            maximum,
            multiple_of,
            unsigned,
        })
    }

    /// Inclusive range, unsigned when `minimum` is non-negative.
    pub fn range(minimum: i128, maximum: i128) -> Result<Self, TypeError> {
        Self::new(Some(minimum), Some(maximum), None, None)
    }

    pub(crate) const fn unchecked(minimum: Option<i128>, maximum: Option<i128>, unsigned: bool) -> Self {
        Self {
            minimum,
            maximum,
            multiple_of: None,
            unsigned,
        }
    }

    pub fn minimum(&self) -> Option<i128> {
        self.minimum
    }

    pub fn maximum(&self) -> Option<i128> {
        self.maximum
    }

    pub fn multiple_of(&self) -> Option<i128> {
        self.multiple_of
    }

    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }

    /// Name of the builtin with exactly these constraints.
    pub(crate) fn builtin_equivalent(&self) -> Option<&'static str> {
        if self.maximum.is_some() || self.multiple_of.is_some() {
            return None;
        }
        match self.minimum {
            None if !self.unsigned => Some("Int"),
            Some(0) if self.unsigned => Some("UInt"),
            _ => None,
        }
    }

    pub fn accepts(&self, n: i128) -> bool {
        !(self.unsigned && n < 0)
            && self.minimum.is_none_or(|min| min <= n)
            && self.maximum.is_none_or(|max| n <= max)
            && self.multiple_of.is_none_or(|m| n % m == 0)
    }

    pub fn validate(&self, value: &Value) -> bool {
        value.as_integer().is_some_and(|n| self.accepts(n))
    }

    /// Maximum chainpack size of values of this type.
    pub fn encoded_size(&self) -> Option<usize> {
        let (min, max) = (self.minimum?, self.maximum?);
        if min >= 0 && max < 64 {
            return Some(1);
        }
        let magnitude = min.unsigned_abs().max(max.unsigned_abs());
        let mut bits = bit_length(magnitude).saturating_sub(1);
        if !self.unsigned {
            bits += 1;
        }
        match bits {
            0..=7 => Some(2),
            8..=14 => Some(3),
            15..=21 => Some(4),
            22..=28 => Some(5),
            _ => {
                let bytes = (bits / 8 + 1) as usize;
                (bytes <= MAX_INT_PAYLOAD_BYTES).then_some(2 + bytes)
            }
        }
    }

    /// Number of bits this type occupies in a bitfield.
    pub fn bit_span(&self) -> Option<u32> {
        if !self.unsigned {
            return None;
        }
        let max = u128::try_from(self.maximum?).ok()?;
        Some(bit_length(max).max(1))
    }
}

// =============================================================================
// DOUBLE
// =============================================================================

/// Floating point constraints.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DoubleType {
    minimum: Option<f64>,
    maximum: Option<f64>,
    exclusive_minimum: Option<f64>,
    exclusive_maximum: Option<f64>,
    multiple_of: Option<f64>,
}

impl DoubleType {
    pub fn new(
        minimum: Option<f64>,
        maximum: Option<f64>,
        exclusive_minimum: Option<f64>,
        exclusive_maximum: Option<f64>,
        multiple_of: Option<f64>,
    ) -> Result<Self, TypeError> {
        for (what, bound) in [
            ("minimum", minimum),
            ("maximum", maximum),
            ("exclusiveMinimum", exclusive_minimum),
            ("exclusiveMaximum", exclusive_maximum),
            ("multipleOf", multiple_of),
        ] {
            if bound.is_some_and(f64::is_nan) {
                return Err(TypeError::NotANumber { what });
            }
        }
        if multiple_of == Some(0.0) {
            return Err(TypeError::ZeroMultipleOf);
        }
        if let (Some(min), Some(max)) = (minimum, maximum) {
            if min > max {
                return Err(TypeError::InvertedRange);
            }
        }
        Ok(Self {
            minimum,
            maximum,
            exclusive_minimum,
            exclusive_maximum,
            multiple_of,
        })
    }

    pub fn minimum(&self) -> Option<f64> {
        self.minimum
    }

    pub fn maximum(&self) -> Option<f64> {
        self.maximum
    }

    pub fn exclusive_minimum(&self) -> Option<f64> {
        self.exclusive_minimum
    }

    pub fn exclusive_maximum(&self) -> Option<f64> {
        self.exclusive_maximum
    }

    pub fn multiple_of(&self) -> Option<f64> {
        self.multiple_of
    }

    pub(crate) fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self, value: &Value) -> bool {
        let Value::Double(v) = *value else {
            return false;
        };
        self.minimum.is_none_or(|min| min <= v)
            && self.maximum.is_none_or(|max| v <= max)
            && self.exclusive_minimum.is_none_or(|min| min < v)
            && self.exclusive_maximum.is_none_or(|max| v < max)
            && self.multiple_of.is_none_or(|m| v % m == 0.0)
    }
}

// =============================================================================
// DECIMAL
// =============================================================================

/// Decimal number constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecimalType {
    minimum: Option<Decimal>,
    maximum: Option<Decimal>,
}

impl DecimalType {
    pub fn new(minimum: Option<Decimal>, maximum: Option<Decimal>) -> Result<Self, TypeError> {
        if let (Some(min), Some(max)) = (minimum, maximum) {
            if min > max {
                return Err(TypeError::InvertedRange);
            }
        }
        Ok(Self { minimum, maximum })
    }

    pub fn minimum(&self) -> Option<Decimal> {
        self.minimum
    }

    pub fn maximum(&self) -> Option<Decimal> {
        self.maximum
    }

    pub(crate) fn is_unconstrained(&self) -> bool {
        self.minimum.is_none() && self.maximum.is_none()
    }

    pub fn validate(&self, value: &Value) -> bool {
        let Value::Decimal(v) = value else {
            return false;
        };
        self.minimum.is_none_or(|min| min <= *v) && self.maximum.is_none_or(|max| *v <= max)
    }

    /// Ranges of mantissa and exponent covering both bounds.
    ///
    /// Both bounds are brought to the smaller of their exponents; values in
    /// between are representable with a mantissa in the scaled range. `None`
    /// when the scaled mantissa doesn't fit an Int.
    fn decomposition(&self) -> Option<(IntType, IntType)> {
        let min = self.minimum?.normalized();
        let max = self.maximum?.normalized();
        let exp_lo = min.exponent().min(max.exponent());
        let exp_hi = min.exponent().max(max.exponent());
        let scale = |d: Decimal| -> Option<i128> {
            let shift = u32::try_from(i64::from(d.exponent()) - i64::from(exp_lo)).ok()?;
            i128::from(d.mantissa()).checked_mul(10i128.checked_pow(shift)?)
        };
        let (m_lo, m_hi) = (scale(min)?, scale(max)?);
        let mantissa = IntType::range(m_lo.min(m_hi), m_lo.max(m_hi)).ok()?;
        let exponent = IntType::range(i128::from(exp_lo), i128::from(exp_hi)).ok()?;
        Some((mantissa, exponent))
    }

    pub fn encoded_size(&self) -> Option<usize> {
        let (mantissa, exponent) = self.decomposition()?;
        Some(1 + mantissa.encoded_size()? + exponent.encoded_size()?)
    }
}

// =============================================================================
// STRING AND BLOB
// =============================================================================

/// Regular expression matched at the start of a string.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, TypeError> {
        let regex = Regex::new(&format!("^(?:{source})")).map_err(|e| TypeError::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Length bounds shared by String and Blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LengthRange {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl LengthRange {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Result<Self, TypeError> {
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(TypeError::InvertedRange);
            }
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, len: usize) -> bool {
        self.min.is_none_or(|min| min <= len) && self.max.is_none_or(|max| len <= max)
    }

    /// Tag, length and the longest body. An unset minimum counts as zero.
    fn encoded_size(&self) -> Option<usize> {
        let max = self.max?;
        let length = IntType::range(self.min.unwrap_or(0) as i128, max as i128).ok()?;
        Some(1 + length.encoded_size()? + max)
    }
}

/// String constraints. Length is counted in characters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringType {
    length: LengthRange,
    pattern: Option<Pattern>,
}

impl StringType {
    pub fn new(
        min_length: Option<usize>,
        max_length: Option<usize>,
        pattern: Option<&str>,
    ) -> Result<Self, TypeError> {
        Ok(Self {
            length: LengthRange::new(min_length, max_length)?,
            pattern: pattern.map(Pattern::new).transpose()?,
        })
    }

    pub fn min_length(&self) -> Option<usize> {
        self.length.min
    }

    pub fn max_length(&self) -> Option<usize> {
        self.length.max
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    pub(crate) fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self, value: &Value) -> bool {
        let Value::String(s) = value else {
            return false;
        };
        self.length.contains(s.chars().count())
            && self.pattern.as_ref().is_none_or(|p| p.is_match(s))
    }

    /// Size ignores the pattern; only the maximum length bounds it.
    pub fn encoded_size(&self) -> Option<usize> {
        self.length.encoded_size()
    }
}

/// Blob constraints. Length is counted in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlobType {
    length: LengthRange,
}

impl BlobType {
    pub fn new(min_length: Option<usize>, max_length: Option<usize>) -> Result<Self, TypeError> {
        Ok(Self {
            length: LengthRange::new(min_length, max_length)?,
        })
    }

    pub fn min_length(&self) -> Option<usize> {
        self.length.min
    }

    pub fn max_length(&self) -> Option<usize> {
        self.length.max
    }

    pub(crate) fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self, value: &Value) -> bool {
        matches!(value, Value::Blob(b) if self.length.contains(b.len()))
    }

    pub fn encoded_size(&self) -> Option<usize> {
        self.length.encoded_size()
    }
}
