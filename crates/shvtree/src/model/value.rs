//! Runtime values checked against tree types.
//!
//! The value model mirrors what chainpack can carry: scalars, decimals,
//! date-times and the three container kinds.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A value transported over SHV RPC.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    Decimal(Decimal),
    String(String),
    Blob(Vec<u8>),
    DateTime(DateTime),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    IMap(BTreeMap<i64, Value>),
}

impl Value {
    /// Integer content of Int and UInt values.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Int(v) => Some(i128::from(*v)),
            Value::UInt(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    /// Non-negative integer content, as used for bitfields.
    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            Value::Int(v) => u64::try_from(*v).ok(),
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the value kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::UInt(_) => "UInt",
            Value::Double(_) => "Double",
            Value::Decimal(_) => "Decimal",
            Value::String(_) => "String",
            Value::Blob(_) => "Blob",
            Value::DateTime(_) => "DateTime",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::IMap(_) => "IMap",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

/// Converts a document literal.
///
/// Non-negative integers become Int (as chainpack writers do for plain
/// integers) unless they only fit into UInt. Objects become Map.
impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match v {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            Json::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

// =============================================================================
// DECIMAL
// =============================================================================

/// Decimal number `mantissa * 10^exponent`.
///
/// Equality and ordering are numeric, so `10e0 == 1e1`.
#[derive(Debug, Clone, Copy)]
pub struct Decimal {
    mantissa: i64,
    exponent: i32,
}

/// Error parsing a decimal literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal literal: {0:?}")]
pub struct DecimalParseError(pub String);

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        mantissa: 0,
        exponent: 0,
    };

    pub fn new(mantissa: i64, exponent: i32) -> Self {
        Self { mantissa, exponent }
    }

    pub fn mantissa(&self) -> i64 {
        self.mantissa
    }

    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    /// Same value with trailing zeros of the mantissa moved to the exponent.
    pub fn normalized(&self) -> Decimal {
        if self.mantissa == 0 {
            return Decimal::ZERO;
        }
        let mut mantissa = self.mantissa;
        let mut exponent = self.exponent;
        while mantissa % 10 == 0 {
            mantissa /= 10;
            exponent = exponent.saturating_add(1);
        }
        Decimal { mantissa, exponent }
    }

    /// Number of decimal digits of the absolute mantissa.
    fn digits(mantissa: u64) -> i64 {
        if mantissa == 0 {
            1
        } else {
            i64::from(mantissa.ilog10()) + 1
        }
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.normalized();
        let b = other.normalized();
        let sign = a.mantissa.signum().cmp(&b.mantissa.signum());
        if sign != Ordering::Equal || a.mantissa == 0 {
            return sign;
        }
        let negative = a.mantissa < 0;
        let (am, bm) = (a.mantissa.unsigned_abs(), b.mantissa.unsigned_abs());
        // Position of the most significant digit decides unless it is equal.
        let a_mag = Self::digits(am) + i64::from(a.exponent);
        let b_mag = Self::digits(bm) + i64::from(b.exponent);
        let abs = if a_mag != b_mag {
            a_mag.cmp(&b_mag)
        } else {
            // Equal magnitude bounds the exponent difference by 19 digits.
            let shift = (a.exponent - b.exponent).unsigned_abs();
            let (am, bm) = (u128::from(am), u128::from(bm));
            if a.exponent >= b.exponent {
                (am * 10u128.pow(shift)).cmp(&bm)
            } else {
                am.cmp(&(bm * 10u128.pow(shift)))
            }
        };
        if negative { abs.reverse() } else { abs }
    }
}

impl FromStr for Decimal {
    type Err = DecimalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || DecimalParseError(s.to_string());
        let text = s.trim();
        let (number, exp) = match text.find(['e', 'E']) {
            Some(pos) => (
                &text[..pos],
                text[pos + 1..].parse::<i32>().map_err(|_| err())?,
            ),
            None => (text, 0),
        };
        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number.strip_prefix('+').unwrap_or(number)),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        let mut mantissa: i64 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            let d = c.to_digit(10).ok_or_else(err)?;
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i64::from(d)))
                .ok_or_else(err)?;
        }
        let frac_len = i32::try_from(frac_part.len()).map_err(|_| err())?;
        let exponent = exp.checked_sub(frac_len).ok_or_else(err)?;
        Ok(Decimal::new(
            if negative { -mantissa } else { mantissa },
            exponent,
        ))
    }
}

impl From<i64> for Decimal {
    fn from(v: i64) -> Self {
        Decimal::new(v, 0)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exponent == 0 {
            write!(f, "{}", self.mantissa)
        } else {
            write!(f, "{}e{}", self.mantissa, self.exponent)
        }
    }
}

// =============================================================================
// DATETIME
// =============================================================================

/// Point in time with the UTC offset it was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTime {
    /// Milliseconds since the Unix epoch (UTC).
    pub msecs: i64,
    /// Offset from UTC in minutes.
    pub utc_offset_min: i16,
}

impl DateTime {
    pub fn from_msecs(msecs: i64) -> Self {
        Self {
            msecs,
            utc_offset_min: 0,
        }
    }

    pub fn with_offset(msecs: i64, utc_offset_min: i16) -> Self {
        Self {
            msecs,
            utc_offset_min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_decimal_parse() {
        assert_eq!(dec("1e1000"), Decimal::new(1, 1000));
        assert_eq!(dec("-1"), Decimal::new(-1, 0));
        assert_eq!(dec("0.5").mantissa(), 5);
        assert_eq!(dec("0.5").exponent(), -1);
        assert_eq!(dec("-12.25e2"), Decimal::new(-1225, 0));
        assert!("".parse::<Decimal>().is_err());
        assert!("1.2.3".parse::<Decimal>().is_err());
        assert!("abc".parse::<Decimal>().is_err());
        assert!("99999999999999999999".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_decimal_ordering() {
        assert_eq!(Decimal::new(10, 0), Decimal::new(1, 1));
        assert!(dec("0.5") < dec("1"));
        assert!(dec("-1") < dec("-0.5"));
        assert!(dec("-1e1000") < dec("1e-1000"));
        assert!(dec("1e1000") > dec("999999"));
        assert!(dec("-1e3") < dec("-999"));
        assert!(dec("0") > dec("-0.001"));
        assert!(dec("123") > dec("12.3"));
        assert_eq!(dec("0e5"), Decimal::ZERO);
    }

    #[test]
    fn test_value_from_json() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"a": [1, -2, 18446744073709551615, 1.5, "x", null, true]}"#)
                .unwrap();
        let mut expected = BTreeMap::new();
        expected.insert(
            "a".to_string(),
            Value::List(vec![
                Value::Int(1),
                Value::Int(-2),
                Value::UInt(u64::MAX),
                Value::Double(1.5),
                Value::from("x"),
                Value::Null,
                Value::Bool(true),
            ]),
        );
        assert_eq!(Value::from(&json), Value::Map(expected));
    }

    #[test]
    fn test_as_integer() {
        assert_eq!(Value::Int(-3).as_integer(), Some(-3));
        assert_eq!(Value::UInt(u64::MAX).as_integer(), Some(u64::MAX as i128));
        assert_eq!(Value::Bool(true).as_integer(), None);
        assert_eq!(Value::Int(-3).as_unsigned(), None);
    }
}
