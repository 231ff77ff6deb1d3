//! Chainpack literal writer.
//!
//! Produces the exact chainpack bytes of a [`Value`]. Only encoding is
//! provided; the byte length is what constant types report as their size.
//!
//! Unsigned data is written big-endian with the number of bytes announced by
//! the leading one bits of the first byte:
//!
//! ```text
//!  0 ... 7 bits  1  byte  |0|x|x|x|x|x|x|x|
//!  8 ... 14 bits 2  bytes |1|0|x|x|x|x|x|x| |x|x|x|x|x|x|x|x|
//! 15 ... 21 bits 3  bytes |1|1|0|x|x|x|x|x| |x|x|x|x|x|x|x|x| |x|x|x|x|x|x|x|x|
//! 22 ... 28 bits 4  bytes |1|1|1|0|x|x|x|x| ...
//! 29+ bits   5+n bytes    |1|1|1|1|n|n|n|n| followed by n+4 data bytes
//! ```

use crate::model::{DateTime, Decimal, Value};

/// Packing schema tags.
pub mod tag {
    pub const NULL: u8 = 128;
    pub const UINT: u8 = 129;
    pub const INT: u8 = 130;
    pub const DOUBLE: u8 = 131;
    pub const BLOB: u8 = 133;
    pub const STRING: u8 = 134;
    pub const LIST: u8 = 136;
    pub const MAP: u8 = 137;
    pub const IMAP: u8 = 138;
    pub const DECIMAL: u8 = 140;
    pub const DATETIME: u8 = 141;
    pub const FALSE: u8 = 253;
    pub const TRUE: u8 = 254;
    pub const TERM: u8 = 255;
}

/// Milliseconds between the Unix epoch and 2018-02-02T00:00:00Z.
pub const SHV_EPOCH_MSEC: i64 = 1_517_529_600_000;

/// Values below this are packed into the tag byte itself.
const TINY_LIMIT: u64 = 64;

/// Number of significant bits of `n`, zero for zero.
fn significant_bits(n: u128) -> u32 {
    128 - n.leading_zeros()
}

/// Number of bytes used for data of the given bit length.
fn bytes_needed(bit_len: u32) -> usize {
    let bit_len = bit_len.max(1);
    if bit_len <= 28 {
        ((bit_len - 1) / 7 + 1) as usize
    } else {
        ((bit_len - 1) / 8 + 2) as usize
    }
}

/// Bit position of the sign bit for data of the given bit length.
fn sign_bit_position(bit_len: u32) -> u32 {
    let byte_cnt = bytes_needed(bit_len) as u32;
    if bit_len <= 28 {
        byte_cnt * 7 - 1
    } else {
        (byte_cnt - 1) * 8 - 1
    }
}

/// Writer accumulating chainpack bytes.
#[derive(Debug, Clone, Default)]
pub struct ChainPackWriter {
    buf: Vec<u8>,
}

impl ChainPackWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn write_data(&mut self, num: u128, bit_len: u32) {
        let byte_cnt = bytes_needed(bit_len);
        let mut data = [0u8; 10];
        let mut n = num;
        for byte in data[..byte_cnt].iter_mut().rev() {
            *byte = (n & 0xFF) as u8;
            n >>= 8;
        }
        if bit_len <= 28 {
            let mask = 0xF0u32 << (4 - byte_cnt);
            data[0] &= !(mask as u8);
            data[0] |= (mask << 1) as u8;
        } else {
            data[0] = 0xF0 | (byte_cnt - 5) as u8;
        }
        self.write_bytes(&data[..byte_cnt]);
    }

    /// Writes unsigned data without a tag.
    pub fn write_uint_data(&mut self, num: u64) {
        let num = u128::from(num);
        self.write_data(num, significant_bits(num));
    }

    /// Writes signed data without a tag.
    ///
    /// The magnitude is stored with the sign in the topmost data bit.
    pub fn write_int_data(&mut self, num: i64) {
        let mut data = u128::from(num.unsigned_abs());
        let bit_len = significant_bits(data) + 1;
        if num < 0 {
            data |= 1u128 << sign_bit_position(bit_len);
        }
        self.write_data(data, bit_len);
    }

    pub fn write_uint(&mut self, num: u64) {
        if num < TINY_LIMIT {
            self.write_byte(num as u8);
        } else {
            self.write_byte(tag::UINT);
            self.write_uint_data(num);
        }
    }

    pub fn write_int(&mut self, num: i64) {
        if (0..TINY_LIMIT as i64).contains(&num) {
            self.write_byte(num as u8 + TINY_LIMIT as u8);
        } else {
            self.write_byte(tag::INT);
            self.write_int_data(num);
        }
    }

    pub fn write_double(&mut self, num: f64) {
        self.write_byte(tag::DOUBLE);
        self.write_bytes(&num.to_le_bytes());
    }

    pub fn write_decimal(&mut self, num: &Decimal) {
        self.write_byte(tag::DECIMAL);
        self.write_int_data(num.mantissa());
        self.write_int_data(i64::from(num.exponent()));
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_byte(tag::STRING);
        self.write_uint_data(s.len() as u64);
        self.write_bytes(s.as_bytes());
    }

    pub fn write_blob(&mut self, bytes: &[u8]) {
        self.write_byte(tag::BLOB);
        self.write_uint_data(bytes.len() as u64);
        self.write_bytes(bytes);
    }

    /// Writes a date-time.
    ///
    /// Milliseconds are relative to [`SHV_EPOCH_MSEC`]. Whole seconds drop
    /// the millisecond part, a non-zero offset is appended in 15 minute
    /// units. The two lowest bits flag both cases.
    pub fn write_datetime(&mut self, dt: &DateTime) {
        self.write_byte(tag::DATETIME);
        let mut msecs = dt.msecs.saturating_sub(SHV_EPOCH_MSEC);
        let offset = i64::from(dt.utc_offset_min / 15) & 0x7F;
        let has_msecs = msecs % 1000 != 0;
        if !has_msecs {
            msecs /= 1000;
        }
        if offset != 0 {
            msecs = (msecs << 7) | offset;
        }
        msecs <<= 2;
        if offset != 0 {
            msecs |= 1;
        }
        if !has_msecs {
            msecs |= 2;
        }
        self.write_int_data(msecs);
    }

    /// Writes any value including its tag.
    pub fn write(&mut self, value: &Value) {
        match value {
            Value::Null => self.write_byte(tag::NULL),
            Value::Bool(b) => self.write_byte(if *b { tag::TRUE } else { tag::FALSE }),
            Value::Int(n) => self.write_int(*n),
            Value::UInt(n) => self.write_uint(*n),
            Value::Double(n) => self.write_double(*n),
            Value::Decimal(d) => self.write_decimal(d),
            Value::String(s) => self.write_string(s),
            Value::Blob(b) => self.write_blob(b),
            Value::DateTime(dt) => self.write_datetime(dt),
            Value::List(items) => {
                self.write_byte(tag::LIST);
                for item in items {
                    self.write(item);
                }
                self.write_byte(tag::TERM);
            }
            Value::Map(map) => {
                self.write_byte(tag::MAP);
                for (key, item) in map {
                    self.write_string(key);
                    self.write(item);
                }
                self.write_byte(tag::TERM);
            }
            Value::IMap(map) => {
                self.write_byte(tag::IMAP);
                for (key, item) in map {
                    self.write_int(*key);
                    self.write(item);
                }
                self.write_byte(tag::TERM);
            }
        }
    }
}

/// Encodes a value to chainpack bytes.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut writer = ChainPackWriter::new();
    writer.write(value);
    writer.into_bytes()
}

/// Exact chainpack length of a value.
pub fn encoded_len(value: &Value) -> usize {
    let mut writer = ChainPackWriter::new();
    writer.write(value);
    writer.len()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn uint_data(n: u64) -> Vec<u8> {
        let mut w = ChainPackWriter::new();
        w.write_uint_data(n);
        w.into_bytes()
    }

    fn int_data(n: i64) -> Vec<u8> {
        let mut w = ChainPackWriter::new();
        w.write_int_data(n);
        w.into_bytes()
    }

    #[test]
    fn test_uint_data() {
        assert_eq!(uint_data(0), [0x00]);
        assert_eq!(uint_data(0x7F), [0x7F]);
        assert_eq!(uint_data(0x80), [0x80, 0x80]);
        assert_eq!(uint_data(0x3FFF), [0xBF, 0xFF]);
        assert_eq!(uint_data(0x4000), [0xC0, 0x40, 0x00]);
        assert_eq!(uint_data(0x0FFF_FFFF), [0xEF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(uint_data(0x1000_0000), [0xF0, 0x10, 0x00, 0x00, 0x00]);
        assert_eq!(uint_data(u64::MAX).len(), 9);
        assert_eq!(uint_data(u64::MAX)[0], 0xF4);
    }

    #[test]
    fn test_int_data() {
        assert_eq!(int_data(1), [0x01]);
        assert_eq!(int_data(-1), [0x41]);
        assert_eq!(int_data(63), [0x3F]);
        assert_eq!(int_data(64), [0x80, 0x40]);
        assert_eq!(int_data(-64), [0xA0, 0x40]);
        assert_eq!(int_data(i64::MAX).len(), 9);
        assert_eq!(int_data(i64::MIN).len(), 10);
    }

    #[test]
    fn test_scalars() {
        assert_eq!(encode(&Value::Null), [tag::NULL]);
        assert_eq!(encode(&Value::Bool(true)), [tag::TRUE]);
        assert_eq!(encode(&Value::Bool(false)), [tag::FALSE]);
        assert_eq!(encode(&Value::UInt(5)), [5]);
        assert_eq!(encode(&Value::Int(5)), [69]);
        assert_eq!(encode(&Value::Int(-5)), [tag::INT, 0x45]);
        assert_eq!(encode(&Value::UInt(64)), [tag::UINT, 0x40]);
        assert_eq!(encode(&Value::Int(64)), [tag::INT, 0x80, 0x40]);
        assert_eq!(encoded_len(&Value::Double(1.5)), 9);
    }

    #[test]
    fn test_string_and_blob() {
        assert_eq!(encode(&Value::from("last")), [tag::STRING, 4, b'l', b'a', b's', b't']);
        assert_eq!(encode(&Value::Blob(vec![1, 2])), [tag::BLOB, 2, 1, 2]);
    }

    #[test]
    fn test_decimal() {
        assert_eq!(
            encode(&Value::Decimal(Decimal::new(123, -2))),
            [tag::DECIMAL, 0x80, 0x7B, 0x42]
        );
    }

    #[test]
    fn test_datetime() {
        let dt = DateTime::from_msecs(SHV_EPOCH_MSEC);
        assert_eq!(encode(&Value::DateTime(dt)), [tag::DATETIME, 0x02]);
        let dt = DateTime::from_msecs(SHV_EPOCH_MSEC + 1);
        assert_eq!(encode(&Value::DateTime(dt)), [tag::DATETIME, 0x04]);
    }

    #[test]
    fn test_containers() {
        let list = Value::List(vec![Value::Int(1), Value::Null]);
        assert_eq!(encode(&list), [tag::LIST, 65, tag::NULL, tag::TERM]);

        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Value::Bool(true));
        assert_eq!(
            encode(&Value::Map(map)),
            [tag::MAP, tag::STRING, 1, b'a', tag::TRUE, tag::TERM]
        );

        let mut imap = BTreeMap::new();
        imap.insert(1, Value::Null);
        assert_eq!(encode(&Value::IMap(imap)), [tag::IMAP, 65, tag::NULL, tag::TERM]);
    }

    #[test]
    fn test_writer_len() {
        let mut w = ChainPackWriter::new();
        assert!(w.is_empty());
        w.write(&Value::from("last"));
        assert_eq!(w.len(), 6);
        assert_eq!(encoded_len(&Value::from("last")), 6);
        assert_eq!(encoded_len(&Value::Null), 1);
    }
}
