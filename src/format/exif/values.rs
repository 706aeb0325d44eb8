//! Directory entry decoding.
//!
//! Each 12-byte entry is laid out as:
//!
//! ```text
//! Bytes 0-1:  Tag ID
//! Bytes 2-3:  Field type
//! Bytes 4-7:  Value count
//! Bytes 8-11: Value, or offset to the value (relative to the TIFF header)
//! ```
//!
//! Values whose encoded size fits in four bytes are stored inline; anything
//! larger lives at the offset. RATIONAL and SRATIONAL are eight bytes each and
//! therefore always live at an offset.

use std::fmt;

use bytes::Bytes;
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::error::ExifError;

use super::parser::{IfdCursor, IFD_ENTRY_SIZE};
use super::tags::FieldType;

// =============================================================================
// Rational
// =============================================================================

/// A RATIONAL or SRATIONAL value.
///
/// The denominator is never zero: a zero denominator is stored as 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub numerator: i64,
    pub denominator: i64,
}

impl Rational {
    pub fn new(numerator: i64, denominator: i64) -> Self {
        let denominator = if denominator == 0 { 1 } else { denominator };
        Self {
            numerator,
            denominator,
        }
    }

    pub fn to_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl Serialize for Rational {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// MetadataValue
// =============================================================================

/// The decoded value of one directory entry.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    /// Entry with a zero count
    Nil,
    /// Single BYTE, SHORT, LONG or SLONG
    Integer(i64),
    /// Single RATIONAL or SRATIONAL
    Rational(Rational),
    /// ASCII, right-trimmed of whitespace and NUL padding
    String(String),
    /// UNDEFINED
    Bytes(Bytes),
    /// Several integers, in file order
    Integers(Vec<i64>),
    /// Several rationals, in file order
    Rationals(Vec<Rational>),
}

impl MetadataValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            MetadataValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_rational(&self) -> Option<Rational> {
        match self {
            MetadataValue::Rational(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            MetadataValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, MetadataValue::Nil)
    }
}

impl Serialize for MetadataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetadataValue::Nil => serializer.serialize_none(),
            MetadataValue::Integer(v) => serializer.serialize_i64(*v),
            MetadataValue::Rational(r) => r.serialize(serializer),
            MetadataValue::String(s) => serializer.serialize_str(s),
            MetadataValue::Bytes(b) => serializer.serialize_str(&hex::encode(b)),
            MetadataValue::Integers(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for v in values {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            MetadataValue::Rationals(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for v in values {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
        }
    }
}

// =============================================================================
// IfdEntry
// =============================================================================

/// Header fields of one directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfdEntry {
    /// Tag ID
    pub tag: u16,

    /// Raw field type code as stored
    pub field_type_raw: u16,

    /// Decoded field type, `None` if not supported
    pub field_type: Option<FieldType>,

    /// Number of values
    pub count: u32,

    /// Value field interpreted as an offset
    pub value_offset: u32,

    /// Absolute position of the entry within the TIFF region
    pub position: usize,
}

impl IfdEntry {
    /// Read the entry under the cursor without advancing it.
    pub fn read(cursor: &IfdCursor<'_>) -> Result<Self, ExifError> {
        // Touch the whole entry first so a truncated table fails as one unit
        cursor.bytes_here(0, IFD_ENTRY_SIZE)?;

        let field_type_raw = cursor.read_u16(2)?;

        Ok(Self {
            tag: cursor.read_u16(0)?,
            field_type_raw,
            field_type: FieldType::from_u16(field_type_raw),
            count: cursor.read_u32(4)?,
            value_offset: cursor.read_u32(8)?,
            position: cursor.position(),
        })
    }

    /// Whether the value is stored in the entry itself.
    pub fn is_inline(&self) -> bool {
        self.field_type
            .map_or(false, |field_type| field_type.fits_inline(self.count))
    }
}

// =============================================================================
// ValueReader
// =============================================================================

/// Decodes entry values through a bounds-checked cursor.
pub struct ValueReader<'c, 'a> {
    cursor: &'c IfdCursor<'a>,
}

impl<'c, 'a> ValueReader<'c, 'a> {
    pub fn new(cursor: &'c IfdCursor<'a>) -> Self {
        Self { cursor }
    }

    /// Decode an entry according to its field type.
    ///
    /// # Errors
    /// - `UnsupportedValueType` for type codes outside BYTE..SRATIONAL
    /// - `TruncatedValue` if the value data lies outside the segment
    pub fn read(&self, entry: &IfdEntry) -> Result<MetadataValue, ExifError> {
        let field_type = entry
            .field_type
            .ok_or(ExifError::UnsupportedValueType(entry.field_type_raw))?;

        match field_type {
            FieldType::Ascii => self.read_ascii(entry),
            FieldType::Undefined => self.read_undefined(entry),
            FieldType::Byte => self.read_integers(entry, |b| b[0] as i64),
            FieldType::Short => {
                let order = self.cursor.byte_order();
                self.read_integers(entry, |b| order.read_u16([b[0], b[1]]) as i64)
            }
            FieldType::Long => {
                let order = self.cursor.byte_order();
                self.read_integers(entry, |b| order.read_u32([b[0], b[1], b[2], b[3]]) as i64)
            }
            FieldType::SLong => {
                let order = self.cursor.byte_order();
                self.read_integers(entry, |b| order.read_i32([b[0], b[1], b[2], b[3]]) as i64)
            }
            FieldType::Rational => {
                let order = self.cursor.byte_order();
                self.read_rationals(entry, |b| {
                    (
                        order.read_u32([b[0], b[1], b[2], b[3]]) as i64,
                        order.read_u32([b[4], b[5], b[6], b[7]]) as i64,
                    )
                })
            }
            FieldType::SRational => {
                let order = self.cursor.byte_order();
                self.read_rationals(entry, |b| {
                    (
                        order.read_i32([b[0], b[1], b[2], b[3]]) as i64,
                        order.read_i32([b[4], b[5], b[6], b[7]]) as i64,
                    )
                })
            }
        }
    }

    /// Raw value bytes, following the inline-vs-offset rule.
    pub fn read_bytes(&self, entry: &IfdEntry) -> Result<&'a [u8], ExifError> {
        let field_type = entry
            .field_type
            .ok_or(ExifError::UnsupportedValueType(entry.field_type_raw))?;

        let size = (entry.count as usize)
            .checked_mul(field_type.size_in_bytes())
            .ok_or(ExifError::TruncatedValue {
                offset: entry.value_offset as usize,
                size: usize::MAX,
                available: self.cursor.region().len(),
            })?;

        if entry.is_inline() {
            self.cursor.bytes_at(entry.position + 8, size)
        } else {
            self.cursor.bytes_at(entry.value_offset as usize, size)
        }
    }

    fn read_ascii(&self, entry: &IfdEntry) -> Result<MetadataValue, ExifError> {
        let bytes = self.read_bytes(entry)?;
        let text = String::from_utf8_lossy(bytes);
        let trimmed = text.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
        Ok(MetadataValue::String(trimmed.to_string()))
    }

    fn read_undefined(&self, entry: &IfdEntry) -> Result<MetadataValue, ExifError> {
        let bytes = self.read_bytes(entry)?;
        Ok(MetadataValue::Bytes(Bytes::copy_from_slice(bytes)))
    }

    fn read_integers<F>(&self, entry: &IfdEntry, decode: F) -> Result<MetadataValue, ExifError>
    where
        F: Fn(&[u8]) -> i64,
    {
        if entry.count == 0 {
            return Ok(MetadataValue::Nil);
        }

        let bytes = self.read_bytes(entry)?;
        let width = bytes.len() / entry.count as usize;
        let mut values: Vec<i64> = bytes.chunks_exact(width).map(decode).collect();

        Ok(if values.len() == 1 {
            MetadataValue::Integer(values.remove(0))
        } else {
            MetadataValue::Integers(values)
        })
    }

    fn read_rationals<F>(&self, entry: &IfdEntry, decode: F) -> Result<MetadataValue, ExifError>
    where
        F: Fn(&[u8]) -> (i64, i64),
    {
        if entry.count == 0 {
            return Ok(MetadataValue::Nil);
        }

        let bytes = self.read_bytes(entry)?;
        let mut values: Vec<Rational> = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let (numerator, denominator) = decode(chunk);
                Rational::new(numerator, denominator)
            })
            .collect();

        Ok(if values.len() == 1 {
            MetadataValue::Rational(values.remove(0))
        } else {
            MetadataValue::Rationals(values)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
