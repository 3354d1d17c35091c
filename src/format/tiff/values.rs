//! TIFF tag value reading.
//!
//! Values are either stored inline in the directory entry or at an offset
//! in the file. Arrays (strip offsets, the description text) are fetched
//! in a single range read.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{ByteOrder, IfdEntry, TiffHeader};
use super::tags::FieldType;

// =============================================================================
// TagValue
// =============================================================================

/// A decoded tag value, kept in the shape the container stored it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    /// BYTE, SHORT, LONG and LONG8 values, widened to u64
    Integers(Vec<u64>),

    /// RATIONAL values as (numerator, denominator)
    Rationals(Vec<(u32, u32)>),

    /// ASCII text with trailing NULs removed
    Ascii(String),

    /// UNDEFINED bytes
    Undefined(Vec<u8>),
}

impl TagValue {
    /// First integer of an integer value.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            TagValue::Integers(values) => values.first().copied(),
            _ => None,
        }
    }

    /// All integers of an integer value.
    pub fn as_u64_slice(&self) -> Option<&[u64]> {
        match self {
            TagValue::Integers(values) => Some(values),
            _ => None,
        }
    }

    /// Text of an ASCII value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Ascii(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Integers(values) if values.len() == 1 => write!(f, "{}", values[0]),
            TagValue::Integers(values) => write!(f, "{:?}", values),
            TagValue::Rationals(values) if values.len() == 1 => {
                write!(f, "{}/{}", values[0].0, values[0].1)
            }
            TagValue::Rationals(values) => write!(f, "{:?}", values),
            TagValue::Ascii(text) => f.write_str(text),
            TagValue::Undefined(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

// =============================================================================
// ValueReader
// =============================================================================

/// Reads tag values from a TIFF file, respecting its byte order and format.
pub struct ValueReader<'a, R: RangeReader> {
    reader: &'a R,
    header: &'a TiffHeader,
}

impl<'a, R: RangeReader> ValueReader<'a, R> {
    pub fn new(reader: &'a R, header: &'a TiffHeader) -> Self {
        Self { reader, header }
    }

    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    /// Read the raw bytes of an entry's value, inline or at its offset.
    pub fn read_bytes(&self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let size = entry
            .value_byte_size()
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.is_inline {
            Ok(Bytes::copy_from_slice(
                &entry.value_offset_bytes[..size as usize],
            ))
        } else {
            let offset = entry.value_offset(self.header.byte_order);
            Ok(self.reader.read_exact_at(offset, size as usize)?)
        }
    }

    /// Read and decode an entry's value.
    pub fn read_value(&self, entry: &IfdEntry) -> Result<TagValue, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;
        let bytes = self.read_bytes(entry)?;
        let count = entry.count as usize;
        let byte_order = self.header.byte_order;

        let value = match field_type {
            FieldType::Ascii => {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                TagValue::Ascii(String::from_utf8_lossy(&bytes[..end]).into_owned())
            }
            FieldType::Rational => TagValue::Rationals(
                (0..count)
                    .map(|i| {
                        let at = i * 8;
                        (
                            byte_order.read_u32(&bytes[at..]),
                            byte_order.read_u32(&bytes[at + 4..]),
                        )
                    })
                    .collect(),
            ),
            FieldType::Undefined => TagValue::Undefined(bytes.to_vec()),
            FieldType::Byte | FieldType::Short | FieldType::Long | FieldType::Long8 => {
                TagValue::Integers(parse_u64_array(&bytes, count, field_type, byte_order))
            }
        };

        Ok(value)
    }

    /// Read an integer array, such as StripOffsets or StripByteCounts.
    pub fn read_u64_array(&self, entry: &IfdEntry) -> Result<Vec<u64>, TiffError> {
        match self.read_value(entry)? {
            TagValue::Integers(values) => Ok(values),
            other => Err(TiffError::InvalidTagValue {
                tag: tag_name(entry),
                message: format!("expected integers, got {}", other),
            }),
        }
    }
}

fn tag_name(entry: &IfdEntry) -> &'static str {
    entry.tag().map(|t| t.name()).unwrap_or("unknown")
}

/// Decode `count` unsigned integers of `field_type` from `bytes`.
///
/// Values that would read past the end of `bytes` are dropped.
pub fn parse_u64_array(
    bytes: &[u8],
    count: usize,
    field_type: FieldType,
    byte_order: ByteOrder,
) -> Vec<u64> {
    let width = field_type.size_in_bytes();
    (0..count)
        .map(|i| i * width)
        .take_while(|&at| at + width <= bytes.len())
        .filter_map(|at| {
            let slice = &bytes[at..];
            match field_type {
                FieldType::Byte => Some(slice[0] as u64),
                FieldType::Short => Some(byte_order.read_u16(slice) as u64),
                FieldType::Long => Some(byte_order.read_u32(slice) as u64),
                FieldType::Long8 => Some(byte_order.read_u64(slice)),
                _ => None,
            }
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
