//! Per-frame attributes.
//!
//! Frame descriptions use the same `key = value;` line format as the
//! header, but values stay strings. Only the acquisition timestamp gets a
//! typed accessor.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::FlimError;
use crate::format::tiff::{TagValue, TiffTag};
use crate::format::DirectoryEntry;

use super::params::split_assignment;

/// Attribute holding the acquisition timestamp.
pub const TIMESTAMP_KEY: &str = "Acquired_Time";

/// `chrono` format of [`TIMESTAMP_KEY`] values.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Metadata of one data frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameInfo {
    /// Zero-based frame number (directory `frame_number + 1`)
    pub frame_number: usize,

    /// Recognized container tags, copied verbatim
    pub tags: BTreeMap<TiffTag, TagValue>,

    /// Description assignments, uncoerced
    pub attributes: BTreeMap<String, String>,
}

impl FrameInfo {
    pub fn from_entry(entry: &DirectoryEntry, frame_number: usize) -> Self {
        let attributes = entry
            .description()
            .lines()
            .filter_map(split_assignment)
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        Self {
            frame_number,
            tags: entry.tags.clone(),
            attributes,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn tag(&self, tag: TiffTag) -> Option<&TagValue> {
        self.tags.get(&tag)
    }

    pub fn width(&self) -> Option<u64> {
        self.tag(TiffTag::ImageWidth).and_then(TagValue::as_u64)
    }

    pub fn height(&self) -> Option<u64> {
        self.tag(TiffTag::ImageLength).and_then(TagValue::as_u64)
    }

    pub fn strip_offsets(&self) -> Option<&[u64]> {
        self.tag(TiffTag::StripOffsets).and_then(TagValue::as_u64_slice)
    }

    pub fn strip_byte_counts(&self) -> Option<&[u64]> {
        self.tag(TiffTag::StripByteCounts).and_then(TagValue::as_u64_slice)
    }

    /// Parse the acquisition timestamp.
    ///
    /// Surrounding whitespace and quotes are ignored.
    pub fn acquisition_time(&self) -> Result<NaiveDateTime, FlimError> {
        let raw = self
            .attribute(TIMESTAMP_KEY)
            .ok_or(FlimError::MissingTimestamp {
                frame: self.frame_number,
            })?;
        let value = raw.trim().trim_matches(['\'', '"']);

        NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| {
            FlimError::MalformedTimestamp {
                frame: self.frame_number,
                value: raw.to_string(),
                message: e.to_string(),
            }
        })
    }
}
