//! The seam between the container decoder and the FLIM model.
//!
//! Everything above this module only sees an ordered list of
//! [`DirectoryEntry`] values and a per-entry raw buffer accessor. The TIFF
//! decoder is one implementation; [`MemoryFrameSource`] is another, for
//! callers that already hold the decoded tables.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{FlimError, TiffError};
use crate::io::RangeReader;

use super::tiff::{TagValue, TiffFile, TiffTag};

// =============================================================================
// DirectoryEntry
// =============================================================================

/// One directory of the container: its recognized tags and their values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    /// Position in the directory chain (0 is the session header)
    pub index: usize,

    /// Recognized tags, copied verbatim
    pub tags: BTreeMap<TiffTag, TagValue>,
}

impl DirectoryEntry {
    pub fn new(index: usize, tags: BTreeMap<TiffTag, TagValue>) -> Self {
        Self { index, tags }
    }

    /// The ImageDescription text, or `""` when the tag is absent.
    pub fn description(&self) -> &str {
        self.tags
            .get(&TiffTag::ImageDescription)
            .and_then(TagValue::as_str)
            .unwrap_or("")
    }

    pub fn get(&self, tag: TiffTag) -> Option<&TagValue> {
        self.tags.get(&tag)
    }
}

// =============================================================================
// FrameSource
// =============================================================================

/// Random access to the directories and raw frame buffers of one file.
///
/// `entries()` includes the header directory at position 0. Buffer reads
/// take directory positions, so frame `i` lives at entry `i + 1`.
/// Reads are not cached.
pub trait FrameSource {
    /// All directories, header first.
    fn entries(&self) -> &[DirectoryEntry];

    /// Flat sample buffer stored with directory `entry_index`.
    fn read_buffer(&self, entry_index: usize) -> Result<Vec<u64>, FlimError>;

    /// Identifier used in log records.
    fn identifier(&self) -> &str;
}

// =============================================================================
// TiffFrameSource
// =============================================================================

/// FrameSource backed by a parsed TIFF file.
///
/// Tags of every directory are decoded on construction; strips are read on
/// demand.
pub struct TiffFrameSource<R: RangeReader> {
    file: TiffFile<R>,
    entries: Vec<DirectoryEntry>,
}

impl<R: RangeReader> TiffFrameSource<R> {
    pub fn new(reader: R, max_directories: usize) -> Result<Self, TiffError> {
        let file = TiffFile::parse(reader, max_directories)?;
        let entries = (0..file.directory_count())
            .map(|index| Ok(DirectoryEntry::new(index, file.read_tags(index)?)))
            .collect::<Result<Vec<_>, TiffError>>()?;

        Ok(Self { file, entries })
    }
}

impl<R: RangeReader> FrameSource for TiffFrameSource<R> {
    fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    fn read_buffer(&self, entry_index: usize) -> Result<Vec<u64>, FlimError> {
        if entry_index >= self.entries.len() {
            return Err(FlimError::IndexOutOfRange {
                index: entry_index,
                len: self.entries.len(),
            });
        }
        Ok(self.file.read_samples(entry_index)?)
    }

    fn identifier(&self) -> &str {
        self.file.reader().identifier()
    }
}

// =============================================================================
// MemoryFrameSource
// =============================================================================

/// FrameSource over directories and buffers that are already in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFrameSource {
    entries: Vec<DirectoryEntry>,
    buffers: Vec<Vec<u64>>,
}

impl MemoryFrameSource {
    /// Start a source whose header directory carries `description`.
    pub fn with_header(description: impl Into<String>) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(
            TiffTag::ImageDescription,
            TagValue::Ascii(description.into()),
        );
        Self {
            entries: vec![DirectoryEntry::new(0, tags)],
            buffers: vec![Vec::new()],
        }
    }

    /// Append a frame directory with its description text and raw buffer.
    pub fn push_frame(&mut self, description: impl Into<String>, buffer: Vec<u64>) -> &mut Self {
        let index = self.entries.len();
        let mut tags = BTreeMap::new();
        tags.insert(
            TiffTag::ImageDescription,
            TagValue::Ascii(description.into()),
        );
        self.entries.push(DirectoryEntry::new(index, tags));
        self.buffers.push(buffer);
        self
    }

    /// Append a frame directory with an explicit tag table.
    pub fn push_entry(&mut self, tags: BTreeMap<TiffTag, TagValue>, buffer: Vec<u64>) -> &mut Self {
        let index = self.entries.len();
        self.entries.push(DirectoryEntry::new(index, tags));
        self.buffers.push(buffer);
        self
    }
}

impl FrameSource for MemoryFrameSource {
    fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    fn read_buffer(&self, entry_index: usize) -> Result<Vec<u64>, FlimError> {
        self.buffers
            .get(entry_index)
            .cloned()
            .ok_or(FlimError::IndexOutOfRange {
                index: entry_index,
                len: self.buffers.len(),
            })
    }

    fn identifier(&self) -> &str {
        "memory"
    }
}
