//! Walking the IFD chain of a `.flim` file and decoding frame strips.
//!
//! A `.flim` file is a flat list of directories: the first one carries the
//! acquisition-wide description text, every following one points at the
//! uncompressed strips of one frame. Directories are parsed once up front;
//! strip data is only read when a frame is requested.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{ByteOrder, Ifd, TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE};
use super::tags::{TiffTag, COMPRESSION_NONE};
use super::values::{TagValue, ValueReader};

/// Default cap on the number of directories followed in one file.
pub const DEFAULT_MAX_DIRECTORIES: usize = 1 << 20;

/// A TIFF file whose directory chain has been parsed.
pub struct TiffFile<R: RangeReader> {
    reader: R,
    header: TiffHeader,
    ifds: Vec<Ifd>,
}

impl<R: RangeReader> TiffFile<R> {
    /// Parse the header and every directory reachable from it.
    ///
    /// Stops after `max_directories` directories and fails if the chain
    /// revisits an offset.
    pub fn parse(reader: R, max_directories: usize) -> Result<Self, TiffError> {
        let header_len = (BIGTIFF_HEADER_SIZE as u64).min(reader.size()) as usize;
        if header_len < TIFF_HEADER_SIZE {
            return Err(TiffError::FileTooSmall {
                required: TIFF_HEADER_SIZE as u64,
                actual: reader.size(),
            });
        }
        let header_bytes = reader.read_exact_at(0, header_len)?;
        let header = TiffHeader::parse(&header_bytes, reader.size())?;
        let ifds = Self::parse_all_ifds(&reader, &header, max_directories)?;

        debug!(
            identifier = reader.identifier(),
            directories = ifds.len(),
            bigtiff = header.is_bigtiff,
            "parsed TIFF directory chain"
        );

        Ok(Self {
            reader,
            header,
            ifds,
        })
    }

    fn parse_all_ifds(
        reader: &R,
        header: &TiffHeader,
        max_directories: usize,
    ) -> Result<Vec<Ifd>, TiffError> {
        let mut ifds = Vec::new();
        let mut visited = HashSet::new();
        let mut offset = header.first_ifd_offset;

        while offset != 0 && ifds.len() < max_directories {
            if !visited.insert(offset) {
                return Err(TiffError::IfdCycle(offset));
            }
            if offset >= reader.size() {
                return Err(TiffError::InvalidIfdOffset(offset));
            }

            let count_bytes = reader.read_exact_at(offset, header.ifd_count_size())?;
            let entry_count = if header.is_bigtiff {
                header.byte_order.read_u64(&count_bytes)
            } else {
                header.byte_order.read_u16(&count_bytes) as u64
            };

            let ifd_size = Ifd::calculate_size(entry_count, header).ok_or(
                TiffError::FileTooSmall {
                    required: u64::MAX,
                    actual: reader.size(),
                },
            )?;
            let ifd_bytes = reader.read_exact_at(offset, ifd_size)?;
            let ifd = Ifd::parse(&ifd_bytes, header)?;

            offset = ifd.next_ifd_offset;
            ifds.push(ifd);
        }

        Ok(ifds)
    }

    pub fn header(&self) -> &TiffHeader {
        &self.header
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Number of directories in the file.
    pub fn directory_count(&self) -> usize {
        self.ifds.len()
    }

    /// Decode the recognized tags of directory `index`.
    ///
    /// Unrecognized tags are skipped.
    pub fn read_tags(&self, index: usize) -> Result<BTreeMap<TiffTag, TagValue>, TiffError> {
        let ifd = self
            .ifds
            .get(index)
            .ok_or(TiffError::InvalidIfdOffset(index as u64))?;
        let values = ValueReader::new(&self.reader, &self.header);

        let mut tags = BTreeMap::new();
        for entry in &ifd.entries {
            if let Some(tag) = entry.tag() {
                tags.insert(tag, values.read_value(entry)?);
            }
        }
        Ok(tags)
    }

    /// Read the strips of directory `index` and widen every sample to u64.
    pub fn read_samples(&self, index: usize) -> Result<Vec<u64>, TiffError> {
        let ifd = self
            .ifds
            .get(index)
            .ok_or(TiffError::InvalidIfdOffset(index as u64))?;
        let values = ValueReader::new(&self.reader, &self.header);

        let compression = match ifd.get_entry_by_tag(TiffTag::Compression) {
            Some(entry) => values.read_value(entry)?.as_u64().unwrap_or(COMPRESSION_NONE),
            None => COMPRESSION_NONE,
        };
        if compression != COMPRESSION_NONE {
            return Err(TiffError::UnsupportedCompression(compression as u16));
        }

        let bits = ifd
            .get_entry_by_tag(TiffTag::BitsPerSample)
            .ok_or(TiffError::MissingTag(TiffTag::BitsPerSample.name()))
            .and_then(|entry| values.read_value(entry))?
            .as_u64()
            .unwrap_or(0) as u16;
        if !matches!(bits, 8 | 16 | 32) {
            return Err(TiffError::UnsupportedSampleFormat { bits });
        }

        let offsets_entry = ifd
            .get_entry_by_tag(TiffTag::StripOffsets)
            .ok_or(TiffError::MissingTag(TiffTag::StripOffsets.name()))?;
        let counts_entry = ifd
            .get_entry_by_tag(TiffTag::StripByteCounts)
            .ok_or(TiffError::MissingTag(TiffTag::StripByteCounts.name()))?;
        let offsets = values.read_u64_array(offsets_entry)?;
        let counts = values.read_u64_array(counts_entry)?;
        if offsets.len() != counts.len() {
            return Err(TiffError::InvalidTagValue {
                tag: TiffTag::StripByteCounts.name(),
                message: format!(
                    "{} strip offsets but {} byte counts",
                    offsets.len(),
                    counts.len()
                ),
            });
        }

        let mut total: u64 = 0;
        for (&offset, &count) in offsets.iter().zip(&counts) {
            let end = offset.checked_add(count);
            if end.map_or(true, |end| end > self.reader.size()) {
                return Err(TiffError::InvalidTagValue {
                    tag: TiffTag::StripByteCounts.name(),
                    message: format!(
                        "strip of {} bytes at offset {} exceeds file size {}",
                        count,
                        offset,
                        self.reader.size()
                    ),
                });
            }
            total = total.saturating_add(count);
        }

        let sample_bytes = (bits / 8) as usize;
        let capacity = usize::try_from(total / sample_bytes as u64).unwrap_or(0);
        let mut samples = Vec::with_capacity(capacity);
        for (&offset, &count) in offsets.iter().zip(&counts) {
            let strip = self.reader.read_exact_at(offset, count as usize)?;
            decode_samples(&strip, sample_bytes, self.header.byte_order, &mut samples);
        }

        debug!(
            directory = index,
            strips = offsets.len(),
            samples = samples.len(),
            "read frame strips"
        );
        Ok(samples)
    }
}

/// Append the unsigned samples in `bytes` to `out`.
///
/// A trailing partial sample is ignored.
fn decode_samples(bytes: &[u8], sample_bytes: usize, byte_order: ByteOrder, out: &mut Vec<u64>) {
    for chunk in bytes.chunks_exact(sample_bytes) {
        let value = match sample_bytes {
            1 => chunk[0] as u64,
            2 => byte_order.read_u16(chunk) as u64,
            _ => byte_order.read_u32(chunk) as u64,
        };
        out.push(value);
    }
}
