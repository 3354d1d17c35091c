//! TIFF tag and field type definitions.
//!
//! `.flim` files only use a small, fixed set of baseline TIFF tags: image
//! geometry, strip layout and the ImageDescription text that carries the
//! FLIMage parameters. Anything outside [`TiffTag`] is skipped while
//! decoding a directory.

use serde::Serialize;

// =============================================================================
// TIFF Field Types
// =============================================================================

/// TIFF field types that determine how values are encoded.
///
/// Each field type has a specific size in bytes, which decides whether a
/// value fits inline in a directory entry and how arrays are strided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer (1 byte)
    Byte = 1,

    /// 8-bit ASCII character (1 byte)
    Ascii = 2,

    /// Unsigned 16-bit integer (2 bytes)
    Short = 3,

    /// Unsigned 32-bit integer (4 bytes)
    Long = 4,

    /// Two u32 values, numerator then denominator (8 bytes)
    Rational = 5,

    /// Undefined byte data (1 byte per element)
    Undefined = 7,

    /// Unsigned 64-bit integer (8 bytes) - BigTIFF only
    Long8 = 16,
}

impl FieldType {
    /// Size of a single value of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::Undefined => 1,
            FieldType::Short => 2,
            FieldType::Long => 4,
            FieldType::Rational | FieldType::Long8 => 8,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for unsupported or unknown type values.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Rational),
            7 => Some(FieldType::Undefined),
            16 => Some(FieldType::Long8),
            _ => None,
        }
    }

    /// Whether `count` values of this type fit in the entry's value field.
    ///
    /// The value/offset field is 4 bytes in classic TIFF and 8 in BigTIFF.
    #[inline]
    pub fn fits_inline(self, count: u64, is_bigtiff: bool) -> bool {
        let threshold = if is_bigtiff { 8 } else { 4 };
        (self.size_in_bytes() as u64).saturating_mul(count) <= threshold
    }
}

// =============================================================================
// TIFF Tags
// =============================================================================

/// The fixed table of container tags recognized in `.flim` files.
///
/// Every recognized tag is copied verbatim into the per-frame attributes,
/// under its [`name`](TiffTag::name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u16)]
pub enum TiffTag {
    ImageWidth = 256,
    ImageLength = 257,
    BitsPerSample = 258,
    Compression = 259,
    PhotometricInterpretation = 262,
    FillOrder = 266,

    /// Description string; the FLIMage key/value text lives here
    ImageDescription = 270,

    StripOffsets = 273,
    Orientation = 274,
    SamplesPerPixel = 277,
    RowsPerStrip = 278,
    StripByteCounts = 279,
    XResolution = 282,
    YResolution = 283,
    PlanarConfiguration = 284,
    ResolutionUnit = 296,
}

impl TiffTag {
    /// Every recognized tag, in ascending id order.
    pub const ALL: [TiffTag; 16] = [
        TiffTag::ImageWidth,
        TiffTag::ImageLength,
        TiffTag::BitsPerSample,
        TiffTag::Compression,
        TiffTag::PhotometricInterpretation,
        TiffTag::FillOrder,
        TiffTag::ImageDescription,
        TiffTag::StripOffsets,
        TiffTag::Orientation,
        TiffTag::SamplesPerPixel,
        TiffTag::RowsPerStrip,
        TiffTag::StripByteCounts,
        TiffTag::XResolution,
        TiffTag::YResolution,
        TiffTag::PlanarConfiguration,
        TiffTag::ResolutionUnit,
    ];

    /// Create a TiffTag from its numeric value.
    ///
    /// Returns `None` for unrecognized tags, which are not an error.
    pub fn from_u16(value: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|tag| tag.as_u16() == value)
    }

    /// Get the numeric tag ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Semantic name of the tag.
    pub const fn name(self) -> &'static str {
        match self {
            TiffTag::ImageWidth => "IMAGE_WIDTH",
            TiffTag::ImageLength => "IMAGE_LENGTH",
            TiffTag::BitsPerSample => "BITS_PER_SAMPLE",
            TiffTag::Compression => "COMPRESSION",
            TiffTag::PhotometricInterpretation => "PHOTOMETRIC",
            TiffTag::FillOrder => "FILLORDER",
            TiffTag::ImageDescription => "IMAGE_DESCRIPTION",
            TiffTag::StripOffsets => "STRIP_OFFSET",
            TiffTag::Orientation => "ORIENTATION",
            TiffTag::SamplesPerPixel => "SAMPLES_PER_PIXEL",
            TiffTag::RowsPerStrip => "ROWS_PER_STRIP",
            TiffTag::StripByteCounts => "STRIP_BYTE_COUNTS",
            TiffTag::XResolution => "XRESOLUTION",
            TiffTag::YResolution => "YRESOLUTION",
            TiffTag::PlanarConfiguration => "PLANAR_CONFIGURATION",
            TiffTag::ResolutionUnit => "RESOLUTION_UNIT",
        }
    }
}

/// Compression value for raw, uncompressed strips.
pub const COMPRESSION_NONE: u64 = 1;

// =============================================================================
// Tests
// =============================================================================
