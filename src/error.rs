use thiserror::Error;

use crate::units::FlimUnits;

/// I/O errors that can occur when reading byte ranges from a file
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error from the local filesystem
    #[error("File error: {0}")]
    File(String),

    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// File not found
    #[error("File not found: {0}")]
    NotFound(String),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => IoError::NotFound(err.to_string()),
            _ => IoError::File(err.to_string()),
        }
    }
}

/// Errors that can occur when decoding the TIFF container
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("Invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// The next-IFD chain points back to an already visited directory
    #[error("IFD chain loops back to offset {0}")]
    IfdCycle(u64),

    /// Required tag is missing from IFD
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tag has unexpected type or count
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },

    /// Frame data is compressed; only raw strips are decoded
    #[error("Unsupported compression: {0} (only uncompressed strips are supported)")]
    UnsupportedCompression(u16),

    /// Sample layout that cannot be widened to photon counts
    #[error("Unsupported sample format: {bits} bits per sample")]
    UnsupportedSampleFormat { bits: u16 },

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),
}

/// Errors raised while interpreting a `.flim` file and the lifetime model.
///
/// Header and metadata errors abort opening a file. Everything else is
/// scoped to the request that produced it.
#[derive(Debug, Clone, Error)]
pub enum FlimError {
    /// Container decoding failed
    #[error("TIFF error: {0}")]
    Tiff(#[from] TiffError),

    /// Byte-range read failed
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Reader configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Path does not carry the `.flim` extension
    #[error("Unsupported file type: expected a .flim file, got extension {extension:?}")]
    UnsupportedFileType { extension: String },

    /// Header description does not start with the format marker
    #[error("Malformed header: {reason}")]
    MalformedHeader { reason: String },

    /// A field's literal could not be parsed or has the wrong type
    #[error("Invalid value for field {field}: {message}")]
    InvalidFieldValue { field: String, message: String },

    /// A field needed to determine the tensor shape is unset
    #[error("Incomplete metadata: required field {field} is unset")]
    IncompleteMetadata { field: String },

    /// Raw buffer length does not match the acquisition shape
    #[error("Shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Frame index past the end of the data directories
    #[error("Frame index {index} out of range ({len} frames)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Color channel past the number of acquired channels
    #[error("Channel {channel} out of range ({channels} channels)")]
    ChannelOutOfRange { channel: usize, channels: usize },

    /// Frame has no acquisition timestamp attribute
    #[error("Frame {frame} has no Acquired_Time attribute")]
    MissingTimestamp { frame: usize },

    /// Acquisition timestamp does not match the fixed format
    #[error("Frame {frame} has malformed timestamp {value:?}: {message}")]
    MalformedTimestamp {
        frame: usize,
        value: String,
        message: String,
    },

    /// Conversion between unit tags that cannot be related
    #[error("Cannot convert from {from} to {to}")]
    IncompatibleUnits { from: FlimUnits, to: FlimUnits },
}
