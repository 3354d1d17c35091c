//! TIFF container decoding for `.flim` files.
//!
//! # Key Concepts
//!
//! - **Byte order**: declared in the header (II = little-endian, MM = big-endian)
//!   and applied to every multi-byte value in the file.
//!
//! - **Classic TIFF vs BigTIFF**: 32-bit vs 64-bit offsets. Both are handled.
//!
//! - **IFD (Image File Directory)**: one per stored buffer. In a `.flim` file
//!   the first directory holds session metadata, each later one a frame.
//!
//! - **Strips**: frame samples are stored uncompressed in one or more strips,
//!   located by the StripOffsets and StripByteCounts tags.

mod directory;
mod parser;
mod tags;
mod values;

pub use directory::{TiffFile, DEFAULT_MAX_DIRECTORIES};
pub use parser::{ByteOrder, Ifd, IfdEntry, TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE};
pub use tags::{FieldType, TiffTag, COMPRESSION_NONE};
pub use values::{parse_u64_array, TagValue, ValueReader};
