use bytes::Bytes;

use crate::error::IoError;

/// Trait for reading byte ranges from a `.flim` file.
///
/// The TIFF decoder only ever asks for the header, one directory at a time,
/// and the strips of the frames a caller requested, so implementations never
/// need to hold the whole file. Reads are synchronous and take `&self`;
/// implementations must be safe to share between threads.
pub trait RangeReader: Send + Sync {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Returns an error if the range is out of bounds or if the read fails.
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError>;

    /// Get the total size of the resource in bytes.
    fn size(&self) -> u64;

    /// Get a unique identifier for this resource (for logging).
    fn identifier(&self) -> &str;
}

/// Reject ranges that run past the end of a resource of `size` bytes.
pub(crate) fn check_range(offset: u64, len: usize, size: u64) -> Result<(), IoError> {
    let end = offset.checked_add(len as u64);
    match end {
        Some(end) if end <= size => Ok(()),
        _ => Err(IoError::RangeOutOfBounds {
            offset,
            requested: len as u64,
            size,
        }),
    }
}

// =============================================================================
// Endian Helpers
// =============================================================================

macro_rules! endian_readers {
    ($($ty:ty: $le:ident, $be:ident;)*) => {
        $(
            #[doc = concat!("Read a little-endian `", stringify!($ty), "` from the start of `bytes`.")]
            ///
            /// # Panics
            /// Panics if `bytes` is shorter than the integer.
            #[inline]
            pub fn $le(bytes: &[u8]) -> $ty {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
                <$ty>::from_le_bytes(buf)
            }

            #[doc = concat!("Read a big-endian `", stringify!($ty), "` from the start of `bytes`.")]
            ///
            /// # Panics
            /// Panics if `bytes` is shorter than the integer.
            #[inline]
            pub fn $be(bytes: &[u8]) -> $ty {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
                <$ty>::from_be_bytes(buf)
            }
        )*
    };
}

endian_readers! {
    u16: read_u16_le, read_u16_be;
    u32: read_u32_le, read_u32_be;
    u64: read_u64_le, read_u64_be;
}
