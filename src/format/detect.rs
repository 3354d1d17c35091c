//! The path check that runs before any bytes are read.

use std::path::Path;

use crate::error::FlimError;

/// The only file extension this crate opens.
pub const FLIM_EXTENSION: &str = "flim";

/// Fail with `UnsupportedFileType` unless `path` ends in `.flim`.
///
/// The comparison is exact, matching how acquisition software names files.
pub fn check_extension(path: &Path) -> Result<(), FlimError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(FLIM_EXTENSION) => Ok(()),
        other => Err(FlimError::UnsupportedFileType {
            extension: other.map(|ext| format!(".{}", ext)).unwrap_or_default(),
        }),
    }
}
