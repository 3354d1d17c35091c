//! Container access for `.flim` files.
//!
//! A `.flim` file is a baseline TIFF: [`tiff`] decodes headers, directories
//! and strips, [`source`] exposes the decoded directories through the
//! [`FrameSource`] trait, and [`detect`] holds the checks run before parsing.

pub mod detect;
pub mod source;
pub mod tiff;

pub use detect::{check_extension, FLIM_EXTENSION};
pub use source::{DirectoryEntry, FrameSource, MemoryFrameSource, TiffFrameSource};
