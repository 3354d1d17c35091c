//! # FLIM Reader
//!
//! A reader for `.flim` fluorescence-lifetime imaging files and the lifetime
//! model used to score their photon-arrival histograms.
//!
//! A `.flim` file is a TIFF container. The first directory carries the
//! session header as `key = value;` lines; every later directory holds one
//! frame of photon counts laid out as `(slices, channels, rows, cols, bins)`.
//!
//! ## Architecture
//!
//! - [`io`] - Synchronous byte-range readers over files and memory
//! - [`mod@format`] - TIFF container decoding and the [`FrameSource`] seam
//! - [`meta`] - Header parameter groups, frame attributes, acquisition summary
//! - [`tensor`] - Reshape and reductions into intensity, histogram and full tensors
//! - [`units`] - Time unit tags and conversion
//! - [`lifetime`] - Exponential mixture model, chi-squared and log-likelihood
//! - [`reader`] - The [`FlimReader`] facade tying the above together
//! - [`config`] - Reader options (clap + serde)
//!
//! The crate does not install a `tracing` subscriber.

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod lifetime;
pub mod meta;
pub mod reader;
pub mod tensor;
pub mod units;

// Re-export commonly used types
pub use config::{Instrument, ReaderConfig};
pub use error::{FlimError, IoError, TiffError};
pub use format::tiff::{TagValue, TiffTag};
pub use format::{check_extension, DirectoryEntry, FrameSource, MemoryFrameSource, TiffFrameSource};
pub use io::{FileRangeReader, MemoryRangeReader, RangeReader};
pub use lifetime::{monoexponential_probability, Exp, FlimParams, Irf};
pub use meta::{AcquisitionSummary, FlimParameters, FrameInfo, GroupKind, ParamValue, ParameterGroup};
pub use reader::{FlimFileReader, FlimReader};
pub use tensor::TensorEngine;
pub use units::{FlimUnits, TimeResolution, UnitConverter};
