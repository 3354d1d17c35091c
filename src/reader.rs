//! The `.flim` reader facade.
//!
//! [`FlimReader`] owns a [`FrameSource`] together with everything derived
//! from its header: the parameter groups and the acquisition summary. Both
//! are computed once on open; frames are read on demand and never cached.
//!
//! ```rust,no_run
//! use flim_reader::{FlimReader, FlimUnits, ReaderConfig};
//!
//! # fn main() -> Result<(), flim_reader::FlimError> {
//! let reader = FlimReader::open("session_001.flim", &ReaderConfig::default())?;
//! let frames = reader.all_frames();
//! let histogram = reader.get_histogram(&frames, 0)?;
//! let axis = reader.histogram_time_axis(FlimUnits::Nanoseconds, 0)?;
//! println!("{} bins spanning {:?} ns", histogram.len(), axis.last());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use ndarray::{Array1, Array4, Array5, Array6};
use tracing::info;

use crate::config::ReaderConfig;
use crate::error::FlimError;
use crate::format::{check_extension, FrameSource, TiffFrameSource};
use crate::io::FileRangeReader;
use crate::lifetime::FlimParams;
use crate::meta::{AcquisitionSummary, FlimParameters, FrameInfo};
use crate::tensor::TensorEngine;
use crate::units::{FlimUnits, UnitConverter};

/// Reader over a file on local disk.
pub type FlimFileReader = FlimReader<TiffFrameSource<FileRangeReader>>;

/// Decoded header plus on-demand access to the frames of one file.
pub struct FlimReader<S: FrameSource> {
    source: S,
    parameters: FlimParameters,
    summary: AcquisitionSummary,
    config: ReaderConfig,
}

impl FlimReader<TiffFrameSource<FileRangeReader>> {
    /// Open a `.flim` file.
    ///
    /// The extension is checked before the file is touched. Header errors
    /// abort the open.
    pub fn open(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<Self, FlimError> {
        let path = path.as_ref();
        config.validate().map_err(FlimError::InvalidConfig)?;
        check_extension(path)?;

        let reader = FileRangeReader::open(path)?;
        let source = TiffFrameSource::new(reader, config.max_directories)?;
        Self::from_source(source, config)
    }
}

impl<S: FrameSource> FlimReader<S> {
    /// Build a reader over an already decoded container.
    pub fn from_source(source: S, config: &ReaderConfig) -> Result<Self, FlimError> {
        config.validate().map_err(FlimError::InvalidConfig)?;

        let header = source
            .entries()
            .first()
            .ok_or_else(|| FlimError::MalformedHeader {
                reason: "file has no directories".to_string(),
            })?;
        let parameters = FlimParameters::parse(header.description())?;
        let summary =
            AcquisitionSummary::from_groups(&parameters.acquisition, &parameters.photon_counting)?;

        let reader = Self {
            source,
            parameters,
            summary,
            config: config.clone(),
        };

        info!(
            source = %reader.source.identifier(),
            frames = reader.num_frames(),
            shape = ?reader.summary.tensor_shape(),
            skipped_fields = reader.parameters.warnings().len(),
            "Opened FLIM file"
        );
        Ok(reader)
    }

    fn engine(&self) -> TensorEngine<'_, S> {
        TensorEngine::new(&self.source, &self.summary)
    }

    /// Number of data frames, excluding the header directory.
    pub fn num_frames(&self) -> usize {
        self.engine().num_frames()
    }

    /// Every frame index, in order.
    pub fn all_frames(&self) -> Vec<usize> {
        (0..self.num_frames()).collect()
    }

    pub fn info(&self) -> &AcquisitionSummary {
        &self.summary
    }

    pub fn parameters(&self) -> &FlimParameters {
        &self.parameters
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Converter for this reader's configured bin width.
    pub fn unit_converter(&self) -> UnitConverter {
        self.config.unit_converter()
    }

    // -------------------------------------------------------------------------
    // Tensors
    // -------------------------------------------------------------------------

    /// `(frames, slices, channels, rows, cols)` photon counts.
    pub fn get_intensity(&self, frames: &[usize]) -> Result<Array5<u64>, FlimError> {
        self.engine().intensity(frames)
    }

    /// `(slices, channels, rows, cols)` photon counts of one frame.
    pub fn get_intensity_frame(&self, frame: usize) -> Result<Array4<u64>, FlimError> {
        self.engine().intensity_frame(frame)
    }

    /// Arrival-time histogram of `channel`, pooled over `frames`.
    pub fn get_histogram(&self, frames: &[usize], channel: usize) -> Result<Array1<u64>, FlimError> {
        self.engine().histogram(frames, channel)
    }

    /// `(frames, slices, channels, rows, cols, bins)` photon counts.
    pub fn get_flim_array(&self, frames: &[usize]) -> Result<Array6<u64>, FlimError> {
        self.engine().full(frames)
    }

    /// `(slices, channels, rows, cols, bins)` photon counts of one frame.
    pub fn get_flim_frame(&self, frame: usize) -> Result<Array5<u64>, FlimError> {
        self.engine().frame(frame)
    }

    /// Arrival time of each histogram bin of `channel`.
    pub fn histogram_time_axis(
        &self,
        units: FlimUnits,
        channel: usize,
    ) -> Result<Vec<f64>, FlimError> {
        self.summary.histogram_time_axis(units, channel)
    }

    // -------------------------------------------------------------------------
    // Frame metadata
    // -------------------------------------------------------------------------

    fn check_frame(&self, frame: usize) -> Result<(), FlimError> {
        let len = self.num_frames();
        if frame >= len {
            return Err(FlimError::IndexOutOfRange { index: frame, len });
        }
        Ok(())
    }

    pub fn frame_info(&self, frame: usize) -> Result<FrameInfo, FlimError> {
        self.check_frame(frame)?;
        Ok(FrameInfo::from_entry(&self.source.entries()[frame + 1], frame))
    }

    /// Attributes of each frame in `frames`, in request order.
    pub fn get_metadata(&self, frames: &[usize]) -> Result<Vec<FrameInfo>, FlimError> {
        for &frame in frames {
            self.check_frame(frame)?;
        }
        frames.iter().map(|&frame| self.frame_info(frame)).collect()
    }

    /// Acquisition timestamp of each frame in `frames`.
    pub fn get_datetime(&self, frames: &[usize]) -> Result<Vec<NaiveDateTime>, FlimError> {
        self.get_metadata(frames)?
            .iter()
            .map(FrameInfo::acquisition_time)
            .collect()
    }

    /// Seconds from `zero` to the acquisition of each frame in `frames`.
    ///
    /// Without `zero`, the first requested frame is time zero.
    pub fn get_time(
        &self,
        frames: &[usize],
        zero: Option<NaiveDateTime>,
    ) -> Result<Vec<f64>, FlimError> {
        let times = self.get_datetime(frames)?;
        let Some(zero) = zero.or_else(|| times.first().copied()) else {
            return Ok(Vec::new());
        };

        Ok(times.iter().map(|&time| seconds_elapsed(time - zero)).collect())
    }

    // -------------------------------------------------------------------------
    // Scoring
    // -------------------------------------------------------------------------

    /// Chi-squared of `params` against the pooled histogram of its channel.
    pub fn chi_squared(&self, params: &FlimParams, frames: &[usize]) -> Result<f64, FlimError> {
        let histogram = self.get_histogram(frames, params.color_channel())?;
        params.chi_squared(&histogram, self.config.cut_negative)
    }

    /// Log-likelihood of `params` against the pooled histogram of its channel.
    pub fn log_likelihood(&self, params: &FlimParams, frames: &[usize]) -> Result<f64, FlimError> {
        let histogram = self.get_histogram(frames, params.color_channel())?;
        params.log_likelihood(&histogram, self.config.cut_negative)
    }
}

impl<S: FrameSource> fmt::Debug for FlimReader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlimReader")
            .field("source", &self.source.identifier())
            .field("frames", &self.num_frames())
            .field("summary", &self.summary)
            .finish()
    }
}

/// Microsecond precision, falling back to milliseconds for spans past
/// about 292 thousand years.
fn seconds_elapsed(delta: Duration) -> f64 {
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}
