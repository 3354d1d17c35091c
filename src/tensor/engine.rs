//! Batch tensor requests over a [`FrameSource`].

use std::collections::BTreeMap;

use ndarray::{Array1, Array4, Array5, Array6, Axis};
use tracing::debug;

use crate::error::FlimError;
use crate::format::FrameSource;
use crate::meta::AcquisitionSummary;

use super::reshape::{channel_histogram, intensity, reshape_frame};

/// Builds intensity, histogram and full tensors from raw frame buffers.
///
/// Frame indices are zero-based over the data directories; the header
/// directory is never read as image data. A batch request checks every
/// index before any buffer is read, then reads each distinct frame once in
/// directory order.
pub struct TensorEngine<'a, S: FrameSource> {
    source: &'a S,
    summary: &'a AcquisitionSummary,
}

impl<'a, S: FrameSource> TensorEngine<'a, S> {
    pub fn new(source: &'a S, summary: &'a AcquisitionSummary) -> Self {
        Self { source, summary }
    }

    /// Number of data frames (directories after the header).
    pub fn num_frames(&self) -> usize {
        self.source.entries().len().saturating_sub(1)
    }

    fn check_index(&self, index: usize) -> Result<(), FlimError> {
        let len = self.num_frames();
        if index >= len {
            return Err(FlimError::IndexOutOfRange { index, len });
        }
        Ok(())
    }

    /// Read and reshape one frame.
    pub fn frame(&self, index: usize) -> Result<Array5<u64>, FlimError> {
        self.check_index(index)?;
        let buffer = self.source.read_buffer(index + 1)?;
        reshape_frame(buffer, self.summary.tensor_shape())
    }

    /// Visit each distinct frame of `indices` once, in ascending order,
    /// together with the request positions that name it.
    fn for_each_frame<F>(&self, indices: &[usize], mut visit: F) -> Result<(), FlimError>
    where
        F: FnMut(Array5<u64>, &[usize]),
    {
        let mut positions: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (position, &index) in indices.iter().enumerate() {
            self.check_index(index)?;
            positions.entry(index).or_default().push(position);
        }

        debug!(
            source = %self.source.identifier(),
            requested = indices.len(),
            distinct = positions.len(),
            "Reading frame batch"
        );

        for (&index, at) in &positions {
            let frame = self.frame(index)?;
            visit(frame, at);
        }
        Ok(())
    }

    /// Frames of `indices` stacked along a new leading axis, in request order.
    ///
    /// An empty request yields a tensor with a zero-length leading axis.
    pub fn full(&self, indices: &[usize]) -> Result<Array6<u64>, FlimError> {
        let [slices, channels, rows, cols, bins] = self.summary.tensor_shape();
        let mut out: Option<Array6<u64>> = None;

        self.for_each_frame(indices, |frame, positions| {
            // Allocated only once a buffer has matched the frame shape.
            let out = out.get_or_insert_with(|| {
                Array6::zeros([indices.len(), slices, channels, rows, cols, bins])
            });
            for &position in positions {
                out.index_axis_mut(Axis(0), position).assign(&frame);
            }
        })?;
        Ok(out.unwrap_or_else(|| Array6::zeros([0, slices, channels, rows, cols, bins])))
    }

    /// Intensity of one frame, `(slices, channels, rows, cols)`.
    pub fn intensity_frame(&self, index: usize) -> Result<Array4<u64>, FlimError> {
        Ok(intensity(self.frame(index)?.view()))
    }

    /// Intensities of `indices` stacked along a new leading axis.
    pub fn intensity(&self, indices: &[usize]) -> Result<Array5<u64>, FlimError> {
        let [slices, channels, rows, cols, _] = self.summary.tensor_shape();
        let mut out: Option<Array5<u64>> = None;

        self.for_each_frame(indices, |frame, positions| {
            let counts = intensity(frame.view());
            let out = out
                .get_or_insert_with(|| Array5::zeros([indices.len(), slices, channels, rows, cols]));
            for &position in positions {
                out.index_axis_mut(Axis(0), position).assign(&counts);
            }
        })?;
        Ok(out.unwrap_or_else(|| Array5::zeros([0, slices, channels, rows, cols])))
    }

    /// Histogram of `channel`, summed over every frame in `indices`.
    ///
    /// A frame listed twice counts twice. An empty request yields zeros.
    pub fn histogram(&self, indices: &[usize], channel: usize) -> Result<Array1<u64>, FlimError> {
        self.summary.check_channel(channel)?;
        let mut total = Array1::zeros(self.summary.bins);

        self.for_each_frame(indices, |frame, positions| {
            let times = positions.len() as u64;
            let hist = channel_histogram(frame.view(), channel);
            total.zip_mut_with(&hist, |t, &h| *t += h * times);
        })?;
        Ok(total)
    }
}
