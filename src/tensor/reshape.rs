//! Reshape and reductions over one raw frame buffer.
//!
//! A frame is row-major over `(slices, channels, rows, cols, bins)`. All
//! reductions are exact integer sums.

use ndarray::{Array1, Array4, Array5, ArrayView5, Axis};

use crate::error::FlimError;

/// Axis positions in a reshaped frame.
pub const SLICE_AXIS: Axis = Axis(0);
pub const CHANNEL_AXIS: Axis = Axis(1);
pub const BIN_AXIS: Axis = Axis(4);

/// Reshape a flat buffer to `shape`.
///
/// Fails with `ShapeMismatch` unless the buffer holds exactly the product
/// of `shape` elements.
pub fn reshape_frame(buffer: Vec<u64>, shape: [usize; 5]) -> Result<Array5<u64>, FlimError> {
    let expected = shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .unwrap_or(usize::MAX);
    let actual = buffer.len();
    if actual != expected {
        return Err(FlimError::ShapeMismatch { expected, actual });
    }
    Array5::from_shape_vec(shape, buffer)
        .map_err(|_| FlimError::ShapeMismatch { expected, actual })
}

/// Photon counts per pixel: the frame summed over arrival time.
pub fn intensity(frame: ArrayView5<'_, u64>) -> Array4<u64> {
    frame.sum_axis(BIN_AXIS)
}

/// Arrival-time histogram of one channel, summed over slices, rows and cols.
///
/// The caller checks `channel` against the frame's channel count.
pub fn channel_histogram(frame: ArrayView5<'_, u64>, channel: usize) -> Array1<u64> {
    // (slices, rows, cols, bins) after selecting the channel
    let selected = frame.index_axis_move(CHANNEL_AXIS, channel);
    selected
        .sum_axis(SLICE_AXIS)
        .sum_axis(Axis(0))
        .sum_axis(Axis(0))
}
