//! Tensor reconstruction from raw frame buffers.
//!
//! - [`reshape_frame`] turns one flat buffer into a
//!   `(slices, channels, rows, cols, bins)` array
//! - [`intensity`] and [`channel_histogram`] reduce one frame
//! - [`TensorEngine`] serves batch requests against a
//!   [`FrameSource`](crate::format::FrameSource)

mod engine;
mod reshape;

pub use engine::TensorEngine;
pub use reshape::{channel_histogram, intensity, reshape_frame, BIN_AXIS, CHANNEL_AXIS, SLICE_AXIS};
