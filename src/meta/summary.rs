//! Session-wide acquisition summary.

use serde::Serialize;

use crate::error::FlimError;
use crate::units::FlimUnits;

use super::params::{GroupKind, ParameterGroup};

/// Picoseconds in one nanosecond.
const PS_PER_NS: f64 = 1000.0;

/// Shape of every frame, derived once from the acquisition and
/// photon-counting groups.
///
/// Raw frame buffers are row-major over
/// `(slices, channels, rows, cols, bins)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcquisitionSummary {
    pub slices: usize,
    pub channels: usize,
    pub rows: usize,
    pub cols: usize,
    pub bins: usize,

    /// Picoseconds per arrival bin as recorded: one value for all channels
    /// or one per channel. Checked when a channel's resolution is asked for.
    pub resolution: Option<Vec<f64>>,

    shape: [usize; 5],
    volume_size: usize,
    frame_len: usize,
}

fn required<T>(group: &ParameterGroup, name: &str, value: Option<T>) -> Result<T, FlimError> {
    value.ok_or_else(|| FlimError::IncompleteMetadata {
        field: format!("{}{}", group.kind().prefix(), name),
    })
}

/// Element count of an array with `dims`, `None` past `isize::MAX`.
///
/// Zero-length axes are left out of the bound, as ndarray does.
fn checked_product(dims: &[usize]) -> Option<usize> {
    let nonzero = dims
        .iter()
        .filter(|&&dim| dim != 0)
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .filter(|&len| len <= isize::MAX as usize)?;
    Some(if dims.contains(&0) { 0 } else { nonzero })
}

impl AcquisitionSummary {
    /// Build the summary from the `State.Acq.` and `State.Spc.` groups.
    ///
    /// Fails with `InvalidFieldValue` when the frame size overflows `usize`.
    pub fn from_groups(
        acquisition: &ParameterGroup,
        photon_counting: &ParameterGroup,
    ) -> Result<Self, FlimError> {
        debug_assert_eq!(acquisition.kind(), GroupKind::Acquisition);
        debug_assert_eq!(photon_counting.kind(), GroupKind::PhotonCounting);

        let acq = acquisition;
        let spc = photon_counting;

        let z_stack = required(acq, "ZStack", acq.get_bool("ZStack")?)?;
        let slices = if z_stack {
            required(acq, "nSlices", acq.get_usize("nSlices")?)?
        } else {
            1
        };
        let channels = required(acq, "nChannels", acq.get_usize("nChannels")?)?;
        let rows = required(acq, "linesPerFrame", acq.get_usize("linesPerFrame")?)?;
        let cols = required(acq, "pixelsPerLine", acq.get_usize("pixelsPerLine")?)?;
        let bins = required(spc, "spcData.n_dataPoint", spc.get_usize("spcData.n_dataPoint")?)?;
        let resolution = spc.get_float_seq("spcData.resolution")?;

        let shape = [slices, channels, rows, cols, bins];
        let (volume_size, frame_len) =
            match (checked_product(&shape[..2]), checked_product(&shape)) {
                (Some(volume), Some(len)) => (volume, len),
                _ => {
                    return Err(FlimError::InvalidFieldValue {
                        field: format!("{}linesPerFrame", acq.kind().prefix()),
                        message: format!("frame shape {:?} overflows the address space", shape),
                    })
                }
            };

        Ok(Self {
            slices,
            channels,
            rows,
            cols,
            bins,
            resolution,
            shape,
            volume_size,
            frame_len,
        })
    }

    /// `(slices, channels, rows, cols, bins)`.
    pub fn tensor_shape(&self) -> [usize; 5] {
        self.shape
    }

    /// Slices times channels.
    pub fn volume_size(&self) -> usize {
        self.volume_size
    }

    /// Element count of one raw frame buffer.
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn check_channel(&self, channel: usize) -> Result<(), FlimError> {
        if channel >= self.channels {
            return Err(FlimError::ChannelOutOfRange {
                channel,
                channels: self.channels,
            });
        }
        Ok(())
    }

    /// Picoseconds per arrival bin on `channel`.
    ///
    /// Fails with `IncompleteMetadata` when the file records no resolution
    /// and with `InvalidFieldValue` when the recorded sequence has no entry
    /// for `channel`.
    pub fn channel_resolution(&self, channel: usize) -> Result<f64, FlimError> {
        self.check_channel(channel)?;
        let field = format!("{}spcData.resolution", GroupKind::PhotonCounting.prefix());
        let recorded = self
            .resolution
            .as_deref()
            .ok_or_else(|| FlimError::IncompleteMetadata {
                field: field.clone(),
            })?;
        match recorded {
            [single] => Ok(*single),
            per_channel => per_channel.get(channel).copied().ok_or_else(|| {
                FlimError::InvalidFieldValue {
                    field,
                    message: format!(
                        "expected one value or one per channel ({}), found {}",
                        self.channels,
                        per_channel.len()
                    ),
                }
            }),
        }
    }

    /// Arrival time of each histogram bin of `channel`, in `units`.
    ///
    /// Uses the channel's own recorded resolution.
    pub fn histogram_time_axis(
        &self,
        units: FlimUnits,
        channel: usize,
    ) -> Result<Vec<f64>, FlimError> {
        let resolution = self.channel_resolution(channel)?;
        let scale = match units {
            FlimUnits::ArrivalBins => 1.0,
            FlimUnits::Picoseconds => resolution,
            FlimUnits::Nanoseconds => resolution / PS_PER_NS,
            other => {
                return Err(FlimError::IncompatibleUnits {
                    from: FlimUnits::ArrivalBins,
                    to: other,
                })
            }
        };
        Ok((0..self.bins).map(|bin| bin as f64 * scale).collect())
    }
}
