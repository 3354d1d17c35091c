//! Time units for arrival-time quantities.
//!
//! Every time-bearing number in the crate travels with a [`FlimUnits`] tag,
//! and [`UnitConverter::convert`] is the only way to reinterpret it. The
//! converter is built from an explicit [`TimeResolution`] (picoseconds per
//! arrival bin), so conversions never depend on what else is installed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FlimError;

/// Picoseconds in one nanosecond.
const PS_PER_NS: f64 = 1000.0;

// =============================================================================
// FlimUnits
// =============================================================================

/// The closed set of unit tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlimUnits {
    /// Not recorded; only convertible to itself
    Unknown,
    /// Index of a photon arrival-time bin
    ArrivalBins,
    Picoseconds,
    Nanoseconds,
    /// Marker for quantities that are not times (fractions, counts)
    Unitless,
}

impl FlimUnits {
    pub const fn name(self) -> &'static str {
        match self {
            FlimUnits::Unknown => "unknown",
            FlimUnits::ArrivalBins => "arrival_bins",
            FlimUnits::Picoseconds => "picoseconds",
            FlimUnits::Nanoseconds => "nanoseconds",
            FlimUnits::Unitless => "unitless",
        }
    }

    /// Whether this tag names an actual time scale.
    pub const fn is_time(self) -> bool {
        matches!(
            self,
            FlimUnits::ArrivalBins | FlimUnits::Picoseconds | FlimUnits::Nanoseconds
        )
    }
}

impl fmt::Display for FlimUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// TimeResolution
// =============================================================================

/// Source of the base arrival-bin width in picoseconds.
///
/// Implemented by the instrument presets, by the reader configuration, and
/// by plain `f64` for callers that know the number.
pub trait TimeResolution {
    fn picoseconds_per_bin(&self) -> f64;
}

impl TimeResolution for f64 {
    fn picoseconds_per_bin(&self) -> f64 {
        *self
    }
}

// =============================================================================
// UnitConverter
// =============================================================================

/// Converts values between unit tags using one fixed bin width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitConverter {
    picoseconds_per_bin: f64,
}

impl UnitConverter {
    pub fn new(resolution: &impl TimeResolution) -> Self {
        Self {
            picoseconds_per_bin: resolution.picoseconds_per_bin(),
        }
    }

    pub fn picoseconds_per_bin(&self) -> f64 {
        self.picoseconds_per_bin
    }

    /// Picoseconds represented by one unit of `units`.
    fn scale(&self, units: FlimUnits) -> Option<f64> {
        match units {
            FlimUnits::ArrivalBins => Some(self.picoseconds_per_bin),
            FlimUnits::Picoseconds => Some(1.0),
            FlimUnits::Nanoseconds => Some(PS_PER_NS),
            FlimUnits::Unknown | FlimUnits::Unitless => None,
        }
    }

    /// Convert `value` from `from` to `to`.
    ///
    /// `Unitless` values pass through untouched whatever `to` is. `Unknown`
    /// only converts to `Unknown`. Among the time units the result goes
    /// through picoseconds.
    pub fn convert(&self, value: f64, from: FlimUnits, to: FlimUnits) -> Result<f64, FlimError> {
        if from == FlimUnits::Unitless {
            return Ok(value);
        }
        if from == to {
            return Ok(value);
        }
        match (self.scale(from), self.scale(to)) {
            (Some(from_ps), Some(to_ps)) => Ok(value * from_ps / to_ps),
            _ => Err(FlimError::IncompatibleUnits { from, to }),
        }
    }

    /// Convert every value of `values`, failing before producing any output.
    pub fn convert_all(
        &self,
        values: &[f64],
        from: FlimUnits,
        to: FlimUnits,
    ) -> Result<Vec<f64>, FlimError> {
        // Validate the pair once so an empty slice still reports bad units.
        self.convert(0.0, from, to)?;
        values
            .iter()
            .map(|&value| self.convert(value, from, to))
            .collect()
    }
}
