//! Configuration for opening `.flim` files.
//!
//! [`ReaderConfig`] derives `clap::Args`, so a command-line front end can
//! flatten it into its own parser, and serde, so it can live in a settings
//! file. Every option also reads a `FLIM_`-prefixed environment variable.
//!
//! # Environment Variables
//!
//! - `FLIM_INSTRUMENT` - Timing hardware preset: `multiharp` or `timeharp` (default: timeharp)
//! - `FLIM_BASE_RESOLUTION_PS` - Explicit picoseconds per arrival bin, overrides the preset
//! - `FLIM_CUT_NEGATIVE` - Zero model probabilities at or before the IRF offset (default: true)
//! - `FLIM_MAX_DIRECTORIES` - Cap on directories followed in one file

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::format::tiff::DEFAULT_MAX_DIRECTORIES;
use crate::units::{TimeResolution, UnitConverter};

// =============================================================================
// Default Values
// =============================================================================

/// Base timing resolution of a MultiHarp, in picoseconds.
pub const MULTIHARP_BASE_RESOLUTION_PS: f64 = 5.0;

/// MultiHarp acquisitions bin four base steps into one arrival bin.
pub const MULTIHARP_BINNING: f64 = 4.0;

/// Base timing resolution of a TimeHarp, in picoseconds.
pub const TIMEHARP_BASE_RESOLUTION_PS: f64 = 200.0;

// =============================================================================
// Instrument
// =============================================================================

/// Photon-timing hardware that recorded the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    /// MultiHarp: 4 x 5 ps per arrival bin
    Multiharp,
    /// TimeHarp: 200 ps per arrival bin
    #[default]
    Timeharp,
}

impl TimeResolution for Instrument {
    fn picoseconds_per_bin(&self) -> f64 {
        match self {
            Instrument::Multiharp => MULTIHARP_BINNING * MULTIHARP_BASE_RESOLUTION_PS,
            Instrument::Timeharp => TIMEHARP_BASE_RESOLUTION_PS,
        }
    }
}

// =============================================================================
// ReaderConfig
// =============================================================================

/// Options that shape how a `.flim` file is read and interpreted.
#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Timing hardware preset used to convert arrival bins to time.
    #[arg(long, value_enum, default_value_t = Instrument::Timeharp, env = "FLIM_INSTRUMENT")]
    #[serde(default)]
    pub instrument: Instrument,

    /// Picoseconds per arrival bin; overrides the instrument preset.
    #[arg(long, env = "FLIM_BASE_RESOLUTION_PS")]
    #[serde(default)]
    pub base_resolution_ps: Option<f64>,

    /// Zero model probabilities at or before the IRF offset.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, env = "FLIM_CUT_NEGATIVE")]
    #[serde(default = "default_cut_negative")]
    pub cut_negative: bool,

    /// Maximum number of TIFF directories followed in one file.
    #[arg(long, default_value_t = DEFAULT_MAX_DIRECTORIES, env = "FLIM_MAX_DIRECTORIES")]
    #[serde(default = "default_max_directories")]
    pub max_directories: usize,
}

fn default_cut_negative() -> bool {
    true
}

fn default_max_directories() -> usize {
    DEFAULT_MAX_DIRECTORIES
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            instrument: Instrument::default(),
            base_resolution_ps: None,
            cut_negative: default_cut_negative(),
            max_directories: default_max_directories(),
        }
    }
}

impl ReaderConfig {
    /// Configuration for a given instrument, other options at their defaults.
    pub fn for_instrument(instrument: Instrument) -> Self {
        Self {
            instrument,
            ..Self::default()
        }
    }

    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(resolution) = self.base_resolution_ps {
            if !resolution.is_finite() || resolution <= 0.0 {
                return Err(format!(
                    "base_resolution_ps must be a positive number, got {}",
                    resolution
                ));
            }
        }

        if self.max_directories == 0 {
            return Err("max_directories must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Converter using this configuration's bin width.
    pub fn unit_converter(&self) -> UnitConverter {
        UnitConverter::new(self)
    }
}

impl TimeResolution for ReaderConfig {
    fn picoseconds_per_bin(&self) -> f64 {
        self.base_resolution_ps
            .unwrap_or_else(|| self.instrument.picoseconds_per_bin())
    }
}

// =============================================================================
// Tests
// =============================================================================
