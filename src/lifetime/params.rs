//! Mixture-of-exponentials lifetime model.

use serde::{Deserialize, Serialize};

use crate::error::FlimError;
use crate::units::{FlimUnits, UnitConverter};

/// One exponential component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Exp {
    /// Time constant
    pub tau: f64,
    /// Weight of this component in the mixture (unitless)
    pub frac: f64,
}

impl Exp {
    pub fn new(tau: f64, frac: f64) -> Self {
        Self { tau, frac }
    }
}

/// Gaussian instrument response function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Irf {
    /// Gaussian width
    pub sigma: f64,
    /// Arrival time of the excitation pulse
    pub t_offset: f64,
}

impl Irf {
    pub fn new(sigma: f64, t_offset: f64) -> Self {
        Self { sigma, t_offset }
    }
}

/// Fitted or assumed lifetime parameters for one color channel.
///
/// A value object: conversions build a new instance. Fractions are stored
/// as given and need not sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlimParams {
    exps: Vec<Exp>,
    irf: Irf,
    color_channel: usize,
    units: FlimUnits,
}

impl FlimParams {
    pub fn new(exps: Vec<Exp>, irf: Irf, color_channel: usize, units: FlimUnits) -> Self {
        Self {
            exps,
            irf,
            color_channel,
            units,
        }
    }

    /// Rebuild a model from the flat layout of [`param_vec`](Self::param_vec).
    pub fn from_param_vec(
        values: &[f64],
        ncomponents: usize,
        color_channel: usize,
        units: FlimUnits,
    ) -> Result<Self, FlimError> {
        let expected = 2 * ncomponents + 2;
        if values.len() != expected {
            return Err(FlimError::ShapeMismatch {
                expected,
                actual: values.len(),
            });
        }
        let (components, irf) = values.split_at(2 * ncomponents);
        let exps = components
            .chunks_exact(2)
            .map(|pair| Exp::new(pair[0], pair[1]))
            .collect();

        Ok(Self::new(exps, Irf::new(irf[0], irf[1]), color_channel, units))
    }

    pub fn exps(&self) -> &[Exp] {
        &self.exps
    }

    pub fn irf(&self) -> Irf {
        self.irf
    }

    pub fn color_channel(&self) -> usize {
        self.color_channel
    }

    pub fn units(&self) -> FlimUnits {
        self.units
    }

    pub fn ncomponents(&self) -> usize {
        self.exps.len()
    }

    pub fn fraction_sum(&self) -> f64 {
        self.exps.iter().map(|e| e.frac).sum()
    }

    /// `[tau_0, frac_0, tau_1, frac_1, ..., sigma, t_offset]`, the layout a
    /// numeric solver works on.
    pub fn param_vec(&self) -> Vec<f64> {
        self.exps
            .iter()
            .flat_map(|e| [e.tau, e.frac])
            .chain([self.irf.sigma, self.irf.t_offset])
            .collect()
    }

    /// The same model with every time-valued field expressed in `to`.
    ///
    /// Time constants, IRF width and offset are rescaled; fractions are
    /// unitless and kept.
    pub fn convert_units(&self, to: FlimUnits, converter: &UnitConverter) -> Result<Self, FlimError> {
        let from = self.units;
        let exps = self
            .exps
            .iter()
            .map(|e| Ok(Exp::new(converter.convert(e.tau, from, to)?, e.frac)))
            .collect::<Result<Vec<_>, FlimError>>()?;
        let irf = Irf::new(
            converter.convert(self.irf.sigma, from, to)?,
            converter.convert(self.irf.t_offset, from, to)?,
        );

        Ok(Self::new(exps, irf, self.color_channel, to))
    }
}
