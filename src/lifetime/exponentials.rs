//! Predicted arrival probabilities and goodness-of-fit scores.
//!
//! All functions work in arrival bins: bin `i` is evaluated at
//! `x = i - t_offset`.

use std::f64::consts::{PI, SQRT_2};

use ndarray::{Array1, ArrayBase, Data, Ix1};
use scilib::math::basic::erf;

use crate::error::FlimError;
use crate::units::FlimUnits;

use super::params::FlimParams;

/// Numeric photon counts that can be scored.
pub trait PhotonCount: Copy {
    fn as_f64(self) -> f64;
}

macro_rules! impl_photon_count {
    ($($t:ty),*) => {
        $(impl PhotonCount for $t {
            fn as_f64(self) -> f64 {
                self as f64
            }
        })*
    };
}

impl_photon_count!(u16, u32, u64, f32, f64);

/// At or below minus this value erf is -1 to double precision.
const ERF_SATURATION: f64 = 6.0;

/// From here on erfc comes from a continued fraction; `1 - erf` would
/// cancel to zero long before erfc underflows.
const ERFC_TAIL_FROM: f64 = 2.0;

/// Depth of the erfc continued fraction, enough for double precision at
/// `ERFC_TAIL_FROM`.
const ERFC_TAIL_TERMS: usize = 64;

/// Scaled tail `exp(z^2) * erfc(z)` for `z >= ERFC_TAIL_FROM`.
fn erfcx_tail(z: f64) -> f64 {
    let fraction = (1..=ERFC_TAIL_TERMS)
        .rev()
        .fold(0.0, |tail, n| (n as f64 / 2.0) / (z + tail));
    1.0 / (PI.sqrt() * (z + fraction))
}

fn erfc(x: f64) -> f64 {
    if x >= ERFC_TAIL_FROM {
        erfcx_tail(x) * (-x * x).exp()
    } else if x <= -ERF_SATURATION {
        2.0
    } else {
        (1.0 - erf(x)).max(0.0)
    }
}

/// Probability density of a Gaussian-convolved exponential at `x`.
///
/// `x` is measured from the IRF offset, `tau` is the decay constant and
/// `sigma` the IRF width, all in the same units. With `cut_negative`, every
/// `x <= 0` gives zero.
pub fn monoexponential_probability(x: f64, tau: f64, sigma: f64, cut_negative: bool) -> f64 {
    if cut_negative && x <= 0.0 {
        return 0.0;
    }
    let z = -(tau * x - sigma * sigma) / (SQRT_2 * sigma * tau);
    // exp(sigma^2 / 2tau^2) * exp(-x / tau), folded into one exponent
    let exponent = sigma * sigma / (2.0 * tau * tau) - x / tau;
    let density = if z >= ERFC_TAIL_FROM {
        // erfc(z) = erfcx(z) * exp(-z^2), folded into the exponent
        erfcx_tail(z) * (exponent - z * z).exp()
    } else {
        erfc(z) * exponent.exp()
    };
    let p = density / (2.0 * tau);
    if p.is_nan() {
        0.0
    } else {
        p
    }
}

fn require_arrival_bins(params: &FlimParams) -> Result<(), FlimError> {
    if params.units() != FlimUnits::ArrivalBins {
        return Err(FlimError::IncompatibleUnits {
            from: params.units(),
            to: FlimUnits::ArrivalBins,
        });
    }
    Ok(())
}

impl FlimParams {
    /// Fraction-weighted mixture probability of each of `n_bins` bins.
    ///
    /// Requires the model in arrival bins.
    pub fn predicted_probabilities(
        &self,
        n_bins: usize,
        cut_negative: bool,
    ) -> Result<Array1<f64>, FlimError> {
        require_arrival_bins(self)?;
        let irf = self.irf();
        Ok(Array1::from_shape_fn(n_bins, |bin| {
            let x = bin as f64 - irf.t_offset;
            self.exps()
                .iter()
                .map(|e| e.frac * monoexponential_probability(x, e.tau, irf.sigma, cut_negative))
                .sum::<f64>()
        }))
    }

    /// `sum((observed - N * p)^2 / p)` with `N` the total photon count.
    ///
    /// Bins where the term is not finite, such as bins the model gives zero
    /// probability, contribute nothing.
    pub fn chi_squared<S, C>(
        &self,
        observed: &ArrayBase<S, Ix1>,
        cut_negative: bool,
    ) -> Result<f64, FlimError>
    where
        S: Data<Elem = C>,
        C: PhotonCount,
    {
        let predicted = self.predicted_probabilities(observed.len(), cut_negative)?;
        let total: f64 = observed.iter().map(|&c| c.as_f64()).sum();

        Ok(observed
            .iter()
            .zip(predicted.iter())
            .map(|(&count, &p)| {
                let residual = count.as_f64() - total * p;
                residual * residual / p
            })
            .filter(|term| term.is_finite())
            .sum())
    }

    /// `sum(observed * ln(p))`, skipping bins with zero probability.
    pub fn log_likelihood<S, C>(
        &self,
        observed: &ArrayBase<S, Ix1>,
        cut_negative: bool,
    ) -> Result<f64, FlimError>
    where
        S: Data<Elem = C>,
        C: PhotonCount,
    {
        let predicted = self.predicted_probabilities(observed.len(), cut_negative)?;

        Ok(observed
            .iter()
            .zip(predicted.iter())
            .filter(|(_, &p)| p > 0.0)
            .map(|(&count, &p)| p.ln() * count.as_f64())
            .filter(|term| term.is_finite())
            .sum())
    }
}
