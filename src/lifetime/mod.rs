//! Lifetime parameter model and its fit statistics.
//!
//! A [`FlimParams`] describes an arrival-time histogram as a weighted sum of
//! exponentials convolved with a Gaussian IRF. The scoring functions here are
//! objective functions only; fitting is left to the caller.

mod exponentials;
mod params;

pub use exponentials::{monoexponential_probability, PhotonCount};
pub use params::{Exp, FlimParams, Irf};
