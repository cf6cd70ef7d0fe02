//! Ensemble perturbations for initial conditions
//!
//! This module generates the perturbations added to an initial state to
//! spin up ensemble members.
//!
//! # Organization
//!
//! - [`noise`]: Gaussian and spectrally reddened noise
//! - [`bred`]: bred vectors grown with a forecast model
//! - [`strategy`]: configuration that picks one of the above and applies it

pub mod bred;
pub mod noise;
pub mod strategy;

pub use bred::{generate_bred_vector, BredVectorConfig, TimeStepper};
pub use noise::{brown_noise, fftfreq, generate_noise_correlated, generate_noise_gaussian};
pub use strategy::{Perturbation, PerturbationStrategy};

use ndarray::Array5;

/// Forecast state laid out as `[ensemble, time, channel, lat, lon]`
pub type EnsembleState = Array5<f32>;
