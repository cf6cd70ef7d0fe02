//! Perturbation strategies for ensemble initial conditions

use super::bred::{generate_bred_vector, BredVectorConfig, TimeStepper};
use super::noise::{generate_noise_correlated, generate_noise_gaussian};
use super::EnsembleState;
use crate::errors::{GridcastError, Result};
use chrono::NaiveDateTime;
use ndarray::{Axis, Ix5};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::str::FromStr;

/// How ensemble members are perturbed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerturbationStrategy {
    /// Every member starts from the unperturbed state
    None,
    /// Uncorrelated Gaussian noise
    Gaussian,
    /// Spatially correlated (reddened) noise
    Correlated,
    /// Bred vectors grown with the forecast model
    Bred,
}

impl PerturbationStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gaussian => "gaussian",
            Self::Correlated => "correlated",
            Self::Bred => "bred_vector",
        }
    }
}

impl fmt::Display for PerturbationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerturbationStrategy {
    type Err = GridcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "gaussian" => Ok(Self::Gaussian),
            "correlated" => Ok(Self::Correlated),
            "bred" | "bred_vector" => Ok(Self::Bred),
            other => Err(GridcastError::InvalidParameter(format!(
                "unknown perturbation strategy '{other}'"
            ))),
        }
    }
}

/// A configured perturbation, ready to apply to an initial state
#[derive(Debug, Clone, PartialEq)]
pub struct Perturbation {
    pub strategy: PerturbationStrategy,
    pub noise_amplitude: f32,
    /// Spectral slope of correlated noise
    pub reddening: f64,
    pub integration_steps: usize,
    pub inflate: bool,
    /// Leave member 0 unperturbed as the control forecast
    pub keep_control: bool,
    pub seed: Option<u64>,
    pub time: Option<NaiveDateTime>,
}

impl Default for Perturbation {
    fn default() -> Self {
        Self {
            strategy: PerturbationStrategy::Correlated,
            noise_amplitude: 0.05,
            reddening: 2.0,
            integration_steps: 40,
            inflate: false,
            keep_control: true,
            seed: None,
            time: None,
        }
    }
}

impl Perturbation {
    pub fn new(strategy: PerturbationStrategy, noise_amplitude: f32) -> Self {
        Self {
            strategy,
            noise_amplitude,
            ..Self::default()
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Generate the perturbation for `x` without modifying it
    ///
    /// `model` is only consulted by [`PerturbationStrategy::Bred`].
    pub fn generate(
        &self,
        x: &EnsembleState,
        model: Option<&dyn TimeStepper>,
    ) -> Result<EnsembleState> {
        let mut rng = self.rng();
        let shape = x.shape();

        let mut noise: EnsembleState = match self.strategy {
            PerturbationStrategy::None => EnsembleState::zeros(x.raw_dim()),
            PerturbationStrategy::Gaussian => {
                generate_noise_gaussian(shape, self.noise_amplitude, &mut rng)
                    .into_dimensionality::<Ix5>()?
            }
            PerturbationStrategy::Correlated => {
                generate_noise_correlated(shape, self.reddening, self.noise_amplitude, &mut rng)?
                    .into_dimensionality::<Ix5>()?
            }
            PerturbationStrategy::Bred => {
                let model = model.ok_or_else(|| {
                    GridcastError::InvalidParameter(
                        "bred vector perturbation requires a forecast model".to_string(),
                    )
                })?;
                let config = BredVectorConfig {
                    noise_amplitude: self.noise_amplitude,
                    time: self.time,
                    integration_steps: self.integration_steps,
                    inflate: self.inflate,
                };
                generate_bred_vector(x, model, &config, &mut rng)?
            }
        };

        if self.keep_control && noise.len_of(Axis(0)) > 0 {
            noise.index_axis_mut(Axis(0), 0).fill(0.0);
        }

        log::debug!(
            "generated {} perturbation with shape {:?}",
            self.strategy,
            noise.shape()
        );
        Ok(noise)
    }

    /// Add the perturbation to `x` in place
    pub fn apply(&self, x: &mut EnsembleState, model: Option<&dyn TimeStepper>) -> Result<()> {
        let noise = self.generate(x, model)?;
        let noise = noise
            .broadcast(x.raw_dim())
            .ok_or_else(|| GridcastError::ShapeMismatch {
                expected: format!("perturbation broadcastable to {:?}", x.shape()),
                found: noise.shape().to_vec(),
            })?;
        *x += &noise;
        Ok(())
    }
}
