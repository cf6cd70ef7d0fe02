//! Bred-vector perturbations
//!
//! A bred vector is grown by repeatedly running the model from perturbed
//! copies of the initial state and keeping the difference to the control
//! forecast. The result is rescaled by `noise_amplitude * ||x|| / ||x + dx||`.

use super::noise::standard_normal;
use super::EnsembleState;
use crate::errors::{GridcastError, Result};
use chrono::NaiveDateTime;
use ndarray::{s, Array5, ArrayD, ArrayView5, Axis, Ix5};
use rand::Rng;

/// One forward step of a forecast model
///
/// Implementations receive a state laid out as `[ensemble, time, channel,
/// lat, lon]` and return the state one step ahead, either with the same
/// layout or with the time axis collapsed (`[ensemble, channel, lat, lon]`).
pub trait TimeStepper {
    /// Advance `x` by one model step
    fn step(&self, x: ArrayView5<'_, f32>, time: Option<NaiveDateTime>) -> Result<ArrayD<f32>>;
}

/// Parameters of the breeding cycle
#[derive(Debug, Clone, PartialEq)]
pub struct BredVectorConfig {
    pub noise_amplitude: f32,
    pub time: Option<NaiveDateTime>,
    pub integration_steps: usize,
    /// Add `noise_amplitude * (dx - mean(dx))` after every step to keep members apart
    pub inflate: bool,
}

impl Default for BredVectorConfig {
    fn default() -> Self {
        Self {
            noise_amplitude: 0.15,
            time: None,
            integration_steps: 40,
            inflate: false,
        }
    }
}

/// Grow a bred vector for every member of `x`
///
/// The returned perturbation has the layout of the model output with the
/// time axis restored, i.e. `[ensemble, 1, channel, lat, lon]` for models
/// that collapse time.
pub fn generate_bred_vector<M, R>(
    x: &EnsembleState,
    model: &M,
    config: &BredVectorConfig,
    rng: &mut R,
) -> Result<EnsembleState>
where
    M: TimeStepper + ?Sized,
    R: Rng,
{
    if x.len_of(Axis(0)) == 0 {
        return Err(GridcastError::InvalidParameter(
            "bred vectors need at least one ensemble member".to_string(),
        ));
    }
    let amplitude = config.noise_amplitude;

    let x0 = x.slice(s![..1, .., .., .., ..]).to_owned();
    let control = run_step(model, &x0, config.time)?;

    let mut dx: Array5<f32> = standard_normal(x.shape(), rng).into_dimensionality::<Ix5>()? * amplitude;

    for step in 0..config.integration_steps {
        let x1 = add_broadcast(x, &dx)?;
        let x2 = run_step(model, &x1, config.time)?;

        let xd = control
            .broadcast(x2.raw_dim())
            .ok_or_else(|| GridcastError::ShapeMismatch {
                expected: format!("model output broadcastable from {:?}", control.shape()),
                found: x2.shape().to_vec(),
            })?;
        dx = &x2 - &xd;

        if config.inflate {
            let mean = dx
                .mean_axis(Axis(0))
                .ok_or("cannot average an empty ensemble")?
                .insert_axis(Axis(0));
            let mean = mean
                .broadcast(dx.raw_dim())
                .ok_or("ensemble mean does not broadcast")?;
            let spread = &dx - &mean;
            dx = dx + spread * amplitude;
        }
        log::debug!("bred vector step {} norm {:.4e}", step + 1, frobenius_norm(&dx));
    }

    let perturbed = add_broadcast(x, &dx)?;
    let denom = frobenius_norm(&perturbed);
    if denom == 0.0 {
        return Err(GridcastError::InvalidParameter(
            "perturbed state has zero norm".to_string(),
        ));
    }
    let gamma = (frobenius_norm(x) / denom) as f32;

    Ok(dx * (amplitude * gamma))
}

/// Run one model step and restore a collapsed time axis
fn run_step<M>(model: &M, x: &EnsembleState, time: Option<NaiveDateTime>) -> Result<EnsembleState>
where
    M: TimeStepper + ?Sized,
{
    let mut out = model.step(x.view(), time)?;
    if out.ndim() + 1 == x.ndim() {
        out = out.insert_axis(Axis(1));
    }
    let out = out.into_dimensionality::<Ix5>()?;
    if out.len_of(Axis(0)) != x.len_of(Axis(0)) {
        return Err(GridcastError::ShapeMismatch {
            expected: format!("{} ensemble members", x.len_of(Axis(0))),
            found: out.shape().to_vec(),
        });
    }
    Ok(out)
}

fn add_broadcast(x: &EnsembleState, dx: &EnsembleState) -> Result<EnsembleState> {
    let dx = dx
        .broadcast(x.raw_dim())
        .ok_or_else(|| GridcastError::ShapeMismatch {
            expected: format!("perturbation broadcastable to {:?}", x.shape()),
            found: dx.shape().to_vec(),
        })?;
    Ok(x + &dx)
}

pub(crate) fn frobenius_norm(a: &EnsembleState) -> f64 {
    a.iter().map(|&v| f64::from(v) * f64::from(v)).sum::<f64>().sqrt()
}
