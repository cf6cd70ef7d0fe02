//! Zonal power spectra of forecast fields
//!
//! Used to check how forecasts lose (or pile up) small-scale energy with
//! lead time: for every time step the periodogram along longitude is
//! averaged over all other axes.

use crate::errors::{GridcastError, Result};
use crate::field::GriddedField;
use chrono::NaiveDateTime;
use ndarray::{s, Array2, ArrayViewD, Axis};
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Power spectrum of one channel per time step
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumReport {
    pub channel: String,
    /// Frequencies in cycles per grid point
    pub freqs: Vec<f64>,
    /// `[time, freq]`
    pub power: Array2<f64>,
    pub lead_days: Vec<f64>,
    /// Mean power of bins `>= min_index` per time step
    pub high_wave_power: Vec<f64>,
    pub min_index: usize,
}

/// One-sided periodogram of a real signal
///
/// Constant detrending, boxcar window and density scaling: bin `k` holds
/// `|X_k|^2 / (fs * n)`, doubled for every bin that has a negative-frequency
/// twin.
pub fn periodogram(values: &[f64], fs: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    let n = values.len();
    if n == 0 {
        return Err(GridcastError::InvalidParameter(
            "periodogram of an empty signal".to_string(),
        ));
    }
    if fs <= 0.0 {
        return Err(GridcastError::InvalidParameter(format!(
            "sampling frequency must be positive, got {fs}"
        )));
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let mut buf: Vec<Complex<f64>> = values.iter().map(|&v| Complex::new(v - mean, 0.0)).collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut buf);

    let nbins = n / 2 + 1;
    let scale = 1.0 / (fs * n as f64);
    let mut power: Vec<f64> = buf[..nbins].iter().map(|c| c.norm_sqr() * scale).collect();

    // the Nyquist bin of an even-length signal has no twin
    let doubled_end = if n % 2 == 0 { nbins - 1 } else { nbins };
    for p in power.iter_mut().take(doubled_end).skip(1) {
        *p *= 2.0;
    }

    let freqs = (0..nbins).map(|k| k as f64 * fs / n as f64).collect();
    Ok((freqs, power))
}

/// Average periodogram along the last axis of `data`, over all other axes
fn mean_lane_spectrum(data: ArrayViewD<'_, f32>) -> Result<(Vec<f64>, Vec<f64>)> {
    let last = data.ndim().checked_sub(1).ok_or_else(|| {
        GridcastError::InvalidParameter("cannot take a spectrum of a scalar".to_string())
    })?;

    let lanes: Vec<Vec<f64>> = data
        .lanes(Axis(last))
        .into_iter()
        .map(|lane| lane.iter().map(|&v| f64::from(v)).collect())
        .collect();

    let spectra = lanes
        .par_iter()
        .map(|lane| periodogram(lane, 1.0))
        .collect::<Result<Vec<_>>>()?;

    let (freqs, first) = spectra.first().cloned().ok_or_else(|| {
        GridcastError::InvalidParameter("no lanes to average".to_string())
    })?;
    let mut sum = vec![0.0; first.len()];
    for (_, power) in &spectra {
        for (s, p) in sum.iter_mut().zip(power) {
            *s += p;
        }
    }
    let count = spectra.len() as f64;
    sum.iter_mut().for_each(|s| *s /= count);
    Ok((freqs, sum))
}

/// Zonal power spectrum for every time step of a field
///
/// The field's `time` dimension (or its first axis when unnamed) indexes
/// the output rows; the last axis is treated as longitude.
pub fn zonal_power_spectrum(field: &GriddedField) -> Result<(Vec<f64>, Array2<f64>)> {
    if field.data.ndim() < 2 {
        return Err(GridcastError::ShapeMismatch {
            expected: "at least [time, lon]".to_string(),
            found: field.shape().to_vec(),
        });
    }
    let time_axis = field.axis_of("time").unwrap_or(0);
    if time_axis == field.data.ndim() - 1 {
        return Err(GridcastError::InvalidParameter(
            "time cannot be the longitude axis".to_string(),
        ));
    }

    let nt = field.data.len_of(Axis(time_axis));
    let mut freqs = Vec::new();
    let mut rows = Vec::with_capacity(nt);
    for t in 0..nt {
        let (f, p) = mean_lane_spectrum(field.data.index_axis(Axis(time_axis), t))?;
        freqs = f;
        rows.extend(p);
    }

    let power = Array2::from_shape_vec((nt, freqs.len()), rows)?;
    Ok((freqs, power))
}

/// Mean power of frequency bins `>= min_index` for every row
///
/// Rows with no such bins yield NaN.
pub fn high_wavenumber_power(power: &Array2<f64>, min_index: usize) -> Vec<f64> {
    power
        .outer_iter()
        .map(|row| {
            if min_index >= row.len() {
                f64::NAN
            } else {
                row.slice(s![min_index..]).mean().unwrap_or(f64::NAN)
            }
        })
        .collect()
}

/// Lead time of every timestamp in days relative to the first
pub fn lead_days(times: &[NaiveDateTime]) -> Vec<f64> {
    let Some(&t0) = times.first() else {
        return Vec::new();
    };
    times
        .iter()
        .map(|&t| (t - t0).num_seconds() as f64 / 86_400.0)
        .collect()
}

/// Spectrum report of `channel` (or of the whole field if it has no channel axis)
///
/// Without timestamps lead days fall back to the step index.
pub fn spectrum_report(
    field: &GriddedField,
    channel: &str,
    min_index: usize,
) -> Result<SpectrumReport> {
    let selected = if field.axis_of("channel").is_some() {
        field.select_channel(channel)?
    } else {
        field.clone()
    };

    let (freqs, power) = zonal_power_spectrum(&selected)?;
    let nt = power.nrows();
    let lead = if selected.times.len() == nt {
        lead_days(&selected.times)
    } else {
        (0..nt).map(|i| i as f64).collect()
    };

    Ok(SpectrumReport {
        channel: channel.to_string(),
        high_wave_power: high_wavenumber_power(&power, min_index),
        freqs,
        power,
        lead_days: lead,
        min_index,
    })
}
