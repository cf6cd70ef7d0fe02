//! Gaussian and spectrally shaped noise
//!
//! Correlated noise is white Gaussian noise whose 2-D spectrum over the last
//! two axes (lat, lon) is divided by `|k_lat|^r + |k_lon|^r`, so larger
//! `reddening` values push energy to large spatial scales.

use crate::errors::{GridcastError, Result};
use ndarray::{ArrayD, IxDyn};
use rand::Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Sample frequencies of a length-`n` discrete Fourier transform (unit spacing)
///
/// Ordered the way FFT outputs are: zero, positive frequencies, then the
/// negative ones.
pub fn fftfreq(n: usize) -> Vec<f64> {
    let nf = n as f64;
    let positive = (n + 1) / 2;
    (0..n)
        .map(|i| {
            if i < positive {
                i as f64 / nf
            } else {
                (i as f64 - nf) / nf
            }
        })
        .collect()
}

/// Draw standard-normal noise of the given shape
pub fn standard_normal<R: Rng>(shape: &[usize], rng: &mut R) -> ArrayD<f32> {
    ArrayD::from_shape_simple_fn(IxDyn(shape), || rng.sample::<f32, _>(StandardNormal))
}

/// Uncorrelated Gaussian noise scaled by `noise_amplitude`
pub fn generate_noise_gaussian<R: Rng>(
    shape: &[usize],
    noise_amplitude: f32,
    rng: &mut R,
) -> ArrayD<f32> {
    standard_normal(shape, rng) * noise_amplitude
}

/// Spatially correlated noise scaled by `noise_amplitude`
pub fn generate_noise_correlated<R: Rng>(
    shape: &[usize],
    reddening: f64,
    noise_amplitude: f32,
    rng: &mut R,
) -> Result<ArrayD<f32>> {
    Ok(brown_noise(shape, reddening, rng)? * noise_amplitude)
}

/// Red ("brown") noise over the last two axes of `shape`
///
/// Every 2-D slice is filtered independently. The filter is normalised to
/// unit root-mean-square, so the output keeps roughly unit variance.
pub fn brown_noise<R: Rng>(
    shape: &[usize],
    reddening: f64,
    rng: &mut R,
) -> Result<ArrayD<f32>> {
    if shape.len() < 2 {
        return Err(GridcastError::InvalidParameter(format!(
            "noise shape needs at least two axes, got {shape:?}"
        )));
    }
    if shape.contains(&0) {
        return Err(GridcastError::InvalidParameter(format!(
            "noise shape has an empty axis: {shape:?}"
        )));
    }

    let h = shape[shape.len() - 2];
    let w = shape[shape.len() - 1];
    let filter = spectral_filter(h, w, reddening);

    let mut noise = standard_normal(shape, rng);
    let plan = Fft2Plan::new(h, w);

    let values = noise
        .as_slice_mut()
        .ok_or("freshly sampled noise is not contiguous")?;
    values.par_chunks_mut(h * w).for_each(|plane| {
        let mut buf: Vec<Complex<f64>> = plane
            .iter()
            .map(|&v| Complex::new(f64::from(v), 0.0))
            .collect();

        plan.forward(&mut buf);
        for (c, &s) in buf.iter_mut().zip(&filter) {
            *c = *c * s;
        }
        plan.inverse(&mut buf);

        let norm = (h * w) as f64;
        for (out, c) in plane.iter_mut().zip(&buf) {
            {
                *out = (c.re / norm) as f32;
            }
        }
    });

    Ok(noise)
}

/// Row-major `h x w` spectral weights `1 / (|f_lat|^r + |f_lon|^r)`
///
/// Zero weights stay zero. When every weight is zero (a 1x1 plane) no
/// normalisation is applied and the result is all zeros.
pub fn spectral_filter(h: usize, w: usize, reddening: f64) -> Vec<f64> {
    let f_lat = fftfreq(h);
    let f_lon = fftfreq(w);

    let mut s: Vec<f64> = f_lat
        .iter()
        .flat_map(|&a| {
            f_lon
                .iter()
                .map(move |&b| a.abs().powf(reddening) + b.abs().powf(reddening))
        })
        .map(|v| if v == 0.0 { 0.0 } else { 1.0 / v })
        .collect();

    let mean_sq = s.iter().map(|v| v * v).sum::<f64>() / s.len() as f64;
    if mean_sq > 0.0 {
        let rms = mean_sq.sqrt();
        s.iter_mut().for_each(|v| *v /= rms);
    }
    s
}

/// Unnormalised 2-D FFT over a row-major `h x w` buffer
struct Fft2Plan {
    h: usize,
    w: usize,
    row_fwd: Arc<dyn Fft<f64>>,
    row_inv: Arc<dyn Fft<f64>>,
    col_fwd: Arc<dyn Fft<f64>>,
    col_inv: Arc<dyn Fft<f64>>,
}

impl Fft2Plan {
    fn new(h: usize, w: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            h,
            w,
            row_fwd: planner.plan_fft_forward(w),
            row_inv: planner.plan_fft_inverse(w),
            col_fwd: planner.plan_fft_forward(h),
            col_inv: planner.plan_fft_inverse(h),
        }
    }

    fn forward(&self, buf: &mut [Complex<f64>]) {
        self.apply(buf, &self.row_fwd, &self.col_fwd);
    }

    fn inverse(&self, buf: &mut [Complex<f64>]) {
        self.apply(buf, &self.row_inv, &self.col_inv);
    }

    fn apply(&self, buf: &mut [Complex<f64>], rows: &Arc<dyn Fft<f64>>, cols: &Arc<dyn Fft<f64>>) {
        // rows are contiguous, so one call transforms all of them
        rows.process(buf);

        let mut column = vec![Complex::new(0.0, 0.0); self.h];
        for j in 0..self.w {
            for (i, c) in column.iter_mut().enumerate() {
                *c = buf[i * self.w + j];
            }
            cols.process(&mut column);
            for (i, c) in column.iter().enumerate() {
                buf[i * self.w + j] = *c;
            }
        }
    }
}
