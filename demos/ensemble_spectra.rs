//! Ensemble initialisation and zonal spectra on a synthetic ERA5 archive.
//!
//! Builds a small yearly archive in a temporary directory, loads an initial
//! condition, perturbs it with bred vectors and with correlated noise, runs a
//! toy advection model forward and prints how the u200 high-wavenumber power
//! evolves with lead time for each ensemble.
//!
//! Run with `cargo run --example ensemble_spectra`.

use chrono::{NaiveDate, NaiveDateTime};
use gridcast::prelude::*;
use gridcast::spectra::spectrum_report;
use ndarray::{s, Array4, ArrayD, ArrayView5, Axis, Ix5};
use netcdf::create;
use std::f32::consts::PI;
use std::fs;
use std::path::Path;

const CHANNELS: [&str; 3] = ["u200", "t850", "z500"];
const NLAT: usize = 32;
const NLON: usize = 128;
const ENSEMBLE: usize = 4;
const LEAD_STEPS: usize = 8;

/// Shifts every field one grid point east and damps it slightly
struct ToyAdvection {
    damping: f32,
}

impl TimeStepper for ToyAdvection {
    fn step(&self, x: ArrayView5<'_, f32>, _time: Option<NaiveDateTime>) -> Result<ArrayD<f32>> {
        let w = x.len_of(Axis(4));
        let mut out = x.to_owned();
        out.slice_mut(s![.., .., .., .., 1..])
            .assign(&x.slice(s![.., .., .., .., ..w - 1]));
        out.slice_mut(s![.., .., .., .., ..1])
            .assign(&x.slice(s![.., .., .., .., w - 1..]));
        Ok((out * self.damping).into_dyn())
    }
}

fn write_archive(root: &Path) -> Result<()> {
    let lat: Vec<f32> = (0..NLAT)
        .map(|i| 90.0 - 180.0 * i as f32 / (NLAT - 1) as f32)
        .collect();
    let lon: Vec<f32> = (0..NLON).map(|j| 360.0 * j as f32 / NLON as f32).collect();
    let metadata = format!(
        r#"{{"coords": {{"channel": {:?}, "lat": {:?}, "lon": {:?}}}, "attrs": {{"title": "synthetic"}}}}"#,
        CHANNELS, lat, lon
    );
    fs::write(root.join("data.json"), metadata)?;

    let dir = root.join("train");
    fs::create_dir_all(&dir)?;
    let mut file = create(dir.join("2018.h5"))?;
    file.add_dimension("time", 8)?;
    file.add_dimension("channel", CHANNELS.len())?;
    file.add_dimension("lat", NLAT)?;
    file.add_dimension("lon", NLON)?;

    // planetary waves 3 and 7 plus a weak wave 40 on every channel
    let data = Array4::from_shape_fn((8, CHANNELS.len(), NLAT, NLON), |(t, c, i, j)| {
        let x = 2.0 * PI * j as f32 / NLON as f32;
        let y = PI * i as f32 / (NLAT - 1) as f32;
        let base = 10.0 * (c + 1) as f32;
        base + y.sin() * (5.0 * (3.0 * x + 0.1 * t as f32).cos() + 2.0 * (7.0 * x).sin())
            + 0.2 * (40.0 * x).cos()
    });
    let mut var = file.add_variable::<f32>("fields", &["time", "channel", "lat", "lon"])?;
    var.put(data.view(), ..)?;
    Ok(())
}

/// Run the model forward and collect u200 as `[time, ensemble, lat, lon]`
fn forecast_u200(
    model: &ToyAdvection,
    mut state: EnsembleState,
    start: NaiveDateTime,
) -> Result<GriddedField> {
    let u200 = 0;
    let mut frames = Vec::with_capacity(LEAD_STEPS + 1);
    let mut times = Vec::with_capacity(LEAD_STEPS + 1);
    for step in 0..=LEAD_STEPS {
        if step > 0 {
            state = model.step(state.view(), None)?.into_dimensionality::<Ix5>()?;
        }
        frames.push(state.slice(s![.., 0, u200, .., ..]).to_owned());
        times.push(start + chrono::Duration::hours(6 * step as i64));
    }

    let views: Vec<_> = frames.iter().map(|f| f.view()).collect();
    let data = ndarray::stack(Axis(0), &views)?.into_dyn();
    let mut field = GriddedField::new(
        data,
        ["time", "ensemble", "lat", "lon"]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
    )?;
    field.times = times;
    Ok(field)
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    println!("🔨 Creating synthetic archive in {}", dir.path().display());
    write_archive(dir.path())?;

    let source = HDF5DataSource::from_path(dir.path(), 0)?;
    let start = NaiveDate::from_ymd_opt(2018, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .ok_or("invalid start time")?;
    let initial = source.get(start)?;
    println!("✅ Loaded initial condition {:?} at {}", initial.shape(), start);

    // [time, channel, lat, lon] -> [ensemble, time, channel, lat, lon]
    let x = initial.data.into_dimensionality::<ndarray::Ix4>()?.insert_axis(Axis(0));
    let shape = (ENSEMBLE, x.len_of(Axis(1)), CHANNELS.len(), NLAT, NLON);
    let x: EnsembleState = x.broadcast(shape).ok_or("cannot broadcast initial state")?.to_owned();

    let model = ToyAdvection { damping: 0.995 };
    let strategies = [
        Perturbation {
            integration_steps: 10,
            seed: Some(1),
            ..Perturbation::new(PerturbationStrategy::Bred, 0.15)
        },
        Perturbation {
            seed: Some(1),
            ..Perturbation::new(PerturbationStrategy::Correlated, 0.05)
        },
    ];

    for perturbation in &strategies {
        let mut state = x.clone();
        perturbation.apply(&mut state, Some(&model))?;

        let forecast = forecast_u200(&model, state, start)?;
        let report = spectrum_report(&forecast, "u200", 20)?;

        println!(
            "\n📊 u200 zonal power, {} perturbation ({} members)",
            perturbation.strategy, ENSEMBLE
        );
        println!("   {:>9}  {:>12}  {:>16}", "lead days", "wave 3", "waves >= 20");
        for (t, lead) in report.lead_days.iter().enumerate() {
            println!(
                "   {:>9.2}  {:>12.4e}  {:>16.4e}",
                lead,
                report.power[[t, 3]],
                report.high_wave_power[t]
            );
        }
    }

    Ok(())
}
