//! Entry point for the gridcast application.
//! Handles CLI parsing, logging and settings, and dispatches the subcommands.

use clap::Parser;
use env_logger::Env;
use gridcast::config::Settings;
use gridcast::era5::HDF5DataSource;
use gridcast::field::GriddedField;
use gridcast::netcdf_io::{read_field, write_spectrum, FieldWriter};
use gridcast::parallel::{get_parallel_info, ParallelConfig};
use gridcast::perturbation::{generate_noise_correlated, generate_noise_gaussian, PerturbationStrategy};
use gridcast::regrid::{get_regridder, regrid_field};
use gridcast::spectra::spectrum_report;
use ndarray::ArrayD;
use rand::rngs::StdRng;
use rand::SeedableRng;

mod cli;

use cli::{Args, Command};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    println!(
        r#"
------------------------------------------------------------------
                 _     _                _
       __ _ _ __(_) __| | ___ __ _ ___| |_
      / _` | '__| |/ _` |/ __/ _` / __| __|
     | (_| | |  | | (_| | (_| (_| \__ \ |_
      \__, |_|  |_|\__,_|\___\__,_|___/\__|
      |___/   ensembles, ERA5 and regridding
------------------------------------------------------------------
"#
    );

    ParallelConfig::new(args.threads).setup_global_pool()?;
    if args.verbose {
        get_parallel_info().print_info();
    }

    let settings = match &args.config {
        Some(path) => Settings::from_toml_file(path)?,
        None => Settings::from_env(),
    };

    match args.command {
        Command::Noise {
            shape,
            kind,
            amplitude,
            reddening,
            seed,
            output,
        } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let data = if kind == PerturbationStrategy::Gaussian {
                generate_noise_gaussian(&shape, amplitude, &mut rng)
            } else {
                generate_noise_correlated(&shape, reddening, amplitude, &mut rng)?
            };
            println!("✅ Generated {kind} noise with shape {shape:?}");

            match output {
                Some(path) => {
                    let mut field = GriddedField::new(data, default_dims(shape.len()))?;
                    field.attrs.insert("noise_kind".to_string(), kind.to_string());
                    field.attrs.insert("amplitude".to_string(), amplitude.to_string());
                    if kind == PerturbationStrategy::Correlated {
                        field.attrs.insert("reddening".to_string(), reddening.to_string());
                    }
                    FieldWriter::new(&path).write(&field, "noise")?;
                    println!("✅ Saved noise to {}", path.display());
                }
                None => print_summary(&data),
            }
        }
        Command::Era5 {
            root,
            time,
            history,
            output,
        } => {
            let source = HDF5DataSource::from_path(&root, history)?;
            let field = source.get(time)?;
            println!(
                "✅ Loaded {} step(s) ending {} with shape {:?}",
                field.times.len(),
                time,
                field.shape()
            );
            println!("   Channels: {}", source.channel_names().join(", "));

            match output {
                Some(path) => {
                    FieldWriter::new(&path).write(&field, "fields")?;
                    println!("✅ Saved window to {}", path.display());
                }
                None => print_summary(&field.data),
            }
        }
        Command::Regrid {
            file,
            variable,
            src,
            dest,
            output,
        } => {
            let field = read_field(&file, &variable)?;
            println!("Successfully opened NetCDF file: {}", file.display());

            let regridder = get_regridder(src, dest, &settings)?;
            let regridded = regrid_field(&field, &regridder)?;
            println!(
                "✅ Regridded '{variable}' from {src} to {dest}: {:?} -> {:?}",
                field.shape(),
                regridded.shape()
            );

            FieldWriter::new(&output).write(&regridded, &variable)?;
            println!("✅ Saved result to {}", output.display());
        }
        Command::Spectrum {
            file,
            variable,
            channel,
            min_index,
            output,
        } => {
            let field = read_field(&file, &variable)?;
            println!("Successfully opened NetCDF file: {}", file.display());

            let report = spectrum_report(&field, &channel, min_index)?;
            println!("📊 Zonal power spectrum of {channel}:");
            println!("   {:>10}  {:>16}", "lead days", "high-wave power");
            for (lead, power) in report.lead_days.iter().zip(&report.high_wave_power) {
                println!("   {lead:>10.2}  {power:>16.6e}");
            }

            if let Some(path) = output {
                write_spectrum(&path, &report)?;
                println!("✅ Saved spectrum to {}", path.display());
            }
        }
    }

    Ok(())
}

/// Dimension names for a generated array, aligned to `[ensemble, time, channel, lat, lon]`
fn default_dims(ndim: usize) -> Vec<String> {
    const NAMES: [&str; 5] = ["ensemble", "time", "channel", "lat", "lon"];
    if ndim <= NAMES.len() {
        NAMES[NAMES.len() - ndim..]
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    } else {
        (0..ndim).map(|i| format!("dim_{i}")).collect()
    }
}

fn print_summary(data: &ArrayD<f32>) {
    let min = data.iter().copied().fold(f32::INFINITY, f32::min);
    let max = data.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    println!("📊 Summary:");
    println!("   Shape: {:?}", data.shape());
    println!("   Min: {min}");
    println!("   Max: {max}");
    if let Some(mean) = data.mean() {
        println!("   Mean: {mean}");
        println!("   Std: {}", data.std(0.0));
    }
}
