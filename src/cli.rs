//! Defines command-line interface options using `clap` for the gridcast application.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use gridcast::grid::Grid;
use gridcast::perturbation::PerturbationStrategy;
use std::path::PathBuf;

/// Ensemble initialisation, ERA5 access and regridding for weather forecasts
#[derive(Parser, Debug)]
#[command(
    version,
    name = "gridcast",
    about = "Ensemble perturbations, ERA5 archives and regridding for forecast data"
)]
pub struct Args {
    /// Enable verbose output (debug logging).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,

    /// TOML settings file; MAP_FILES, ERA5_HDF5_34 and ERA5_HDF5_73 override its values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate Gaussian or spectrally correlated noise
    Noise {
        /// Array shape, e.g. 2,1,4,721,1440
        #[arg(long, value_delimiter = ',', required = true)]
        shape: Vec<usize>,

        /// Noise kind: gaussian or correlated
        #[arg(long, default_value = "correlated", value_parser = parse_noise_kind)]
        kind: PerturbationStrategy,

        /// Noise amplitude
        #[arg(long, default_value_t = 0.05)]
        amplitude: f32,

        /// Spectral exponent of the correlated noise
        #[arg(long, default_value_t = 2.0)]
        reddening: f64,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Path to save the noise as NetCDF. If not set, prints a summary.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load the history window ending at a timestamp from a yearly HDF5 archive
    Era5 {
        /// Archive root containing data.json and <subdir>/<YYYY>.h5 files
        #[arg(long)]
        root: PathBuf,

        /// Timestamp, e.g. 2018-01-01T06:00:00
        #[arg(long, value_parser = parse_time)]
        time: NaiveDateTime,

        /// Number of past steps to include besides the requested one
        #[arg(long, default_value_t = 0)]
        history: usize,

        /// Path to save the window as NetCDF. If not set, prints a summary.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Regrid a NetCDF variable between two grids using a TempestRemap map file
    Regrid {
        /// Input NetCDF file
        #[arg(short, long)]
        file: PathBuf,

        /// Variable to regrid, last two dimensions lat and lon
        #[arg(long, default_value = "fields")]
        variable: String,

        /// Source grid, e.g. 721x1440
        #[arg(long, value_parser = parse_grid)]
        src: Grid,

        /// Destination grid, e.g. s2s
        #[arg(long, value_parser = parse_grid)]
        dest: Grid,

        /// Output NetCDF file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Zonal power spectrum of one channel over lead time
    Spectrum {
        /// Input NetCDF file
        #[arg(short, long)]
        file: PathBuf,

        /// Variable holding the forecast
        #[arg(long, default_value = "fields")]
        variable: String,

        /// Channel to analyse
        #[arg(long, default_value = "u200")]
        channel: String,

        /// First frequency bin counted as high wavenumber
        #[arg(long, default_value_t = 100)]
        min_index: usize,

        /// Path to save the spectrum as NetCDF
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_grid(s: &str) -> Result<Grid, String> {
    s.parse::<Grid>().map_err(|e| e.to_string())
}

fn parse_noise_kind(s: &str) -> Result<PerturbationStrategy, String> {
    match s.parse::<PerturbationStrategy>().map_err(|e| e.to_string())? {
        kind @ (PerturbationStrategy::Gaussian | PerturbationStrategy::Correlated) => Ok(kind),
        other => Err(format!(
            "'{other}' is not a noise kind: expected 'gaussian' or 'correlated'"
        )),
    }
}

fn parse_time(s: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| format!("Invalid timestamp '{s}': expected YYYY-MM-DDTHH:MM:SS"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommand_with_global_flags() {
        let args = Args::try_parse_from([
            "gridcast",
            "--threads",
            "2",
            "noise",
            "--shape",
            "1,1,2,8,16",
            "--kind",
            "gaussian",
            "--seed",
            "7",
        ])
        .unwrap();
        assert_eq!(args.threads, Some(2));
        match args.command {
            Command::Noise {
                shape, kind, seed, ..
            } => {
                assert_eq!(shape, vec![1, 1, 2, 8, 16]);
                assert_eq!(kind, PerturbationStrategy::Gaussian);
                assert_eq!(seed, Some(7));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_bred_as_noise_kind() {
        assert!(parse_noise_kind("bred_vector").is_err());
    }

    #[test]
    fn parses_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2018, 1, 2)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        assert_eq!(parse_time("2018-01-02T06:00:00").unwrap(), expected);
        assert_eq!(parse_time("2018-01-02 06:00").unwrap(), expected);
        assert_eq!(
            parse_time("2018-01-02").unwrap(),
            expected - chrono::Duration::hours(6)
        );
        assert!(parse_time("yesterday").is_err());
    }
}
