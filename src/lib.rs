//! gridcast: ensemble initialisation, ERA5 access and regridding for
//! neural weather forecasting
//!
//! The library covers the data plumbing around a forecast model rather than
//! the model itself.
//!
//! ## Key Features
//!
//! - **Ensemble perturbations**: Gaussian noise, spectrally reddened
//!   ("brown") noise and bred vectors grown by a user-supplied [`TimeStepper`]
//! - **ERA5 archives**: yearly HDF5 files keyed by timestamp, with history
//!   windows and per-channel time means
//! - **Regridding**: TempestRemap map files applied as sparse matrices
//! - **Spectra**: zonal power spectra of forecast fields over lead time
//! - **Parallel Processing**: Rayon for noise, regridding and spectra
//!
//! ## Module Organization
//!
//! - [`perturbation`]: noise generators, bred vectors and perturbation strategies
//! - [`era5`]: the ERA5 HDF5 data source
//! - [`regrid`]: sparse regridding between lat/lon grids
//! - [`spectra`]: periodograms and zonal power spectra
//! - [`netcdf_io`]: NetCDF reading and writing of gridded fields
//! - [`grid`]: supported grids and channel sets
//! - [`field`]: the labelled array type shared by all modules
//! - [`config`]: data locations from the environment or a TOML file
//! - [`parallel`]: parallel processing configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gridcast::prelude::*;
//! use chrono::NaiveDate;
//! use std::path::Path;
//!
//! let source = HDF5DataSource::from_path(Path::new("/data/era5"), 1).unwrap();
//! let time = NaiveDate::from_ymd_opt(2018, 1, 1)
//!     .unwrap()
//!     .and_hms_opt(6, 0, 0)
//!     .unwrap();
//! let window = source.get(time).unwrap();
//!
//! let report = gridcast::spectra::spectrum_report(&window, "u200", 100).unwrap();
//! println!("{:?}", report.high_wave_power);
//! ```

pub mod config;
pub mod era5;
pub mod errors;
pub mod field;
pub mod grid;
pub mod netcdf_io;
pub mod parallel;
pub mod perturbation;
pub mod regrid;
pub mod spectra;

pub use errors::{GridcastError, Result};
pub use perturbation::TimeStepper;

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::config::Settings;
    pub use crate::era5::{Era5Metadata, HDF5DataSource};
    pub use crate::errors::{GridcastError, Result};
    pub use crate::field::GriddedField;
    pub use crate::grid::{ChannelSet, Grid};
    pub use crate::netcdf_io::{read_field, FieldWriter};
    pub use crate::parallel::ParallelConfig;
    pub use crate::perturbation::{
        EnsembleState, Perturbation, PerturbationStrategy, TimeStepper,
    };
    pub use crate::regrid::{get_regridder, Regridder, TempestRegridder};
}
