//! Unit tests for the gridcast library
//!
//! These tests cover the building blocks that do not need files on disk:
//! errors, grids, settings, fields, sparse matrices and thread pool settings.

use gridcast::config::Settings;
use gridcast::field::GriddedField;
use gridcast::grid::{ChannelSet, Grid, ERA5_34_CHANNELS};
use gridcast::netcdf_io::decode_times;
use gridcast::parallel::{get_parallel_info, ParallelConfig};
use gridcast::regrid::SparseMatrix;
use gridcast::{GridcastError, Result};
use chrono::NaiveDate;
use ndarray::{ArrayD, IxDyn};
use std::path::{Path, PathBuf};

#[test]
fn test_error_types() {
    let var_error = GridcastError::VariableNotFound {
        var: "fields".to_string(),
    };
    assert_eq!(var_error.to_string(), "Variable 'fields' not found in file");

    let time_error = GridcastError::TimeRange {
        found: 1,
        expected: 2,
        requested: "2018-01-01T00:00:00".to_string(),
        start: "2018-01-01T00:00:00".to_string(),
        end: "2018-12-31T18:00:00".to_string(),
    };
    assert_eq!(
        time_error.to_string(),
        "1 found. Expected: 2 .Time requested: 2018-01-01T00:00:00. \
         Time range in data: 2018-01-01T00:00:00 -- 2018-12-31T18:00:00."
    );

    let from_str: GridcastError = "something broke".into();
    assert!(matches!(from_str, GridcastError::Generic(ref m) if m == "something broke"));

    let io: GridcastError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(std::error::Error::source(&io).is_some());
}

#[test]
fn test_parallel_config() {
    let config = ParallelConfig::with_threads(4);
    assert_eq!(config.num_threads, Some(4));

    let config = ParallelConfig::default();
    assert_eq!(config.num_threads, None);
    // leaving the default pool alone never fails
    assert!(config.setup_global_pool().is_ok());

    let config = ParallelConfig::all_cores();
    assert_eq!(config.num_threads, Some(num_cpus::get()));

    let zero = ParallelConfig::with_threads(0).setup_global_pool();
    assert!(matches!(zero, Err(GridcastError::ThreadPoolError(_))));
}

#[test]
fn test_parallel_info() {
    let info = get_parallel_info();
    assert!(info.current_threads > 0);
    assert!(info.available_cores > 0);
    assert!(info.available_parallelism > 0);
}

#[test]
fn test_grid_shapes_and_coordinates() {
    assert_eq!(Grid::Grid721x1440.shape(), (721, 1440));
    assert_eq!(Grid::Grid720x1440.shape(), (720, 1440));
    assert_eq!(Grid::S2s.shape(), (121, 240));

    let lat = Grid::Grid721x1440.lat();
    assert_eq!(lat.len(), 721);
    assert_eq!(lat[0], 90.0);
    assert_eq!(lat[720], -90.0);

    let lon = Grid::S2s.lon();
    assert_eq!(lon.len(), 240);
    assert_eq!(lon[1], 1.5);

    assert_eq!(ERA5_34_CHANNELS.len(), 34);
    assert_eq!(ERA5_34_CHANNELS[0], "u10");
}

#[test]
fn test_grid_names_round_trip() -> Result<()> {
    for grid in [Grid::Grid721x1440, Grid::Grid720x1440, Grid::S2s] {
        assert_eq!(grid.to_string().parse::<Grid>()?, grid);
    }
    assert_eq!("s2s_challenge".parse::<Grid>()?, Grid::S2s);
    assert!("1x1".parse::<Grid>().is_err());

    assert_eq!("34var".parse::<ChannelSet>()?, ChannelSet::Var34);
    assert_eq!(ChannelSet::Var73.as_str(), "73var");
    Ok(())
}

#[test]
fn test_settings_from_toml_and_overrides() -> Result<()> {
    let settings = Settings::from_toml_str(
        r#"
        map_files = "/maps"
        era5_hdf5_34 = "/era5/34"
        "#,
    )?;
    assert_eq!(settings.map_files()?, Path::new("/maps"));
    assert_eq!(settings.data_root(ChannelSet::Var34)?, Path::new("/era5/34"));
    assert!(matches!(
        settings.data_root(ChannelSet::Var73),
        Err(GridcastError::ConfigError(ref m)) if m.contains("ERA5_HDF5_73")
    ));

    let overridden = settings.with_env_overrides(|key| match key {
        "MAP_FILES" => Some("/other/maps".to_string()),
        "ERA5_HDF5_73" => Some("/era5/73".to_string()),
        // empty values do not clear what the file set
        "ERA5_HDF5_34" => Some(String::new()),
        _ => None,
    });
    assert_eq!(overridden.map_files, Some(PathBuf::from("/other/maps")));
    assert_eq!(overridden.era5_hdf5_34, Some(PathBuf::from("/era5/34")));
    assert_eq!(overridden.era5_hdf5_73, Some(PathBuf::from("/era5/73")));

    assert!(Settings::from_toml_str("map_files = [1, 2]").is_err());
    assert!(Settings::default().map_files().is_err());
    Ok(())
}

fn sample_field() -> GriddedField {
    let data = ArrayD::from_shape_fn(IxDyn(&[2, 3, 2, 4]), |idx| {
        (idx[0] * 100 + idx[1] * 10 + idx[2] * 4 + idx[3]) as f32
    });
    let dims = ["time", "channel", "lat", "lon"]
        .iter()
        .map(|s| (*s).to_string())
        .collect();
    let mut field = GriddedField::new(data, dims).unwrap();
    field.channels = vec!["u200".into(), "t850".into(), "z500".into()];
    field.lat = vec![45.0, -45.0];
    field.lon = vec![0.0, 90.0, 180.0, 270.0];
    field
}

#[test]
fn test_field_select_channel() -> Result<()> {
    let field = sample_field();
    field.validate()?;

    let t850 = field.select_channel("t850")?;
    assert_eq!(t850.shape(), &[2, 2, 4]);
    assert_eq!(t850.dims, vec!["time", "lat", "lon"]);
    assert_eq!(t850.data[[1, 1, 3]], 100.0 + 10.0 + 4.0 + 3.0);
    assert!(t850.channels.is_empty());
    assert_eq!(t850.lon, field.lon);

    assert!(matches!(
        field.select_channel("q700"),
        Err(GridcastError::ChannelNotFound { .. })
    ));
    Ok(())
}

#[test]
fn test_field_validation() {
    let mut field = sample_field();
    field.lat = vec![0.0; 3];
    assert!(matches!(
        field.validate(),
        Err(GridcastError::ShapeMismatch { .. })
    ));

    let data = ArrayD::<f32>::zeros(IxDyn(&[2, 2]));
    assert!(GriddedField::new(data, vec!["lat".to_string()]).is_err());
}

#[test]
fn test_sparse_matrix_sums_duplicates() -> Result<()> {
    // [[0.5, 0.5, 0], [0, 0, 1]] with the first weight split in two entries
    let rows = [0, 1, 0, 0];
    let cols = [1, 2, 0, 0];
    let vals = [0.5, 1.0, 0.25, 0.25];
    let matrix = SparseMatrix::from_triplets(2, 3, &rows, &cols, &vals)?;

    assert_eq!(matrix.nnz(), 3);
    assert_eq!(matrix.row_sums(), vec![1.0, 1.0]);

    let mut out = [0.0; 2];
    matrix.matvec(&[2.0, 4.0, 8.0], &mut out)?;
    assert_eq!(out, [3.0, 8.0]);

    let mut short = [0.0; 1];
    assert!(matrix.matvec(&[2.0, 4.0, 8.0], &mut short).is_err());
    Ok(())
}

#[test]
fn test_sparse_matrix_rejects_bad_triplets() {
    let out_of_bounds = SparseMatrix::from_triplets(2, 2, &[0, 2], &[0, 0], &[1.0, 1.0]);
    assert!(matches!(
        out_of_bounds,
        Err(GridcastError::InvalidParameter(_))
    ));

    let ragged = SparseMatrix::from_triplets(2, 2, &[0, 1], &[0], &[1.0, 1.0]);
    assert!(ragged.is_err());
}

#[test]
fn test_sparse_matrix_empty_rows() -> Result<()> {
    let matrix = SparseMatrix::from_triplets(3, 2, &[2], &[1], &[2.0])?;
    let mut out = [9.0; 3];
    matrix.matvec(&[1.0, 3.0], &mut out)?;
    assert_eq!(out, [0.0, 0.0, 6.0]);
    Ok(())
}

#[test]
fn test_decode_times_reference_formats() -> Result<()> {
    let at = |y, m, d, h| {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    };

    // units string used by CDS ERA5 NetCDF downloads
    let times = decode_times(&[0.0, 6.0], "hours since 1900-01-01 00:00:00.0")?;
    assert_eq!(times, vec![at(1900, 1, 1, 0), at(1900, 1, 1, 6)]);

    let times = decode_times(&[1.5], "days since 2018-01-01")?;
    assert_eq!(times, vec![at(2018, 1, 2, 12)]);

    let times = decode_times(&[30.0], "minutes since 2018-01-01T00:00:00 UTC")?;
    assert_eq!(times[0], at(2018, 1, 1, 0) + chrono::Duration::minutes(30));

    let times = decode_times(&[3600.0], "seconds since 2018-01-01 00:00:00.000 UTC")?;
    assert_eq!(times, vec![at(2018, 1, 1, 1)]);

    assert!(decode_times(&[0.0], "fortnights since 2018-01-01").is_err());
    assert!(decode_times(&[0.0], "hours after 2018-01-01").is_err());
    assert!(decode_times(&[0.0], "hours since yesterday").is_err());
    Ok(())
}

#[test]
fn test_decode_times_rejects_unrepresentable_offsets() {
    // NetCDF default fill value for doubles
    let fill = 9.969_209_968_386_869e36;
    for offset in [fill, -fill, 1.0e15, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            decode_times(&[0.0, offset], "hours since 1970-01-01"),
            Err(GridcastError::InvalidParameter(_))
        ));
    }
    assert!(decode_times(&[], "hours since 1970-01-01").unwrap().is_empty());
}
