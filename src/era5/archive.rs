//! Yearly archive files
//!
//! Each file `<YYYY>.h5` holds one `[time, channel, lat, lon]` dataset whose
//! time axis starts on January 1st of that year, sampled every `dhours`.

use super::metadata::Era5Metadata;
use crate::errors::{GridcastError, Result};
use crate::field::GriddedField;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use ndarray::ArrayD;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// An opened yearly archive file
pub struct YearFile {
    path: PathBuf,
    file: netcdf::File,
    metadata: Era5Metadata,
    shape: [usize; 4],
    times: Vec<NaiveDateTime>,
}

impl YearFile {
    /// Open a yearly file and derive its time axis from the file name
    pub fn open(path: &Path, metadata: &Era5Metadata) -> Result<Self> {
        let year = year_from_path(path)?;
        let file = netcdf::open(path)?;

        let shape = {
            let var = file.variable(&metadata.h5_path).ok_or_else(|| {
                GridcastError::VariableNotFound {
                    var: metadata.h5_path.clone(),
                }
            })?;
            let dims: Vec<usize> = var.dimensions().iter().map(netcdf::Dimension::len).collect();
            if dims.len() != 4 {
                return Err(GridcastError::ShapeMismatch {
                    expected: "[time, channel, lat, lon]".to_string(),
                    found: dims,
                });
            }
            [dims[0], dims[1], dims[2], dims[3]]
        };

        if metadata.coords.channel.len() != shape[1] {
            return Err(GridcastError::ShapeMismatch {
                expected: format!("{} channels", metadata.coords.channel.len()),
                found: shape.to_vec(),
            });
        }

        let times = time_axis(year, shape[0], metadata.dhours)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            metadata: metadata.clone(),
            shape,
            times,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// `[time, channel, lat, lon]`
    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    /// Load the time steps in `range`
    pub fn read(&self, range: Range<usize>) -> Result<GriddedField> {
        let [nt, nc, nlat, nlon] = self.shape;
        if range.start > range.end || range.end > nt {
            return Err(GridcastError::InvalidSlice {
                message: format!("time range {range:?} outside of 0..{nt}"),
            });
        }

        let var = self.file.variable(&self.metadata.h5_path).ok_or_else(|| {
            GridcastError::VariableNotFound {
                var: self.metadata.h5_path.clone(),
            }
        })?;
        let n = range.len();
        let values = if n == 0 {
            Vec::new()
        } else {
            var.get_values::<f32, _>((range.clone(), 0..nc, 0..nlat, 0..nlon))?
        };
        let data = ArrayD::from_shape_vec(vec![n, nc, nlat, nlon], values)?;

        let dims = if self.metadata.dims.len() == 4 {
            self.metadata.dims.clone()
        } else {
            ["time", "channel", "lat", "lon"]
                .iter()
                .map(|s| (*s).to_string())
                .collect()
        };

        let mut field = GriddedField::new(data, dims)?;
        field.times = self.times[range].to_vec();
        field.channels = self.metadata.coords.channel.clone();
        field.lat = self.metadata.coords.lat.clone();
        field.lon = self.metadata.coords.lon.clone();
        field.attrs = self.metadata.string_attrs();
        field
            .attrs
            .insert("path".to_string(), self.path.display().to_string());
        field.validate()?;
        Ok(field)
    }

    /// Load every time step of the year
    pub fn read_all(&self) -> Result<GriddedField> {
        self.read(0..self.shape[0])
    }
}

/// Year encoded in a `<YYYY>.h5` file name
pub fn year_from_path(path: &Path) -> Result<i32> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.parse::<i32>().ok())
        .ok_or_else(|| {
            GridcastError::InvalidParameter(format!(
                "archive file name '{}' is not of the form <YYYY>.h5",
                path.display()
            ))
        })
}

/// `n` timestamps starting at January 1st 00:00 of `year`, `dhours` apart
pub fn time_axis(year: i32, n: usize, dhours: i64) -> Result<Vec<NaiveDateTime>> {
    if dhours <= 0 {
        return Err(GridcastError::InvalidParameter(format!(
            "time step must be positive, got {dhours} hours"
        )));
    }
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| GridcastError::InvalidParameter(format!("invalid year {year}")))?;
    Ok((0..n)
        .map(|i| start + Duration::hours(dhours * i as i64))
        .collect())
}
