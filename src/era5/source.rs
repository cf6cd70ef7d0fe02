//! Timestamp-addressed access to an ERA5 HDF5 archive

use super::archive::YearFile;
use super::metadata::Era5Metadata;
use super::{ensure_local, get_path};
use crate::errors::{GridcastError, Result};
use crate::field::GriddedField;
use chrono::NaiveDateTime;
use ndarray::ArrayD;
use std::path::{Path, PathBuf};

/// An ERA5 archive addressed by timestamp
#[derive(Debug, Clone)]
pub struct HDF5DataSource {
    pub root: PathBuf,
    pub metadata: Era5Metadata,
    /// Number of earlier samples returned along with the requested one
    pub n_history: usize,
}

impl HDF5DataSource {
    pub fn new(root: PathBuf, metadata: Era5Metadata, n_history: usize) -> Self {
        Self {
            root,
            metadata,
            n_history,
        }
    }

    /// Open an archive, reading `<root>/data.json`
    pub fn from_path(root: &Path, n_history: usize) -> Result<Self> {
        ensure_local(root)?;
        let metadata = Era5Metadata::from_file(&root.join("data.json"))?;
        Ok(Self::new(root.to_path_buf(), metadata, n_history))
    }

    pub fn channel_names(&self) -> &[String] {
        &self.metadata.coords.channel
    }

    /// Climatological means from `<root>/stats/time_means.npy`
    ///
    /// Stored as `float32` normally; `float64` files are converted.
    pub fn time_means(&self) -> Result<ArrayD<f32>> {
        let path = self.root.join("stats").join("time_means.npy");
        match ndarray_npy::read_npy::<_, ArrayD<f32>>(&path) {
            Ok(means) => Ok(means),
            Err(err) => match ndarray_npy::read_npy::<_, ArrayD<f64>>(&path) {
                Ok(means) => Ok(means.mapv(|v| v as f32)),
                Err(_) => Err(err.into()),
            },
        }
    }

    /// The `n_history + 1` samples ending at the last one not after `time`
    pub fn get(&self, time: NaiveDateTime) -> Result<GriddedField> {
        let path = get_path(&self.root, time)?;
        log::debug!("Opening {} for {}.", path.display(), time);

        let year_file = YearFile::open(&path, &self.metadata)?;
        let times = year_file.times();

        let end = times.iter().take_while(|t| **t <= time).count();
        let wanted = self.n_history + 1;
        let start = end.saturating_sub(wanted);
        let found = end - start;

        if found != wanted {
            let fmt = |t: Option<&NaiveDateTime>| {
                t.map_or_else(|| "n/a".to_string(), |t| t.format("%Y-%m-%dT%H:%M:%S").to_string())
            };
            return Err(GridcastError::TimeRange {
                found,
                expected: wanted,
                requested: time.format("%Y-%m-%dT%H:%M:%S").to_string(),
                start: fmt(times.first()),
                end: fmt(times.last()),
            });
        }

        year_file.read(start..end)
    }
}
