//! ERA5 reanalysis data source
//!
//! Archives are laid out as
//!
//! ```text
//! <root>/data.json               archive metadata
//! <root>/stats/time_means.npy    climatological means
//! <root>/<subset>/<YYYY>.h5      one file per year, e.g. train/2017.h5
//! ```
//!
//! [`HDF5DataSource`] addresses the archive by timestamp and returns the
//! most recent `n_history + 1` samples at or before that time.

pub mod archive;
pub mod legacy;
pub mod metadata;
pub mod source;

pub use archive::{time_axis, year_from_path, YearFile};
#[allow(deprecated)]
pub use legacy::open_era5;
pub use metadata::{Era5Coords, Era5Metadata};
pub use source::HDF5DataSource;

use crate::errors::{GridcastError, Result};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const REMOTE_PREFIXES: [&str; 3] = ["s3://", "gs://", "https://"];

/// Reject object-store URLs; only local (or mounted) archives are readable
pub fn ensure_local(root: &Path) -> Result<()> {
    let s = root.to_string_lossy();
    if REMOTE_PREFIXES.iter().any(|p| s.starts_with(p)) {
        return Err(GridcastError::UnsupportedLocation(s.into_owned()));
    }
    Ok(())
}

/// Locate `<root>/*/<YYYY>.h5` for the year of `time`
pub fn get_path(root: &Path, time: NaiveDateTime) -> Result<PathBuf> {
    find_year_file(root, time, &["h5"])
}

/// Locate the yearly file for `time` among files with the given extensions
///
/// Extensions are tried in order. Subdirectories are scanned in name order
/// and a later subdirectory wins when two hold the same year.
pub fn find_year_file(root: &Path, time: NaiveDateTime, extensions: &[&str]) -> Result<PathBuf> {
    ensure_local(root)?;
    let files = list_year_files(root)?;
    let year = time.format("%Y").to_string();

    for ext in extensions {
        let filename = format!("{year}.{ext}");
        if let Some(path) = files.get(&filename) {
            return Ok(path.clone());
        }
    }

    Err(GridcastError::ArchiveFileNotFound {
        root: root.to_path_buf(),
        filename: format!("{year}.{}", extensions.first().copied().unwrap_or("h5")),
    })
}

/// Map of file name to path for every file one directory below `root`
fn list_year_files(root: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let mut subdirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            subdirs.push(path);
        }
    }
    subdirs.sort();

    let mut files = BTreeMap::new();
    for dir in subdirs {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.insert(name.to_string(), path.clone());
            }
        }
    }
    Ok(files)
}
