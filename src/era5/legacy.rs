//! Whole-year loader kept for older callers

use super::archive::YearFile;
use super::find_year_file;
use super::metadata::Era5Metadata;
use crate::config::Settings;
use crate::errors::Result;
use crate::field::GriddedField;
use crate::grid::ChannelSet;
use crate::netcdf_io::read_field;
use chrono::NaiveDateTime;

/// Load the full year containing `time` for a channel set
///
/// `.h5` archives of the 34-channel set use built-in metadata, 73-channel
/// archives read `data.json` from the 73-channel root. `.nc` files are read
/// through their `fields` variable.
#[deprecated(since = "0.1.0", note = "Use `HDF5DataSource::get` instead")]
pub fn open_era5(
    time: NaiveDateTime,
    channel_set: ChannelSet,
    settings: &Settings,
) -> Result<GriddedField> {
    log::warn!("open_era5 is deprecated and will be removed, use HDF5DataSource");

    let root = settings.data_root(channel_set)?;
    let path = find_year_file(root, time, &["h5", "nc"])?;
    log::debug!("Opening {} for {}.", path.display(), time);

    if path.extension().and_then(|e| e.to_str()) == Some("nc") {
        return read_field(&path, "fields");
    }

    let metadata = match channel_set {
        ChannelSet::Var34 => Era5Metadata::var34(),
        ChannelSet::Var73 => {
            let root73 = settings.data_root(ChannelSet::Var73)?;
            Era5Metadata::from_file(&root73.join("data.json"))?
        }
    };
    YearFile::open(&path, &metadata)?.read_all()
}
