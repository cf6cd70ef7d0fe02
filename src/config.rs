//! Runtime settings: data roots and map-file locations
//!
//! Values come from an optional TOML file and from the environment
//! (`MAP_FILES`, `ERA5_HDF5_34`, `ERA5_HDF5_73`); the environment wins.

use crate::errors::{GridcastError, Result};
use crate::grid::ChannelSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const MAP_FILES_VAR: &str = "MAP_FILES";
pub const ERA5_HDF5_34_VAR: &str = "ERA5_HDF5_34";
pub const ERA5_HDF5_73_VAR: &str = "ERA5_HDF5_73";

/// Locations of the data the toolkit reads
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub map_files: Option<PathBuf>,
    pub era5_hdf5_34: Option<PathBuf>,
    pub era5_hdf5_73: Option<PathBuf>,
}

impl Settings {
    /// Settings from environment variables only
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Settings from a TOML file, then overridden by the environment
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&content)?;
        Ok(settings.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Parse settings from TOML text without consulting the environment
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from a key lookup (the process environment in practice)
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        if let Some(p) = get(MAP_FILES_VAR) {
            self.map_files = Some(p);
        }
        if let Some(p) = get(ERA5_HDF5_34_VAR) {
            self.era5_hdf5_34 = Some(p);
        }
        if let Some(p) = get(ERA5_HDF5_73_VAR) {
            self.era5_hdf5_73 = Some(p);
        }
        self
    }

    /// Directory holding `<src>/<dest>/tempest_map.nc` files
    pub fn map_files(&self) -> Result<&Path> {
        self.map_files
            .as_deref()
            .ok_or_else(|| GridcastError::ConfigError(format!("{MAP_FILES_VAR} is not set")))
    }

    /// Archive root for a channel set
    pub fn data_root(&self, channel_set: ChannelSet) -> Result<&Path> {
        let (value, key) = match channel_set {
            ChannelSet::Var34 => (&self.era5_hdf5_34, ERA5_HDF5_34_VAR),
            ChannelSet::Var73 => (&self.era5_hdf5_73, ERA5_HDF5_73_VAR),
        };
        value
            .as_deref()
            .ok_or_else(|| GridcastError::ConfigError(format!("{key} is not set")))
    }
}
