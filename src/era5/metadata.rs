//! Archive metadata (`data.json`)

use crate::errors::Result;
use crate::grid::{Grid, ERA5_34_CHANNELS};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::path::Path;

fn default_dims() -> Vec<String> {
    ["time", "channel", "lat", "lon"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

fn default_h5_path() -> String {
    "fields".to_string()
}

const fn default_dhours() -> i64 {
    6
}

/// Coordinates shared by every yearly file of an archive
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Era5Coords {
    pub channel: Vec<String>,
    #[serde(default)]
    pub lat: Vec<f32>,
    #[serde(default)]
    pub lon: Vec<f32>,
}

/// Description of an ERA5 archive as stored in `<root>/data.json`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Era5Metadata {
    pub coords: Era5Coords,
    #[serde(default = "default_dims")]
    pub dims: Vec<String>,
    /// Dataset holding the fields inside every yearly file
    #[serde(default = "default_h5_path")]
    pub h5_path: String,
    #[serde(default)]
    pub attrs: Map<String, JsonValue>,
    /// Hours between consecutive samples
    #[serde(default = "default_dhours")]
    pub dhours: i64,
}

impl Era5Metadata {
    /// Load metadata from a `data.json` file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Built-in metadata of the 34-channel archive on the 721x1440 grid
    pub fn var34() -> Self {
        let grid = Grid::Grid721x1440;
        Self {
            coords: Era5Coords {
                channel: ERA5_34_CHANNELS.iter().map(|c| (*c).to_string()).collect(),
                lat: grid.lat(),
                lon: grid.lon(),
            },
            dims: default_dims(),
            h5_path: default_h5_path(),
            attrs: Map::new(),
            dhours: default_dhours(),
        }
    }

    /// Attributes flattened to strings, JSON strings kept verbatim
    pub fn string_attrs(&self) -> BTreeMap<String, String> {
        self.attrs
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect()
    }
}
