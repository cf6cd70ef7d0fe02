//! Grid and channel-set definitions
//!
//! Regular latitude/longitude grids used by the forecast models and the
//! ERA5 archives, named the same way map-file directories are named.

use crate::errors::{GridcastError, Result};
use std::fmt;
use std::str::FromStr;

/// Channels of the 34-variable ERA5 archive, in file order
pub const ERA5_34_CHANNELS: [&str; 34] = [
    "u10", "v10", "t2m", "sp", "msl", "t850", "u1000", "v1000", "z1000", "u850", "v850", "z850",
    "u500", "v500", "z500", "t500", "z50", "r500", "r850", "tcwv", "u100m", "v100m", "u250",
    "v250", "z250", "t250", "u100", "v100", "z100", "t100", "u900", "v900", "z900", "t900",
];

/// Supported regular lat/lon grids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grid {
    /// 0.25 degree grid including both poles
    Grid721x1440,
    /// 0.25 degree grid without the south pole row
    Grid720x1440,
    /// 1.5 degree subseasonal-to-seasonal verification grid
    S2s,
}

impl Grid {
    /// Name used for map-file directories
    pub const fn value(self) -> &'static str {
        match self {
            Self::Grid721x1440 => "721x1440",
            Self::Grid720x1440 => "720x1440",
            Self::S2s => "s2s",
        }
    }

    /// `(nlat, nlon)`
    pub const fn shape(self) -> (usize, usize) {
        match self {
            Self::Grid721x1440 => (721, 1440),
            Self::Grid720x1440 => (720, 1440),
            Self::S2s => (121, 240),
        }
    }

    const fn spacing(self) -> f32 {
        match self {
            Self::Grid721x1440 | Self::Grid720x1440 => 0.25,
            Self::S2s => 1.5,
        }
    }

    /// Latitudes in degrees, north to south
    pub fn lat(self) -> Vec<f32> {
        let (nlat, _) = self.shape();
        let d = self.spacing();
        (0..nlat).map(|i| 90.0 - d * i as f32).collect()
    }

    /// Longitudes in degrees east, starting at 0
    pub fn lon(self) -> Vec<f32> {
        let (_, nlon) = self.shape();
        let d = self.spacing();
        (0..nlon).map(|j| d * j as f32).collect()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

impl FromStr for Grid {
    type Err = GridcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "721x1440" | "grid_721x1440" => Ok(Self::Grid721x1440),
            "720x1440" | "grid_720x1440" => Ok(Self::Grid720x1440),
            "s2s" | "s2s_challenge" => Ok(Self::S2s),
            other => Err(GridcastError::InvalidParameter(format!(
                "unknown grid '{other}', expected one of 721x1440, 720x1440, s2s"
            ))),
        }
    }
}

/// ERA5 archive flavours, each with its own data root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelSet {
    Var34,
    Var73,
}

impl ChannelSet {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Var34 => "34var",
            Self::Var73 => "73var",
        }
    }
}

impl FromStr for ChannelSet {
    type Err = GridcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "34var" | "var34" => Ok(Self::Var34),
            "73var" | "var73" => Ok(Self::Var73),
            other => Err(GridcastError::InvalidParameter(format!(
                "unknown channel set '{other}', expected 34var or 73var"
            ))),
        }
    }
}
