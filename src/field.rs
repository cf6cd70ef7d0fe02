//! Gridded fields with named dimensions and coordinates

use crate::errors::{GridcastError, Result};
use chrono::NaiveDateTime;
use ndarray::{ArrayD, Axis};
use std::collections::BTreeMap;

/// An n-dimensional `f32` field with named dimensions
///
/// Coordinates are optional: a field read from a bare NetCDF variable may
/// only carry its dimension names. When present, `times`, `channels`, `lat`
/// and `lon` match the length of the dimension of the same name.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedField {
    pub data: ArrayD<f32>,
    pub dims: Vec<String>,
    pub times: Vec<NaiveDateTime>,
    pub channels: Vec<String>,
    pub lat: Vec<f32>,
    pub lon: Vec<f32>,
    pub attrs: BTreeMap<String, String>,
}

impl GriddedField {
    /// Wrap an array with dimension names
    pub fn new(data: ArrayD<f32>, dims: Vec<String>) -> Result<Self> {
        if dims.len() != data.ndim() {
            return Err(GridcastError::ShapeMismatch {
                expected: format!("{} named dimensions", dims.len()),
                found: data.shape().to_vec(),
            });
        }
        Ok(Self {
            data,
            dims,
            times: Vec::new(),
            channels: Vec::new(),
            lat: Vec::new(),
            lon: Vec::new(),
            attrs: BTreeMap::new(),
        })
    }

    /// Index of a named dimension
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Select a single channel by name, dropping the `channel` dimension
    pub fn select_channel(&self, channel: &str) -> Result<GriddedField> {
        let axis = self
            .axis_of("channel")
            .ok_or_else(|| GridcastError::DimensionNotFound {
                var: "field".to_string(),
                dim: "channel".to_string(),
            })?;
        let index = self
            .channels
            .iter()
            .position(|c| c == channel)
            .ok_or_else(|| GridcastError::ChannelNotFound {
                channel: channel.to_string(),
            })?;

        let data = self.data.index_axis(Axis(axis), index).to_owned();
        let mut dims = self.dims.clone();
        dims.remove(axis);

        Ok(GriddedField {
            data,
            dims,
            times: self.times.clone(),
            channels: Vec::new(),
            lat: self.lat.clone(),
            lon: self.lon.clone(),
            attrs: self.attrs.clone(),
        })
    }

    /// Check that every coordinate present matches its dimension length
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("time", self.times.len()),
            ("channel", self.channels.len()),
            ("lat", self.lat.len()),
            ("lon", self.lon.len()),
        ];
        for (dim, len) in checks {
            if len == 0 {
                continue;
            }
            match self.axis_of(dim) {
                Some(axis) if self.data.len_of(Axis(axis)) == len => {}
                _ => {
                    return Err(GridcastError::ShapeMismatch {
                        expected: format!("dimension '{dim}' of length {len}"),
                        found: self.data.shape().to_vec(),
                    })
                }
            }
        }
        Ok(())
    }
}
