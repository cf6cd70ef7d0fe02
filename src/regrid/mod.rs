//! Regridding between lat/lon grids
//!
//! Interpolation weights come from TempestRemap map files: NetCDF files
//! holding the destination cell centres (`latc_b`, `lonc_b`) and the
//! weights as 1-based COO triplets (`row`, `col`, `S`). The weights are
//! loaded once into a CSR matrix and applied to every `(batch, channel)`
//! plane in parallel.

pub mod sparse;

pub use sparse::SparseMatrix;

use crate::config::Settings;
use crate::errors::{GridcastError, Result};
use crate::field::GriddedField;
use crate::grid::Grid;
use ndarray::{Array4, ArrayView4, IxDyn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Sparse-matrix regridder built from a TempestRemap map file
#[derive(Debug, Clone, PartialEq)]
pub struct TempestRegridder {
    lat: Vec<f32>,
    lon: Vec<f32>,
    matrix: SparseMatrix,
}

impl TempestRegridder {
    /// Build a regridder from destination coordinates and a weight matrix
    pub fn new(lat: Vec<f32>, lon: Vec<f32>, matrix: SparseMatrix) -> Result<Self> {
        if matrix.nrows() != lat.len() * lon.len() {
            return Err(GridcastError::ShapeMismatch {
                expected: format!("{} matrix rows", lat.len() * lon.len()),
                found: vec![matrix.nrows(), matrix.ncols()],
            });
        }
        Ok(Self { lat, lon, matrix })
    }

    /// Load a map file
    pub fn from_file(path: &Path) -> Result<Self> {
        log::debug!("Loading regridding weights from {}", path.display());
        let file = netcdf::open(path)?;
        let variable = |name: &str| {
            file.variable(name)
                .ok_or_else(|| GridcastError::VariableNotFound {
                    var: name.to_string(),
                })
        };

        let lat = variable("latc_b")?.get_values::<f32, _>(..)?;
        let lon = variable("lonc_b")?.get_values::<f32, _>(..)?;
        let rows = to_zero_based(&variable("row")?.get_values::<i32, _>(..)?, "row")?;
        let cols = to_zero_based(&variable("col")?.get_values::<i32, _>(..)?, "col")?;
        let weights: Vec<f32> = variable("S")?
            .get_values::<f64, _>(..)?
            .into_iter()
            .map(|w| w as f32)
            .collect();

        let nrows = rows.iter().max().map_or(0, |m| m + 1);
        let ncols = cols.iter().max().map_or(0, |m| m + 1);
        if nrows == 0 || ncols == 0 {
            return Err(GridcastError::InvalidParameter(format!(
                "map file {} holds no weights",
                path.display()
            )));
        }

        let matrix = SparseMatrix::from_triplets(nrows, ncols, &rows, &cols, &weights)?;
        log::debug!(
            "Regridding matrix {}x{} with {} entries",
            matrix.nrows(),
            matrix.ncols(),
            matrix.nnz()
        );
        let leaky = matrix
            .row_sums()
            .iter()
            .filter(|s| (**s - 1.0).abs() > 1e-3)
            .count();
        if leaky > 0 {
            log::debug!("{leaky} destination cells have weights not summing to 1");
        }
        Self::new(lat, lon, matrix)
    }

    pub fn lat(&self) -> &[f32] {
        &self.lat
    }

    pub fn lon(&self) -> &[f32] {
        &self.lon
    }

    pub fn matrix(&self) -> &SparseMatrix {
        &self.matrix
    }

    /// Regrid `[batch, channel, lat, lon]` onto the destination grid
    pub fn apply(&self, x: ArrayView4<'_, f32>) -> Result<Array4<f32>> {
        let (b, c, h, w) = x.dim();
        if h * w != self.matrix.ncols() {
            return Err(GridcastError::ShapeMismatch {
                expected: format!("source planes of {} points", self.matrix.ncols()),
                found: x.shape().to_vec(),
            });
        }

        let mut out = Array4::<f32>::zeros((b, c, self.lat.len(), self.lon.len()));
        let input = x.as_standard_layout();
        let src = input.as_slice().ok_or("source array is not contiguous")?;
        if src.is_empty() || out.is_empty() {
            return Ok(out);
        }
        let dst = out.as_slice_mut().ok_or("output array is not contiguous")?;

        dst.par_chunks_mut(self.matrix.nrows())
            .zip(src.par_chunks(self.matrix.ncols()))
            .try_for_each(|(o, i)| self.matrix.matvec(i, o))?;

        Ok(out)
    }
}

fn to_zero_based(indices: &[i32], name: &str) -> Result<Vec<usize>> {
    indices
        .iter()
        .map(|&i| {
            usize::try_from(i - 1).map_err(|_| {
                GridcastError::InvalidParameter(format!("'{name}' index {i} is not 1-based"))
            })
        })
        .collect()
}

/// A regridding operator between two grids
#[derive(Debug, Clone, PartialEq)]
pub enum Regridder {
    /// Source and destination grids are the same
    Identity,
    Tempest(TempestRegridder),
}

impl Regridder {
    pub fn apply(&self, x: ArrayView4<'_, f32>) -> Result<Array4<f32>> {
        match self {
            Self::Identity => Ok(x.to_owned()),
            Self::Tempest(regridder) => regridder.apply(x),
        }
    }
}

/// `<map_files>/<src>/<dest>/tempest_map.nc`
pub fn map_file_path(map_files: &Path, src: Grid, dest: Grid) -> PathBuf {
    map_files
        .join(src.value())
        .join(dest.value())
        .join("tempest_map.nc")
}

/// Regridder from `src` to `dest`
pub fn get_regridder(src: Grid, dest: Grid, settings: &Settings) -> Result<Regridder> {
    if src == dest {
        return Ok(Regridder::Identity);
    }
    let path = map_file_path(settings.map_files()?, src, dest);
    Ok(Regridder::Tempest(TempestRegridder::from_file(&path)?))
}

/// Regrid a field whose last two dimensions are latitude and longitude
///
/// Leading dimensions and their coordinates are kept; `lat`/`lon` take the
/// destination coordinates.
pub fn regrid_field(field: &GriddedField, regridder: &Regridder) -> Result<GriddedField> {
    let shape = field.shape().to_vec();
    if shape.len() < 2 {
        return Err(GridcastError::ShapeMismatch {
            expected: "[..., lat, lon]".to_string(),
            found: shape,
        });
    }
    let (leading, spatial) = shape.split_at(shape.len() - 2);
    let planes: usize = leading.iter().product();

    let stacked = field
        .data
        .as_standard_layout()
        .into_shape((planes, 1, spatial[0], spatial[1]))?
        .to_owned();
    let regridded = regridder.apply(stacked.view())?;

    let (_, _, nlat, nlon) = regridded.dim();
    let mut out_shape = leading.to_vec();
    out_shape.extend([nlat, nlon]);
    let data = regridded.into_shape(IxDyn(&out_shape))?;

    let mut out = GriddedField::new(data, field.dims.clone())?;
    out.times = field.times.clone();
    out.channels = field.channels.clone();
    out.attrs = field.attrs.clone();
    match regridder {
        Regridder::Identity => {
            out.lat = field.lat.clone();
            out.lon = field.lon.clone();
        }
        Regridder::Tempest(r) => {
            out.lat = r.lat.clone();
            out.lon = r.lon.clone();
        }
    }
    out.validate()?;
    Ok(out)
}
