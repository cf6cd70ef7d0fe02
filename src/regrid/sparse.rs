//! Compressed sparse row matrices

use crate::errors::{GridcastError, Result};

/// A CSR matrix of `f32` weights
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    nrows: usize,
    ncols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f32>,
}

impl SparseMatrix {
    /// Build from zero-based `(row, col, value)` triplets
    ///
    /// Duplicate coordinates are summed. Column indices within a row are
    /// kept sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the triplet slices differ in length or an index
    /// falls outside `nrows x ncols`.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        rows: &[usize],
        cols: &[usize],
        vals: &[f32],
    ) -> Result<Self> {
        if rows.len() != cols.len() || rows.len() != vals.len() {
            return Err(GridcastError::InvalidParameter(format!(
                "triplet lengths differ: {} rows, {} cols, {} values",
                rows.len(),
                cols.len(),
                vals.len()
            )));
        }
        if let Some((&r, &c)) = rows
            .iter()
            .zip(cols)
            .find(|&(&r, &c)| r >= nrows || c >= ncols)
        {
            return Err(GridcastError::InvalidParameter(format!(
                "entry ({r}, {c}) outside a {nrows}x{ncols} matrix"
            )));
        }

        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.sort_unstable_by_key(|&k| (rows[k], cols[k]));

        let mut indptr = vec![0usize; nrows + 1];
        let mut indices = Vec::with_capacity(order.len());
        let mut values = Vec::with_capacity(order.len());
        let mut last: Option<(usize, usize)> = None;

        for k in order {
            let key = (rows[k], cols[k]);
            if last == Some(key) {
                if let Some(v) = values.last_mut() {
                    *v += vals[k];
                }
                continue;
            }
            indices.push(key.1);
            values.push(vals[k]);
            indptr[key.0 + 1] += 1;
            last = Some(key);
        }
        for i in 0..nrows {
            indptr[i + 1] += indptr[i];
        }

        Ok(Self {
            nrows,
            ncols,
            indptr,
            indices,
            values,
        })
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Sum of the weights of every row
    pub fn row_sums(&self) -> Vec<f32> {
        self.indptr
            .windows(2)
            .map(|w| self.values[w[0]..w[1]].iter().sum())
            .collect()
    }

    /// `out = self * x`
    ///
    /// # Errors
    ///
    /// Returns an error if `x` or `out` has the wrong length.
    pub fn matvec(&self, x: &[f32], out: &mut [f32]) -> Result<()> {
        if x.len() != self.ncols || out.len() != self.nrows {
            return Err(GridcastError::ShapeMismatch {
                expected: format!("input {} / output {}", self.ncols, self.nrows),
                found: vec![x.len(), out.len()],
            });
        }
        for (i, o) in out.iter_mut().enumerate() {
            let span = self.indptr[i]..self.indptr[i + 1];
            *o = self.indices[span.clone()]
                .iter()
                .zip(&self.values[span])
                .map(|(&j, &w)| w * x[j])
                .sum();
        }
        Ok(())
    }
}
