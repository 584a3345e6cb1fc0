//! Raw sample blocks returned by the frame loader.

use crate::errors::{ChronostatError, Result};

/// A dense 2-D block of raw samples.
///
/// Rows are consecutive cycles, columns are within-cycle sample offsets, so
/// the column count equals the channel bitrate. Blocks are produced whole by
/// the frame loader collaborator and never partially filled.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl SampleBlock {
    /// Creates a block from row-major data.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if cols == 0 {
            return Err(ChronostatError::invalid_data(
                "sample block must have at least one column",
            ));
        }
        if data.len() != rows * cols {
            return Err(ChronostatError::invalid_data(format!(
                "sample block data length {} does not match {rows}x{cols}",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Creates a block from a list of equal-length rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(ChronostatError::invalid_data(
                "cannot build a sample block from zero rows",
            ));
        };
        let cols = first.len();
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in &rows {
            if row.len() != cols {
                return Err(ChronostatError::invalid_data(
                    "sample block rows must all have the same length",
                ));
            }
            data.extend_from_slice(row);
        }
        Self::new(rows.len(), cols, data)
    }

    /// Number of cycles (rows) in the block.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of within-cycle offsets (columns) in the block.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns one cycle's samples.
    pub fn row(&self, index: usize) -> &[f64] {
        &self.data[index * self.cols..(index + 1) * self.cols]
    }

    /// Iterates the cycles in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.cols)
    }

    /// Returns a single sample.
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }
}
