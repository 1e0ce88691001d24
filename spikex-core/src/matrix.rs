use ndarray::{Array2, ArrayView1, Axis};
use serde::Serialize;

use crate::error::CoreError;

/// Spike counts stored as `[stimulus][channel]`.
///
/// Channel `n` (1-based, as numbered by the acquisition hardware) lives in
/// column `n - 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CountMatrix(Array2<u32>);

impl CountMatrix {
    pub fn zeros(stimuli: usize, channels: usize) -> Self {
        Self(Array2::zeros((stimuli, channels)))
    }

    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self, CoreError> {
        let width = rows.first().map_or(0, Vec::len);
        let mut m = Array2::zeros((rows.len(), width));
        for (r, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(CoreError::RaggedRows {
                    row: r,
                    got: row.len(),
                    expected: width,
                });
            }
            for (c, &v) in row.iter().enumerate() {
                m[[r, c]] = v;
            }
        }
        Ok(Self(m))
    }

    /// `(stimuli, channels)`
    pub fn shape(&self) -> (usize, usize) {
        self.0.dim()
    }

    pub fn stimuli(&self) -> usize {
        self.0.nrows()
    }

    pub fn channels(&self) -> usize {
        self.0.ncols()
    }

    pub fn get(&self, stimulus: usize, channel_index: usize) -> Option<u32> {
        self.0.get((stimulus, channel_index)).copied()
    }

    /// Adds one to the cell; returns false if the cell is out of range
    pub fn increment(&mut self, stimulus: usize, channel_index: usize) -> bool {
        match self.0.get_mut((stimulus, channel_index)) {
            Some(v) => {
                *v += 1;
                true
            }
            None => false,
        }
    }

    pub fn column(&self, channel_index: usize) -> ArrayView1<'_, u32> {
        self.0.column(channel_index)
    }

    pub fn row(&self, stimulus: usize) -> ArrayView1<'_, u32> {
        self.0.row(stimulus)
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|&v| v as u64).sum()
    }

    pub fn max(&self) -> u32 {
        self.0.iter().copied().max().unwrap_or(0)
    }

    /// Total count per channel across all stimuli
    pub fn channel_totals(&self) -> Vec<u64> {
        self.0
            .map(|&v| v as u64)
            .sum_axis(Axis(0))
            .to_vec()
    }

    /// New matrix whose column `c` is column `source_for_column[c]` of this one
    pub fn permute_channels(&self, source_for_column: &[usize]) -> Self {
        Self(self.0.select(Axis(1), source_for_column))
    }

    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.0.outer_iter().map(|r| r.to_vec()).collect()
    }

    pub fn as_array(&self) -> &Array2<u32> {
        &self.0
    }
}

impl From<Array2<u32>> for CountMatrix {
    fn from(a: Array2<u32>) -> Self {
        Self(a)
    }
}
