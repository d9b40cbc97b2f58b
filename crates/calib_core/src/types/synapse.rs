//! Synapse records and the design matrix built from them.

use super::error::DataError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Uniqueness key of a synapse record: `(voxel, pre, post)`.
///
/// The voxel component is `None` for tables that are not voxel-resolved,
/// in which case the key reduces to the `(pre, post)` neuron pair.
pub type PairKey = (Option<i64>, i64, i64);

/// One row of the simulator's synapse table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynapseRecord {
    /// Voxel identifier, when the table is voxel-resolved.
    pub voxel_id: Option<i64>,
    /// Presynaptic neuron identifier.
    pub pre_id: i64,
    /// Postsynaptic neuron identifier.
    pub post_id: i64,
    /// Observed synapse count (non-negative).
    pub count: f64,
    /// Feature values in feature-contract order.
    pub features: Vec<f64>,
}

impl SynapseRecord {
    /// Create a record without voxel information.
    pub fn new(pre_id: i64, post_id: i64, count: f64, features: Vec<f64>) -> Self {
        Self {
            voxel_id: None,
            pre_id,
            post_id,
            count,
            features,
        }
    }

    /// Attach a voxel identifier.
    pub fn with_voxel(mut self, voxel_id: i64) -> Self {
        self.voxel_id = Some(voxel_id);
        self
    }

    /// Key under which the record must be unique within one run.
    pub fn pair_key(&self) -> PairKey {
        (self.voxel_id, self.pre_id, self.post_id)
    }
}

/// Row-major table of raw (untransformed) feature values.
///
/// Column order is fixed at construction and matches the feature order of
/// the simulator's output contract. Every row has exactly one value per
/// column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignMatrix {
    columns: Vec<String>,
    data: Vec<f64>,
    n_rows: usize,
}

impl DesignMatrix {
    /// Create an empty matrix with the given column names.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            data: Vec::new(),
            n_rows: 0,
        }
    }

    /// Build a matrix from rows, validating their width.
    pub fn from_rows(columns: Vec<String>, rows: &[Vec<f64>]) -> Result<Self, DataError> {
        let mut matrix = Self::new(columns);
        for row in rows {
            matrix.push_row(row)?;
        }
        Ok(matrix)
    }

    /// Append a row.
    pub fn push_row(&mut self, row: &[f64]) -> Result<(), DataError> {
        if row.len() != self.columns.len() {
            return Err(DataError::RaggedRow {
                row: self.n_rows,
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        self.n_rows += 1;
        Ok(())
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of feature columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Borrow row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows()`.
    pub fn row(&self, i: usize) -> &[f64] {
        let w = self.columns.len();
        &self.data[i * w..(i + 1) * w]
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.n_rows).map(move |i| self.row(i))
    }
}

/// Design matrix together with its aligned response vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSet {
    /// Feature rows.
    pub design: DesignMatrix,
    /// Observed counts, one per design row.
    pub responses: Vec<f64>,
}

impl ObservationSet {
    /// Pair a design matrix with responses, enforcing 1:1 alignment.
    pub fn new(design: DesignMatrix, responses: Vec<f64>) -> Result<Self, DataError> {
        if design.n_rows() != responses.len() {
            return Err(DataError::LengthMismatch {
                rows: design.n_rows(),
                responses: responses.len(),
            });
        }
        Ok(Self { design, responses })
    }

    /// Flatten synapse records into an observation set.
    ///
    /// Rows keep the record order; zero-count records are kept because they
    /// are valid observations under a count model. Fails without producing
    /// a partial set if a record has the wrong width, a negative or
    /// non-finite count, or repeats a pair key.
    pub fn from_records(columns: Vec<String>, records: &[SynapseRecord]) -> Result<Self, DataError> {
        let mut design = DesignMatrix::new(columns);
        let mut responses = Vec::with_capacity(records.len());
        let mut seen: HashSet<PairKey> = HashSet::with_capacity(records.len());

        for record in records {
            if !record.count.is_finite() || record.count < 0.0 {
                return Err(DataError::InvalidCount {
                    pre: record.pre_id,
                    post: record.post_id,
                    count: record.count,
                });
            }
            if !seen.insert(record.pair_key()) {
                return Err(DataError::DuplicatePair {
                    voxel: record.voxel_id,
                    pre: record.pre_id,
                    post: record.post_id,
                });
            }
            design.push_row(&record.features)?;
            responses.push(record.count);
        }

        Ok(Self { design, responses })
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Whether the set holds no observations.
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}
