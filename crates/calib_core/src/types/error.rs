//! Error types for data-model invariants.

use thiserror::Error;

/// Violations of the shape invariants of design matrices and observation sets.
///
/// # Examples
/// ```
/// use calib_core::types::DataError;
///
/// let err = DataError::RaggedRow { row: 3, expected: 3, found: 2 };
/// assert!(format!("{}", err).contains("row 3"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// A feature row does not have one value per design column.
    #[error("Ragged design row {row}: expected {expected} features, found {found}")]
    RaggedRow {
        /// Zero-based row index
        row: usize,
        /// Number of design columns
        expected: usize,
        /// Number of values supplied
        found: usize,
    },

    /// Design rows and responses are not aligned 1:1.
    #[error("Design matrix has {rows} rows but {responses} responses were supplied")]
    LengthMismatch {
        /// Number of design rows
        rows: usize,
        /// Number of responses
        responses: usize,
    },

    /// The same synapse pair occurs twice within one run.
    #[error("Duplicate synapse pair (voxel {voxel:?}, pre {pre}, post {post})")]
    DuplicatePair {
        /// Voxel identifier, when the table is voxel-resolved
        voxel: Option<i64>,
        /// Presynaptic neuron identifier
        pre: i64,
        /// Postsynaptic neuron identifier
        post: i64,
    },

    /// A synapse count is negative or not finite.
    #[error("Invalid synapse count {count} for pair (pre {pre}, post {post})")]
    InvalidCount {
        /// Presynaptic neuron identifier
        pre: i64,
        /// Postsynaptic neuron identifier
        post: i64,
        /// Offending count
        count: f64,
    },
}
