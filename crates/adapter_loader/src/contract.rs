//! Column layout of the synapse table.

use serde::{Deserialize, Serialize};

/// Names of the columns the collector reads from `synapses.csv`.
///
/// Columns are looked up by header name, so their position in the file and
/// any additional columns do not matter. Feature order here is the column
/// order of the resulting design matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureContract {
    /// Response (synapse count) column.
    pub response: String,
    /// Feature columns, in design order.
    pub features: Vec<String>,
    /// Presynaptic neuron id column.
    pub pre_id: String,
    /// Postsynaptic neuron id column.
    pub post_id: String,
    /// Voxel id column, read when present in the header.
    pub voxel_id: Option<String>,
}

impl Default for FeatureContract {
    /// The simulator's layout: `pre` (boutons), `post` (postsynaptic
    /// targets) and `postAll` (all postsynaptic targets) predicting `count`.
    fn default() -> Self {
        Self {
            response: "count".to_string(),
            features: vec!["pre".to_string(), "post".to_string(), "postAll".to_string()],
            pre_id: "presynapticNeuronID".to_string(),
            post_id: "postsynapticNeuronID".to_string(),
            voxel_id: Some("voxelID".to_string()),
        }
    }
}

impl FeatureContract {
    /// Contract with the default id columns and custom response/features.
    pub fn new<S: Into<String>>(response: impl Into<String>, features: impl IntoIterator<Item = S>) -> Self {
        Self {
            response: response.into(),
            features: features.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Drop the voxel column from the uniqueness key.
    pub fn without_voxels(mut self) -> Self {
        self.voxel_id = None;
        self
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.features.len()
    }
}
