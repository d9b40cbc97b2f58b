//! Writers producing files in the simulator's output format.
//!
//! Used by in-process backends and the synthetic demo so that their output
//! goes through the same reader as a real run.

use crate::contract::FeatureContract;
use crate::error::LoaderError;
use calib_core::types::{StatisticResult, SynapseRecord};
use serde_json::{json, Map, Value};
use std::path::Path;

/// Writes `synapses.csv`.
#[derive(Debug, Clone, Default)]
pub struct SynapseTableWriter {
    contract: FeatureContract,
}

impl SynapseTableWriter {
    /// Create a writer for a column layout.
    pub fn new(contract: FeatureContract) -> Self {
        Self { contract }
    }

    /// Write `records` to `path`, sorted by voxel, then pre, then post id.
    ///
    /// Voxel columns are written only when the contract names one and at
    /// least one record carries a voxel id.
    pub fn write(&self, path: &Path, records: &[SynapseRecord]) -> Result<(), LoaderError> {
        let csv_err = |source: csv::Error| LoaderError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut sorted: Vec<&SynapseRecord> = records.iter().collect();
        sorted.sort_by_key(|r| r.pair_key());

        let voxel_column = self
            .contract
            .voxel_id
            .as_deref()
            .filter(|_| records.iter().any(|r| r.voxel_id.is_some()));

        let mut header: Vec<&str> = Vec::new();
        if let Some(voxel) = voxel_column {
            header.extend([voxel, "voxelX", "voxelY", "voxelZ"]);
        }
        header.push(&self.contract.pre_id);
        header.push(&self.contract.post_id);
        header.extend(self.contract.features.iter().map(String::as_str));
        header.push(&self.contract.response);

        let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
        writer.write_record(&header).map_err(csv_err)?;

        for record in sorted {
            if record.features.len() != self.contract.n_features() {
                return Err(LoaderError::parse(
                    path,
                    0,
                    format!("{:?}", record),
                    format!(
                        "record has {} features, layout has {}",
                        record.features.len(),
                        self.contract.n_features()
                    ),
                ));
            }
            let mut fields: Vec<String> = Vec::with_capacity(header.len());
            if voxel_column.is_some() {
                fields.push(record.voxel_id.unwrap_or(0).to_string());
                fields.extend(["0", "0", "0"].map(String::from));
            }
            fields.push(record.pre_id.to_string());
            fields.push(record.post_id.to_string());
            fields.extend(record.features.iter().map(|v| v.to_string()));
            fields.push(record.count.to_string());
            writer.write_record(&fields).map_err(csv_err)?;
        }

        writer
            .flush()
            .map_err(|e| LoaderError::io(path, e))?;
        Ok(())
    }
}

/// Writes `summaryStatistics.json`.
pub struct SummaryStatisticsWriter;

impl SummaryStatisticsWriter {
    /// Write a report echoing `generation_parameters` and one entry per
    /// statistic.
    pub fn write(
        path: &Path,
        generation_parameters: &Value,
        statistics: &[StatisticResult],
    ) -> Result<(), LoaderError> {
        let entries: Vec<Value> = statistics.iter().map(entry).collect();
        let document = json!({
            "GENERATION_PARAMETERS": generation_parameters,
            "SUMMARY_STATISTICS": entries,
        });
        let text = serde_json::to_string_pretty(&document).map_err(|e| {
            LoaderError::InvalidSummary {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;
        std::fs::write(path, text).map_err(|e| LoaderError::io(path, e))
    }
}

fn entry(stat: &StatisticResult) -> Value {
    let mut map = Map::new();
    map.insert("STATISTIC_NAME".to_string(), Value::String(stat.name.clone()));
    let status = stat
        .message
        .clone()
        .unwrap_or_else(|| stat.status.as_str().to_string());
    map.insert("STATUS".to_string(), Value::String(status));
    let result = stat.detail.clone().or_else(|| {
        stat.value
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
    });
    if let Some(result) = result {
        map.insert("RESULT".to_string(), result);
    }
    Value::Object(map)
}
