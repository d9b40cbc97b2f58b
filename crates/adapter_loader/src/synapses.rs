//! `synapses.csv` reader.

use crate::contract::FeatureContract;
use crate::error::LoaderError;
use calib_core::types::{PairKey, SynapseRecord};
use std::collections::HashSet;
use std::path::Path;

/// File name of the synapse table inside a run directory.
pub const SYNAPSES_FILE: &str = "synapses.csv";

/// Header positions of the contract's columns.
struct ColumnIndex {
    pre_id: usize,
    post_id: usize,
    voxel_id: Option<usize>,
    response: usize,
    features: Vec<usize>,
}

impl ColumnIndex {
    fn resolve(
        path: &Path,
        headers: &csv::StringRecord,
        contract: &FeatureContract,
    ) -> Result<Self, LoaderError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| LoaderError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
        };

        Ok(Self {
            pre_id: require(contract.pre_id.as_str())?,
            post_id: require(contract.post_id.as_str())?,
            voxel_id: contract.voxel_id.as_deref().and_then(find),
            response: require(contract.response.as_str())?,
            features: contract
                .features
                .iter()
                .map(|f| require(f.as_str()))
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Read the synapse table at `path`.
pub(crate) fn read_synapses(
    path: &Path,
    contract: &FeatureContract,
) -> Result<Vec<SynapseRecord>, LoaderError> {
    if !path.exists() {
        return Err(LoaderError::FileNotFound(path.to_path_buf()));
    }

    let csv_err = |source: csv::Error| LoaderError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let headers = reader.headers().map_err(csv_err)?.clone();
    let columns = ColumnIndex::resolve(path, &headers, contract)?;

    let mut records = Vec::new();
    let mut seen: HashSet<PairKey> = HashSet::new();
    let mut row = csv::StringRecord::new();

    while reader.read_record(&mut row).map_err(csv_err)? {
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let fail = |message: String| {
            LoaderError::parse(path, line, row.iter().collect::<Vec<_>>().join(","), message)
        };

        if row.len() != headers.len() {
            return Err(fail(format!(
                "expected {} columns, found {}",
                headers.len(),
                row.len()
            )));
        }

        let field = |i: usize| row.get(i).unwrap_or("");
        let parse_id = |i: usize, name: &str| {
            field(i)
                .parse::<i64>()
                .map_err(|_| fail(format!("'{}' is not an integer id: '{}'", name, field(i))))
        };

        let pre_id = parse_id(columns.pre_id, contract.pre_id.as_str())?;
        let post_id = parse_id(columns.post_id, contract.post_id.as_str())?;
        let voxel_id = match (columns.voxel_id, contract.voxel_id.as_deref()) {
            (Some(i), Some(name)) => Some(parse_id(i, name)?),
            _ => None,
        };

        let count = field(columns.response)
            .parse::<f64>()
            .map_err(|_| fail(format!("count is not a number: '{}'", field(columns.response))))?;
        if !count.is_finite() || count < 0.0 {
            return Err(fail(format!("count must be finite and non-negative, got {}", count)));
        }

        let mut features = Vec::with_capacity(columns.features.len());
        for (&i, name) in columns.features.iter().zip(&contract.features) {
            let value = field(i).parse::<f64>().ok().filter(|v| v.is_finite());
            match value {
                Some(v) => features.push(v),
                None => {
                    return Err(fail(format!(
                        "feature '{}' is not a finite number: '{}'",
                        name,
                        field(i)
                    )))
                }
            }
        }

        let record = SynapseRecord {
            voxel_id,
            pre_id,
            post_id,
            count,
            features,
        };
        if !seen.insert(record.pair_key()) {
            return Err(fail(format!(
                "duplicate pair (voxel {:?}, pre {}, post {})",
                voxel_id, pre_id, post_id
            )));
        }
        records.push(record);
    }

    tracing::debug!(path = %path.display(), rows = records.len(), "synapse table read");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const HEADER: &str =
        "voxelID,voxelX,voxelY,voxelZ,presynapticNeuronID,postsynapticNeuronID,pre,post,postAll,count";

    #[test]
    fn test_reads_simulator_layout() {
        let file = write(&format!(
            "{}\n1,0,0,0,10,20,2.5,3,12,1\n1,0,0,0,10,21,2.5,0,12,0\n",
            HEADER
        ));
        let records = read_synapses(file.path(), &FeatureContract::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].voxel_id, Some(1));
        assert_eq!(records[0].features, vec![2.5, 3.0, 12.0]);
        assert_eq!(records[1].count, 0.0);
    }

    #[test]
    fn test_columns_resolved_by_name() {
        let file = write("count,postAll,post,pre,postsynapticNeuronID,presynapticNeuronID\n4,8,2,1,7,6\n");
        let records = read_synapses(file.path(), &FeatureContract::default()).unwrap();
        assert_eq!(records[0].pre_id, 6);
        assert_eq!(records[0].post_id, 7);
        assert_eq!(records[0].voxel_id, None);
        assert_eq!(records[0].features, vec![1.0, 2.0, 8.0]);
        assert_eq!(records[0].count, 4.0);
    }

    #[test]
    fn test_negative_count_reports_line() {
        let file = write(&format!(
            "{}\n1,0,0,0,10,20,2,3,12,1\n1,0,0,0,10,21,2,3,12,-1\n",
            HEADER
        ));
        match read_synapses(file.path(), &FeatureContract::default()).unwrap_err() {
            LoaderError::Parse { line, row, .. } => {
                assert_eq!(line, 3);
                assert!(row.ends_with("-1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_column() {
        let file = write("presynapticNeuronID,postsynapticNeuronID,pre,post,count\n1,2,3,4,5\n");
        let err = read_synapses(file.path(), &FeatureContract::default()).unwrap_err();
        assert!(matches!(err, LoaderError::MissingColumn { ref column, .. } if column == "postAll"));
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let file = write(&format!(
            "{}\n1,0,0,0,10,20,2,3,12,1\n1,0,0,0,10,20,2,3,12,1\n",
            HEADER
        ));
        let err = read_synapses(file.path(), &FeatureContract::default()).unwrap_err();
        assert!(err.to_string().contains("duplicate pair"));
    }

    #[test]
    fn test_same_pair_in_other_voxel_is_distinct() {
        let file = write(&format!(
            "{}\n1,0,0,0,10,20,2,3,12,1\n2,0,0,0,10,20,2,3,12,1\n",
            HEADER
        ));
        assert_eq!(
            read_synapses(file.path(), &FeatureContract::default()).unwrap().len(),
            2
        );
    }
}
