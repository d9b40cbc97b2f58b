//! Integration tests for collecting simulator outputs from a run directory.

use adapter_loader::{
    FeatureContract, LoaderError, ResultCollector, SummaryStatisticsWriter, SynapseTableWriter,
    SUMMARY_FILE, SYNAPSES_FILE,
};
use calib_core::types::{StatisticResult, StatisticStatus, SynapseRecord};
use proptest::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn sample_records() -> Vec<SynapseRecord> {
    vec![
        SynapseRecord::new(2, 100, 3.0, vec![4.0, 2.0, 8.0]).with_voxel(7),
        SynapseRecord::new(1, 101, 0.0, vec![1.0, 0.5, 9.0]).with_voxel(7),
        SynapseRecord::new(1, 100, 1.0, vec![2.0, 1.0, 2.0]).with_voxel(3),
    ]
}

// ============================================================================
// Synapse table
// ============================================================================

#[test]
fn test_written_table_is_read_back_sorted() {
    let tmp = TempDir::new().unwrap();
    SynapseTableWriter::default()
        .write(&tmp.path().join(SYNAPSES_FILE), &sample_records())
        .unwrap();

    let collector = ResultCollector::default();
    let records = collector.collect_synapses(tmp.path()).unwrap();
    let keys: Vec<_> = records.iter().map(|r| r.pair_key()).collect();
    assert_eq!(
        keys,
        vec![(Some(3), 1, 100), (Some(7), 1, 101), (Some(7), 2, 100)]
    );

    let header = std::fs::read_to_string(tmp.path().join(SYNAPSES_FILE)).unwrap();
    assert!(header.starts_with(
        "voxelID,voxelX,voxelY,voxelZ,presynapticNeuronID,postsynapticNeuronID,pre,post,postAll,count"
    ));
}

#[test]
fn test_design_matrix_keeps_zero_counts_and_column_order() {
    let collector = ResultCollector::default();
    let observations = collector.to_observations(&sample_records()).unwrap();
    assert_eq!(observations.len(), 3);
    assert_eq!(observations.responses[1], 0.0);
    assert_eq!(observations.design.columns(), &["pre", "post", "postAll"]);
    assert_eq!(observations.design.row(0), &[4.0, 2.0, 8.0]);
}

#[test]
fn test_malformed_row_yields_no_partial_result() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join(SYNAPSES_FILE),
        "presynapticNeuronID,postsynapticNeuronID,pre,post,postAll,count\n\
         1,2,1,1,1,1\n\
         1,3,1,abc,1,1\n\
         1,4,1,1,1,1\n",
    )
    .unwrap();

    let err = ResultCollector::default()
        .collect_synapses(tmp.path())
        .unwrap_err();
    match err {
        LoaderError::Parse { line, row, message, path } => {
            assert_eq!(line, 3);
            assert_eq!(row, "1,3,1,abc,1,1");
            assert!(message.contains("post"));
            assert!(path.ends_with(SYNAPSES_FILE));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_wrong_column_count() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join(SYNAPSES_FILE),
        "presynapticNeuronID,postsynapticNeuronID,pre,post,postAll,count\n1,2,1,1,1\n",
    )
    .unwrap();
    let err = ResultCollector::default()
        .collect_synapses(tmp.path())
        .unwrap_err();
    assert!(err.to_string().contains("expected 6 columns"));
}

#[test]
fn test_missing_table() {
    let tmp = TempDir::new().unwrap();
    let err = ResultCollector::default()
        .collect_synapses(tmp.path())
        .unwrap_err();
    assert!(matches!(err, LoaderError::FileNotFound(_)));
}

#[test]
fn test_custom_contract() {
    let tmp = TempDir::new().unwrap();
    let contract = FeatureContract::new("n", ["boutons", "targets"]).without_voxels();
    let records = vec![SynapseRecord::new(1, 2, 5.0, vec![3.0, 4.0])];
    SynapseTableWriter::new(contract.clone())
        .write(&tmp.path().join(SYNAPSES_FILE), &records)
        .unwrap();
    let back = ResultCollector::new(contract)
        .collect_synapses(tmp.path())
        .unwrap();
    assert_eq!(back, records);
}

// ============================================================================
// Summary statistics
// ============================================================================

#[test]
fn test_summary_statistics_keep_flagged_entries() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join(SUMMARY_FILE),
        json!({
            "GENERATION_PARAMETERS": {"CONNECTIVITY_RULE_PARAMETERS": [0, 1, 1, -1]},
            "SUMMARY_STATISTICS": [
                {"STATISTIC_NAME": "innervation", "STATUS": "OK", "RESULT": 0.42},
                {"STATISTIC_NAME": "motifs", "STATUS": "ERROR statistic type unknown."}
            ]
        })
        .to_string(),
    )
    .unwrap();

    let collector = ResultCollector::default();
    let report = collector.collect_summary_report(tmp.path()).unwrap();
    assert_eq!(report.statistics.len(), 2);
    assert_eq!(report.statistics[0].value, Some(0.42));
    assert_eq!(report.statistics[1].status, StatisticStatus::Failed);
    assert_eq!(report.flagged().count(), 1);
    assert!(report.generation_parameters.is_some());
}

#[test]
fn test_summary_writer_round_trip() {
    let tmp = TempDir::new().unwrap();
    let stats = vec![
        StatisticResult::new("innervation", StatisticStatus::Ok, Some(1.25)),
        StatisticResult::new("motifs", StatisticStatus::Failed, None)
            .with_message("FAILED by request"),
    ];
    SummaryStatisticsWriter::write(&tmp.path().join(SUMMARY_FILE), &json!({}), &stats).unwrap();

    let back = ResultCollector::default()
        .collect_summary_statistics(tmp.path())
        .unwrap();
    assert_eq!(back[0].value, Some(1.25));
    assert_eq!(back[1].status, StatisticStatus::Failed);
    assert_eq!(back[1].message.as_deref(), Some("FAILED by request"));
}

#[test]
fn test_summary_without_statistics_array() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join(SUMMARY_FILE), "{}").unwrap();
    let err = ResultCollector::default()
        .collect_summary_statistics(tmp.path())
        .unwrap_err();
    assert!(matches!(err, LoaderError::InvalidSummary { .. }));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_corrupted_row_never_returns_records(
        n in 2usize..20,
        bad in 0usize..20,
        token in prop::sample::select(vec!["x", "-3", "nan", ""]),
    ) {
        let bad = bad % n;
        let tmp = TempDir::new().unwrap();
        let mut text = String::from("presynapticNeuronID,postsynapticNeuronID,pre,post,postAll,count\n");
        for i in 0..n {
            let count = if i == bad { token.to_string() } else { "1".to_string() };
            text.push_str(&format!("1,{},2,1,3,{}\n", i, count));
        }
        std::fs::write(tmp.path().join(SYNAPSES_FILE), text).unwrap();

        match ResultCollector::default().collect_synapses(tmp.path()) {
            Err(LoaderError::Parse { line, .. }) => prop_assert_eq!(line, bad as u64 + 2),
            other => prop_assert!(false, "expected parse error, got {:?}", other.map(|r| r.len())),
        }
    }
}
