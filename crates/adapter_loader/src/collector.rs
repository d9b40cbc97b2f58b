//! Result collector.

use crate::contract::FeatureContract;
use crate::error::LoaderError;
use crate::statistics::{read_summary, SummaryReport, SUMMARY_FILE};
use crate::synapses::{read_synapses, SYNAPSES_FILE};
use calib_core::types::{DesignMatrix, ObservationSet, StatisticResult, SynapseRecord};
use std::path::Path;

/// Reads a run directory into typed records.
///
/// # Example
///
/// ```rust,ignore
/// use adapter_loader::ResultCollector;
///
/// let collector = ResultCollector::default();
/// let records = collector.collect_synapses(outcome.output_dir())?;
/// let observations = collector.to_observations(&records)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResultCollector {
    contract: FeatureContract,
}

impl ResultCollector {
    /// Create a collector for a custom column layout.
    pub fn new(contract: FeatureContract) -> Self {
        Self { contract }
    }

    /// Column layout in use.
    pub fn contract(&self) -> &FeatureContract {
        &self.contract
    }

    /// Read `synapses.csv` from `run_dir`.
    pub fn collect_synapses(&self, run_dir: &Path) -> Result<Vec<SynapseRecord>, LoaderError> {
        self.read_synapse_file(&run_dir.join(SYNAPSES_FILE))
    }

    /// Read a synapse table from an explicit file path.
    pub fn read_synapse_file(&self, path: &Path) -> Result<Vec<SynapseRecord>, LoaderError> {
        read_synapses(path, &self.contract)
    }

    /// Read `summaryStatistics.json` from `run_dir`.
    ///
    /// Entries that are not `OK` are kept and flagged, never dropped.
    pub fn collect_summary_statistics(
        &self,
        run_dir: &Path,
    ) -> Result<Vec<StatisticResult>, LoaderError> {
        Ok(self.collect_summary_report(run_dir)?.statistics)
    }

    /// Read the full summary report from `run_dir`.
    pub fn collect_summary_report(&self, run_dir: &Path) -> Result<SummaryReport, LoaderError> {
        read_summary(&run_dir.join(SUMMARY_FILE))
    }

    /// Feature rows in contract column order, one per record.
    pub fn to_design_matrix(&self, records: &[SynapseRecord]) -> Result<DesignMatrix, LoaderError> {
        Ok(self.to_observations(records)?.design)
    }

    /// Design matrix and aligned counts. Zero-count records are kept.
    pub fn to_observations(
        &self,
        records: &[SynapseRecord],
    ) -> Result<ObservationSet, LoaderError> {
        Ok(ObservationSet::from_records(
            self.contract.features.clone(),
            records,
        )?)
    }
}
