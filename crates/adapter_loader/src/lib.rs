//! # adapter_loader
//!
//! Readers (and writers) for the files a simulator run leaves in its output
//! directory:
//!
//! - `synapses.csv`: one row per synapse pair with its features and count
//! - `summaryStatistics.json`: the requested summary statistics and their
//!   status
//!
//! Parsing is all-or-nothing: a malformed row yields
//! [`LoaderError::Parse`] with the file, line and row text, never a partial
//! table.
//!
//! ## Architecture Position
//!
//! Part of the **A**dapter layer. Depends only on `calib_core`.

mod collector;
mod contract;
mod error;
mod statistics;
mod synapses;
mod writer;

pub use collector::ResultCollector;
pub use contract::FeatureContract;
pub use error::LoaderError;
pub use statistics::{SummaryReport, SUMMARY_FILE};
pub use synapses::SYNAPSES_FILE;
pub use writer::{SummaryStatisticsWriter, SynapseTableWriter};
