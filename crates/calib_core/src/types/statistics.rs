//! Summary statistic results reported by the simulator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status flag attached to a summary statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatisticStatus {
    /// Computed without caveats; the value is usable.
    Ok,
    /// The simulator could not compute the statistic.
    Failed,
    /// Computed with caveats or not attempted; the value must not be used.
    Skipped,
}

impl StatisticStatus {
    /// Classify a raw status string from the summary report.
    ///
    /// The simulator writes free-form statuses whose first word carries the
    /// class: `OK`, `WARNING ...`, `ERROR ...`. Matching is case-insensitive.
    /// `OK` maps to [`StatisticStatus::Ok`]; `WARNING` and `SKIPPED` map to
    /// [`StatisticStatus::Skipped`]; anything else, including an empty
    /// status, maps to [`StatisticStatus::Failed`].
    ///
    /// # Examples
    /// ```
    /// use calib_core::types::StatisticStatus;
    ///
    /// assert_eq!(StatisticStatus::classify("OK"), StatisticStatus::Ok);
    /// assert_eq!(
    ///     StatisticStatus::classify("ERROR statistic type unknown."),
    ///     StatisticStatus::Failed
    /// );
    /// ```
    pub fn classify(raw: &str) -> Self {
        let head = raw
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_uppercase();
        match head.as_str() {
            "OK" => StatisticStatus::Ok,
            "WARNING" | "SKIPPED" => StatisticStatus::Skipped,
            _ => StatisticStatus::Failed,
        }
    }

    /// Status keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticStatus::Ok => "OK",
            StatisticStatus::Failed => "FAILED",
            StatisticStatus::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for StatisticStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the summary-statistics report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticResult {
    /// Statistic name as given in the request.
    pub name: String,
    /// Classified status.
    pub status: StatisticStatus,
    /// Scalar value, when the result has one.
    pub value: Option<f64>,
    /// Raw status text as written by the simulator.
    pub message: Option<String>,
    /// Raw result payload.
    pub detail: Option<serde_json::Value>,
}

impl StatisticResult {
    /// Create a result with a status and an optional value.
    pub fn new(name: impl Into<String>, status: StatisticStatus, value: Option<f64>) -> Self {
        Self {
            name: name.into(),
            status,
            value,
            message: None,
            detail: None,
        }
    }

    /// Attach the raw status message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach the raw result payload.
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Only `OK` entries are usable.
    pub fn is_usable(&self) -> bool {
        self.status == StatisticStatus::Ok
    }

    /// Whether the entry needs the caller's attention.
    pub fn is_flagged(&self) -> bool {
        !self.is_usable()
    }
}
