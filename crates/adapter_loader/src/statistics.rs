//! `summaryStatistics.json` reader.

use crate::error::LoaderError;
use calib_core::types::{StatisticResult, StatisticStatus};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// File name of the summary statistics report inside a run directory.
pub const SUMMARY_FILE: &str = "summaryStatistics.json";

const GENERATION_PARAMETERS_KEY: &str = "GENERATION_PARAMETERS";
const SUMMARY_STATISTICS_KEY: &str = "SUMMARY_STATISTICS";
const NAME_KEY: &str = "STATISTIC_NAME";
const STATUS_KEY: &str = "STATUS";
const RESULT_KEY: &str = "RESULT";

/// Parsed summary statistics report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    /// Specification the simulator ran with, as echoed in the report.
    pub generation_parameters: Option<Value>,
    /// One entry per reported statistic, in report order.
    pub statistics: Vec<StatisticResult>,
}

impl SummaryReport {
    /// Entries that are not `OK`.
    pub fn flagged(&self) -> impl Iterator<Item = &StatisticResult> {
        self.statistics.iter().filter(|s| s.is_flagged())
    }
}

pub(crate) fn read_summary(path: &Path) -> Result<SummaryReport, LoaderError> {
    if !path.exists() {
        return Err(LoaderError::FileNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|e| LoaderError::io(path, e))?;
    let invalid = |message: String| LoaderError::InvalidSummary {
        path: path.to_path_buf(),
        message,
    };
    let document: Value = serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;

    let entries = document
        .get(SUMMARY_STATISTICS_KEY)
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(format!("missing array '{}'", SUMMARY_STATISTICS_KEY)))?;

    let statistics = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            parse_entry(entry).ok_or_else(|| invalid(format!("entry {} has no {}", i, NAME_KEY)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    for stat in statistics.iter().filter(|s| s.is_flagged()) {
        tracing::warn!(
            statistic = %stat.name,
            status = %stat.status,
            message = stat.message.as_deref().unwrap_or(""),
            "summary statistic flagged"
        );
    }

    Ok(SummaryReport {
        generation_parameters: document.get(GENERATION_PARAMETERS_KEY).cloned(),
        statistics,
    })
}

fn parse_entry(entry: &Value) -> Option<StatisticResult> {
    let name = entry.get(NAME_KEY)?.as_str()?;
    let raw_status = entry.get(STATUS_KEY).and_then(Value::as_str).unwrap_or("");
    let status = StatisticStatus::classify(raw_status);
    let detail = entry.get(RESULT_KEY).cloned();
    let value = detail.as_ref().and_then(scalar_value);

    let mut result = StatisticResult::new(name, status, value).with_message(raw_status);
    if let Some(detail) = detail {
        result = result.with_detail(detail);
    }
    Some(result)
}

/// Scalar summary of a result payload: the number itself, or the `average`
/// of an `{average, stdev, min, max}` object.
fn scalar_value(result: &Value) -> Option<f64> {
    match result {
        Value::Number(n) => n.as_f64(),
        Value::Object(map) => map.get("average").and_then(Value::as_f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_and_object_results() {
        assert_eq!(scalar_value(&json!(0.25)), Some(0.25));
        assert_eq!(
            scalar_value(&json!({"average": 1.5, "stdev": 0.1, "min": 1, "max": 2})),
            Some(1.5)
        );
        assert_eq!(scalar_value(&json!([1, 2])), None);
    }

    #[test]
    fn test_entry_keeps_raw_status() {
        let entry = json!({
            "STATISTIC_NAME": "innervation",
            "STATUS": "WARNING statistic filter yielded more neurons than generation filter.",
            "RESULT": {"average": 2.0}
        });
        let stat = parse_entry(&entry).unwrap();
        assert_eq!(stat.status, StatisticStatus::Skipped);
        assert_eq!(stat.value, Some(2.0));
        assert!(stat.message.unwrap().starts_with("WARNING"));
    }

    #[test]
    fn test_entry_without_status_is_failed() {
        let stat = parse_entry(&json!({"STATISTIC_NAME": "x"})).unwrap();
        assert_eq!(stat.status, StatisticStatus::Failed);
        assert!(parse_entry(&json!({"STATUS": "OK"})).is_none());
    }
}
