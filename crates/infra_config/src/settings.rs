//! Session settings.
//!
//! Settings are resolved in priority order (highest first):
//! 1. Environment variables (`CALIB_<SECTION>__<KEY>`, e.g.
//!    `CALIB_CALIBRATION__MAX_ITERATIONS=20`)
//! 2. TOML settings file
//! 3. Built-in defaults

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const ENV_PREFIX: &str = "CALIB";

/// Log levels accepted by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::invalid_value(
                "logging.level",
                "settings",
                format!("unknown log level '{}'", s),
            )),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// What the loop does when a summary statistic reports FAILED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureAction {
    /// Record the failure and keep iterating.
    #[default]
    Continue,
    /// End the session as failed.
    Abort,
}

/// Handling of zero-valued features before taking logarithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroPolicyKind {
    /// Raise zero features to `floor_value`.
    #[default]
    Floor,
    /// Drop rows with any zero feature.
    Exclude,
}

impl FromStr for ZeroPolicyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "floor" => Ok(ZeroPolicyKind::Floor),
            "exclude" => Ok(ZeroPolicyKind::Exclude),
            _ => Err(ConfigError::invalid_value(
                "estimator.zero_policy",
                "settings",
                format!("expected 'floor' or 'exclude', got '{}'", s),
            )),
        }
    }
}

/// Simulator invocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorSettings {
    /// Simulator executable.
    pub binary: PathBuf,
    /// Mode argument passed before the specification path.
    pub mode: String,
    /// Keep per-run output directories after the session.
    pub keep_run_outputs: bool,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("synapse-sim"),
            mode: "synapse".to_string(),
            keep_run_outputs: true,
        }
    }
}

/// Calibration loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    pub max_iterations: usize,
    /// Max-abs change between successive estimates counted as convergence.
    pub tolerance: f64,
    /// Optional wall-clock budget in seconds.
    pub max_wall_time_secs: Option<u64>,
    pub statistic_failure: FailureAction,
    /// Step size towards the new estimate; 1.0 uses the estimate directly.
    pub damping: f64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 1e-6,
            max_wall_time_secs: None,
            statistic_failure: FailureAction::Continue,
            damping: 1.0,
        }
    }
}

/// Simulator retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff_ms: 500,
            backoff_multiplier: 2.0,
        }
    }
}

/// Observation-model fit settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorSettings {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub zero_policy: ZeroPolicyKind,
    pub floor_value: f64,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-8,
            zero_policy: ZeroPolicyKind::Floor,
            floor_value: 1e-12,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
}

/// All settings for one calibration session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub simulator: SimulatorSettings,
    pub calibration: CalibrationSettings,
    pub retry: RetrySettings,
    pub estimator: EstimatorSettings,
    pub logging: LoggingSettings,
}

impl SessionSettings {
    /// Resolve settings from an optional TOML file and `CALIB_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            builder = builder.add_source(
                config::File::from(path.to_path_buf())
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        let settings: SessionSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from TOML text without consulting the environment.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: SessionSettings = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let origin = "settings";
        if self.calibration.max_iterations == 0 {
            return Err(ConfigError::invalid_value(
                "calibration.max_iterations",
                origin,
                "must be at least 1",
            ));
        }
        if !(self.calibration.tolerance.is_finite() && self.calibration.tolerance >= 0.0) {
            return Err(ConfigError::invalid_value(
                "calibration.tolerance",
                origin,
                "must be a finite non-negative number",
            ));
        }
        if !(self.calibration.damping > 0.0 && self.calibration.damping <= 1.0) {
            return Err(ConfigError::invalid_value(
                "calibration.damping",
                origin,
                "must lie in (0, 1]",
            ));
        }
        if !(self.retry.backoff_multiplier.is_finite() && self.retry.backoff_multiplier >= 1.0) {
            return Err(ConfigError::invalid_value(
                "retry.backoff_multiplier",
                origin,
                "must be at least 1.0",
            ));
        }
        if self.estimator.max_iterations == 0 {
            return Err(ConfigError::invalid_value(
                "estimator.max_iterations",
                origin,
                "must be at least 1",
            ));
        }
        if !(self.estimator.floor_value.is_finite() && self.estimator.floor_value > 0.0) {
            return Err(ConfigError::invalid_value(
                "estimator.floor_value",
                origin,
                "must be a finite positive number",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = SessionSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.calibration.max_iterations, 10);
        assert_eq!(settings.estimator.zero_policy, ZeroPolicyKind::Floor);
        assert_eq!(settings.calibration.statistic_failure, FailureAction::Continue);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = SessionSettings::from_toml_str(
            r#"
            [calibration]
            max_iterations = 3
            statistic_failure = "abort"

            [estimator]
            zero_policy = "exclude"
            "#,
        )
        .unwrap();
        assert_eq!(settings.calibration.max_iterations, 3);
        assert_eq!(settings.calibration.statistic_failure, FailureAction::Abort);
        assert_eq!(settings.estimator.zero_policy, ZeroPolicyKind::Exclude);
        assert_eq!(settings.retry.backoff_ms, 500);
    }

    #[test]
    fn test_invalid_damping_rejected() {
        let result = SessionSettings::from_toml_str("[calibration]\ndamping = 1.5\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut settings = SessionSettings::default();
        settings.retry.max_retries = 2;
        settings.calibration.max_wall_time_secs = Some(600);
        let text = settings.to_toml_string().unwrap();
        let back = SessionSettings::from_toml_str(&text).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_missing_file() {
        let err = SessionSettings::load(Some(Path::new("/nonexistent/calib.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
