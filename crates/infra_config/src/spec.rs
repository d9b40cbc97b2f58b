//! Calibration specification (the simulator's JSON spec file).

use crate::error::ConfigError;
use calib_core::types::ParameterVector;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Key holding the connectivity-rule parameters θ.
pub const PARAMETERS_KEY: &str = "CONNECTIVITY_RULE_PARAMETERS";
/// Key holding the simulator output directory.
pub const OUTPUT_DIR_KEY: &str = "OUTPUT_DIR";
/// Key holding the statistic definitions, spelled the way the simulator
/// reads it. Definitions are always written under this key.
pub const STATISTICS_KEY: &str = "STATISTIC_DEFINTIONS";
/// Corrected spelling, accepted when reading a specification.
pub const STATISTICS_KEY_ALIAS: &str = "STATISTIC_DEFINITIONS";

const STATISTIC_NAME_KEY: &str = "STATISTIC_NAME";
const IN_MEMORY: &str = "<in-memory spec>";

/// One requested summary statistic.
///
/// Only the name is interpreted; every other field is passed through to
/// the simulator unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticRequest {
    /// Statistic name.
    #[serde(rename = "STATISTIC_NAME")]
    pub name: String,
    /// Definition-specific fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl StatisticRequest {
    /// Create a request with no extra fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Map::new(),
        }
    }

    /// Add a pass-through field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

/// Immutable baseline calibration specification.
///
/// Holds the validated required fields and every other key of the source
/// document verbatim, so that the simulator sees exactly what the user
/// wrote apart from the fields a snapshot overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSpec {
    parameters: ParameterVector,
    output_dir: PathBuf,
    statistic_definitions: Vec<StatisticRequest>,
    statistics_declared: bool,
    extra: Map<String, Value>,
    source: Option<PathBuf>,
}

impl CalibrationSpec {
    /// Build a spec programmatically.
    pub fn new(parameters: ParameterVector, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            parameters,
            output_dir: output_dir.into(),
            statistic_definitions: Vec::new(),
            statistics_declared: false,
            extra: Map::new(),
            source: None,
        }
    }

    /// Add a statistic definition.
    pub fn with_statistic(mut self, request: StatisticRequest) -> Self {
        self.statistic_definitions.push(request);
        self.statistics_declared = true;
        self
    }

    /// Add a pass-through option.
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Parse and validate a JSON document.
    ///
    /// `origin` names the document in error messages.
    pub fn from_json(document: Value, origin: &str) -> Result<Self, ConfigError> {
        let Value::Object(mut map) = document else {
            return Err(ConfigError::invalid_value(
                "<root>",
                origin,
                "specification must be a JSON object",
            ));
        };

        let parameters = parse_parameters(
            map.remove(PARAMETERS_KEY)
                .ok_or_else(|| ConfigError::missing_field(PARAMETERS_KEY, origin))?,
            origin,
        )?;

        let output_dir = match map.remove(OUTPUT_DIR_KEY) {
            Some(Value::String(s)) if !s.trim().is_empty() => PathBuf::from(s),
            Some(other) => {
                return Err(ConfigError::invalid_value(
                    OUTPUT_DIR_KEY,
                    origin,
                    format!("expected a non-empty path string, found {}", other),
                ))
            }
            None => return Err(ConfigError::missing_field(OUTPUT_DIR_KEY, origin)),
        };

        let raw_statistics = match (map.remove(STATISTICS_KEY), map.remove(STATISTICS_KEY_ALIAS)) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::invalid_value(
                    STATISTICS_KEY,
                    origin,
                    format!("both {} and {} are present", STATISTICS_KEY, STATISTICS_KEY_ALIAS),
                ))
            }
            (Some(v), None) => Some((STATISTICS_KEY, v)),
            (None, Some(v)) => Some((STATISTICS_KEY_ALIAS, v)),
            (None, None) => None,
        };
        let statistics_declared = raw_statistics.is_some();
        let statistic_definitions = match raw_statistics {
            Some((key, v)) => parse_statistics(v, key, origin)?,
            None => Vec::new(),
        };

        Ok(Self {
            parameters,
            output_dir,
            statistic_definitions,
            statistics_declared,
            extra: map,
            source: None,
        })
    }

    /// Read and validate a JSON spec file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(display));
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io(display.clone(), e))?;
        let document: Value = serde_json::from_str(&content).map_err(|e| ConfigError::Json {
            path: display.clone(),
            source: e,
        })?;
        let mut spec = Self::from_json(document, &display)?;
        spec.source = Some(path.to_path_buf());
        Ok(spec)
    }

    /// Render the full document the simulator reads.
    ///
    /// Statistic definitions go under [`STATISTICS_KEY`] whenever any were
    /// declared, including an explicitly empty list.
    pub fn to_json(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert(
            PARAMETERS_KEY.to_string(),
            Value::Array(
                self.parameters
                    .iter()
                    .map(|&v| serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number))
                    .collect(),
            ),
        );
        map.insert(
            OUTPUT_DIR_KEY.to_string(),
            Value::String(self.output_dir.to_string_lossy().into_owned()),
        );
        if self.statistics_declared {
            let defs = self
                .statistic_definitions
                .iter()
                .map(|d| serde_json::to_value(d).unwrap_or(Value::Null))
                .collect();
            map.insert(STATISTICS_KEY.to_string(), Value::Array(defs));
        }
        Value::Object(map)
    }

    /// Baseline parameters.
    pub fn parameters(&self) -> &ParameterVector {
        &self.parameters
    }

    /// Declared output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Requested statistics.
    pub fn statistic_definitions(&self) -> &[StatisticRequest] {
        &self.statistic_definitions
    }

    /// Pass-through option by key.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// File the specification was loaded from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Name used in error messages.
    pub fn origin(&self) -> String {
        self.source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| IN_MEMORY.to_string())
    }

    // Derivation helpers used by TransientSpec; the session template itself
    // is never modified.
    pub(crate) fn replaced_parameters(&self, parameters: ParameterVector) -> Self {
        Self {
            parameters,
            ..self.clone()
        }
    }

    pub(crate) fn set_output_dir(&mut self, dir: PathBuf) {
        self.output_dir = dir;
    }

    pub(crate) fn set_option(&mut self, key: String, value: Value) {
        self.extra.insert(key, value);
    }
}

pub(crate) fn validate_parameters(
    parameters: &ParameterVector,
    origin: &str,
) -> Result<(), ConfigError> {
    if parameters.is_empty() {
        return Err(ConfigError::invalid_value(
            PARAMETERS_KEY,
            origin,
            "parameter vector is empty",
        ));
    }
    if let Some(i) = parameters.iter().position(|v| !v.is_finite()) {
        return Err(ConfigError::invalid_value(
            PARAMETERS_KEY,
            origin,
            format!("element {} is not finite", i),
        ));
    }
    Ok(())
}

fn parse_parameters(value: Value, origin: &str) -> Result<ParameterVector, ConfigError> {
    let Value::Array(items) = value else {
        return Err(ConfigError::invalid_value(
            PARAMETERS_KEY,
            origin,
            "expected an array of numbers",
        ));
    };
    let mut values = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let v = item.as_f64().ok_or_else(|| {
            ConfigError::invalid_value(
                PARAMETERS_KEY,
                origin,
                format!("element {} is not a number: {}", i, item),
            )
        })?;
        values.push(v);
    }
    let parameters = ParameterVector::new(values);
    validate_parameters(&parameters, origin)?;
    Ok(parameters)
}

fn parse_statistics(
    value: Value,
    key: &str,
    origin: &str,
) -> Result<Vec<StatisticRequest>, ConfigError> {
    let Value::Array(items) = value else {
        return Err(ConfigError::invalid_value(
            key,
            origin,
            "expected an array of statistic definitions",
        ));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let has_name = item
                .get(STATISTIC_NAME_KEY)
                .map(Value::is_string)
                .unwrap_or(false);
            if !has_name {
                return Err(ConfigError::invalid_value(
                    key,
                    origin,
                    format!("definition {} has no string {}", i, STATISTIC_NAME_KEY),
                ));
            }
            serde_json::from_value(item).map_err(|e| {
                ConfigError::invalid_value(key, origin, format!("definition {}: {}", i, e))
            })
        })
        .collect()
}
