//! Configuration store.

use crate::error::ConfigError;
use crate::spec::{validate_parameters, CalibrationSpec, PARAMETERS_KEY};
use crate::transient::{derive, TransientSpec};
use calib_core::types::ParameterVector;
use std::path::Path;

/// Entry point for loading the calibration template and deriving
/// per-iteration snapshots from it.
pub struct ConfigurationStore;

impl ConfigurationStore {
    /// Load and validate the template at `path`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::FileNotFound`] if the file does not exist
    /// - [`ConfigError::Json`] if it is not valid JSON
    /// - [`ConfigError::MissingField`] / [`ConfigError::InvalidValue`] for
    ///   absent or malformed required fields
    pub fn load(path: impl AsRef<Path>) -> Result<CalibrationSpec, ConfigError> {
        let path = path.as_ref();
        let spec = CalibrationSpec::from_file(path)?;
        tracing::info!(
            path = %path.display(),
            parameters = %spec.parameters(),
            statistics = spec.statistic_definitions().len(),
            "calibration spec loaded"
        );
        Ok(spec)
    }

    /// Derive a snapshot carrying `parameters`; the template is untouched.
    ///
    /// The snapshot is in memory until [`TransientSpec::persist`] is called.
    pub fn snapshot(
        template: &CalibrationSpec,
        parameters: ParameterVector,
    ) -> Result<TransientSpec, ConfigError> {
        let origin = template.origin();
        validate_parameters(&parameters, &origin)?;
        if parameters.len() != template.parameters().len() {
            return Err(ConfigError::invalid_value(
                PARAMETERS_KEY,
                origin,
                format!(
                    "expected {} parameters, got {}",
                    template.parameters().len(),
                    parameters.len()
                ),
            ));
        }
        Ok(derive(template, parameters))
    }

    /// Discard a snapshot and its backing file.
    pub fn release(transient: TransientSpec) -> Result<(), ConfigError> {
        transient.release()
    }
}
