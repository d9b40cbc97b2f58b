//! Per-iteration specification snapshots.

use crate::error::ConfigError;
use crate::spec::CalibrationSpec;
use calib_core::types::ParameterVector;
use serde_json::Value;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A specification derived from the session template with a replaced
/// parameter vector, owned by exactly one iteration.
///
/// The backing file is written by [`persist`](Self::persist) and removed by
/// [`release`](Self::release). Dropping an unreleased snapshot also removes
/// the file, so an early return on an error path cannot leak it.
#[derive(Debug)]
pub struct TransientSpec {
    spec: CalibrationSpec,
    path: Option<PathBuf>,
}

impl TransientSpec {
    pub(crate) fn new(spec: CalibrationSpec) -> Self {
        Self { spec, path: None }
    }

    /// Redirect simulator output for this run.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spec.set_output_dir(dir.into());
        self
    }

    /// Override a pass-through option for this run.
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.spec.set_option(key.into(), value);
        self
    }

    /// The derived specification.
    pub fn spec(&self) -> &CalibrationSpec {
        &self.spec
    }

    /// Parameters this snapshot carries.
    pub fn parameters(&self) -> &ParameterVector {
        self.spec.parameters()
    }

    /// Output directory the simulator will write to.
    pub fn output_dir(&self) -> &Path {
        self.spec.output_dir()
    }

    /// Path of the persisted file, if written.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the snapshot as `transient-<uuid>.json` inside `dir`.
    ///
    /// Calling it again returns the existing path.
    pub fn persist(&mut self, dir: &Path) -> Result<&Path, ConfigError> {
        if self.path.is_none() {
            std::fs::create_dir_all(dir)
                .map_err(|e| ConfigError::io(dir.display().to_string(), e))?;
            let path = dir.join(format!("transient-{}.json", Uuid::new_v4()));
            let body = serde_json::to_string_pretty(&self.spec.to_json()).map_err(|e| {
                ConfigError::Json {
                    path: path.display().to_string(),
                    source: e,
                }
            })?;
            std::fs::write(&path, body)
                .map_err(|e| ConfigError::io(path.display().to_string(), e))?;
            tracing::debug!(path = %path.display(), "transient spec written");
            self.path = Some(path);
        }
        match self.path.as_deref() {
            Some(p) => Ok(p),
            None => Err(ConfigError::FileNotFound(dir.display().to_string())),
        }
    }

    /// Remove the backing file. A snapshot that was never persisted is a no-op.
    pub fn release(mut self) -> Result<(), ConfigError> {
        match self.path.take() {
            Some(path) => remove_file(&path),
            None => Ok(()),
        }
    }
}

fn remove_file(path: &Path) -> Result<(), ConfigError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "transient spec removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ConfigError::io(path.display().to_string(), e)),
    }
}

impl Drop for TransientSpec {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = remove_file(&path) {
                tracing::warn!(error = %e, "failed to remove transient spec");
            }
        }
    }
}

pub(crate) fn derive(
    template: &CalibrationSpec,
    parameters: ParameterVector,
) -> TransientSpec {
    TransientSpec::new(template.replaced_parameters(parameters))
}
