//! Simulator backends.

use crate::error::GatewayError;
use crate::mode::SimulationMode;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Longest stderr tail kept in a failure report.
const STDERR_TAIL_BYTES: usize = 4096;

/// Something that can execute one simulator run.
///
/// The contract mirrors the simulator executable: read the specification at
/// `spec_path`, write `synapses.csv` and `summaryStatistics.json` into
/// `output_dir`, and report failure through the returned error.
pub trait SimulatorBackend: Send + Sync {
    /// Run once and block until finished.
    fn execute(
        &self,
        mode: &SimulationMode,
        spec_path: &Path,
        output_dir: &Path,
    ) -> Result<(), GatewayError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "simulator"
    }
}

/// Backend spawning the simulator executable as
/// `<binary> [args...] <MODE> <spec>`.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    binary: PathBuf,
    args: Vec<String>,
}

impl ProcessBackend {
    /// Create a backend for `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            args: Vec::new(),
        }
    }

    /// Arguments inserted before the mode token.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Executable path.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Executable to spawn. Bare names are left to the `PATH` lookup;
    /// relative paths with a directory part are anchored at the current
    /// working directory, since the child starts in the run directory.
    fn resolved_binary(&self) -> Result<PathBuf, GatewayError> {
        if self.binary.is_absolute() || self.binary.components().count() < 2 {
            return Ok(self.binary.clone());
        }
        std::path::absolute(&self.binary).map_err(|e| GatewayError::io(&self.binary, e))
    }
}

impl SimulatorBackend for ProcessBackend {
    fn execute(
        &self,
        mode: &SimulationMode,
        spec_path: &Path,
        output_dir: &Path,
    ) -> Result<(), GatewayError> {
        tracing::debug!(
            binary = %self.binary.display(),
            mode = %mode,
            spec = %spec_path.display(),
            "spawning simulator"
        );

        let binary = self.resolved_binary()?;
        let output = Command::new(&binary)
            .args(&self.args)
            .arg(mode.as_arg())
            .arg(spec_path)
            .current_dir(output_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| GatewayError::Spawn { binary, source })?;

        if output.status.success() {
            return Ok(());
        }
        Err(GatewayError::simulation_failed(
            output.status.code(),
            stderr_tail(&output.stderr),
        ))
    }

    fn name(&self) -> &str {
        self.binary
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("simulator")
    }
}

fn stderr_tail(raw: &[u8]) -> String {
    let start = raw.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&raw[start..]).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_tail_truncates() {
        let raw = vec![b'x'; STDERR_TAIL_BYTES + 100];
        assert_eq!(stderr_tail(&raw).len(), STDERR_TAIL_BYTES);
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let backend = ProcessBackend::new("/nonexistent/computeSynapses");
        let dir = std::env::temp_dir();
        let err = backend
            .execute(&SimulationMode::Synapse, Path::new("spec.json"), &dir)
            .unwrap_err();
        assert!(matches!(err, GatewayError::Spawn { .. }));
    }

    #[test]
    fn test_relative_binary_with_directory_is_anchored() {
        let backend = ProcessBackend::new("bin/computeSynapses");
        let resolved = backend.resolved_binary().unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("bin/computeSynapses"));
        assert_eq!(
            resolved,
            std::env::current_dir().unwrap().join("bin/computeSynapses")
        );
    }

    #[test]
    fn test_bare_binary_name_is_left_to_path_lookup() {
        let backend = ProcessBackend::new("computeSynapses");
        assert_eq!(backend.resolved_binary().unwrap(), PathBuf::from("computeSynapses"));
    }

    #[test]
    fn test_name_from_binary() {
        assert_eq!(ProcessBackend::new("/opt/bin/computeSynapses").name(), "computeSynapses");
    }
}
