//! Check command implementation

use std::path::{Path, PathBuf};

use infra_config::{ConfigurationStore, SessionSettings};
use tracing::warn;

use crate::Result;

/// Run the check command
pub fn run(spec: Option<&Path>, settings: &SessionSettings) -> Result<()> {
    println!("Resolved settings:");
    println!("{}", settings.to_toml_string()?);

    match locate(&settings.simulator.binary) {
        Some(path) => println!("simulator: {}", path.display()),
        None => warn!(
            binary = %settings.simulator.binary.display(),
            "Simulator executable not found"
        ),
    }

    if let Some(path) = spec {
        let spec = ConfigurationStore::load(path)?;
        println!("specification: {}", path.display());
        println!("  parameters:  {}", spec.parameters());
        println!("  output dir:  {}", spec.output_dir().display());
        println!("  statistics:  {}", spec.statistic_definitions().len());
    }
    Ok(())
}

/// Resolve an executable, searching `PATH` for bare names.
fn locate(binary: &Path) -> Option<PathBuf> {
    if binary.components().count() > 1 {
        return binary.is_file().then(|| binary.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}
