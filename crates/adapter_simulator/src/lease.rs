//! Run directory leases.

use crate::error::GatewayError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Registry of run directories currently held by a run.
///
/// Cloning shares the registry, so gateways that should never write to the
/// same directory can be built from one registry.
#[derive(Debug, Clone, Default)]
pub struct LeaseRegistry {
    held: Arc<Mutex<HashSet<PathBuf>>>,
}

impl LeaseRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lease `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// [`GatewayError::OutputDirInUse`] if the directory is already held.
    pub fn acquire(&self, dir: PathBuf, keep_outputs: bool) -> Result<RunLease, GatewayError> {
        {
            let mut held = self.lock();
            if !held.insert(dir.clone()) {
                return Err(GatewayError::OutputDirInUse(dir));
            }
        }
        if let Err(e) = std::fs::create_dir_all(&dir) {
            self.lock().remove(&dir);
            return Err(GatewayError::io(dir, e));
        }
        tracing::debug!(dir = %dir.display(), "run directory leased");
        Ok(RunLease {
            dir: Some(dir),
            registry: self.clone(),
            keep_outputs,
        })
    }

    /// Whether `dir` is currently leased.
    pub fn is_held(&self, dir: &Path) -> bool {
        self.lock().contains(dir)
    }

    /// Number of live leases.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no lease is live.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        // A panic while holding the lock cannot leave the set inconsistent.
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Exclusive hold on one run directory.
///
/// Released explicitly with [`release`](Self::release) or on drop; unless
/// outputs are kept the directory is removed at that point.
#[derive(Debug)]
pub struct RunLease {
    dir: Option<PathBuf>,
    registry: LeaseRegistry,
    keep_outputs: bool,
}

impl RunLease {
    /// The leased directory.
    pub fn dir(&self) -> &Path {
        self.dir.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Whether the directory survives the lease.
    pub fn keeps_outputs(&self) -> bool {
        self.keep_outputs
    }

    /// Give the directory back.
    pub fn release(mut self) -> Result<(), GatewayError> {
        self.finish()
    }

    fn finish(&mut self) -> Result<(), GatewayError> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        self.registry.lock().remove(&dir);
        if self.keep_outputs {
            tracing::debug!(dir = %dir.display(), "run directory released (kept)");
            return Ok(());
        }
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::debug!(dir = %dir.display(), "run directory removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GatewayError::io(dir, e)),
        }
    }
}

impl Drop for RunLease {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            tracing::warn!(error = %e, "failed to release run directory");
        }
    }
}
