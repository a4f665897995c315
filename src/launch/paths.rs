//! Path derivation and directory provisioning for a run.
//!
//! Invariants:
//! - `log_dir = <root>/logs/<env>/<arch-tag>` and
//!   `checkpoint_dir = <root>/checkpoints/<env>/<arch-tag>`
//! - provisioning is idempotent; an existing log directory is not an error
//! - the config snapshot lands inside the log directory before delegation

use crate::models::{LaunchError, Result, RunConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolved filesystem layout for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    /// Root of the RL project the entrypoint lives in
    pub project_root: PathBuf,
    /// Where the entrypoint writes logs and where the config snapshot goes
    pub log_dir: PathBuf,
    /// Where the entrypoint reads/writes model checkpoints (owned by the
    /// entrypoint; not created here)
    pub checkpoint_dir: PathBuf,
}

impl RunPaths {
    /// Resolve the layout for a configuration.
    ///
    /// The project root comes from the config override when present,
    /// otherwise from the launcher's own location.
    pub fn resolve(config: &RunConfig) -> Result<Self> {
        let project_root = match &config.entrypoint.project_root {
            Some(root) => root.clone(),
            None => default_project_root()?,
        };
        Ok(Self::derive(project_root, &config.run.env, config.arch_tag()))
    }

    /// Derive log and checkpoint directories under a known project root.
    pub fn derive(project_root: PathBuf, env_id: &str, arch_tag: &str) -> Self {
        let log_dir = project_root.join("logs").join(env_id).join(arch_tag);
        let checkpoint_dir = project_root.join("checkpoints").join(env_id).join(arch_tag);
        Self {
            project_root,
            log_dir,
            checkpoint_dir,
        }
    }

    /// Create the log directory and any missing parents.
    ///
    /// Succeeds without touching anything if the directory already exists.
    pub fn provision(&self) -> Result<()> {
        fs::create_dir_all(&self.log_dir).map_err(|e| LaunchError::DirectoryCreation {
            path: self.log_dir.clone(),
            source: e,
        })?;
        debug!(log_dir = %self.log_dir.display(), "Log directory ready");
        Ok(())
    }

    /// Copy the launch configuration file into the log directory for
    /// provenance.
    ///
    /// Returns the snapshot path. A failed copy is fatal; the run must not be
    /// delegated without its provenance record.
    pub fn snapshot_config(&self, config_path: &Path) -> Result<PathBuf> {
        let file_name = config_path
            .file_name()
            .ok_or_else(|| LaunchError::path_resolution(format!(
                "config path {} has no file name",
                config_path.display()
            )))?;
        let dest = self.log_dir.join(file_name);

        fs::copy(config_path, &dest).map_err(|e| LaunchError::Snapshot {
            path: dest.clone(),
            source: e,
        })?;

        info!(snapshot = %dest.display(), "Config snapshot written");
        Ok(dest)
    }
}

/// Project root derived from the launcher binary's own location: the parent
/// of the directory containing the executable.
fn default_project_root() -> Result<PathBuf> {
    let exe = std::env::current_exe()
        .and_then(|p| p.canonicalize())
        .map_err(LaunchError::PathResolution)?;

    exe.parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            LaunchError::path_resolution(format!(
                "executable {} has no grandparent directory",
                exe.display()
            ))
        })
}
