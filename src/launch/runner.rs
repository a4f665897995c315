//! Run launcher: prepare the filesystem, then delegate.
//!
//! The launcher is deliberately linear. Either every preparation step
//! succeeds and the entrypoint is spawned, or the run aborts before any
//! delegation; there is no partial-success state, no retry, and no timeout.

use crate::launch::{DelegateCommand, RunPaths};
use crate::models::{LaunchError, Result, RunConfig};
use chrono::Utc;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

/// Configures and launches one train/test run of the external entrypoint.
pub struct Launcher {
    config: RunConfig,
    config_path: PathBuf,
}

impl Launcher {
    /// Create a launcher for a loaded configuration.
    ///
    /// `config_path` is the file the configuration was loaded from; it is
    /// snapshotted into the log directory for provenance.
    pub fn new(config: RunConfig, config_path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            config_path: config_path.into(),
        }
    }

    /// Validate, derive paths, provision the log directory, and snapshot the
    /// configuration.
    ///
    /// Performs every side effect except spawning the child, in that order;
    /// validation failures abort before the filesystem is touched.
    pub fn prepare(&self) -> Result<(RunPaths, DelegateCommand)> {
        self.config.validate()?;

        let paths = RunPaths::resolve(&self.config)?;
        paths.provision()?;
        paths.snapshot_config(&self.config_path)?;

        let command = DelegateCommand::build(&self.config, &paths);
        Ok((paths, command))
    }

    /// Launch the run and wait for the entrypoint to terminate.
    ///
    /// A nonzero child exit surfaces as [`LaunchError::Delegate`] carrying the
    /// code verbatim.
    pub async fn run(&self) -> Result<()> {
        let (paths, command) = self.prepare()?;

        info!(
            mode = self.config.mode.as_str(),
            env = %self.config.run.env,
            log_dir = %paths.log_dir.display(),
            started_at = %Utc::now().to_rfc3339(),
            "Delegating to entrypoint"
        );
        let started = Instant::now();

        let status = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&command.current_dir)
            .status()
            .await
            .map_err(|e| LaunchError::Spawn {
                program: command.program.clone(),
                source: e,
            })?;

        let elapsed = started.elapsed().as_secs_f64();
        match status.code() {
            Some(0) => {
                info!(runtime_secs = elapsed, "Entrypoint finished");
                Ok(())
            }
            Some(code) => {
                error!(code, runtime_secs = elapsed, "Entrypoint failed");
                Err(LaunchError::Delegate { code })
            }
            None => Err(LaunchError::Interrupted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn launcher_with_script(root: &Path, script_body: &str) -> Launcher {
        fs::write(root.join("entry.sh"), script_body).unwrap();

        let config_toml = format!(
            r#"
            mode = "test"

            [run]
            env = "InvertedPendulumBulletEnv-v0"
            load_checkpoint = true
            log_episode_video = true

            [entrypoint]
            program = "sh"
            script = "entry.sh"
            project_root = "{}"
            "#,
            root.display()
        );
        let config_path = root.join("run.toml");
        fs::write(&config_path, config_toml).unwrap();

        let config = RunConfig::from_file(&config_path).unwrap();
        Launcher::new(config, config_path)
    }

    #[test]
    fn test_prepare_provisions_and_snapshots() {
        let temp_dir = TempDir::new().unwrap();
        let launcher = launcher_with_script(temp_dir.path(), "exit 0\n");

        let (paths, command) = launcher.prepare().unwrap();

        let log_dir = temp_dir
            .path()
            .join("logs/InvertedPendulumBulletEnv-v0/CNN");
        assert_eq!(paths.log_dir, log_dir);
        assert!(log_dir.join("run.toml").is_file());
        // The entrypoint owns the checkpoint directory
        assert!(!paths.checkpoint_dir.exists());

        assert_eq!(command.program, "sh");
        assert_eq!(command.args[0], "entry.sh");
        assert!(command.args.contains(&"--load-checkpoint".to_string()));
    }

    #[test]
    fn test_prepare_rejects_invalid_config_before_side_effects() {
        let temp_dir = TempDir::new().unwrap();
        let launcher = launcher_with_script(temp_dir.path(), "exit 0\n");

        let mut config = launcher.config.clone();
        config.model.encoder.kernel_sizes = vec![3];
        let launcher = Launcher::new(config, temp_dir.path().join("run.toml"));

        assert!(matches!(
            launcher.prepare().unwrap_err(),
            LaunchError::Config(_)
        ));
        assert!(!temp_dir.path().join("logs").exists());
    }

    #[tokio::test]
    async fn test_exit_code_propagated_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let launcher = launcher_with_script(temp_dir.path(), "exit 3\n");

        let err = launcher.run().await.unwrap_err();
        assert!(matches!(err, LaunchError::Delegate { code: 3 }));
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_successful_run() {
        let temp_dir = TempDir::new().unwrap();
        let launcher = launcher_with_script(temp_dir.path(), "exit 0\n");

        launcher.run().await.unwrap();
    }

    #[tokio::test]
    async fn test_child_sees_warning_suppression_and_flags() {
        let temp_dir = TempDir::new().unwrap();
        // The script proves the launcher's contract from the child's side:
        // PYTHONWARNINGS is set and the mode flag is the first flag pair.
        let launcher = launcher_with_script(
            temp_dir.path(),
            "[ \"$PYTHONWARNINGS\" = ignore ] || exit 11\n\
             [ \"$1\" = --mode ] || exit 12\n\
             [ \"$2\" = test ] || exit 13\n\
             exit 0\n",
        );

        launcher.run().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_program_is_a_spawn_error() {
        let temp_dir = TempDir::new().unwrap();
        let launcher = launcher_with_script(temp_dir.path(), "exit 0\n");

        let mut config = launcher.config.clone();
        config.entrypoint.program = "sacrun-no-such-interpreter".to_string();
        let launcher = Launcher::new(config, temp_dir.path().join("run.toml"));

        assert!(matches!(
            launcher.run().await.unwrap_err(),
            LaunchError::Spawn { .. }
        ));
    }
}
