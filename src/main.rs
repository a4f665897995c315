//! sacrun CLI - configure and launch SAC train/evaluation runs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sacrun::{LaunchError, Launcher, Mode, RunConfig, EXAMPLE_CONFIG};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "sacrun")]
#[command(version)]
#[command(about = "Configure and launch SAC train/evaluation runs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to run configuration file
    #[arg(short, long, global = true, default_value = "run.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch a training run
    Train {
        /// Override the target environment id
        #[arg(long)]
        env: Option<String>,

        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the project root
        #[arg(long)]
        project_root: Option<PathBuf>,
    },

    /// Launch an evaluation run against a stored checkpoint
    Test {
        /// Override the target environment id
        #[arg(long)]
        env: Option<String>,

        /// Override the number of evaluation episodes
        #[arg(long)]
        n_episodes: Option<usize>,

        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the project root
        #[arg(long)]
        project_root: Option<PathBuf>,
    },

    /// Validate the run configuration file
    Validate,

    /// Show an example configuration
    Example,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

fn load_config(path: &PathBuf) -> Result<RunConfig> {
    RunConfig::from_file(path).with_context(|| format!("Failed to load config from {path:?}"))
}

async fn launch(config: RunConfig, config_path: PathBuf) -> Result<()> {
    let launcher = Launcher::new(config, config_path);
    match launcher.run().await {
        Ok(()) => Ok(()),
        // The delegated run's exit code is this process's exit code
        Err(err @ LaunchError::Delegate { .. }) => std::process::exit(err.exit_code()),
        Err(err) => Err(err.into()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Example => {
            println!("{EXAMPLE_CONFIG}");
            return Ok(());
        }

        Commands::Validate => {
            let config = load_config(&cli.config)?;
            config.validate().context("Invalid run configuration")?;

            info!("Configuration is valid");
            info!("  Environment: {}", config.run.env);
            info!("  Mode:        {}", config.mode.as_str());
            info!("  Devices:     {:?}", config.run.devices);
            info!(
                "  Encoder:     {} ({} layers)",
                config.arch_tag(),
                config.model.encoder.hidden_channels.len()
            );
            info!(
                "  Sampling:    {} episodes across {} samplers",
                config.run.n_episodes, config.run.n_samplers
            );
            info!("  Log dir:     logs/{}/{}", config.run.env, config.arch_tag());
            info!(
                "  Checkpoints: checkpoints/{}/{}",
                config.run.env,
                config.arch_tag()
            );
            return Ok(());
        }

        Commands::Train {
            env,
            seed,
            project_root,
        } => {
            let mut config = load_config(&cli.config)?;
            config.mode = Mode::Train;
            if let Some(env) = env {
                config.run.env = env;
            }
            if let Some(seed) = seed {
                config.run.random_seed = seed;
            }
            if let Some(root) = project_root {
                config.entrypoint.project_root = Some(root);
            }

            launch(config, cli.config).await?;
        }

        Commands::Test {
            env,
            n_episodes,
            seed,
            project_root,
        } => {
            let mut config = load_config(&cli.config)?;
            config.mode = Mode::Test;
            if let Some(env) = env {
                config.run.env = env;
            }
            if let Some(n_episodes) = n_episodes {
                config.run.n_episodes = n_episodes;
            }
            if let Some(seed) = seed {
                config.run.random_seed = seed;
            }
            if let Some(root) = project_root {
                config.entrypoint.project_root = Some(root);
            }

            launch(config, cli.config).await?;
        }
    }

    Ok(())
}
