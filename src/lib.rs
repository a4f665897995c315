//! sacrun - launch layer for soft actor-critic train/evaluation runs.
//!
//! ## Architecture
//!
//! sacrun is glue between a declarative run configuration and the external
//! Python entrypoint that owns the actual reinforcement-learning loop:
//!
//! - **RunConfig**: immutable TOML-loaded description of one run (environment,
//!   agent architecture, sampling, training hyperparameters)
//! - **RunPaths**: project-root resolution and the `logs/<env>/<arch>` /
//!   `checkpoints/<env>/<arch>` layout, with idempotent provisioning and a
//!   provenance snapshot of the config file
//! - **DelegateCommand**: the configuration serialized into the entrypoint's
//!   command-line flag surface
//! - **Launcher**: prepare, spawn, wait, and propagate the exit code verbatim
//!
//! The learning algorithm, network weights, environment physics, and
//! checkpoint format all belong to the entrypoint; sacrun never parses or
//! produces them.

pub mod launch;
pub mod models;

// Re-exports for convenience
pub use launch::{DelegateCommand, Launcher, RunPaths};
pub use models::{
    ConfigError, EncoderArch, LaunchError, Mode, Result, RunConfig, EXAMPLE_CONFIG,
};
