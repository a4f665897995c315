//! Core data models for sacrun.

pub mod config;
pub mod error;

pub use config::{
    ConfigError, EncoderArch, EncoderConfig, EntrypointConfig, EnvConfig, Mode, ModelConfig,
    RunConfig, TrainConfig, EXAMPLE_CONFIG,
};
pub use error::{LaunchError, Result};
