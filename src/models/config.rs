//! Run configuration for sacrun.
//!
//! Everything the external entrypoint is parameterized on lives here. The
//! configuration is loaded once from a TOML file, validated, and never mutated
//! after launch; the launcher serializes it into the entrypoint's flag surface.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level run configuration.
///
/// Sections mirror the launch surface: `[run]` for the environment and
/// sampling, `[model]` for the agent architecture, `[train]` for training-only
/// hyperparameters, `[entrypoint]` for the delegated program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Whether this configuration trains or evaluates (overridden by the CLI
    /// subcommand)
    #[serde(default)]
    pub mode: Mode,

    /// Environment and sampling settings
    pub run: EnvConfig,

    /// Agent architecture settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Training hyperparameters (forwarded in train mode only)
    #[serde(default)]
    pub train: TrainConfig,

    /// External entrypoint invocation
    #[serde(default)]
    pub entrypoint: EntrypointConfig,
}

/// Launch mode of the external entrypoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Train a fresh or resumed agent
    Train,
    /// Evaluate a pretrained agent from a checkpoint
    #[default]
    Test,
}

impl Mode {
    /// Flag value passed to the entrypoint.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Train => "train",
            Mode::Test => "test",
        }
    }
}

/// Environment and sampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Identifier of the target simulated environment
    /// (e.g., "InvertedPendulumBulletEnv-v0")
    pub env: String,

    /// Ordered device indices handed to the entrypoint via `--gpu`
    #[serde(default = "default_devices")]
    pub devices: Vec<u32>,

    /// Number of evaluation episodes (test mode)
    #[serde(default = "default_n_episodes")]
    pub n_episodes: usize,

    /// Parallel environment-sampling workers
    #[serde(default = "default_n_samplers")]
    pub n_samplers: usize,

    /// Seed for the entrypoint's RNGs
    #[serde(default)]
    pub random_seed: u64,

    /// Episode step cap; unlimited when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_episode_steps: Option<u32>,

    /// Sample actions deterministically (evaluation)
    #[serde(default)]
    pub deterministic: bool,

    /// Render episodes while sampling
    #[serde(default)]
    pub render: bool,

    /// Record episode videos into the log directory
    #[serde(default)]
    pub log_episode_video: bool,

    /// Restore model weights from the checkpoint directory before running
    #[serde(default)]
    pub load_checkpoint: bool,
}

fn default_devices() -> Vec<u32> {
    vec![0]
}

fn default_n_episodes() -> usize {
    100
}

fn default_n_samplers() -> usize {
    4
}

/// Agent architecture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Observe rendered images instead of the raw simulator state
    #[serde(default)]
    pub vision_observation: bool,

    /// Side length of the (square) rendered observation
    #[serde(default = "default_image_size")]
    pub image_size: u32,

    /// Hidden layer widths of the policy/value networks
    #[serde(default = "default_hidden_dims")]
    pub hidden_dims: Vec<u32>,

    /// Activation function name, passed through verbatim (e.g., "LeakyReLU")
    #[serde(default = "default_activation")]
    pub activation: String,

    /// Dimension of the encoded state fed to the networks
    #[serde(default = "default_state_dim")]
    pub state_dim: u32,

    /// State encoder network
    #[serde(default)]
    pub encoder: EncoderConfig,
}

fn default_image_size() -> u32 {
    128
}

fn default_hidden_dims() -> Vec<u32> {
    vec![128, 64]
}

fn default_activation() -> String {
    "ReLU".to_string()
}

fn default_state_dim() -> u32 {
    128
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            vision_observation: false,
            image_size: default_image_size(),
            hidden_dims: default_hidden_dims(),
            activation: default_activation(),
            state_dim: default_state_dim(),
            encoder: EncoderConfig::default(),
        }
    }
}

/// State encoder configuration.
///
/// The four convolutional parameter sequences are parallel, one entry per
/// layer; [`RunConfig::validate`] rejects configurations where their lengths
/// differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Feature-extraction network type
    #[serde(default)]
    pub arch: EncoderArch,

    /// Output channels per convolutional layer
    #[serde(default = "default_hidden_channels")]
    pub hidden_channels: Vec<u32>,

    /// Kernel size per convolutional layer
    #[serde(default = "default_kernel_sizes")]
    pub kernel_sizes: Vec<u32>,

    /// Stride per convolutional layer
    #[serde(default = "default_strides")]
    pub strides: Vec<u32>,

    /// Padding per convolutional layer
    #[serde(default = "default_paddings")]
    pub paddings: Vec<u32>,
}

fn default_hidden_channels() -> Vec<u32> {
    vec![64, 64, 64]
}

fn default_kernel_sizes() -> Vec<u32> {
    vec![3, 3, 3]
}

fn default_strides() -> Vec<u32> {
    vec![1, 1, 1]
}

fn default_paddings() -> Vec<u32> {
    vec![1, 1, 1]
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            arch: EncoderArch::default(),
            hidden_channels: default_hidden_channels(),
            kernel_sizes: default_kernel_sizes(),
            strides: default_strides(),
            paddings: default_paddings(),
        }
    }
}

/// Encoder architecture of the external agent.
///
/// The label doubles as the model tag in derived log/checkpoint paths
/// (`logs/<env>/<tag>`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum EncoderArch {
    /// Convolutional encoder over rendered observations
    #[default]
    #[serde(rename = "CNN")]
    Cnn,
    /// Fully-connected encoder over raw state vectors
    #[serde(rename = "MLP")]
    Mlp,
    /// Recurrent encoder over observation histories
    #[serde(rename = "RNN")]
    Rnn,
}

impl EncoderArch {
    /// Flag value and path tag.
    pub fn as_str(self) -> &'static str {
        match self {
            EncoderArch::Cnn => "CNN",
            EncoderArch::Mlp => "MLP",
            EncoderArch::Rnn => "RNN",
        }
    }

    /// Whether the convolutional parameter sequences apply.
    pub fn is_convolutional(self) -> bool {
        matches!(self, EncoderArch::Cnn)
    }
}

/// Training hyperparameters, forwarded to the entrypoint in train mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Number of training epochs
    #[serde(default = "default_n_epochs")]
    pub n_epochs: u32,

    /// Gradient updates per epoch
    #[serde(default = "default_n_updates")]
    pub n_updates: u32,

    /// Minibatch size per update
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Discount factor
    #[serde(default = "default_gamma")]
    pub gamma: f64,

    /// Target network soft-update coefficient
    #[serde(default = "default_soft_tau")]
    pub soft_tau: f64,

    /// Multiplier applied to environment rewards
    #[serde(default = "default_reward_scale")]
    pub reward_scale: f64,

    /// Normalize rewards within each batch
    #[serde(default = "default_true")]
    pub normalize_rewards: bool,

    /// Tune the entropy temperature automatically
    #[serde(default = "default_true")]
    pub adaptive_entropy: bool,

    /// Environment samples drawn per gradient update
    #[serde(default = "default_n_samples_per_update")]
    pub n_samples_per_update: u32,

    /// Target ratio of updates to collected samples; the entrypoint throttles
    /// its samplers around this value
    #[serde(default = "default_update_sample_ratio")]
    pub update_sample_ratio: f64,
}

fn default_n_epochs() -> u32 {
    1000
}

fn default_n_updates() -> u32 {
    256
}

fn default_batch_size() -> u32 {
    256
}

fn default_gamma() -> f64 {
    0.99
}

fn default_soft_tau() -> f64 {
    0.01
}

fn default_reward_scale() -> f64 {
    1.0
}

fn default_n_samples_per_update() -> u32 {
    256
}

fn default_update_sample_ratio() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            n_epochs: default_n_epochs(),
            n_updates: default_n_updates(),
            batch_size: default_batch_size(),
            gamma: default_gamma(),
            soft_tau: default_soft_tau(),
            reward_scale: default_reward_scale(),
            normalize_rewards: true,
            adaptive_entropy: true,
            n_samples_per_update: default_n_samples_per_update(),
            update_sample_ratio: default_update_sample_ratio(),
        }
    }
}

/// External entrypoint invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrypointConfig {
    /// Interpreter or binary to run; supports `${ENV_VAR}` expansion
    #[serde(default = "default_program")]
    pub program: String,

    /// Script passed as the first argument, relative to the project root;
    /// supports `${ENV_VAR}` expansion
    #[serde(default = "default_script")]
    pub script: String,

    /// Value for the PYTHONWARNINGS override on the child process
    #[serde(default = "default_python_warnings")]
    pub python_warnings: String,

    /// Project root override; derived from the launcher's own location when
    /// omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_script() -> String {
    "main.py".to_string()
}

fn default_python_warnings() -> String {
    "ignore".to_string()
}

impl Default for EntrypointConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            script: default_script(),
            python_warnings: default_python_warnings(),
            project_root: None,
        }
    }
}

impl RunConfig {
    /// Load a run configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Validate the configuration before any side effect.
    ///
    /// Rejects an empty environment id, an empty device list, and encoder
    /// layer sequences of unequal length.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.env.trim().is_empty() {
            return Err(ConfigError::EmptyEnvId);
        }

        if self.run.devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }

        let encoder = &self.model.encoder;
        if encoder.arch.is_convolutional() {
            let layers = encoder.hidden_channels.len();
            if encoder.kernel_sizes.len() != layers
                || encoder.strides.len() != layers
                || encoder.paddings.len() != layers
            {
                return Err(ConfigError::MismatchedEncoderLayers {
                    hidden_channels: encoder.hidden_channels.len(),
                    kernel_sizes: encoder.kernel_sizes.len(),
                    strides: encoder.strides.len(),
                    paddings: encoder.paddings.len(),
                });
            }

            if layers == 0 {
                return Err(ConfigError::NoEncoderLayers);
            }
        }

        Ok(())
    }

    /// Model tag used in derived log/checkpoint paths.
    pub fn arch_tag(&self) -> &'static str {
        self.model.encoder.arch.as_str()
    }
}

/// Expand environment variables in a string.
///
/// Supports ${VAR_NAME} syntax; unset variables leave the placeholder
/// unchanged.
pub fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

    for cap in re.captures_iter(s) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Environment id must not be empty")]
    EmptyEnvId,

    #[error("Device list must name at least one device index")]
    NoDevices,

    #[error(
        "Encoder layer sequences must have equal length: \
         hidden_channels={hidden_channels}, kernel_sizes={kernel_sizes}, \
         strides={strides}, paddings={paddings}"
    )]
    MismatchedEncoderLayers {
        hidden_channels: usize,
        kernel_sizes: usize,
        strides: usize,
        paddings: usize,
    },

    #[error("Convolutional encoder must have at least one layer")]
    NoEncoderLayers,
}

/// Complete example configuration, matching the reference evaluation run.
pub const EXAMPLE_CONFIG: &str = r#"# sacrun configuration file

mode = "test"

[run]
env = "InvertedPendulumBulletEnv-v0"
devices = [0, 1, 2, 3]
n_episodes = 100
n_samplers = 4
random_seed = 0
log_episode_video = true
load_checkpoint = true

[model]
vision_observation = true
image_size = 128
hidden_dims = [128, 64]
activation = "LeakyReLU"
state_dim = 128

[model.encoder]
arch = "CNN"
hidden_channels = [64, 64, 64]
kernel_sizes = [3, 3, 3]
strides = [1, 1, 1]
paddings = [1, 1, 1]

[train]
n_epochs = 1000
n_updates = 256
batch_size = 256
gamma = 0.99
soft_tau = 0.01
reward_scale = 1.0

[entrypoint]
program = "python3"
script = "main.py"
"#;
