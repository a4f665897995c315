//! Delegated command assembly.
//!
//! The external entrypoint owns the actual train/test loop; this module only
//! serializes a [`RunConfig`] into its flag surface. Flag order is stable so
//! that provenance logs stay diffable across runs.

use crate::launch::RunPaths;
use crate::models::config::expand_env_vars;
use crate::models::{Mode, RunConfig};
use std::fmt::Display;
use std::path::PathBuf;

/// Environment variable silencing interpreter warnings on the child.
pub const PYTHON_WARNINGS_VAR: &str = "PYTHONWARNINGS";

/// Fully assembled invocation of the external entrypoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateCommand {
    /// Program to execute (after `${VAR}` expansion)
    pub program: String,
    /// Script plus the serialized flag list
    pub args: Vec<String>,
    /// Environment overrides applied to the child only
    pub env: Vec<(String, String)>,
    /// Working directory of the child (the project root)
    pub current_dir: PathBuf,
}

impl DelegateCommand {
    /// Assemble the entrypoint invocation for a validated configuration.
    pub fn build(config: &RunConfig, paths: &RunPaths) -> Self {
        let mut args = vec![expand_env_vars(&config.entrypoint.script)];
        args.extend(flag_args(config, paths));

        Self {
            program: expand_env_vars(&config.entrypoint.program),
            args,
            env: vec![(
                PYTHON_WARNINGS_VAR.to_string(),
                config.entrypoint.python_warnings.clone(),
            )],
            current_dir: paths.project_root.clone(),
        }
    }
}

/// Serialize the configuration into the entrypoint's flag list.
fn flag_args(config: &RunConfig, paths: &RunPaths) -> Vec<String> {
    let mut args = Vec::new();

    push_value(&mut args, "--mode", config.mode.as_str());
    push_seq(&mut args, "--gpu", &config.run.devices);
    push_value(&mut args, "--env", &config.run.env);

    push_switch(&mut args, "--vision-observation", config.model.vision_observation);
    push_value(&mut args, "--image-size", config.model.image_size);
    push_seq(&mut args, "--hidden-dims", &config.model.hidden_dims);
    push_value(&mut args, "--activation", &config.model.activation);

    let encoder = &config.model.encoder;
    push_value(&mut args, "--encoder-arch", encoder.arch.as_str());
    push_value(&mut args, "--state-dim", config.model.state_dim);
    if encoder.arch.is_convolutional() {
        push_seq(&mut args, "--encoder-hidden-channels", &encoder.hidden_channels);
        push_seq(&mut args, "--kernel-sizes", &encoder.kernel_sizes);
        push_seq(&mut args, "--strides", &encoder.strides);
        push_seq(&mut args, "--paddings", &encoder.paddings);
    }

    if config.mode == Mode::Test {
        push_value(&mut args, "--n-episodes", config.run.n_episodes);
    }
    push_value(&mut args, "--n-samplers", config.run.n_samplers);
    push_value(&mut args, "--random-seed", config.run.random_seed);

    if let Some(steps) = config.run.max_episode_steps {
        push_value(&mut args, "--max-episode-steps", steps);
    }
    push_switch(&mut args, "--deterministic", config.run.deterministic);
    push_switch(&mut args, "--render", config.run.render);
    push_switch(&mut args, "--log-episode-video", config.run.log_episode_video);

    push_value(&mut args, "--log-dir", paths.log_dir.display());
    push_value(&mut args, "--checkpoint-dir", paths.checkpoint_dir.display());
    push_switch(&mut args, "--load-checkpoint", config.run.load_checkpoint);

    if config.mode == Mode::Train {
        let train = &config.train;
        push_value(&mut args, "--n-epochs", train.n_epochs);
        push_value(&mut args, "--n-updates", train.n_updates);
        push_value(&mut args, "--batch-size", train.batch_size);
        push_value(&mut args, "--gamma", train.gamma);
        push_value(&mut args, "--soft-tau", train.soft_tau);
        push_value(&mut args, "--reward-scale", train.reward_scale);
        push_switch(&mut args, "--normalize-rewards", train.normalize_rewards);
        push_switch(&mut args, "--adaptive-entropy", train.adaptive_entropy);
        push_value(&mut args, "--n-samples-per-update", train.n_samples_per_update);
        push_value(&mut args, "--update-sample-ratio", train.update_sample_ratio);
    }

    args
}

fn push_value(args: &mut Vec<String>, flag: &str, value: impl Display) {
    args.push(flag.to_string());
    args.push(value.to_string());
}

fn push_seq(args: &mut Vec<String>, flag: &str, values: &[impl Display]) {
    args.push(flag.to_string());
    args.extend(values.iter().map(ToString::to_string));
}

/// Boolean flags are present-if-true, absent otherwise.
fn push_switch(args: &mut Vec<String>, flag: &str, enabled: bool) {
    if enabled {
        args.push(flag.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mode, RunConfig, EXAMPLE_CONFIG};
    use std::path::PathBuf;

    fn reference_setup() -> (RunConfig, RunPaths) {
        let config: RunConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        let paths = RunPaths::derive(
            PathBuf::from("/proj"),
            &config.run.env,
            config.arch_tag(),
        );
        (config, paths)
    }

    #[test]
    fn test_reference_test_invocation() {
        let (config, paths) = reference_setup();
        let cmd = DelegateCommand::build(&config, &paths);

        assert_eq!(cmd.program, "python3");
        assert_eq!(cmd.current_dir, PathBuf::from("/proj"));
        assert_eq!(
            cmd.env,
            vec![("PYTHONWARNINGS".to_string(), "ignore".to_string())]
        );

        let expected: Vec<String> = [
            "main.py",
            "--mode", "test",
            "--gpu", "0", "1", "2", "3",
            "--env", "InvertedPendulumBulletEnv-v0",
            "--vision-observation",
            "--image-size", "128",
            "--hidden-dims", "128", "64",
            "--activation", "LeakyReLU",
            "--encoder-arch", "CNN",
            "--state-dim", "128",
            "--encoder-hidden-channels", "64", "64", "64",
            "--kernel-sizes", "3", "3", "3",
            "--strides", "1", "1", "1",
            "--paddings", "1", "1", "1",
            "--n-episodes", "100",
            "--n-samplers", "4",
            "--random-seed", "0",
            "--log-episode-video",
            "--log-dir", "/proj/logs/InvertedPendulumBulletEnv-v0/CNN",
            "--checkpoint-dir", "/proj/checkpoints/InvertedPendulumBulletEnv-v0/CNN",
            "--load-checkpoint",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        assert_eq!(cmd.args, expected);
    }

    #[test]
    fn test_train_mode_appends_hyperparameters() {
        let (mut config, paths) = reference_setup();
        config.mode = Mode::Train;
        let cmd = DelegateCommand::build(&config, &paths);

        assert!(cmd.args.contains(&"--n-epochs".to_string()));
        assert!(cmd.args.contains(&"--gamma".to_string()));
        assert!(cmd.args.contains(&"--normalize-rewards".to_string()));
        // Episode count is an evaluation-only flag
        assert!(!cmd.args.contains(&"--n-episodes".to_string()));
    }

    #[test]
    fn test_unset_switches_are_omitted() {
        let (mut config, paths) = reference_setup();
        config.run.load_checkpoint = false;
        config.run.log_episode_video = false;
        config.model.vision_observation = false;
        let cmd = DelegateCommand::build(&config, &paths);

        assert!(!cmd.args.contains(&"--load-checkpoint".to_string()));
        assert!(!cmd.args.contains(&"--log-episode-video".to_string()));
        assert!(!cmd.args.contains(&"--vision-observation".to_string()));
        assert!(!cmd.args.contains(&"--deterministic".to_string()));
        assert!(!cmd.args.contains(&"--render".to_string()));
    }

    #[test]
    fn test_optional_episode_cap() {
        let (mut config, paths) = reference_setup();
        assert!(!DelegateCommand::build(&config, &paths)
            .args
            .contains(&"--max-episode-steps".to_string()));

        config.run.max_episode_steps = Some(500);
        let args = DelegateCommand::build(&config, &paths).args;
        let idx = args.iter().position(|a| a == "--max-episode-steps").unwrap();
        assert_eq!(args[idx + 1], "500");
    }

    #[test]
    fn test_non_convolutional_encoder_drops_conv_flags() {
        let (mut config, paths) = reference_setup();
        config.model.encoder.arch = crate::models::EncoderArch::Mlp;
        let cmd = DelegateCommand::build(&config, &paths);

        assert!(!cmd.args.contains(&"--encoder-hidden-channels".to_string()));
        assert!(!cmd.args.contains(&"--kernel-sizes".to_string()));
        let idx = cmd.args.iter().position(|a| a == "--encoder-arch").unwrap();
        assert_eq!(cmd.args[idx + 1], "MLP");
    }
}
