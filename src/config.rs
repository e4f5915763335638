//! Configuration
//!
//! Construction-time settings for agents and per-call training hyperparameters.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tch::Device;

use crate::algorithms::variant::Variant;
use crate::error::{Result, RlError};

/// Compute backend, resolved once when an agent is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceChoice {
    #[default]
    Cpu,
    Cuda(usize),
    /// CUDA device 0 when available, CPU otherwise.
    Auto,
}

impl DeviceChoice {
    pub fn resolve(self) -> Device {
        match self {
            DeviceChoice::Cpu => Device::Cpu,
            DeviceChoice::Cuda(index) => Device::Cuda(index),
            DeviceChoice::Auto => Device::cuda_if_available(),
        }
    }
}

/// Network shapes and optimizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Hidden layer widths of the policy network
    pub actor_hidden: [i64; 2],
    /// Hidden layer widths of each critic head
    pub critic_hidden: [i64; 2],
    /// Adam learning rate for both networks
    pub learning_rate: f64,
    /// L2 weight decay on the critic optimizer
    pub critic_weight_decay: f64,
    pub device: DeviceChoice,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            actor_hidden: [40, 30],
            critic_hidden: [40, 30],
            learning_rate: 1e-4,
            critic_weight_decay: 1e-4,
            device: DeviceChoice::Cpu,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.actor_hidden.iter().chain(&self.critic_hidden).any(|&w| w <= 0) {
            return Err(RlError::InvalidConfig(
                "hidden layer widths must be positive".into(),
            ));
        }
        if !(self.learning_rate > 0.0) {
            return Err(RlError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.critic_weight_decay < 0.0 {
            return Err(RlError::InvalidConfig(format!(
                "critic_weight_decay must be non-negative, got {}",
                self.critic_weight_decay
            )));
        }
        Ok(())
    }
}

/// Hyperparameters of one `train` call.
///
/// `policy_noise` and `noise_clip` only matter for the twin-delayed variant;
/// the baseline variant always updates every iteration regardless of
/// `policy_freq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainParams {
    pub batch_size: usize,
    /// Discount factor (gamma)
    pub discount: f64,
    /// Soft update rate for target networks
    pub tau: f64,
    /// Std of the target policy smoothing noise
    pub policy_noise: f64,
    /// Symmetric clip bound for the smoothing noise
    pub noise_clip: f64,
    /// Actor and target update period, in iterations
    pub policy_freq: usize,
}

impl TrainParams {
    pub fn baseline() -> Self {
        Self {
            batch_size: 64,
            discount: 0.99,
            tau: 0.001,
            policy_noise: 0.0,
            noise_clip: 0.0,
            policy_freq: 1,
        }
    }

    pub fn twin_delayed() -> Self {
        Self {
            batch_size: 100,
            discount: 0.99,
            tau: 0.005,
            policy_noise: 0.2,
            noise_clip: 0.5,
            policy_freq: 2,
        }
    }

    /// Defaults matching the given variant.
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Baseline => Self::baseline(),
            Variant::TwinDelayed => Self::twin_delayed(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(RlError::InvalidConfig("batch_size must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.tau) {
            return Err(RlError::InvalidConfig(format!(
                "tau must lie in [0, 1], got {}",
                self.tau
            )));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(RlError::InvalidConfig(format!(
                "discount must lie in [0, 1], got {}",
                self.discount
            )));
        }
        if self.policy_freq == 0 {
            return Err(RlError::InvalidConfig("policy_freq must be at least 1".into()));
        }
        if self.policy_noise < 0.0 || self.noise_clip < 0.0 {
            return Err(RlError::InvalidConfig(
                "policy_noise and noise_clip must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Settings for the command-line driver, read from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub variant: Variant,
    pub agent: AgentConfig,
    /// Falls back to the variant's presets when absent
    pub train: Option<TrainParams>,
    pub episodes: usize,
    pub max_episode_steps: usize,
    pub buffer_size: usize,
    /// Steps of uniformly random actions before the policy takes over
    pub start_steps: usize,
    /// Std of Gaussian exploration noise, relative to `max_action`
    pub exploration_noise: f64,
    pub policy_directory: String,
    pub seed: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            variant: Variant::TwinDelayed,
            agent: AgentConfig::default(),
            train: None,
            episodes: 50,
            max_episode_steps: 999,
            buffer_size: 100_000,
            start_steps: 1_000,
            exploration_noise: 0.1,
            policy_directory: "policies".to_string(),
            seed: None,
        }
    }
}

impl DriverConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: DriverConfig = toml::from_str(s)?;
        config.agent.validate()?;
        config.train_params().validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn train_params(&self) -> TrainParams {
        self.train
            .clone()
            .unwrap_or_else(|| TrainParams::for_variant(self.variant))
    }
}
