//! Baseline (DDPG) and twin-critic delayed (TD3) strategies.
//!
//! Both share the training loop in [`crate::algorithms::actor_critic`]; they
//! differ in how the bootstrapped target is built and how often the actor
//! and target networks move.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tch::Tensor;

use crate::config::TrainParams;
use crate::error::RlError;
use crate::networks::PolicyNetwork;
use crate::replay_buffer::BatchTensors;
use crate::target::TargetPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Single critic, actor and targets updated every iteration.
    Baseline,
    /// Twin critics, target policy smoothing, delayed actor and target updates.
    #[default]
    TwinDelayed,
}

impl Variant {
    /// Name used in persisted artifact names.
    pub fn policy_name(self) -> &'static str {
        match self {
            Variant::Baseline => "DDPG",
            Variant::TwinDelayed => "TD3",
        }
    }

    pub fn critic_heads(self) -> usize {
        match self {
            Variant::Baseline => 1,
            Variant::TwinDelayed => 2,
        }
    }

    /// Whether the actor and targets update on the 1-based `iteration`.
    pub fn updates_policy(self, iteration: u64, params: &TrainParams) -> bool {
        match self {
            Variant::Baseline => true,
            Variant::TwinDelayed => iteration % params.policy_freq as u64 == 0,
        }
    }

    /// Next action proposed by the target actor, smoothed for the twin variant.
    pub(crate) fn target_action(
        self,
        target_actor: &PolicyNetwork,
        next_states: &Tensor,
        params: &TrainParams,
    ) -> Tensor {
        let next_actions = target_actor.forward(next_states);
        match self {
            Variant::Baseline => next_actions,
            Variant::TwinDelayed => {
                let max_action = target_actor.max_action();
                let noise = (Tensor::randn_like(&next_actions) * params.policy_noise)
                    .clamp(-params.noise_clip, params.noise_clip);
                (next_actions + noise).clamp(-max_action, max_action)
            }
        }
    }

    /// `reward + not_done * γ * Q_target(s', a')`, detached from every graph.
    ///
    /// For the twin variant `Q_target` is the elementwise minimum of both heads.
    pub(crate) fn bootstrap_target(
        self,
        targets: &TargetPair,
        batch: &BatchTensors,
        params: &TrainParams,
    ) -> Tensor {
        tch::no_grad(|| {
            let next_actions = self.target_action(targets.actor(), &batch.next_states, params);
            let next_q = targets
                .critic()
                .forward(&batch.next_states, &next_actions)
                .min();
            (&batch.rewards + &batch.not_done * params.discount * next_q).detach()
        })
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.policy_name())
    }
}

impl FromStr for Variant {
    type Err = RlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ddpg" | "baseline" => Ok(Variant::Baseline),
            "td3" | "twin-delayed" | "twin_delayed" => Ok(Variant::TwinDelayed),
            other => Err(RlError::InvalidConfig(format!("unknown policy variant: {other}"))),
        }
    }
}
