#![allow(dead_code)]

use std::collections::HashMap;

use tch::{Device, Kind, Tensor, nn};
use td3rl::{AgentConfig, ReplayBuffer, Transition};

pub fn config(hidden: [i64; 2], learning_rate: f64) -> AgentConfig {
    AgentConfig {
        actor_hidden: hidden,
        critic_hidden: hidden,
        learning_rate,
        ..AgentConfig::default()
    }
}

/// 200 transitions with S=2, A=1 and a reward that is a fixed function of state and action.
pub fn synthetic_replay(seed: u64, count: usize) -> ReplayBuffer {
    let mut replay = ReplayBuffer::with_seed(count, seed);
    for i in 0..count {
        let t = i as f32 / count as f32;
        let state = vec![(7.0 * t).sin(), (3.0 * t).cos()];
        let action = vec![(11.0 * t).sin() * 0.8];
        let reward = state[0] - 0.5 * action[0] * action[0];
        let next_state = vec![
            (state[0] + 0.1 * action[0]).clamp(-1.0, 1.0),
            state[1] * 0.95,
        ];
        replay.push(Transition::new(state, action, reward, i % 10 == 9, next_state));
    }
    replay
}

pub fn snapshot(vs: &nn::VarStore) -> HashMap<String, Tensor> {
    vs.variables()
        .into_iter()
        .map(|(name, t)| (name, t.copy()))
        .collect()
}

pub fn changed(before: &HashMap<String, Tensor>, vs: &nn::VarStore) -> bool {
    vs.variables()
        .iter()
        .any(|(name, t)| !t.equal(&before[name]))
}

pub fn probe_states(n: i64, dim: i64, scale: f64) -> Tensor {
    Tensor::randn([n, dim], (Kind::Float, Device::Cpu)) * scale
}

pub fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}
