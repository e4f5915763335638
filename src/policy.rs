use std::cell::RefCell;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;

pub trait Policy {
    // 根据状态选择动作
    fn select_action(&self, state: &[f32]) -> Result<Vec<f32>>;
}

/// Uniformly random actions in `[-max_action, max_action]`, ignoring the state.
pub struct RandomPolicy {
    pub action_dim: usize,
    pub max_action: f64,
    rng: RefCell<StdRng>,
}

impl RandomPolicy {
    pub fn new(action_dim: usize, max_action: f64) -> Self {
        Self::with_rng(action_dim, max_action, StdRng::from_os_rng())
    }

    pub fn with_seed(action_dim: usize, max_action: f64, seed: u64) -> Self {
        Self::with_rng(action_dim, max_action, StdRng::seed_from_u64(seed))
    }

    fn with_rng(action_dim: usize, max_action: f64, rng: StdRng) -> Self {
        Self {
            action_dim,
            max_action,
            rng: RefCell::new(rng),
        }
    }
}

impl Policy for RandomPolicy {
    fn select_action(&self, _state: &[f32]) -> Result<Vec<f32>> {
        let bound = self.max_action as f32;
        let mut rng = self.rng.borrow_mut();
        Ok((0..self.action_dim)
            .map(|_| rng.random_range(-bound..=bound))
            .collect())
    }
}
