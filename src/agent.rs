use std::path::Path;

use crate::config::TrainParams;
use crate::error::Result;
use crate::replay_buffer::ReplaySource;

/// Losses collected over one `train` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainReport {
    /// One entry per iteration
    pub critic_losses: Vec<f64>,
    /// One entry per iteration that updated the actor
    pub actor_losses: Vec<f64>,
}

impl TrainReport {
    pub fn iterations(&self) -> usize {
        self.critic_losses.len()
    }

    pub fn actor_updates(&self) -> usize {
        self.actor_losses.len()
    }

    pub fn mean_critic_loss(&self) -> Option<f64> {
        mean(&self.critic_losses)
    }

    pub fn mean_actor_loss(&self) -> Option<f64> {
        mean(&self.actor_losses)
    }
}

fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().sum::<f64>() / xs.len() as f64)
    }
}

pub trait Agent {
    /// Runs `iterations` sequential training iterations on batches drawn from `replay`.
    fn train<R: ReplaySource + ?Sized>(
        &mut self,
        replay: &mut R,
        iterations: usize,
        params: &TrainParams,
    ) -> Result<TrainReport>;

    /// Writes the actor and critic parameters as two artifacts under `directory`.
    fn save<P: AsRef<Path>>(&self, directory: P, name: &str) -> Result<()>;

    /// Restores the live actor and critic; target networks are left untouched.
    fn load<P: AsRef<Path>>(&mut self, directory: P, name: &str) -> Result<()>;
}
