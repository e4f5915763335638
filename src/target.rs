//! Target networks.
//!
//! Frozen copies of the live actor and critic, moved toward the live
//! parameters only through Polyak averaging:
//!
//! ```text
//! θ_target = τ * θ_live + (1 - τ) * θ_target
//! ```

use tch::nn;

use crate::error::{Result, RlError};
use crate::networks::{PolicyNetwork, ValueNetwork};

pub struct TargetPair {
    actor: PolicyNetwork,
    critic: ValueNetwork,
}

impl TargetPair {
    /// Builds frozen targets whose parameters equal the live ones exactly.
    pub fn new(live_actor: &PolicyNetwork, live_critic: &ValueNetwork) -> Result<Self> {
        let mut actor = live_actor.duplicate()?;
        let mut critic = live_critic.duplicate()?;
        actor.var_store_mut().freeze();
        critic.var_store_mut().freeze();
        Ok(Self { actor, critic })
    }

    /// Copies the live parameters into the targets.
    pub fn initialize(&mut self, live_actor: &PolicyNetwork, live_critic: &ValueNetwork) -> Result<()> {
        self.actor.var_store_mut().copy(live_actor.var_store())?;
        self.critic.var_store_mut().copy(live_critic.var_store())?;
        Ok(())
    }

    /// Blends both targets toward the live networks at rate `tau`.
    pub fn soft_update(
        &mut self,
        live_actor: &PolicyNetwork,
        live_critic: &ValueNetwork,
        tau: f64,
    ) -> Result<()> {
        if !(0.0..=1.0).contains(&tau) {
            return Err(RlError::InvalidConfig(format!("tau must lie in [0, 1], got {tau}")));
        }
        blend(self.actor.var_store(), live_actor.var_store(), tau)?;
        blend(self.critic.var_store(), live_critic.var_store(), tau)?;
        Ok(())
    }

    pub fn actor(&self) -> &PolicyNetwork {
        &self.actor
    }

    pub fn critic(&self) -> &ValueNetwork {
        &self.critic
    }
}

fn blend(target: &nn::VarStore, source: &nn::VarStore, tau: f64) -> Result<()> {
    let source_vars = source.variables();
    tch::no_grad(|| -> Result<()> {
        for (name, mut target_var) in target.variables() {
            let source_var = source_vars.get(&name).ok_or_else(|| {
                RlError::InvalidConfig(format!("target variable {name} has no live counterpart"))
            })?;
            let blended = source_var * tau + &target_var * (1.0 - tau);
            target_var.f_copy_(&blended)?;
        }
        Ok(())
    })
}
