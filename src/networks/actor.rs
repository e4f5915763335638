use tch::{Device, Tensor, nn};

use crate::error::Result;
use crate::networks::mlp::Mlp;

/// Deterministic policy: state -> action bounded to `[-max_action, max_action]`.
pub struct PolicyNetwork {
    var_store: nn::VarStore,
    model: Mlp,
    state_dim: usize,
    action_dim: usize,
    hidden: [i64; 2],
    max_action: f64,
}

impl PolicyNetwork {
    pub fn new(
        device: Device,
        state_dim: usize,
        action_dim: usize,
        max_action: f64,
        hidden: [i64; 2],
    ) -> Self {
        let var_store = nn::VarStore::new(device);
        let model = Mlp::new(
            &var_store.root(),
            state_dim as i64,
            hidden,
            action_dim as i64,
        );
        PolicyNetwork {
            var_store,
            model,
            state_dim,
            action_dim,
            hidden,
            max_action,
        }
    }

    /// `states` is `[N, state_dim]`, the result `[N, action_dim]`.
    pub fn forward(&self, states: &Tensor) -> Tensor {
        self.model.forward(states).tanh() * self.max_action
    }

    /// A network of identical shape on fresh storage holding a copy of these parameters.
    pub fn duplicate(&self) -> Result<Self> {
        let mut copy = Self::new(
            self.device(),
            self.state_dim,
            self.action_dim,
            self.max_action,
            self.hidden,
        );
        copy.var_store.copy(&self.var_store)?;
        Ok(copy)
    }

    pub fn var_store(&self) -> &nn::VarStore {
        &self.var_store
    }

    pub fn var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.var_store
    }

    pub fn device(&self) -> Device {
        self.var_store.device()
    }

    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    pub fn max_action(&self) -> f64 {
        self.max_action
    }
}
