use tch::nn::{self, Module};
use tch::{Device, Reduction, Tensor};

use crate::algorithms::variant::Variant;
use crate::error::Result;
use crate::networks::mlp::Mlp;

/// Single critic that joins the action in after the first hidden layer.
struct SingleCritic {
    l1: nn::Linear,
    l2: nn::Linear,
    l3: nn::Linear,
}

impl SingleCritic {
    fn new(p: &nn::Path, state_dim: i64, action_dim: i64, hidden: [i64; 2]) -> Self {
        let l1 = nn::linear(p / "l1", state_dim, hidden[0], Default::default());
        let l2 = nn::linear(p / "l2", hidden[0] + action_dim, hidden[1], Default::default());
        let l3 = nn::linear(p / "l3", hidden[1], 1, Default::default());
        Self { l1, l2, l3 }
    }

    fn forward(&self, states: &Tensor, actions: &Tensor) -> Tensor {
        let xs = self.l1.forward(states).relu();
        let xs = Tensor::cat(&[&xs, actions], 1);
        let xs = self.l2.forward(&xs).relu();
        self.l3.forward(&xs)
    }
}

/// Two independent heads, each fed the concatenated (state, action).
struct TwinCritic {
    q1: Mlp,
    q2: Mlp,
}

impl TwinCritic {
    fn new(p: &nn::Path, state_dim: i64, action_dim: i64, hidden: [i64; 2]) -> Self {
        let q1 = Mlp::new(&(p / "q1"), state_dim + action_dim, hidden, 1);
        let q2 = Mlp::new(&(p / "q2"), state_dim + action_dim, hidden, 1);
        Self { q1, q2 }
    }

    fn forward(&self, states: &Tensor, actions: &Tensor) -> (Tensor, Tensor) {
        let xu = Tensor::cat(&[states, actions], 1);
        (self.q1.forward(&xu), self.q2.forward(&xu))
    }

    fn q1(&self, states: &Tensor, actions: &Tensor) -> Tensor {
        let xu = Tensor::cat(&[states, actions], 1);
        self.q1.forward(&xu)
    }
}

enum Heads {
    Single(SingleCritic),
    Twin(TwinCritic),
}

/// Output of a critic forward pass, each tensor shaped `[N, 1]`.
pub enum QEstimate {
    Single(Tensor),
    Twin(Tensor, Tensor),
}

impl QEstimate {
    pub fn heads(&self) -> Vec<&Tensor> {
        match self {
            QEstimate::Single(q) => vec![q],
            QEstimate::Twin(q1, q2) => vec![q1, q2],
        }
    }

    /// Sum over heads of the mean-squared error against a shared target.
    pub fn mse_against(&self, target: &Tensor) -> Tensor {
        match self {
            QEstimate::Single(q) => q.mse_loss(target, Reduction::Mean),
            QEstimate::Twin(q1, q2) => {
                q1.mse_loss(target, Reduction::Mean) + q2.mse_loss(target, Reduction::Mean)
            }
        }
    }

    /// Elementwise minimum across heads; the sole head for a single critic.
    pub fn min(&self) -> Tensor {
        match self {
            QEstimate::Single(q) => q.shallow_clone(),
            QEstimate::Twin(q1, q2) => q1.min_other(q2),
        }
    }
}

/// Critic: (state, action) -> one or two value estimates depending on the variant.
pub struct ValueNetwork {
    var_store: nn::VarStore,
    heads: Heads,
    variant: Variant,
    state_dim: usize,
    action_dim: usize,
    hidden: [i64; 2],
}

impl ValueNetwork {
    pub fn new(
        device: Device,
        variant: Variant,
        state_dim: usize,
        action_dim: usize,
        hidden: [i64; 2],
    ) -> Self {
        let var_store = nn::VarStore::new(device);
        let root = var_store.root();
        let (s, a) = (state_dim as i64, action_dim as i64);
        let heads = match variant {
            Variant::Baseline => Heads::Single(SingleCritic::new(&root, s, a, hidden)),
            Variant::TwinDelayed => Heads::Twin(TwinCritic::new(&root, s, a, hidden)),
        };
        ValueNetwork {
            var_store,
            heads,
            variant,
            state_dim,
            action_dim,
            hidden,
        }
    }

    pub fn forward(&self, states: &Tensor, actions: &Tensor) -> QEstimate {
        match &self.heads {
            Heads::Single(critic) => QEstimate::Single(critic.forward(states, actions)),
            Heads::Twin(critic) => {
                let (q1, q2) = critic.forward(states, actions);
                QEstimate::Twin(q1, q2)
            }
        }
    }

    /// First head only; the second head's graph is never built.
    pub fn q1(&self, states: &Tensor, actions: &Tensor) -> Tensor {
        match &self.heads {
            Heads::Single(critic) => critic.forward(states, actions),
            Heads::Twin(critic) => critic.q1(states, actions),
        }
    }

    pub fn duplicate(&self) -> Result<Self> {
        let mut copy = Self::new(
            self.device(),
            self.variant,
            self.state_dim,
            self.action_dim,
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

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    pub fn action_dim(&self) -> usize {
        self.action_dim
    }
}
