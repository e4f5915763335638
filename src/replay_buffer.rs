//! Experience storage
//!
//! Transitions, batches in parallel-array form, and the replay source the
//! training engine samples from.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tch::{Device, Tensor};

use crate::error::{Result, RlError, ensure_dim};

/// A single recorded environment step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: Vec<f32>,
    pub action: Vec<f32>,
    pub reward: f32,
    pub terminal: bool,
    pub next_state: Vec<f32>,
}

impl Transition {
    pub fn new(
        state: Vec<f32>,
        action: Vec<f32>,
        reward: f32,
        terminal: bool,
        next_state: Vec<f32>,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            terminal,
            next_state,
        }
    }
}

/// `len` transitions stored as row-major parallel arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub states: Vec<f32>,
    pub actions: Vec<f32>,
    pub rewards: Vec<f32>,
    pub terminals: Vec<bool>,
    pub next_states: Vec<f32>,
    pub state_dim: usize,
    pub action_dim: usize,
}

/// A batch moved onto a device. Every tensor has leading dimension N;
/// `rewards` and `not_done` are `[N, 1]`.
pub struct BatchTensors {
    pub states: Tensor,
    pub actions: Tensor,
    pub rewards: Tensor,
    pub not_done: Tensor,
    pub next_states: Tensor,
}

impl Batch {
    pub fn from_transitions<'a, I>(transitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Transition>,
    {
        let mut iter = transitions.into_iter().peekable();
        let (state_dim, action_dim) = match iter.peek() {
            Some(t) => (t.state.len(), t.action.len()),
            None => (0, 0),
        };

        let mut batch = Batch {
            states: Vec::new(),
            actions: Vec::new(),
            rewards: Vec::new(),
            terminals: Vec::new(),
            next_states: Vec::new(),
            state_dim,
            action_dim,
        };
        for t in iter {
            ensure_dim("transition state", state_dim, t.state.len())?;
            ensure_dim("transition next_state", state_dim, t.next_state.len())?;
            ensure_dim("transition action", action_dim, t.action.len())?;
            batch.states.extend_from_slice(&t.state);
            batch.actions.extend_from_slice(&t.action);
            batch.rewards.push(t.reward);
            batch.terminals.push(t.terminal);
            batch.next_states.extend_from_slice(&t.next_state);
        }
        Ok(batch)
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Checks the batch against the network dimensions and builds device tensors.
    pub fn to_tensors(&self, device: Device, state_dim: usize, action_dim: usize) -> Result<BatchTensors> {
        let n = self.len();
        ensure_dim("batch state width", state_dim, self.state_dim)?;
        ensure_dim("batch action width", action_dim, self.action_dim)?;
        ensure_dim("batch states", n * state_dim, self.states.len())?;
        ensure_dim("batch next_states", n * state_dim, self.next_states.len())?;
        ensure_dim("batch actions", n * action_dim, self.actions.len())?;
        ensure_dim("batch terminals", n, self.terminals.len())?;

        let (n, s, a) = (n as i64, state_dim as i64, action_dim as i64);
        let not_done: Vec<f32> = self
            .terminals
            .iter()
            .map(|&d| if d { 0.0 } else { 1.0 })
            .collect();

        Ok(BatchTensors {
            states: Tensor::from_slice(&self.states).view([n, s]).to_device(device),
            actions: Tensor::from_slice(&self.actions).view([n, a]).to_device(device),
            rewards: Tensor::from_slice(&self.rewards).view([n, 1]).to_device(device),
            not_done: Tensor::from_slice(&not_done).view([n, 1]).to_device(device),
            next_states: Tensor::from_slice(&self.next_states).view([n, s]).to_device(device),
        })
    }
}

/// Anything the training engine can draw uniform batches from.
pub trait ReplaySource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `batch_size` transitions drawn independently and uniformly, with replacement.
    /// Fails when fewer than `batch_size` transitions are stored.
    fn uniform_sample(&mut self, batch_size: usize) -> Result<Batch>;
}

/// Bounded FIFO replay buffer; the oldest transition is evicted when full.
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
    rng: StdRng,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_os_rng())
    }

    /// Deterministic sampling sequence for a given seed.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, rng: StdRng) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity.min(1 << 16)),
            capacity: capacity.max(1),
            rng,
        }
    }

    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }
}

impl ReplaySource for ReplayBuffer {
    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn uniform_sample(&mut self, batch_size: usize) -> Result<Batch> {
        let available = self.buffer.len();
        if available == 0 || available < batch_size {
            return Err(RlError::InsufficientSamples {
                requested: batch_size,
                available,
            });
        }
        let indices: Vec<usize> = (0..batch_size)
            .map(|_| self.rng.random_range(0..available))
            .collect();
        Batch::from_transitions(indices.into_iter().map(|i| &self.buffer[i]))
    }
}
