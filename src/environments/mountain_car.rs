use crate::environment::{Environment, StepResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MIN_POSITION: f32 = -1.2;
const MAX_POSITION: f32 = 0.6;
const MAX_SPEED: f32 = 0.07;
const GOAL_POSITION: f32 = 0.45;
const POWER: f32 = 0.0015;

/// 连续版 MountainCar 环境，状态维度为 [position, velocity]，动作为 [-1, 1] 内的推力
pub struct MountainCarContinuous {
    pub state: [f32; 2],
    pub step_limit: usize,
    pub step_count: usize,
    rng: StdRng,
}

impl MountainCarContinuous {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Reproducible start positions for a given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            state: [-0.5, 0.0],
            step_limit: 999,
            step_count: 0,
            rng,
        }
    }

    pub fn with_step_limit(step_limit: usize) -> Self {
        Self {
            step_limit,
            ..Self::new()
        }
    }

    fn reached_goal(state: &[f32; 2]) -> bool {
        state[0] >= GOAL_POSITION && state[1] >= 0.0
    }
}

impl Default for MountainCarContinuous {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for MountainCarContinuous {
    fn reset(&mut self) -> Vec<f32> {
        self.state = [self.rng.random_range(-0.6..-0.4), 0.0];
        self.step_count = 0;
        self.state.to_vec()
    }

    fn step(&mut self, action: &[f32]) -> StepResult<Vec<f32>, f32> {
        let force = action.first().copied().unwrap_or(0.0).clamp(-1.0, 1.0);
        let [position, velocity] = self.state;

        let mut velocity = velocity + force * POWER - 0.0025 * (3.0 * position).cos();
        velocity = velocity.clamp(-MAX_SPEED, MAX_SPEED);
        let position = (position + velocity).clamp(MIN_POSITION, MAX_POSITION);
        // 撞到左边界时速度清零
        if position == MIN_POSITION && velocity < 0.0 {
            velocity = 0.0;
        }

        self.state = [position, velocity];
        self.step_count += 1;

        let goal = Self::reached_goal(&self.state);
        let mut reward = -0.1 * force * force;
        if goal {
            reward += 100.0;
        }

        StepResult {
            next_state: self.state.to_vec(),
            reward,
            done: goal || self.step_count >= self.step_limit,
        }
    }

    fn state_dim(&self) -> usize {
        2 // [position, velocity]
    }

    fn action_dim(&self) -> usize {
        1
    }

    fn max_action(&self) -> f64 {
        1.0
    }

    fn observation_high(&self) -> Vec<f32> {
        vec![MAX_POSITION.abs().max(MIN_POSITION.abs()), MAX_SPEED]
    }

    fn name(&self) -> &str {
        "MountainCarContinuous-v0"
    }
}
