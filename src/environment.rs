pub struct StepResult<S, R> {
    pub next_state: S,
    pub reward: R,
    pub done: bool,
}

/// Continuous-control environment with flat `f32` states and actions.
pub trait Environment {
    fn reset(&mut self) -> Vec<f32>;

    /// `action` has `action_dim()` components in `[-max_action, max_action]`.
    fn step(&mut self, action: &[f32]) -> StepResult<Vec<f32>, f32>;

    /// 状态空间维度
    fn state_dim(&self) -> usize;

    /// 动作空间维度
    fn action_dim(&self) -> usize;

    /// Symmetric bound on every action component
    fn max_action(&self) -> f64;

    /// Per-dimension magnitude bound on observations, used for grid sweeps
    fn observation_high(&self) -> Vec<f32>;

    /// Identifier used when naming persisted policies
    fn name(&self) -> &str;
}
