use std::fs;
use std::path::{Path, PathBuf};

use tch::nn::{self, OptimizerConfig};
use tch::{Device, Kind, Tensor};
use tracing::{debug, info, warn};

use crate::agent::{Agent, TrainReport};
use crate::algorithms::variant::Variant;
use crate::config::{AgentConfig, TrainParams};
use crate::environment::Environment;
use crate::error::{Result, RlError, ensure_dim};
use crate::networks::{PolicyNetwork, ValueNetwork};
use crate::policy::Policy;
use crate::replay_buffer::{BatchTensors, ReplaySource};
use crate::target::TargetPair;

/// `"{policy}_{environment}"`, the stem shared by both artifacts of a policy.
pub fn artifact_name(policy: &str, environment: &str) -> String {
    format!("{policy}_{environment}")
}

/// Actor and critic artifact paths for `name` inside `directory`.
pub fn artifact_paths(directory: &Path, name: &str) -> (PathBuf, PathBuf) {
    (
        directory.join(format!("{name}_actor.ot")),
        directory.join(format!("{name}_critic.ot")),
    )
}

/// Fails unless `path` holds exactly the variables of `vs`, with identical shapes.
fn ensure_artifact_matches(vs: &nn::VarStore, path: &Path) -> Result<()> {
    let saved = Tensor::load_multi(path)?;
    let vars = vs.variables();
    for (name, tensor) in &saved {
        let expected = vars.get(name).map(Tensor::size).ok_or_else(|| {
            RlError::InvalidConfig(format!("{} holds unknown variable {name}", path.display()))
        })?;
        let actual = tensor.size();
        if expected != actual {
            return Err(RlError::ShapeMismatch {
                name: name.clone(),
                expected,
                actual,
            });
        }
    }
    ensure_dim("saved variables", vars.len(), saved.len())
}

/// Off-policy actor-critic learner shared by the baseline and twin-delayed variants.
pub struct ActorCriticAgent {
    variant: Variant,
    actor: PolicyNetwork,
    critic: ValueNetwork,
    targets: TargetPair,
    actor_opt: nn::Optimizer,
    critic_opt: nn::Optimizer,
    /// Completed iterations across all `train` calls
    iterations: u64,
    device: Device,
}

impl ActorCriticAgent {
    pub fn new(
        variant: Variant,
        state_dim: usize,
        action_dim: usize,
        max_action: f64,
        config: &AgentConfig,
    ) -> Result<Self> {
        config.validate()?;
        if state_dim == 0 || action_dim == 0 {
            return Err(RlError::InvalidConfig(format!(
                "state and action dimensions must be positive, got {state_dim} and {action_dim}"
            )));
        }
        if !(max_action.is_finite() && max_action > 0.0) {
            return Err(RlError::InvalidConfig(format!(
                "max_action must be finite and positive, got {max_action}"
            )));
        }
        let device = config.device.resolve();

        let actor = PolicyNetwork::new(
            device,
            state_dim,
            action_dim,
            max_action,
            config.actor_hidden,
        );
        let critic = ValueNetwork::new(
            device,
            variant,
            state_dim,
            action_dim,
            config.critic_hidden,
        );
        let targets = TargetPair::new(&actor, &critic)?;

        let actor_opt = nn::Adam::default().build(actor.var_store(), config.learning_rate)?;
        let critic_opt = nn::Adam {
            wd: config.critic_weight_decay,
            ..Default::default()
        }
        .build(critic.var_store(), config.learning_rate)?;

        debug!(
            %variant,
            state_dim,
            action_dim,
            max_action,
            ?device,
            "built actor-critic agent"
        );

        Ok(ActorCriticAgent {
            variant,
            actor,
            critic,
            targets,
            actor_opt,
            critic_opt,
            iterations: 0,
            device,
        })
    }

    /// Sizes the networks from the environment's state/action spaces.
    pub fn for_environment<E: Environment + ?Sized>(
        variant: Variant,
        env: &E,
        config: &AgentConfig,
    ) -> Result<Self> {
        Self::new(
            variant,
            env.state_dim(),
            env.action_dim(),
            env.max_action(),
            config,
        )
    }

    /// Resets both target networks to the live parameters.
    pub fn sync_targets(&mut self) -> Result<()> {
        self.targets.initialize(&self.actor, &self.critic)
    }

    /// One iteration: critic step, then (per the variant's cadence) actor step.
    /// Returns the critic loss and, when the actor moved, the actor loss.
    fn train_iteration(&mut self, batch: &BatchTensors, params: &TrainParams) -> (f64, Option<f64>) {
        self.iterations += 1;
        let critic_loss = self.critic_step(batch, params);
        if !self.variant.updates_policy(self.iterations, params) {
            return (critic_loss, None);
        }
        (critic_loss, Some(self.actor_step(batch)))
    }

    fn critic_step(&mut self, batch: &BatchTensors, params: &TrainParams) -> f64 {
        let target_q = self.variant.bootstrap_target(&self.targets, batch, params);
        let critic_loss = self
            .critic
            .forward(&batch.states, &batch.actions)
            .mse_against(&target_q);
        self.critic_opt.backward_step(&critic_loss);
        critic_loss.double_value(&[])
    }

    /// Gradient ascent on `Q1(s, π(s))`. The critic only scores the actor's
    /// output here; its parameters are frozen for the pass.
    fn actor_step(&mut self, batch: &BatchTensors) -> f64 {
        self.critic.var_store_mut().freeze();
        let actor_loss = -self
            .critic
            .q1(&batch.states, &self.actor.forward(&batch.states))
            .mean(Kind::Float);
        self.actor_opt.backward_step(&actor_loss);
        self.critic.var_store_mut().unfreeze();
        actor_loss.double_value(&[])
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn actor(&self) -> &PolicyNetwork {
        &self.actor
    }

    pub fn critic(&self) -> &ValueNetwork {
        &self.critic
    }

    pub fn targets(&self) -> &TargetPair {
        &self.targets
    }

    /// Completed iterations across all `train` calls.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn state_dim(&self) -> usize {
        self.actor.state_dim()
    }

    pub fn action_dim(&self) -> usize {
        self.actor.action_dim()
    }

    pub fn max_action(&self) -> f64 {
        self.actor.max_action()
    }
}

impl Agent for ActorCriticAgent {
    fn train<R: ReplaySource + ?Sized>(
        &mut self,
        replay: &mut R,
        iterations: usize,
        params: &TrainParams,
    ) -> Result<TrainReport> {
        params.validate()?;
        let mut report = TrainReport {
            critic_losses: Vec::with_capacity(iterations),
            actor_losses: Vec::new(),
        };

        for _ in 0..iterations {
            let batch = replay
                .uniform_sample(params.batch_size)?
                .to_tensors(self.device, self.state_dim(), self.action_dim())?;

            let (critic_loss, actor_loss) = self.train_iteration(&batch, params);
            if let Some(actor_loss) = actor_loss {
                self.targets.soft_update(&self.actor, &self.critic, params.tau)?;
                report.actor_losses.push(actor_loss);
            }
            if !critic_loss.is_finite() {
                warn!(iteration = self.iterations, critic_loss, "non-finite critic loss");
            }
            debug!(
                iteration = self.iterations,
                critic_loss,
                actor_loss,
                "training iteration"
            );
            report.critic_losses.push(critic_loss);
        }

        info!(
            variant = %self.variant,
            iterations,
            actor_updates = report.actor_updates(),
            mean_critic_loss = report.mean_critic_loss(),
            mean_actor_loss = report.mean_actor_loss(),
            "training finished"
        );
        Ok(report)
    }

    fn save<P: AsRef<Path>>(&self, directory: P, name: &str) -> Result<()> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory)?;
        let (actor_path, critic_path) = artifact_paths(directory, name);
        self.actor.var_store().save(&actor_path)?;
        self.critic.var_store().save(&critic_path)?;
        info!(?actor_path, ?critic_path, "saved policy");
        Ok(())
    }

    fn load<P: AsRef<Path>>(&mut self, directory: P, name: &str) -> Result<()> {
        let (actor_path, critic_path) = artifact_paths(directory.as_ref(), name);

        // VarStore::load broadcasts, so shapes are checked against the file first.
        ensure_artifact_matches(self.actor.var_store(), &actor_path)?;
        ensure_artifact_matches(self.critic.var_store(), &critic_path)?;

        // Stage both artifacts so a failure in either leaves the live networks untouched.
        let mut actor = self.actor.duplicate()?;
        actor.var_store_mut().load(&actor_path)?;
        let mut critic = self.critic.duplicate()?;
        critic.var_store_mut().load(&critic_path)?;

        self.actor.var_store_mut().copy(actor.var_store())?;
        self.critic.var_store_mut().copy(critic.var_store())?;
        info!(?actor_path, ?critic_path, "loaded policy; targets not synced");
        Ok(())
    }
}

impl Policy for ActorCriticAgent {
    fn select_action(&self, state: &[f32]) -> Result<Vec<f32>> {
        ensure_dim("state", self.state_dim(), state.len())?;
        let _no_grad_guard = tch::no_grad_guard();
        let state = Tensor::from_slice(state)
            .view([1, state.len() as i64])
            .to_device(self.device);
        let action = self
            .actor
            .forward(&state)
            .to_device(Device::Cpu)
            .flatten(0, -1);
        Ok(Vec::<f32>::try_from(&action)?)
    }
}
