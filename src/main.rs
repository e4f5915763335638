use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tch::{Device, Kind, Tensor};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use td3rl::algorithms::artifact_name;
use td3rl::config::DriverConfig;
use td3rl::environment::Environment;
use td3rl::environments::MountainCarContinuous;
use td3rl::evaluation::q_values;
use td3rl::policy::RandomPolicy;
use td3rl::utils::{plot_losses, plot_surface};
use td3rl::{ActorCriticAgent, Agent, Policy, ReplayBuffer, ReplaySource, Transition, Variant};

#[derive(Parser)]
#[command(name = "td3rl", about = "Train and run DDPG / TD3 continuous-control policies")]
struct Cli {
    /// Only log warnings and errors
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a policy and save it to the policy directory
    Train(TrainArgs),
    /// Run a saved (or random) policy and report the total reward
    Run(RunArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// DDPG or TD3; overrides the configured variant
    #[arg(long)]
    policy_name: Option<String>,
    #[arg(long, default_value = "MountainCarContinuous-v0")]
    environment: String,
    /// TOML driver configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured episode count
    #[arg(long)]
    episodes: Option<usize>,
    /// Overrides the configured policy directory
    #[arg(long)]
    policy_directory: Option<String>,
    /// Write loss and Q-surface plots next to the saved policy
    #[arg(long)]
    plot: bool,
}

#[derive(Args)]
struct RunArgs {
    /// Random, DDPG or TD3
    #[arg(long, default_value = "Random")]
    policy_name: String,
    #[arg(long, default_value = "policies")]
    policy_directory: String,
    #[arg(long, default_value = "MountainCarContinuous-v0")]
    environment: String,
    #[arg(long, default_value_t = 50)]
    max_episodes: usize,
    #[arg(long, default_value_t = 5000)]
    buffer_size: usize,
    /// Seeds the environment, random policy and torch
    #[arg(long)]
    seed: Option<u64>,
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn make_env(name: &str, seed: Option<u64>) -> anyhow::Result<Box<dyn Environment>> {
    match name {
        "MountainCarContinuous-v0" | "mountain_car" => Ok(Box::new(match seed {
            Some(seed) => MountainCarContinuous::with_seed(seed),
            None => MountainCarContinuous::new(),
        })),
        other => bail!("unknown environment: {other}"),
    }
}

fn random_policy(env: &dyn Environment, seed: Option<u64>) -> RandomPolicy {
    match seed {
        Some(seed) => RandomPolicy::with_seed(env.action_dim(), env.max_action(), seed.wrapping_add(1)),
        None => RandomPolicy::new(env.action_dim(), env.max_action()),
    }
}

/// Adds clipped Gaussian exploration noise with std `std * max_action`.
fn explore(action: &[f32], std: f64, max_action: f64) -> anyhow::Result<Vec<f32>> {
    let noise = Tensor::randn([action.len() as i64], (Kind::Float, Device::Cpu)) * (std * max_action);
    let noisy = (Tensor::from_slice(action) + noise).clamp(-max_action, max_action);
    Ok(Vec::<f32>::try_from(&noisy)?)
}

fn train(args: TrainArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => DriverConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => DriverConfig::default(),
    };
    if let Some(name) = &args.policy_name {
        config.variant = name.parse::<Variant>()?;
    }
    if let Some(episodes) = args.episodes {
        config.episodes = episodes;
    }
    if let Some(dir) = args.policy_directory {
        config.policy_directory = dir;
    }
    if let Some(seed) = config.seed {
        tch::manual_seed(seed as i64);
    }

    let mut env = make_env(&args.environment, config.seed)?;
    let params = config.train_params();
    params.validate()?;
    let mut agent = ActorCriticAgent::for_environment(config.variant, env.as_ref(), &config.agent)?;
    let mut replay = match config.seed {
        Some(seed) => ReplayBuffer::with_seed(config.buffer_size, seed),
        None => ReplayBuffer::new(config.buffer_size),
    };
    let random = random_policy(env.as_ref(), config.seed);

    let mut total_steps = 0usize;
    let mut critic_losses = Vec::new();
    for episode in 0..config.episodes {
        let mut state = env.reset();
        let mut episode_reward = 0.0;
        let mut steps = 0usize;

        loop {
            let action = if total_steps < config.start_steps {
                random.select_action(&state)?
            } else {
                explore(
                    &agent.select_action(&state)?,
                    config.exploration_noise,
                    env.max_action(),
                )?
            };
            let result = env.step(&action);
            episode_reward += result.reward;
            replay.push(Transition::new(
                state,
                action,
                result.reward,
                result.done,
                result.next_state.clone(),
            ));
            state = result.next_state;
            steps += 1;
            total_steps += 1;

            if result.done || steps >= config.max_episode_steps {
                break;
            }
        }

        if replay.len() >= params.batch_size {
            let report = agent.train(&mut replay, steps, &params)?;
            critic_losses.extend(report.critic_losses);
        }
        info!(episode, episode_reward, steps, total_steps, "episode finished");
    }

    let name = artifact_name(config.variant.policy_name(), env.name());
    agent.save(&config.policy_directory, &name)?;

    if args.plot {
        let dir = PathBuf::from(&config.policy_directory);
        let losses = dir.join(format!("{name}_critic_loss.png"));
        plot_losses(&critic_losses, &losses.to_string_lossy(), "Critic loss")?;
        if env.state_dim() == 2 {
            let size = 40;
            let surface = q_values(&agent, &env.observation_high(), size)?;
            let surface_path = dir.join(format!("{name}_q_surface.png"));
            plot_surface(&surface, size, &surface_path.to_string_lossy(), "Q(s, π(s))")?;
        }
    }
    Ok(())
}

fn run(args: RunArgs) -> anyhow::Result<ReplayBuffer> {
    if let Some(seed) = args.seed {
        tch::manual_seed(seed as i64);
    }
    let mut env = make_env(&args.environment, args.seed)?;
    let policy: Box<dyn Policy> = if args.policy_name.eq_ignore_ascii_case("random") {
        Box::new(random_policy(env.as_ref(), args.seed))
    } else {
        let variant = args.policy_name.parse::<Variant>()?;
        let mut agent = ActorCriticAgent::for_environment(variant, env.as_ref(), &Default::default())?;
        agent
            .load(&args.policy_directory, &artifact_name(variant.policy_name(), env.name()))
            .with_context(|| format!("loading {} policy", variant))?;
        Box::new(agent)
    };

    let mut replay = match args.seed {
        Some(seed) => ReplayBuffer::with_seed(args.buffer_size, seed),
        None => ReplayBuffer::new(args.buffer_size),
    };
    let mut total_reward = 0.0f64;
    for episode in 0..args.max_episodes {
        let mut state = env.reset();
        let mut episode_reward = 0.0f64;
        let mut steps = 0usize;
        loop {
            let action = policy.select_action(&state)?;
            let result = env.step(&action);
            debug!(next_state = ?result.next_state, reward = result.reward, done = result.done, "step");
            replay.push(Transition::new(
                state,
                action,
                result.reward,
                result.done,
                result.next_state.clone(),
            ));
            episode_reward += result.reward as f64;
            steps += 1;
            state = result.next_state;
            if result.done {
                break;
            }
        }
        total_reward += episode_reward;
        info!(episode, steps, episode_reward, "episode finished");
    }

    println!("---------------------------------------");
    println!(
        "Evaluation over {} episodes: {}",
        args.max_episodes, total_reward
    );
    println!("---------------------------------------");
    Ok(replay)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match cli.command {
        Command::Train(args) => train(args),
        Command::Run(args) => {
            let replay = run(args)?;
            info!(transitions = replay.len(), "collected transitions");
            Ok(())
        }
    }
}
