mod common;

use common::{changed, config, mean, snapshot, synthetic_replay};
use td3rl::environment::Environment;
use td3rl::environments::MountainCarContinuous;
use td3rl::{
    ActorCriticAgent, Agent, AgentConfig, Policy, ReplayBuffer, ReplaySource, RlError, TrainParams,
    Transition, Variant,
};

fn params(variant: Variant) -> TrainParams {
    TrainParams {
        batch_size: 32,
        discount: 0.9,
        ..TrainParams::for_variant(variant)
    }
}

#[test]
fn critic_loss_falls_on_synthetic_data() {
    for variant in [Variant::Baseline, Variant::TwinDelayed] {
        tch::manual_seed(42);
        let mut replay = synthetic_replay(7, 200);
        let mut agent = ActorCriticAgent::new(variant, 2, 1, 1.0, &config([40, 30], 1e-3)).unwrap();

        let report = agent.train(&mut replay, 100, &params(variant)).unwrap();

        assert_eq!(report.iterations(), 100);
        assert!(report.critic_losses.iter().all(|l| l.is_finite()), "{variant}");
        let first = mean(&report.critic_losses[..20]);
        let last = mean(&report.critic_losses[80..]);
        assert!(last <= first, "{variant}: first 20 mean {first}, last 20 mean {last}");
    }
}

#[test]
fn twin_delayed_actor_moves_every_kth_iteration() {
    tch::manual_seed(1);
    let mut replay = synthetic_replay(3, 200);
    let mut agent = ActorCriticAgent::new(Variant::TwinDelayed, 2, 1, 1.0, &AgentConfig::default()).unwrap();
    let params = params(Variant::TwinDelayed);

    for call in 1..=6u64 {
        let actor_before = snapshot(agent.actor().var_store());
        let critic_before = snapshot(agent.critic().var_store());
        let target_before = snapshot(agent.targets().actor().var_store());

        let report = agent.train(&mut replay, 1, &params).unwrap();

        let expect_actor = call % 2 == 0;
        assert_eq!(changed(&actor_before, agent.actor().var_store()), expect_actor, "call {call}");
        assert_eq!(
            changed(&target_before, agent.targets().actor().var_store()),
            expect_actor,
            "call {call}"
        );
        assert!(changed(&critic_before, agent.critic().var_store()), "call {call}");
        assert_eq!(report.actor_updates(), usize::from(expect_actor));
    }
    assert_eq!(agent.iterations(), 6);
}

#[test]
fn actor_update_count_is_floor_of_iterations_over_k() {
    tch::manual_seed(2);
    let mut replay = synthetic_replay(5, 200);
    let mut agent = ActorCriticAgent::new(Variant::TwinDelayed, 2, 1, 1.0, &AgentConfig::default()).unwrap();
    let params = TrainParams {
        policy_freq: 3,
        ..params(Variant::TwinDelayed)
    };

    let report = agent.train(&mut replay, 7, &params).unwrap();
    assert_eq!(report.actor_updates(), 2);
    assert_eq!(report.critic_losses.len(), 7);

    // the counter carries over: iterations 8 and 9 complete the next period
    let report = agent.train(&mut replay, 2, &params).unwrap();
    assert_eq!(report.actor_updates(), 1);
}

#[test]
fn baseline_updates_actor_every_iteration() {
    tch::manual_seed(3);
    let mut replay = synthetic_replay(9, 200);
    let mut agent = ActorCriticAgent::new(Variant::Baseline, 2, 1, 1.0, &AgentConfig::default()).unwrap();
    let params = TrainParams {
        policy_freq: 4,
        ..params(Variant::Baseline)
    };

    for _ in 0..3 {
        let actor_before = snapshot(agent.actor().var_store());
        agent.train(&mut replay, 1, &params).unwrap();
        assert!(changed(&actor_before, agent.actor().var_store()));
    }
}

#[test]
fn actions_stay_within_bounds() {
    tch::manual_seed(4);
    let max_action = 2.0;
    for variant in [Variant::Baseline, Variant::TwinDelayed] {
        let mut agent = ActorCriticAgent::new(variant, 2, 1, max_action, &config([40, 30], 1e-2)).unwrap();
        let probes: Vec<[f32; 2]> = vec![[0.0, 0.0], [1e3, -1e3], [-5.0, 7.5], [0.3, 0.1], [-1e6, 1e6]];

        let check = |agent: &ActorCriticAgent| {
            for state in &probes {
                let action = agent.select_action(state).unwrap();
                assert_eq!(action.len(), 1);
                assert!(action.iter().all(|a| a.abs() as f64 <= max_action), "{variant}: {action:?}");
            }
        };

        check(&agent);
        let mut replay = synthetic_replay(11, 200);
        agent.train(&mut replay, 50, &params(variant)).unwrap();
        check(&agent);
    }
}

#[test]
fn select_action_rejects_wrong_state_width() {
    let agent = ActorCriticAgent::new(Variant::TwinDelayed, 2, 1, 1.0, &AgentConfig::default()).unwrap();
    let err = agent.select_action(&[0.0, 1.0, 2.0]).unwrap_err();
    assert!(matches!(
        err,
        RlError::DimensionMismatch {
            expected: 2,
            actual: 3,
            ..
        }
    ));
}

#[test]
fn train_rejects_mismatched_transitions() {
    let mut agent = ActorCriticAgent::new(Variant::Baseline, 2, 1, 1.0, &AgentConfig::default()).unwrap();
    let mut replay = ReplayBuffer::with_seed(10, 0);
    for _ in 0..10 {
        replay.push(Transition::new(vec![0.0; 3], vec![0.0], 1.0, false, vec![0.0; 3]));
    }
    let err = agent.train(&mut replay, 1, &TrainParams { batch_size: 4, ..TrainParams::baseline() });
    assert!(matches!(err, Err(RlError::DimensionMismatch { .. })));
    assert_eq!(agent.iterations(), 0);
}

#[test]
fn train_fails_on_undersized_replay() {
    let mut agent = ActorCriticAgent::new(Variant::TwinDelayed, 2, 1, 1.0, &AgentConfig::default()).unwrap();
    let mut replay = synthetic_replay(0, 10);
    let err = agent.train(&mut replay, 5, &params(Variant::TwinDelayed)).unwrap_err();
    assert!(matches!(
        err,
        RlError::InsufficientSamples {
            requested: 32,
            available: 10
        }
    ));
    assert_eq!(agent.iterations(), 0);
}

#[test]
fn train_rejects_invalid_params() {
    let mut agent = ActorCriticAgent::new(Variant::TwinDelayed, 2, 1, 1.0, &AgentConfig::default()).unwrap();
    let mut replay = synthetic_replay(0, 50);
    let bad = TrainParams {
        policy_freq: 0,
        ..params(Variant::TwinDelayed)
    };
    assert!(matches!(
        agent.train(&mut replay, 1, &bad),
        Err(RlError::InvalidConfig(_))
    ));
}

#[test]
fn mountain_car_episode_feeds_training() {
    tch::manual_seed(5);
    let mut env = MountainCarContinuous::with_step_limit(64);
    let mut agent = ActorCriticAgent::for_environment(Variant::TwinDelayed, &env, &AgentConfig::default()).unwrap();
    let mut replay = ReplayBuffer::with_seed(1_000, 5);

    let mut state = env.reset();
    loop {
        let action = agent.select_action(&state).unwrap();
        let result = env.step(&action);
        replay.push(Transition::new(state, action, result.reward, result.done, result.next_state.clone()));
        state = result.next_state;
        if result.done {
            break;
        }
    }
    assert_eq!(replay.len(), 64);

    let report = agent
        .train(&mut replay, 64, &TrainParams { batch_size: 16, ..TrainParams::twin_delayed() })
        .unwrap();
    assert_eq!(report.actor_updates(), 32);
}

#[test]
fn construction_rejects_degenerate_spaces() {
    let config = AgentConfig::default();
    for (state_dim, action_dim, max_action) in [
        (0, 1, 1.0),
        (2, 0, 1.0),
        (2, 1, 0.0),
        (2, 1, -1.0),
        (2, 1, f64::NAN),
        (2, 1, f64::INFINITY),
    ] {
        for variant in [Variant::Baseline, Variant::TwinDelayed] {
            let agent = ActorCriticAgent::new(variant, state_dim, action_dim, max_action, &config);
            assert!(
                matches!(agent, Err(RlError::InvalidConfig(_))),
                "{variant}: accepted S={state_dim} A={action_dim} max_action={max_action}"
            );
        }
    }
}
