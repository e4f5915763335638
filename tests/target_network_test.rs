mod common;

use common::{probe_states, snapshot};
use tch::Device;
use td3rl::networks::{PolicyNetwork, ValueNetwork};
use td3rl::target::TargetPair;
use td3rl::{ActorCriticAgent, AgentConfig, Variant};

#[test]
fn fresh_agent_targets_match_live_networks() {
    tch::manual_seed(21);
    for variant in [Variant::Baseline, Variant::TwinDelayed] {
        let agent = ActorCriticAgent::new(variant, 3, 2, 1.5, &AgentConfig::default()).unwrap();
        let states = probe_states(16, 3, 2.0);
        let actions = probe_states(16, 2, 1.0);

        let live = agent.actor().forward(&states);
        let target = agent.targets().actor().forward(&states);
        assert!(live.equal(&target), "{variant}: actor outputs differ");

        let live_q = agent.critic().forward(&states, &actions);
        let target_q = agent.targets().critic().forward(&states, &actions);
        assert_eq!(live_q.heads().len(), variant.critic_heads());
        for (l, t) in live_q.heads().into_iter().zip(target_q.heads()) {
            assert!(l.equal(t), "{variant}: critic outputs differ");
        }
    }
}

#[test]
fn targets_do_not_share_storage_with_live_networks() {
    let actor = PolicyNetwork::new(Device::Cpu, 2, 1, 1.0, [8, 8]);
    let critic = ValueNetwork::new(Device::Cpu, Variant::TwinDelayed, 2, 1, [8, 8]);
    let targets = TargetPair::new(&actor, &critic).unwrap();

    let live_vars = actor.var_store().variables();
    let mut weight = live_vars["l1.weight"].shallow_clone();
    tch::no_grad(|| {
        let _ = weight.fill_(3.0);
    });

    let target_weight = &targets.actor().var_store().variables()["l1.weight"];
    assert!(!target_weight.equal(&weight));
    assert!(!target_weight.requires_grad());
}

fn live_and_target(seed: i64, variant: Variant) -> (PolicyNetwork, ValueNetwork, TargetPair) {
    tch::manual_seed(seed);
    let origin_actor = PolicyNetwork::new(Device::Cpu, 3, 2, 1.0, [12, 10]);
    let origin_critic = ValueNetwork::new(Device::Cpu, variant, 3, 2, [12, 10]);
    let targets = TargetPair::new(&origin_actor, &origin_critic).unwrap();
    // independently initialised networks of the same shape
    let live_actor = PolicyNetwork::new(Device::Cpu, 3, 2, 1.0, [12, 10]);
    let live_critic = ValueNetwork::new(Device::Cpu, variant, 3, 2, [12, 10]);
    (live_actor, live_critic, targets)
}

#[test]
fn soft_update_blends_every_parameter() {
    for variant in [Variant::Baseline, Variant::TwinDelayed] {
        let (actor, critic, mut targets) = live_and_target(31, variant);
        let tau = 0.3;
        let actor_before = snapshot(targets.actor().var_store());
        let critic_before = snapshot(targets.critic().var_store());

        targets.soft_update(&actor, &critic, tau).unwrap();

        for (before, live, after) in [
            (&actor_before, actor.var_store(), targets.actor().var_store()),
            (&critic_before, critic.var_store(), targets.critic().var_store()),
        ] {
            let live = live.variables();
            let after = after.variables();
            assert_eq!(after.len(), before.len());
            for (name, prev) in before {
                let expected = &live[name] * tau + prev * (1.0 - tau);
                assert!(
                    after[name].allclose(&expected, 1e-6, 1e-7, false),
                    "{variant}: {name} is not the blend"
                );
            }
        }
    }
}

#[test]
fn soft_update_with_tau_one_copies_and_zero_keeps() {
    let (actor, critic, mut targets) = live_and_target(41, Variant::TwinDelayed);
    let states = probe_states(8, 3, 1.0);
    let actions = probe_states(8, 2, 1.0);

    let before = targets.actor().forward(&states);
    targets.soft_update(&actor, &critic, 0.0).unwrap();
    assert!(targets.actor().forward(&states).equal(&before));

    targets.soft_update(&actor, &critic, 1.0).unwrap();
    assert!(targets.actor().forward(&states).equal(&actor.forward(&states)));
    assert!(
        targets
            .critic()
            .q1(&states, &actions)
            .equal(&critic.q1(&states, &actions))
    );
}

#[test]
fn soft_update_rejects_rate_outside_unit_interval() {
    let (actor, critic, mut targets) = live_and_target(51, Variant::Baseline);
    assert!(targets.soft_update(&actor, &critic, 1.5).is_err());
    assert!(targets.soft_update(&actor, &critic, -0.1).is_err());
}

#[test]
fn initialize_restores_exact_copy() {
    let (actor, critic, mut targets) = live_and_target(61, Variant::Baseline);
    let states = probe_states(8, 3, 1.0);
    targets.soft_update(&actor, &critic, 0.5).unwrap();
    assert!(!targets.actor().forward(&states).equal(&actor.forward(&states)));

    targets.initialize(&actor, &critic).unwrap();
    assert!(targets.actor().forward(&states).equal(&actor.forward(&states)));
}
