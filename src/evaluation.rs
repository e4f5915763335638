//! Grid-sweep diagnostics over a trained agent's live networks.
//!
//! Each state dimension `d` is discretised into `size` evenly spaced points
//! in `[-high[d], high[d]]`; the grid is their cartesian product with the
//! first dimension varying fastest. Nothing here touches the training path.

use tch::{Kind, Tensor};

use crate::algorithms::ActorCriticAgent;
use crate::error::{Result, RlError, ensure_dim};

/// Evenly spaced points from `low` to `high` inclusive.
pub fn linspace(low: f32, high: f32, size: usize) -> Vec<f32> {
    match size {
        0 => Vec::new(),
        1 => vec![low],
        _ => {
            let step = (high - low) / (size - 1) as f32;
            (0..size).map(|i| low + step * i as f32).collect()
        }
    }
}

/// All grid states, `size.pow(high.len())` of them.
pub fn state_grid(high: &[f32], size: usize) -> Vec<Vec<f32>> {
    let axes: Vec<Vec<f32>> = high.iter().map(|&h| linspace(-h, h, size)).collect();
    let total = if high.is_empty() { 0 } else { size.pow(high.len() as u32) };

    (0..total)
        .map(|mut index| {
            axes.iter()
                .map(|axis| {
                    let value = axis[index % size];
                    index /= size;
                    value
                })
                .collect()
        })
        .collect()
}

fn grid_tensor(agent: &ActorCriticAgent, high: &[f32], size: usize) -> Result<(Vec<Vec<f32>>, Tensor)> {
    ensure_dim("grid bounds", agent.state_dim(), high.len())?;
    if size == 0 {
        return Err(RlError::InvalidConfig("grid size must be at least 1".into()));
    }
    let grid = state_grid(high, size);
    let flat: Vec<f32> = grid.iter().flatten().copied().collect();
    let states = Tensor::from_slice(&flat)
        .view([grid.len() as i64, high.len() as i64])
        .to_device(agent.device());
    Ok((grid, states))
}

fn to_rows(t: &Tensor) -> Result<Vec<Vec<f32>>> {
    let t = t.to_device(tch::Device::Cpu).to_kind(Kind::Float);
    let width = t.size()[1] as usize;
    let flat = Vec::<f32>::try_from(&t.flatten(0, -1))?;
    Ok(flat.chunks(width.max(1)).map(<[f32]>::to_vec).collect())
}

/// Rows of `[Q, s_0, .., s_{S-1}]` with `Q` evaluated at `(s, π(s))`.
///
/// Twin critics report the minimum of their two heads.
pub fn q_values(agent: &ActorCriticAgent, high: &[f32], size: usize) -> Result<Vec<Vec<f32>>> {
    let (grid, states) = grid_tensor(agent, high, size)?;
    let q = tch::no_grad(|| {
        let actions = agent.actor().forward(&states);
        agent.critic().forward(&states, &actions).min()
    });
    let q = to_rows(&q)?;

    Ok(grid
        .into_iter()
        .zip(q)
        .map(|(state, q)| {
            let mut row = Vec::with_capacity(1 + state.len());
            row.push(q[0]);
            row.extend(state);
            row
        })
        .collect())
}

/// Rows of `[s_0, .., s_{S-1}, a_0, .., a_{A-1}]`.
pub fn policy_values(agent: &ActorCriticAgent, high: &[f32], size: usize) -> Result<Vec<Vec<f32>>> {
    let (grid, states) = grid_tensor(agent, high, size)?;
    let actions = tch::no_grad(|| agent.actor().forward(&states));
    let actions = to_rows(&actions)?;

    Ok(grid
        .into_iter()
        .zip(actions)
        .map(|(mut state, action)| {
            state.extend(action);
            state
        })
        .collect())
}
