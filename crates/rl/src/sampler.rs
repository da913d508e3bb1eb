//! Rollout collection and credit assignment.
//!
//! Drives the environment with either uniform random actions (the bootstrap
//! pass) or the current controller, accumulates episodes into a flat
//! [`TrajectoryBatch`], and computes discounted reward-to-go per episode.

use crate::env::{ActionSpace, Env, EnvError};
use crate::normalize::ObsNormalizer;
use ml::{Sequential, Tensor};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SampleError {
    #[error("non-finite action sampled (episode {episode}, step {step})")]
    NonFiniteAction { episode: usize, step: usize },
    #[error(transparent)]
    Env(#[from] EnvError),
}

/// Knobs for one sampling pass.
#[derive(Clone, Copy, Debug)]
pub struct SampleConfig {
    /// Per-episode step cap; an episode also ends on the env's done flag.
    pub max_steps: usize,
    /// Discount factor for reward-to-go.
    pub discount: f32,
    /// Coefficient of the `x²` horizontal-drift reward penalty.
    pub drift_penalty: f32,
    /// Subtracted from the final step's reward and return of every episode,
    /// whether it ended by termination or by hitting the step cap.
    pub terminal_penalty: f32,
    /// Std of the Gaussian noise added to observations before policy
    /// inference.
    pub input_noise_std: f32,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            max_steps: 1000,
            discount: 0.80,
            drift_penalty: 100.0,
            terminal_penalty: 500.0,
            input_noise_std: 1e-2,
        }
    }
}

/// Where actions come from during sampling.
pub enum ActionSource<'a> {
    /// Uniform random actions from the declared action space.
    Random,
    /// The current controller, fed noise-perturbed, normalized observations.
    Policy {
        net: &'a mut Sequential,
        normalizer: Option<&'a ObsNormalizer>,
    },
}

/// Episodes concatenated into flat arrays, the unit consumed by training.
#[derive(Clone, Debug, Default)]
pub struct TrajectoryBatch {
    pub observations: Vec<f32>,
    pub next_observations: Vec<f32>,
    pub actions: Vec<f32>,
    pub rewards: Vec<f32>,
    /// Running per-step cumulative return within each episode.
    pub returns: Vec<f32>,
    pub reward_to_go: Vec<f32>,
    pub obs_dim: usize,
    pub action_dim: usize,
}

impl TrajectoryBatch {
    fn new(obs_dim: usize, action_dim: usize) -> Self {
        Self {
            obs_dim,
            action_dim,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn num_samples(&self) -> usize {
        self.rewards.len()
    }
}

/// Discounted reward-to-go by backward accumulation:
/// `rtg[last] = r[last]`, `rtg[i] = r[i] + discount * rtg[i + 1]`.
#[must_use]
pub fn reward_to_go(rewards: &[f32], discount: f32) -> Vec<f32> {
    let mut out = vec![0.0; rewards.len()];
    if let Some(last) = rewards.len().checked_sub(1) {
        out[last] = rewards[last];
        for i in (0..last).rev() {
            out[i] = rewards[i] + discount * out[i + 1];
        }
    }
    out
}

/// Runs `num_traj` episodes and returns the concatenated batch together
/// with the vector of per-episode final returns. The first episode of every
/// pass renders the environment.
///
/// # Errors
///
/// Fails fast on a non-finite sampled action or on an environment error;
/// there is no recovery path.
pub fn sample_trajectories(
    env: &mut dyn Env,
    num_traj: usize,
    cfg: &SampleConfig,
    mut source: ActionSource<'_>,
    rng: &mut StdRng,
) -> Result<(TrajectoryBatch, Vec<f32>), SampleError> {
    let space = env.action_space();
    let obs_dim = env.obs_size();
    let mut batch = TrajectoryBatch::new(obs_dim, space.action_len());
    let mut return_vec = Vec::with_capacity(num_traj);

    for episode in 0..num_traj {
        let mut ob = env.reset();
        let mut obs = Vec::new();
        let mut next_obs = Vec::new();
        let mut actions = Vec::new();
        let mut rewards = Vec::new();
        let mut returns = Vec::new();
        let mut ret = 0.0f32;
        let mut steps = 0usize;

        loop {
            if episode == 0 {
                env.render();
            }
            obs.extend_from_slice(&ob);

            let mut action = select_action(&mut source, &space, &ob, cfg, rng);
            if action.iter().any(|v| !v.is_finite()) {
                return Err(SampleError::NonFiniteAction {
                    episode,
                    step: steps,
                });
            }
            space.clip(&mut action);
            actions.extend_from_slice(&action);

            let outcome = env.step(&action)?;
            // penalize horizontal drift from the pad
            let reward = outcome.reward - cfg.drift_penalty * outcome.observation[0].powi(2);
            next_obs.extend_from_slice(&outcome.observation);
            rewards.push(reward);
            ret += reward;
            returns.push(ret);
            steps += 1;
            ob = outcome.observation;

            if outcome.done || steps > cfg.max_steps {
                if let (Some(r), Some(c)) = (rewards.last_mut(), returns.last_mut()) {
                    *r -= cfg.terminal_penalty;
                    *c -= cfg.terminal_penalty;
                }
                ret -= cfg.terminal_penalty;
                tracing::info!(episode, steps, "episode finished");
                break;
            }
        }

        let rtg = reward_to_go(&rewards, cfg.discount);
        tracing::info!(episode, run_return = ret, "episode return");

        batch.observations.extend(obs);
        batch.next_observations.extend(next_obs);
        batch.actions.extend(actions);
        batch.rewards.extend(rewards);
        batch.returns.extend(returns);
        batch.reward_to_go.extend(rtg);
        return_vec.push(ret);
    }

    Ok((batch, return_vec))
}

fn select_action(
    source: &mut ActionSource<'_>,
    space: &ActionSpace,
    ob: &[f32],
    cfg: &SampleConfig,
    rng: &mut StdRng,
) -> Vec<f32> {
    match source {
        ActionSource::Random => space.sample(rng),
        ActionSource::Policy { net, normalizer } => {
            let mut inputs = ob.to_vec();
            for v in &mut inputs {
                *v += cfg.input_noise_std * rng.sample::<f32, _>(StandardNormal);
            }
            if let Some(nz) = normalizer {
                inputs = nz.transform_one(&inputs);
            }
            let len = inputs.len();
            let out = net.predict(&Tensor::from_vec(vec![1, len], inputs));
            match space {
                ActionSpace::Discrete(_) => {
                    let best = out
                        .data
                        .iter()
                        .enumerate()
                        .max_by(|a, b| a.1.total_cmp(b.1))
                        .map_or(0, |(i, _)| i);
                    vec![best as f32]
                }
                ActionSpace::Continuous { .. } => out.data,
            }
        }
    }
}
