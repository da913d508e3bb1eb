//! The epoch driver: bootstrap pass, then alternating baseline and policy
//! fits on freshly collected on-policy data.

use crate::env::Env;
use crate::nets;
use crate::normalize::ObsNormalizer;
use crate::sampler::{sample_trajectories, ActionSource, SampleConfig, SampleError};
use ml::{mse, mse_grad, weighted_mse, weighted_mse_grad, Adam, Sequential, Tensor};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainError {
    #[error(transparent)]
    Sample(#[from] SampleError),
    #[error("non-finite values in {field} before training")]
    NonFiniteData { field: &'static str },
}

/// Hyperparameters of a training run. `Default` carries the experiment's
/// literal constants; there is no external configuration surface.
#[derive(Clone, Copy, Debug)]
pub struct TrainConfig {
    pub epochs: usize,
    /// Random-action episodes collected by the bootstrap epoch.
    pub bootstrap_episodes: usize,
    /// On-policy episodes collected by every later epoch.
    pub episodes_per_epoch: usize,
    pub max_steps: usize,
    pub discount: f32,
    pub batch_size: usize,
    /// The trailing `1/holdout_denom` slice of each epoch's data is held out
    /// for validation.
    pub holdout_denom: usize,
    /// Passes over the epoch's data when fitting the baseline.
    pub baseline_passes: usize,
    /// Passes over the epoch's data when fitting the policy.
    pub policy_passes: usize,
    pub baseline_lr: f32,
    pub policy_lr: f32,
    pub input_noise_std: f32,
    pub drift_penalty: f32,
    pub terminal_penalty: f32,
    /// Added to the advantage standard deviation before dividing.
    pub advantage_eps: f32,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            bootstrap_episodes: 100,
            episodes_per_epoch: 20,
            max_steps: 1000,
            discount: 0.80,
            batch_size: 512,
            holdout_denom: 8,
            baseline_passes: 10,
            policy_passes: 1,
            baseline_lr: 1e-3,
            policy_lr: 1e-4,
            input_noise_std: 1e-2,
            drift_penalty: 100.0,
            terminal_penalty: 500.0,
            advantage_eps: 1e-8,
            seed: 0,
        }
    }
}

/// Per-epoch summary. Loss fields are `None` for the bootstrap epoch, which
/// trains nothing.
#[derive(Clone, Copy, Debug)]
pub struct EpochStats {
    pub epoch: usize,
    pub episodes: usize,
    pub max_return: f32,
    pub mean_return: f32,
    pub std_return: f32,
    pub baseline_train_loss: Option<f32>,
    pub baseline_val_loss: Option<f32>,
    pub policy_train_loss: Option<f32>,
    pub policy_val_loss: Option<f32>,
}

/// A training run's state: the environment, both networks with their
/// optimizers, the frozen normalizer once fitted, and accumulated
/// statistics. Lifecycle matches the run; nothing is persisted at the end.
pub struct TrainSession<E: Env> {
    env: E,
    policy: Sequential,
    baseline: Sequential,
    policy_opt: Adam,
    baseline_opt: Adam,
    normalizer: Option<ObsNormalizer>,
    cfg: TrainConfig,
    rng: StdRng,
    stats: Vec<EpochStats>,
}

impl<E: Env> TrainSession<E> {
    pub fn new(env: E, cfg: TrainConfig) -> Self {
        fastrand::seed(cfg.seed);
        let obs_dim = env.obs_size();
        let action_dim = env.action_space().policy_dim();
        Self {
            policy: nets::build_policy(obs_dim, action_dim),
            baseline: nets::build_baseline(obs_dim),
            policy_opt: Adam::new(cfg.policy_lr),
            baseline_opt: Adam::new(cfg.baseline_lr),
            normalizer: None,
            rng: StdRng::seed_from_u64(cfg.seed),
            stats: Vec::new(),
            env,
            cfg,
        }
    }

    pub fn stats(&self) -> &[EpochStats] {
        &self.stats
    }

    pub fn normalizer(&self) -> Option<&ObsNormalizer> {
        self.normalizer.as_ref()
    }

    /// Returns an action for the given observation using the current policy.
    pub fn act(&mut self, observation: &[f32]) -> Vec<f32> {
        let inputs = match &self.normalizer {
            Some(nz) => nz.transform_one(observation),
            None => observation.to_vec(),
        };
        let len = inputs.len();
        self.policy.predict(&Tensor::from_vec(vec![1, len], inputs)).data
    }

    /// Runs all configured epochs.
    ///
    /// # Errors
    ///
    /// Aborts on the first sampling or data fault; the session is not meant
    /// to be resumed after an error.
    pub fn run(&mut self) -> Result<&[EpochStats], TrainError> {
        for _ in 0..self.cfg.epochs {
            self.run_epoch()?;
        }
        Ok(&self.stats)
    }

    /// Runs a single epoch: the first call is the bootstrap epoch (random
    /// actions, normalizer fit, no training), every later call collects
    /// on-policy data and fits baseline then policy.
    pub fn run_epoch(&mut self) -> Result<EpochStats, TrainError> {
        let epoch = self.stats.len();
        let bootstrap = self.normalizer.is_none();
        let episodes = if bootstrap {
            self.cfg.bootstrap_episodes
        } else {
            self.cfg.episodes_per_epoch
        };
        let sample_cfg = SampleConfig {
            max_steps: self.cfg.max_steps,
            discount: self.cfg.discount,
            drift_penalty: self.cfg.drift_penalty,
            terminal_penalty: self.cfg.terminal_penalty,
            input_noise_std: self.cfg.input_noise_std,
        };
        let source = if bootstrap {
            ActionSource::Random
        } else {
            ActionSource::Policy {
                net: &mut self.policy,
                normalizer: self.normalizer.as_ref(),
            }
        };
        let (batch, return_vec) =
            sample_trajectories(&mut self.env, episodes, &sample_cfg, source, &mut self.rng)?;

        let max_return = return_vec.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mean_return = mean(&return_vec);
        let std_return = std_dev(&return_vec);
        tracing::info!(epoch, max_return, mean_return, std_return, "epoch returns");

        if bootstrap {
            self.normalizer = Some(ObsNormalizer::fit(&batch.observations, batch.obs_dim));
            let stats = EpochStats {
                epoch,
                episodes,
                max_return,
                mean_return,
                std_return,
                baseline_train_loss: None,
                baseline_val_loss: None,
                policy_train_loss: None,
                policy_val_loss: None,
            };
            self.stats.push(stats);
            return Ok(stats);
        }

        check_finite("reward to go", &batch.reward_to_go)?;
        check_finite("observations", &batch.observations)?;
        check_finite("actions", &batch.actions)?;

        let normalizer = self.normalizer.as_ref().expect("normalizer fitted by bootstrap epoch");
        let obs = normalizer.transform_batch(&batch.observations);
        let n = batch.num_samples();

        tracing::info!("training baseline network");
        let (baseline_train_loss, baseline_val_loss) = fit(
            &mut self.baseline,
            &mut self.baseline_opt,
            &obs,
            batch.obs_dim,
            &batch.reward_to_go,
            1,
            None,
            self.cfg.baseline_passes,
            self.cfg.batch_size,
            self.cfg.holdout_denom,
            &mut self.rng,
        );

        // advantage: subtract the current value estimate, scale to unit
        // variance, then center
        let values = self
            .baseline
            .predict(&Tensor::from_vec(vec![n, batch.obs_dim], obs.clone()));
        let mut weights = batch.reward_to_go.clone();
        for (w, &v) in weights.iter_mut().zip(&values.data) {
            *w -= v;
        }
        let scale = std_dev(&weights) + self.cfg.advantage_eps;
        for w in &mut weights {
            *w /= scale;
        }
        let center = mean(&weights);
        for w in &mut weights {
            *w -= center;
        }

        tracing::info!("training policy network");
        let (policy_train_loss, policy_val_loss) = fit(
            &mut self.policy,
            &mut self.policy_opt,
            &obs,
            batch.obs_dim,
            &batch.actions,
            batch.action_dim,
            Some(&weights),
            self.cfg.policy_passes,
            self.cfg.batch_size,
            self.cfg.holdout_denom,
            &mut self.rng,
        );

        let stats = EpochStats {
            epoch,
            episodes,
            max_return,
            mean_return,
            std_return,
            baseline_train_loss,
            baseline_val_loss,
            policy_train_loss,
            policy_val_loss,
        };
        self.stats.push(stats);
        Ok(stats)
    }
}

/// Fits a network against targets, optionally weighting each sample's loss.
///
/// The trailing `1/holdout_denom` slice of the data is held out and scored
/// in inference mode after every pass; the training slice is reshuffled per
/// pass and consumed in mini-batches. Returns the last pass's train and
/// validation losses.
#[allow(clippy::too_many_arguments)]
fn fit(
    net: &mut Sequential,
    opt: &mut Adam,
    inputs: &[f32],
    in_dim: usize,
    targets: &[f32],
    target_dim: usize,
    weights: Option<&[f32]>,
    passes: usize,
    batch_size: usize,
    holdout_denom: usize,
    rng: &mut StdRng,
) -> (Option<f32>, Option<f32>) {
    let n = targets.len() / target_dim;
    let holdout = n / holdout_denom;
    let train_n = n - holdout;
    let mut order: Vec<usize> = (0..train_n).collect();
    let mut last_train = None;
    let mut last_val = None;

    for pass in 0..passes {
        order.shuffle(rng);
        let mut loss_sum = 0.0;
        let mut seen = 0usize;
        for chunk in order.chunks(batch_size) {
            let x = Tensor::from_vec(vec![chunk.len(), in_dim], gather(inputs, in_dim, chunk));
            let y = Tensor::from_vec(
                vec![chunk.len(), target_dim],
                gather(targets, target_dim, chunk),
            );
            let w: Option<Vec<f32>> =
                weights.map(|ws| chunk.iter().map(|&i| ws[i]).collect());

            let (pred, activations) = net.forward(&x, true);
            let (loss, grad) = match &w {
                Some(w) => (weighted_mse(&pred, &y, w), weighted_mse_grad(&pred, &y, w)),
                None => (mse(&pred, &y), mse_grad(&pred, &y)),
            };
            let grads = net.backward(&activations, &grad);
            let mut pairs: Vec<(&mut Tensor, &Tensor)> =
                net.params_mut().into_iter().zip(grads.iter()).collect();
            opt.step(&mut pairs);

            loss_sum += loss * chunk.len() as f32;
            seen += chunk.len();
        }
        if seen > 0 {
            last_train = Some(loss_sum / seen as f32);
        }

        if holdout > 0 {
            let idx: Vec<usize> = (train_n..n).collect();
            let x = Tensor::from_vec(vec![holdout, in_dim], gather(inputs, in_dim, &idx));
            let y = Tensor::from_vec(vec![holdout, target_dim], gather(targets, target_dim, &idx));
            let pred = net.predict(&x);
            let val = match weights {
                Some(ws) => weighted_mse(&pred, &y, &ws[train_n..]),
                None => mse(&pred, &y),
            };
            last_val = Some(val);
        }
        tracing::debug!(pass, train_loss = ?last_train, val_loss = ?last_val, "fit pass");
    }
    (last_train, last_val)
}

fn gather(data: &[f32], dim: usize, idx: &[usize]) -> Vec<f32> {
    let mut out = Vec::with_capacity(idx.len() * dim);
    for &i in idx {
        out.extend_from_slice(&data[i * dim..(i + 1) * dim]);
    }
    out
}

fn check_finite(field: &'static str, data: &[f32]) -> Result<(), TrainError> {
    if data.iter().any(|v| !v.is_finite()) {
        return Err(TrainError::NonFiniteData { field });
    }
    Ok(())
}

fn mean(xs: &[f32]) -> f32 {
    xs.iter().sum::<f32>() / xs.len() as f32
}

fn std_dev(xs: &[f32]) -> f32 {
    let m = mean(xs);
    (xs.iter().map(|x| (x - m).powi(2)).sum::<f32>() / xs.len() as f32).sqrt()
}
