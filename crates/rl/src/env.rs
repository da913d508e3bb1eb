use rand::Rng;
use thiserror::Error;

/// The action space an environment declares.
#[derive(Clone, Debug)]
pub enum ActionSpace {
    /// `n` mutually exclusive actions.
    Discrete(usize),
    /// A box of continuous actions with element-wise bounds.
    Continuous { low: Vec<f32>, high: Vec<f32> },
}

impl ActionSpace {
    /// Dimension of the action vectors fed to [`Env::step`].
    #[must_use]
    pub fn action_len(&self) -> usize {
        match self {
            Self::Discrete(_) => 1,
            Self::Continuous { low, .. } => low.len(),
        }
    }

    /// Output dimension a policy network needs for this space.
    #[must_use]
    pub fn policy_dim(&self) -> usize {
        match self {
            Self::Discrete(n) => *n,
            Self::Continuous { low, .. } => low.len(),
        }
    }

    /// Draws a uniform random action.
    pub fn sample(&self, rng: &mut impl Rng) -> Vec<f32> {
        match self {
            Self::Discrete(n) => vec![rng.gen_range(0..*n) as f32],
            Self::Continuous { low, high } => low
                .iter()
                .zip(high)
                .map(|(&lo, &hi)| rng.gen_range(lo..=hi))
                .collect(),
        }
    }

    /// Clips an action to the declared bounds. Discrete spaces pass through.
    pub fn clip(&self, action: &mut [f32]) {
        if let Self::Continuous { low, high } = self {
            for ((a, &lo), &hi) in action.iter_mut().zip(low).zip(high) {
                *a = a.clamp(lo, hi);
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("environment rejected action: {0}")]
    InvalidAction(String),
}

/// One step of environment interaction.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    pub observation: Vec<f32>,
    pub reward: f32,
    pub done: bool,
}

/// Reinforcement learning environment seam.
///
/// The contract follows the classic reset/step shape: [`Env::reset`] starts a
/// new episode and returns the initial observation, [`Env::step`] advances by
/// one action and reports the next observation, the scalar reward, and
/// whether the episode terminated. [`Env::render`] is a blocking
/// visualization side effect and may do nothing.
pub trait Env {
    fn reset(&mut self) -> Vec<f32>;

    /// Advance the environment by one action.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::InvalidAction`] when the action is malformed for
    /// this environment.
    fn step(&mut self, action: &[f32]) -> Result<StepOutcome, EnvError>;

    fn render(&mut self) {}

    /// Size of the observation vector.
    fn obs_size(&self) -> usize;

    /// The declared action space.
    fn action_space(&self) -> ActionSpace;
}
