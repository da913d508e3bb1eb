use crate::env::{ActionSpace, Env, EnvError, StepOutcome};
use lander::{LanderSim, ACTION_DIM, OBS_DIM};

/// [`Env`] adapter over the lander simulation.
pub struct LanderEnv {
    sim: LanderSim,
}

impl LanderEnv {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            sim: LanderSim::new(seed),
        }
    }
}

impl Env for LanderEnv {
    fn reset(&mut self) -> Vec<f32> {
        self.sim.reset().to_vec()
    }

    fn step(&mut self, action: &[f32]) -> Result<StepOutcome, EnvError> {
        let result = self
            .sim
            .step(action)
            .map_err(|e| EnvError::InvalidAction(e.to_string()))?;
        Ok(StepOutcome {
            observation: result.observation.to_vec(),
            reward: result.reward,
            done: result.done,
        })
    }

    fn render(&mut self) {
        tracing::trace!(
            x = self.sim.pos.x,
            y = self.sim.pos.y,
            angle = self.sim.angle,
            "lander"
        );
    }

    fn obs_size(&self) -> usize {
        OBS_DIM
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Continuous {
            low: vec![-1.0; ACTION_DIM],
            high: vec![1.0; ACTION_DIM],
        }
    }
}
