//! Policy-gradient training for the simulated lander.
//!
//! The crate wires the pieces of the training loop together: the [`Env`]
//! seam over the simulation, the rollout [`sampler`] with its reward-to-go
//! credit assignment, the fit-once observation [`normalize`] transform, the
//! controller/baseline network builders in [`nets`], and the epoch driver in
//! [`trainer`].

pub mod env;
pub mod lander_env;
pub mod nets;
pub mod normalize;
pub mod sampler;
pub mod trainer;

pub use env::{ActionSpace, Env, EnvError, StepOutcome};
pub use lander_env::LanderEnv;
pub use normalize::ObsNormalizer;
pub use sampler::{reward_to_go, sample_trajectories, ActionSource, SampleConfig, SampleError, TrajectoryBatch};
pub use trainer::{EpochStats, TrainConfig, TrainError, TrainSession};
