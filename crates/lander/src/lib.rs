#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Lander Simulation
//!
//! A 2-D powered-descent simulation for continuous-control experiments.
//!
//! The craft starts above a flat pad with a randomized horizontal offset and
//! velocity kick and must touch down softly. Two continuous inputs in
//! `[-1, 1]` drive it: main engine throttle along the body axis and a lateral
//! thruster that both translates and rotates the craft. The simulation steps
//! with a fixed timestep using semi-implicit Euler integration and reports an
//! eight-feature observation per step.
//!
//! ## Key Components
//!
//! -   **State:** position, velocity, attitude angle, angular velocity, and
//!     two leg-contact flags, exposed through [`LanderSim::observation`].
//! -   **Stepping:** [`LanderSim::step`] applies thrust and gravity, advances
//!     the state, and returns the shaped reward together with a terminal
//!     flag when the craft lands, crashes, or drifts out of bounds.
//! -   **Determinism:** every [`LanderSim`] owns its RNG; the same seed
//!     reproduces the same episode for the same action sequence.

pub mod simulation;
pub mod types;

pub use simulation::{LanderError, LanderSim, StepResult, ACTION_DIM, OBS_DIM};
pub use types::Vec2;
