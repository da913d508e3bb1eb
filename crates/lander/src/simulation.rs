//! # Lander Dynamics
//!
//! Fixed-timestep rigid-body integration for the descent craft, plus contact
//! detection, reward shaping, and episode termination.

use crate::types::Vec2;
use thiserror::Error;

/// Number of observation features.
pub const OBS_DIM: usize = 8;
/// Number of continuous control inputs.
pub const ACTION_DIM: usize = 2;

const DT: f32 = 0.02;
const GRAVITY: f32 = 1.0;
const MAIN_ACCEL: f32 = 2.0;
const SIDE_ACCEL: f32 = 0.2;
const SIDE_TORQUE: f32 = 0.8;
const LEG_HEIGHT: f32 = 0.06;
const LEG_SPREAD: f32 = 0.12;
const START_ALTITUDE: f32 = 1.4;
const SAFE_SPEED: f32 = 0.5;
const MAX_TILT: f32 = 0.35;
const MAX_SPIN: f32 = 0.6;
const X_LIMIT: f32 = 1.5;
const Y_LIMIT: f32 = 2.5;

#[derive(Error, Debug)]
pub enum LanderError {
    #[error("action has {got} components, expected {expected}")]
    BadAction { expected: usize, got: usize },
}

/// Outcome of a single simulation step.
#[derive(Clone, Copy, Debug)]
pub struct StepResult {
    pub observation: [f32; OBS_DIM],
    pub reward: f32,
    pub done: bool,
}

/// The descent craft and its world.
///
/// The pad is at the origin, the ground plane at `y = 0`. Action components
/// are clamped to `[-1, 1]`; the main engine only fires for positive
/// throttle, the lateral thruster only outside the `|a| <= 0.5` deadzone.
pub struct LanderSim {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub angular_vel: f32,
    pub left_contact: bool,
    pub right_contact: bool,
    prev_shaping: Option<f32>,
    rng: fastrand::Rng,
}

impl LanderSim {
    /// Creates a seeded simulation with a freshly randomized start state.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut sim = Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            angle: 0.0,
            angular_vel: 0.0,
            left_contact: false,
            right_contact: false,
            prev_shaping: None,
            rng: fastrand::Rng::with_seed(seed),
        };
        sim.reset();
        sim
    }

    /// Re-randomizes the start state and returns the initial observation.
    pub fn reset(&mut self) -> [f32; OBS_DIM] {
        self.pos = Vec2::new(self.uniform(-0.3, 0.3), START_ALTITUDE);
        self.vel = Vec2::new(self.uniform(-0.2, 0.2), self.uniform(-0.2, 0.0));
        self.angle = self.uniform(-0.1, 0.1);
        self.angular_vel = 0.0;
        self.left_contact = false;
        self.right_contact = false;
        self.prev_shaping = None;
        self.observation()
    }

    /// Advances the craft by one timestep under the given control inputs.
    ///
    /// # Errors
    ///
    /// Returns [`LanderError::BadAction`] when the action vector does not
    /// have [`ACTION_DIM`] components.
    pub fn step(&mut self, action: &[f32]) -> Result<StepResult, LanderError> {
        if action.len() != ACTION_DIM {
            return Err(LanderError::BadAction {
                expected: ACTION_DIM,
                got: action.len(),
            });
        }
        let main = action[0].clamp(-1.0, 1.0);
        let lateral = action[1].clamp(-1.0, 1.0);

        // engine deadzones: main fires above zero throttle at 50-100% power,
        // the lateral thruster outside |a| <= 0.5
        let main_power = if main > 0.0 { 0.5 + 0.5 * main } else { 0.0 };
        let side_power = if lateral.abs() > 0.5 { lateral } else { 0.0 };

        let (sin_a, cos_a) = self.angle.sin_cos();
        let mut acc = Vec2::new(0.0, -GRAVITY);
        acc += Vec2::new(-sin_a, cos_a) * (MAIN_ACCEL * main_power);
        acc += Vec2::new(cos_a, sin_a) * (SIDE_ACCEL * side_power);

        // semi-implicit Euler
        self.vel += acc * DT;
        self.pos += self.vel * DT;
        self.angular_vel -= SIDE_TORQUE * side_power * DT;
        self.angle += self.angular_vel * DT;

        let (sin_a, cos_a) = self.angle.sin_cos();
        self.left_contact = self.pos.y - LEG_HEIGHT * cos_a + LEG_SPREAD * sin_a <= 0.0;
        self.right_contact = self.pos.y - LEG_HEIGHT * cos_a - LEG_SPREAD * sin_a <= 0.0;
        let grounded = self.left_contact || self.right_contact || self.pos.y <= 0.0;
        let out_of_bounds = self.pos.x.abs() > X_LIMIT || self.pos.y > Y_LIMIT;

        let shaping = -100.0 * self.pos.length() - 100.0 * self.vel.length()
            - 100.0 * self.angle.abs()
            + 10.0 * f32::from(u8::from(self.left_contact))
            + 10.0 * f32::from(u8::from(self.right_contact));
        let mut reward = match self.prev_shaping {
            Some(prev) => shaping - prev,
            None => 0.0,
        };
        self.prev_shaping = Some(shaping);
        reward -= 0.30 * main_power + 0.03 * side_power.abs();

        let mut done = false;
        if grounded {
            done = true;
            let soft = self.vel.length() <= SAFE_SPEED
                && self.angle.abs() <= MAX_TILT
                && self.angular_vel.abs() <= MAX_SPIN;
            if soft && self.left_contact && self.right_contact && self.pos.y > 0.0 {
                reward += 100.0;
            } else {
                reward -= 100.0;
            }
        } else if out_of_bounds {
            done = true;
            reward -= 100.0;
        }

        Ok(StepResult {
            observation: self.observation(),
            reward,
            done,
        })
    }

    /// The eight-feature observation vector.
    #[must_use]
    pub fn observation(&self) -> [f32; OBS_DIM] {
        [
            self.pos.x,
            self.pos.y,
            self.vel.x,
            self.vel.y,
            self.angle,
            self.angular_vel,
            f32::from(u8::from(self.left_contact)),
            f32::from(u8::from(self.right_contact)),
        ]
    }

    fn uniform(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.rng.f32() * (hi - lo)
    }
}
