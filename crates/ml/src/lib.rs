//! Minimal dense-network substrate for the lander trainer.
//!
//! Provides row-major [`Tensor`]s, a [`Layer`] trait with the handful of
//! layers the controller and baseline networks need (dense, relu, tanh,
//! dropout, batch normalization), mean-squared-error losses with optional
//! per-sample weights, and an [`Adam`] optimizer. Everything runs on the CPU
//! in `f32`; batches are plain `[n, d]` tensors.

pub mod loss;
pub mod nn;
pub mod optim;
pub mod tensor;

pub use loss::{mse, mse_grad, weighted_mse, weighted_mse_grad};
pub use nn::{BatchNorm, Dense, Dropout, Layer, Relu, Sequential, TanhAct};
pub use optim::Adam;
pub use tensor::Tensor;
