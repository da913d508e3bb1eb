//! Controller and baseline network builders.

use ml::{BatchNorm, Dense, Dropout, Relu, Sequential, TanhAct};

/// The control policy: observation in, bounded action vector out.
///
/// Six dense layers with relu activations and a tanh output squashing
/// actions into `[-1, 1]`, with one batch-normalization and one dropout
/// layer interleaved for regularization.
#[must_use]
pub fn build_policy(obs_dim: usize, action_dim: usize) -> Sequential {
    let mut net = Sequential::new();
    net.push(Dense::random(obs_dim, 5, 1e-4));
    net.push(Relu);
    net.push(Dense::random(5, 20, 1e-3));
    net.push(Relu);
    net.push(BatchNorm::new(20));
    net.push(Dense::random(20, 20, 1e-3));
    net.push(Relu);
    net.push(Dropout::new(0.5));
    net.push(Dense::random(20, 10, 1e-3));
    net.push(Relu);
    net.push(Dense::random(10, 10, 1e-3));
    net.push(Relu);
    net.push(Dense::random(10, action_dim, 0.0));
    net.push(TanhAct);
    net
}

/// The baseline critic: observation in, scalar value estimate out.
#[must_use]
pub fn build_baseline(obs_dim: usize) -> Sequential {
    let mut net = Sequential::new();
    net.push(Dense::random(obs_dim, 5, 1e-4));
    net.push(Relu);
    net.push(Dense::random(5, 10, 1e-4));
    net.push(Relu);
    net.push(BatchNorm::new(10));
    net.push(Dense::random(10, 10, 1e-4));
    net.push(Relu);
    net.push(Dropout::new(0.5));
    net.push(Dense::random(10, 5, 1e-4));
    net.push(Relu);
    net.push(Dense::random(5, 5, 1e-4));
    net.push(Relu);
    net.push(Dense::random(5, 1, 0.0));
    net
}
