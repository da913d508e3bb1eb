#![deny(clippy::all, clippy::pedantic)]

use anyhow::Result;
use rl::{LanderEnv, TrainConfig, TrainSession};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = TrainConfig::default();
    tracing::info!(
        epochs = cfg.epochs,
        bootstrap_episodes = cfg.bootstrap_episodes,
        episodes_per_epoch = cfg.episodes_per_epoch,
        "Initializing lander training session..."
    );

    let env = LanderEnv::new(cfg.seed);
    let mut session = TrainSession::new(env, cfg);
    let stats = session.run()?;

    let best = stats
        .iter()
        .map(|s| s.mean_return)
        .fold(f32::NEG_INFINITY, f32::max);
    for s in stats {
        tracing::info!(
            epoch = s.epoch,
            mean_return = s.mean_return,
            std_return = s.std_return,
            max_return = s.max_return,
            "epoch summary"
        );
    }
    tracing::info!(
        epochs = stats.len(),
        best_mean_return = best,
        "Training finished."
    );

    Ok(())
}
