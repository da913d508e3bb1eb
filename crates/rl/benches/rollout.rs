use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rl::{sample_trajectories, ActionSource, LanderEnv, SampleConfig};

fn bench_bootstrap_rollout(c: &mut Criterion) {
    let cfg = SampleConfig {
        max_steps: 200,
        ..SampleConfig::default()
    };
    c.bench_function("bootstrap_rollout", |b| {
        let mut env = LanderEnv::new(0);
        let mut rng = StdRng::seed_from_u64(0);
        b.iter(|| sample_trajectories(&mut env, 1, &cfg, ActionSource::Random, &mut rng).unwrap());
    });
}

criterion_group!(benches, bench_bootstrap_rollout);
criterion_main!(benches);
