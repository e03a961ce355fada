use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use petri_core::{Cell, Genome, Simulation, Vector2, WorldConfig, scenario};
use std::time::Duration;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

fn bench_simulation_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_tick");
    group.sample_size(env_or("PETRI_BENCH_SAMPLES", 30_usize).max(10));
    group.warm_up_time(Duration::from_secs(env_or("PETRI_BENCH_WARMUP_SECS", 2)));
    group.measurement_time(Duration::from_secs(env_or("PETRI_BENCH_MEASURE_SECS", 10)));
    let steps: usize = env_or("PETRI_BENCH_STEPS", 64_usize).max(1);
    let populations: Vec<usize> = std::env::var("PETRI_BENCH_CELLS")
        .ok()
        .map(|s| {
            s.split(',')
                .filter_map(|t| t.trim().parse::<usize>().ok())
                .collect::<Vec<_>>()
        })
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| vec![250_usize, 1000, 4000]);

    for &cells in &populations {
        group.bench_function(format!("steps{steps}_cells{cells}"), |b| {
            b.iter_batched(
                || {
                    let config = WorldConfig {
                        width: 2000.0,
                        height: 2000.0,
                        food_spawn_rate: 20.0,
                        rng_seed: Some(0xBEEF),
                        history_capacity: 1,
                        ..WorldConfig::default()
                    };
                    let mut world = scenario::bounded(config).expect("world");
                    for seed in 0..cells as u64 {
                        let x = 20.0 + (seed * 53 % 1960) as f64;
                        let y = 20.0 + (seed * 37 % 1960) as f64;
                        let genome = Genome::sample(world.rng());
                        world
                            .add(Cell::new(
                                Vector2::new(x, y),
                                Vector2::ZERO,
                                120.0,
                                (seed % 8) as f64,
                                0.0,
                                genome,
                            ))
                            .expect("cell");
                    }
                    Simulation::new(world)
                },
                |mut simulation| {
                    for _ in 0..steps {
                        simulation.tick(0.016).expect("tick");
                    }
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_simulation_ticks);
criterion_main!(benches);
