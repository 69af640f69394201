use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geocoin_logic::prelude::*;

fn bench_compute_visible(c: &mut Criterion) {
    let config = WorldConfig::default();

    c.bench_function("compute_visible_cold", |b| {
        b.iter(|| {
            let mut world = WorldBuilder::new(config);
            black_box(world.compute_visible(config.origin, config.visibility_radius))
        })
    });

    let mut warm = WorldBuilder::new(config);
    warm.compute_visible(config.origin, config.visibility_radius);
    c.bench_function("compute_visible_warm", |b| {
        b.iter(|| black_box(warm.compute_visible(config.origin, config.visibility_radius)))
    });
}

criterion_group!(benches, bench_compute_visible);
criterion_main!(benches);
