use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;
use stray::{ClusterBuilder, LayerId};

fn bench_build_clusters(c: &mut Criterion) {
    let mut group = c.benchmark_group("occupancy");

    // One dominant population with a stray layer every 25 samples, roughly
    // the shape a full detector readout produces.
    let mut rng = StdRng::seed_from_u64(42);
    let n = 250;
    let samples: Vec<(f64, f64)> = (0..n)
        .map(|ix| {
            let r: f64 = rng.random();
            if ix % 25 == 0 {
                (600.0 + 40.0 * r, 30.0 + 4.0 * r)
            } else {
                (200.0 + 10.0 * r, 14.0 + r)
            }
        })
        .collect();

    group.bench_function("build_n250_dominant_plus_strays", |b| {
        b.iter(|| {
            let mut builder = ClusterBuilder::new();
            for (ix, &(mean, spread)) in samples.iter().enumerate() {
                builder.add_point(mean, spread, LayerId(ix as u32));
            }
            black_box(builder.build_clusters().unwrap());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_build_clusters);
criterion_main!(benches);
