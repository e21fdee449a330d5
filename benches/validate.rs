use criterion::{criterion_group, criterion_main, Bencher, BenchmarkId, Criterion};
use sofa_drir::{convert, AmbisonicsDrir, Dataset, DrirBuilder};

use rand::Rng;

fn random(len: usize) -> Vec<f64> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn bench_validate(b: &mut Bencher, emitters: usize, samples: usize) {
    let dataset = DrirBuilder::new(1, 4, emitters, samples)
        .with_emitter_positions((0..emitters).map(|i| [i as f64, 1.0, 0.0]).collect())
        .with_data_ir(random(4 * emitters * samples))
        .build(Dataset::in_memory())
        .unwrap();

    let mut drir = AmbisonicsDrir::new(dataset);

    b.iter(|| {
        drir.dataset_mut();
        drir.validate().unwrap();
    });
}

fn bench_reorder(b: &mut Bencher, emitters: usize, samples: usize) {
    let data = random(emitters * samples * 4);

    b.iter(|| convert::reorder_enr_to_ren(&data, emitters, samples, 4).unwrap());
}

fn bench_emitter_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("Validate");
    for i in [1, 8, 32, 64].iter() {
        group.bench_with_input(BenchmarkId::new("emitters", i), i, |b, i| {
            bench_validate(b, *i, 4096)
        });
    }
    group.finish();
}

fn bench_sample_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reorder ENR to REN");
    for i in [256, 1024, 4096, 65536].iter() {
        group.bench_with_input(BenchmarkId::new("samples", i), i, |b, i| {
            bench_reorder(b, 8, *i)
        });
    }
    group.finish();
}

criterion_group!(benches, bench_emitter_count, bench_sample_count);
criterion_main!(benches);
