use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mabsplit::{Allocation, AllocationConfig, AllocationEngine, VariantObservation};
use std::hint::black_box;

fn bench_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_allocation");
    for &n_variants in &[2usize, 8usize, 64usize] {
        // A deterministic, slightly-non-uniform click pattern; first arm is the control.
        let variants: Vec<VariantObservation> = (0..n_variants)
            .map(|i| {
                let name = if i == 0 {
                    "control".to_string()
                } else {
                    format!("variant_{i}")
                };
                let clicks = ((i as u64) * 17 + 3) % 101 + 200;
                VariantObservation::new(name, 10_000, clicks)
            })
            .collect();
        let previous = Allocation::uniform(variants.iter().map(|v| v.name.as_str()), 4);

        group.bench_with_input(
            BenchmarkId::new("no_previous", n_variants),
            &n_variants,
            |b, &_n| {
                let mut engine = AllocationEngine::with_seed(AllocationConfig::default(), 123).unwrap();
                b.iter(|| {
                    let alloc = engine.allocate(black_box(&variants), None).unwrap();
                    black_box(alloc);
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("with_previous", n_variants),
            &n_variants,
            |b, &_n| {
                let mut engine = AllocationEngine::with_seed(AllocationConfig::default(), 123).unwrap();
                b.iter(|| {
                    let report = engine
                        .compute(black_box(&variants), Some(black_box(&previous)))
                        .unwrap();
                    black_box(report);
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_allocation);
criterion_main!(benches);
