use std::sync::Arc;

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use textprint_core::{analyze, translate};

use textprint_benchmarks::{
    datasets::{generate_values, long_value},
    harness::{measure_filter, measure_insert, mixed_filter, EphemeralStack, LocalStack},
};

const DATASET_SIZES: [usize; 3] = [100, 1_000, 10_000];
const LOCAL_SIZES: [usize; 2] = [100, 1_000];

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");
    for &len in &[64usize, 4_096, 65_536] {
        let value = long_value(len, len as u64);
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &value, |b, value| {
            b.iter(|| black_box(analyze(value)));
        });
    }
    group.finish();
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_ephemeral");
    for &size in &DATASET_SIZES {
        let dataset = Arc::new(generate_values(size, size as u64));
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("ephemeral", size), &dataset, |b, values| {
            b.iter_batched(
                || (EphemeralStack::new(), Arc::clone(values)),
                |(stack, dataset)| measure_insert(&stack.store, &dataset),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();

    let mut local_group = c.benchmark_group("insert_local");
    local_group.sample_size(10);
    for &size in &LOCAL_SIZES {
        let dataset = Arc::new(generate_values(size, (size as u64) + 1));
        local_group.throughput(Throughput::Elements(size as u64));
        local_group.bench_with_input(BenchmarkId::new("local", size), &dataset, |b, values| {
            b.iter_batched(
                || (LocalStack::new(), Arc::clone(values)),
                |(stack, dataset)| measure_insert(&stack.store, &dataset),
                BatchSize::LargeInput,
            );
        });
    }
    local_group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let spec = mixed_filter();
    let mut group = c.benchmark_group("filter");
    for &size in &DATASET_SIZES {
        let stack = EphemeralStack::new();
        stack.insert_all(&generate_values(size, (size as u64) + 11));
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("ephemeral", size), &stack, |b, stack| {
            b.iter(|| black_box(measure_filter(&stack.store, &spec)));
        });
    }
    for &size in &LOCAL_SIZES {
        let stack = LocalStack::new();
        stack.insert_all(&generate_values(size, (size as u64) + 13));
        group.bench_with_input(BenchmarkId::new("local", size), &stack, |b, stack| {
            b.iter(|| black_box(measure_filter(&stack.store, &spec)));
        });
    }
    group.finish();
}

fn bench_translate(c: &mut Criterion) {
    let queries = [
        "all single word palindromic strings",
        "strings longer than 10 characters containing the letter z",
        "palindromic strings that contain the first vowel",
    ];
    c.bench_function("translate", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(translate(q).expect("translate"));
            }
        });
    });
}

fn benches(c: &mut Criterion) {
    bench_analyze(c);
    bench_insert(c);
    bench_filter(c);
    bench_translate(c);
}

criterion_group!(textprint_benches, benches);
criterion_main!(textprint_benches);
