//! Benchmarks for frame tokenization
//!
//! Measures both boundary strategies on ODAS-shaped output:
//! - an 8 s recording at 125 frames/s (1000 frames, 4 tracked sources)
//! - a 10 minute recording (75000 frames) for the lazy iterator
//!
//! Platform: Cross-platform (synthetic fixtures, CI-safe)

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use odas_replay::test_utils::odas_stream;
use odas_replay::tokenizer::{TokenizerMode, frames, tokenize};
use std::hint::black_box;

fn bench_tokenize_modes(c: &mut Criterion) {
    let text = odas_stream(1000, 4);

    let mut group = c.benchmark_group("tokenize_8s_recording");
    group.throughput(Throughput::Bytes(text.len() as u64));

    for mode in [TokenizerMode::Scanner, TokenizerMode::Boundary] {
        group.bench_with_input(BenchmarkId::from_parameter(format!("{mode:?}")), &text, |b, text| {
            b.iter(|| black_box(tokenize(black_box(text), mode)))
        });
    }

    group.finish();
}

fn bench_lazy_count(c: &mut Criterion) {
    let text = odas_stream(75_000, 1);

    let mut group = c.benchmark_group("tokenize_10min_recording");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.sample_size(10);

    group.bench_function("scanner_count", |b| {
        b.iter(|| black_box(frames(black_box(&text), TokenizerMode::Scanner).count()))
    });

    group.finish();
}

criterion_group!(benches, bench_tokenize_modes, bench_lazy_count);
criterion_main!(benches);
