//! Benchmarks for the tokenization and interning hot path.
//!
//! Run with: cargo bench

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use trix::index::tokenize::{query_trigrams, trigram_windows};
use trix::intern::{Interner, stable_hash};

/// Synthetic source text with realistic repetition.
fn sample_source(lines: usize) -> String {
    let mut text = String::new();
    for i in 0..lines {
        text.push_str(&format!(
            "fn handler_{i}(request: Request) -> Response {{ dispatch(request, {i}) }}\n"
        ));
    }
    text
}

fn bench_trigram_windows(c: &mut Criterion) {
    let content = sample_source(1000);

    c.bench_function("trigram_windows_64k", |b| {
        b.iter(|| {
            let mut count = 0usize;
            for window in trigram_windows(black_box(&content)) {
                count += window.as_str().len();
            }
            black_box(count)
        })
    });
}

fn bench_interning(c: &mut Criterion) {
    let content = sample_source(200);

    c.bench_function("dedupe_and_realize", |b| {
        b.iter(|| {
            let mut interner = Interner::new();
            let mut realized = 0usize;
            let mut seen = ahash::AHashSet::new();
            for window in trigram_windows(black_box(&content)) {
                if seen.insert(window) {
                    interner.realize(window);
                    realized += 1;
                }
            }
            black_box(realized)
        })
    });
}

fn bench_stable_hash(c: &mut Criterion) {
    c.bench_function("stable_hash_short", |b| {
        b.iter(|| stable_hash(black_box("REQ")))
    });
    c.bench_function("stable_hash_path", |b| {
        b.iter(|| stable_hash(black_box("src/storage/paged_list.rs")))
    });
}

fn bench_query_trigrams(c: &mut Criterion) {
    c.bench_function("query_trigrams", |b| {
        b.iter(|| query_trigrams(black_box("PagedListRange")))
    });
}

criterion_group!(
    benches,
    bench_trigram_windows,
    bench_interning,
    bench_stable_hash,
    bench_query_trigrams
);
criterion_main!(benches);
