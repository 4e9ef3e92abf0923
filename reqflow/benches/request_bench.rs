//! Benchmarks for dedup hashing and pipe processing.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reqflow::core::{dedup_key, key_hash, Payload, Pipe};
use reqflow::transport::Method;

fn hasher_benchmark(c: &mut Criterion) {
    c.bench_function("key_hash_short", |b| {
        b.iter(|| key_hash(black_box("GET/search")));
    });

    let long = "https://api.example.com/v1/search?q=".repeat(8);
    c.bench_function("dedup_key_long_url", |b| {
        b.iter(|| dedup_key(Method::Get, black_box(&long), black_box("search-box")));
    });
}

fn pipe_benchmark(c: &mut Criterion) {
    c.bench_function("pipe_ten_stages", |b| {
        b.iter(|| {
            let mut pipe: Pipe<Payload> = Pipe::new();
            for _ in 0..10 {
                pipe.join(|p: Payload| Payload::from(p.as_i64().unwrap_or_default() + 1));
            }
            black_box(pipe.process(Some(Payload::from(0_i64))).as_i64())
        });
    });

    c.bench_function("pipe_resume_one_stage", |b| {
        let stage: Arc<dyn Fn(Payload) -> Payload + Send + Sync> = Arc::new(|p| p);
        let mut pipe: Pipe<Payload> = Pipe::new();
        pipe.process(Some(Payload::from("seed")));
        b.iter(|| {
            pipe.join_shared(Arc::clone(&stage));
            black_box(pipe.process(None).is_null())
        });
    });
}

criterion_group!(benches, hasher_benchmark, pipe_benchmark);
criterion_main!(benches);
