//! Performance benchmarks for the access token codec.
//!
//! Token decoding sits on the scan hot path: every camera read that
//! survives debouncing goes through `decode`. These benchmarks track the
//! cost of sealing and opening tokens.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench token_bench
//! ```

use chrono::{Duration, TimeZone, Utc};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use hasp_core::LockerAddress;
use hasp_token::{GrantClaims, TokenCodec};
use std::hint::black_box;

fn codec() -> TokenCodec {
    TokenCodec::new(b"benchmark key material")
}

fn claims() -> GrantClaims {
    let from = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
    GrantClaims::new(
        LockerAddress::new("locker_07").unwrap(),
        "alice@example.org",
        from,
        from + Duration::hours(1),
    )
}

/// Benchmark sealing claims into a token.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_encode");
    group.throughput(Throughput::Elements(1));

    let codec = codec();
    let claims = claims();

    group.bench_function("seal_claims", |b| {
        b.iter(|| {
            let token = codec.encode(black_box(&claims)).unwrap();
            black_box(token);
        });
    });

    group.finish();
}

/// Benchmark the scan-path decode of a valid token.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_decode");
    group.throughput(Throughput::Elements(1));

    let codec = codec();
    let token = codec.encode(&claims()).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 30, 0).unwrap();

    group.bench_function("open_valid_token", |b| {
        b.iter(|| {
            let grant = codec.decode(black_box(&token), now).unwrap();
            black_box(grant);
        });
    });

    group.finish();
}

/// Benchmark rejecting garbage, the cost of a bogus scan.
fn bench_decode_garbage(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_decode_garbage");
    group.throughput(Throughput::Elements(1));

    let codec = codec();
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 30, 0).unwrap();
    let garbage = "f".repeat(120);

    group.bench_function("reject_garbage_scan", |b| {
        b.iter(|| {
            let err = codec.decode(black_box(&garbage), now).unwrap_err();
            black_box(err);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_decode_garbage);
criterion_main!(benches);
