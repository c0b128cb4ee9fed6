//! Performance benchmarks for CommandCodec.
//!
//! These benchmarks measure encode and decode throughput for the wire
//! codec. The bus runs at 9600 baud, so the codec is never the
//! bottleneck in production; the benchmarks exist to catch regressions
//! in the parsing hot path.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench codec_bench
//! ```

use bytes::BytesMut;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use hasp_core::LockerAddress;
use hasp_protocol::{Command, CommandCodec};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};

/// Create a representative unlock command.
fn create_unlock_command() -> Command {
    let address = LockerAddress::new("locker_07").unwrap();
    Command::unlock(address, "alice@example.org")
}

/// Create a minimal acknowledgment command.
fn create_ack_command() -> Command {
    let address = LockerAddress::new("A1").unwrap();
    Command::ack(address, "master")
}

/// Benchmark encoding an unlock command.
fn bench_encode_unlock(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_unlock");
    group.throughput(Throughput::Elements(1));

    let cmd = create_unlock_command();

    group.bench_function("encode_unlock_command", |b| {
        b.iter(|| {
            let mut codec = CommandCodec::new();
            let mut buffer = BytesMut::new();
            codec.encode(black_box(cmd.clone()), &mut buffer).unwrap();
            black_box(buffer);
        });
    });

    group.finish();
}

/// Benchmark decoding a single complete frame.
fn bench_decode_unlock(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_unlock");
    group.throughput(Throughput::Elements(1));

    let mut codec = CommandCodec::new();
    let mut encoded = BytesMut::new();
    codec.encode(create_unlock_command(), &mut encoded).unwrap();
    let encoded_bytes = encoded.freeze();

    group.bench_function("decode_unlock_command", |b| {
        b.iter(|| {
            let mut codec = CommandCodec::new();
            let mut buffer = BytesMut::from(&encoded_bytes[..]);
            let cmd = codec.decode(&mut buffer).unwrap();
            black_box(cmd);
        });
    });

    group.finish();
}

/// Benchmark a full encode/decode round trip.
fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");
    group.throughput(Throughput::Elements(1));

    let cmd = create_ack_command();

    group.bench_function("encode_then_decode", |b| {
        b.iter(|| {
            let mut codec = CommandCodec::new();
            let mut buffer = BytesMut::new();
            codec.encode(black_box(cmd.clone()), &mut buffer).unwrap();
            let decoded = codec.decode(&mut buffer).unwrap();
            black_box(decoded);
        });
    });

    group.finish();
}

/// Benchmark decoding a burst of frames from one buffer, the shape of
/// traffic right after a direction switch.
fn bench_decode_burst(c: &mut Criterion) {
    const BURST: usize = 16;

    let mut group = c.benchmark_group("decode_burst");
    group.throughput(Throughput::Elements(BURST as u64));

    let mut codec = CommandCodec::new();
    let mut encoded = BytesMut::new();
    for _ in 0..BURST {
        codec.encode(create_unlock_command(), &mut encoded).unwrap();
    }
    let encoded_bytes = encoded.freeze();

    group.bench_function("decode_16_frames", |b| {
        b.iter(|| {
            let mut codec = CommandCodec::new();
            let mut buffer = BytesMut::from(&encoded_bytes[..]);
            let mut count = 0;
            while let Ok(Some(cmd)) = codec.decode(&mut buffer) {
                black_box(cmd);
                count += 1;
            }
            assert_eq!(count, BURST);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_encode_unlock,
    bench_decode_unlock,
    bench_round_trip,
    bench_decode_burst
);
criterion_main!(benches);
