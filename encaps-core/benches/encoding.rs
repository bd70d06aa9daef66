use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use encaps_core::{
    decode_frames, encapsulate, encoder::fragment_frame, DecodeOptions, EncapsulationBuilder,
};

fn bench_encapsulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("encapsulate");

    for size in [4096, 65536, 1 << 20] {
        let frames: Vec<Bytes> = (0..8).map(|_| Bytes::from(vec![0x42u8; size])).collect();

        group.throughput(Throughput::Bytes((size * frames.len()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &frames, |b, frames| {
            b.iter(|| encapsulate(black_box(frames), 1, true).unwrap());
        });
    }

    group.finish();
}

fn bench_fragment(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragment_frame");
    let frame = vec![0x42u8; 1 << 20];

    for fragments in [1, 4, 16, 64] {
        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(fragments),
            &fragments,
            |b, &fragments| {
                b.iter(|| fragment_frame(black_box(&frame), fragments).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");

    for size in [4096, 65536] {
        let frames: Vec<Vec<u8>> = (0..8).map(|i| vec![i as u8; size]).collect();

        group.throughput(Throughput::Bytes((size * frames.len()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let encoded = EncapsulationBuilder::new()
                    .frames(frames.iter().cloned())
                    .fragments_per_frame(4)
                    .build()
                    .unwrap();

                let decoded = decode_frames(encoded, DecodeOptions::new()).unwrap();
                black_box(decoded);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encapsulate, bench_fragment, bench_round_trip);
criterion_main!(benches);
