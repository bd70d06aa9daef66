use bytes::{BufMut, Bytes, BytesMut};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use encaps_core::{
    encapsulate, encoder::itemize_fragment, DecodeOptions, EncapsulatedStream, FrameIterator,
};
use rand::{Rng, SeedableRng};

/// Random frames, each split into `fragments` items
fn make_stream(frames: usize, frame_len: usize, fragments: usize, table: bool) -> Bytes {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x00E0_FFFE);
    let frames: Vec<Vec<u8>> = (0..frames)
        .map(|_| (0..frame_len).map(|_| rng.gen_range(0..0xFF)).collect())
        .collect();
    encapsulate(&frames, fragments, table).unwrap()
}

/// Frames whose last fragment ends with an end-of-codestream marker
fn make_marker_stream(frames: usize, fragments: usize) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_slice(b"\xFE\xFF\x00\xE0\x00\x00\x00\x00");
    for _ in 0..frames {
        for i in 0..fragments {
            let mut fragment = vec![0x11u8; 1024];
            if i == fragments - 1 {
                fragment[1022..].copy_from_slice(b"\xFF\xD9");
            }
            buf.put_slice(&itemize_fragment(&fragment).unwrap());
        }
    }
    buf.freeze()
}

fn bench_offset_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("frames_offset_table");

    for fragments in [1, 4, 16] {
        let stream = make_stream(32, 16384, fragments, true);

        group.throughput(Throughput::Bytes(stream.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(fragments),
            &stream,
            |b, stream| {
                b.iter(|| {
                    let frames = FrameIterator::new(stream.clone(), DecodeOptions::new())
                        .unwrap()
                        .count();
                    black_box(frames);
                });
            },
        );
    }

    group.finish();
}

fn bench_marker_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("frames_marker_search");

    for fragments in [2, 8] {
        let stream = make_marker_stream(32, fragments);

        group.throughput(Throughput::Bytes(stream.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(fragments),
            &stream,
            |b, stream| {
                b.iter(|| {
                    let decoded = EncapsulatedStream::new(stream.clone())
                        .decode(Some(32))
                        .unwrap();
                    black_box(decoded);
                });
            },
        );
    }

    group.finish();
}

fn bench_fragment_count(c: &mut Criterion) {
    let stream = make_stream(256, 1024, 4, false);
    let encapsulated = EncapsulatedStream::new(stream.clone());

    let mut group = c.benchmark_group("fragment_count");
    group.throughput(Throughput::Bytes(stream.len() as u64));
    group.bench_function("1024_fragments", |b| {
        b.iter(|| black_box(encapsulated.fragment_count().unwrap()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_offset_table,
    bench_marker_search,
    bench_fragment_count
);
criterion_main!(benches);
