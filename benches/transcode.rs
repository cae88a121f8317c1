//! Benchmark – one-shot and streaming transcoding
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use charcodec::{Codec, Options};

/// Mixed-script text with ASCII, Latin-1, BMP and supplementary characters.
fn make_text(target_units: usize) -> Vec<u16> {
    let sample = "Hello, caf\u{E9} \u{20AC}5 \u{4E16}\u{754C} \u{1F600}! ";
    sample.encode_utf16().cycle().take(target_units).collect()
}

fn stream_decode(codec: Codec, bytes: &[u8], parts: usize) -> usize {
    let chunk_size = bytes.len().div_ceil(parts);
    let mut decoder = codec.decoder(Options::default());
    let mut produced = 0usize;
    for chunk in bytes.chunks(chunk_size) {
        produced += decoder.write(chunk).unwrap().len();
    }
    produced + decoder.finish().unwrap().len()
}

fn bench_one_shot(c: &mut Criterion) {
    let text = make_text(64 * 1024);
    let options = Options::default();
    let mut group = c.benchmark_group("one_shot");
    group.throughput(Throughput::Elements(text.len() as u64));

    for codec in [Codec::UTF8, Codec::UTF16LE, Codec::windows_1252()] {
        let bytes = codec.encode(&text, &options).unwrap();
        group.bench_function(BenchmarkId::new("encode", codec.name()), |b| {
            b.iter(|| codec.encode(black_box(&text), &options).unwrap())
        });
        group.bench_function(BenchmarkId::new("decode", codec.name()), |b| {
            b.iter(|| codec.decode(black_box(&bytes), &options).unwrap())
        });
    }
    group.finish();
}

fn bench_streaming(c: &mut Criterion) {
    let text = make_text(64 * 1024);
    let bytes = Codec::UTF8.encode(&text, &Options::default()).unwrap();
    let mut group = c.benchmark_group("stream_decode_utf8");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    for parts in [1usize, 16, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(parts), &parts, |b, &parts| {
            b.iter(|| stream_decode(Codec::UTF8, black_box(&bytes), parts))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_one_shot, bench_streaming);
criterion_main!(benches);
