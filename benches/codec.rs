//! Criterion benchmarks for compression and decompression throughput.
//!
//! Run with:
//!   cargo bench --bench codec

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use zflate::{compress_bound, compress_to_vec, decompress_to_vec, Wrapper};

/// Synthetic corpus with text-like, run-heavy, and incompressible regions.
fn corpus(len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(0xBE_7C_4A_11);
    let mut data = Vec::with_capacity(len);
    while data.len() < len {
        match rng.gen_range(0..4) {
            0 => data.extend_from_slice(b"the compression benchmark corpus repeats phrases "),
            1 => data.extend(std::iter::repeat(rng.gen::<u8>()).take(rng.gen_range(16..256))),
            2 => data.extend((0..rng.gen_range(16..128)).map(|_| rng.gen::<u8>())),
            _ => data.extend_from_slice(&[0u8; 64]),
        }
    }
    data.truncate(len);
    data
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    let data = corpus(1 << 20);
    group.throughput(Throughput::Bytes(data.len() as u64));
    for level in [1u8, 6, 9] {
        group.bench_with_input(BenchmarkId::new("zlib", level), &data, |b, data| {
            b.iter(|| compress_to_vec(Wrapper::Zlib, level, data).unwrap())
        });
    }
    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompress");
    let data = corpus(1 << 20);
    let compressed = compress_to_vec(Wrapper::Zlib, 6, &data).unwrap();
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_with_input(BenchmarkId::new("zlib", data.len()), &compressed, |b, c| {
        b.iter(|| decompress_to_vec(Wrapper::Zlib, c, Some(data.len())).unwrap())
    });
    group.finish();
}

fn bench_bound(c: &mut Criterion) {
    c.bench_function("compress_bound", |b| {
        b.iter(|| {
            let mut acc = 0usize;
            for len in [0usize, 100, 65_536, 1 << 24] {
                acc = acc.wrapping_add(compress_bound(Wrapper::Gzip, len));
            }
            acc
        })
    });
}

criterion_group!(benches, bench_compress, bench_decompress, bench_bound);
criterion_main!(benches);
