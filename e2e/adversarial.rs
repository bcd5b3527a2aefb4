//! E2E: adversarial inputs for the match finder and window management.
//!
//! - Crafted hash-bucket collisions must never corrupt a round trip
//! - Window sliding under one-byte feeding at the smallest window size
//! - Run-length strategy over long runs, one byte at a time
//! - Inputs far larger than the window, fed in small chunks

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use zflate::{decompress_to_vec, Deflate, DeflateOptions, Flush, Status, Strategy, Wrapper};

/// Feed `data` one byte at a time with tiny internal tables, then finish.
fn compress_byte_at_a_time(data: &[u8], opts: DeflateOptions) -> Vec<u8> {
    let mut deflate = Deflate::new(opts).expect("valid options");
    let mut out = Vec::new();
    let mut buf = [0u8; 256];
    for i in 0..data.len() {
        let mut slice = &data[i..i + 1];
        while !slice.is_empty() {
            let p = deflate.advance(slice, &mut buf, Flush::None).expect("advance");
            slice = &slice[p.consumed..];
            out.extend_from_slice(&buf[..p.produced]);
        }
    }
    loop {
        let p = deflate.advance(&[], &mut buf, Flush::Finish).expect("finish");
        out.extend_from_slice(&buf[..p.produced]);
        if p.status == Status::StreamEnd {
            break;
        }
    }
    out
}

fn assert_round_trip(data: &[u8], opts: DeflateOptions) {
    let compressed = compress_byte_at_a_time(data, opts);
    let output = decompress_to_vec(opts.wrapper, &compressed, Some(data.len()))
        .expect("crafted input must still decode");
    assert_eq!(output, data);
}

// ─────────────────────────────────────────────────────────────────────────────
// Hash-bucket collisions
// ─────────────────────────────────────────────────────────────────────────────

/// The 3-byte prefixes of `2a 14 14 14` and `2a 14 db 14` can share a hash
/// bucket at small table sizes while differing in their third byte. A match
/// finder that trusts the bucket instead of verifying bytes would pair them
/// and corrupt the stream.
#[test]
fn colliding_prefixes_with_differing_interior_byte() {
    let src: Vec<u8> = vec![
        123, // nothing matches at offset 0
        0x2A, 0x14, 0xDB, 0x14, 0x15, // looks like a 5-byte match to a confused matcher
        0x2A, 0x14, 0x14, 0x14, // 4-byte match bumps the next expected length to 5
        0x2A, 0x14, 0x14, 0x14, 0x15,
    ];
    // Small mem_level shrinks the hash table to maximize bucket collisions.
    let opts = DeflateOptions::new(2)
        .wrapper(Wrapper::Raw)
        .mem_level(2)
        .window_bits(15);
    assert_round_trip(&src, opts);
}

/// Same-bucket sequences whose first two and last two bytes agree while the
/// middle ones differ: the candidate survives every cheap screen and only
/// full verification can reject it.
#[test]
fn colliding_prefixes_with_matching_edges() {
    let src: Vec<u8> = vec![
        123, //
        0xFF, 0xFF, 0x5E, 0x6F, 0x12, 0x34, //
        0xFF, 0xFF, 0x13, 0xFF, 0x12, // 5-byte match bumps the expected length to 6
        0xFF, 0xFF, 0x13, 0xFF, 0x12, 0x34,
    ];
    let opts = DeflateOptions::new(5).wrapper(Wrapper::Raw).mem_level(8);
    assert_round_trip(&src, opts);
}

#[test]
fn collision_vectors_survive_every_level_and_mem_level() {
    let vectors: [&[u8]; 2] = [
        &[
            123, 0x2A, 0x14, 0xDB, 0x14, 0x15, 0x2A, 0x14, 0x14, 0x14, 0x2A, 0x14, 0x14, 0x14,
            0x15,
        ],
        &[
            123, 0xFF, 0xFF, 0x5E, 0x6F, 0x12, 0x34, 0xFF, 0xFF, 0x13, 0xFF, 0x12, 0xFF, 0xFF,
            0x13, 0xFF, 0x12, 0x34,
        ],
    ];
    for src in vectors {
        for level in 1..=9 {
            for mem_level in [1, 2, 8] {
                let opts = DeflateOptions::new(level)
                    .wrapper(Wrapper::Raw)
                    .mem_level(mem_level);
                assert_round_trip(src, opts);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Window sliding under byte-at-a-time feeding
// ─────────────────────────────────────────────────────────────────────────────

/// Structured corpus mixing long zero runs, short repeated motifs, and noise;
/// at a 512-byte window this forces repeated slides while matches are in
/// flight.
fn sliding_corpus(len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(0xC0FF_EE00);
    let motifs: [&[u8]; 4] = [
        &[0x6E, 0x6E, 0x6E, 0x00, 0x00],
        &[0x8A; 14],
        &[0xFF, 0x09, 0x00, 0x62, 0x00, 0x9F, 0xFF, 0xC6, 0xC6, 0xC6],
        &[0x00; 40],
    ];
    let mut data = Vec::with_capacity(len);
    while data.len() < len {
        match rng.gen_range(0..6) {
            0..=2 => data.extend_from_slice(motifs[rng.gen_range(0..motifs.len())]),
            3 => data.extend(std::iter::repeat(rng.gen::<u8>()).take(rng.gen_range(1..200))),
            4 => data.extend((0..rng.gen_range(1..50)).map(|_| rng.gen::<u8>())),
            _ => data.extend_from_slice(&[0u8; 100]),
        }
    }
    data.truncate(len);
    data
}

#[test]
fn window_slides_survive_one_byte_feeding_at_minimum_window() {
    let data = sliding_corpus(870);
    for level in [2, 5, 9] {
        let opts = DeflateOptions::new(level)
            .wrapper(Wrapper::Raw)
            .window_bits(9);
        assert_round_trip(&data, opts);
    }
}

#[test]
fn input_much_larger_than_the_window_round_trips() {
    // 20 windows' worth of self-similar data at the smallest window size,
    // fed in small chunks: matches keep pointing near the slide boundary.
    let data = sliding_corpus(20 * 512);
    let opts = DeflateOptions::new(6).wrapper(Wrapper::Zlib).window_bits(9);

    let mut deflate = Deflate::new(opts).unwrap();
    let mut compressed = Vec::new();
    let mut buf = [0u8; 64];
    for chunk in data.chunks(7) {
        let mut slice = chunk;
        while !slice.is_empty() {
            let p = deflate.advance(slice, &mut buf, Flush::None).unwrap();
            slice = &slice[p.consumed..];
            compressed.extend_from_slice(&buf[..p.produced]);
        }
    }
    loop {
        let p = deflate.advance(&[], &mut buf, Flush::Finish).unwrap();
        compressed.extend_from_slice(&buf[..p.produced]);
        if p.status == Status::StreamEnd {
            break;
        }
    }

    let output = decompress_to_vec(Wrapper::Zlib, &compressed, Some(data.len())).unwrap();
    assert_eq!(output, data);
}

// ─────────────────────────────────────────────────────────────────────────────
// Run-length strategy over long runs
// ─────────────────────────────────────────────────────────────────────────────

/// Long runs ending exactly at the data boundary: a run scanner that reads
/// past the valid lookahead would fabricate bytes here.
fn run_heavy_corpus() -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(0x0BAD_5EED);
    let mut data = Vec::new();
    data.extend_from_slice(b"1d820206e5852a06e52f0487a1867719\n");
    for _ in 0..4 {
        data.extend_from_slice(&[0x65, 0x62, 0x00, 0x9F, 0xFF, 0xC6, 0xC6, 0xC6, 0xFF, 0x09]);
    }
    data.extend((0..80).map(|_| rng.gen::<u8>()));
    data.extend_from_slice(&[0x00; 300]);
    data.extend_from_slice(&[0xC6; 70]);
    data.extend_from_slice(&[0x00; 120]);
    data.push(0x03);
    data
}

#[test]
fn rle_strategy_over_long_runs_one_byte_at_a_time() {
    let data = run_heavy_corpus();
    let opts = DeflateOptions::new(9)
        .wrapper(Wrapper::Zlib)
        .window_bits(9)
        .strategy(Strategy::Rle);
    assert_round_trip(&data, opts);
}

#[test]
fn rle_strategy_matches_default_round_trip_semantics() {
    let data = run_heavy_corpus();
    for wrapper in [Wrapper::Raw, Wrapper::Zlib, Wrapper::Gzip] {
        let opts = DeflateOptions::new(6).wrapper(wrapper).strategy(Strategy::Rle);
        assert_round_trip(&data, opts);
    }
}

#[test]
fn rle_run_ending_at_the_final_byte() {
    // The run has no terminator byte after it; the scanner must stop at the
    // end of real data.
    let mut data = b"x".to_vec();
    data.extend_from_slice(&[0x55u8; 777]);
    let opts = DeflateOptions::new(9)
        .wrapper(Wrapper::Raw)
        .window_bits(9)
        .strategy(Strategy::Rle);
    assert_round_trip(&data, opts);
}
