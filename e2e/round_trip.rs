//! E2E: round-trip correctness.
//!
//! - Payload sweep: every length 1..=1024 round-trips under each wrapper
//! - Every compression level and both strategies round-trip
//! - Stored passthrough at level 0
//! - Property tests over arbitrary byte vectors

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use zflate::{compress_bound, compress_to_vec, decompress_to_vec, Wrapper};

const WRAPPERS: [Wrapper; 3] = [Wrapper::Raw, Wrapper::Zlib, Wrapper::Gzip];

fn round_trip(wrapper: Wrapper, level: u8, input: &[u8]) {
    let compressed = compress_to_vec(wrapper, level, input).expect("compress");
    assert!(
        compressed.len() <= compress_bound(wrapper, input.len()),
        "bound violated: {} > {} (wrapper {wrapper:?}, level {level}, len {})",
        compressed.len(),
        compress_bound(wrapper, input.len()),
        input.len()
    );
    let output = decompress_to_vec(wrapper, &compressed, Some(input.len())).expect("decompress");
    assert_eq!(output, input, "wrapper {wrapper:?}, level {level}");
}

// ─────────────────────────────────────────────────────────────────────────────
// Payload sweeps (counting-byte payloads of every small size)
// ─────────────────────────────────────────────────────────────────────────────

fn counting_payload(len: usize) -> Vec<u8> {
    (1..=len).map(|i| (i & 0xFF) as u8).collect()
}

#[test]
fn every_small_payload_size_zlib() {
    for len in 1..=1024 {
        round_trip(Wrapper::Zlib, 6, &counting_payload(len));
    }
}

#[test]
fn every_small_payload_size_gzip() {
    for len in 1..=1024 {
        round_trip(Wrapper::Gzip, 6, &counting_payload(len));
    }
}

#[test]
fn every_small_payload_size_raw() {
    for len in 1..=1024 {
        round_trip(Wrapper::Raw, 6, &counting_payload(len));
    }
}

#[test]
fn empty_input_round_trips_under_every_wrapper() {
    for wrapper in WRAPPERS {
        for level in [0, 1, 6, 9] {
            round_trip(wrapper, level, &[]);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Level and strategy coverage
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn all_levels_round_trip_mixed_content() {
    let mut rng = StdRng::seed_from_u64(0x5EED_0001);
    let mut data = Vec::new();
    // Compressible text, long runs, and incompressible noise in one buffer.
    data.extend_from_slice(&b"the quick brown fox jumps over the lazy dog ".repeat(64));
    data.extend_from_slice(&vec![0u8; 4096]);
    data.extend((0..4096).map(|_| rng.gen::<u8>()));
    data.extend_from_slice(&b"abcabcabc".repeat(500));

    for wrapper in WRAPPERS {
        for level in 0..=9 {
            round_trip(wrapper, level, &data);
        }
    }
}

#[test]
fn stored_passthrough_at_level_zero() {
    let data = counting_payload(100_000);
    for wrapper in WRAPPERS {
        let compressed = compress_to_vec(wrapper, 0, &data).expect("compress");
        // Level 0 never shrinks: stored framing only adds overhead.
        assert!(compressed.len() > data.len());
        let output = decompress_to_vec(wrapper, &compressed, Some(data.len())).expect("decompress");
        assert_eq!(output, data);
    }
}

#[test]
fn incompressible_data_stays_within_bound() {
    let mut rng = StdRng::seed_from_u64(0x5EED_0002);
    for len in [1usize, 63, 512, 65_536, 300_000] {
        let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        for level in [0, 1, 6, 9] {
            round_trip(Wrapper::Zlib, level, &data);
        }
    }
}

#[test]
fn highly_repetitive_data_compresses_hard() {
    let data = vec![0xAAu8; 1 << 20];
    let compressed = compress_to_vec(Wrapper::Zlib, 9, &data).expect("compress");
    assert!(compressed.len() < data.len() / 500);
    let output = decompress_to_vec(Wrapper::Zlib, &compressed, Some(data.len())).expect("inflate");
    assert_eq!(output, data);
}

#[test]
fn max_distance_back_references_round_trip() {
    // A unique prefix, a 32 KiB gap, then the prefix again: matches sit at
    // the far edge of the window.
    let mut data = b"unique-prefix-marker".to_vec();
    data.extend_from_slice(&vec![b'x'; 32_768]);
    data.extend_from_slice(b"unique-prefix-marker");
    for level in [1, 6, 9] {
        round_trip(Wrapper::Zlib, level, &data);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wrapper overhead ordering
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn wrapper_overhead_is_ordered_and_fixed() {
    for len in [1usize, 10, 100, 1000] {
        let data = counting_payload(len);
        let raw = compress_to_vec(Wrapper::Raw, 6, &data).unwrap();
        let zlib = compress_to_vec(Wrapper::Zlib, 6, &data).unwrap();
        let gzip = compress_to_vec(Wrapper::Gzip, 6, &data).unwrap();
        assert_eq!(zlib.len(), raw.len() + 6, "len {len}");
        assert_eq!(gzip.len(), zlib.len() + 12, "len {len}");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Property tests
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn arbitrary_bytes_round_trip(
        data in proptest::collection::vec(any::<u8>(), 0..4096),
        level in 0u8..=9,
        wrapper_idx in 0usize..3,
    ) {
        let wrapper = WRAPPERS[wrapper_idx];
        let compressed = compress_to_vec(wrapper, level, &data).unwrap();
        prop_assert!(compressed.len() <= compress_bound(wrapper, data.len()));
        let output = decompress_to_vec(wrapper, &compressed, Some(data.len())).unwrap();
        prop_assert_eq!(output, data);
    }

    #[test]
    fn repetitive_structures_round_trip(
        unit in proptest::collection::vec(any::<u8>(), 1..16),
        repeats in 1usize..512,
        level in 1u8..=9,
    ) {
        let data: Vec<u8> = unit.iter().copied().cycle().take(unit.len() * repeats).collect();
        let compressed = compress_to_vec(Wrapper::Zlib, level, &data).unwrap();
        let output = decompress_to_vec(Wrapper::Zlib, &compressed, Some(data.len())).unwrap();
        prop_assert_eq!(output, data);
    }
}
