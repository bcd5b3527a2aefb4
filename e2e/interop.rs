//! E2E: byte-level interoperability with an independent DEFLATE
//! implementation (`flate2`), both directions, all three wrappers.

use std::io::{Read, Write};

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use flate2::Compression;
use zflate::{compress_to_vec, decompress_to_vec, Wrapper};

fn corpus() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(300));
    data.extend_from_slice(&vec![0u8; 10_000]);
    data.extend((0..20_000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8));
    data
}

// ─────────────────────────────────────────────────────────────────────────────
// Our compressor → reference decompressor
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn reference_inflater_accepts_our_zlib_streams() {
    let data = corpus();
    for level in 0..=9u8 {
        let compressed = compress_to_vec(Wrapper::Zlib, level, &data).unwrap();
        let mut decoder = ZlibDecoder::new(&compressed[..]);
        let mut output = Vec::new();
        decoder
            .read_to_end(&mut output)
            .unwrap_or_else(|e| panic!("level {level}: reference decode failed: {e}"));
        assert_eq!(output, data, "level {level}");
    }
}

#[test]
fn reference_inflater_accepts_our_gzip_streams() {
    let data = corpus();
    for level in [0, 1, 6, 9] {
        let compressed = compress_to_vec(Wrapper::Gzip, level, &data).unwrap();
        let mut decoder = GzDecoder::new(&compressed[..]);
        let mut output = Vec::new();
        decoder.read_to_end(&mut output).expect("reference gzip decode");
        assert_eq!(output, data, "level {level}");
    }
}

#[test]
fn reference_inflater_accepts_our_raw_streams() {
    let data = corpus();
    for level in [0, 3, 6, 9] {
        let compressed = compress_to_vec(Wrapper::Raw, level, &data).unwrap();
        let mut decoder = DeflateDecoder::new(&compressed[..]);
        let mut output = Vec::new();
        decoder.read_to_end(&mut output).expect("reference raw decode");
        assert_eq!(output, data, "level {level}");
    }
}

#[test]
fn reference_inflater_accepts_tiny_and_empty_streams() {
    for data in [&b""[..], b"a", b"ab", b"abc"] {
        for level in [0, 6, 9] {
            let compressed = compress_to_vec(Wrapper::Zlib, level, data).unwrap();
            let mut decoder = ZlibDecoder::new(&compressed[..]);
            let mut output = Vec::new();
            decoder.read_to_end(&mut output).expect("reference decode");
            assert_eq!(output, data);
        }
    }
}

#[test]
fn reference_inflater_accepts_rle_strategy_streams() {
    use zflate::{Deflate, DeflateOptions, Flush, Status, Strategy};
    let mut data = vec![0u8; 5000];
    data.extend_from_slice(b"trailer text after the run");
    let mut deflate = Deflate::new(
        DeflateOptions::new(9)
            .wrapper(Wrapper::Zlib)
            .strategy(Strategy::Rle),
    )
    .unwrap();
    let mut compressed = Vec::new();
    let mut buf = [0u8; 1024];
    let mut input = &data[..];
    loop {
        let p = deflate.advance(input, &mut buf, Flush::Finish).unwrap();
        input = &input[p.consumed..];
        compressed.extend_from_slice(&buf[..p.produced]);
        if p.status == Status::StreamEnd {
            break;
        }
    }
    let mut decoder = ZlibDecoder::new(&compressed[..]);
    let mut output = Vec::new();
    decoder.read_to_end(&mut output).expect("reference decode");
    assert_eq!(output, data);
}

// ─────────────────────────────────────────────────────────────────────────────
// Reference compressor → our decompressor
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn we_decode_reference_zlib_streams() {
    let data = corpus();
    for level in [0u32, 1, 6, 9] {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
        encoder.write_all(&data).unwrap();
        let compressed = encoder.finish().unwrap();
        let output = decompress_to_vec(Wrapper::Zlib, &compressed, Some(data.len())).unwrap();
        assert_eq!(output, data, "level {level}");
    }
}

#[test]
fn we_decode_reference_gzip_streams() {
    let data = corpus();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&data).unwrap();
    let compressed = encoder.finish().unwrap();
    let output = decompress_to_vec(Wrapper::Gzip, &compressed, Some(data.len())).unwrap();
    assert_eq!(output, data);
}

#[test]
fn we_decode_reference_gzip_with_header_fields() {
    // Optional FNAME/FCOMMENT/FEXTRA fields must be parsed and skipped.
    let data = b"gzip members carry metadata in the wild".repeat(20);
    let builder = flate2::GzBuilder::new()
        .filename("metadata.bin")
        .comment("round trip with header fields")
        .extra(vec![1, 2, 3, 4, 5, 6, 7, 8]);
    let mut encoder = builder.write(Vec::new(), Compression::default());
    encoder.write_all(&data).unwrap();
    let compressed = encoder.finish().unwrap();

    let output = decompress_to_vec(Wrapper::Gzip, &compressed, Some(data.len())).unwrap();
    assert_eq!(output, data);
}

#[test]
fn we_decode_reference_raw_streams() {
    let data = corpus();
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&data).unwrap();
    let compressed = encoder.finish().unwrap();
    let output = decompress_to_vec(Wrapper::Raw, &compressed, Some(data.len())).unwrap();
    assert_eq!(output, data);
}

// ─────────────────────────────────────────────────────────────────────────────
// Corruption detected on foreign streams too
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn corrupted_reference_stream_is_rejected_by_us() {
    let data = corpus();
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&data).unwrap();
    let mut compressed = encoder.finish().unwrap();
    let last = compressed.len() - 1;
    compressed[last] ^= 0xFF;
    assert!(decompress_to_vec(Wrapper::Zlib, &compressed, Some(data.len())).is_err());
}
