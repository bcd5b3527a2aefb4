//! E2E: incremental streaming behavior.
//!
//! - Compressing one byte at a time is byte-identical to one-shot output
//! - Decompressing through a one-byte output buffer reproduces the input
//! - Fixed-size chunked decompression with totals tracking
//! - Sync flush points keep the prefix decodable mid-stream

use zflate::{
    compress_to_vec, decompress_to_vec, Deflate, DeflateOptions, Flush, Inflate, Status, Strategy,
    Wrapper,
};

/// Drive a compressor to completion, feeding input in `chunk`-byte pieces.
fn compress_chunked(data: &[u8], opts: DeflateOptions, chunk: usize) -> Vec<u8> {
    let mut deflate = Deflate::new(opts).expect("valid options");
    let mut out = Vec::new();
    let mut buf = [0u8; 131];
    let mut pos = 0;
    while pos < data.len() {
        let end = (pos + chunk).min(data.len());
        let mut slice = &data[pos..end];
        while !slice.is_empty() {
            let p = deflate.advance(slice, &mut buf, Flush::None).expect("advance");
            slice = &slice[p.consumed..];
            out.extend_from_slice(&buf[..p.produced]);
        }
        pos = end;
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

/// Drive a decompressor with `in_chunk` input bytes and `out_chunk` output
/// bytes of room per call.
fn decompress_chunked(
    compressed: &[u8],
    wrapper: Wrapper,
    in_chunk: usize,
    out_chunk: usize,
) -> Vec<u8> {
    let mut inflate = Inflate::new(wrapper);
    let mut out = Vec::new();
    let mut buf = vec![0u8; out_chunk];
    let mut pos = 0;
    loop {
        let end = (pos + in_chunk).min(compressed.len());
        let p = inflate
            .advance(&compressed[pos..end], &mut buf)
            .expect("advance");
        pos += p.consumed;
        out.extend_from_slice(&buf[..p.produced]);
        if p.status == Status::StreamEnd {
            break;
        }
        assert!(
            p.consumed > 0 || p.produced > 0 || pos < compressed.len(),
            "stalled before stream end"
        );
    }
    out
}

fn structured_payload() -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..1000u32 {
        for j in 0..40u32 {
            data.push((j + (i % 3)) as u8);
        }
    }
    data
}

// ─────────────────────────────────────────────────────────────────────────────
// Streaming equivalence (compression)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn one_byte_feed_is_bit_exact_across_levels() {
    let data = structured_payload();
    for level in [0, 1, 3, 4, 6, 9] {
        let opts = DeflateOptions::new(level);
        let whole = compress_chunked(&data, opts, data.len());
        let bytes = compress_chunked(&data, opts, 1);
        assert_eq!(whole, bytes, "level {level}");
        let sevens = compress_chunked(&data, opts, 7);
        assert_eq!(whole, sevens, "level {level}");
    }
}

#[test]
fn one_byte_feed_is_bit_exact_for_rle_strategy() {
    let data = structured_payload();
    let opts = DeflateOptions::new(9).strategy(Strategy::Rle);
    let whole = compress_chunked(&data, opts, data.len());
    let bytes = compress_chunked(&data, opts, 1);
    assert_eq!(whole, bytes);
}

#[test]
fn streamed_output_matches_one_shot_helper() {
    let data = structured_payload();
    let streamed = compress_chunked(&data, DeflateOptions::new(6), 13);
    let one_shot = compress_to_vec(Wrapper::Zlib, 6, &data).unwrap();
    assert_eq!(streamed, one_shot);
}

// ─────────────────────────────────────────────────────────────────────────────
// Streaming equivalence (decompression)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn one_byte_output_decompression_is_exact() {
    let data = structured_payload();
    let compressed = compress_to_vec(Wrapper::Zlib, 9, &data).unwrap();
    let output = decompress_chunked(&compressed, Wrapper::Zlib, compressed.len(), 1);
    assert_eq!(output, data);
}

#[test]
fn one_byte_input_decompression_is_exact() {
    let data = structured_payload();
    for wrapper in [Wrapper::Raw, Wrapper::Zlib, Wrapper::Gzip] {
        let compressed = compress_to_vec(wrapper, 6, &data).unwrap();
        let output = decompress_chunked(&compressed, wrapper, 1, 97);
        assert_eq!(output, data, "wrapper {wrapper:?}");
    }
}

#[test]
fn one_byte_each_way_decompression_is_exact() {
    let data = b"tiny but thorough".repeat(40);
    let compressed = compress_to_vec(Wrapper::Gzip, 6, &data).unwrap();
    let output = decompress_chunked(&compressed, Wrapper::Gzip, 1, 1);
    assert_eq!(output, data);
}

#[test]
fn chunked_decompression_tracks_totals() {
    let data = structured_payload();
    let compressed = compress_to_vec(Wrapper::Zlib, 9, &data).unwrap();

    let mut inflate = Inflate::new(Wrapper::Zlib);
    let mut buf = [0u8; 4096];
    let mut pos = 0;
    let mut reconstructed = 0u64;
    loop {
        let p = inflate.advance(&compressed[pos..], &mut buf).expect("advance");
        pos += p.consumed;
        // Verify each chunk against the source as totals advance.
        let start = inflate.total_out() as usize - p.produced;
        assert_eq!(&buf[..p.produced], &data[start..start + p.produced]);
        reconstructed += p.produced as u64;
        if p.status == Status::StreamEnd {
            break;
        }
    }
    assert_eq!(reconstructed, data.len() as u64);
    assert_eq!(inflate.total_in(), compressed.len() as u64);
    assert_eq!(inflate.total_out(), data.len() as u64);
}

// ─────────────────────────────────────────────────────────────────────────────
// Sync flush
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn sync_flush_makes_the_prefix_decodable() {
    let first = b"first installment of the stream; ";
    let second = b"second installment arrives later";

    let mut deflate = Deflate::new(DeflateOptions::new(6).wrapper(Wrapper::Raw)).unwrap();
    let mut buf = [0u8; 4096];

    let p1 = deflate.advance(first, &mut buf, Flush::Sync).unwrap();
    assert_eq!(p1.consumed, first.len());
    let prefix = buf[..p1.produced].to_vec();

    // The synced prefix decodes fully without the rest of the stream.
    let mut inflate = Inflate::new(Wrapper::Raw);
    let mut text = [0u8; 256];
    let d = inflate.advance(&prefix, &mut text).unwrap();
    assert_eq!(&text[..d.produced], first);

    // The session continues and the whole stream still round-trips.
    let p2 = deflate.advance(second, &mut buf, Flush::Finish).unwrap();
    assert_eq!(p2.status, Status::StreamEnd);
    let mut whole = prefix;
    whole.extend_from_slice(&buf[..p2.produced]);

    let mut expected = first.to_vec();
    expected.extend_from_slice(second);
    let output = decompress_to_vec(Wrapper::Raw, &whole, Some(expected.len())).unwrap();
    assert_eq!(output, expected);
}

#[test]
fn compressor_totals_track_both_directions() {
    let data = structured_payload();
    let mut deflate = Deflate::new(DeflateOptions::new(6)).unwrap();
    let mut out = Vec::new();
    let mut buf = [0u8; 777];
    let mut input = &data[..];
    loop {
        let p = deflate.advance(input, &mut buf, Flush::Finish).unwrap();
        input = &input[p.consumed..];
        out.extend_from_slice(&buf[..p.produced]);
        if p.status == Status::StreamEnd {
            break;
        }
    }
    assert_eq!(deflate.total_in(), data.len() as u64);
    assert_eq!(deflate.total_out(), out.len() as u64);
}
