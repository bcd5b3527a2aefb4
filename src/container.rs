//! Container wrapper layer: raw, zlib (RFC 1950), and gzip (RFC 1952)
//! envelopes around the DEFLATE payload, the worst-case output bound, and
//! the one-shot helpers.
//!
//! The wrapper layouts are byte-compatible with the reference formats:
//! zlib is a 2-byte CMF/FLG header plus a big-endian Adler-32 trailer (6
//! bytes of envelope), gzip a 10-byte header plus CRC-32 and length trailer
//! (18 bytes), so gzip output is a fixed 12 bytes larger than zlib output
//! for the same payload.

use crate::bitstream::BitWriter;
use crate::deflate::{CompressError, Deflate, DeflateOptions};
use crate::inflate::{DecompressError, Inflate};
use crate::stream::{Flush, Status};

/// Envelope format around the raw DEFLATE bit stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrapper {
    /// No envelope at all.
    Raw,
    /// 2-byte header + Adler-32 trailer.
    #[default]
    Zlib,
    /// 10-byte header + CRC-32 and modulo-2³² length trailer.
    Gzip,
}

/// Fixed envelope overhead in bytes.
pub(crate) fn overhead(wrapper: Wrapper) -> usize {
    match wrapper {
        Wrapper::Raw => 0,
        Wrapper::Zlib => 2 + 4,
        Wrapper::Gzip => 10 + 8,
    }
}

/// Write the session header at stream start.
pub(crate) fn write_header(bw: &mut BitWriter, wrapper: Wrapper, level: u8, window_bits: u8) {
    match wrapper {
        Wrapper::Raw => {}
        Wrapper::Zlib => {
            let cmf = (u16::from(window_bits) - 8) << 4 | 8;
            let flevel: u16 = match level {
                0..=1 => 0,
                2..=5 => 1,
                6 => 2,
                _ => 3,
            };
            let mut flg = flevel << 6;
            flg |= (31 - (cmf << 8 | flg) % 31) % 31;
            bw.write_bytes(&[cmf as u8, flg as u8]);
        }
        Wrapper::Gzip => {
            let xfl = match level {
                9 => 2,
                1 => 4,
                _ => 0,
            };
            // Magic, CM=8, FLG=0, MTIME=0, XFL, OS=255 (unknown) — fixed
            // fields only, so identical input always yields identical output.
            bw.write_bytes(&[0x1F, 0x8B, 8, 0, 0, 0, 0, 0, xfl, 0xFF]);
        }
    }
}

/// Write the session trailer after the final block. The writer must already
/// be byte-aligned.
pub(crate) fn write_trailer(bw: &mut BitWriter, wrapper: Wrapper, checksum: u32, length: u32) {
    match wrapper {
        Wrapper::Raw => {}
        Wrapper::Zlib => bw.write_bytes(&checksum.to_be_bytes()),
        Wrapper::Gzip => {
            bw.write_bytes(&checksum.to_le_bytes());
            bw.write_bytes(&length.to_le_bytes());
        }
    }
}

/// Upper bound on compressed size for any input of `input_len` bytes, at any
/// level and strategy, under the given wrapper.
///
/// The engine's worst case is a fixed-code block of 9-bit literals
/// (`len/8` expansion) plus per-block overhead (at most one block per 128
/// input bytes, under 2 bytes each), plus the final empty block, padding,
/// and the envelope. Each term below dominates its worst case with room to
/// spare, so the bound holds for every input, including empty and
/// incompressible ones.
pub fn compress_bound(wrapper: Wrapper, input_len: usize) -> usize {
    input_len
        .saturating_add(input_len >> 3)
        .saturating_add(input_len >> 6)
        .saturating_add(32)
        .saturating_add(overhead(wrapper))
}

/// One-shot compression: init → feed everything with finish → end.
pub fn compress_to_vec(
    wrapper: Wrapper,
    level: u8,
    input: &[u8],
) -> Result<Vec<u8>, CompressError> {
    let mut deflate = Deflate::new(DeflateOptions::new(level).wrapper(wrapper))?;
    let mut out = vec![0u8; compress_bound(wrapper, input.len())];
    let mut in_pos = 0;
    let mut out_len = 0;
    loop {
        let progress = deflate.advance(&input[in_pos..], &mut out[out_len..], Flush::Finish)?;
        in_pos += progress.consumed;
        out_len += progress.produced;
        if progress.status == Status::StreamEnd {
            break;
        }
        debug_assert!(
            progress.consumed > 0 || progress.produced > 0,
            "compress_bound must leave room to finish"
        );
    }
    out.truncate(out_len);
    Ok(out)
}

/// One-shot decompression. `expected_len`, when given, sizes the output
/// buffer exactly and is enforced against the decoded length.
pub fn decompress_to_vec(
    wrapper: Wrapper,
    input: &[u8],
    expected_len: Option<usize>,
) -> Result<Vec<u8>, DecompressError> {
    let mut inflate = Inflate::new(wrapper);
    let mut out = vec![0u8; expected_len.unwrap_or_else(|| input.len().saturating_mul(3).max(64))];
    let mut in_pos = 0;
    let mut out_len = 0;
    loop {
        let progress = inflate.advance(&input[in_pos..], &mut out[out_len..])?;
        in_pos += progress.consumed;
        out_len += progress.produced;
        match progress.status {
            Status::StreamEnd => break,
            Status::Ok if progress.consumed == 0 && progress.produced == 0 => {
                if out_len == out.len() {
                    if expected_len.is_some() {
                        return Err(DecompressError::OutputTooSmall);
                    }
                    out.resize(out.len() * 2, 0);
                } else {
                    return Err(DecompressError::Malformed("truncated stream"));
                }
            }
            Status::Ok => {}
        }
    }
    out.truncate(out_len);
    if let Some(expected) = expected_len {
        if out.len() != expected {
            return Err(DecompressError::LengthMismatch {
                stored: expected as u32,
                produced: out.len() as u32,
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zlib_header_is_the_familiar_78xx_pair() {
        let mut bw = BitWriter::new();
        write_header(&mut bw, Wrapper::Zlib, 6, 15);
        let mut out = [0u8; 4];
        assert_eq!(bw.drain_into(&mut out), 2);
        assert_eq!(out[0], 0x78);
        // Header check: the 16-bit value must be a multiple of 31.
        assert_eq!((u16::from(out[0]) << 8 | u16::from(out[1])) % 31, 0);
        assert_eq!(out[1], 0x9C);
    }

    #[test]
    fn zlib_header_checks_hold_for_all_parameters() {
        for level in 0..=9u8 {
            for bits in 9..=15u8 {
                let mut bw = BitWriter::new();
                write_header(&mut bw, Wrapper::Zlib, level, bits);
                let mut out = [0u8; 4];
                assert_eq!(bw.drain_into(&mut out), 2);
                assert_eq!((u16::from(out[0]) << 8 | u16::from(out[1])) % 31, 0);
                assert_eq!(out[0] & 0x0F, 8);
                assert_eq!(out[0] >> 4, bits - 8);
            }
        }
    }

    #[test]
    fn gzip_header_layout() {
        let mut bw = BitWriter::new();
        write_header(&mut bw, Wrapper::Gzip, 9, 15);
        let mut out = [0u8; 16];
        assert_eq!(bw.drain_into(&mut out), 10);
        assert_eq!(&out[..4], &[0x1F, 0x8B, 8, 0]);
        assert_eq!(out[8], 2); // XFL: best compression
        assert_eq!(out[9], 0xFF); // OS: unknown
    }

    #[test]
    fn bound_is_monotonic_and_covers_the_envelope() {
        for len in [0usize, 1, 100, 65_535, 1 << 20] {
            let raw = compress_bound(Wrapper::Raw, len);
            let zlib = compress_bound(Wrapper::Zlib, len);
            let gzip = compress_bound(Wrapper::Gzip, len);
            assert!(raw >= len + 2);
            assert!(zlib >= raw + 6);
            assert!(gzip >= zlib + 12);
        }
    }

    #[test]
    fn one_shot_round_trip_all_wrappers() {
        let input = b"one-shot helpers drive init, finish and end in a single call";
        for wrapper in [Wrapper::Raw, Wrapper::Zlib, Wrapper::Gzip] {
            let compressed = compress_to_vec(wrapper, 6, input).unwrap();
            assert!(compressed.len() <= compress_bound(wrapper, input.len()));
            let output = decompress_to_vec(wrapper, &compressed, Some(input.len())).unwrap();
            assert_eq!(output, input);
        }
    }

    #[test]
    fn gzip_output_is_twelve_bytes_larger_than_zlib() {
        let input = b"the payload bits are identical across wrappers".repeat(4);
        let zlib = compress_to_vec(Wrapper::Zlib, 6, &input).unwrap();
        let gzip = compress_to_vec(Wrapper::Gzip, 6, &input).unwrap();
        let raw = compress_to_vec(Wrapper::Raw, 6, &input).unwrap();
        assert_eq!(gzip.len(), zlib.len() + 12);
        assert_eq!(zlib.len(), raw.len() + 6);
    }

    #[test]
    fn wrong_expected_length_is_reported() {
        let input = b"sized exactly";
        let compressed = compress_to_vec(Wrapper::Zlib, 6, input).unwrap();
        let err = decompress_to_vec(Wrapper::Zlib, &compressed, Some(input.len() + 10));
        assert!(matches!(
            err.unwrap_err(),
            DecompressError::LengthMismatch { .. }
        ));
    }

    #[test]
    fn decompress_without_size_hint_grows_as_needed() {
        let input = vec![7u8; 200_000];
        let compressed = compress_to_vec(Wrapper::Zlib, 9, &input).unwrap();
        assert!(compressed.len() < input.len() / 100);
        let output = decompress_to_vec(Wrapper::Zlib, &compressed, None).unwrap();
        assert_eq!(output, input);
    }
}
