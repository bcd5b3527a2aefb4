//! Token accumulation and block emission.
//!
//! Tokens (literals and back-references) collect in a bounded buffer with
//! running symbol frequencies. When the buffer fills, a flush point is
//! requested, or the stream finishes, the block is emitted in whichever of
//! the three encodings (RFC 1951 §3.2.3) costs the fewest bits:
//!
//! - **stored** — raw copy, only when the block's bytes are still window
//!   resident and the span fits a stored block;
//! - **fixed** — the predefined code tables, no header;
//! - **dynamic** — per-block tables from observed frequencies, transmitted
//!   via the run-length-coded code-length alphabet (§3.2.7).
//!
//! Selection is an exact bit count, so the same token sequence always picks
//! the same encoding.

use crate::bitstream::{reverse_bits, BitWriter};
use crate::huffman::{
    build_lengths, canonical_codes, fixed_dist_lengths, fixed_litlen_lengths, Code,
    MAX_CODE_BITS, MAX_CODE_LEN_BITS,
};

use super::types::{MAX_MATCH, MIN_MATCH};

/// Literal/length alphabet size actually encodable (symbols 286/287 are
/// reserved).
pub(crate) const L_CODES: usize = 286;
/// Distance alphabet size.
pub(crate) const D_CODES: usize = 30;
/// Code-length alphabet size.
pub(crate) const BL_CODES: usize = 19;
/// End-of-block symbol.
pub(crate) const EOB: usize = 256;
/// Largest stored-block payload.
pub(crate) const STORED_MAX: usize = 65_535;

/// First match length of each length symbol 257..=285 (RFC 1951 §3.2.5).
const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// First distance of each distance symbol 0..=29.
const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Transmission order of code-length code lengths (RFC 1951 §3.2.7).
const CODE_LEN_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Length (3..=258) to `(symbol, extra_bits, extra_value)`.
#[inline]
fn length_to_symbol(length: usize) -> (usize, u8, u32) {
    debug_assert!((MIN_MATCH..=MAX_MATCH).contains(&length));
    let mut idx = 28;
    for i in 0..28 {
        if length < usize::from(LENGTH_BASE[i + 1]) {
            idx = i;
            break;
        }
    }
    (
        257 + idx,
        LENGTH_EXTRA[idx],
        (length - usize::from(LENGTH_BASE[idx])) as u32,
    )
}

/// Distance (1..=32768) to `(symbol, extra_bits, extra_value)`.
#[inline]
fn dist_to_symbol(dist: usize) -> (usize, u8, u32) {
    debug_assert!((1..=32_768).contains(&dist));
    let mut idx = 29;
    for i in 0..29 {
        if dist < usize::from(DIST_BASE[i + 1]) {
            idx = i;
            break;
        }
    }
    (idx, DIST_EXTRA[idx], (dist - usize::from(DIST_BASE[idx])) as u32)
}

/// One literal or back-reference. `dist == 0` marks a literal carried in
/// `val`; otherwise `val` is the match length.
#[derive(Debug, Clone, Copy)]
struct Token {
    dist: u16,
    val: u16,
}

/// Bounded token buffer with running frequencies for one block.
#[derive(Debug)]
pub(crate) struct TokenBuffer {
    tokens: Vec<Token>,
    capacity: usize,
    lit_freq: [u32; L_CODES],
    dist_freq: [u32; D_CODES],
}

impl TokenBuffer {
    pub fn new(mem_level: u8) -> Self {
        let capacity = 1usize << (mem_level + 6);
        Self {
            tokens: Vec::with_capacity(capacity),
            capacity,
            lit_freq: [0; L_CODES],
            dist_freq: [0; D_CODES],
        }
    }

    /// Append a literal; returns true when the buffer is now full.
    #[inline]
    pub fn push_literal(&mut self, byte: u8) -> bool {
        self.lit_freq[usize::from(byte)] += 1;
        self.tokens.push(Token {
            dist: 0,
            val: u16::from(byte),
        });
        self.tokens.len() == self.capacity
    }

    /// Append a back-reference; returns true when the buffer is now full.
    #[inline]
    pub fn push_match(&mut self, length: usize, dist: usize) -> bool {
        let (lsym, _, _) = length_to_symbol(length);
        let (dsym, _, _) = dist_to_symbol(dist);
        self.lit_freq[lsym] += 1;
        self.dist_freq[dsym] += 1;
        self.tokens.push(Token {
            dist: dist as u16,
            val: length as u16,
        });
        self.tokens.len() == self.capacity
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Emit the buffered block and reset for the next one.
    ///
    /// `stored` carries the block's raw bytes when they are still window
    /// resident, enabling the stored encoding.
    pub fn flush_block(&mut self, bw: &mut BitWriter, stored: Option<&[u8]>, last: bool) {
        let mut lit_freq = self.lit_freq;
        lit_freq[EOB] += 1;

        let dyn_lit_lengths = build_lengths(&lit_freq, MAX_CODE_BITS);
        let dyn_dist_lengths = build_lengths(&self.dist_freq, MAX_CODE_BITS);

        let hlit = last_coded(&dyn_lit_lengths).max(257);
        let hdist = last_coded(&dyn_dist_lengths).max(1);

        let cl_syms = run_length_encode(&dyn_lit_lengths[..hlit], &dyn_dist_lengths[..hdist]);
        let mut bl_freq = [0u32; BL_CODES];
        for sym in &cl_syms {
            bl_freq[sym.code()] += 1;
        }
        let bl_lengths = build_lengths(&bl_freq, MAX_CODE_LEN_BITS);
        let mut hclen = BL_CODES;
        while hclen > 4 && bl_lengths[CODE_LEN_ORDER[hclen - 1]] == 0 {
            hclen -= 1;
        }

        // Exact body costs. Extra bits are identical for every Huffman
        // encoding; headers are what differ.
        let extra_bits: u64 = (257..L_CODES)
            .map(|s| u64::from(lit_freq[s]) * u64::from(LENGTH_EXTRA[s - 257]))
            .sum::<u64>()
            + (0..D_CODES)
                .map(|d| u64::from(self.dist_freq[d]) * u64::from(DIST_EXTRA[d]))
                .sum::<u64>();

        let fixed_lit = fixed_litlen_lengths();
        let fixed_dist = fixed_dist_lengths();
        let static_bits: u64 = body_bits(&lit_freq, &self.dist_freq, &fixed_lit, &fixed_dist)
            + extra_bits;
        let dynamic_body: u64 =
            body_bits(&lit_freq, &self.dist_freq, &dyn_lit_lengths, &dyn_dist_lengths)
                + extra_bits;
        let dynamic_header: u64 = 5
            + 5
            + 4
            + 3 * hclen as u64
            + cl_syms
                .iter()
                .map(|sym| u64::from(bl_lengths[sym.code()]) + u64::from(sym.extra_bits()))
                .sum::<u64>();
        let dynamic_bits = dynamic_header + dynamic_body;

        let huffman_bits = static_bits.min(dynamic_bits);
        // Stored cost counts worst-case padding so the comparison never
        // depends on the current bit phase.
        let stored_bits = stored
            .filter(|bytes| bytes.len() <= STORED_MAX)
            .map(|bytes| 7 + 32 + 8 * bytes.len() as u64);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            tokens = self.tokens.len(),
            static_bits,
            dynamic_bits,
            stored_bits,
            last,
            "flushing block"
        );

        match stored_bits {
            Some(sbits) if sbits <= huffman_bits + 3 => {
                emit_stored_block(bw, stored.unwrap_or(&[]), last);
            }
            _ if static_bits <= dynamic_bits => {
                bw.write_bits(u32::from(last), 1);
                bw.write_bits(0b01, 2);
                let lit_codes = crate::huffman::fixed_litlen_codes();
                let dist_codes = crate::huffman::fixed_dist_codes();
                self.emit_tokens(bw, lit_codes, dist_codes);
            }
            _ => {
                bw.write_bits(u32::from(last), 1);
                bw.write_bits(0b10, 2);
                bw.write_bits((hlit - 257) as u32, 5);
                bw.write_bits((hdist - 1) as u32, 5);
                bw.write_bits((hclen - 4) as u32, 4);
                for &slot in CODE_LEN_ORDER.iter().take(hclen) {
                    bw.write_bits(u32::from(bl_lengths[slot]), 3);
                }
                let bl_codes = canonical_codes(&bl_lengths);
                for sym in &cl_syms {
                    write_code(bw, bl_codes[sym.code()]);
                    let extra = sym.extra_bits();
                    if extra > 0 {
                        bw.write_bits(sym.extra_value(), u32::from(extra));
                    }
                }
                let lit_codes = canonical_codes(&dyn_lit_lengths);
                let dist_codes = canonical_codes(&dyn_dist_lengths);
                self.emit_tokens(bw, &lit_codes, &dist_codes);
            }
        }

        self.tokens.clear();
        self.lit_freq = [0; L_CODES];
        self.dist_freq = [0; D_CODES];
    }

    fn emit_tokens(&self, bw: &mut BitWriter, lit_codes: &[Code], dist_codes: &[Code]) {
        for tok in &self.tokens {
            if tok.dist == 0 {
                write_code(bw, lit_codes[usize::from(tok.val)]);
            } else {
                let (lsym, lbits, lval) = length_to_symbol(usize::from(tok.val));
                write_code(bw, lit_codes[lsym]);
                if lbits > 0 {
                    bw.write_bits(lval, u32::from(lbits));
                }
                let (dsym, dbits, dval) = dist_to_symbol(usize::from(tok.dist));
                write_code(bw, dist_codes[dsym]);
                if dbits > 0 {
                    bw.write_bits(dval, u32::from(dbits));
                }
            }
        }
        write_code(bw, lit_codes[EOB]);
    }
}

/// Emit a stored block: 3-bit header, pad to the byte boundary, LEN/NLEN,
/// raw payload (RFC 1951 §3.2.4). `bytes` must be ≤ [`STORED_MAX`].
pub(crate) fn emit_stored_block(bw: &mut BitWriter, bytes: &[u8], last: bool) {
    debug_assert!(bytes.len() <= STORED_MAX);
    bw.write_bits(u32::from(last), 1);
    bw.write_bits(0b00, 2);
    bw.align_byte();
    let len = bytes.len() as u16;
    bw.write_bytes(&len.to_le_bytes());
    bw.write_bytes(&(!len).to_le_bytes());
    bw.write_bytes(bytes);
}

#[inline]
fn write_code(bw: &mut BitWriter, code: Code) {
    debug_assert!(code.len > 0, "emitting a symbol with no code");
    bw.write_bits(u32::from(reverse_bits(code.bits, code.len)), u32::from(code.len));
}

/// Index one past the last coded symbol.
fn last_coded(lengths: &[u8]) -> usize {
    lengths
        .iter()
        .rposition(|&l| l > 0)
        .map(|i| i + 1)
        .unwrap_or(0)
}

fn body_bits(
    lit_freq: &[u32; L_CODES],
    dist_freq: &[u32; D_CODES],
    lit_lengths: &[u8],
    dist_lengths: &[u8],
) -> u64 {
    let lits: u64 = lit_freq
        .iter()
        .zip(lit_lengths)
        .map(|(&f, &l)| u64::from(f) * u64::from(l))
        .sum();
    let dists: u64 = dist_freq
        .iter()
        .zip(dist_lengths)
        .map(|(&f, &l)| u64::from(f) * u64::from(l))
        .sum();
    lits + dists
}

// ─────────────────────────────────────────────────────────────────────────────
// Code-length run-length encoding (RFC 1951 §3.2.7)
// ─────────────────────────────────────────────────────────────────────────────

/// One symbol of the code-length alphabet with its repeat payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClSym {
    /// A literal code length 0..=15.
    Len(u8),
    /// Symbol 16: repeat the previous length 3..=6 times.
    Repeat(u8),
    /// Symbol 17: 3..=10 zeros.
    ZeroShort(u8),
    /// Symbol 18: 11..=138 zeros.
    ZeroLong(u8),
}

impl ClSym {
    #[inline]
    pub fn code(&self) -> usize {
        match self {
            ClSym::Len(l) => usize::from(*l),
            ClSym::Repeat(_) => 16,
            ClSym::ZeroShort(_) => 17,
            ClSym::ZeroLong(_) => 18,
        }
    }

    #[inline]
    pub fn extra_bits(&self) -> u8 {
        match self {
            ClSym::Len(_) => 0,
            ClSym::Repeat(_) => 2,
            ClSym::ZeroShort(_) => 3,
            ClSym::ZeroLong(_) => 7,
        }
    }

    #[inline]
    pub fn extra_value(&self) -> u32 {
        match self {
            ClSym::Len(_) => 0,
            ClSym::Repeat(n) => u32::from(*n) - 3,
            ClSym::ZeroShort(n) => u32::from(*n) - 3,
            ClSym::ZeroLong(n) => u32::from(*n) - 11,
        }
    }
}

/// Run-length encode the concatenated literal/length and distance code
/// lengths. Repeats never cross the boundary between the two tables.
pub(crate) fn run_length_encode(lit: &[u8], dist: &[u8]) -> Vec<ClSym> {
    let mut out = Vec::with_capacity(lit.len() + dist.len());
    encode_table(&mut out, lit);
    encode_table(&mut out, dist);
    out
}

fn encode_table(out: &mut Vec<ClSym>, lengths: &[u8]) {
    let mut i = 0;
    while i < lengths.len() {
        let len = lengths[i];
        let mut run = 1;
        while i + run < lengths.len() && lengths[i + run] == len {
            run += 1;
        }
        if len == 0 {
            push_zero_run(out, run);
        } else {
            push_len_run(out, len, run);
        }
        i += run;
    }
}

fn push_zero_run(out: &mut Vec<ClSym>, mut run: usize) {
    while run > 0 {
        if run < 3 {
            for _ in 0..run {
                out.push(ClSym::Len(0));
            }
            return;
        }
        if run <= 10 {
            out.push(ClSym::ZeroShort(run as u8));
            return;
        }
        // Take a long-zero chunk but never strand a remainder of 1 or 2.
        let take = if run > 138 {
            let rem = run - 138;
            if rem < 3 { 138 - (3 - rem) } else { 138 }
        } else {
            run
        };
        out.push(ClSym::ZeroLong(take as u8));
        run -= take;
    }
}

fn push_len_run(out: &mut Vec<ClSym>, len: u8, mut run: usize) {
    out.push(ClSym::Len(len));
    run -= 1;
    while run > 0 {
        if run < 3 {
            for _ in 0..run {
                out.push(ClSym::Len(len));
            }
            return;
        }
        let take = if run > 6 {
            let rem = run - 6;
            if rem < 3 { 6 - (3 - rem) } else { 6 }
        } else {
            run
        };
        out.push(ClSym::Repeat(take as u8));
        run -= take;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(syms: &[ClSym]) -> Vec<u8> {
        let mut out = Vec::new();
        for sym in syms {
            match sym {
                ClSym::Len(l) => out.push(*l),
                ClSym::Repeat(n) => {
                    let prev = *out.last().expect("repeat requires a previous length");
                    out.extend(std::iter::repeat(prev).take(usize::from(*n)));
                }
                ClSym::ZeroShort(n) | ClSym::ZeroLong(n) => {
                    out.extend(std::iter::repeat(0u8).take(usize::from(*n)));
                }
            }
        }
        out
    }

    fn check_rle(lit: &[u8], dist: &[u8]) {
        let syms = run_length_encode(lit, dist);
        let mut expected = lit.to_vec();
        expected.extend_from_slice(dist);
        assert_eq!(expand(&syms), expected);
        for sym in &syms {
            match sym {
                ClSym::Repeat(n) => assert!((3..=6).contains(n)),
                ClSym::ZeroShort(n) => assert!((3..=10).contains(n)),
                ClSym::ZeroLong(n) => assert!((11..=138).contains(n)),
                ClSym::Len(l) => assert!(*l <= 15),
            }
        }
    }

    #[test]
    fn rle_round_trips_representative_tables() {
        check_rle(&[8, 8, 8, 8, 9, 9, 7, 0, 0, 0, 0, 5], &[5, 5, 5, 0]);
        check_rle(&[0; 140], &[0; 30]);
        check_rle(&[0; 139], &[1]);
        check_rle(&[3; 7], &[3; 2]);
        check_rle(&[1, 2, 3, 4, 5], &[]);
        check_rle(&vec![6u8; 257], &vec![4u8; 19]);
    }

    #[test]
    fn zero_runs_never_strand_short_remainders() {
        for run in 1..=300usize {
            let lengths = vec![0u8; run];
            check_rle(&lengths, &[]);
        }
        for run in 1..=40usize {
            let lengths = vec![9u8; run];
            check_rle(&lengths, &[]);
        }
    }

    #[test]
    fn length_symbol_boundaries() {
        assert_eq!(length_to_symbol(3), (257, 0, 0));
        assert_eq!(length_to_symbol(10), (264, 0, 0));
        assert_eq!(length_to_symbol(11), (265, 1, 0));
        assert_eq!(length_to_symbol(12), (265, 1, 1));
        assert_eq!(length_to_symbol(258), (285, 0, 0));
    }

    #[test]
    fn dist_symbol_boundaries() {
        assert_eq!(dist_to_symbol(1), (0, 0, 0));
        assert_eq!(dist_to_symbol(4), (3, 0, 0));
        assert_eq!(dist_to_symbol(5), (4, 1, 0));
        assert_eq!(dist_to_symbol(6), (4, 1, 1));
        assert_eq!(dist_to_symbol(24_577), (29, 13, 0));
        assert_eq!(dist_to_symbol(32_768), (29, 13, 8191));
    }

    #[test]
    fn stored_block_layout() {
        let mut bw = BitWriter::new();
        emit_stored_block(&mut bw, b"hello", true);
        let mut out = [0u8; 16];
        let n = bw.drain_into(&mut out);
        // BFINAL=1, BTYPE=00, padded; LEN=5 LE, NLEN=!5 LE, payload.
        assert_eq!(&out[..n], &[0x01, 0x05, 0x00, 0xFA, 0xFF, b'h', b'e', b'l', b'l', b'o']);
    }

    #[test]
    fn empty_final_block_is_the_classic_two_bytes() {
        // Fixed block containing only end-of-block: 3 + 7 bits -> 0x03 0x00.
        let mut buf = TokenBuffer::new(8);
        let mut bw = BitWriter::new();
        buf.flush_block(&mut bw, Some(&[]), true);
        bw.align_byte();
        let mut out = [0u8; 8];
        let n = bw.drain_into(&mut out);
        assert_eq!(&out[..n], &[0x03, 0x00]);
    }

    #[test]
    fn buffer_reports_full_at_capacity() {
        let mut buf = TokenBuffer::new(1);
        let cap = 1usize << 7;
        for i in 0..cap - 1 {
            assert!(!buf.push_literal(i as u8), "filled early at {i}");
        }
        assert!(buf.push_literal(0));
    }
}
