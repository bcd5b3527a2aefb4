//! Decompression state machine.
//!
//! [`Inflate`] is a resumable stage machine over a 64-bit accumulator: each
//! `advance` call decodes as many symbols as the provided input and output
//! slices allow, then parks in the current stage. Any multi-bit field is
//! consumed atomically (symbol plus extra bits), so the machine never holds
//! half a decision across calls — this is what makes one-byte-of-input,
//! one-byte-of-output driving safe.
//!
//! The decoder owns a 32 KiB history window independent of the caller's
//! output buffers. Back-references copy byte-by-byte in forward order through
//! the window, which reproduces the RFC 1951 §3.2.3 overlap semantics
//! (`distance < length` repeats the run) by construction.

use crate::bitstream::BitReader;
use crate::checksum::{Adler32State, Crc32State, RollingChecksum};
use crate::container::Wrapper;
use crate::deflate::decode_window_bits;
use crate::huffman::{fixed_dist_table, fixed_litlen_table, DecodeTable, Decoded};
use crate::stream::{Progress, Status};

use super::types::{DecompressError, Stage};

/// History window size; the format's distances never exceed it.
const WINDOW_SIZE: usize = 32_768;
const WINDOW_MASK: usize = WINDOW_SIZE - 1;

const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

const CODE_LEN_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Gzip FLG bits (RFC 1952 §2.3.1).
const FHCRC: u8 = 0x02;
const FEXTRA: u8 = 0x04;
const FNAME: u8 = 0x08;
const FCOMMENT: u8 = 0x10;
const FRESERVED: u8 = 0xE0;

/// Streaming decompressor. Create with [`Inflate::new`], drive with
/// [`Inflate::advance`]; dropping the value releases the window.
#[derive(Debug)]
pub struct Inflate {
    wrapper: Wrapper,
    stage: Stage,
    bits: BitReader,
    window: Vec<u8>,
    wpos: usize,
    checksum: RollingChecksum,
    total_in: u64,
    total_out: u64,
    final_block: bool,
    gzip_flags: u8,
    /// Per-stage progress counter (header bytes read, code lengths read).
    field_got: usize,
    skip_remaining: usize,
    stored_remaining: usize,
    hlit: usize,
    hdist: usize,
    hclen: usize,
    cl_lengths: [u8; 19],
    code_lengths: Vec<u8>,
    lengths_got: usize,
    cl_table: Option<DecodeTable>,
    lit_table: Option<DecodeTable>,
    dist_table: Option<DecodeTable>,
    fixed_block: bool,
    /// Match length decoded while the distance is still pending.
    seq_len: usize,
    copy_len: usize,
    copy_dist: usize,
    trailer: [u8; 8],
    trailer_got: usize,
}

impl Inflate {
    /// Start a decompression session for the given wrapper kind.
    pub fn new(wrapper: Wrapper) -> Self {
        let (stage, checksum) = match wrapper {
            Wrapper::Raw => (Stage::BlockHeader, RollingChecksum::None),
            Wrapper::Zlib => (
                Stage::ZlibHeader,
                RollingChecksum::Adler32(Adler32State::new()),
            ),
            Wrapper::Gzip => (
                Stage::GzipFixedHeader,
                RollingChecksum::Crc32(Crc32State::new()),
            ),
        };
        Self {
            wrapper,
            stage,
            bits: BitReader::new(),
            window: vec![0u8; WINDOW_SIZE],
            wpos: 0,
            checksum,
            total_in: 0,
            total_out: 0,
            final_block: false,
            gzip_flags: 0,
            field_got: 0,
            skip_remaining: 0,
            stored_remaining: 0,
            hlit: 0,
            hdist: 0,
            hclen: 0,
            cl_lengths: [0; 19],
            code_lengths: Vec::new(),
            lengths_got: 0,
            cl_table: None,
            lit_table: None,
            dist_table: None,
            fixed_block: false,
            seq_len: 0,
            copy_len: 0,
            copy_dist: 0,
            trailer: [0; 8],
            trailer_got: 0,
        }
    }

    /// Legacy window-bits constructor; the sign/offset selects the wrapper.
    /// The decoder always keeps a full 32 KiB of history, which accepts any
    /// stream a smaller-window compressor can produce.
    pub fn from_window_bits(bits: i32) -> Result<Self, DecompressError> {
        let (wrapper, _) = decode_window_bits(bits)
            .ok_or(DecompressError::InvalidParameters("window_bits out of range"))?;
        Ok(Self::new(wrapper))
    }

    /// Total compressed bytes consumed across the session (including bits
    /// buffered but not yet decoded).
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Total bytes reconstructed across the session.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Consume a prefix of `input`, fill a prefix of `output`. Both slices
    /// may be arbitrarily small, down to one byte or empty.
    pub fn advance(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<Progress, DecompressError> {
        let mut in_pos = 0usize;
        let mut out_pos = 0usize;
        let result = self.run(input, output, &mut in_pos, &mut out_pos);
        self.total_in += in_pos as u64;
        self.total_out += out_pos as u64;
        result?;
        Ok(Progress {
            consumed: in_pos,
            produced: out_pos,
            status: if self.stage == Stage::Done {
                Status::StreamEnd
            } else {
                Status::Ok
            },
        })
    }

    fn run(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        in_pos: &mut usize,
        out_pos: &mut usize,
    ) -> Result<(), DecompressError> {
        'outer: loop {
            match self.stage {
                Stage::Done => break 'outer,

                Stage::ZlibHeader => {
                    if !self.bits.refill(input, in_pos, 16) {
                        break 'outer;
                    }
                    let cmf = self.bits.take(8) as u16;
                    let flg = self.bits.take(8) as u16;
                    if cmf & 0x0F != 8 {
                        return Err(DecompressError::Malformed(
                            "unsupported compression method",
                        ));
                    }
                    if cmf >> 4 > 7 {
                        return Err(DecompressError::Malformed("window size too large"));
                    }
                    if (cmf << 8 | flg) % 31 != 0 {
                        return Err(DecompressError::Malformed("zlib header check failed"));
                    }
                    if flg & 0x20 != 0 {
                        return Err(DecompressError::Malformed(
                            "preset dictionary not supported",
                        ));
                    }
                    self.stage = Stage::BlockHeader;
                }

                Stage::GzipFixedHeader => {
                    while self.field_got < 10 {
                        if !self.bits.refill(input, in_pos, 8) {
                            break 'outer;
                        }
                        let byte = self.bits.take(8) as u8;
                        match self.field_got {
                            0 if byte != 0x1F => {
                                return Err(DecompressError::Malformed("bad gzip magic"));
                            }
                            1 if byte != 0x8B => {
                                return Err(DecompressError::Malformed("bad gzip magic"));
                            }
                            2 if byte != 8 => {
                                return Err(DecompressError::Malformed(
                                    "unsupported compression method",
                                ));
                            }
                            3 => {
                                if byte & FRESERVED != 0 {
                                    return Err(DecompressError::Malformed(
                                        "reserved gzip flag set",
                                    ));
                                }
                                self.gzip_flags = byte;
                            }
                            // MTIME, XFL, OS carry no decoding obligations.
                            _ => {}
                        }
                        self.field_got += 1;
                    }
                    self.field_got = 0;
                    self.after_gzip_fixed();
                }

                Stage::GzipExtraLen => {
                    if !self.bits.refill(input, in_pos, 16) {
                        break 'outer;
                    }
                    self.skip_remaining = self.bits.take(16) as usize;
                    self.stage = Stage::GzipExtra;
                }

                Stage::GzipExtra => {
                    while self.skip_remaining > 0 {
                        if !self.bits.refill(input, in_pos, 8) {
                            break 'outer;
                        }
                        self.bits.take(8);
                        self.skip_remaining -= 1;
                    }
                    self.after_gzip_extra();
                }

                Stage::GzipName | Stage::GzipComment => {
                    loop {
                        if !self.bits.refill(input, in_pos, 8) {
                            break 'outer;
                        }
                        if self.bits.take(8) == 0 {
                            break;
                        }
                    }
                    if self.stage == Stage::GzipName {
                        self.after_gzip_name();
                    } else {
                        self.after_gzip_comment();
                    }
                }

                Stage::GzipHeaderCrc => {
                    while self.skip_remaining > 0 {
                        if !self.bits.refill(input, in_pos, 8) {
                            break 'outer;
                        }
                        self.bits.take(8);
                        self.skip_remaining -= 1;
                    }
                    self.stage = Stage::BlockHeader;
                }

                Stage::BlockHeader => {
                    if !self.bits.refill(input, in_pos, 3) {
                        break 'outer;
                    }
                    self.final_block = self.bits.take(1) == 1;
                    match self.bits.take(2) {
                        0 => {
                            self.bits.align_byte();
                            self.stage = Stage::StoredLen;
                        }
                        1 => {
                            self.fixed_block = true;
                            self.stage = Stage::BlockSymbol;
                        }
                        2 => self.stage = Stage::DynHeader,
                        _ => return Err(DecompressError::Malformed("reserved block type")),
                    }
                }

                Stage::StoredLen => {
                    if !self.bits.refill(input, in_pos, 32) {
                        break 'outer;
                    }
                    let len = self.bits.take(16);
                    let nlen = self.bits.take(16);
                    if len != !nlen & 0xFFFF {
                        return Err(DecompressError::Malformed("stored length check failed"));
                    }
                    self.stored_remaining = len as usize;
                    self.stage = Stage::StoredCopy;
                }

                Stage::StoredCopy => {
                    while self.stored_remaining > 0 {
                        if *out_pos == output.len() {
                            break 'outer;
                        }
                        let byte = if self.bits.count() >= 8 {
                            self.bits.take(8) as u8
                        } else if *in_pos < input.len() {
                            let byte = input[*in_pos];
                            *in_pos += 1;
                            byte
                        } else {
                            break 'outer;
                        };
                        self.write_byte(byte, output, out_pos);
                        self.stored_remaining -= 1;
                    }
                    self.end_of_block();
                }

                Stage::DynHeader => {
                    if !self.bits.refill(input, in_pos, 14) {
                        break 'outer;
                    }
                    self.hlit = self.bits.take(5) as usize + 257;
                    self.hdist = self.bits.take(5) as usize + 1;
                    self.hclen = self.bits.take(4) as usize + 4;
                    if self.hlit > 286 || self.hdist > 30 {
                        return Err(DecompressError::Malformed(
                            "too many length or distance codes",
                        ));
                    }
                    self.cl_lengths = [0; 19];
                    self.field_got = 0;
                    self.stage = Stage::DynCodeLenCodes;
                }

                Stage::DynCodeLenCodes => {
                    while self.field_got < self.hclen {
                        if !self.bits.refill(input, in_pos, 3) {
                            break 'outer;
                        }
                        self.cl_lengths[CODE_LEN_ORDER[self.field_got]] = self.bits.take(3) as u8;
                        self.field_got += 1;
                    }
                    let table = DecodeTable::from_lengths(&self.cl_lengths, false).map_err(
                        |_| DecompressError::Malformed("invalid code-length code lengths"),
                    )?;
                    self.cl_table = Some(table);
                    self.code_lengths = vec![0u8; self.hlit + self.hdist];
                    self.lengths_got = 0;
                    self.stage = Stage::DynCodeLens;
                }

                Stage::DynCodeLens => {
                    let total = self.hlit + self.hdist;
                    while self.lengths_got < total {
                        let table = self.cl_table.as_ref().expect("built on stage entry");
                        let decoded = table.decode(self.bits.peek(), self.bits.count());
                        let (sym, len) = match decoded {
                            Decoded::Symbol { sym, len } => (sym, u32::from(len)),
                            Decoded::NeedMoreBits => {
                                if !self.bits.refill_one(input, in_pos) {
                                    break 'outer;
                                }
                                continue;
                            }
                            Decoded::Invalid => {
                                return Err(DecompressError::Malformed(
                                    "invalid code-length code",
                                ));
                            }
                        };
                        let extra = match sym {
                            16 => 2,
                            17 => 3,
                            18 => 7,
                            _ => 0,
                        };
                        if self.bits.count() < len + extra {
                            if !self.bits.refill_one(input, in_pos) {
                                break 'outer;
                            }
                            continue;
                        }
                        self.bits.take(len);
                        let ev = self.bits.take(extra) as usize;
                        match sym {
                            0..=15 => {
                                self.code_lengths[self.lengths_got] = sym as u8;
                                self.lengths_got += 1;
                            }
                            16 => {
                                if self.lengths_got == 0 {
                                    return Err(DecompressError::Malformed(
                                        "length repeat with no previous length",
                                    ));
                                }
                                let prev = self.code_lengths[self.lengths_got - 1];
                                self.repeat_length(prev, 3 + ev, total)?;
                            }
                            17 => self.repeat_length(0, 3 + ev, total)?,
                            18 => self.repeat_length(0, 11 + ev, total)?,
                            _ => {
                                return Err(DecompressError::Malformed(
                                    "invalid code-length code",
                                ));
                            }
                        }
                    }
                    let lit = DecodeTable::from_lengths(&self.code_lengths[..self.hlit], true)
                        .map_err(|_| {
                            DecompressError::Malformed("invalid literal/length code lengths")
                        })?;
                    let dist = DecodeTable::from_lengths(&self.code_lengths[self.hlit..], true)
                        .map_err(|_| {
                            DecompressError::Malformed("invalid distance code lengths")
                        })?;
                    self.lit_table = Some(lit);
                    self.dist_table = Some(dist);
                    self.fixed_block = false;
                    self.stage = Stage::BlockSymbol;
                }

                Stage::BlockSymbol => {
                    let table = if self.fixed_block {
                        fixed_litlen_table()
                    } else {
                        self.lit_table.as_ref().expect("built at block start")
                    };
                    let decoded = table.decode(self.bits.peek(), self.bits.count());
                    match decoded {
                        Decoded::NeedMoreBits => {
                            if !self.bits.refill_one(input, in_pos) {
                                break 'outer;
                            }
                        }
                        Decoded::Invalid => {
                            return Err(DecompressError::Malformed(
                                "invalid literal/length code",
                            ));
                        }
                        Decoded::Symbol { sym, len } => {
                            let len = u32::from(len);
                            if sym < 256 {
                                if *out_pos == output.len() {
                                    break 'outer;
                                }
                                self.bits.take(len);
                                self.write_byte(sym as u8, output, out_pos);
                            } else if sym == 256 {
                                self.bits.take(len);
                                self.end_of_block();
                            } else if sym <= 285 {
                                let idx = usize::from(sym) - 257;
                                let extra = u32::from(LENGTH_EXTRA[idx]);
                                if self.bits.count() < len + extra {
                                    if !self.bits.refill_one(input, in_pos) {
                                        break 'outer;
                                    }
                                    continue;
                                }
                                self.bits.take(len);
                                self.seq_len = usize::from(LENGTH_BASE[idx])
                                    + self.bits.take(extra) as usize;
                                self.stage = Stage::BlockDist;
                            } else {
                                return Err(DecompressError::Malformed(
                                    "invalid literal/length code",
                                ));
                            }
                        }
                    }
                }

                Stage::BlockDist => {
                    let table = if self.fixed_block {
                        fixed_dist_table()
                    } else {
                        self.dist_table.as_ref().expect("built at block start")
                    };
                    let decoded = table.decode(self.bits.peek(), self.bits.count());
                    match decoded {
                        Decoded::NeedMoreBits => {
                            if !self.bits.refill_one(input, in_pos) {
                                break 'outer;
                            }
                        }
                        Decoded::Invalid => {
                            return Err(DecompressError::Malformed("invalid distance code"));
                        }
                        Decoded::Symbol { sym, len } => {
                            if sym > 29 {
                                return Err(DecompressError::Malformed("invalid distance code"));
                            }
                            let len = u32::from(len);
                            let idx = usize::from(sym);
                            let extra = u32::from(DIST_EXTRA[idx]);
                            if self.bits.count() < len + extra {
                                if !self.bits.refill_one(input, in_pos) {
                                    break 'outer;
                                }
                                continue;
                            }
                            self.bits.take(len);
                            let dist =
                                usize::from(DIST_BASE[idx]) + self.bits.take(extra) as usize;
                            if dist as u64 > self.total_out + *out_pos as u64 {
                                return Err(DecompressError::Malformed(
                                    "distance too far back",
                                ));
                            }
                            self.copy_dist = dist;
                            self.copy_len = self.seq_len;
                            self.stage = Stage::BlockCopy;
                        }
                    }
                }

                Stage::BlockCopy => {
                    while self.copy_len > 0 {
                        if *out_pos == output.len() {
                            break 'outer;
                        }
                        let byte =
                            self.window[(self.wpos + WINDOW_SIZE - self.copy_dist) & WINDOW_MASK];
                        self.write_byte(byte, output, out_pos);
                        self.copy_len -= 1;
                    }
                    self.stage = Stage::BlockSymbol;
                }

                Stage::Trailer => {
                    let want = if self.wrapper == Wrapper::Gzip { 8 } else { 4 };
                    while self.trailer_got < want {
                        if !self.bits.refill(input, in_pos, 8) {
                            break 'outer;
                        }
                        self.trailer[self.trailer_got] = self.bits.take(8) as u8;
                        self.trailer_got += 1;
                    }
                    self.check_trailer(*out_pos)?;
                    self.stage = Stage::Done;
                }
            }
        }
        Ok(())
    }

    fn repeat_length(
        &mut self,
        value: u8,
        count: usize,
        total: usize,
    ) -> Result<(), DecompressError> {
        if self.lengths_got + count > total {
            return Err(DecompressError::Malformed("too many code lengths"));
        }
        for _ in 0..count {
            self.code_lengths[self.lengths_got] = value;
            self.lengths_got += 1;
        }
        Ok(())
    }

    #[inline]
    fn write_byte(&mut self, byte: u8, output: &mut [u8], out_pos: &mut usize) {
        output[*out_pos] = byte;
        *out_pos += 1;
        self.window[self.wpos] = byte;
        self.wpos = (self.wpos + 1) & WINDOW_MASK;
        self.checksum.update(&[byte]);
    }

    fn end_of_block(&mut self) {
        self.lit_table = None;
        self.dist_table = None;
        self.cl_table = None;
        self.fixed_block = false;
        #[cfg(feature = "tracing")]
        tracing::trace!(final_block = self.final_block, "block decoded");
        if self.final_block {
            if self.wrapper == Wrapper::Raw {
                self.stage = Stage::Done;
            } else {
                self.bits.align_byte();
                self.trailer_got = 0;
                self.stage = Stage::Trailer;
            }
        } else {
            self.stage = Stage::BlockHeader;
        }
    }

    fn check_trailer(&self, out_pos: usize) -> Result<(), DecompressError> {
        match self.wrapper {
            Wrapper::Raw => {}
            Wrapper::Zlib => {
                let stored = u32::from_be_bytes([
                    self.trailer[0],
                    self.trailer[1],
                    self.trailer[2],
                    self.trailer[3],
                ]);
                let computed = self.checksum.value();
                if stored != computed {
                    return Err(DecompressError::ChecksumMismatch { stored, computed });
                }
            }
            Wrapper::Gzip => {
                let stored = u32::from_le_bytes([
                    self.trailer[0],
                    self.trailer[1],
                    self.trailer[2],
                    self.trailer[3],
                ]);
                let computed = self.checksum.value();
                if stored != computed {
                    return Err(DecompressError::ChecksumMismatch { stored, computed });
                }
                let stored_len = u32::from_le_bytes([
                    self.trailer[4],
                    self.trailer[5],
                    self.trailer[6],
                    self.trailer[7],
                ]);
                let produced = (self.total_out + out_pos as u64) as u32;
                if stored_len != produced {
                    return Err(DecompressError::LengthMismatch {
                        stored: stored_len,
                        produced,
                    });
                }
            }
        }
        Ok(())
    }

    fn after_gzip_fixed(&mut self) {
        if self.gzip_flags & FEXTRA != 0 {
            self.stage = Stage::GzipExtraLen;
        } else {
            self.after_gzip_extra();
        }
    }

    fn after_gzip_extra(&mut self) {
        if self.gzip_flags & FNAME != 0 {
            self.stage = Stage::GzipName;
        } else {
            self.after_gzip_name();
        }
    }

    fn after_gzip_name(&mut self) {
        if self.gzip_flags & FCOMMENT != 0 {
            self.stage = Stage::GzipComment;
        } else {
            self.after_gzip_comment();
        }
    }

    fn after_gzip_comment(&mut self) {
        if self.gzip_flags & FHCRC != 0 {
            self.skip_remaining = 2;
            self.stage = Stage::GzipHeaderCrc;
        } else {
            self.stage = Stage::BlockHeader;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::{reverse_bits, BitWriter};
    use crate::huffman::fixed_litlen_codes;

    fn inflate_all(data: &[u8], wrapper: Wrapper) -> Result<Vec<u8>, DecompressError> {
        let mut inflate = Inflate::new(wrapper);
        let mut out = Vec::new();
        let mut buf = [0u8; 64];
        let mut pos = 0;
        loop {
            let p = inflate.advance(&data[pos..], &mut buf)?;
            pos += p.consumed;
            out.extend_from_slice(&buf[..p.produced]);
            if p.status == Status::StreamEnd {
                return Ok(out);
            }
            if p.consumed == 0 && p.produced == 0 {
                return Err(DecompressError::Malformed("truncated stream"));
            }
        }
    }

    #[test]
    fn decodes_a_stored_block() {
        let mut data = vec![0b0000_0001u8];
        data.extend_from_slice(&5u16.to_le_bytes());
        data.extend_from_slice(&(!5u16).to_le_bytes());
        data.extend_from_slice(b"hello");
        assert_eq!(inflate_all(&data, Wrapper::Raw).unwrap(), b"hello");
    }

    #[test]
    fn decodes_one_byte_of_input_at_a_time() {
        let mut data = vec![0b0000_0001u8];
        data.extend_from_slice(&5u16.to_le_bytes());
        data.extend_from_slice(&(!5u16).to_le_bytes());
        data.extend_from_slice(b"hello");

        let mut inflate = Inflate::new(Wrapper::Raw);
        let mut out = Vec::new();
        let mut buf = [0u8; 1];
        for &byte in &data {
            let slice = [byte];
            let mut fed = 0;
            while fed < 1 {
                let p = inflate.advance(&slice[fed..], &mut buf).unwrap();
                fed += p.consumed;
                out.extend_from_slice(&buf[..p.produced]);
                if p.consumed == 0 && p.produced == 0 {
                    break;
                }
            }
        }
        loop {
            let p = inflate.advance(&[], &mut buf).unwrap();
            out.extend_from_slice(&buf[..p.produced]);
            if p.produced == 0 {
                break;
            }
        }
        assert_eq!(out, b"hello");
    }

    #[test]
    fn rejects_reserved_block_type() {
        // BFINAL=1, BTYPE=11.
        let data = [0b0000_0111u8];
        assert_eq!(
            inflate_all(&data, Wrapper::Raw).unwrap_err(),
            DecompressError::Malformed("reserved block type")
        );
    }

    #[test]
    fn rejects_stored_length_complement_mismatch() {
        let mut data = vec![0b0000_0001u8];
        data.extend_from_slice(&5u16.to_le_bytes());
        data.extend_from_slice(&5u16.to_le_bytes());
        assert_eq!(
            inflate_all(&data, Wrapper::Raw).unwrap_err(),
            DecompressError::Malformed("stored length check failed")
        );
    }

    #[test]
    fn rejects_distance_before_any_output() {
        // Fixed block whose first symbol is a length/distance pair: there is
        // nothing to copy from yet.
        let mut bw = BitWriter::new();
        bw.write_bits(1, 1); // BFINAL
        bw.write_bits(0b01, 2); // fixed
        let code = fixed_litlen_codes()[257];
        bw.write_bits(
            u32::from(reverse_bits(code.bits, code.len)),
            u32::from(code.len),
        );
        bw.write_bits(0, 5); // distance symbol 0 => distance 1
        bw.align_byte();
        let mut data = [0u8; 8];
        let n = bw.drain_into(&mut data);
        assert_eq!(
            inflate_all(&data[..n], Wrapper::Raw).unwrap_err(),
            DecompressError::Malformed("distance too far back")
        );
    }

    #[test]
    fn rejects_bad_zlib_header_check() {
        let data = [0x78, 0x9D, 0x03, 0x00];
        assert_eq!(
            inflate_all(&data, Wrapper::Zlib).unwrap_err(),
            DecompressError::Malformed("zlib header check failed")
        );
    }

    #[test]
    fn rejects_bad_gzip_magic() {
        let data = [0x1F, 0x8A];
        assert_eq!(
            inflate_all(&data, Wrapper::Gzip).unwrap_err(),
            DecompressError::Malformed("bad gzip magic")
        );
    }

    #[test]
    fn overlapping_copy_repeats_the_run() {
        // Stored "ab", then a fixed block with length 6 at distance 2:
        // expands to "abababab".
        let mut data = vec![0b0000_0000u8];
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&(!2u16).to_le_bytes());
        data.extend_from_slice(b"ab");
        let mut bw = BitWriter::new();
        bw.write_bits(1, 1);
        bw.write_bits(0b01, 2);
        let len_code = fixed_litlen_codes()[260]; // length 6
        bw.write_bits(
            u32::from(reverse_bits(len_code.bits, len_code.len)),
            u32::from(len_code.len),
        );
        bw.write_bits(u32::from(reverse_bits(1, 5)), 5); // distance symbol 1 => 2
        let eob = fixed_litlen_codes()[256];
        bw.write_bits(
            u32::from(reverse_bits(eob.bits, eob.len)),
            u32::from(eob.len),
        );
        bw.align_byte();
        let mut tail = [0u8; 8];
        let n = bw.drain_into(&mut tail);
        data.extend_from_slice(&tail[..n]);

        assert_eq!(inflate_all(&data, Wrapper::Raw).unwrap(), b"abababab");
    }
}
