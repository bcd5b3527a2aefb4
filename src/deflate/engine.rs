//! Compression state machine.
//!
//! A [`Deflate`] session copies caller input into the sliding window, runs
//! the level's parser over buffered lookahead, and emits finished blocks into
//! the bit writer's pending buffer, which each `advance` call drains into the
//! caller's output slice. Control returns whenever input is exhausted, output
//! space is exhausted, or the requested flush point is satisfied.
//!
//! Streaming equivalence: every parsing decision is a function of window
//! content and monotonic counters only. Mid-stream, a position is parsed only
//! once at least [`MIN_LOOKAHEAD`] bytes of lookahead are buffered behind it,
//! so the bytes visible to the matcher are identical whether input arrived
//! one byte at a time or all at once; the tail (lookahead below the
//! threshold) is parsed only at the final flush. Compressed output is
//! therefore byte-identical across input chunkings.

use crate::bitstream::BitWriter;
use crate::checksum::{Adler32State, Crc32State, RollingChecksum};
use crate::container::{self, Wrapper};

use super::blocks::{emit_stored_block, TokenBuffer, STORED_MAX};
use super::matcher::Matcher;
use crate::stream::{Flush, Progress, Status};

use super::types::{
    level_config, level_is_lazy, CompressError, DeflateOptions, Strategy, MIN_LOOKAHEAD, MIN_MATCH,
};

/// Length-3 matches further back than this cost more than three literals on
/// average; the lazy parser drops them.
const TOO_FAR: usize = 4096;

/// Streaming compressor. Create with [`Deflate::new`], drive with
/// [`Deflate::advance`]; dropping the value releases window and chain
/// storage.
#[derive(Debug)]
pub struct Deflate {
    opts: DeflateOptions,
    matcher: Matcher,
    tokens: TokenBuffer,
    bw: BitWriter,
    checksum: RollingChecksum,
    finished: bool,
    /// Lazy parser carry-over: match found at the previous position.
    match_len: usize,
    match_dist: usize,
    match_available: bool,
    /// Input offset of the last emitted sync point, de-duplicating repeated
    /// sync requests at the same position.
    synced_at: Option<u64>,
    total_in: u64,
    total_out: u64,
}

impl Deflate {
    /// Start a compression session. Fails only on out-of-range parameters.
    pub fn new(opts: DeflateOptions) -> Result<Self, CompressError> {
        opts.validate()?;
        let mut bw = BitWriter::new();
        container::write_header(&mut bw, opts.wrapper, opts.level, opts.window_bits);
        let checksum = match opts.wrapper {
            Wrapper::Raw => RollingChecksum::None,
            Wrapper::Zlib => RollingChecksum::Adler32(Adler32State::new()),
            Wrapper::Gzip => RollingChecksum::Crc32(Crc32State::new()),
        };
        let cfg = level_config(opts.level.max(1));
        Ok(Self {
            opts,
            matcher: Matcher::new(opts.window_bits, opts.mem_level, cfg),
            tokens: TokenBuffer::new(opts.mem_level),
            bw,
            checksum,
            finished: false,
            match_len: MIN_MATCH - 1,
            match_dist: 0,
            match_available: false,
            synced_at: None,
            total_in: 0,
            total_out: 0,
        })
    }

    /// Total bytes consumed across the session.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Total bytes produced across the session.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Consume a prefix of `input`, fill a prefix of `output`.
    ///
    /// With [`Flush::Finish`], keep calling (empty input is fine) until
    /// [`Status::StreamEnd`] is reported; trailing engine state and the
    /// wrapper trailer drain incrementally through however little output
    /// space each call provides.
    pub fn advance(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: Flush,
    ) -> Result<Progress, CompressError> {
        let mut consumed = 0usize;
        let mut produced = 0usize;

        loop {
            produced += self.bw.drain_into(&mut output[produced..]);
            if self.bw.pending_len() > 0 || self.finished {
                break;
            }

            let before_bits = self.bw.bit_offset();
            let before_strstart = self.matcher.strstart;

            let n = self.matcher.fill(&input[consumed..]);
            self.checksum.update(&input[consumed..consumed + n]);
            consumed += n;
            self.total_in += n as u64;
            let input_pending = consumed < input.len();

            // Only treat this as a flush boundary once every byte of this
            // call's input is in the window.
            let flushing = !input_pending && flush != Flush::None;
            self.run_parser(flushing);

            if !input_pending && self.matcher.lookahead == 0 {
                match flush {
                    Flush::Finish => {
                        self.finish_stream();
                        continue;
                    }
                    Flush::Sync if self.synced_at != Some(self.total_in) => {
                        self.sync_point();
                        continue;
                    }
                    _ => {}
                }
            }

            let progressed = n > 0
                || self.bw.bit_offset() != before_bits
                || self.matcher.strstart != before_strstart;
            if !progressed {
                break;
            }
        }

        self.total_out += produced as u64;
        let status = if self.finished && self.bw.pending_len() == 0 {
            Status::StreamEnd
        } else {
            Status::Ok
        };
        Ok(Progress {
            consumed,
            produced,
            status,
        })
    }

    fn run_parser(&mut self, flushing: bool) {
        if self.opts.level == 0 {
            self.run_stored(flushing);
        } else if self.opts.strategy == Strategy::Rle {
            self.run_rle(flushing);
        } else if level_is_lazy(self.opts.level) {
            self.run_lazy(flushing);
        } else {
            self.run_greedy(flushing);
        }
    }

    /// Level 0: pass bytes through as stored blocks, flushed whenever the
    /// pending span reaches the stored-block limit. The limit also keeps the
    /// span window resident across slides.
    fn run_stored(&mut self, _flushing: bool) {
        let limit = STORED_MAX.min(self.matcher.max_dist());
        loop {
            let span = (self.matcher.strstart as isize - self.matcher.block_start) as usize;
            let advance = self.matcher.lookahead.min(limit - span);
            self.matcher.strstart += advance;
            self.matcher.lookahead -= advance;
            if span + advance == limit {
                emit_stored_block(
                    &mut self.bw,
                    self.matcher.block_bytes().expect("span is window resident"),
                    false,
                );
                self.matcher.start_new_block();
            } else {
                break;
            }
        }
    }

    /// Run-length strategy: only distance-1 matches.
    fn run_rle(&mut self, flushing: bool) {
        loop {
            if self.matcher.lookahead == 0 {
                break;
            }
            if !flushing && self.matcher.lookahead < MIN_LOOKAHEAD {
                break;
            }
            let run = self.matcher.run_length();
            let full = if run >= MIN_MATCH {
                let full = self.tokens.push_match(run, 1);
                self.matcher.strstart += run;
                self.matcher.lookahead -= run;
                full
            } else {
                let byte = self.matcher.byte_at(self.matcher.strstart);
                let full = self.tokens.push_literal(byte);
                self.matcher.strstart += 1;
                self.matcher.lookahead -= 1;
                full
            };
            if full {
                self.flush_token_block(false);
            }
        }
    }

    /// Greedy parser (levels 1–3): take the longest match at each position.
    fn run_greedy(&mut self, flushing: bool) {
        loop {
            if self.matcher.lookahead == 0 {
                break;
            }
            if !flushing && self.matcher.lookahead < MIN_LOOKAHEAD {
                break;
            }

            let mut found = None;
            if self.matcher.lookahead >= MIN_MATCH {
                let candidate = self.matcher.insert(self.matcher.strstart);
                if self.matcher.in_range(candidate) {
                    found = self.matcher.longest_match(candidate, 0);
                }
            }

            let full = if let Some((len, dist)) = found {
                let full = self.tokens.push_match(len, dist);
                let data_end = self.matcher.strstart + self.matcher.lookahead;
                let match_end = self.matcher.strstart + len;
                for pos in self.matcher.strstart + 1..match_end {
                    if pos + MIN_MATCH <= data_end {
                        self.matcher.insert(pos);
                    }
                }
                self.matcher.strstart = match_end;
                self.matcher.lookahead -= len;
                full
            } else {
                let byte = self.matcher.byte_at(self.matcher.strstart);
                let full = self.tokens.push_literal(byte);
                self.matcher.strstart += 1;
                self.matcher.lookahead -= 1;
                full
            };
            if full {
                self.flush_token_block(false);
            }
        }
    }

    /// Lazy parser (levels 4–9): defer a match one position when the next
    /// position matches longer.
    fn run_lazy(&mut self, flushing: bool) {
        let lazy_limit = level_config(self.opts.level).lazy;
        loop {
            if self.matcher.lookahead == 0 {
                break;
            }
            if !flushing && self.matcher.lookahead < MIN_LOOKAHEAD {
                break;
            }

            let prev_len = self.match_len;
            let prev_dist = self.match_dist;
            self.match_len = MIN_MATCH - 1;

            if self.matcher.lookahead >= MIN_MATCH {
                let candidate = self.matcher.insert(self.matcher.strstart);
                if self.matcher.in_range(candidate) && prev_len < lazy_limit {
                    if let Some((len, dist)) = self.matcher.longest_match(candidate, prev_len) {
                        if len > MIN_MATCH || dist <= TOO_FAR {
                            self.match_len = len;
                            self.match_dist = dist;
                        }
                    }
                }
            }

            if prev_len >= MIN_MATCH && self.match_len <= prev_len {
                // The match found at the previous position wins; it starts
                // one byte behind the cursor.
                let full = self.tokens.push_match(prev_len, prev_dist);
                let data_end = self.matcher.strstart + self.matcher.lookahead;
                let match_end = self.matcher.strstart - 1 + prev_len;
                for pos in self.matcher.strstart + 1..match_end {
                    if pos + MIN_MATCH <= data_end {
                        self.matcher.insert(pos);
                    }
                }
                self.matcher.lookahead -= prev_len - 1;
                self.matcher.strstart = match_end;
                self.match_available = false;
                self.match_len = MIN_MATCH - 1;
                if full {
                    self.flush_token_block(false);
                }
            } else if self.match_available {
                // The previous byte stays a literal; the current match (if
                // any) is deferred to the next iteration.
                let byte = self.matcher.byte_at(self.matcher.strstart - 1);
                let full = self.tokens.push_literal(byte);
                if full {
                    self.flush_token_block(false);
                }
                self.matcher.strstart += 1;
                self.matcher.lookahead -= 1;
            } else {
                self.match_available = true;
                self.matcher.strstart += 1;
                self.matcher.lookahead -= 1;
            }
        }
    }

    /// Emit the pending deferred literal, if the lazy parser left one.
    fn settle_pending_literal(&mut self) {
        if self.match_available {
            let byte = self.matcher.byte_at(self.matcher.strstart - 1);
            let full = self.tokens.push_literal(byte);
            if full {
                self.flush_token_block(false);
            }
            self.match_available = false;
        }
    }

    fn flush_token_block(&mut self, last: bool) {
        let stored = self
            .matcher
            .block_bytes()
            .filter(|bytes| bytes.len() <= STORED_MAX);
        self.tokens.flush_block(&mut self.bw, stored, last);
        self.matcher.start_new_block();
    }

    /// Emit a block boundary so everything fed so far becomes decodable:
    /// flush buffered state as a block, then an empty stored block to
    /// byte-align the stream.
    fn sync_point(&mut self) {
        if self.opts.level == 0 {
            let span = self.matcher.block_bytes().expect("span is window resident");
            if !span.is_empty() {
                emit_stored_block(&mut self.bw, span, false);
            }
        } else {
            self.settle_pending_literal();
            if !self.tokens.is_empty() {
                self.flush_token_block(false);
            }
        }
        emit_stored_block(&mut self.bw, &[], false);
        self.matcher.start_new_block();
        self.synced_at = Some(self.total_in);
        #[cfg(feature = "tracing")]
        tracing::debug!(total_in = self.total_in, "sync flush point");
    }

    /// Emit the final block and the wrapper trailer.
    fn finish_stream(&mut self) {
        debug_assert_eq!(self.matcher.lookahead, 0);
        if self.opts.level == 0 {
            emit_stored_block(
                &mut self.bw,
                self.matcher.block_bytes().expect("span is window resident"),
                true,
            );
            self.matcher.start_new_block();
        } else {
            self.settle_pending_literal();
            self.flush_token_block(true);
        }
        self.bw.align_byte();
        container::write_trailer(
            &mut self.bw,
            self.opts.wrapper,
            self.checksum.value(),
            self.total_in as u32,
        );
        self.finished = true;
        #[cfg(feature = "tracing")]
        tracing::debug!(total_in = self.total_in, "stream finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compress_all(data: &[u8], opts: DeflateOptions, chunk: usize) -> Vec<u8> {
        let mut deflate = Deflate::new(opts).unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 97];
        let mut pos = 0;
        while pos < data.len() {
            let end = (pos + chunk).min(data.len());
            let mut slice = &data[pos..end];
            while !slice.is_empty() {
                let p = deflate.advance(slice, &mut buf, Flush::None).unwrap();
                slice = &slice[p.consumed..];
                out.extend_from_slice(&buf[..p.produced]);
            }
            pos = end;
        }
        loop {
            let p = deflate.advance(&[], &mut buf, Flush::Finish).unwrap();
            out.extend_from_slice(&buf[..p.produced]);
            if p.status == Status::StreamEnd {
                break;
            }
        }
        out
    }

    #[test]
    fn byte_at_a_time_output_matches_one_shot() {
        let data: Vec<u8> = (0..4096u32).map(|i| ((i * 7) ^ (i >> 3)) as u8).collect();
        for level in [1, 4, 6, 9] {
            let opts = DeflateOptions::new(level).wrapper(Wrapper::Raw);
            let whole = compress_all(&data, opts, data.len());
            let bytes = compress_all(&data, opts, 1);
            assert_eq!(whole, bytes, "level {level} diverged across chunkings");
        }
    }

    #[test]
    fn level_zero_uses_stored_blocks_only() {
        let data = vec![42u8; 2000];
        let opts = DeflateOptions::new(0).wrapper(Wrapper::Raw);
        let out = compress_all(&data, opts, data.len());
        // Single final block: BFINAL=1, BTYPE=00.
        assert_eq!(out[0] & 0x07, 0x01);
        let len = u16::from_le_bytes([out[1], out[2]]);
        let nlen = u16::from_le_bytes([out[3], out[4]]);
        assert_eq!(len, 2000);
        assert_eq!(nlen, !len);
        assert_eq!(&out[5..], &data[..]);
    }

    #[test]
    fn empty_input_produces_a_terminated_stream() {
        let opts = DeflateOptions::new(6).wrapper(Wrapper::Raw);
        let out = compress_all(&[], opts, 1);
        assert_eq!(out, vec![0x03, 0x00]);
    }

    #[test]
    fn finish_drains_through_one_byte_outputs() {
        let data = b"finish through a keyhole, one byte at a time".repeat(20);
        let mut deflate = Deflate::new(DeflateOptions::new(6)).unwrap();
        let mut out = Vec::new();
        let mut one = [0u8; 1];
        let mut input = &data[..];
        loop {
            let p = deflate.advance(input, &mut one, Flush::Finish).unwrap();
            input = &input[p.consumed..];
            out.extend_from_slice(&one[..p.produced]);
            if p.status == Status::StreamEnd {
                break;
            }
        }
        assert!(input.is_empty());
        assert_eq!(deflate.total_out(), out.len() as u64);
        assert_eq!(deflate.total_in(), data.len() as u64);
    }

    #[test]
    fn sync_flush_byte_aligns_with_the_empty_stored_marker() {
        let mut deflate = Deflate::new(DeflateOptions::new(6).wrapper(Wrapper::Raw)).unwrap();
        let mut buf = [0u8; 512];
        let p = deflate
            .advance(b"sync marker test payload", &mut buf, Flush::Sync)
            .unwrap();
        assert_eq!(p.status, Status::Ok);
        // A sync point ends with the empty stored block 00 00 FF FF.
        assert_eq!(&buf[p.produced - 4..p.produced], &[0x00, 0x00, 0xFF, 0xFF]);

        // Repeating the request without new input must not grow the stream.
        let p2 = deflate.advance(&[], &mut buf, Flush::Sync).unwrap();
        assert_eq!(p2.produced, 0);
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(Deflate::new(DeflateOptions::new(10)).is_err());
        assert!(Deflate::new(DeflateOptions::new(6).window_bits(8)).is_err());
    }
}
