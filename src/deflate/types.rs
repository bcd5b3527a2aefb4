//! Compression parameters, flush modes, progress reporting, and the
//! per-level matcher tuning table.

use thiserror::Error;

use crate::container::Wrapper;

// ─────────────────────────────────────────────────────────────────────────────
// Core match-length constants (RFC 1951 §3.2.5)
// ─────────────────────────────────────────────────────────────────────────────

/// Shortest back-reference the format can encode.
pub const MIN_MATCH: usize = 3;

/// Longest back-reference the format can encode.
pub const MAX_MATCH: usize = 258;

/// Lookahead the matcher insists on before processing a position mid-stream.
/// Guarantees a full-length match plus the rolling-hash tail can always be
/// read from initialized window bytes; only the final flush runs with less.
pub const MIN_LOOKAHEAD: usize = MAX_MATCH + MIN_MATCH + 1;

/// Smallest accepted `window_bits` (512-byte window).
pub const WINDOW_BITS_MIN: u8 = 9;
/// Largest accepted `window_bits` (32 KiB window).
pub const WINDOW_BITS_MAX: u8 = 15;

/// Smallest accepted `mem_level`; sizes the hash table (`mem_level + 7`
/// bits) and the token buffer (`1 << (mem_level + 6)` entries).
pub const MEM_LEVEL_MIN: u8 = 1;
/// Largest accepted `mem_level`.
pub const MEM_LEVEL_MAX: u8 = 9;
/// Default `mem_level`.
pub const MEM_LEVEL_DEFAULT: u8 = 8;

/// Highest compression level.
pub const LEVEL_MAX: u8 = 9;
/// Default compression level.
pub const LEVEL_DEFAULT: u8 = 6;

// ─────────────────────────────────────────────────────────────────────────────
// Public parameter types
// ─────────────────────────────────────────────────────────────────────────────

/// Match-finding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Full hash-chain search.
    #[default]
    Default,
    /// Only distance-1 matches are considered: favors long runs and literals,
    /// much faster on data like filtered image rows.
    Rle,
}

/// Compression session parameters.
///
/// The wrapper kind and window size are independent fields; the historical
/// single-parameter encoding (negative bit counts select the raw wrapper,
/// `bits + 16` selects gzip) is accepted only at the boundary via
/// [`DeflateOptions::from_window_bits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeflateOptions {
    /// Compression level: 0 (stored blocks only) through 9 (best).
    pub level: u8,
    /// Envelope format written around the compressed payload.
    pub wrapper: Wrapper,
    /// Window size exponent, 9..=15.
    pub window_bits: u8,
    /// Memory/speed trade-off for hash table and token buffer, 1..=9.
    pub mem_level: u8,
    /// Match-finding strategy.
    pub strategy: Strategy,
}

impl Default for DeflateOptions {
    fn default() -> Self {
        Self {
            level: LEVEL_DEFAULT,
            wrapper: Wrapper::Zlib,
            window_bits: WINDOW_BITS_MAX,
            mem_level: MEM_LEVEL_DEFAULT,
            strategy: Strategy::Default,
        }
    }
}

impl DeflateOptions {
    /// Defaults (zlib wrapper, 32 KiB window, mem_level 8) at the given level.
    pub fn new(level: u8) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Select the envelope format.
    pub fn wrapper(mut self, wrapper: Wrapper) -> Self {
        self.wrapper = wrapper;
        self
    }

    /// Select the window size exponent.
    pub fn window_bits(mut self, bits: u8) -> Self {
        self.window_bits = bits;
        self
    }

    /// Select the memory level.
    pub fn mem_level(mut self, mem_level: u8) -> Self {
        self.mem_level = mem_level;
        self
    }

    /// Select the match-finding strategy.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Translate the legacy dual-purpose window-bits encoding: `9..=15` is a
    /// zlib stream, `-15..=-9` a raw stream with the magnitude as window
    /// size, `25..=31` a gzip stream with `bits - 16` as window size.
    pub fn from_window_bits(level: u8, bits: i32) -> Result<Self, CompressError> {
        let (wrapper, window_bits) = decode_window_bits(bits)
            .ok_or(CompressError::InvalidParameters("window_bits out of range"))?;
        Ok(Self::new(level).wrapper(wrapper).window_bits(window_bits))
    }

    pub(crate) fn validate(&self) -> Result<(), CompressError> {
        if self.level > LEVEL_MAX {
            return Err(CompressError::InvalidParameters("level must be 0..=9"));
        }
        if !(WINDOW_BITS_MIN..=WINDOW_BITS_MAX).contains(&self.window_bits) {
            return Err(CompressError::InvalidParameters("window_bits must be 9..=15"));
        }
        if !(MEM_LEVEL_MIN..=MEM_LEVEL_MAX).contains(&self.mem_level) {
            return Err(CompressError::InvalidParameters("mem_level must be 1..=9"));
        }
        Ok(())
    }
}

/// Shared legacy window-bits decoding (see [`DeflateOptions::from_window_bits`]).
pub(crate) fn decode_window_bits(bits: i32) -> Option<(Wrapper, u8)> {
    let min = i32::from(WINDOW_BITS_MIN);
    let max = i32::from(WINDOW_BITS_MAX);
    if (min..=max).contains(&bits) {
        Some((Wrapper::Zlib, bits as u8))
    } else if (-max..=-min).contains(&bits) {
        Some((Wrapper::Raw, (-bits) as u8))
    } else if (min + 16..=max + 16).contains(&bits) {
        Some((Wrapper::Gzip, (bits - 16) as u8))
    } else {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Compression-side failures. Only parameter validation can fail: the matcher
/// and encoder signal internal conditions to the state machine, which
/// resolves all of them without surfacing errors (insufficient output space
/// is a status, not an error).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CompressError {
    #[error("invalid compression parameters: {0}")]
    InvalidParameters(&'static str),
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-level tuning
// ─────────────────────────────────────────────────────────────────────────────

/// Matcher budgets for one compression level.
///
/// `good`: once a match this long is found, remaining chain budget is
/// quartered. `lazy`: matches at least this long are taken immediately
/// instead of deferring one position. `nice`: stop searching outright at
/// this length. `chain`: maximum chain links walked per position.
///
/// Levels 1–3 use the greedy parser, 4–9 the lazy parser. The values are the
/// conventional tuning for this family of compressors; round-trip and
/// size-ordering tests validate behavior, not bit-exact output.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LevelConfig {
    pub good: usize,
    pub lazy: usize,
    pub nice: usize,
    pub chain: usize,
}

pub(crate) fn level_config(level: u8) -> LevelConfig {
    debug_assert!((1..=9).contains(&level));
    const TABLE: [LevelConfig; 9] = [
        LevelConfig { good: 4, lazy: 4, nice: 8, chain: 4 },
        LevelConfig { good: 4, lazy: 5, nice: 16, chain: 8 },
        LevelConfig { good: 4, lazy: 6, nice: 32, chain: 32 },
        LevelConfig { good: 4, lazy: 4, nice: 16, chain: 16 },
        LevelConfig { good: 8, lazy: 16, nice: 32, chain: 32 },
        LevelConfig { good: 8, lazy: 16, nice: 128, chain: 128 },
        LevelConfig { good: 8, lazy: 32, nice: 128, chain: 256 },
        LevelConfig { good: 32, lazy: 128, nice: 258, chain: 1024 },
        LevelConfig { good: 32, lazy: 258, nice: 258, chain: 4096 },
    ];
    TABLE[usize::from(level) - 1]
}

/// True when `level` uses the lazy (two-position) parser.
pub(crate) fn level_is_lazy(level: u8) -> bool {
    level >= 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_validate() {
        assert!(DeflateOptions::default().validate().is_ok());
    }

    #[test]
    fn level_zero_is_valid() {
        assert!(DeflateOptions::new(0).validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        assert!(DeflateOptions::new(10).validate().is_err());
        assert!(DeflateOptions::new(6).window_bits(8).validate().is_err());
        assert!(DeflateOptions::new(6).window_bits(16).validate().is_err());
        assert!(DeflateOptions::new(6).mem_level(0).validate().is_err());
        assert!(DeflateOptions::new(6).mem_level(10).validate().is_err());
    }

    #[test]
    fn legacy_window_bits_decoding() {
        assert_eq!(decode_window_bits(15), Some((Wrapper::Zlib, 15)));
        assert_eq!(decode_window_bits(9), Some((Wrapper::Zlib, 9)));
        assert_eq!(decode_window_bits(-15), Some((Wrapper::Raw, 15)));
        assert_eq!(decode_window_bits(-9), Some((Wrapper::Raw, 9)));
        assert_eq!(decode_window_bits(31), Some((Wrapper::Gzip, 15)));
        assert_eq!(decode_window_bits(25), Some((Wrapper::Gzip, 9)));
        assert_eq!(decode_window_bits(8), None);
        assert_eq!(decode_window_bits(-8), None);
        assert_eq!(decode_window_bits(0), None);
        assert_eq!(decode_window_bits(24), None);
    }

    #[test]
    fn chain_budget_grows_within_each_parser() {
        // The budget resets at the greedy/lazy boundary (level 4), then grows.
        for level in 2..=3u8 {
            assert!(level_config(level).chain >= level_config(level - 1).chain);
        }
        for level in 5..=9u8 {
            assert!(level_config(level).chain >= level_config(level - 1).chain);
        }
        assert!(!level_is_lazy(3));
        assert!(level_is_lazy(4));
    }
}
