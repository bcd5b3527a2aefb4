//! Decompression error taxonomy and state-machine stages.

use thiserror::Error;

/// Decompression failures. All of these are fatal to the session: drop the
/// context and start a fresh one. Needing more input or more output space is
/// reported through the progress status, never as an error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecompressError {
    #[error("invalid decompression parameters: {0}")]
    InvalidParameters(&'static str),
    /// Corrupt header, invalid code table, reserved block type, out-of-range
    /// back-reference, or a similarly unrecoverable stream defect.
    #[error("malformed stream: {0}")]
    Malformed(&'static str),
    /// The wrapper trailer checksum did not match the reconstructed bytes.
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
    /// The gzip trailer's declared length did not match the bytes produced.
    #[error("declared length mismatch: stored {stored}, produced {produced}")]
    LengthMismatch { stored: u32, produced: u32 },
    /// One-shot decompression exceeded the caller's declared output length.
    #[error("output buffer too small for the decompressed stream")]
    OutputTooSmall,
}

/// Decompression stages. The engine parks in whatever stage ran out of input
/// or output and resumes there on the next call; every multi-byte field has
/// its partial-progress counters in the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    /// 2-byte zlib header (CMF/FLG).
    ZlibHeader,
    /// 10 fixed gzip header bytes (magic, method, flags, mtime, xfl, os).
    GzipFixedHeader,
    /// 2-byte little-endian length of the optional FEXTRA field.
    GzipExtraLen,
    /// Skipping FEXTRA payload bytes.
    GzipExtra,
    /// Skipping the zero-terminated FNAME field.
    GzipName,
    /// Skipping the zero-terminated FCOMMENT field.
    GzipComment,
    /// Skipping the 2-byte FHCRC field.
    GzipHeaderCrc,
    /// 3-bit block header (BFINAL + BTYPE).
    BlockHeader,
    /// Stored block LEN/NLEN.
    StoredLen,
    /// Copying stored block payload.
    StoredCopy,
    /// Dynamic block HLIT/HDIST/HCLEN.
    DynHeader,
    /// 3-bit code lengths of the code-length alphabet.
    DynCodeLenCodes,
    /// Run-length-coded literal/length and distance code lengths.
    DynCodeLens,
    /// Decoding the next literal/length symbol.
    BlockSymbol,
    /// Decoding the distance of a begun back-reference.
    BlockDist,
    /// Copying back-reference bytes through the window.
    BlockCopy,
    /// Wrapper trailer bytes (checksum, gzip length).
    Trailer,
    /// Stream fully decoded and validated.
    Done,
}
