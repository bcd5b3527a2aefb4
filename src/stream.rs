//! Streaming control types shared by the compression and decompression
//! engines.

/// Flush behavior requested for one `advance` call on the compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flush {
    /// Buffer as much as possible for best compression.
    #[default]
    None,
    /// Force a block boundary and byte-align the output so everything fed so
    /// far is decodable, then keep the session open.
    Sync,
    /// Terminate the stream. Repeat (with empty input) until
    /// [`Status::StreamEnd`] is reported.
    Finish,
}

/// Session state reported by `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// More input and/or output space will make further progress.
    Ok,
    /// The stream is complete and every output byte has been handed over.
    StreamEnd,
}

/// Byte accounting for one `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes consumed from the input slice.
    pub consumed: usize,
    /// Bytes written to the output slice.
    pub produced: usize,
    /// Whether the session can continue or has fully drained.
    pub status: Status,
}
