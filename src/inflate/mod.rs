//! Streaming DEFLATE decompression.

mod engine;
mod types;

pub use engine::Inflate;
pub use types::DecompressError;
