//! Streaming DEFLATE compression: sliding-window matcher, token encoder, and
//! the session state machine.

mod blocks;
mod engine;
mod matcher;
mod types;

pub use engine::Deflate;
pub use types::{
    CompressError, DeflateOptions, Strategy, LEVEL_DEFAULT, LEVEL_MAX, MAX_MATCH,
    MEM_LEVEL_DEFAULT, MEM_LEVEL_MAX, MEM_LEVEL_MIN, MIN_MATCH, WINDOW_BITS_MAX, WINDOW_BITS_MIN,
};

pub(crate) use types::decode_window_bits;
