//! Streaming DEFLATE compression and decompression (RFC 1951) with the raw,
//! zlib (RFC 1950), and gzip (RFC 1952) container formats.
//!
//! Both engines are incremental and buffer-bounded: the caller owns the
//! input and output buffers, and each `advance` call consumes and produces
//! whatever fits, down to a single byte at a time. Compressed output is
//! byte-identical whether input arrives in one call or one byte per call.
//!
//! ```
//! use zflate::{compress_to_vec, decompress_to_vec, Wrapper};
//!
//! let data = b"streams within streams within streams";
//! let packed = compress_to_vec(Wrapper::Zlib, 6, data).unwrap();
//! let unpacked = decompress_to_vec(Wrapper::Zlib, &packed, Some(data.len())).unwrap();
//! assert_eq!(unpacked, data);
//! ```
//!
//! Streaming sessions hold their window, hash chain, and table state
//! internally and release it on drop:
//!
//! ```
//! use zflate::{Deflate, DeflateOptions, Flush, Inflate, Status, Wrapper};
//!
//! let mut deflate = Deflate::new(DeflateOptions::new(6).wrapper(Wrapper::Raw)).unwrap();
//! let mut out = [0u8; 256];
//! let progress = deflate.advance(b"hello hello hello", &mut out, Flush::Finish).unwrap();
//! assert_eq!(progress.status, Status::StreamEnd);
//!
//! let mut inflate = Inflate::new(Wrapper::Raw);
//! let mut text = [0u8; 32];
//! let progress = inflate.advance(&out[..progress.produced], &mut text).unwrap();
//! assert_eq!(&text[..progress.produced], b"hello hello hello");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bitstream;
pub mod checksum;
mod container;
pub mod deflate;
pub mod huffman;
pub mod inflate;
mod stream;

pub use container::{compress_bound, compress_to_vec, decompress_to_vec, Wrapper};
pub use deflate::{CompressError, Deflate, DeflateOptions, Strategy};
pub use inflate::{DecompressError, Inflate};
pub use stream::{Flush, Progress, Status};
