//! Transparent block-compressed I/O.
//!
//! Presents uncompressed, gzip, bzip2, zstd, and BGZF byte streams behind a
//! single [`Read`](std::io::Read)/[`Write`](std::io::Write) surface,
//! detecting the format on input from its magic bytes and deriving it on
//! output from the destination's file extension. BGZF input can be
//! decompressed across a pool of worker threads while preserving strict
//! block-order delivery, and BGZF streams expose virtual-offset seeking
//! for random access in concert with [`bio-tabix`](https://docs.rs/bio-tabix).

mod bgzf;
mod bgzf_reader;
mod detect;
mod error;
mod options;
mod reader;
mod workers;
mod writer;

pub use bgzf::{BlockHeader, VirtualOffset, EOF_MARKER};
pub use detect::{Format, PEEK_LEN};
pub use error::{Error, Result};
pub use options::{ReaderOptions, WriterOptions};
pub use reader::TransparentIStream;
pub use writer::TransparentOStream;
