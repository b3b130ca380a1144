//! Error types for tabix index parsing and querying.

use thiserror::Error;

/// Result type for `bio-tabix` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing or querying a tabix index.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error reading the index stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transparent decompression of the index stream failed.
    #[error(transparent)]
    Compress(#[from] bio_compress::Error),

    /// The decompressed stream did not start with the `TBI\x01` magic.
    #[error("not a tabix index: bad magic bytes")]
    BadMagic,

    /// A query named a contig not present in the index's name list.
    ///
    /// A dedicated variant per spec.md §9 rather than the original's
    /// generic string error.
    #[error("unknown contig: {0:?}")]
    UnknownContig(String),

    /// A region's `beg >= end`, or otherwise did not describe a valid
    /// half-open interval.
    #[error("empty or invalid region: [{beg}, {end})")]
    InvalidRegion { beg: u64, end: u64 },
}
