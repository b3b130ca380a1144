//! Error types for transparent compression I/O

use thiserror::Error;

/// Result type for `bio-compress` operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while opening, seeking, or reading/writing a transparent stream
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Construction requested a compression format that was disabled at build time
    #[error("Compression format disabled at build time: {0:?}")]
    FormatDisabled(crate::Format),

    /// Construction requested a format that conflicts with the bytes actually observed
    #[error("Requested format {requested:?} conflicts with detected format {detected:?}")]
    FormatConflict {
        requested: crate::Format,
        detected: crate::Format,
    },

    /// Single-threaded BGZF cannot compress; use gz or raise the thread count
    #[error("BGZF compression requires at least 2 threads (1 worker)")]
    SingleThreadBgzfWrite,

    /// A seek was attempted at a position that is not the start of a compression block
    #[error("cannot restart decompression: seek target is not a block boundary")]
    SeekNotBlockBoundary,

    /// A seek changed the detected format, which is not supported
    #[error("cannot restart decompression: format changed from {before:?} to {after:?}")]
    FormatChangedAcrossSeek {
        before: crate::Format,
        after: crate::Format,
    },

    /// Compression level outside `[-1, 9]`
    #[error("invalid compression level: {0} (must be in [-1, 9])")]
    InvalidCompressionLevel(i32),

    /// A background decompression worker panicked or its channel closed unexpectedly
    #[error("decompression worker terminated unexpectedly")]
    WorkerTerminated,

    /// `seek_primary` was called on a stream whose format has no block
    /// structure to seek within (only BGZF supports virtual-offset seeking)
    #[error("seek_primary is only supported for BGZF streams, not {0:?}")]
    SeekUnsupportedFormat(crate::Format),
}
