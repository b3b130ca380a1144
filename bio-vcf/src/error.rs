//! Error types for VCF/BCF header and record parsing.

use thiserror::Error;

/// Result type for `bio-vcf` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing or writing a variant header or record.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The current byte window does not conform to the format grammar.
    /// Carries a line number for text formats and a byte offset for binary.
    #[error("format error at {location}: {message}")]
    Format { location: Location, message: String },

    /// The grammar was fine but a sub-token could not be converted.
    #[error("parse error at {location}: {message}")]
    Parse { location: Location, message: String },

    /// A write-side call required a header that was not supplied.
    #[error("missing header: {0}")]
    MissingHeader(&'static str),

    /// A referenced contig is not present in the header's contig dictionary.
    #[error("unknown contig: {0:?}")]
    UnknownContig(String),

    /// A referenced FILTER id/idx is not present in the header's filter dictionary.
    #[error("unknown filter: {0:?}")]
    UnknownFilter(String),

    /// A referenced INFO/FORMAT key is not present in the header's dictionary.
    #[error("unknown info/format key: {0:?}")]
    UnknownInfo(String),

    /// A binary structure was truncated before all expected bytes arrived.
    #[error("unexpected end of input at {location}")]
    UnexpectedEndOfInput { location: Location },

    /// Value-model error (sentinel/type conversion) surfaced from `bio-value`.
    #[error(transparent)]
    Value(#[from] bio_value::Error),
}

/// Where a [`Error::Format`]/[`Error::Parse`]/[`Error::UnexpectedEndOfInput`]
/// occurred: a 1-based line number for text formats, a byte offset for
/// binary ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// 1-based line number in a text file.
    Line(u64),
    /// Byte offset into a binary stream.
    ByteOffset(u64),
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Line(n) => write!(f, "line {n}"),
            Location::ByteOffset(n) => write!(f, "byte offset {n}"),
        }
    }
}
