//! Error types shared by the FASTA/FASTQ/SAM/BED handlers (spec §7).

use thiserror::Error;

/// Result type for `bio-formats` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading or writing one of the thin line-oriented
/// formats. Mirrors the error kinds `bio-vcf` carries for the variant
/// handlers, minus the dictionary-lookup kinds that have no counterpart
/// here (these formats carry no header to consult).
#[derive(Error, Debug)]
pub enum Error {
    /// IO error from the underlying stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The current line does not conform to the format's grammar (wrong
    /// column count, missing leading `>`/`@`, etc). Carries the 1-based
    /// line number.
    #[error("format error at line {line}: {message}")]
    Format { line: u64, message: String },

    /// The grammar matched but a sub-token could not be converted (e.g. a
    /// non-numeric BED `chromStart`). Carries the 1-based line number.
    #[error("parse error at line {line}: {message}")]
    Parse { line: u64, message: String },
}
