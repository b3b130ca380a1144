//! The top-level error type composing every collaborator crate's errors
//! (spec §7), the same composition pattern the teacher uses to wrap a
//! lower-level crate's error behind its own facade error.

use thiserror::Error;

/// Result type for `bio-io` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the reader/writer skeleton, record assembly, and
/// region-filtered reading.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error not otherwise wrapped by a collaborator crate.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transparent (de)compression stream construction or I/O failure.
    #[error(transparent)]
    Compress(#[from] bio_compress::Error),

    /// Tabix index parsing or region-to-chunk resolution failure.
    #[error(transparent)]
    Tabix(#[from] bio_tabix::Error),

    /// VCF/BCF header or record codec failure.
    #[error(transparent)]
    Vcf(#[from] bio_vcf::Error),

    /// FASTA/FASTQ/SAM/BED record codec failure.
    #[error(transparent)]
    Formats(#[from] bio_formats::Error),

    /// The byte stream's leading bytes (or, absent a hint, its extension)
    /// matched none of the compiled-in format handlers.
    #[error("could not determine record format for {0:?}")]
    UnknownFormat(String),

    /// A write-side call required a header ([`bio_vcf::Header`]) that was
    /// never supplied (spec §7 "missing-header-error").
    #[error("missing-header-error: writing {0} requires a header")]
    MissingHeader(&'static str),

    /// `push_back` was called with a record whose variant does not match
    /// the writer's selected format.
    #[error("record variant does not match the writer's format {0:?}")]
    FormatMismatch(crate::format::Format),

    /// Region-filtered reading was requested but the input is not BGZF
    /// (tabix addresses BGZF virtual offsets only).
    #[error("region-filtered reading requires a BGZF-compressed input, found {0:?}")]
    NotBgzf(bio_compress::Format),

    /// No tabix index was found and index-less linear scanning was not
    /// requested (spec §4.H step 2).
    #[error("no tabix index found for region-filtered reading, and linear scan was not requested")]
    NoIndex,

    /// Region-filtered reading was requested for a format with no indexed
    /// genomic extent ([`crate::record::Located`] is only implemented for
    /// VCF and BED records).
    #[error("region-filtered reading is not supported for format {0:?}")]
    UnsupportedRegionFormat(crate::format::Format),

    /// [`crate::assembly::apply`] was given an [`crate::assembly::AssembledField`]
    /// whose shape doesn't match what the paired [`crate::assembly::FieldId`]
    /// expects (spec §4.G "assembly policy").
    #[error("field {0:?} was given a value of the wrong shape/type")]
    FieldTypeMismatch(crate::assembly::FieldId),
}
