//! Format-dispatching reader/writer skeleton, record assembly, and
//! tabix-filtered region reading over the variant and thin record formats
//! (spec §4.F, §4.G, §4.H).
//!
//! [`Reader`]/[`Writer`] own a [`bio_compress::TransparentIStream`]/
//! [`bio_compress::TransparentOStream`], select one of the compiled-in
//! format handlers (FASTA/FASTQ/SAM/BED from [`bio_formats`], VCF/BCF from
//! [`bio_vcf`]) at construction time, and iterate [`Record`]s through it.
//! [`RegionReader`] composes a [`Reader`] with a [`bio_tabix::TabixIndex`]
//! to yield only records overlapping a genomic region.

mod assembly;
mod error;
mod format;
mod reader;
mod record;
mod region;
mod writer;

pub use assembly::{assemble, apply, AssembledField, FieldId, FieldSpec, FieldType};
pub use error::{Error, Result};
pub use format::Format;
pub use reader::{Reader, ReaderOptions};
pub use record::{Located, Record};
pub use region::{RegionReader, RegionReaderOptions};
pub use writer::{Writer, WriterOptions};
