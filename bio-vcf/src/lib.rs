//! VCF/BCF variant header and header-driven record codecs.
//!
//! A single [`Header`] holds the INFO/FORMAT/FILTER/contig dictionaries
//! that both [`vcf`] (textual) and [`bcf`] (binary) handlers parse and
//! serialize records against (spec §3, §4.D). Both handlers produce and
//! consume the same [`VcfRecord`] type, so a record read from one format
//! compares equal, field by field, to the same record read from the other
//! (spec §8 "Cross-format equivalence").

mod bcf;
mod error;
mod genotype;
mod header;
mod record;
mod valuetext;
mod vcf;

pub use bcf::{Reader as BcfReader, Writer as BcfWriter, WriterOptions as BcfWriterOptions};
pub use error::{Error, Location, Result};
pub use genotype::{parse as parse_genotype, render as render_genotype, Allele};
pub use header::{ContigDescriptor, DictKind, FieldDescriptor, FilterDescriptor, Header, Number, VcfType};
pub use record::VcfRecord;
pub use valuetext::{parse_value, render_value};
pub use vcf::{RawRecord, Reader as VcfReader, ReaderOptions, Writer as VcfWriter, WriterOptions as VcfWriterOptions};
