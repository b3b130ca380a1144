//! The tagged-union record type a [`crate::Reader`] yields and a
//! [`crate::Writer`] accepts, one variant per compiled-in format (spec §9
//! "Variant-over-format-handlers is kept as an enum+dispatch").

use crate::format::Format;

/// One record, in whichever format its source/destination handler uses.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Fasta(bio_formats::fasta::Record),
    Fastq(bio_formats::fastq::Record),
    Sam(bio_formats::sam::Record),
    Bed(bio_formats::bed::Record),
    Vcf(bio_vcf::VcfRecord),
}

impl Record {
    /// Which [`Format`] this record was produced by.
    #[must_use]
    pub fn format(&self) -> Format {
        match self {
            Record::Fasta(_) => Format::Fasta,
            Record::Fastq(_) => Format::Fastq,
            Record::Sam(_) => Format::Sam,
            Record::Bed(_) => Format::Bed,
            Record::Vcf(_) => Format::Vcf,
        }
    }
}

/// Records that can be tested for overlap with a half-open genomic region
/// (spec §4.H "post-filter: `rec.pos < region.end && rec.pos + rec.rlen >
/// region.beg`"). Implemented for the two record shapes that carry
/// their own genomic extent; `bio-io`'s region-filtered reader requires
/// this bound.
pub trait Located {
    fn chrom(&self) -> &str;
    /// 0-based inclusive start.
    fn start0(&self) -> u64;
    /// 0-based exclusive end.
    fn end0(&self) -> u64;

    /// True iff `[self.start0(), self.end0())` overlaps `[beg, end)`.
    fn overlaps(&self, beg: u64, end: u64) -> bool {
        self.start0() < end && self.end0() > beg
    }
}

impl Located for bio_vcf::VcfRecord {
    fn chrom(&self) -> &str {
        &self.chrom
    }

    fn start0(&self) -> u64 {
        self.pos.saturating_sub(1)
    }

    fn end0(&self) -> u64 {
        self.end().saturating_sub(1)
    }
}

impl Located for bio_formats::bed::Record {
    fn chrom(&self) -> &str {
        &self.chrom
    }

    fn start0(&self) -> u64 {
        self.chrom_start
    }

    fn end0(&self) -> u64 {
        self.chrom_end
    }
}
