//! The shared deep record type VCF and BCF handlers both produce and
//! consume (spec §3 "Parsed record", §4.E).
//!
//! A single [`VcfRecord`] shape is shared by both format handlers so that
//! records read from a VCF file and records read from its BCF counterpart
//! compare equal field-by-field (spec §8 "Cross-format equivalence").

use bio_value::{Sentinel, Value};

/// A fully-owned ("deep", spec §3/§9) variant record.
///
/// Every field is independently owned; a `VcfRecord` survives past the
/// next read of the reader that produced it, unlike the format handler's
/// internal raw/shallow views.
#[derive(Debug, Clone, PartialEq)]
pub struct VcfRecord {
    /// `CHROM`: contig name.
    pub chrom: String,
    /// `POS`: 1-based position, matching VCF's native coordinate system
    /// (spec §4.E: "the library chooses 1-based by default to match VCF").
    pub pos: u64,
    /// Reference allele length on the reference sequence; equals
    /// `reference.len()` for a plain substitution, but BCF stores it
    /// independently (e.g. for symbolic/structural alleles) and region
    /// overlap filtering (spec §4.H) uses it directly.
    pub rlen: u64,
    /// `ID`: semicolon-free identifiers; empty when the record is `.`.
    pub id: Vec<String>,
    /// `REF`.
    pub reference: String,
    /// `ALT`; empty when the record is `.` (no alternate allele).
    pub alt: Vec<String>,
    /// `QUAL`; [`f32::MISSING`] when the record is `.`.
    pub qual: f32,
    /// `FILTER`; empty means "." (not yet filtered), `["PASS"]` means
    /// passed, anything else is one or more failing filter ids.
    pub filter: Vec<String>,
    /// `INFO`, in source/declaration order. A [`Value::Flag`] entry has no
    /// `=VALUE` on the wire.
    pub info: Vec<(String, Value)>,
    /// `FORMAT` keys, in column order (empty when the record has no
    /// sample columns at all).
    pub format_keys: Vec<String>,
    /// Genotype data in the library's canonical by-field layout (spec
    /// §4.E "GENOTYPES"): one entry per FORMAT key, each holding one
    /// [`Value`] per sample, in `format_keys` order and sample-column
    /// order respectively.
    pub genotypes: Vec<(String, Vec<Value>)>,
}

impl VcfRecord {
    /// A minimal record with no optional data set: empty contig/ref/alt,
    /// missing qual, no filter/info/genotypes.
    #[must_use]
    pub fn new(chrom: impl Into<String>, pos: u64, reference: impl Into<String>) -> Self {
        let reference = reference.into();
        let rlen = reference.len() as u64;
        Self {
            chrom: chrom.into(),
            pos,
            rlen,
            id: Vec::new(),
            reference,
            alt: Vec::new(),
            qual: f32::MISSING,
            filter: Vec::new(),
            info: Vec::new(),
            format_keys: Vec::new(),
            genotypes: Vec::new(),
        }
    }

    /// The half-open reference interval `[pos, pos + rlen)` this record
    /// covers, in 1-based coordinates — the basis of the region-overlap
    /// post-filter in spec §4.H.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.pos + self.rlen
    }

    /// Whether this record overlaps the half-open region `[beg, end)`
    /// (0-based, as tabix regions are), per spec §4.H bullet 4.
    #[must_use]
    pub fn overlaps(&self, beg: u64, end: u64) -> bool {
        let rec_beg = self.pos.saturating_sub(1); // to 0-based
        let rec_end = self.end().saturating_sub(1);
        rec_beg < end && rec_end > beg
    }

    /// Look up a FORMAT key's per-sample values, if present.
    #[must_use]
    pub fn genotype_values(&self, key: &str) -> Option<&[Value]> {
        self.genotypes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// Number of sample columns implied by the first genotype field
    /// (0 if this record has no FORMAT/sample data).
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.genotypes.first().map_or(0, |(_, v)| v.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn end_accounts_for_rlen() {
        let rec = VcfRecord::new("chr1", 100, "ACGT");
        assert_eq!(rec.end(), 104);
    }

    #[test]
    fn overlaps_half_open_region() {
        let rec = VcfRecord::new("chr1", 1500, "A"); // 0-based [1499, 1500)
        assert!(rec.overlaps(1000, 2000));
        assert!(!rec.overlaps(1500, 2000)); // region starts after the record ends
    }

    #[test]
    fn genotype_values_looks_up_by_key() {
        let mut rec = VcfRecord::new("chr1", 1, "A");
        rec.format_keys = vec!["GT".to_string()];
        rec.genotypes = vec![(
            "GT".to_string(),
            vec![Value::String("0|0".to_string()), Value::String("1|1".to_string())],
        )];
        assert_eq!(rec.sample_count(), 2);
        assert!(rec.genotype_values("GT").is_some());
        assert!(rec.genotype_values("DP").is_none());
    }
}
