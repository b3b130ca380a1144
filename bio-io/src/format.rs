//! Runtime format selection: which compiled-in record handler a byte
//! stream should be parsed with, chosen by extension or by sniffing its
//! leading bytes (spec §4.F "creating it inside a type-safe variant over
//! all compiled-in formats").

use std::path::Path;

/// One of the record formats this crate knows how to read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Fasta,
    Fastq,
    Sam,
    Bed,
    Vcf,
    Bcf,
}

impl Format {
    /// Guess the format from a file extension, stripping one layer of
    /// compression suffix first (`.vcf.gz` → `.vcf`).
    #[must_use]
    pub fn detect_from_extension(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let stripped = name
            .strip_suffix(".gz")
            .or_else(|| name.strip_suffix(".bgz"))
            .or_else(|| name.strip_suffix(".bgzf"))
            .unwrap_or(name);
        let stem_path = Path::new(stripped);
        match stem_path.extension().and_then(|e| e.to_str()) {
            Some("fa" | "fasta" | "fna") => Some(Format::Fasta),
            Some("fq" | "fastq") => Some(Format::Fastq),
            Some("sam") => Some(Format::Sam),
            Some("bed") => Some(Format::Bed),
            Some("vcf") => Some(Format::Vcf),
            Some("bcf") => Some(Format::Bcf),
            _ => None,
        }
    }

    /// Guess the format from the leading bytes of the *decompressed*
    /// content. Used when no extension hint is available, or to confirm
    /// one. VCF and the thin text formats are only distinguished
    /// heuristically (their grammars are otherwise incomparable): BCF's
    /// binary magic is checked first, then textual cues (spec §6, §4.F).
    #[must_use]
    pub fn detect_from_magic(peek: &[u8]) -> Option<Self> {
        if peek.starts_with(b"BCF\x02\x02") {
            return Some(Format::Bcf);
        }
        let text = std::str::from_utf8(peek).ok()?;
        let first_line = text.lines().next().unwrap_or("");
        if first_line.starts_with("##fileformat=VCF") || first_line.starts_with("##") {
            return Some(Format::Vcf);
        }
        if first_line.starts_with('>') {
            return Some(Format::Fasta);
        }
        if first_line.starts_with("@HD")
            || first_line.starts_with("@SQ")
            || first_line.starts_with("@RG")
            || first_line.starts_with("@PG")
            || first_line.starts_with("@CO")
        {
            return Some(Format::Sam);
        }
        if first_line.starts_with('@') {
            return Some(Format::Fastq);
        }
        if first_line.split('\t').count() >= 3 {
            return Some(Format::Bed);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_from_plain_extension() {
        assert_eq!(
            Format::detect_from_extension(Path::new("sample.vcf")),
            Some(Format::Vcf)
        );
        assert_eq!(
            Format::detect_from_extension(Path::new("sample.bed")),
            Some(Format::Bed)
        );
    }

    #[test]
    fn strips_one_compression_suffix_first() {
        assert_eq!(
            Format::detect_from_extension(Path::new("sample.vcf.gz")),
            Some(Format::Vcf)
        );
    }

    #[test]
    fn unknown_extension_is_none() {
        assert_eq!(Format::detect_from_extension(Path::new("sample.txt")), None);
    }

    #[test]
    fn detects_bcf_magic() {
        assert_eq!(
            Format::detect_from_magic(b"BCF\x02\x02\x00\x00"),
            Some(Format::Bcf)
        );
    }

    #[test]
    fn detects_vcf_from_meta_line() {
        assert_eq!(
            Format::detect_from_magic(b"##fileformat=VCFv4.3\n#CHROM\n"),
            Some(Format::Vcf)
        );
    }

    #[test]
    fn detects_fasta_from_leading_gt() {
        assert_eq!(Format::detect_from_magic(b">seq1\nACGT\n"), Some(Format::Fasta));
    }

    #[test]
    fn detects_sam_header_over_fastq() {
        assert_eq!(
            Format::detect_from_magic(b"@HD\tVN:1.6\n"),
            Some(Format::Sam)
        );
    }

    #[test]
    fn detects_fastq_from_bare_at() {
        assert_eq!(Format::detect_from_magic(b"@read1\nACGT\n+\nIIII\n"), Some(Format::Fastq));
    }
}
