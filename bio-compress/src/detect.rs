//! Magic-byte detection of the four supported compression formats.
//!
//! Detection reads the first 18 bytes of a stream and matches them against
//! per-format predicates in a fixed order: bgzf, gz, bz2, zstd, none. BGZF is
//! distinguished from plain gz by the `BC\x02\x00` extra-field subtag that
//! Blizzard's BLTE-adjacent tooling and `samtools` both rely on.

/// Number of leading bytes peeked to run format detection.
pub const PEEK_LEN: usize = 18;

/// A detected (or absent) compression format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Block-gzip: gzip members with a `BC` extra-field block-size subtag.
    Bgzf,
    /// Plain gzip (RFC 1952).
    Gz,
    /// bzip2.
    Bz2,
    /// Zstandard.
    Zstd,
    /// No recognised compression; bytes are passed through unchanged.
    None,
}

impl Format {
    /// Guess the format from the first bytes of a stream.
    ///
    /// `peek` may be shorter than [`PEEK_LEN`] (e.g. a truncated file); the
    /// predicates only examine as many bytes as they need and are declared
    /// in priority order, matching spec §6.
    pub fn detect(peek: &[u8]) -> Self {
        if is_bgzf(peek) {
            Format::Bgzf
        } else if is_gz(peek) {
            Format::Gz
        } else if is_bz2(peek) {
            Format::Bz2
        } else if is_zstd(peek) {
            Format::Zstd
        } else {
            Format::None
        }
    }

    /// Guess the format from a target path's extension, for output-side
    /// auto-detection (spec §4.A "Output side").
    pub fn detect_from_extension(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bgz") | Some("bgzf") => Format::Bgzf,
            Some("gz") => {
                // `.vcf.gz`/`.sam.gz` style files in this domain are
                // conventionally BGZF, not plain gzip.
                Format::Bgzf
            }
            Some("bz2") => Format::Bz2,
            Some("zst") => Format::Zstd,
            _ => Format::None,
        }
    }
}

/// `1f 8b 08 04 ?? ?? ?? ?? ?? ?? 06 00 42 43 02 00 ?? ??`
fn is_bgzf(b: &[u8]) -> bool {
    if b.len() < 18 {
        return false;
    }
    b[0] == 0x1f
        && b[1] == 0x8b
        && b[2] == 0x08
        && b[3] == 0x04
        && b[10] == 0x06
        && b[11] == 0x00
        && b[12] == b'B'
        && b[13] == b'C'
        && b[14] == 0x02
        && b[15] == 0x00
}

/// `1f 8b 08 ..`
fn is_gz(b: &[u8]) -> bool {
    b.len() >= 3 && b[0] == 0x1f && b[1] == 0x8b && b[2] == 0x08
}

/// `42 5a 68`
fn is_bz2(b: &[u8]) -> bool {
    b.len() >= 3 && b[0] == 0x42 && b[1] == 0x5a && b[2] == 0x68
}

/// `28 b5 2f fd`
fn is_zstd(b: &[u8]) -> bool {
    b.len() >= 4 && b[0] == 0x28 && b[1] == 0xb5 && b[2] == 0x2f && b[3] == 0xfd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_bgzf() {
        let data = [
            0x1f, 0x8b, 0x08, 0x04, 0, 0, 0, 0, 0, 0, 0x06, 0x00, b'B', b'C', 0x02, 0x00, 0x1b,
            0x00,
        ];
        assert_eq!(Format::detect(&data), Format::Bgzf);
    }

    #[test]
    fn distinguishes_plain_gz_from_bgzf() {
        let data = [0x1f, 0x8b, 0x08, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(Format::detect(&data), Format::Gz);
    }

    #[test]
    fn detects_bz2() {
        assert_eq!(Format::detect(b"BZh91AY&SY"), Format::Bz2);
    }

    #[test]
    fn detects_zstd() {
        assert_eq!(Format::detect(&[0x28, 0xb5, 0x2f, 0xfd, 0, 0]), Format::Zstd);
    }

    #[test]
    fn detects_none() {
        assert_eq!(Format::detect(b"plain text content"), Format::None);
    }

    #[test]
    fn short_peek_is_not_bgzf() {
        assert_eq!(Format::detect(&[0x1f, 0x8b, 0x08]), Format::Gz);
    }
}
