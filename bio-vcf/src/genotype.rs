//! `GT` genotype string ↔ BCF per-allele integer codec.
//!
//! VCF stores genotypes as a `/`- or `|`-separated allele-index string
//! (`"0|0"`, `"1/1"`, `".|1"`); BCF stores the same information as one
//! signed integer per allele, `(allele_index + 1) << 1 | phased_bit`, with
//! a missing allele encoded as index `-1` (spec §4.E "BCF", testable
//! property 4). This module is the single place both format handlers call
//! into so the two encodings never drift apart.

use crate::error::{Error, Location, Result};

/// One allele slot of a genotype: `None` is a missing allele (`.`); `phased`
/// records whether *this* allele is joined to the previous one with `|`
/// rather than `/` (the separator preceding an allele determines its own
/// phased-ness; the first allele in a genotype is never itself "phased to"
/// anything and always decodes/encodes with `phased = false`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allele {
    pub index: Option<u32>,
    pub phased: bool,
}

/// Parse a VCF genotype string (`"0/1"`, `"1|1"`, `"."`, `"./."`) into its
/// alleles.
pub fn parse(gt: &str) -> Vec<Allele> {
    if gt.is_empty() {
        return Vec::new();
    }
    let mut alleles = Vec::new();
    let mut first = true;
    for token in split_alleles(gt) {
        let (text, phased) = token;
        let phased = if first { false } else { phased };
        first = false;
        let index = if text == "." {
            None
        } else {
            text.parse::<u32>().ok()
        };
        alleles.push(Allele { index, phased });
    }
    alleles
}

/// Split `gt` into `(allele_text, preceding_separator_is_phased)` pairs;
/// the first element's separator flag is meaningless (there is none) and
/// is always `false`.
fn split_alleles(gt: &str) -> Vec<(&str, bool)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut pending_phased = false;
    for (i, c) in gt.char_indices() {
        if c == '/' || c == '|' {
            out.push((&gt[start..i], pending_phased));
            pending_phased = c == '|';
            start = i + 1;
        }
    }
    out.push((&gt[start..], pending_phased));
    out
}

/// Render alleles back into a VCF genotype string.
#[must_use]
pub fn render(alleles: &[Allele]) -> String {
    let mut out = String::new();
    for (i, allele) in alleles.iter().enumerate() {
        if i > 0 {
            out.push(if allele.phased { '|' } else { '/' });
        }
        match allele.index {
            Some(idx) => out.push_str(&idx.to_string()),
            None => out.push('.'),
        }
    }
    out
}

/// Encode alleles into BCF's per-allele signed integers:
/// `(index + 1) << 1 | phased`, with a missing allele encoded as index
/// `-1` so the formula naturally yields `0` (unphased missing) or `1`
/// (phased missing).
#[must_use]
pub fn encode(alleles: &[Allele]) -> Vec<i32> {
    alleles
        .iter()
        .map(|a| {
            let idx = a.index.map_or(-1i64, i64::from);
            (((idx + 1) << 1) | i64::from(a.phased)) as i32
        })
        .collect()
}

/// Decode BCF per-allele integers back into [`Allele`]s.
pub fn decode(raw: &[i32]) -> Result<Vec<Allele>> {
    raw.iter()
        .map(|&v| {
            if v < 0 {
                return Err(Error::Parse {
                    location: Location::ByteOffset(0),
                    message: format!("negative BCF genotype integer: {v}"),
                });
            }
            let phased = (v & 1) != 0;
            let idx = (v >> 1) - 1;
            let index = if idx < 0 { None } else { Some(idx as u32) };
            Ok(Allele { index, phased })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unphased_homozygous() {
        let alleles = parse("0/0");
        assert_eq!(
            alleles,
            vec![
                Allele { index: Some(0), phased: false },
                Allele { index: Some(0), phased: false },
            ]
        );
    }

    #[test]
    fn parses_phased_heterozygous() {
        let alleles = parse("1|0");
        assert_eq!(
            alleles,
            vec![
                Allele { index: Some(1), phased: false },
                Allele { index: Some(0), phased: true },
            ]
        );
    }

    #[test]
    fn parses_missing_allele() {
        let alleles = parse("./1");
        assert_eq!(alleles[0].index, None);
        assert_eq!(alleles[1].index, Some(1));
    }

    #[test]
    fn round_trips_through_bcf_integers() {
        for text in ["0|0", "1|0", "1/1", "./.", ".|1"] {
            let alleles = parse(text);
            let ints = encode(&alleles);
            let decoded = decode(&ints).unwrap();
            assert_eq!(render(&decoded), text);
        }
    }

    #[test]
    fn encode_matches_bcf_convention() {
        // 0|0 -> allele 0, phase 0 for the first (by convention) -> (0+1)<<1|0 = 2
        // second allele phased -> (0+1)<<1|1 = 3
        let alleles = parse("0|0");
        assert_eq!(encode(&alleles), vec![2, 3]);

        let missing = parse(".");
        assert_eq!(encode(&missing), vec![0]);
    }
}
