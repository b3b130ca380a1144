//! UCSC R-tree bin arithmetic over the 512 Mbp tabix window (spec §3, §4.B).

/// Tabix clamps the end of any interval to this window size before binning.
pub const MAX_BIN_COORD: u64 = 1 << 29;

/// `(offset, shift)` per bin level, shallowest (whole-genome) first.
const LEVELS: [(u32, u32); 6] = [
    (0, 29),
    (1, 26),
    (9, 23),
    (73, 20),
    (585, 17),
    (4681, 14),
];

/// Enumerate every bin (across all six levels) that could contain a record
/// overlapping the half-open interval `[beg, end)`.
///
/// `end` is clamped to [`MAX_BIN_COORD`]; returns empty when `beg >= end`
/// after clamping (spec §4.B).
#[must_use]
pub fn region_to_bins(beg: u64, end: u64) -> Vec<u32> {
    let end = end.min(MAX_BIN_COORD);
    if beg >= end {
        return Vec::new();
    }
    let last = end - 1;

    let mut bins = Vec::with_capacity(LEVELS.len());
    for (off, shift) in LEVELS {
        let lo = u32::from(off) + (beg >> shift) as u32;
        let hi = u32::from(off) + (last >> shift) as u32;
        bins.extend(lo..=hi);
    }
    bins
}

/// Numeric identifier of the bin that a single 0-based position falls in at
/// the deepest (16 Kbp) level — used by writers computing which bin to
/// file a record's chunk under.
#[must_use]
pub const fn bin_for_position(pos: u64) -> u32 {
    const LEVELS_CONST: [(u32, u32); 6] = LEVELS;
    let mut level = 0;
    let mut bin = 0u32;
    while level < LEVELS_CONST.len() {
        let (off, shift) = LEVELS_CONST[level];
        bin = off + (pos >> shift) as u32;
        level += 1;
    }
    bin
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn whole_genome_bin_is_always_included() {
        let bins = region_to_bins(0, 1000);
        assert!(bins.contains(&0));
    }

    #[test]
    fn empty_region_returns_no_bins() {
        assert!(region_to_bins(100, 100).is_empty());
        assert!(region_to_bins(200, 100).is_empty());
    }

    #[test]
    fn no_bin_is_repeated_within_a_query() {
        let bins = region_to_bins(1_000_000, 5_000_000);
        let unique: HashSet<_> = bins.iter().copied().collect();
        assert_eq!(bins.len(), unique.len());
    }

    #[test]
    fn end_is_clamped_to_max_window() {
        let a = region_to_bins(0, MAX_BIN_COORD);
        let b = region_to_bins(0, MAX_BIN_COORD * 4);
        assert_eq!(a, b);
    }

    #[test]
    fn single_base_region_has_six_bins() {
        // One bin per level, since a single base falls in exactly one bin
        // at each of the six depths.
        let bins = region_to_bins(5000, 5001);
        assert_eq!(bins.len(), 6);
    }
}
