//! `region → chunks`: resolving a genomic region to candidate BGZF byte
//! ranges via the linear index and bin lookup table (spec §4.B).

use bio_compress::VirtualOffset;

use crate::bin::region_to_bins;
use crate::error::{Error, Result};
use crate::index::{Chunk, TabixIndex};

/// A half-open genomic region `[beg, end)` on a named reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Reference/chrom name, resolved through [`TabixIndex::names_map`].
    pub chrom: String,
    /// 0-based inclusive start.
    pub beg: u64,
    /// 0-based exclusive end.
    pub end: u64,
}

impl TabixIndex {
    /// Resolve `region` to the set of BGZF chunks that might contain
    /// overlapping records.
    ///
    /// 1. Resolves `region.chrom` through `names_map`, failing with
    ///    [`Error::UnknownContig`] if absent.
    /// 2. Looks up the minimum virtual offset for `region.beg`'s 16 KiB
    ///    linear interval; an interval index past the table end yields no
    ///    chunks.
    /// 3. Enumerates candidate bins and emits every chunk in each bin whose
    ///    end is past that minimum offset.
    ///
    /// The caller is responsible for seeking to each chunk's start, reading
    /// records until the chunk's end or a position past `region.end`, and
    /// post-filtering for true overlap (spec §4.H).
    pub fn region_to_chunks(&self, region: &Region) -> Result<Vec<Chunk>> {
        if region.beg >= region.end {
            return Err(Error::InvalidRegion {
                beg: region.beg,
                end: region.end,
            });
        }

        let contig_pos = self
            .contig_position(&region.chrom)
            .ok_or_else(|| Error::UnknownContig(region.chrom.clone()))?;
        let contig = &self.contigs[contig_pos];

        let linear_interval_i = (region.beg >> 14) as usize;
        if linear_interval_i >= contig.linear_intervals.len() {
            return Ok(Vec::new());
        }
        let min_voffset = contig.linear_intervals[linear_interval_i];

        let candidate_bins = region_to_bins(region.beg, region.end);
        let mut chunks = Vec::new();
        for bin_id in candidate_bins {
            let Some(bin) = contig.bins.get(&bin_id) else {
                continue;
            };
            for &(cnk_beg, cnk_end) in &bin.chunks {
                if cnk_end > min_voffset {
                    chunks.push((cnk_beg, cnk_end));
                }
            }
        }
        Ok(chunks)
    }
}

/// Sort chunks by start offset and merge adjacent/overlapping ranges, so
/// the reader seeks to each distinct BGZF span at most once (spec §4.H:
/// "sort-merge overlapping chunks").
#[must_use]
pub fn merge_chunks(mut chunks: Vec<Chunk>) -> Vec<Chunk> {
    chunks.sort_by_key(|&(beg, _)| beg);
    let mut merged: Vec<Chunk> = Vec::with_capacity(chunks.len());
    for (beg, end) in chunks {
        if let Some(last) = merged.last_mut() {
            if beg <= last.1 {
                if end > last.1 {
                    last.1 = end;
                }
                continue;
            }
        }
        merged.push((beg, end));
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::index::{Bin, ColumnLayout, ContigIndex};
    use std::collections::HashMap;

    fn vo(block: u64, within: u16) -> VirtualOffset {
        VirtualOffset::new(block, within)
    }

    fn sample_index() -> TabixIndex {
        let mut bins = HashMap::new();
        bins.insert(
            4681,
            Bin {
                id: 4681,
                chunks: vec![(vo(0, 0), vo(1000, 0))],
            },
        );
        let contig = ContigIndex {
            bins,
            linear_intervals: vec![vo(0, 0)],
        };
        TabixIndex {
            layout: ColumnLayout {
                format: 2,
                col_seq: 1,
                col_beg: 2,
                col_end: 0,
                meta: i32::from(b'#'),
                skip: 0,
            },
            names: vec!["chr1".to_string()],
            names_map: HashMap::from([("chr1".to_string(), 0)]),
            contigs: vec![contig],
            n_no_coor: None,
        }
    }

    #[test]
    fn unknown_contig_is_a_dedicated_error() {
        let idx = sample_index();
        let region = Region {
            chrom: "chrZZ".to_string(),
            beg: 0,
            end: 10,
        };
        let err = idx.region_to_chunks(&region).unwrap_err();
        assert!(matches!(err, Error::UnknownContig(name) if name == "chrZZ"));
    }

    #[test]
    fn chunk_past_min_voffset_is_returned() {
        let idx = sample_index();
        let region = Region {
            chrom: "chr1".to_string(),
            beg: 100,
            end: 200,
        };
        let chunks = idx.region_to_chunks(&region).unwrap();
        assert_eq!(chunks, vec![(vo(0, 0), vo(1000, 0))]);
    }

    #[test]
    fn interval_past_linear_table_returns_empty() {
        let idx = sample_index();
        let region = Region {
            chrom: "chr1".to_string(),
            beg: 1 << 20, // far past the single linear interval
            end: (1 << 20) + 10,
        };
        assert!(idx.region_to_chunks(&region).unwrap().is_empty());
    }

    #[test]
    fn merge_chunks_combines_overlapping_ranges() {
        let chunks = vec![
            (vo(0, 0), vo(100, 0)),
            (vo(50, 0), vo(150, 0)),
            (vo(200, 0), vo(300, 0)),
        ];
        let merged = merge_chunks(chunks);
        assert_eq!(
            merged,
            vec![(vo(0, 0), vo(150, 0)), (vo(200, 0), vo(300, 0))]
        );
    }
}
