//! In-memory representation of a parsed tabix index (spec §3, §4.B).

use std::collections::HashMap;

use bio_compress::VirtualOffset;

/// A BGZF byte-range chunk, as virtual offsets `[begin, end)`.
pub type Chunk = (VirtualOffset, VirtualOffset);

/// One R-tree bin: its numeric id and the chunks of records it covers.
#[derive(Debug, Clone)]
pub struct Bin {
    /// The bin's numeric id (spec §3 bin-numbering scheme).
    pub id: u32,
    /// Virtual-offset chunks of records falling in this bin.
    pub chunks: Vec<Chunk>,
}

/// Per-reference-contig index: a bin lookup table plus the 16 KiB linear
/// interval table used to establish a minimum starting offset for a query.
#[derive(Debug, Clone, Default)]
pub struct ContigIndex {
    /// Bin id → bin, for O(1) lookup during chunk enumeration.
    pub bins: HashMap<u32, Bin>,
    /// `offsets[i]` is the minimum virtual offset at which any record
    /// overlapping 16 KiB interval `i` (`[i << 14, (i+1) << 14)`) can
    /// start.
    pub linear_intervals: Vec<VirtualOffset>,
}

/// Column layout of the underlying tab-delimited text file this index was
/// built from — the textual part of the `TBI` header (spec §4.B).
#[derive(Debug, Clone, Copy)]
pub struct ColumnLayout {
    /// Generic-format discriminant stored on disk (e.g. 0=generic, 1=SAM, 2=VCF).
    pub format: i32,
    /// 1-based column index holding the reference/chrom name.
    pub col_seq: i32,
    /// 1-based column index holding the start coordinate.
    pub col_beg: i32,
    /// 1-based column index holding the end coordinate (may equal `col_beg`).
    pub col_end: i32,
    /// Byte value marking a comment/header line to skip (e.g. `#`).
    pub meta: i32,
    /// Number of leading lines to unconditionally skip (for formats like
    /// VCF whose header lines don't all start with `meta`).
    pub skip: i32,
}

/// A fully parsed tabix index: one [`ContigIndex`] per reference, a
/// name→position map, and the optional count of unplaced records.
#[derive(Debug, Clone)]
pub struct TabixIndex {
    /// Column layout recorded in the index header.
    pub layout: ColumnLayout,
    /// Reference names in file order.
    pub names: Vec<String>,
    /// Reference name → position in `names`/`contigs`.
    pub names_map: HashMap<String, usize>,
    /// Per-contig bin/linear-interval tables, parallel to `names`.
    pub contigs: Vec<ContigIndex>,
    /// Count of records with no coordinate (unplaced), if the trailing
    /// `n_no_coor` field was present.
    pub n_no_coor: Option<u64>,
}

impl TabixIndex {
    /// Position of `name` in the reference name list.
    #[must_use]
    pub fn contig_position(&self, name: &str) -> Option<usize> {
        self.names_map.get(name).copied()
    }
}
