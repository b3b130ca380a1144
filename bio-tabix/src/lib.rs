//! Tabix-style block index over BGZF virtual offsets (spec §3, §4.B).
//!
//! [`TabixIndex`] parses the `TBI` binary format ([`parse`]) into per-contig
//! [`ContigIndex`] tables; [`bin::region_to_bins`] implements the UCSC
//! R-tree bin arithmetic, and [`TabixIndex::region_to_chunks`] composes bin
//! lookup with the linear interval table to resolve a [`Region`] to
//! candidate BGZF [`index::Chunk`]s.

mod bin;
mod error;
mod index;
mod parse;
mod query;

pub use bin::{bin_for_position, region_to_bins, MAX_BIN_COORD};
pub use error::{Error, Result};
pub use index::{Bin, Chunk, ColumnLayout, ContigIndex, TabixIndex};
pub use query::{merge_chunks, Region};
