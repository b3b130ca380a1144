//! On-disk parsing of the `TBI` binary index format (spec §4.B, §6).
//!
//! Layout (little-endian throughout, bgzf-compressed on disk):
//! `magic(4="TBI\x01") ‖ n_ref:i32 ‖ format:i32 ‖ col_seq:i32 ‖ col_beg:i32
//! ‖ col_end:i32 ‖ meta:i32 ‖ skip:i32 ‖ l_nm:i32 ‖ names[l_nm]` followed by
//! `n_ref` index blocks, each `n_bin:i32 ‖ {bin:u32, n_chunk:i32,
//! {cnk_beg:u64, cnk_end:u64}×n_chunk}×n_bin ‖ n_intv:i32 ‖ offset[i]:u64
//! ×n_intv`, with an optional trailing `n_no_coor:u64`.

use std::collections::HashMap;
use std::io::{Read, Seek};

use bio_compress::{ReaderOptions, TransparentIStream, VirtualOffset};
use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};
use crate::index::{Bin, ColumnLayout, ContigIndex, TabixIndex};

const MAGIC: &[u8; 4] = b"TBI\x01";

impl TabixIndex {
    /// Parse a tabix index from a filesystem path (transparently
    /// decompressing the bgzf wrapper).
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let stream = TransparentIStream::open(path, ReaderOptions::default())?;
        Self::parse(stream)
    }

    /// Parse a tabix index from an already-decompressing or raw reader.
    ///
    /// Accepts anything implementing [`Read`]; callers that already have a
    /// [`TransparentIStream`] (or any other bgzf-aware source) can pass it
    /// directly — this function itself does no decompression.
    pub fn parse<R: Read>(mut r: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(Error::BadMagic);
        }

        let n_ref = r.read_i32::<LittleEndian>()?;
        let format = r.read_i32::<LittleEndian>()?;
        let col_seq = r.read_i32::<LittleEndian>()?;
        let col_beg = r.read_i32::<LittleEndian>()?;
        let col_end = r.read_i32::<LittleEndian>()?;
        let meta = r.read_i32::<LittleEndian>()?;
        let skip = r.read_i32::<LittleEndian>()?;
        let l_nm = r.read_i32::<LittleEndian>()?;

        let mut name_bytes = vec![0u8; l_nm as usize];
        r.read_exact(&mut name_bytes)?;
        let names: Vec<String> = name_bytes
            .split(|&b| b == 0)
            .filter(|s| !s.is_empty())
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .collect();

        let mut names_map = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            names_map.insert(name.clone(), i);
        }

        let mut contigs = Vec::with_capacity(n_ref.max(0) as usize);
        for _ in 0..n_ref {
            contigs.push(parse_contig(&mut r)?);
        }

        let n_no_coor = match r.read_u64::<LittleEndian>() {
            Ok(v) => Some(v),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => None,
            Err(e) => return Err(e.into()),
        };

        Ok(TabixIndex {
            layout: ColumnLayout {
                format,
                col_seq,
                col_beg,
                col_end,
                meta,
                skip,
            },
            names,
            names_map,
            contigs,
            n_no_coor,
        })
    }
}

fn parse_contig<R: Read>(r: &mut R) -> Result<ContigIndex> {
    let n_bin = r.read_i32::<LittleEndian>()?;
    let mut bins = HashMap::with_capacity(n_bin.max(0) as usize);
    for _ in 0..n_bin {
        let id = r.read_u32::<LittleEndian>()?;
        let n_chunk = r.read_i32::<LittleEndian>()?;
        let mut chunks = Vec::with_capacity(n_chunk.max(0) as usize);
        for _ in 0..n_chunk {
            let beg = VirtualOffset::from_raw(r.read_u64::<LittleEndian>()?);
            let end = VirtualOffset::from_raw(r.read_u64::<LittleEndian>()?);
            chunks.push((beg, end));
        }
        bins.insert(id, Bin { id, chunks });
    }

    let n_intv = r.read_i32::<LittleEndian>()?;
    let mut linear_intervals = Vec::with_capacity(n_intv.max(0) as usize);
    for _ in 0..n_intv {
        linear_intervals.push(VirtualOffset::from_raw(r.read_u64::<LittleEndian>()?));
    }

    tracing::debug!(n_bin, n_intv, "parsed tabix contig block");

    Ok(ContigIndex {
        bins,
        linear_intervals,
    })
}

/// Require `R: Seek` too, so callers who hold the raw file (not a stream)
/// can still reuse [`TabixIndex::parse`] without double-buffering.
pub fn open_seekable<R: Read + Seek>(r: R) -> Result<TabixIndex> {
    TabixIndex::parse(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn rejects_bad_magic() {
        let err = TabixIndex::parse(Cursor::new(b"NOPE".to_vec())).unwrap_err();
        assert!(matches!(err, Error::BadMagic));
    }

    #[test]
    fn parses_minimal_single_contig_index() {
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&1i32.to_le_bytes()); // n_ref
        buf.extend_from_slice(&2i32.to_le_bytes()); // format
        buf.extend_from_slice(&1i32.to_le_bytes()); // col_seq
        buf.extend_from_slice(&2i32.to_le_bytes()); // col_beg
        buf.extend_from_slice(&0i32.to_le_bytes()); // col_end
        buf.extend_from_slice(&(b'#' as i32).to_le_bytes()); // meta
        buf.extend_from_slice(&0i32.to_le_bytes()); // skip

        let name = b"chr1\0";
        buf.extend_from_slice(&(name.len() as i32).to_le_bytes());
        buf.extend_from_slice(name);

        // one contig: one bin with one chunk, one linear interval
        buf.extend_from_slice(&1i32.to_le_bytes()); // n_bin
        buf.extend_from_slice(&4681u32.to_le_bytes()); // bin id
        buf.extend_from_slice(&1i32.to_le_bytes()); // n_chunk
        buf.extend_from_slice(&VirtualOffset::new(0, 0).raw().to_le_bytes());
        buf.extend_from_slice(&VirtualOffset::new(100, 0).raw().to_le_bytes());
        buf.extend_from_slice(&1i32.to_le_bytes()); // n_intv
        buf.extend_from_slice(&VirtualOffset::new(0, 0).raw().to_le_bytes());

        let idx = TabixIndex::parse(Cursor::new(buf)).unwrap();
        assert_eq!(idx.names, vec!["chr1"]);
        assert_eq!(idx.contig_position("chr1"), Some(0));
        assert_eq!(idx.contigs[0].bins.len(), 1);
        assert!(idx.contigs[0].bins.contains_key(&4681));
        assert_eq!(idx.n_no_coor, None);
    }
}
