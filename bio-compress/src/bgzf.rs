//! BGZF virtual offsets and per-block header parsing.
//!
//! A BGZF file is a concatenation of gzip members, each carrying a `BC`
//! extra-field subtag whose payload is the block's total size on disk minus
//! one. This module decodes that per-block header and the 64-bit virtual
//! offset addressing scheme built on top of it (spec §3, §6).

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

use crate::error::{Error, Result};

/// A 64-bit virtual offset into a BGZF stream.
///
/// Encodes `(compressed block start offset : 48 bits) concat (uncompressed
/// offset within block : 16 bits)`. Total-ordered by comparing the
/// compressed offset, then the uncompressed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualOffset(u64);

impl VirtualOffset {
    /// The zero virtual offset (start of file, start of block).
    pub const MIN: VirtualOffset = VirtualOffset(0);

    /// Construct from the raw 64-bit encoding (as read from an index file).
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Construct from a (compressed block offset, uncompressed offset) pair.
    ///
    /// `uncompressed_offset` must fit in 16 bits.
    pub const fn new(compressed_block_offset: u64, uncompressed_offset: u16) -> Self {
        Self((compressed_block_offset << 16) | uncompressed_offset as u64)
    }

    /// The raw 64-bit encoding.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Byte offset of the compressed block start, within the underlying file.
    pub const fn compressed_block_offset(self) -> u64 {
        self.0 >> 16
    }

    /// Byte offset within the block's decompressed data.
    pub const fn uncompressed_offset(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

impl From<u64> for VirtualOffset {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<VirtualOffset> for u64 {
    fn from(vo: VirtualOffset) -> Self {
        vo.0
    }
}

/// Parsed gzip-member header for one BGZF block.
#[derive(Debug, Clone, Copy)]
pub struct BlockHeader {
    /// Total size of the block on disk (header + compressed payload + CRC/ISIZE trailer).
    pub block_size: u32,
}

impl BlockHeader {
    /// Parse a BGZF block header at the reader's current position.
    ///
    /// Leaves the reader positioned at the start of the DEFLATE payload.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        let mut fixed = [0u8; 12];
        r.read_exact(&mut fixed)?;
        if fixed[0] != 0x1f || fixed[1] != 0x8b || fixed[2] != 0x08 || fixed[3] != 0x04 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "not a BGZF block (bad gzip/FEXTRA header)",
            )));
        }
        let xlen = u16::from_le_bytes([fixed[10], fixed[11]]);

        let mut extra = vec![0u8; xlen as usize];
        r.read_exact(&mut extra)?;

        let mut bsize = None;
        let mut i = 0usize;
        while i + 4 <= extra.len() {
            let si1 = extra[i];
            let si2 = extra[i + 1];
            let slen = u16::from_le_bytes([extra[i + 2], extra[i + 3]]) as usize;
            let payload_start = i + 4;
            if si1 == b'B' && si2 == b'C' && slen == 2 && payload_start + 2 <= extra.len() {
                let val = u16::from_le_bytes([extra[payload_start], extra[payload_start + 1]]);
                bsize = Some(val as u32 + 1);
            }
            i = payload_start + slen;
        }

        let block_size = bsize.ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "BGZF block missing BC subfield",
            ))
        })?;

        Ok(Self { block_size })
    }
}

/// Read the trailing CRC32/ISIZE of a gzip member, returning the
/// decompressed size (ISIZE, mod 2^32 per the gzip spec).
pub fn read_trailer<R: Read>(r: &mut R) -> Result<u32> {
    let _crc32 = r.read_u32::<LittleEndian>()?;
    let isize = r.read_u32::<LittleEndian>()?;
    Ok(isize)
}

/// The canonical 28-byte empty BGZF EOF marker.
pub const EOF_MARKER: [u8; 28] = [
    0x1f, 0x8b, 0x08, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0x06, 0x00, 0x42, 0x43, 0x02, 0x00,
    0x1b, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn virtual_offset_roundtrip() {
        let vo = VirtualOffset::new(123_456, 42);
        assert_eq!(vo.compressed_block_offset(), 123_456);
        assert_eq!(vo.uncompressed_offset(), 42);
        assert_eq!(VirtualOffset::from_raw(vo.raw()), vo);
    }

    #[test]
    fn virtual_offset_ordering() {
        let a = VirtualOffset::new(10, 500);
        let b = VirtualOffset::new(11, 0);
        assert!(a < b);
        let c = VirtualOffset::new(10, 600);
        assert!(a < c);
    }

    #[test]
    fn parses_eof_marker_block_size() {
        let header = BlockHeader::parse(&mut Cursor::new(&EOF_MARKER[..])).unwrap();
        assert_eq!(header.block_size, EOF_MARKER.len() as u32);
    }

    #[test]
    fn rejects_non_bgzf_gzip() {
        let data = [0x1f, 0x8b, 0x08, 0x00, 0, 0, 0, 0, 0, 0];
        let err = BlockHeader::parse(&mut Cursor::new(&data[..])).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
