//! Sequential and threaded BGZF block readers implementing [`Read`].

use std::io::{BufRead, Cursor, Read, Seek, SeekFrom};

use flate2::read::DeflateDecoder;

use crate::bgzf::BlockHeader;
use crate::detect::Format;
use crate::error::{Error, Result};
use crate::workers::BlockWorkerPool;

/// Validate that `peek` (the bytes at a post-seek stream position) is the
/// start of a BGZF block, distinguishing two failure modes of spec §4.A's
/// seek contract ("a seek is valid only if `pos` is the start of a
/// compression block"; "the format detected must equal the previously
/// selected format — otherwise fail with a 'cannot restart decompression'
/// error"):
///
/// - bytes that match a *different* compression format's magic (e.g. a
///   plain-gz blob appended after a bgzf stream, spec §8 scenario 6) are
///   [`Error::FormatChangedAcrossSeek`], naming both formats;
/// - bytes that match no recognised compression format at all, or claim
///   to be bgzf but fail to parse as a well-formed block header, are the
///   generic [`Error::SeekNotBlockBoundary`].
fn validate_seek_target(peek: &[u8]) -> Result<()> {
    if peek.is_empty() {
        return Ok(()); // seeking exactly to EOF is a valid block boundary
    }
    match Format::detect(peek) {
        Format::Bgzf => {
            if BlockHeader::parse(&mut Cursor::new(peek)).is_err() {
                Err(Error::SeekNotBlockBoundary)
            } else {
                Ok(())
            }
        }
        Format::None => Err(Error::SeekNotBlockBoundary),
        other => Err(Error::FormatChangedAcrossSeek {
            before: Format::Bgzf,
            after: other,
        }),
    }
}

/// Counts bytes read through an inner reader.
struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> CountingReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

/// Read one complete BGZF block (header, compressed payload, 8-byte
/// trailer) from `r`. Returns `None` at a clean EOF, otherwise the block's
/// total on-disk size and its decompressed-on-demand DEFLATE payload —
/// the size is the stride between this block's start offset and the
/// next, i.e. the compressed component of a [`crate::bgzf::VirtualOffset`].
pub fn next_block<R: Read>(r: &mut R) -> Result<Option<(u64, Vec<u8>)>> {
    let mut first = [0u8; 1];
    match r.read(&mut first)? {
        0 => return Ok(None),
        _ => {}
    }

    let mut counted = CountingReader::new(Cursor::new(first).chain(&mut *r));
    let header = BlockHeader::parse(&mut counted)?;
    let header_len = counted.count;

    let remaining = header.block_size as u64 - header_len;
    let mut rest = vec![0u8; remaining as usize];
    r.read_exact(&mut rest)?;

    // rest = compressed payload (remaining - 8) ++ 8-byte trailer (CRC, ISIZE)
    let payload_len = rest.len().saturating_sub(8);
    Ok(Some((
        u64::from(header.block_size),
        rest[..payload_len].to_vec(),
    )))
}

/// Sequential (single-threaded) BGZF decompressing reader.
pub struct SequentialBgzfReader<R> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    eof: bool,
    /// Compressed byte offset of the block currently loaded into `buf`.
    current_block_offset: u64,
    /// Compressed byte offset the next block read will start at.
    next_block_offset: u64,
}

impl<R: Read> SequentialBgzfReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            pos: 0,
            eof: false,
            current_block_offset: 0,
            next_block_offset: 0,
        }
    }

    fn fill(&mut self) -> std::io::Result<()> {
        if self.eof {
            return Ok(());
        }
        match next_block(&mut self.inner).map_err(std::io::Error::other)? {
            None => self.eof = true,
            Some((block_size, compressed)) => {
                self.current_block_offset = self.next_block_offset;
                self.next_block_offset += block_size;
                let mut decoder = DeflateDecoder::new(&compressed[..]);
                self.buf.clear();
                decoder.read_to_end(&mut self.buf)?;
                self.pos = 0;
                if self.buf.is_empty() {
                    // EOF marker block decompresses to nothing; keep pulling.
                    return self.fill();
                }
            }
        }
        Ok(())
    }

    /// The virtual offset of the next byte this reader will yield: the
    /// current block's compressed start offset concatenated with the
    /// within-block decompressed position (spec §3, §6).
    pub fn virtual_offset(&self) -> crate::bgzf::VirtualOffset {
        crate::bgzf::VirtualOffset::new(self.current_block_offset, self.pos as u16)
    }
}

impl<R: Read> Read for SequentialBgzfReader<R> {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        if self.pos >= self.buf.len() {
            self.fill()?;
            if self.buf.is_empty() {
                return Ok(0);
            }
        }
        let n = out.len().min(self.buf.len() - self.pos);
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl<R: Read + Seek + BufRead> SequentialBgzfReader<R> {
    /// Seek the underlying stream to `pos` and restart block decoding from
    /// there, validating that `pos` lands on a BGZF block boundary.
    pub fn seek_to(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        let peek = self.inner.fill_buf()?;
        validate_seek_target(peek)?;
        self.buf.clear();
        self.pos = 0;
        self.eof = false;
        self.current_block_offset = pos;
        self.next_block_offset = pos;
        Ok(())
    }
}

/// Threaded BGZF decompressing reader: I/O stays sequential on the calling
/// thread, decompression is farmed out to a [`BlockWorkerPool`], and results
/// are delivered to the caller strictly in block order.
pub struct ThreadedBgzfReader<R> {
    inner: R,
    pool: BlockWorkerPool,
    worker_count: usize,
    next_seq: u64,
    submitted_up_to: u64,
    lookahead: u64,
    buf: Vec<u8>,
    pos: usize,
    eof: bool,
    /// Compressed byte offset the next block read from `inner` will start
    /// at, advanced in `top_up_submissions` as blocks are read off the wire.
    next_block_offset: u64,
    /// seq → compressed start offset, for blocks read ahead of `next_seq`.
    block_offsets: std::collections::BTreeMap<u64, u64>,
    /// Compressed byte offset of the block currently loaded into `buf`.
    current_block_offset: u64,
}

impl<R: Read> ThreadedBgzfReader<R> {
    pub fn new(inner: R, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let lookahead = (worker_count * 2) as u64;
        Self {
            inner,
            pool: BlockWorkerPool::new(worker_count),
            worker_count,
            next_seq: 0,
            submitted_up_to: 0,
            lookahead,
            buf: Vec::new(),
            pos: 0,
            eof: false,
            next_block_offset: 0,
            block_offsets: std::collections::BTreeMap::new(),
            current_block_offset: 0,
        }
    }

    fn top_up_submissions(&mut self) -> std::io::Result<()> {
        while !self.eof && self.submitted_up_to < self.next_seq + self.lookahead {
            match next_block(&mut self.inner).map_err(std::io::Error::other)? {
                None => self.eof = true,
                Some((block_size, compressed)) => {
                    self.block_offsets
                        .insert(self.submitted_up_to, self.next_block_offset);
                    self.next_block_offset += block_size;
                    self.pool
                        .submit(self.submitted_up_to, compressed)
                        .map_err(std::io::Error::other)?;
                    self.submitted_up_to += 1;
                }
            }
        }
        Ok(())
    }

    fn fill(&mut self) -> std::io::Result<()> {
        loop {
            self.top_up_submissions()?;
            if self.next_seq >= self.submitted_up_to {
                // Nothing left to decode.
                self.buf.clear();
                self.pos = 0;
                return Ok(());
            }
            let data = self
                .pool
                .recv_in_order(self.next_seq)
                .map_err(std::io::Error::other)?;
            if let Some(offset) = self.block_offsets.remove(&self.next_seq) {
                self.current_block_offset = offset;
            }
            self.next_seq += 1;
            if !data.is_empty() {
                self.buf = data;
                self.pos = 0;
                return Ok(());
            }
            // Empty block (e.g. the EOF marker); keep going.
        }
    }

    /// The virtual offset of the next byte this reader will yield (spec
    /// §3, §6). See [`SequentialBgzfReader::virtual_offset`].
    pub fn virtual_offset(&self) -> crate::bgzf::VirtualOffset {
        crate::bgzf::VirtualOffset::new(self.current_block_offset, self.pos as u16)
    }
}

impl<R: Read> Read for ThreadedBgzfReader<R> {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        if self.pos >= self.buf.len() {
            self.fill()?;
            if self.buf.is_empty() {
                return Ok(0);
            }
        }
        let n = out.len().min(self.buf.len() - self.pos);
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl<R: Read + Seek + BufRead> ThreadedBgzfReader<R> {
    /// Seek the underlying stream to `pos`, validate it lands on a BGZF
    /// block boundary, and restart the worker pool from a clean sequence.
    pub fn seek_to(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        let peek = self.inner.fill_buf()?;
        validate_seek_target(peek)?;
        self.pool = BlockWorkerPool::new(self.worker_count);
        self.next_seq = 0;
        self.submitted_up_to = 0;
        self.buf.clear();
        self.pos = 0;
        self.eof = false;
        self.next_block_offset = pos;
        self.current_block_offset = pos;
        self.block_offsets.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn make_block(payload: &[u8]) -> Vec<u8> {
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
        enc.write_all(payload).unwrap();
        let compressed = enc.finish().unwrap();

        let mut block = Vec::new();
        // header: magic, CM=8, FLG=4 (FEXTRA), MTIME=0, XFL, OS, XLEN=6
        block.extend_from_slice(&[0x1f, 0x8b, 0x08, 0x04, 0, 0, 0, 0, 0, 0xff]);
        block.extend_from_slice(&6u16.to_le_bytes());
        // BC subfield: SI1, SI2, SLEN=2, BSIZE
        block.push(b'B');
        block.push(b'C');
        block.extend_from_slice(&2u16.to_le_bytes());
        let total_len = 12 + 6 + compressed.len() + 8;
        block.extend_from_slice(&((total_len - 1) as u16).to_le_bytes());
        block.extend_from_slice(&compressed);
        // trailer: crc32 (unused by our decoder), isize
        block.extend_from_slice(&0u32.to_le_bytes());
        block.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        block
    }

    #[test]
    fn sequential_reader_decodes_two_blocks() {
        let mut data = make_block(b"hello ");
        data.extend_from_slice(&make_block(b"world"));

        let mut reader = SequentialBgzfReader::new(Cursor::new(data));
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello world");
    }

    #[test]
    fn seek_past_bgzf_into_a_plain_gz_blob_reports_format_change() {
        let mut data = make_block(b"hello ");
        let split = data.len();
        let mut gz_blob = Vec::new();
        {
            let mut enc = flate2::write::GzEncoder::new(&mut gz_blob, Compression::default());
            enc.write_all(b"trailing plain gzip payload").unwrap();
            enc.finish().unwrap();
        }
        data.extend_from_slice(&gz_blob);

        let mut reader = SequentialBgzfReader::new(Cursor::new(data));
        let err = reader.seek_to(split as u64).unwrap_err();
        assert!(matches!(
            err,
            Error::FormatChangedAcrossSeek {
                before: Format::Bgzf,
                after: Format::Gz,
            }
        ));
    }

    #[test]
    fn threaded_reader_preserves_order() {
        let mut data = Vec::new();
        for i in 0..10 {
            data.extend_from_slice(&make_block(format!("{i}-").as_bytes()));
        }

        let mut reader = ThreadedBgzfReader::new(Cursor::new(data), 4);
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "0-1-2-3-4-5-6-7-8-9-");
    }
}
