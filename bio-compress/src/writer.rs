//! Transparent, format-selecting compressing writer.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use bzip2::write::BzEncoder;
use bzip2::Compression as Bz2Level;
use flate2::write::GzEncoder;
use flate2::Compression as GzLevel;
use zstd::stream::write::Encoder as ZstdEncoder;

use crate::detect::Format;
use crate::error::{Error, Result};
use crate::options::WriterOptions;
use crate::workers::BlockCompressPool;

/// Flush a BGZF block-compressed stream, writing the trailing empty EOF
/// marker block on [`TransparentOStream::finish`].
const BGZF_BLOCK_HEADER_LEN: usize = 18;

enum Inner<W: Write> {
    None(W),
    Gz(Box<GzEncoder<W>>),
    Bz2(Box<BzEncoder<W>>),
    Zstd(Box<ZstdEncoder<'static, W>>),
    Bgzf(Box<BgzfWriter<W>>),
}

/// A transparently compressing output stream.
///
/// The target format is derived from the destination path's extension (or
/// an explicit [`WriterOptions::format`] override) and presents a single
/// uniform [`Write`] surface; [`finish`](TransparentOStream::finish) must be
/// called to flush trailing framing (gzip/bzip2/zstd footers, or the BGZF
/// EOF marker) — dropping the stream without calling it may leave a
/// truncated file.
pub struct TransparentOStream<W: Write> {
    inner: Option<Inner<W>>,
    format: Format,
}

impl TransparentOStream<File> {
    /// Create `path`, deriving (or honoring an explicit override in
    /// `options`) its compression format from the extension.
    pub fn create<P: AsRef<Path>>(path: P, options: WriterOptions) -> Result<Self> {
        let detected = Format::detect_from_extension(path.as_ref());
        let file = File::create(path)?;
        Self::new(file, detected, options)
    }
}

impl<W: Write> TransparentOStream<W> {
    /// Wrap an already-open byte sink. `detected_format` is the format
    /// implied by the destination (e.g. from a path extension); pass
    /// [`Format::None`] when there is no such hint and the caller must rely
    /// entirely on `options.format`.
    pub fn new(inner: W, detected_format: Format, options: WriterOptions) -> Result<Self> {
        if !(-1..=9).contains(&options.compression_level) {
            return Err(Error::InvalidCompressionLevel(options.compression_level));
        }

        let format = options.format.unwrap_or(detected_format);

        if format == Format::Bgzf && options.threads < 2 {
            return Err(Error::SingleThreadBgzfWrite);
        }

        let level = if options.compression_level < 0 {
            6
        } else {
            options.compression_level as u32
        };

        let inner = match format {
            Format::None => Inner::None(inner),
            Format::Gz => Inner::Gz(Box::new(GzEncoder::new(inner, GzLevel::new(level)))),
            Format::Bz2 => Inner::Bz2(Box::new(BzEncoder::new(inner, Bz2Level::new(level)))),
            Format::Zstd => {
                let level = if options.compression_level < 0 {
                    3
                } else {
                    options.compression_level
                };
                Inner::Zstd(Box::new(ZstdEncoder::new(inner, level)?))
            }
            Format::Bgzf => Inner::Bgzf(Box::new(BgzfWriter::new(
                inner,
                level,
                options.block_size,
                options.threads - 1,
            ))),
        };

        Ok(Self {
            inner: Some(inner),
            format,
        })
    }

    /// The compression format this stream was opened with.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Flush any buffered data and finalize trailing framing, returning the
    /// underlying writer.
    pub fn finish(mut self) -> Result<W> {
        match self.inner.take().expect("finish called once") {
            Inner::None(w) => Ok(w),
            Inner::Gz(enc) => Ok(enc.finish()?),
            Inner::Bz2(enc) => Ok(enc.finish()?),
            Inner::Zstd(enc) => Ok(enc.finish()?),
            Inner::Bgzf(w) => w.finish(),
        }
    }
}

impl<W: Write> Drop for TransparentOStream<W> {
    /// Finalize trailing framing if [`TransparentOStream::finish`] was
    /// never called explicitly (spec §4.F: "destruction ... must flush and
    /// close the compression layer"). The underlying writer is dropped
    /// along with it, so callers that need it back (e.g. to close a file
    /// handle deliberately, or inspect bytes written to an in-memory
    /// buffer) should call `finish` instead. Any error here is logged, not
    /// propagated — a destructor has no caller to propagate to — and a
    /// drop during unwinding is silent, matching the "swallow the
    /// secondary error" rule.
    fn drop(&mut self) {
        let Some(inner) = self.inner.take() else {
            return; // already finished
        };
        let result: Result<()> = match inner {
            Inner::None(mut w) => w.flush().map_err(Error::from),
            Inner::Gz(enc) => enc.finish().map(|_| ()).map_err(Error::from),
            Inner::Bz2(enc) => enc.finish().map(|_| ()).map_err(Error::from),
            Inner::Zstd(enc) => enc.finish().map(|_| ()).map_err(Error::from),
            Inner::Bgzf(w) => w.finish().map(|_| ()),
        };
        if let Err(err) = result {
            if std::thread::panicking() {
                tracing::warn!("error finalizing compression stream during unwind, discarded: {err}");
            } else {
                tracing::error!("error finalizing compression stream on drop: {err}");
            }
        }
    }
}

impl<W: Write> Write for TransparentOStream<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.inner.as_mut().expect("stream already finished") {
            Inner::None(w) => w.write(buf),
            Inner::Gz(w) => w.write(buf),
            Inner::Bz2(w) => w.write(buf),
            Inner::Zstd(w) => w.write(buf),
            Inner::Bgzf(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.inner.as_mut().expect("stream already finished") {
            Inner::None(w) => w.flush(),
            Inner::Gz(w) => w.flush(),
            Inner::Bz2(w) => w.flush(),
            Inner::Zstd(w) => w.flush(),
            Inner::Bgzf(w) => w.flush(),
        }
    }
}

/// Write a single BGZF member (header, DEFLATE payload, CRC/ISIZE trailer)
/// given its already-compressed bytes.
fn write_block_frame<W: Write>(inner: &mut W, compressed: &[u8], crc: u32, isize: u32) -> std::io::Result<()> {
    let total_len = BGZF_BLOCK_HEADER_LEN + compressed.len() + 8;
    let bsize = (total_len - 1) as u16;

    inner.write_all(&[0x1f, 0x8b, 0x08, 0x04, 0, 0, 0, 0, 0, 0xff])?;
    inner.write_all(&6u16.to_le_bytes())?;
    inner.write_all(b"BC")?;
    inner.write_all(&2u16.to_le_bytes())?;
    inner.write_all(&bsize.to_le_bytes())?;
    inner.write_all(compressed)?;
    inner.write_all(&crc.to_le_bytes())?;
    inner.write_all(&isize.to_le_bytes())?;
    Ok(())
}

/// Buffers uncompressed bytes up to `block_size`, farms each full block out
/// to a [`BlockCompressPool`] for DEFLATE compression, and writes the
/// results out as BGZF members with the `BC` extra field, strictly in block
/// order (spec §5's read/write parallelism symmetry: I/O stays sequential
/// on the caller's thread, compression work is what's parallelized). Writes
/// the canonical empty EOF marker block on [`BgzfWriter::finish`].
struct BgzfWriter<W: Write> {
    inner: W,
    buf: Vec<u8>,
    block_size: usize,
    level: u32,
    pool: BlockCompressPool,
    /// Sequence number the next full block will be submitted under.
    next_submit_seq: u64,
    /// Sequence number of the next block this writer owes `inner`, in order.
    next_write_seq: u64,
    /// How many blocks may sit compressed-but-unwritten before `write`
    /// blocks draining one, bounding how far ahead of the output the worker
    /// pool is allowed to race.
    lookahead: u64,
}

impl<W: Write> BgzfWriter<W> {
    fn new(inner: W, level: u32, block_size: usize, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        Self {
            inner,
            buf: Vec::with_capacity(block_size),
            block_size: block_size.max(1),
            level,
            pool: BlockCompressPool::new(worker_count),
            next_submit_seq: 0,
            next_write_seq: 0,
            lookahead: (worker_count * 2) as u64,
        }
    }

    /// Submit the current buffer as the next block, then write out any
    /// results that have piled up past `lookahead`.
    fn flush_block(&mut self) -> std::io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let data = std::mem::replace(&mut self.buf, Vec::with_capacity(self.block_size));
        self.pool
            .submit(self.next_submit_seq, data, self.level)
            .map_err(std::io::Error::other)?;
        self.next_submit_seq += 1;
        while self.next_submit_seq - self.next_write_seq > self.lookahead {
            self.write_one()?;
        }
        Ok(())
    }

    /// Block until the next in-order compressed block is ready and write it.
    fn write_one(&mut self) -> std::io::Result<()> {
        let block = self
            .pool
            .recv_in_order(self.next_write_seq)
            .map_err(std::io::Error::other)?;
        self.next_write_seq += 1;
        write_block_frame(&mut self.inner, &block.compressed, block.crc, block.isize)
    }

    fn finish(mut self) -> Result<W> {
        self.flush_block()?;
        while self.next_write_seq < self.next_submit_seq {
            self.write_one()?;
        }
        self.inner.write_all(&crate::bgzf::EOF_MARKER)?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for BgzfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut written = 0;
        let mut remaining = buf;
        while !remaining.is_empty() {
            let space = self.block_size - self.buf.len();
            let take = space.min(remaining.len());
            self.buf.extend_from_slice(&remaining[..take]);
            remaining = &remaining[take..];
            written += take;
            if self.buf.len() >= self.block_size {
                self.flush_block()?;
            }
        }
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_block()?;
        while self.next_write_seq < self.next_submit_seq {
            self.write_one()?;
        }
        self.inner.flush()
    }
}
