//! Transparent, format-detecting decompressing reader.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use zstd::stream::read::Decoder as ZstdDecoder;

use crate::bgzf_reader::{SequentialBgzfReader, ThreadedBgzfReader};
use crate::detect::{Format, PEEK_LEN};
use crate::error::{Error, Result};
use crate::options::ReaderOptions;

enum Inner<R: Read> {
    None(BufReader<R>),
    Gz(Box<MultiGzDecoder<BufReader<R>>>),
    Bz2(Box<BzDecoder<BufReader<R>>>),
    Zstd(Box<ZstdDecoder<'static, BufReader<R>>>),
    BgzfSeq(Box<SequentialBgzfReader<BufReader<R>>>),
    BgzfPar(Box<ThreadedBgzfReader<BufReader<R>>>),
}

impl<R: Read> Read for Inner<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Inner::None(r) => r.read(buf),
            Inner::Gz(r) => r.read(buf),
            Inner::Bz2(r) => r.read(buf),
            Inner::Zstd(r) => r.read(buf),
            Inner::BgzfSeq(r) => r.read(buf),
            Inner::BgzfPar(r) => r.read(buf),
        }
    }
}

/// A transparently decompressing input stream.
///
/// Wraps an arbitrary [`Read`] source, sniffs its compression format from
/// the leading bytes (or trusts an explicit [`ReaderOptions::format`]
/// override), and presents a single uniform [`Read`] surface regardless of
/// whether the underlying bytes are BGZF, plain gzip, bzip2, zstd, or
/// uncompressed.
pub struct TransparentIStream<R: Read> {
    inner: Inner<R>,
    format: Format,
}

impl TransparentIStream<File> {
    /// Open `path`, auto-detecting (or honoring an explicit override in
    /// `options`) its compression format.
    pub fn open<P: AsRef<Path>>(path: P, options: ReaderOptions) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(file, options)
    }
}

impl<R: Read> TransparentIStream<R> {
    /// Wrap an already-open byte source.
    pub fn new(inner: R, options: ReaderOptions) -> Result<Self> {
        let capacity = options.read_buffer_size.max(PEEK_LEN);
        let mut buffered = BufReader::with_capacity(capacity, inner);

        let peek = buffered.fill_buf()?;
        let detected = Format::detect(peek);

        let format = match options.format {
            Some(requested) => {
                if requested != detected && requested != Format::None && detected != Format::None
                {
                    return Err(Error::FormatConflict {
                        requested,
                        detected,
                    });
                }
                requested
            }
            None => detected,
        };

        let inner = match format {
            Format::None => Inner::None(buffered),
            Format::Gz => Inner::Gz(Box::new(MultiGzDecoder::new(buffered))),
            Format::Bz2 => Inner::Bz2(Box::new(BzDecoder::new(buffered))),
            Format::Zstd => Inner::Zstd(Box::new(ZstdDecoder::with_buffer(buffered)?)),
            Format::Bgzf => {
                if options.threads <= 1 {
                    tracing::debug!(
                        "BGZF input requested with threads=1; decompressing sequentially"
                    );
                    Inner::BgzfSeq(Box::new(SequentialBgzfReader::new(buffered)))
                } else {
                    Inner::BgzfPar(Box::new(ThreadedBgzfReader::new(
                        buffered,
                        options.threads - 1,
                    )))
                }
            }
        };

        Ok(Self { inner, format })
    }

    /// The compression format this stream was opened with (detected or
    /// explicitly requested).
    pub fn format(&self) -> Format {
        self.format
    }
}

impl<R: Read> Read for TransparentIStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read + Seek> TransparentIStream<R> {
    /// Seek the underlying stream to `pos`, a BGZF virtual offset's
    /// compressed-block component, and restart block decoding there.
    ///
    /// Only meaningful for BGZF input, since it is the only supported
    /// format with an independently-seekable block structure; calling this
    /// on any other format returns [`Error::SeekUnsupportedFormat`]. `pos`
    /// must land exactly on a block boundary or [`Error::SeekNotBlockBoundary`]
    /// is returned — a transparent stream never guesses at resynchronizing
    /// mid-block.
    pub fn seek_primary(&mut self, pos: u64) -> Result<()> {
        match &mut self.inner {
            Inner::BgzfSeq(r) => r.seek_to(pos),
            Inner::BgzfPar(r) => r.seek_to(pos),
            _ => Err(Error::SeekUnsupportedFormat(self.format)),
        }
    }

    /// The BGZF virtual offset of the next byte this stream will yield.
    /// `None` for non-BGZF formats, which have no virtual-offset addressing.
    #[must_use]
    pub fn virtual_offset(&self) -> Option<crate::bgzf::VirtualOffset> {
        match &self.inner {
            Inner::BgzfSeq(r) => Some(r.virtual_offset()),
            Inner::BgzfPar(r) => Some(r.virtual_offset()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn detects_and_reads_plain_text() {
        let data = b"hello, world".to_vec();
        let mut s = TransparentIStream::new(Cursor::new(data), ReaderOptions::default()).unwrap();
        assert_eq!(s.format(), Format::None);
        let mut out = String::new();
        s.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello, world");
    }

    #[test]
    fn rejects_mismatched_explicit_format() {
        let data = b"plain text, not gz".to_vec();
        let options = ReaderOptions {
            format: Some(Format::Gz),
            ..ReaderOptions::default()
        };
        let err = TransparentIStream::new(Cursor::new(data), options).unwrap_err();
        assert!(matches!(err, Error::FormatConflict { .. }));
    }
}
