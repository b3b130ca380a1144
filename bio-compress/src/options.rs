//! Construction options for [`crate::reader::TransparentIStream`] and
//! [`crate::writer::TransparentOStream`].

use crate::detect::Format;

/// Options controlling how an input stream is opened and decompressed.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Force a specific format instead of relying on magic-byte detection.
    /// `None` (the default) auto-detects from the first
    /// [`crate::detect::PEEK_LEN`] bytes.
    pub format: Option<Format>,

    /// Total number of threads available to the reader, including the
    /// calling thread. `1` means strictly sequential I/O and decompression;
    /// BGZF silently downgrades to plain-gzip decompression in that case
    /// since there is no second thread to farm block decoding out to.
    /// Values above `1` spawn `threads - 1` decompression workers for BGZF
    /// input; they have no effect on gz/bz2/zstd, which are always decoded
    /// sequentially on the calling thread.
    pub threads: usize,

    /// Size, in bytes, of the internal buffer used when reading the
    /// underlying compressed byte stream.
    pub read_buffer_size: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            format: None,
            threads: 1,
            read_buffer_size: 64 * 1024,
        }
    }
}

impl ReaderOptions {
    /// Like [`ReaderOptions::default`], but with `threads` set to the
    /// machine's available parallelism instead of `1`, so BGZF input is
    /// decompressed across a worker pool without the caller hand-picking a
    /// count.
    #[must_use]
    pub fn with_detected_parallelism() -> Self {
        Self {
            threads: num_cpus::get(),
            ..Self::default()
        }
    }
}

/// Options controlling how an output stream is opened and compressed.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Force a specific output format instead of deriving it from the
    /// target path's extension.
    pub format: Option<Format>,

    /// zlib/zstd-style compression level. `-1` requests the codec's
    /// default; valid range is `[-1, 9]`.
    pub compression_level: i32,

    /// Total number of threads available to the writer, including the
    /// calling thread. BGZF compression requires at least 2 (one worker
    /// thread in addition to the caller); requesting BGZF with `threads
    /// == 1` is a construction error rather than a silent downgrade, since
    /// a plain-gzip substitute would not produce a file a tabix index could
    /// be built against.
    pub threads: usize,

    /// Size, in bytes, of uncompressed data buffered per BGZF block before
    /// it is flushed and compressed. Has no effect on gz/bz2/zstd.
    pub block_size: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            format: None,
            compression_level: -1,
            threads: 1,
            block_size: 64 * 1024,
        }
    }
}

impl WriterOptions {
    /// Like [`WriterOptions::default`], but with `threads` set to the
    /// machine's available parallelism instead of `1`, so BGZF output is
    /// compressed across a worker pool without the caller hand-picking a
    /// count. Never returns fewer than `2`, since BGZF writing rejects
    /// `threads < 2`.
    #[must_use]
    pub fn with_detected_parallelism() -> Self {
        Self {
            threads: num_cpus::get().max(2),
            ..Self::default()
        }
    }
}
