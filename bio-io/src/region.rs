//! Tabix-filtered reading: compose a BGZF-decompressing stream, a format
//! handler, and a [`bio_tabix::TabixIndex`] to yield only records
//! overlapping a genomic region (spec §4.H).

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use bio_compress::{ReaderOptions as CompressReaderOptions, TransparentIStream, VirtualOffset};
use bio_tabix::{Chunk, Region, TabixIndex};
use bio_vcf::Header;

use crate::error::{Error, Result};
use crate::format::Format;
use crate::record::{Located, Record};

/// Small buffering capacity for the region reader's line/record parser.
///
/// Kept deliberately small (unlike [`crate::Reader`]'s default buffer): a
/// large read-ahead would have the stream's inner BGZF reader consume far
/// more decompressed bytes than the format parser has actually used,
/// making [`Handler::virtual_offset`] lag behind the true parse position
/// and delaying the chunk-boundary seek past where it should happen.
const REGION_READ_BUFFER: usize = 512;

type Stream = BufReader<TransparentIStream<File>>;

enum Handler {
    Vcf(bio_vcf::VcfReader<Stream>, Header),
    Bed(bio_formats::bed::Reader<Stream>),
}

impl Handler {
    /// Build a handler over a freshly-seeked stream, wrapping it in a new
    /// buffered reader.
    fn open(stream: TransparentIStream<File>, format: Format, header: Option<Header>, options: &bio_vcf::ReaderOptions) -> Result<Self> {
        Self::from_stream(BufReader::with_capacity(REGION_READ_BUFFER, stream), format, header, options)
    }

    /// Build a handler over an already-buffered stream. Used for the
    /// reader's first chunk (continuing right where header parsing left
    /// off): a fresh `BufReader::new` there would silently drop whatever
    /// the header parser had already buffered but not yet consumed.
    fn from_stream(buffered: Stream, format: Format, header: Option<Header>, options: &bio_vcf::ReaderOptions) -> Result<Self> {
        match format {
            Format::Vcf => {
                let header = header.expect("VCF region reading always carries a parsed header");
                Ok(Handler::Vcf(bio_vcf::VcfReader::new(buffered, *options), header))
            }
            Format::Bed => Ok(Handler::Bed(bio_formats::bed::Reader::new(buffered))),
            other => Err(Error::UnsupportedRegionFormat(other)),
        }
    }

    fn into_stream(self) -> Stream {
        match self {
            Handler::Vcf(r, _) => r.into_inner(),
            Handler::Bed(r) => r.into_inner(),
        }
    }

    fn stream(&self) -> &Stream {
        match self {
            Handler::Vcf(r, _) => r.get_ref(),
            Handler::Bed(r) => r.get_ref(),
        }
    }

    fn virtual_offset(&self) -> VirtualOffset {
        self.stream()
            .get_ref()
            .virtual_offset()
            .expect("RegionReader::open already verified the stream is BGZF")
    }

    fn read_next(&mut self) -> Result<Option<Record>> {
        match self {
            Handler::Vcf(r, header) => Ok(r.read_record(header)?.map(Record::Vcf)),
            Handler::Bed(r) => Ok(r.read_record()?.map(Record::Bed)),
        }
    }
}

/// Options controlling index resolution and VCF anomaly warnings.
#[derive(Debug, Clone, Default)]
pub struct RegionReaderOptions {
    /// Explicit index path; `None` auto-suffixes the data path with `.tbi`.
    pub index_path: Option<PathBuf>,
    /// Passed straight through to [`bio_vcf::VcfReader`] (ignored for BED).
    pub vcf: bio_vcf::ReaderOptions,
}

/// A reader over only the records of one BGZF+tabix-indexed file that
/// overlap a requested [`Region`] (spec §4.H).
///
/// Construction resolves the region to a sorted, merged list of candidate
/// BGZF byte chunks via the index (step 1-2); [`RegionReader::next_record`]
/// seeks into each chunk in turn (step 3), reading through it until either
/// the stream's virtual offset reaches the chunk's declared end or a
/// record's start reaches `region.end`, and yields only records passing
/// the true-overlap post-filter (step 4).
///
/// Only [`Format::Vcf`] and [`Format::Bed`] are supported: these are the
/// two record shapes this crate implements [`Located`] for. BCF is
/// ordinarily addressed through a CSI index rather than tabix's `.tbi`,
/// so it has no counterpart here.
pub struct RegionReader {
    format: Format,
    header: Option<Header>,
    vcf_options: bio_vcf::ReaderOptions,
    region: Region,
    chunks: VecDeque<Chunk>,
    handler: Option<Handler>,
    current_chunk_end: Option<VirtualOffset>,
}

impl RegionReader {
    /// Open `path` (which must be BGZF-compressed) for region-filtered
    /// reading, loading its tabix index (explicit path, or `path` with a
    /// `.tbi` suffix appended) unless `options.index_path` is set.
    pub fn open<P: AsRef<Path>>(path: P, region: Region, options: RegionReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        let index_path = options
            .index_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.tbi", path.display())));
        if !index_path.exists() {
            return Err(Error::NoIndex);
        }
        let index = TabixIndex::open(&index_path)?;
        Self::open_with_index(path, &index, region, options)
    }

    /// Like [`RegionReader::open`], but with an already-parsed index,
    /// letting a caller reuse one [`TabixIndex`] across many region
    /// queries against the same file instead of re-parsing its `.tbi` for
    /// every query.
    pub fn open_with_index<P: AsRef<Path>>(
        path: P,
        index: &TabixIndex,
        region: Region,
        options: RegionReaderOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let format = Format::detect_from_extension(path).unwrap_or(Format::Vcf);

        let read_options = CompressReaderOptions {
            read_buffer_size: REGION_READ_BUFFER,
            ..CompressReaderOptions::default()
        };
        let stream = TransparentIStream::open(path, read_options)?;
        if stream.format() != bio_compress::Format::Bgzf {
            return Err(Error::NotBgzf(stream.format()));
        }

        // Parse the header once, from the file's natural start, before any
        // region seeking begins, and hand the same buffered reader straight
        // to the format handler: rewrapping a fresh `BufReader` around the
        // unwrapped stream here would silently drop whatever bytes the
        // header parser had already buffered but not yet consumed.
        let (header, handler) = match format {
            Format::Vcf => {
                let mut buffered = BufReader::with_capacity(REGION_READ_BUFFER, stream);
                let header = Header::parse(&mut buffered)?;
                let handler = Handler::from_stream(buffered, format, Some(header.clone()), &options.vcf)?;
                (Some(header), handler)
            }
            _ => {
                let handler = Handler::open(stream, format, None, &options.vcf)?;
                (None, handler)
            }
        };

        let chunks: Vec<Chunk> = index.region_to_chunks(&region)?;
        let chunks: VecDeque<Chunk> = bio_tabix::merge_chunks(chunks).into();

        Ok(Self {
            format,
            header,
            vcf_options: options.vcf,
            region,
            chunks,
            handler: Some(handler),
            current_chunk_end: None,
        })
    }

    /// Seek the reader onto the next queued chunk, replacing the format
    /// handler with a fresh one over the re-seeked stream. `Ok(false)`
    /// means there were no more chunks queued.
    fn advance_chunk(&mut self) -> Result<bool> {
        let Some((beg, end)) = self.chunks.pop_front() else {
            return Ok(false);
        };
        let handler = self.handler.take().expect("handler present between chunks");
        let mut stream = handler.into_stream().into_inner();
        stream.seek_primary(beg.compressed_block_offset())?;

        let mut discard = vec![0u8; beg.uncompressed_offset() as usize];
        if !discard.is_empty() {
            stream.read_exact(&mut discard)?;
        }

        self.handler = Some(Handler::open(stream, self.format, self.header.clone(), &self.vcf_options)?);
        self.current_chunk_end = Some(end);
        Ok(true)
    }

    /// Read the next record overlapping the region, or `Ok(None)` once
    /// every candidate chunk has been exhausted.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        loop {
            if self.current_chunk_end.is_none() && !self.advance_chunk()? {
                return Ok(None);
            }
            let chunk_end = self.current_chunk_end.expect("set by advance_chunk above");

            let handler = self.handler.as_mut().expect("handler present while iterating");
            let Some(record) = handler.read_next()? else {
                // Clean EOF: nothing left in this file at all.
                return Ok(None);
            };

            let (chrom, start0, overlaps) = match &record {
                Record::Vcf(r) => (r.chrom().to_string(), r.start0(), r.overlaps(self.region.beg, self.region.end)),
                Record::Bed(r) => (r.chrom().to_string(), r.start0(), r.overlaps(self.region.beg, self.region.end)),
                _ => unreachable!("RegionReader only opens Vcf/Bed handlers"),
            };

            if self.handler.as_ref().unwrap().virtual_offset() >= chunk_end {
                self.current_chunk_end = None;
            }

            if chrom != self.region.chrom || start0 >= self.region.end {
                // Walked past the end of the queried region within this
                // chunk's own contig; nothing further in the chunk can
                // match, so move on to the next one immediately.
                self.current_chunk_end = None;
                continue;
            }
            if overlaps {
                return Ok(Some(record));
            }
            // Within the region's span but not truly overlapping (e.g. a
            // deletion whose REF extends leftward past `beg`); keep
            // reading this chunk.
        }
    }
}

impl Iterator for RegionReader {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
