//! The reader skeleton: owns a transparent compression stream, picks a
//! format handler at construction time, and iterates records (spec §4.F
//! "the reader is an input range").

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use bio_compress::TransparentIStream;
use bio_vcf::Header;

use crate::error::{Error, Result};
use crate::format::Format;
use crate::record::Record;

/// Options controlling stream decompression, format selection, and
/// VCF/BCF anomaly warnings.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Passed straight through to [`bio_compress::TransparentIStream`].
    pub compression: bio_compress::ReaderOptions,
    /// Force a format instead of relying on extension/magic detection.
    pub format: Option<Format>,
    /// Passed straight through to [`bio_vcf::VcfReader`] (ignored for BCF
    /// and the thin formats, which have no warning-emitting anomalies of
    /// this kind).
    pub vcf: bio_vcf::ReaderOptions,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            compression: bio_compress::ReaderOptions::default(),
            format: None,
            vcf: bio_vcf::ReaderOptions::default(),
        }
    }
}

enum Handler<R> {
    Fasta(bio_formats::fasta::Reader<R>),
    Fastq(bio_formats::fastq::Reader<R>),
    Sam(bio_formats::sam::Reader<R>),
    Bed(bio_formats::bed::Reader<R>),
    Vcf(bio_vcf::VcfReader<R>, Header),
    Bcf(bio_vcf::BcfReader<R>, Header),
}

/// A move-only input range over records of one format, read from a single
/// transparently-decompressed byte stream.
///
/// There is deliberately no `Clone` impl: a file cannot be shared (spec
/// §4.F "copies are rejected at compile time").
pub struct Reader<R> {
    format: Format,
    handler: Handler<R>,
}

impl Reader<BufReader<TransparentIStream<File>>> {
    /// Open `path`, detecting compression and, unless
    /// [`ReaderOptions::format`] overrides it, record format (from the
    /// extension, confirmed/completed by sniffing the decompressed bytes).
    pub fn open<P: AsRef<Path>>(path: P, options: ReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        let extension_hint = Format::detect_from_extension(path);
        let stream = TransparentIStream::open(path, options.compression.clone())?;
        let mut buffered = BufReader::new(stream);
        let format = resolve_format(options.format.or(extension_hint), &mut buffered)?;
        Self::from_format(buffered, format, &options)
    }
}

impl<R: Read> Reader<BufReader<TransparentIStream<R>>> {
    /// Wrap an already-open byte source. With no path there is no
    /// extension to consult, so format selection relies on
    /// [`ReaderOptions::format`] or magic-byte sniffing alone.
    pub fn new(inner: R, options: ReaderOptions) -> Result<Self> {
        let stream = TransparentIStream::new(inner, options.compression.clone())?;
        let mut buffered = BufReader::new(stream);
        let format = resolve_format(options.format, &mut buffered)?;
        Self::from_format(buffered, format, &options)
    }
}

impl<R: BufRead> Reader<R> {
    fn from_format(mut inner: R, format: Format, options: &ReaderOptions) -> Result<Self> {
        let handler = match format {
            Format::Fasta => Handler::Fasta(bio_formats::fasta::Reader::new(inner)),
            Format::Fastq => Handler::Fastq(bio_formats::fastq::Reader::new(inner)),
            Format::Sam => Handler::Sam(bio_formats::sam::Reader::new(inner)),
            Format::Bed => Handler::Bed(bio_formats::bed::Reader::new(inner)),
            Format::Vcf => {
                let header = Header::parse(&mut inner)?;
                let reader = bio_vcf::VcfReader::new(inner, options.vcf);
                Handler::Vcf(reader, header)
            }
            Format::Bcf => {
                let (reader, header) = bio_vcf::BcfReader::new(inner)?;
                Handler::Bcf(reader, header)
            }
        };
        Ok(Self { format, handler })
    }

    /// The format this reader was constructed with.
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// The parsed variant header, for [`Format::Vcf`]/[`Format::Bcf`]
    /// readers only.
    #[must_use]
    pub fn header(&self) -> Option<&Header> {
        match &self.handler {
            Handler::Vcf(_, h) | Handler::Bcf(_, h) => Some(h),
            _ => None,
        }
    }

    /// Read the next record. Returns `Ok(None)` at a clean EOF (spec §4.F
    /// "end() ... returns true exactly when the source reached EOF").
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        match &mut self.handler {
            Handler::Fasta(r) => Ok(r.read_record()?.map(Record::Fasta)),
            Handler::Fastq(r) => Ok(r.read_record()?.map(Record::Fastq)),
            Handler::Sam(r) => Ok(r.read_record()?.map(Record::Sam)),
            Handler::Bed(r) => Ok(r.read_record()?.map(Record::Bed)),
            Handler::Vcf(r, header) => Ok(r.read_record(header)?.map(Record::Vcf)),
            Handler::Bcf(r, header) => Ok(r.read_record(header)?.map(Record::Vcf)),
        }
    }
}

impl<R: BufRead> Iterator for Reader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

fn resolve_format<R: BufRead>(preferred: Option<Format>, stream: &mut R) -> Result<Format> {
    if let Some(format) = preferred {
        return Ok(format);
    }
    let peek = stream.fill_buf()?;
    Format::detect_from_magic(peek).ok_or_else(|| Error::UnknownFormat(String::from_utf8_lossy(peek).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn detects_and_reads_bed_by_magic() {
        let data = b"chr7\t127471196\t127472363\n".to_vec();
        let mut reader = Reader::new(Cursor::new(data), ReaderOptions::default()).unwrap();
        assert_eq!(reader.format(), Format::Bed);
        let record = reader.read_record().unwrap().unwrap();
        match record {
            Record::Bed(r) => assert_eq!(r.chrom, "chr7"),
            other => panic!("expected Bed, got {other:?}"),
        }
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn reads_vcf_and_exposes_header() {
        let data = b"##fileformat=VCFv4.3\n\
                    ##contig=<ID=20,length=1000>\n\
                    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
                    20\t14370\t.\tACT\tA\t.\tPASS\t.\n"
            .to_vec();
        let mut reader = Reader::new(Cursor::new(data), ReaderOptions::default()).unwrap();
        assert_eq!(reader.format(), Format::Vcf);
        assert!(reader.header().is_some());
        let record = reader.read_record().unwrap().unwrap();
        match record {
            Record::Vcf(r) => assert_eq!(r.chrom, "20"),
            other => panic!("expected Vcf, got {other:?}"),
        }
    }

    #[test]
    fn explicit_format_override_skips_sniffing() {
        let data = b"chr1\t0\t100\n".to_vec();
        let options = ReaderOptions {
            format: Some(Format::Bed),
            ..ReaderOptions::default()
        };
        let reader = Reader::new(Cursor::new(data), options).unwrap();
        assert_eq!(reader.format(), Format::Bed);
    }

    #[test]
    fn unrecognisable_bytes_are_an_unknown_format_error() {
        let data = Vec::new();
        let err = Reader::new(Cursor::new(data), ReaderOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownFormat(_)));
    }
}
