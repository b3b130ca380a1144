//! The writer skeleton: owns a transparent compression stream, a
//! format-handler variant, and a header for the variant formats (spec §4.F
//! "the writer is an output range").

use std::fs::File;
use std::io::Write;
use std::path::Path;

use bio_compress::TransparentOStream;
use bio_vcf::Header;

use crate::error::{Error, Result};
use crate::format::Format;
use crate::record::Record;

/// Options controlling stream compression and VCF/BCF header serialization.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Passed straight through to [`bio_compress::TransparentOStream`].
    pub compression: bio_compress::WriterOptions,
    /// Force a format instead of relying on extension detection.
    pub format: Option<Format>,
    /// Passed straight through to [`bio_vcf::VcfWriterOptions`].
    pub vcf: bio_vcf::VcfWriterOptions,
    /// Passed straight through to [`bio_vcf::BcfWriterOptions`].
    pub bcf: bio_vcf::BcfWriterOptions,
    /// Line wrap width for FASTA output (0 disables wrapping).
    pub fasta_wrap: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compression: bio_compress::WriterOptions::default(),
            format: None,
            vcf: bio_vcf::VcfWriterOptions::default(),
            bcf: bio_vcf::BcfWriterOptions::default(),
            fasta_wrap: bio_formats::fasta::DEFAULT_WRAP,
        }
    }
}

enum Handler<W: Write> {
    Fasta(bio_formats::fasta::Writer<W>),
    Fastq(bio_formats::fastq::Writer<W>),
    Sam(bio_formats::sam::Writer<W>),
    Bed(bio_formats::bed::Writer<W>),
    Vcf(bio_vcf::VcfWriter<W>, Header),
    Bcf(bio_vcf::BcfWriter<W>, Header),
}

impl<W: Write> Handler<W> {
    /// Unwrap down to the underlying sink, discarding any format-specific
    /// state (there is none left to flush at this layer — every record so
    /// far has already been written through `W`).
    fn into_inner(self) -> W {
        match self {
            Handler::Fasta(w) => w.into_inner(),
            Handler::Fastq(w) => w.into_inner(),
            Handler::Sam(w) => w.into_inner(),
            Handler::Bed(w) => w.into_inner(),
            Handler::Vcf(w, _) => w.into_inner(),
            Handler::Bcf(w, _) => w.into_inner(),
        }
    }
}

/// A move-only output range over records of one format, writing through a
/// single transparently-compressed byte stream.
///
/// There is deliberately no `Clone` impl, mirroring [`crate::Reader`]: a
/// destination cannot be shared (spec §4.F).
pub struct Writer<W: Write> {
    format: Format,
    handler: Option<Handler<W>>,
}

impl Writer<TransparentOStream<File>> {
    /// Create `path`, deriving compression from its extension unless
    /// [`WriterOptions::compression`]'s `format` overrides it, and deriving
    /// record format from its extension unless [`WriterOptions::format`]
    /// overrides it.
    pub fn create<P: AsRef<Path>>(path: P, header: Option<Header>, options: WriterOptions) -> Result<Self> {
        let path = path.as_ref();
        let format = options
            .format
            .or_else(|| Format::detect_from_extension(path))
            .ok_or_else(|| Error::UnknownFormat(path.display().to_string()))?;
        let stream = TransparentOStream::create(path, options.compression.clone())?;
        Self::from_format(stream, format, header, &options)
    }
}

impl<W: Write> Writer<TransparentOStream<W>> {
    /// Wrap an already-open byte sink. With no path there is no extension
    /// to consult, so `options.format` must be set explicitly.
    pub fn new(inner: W, header: Option<Header>, options: WriterOptions) -> Result<Self> {
        let format = options
            .format
            .ok_or_else(|| Error::UnknownFormat("<no path, no explicit format>".to_string()))?;
        let detected = options.compression.format.unwrap_or(bio_compress::Format::None);
        let stream = TransparentOStream::new(inner, detected, options.compression.clone())?;
        Self::from_format(stream, format, header, &options)
    }
}

impl<W: Write> Writer<W> {
    fn from_format(inner: W, format: Format, header: Option<Header>, options: &WriterOptions) -> Result<Self> {
        let handler = match format {
            Format::Fasta => {
                Handler::Fasta(bio_formats::fasta::Writer::new(inner, options.fasta_wrap))
            }
            Format::Fastq => Handler::Fastq(bio_formats::fastq::Writer::new(inner)),
            Format::Sam => Handler::Sam(bio_formats::sam::Writer::new(inner)),
            Format::Bed => Handler::Bed(bio_formats::bed::Writer::new(inner)),
            Format::Vcf => {
                let header = header.ok_or(Error::MissingHeader("VCF"))?;
                Handler::Vcf(bio_vcf::VcfWriter::new(inner, options.vcf), header)
            }
            Format::Bcf => {
                let header = header.ok_or(Error::MissingHeader("BCF"))?;
                Handler::Bcf(bio_vcf::BcfWriter::new(inner, options.bcf), header)
            }
        };
        Ok(Self {
            format,
            handler: Some(handler),
        })
    }

    /// The format this writer was constructed with.
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// The header this writer serializes against, for [`Format::Vcf`]/
    /// [`Format::Bcf`] writers only.
    #[must_use]
    pub fn header(&self) -> Option<&Header> {
        match self.handler.as_ref()? {
            Handler::Vcf(_, h) | Handler::Bcf(_, h) => Some(h),
            _ => None,
        }
    }

    /// Write one record, dispatching to the currently-selected format
    /// handler (spec §4.F "`push_back(record)` dispatches into the
    /// currently-selected format handler via the variant").
    ///
    /// Fails with [`Error::FormatMismatch`] if `record`'s variant does not
    /// match this writer's format.
    pub fn push_back(&mut self, record: &Record) -> Result<()> {
        let handler = self.handler.as_mut().expect("handler taken only by finish/drop");
        match (handler, record) {
            (Handler::Fasta(w), Record::Fasta(r)) => w.write_record(r)?,
            (Handler::Fastq(w), Record::Fastq(r)) => w.write_record(r)?,
            (Handler::Sam(w), Record::Sam(r)) => w.write_record(r)?,
            (Handler::Bed(w), Record::Bed(r)) => w.write_record(r)?,
            (Handler::Vcf(w, h), Record::Vcf(r)) => w.write_record(h, r)?,
            (Handler::Bcf(w, h), Record::Vcf(r)) => w.write_record(h, r)?,
            _ => return Err(Error::FormatMismatch(self.format)),
        }
        Ok(())
    }

    /// Write loose `(id, field)` arguments directly without requiring the
    /// caller to pre-populate a full [`bio_vcf::VcfRecord`] themselves
    /// (spec §4.F "`emplace_back(fields...)` ties the arguments into a
    /// record-of-references and calls `push_back` — this avoids
    /// materializing a deep record when the user wants to write directly
    /// from loose variables"). Field-by-field assembly is delegated to
    /// [`crate::assembly::apply`] (spec §4.G), the same `(id, type)`
    /// dispatch table [`crate::assembly::assemble`] uses on the read side;
    /// fields omitted from `fields` keep [`bio_vcf::VcfRecord::new`]'s
    /// defaults. VCF/BCF are the only formats with assembly granular
    /// enough for this to be worthwhile.
    pub fn emplace_vcf_record(
        &mut self,
        chrom: impl Into<String>,
        pos: u64,
        reference: impl Into<String>,
        fields: &[(crate::assembly::FieldId, crate::assembly::AssembledField)],
    ) -> Result<()> {
        let mut record = bio_vcf::VcfRecord::new(chrom, pos, reference);
        crate::assembly::apply(&mut record, fields)?;
        self.push_back(&Record::Vcf(record))
    }

    /// Flush the underlying sink, surfacing any error instead of swallowing
    /// it at drop time. Calling this is optional but recommended:
    /// [`Writer`]'s `Drop` impl does the same work but has nowhere to
    /// report failure except a `tracing::error!` (spec §4.F "destruction of
    /// the writer must flush and close the compression layer").
    pub fn finish(mut self) -> Result<()> {
        self.finish_inner()
    }

    fn finish_inner(&mut self) -> Result<()> {
        if let Some(handler) = self.handler.take() {
            let mut inner = handler.into_inner();
            inner.flush()?;
        }
        Ok(())
    }
}

impl<W: Write> Drop for Writer<W> {
    fn drop(&mut self) {
        if self.handler.is_none() {
            return; // already finished via `finish()`
        }
        if let Err(err) = self.finish_inner() {
            if std::thread::panicking() {
                // An exception is already in flight (spec §4.F): the
                // writer swallows this secondary error rather than
                // aborting via a double panic.
                tracing::warn!("error flushing writer during unwind, discarded: {err}");
            } else {
                tracing::error!("error flushing writer on drop: {err}");
            }
        }
        // Dropping the unwrapped sink here (it falls out of scope along
        // with the `Result` above) runs `TransparentOStream`'s own `Drop`,
        // which finalizes trailing compression framing.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn writes_bed_records() {
        let record = bio_formats::bed::Record {
            chrom: "chr7".to_string(),
            chrom_start: 1,
            chrom_end: 2,
            extra: Vec::new(),
        };
        let options = WriterOptions {
            format: Some(Format::Bed),
            ..WriterOptions::default()
        };
        let mut writer = Writer::new(Cursor::new(Vec::new()), None, options).unwrap();
        writer.push_back(&Record::Bed(record)).unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn vcf_write_without_header_is_missing_header_error() {
        let options = WriterOptions {
            format: Some(Format::Vcf),
            ..WriterOptions::default()
        };
        let err = Writer::new(Cursor::new(Vec::new()), None, options).unwrap_err();
        assert!(matches!(err, Error::MissingHeader("VCF")));
    }

    #[test]
    fn emplace_vcf_record_ties_loose_fields_without_a_prebuilt_record() {
        use crate::assembly::{AssembledField, FieldId};
        use bio_value::Value;

        let options = WriterOptions {
            format: Some(Format::Vcf),
            ..WriterOptions::default()
        };
        let header = bio_vcf::Header::new();
        let mut out = Vec::new();
        {
            let mut writer = Writer::new(&mut out, Some(header), options).unwrap();
            let fields = [(
                FieldId::Filter,
                AssembledField::List(vec![Value::String("PASS".to_string())]),
            )];
            writer.emplace_vcf_record("chr1", 100, "A", &fields).unwrap();
            writer.finish().unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("chr1\t100\t.\tA\t.\t.\tPASS\t.\n"), "unexpected output: {text:?}");
    }

    #[test]
    fn format_mismatch_is_rejected() {
        let options = WriterOptions {
            format: Some(Format::Bed),
            ..WriterOptions::default()
        };
        let mut writer = Writer::new(Cursor::new(Vec::new()), None, options).unwrap();
        let record = bio_formats::fasta::Record {
            id: "seq1".to_string(),
            description: None,
            sequence: b"ACGT".to_vec(),
        };
        let err = writer.push_back(&Record::Fasta(record)).unwrap_err();
        assert!(matches!(err, Error::FormatMismatch(Format::Bed)));
    }
}
