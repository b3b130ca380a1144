//! VCF textual record writer (spec §4.E "VCF output handler").

use std::io::Write;

use bio_value::Sentinel;

use crate::error::Result;
use crate::header::Header;
use crate::record::VcfRecord;
use crate::valuetext::render_value;

/// Options controlling header/line serialization.
#[derive(Debug, Clone, Copy)]
pub struct WriterOptions {
    /// Emit `IDX=` on structured header lines (off by default, spec §4.D).
    pub write_idx: bool,
    /// Use `\r\n` line endings instead of `\n`.
    pub crlf: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            write_idx: false,
            crlf: false,
        }
    }
}

/// Streaming VCF text writer.
///
/// The header is serialized on the first call to [`Writer::write_record`]
/// (spec §4.E: "First write-call triggers header serialization"); a
/// header-only file (zero records) can still be produced by calling
/// [`Writer::write_header_only`] explicitly.
pub struct Writer<W> {
    inner: W,
    header_written: bool,
    options: WriterOptions,
}

impl<W: Write> Writer<W> {
    pub fn new(inner: W, options: WriterOptions) -> Self {
        Self {
            inner,
            header_written: false,
            options,
        }
    }

    fn terminator(&self) -> &'static str {
        if self.options.crlf { "\r\n" } else { "\n" }
    }

    /// Unwrap the underlying sink, e.g. to call its own `finish`/`flush`.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Force header serialization now, even with no records pending.
    pub fn write_header_only(&mut self, header: &Header) -> Result<()> {
        if !self.header_written {
            header.write(&mut self.inner, self.options.write_idx)?;
            self.header_written = true;
        }
        Ok(())
    }

    /// Serialize `record` as one VCF line, writing the header first if
    /// this is the first call.
    pub fn write_record(&mut self, header: &Header, record: &VcfRecord) -> Result<()> {
        self.write_header_only(header)?;

        let id = if record.id.is_empty() {
            ".".to_string()
        } else {
            record.id.join(";")
        };
        let alt = if record.alt.is_empty() {
            ".".to_string()
        } else {
            record.alt.join(",")
        };
        let qual = if record.qual.is_missing() {
            ".".to_string()
        } else {
            record.qual.to_string()
        };
        let filter = if record.filter.is_empty() {
            ".".to_string()
        } else {
            record.filter.join(";")
        };
        let info = self.render_info(record);

        write!(
            self.inner,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            record.chrom, record.pos, id, record.reference, alt, qual, filter, info
        )?;

        if !record.format_keys.is_empty() {
            write!(self.inner, "\t{}", record.format_keys.join(":"))?;
            let n_samples = record.sample_count();
            for sample_idx in 0..n_samples {
                let rendered = self.render_sample(record, sample_idx);
                write!(self.inner, "\t{rendered}")?;
            }
        }

        write!(self.inner, "{}", self.terminator())?;
        Ok(())
    }

    fn render_info(&self, record: &VcfRecord) -> String {
        if record.info.is_empty() {
            return ".".to_string();
        }
        record
            .info
            .iter()
            .map(|(key, value)| {
                if matches!(value, bio_value::Value::Flag) {
                    key.clone()
                } else {
                    format!("{key}={}", render_value(value))
                }
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Render one sample's colon-joined values, dropping a trailing run of
    /// all-missing fields (the VCF rule: "if the tail is empty for a
    /// sample, the whole suffix is dropped", spec §4.E).
    fn render_sample(&self, record: &VcfRecord, sample_idx: usize) -> String {
        let mut fields: Vec<String> = record
            .genotypes
            .iter()
            .map(|(_, values)| render_value(&values[sample_idx]))
            .collect();

        while fields.len() > 1 && fields.last().is_some_and(|f| f == ".") {
            fields.pop();
        }
        fields.join(":")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Header;
    use crate::vcf::reader::{Reader, ReaderOptions};
    use std::io::Cursor;

    #[test]
    fn round_trips_minimal_record_byte_identical() {
        let text = "##fileformat=VCFv4.3\n\
                    ##FILTER=<ID=PASS,Description=\"All filters passed\">\n\
                    ##contig=<ID=20,length=62435964>\n\
                    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        let mut header = Header::parse(Cursor::new(text)).unwrap();
        let line = "20\t14370\t.\tA\tG\t.\tPASS\t.\n";
        let mut reader = Reader::new(Cursor::new(line), ReaderOptions::default());
        let record = reader.read_record(&mut header).unwrap().unwrap();

        let mut out = Vec::new();
        let mut writer = Writer::new(&mut out, WriterOptions::default());
        // Bypass header-write here; just check the record line itself.
        writer.header_written = true;
        writer.write_record(&header, &record).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), line);
    }

    #[test]
    fn genotype_trailing_missing_suffix_is_dropped() {
        let mut record = VcfRecord::new("20", 1, "A");
        record.format_keys = vec!["GT".to_string(), "DP".to_string()];
        record.genotypes = vec![
            ("GT".to_string(), vec![bio_value::Value::String("0|0".to_string())]),
            ("DP".to_string(), vec![bio_value::Value::Int32(i32::MISSING)]),
        ];
        let header = Header::new();
        let mut out = Vec::new();
        let mut writer = Writer::new(&mut out, WriterOptions::default());
        writer.header_written = true;
        writer.write_record(&header, &record).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("\tGT:DP\t0|0\n"));
    }
}
