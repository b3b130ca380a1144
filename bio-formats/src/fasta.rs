//! FASTA sequence records: `>id description\n` followed by wrapped sequence
//! lines until the next `>` or EOF.

use std::io::{BufRead, Write};

use crate::error::{Error, Result};

/// Default line width FASTA sequences are wrapped to on write, matching
/// the convention `samtools faidx`-adjacent tooling uses.
pub const DEFAULT_WRAP: usize = 60;

/// One FASTA record: an id, an optional free-text description, and the
/// concatenated (unwrapped) sequence bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub description: Option<String>,
    pub sequence: Vec<u8>,
}

/// Streaming FASTA reader.
pub struct Reader<R> {
    inner: R,
    next_header: Option<String>,
    lineno: u64,
}

impl<R: BufRead> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            next_header: None,
            lineno: 0,
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self.inner.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        self.lineno += 1;
        while line.ends_with(['\n', '\r']) {
            line.pop();
        }
        Ok(Some(line))
    }

    /// Read the next record, accumulating sequence lines until the next
    /// `>` header or EOF. Returns `Ok(None)` at a clean EOF.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        let header = match self.next_header.take() {
            Some(h) => h,
            None => loop {
                match self.read_line()? {
                    None => return Ok(None),
                    Some(line) if line.is_empty() => continue,
                    Some(line) => break line,
                }
            },
        };
        if !header.starts_with('>') {
            return Err(Error::Format {
                line: self.lineno,
                message: format!("expected '>' record header, got {header:?}"),
            });
        }
        let (id, description) = split_header(&header[1..]);

        let mut sequence = Vec::new();
        loop {
            match self.read_line()? {
                None => break,
                Some(line) if line.starts_with('>') => {
                    self.next_header = Some(line);
                    break;
                }
                Some(line) => sequence.extend_from_slice(line.as_bytes()),
            }
        }

        Ok(Some(Record {
            id,
            description,
            sequence,
        }))
    }
}

impl<R: BufRead> Iterator for Reader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

fn split_header(rest: &str) -> (String, Option<String>) {
    match rest.split_once(char::is_whitespace) {
        Some((id, desc)) if !desc.is_empty() => (id.to_string(), Some(desc.to_string())),
        _ => (rest.trim_end().to_string(), None),
    }
}

/// Streaming FASTA writer, wrapping sequence output at `wrap` bytes per
/// line (`0` disables wrapping).
pub struct Writer<W> {
    inner: W,
    wrap: usize,
}

impl<W: Write> Writer<W> {
    pub fn new(inner: W, wrap: usize) -> Self {
        Self { inner, wrap }
    }

    /// Reclaim the underlying sink, e.g. to flush/finish a compression
    /// layer wrapped around it.
    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        match &record.description {
            Some(desc) => writeln!(self.inner, ">{} {desc}", record.id)?,
            None => writeln!(self.inner, ">{}", record.id)?,
        }
        if self.wrap == 0 {
            self.inner.write_all(&record.sequence)?;
            self.inner.write_all(b"\n")?;
        } else {
            for chunk in record.sequence.chunks(self.wrap) {
                self.inner.write_all(chunk)?;
                self.inner.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_single_record_with_wrapped_sequence() {
        let data = ">seq1 a description\nACGT\nACGT\n";
        let mut reader = Reader::new(Cursor::new(data));
        let record = reader.read_record().unwrap().unwrap();
        assert_eq!(record.id, "seq1");
        assert_eq!(record.description.as_deref(), Some("a description"));
        assert_eq!(record.sequence, b"ACGTACGT");
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn reads_multiple_records_in_sequence() {
        let data = ">a\nACGT\n>b\nTTTT\n";
        let mut reader = Reader::new(Cursor::new(data));
        let first = reader.read_record().unwrap().unwrap();
        let second = reader.read_record().unwrap().unwrap();
        assert_eq!(first.id, "a");
        assert_eq!(second.id, "b");
        assert_eq!(second.sequence, b"TTTT");
    }

    #[test]
    fn missing_header_is_a_format_error() {
        let data = "ACGT\n";
        let mut reader = Reader::new(Cursor::new(data));
        let err = reader.read_record().unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn writer_wraps_at_configured_width() {
        let record = Record {
            id: "seq1".to_string(),
            description: None,
            sequence: b"ACGTACGTAC".to_vec(),
        };
        let mut buf = Vec::new();
        let mut writer = Writer::new(&mut buf, 4);
        writer.write_record(&record).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            ">seq1\nACGT\nACGT\nAC\n"
        );
    }
}
