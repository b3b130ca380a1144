//! FASTQ records: four-line groups `@id desc`, sequence, `+[id desc]`,
//! quality — the sequence and quality lines must have equal length.

use std::io::{BufRead, Write};

use crate::error::{Error, Result};

/// One FASTQ record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub description: Option<String>,
    pub sequence: Vec<u8>,
    pub quality: Vec<u8>,
}

/// Streaming FASTQ reader, one record per four input lines.
pub struct Reader<R> {
    inner: R,
    lineno: u64,
}

impl<R: BufRead> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, lineno: 0 }
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

    fn expect_line(&mut self, prefix: char, what: &'static str) -> Result<String> {
        let line = self.read_line()?.ok_or_else(|| Error::Format {
            line: self.lineno,
            message: format!("truncated record, expected {what}"),
        })?;
        if !line.starts_with(prefix) {
            return Err(Error::Format {
                line: self.lineno,
                message: format!("expected {what} starting with {prefix:?}, got {line:?}"),
            });
        }
        Ok(line)
    }

    /// Read one four-line record. Returns `Ok(None)` at a clean EOF before
    /// the first line of a record.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        let Some(header) = self.read_line()? else {
            return Ok(None);
        };
        if !header.starts_with('@') {
            return Err(Error::Format {
                line: self.lineno,
                message: format!("expected '@' record header, got {header:?}"),
            });
        }
        let (id, description) = split_header(&header[1..]);

        let sequence = self.read_line()?.ok_or_else(|| Error::Format {
            line: self.lineno,
            message: "truncated record, expected sequence line".to_string(),
        })?;
        self.expect_line('+', "separator line")?;
        let quality = self.read_line()?.ok_or_else(|| Error::Format {
            line: self.lineno,
            message: "truncated record, expected quality line".to_string(),
        })?;

        if sequence.len() != quality.len() {
            return Err(Error::Format {
                line: self.lineno,
                message: format!(
                    "sequence length {} does not match quality length {}",
                    sequence.len(),
                    quality.len()
                ),
            });
        }

        Ok(Some(Record {
            id,
            description,
            sequence: sequence.into_bytes(),
            quality: quality.into_bytes(),
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

/// Streaming FASTQ writer; `+` separator lines are emitted bare (without
/// repeating the id).
pub struct Writer<W> {
    inner: W,
}

impl<W: Write> Writer<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Reclaim the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        match &record.description {
            Some(desc) => writeln!(self.inner, "@{} {desc}", record.id)?,
            None => writeln!(self.inner, "@{}", record.id)?,
        }
        self.inner.write_all(&record.sequence)?;
        self.inner.write_all(b"\n+\n")?;
        self.inner.write_all(&record.quality)?;
        self.inner.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_one_record() {
        let data = "@read1 a comment\nACGT\n+\nIIII\n";
        let mut reader = Reader::new(Cursor::new(data));
        let record = reader.read_record().unwrap().unwrap();
        assert_eq!(record.id, "read1");
        assert_eq!(record.description.as_deref(), Some("a comment"));
        assert_eq!(record.sequence, b"ACGT");
        assert_eq!(record.quality, b"IIII");
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn mismatched_lengths_is_a_format_error() {
        let data = "@read1\nACGT\n+\nII\n";
        let mut reader = Reader::new(Cursor::new(data));
        let err = reader.read_record().unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn round_trips_through_writer() {
        let record = Record {
            id: "read1".to_string(),
            description: None,
            sequence: b"ACGT".to_vec(),
            quality: b"IIII".to_vec(),
        };
        let mut buf = Vec::new();
        Writer::new(&mut buf).write_record(&record).unwrap();
        let mut reader = Reader::new(Cursor::new(buf));
        assert_eq!(reader.read_record().unwrap().unwrap(), record);
    }
}
