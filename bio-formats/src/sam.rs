//! SAM alignment records: tab-separated text, `@`-prefixed header lines
//! followed by the eleven mandatory columns plus optional tag fields.

use std::io::{BufRead, Write};

use crate::error::{Error, Result};

/// One SAM alignment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub qname: String,
    pub flag: u16,
    pub rname: String,
    /// 1-based leftmost mapping position (`0` means unmapped/unavailable).
    pub pos: u64,
    pub mapq: u8,
    pub cigar: String,
    pub rnext: String,
    pub pnext: u64,
    pub tlen: i64,
    pub seq: String,
    pub qual: String,
    /// Optional `TAG:TYPE:VALUE` fields, verbatim.
    pub tags: Vec<String>,
}

/// Streaming SAM reader.
pub struct Reader<R> {
    inner: R,
    lineno: u64,
    pending: Option<String>,
}

impl<R: BufRead> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            lineno: 0,
            pending: None,
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
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

    /// Consume and return every leading `@`-prefixed header line. Must be
    /// called (even with an empty result) before the first [`Reader::read_record`]
    /// call if the stream may carry a header.
    pub fn read_header_lines(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            match self.read_line()? {
                None => break,
                Some(line) if line.starts_with('@') => lines.push(line),
                Some(line) => {
                    self.pending = Some(line);
                    break;
                }
            }
        }
        Ok(lines)
    }

    /// Read the next alignment record line.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        let Some(line) = self.read_line()? else {
            return Ok(None);
        };
        let mut cols = line.split('\t');
        let lineno = self.lineno;
        let mut next = |name: &'static str| {
            cols.next().ok_or_else(|| Error::Format {
                line: lineno,
                message: format!("record missing column {name}"),
            })
        };
        let qname = next("QNAME")?.to_string();
        let flag = parse_field(next("FLAG")?, lineno, "FLAG")?;
        let rname = next("RNAME")?.to_string();
        let pos = parse_field(next("POS")?, lineno, "POS")?;
        let mapq = parse_field(next("MAPQ")?, lineno, "MAPQ")?;
        let cigar = next("CIGAR")?.to_string();
        let rnext = next("RNEXT")?.to_string();
        let pnext = parse_field(next("PNEXT")?, lineno, "PNEXT")?;
        let tlen = parse_field(next("TLEN")?, lineno, "TLEN")?;
        let seq = next("SEQ")?.to_string();
        let qual = next("QUAL")?.to_string();
        let tags = cols.map(str::to_string).collect();

        Ok(Some(Record {
            qname,
            flag,
            rname,
            pos,
            mapq,
            cigar,
            rnext,
            pnext,
            tlen,
            seq,
            qual,
            tags,
        }))
    }
}

impl<R: BufRead> Iterator for Reader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

fn parse_field<T: std::str::FromStr>(text: &str, lineno: u64, name: &'static str) -> Result<T> {
    text.parse().map_err(|_| Error::Parse {
        line: lineno,
        message: format!("invalid {name}: {text:?}"),
    })
}

/// Streaming SAM writer. `write_header_line` writes one `@`-prefixed line
/// verbatim; `write_record` writes one alignment line.
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

    pub fn write_header_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.inner, "{line}")?;
        Ok(())
    }

    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        write!(
            self.inner,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            record.qname,
            record.flag,
            record.rname,
            record.pos,
            record.mapq,
            record.cigar,
            record.rnext,
            record.pnext,
            record.tlen,
            record.seq,
            record.qual,
        )?;
        for tag in &record.tags {
            write!(self.inner, "\t{tag}")?;
        }
        self.inner.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_header_lines_then_records() {
        let data = "@HD\tVN:1.6\tSO:coordinate\n@SQ\tSN:chr1\tLN:1000\nread1\t0\tchr1\t100\t60\t4M\t*\t0\t0\tACGT\tIIII\tNM:i:0\n";
        let mut reader = Reader::new(Cursor::new(data));
        let header = reader.read_header_lines().unwrap();
        assert_eq!(header.len(), 2);
        let record = reader.read_record().unwrap().unwrap();
        assert_eq!(record.qname, "read1");
        assert_eq!(record.pos, 100);
        assert_eq!(record.tags, vec!["NM:i:0"]);
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn invalid_flag_is_a_parse_error() {
        let data = "read1\tnotanumber\tchr1\t100\t60\t4M\t*\t0\t0\tACGT\tIIII\n";
        let mut reader = Reader::new(Cursor::new(data));
        let err = reader.read_record().unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn round_trips_through_writer() {
        let record = Record {
            qname: "read1".to_string(),
            flag: 0,
            rname: "chr1".to_string(),
            pos: 100,
            mapq: 60,
            cigar: "4M".to_string(),
            rnext: "*".to_string(),
            pnext: 0,
            tlen: 0,
            seq: "ACGT".to_string(),
            qual: "IIII".to_string(),
            tags: vec!["NM:i:0".to_string()],
        };
        let mut buf = Vec::new();
        Writer::new(&mut buf).write_record(&record).unwrap();
        let mut reader = Reader::new(Cursor::new(buf));
        assert_eq!(reader.read_record().unwrap().unwrap(), record);
    }
}
