//! BED interval records: tab-separated text with three mandatory leading
//! columns (`chrom`, `chromStart`, `chromEnd`) and up to nine optional
//! trailing columns, passed through verbatim.

use std::io::{BufRead, Write};

use crate::error::{Error, Result};

/// One BED record. Only the three mandatory columns are parsed; anything
/// past `chromEnd` (name, score, strand, thickStart/End, itemRgb,
/// blockCount/Sizes/Starts) is carried as raw text — BED's optional
/// columns have no unique parsing complexity worth modeling beyond the
/// mandatory three (spec §1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub chrom: String,
    /// 0-based start.
    pub chrom_start: u64,
    /// 0-based, exclusive end.
    pub chrom_end: u64,
    pub extra: Vec<String>,
}

/// Streaming BED reader. `#`, `track`, and `browser` lines are skipped
/// rather than surfaced as records.
pub struct Reader<R> {
    inner: R,
    lineno: u64,
}

impl<R: BufRead> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, lineno: 0 }
    }

    /// Unwrap the underlying source, e.g. to seek it and build a fresh
    /// reader elsewhere in the stream (region-filtered reading, spec §4.H).
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Borrow the underlying source without consuming the reader, e.g. to
    /// query a BGZF virtual offset (region-filtered reading, spec §4.H).
    pub fn get_ref(&self) -> &R {
        &self.inner
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

    pub fn read_record(&mut self) -> Result<Option<Record>> {
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with("track")
                || line.starts_with("browser")
            {
                continue;
            }

            let mut cols = line.split('\t');
            let lineno = self.lineno;
            let mut next = |name: &'static str| {
                cols.next().ok_or_else(|| Error::Format {
                    line: lineno,
                    message: format!("record missing column {name}"),
                })
            };
            let chrom = next("chrom")?.to_string();
            let chrom_start = next("chromStart")?
                .parse::<u64>()
                .map_err(|_| Error::Parse {
                    line: lineno,
                    message: "invalid chromStart".to_string(),
                })?;
            let chrom_end = next("chromEnd")?.parse::<u64>().map_err(|_| Error::Parse {
                line: lineno,
                message: "invalid chromEnd".to_string(),
            })?;
            let extra = cols.map(str::to_string).collect();

            return Ok(Some(Record {
                chrom,
                chrom_start,
                chrom_end,
                extra,
            }));
        }
    }
}

impl<R: BufRead> Iterator for Reader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

/// Streaming BED writer.
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
        write!(
            self.inner,
            "{}\t{}\t{}",
            record.chrom, record.chrom_start, record.chrom_end
        )?;
        for field in &record.extra {
            write!(self.inner, "\t{field}")?;
        }
        self.inner.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn minimal_bed_read_yields_nine_records() {
        let line = "chr7\t127471196\t127472363\n";
        let data = line.repeat(9);
        let mut reader = Reader::new(Cursor::new(data));
        let mut count = 0;
        while let Some(record) = reader.read_record().unwrap() {
            assert_eq!(record.chrom, "chr7");
            assert_eq!(record.chrom_start, 127_471_196);
            assert_eq!(record.chrom_end, 127_472_363);
            count += 1;
        }
        assert_eq!(count, 9);
    }

    #[test]
    fn skips_comment_and_track_lines() {
        let data = "#comment\ntrack name=foo\nchr1\t0\t100\n";
        let mut reader = Reader::new(Cursor::new(data));
        let record = reader.read_record().unwrap().unwrap();
        assert_eq!(record.chrom, "chr1");
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn carries_optional_columns_verbatim() {
        let data = "chr1\t0\t100\tfeature1\t500\t+\n";
        let mut reader = Reader::new(Cursor::new(data));
        let record = reader.read_record().unwrap().unwrap();
        assert_eq!(record.extra, vec!["feature1", "500", "+"]);
    }

    #[test]
    fn round_trips_through_writer() {
        let record = Record {
            chrom: "chr1".to_string(),
            chrom_start: 0,
            chrom_end: 100,
            extra: vec!["feature1".to_string()],
        };
        let mut buf = Vec::new();
        Writer::new(&mut buf).write_record(&record).unwrap();
        let mut reader = Reader::new(Cursor::new(buf));
        assert_eq!(reader.read_record().unwrap().unwrap(), record);
    }
}
