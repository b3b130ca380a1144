//! VCF textual record reader (spec §4.E "VCF input handler").

use std::io::BufRead;

use bio_value::Sentinel;

use crate::error::{Error, Location, Result};
use crate::header::{DictKind, Header};
use crate::record::VcfRecord;
use crate::valuetext::parse_value;

/// Options controlling how [`Reader`] handles anomalies it can recover
/// from by amending the header (spec §4.D/§7: "warning, not error").
#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    /// Emit a `tracing::warn!` for every undeclared CHROM/FILTER/INFO/FORMAT
    /// reference before the header is amended with a placeholder.
    pub print_warnings: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self { print_warnings: true }
    }
}

/// A non-owning view into the 9+N tab-separated fields of one VCF record
/// line (spec §3 "Raw record").
///
/// Borrows from the [`Reader`] that produced it; the borrow checker
/// enforces the spec's invalidation rule directly — `raw()` takes `&self`,
/// so holding a `RawRecord` makes the next `advance_raw()` (which needs
/// `&mut self`) a compile error.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'r> {
    pub chrom: &'r str,
    pub pos: &'r str,
    pub id: &'r str,
    pub reference: &'r str,
    pub alt: &'r str,
    pub qual: &'r str,
    pub filter: &'r str,
    pub info: &'r str,
    pub format: Option<&'r str>,
    pub samples: Vec<&'r str>,
}

/// Streaming reader over VCF record lines.
pub struct Reader<R> {
    inner: R,
    line: String,
    lineno: u64,
    options: ReaderOptions,
}

impl<R: BufRead> Reader<R> {
    /// Wrap `inner`, which must be positioned immediately after the
    /// `#CHROM` header line (typically right after [`Header::parse`]
    /// returns).
    pub fn new(inner: R, options: ReaderOptions) -> Self {
        Self {
            inner,
            line: String::new(),
            lineno: 0,
            options,
        }
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

    /// Read the next record line into the internal buffer.
    ///
    /// Returns `Ok(false)` at a clean EOF. Invalidates any [`RawRecord`]
    /// borrowed from a previous call (enforced by the borrow checker, not
    /// at runtime).
    pub fn advance_raw(&mut self) -> Result<bool> {
        self.line.clear();
        let n = self.inner.read_line(&mut self.line)?;
        if n == 0 {
            return Ok(false);
        }
        self.lineno += 1;
        while self.line.ends_with(['\n', '\r']) {
            self.line.pop();
        }
        Ok(true)
    }

    /// Split the currently-buffered line into its tab-separated fields.
    ///
    /// Record bodies are split unquoted — VCF forbids tabs inside fields,
    /// so the quote-aware splitter used for header attributes
    /// ([`crate::header`]'s internal `quote_split`) is never applied here
    /// (spec §4.E, §9).
    pub fn raw(&self) -> Result<RawRecord<'_>> {
        let mut cols = self.line.split('\t');
        let mut next = |name: &'static str| {
            cols.next().ok_or_else(|| Error::Format {
                location: Location::Line(self.lineno),
                message: format!("record missing column {name}"),
            })
        };
        let chrom = next("CHROM")?;
        let pos = next("POS")?;
        let id = next("ID")?;
        let reference = next("REF")?;
        let alt = next("ALT")?;
        let qual = next("QUAL")?;
        let filter = next("FILTER")?;
        let info = next("INFO")?;
        let format = cols.next();
        let samples = cols.collect();
        Ok(RawRecord {
            chrom,
            pos,
            id,
            reference,
            alt,
            qual,
            filter,
            info,
            format,
            samples,
        })
    }

    /// Assemble a [`RawRecord`] into an owned [`VcfRecord`], resolving
    /// every header-referenced identifier and amending `header` with
    /// placeholders (plus a warning) for anything undeclared.
    pub fn parse_into(&self, raw: &RawRecord<'_>, header: &mut Header) -> Result<VcfRecord> {
        if header.contig_by_id(raw.chrom).is_none() {
            self.warn_missing(DictKind::Contig, raw.chrom);
            header.add_missing(DictKind::Contig, std::slice::from_ref(&raw.chrom.to_string()));
        }

        let pos = raw.pos.parse::<u64>().map_err(|_| Error::Parse {
            location: Location::Line(self.lineno),
            message: format!("invalid POS: {:?}", raw.pos),
        })?;

        let id = if raw.id == "." || raw.id.is_empty() {
            Vec::new()
        } else {
            raw.id.split(';').map(str::to_string).collect()
        };

        let reference = raw.reference.to_string();
        let rlen = reference.len() as u64;

        let alt = if raw.alt == "." || raw.alt.is_empty() {
            Vec::new()
        } else {
            raw.alt.split(',').map(str::to_string).collect()
        };

        let qual = if raw.qual == "." {
            f32::MISSING
        } else {
            raw.qual.parse::<f32>().map_err(|_| Error::Parse {
                location: Location::Line(self.lineno),
                message: format!("invalid QUAL: {:?}", raw.qual),
            })?
        };

        let filter = self.parse_filter(raw.filter, header)?;
        let info = self.parse_info(raw.info, header)?;
        let (format_keys, genotypes) = self.parse_genotypes(raw, header)?;

        Ok(VcfRecord {
            chrom: raw.chrom.to_string(),
            pos,
            rlen,
            id,
            reference,
            alt,
            qual,
            filter,
            info,
            format_keys,
            genotypes,
        })
    }

    /// Convenience: `advance_raw` + `raw` + `parse_into` in one call.
    pub fn read_record(&mut self, header: &mut Header) -> Result<Option<VcfRecord>> {
        if !self.advance_raw()? {
            return Ok(None);
        }
        let raw = self.raw()?;
        let record = self.parse_into(&raw, header)?;
        Ok(Some(record))
    }

    fn parse_filter(&self, text: &str, header: &mut Header) -> Result<Vec<String>> {
        if text == "." || text.is_empty() {
            return Ok(Vec::new());
        }
        let tokens: Vec<String> = text.split(';').map(str::to_string).collect();
        let missing: Vec<String> = tokens
            .iter()
            .filter(|t| *t != "PASS" && header.filter_by_id(t).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            for m in &missing {
                self.warn_missing(DictKind::Filter, m);
            }
            header.add_missing(DictKind::Filter, &missing);
        }
        Ok(tokens)
    }

    fn parse_info(&self, text: &str, header: &mut Header) -> Result<Vec<(String, bio_value::Value)>> {
        if text == "." || text.is_empty() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in text.split(';') {
            let (key, raw_value) = entry.split_once('=').map_or((entry, None), |(k, v)| (k, Some(v)));
            if header.info_by_id(key).is_none() {
                self.warn_missing(DictKind::Info, key);
                header.add_missing(DictKind::Info, std::slice::from_ref(&key.to_string()));
            }
            let descriptor = header.info_by_id(key).expect("just injected if missing");
            let value = match raw_value {
                Some(v) => parse_value(v, descriptor.number, descriptor.ty)?,
                None => bio_value::Value::Flag,
            };
            out.push((key.to_string(), value));
        }
        Ok(out)
    }

    /// Parse `FORMAT` + sample columns, transposing VCF's by-sample
    /// `colon`-joined layout into the library's canonical by-field layout:
    /// one entry per FORMAT key, each holding one value per sample (spec
    /// §4.E "GENOTYPES").
    fn parse_genotypes(
        &self,
        raw: &RawRecord<'_>,
        header: &mut Header,
    ) -> Result<(Vec<String>, Vec<(String, Vec<bio_value::Value>)>)> {
        use bio_value::Value;

        let Some(format) = raw.format else {
            return Ok((Vec::new(), Vec::new()));
        };
        let format_keys: Vec<String> = format.split(':').map(str::to_string).collect();

        let missing: Vec<String> = format_keys
            .iter()
            .filter(|k| header.format_by_id(k).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            for m in &missing {
                self.warn_missing(DictKind::Format, m);
            }
            header.add_missing(DictKind::Format, &missing);
        }

        let mut per_sample_tokens: Vec<Vec<&str>> = Vec::with_capacity(raw.samples.len());
        for sample in &raw.samples {
            per_sample_tokens.push(sample.split(':').collect());
        }

        let mut by_field: Vec<(String, Vec<Value>)> = Vec::with_capacity(format_keys.len());
        for (key_idx, key) in format_keys.iter().enumerate() {
            let descriptor = header.format_by_id(key).expect("just injected if missing");
            let mut values = Vec::with_capacity(per_sample_tokens.len());
            for tokens in &per_sample_tokens {
                let value = match tokens.get(key_idx) {
                    Some(&token) if token != "." && !token.is_empty() => {
                        parse_value(token, descriptor.number, descriptor.ty)?
                    }
                    // Trailing-truncated or explicitly "." sample field:
                    // the missing value for this field's declared type.
                    _ => bio_value::Value::construct_default(descriptor.value_type_id())?,
                };
                values.push(value);
            }
            by_field.push((key.clone(), values));
        }

        Ok((format_keys, by_field))
    }

    fn warn_missing(&self, kind: DictKind, id: &str) {
        if self.options.print_warnings {
            tracing::warn!(line = self.lineno, kind = ?kind, id = %id, "reference not declared in header");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_with_contig_and_filter() -> Header {
        let text = "##fileformat=VCFv4.3\n\
                    ##FILTER=<ID=PASS,Description=\"All filters passed\">\n\
                    ##contig=<ID=20,length=62435964>\n\
                    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        Header::parse(Cursor::new(text)).unwrap()
    }

    #[test]
    fn minimal_bed_like_record_reads_back_fields() {
        // Not BED, but sanity-checks the plain tab split on a record with
        // no INFO/samples.
        let mut header = header_with_contig_and_filter();
        let line = "20\t14370\t.\tA\tG\t.\tPASS\t.\n";
        let mut reader = Reader::new(Cursor::new(line), ReaderOptions::default());
        let record = reader.read_record(&mut header).unwrap().unwrap();
        assert_eq!(record.chrom, "20");
        assert_eq!(record.pos, 14370);
        assert!(record.id.is_empty());
        assert_eq!(record.reference, "A");
        assert_eq!(record.alt, vec!["G"]);
        assert_eq!(record.filter, vec!["PASS"]);
    }

    #[test]
    fn missing_fields_scenario_from_spec() {
        let mut header = header_with_contig_and_filter();
        let line = "20\t14370\t.\tACT\tA\t.\tPASS\t.\n";
        let mut reader = Reader::new(Cursor::new(line), ReaderOptions::default());
        let record = reader.read_record(&mut header).unwrap().unwrap();
        assert!(record.id.is_empty());
        assert!(record.qual.is_missing());
        assert_eq!(record.filter, vec!["PASS"]);
        assert!(record.info.is_empty());
    }

    #[test]
    fn info_vector_float_parses_from_header_declared_type() {
        let text = "##fileformat=VCFv4.3\n\
                    ##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele Frequency\">\n\
                    ##contig=<ID=20,length=1000>\n\
                    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        let mut header = Header::parse(Cursor::new(text)).unwrap();
        let line = "20\t100\t.\tA\tG,T\t.\t.\tAF=0.5,0.25\n";
        let mut reader = Reader::new(Cursor::new(line), ReaderOptions::default());
        let record = reader.read_record(&mut header).unwrap().unwrap();
        assert_eq!(
            record.info,
            vec![("AF".to_string(), bio_value::Value::VectorFloat32(vec![0.5, 0.25]))]
        );
    }

    #[test]
    fn genotypes_transpose_by_sample_into_by_field() {
        let text = "##fileformat=VCFv4.3\n\
                    ##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
                    ##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">\n\
                    ##contig=<ID=20,length=1000>\n\
                    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA001\tNA002\n";
        let mut header = Header::parse(Cursor::new(text)).unwrap();
        let line = "20\t100\t.\tA\tG\t.\t.\t.\tGT:DP\t0|0:10\t1|1:20\n";
        let mut reader = Reader::new(Cursor::new(line), ReaderOptions::default());
        let record = reader.read_record(&mut header).unwrap().unwrap();
        assert_eq!(record.format_keys, vec!["GT", "DP"]);
        assert_eq!(
            record.genotype_values("GT").unwrap(),
            &[
                bio_value::Value::String("0|0".to_string()),
                bio_value::Value::String("1|1".to_string())
            ]
        );
        assert_eq!(
            record.genotype_values("DP").unwrap(),
            &[bio_value::Value::Int32(10), bio_value::Value::Int32(20)]
        );
    }

    #[test]
    fn undeclared_contig_is_amended_not_an_error() {
        let text = "##fileformat=VCFv4.3\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        let mut header = Header::parse(Cursor::new(text)).unwrap();
        let line = "chrUnknown\t1\t.\tA\tG\t.\t.\t.\n";
        let mut reader = Reader::new(Cursor::new(line), ReaderOptions::default());
        let record = reader.read_record(&mut header).unwrap().unwrap();
        assert_eq!(record.chrom, "chrUnknown");
        assert!(header.contig_by_id("chrUnknown").is_some());
    }

    #[test]
    fn end_of_file_with_header_only_does_not_error() {
        let mut header = header_with_contig_and_filter();
        let mut reader = Reader::new(Cursor::new(""), ReaderOptions::default());
        assert!(reader.read_record(&mut header).unwrap().is_none());
    }
}
