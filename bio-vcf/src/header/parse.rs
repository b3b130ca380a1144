//! Textual `##...` meta-line and `#CHROM` column-header parsing.

use std::io::BufRead;

use crate::error::{Error, Location, Result};
use crate::header::descriptor::{ContigDescriptor, FieldDescriptor, FilterDescriptor, Number, VcfType};
use crate::header::quote_split::{split_key_value, split_unquoted_commas};
use crate::header::Header;

impl Header {
    /// Parse a VCF textual header (all leading `##` meta lines plus the
    /// terminating `#CHROM...` column line) from `r`.
    ///
    /// Line-oriented; structured meta lines (`##INFO=<...>` and friends)
    /// are split attribute-by-attribute with [`split_unquoted_commas`],
    /// which is quote-aware — a distinction this parser does *not* apply to
    /// record bodies (spec §4.E, §9).
    pub fn parse<R: BufRead>(mut r: R) -> Result<Self> {
        let mut header = Header::new();
        let mut line = String::new();
        let mut lineno = 0u64;

        loop {
            line.clear();
            let n = r.read_line(&mut line)?;
            if n == 0 {
                return Err(Error::Format {
                    location: Location::Line(lineno + 1),
                    message: "unexpected end of input before #CHROM header line".to_string(),
                });
            }
            lineno += 1;
            let trimmed = line.trim_end_matches(['\n', '\r']);

            if let Some(rest) = trimmed.strip_prefix("##") {
                header.parse_meta_line(rest, lineno)?;
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix("#CHROM") {
                // rest is the tab-separated remainder: POS\tID\t...\t[FORMAT\tsample...]
                let cols: Vec<&str> = rest.split('\t').filter(|c| !c.is_empty()).collect();
                // Fixed columns after CHROM: POS,ID,REF,ALT,QUAL,FILTER,INFO = 7;
                // an 8th (FORMAT) implies sample columns follow.
                if cols.len() > 7 {
                    header.samples = cols[8..].iter().map(|s| (*s).to_string()).collect();
                }
                break;
            }

            return Err(Error::Format {
                location: Location::Line(lineno),
                message: format!("expected a ## meta line or #CHROM header, got: {trimmed:?}"),
            });
        }

        header.rebuild_maps();
        Ok(header)
    }

    fn parse_meta_line(&mut self, rest: &str, lineno: u64) -> Result<()> {
        let Some((key, value)) = rest.split_once('=') else {
            return Err(Error::Format {
                location: Location::Line(lineno),
                message: format!("meta line missing '=': {rest:?}"),
            });
        };

        if value.starts_with('<') && value.ends_with('>') {
            let inner = &value[1..value.len() - 1];
            let attrs: Vec<(String, String)> = split_unquoted_commas(inner)
                .into_iter()
                .filter_map(split_key_value)
                .collect();
            match key {
                "INFO" => self.push_field_descriptor(attrs, true),
                "FORMAT" => self.push_field_descriptor(attrs, false),
                "FILTER" => self.push_filter_descriptor(attrs),
                "contig" => self.push_contig_descriptor(attrs),
                _ => self.meta.push((key.to_string(), value.to_string())),
            }
        } else {
            self.meta.push((key.to_string(), value.to_string()));
        }
        Ok(())
    }

    fn push_field_descriptor(&mut self, attrs: Vec<(String, String)>, is_info: bool) {
        let mut id = String::new();
        let mut number = Number::Unknown;
        let mut ty = VcfType::String;
        let mut description = String::new();
        let mut extra = Vec::new();
        let mut explicit_idx = None;

        for (k, v) in attrs {
            match k.as_str() {
                "ID" => id = v,
                "Number" => number = Number::parse(&v),
                "Type" => ty = VcfType::parse(&v).unwrap_or(VcfType::String),
                "Description" => description = v,
                "IDX" => explicit_idx = v.parse::<u32>().ok(),
                _ => extra.push((k, v)),
            }
        }

        let dict = if is_info { &self.info } else { &self.format };
        let idx = explicit_idx
            .unwrap_or_else(|| dict.iter().map(|d| d.idx).max().map_or(0, |m| m + 1));

        let descriptor = FieldDescriptor {
            id,
            number,
            ty,
            description,
            extra,
            idx,
        };
        if is_info {
            self.info.push(descriptor);
        } else {
            self.format.push(descriptor);
        }
    }

    fn push_filter_descriptor(&mut self, attrs: Vec<(String, String)>) {
        let mut id = String::new();
        let mut description = String::new();
        let mut explicit_idx = None;
        for (k, v) in attrs {
            match k.as_str() {
                "ID" => id = v,
                "Description" => description = v,
                "IDX" => explicit_idx = v.parse::<u32>().ok(),
                _ => {}
            }
        }
        let idx = explicit_idx
            .unwrap_or_else(|| self.filter.iter().map(|d| d.idx).max().map_or(0, |m| m + 1));
        self.filter.push(FilterDescriptor { id, description, idx });
    }

    fn push_contig_descriptor(&mut self, attrs: Vec<(String, String)>) {
        let mut id = String::new();
        let mut length = None;
        let mut extra = Vec::new();
        let mut explicit_idx = None;
        for (k, v) in attrs {
            match k.as_str() {
                "ID" => id = v,
                "length" => length = v.parse::<u64>().ok(),
                "IDX" => explicit_idx = v.parse::<u32>().ok(),
                _ => extra.push((k, v)),
            }
        }
        let idx = explicit_idx
            .unwrap_or_else(|| self.contig.iter().map(|d| d.idx).max().map_or(0, |m| m + 1));
        self.contig.push(ContigDescriptor {
            id,
            length,
            extra,
            idx,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_header() -> &'static str {
        "##fileformat=VCFv4.3\n\
         ##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele Frequency\">\n\
         ##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
         ##FILTER=<ID=PASS,Description=\"All filters passed\">\n\
         ##contig=<ID=20,length=62435964>\n\
         #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA001\tNA002\n"
    }

    #[test]
    fn parses_all_dictionary_kinds() {
        let header = Header::parse(Cursor::new(sample_header())).unwrap();
        assert_eq!(header.info_by_id("AF").unwrap().number, Number::AltAlleles);
        assert_eq!(header.format_by_id("GT").unwrap().ty, VcfType::String);
        assert!(header.filter_by_id("PASS").is_some());
        assert_eq!(header.contig_by_id("20").unwrap().length, Some(62_435_964));
        assert_eq!(header.samples, vec!["NA001", "NA002"]);
    }

    #[test]
    fn quoted_comma_in_description_does_not_split_attribute() {
        let text = "##INFO=<ID=X,Number=1,Type=String,Description=\"a, b\">\n\
                    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        let header = Header::parse(Cursor::new(text)).unwrap();
        assert_eq!(header.info_by_id("X").unwrap().description, "a, b");
    }

    #[test]
    fn explicit_idx_is_honored() {
        let text = "##INFO=<ID=X,Number=1,Type=String,Description=\"d\",IDX=7>\n\
                    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        let header = Header::parse(Cursor::new(text)).unwrap();
        assert_eq!(header.info_by_id("X").unwrap().idx, 7);
        assert_eq!(header.info_by_idx(7).unwrap().id, "X");
    }

    #[test]
    fn header_without_samples_parses() {
        let text = "##fileformat=VCFv4.3\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        let header = Header::parse(Cursor::new(text)).unwrap();
        assert!(header.samples.is_empty());
    }

    #[test]
    fn truncated_header_is_an_error() {
        let text = "##fileformat=VCFv4.3\n";
        let err = Header::parse(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }
}
